use crate::codec::claims::export_claims;
use crate::codec::{finish, format_timestamp, writer, CsvCodecError};
use crate::domain::claim::Claim;
use crate::domain::user::User;

pub const USER_CSV_COLUMNS: [&str; 6] =
    ["Id", "FirstName", "LastName", "Email", "Role", "CreatedDate"];

pub fn user_csv_header() -> String {
    USER_CSV_COLUMNS.join(",")
}

pub fn export_users<'a, I>(users: I) -> Result<Vec<u8>, CsvCodecError>
where
    I: IntoIterator<Item = &'a User>,
{
    let mut writer = writer();
    writer.write_record(USER_CSV_COLUMNS)?;
    for user in users {
        writer.write_record([
            user.id.0.to_string(),
            user.first_name.clone(),
            user.last_name.clone(),
            user.email.clone(),
            user.role.as_str().to_string(),
            format_timestamp(&user.created_at),
        ])?;
    }
    finish(writer)
}

/// Backup of everything: a `USERS` section, a blank line, then a `CLAIMS`
/// section, each with its own header line.
pub fn export_all_data<'u, 'c, U, C>(users: U, claims: C) -> Result<Vec<u8>, CsvCodecError>
where
    U: IntoIterator<Item = &'u User>,
    C: IntoIterator<Item = &'c Claim>,
{
    let mut output = b"USERS\n".to_vec();
    output.extend(export_users(users)?);
    output.extend_from_slice(b"\nCLAIMS\n");
    output.extend(export_claims(claims)?);
    Ok(output)
}
