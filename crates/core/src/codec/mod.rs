//! Comma-separated export and import of claims and users.
//!
//! The format predates this crate and is kept byte-compatible: fields are
//! never quoted, and commas inside free-text notes are written as semicolons.
//! Decoding splits on every comma, so a comma inside an unescaped field
//! (title, description, lecturer name) shifts every later column.

pub mod claims;
pub mod import;
pub mod users;

use std::io;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use rust_decimal::Decimal;
use thiserror::Error;

pub use claims::{
    claim_csv_header, claim_fields, decode_claim, decode_record, encode_claim, export_claims,
    ClaimCsvRecord, ReviewColumns, CLAIM_CSV_COLUMNS,
};
pub use import::{plan_import, ImportPlan, ImportSummary, DEFAULT_PLACEHOLDER_LECTURER};
pub use users::{export_all_data, export_users, user_csv_header, USER_CSV_COLUMNS};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Error)]
pub enum CsvCodecError {
    #[error("csv write failed: {0}")]
    Write(#[from] csv::Error),
    #[error("csv buffer could not be flushed: {0}")]
    Flush(String),
}

pub(crate) fn writer() -> csv::Writer<Vec<u8>> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

pub(crate) fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, CsvCodecError> {
    writer.into_inner().map_err(|error| CsvCodecError::Flush(error.to_string()))
}

/// Positional reader: no quote handling, ragged rows allowed, CRLF or LF.
pub(crate) fn reader<R: io::Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .terminator(Terminator::CRLF)
        .from_reader(input)
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Accepts the export format plus a few common spellings; `None` when none match.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in [TIMESTAMP_FORMAT, "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn escape_free_text(value: &str) -> String {
    value.replace(',', ";")
}

/// Inverse of [`escape_free_text`]; a semicolon typed by the user comes back as a comma.
pub fn unescape_free_text(value: &str) -> String {
    value.replace(';', ",")
}

/// `<prefix>_<yyyyMMdd_HHmmss>.csv`
pub fn export_file_name(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{prefix}_{}.csv", now.format(FILE_STAMP_FORMAT))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{
        escape_free_text, export_file_name, format_decimal, format_timestamp, parse_timestamp,
        unescape_free_text,
    };

    #[test]
    fn timestamps_use_minute_precision() {
        let at = Utc.with_ymd_and_hms(2025, 11, 21, 14, 30, 59).unwrap();
        assert_eq!(format_timestamp(&at), "2025-11-21 14:30");
        assert_eq!(
            parse_timestamp("2025-11-21 14:30"),
            Some(Utc.with_ymd_and_hms(2025, 11, 21, 14, 30, 0).unwrap())
        );
    }

    #[test]
    fn parse_timestamp_accepts_common_variants() {
        let expected = Utc.with_ymd_and_hms(2025, 11, 21, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-11-21"), Some(expected));
        assert_eq!(parse_timestamp("2025-11-21T00:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-11-21 00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("21 November"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn decimals_are_written_without_trailing_zeros() {
        assert_eq!(format_decimal(Decimal::new(1000, 2)), "10");
        assert_eq!(format_decimal(Decimal::new(250, 2)), "2.5");
        assert_eq!(format_decimal(Decimal::new(3200, 0)), "3200");
    }

    #[test]
    fn free_text_escaping_is_lossy_for_semicolons() {
        assert_eq!(escape_free_text("late, but fine"), "late; but fine");
        assert_eq!(unescape_free_text(&escape_free_text("late, but fine")), "late, but fine");
        assert_eq!(unescape_free_text(&escape_free_text("see note; ok")), "see note, ok");
    }

    #[test]
    fn export_file_name_embeds_timestamp() {
        let at = Utc.with_ymd_and_hms(2025, 11, 24, 9, 5, 7).unwrap();
        assert_eq!(export_file_name("claims_export", at), "claims_export_20251124_090507.csv");
    }
}
