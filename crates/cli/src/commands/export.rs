use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use claimflow_core::domain::claim::ClaimStatus;
use claimflow_core::errors::ApplicationError;
use claimflow_db::ClaimFilter;

use crate::commands::{
    application_failure, demo_dataset, load_config, runtime, to_data, write_export, CommandResult,
};

#[derive(Debug, Clone, Default)]
pub struct ExportArgs {
    /// `all`, or one of the claim statuses.
    pub status: String,
    /// Export only the claims visible to this demo user.
    pub email: Option<String>,
    /// Write the users and claims backup instead of a claims file.
    pub all_data: bool,
}

#[derive(Debug, Serialize)]
struct ExportOutput {
    path: String,
    bytes: usize,
    rows: usize,
}

pub fn parse_status_filter(value: &str) -> Result<Option<ClaimStatus>, String> {
    if value.trim().eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    ClaimStatus::parse(value).map(Some).ok_or_else(|| {
        format!("unknown status `{value}` (expected all|pending|underreview|approved|rejected)")
    })
}

pub fn run(args: &ExportArgs, output_dir: &Path) -> CommandResult {
    let status = match parse_status_filter(&args.status) {
        Ok(status) => status,
        Err(message) => return CommandResult::failure("export", "validation", message, 5),
    };
    let config = match load_config("export") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("export") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let dataset = demo_dataset(&config).await?;
        if args.all_data {
            return dataset.service.export_all_data(&dataset.users).await.map(Some);
        }

        let mut filter = ClaimFilter { status, visible_to: None };
        if let Some(email) = &args.email {
            match dataset.user_by_email(email) {
                Some(user) => filter = filter.visible_to(user.identity()),
                None => return Ok(None),
            }
        }
        let bytes = dataset.service.export_csv(&filter).await?;
        Ok::<_, ApplicationError>(Some(bytes))
    });

    let bytes = match result {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            return CommandResult::failure(
                "export",
                "not_found",
                format!("no demo user with email `{}`", args.email.as_deref().unwrap_or_default()),
                5,
            )
        }
        Err(error) => return application_failure("export", error),
    };

    let path = match write_export("export", output_dir, &config.export.file_prefix, &bytes, Utc::now())
    {
        Ok(path) => path,
        Err(failure) => return failure,
    };

    let output = ExportOutput {
        path: path.display().to_string(),
        bytes: bytes.len(),
        rows: count_data_rows(&bytes, args.all_data),
    };
    let message = format!("wrote {} rows to {}", output.rows, output.path);
    CommandResult::success_with_data("export", message, to_data(&output))
}

/// Lines that carry a record, ignoring headers, section markers and blanks.
fn count_data_rows(bytes: &[u8], all_data: bool) -> usize {
    let text = String::from_utf8_lossy(bytes);
    let lines = text.lines().filter(|line| !line.trim().is_empty()).count();
    if all_data {
        lines.saturating_sub(4)
    } else {
        lines.saturating_sub(1)
    }
}
