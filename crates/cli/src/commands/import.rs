use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use claimflow_core::codec::import::ImportSummary;
use claimflow_core::errors::ApplicationError;
use claimflow_db::{ClaimFilter, ClaimService, InMemoryClaimRepository};

use crate::commands::{
    application_failure, load_config, runtime, to_data, write_export, CommandResult,
};

#[derive(Debug, Serialize)]
struct ImportOutput {
    #[serde(flatten)]
    summary: ImportSummary,
    export_path: Option<String>,
}

/// Imports a claims CSV into a fresh store. With `output_dir`, the imported
/// claims are exported again so the reset review columns can be inspected.
pub fn run(file: &Path, output_dir: Option<&Path>) -> CommandResult {
    let config = match load_config("import") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let file_name = file.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
    if !config.import.accepts_file_name(&file_name) {
        return CommandResult::failure(
            "import",
            "validation",
            format!("`{}` is not a .csv file", file.display()),
            5,
        );
    }

    let input = match fs::read(file) {
        Ok(input) => input,
        Err(error) => {
            return CommandResult::failure(
                "import",
                "io",
                format!("could not read `{}`: {error}", file.display()),
                4,
            )
        }
    };

    let runtime = match runtime("import") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let service = ClaimService::new(InMemoryClaimRepository::new())
            .with_placeholder_lecturer(config.import.placeholder_lecturer.clone());
        let summary = service.import_csv(&input, Utc::now()).await?;
        let exported = match output_dir {
            Some(_) => Some(service.export_csv(&ClaimFilter::all()).await?),
            None => None,
        };
        Ok::<_, ApplicationError>((summary, exported))
    });

    let (summary, exported) = match result {
        Ok(output) => output,
        Err(error) => return application_failure("import", error),
    };

    let export_path = match (output_dir, exported) {
        (Some(dir), Some(bytes)) => {
            match write_export("import", dir, &config.export.file_prefix, &bytes, Utc::now()) {
                Ok(path) => Some(path.display().to_string()),
                Err(failure) => return failure,
            }
        }
        _ => None,
    };

    let message =
        format!("imported {} claims, skipped {} rows", summary.imported, summary.skipped);
    CommandResult::success_with_data(
        "import",
        message,
        to_data(&ImportOutput { summary, export_path }),
    )
}
