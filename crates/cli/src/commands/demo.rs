use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use claimflow_core::dashboard::{aggregate, DashboardStats};
use claimflow_core::errors::ApplicationError;
use claimflow_db::ClaimFilter;

use crate::commands::{
    application_failure, demo_dataset, load_config, runtime, to_data, write_export, CommandResult,
};

#[derive(Debug, Serialize)]
struct DemoUserSummary {
    name: String,
    email: String,
    role: String,
}

#[derive(Debug, Serialize)]
struct DemoOutput {
    users: Vec<DemoUserSummary>,
    stats: DashboardStats,
    export_path: Option<String>,
}

/// Seeds the reference dataset and optionally writes the combined users and
/// claims backup into `output_dir`.
pub fn run(output_dir: Option<&Path>) -> CommandResult {
    let config = match load_config("demo") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("demo") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let dataset = demo_dataset(&config).await?;
        let claims = dataset.service.list_claims(&ClaimFilter::all()).await?;
        let backup = match output_dir {
            Some(_) => Some(dataset.service.export_all_data(&dataset.users).await?),
            None => None,
        };
        Ok::<_, ApplicationError>((dataset.users, claims, backup))
    });

    let (users, claims, backup) = match result {
        Ok(output) => output,
        Err(error) => return application_failure("demo", error),
    };

    let export_path = match (output_dir, backup) {
        (Some(dir), Some(bytes)) => {
            match write_export("demo", dir, &config.export.file_prefix, &bytes, Utc::now()) {
                Ok(path) => Some(path.display().to_string()),
                Err(failure) => return failure,
            }
        }
        _ => None,
    };

    let output = DemoOutput {
        users: users
            .iter()
            .map(|user| DemoUserSummary {
                name: user.display_name(),
                email: user.email.clone(),
                role: user.role.to_string(),
            })
            .collect(),
        stats: aggregate(&claims),
        export_path,
    };
    let message = format!(
        "seeded {} demo users and {} claims",
        output.users.len(),
        output.stats.total
    );
    CommandResult::success_with_data("demo", message, to_data(&output))
}
