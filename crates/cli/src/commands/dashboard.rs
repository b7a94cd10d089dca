use claimflow_core::errors::ApplicationError;

use crate::commands::{
    application_failure, demo_dataset, load_config, runtime, to_data, CommandResult,
};

/// Renders the dashboard the given demo user would see after signing in.
pub fn run(email: &str) -> CommandResult {
    let config = match load_config("dashboard") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("dashboard") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let dataset = demo_dataset(&config).await?;
        let Some(user) = dataset.user_by_email(email) else {
            return Ok(None);
        };
        let view = dataset.service.dashboard(&user.identity(), dataset.users.len()).await?;
        Ok::<_, ApplicationError>(Some(view))
    });

    match result {
        Ok(Some(view)) => {
            let message = format!(
                "{} ({}): {} claims, {} awaiting review",
                view.display_name,
                view.role,
                view.stats.total,
                view.review_queue.len()
            );
            CommandResult::success_with_data("dashboard", message, to_data(&view))
        }
        Ok(None) => CommandResult::failure(
            "dashboard",
            "not_found",
            format!("no demo user with email `{email}`"),
            5,
        ),
        Err(error) => application_failure("dashboard", error),
    }
}
