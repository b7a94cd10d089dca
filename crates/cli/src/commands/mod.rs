pub mod config;
pub mod dashboard;
pub mod demo;
pub mod export;
pub mod import;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use claimflow_core::codec::export_file_name;
use claimflow_core::config::{AppConfig, LoadOptions};
use claimflow_core::domain::claim::{ClaimDetails, Decision};
use claimflow_core::domain::user::{Identity, Role, User};
use claimflow_core::errors::ApplicationError;
use claimflow_db::{demo_users, ClaimService, InMemoryClaimRepository};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

pub(crate) fn application_failure(command: &str, error: ApplicationError) -> CommandResult {
    let interface = error.into_interface(Uuid::new_v4().to_string());
    let message = format!("{} ({interface})", interface.user_message());
    CommandResult::failure(command, interface.error_class(), message, 5)
}

pub(crate) fn to_data<T: Serialize>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok()
}

/// Writes an export under `dir` using the configured file prefix.
pub(crate) fn write_export(
    command: &str,
    dir: &Path,
    prefix: &str,
    bytes: &[u8],
    now: DateTime<Utc>,
) -> Result<PathBuf, CommandResult> {
    let path = dir.join(export_file_name(prefix, now));
    fs::create_dir_all(dir)
        .and_then(|()| fs::write(&path, bytes))
        .map_err(|error| {
            CommandResult::failure(
                command,
                "io",
                format!("could not write `{}`: {error}", path.display()),
                4,
            )
        })?;
    Ok(path)
}

pub(crate) type DemoService = ClaimService<InMemoryClaimRepository>;

/// The reference users plus a small set of claims at different review stages.
pub(crate) struct DemoDataset {
    pub service: DemoService,
    pub users: Vec<User>,
}

impl DemoDataset {
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|user| user.email.eq_ignore_ascii_case(email.trim()))
    }
}

pub(crate) fn demo_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 21, 14, 30, 0).single().unwrap_or_else(Utc::now)
}

struct DemoClaim {
    title: &'static str,
    description: &'static str,
    hours: i64,
    rate: i64,
    decisions: &'static [(Role, Decision, &'static str)],
}

const DEMO_CLAIMS: &[DemoClaim] = &[
    DemoClaim {
        title: "Monthly Report",
        description: "Work done in November",
        hours: 10,
        rate: 2,
        decisions: &[
            (Role::ProgrammeCoordinator, Decision::Approved, "ok"),
            (Role::Administrator, Decision::Approved, ""),
            (Role::Hr, Decision::Approved, "Final check"),
        ],
    },
    DemoClaim {
        title: "Exam marking",
        description: "Second-year database scripts",
        hours: 12,
        rate: 250,
        decisions: &[(Role::ProgrammeCoordinator, Decision::Approved, "")],
    },
    DemoClaim {
        title: "Guest lecture",
        description: "Industry session outside the timetable",
        hours: 3,
        rate: 400,
        decisions: &[(Role::ProgrammeCoordinator, Decision::Rejected, "Outside contract period")],
    },
    DemoClaim {
        title: "Tutorials",
        description: "Weekly tutorial groups",
        hours: 6,
        rate: 300,
        decisions: &[],
    },
];

pub(crate) async fn demo_dataset(config: &AppConfig) -> Result<DemoDataset, ApplicationError> {
    let epoch = demo_epoch();
    let users = demo_users(epoch);
    let service = ClaimService::new(InMemoryClaimRepository::new())
        .with_placeholder_lecturer(config.import.placeholder_lecturer.clone());

    let lecturer = demo_identity(&users, Role::Lecturer)?;
    for (offset, claim) in DEMO_CLAIMS.iter().enumerate() {
        let submitted_at = epoch + chrono::Duration::hours(offset as i64);
        let details = ClaimDetails {
            title: claim.title.to_string(),
            description: claim.description.to_string(),
            hours_worked: Decimal::from(claim.hours),
            hourly_rate: Decimal::from(claim.rate),
            additional_notes: None,
        };
        let id = service.create_claim(&lecturer, details, submitted_at).await?;

        for (step, (role, decision, notes)) in claim.decisions.iter().enumerate() {
            let reviewer = demo_identity(&users, *role)?;
            let decided_at = submitted_at + chrono::Duration::days(step as i64 + 1);
            service.record_decision(id, &reviewer, *decision, notes, decided_at).await?;
        }
    }

    Ok(DemoDataset { service, users })
}

fn demo_identity(users: &[User], role: Role) -> Result<Identity, ApplicationError> {
    users
        .iter()
        .find(|user| user.role == role)
        .map(User::identity)
        .ok_or_else(|| ApplicationError::Configuration(format!("no demo user with role {role}")))
}
