use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Lecturer,
    ProgrammeCoordinator,
    Administrator,
    #[serde(rename = "HR")]
    Hr,
}

impl Role {
    pub const ALL: [Role; 4] =
        [Role::Lecturer, Role::ProgrammeCoordinator, Role::Administrator, Role::Hr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lecturer => "Lecturer",
            Self::ProgrammeCoordinator => "ProgrammeCoordinator",
            Self::Administrator => "Administrator",
            Self::Hr => "HR",
        }
    }

    /// Exact role names as issued by the identity provider.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == value.trim())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered principal. Credentials are owned by the account service and
/// never enter this model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id,
            display_name: self.display_name(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// The authenticated caller as seen by the workflow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub display_name: String,
    pub email: String,
    pub role: Role,
}
