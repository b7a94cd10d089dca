use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use claimflow_core::domain::claim::{Claim, ClaimId, ClaimStatus, NewClaim};
use claimflow_core::errors::{ApplicationError, WorkflowError};

pub mod memory;

pub use memory::InMemoryClaimRepository;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("claim {0} was not found")]
    NotFound(ClaimId),
    #[error("claim {id} is {status} and can no longer be deleted")]
    InvalidState { id: ClaimId, status: ClaimStatus },
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound(id) => Self::Workflow(WorkflowError::NotFound(id)),
            RepositoryError::InvalidState { id, status } => {
                Self::Workflow(WorkflowError::InvalidState { id, status, action: "delete" })
            }
        }
    }
}

/// Canonical store of claims. Implementations hand out clones; callers write
/// back through [`ClaimRepository::update`].
#[async_trait]
pub trait ClaimRepository: Send + Sync {
    /// Assigns the next id and stores the claim with every tier pending.
    async fn create(
        &self,
        claim: NewClaim,
        submitted_at: DateTime<Utc>,
    ) -> Result<ClaimId, RepositoryError>;

    async fn find(&self, id: ClaimId) -> Result<Option<Claim>, RepositoryError>;

    /// All claims in insertion order.
    async fn list(&self) -> Result<Vec<Claim>, RepositoryError>;

    async fn update(&self, id: ClaimId, claim: Claim) -> Result<(), RepositoryError>;

    /// Only pending claims can be deleted.
    async fn delete(&self, id: ClaimId) -> Result<(), RepositoryError>;
}
