pub mod fixtures;
pub mod repositories;
pub mod service;

pub use fixtures::{demo_user, demo_users};
pub use repositories::{ClaimRepository, InMemoryClaimRepository, RepositoryError};
pub use service::{ClaimFilter, ClaimService, TracingAuditSink};
