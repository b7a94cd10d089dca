pub mod audit;
pub mod codec;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod errors;
pub mod workflow;

pub use audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
pub use codec::{CsvCodecError, ImportSummary};
pub use dashboard::{aggregate, DashboardStats, DashboardView};
pub use domain::claim::{
    Claim, ClaimDetails, ClaimId, ClaimReviews, ClaimStatus, Decision, NewClaim, ReviewStatus,
    TierReview,
};
pub use domain::user::{Identity, Role, User, UserId};
pub use errors::{ApplicationError, InterfaceError, ValidationError, WorkflowError};
pub use workflow::{ApprovalEngine, ReviewDecision, ReviewTier, TransitionOutcome};
