pub mod engine;
pub mod tiers;
pub mod visibility;

pub use engine::{
    next_step_message, validate_review_notes, ApprovalEngine, ReviewDecision, TransitionOutcome,
};
pub use tiers::{is_eligible, is_ready_for_role, next_eligible_tier, overall_status, ReviewTier};
pub use visibility::{is_owned_by, is_visible_to, visible_claims};
