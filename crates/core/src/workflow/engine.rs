use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::claim::{Claim, ClaimId, ClaimStatus, Decision, TierReview};
use crate::domain::user::Role;
use crate::errors::{ValidationError, WorkflowError};
use crate::workflow::tiers::{is_eligible, is_ready_for_role, ReviewTier};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub tier: ReviewTier,
    pub decision: Decision,
    pub reviewer_name: String,
    pub notes: String,
    pub decided_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub claim_id: ClaimId,
    pub tier: ReviewTier,
    pub decision: Decision,
    pub from: ClaimStatus,
    pub to: ClaimStatus,
    pub next_step: String,
}

/// Applies reviewer decisions to claims. Stateless; every check reads the
/// claim it is given.
#[derive(Clone, Debug, Default)]
pub struct ApprovalEngine;

impl ApprovalEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn record_decision(
        &self,
        claim: &mut Claim,
        decision: &ReviewDecision,
    ) -> Result<TransitionOutcome, WorkflowError> {
        validate_review_notes(decision.decision, &decision.notes)?;

        if !is_eligible(&claim.reviews, decision.tier) {
            return Err(WorkflowError::NotEligible { id: claim.id, role: decision.tier.owner() });
        }

        let from = claim.status();
        *claim.reviews.tier_mut(decision.tier) = TierReview::decided(
            decision.decision,
            decision.reviewer_name.clone(),
            decision.decided_at,
            decision.notes.clone(),
        );
        let to = claim.status();

        Ok(TransitionOutcome {
            claim_id: claim.id,
            tier: decision.tier,
            decision: decision.decision,
            from,
            to,
            next_step: next_step_message(decision.tier, to).to_string(),
        })
    }

    pub fn record_decision_with_audit<S>(
        &self,
        claim: &mut Claim,
        decision: &ReviewDecision,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, WorkflowError>
    where
        S: AuditSink,
    {
        let result = self.record_decision(claim, decision);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "claim.review_recorded",
                        AuditCategory::Review,
                        AuditOutcome::Success,
                    )
                    .with_metadata("tier", outcome.tier.label())
                    .with_metadata("decision", outcome.decision.as_str())
                    .with_metadata("from", outcome.from.as_str())
                    .with_metadata("to", outcome.to.as_str()),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "claim.review_rejected",
                        AuditCategory::Review,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("tier", decision.tier.label())
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }

    pub fn ready_for_role<'a>(&self, claims: &'a [Claim], role: Role) -> Vec<&'a Claim> {
        claims.iter().filter(|claim| is_ready_for_role(claim, role)).collect()
    }

    /// Same as [`Self::ready_for_role`] for a role name coming from outside;
    /// unknown names see nothing.
    pub fn ready_for_role_name<'a>(&self, claims: &'a [Claim], role_name: &str) -> Vec<&'a Claim> {
        match Role::parse(role_name) {
            Some(role) => self.ready_for_role(claims, role),
            None => Vec::new(),
        }
    }
}

pub fn validate_review_notes(decision: Decision, notes: &str) -> Result<(), ValidationError> {
    if decision == Decision::Rejected && notes.trim().is_empty() {
        return Err(ValidationError::MissingRejectionNotes);
    }
    Ok(())
}

pub fn next_step_message(tier: ReviewTier, status: ClaimStatus) -> &'static str {
    match (tier, status) {
        (ReviewTier::Coordinator, _) => "Waiting for Administrator review.",
        (ReviewTier::Administrator, _) => "Waiting for HR final review.",
        (ReviewTier::Hr, ClaimStatus::Approved) => {
            "Claim fully approved. The lecturer can now see the final status."
        }
        (ReviewTier::Hr, ClaimStatus::Rejected) => {
            "Claim fully rejected. The lecturer can now see the final status."
        }
        (ReviewTier::Hr, _) => "Review completed.",
    }
}
