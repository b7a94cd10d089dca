use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as ClaimMutex, OwnedMutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

use claimflow_core::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use claimflow_core::codec::{self, ImportSummary, DEFAULT_PLACEHOLDER_LECTURER};
use claimflow_core::dashboard::DashboardView;
use claimflow_core::domain::claim::{Claim, ClaimDetails, ClaimId, ClaimStatus, Decision, NewClaim};
use claimflow_core::domain::user::{Identity, Role, User};
use claimflow_core::errors::{ApplicationError, WorkflowError};
use claimflow_core::workflow::{
    is_visible_to, validate_review_notes, ApprovalEngine, ReviewDecision, ReviewTier,
    TransitionOutcome,
};

use crate::repositories::ClaimRepository;

/// Selection applied to listings and exports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClaimFilter {
    pub status: Option<ClaimStatus>,
    /// Restrict to claims this identity may see.
    pub visible_to: Option<Identity>,
}

impl ClaimFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: ClaimStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn visible_to(mut self, identity: Identity) -> Self {
        self.visible_to = Some(identity);
        self
    }

    pub fn matches(&self, claim: &Claim) -> bool {
        self.status.map_or(true, |status| claim.status() == status)
            && self.visible_to.as_ref().map_or(true, |identity| is_visible_to(claim, identity))
    }
}

/// One async mutex per claim id. An entry lives while some caller holds or
/// waits on it and is removed when the last guard drops.
#[derive(Default)]
struct ClaimLocks {
    locks: Mutex<HashMap<ClaimId, Arc<ClaimMutex<()>>>>,
}

impl ClaimLocks {
    async fn acquire(&self, id: ClaimId) -> ClaimLockGuard<'_> {
        let lock = {
            let mut locks = self.table();
            Arc::clone(locks.entry(id).or_default())
        };
        ClaimLockGuard { locks: self, id, guard: Some(lock.lock_owned().await) }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<ClaimId, Arc<ClaimMutex<()>>>> {
        match self.locks.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table().len()
    }
}

struct ClaimLockGuard<'a> {
    locks: &'a ClaimLocks,
    id: ClaimId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ClaimLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.table();
        // Only the table still points at the mutex: nobody holds or awaits it.
        if locks.get(&self.id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.id);
        }
    }
}

/// Writes audit events as structured `tracing` records.
#[derive(Clone, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        let claim_id = event.claim_id.map(|id| id.0.to_string()).unwrap_or_default();
        let metadata = event
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(" ");

        match event.outcome {
            AuditOutcome::Success => info!(
                event_name = %event.event_type,
                event_id = %event.event_id,
                correlation_id = %event.correlation_id,
                claim_id = %claim_id,
                actor = %event.actor,
                category = ?event.category,
                metadata = %metadata,
                "audit event"
            ),
            AuditOutcome::Rejected | AuditOutcome::Failed => warn!(
                event_name = %event.event_type,
                event_id = %event.event_id,
                correlation_id = %event.correlation_id,
                claim_id = %claim_id,
                actor = %event.actor,
                category = ?event.category,
                outcome = ?event.outcome,
                metadata = %metadata,
                "audit event"
            ),
        }
    }
}

/// Entry point for the web layer: validation, per-claim serialization of
/// read-check-write sequences, and the audit trail around the repository.
pub struct ClaimService<R, S = TracingAuditSink> {
    repository: R,
    audit: S,
    engine: ApprovalEngine,
    locks: ClaimLocks,
    placeholder_lecturer: String,
}

impl<R> ClaimService<R, TracingAuditSink>
where
    R: ClaimRepository,
{
    pub fn new(repository: R) -> Self {
        Self::with_audit_sink(repository, TracingAuditSink)
    }
}

impl<R, S> ClaimService<R, S>
where
    R: ClaimRepository,
    S: AuditSink,
{
    pub fn with_audit_sink(repository: R, audit: S) -> Self {
        Self {
            repository,
            audit,
            engine: ApprovalEngine::new(),
            locks: ClaimLocks::default(),
            placeholder_lecturer: DEFAULT_PLACEHOLDER_LECTURER.to_string(),
        }
    }

    pub fn with_placeholder_lecturer(mut self, placeholder_lecturer: impl Into<String>) -> Self {
        self.placeholder_lecturer = placeholder_lecturer.into();
        self
    }

    pub async fn create_claim(
        &self,
        submitter: &Identity,
        details: ClaimDetails,
        now: DateTime<Utc>,
    ) -> Result<ClaimId, ApplicationError> {
        details.validate()?;

        let total = details.hours_worked * details.hourly_rate;
        let id = self
            .repository
            .create(NewClaim { lecturer_name: submitter.display_name.clone(), details }, now)
            .await?;

        self.audit.emit(
            AuditEvent::new(
                &context(Some(id), &submitter.display_name),
                "claim.submitted",
                AuditCategory::Submission,
                AuditOutcome::Success,
            )
            .with_metadata("total_amount", codec::format_decimal(total)),
        );
        Ok(id)
    }

    pub async fn get_claim(&self, id: ClaimId) -> Result<Claim, ApplicationError> {
        self.repository.find(id).await?.ok_or_else(|| WorkflowError::NotFound(id).into())
    }

    /// Replaces the editable fields of a claim nobody has reviewed yet.
    pub async fn update_claim(
        &self,
        id: ClaimId,
        details: ClaimDetails,
    ) -> Result<(), ApplicationError> {
        details.validate()?;

        let _guard = self.locks.acquire(id).await;
        let mut claim = self.pending_claim(id, "edit").await?;
        claim.apply_details(details);
        let actor = claim.lecturer_name.clone();
        self.repository.update(id, claim).await?;

        self.audit.emit(AuditEvent::new(
            &context(Some(id), &actor),
            "claim.updated",
            AuditCategory::Submission,
            AuditOutcome::Success,
        ));
        Ok(())
    }

    pub async fn delete_claim(&self, id: ClaimId) -> Result<(), ApplicationError> {
        let _guard = self.locks.acquire(id).await;
        let claim = self.pending_claim(id, "delete").await?;
        self.repository.delete(id).await?;

        self.audit.emit(AuditEvent::new(
            &context(Some(id), &claim.lecturer_name),
            "claim.deleted",
            AuditCategory::Persistence,
            AuditOutcome::Success,
        ));
        Ok(())
    }

    pub async fn list_claims(&self, filter: &ClaimFilter) -> Result<Vec<Claim>, ApplicationError> {
        let claims = self.repository.list().await?;
        Ok(claims.into_iter().filter(|claim| filter.matches(claim)).collect())
    }

    /// Claims waiting on the tier owned by `role`; empty for lecturers.
    pub async fn review_eligible_claims(&self, role: Role) -> Result<Vec<Claim>, ApplicationError> {
        let claims = self.repository.list().await?;
        Ok(self.engine.ready_for_role(&claims, role).into_iter().cloned().collect())
    }

    /// Records the reviewer's decision on the tier their role owns. The claim
    /// stays locked from read to write, so of two reviewers racing on the same
    /// tier exactly one succeeds and the other sees `NotEligible`.
    pub async fn record_decision(
        &self,
        id: ClaimId,
        reviewer: &Identity,
        decision: Decision,
        notes: &str,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, ApplicationError> {
        validate_review_notes(decision, notes)?;

        let _guard = self.locks.acquire(id).await;
        let mut claim = self.repository.find(id).await?.ok_or(WorkflowError::NotFound(id))?;
        let audit = context(Some(id), &reviewer.display_name);

        let Some(tier) = ReviewTier::for_role(reviewer.role) else {
            let error = WorkflowError::NotEligible { id, role: reviewer.role };
            self.audit.emit(
                AuditEvent::new(
                    &audit,
                    "claim.review_rejected",
                    AuditCategory::Review,
                    AuditOutcome::Rejected,
                )
                .with_metadata("error", error.to_string()),
            );
            return Err(error.into());
        };

        let review = ReviewDecision {
            tier,
            decision,
            reviewer_name: reviewer.display_name.clone(),
            notes: notes.to_string(),
            decided_at: now,
        };
        let outcome =
            self.engine.record_decision_with_audit(&mut claim, &review, &self.audit, &audit)?;
        self.repository.update(id, claim).await?;

        Ok(outcome)
    }

    pub async fn export_csv(&self, filter: &ClaimFilter) -> Result<Vec<u8>, ApplicationError> {
        let claims = self.list_claims(filter).await?;
        let bytes = codec::export_claims(&claims)
            .map_err(|error| ApplicationError::Codec(error.to_string()))?;

        self.audit.emit(
            AuditEvent::new(
                &context(None, export_actor(filter)),
                "claim.export_completed",
                AuditCategory::Export,
                AuditOutcome::Success,
            )
            .with_metadata("claims", claims.len().to_string())
            .with_metadata(
                "status",
                filter.status.map(|status| status.as_str()).unwrap_or("all"),
            ),
        );
        Ok(bytes)
    }

    /// Users followed by every claim, as one backup file.
    pub async fn export_all_data(&self, users: &[User]) -> Result<Vec<u8>, ApplicationError> {
        let claims = self.repository.list().await?;
        let bytes = codec::export_all_data(users, &claims)
            .map_err(|error| ApplicationError::Codec(error.to_string()))?;

        self.audit.emit(
            AuditEvent::new(
                &context(None, "system"),
                "data.export_completed",
                AuditCategory::Export,
                AuditOutcome::Success,
            )
            .with_metadata("users", users.len().to_string())
            .with_metadata("claims", claims.len().to_string()),
        );
        Ok(bytes)
    }

    /// Inserts every new row of an uploaded claims file. Rows are handled one
    /// by one; a row that cannot be stored is counted as skipped.
    pub async fn import_csv(
        &self,
        input: &[u8],
        now: DateTime<Utc>,
    ) -> Result<ImportSummary, ApplicationError> {
        let plan = codec::plan_import(input, &self.placeholder_lecturer, now);
        let mut summary = plan.summary(0);
        let correlation_id = Uuid::new_v4().to_string();

        for new_claim in plan.new_claims {
            match self.repository.create(new_claim, now).await {
                Ok(id) => {
                    summary.imported += 1;
                    info!(
                        event_name = "claim.imported",
                        correlation_id = %correlation_id,
                        claim_id = id.0,
                        "imported claim"
                    );
                }
                Err(error) => {
                    summary.skipped += 1;
                    warn!(
                        event_name = "claim.import_row_failed",
                        correlation_id = %correlation_id,
                        error = %error,
                        "imported row could not be stored"
                    );
                }
            }
        }

        self.audit.emit(
            AuditEvent::new(
                &AuditContext::new(None, correlation_id, "import"),
                "claim.import_completed",
                AuditCategory::Import,
                AuditOutcome::Success,
            )
            .with_metadata("imported", summary.imported.to_string())
            .with_metadata("skipped", summary.skipped.to_string()),
        );
        Ok(summary)
    }

    pub async fn dashboard(
        &self,
        identity: &Identity,
        total_users: usize,
    ) -> Result<DashboardView, ApplicationError> {
        let claims = self.repository.list().await?;
        Ok(DashboardView::for_identity(identity, &claims, total_users))
    }

    async fn pending_claim(
        &self,
        id: ClaimId,
        action: &'static str,
    ) -> Result<Claim, ApplicationError> {
        let claim = self.repository.find(id).await?.ok_or(WorkflowError::NotFound(id))?;
        let status = claim.status();
        if status != ClaimStatus::Pending {
            return Err(WorkflowError::InvalidState { id, status, action }.into());
        }
        Ok(claim)
    }
}

fn context(claim_id: Option<ClaimId>, actor: &str) -> AuditContext {
    AuditContext::new(claim_id, Uuid::new_v4().to_string(), actor)
}

fn export_actor(filter: &ClaimFilter) -> &str {
    filter.visible_to.as_ref().map_or("system", |identity| identity.display_name.as_str())
}
