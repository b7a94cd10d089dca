//! Per-role dashboard projections. Everything here is computed from the
//! claims handed in; nothing is cached between calls.

use serde::{Deserialize, Serialize};

use crate::domain::claim::{Claim, ClaimStatus, ReviewStatus};
use crate::domain::user::{Identity, Role};
use crate::workflow::tiers::is_ready_for_role;
use crate::workflow::visibility::visible_claims;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total: usize,
    pub pending: usize,
    pub under_review: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl DashboardStats {
    pub fn from_claims<'a, I>(claims: I) -> Self
    where
        I: IntoIterator<Item = &'a Claim>,
    {
        claims.into_iter().fold(Self::default(), |mut stats, claim| {
            stats.total += 1;
            match claim.status() {
                ClaimStatus::Pending => stats.pending += 1,
                ClaimStatus::UnderReview => stats.under_review += 1,
                ClaimStatus::Approved => stats.approved += 1,
                ClaimStatus::Rejected => stats.rejected += 1,
            }
            stats
        })
    }
}

pub fn aggregate(claims: &[Claim]) -> DashboardStats {
    DashboardStats::from_claims(claims)
}

/// Claims the administrator has approved that still wait on HR.
pub fn hr_pending_count<'a, I>(claims: I) -> usize
where
    I: IntoIterator<Item = &'a Claim>,
{
    claims
        .into_iter()
        .filter(|claim| {
            claim.reviews.administrator.status == ReviewStatus::Approved
                && claim.reviews.hr.is_pending()
        })
        .count()
}

/// Extra figures shown to HR and administrators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OversightFigures {
    pub total_users: usize,
    pub hr_pending: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardView {
    pub role: Role,
    pub display_name: String,
    pub stats: DashboardStats,
    pub claims: Vec<Claim>,
    pub review_queue: Vec<Claim>,
    pub oversight: Option<OversightFigures>,
}

impl DashboardView {
    pub fn for_identity(identity: &Identity, claims: &[Claim], total_users: usize) -> Self {
        let visible: Vec<Claim> = visible_claims(claims, identity).into_iter().cloned().collect();
        let review_queue: Vec<Claim> = claims
            .iter()
            .filter(|claim| is_ready_for_role(claim, identity.role))
            .cloned()
            .collect();
        let oversight = match identity.role {
            Role::Hr | Role::Administrator => {
                Some(OversightFigures { total_users, hr_pending: hr_pending_count(claims) })
            }
            Role::Lecturer | Role::ProgrammeCoordinator => None,
        };

        Self {
            role: identity.role,
            display_name: identity.display_name.clone(),
            stats: DashboardStats::from_claims(&visible),
            claims: visible,
            review_queue,
            oversight,
        }
    }
}
