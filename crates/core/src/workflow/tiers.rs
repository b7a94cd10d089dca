use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::claim::{Claim, ClaimReviews, ClaimStatus, ReviewStatus};
use crate::domain::user::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReviewTier {
    Coordinator,
    Administrator,
    Hr,
}

/// Review order, and the role that owns each tier. Every role/tier lookup
/// goes through this table.
const TIER_TABLE: [(ReviewTier, Role); 3] = [
    (ReviewTier::Coordinator, Role::ProgrammeCoordinator),
    (ReviewTier::Administrator, Role::Administrator),
    (ReviewTier::Hr, Role::Hr),
];

static TIER_ORDER: [ReviewTier; 3] = ReviewTier::ORDER;

impl ReviewTier {
    pub const ORDER: [ReviewTier; 3] =
        [ReviewTier::Coordinator, ReviewTier::Administrator, ReviewTier::Hr];

    pub fn index(&self) -> usize {
        match self {
            Self::Coordinator => 0,
            Self::Administrator => 1,
            Self::Hr => 2,
        }
    }

    pub fn owner(&self) -> Role {
        TIER_TABLE[self.index()].1
    }

    pub fn for_role(role: Role) -> Option<Self> {
        TIER_TABLE.iter().find(|(_, owner)| *owner == role).map(|(tier, _)| *tier)
    }

    pub fn earlier(&self) -> &'static [ReviewTier] {
        &TIER_ORDER[..self.index()]
    }

    pub fn is_final(&self) -> bool {
        self.index() + 1 == TIER_TABLE.len()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Coordinator => "Programme Coordinator",
            Self::Administrator => "Administrator",
            Self::Hr => "HR",
        }
    }
}

impl fmt::Display for ReviewTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A tier can be decided once every earlier tier approved and it is still pending.
pub fn is_eligible(reviews: &ClaimReviews, tier: ReviewTier) -> bool {
    tier.earlier().iter().all(|earlier| reviews.tier(*earlier).status == ReviewStatus::Approved)
        && reviews.tier(tier).is_pending()
}

/// The tier currently waiting for a decision, if any.
pub fn next_eligible_tier(reviews: &ClaimReviews) -> Option<ReviewTier> {
    ReviewTier::ORDER.into_iter().find(|tier| is_eligible(reviews, *tier))
}

pub fn is_ready_for_role(claim: &Claim, role: Role) -> bool {
    ReviewTier::for_role(role).is_some_and(|tier| is_eligible(&claim.reviews, tier))
}

/// Overall claim status as a function of the tier statuses. HR holds the
/// final word; any earlier decision, approve or reject, leaves the claim under
/// review.
pub fn overall_status(reviews: &ClaimReviews) -> ClaimStatus {
    match reviews.hr.status {
        ReviewStatus::Approved => return ClaimStatus::Approved,
        ReviewStatus::Rejected => return ClaimStatus::Rejected,
        ReviewStatus::Pending => {}
    }

    let any_decided = ReviewTier::ORDER.iter().any(|tier| !reviews.tier(*tier).is_pending());
    if any_decided {
        ClaimStatus::UnderReview
    } else {
        ClaimStatus::Pending
    }
}
