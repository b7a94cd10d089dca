use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::workflow::tiers::{overall_status, ReviewTier};

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const ADDITIONAL_NOTES_MAX_CHARS: usize = 1000;

/// Upper bound of `hours_worked`; the lower bound is exclusive zero.
pub const MAX_HOURS_WORKED: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);
pub const MIN_HOURLY_RATE: Decimal = Decimal::ONE;
pub const MAX_HOURLY_RATE: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClaimId(pub u64);

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::UnderReview => "UnderReview",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    /// Accepts the exported spelling as well as `under_review` / `under review`.
    pub fn parse(value: &str) -> Option<Self> {
        let key: String = value
            .trim()
            .chars()
            .filter(|ch| *ch != '_' && *ch != ' ' && *ch != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "pending" => Some(Self::Pending),
            "underreview" => Some(Self::UnderReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single review tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl From<Decision> for ReviewStatus {
    fn from(value: Decision) -> Self {
        match value {
            Decision::Approved => Self::Approved,
            Decision::Rejected => Self::Rejected,
        }
    }
}

/// One reviewer's sub-record on a claim. The reviewer fields are populated
/// exactly when `status` is not `Pending`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierReview {
    pub status: ReviewStatus,
    pub reviewer_name: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl TierReview {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn decided(
        decision: Decision,
        reviewer_name: impl Into<String>,
        reviewed_at: DateTime<Utc>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            status: decision.into(),
            reviewer_name: Some(reviewer_name.into()),
            reviewed_at: Some(reviewed_at),
            notes: Some(notes.into()),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReviewStatus::Pending
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReviews {
    pub coordinator: TierReview,
    pub administrator: TierReview,
    pub hr: TierReview,
}

impl ClaimReviews {
    pub fn tier(&self, tier: ReviewTier) -> &TierReview {
        match tier {
            ReviewTier::Coordinator => &self.coordinator,
            ReviewTier::Administrator => &self.administrator,
            ReviewTier::Hr => &self.hr,
        }
    }

    pub fn tier_mut(&mut self, tier: ReviewTier) -> &mut TierReview {
        match tier {
            ReviewTier::Coordinator => &mut self.coordinator,
            ReviewTier::Administrator => &mut self.administrator,
            ReviewTier::Hr => &mut self.hr,
        }
    }
}

/// Fields a lecturer fills in and may edit while the claim is still pending.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimDetails {
    pub title: String,
    pub description: String,
    pub hours_worked: Decimal,
    pub hourly_rate: Decimal,
    pub additional_notes: Option<String>,
}

impl ClaimDetails {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title, TITLE_MAX_CHARS)?;
        require_text("description", &self.description, DESCRIPTION_MAX_CHARS)?;

        if self.hours_worked <= Decimal::ZERO || self.hours_worked > MAX_HOURS_WORKED {
            return Err(ValidationError::OutOfRange {
                field: "hours_worked",
                bounds: format!("(0, {MAX_HOURS_WORKED}]"),
                value: self.hours_worked.to_string(),
            });
        }

        if self.hourly_rate < MIN_HOURLY_RATE || self.hourly_rate > MAX_HOURLY_RATE {
            return Err(ValidationError::OutOfRange {
                field: "hourly_rate",
                bounds: format!("[{MIN_HOURLY_RATE}, {MAX_HOURLY_RATE}]"),
                value: self.hourly_rate.to_string(),
            });
        }

        if let Some(notes) = &self.additional_notes {
            if notes.chars().count() > ADDITIONAL_NOTES_MAX_CHARS {
                return Err(ValidationError::TooLong {
                    field: "additional_notes",
                    max: ADDITIONAL_NOTES_MAX_CHARS,
                });
            }
        }

        Ok(())
    }
}

fn require_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// A claim as handed to the repository for insertion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClaim {
    pub lecturer_name: String,
    pub details: ClaimDetails,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub title: String,
    pub description: String,
    pub lecturer_name: String,
    pub hours_worked: Decimal,
    pub hourly_rate: Decimal,
    pub additional_notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviews: ClaimReviews,
}

impl Claim {
    pub fn submitted(id: ClaimId, new_claim: NewClaim, submitted_at: DateTime<Utc>) -> Self {
        let NewClaim { lecturer_name, details } = new_claim;
        Self {
            id,
            title: details.title,
            description: details.description,
            lecturer_name,
            hours_worked: details.hours_worked,
            hourly_rate: details.hourly_rate,
            additional_notes: details.additional_notes,
            submitted_at,
            reviews: ClaimReviews::default(),
        }
    }

    /// Saturates at `Decimal::MAX`; validated claims never get near it.
    pub fn total_amount(&self) -> Decimal {
        self.hours_worked.checked_mul(self.hourly_rate).unwrap_or(Decimal::MAX)
    }

    pub fn status(&self) -> ClaimStatus {
        overall_status(&self.reviews)
    }

    pub fn apply_details(&mut self, details: ClaimDetails) {
        self.title = details.title;
        self.description = details.description;
        self.hours_worked = details.hours_worked;
        self.hourly_rate = details.hourly_rate;
        self.additional_notes = details.additional_notes;
    }
}
