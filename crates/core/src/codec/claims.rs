use std::str::FromStr;

use chrono::{DateTime, Utc};
use csv::StringRecord;
use rust_decimal::Decimal;

use crate::codec::{
    escape_free_text, finish, format_decimal, format_timestamp, parse_timestamp, reader,
    unescape_free_text, writer, CsvCodecError,
};
use crate::domain::claim::{Claim, ClaimStatus, TierReview};
use crate::workflow::tiers::ReviewTier;

pub const CLAIM_CSV_COLUMNS: [&str; 19] = [
    "Id",
    "Title",
    "Description",
    "LecturerName",
    "HoursWorked",
    "HourlyRate",
    "TotalAmount",
    "Status",
    "SubmittedDate",
    "CoordinatorReviewBy",
    "CoordinatorReviewDate",
    "CoordinatorReviewNotes",
    "AdministratorReviewBy",
    "AdministratorReviewDate",
    "AdministratorReviewNotes",
    "HRReviewBy",
    "HRReviewDate",
    "HRReviewNotes",
    "AdditionalNotes",
];

/// Rows shorter than this cannot be told apart from noise and are dropped.
const MIN_DECODABLE_COLUMNS: usize = 8;

const REVIEW_COLUMNS_START: usize = 9;
const ADDITIONAL_NOTES_COLUMN: usize = 18;

pub fn claim_csv_header() -> String {
    CLAIM_CSV_COLUMNS.join(",")
}

/// Reviewer columns of one tier as found in a file. Tier statuses are not
/// exported, so a decoded row only knows who reviewed, when, and the notes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReviewColumns {
    pub reviewer_name: String,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub notes: String,
}

impl ReviewColumns {
    pub fn from_review(review: &TierReview) -> Self {
        Self {
            reviewer_name: review.reviewer_name.clone().unwrap_or_default(),
            reviewed_at: review.reviewed_at,
            notes: review.notes.clone().unwrap_or_default(),
        }
    }
}

/// One decoded row. Parsing is best-effort: unreadable numbers become zero,
/// an unknown status becomes `Pending`, an unreadable submission date
/// becomes the decode time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimCsvRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub lecturer_name: String,
    pub hours_worked: Decimal,
    pub hourly_rate: Decimal,
    pub total_amount: Decimal,
    pub status: ClaimStatus,
    pub submitted_at: DateTime<Utc>,
    pub coordinator: ReviewColumns,
    pub administrator: ReviewColumns,
    pub hr: ReviewColumns,
    pub additional_notes: String,
}

impl ClaimCsvRecord {
    pub fn review(&self, tier: ReviewTier) -> &ReviewColumns {
        match tier {
            ReviewTier::Coordinator => &self.coordinator,
            ReviewTier::Administrator => &self.administrator,
            ReviewTier::Hr => &self.hr,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id == 0
    }
}

pub fn claim_fields(claim: &Claim) -> Vec<String> {
    let mut fields = vec![
        claim.id.0.to_string(),
        claim.title.clone(),
        claim.description.clone(),
        claim.lecturer_name.clone(),
        format_decimal(claim.hours_worked),
        format_decimal(claim.hourly_rate),
        format_decimal(claim.total_amount()),
        claim.status().as_str().to_string(),
        format_timestamp(&claim.submitted_at),
    ];

    for tier in ReviewTier::ORDER {
        let review = claim.reviews.tier(tier);
        fields.push(review.reviewer_name.clone().unwrap_or_default());
        fields.push(review.reviewed_at.as_ref().map(format_timestamp).unwrap_or_default());
        fields.push(review.notes.as_deref().map(escape_free_text).unwrap_or_default());
    }

    fields.push(claim.additional_notes.as_deref().map(escape_free_text).unwrap_or_default());
    fields
}

/// A single line, without terminator.
pub fn encode_claim(claim: &Claim) -> String {
    claim_fields(claim).join(",")
}

pub fn export_claims<'a, I>(claims: I) -> Result<Vec<u8>, CsvCodecError>
where
    I: IntoIterator<Item = &'a Claim>,
{
    let mut writer = writer();
    writer.write_record(CLAIM_CSV_COLUMNS)?;
    for claim in claims {
        writer.write_record(claim_fields(claim))?;
    }
    finish(writer)
}

pub fn decode_claim(line: &str, now: DateTime<Utc>) -> Option<ClaimCsvRecord> {
    let mut records = reader(line.as_bytes()).into_records();
    match records.next() {
        Some(Ok(record)) => decode_record(&record, now),
        _ => None,
    }
}

pub fn decode_record(record: &StringRecord, now: DateTime<Utc>) -> Option<ClaimCsvRecord> {
    if record.len() < MIN_DECODABLE_COLUMNS {
        return None;
    }

    let text = |index: usize| record.get(index).unwrap_or_default().to_string();
    let number = |index: usize| {
        Decimal::from_str(record.get(index).unwrap_or_default().trim()).unwrap_or(Decimal::ZERO)
    };
    let review = |tier: ReviewTier| {
        let base = REVIEW_COLUMNS_START + tier.index() * 3;
        ReviewColumns {
            reviewer_name: text(base),
            reviewed_at: record.get(base + 1).and_then(parse_timestamp),
            notes: unescape_free_text(record.get(base + 2).unwrap_or_default()),
        }
    };

    Some(ClaimCsvRecord {
        id: record.get(0).and_then(|value| value.trim().parse::<i64>().ok()).unwrap_or(0),
        title: text(1),
        description: text(2),
        lecturer_name: text(3),
        hours_worked: number(4),
        hourly_rate: number(5),
        total_amount: number(6),
        status: record.get(7).and_then(ClaimStatus::parse).unwrap_or(ClaimStatus::Pending),
        submitted_at: record.get(8).and_then(parse_timestamp).unwrap_or(now),
        coordinator: review(ReviewTier::Coordinator),
        administrator: review(ReviewTier::Administrator),
        hr: review(ReviewTier::Hr),
        additional_notes: unescape_free_text(
            record.get(ADDITIONAL_NOTES_COLUMN).unwrap_or_default(),
        ),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{
        claim_csv_header, decode_claim, encode_claim, export_claims, ClaimCsvRecord, ReviewColumns,
    };
    use crate::domain::claim::{
        Claim, ClaimDetails, ClaimId, ClaimReviews, ClaimStatus, Decision, NewClaim, TierReview,
    };
    use crate::workflow::tiers::ReviewTier;

    const REFERENCE_LINE: &str = "1,Monthly Report,Work done in November,John Doe,10,2,20,Approved,2025-11-21 14:30,Coordinator1,2025-11-22 10:00,Looks good,Admin1,2025-11-23 15:00,Approved,HR1,2025-11-24 12:00,Final check,No issues";

    fn reviewed_claim() -> Claim {
        let mut claim = Claim::submitted(
            ClaimId(1),
            NewClaim {
                lecturer_name: "John Doe".to_string(),
                details: ClaimDetails {
                    title: "Monthly Report".to_string(),
                    description: "Work done in November".to_string(),
                    hours_worked: Decimal::new(10, 0),
                    hourly_rate: Decimal::new(2, 0),
                    additional_notes: Some("No issues".to_string()),
                },
            },
            Utc.with_ymd_and_hms(2025, 11, 21, 14, 30, 0).unwrap(),
        );
        claim.reviews = ClaimReviews {
            coordinator: TierReview::decided(
                Decision::Approved,
                "Coordinator1",
                Utc.with_ymd_and_hms(2025, 11, 22, 10, 0, 0).unwrap(),
                "Looks good",
            ),
            administrator: TierReview::decided(
                Decision::Approved,
                "Admin1",
                Utc.with_ymd_and_hms(2025, 11, 23, 15, 0, 0).unwrap(),
                "Approved",
            ),
            hr: TierReview::decided(
                Decision::Approved,
                "HR1",
                Utc.with_ymd_and_hms(2025, 11, 24, 12, 0, 0).unwrap(),
                "Final check",
            ),
        };
        claim
    }

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap()
    }

    #[test]
    fn header_matches_column_order() {
        assert_eq!(
            claim_csv_header(),
            "Id,Title,Description,LecturerName,HoursWorked,HourlyRate,TotalAmount,Status,SubmittedDate,CoordinatorReviewBy,CoordinatorReviewDate,CoordinatorReviewNotes,AdministratorReviewBy,AdministratorReviewDate,AdministratorReviewNotes,HRReviewBy,HRReviewDate,HRReviewNotes,AdditionalNotes"
        );
    }

    #[test]
    fn encodes_reviewed_claim_in_column_order() {
        assert_eq!(encode_claim(&reviewed_claim()), REFERENCE_LINE);
    }

    #[test]
    fn pending_tiers_encode_as_empty_columns() {
        let mut claim = reviewed_claim();
        claim.reviews = ClaimReviews::default();
        claim.additional_notes = None;

        assert_eq!(
            encode_claim(&claim),
            "1,Monthly Report,Work done in November,John Doe,10,2,20,Pending,2025-11-21 14:30,,,,,,,,,,"
        );
    }

    #[test]
    fn commas_in_notes_are_written_as_semicolons() {
        let mut claim = reviewed_claim();
        claim.additional_notes = Some("Labs, marking, and moderation".to_string());

        let line = encode_claim(&claim);
        assert!(line.ends_with(",Labs; marking; and moderation"));
        assert_eq!(line.split(',').count(), 19);
    }

    #[test]
    fn decode_reproduces_every_exported_field() {
        let claim = reviewed_claim();
        let record = decode_claim(&encode_claim(&claim), now()).expect("decodable line");

        assert_eq!(record.id, 1);
        assert_eq!(record.title, claim.title);
        assert_eq!(record.description, claim.description);
        assert_eq!(record.lecturer_name, claim.lecturer_name);
        assert_eq!(record.hours_worked, claim.hours_worked);
        assert_eq!(record.hourly_rate, claim.hourly_rate);
        assert_eq!(record.total_amount, claim.total_amount());
        assert_eq!(record.status, ClaimStatus::Approved);
        assert_eq!(record.submitted_at, claim.submitted_at);
        for tier in ReviewTier::ORDER {
            assert_eq!(record.review(tier), &ReviewColumns::from_review(claim.reviews.tier(tier)));
        }
        assert_eq!(record.additional_notes, "No issues");
    }

    #[test]
    fn decode_restores_commas_in_notes() {
        let mut claim = reviewed_claim();
        claim.reviews.coordinator.notes = Some("fine, but late".to_string());

        let record = decode_claim(&encode_claim(&claim), now()).expect("decodable line");
        assert_eq!(record.coordinator.notes, "fine, but late");
    }

    #[test]
    fn comma_in_title_shifts_later_columns() {
        let mut claim = reviewed_claim();
        claim.title = "Report, November".to_string();

        let record = decode_claim(&encode_claim(&claim), now()).expect("decodable line");
        assert_eq!(record.title, "Report");
        assert_eq!(record.description, " November");
        assert_eq!(record.lecturer_name, "Work done in November");
        assert_eq!(record.hours_worked, Decimal::ZERO);
    }

    #[test]
    fn short_lines_are_not_decodable() {
        assert_eq!(decode_claim("0,Title,Description,John Doe,10,2,20", now()), None);
        assert_eq!(decode_claim("", now()), None);
    }

    #[test]
    fn missing_trailing_columns_and_bad_values_fall_back_to_defaults() {
        let record =
            decode_claim("abc,Title,Description,,ten,2,x,Archived", now()).expect("eight columns");

        assert_eq!(
            record,
            ClaimCsvRecord {
                id: 0,
                title: "Title".to_string(),
                description: "Description".to_string(),
                lecturer_name: String::new(),
                hours_worked: Decimal::ZERO,
                hourly_rate: Decimal::new(2, 0),
                total_amount: Decimal::ZERO,
                status: ClaimStatus::Pending,
                submitted_at: now(),
                coordinator: ReviewColumns::default(),
                administrator: ReviewColumns::default(),
                hr: ReviewColumns::default(),
                additional_notes: String::new(),
            }
        );
    }

    #[test]
    fn export_writes_header_then_one_line_per_claim() {
        let first = reviewed_claim();
        let mut second = reviewed_claim();
        second.id = ClaimId(2);
        second.reviews = ClaimReviews::default();

        let bytes = export_claims([&first, &second]).expect("export");
        let text = String::from_utf8(bytes).expect("utf-8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], claim_csv_header());
        assert_eq!(lines[1], REFERENCE_LINE);
        assert!(lines[2].starts_with("2,Monthly Report,"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn decode_accepts_crlf_terminated_lines() {
        let line = format!("{REFERENCE_LINE}\r\n");
        let record = decode_claim(&line, now()).expect("decodable line");
        assert_eq!(record.additional_notes, "No issues");
    }
}
