use chrono::{DateTime, Utc};
use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::codec::claims::{decode_record, ClaimCsvRecord};
use crate::codec::reader;
use crate::domain::claim::{ClaimDetails, NewClaim};

pub const DEFAULT_PLACEHOLDER_LECTURER: &str = "Imported User";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// What an import file turns into before anything is persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportPlan {
    pub new_claims: Vec<NewClaim>,
    pub skipped: usize,
}

impl ImportPlan {
    pub fn summary(&self, imported: usize) -> ImportSummary {
        ImportSummary { imported, skipped: self.skipped }
    }
}

/// Reads an uploaded claims file. The first line is a header; blank lines
/// are ignored without counting. Only rows whose id is zero (or unreadable)
/// become new claims; every other row, and every row that fails to decode,
/// is counted as skipped, as is a row whose hours times rate does not fit in
/// a `Decimal`. Imported claims always restart the review chain, so exported
/// tier columns are ignored.
pub fn plan_import(input: &[u8], placeholder_lecturer: &str, now: DateTime<Utc>) -> ImportPlan {
    let mut plan = ImportPlan::default();
    let mut reader = reader(input);

    for (index, row) in reader.byte_records().enumerate() {
        if index == 0 {
            continue;
        }

        let record = match row {
            Ok(bytes) => StringRecord::from_byte_record_lossy(bytes),
            Err(_) => {
                plan.skipped += 1;
                continue;
            }
        };

        if is_blank(&record) {
            continue;
        }

        match decode_record(&record, now) {
            Some(decoded) if decoded.is_new() && has_representable_total(&decoded) => {
                plan.new_claims.push(into_new_claim(decoded, placeholder_lecturer));
            }
            _ => plan.skipped += 1,
        }
    }

    plan
}

fn has_representable_total(record: &ClaimCsvRecord) -> bool {
    record.hours_worked.checked_mul(record.hourly_rate).is_some()
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

fn into_new_claim(record: ClaimCsvRecord, placeholder_lecturer: &str) -> NewClaim {
    let lecturer_name = if record.lecturer_name.trim().is_empty() {
        placeholder_lecturer.to_string()
    } else {
        record.lecturer_name
    };
    let additional_notes =
        if record.additional_notes.is_empty() { None } else { Some(record.additional_notes) };

    NewClaim {
        lecturer_name,
        details: ClaimDetails {
            title: record.title,
            description: record.description,
            hours_worked: record.hours_worked,
            hourly_rate: record.hourly_rate,
            additional_notes,
        },
    }
}
