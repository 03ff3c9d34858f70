//! Warning aggregation: every finding a record accrues is kept, in
//! detection order; the first one is the record's primary warning.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::WarningCode;
use crate::model::{Entry, Record, Warning};

/// Append a finding to a record. The record stays valid; only the warning
/// surface changes.
pub fn push_warning(record: &mut Record, code: WarningCode, params: &[(&str, &str)]) {
    record.warnings.push(Warning::new(code, params));
}

/// Roll-up counts over an annotated entry list.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub total_entries: usize,
    pub records: usize,
    pub variables: usize,
    pub invalid_records: usize,
    pub records_with_warnings: usize,
    pub warning_counts: BTreeMap<String, usize>,
    pub error_counts: BTreeMap<String, usize>,
}

/// Compute summary statistics from an annotated entry list.
pub fn summarize(entries: &[Entry]) -> ValidationSummary {
    let mut records = 0;
    let mut variables = 0;
    let mut invalid_records = 0;
    let mut records_with_warnings = 0;
    let mut warning_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut error_counts: BTreeMap<String, usize> = BTreeMap::new();

    for entry in entries {
        match entry {
            Entry::Variable(_) => variables += 1,
            Entry::Record(r) => {
                records += 1;
                if let Some(code) = r.error {
                    invalid_records += 1;
                    *error_counts.entry(code.as_str().to_string()).or_insert(0) += 1;
                }
                if r.has_warning() {
                    records_with_warnings += 1;
                }
                for warning in &r.warnings {
                    *warning_counts
                        .entry(warning.code.as_str().to_string())
                        .or_insert(0) += 1;
                }
            }
        }
    }

    ValidationSummary {
        total_entries: entries.len(),
        records,
        variables,
        invalid_records,
        records_with_warnings,
        warning_counts,
        error_counts,
    }
}
