//! Canonicalizer: deduplicate, group, sort, and re-serialize a document
//! into its normalized text form.
//!
//! The output is deterministic and the function is idempotent:
//! `optimize(optimize(x)) == optimize(x)` for every input, including
//! malformed ones (invalid entries are silently discarded).

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::model::{Entry, Record, Relationship, Variable, VariableType};
use crate::parser::parse_content;

const DEFAULT_FILE_COMMENT: &str = "# ads.txt";
const RECORDS_HEADER: &str = "# Advertising System Records";

/// Canonicalize an ads.txt-style document. Invalid lines are dropped,
/// variables and records are deduplicated (first occurrence wins), grouped,
/// sorted, and re-serialized under section headers. A default OWNERDOMAIN
/// is synthesized when absent and a publisher domain is supplied.
pub fn optimize_ads_txt(text: &str, publisher_domain: Option<&str>) -> String {
    let entries = parse_content(text, publisher_domain);

    let mut variables: Vec<Variable> = Vec::new();
    let mut seen_variables: HashSet<(VariableType, String)> = HashSet::new();
    let mut records: Vec<Record> = Vec::new();
    let mut seen_records: HashSet<(String, String, Relationship)> = HashSet::new();

    for entry in entries {
        match entry {
            Entry::Variable(v) => {
                if seen_variables.insert((v.variable_type, v.value.to_ascii_lowercase())) {
                    variables.push(v);
                }
            }
            Entry::Record(r) => {
                let relationship = match (r.is_valid(), r.relationship) {
                    (true, Some(rel)) => rel,
                    _ => continue,
                };
                let key = (r.domain.to_ascii_lowercase(), r.account_id.clone(), relationship);
                if seen_records.insert(key) {
                    records.push(r);
                }
            }
        }
    }

    variables.sort_by(|a, b| {
        a.variable_type
            .cmp(&b.variable_type)
            .then_with(|| compare_ci(&a.value, &b.value))
    });

    records.sort_by(|a, b| {
        compare_ci(&a.domain, &b.domain)
            .then_with(|| a.relationship.cmp(&b.relationship))
            .then_with(|| a.account_id.cmp(&b.account_id))
    });

    serialize(&variables, &records, file_comment(text))
}

/// Case-insensitive ordering with a case-sensitive tiebreak, so equal-but-
/// for-case keys still order deterministically.
fn compare_ci(a: &str, b: &str) -> Ordering {
    a.to_ascii_lowercase()
        .cmp(&b.to_ascii_lowercase())
        .then_with(|| a.cmp(b))
}

/// The first comment line of the original document, or the default.
fn file_comment(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|line| line.starts_with('#'))
        .unwrap_or(DEFAULT_FILE_COMMENT)
}

fn serialize(variables: &[Variable], records: &[Record], comment: &str) -> String {
    let mut out = String::new();
    out.push_str(comment);
    out.push_str("\n\n");

    if variables.is_empty() {
        // Both section headers are always present, even with no body.
        out.push_str("# Variables\n\n");
    } else {
        let mut current_type: Option<VariableType> = None;
        for variable in variables {
            if current_type != Some(variable.variable_type) {
                if current_type.is_some() {
                    out.push('\n');
                }
                out.push_str(&format!("# {} Variables\n", variable.variable_type));
                current_type = Some(variable.variable_type);
            }
            out.push_str(&format!("{}={}\n", variable.variable_type, variable.value));
        }
        out.push('\n');
    }

    out.push_str(RECORDS_HEADER);
    out.push('\n');
    for record in records {
        let relationship = record.relationship.map(|r| r.as_str()).unwrap_or_default();
        match &record.certification_authority_id {
            Some(cert) => out.push_str(&format!(
                "{}, {}, {}, {}\n",
                record.domain, record.account_id, relationship, cert
            )),
            None => out.push_str(&format!(
                "{}, {}, {}\n",
                record.domain, record.account_id, relationship
            )),
        }
    }

    out
}
