//! Duplicate detection against a previously known version of the same
//! publisher's document.

use std::collections::HashSet;

use crate::error::WarningCode;
use crate::model::{Entry, Record, Relationship};
use crate::parser::parse_content;
use crate::providers::{AdsTxtCacheProvider, FetchStatus};
use crate::warnings::push_warning;

/// Lookup key for duplicate detection: domain lowercased, account id
/// case-sensitive, relationship. The same triple is the canonicalizer's
/// record identity.
pub fn duplicate_key(record: &Record) -> Option<(String, String, Relationship)> {
    record
        .relationship
        .map(|rel| (record.domain.to_ascii_lowercase(), record.account_id.clone(), rel))
}

/// Mark every valid candidate already present among `known` records with a
/// DUPLICATE warning. Duplication is a warning, never a hard error: the
/// record stays valid.
pub fn mark_duplicates(publisher_domain: &str, entries: Vec<Entry>, known: &[Record]) -> Vec<Entry> {
    let index: HashSet<(String, String, Relationship)> = known
        .iter()
        .filter(|r| r.is_valid())
        .filter_map(duplicate_key)
        .collect();

    if index.is_empty() {
        return entries;
    }

    entries
        .into_iter()
        .map(|entry| match entry {
            Entry::Record(mut record) if record.is_valid() => {
                let is_duplicate = duplicate_key(&record)
                    .map(|key| index.contains(&key))
                    .unwrap_or(false);
                if is_duplicate {
                    push_warning(
                        &mut record,
                        WarningCode::Duplicate,
                        &[("domain", publisher_domain)],
                    );
                    record.duplicate_domain = Some(publisher_domain.to_string());
                }
                Entry::Record(record)
            }
            other => other,
        })
        .collect()
}

/// Pull the previously known document for `publisher_domain` from the
/// cache collaborator and mark duplicates against it. A missing, stale, or
/// unreadable prior document degrades to "no duplicates detectable" — the
/// entries come back unchanged, never an error.
pub fn check_against_cached(
    publisher_domain: &str,
    entries: Vec<Entry>,
    cache: &dyn AdsTxtCacheProvider,
) -> Vec<Entry> {
    let known: Vec<Record> = match cache.get_by_domain(publisher_domain) {
        Ok(Some(doc)) if doc.status == FetchStatus::Success => {
            parse_content(&doc.content, None)
                .into_iter()
                .filter_map(|e| match e {
                    Entry::Record(r) if r.is_valid() => Some(r),
                    _ => None,
                })
                .collect()
        }
        _ => Vec::new(),
    };

    mark_duplicates(publisher_domain, entries, &known)
}
