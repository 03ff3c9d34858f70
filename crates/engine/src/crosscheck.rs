//! Seller-directory cross-validation: every valid record is evaluated
//! against the counterpart sellers.json of its ad-system domain.
//!
//! Rule order per record (no short-circuit except where noted):
//! 1. no directory for the domain → NO_SELLERS_JSON, stop
//! 2. account id not among the sellers → *_ACCOUNT_ID_NOT_IN_DIRECTORY, stop
//! 3. count same-id sellers under this ad-system domain (never across domains)
//! 4. seller domain vs declared OWNERDOMAIN/MANAGERDOMAIN values (publisher
//!    domain as fallback); INTERMEDIARY/BOTH resellers are exempt
//! 5. seller_type vs relationship
//! 6. count from step 3 > 1 → SELLER_ID_NOT_UNIQUE
//!
//! Directory content and seller-id counts are fetched and computed once per
//! distinct ad-system domain within a call, and a provider failure for one
//! domain degrades to a per-record warning — it never aborts the others.

use std::collections::HashMap;

use crate::error::WarningCode;
use crate::model::{CrossCheckResults, Entry, Record, Relationship, SellerRecord, VariableType};
use crate::providers::{FetchStatus, SellersDirectoryProvider};
use crate::warnings::push_warning;

/// Cross-check every valid record in `entries`. With no publisher domain
/// this is a pure pass-through: the input comes back unchanged and no
/// lookups are issued.
pub fn cross_check_records(
    publisher_domain: Option<&str>,
    entries: Vec<Entry>,
    provider: &dyn SellersDirectoryProvider,
) -> Vec<Entry> {
    let publisher = match publisher_domain.map(str::trim) {
        Some(p) if !p.is_empty() => p.to_ascii_lowercase(),
        _ => return entries,
    };

    let declared = DeclaredDomains::harvest(&entries);
    let mut cache = DirectoryCache::new(provider);

    entries
        .into_iter()
        .map(|entry| match entry {
            Entry::Record(mut record) if record.is_valid() => {
                check_record(&mut record, &publisher, &declared, &mut cache);
                Entry::Record(record)
            }
            other => other,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Declared owner/manager domains
// ---------------------------------------------------------------------------

/// OWNERDOMAIN / MANAGERDOMAIN values harvested from the entry list,
/// lowercased. MANAGERDOMAIN values are taken before any `,COUNTRY` suffix.
struct DeclaredDomains {
    owners: Vec<String>,
    managers: Vec<String>,
}

impl DeclaredDomains {
    fn harvest(entries: &[Entry]) -> Self {
        let mut owners = Vec::new();
        let mut managers = Vec::new();
        for entry in entries {
            if let Entry::Variable(v) = entry {
                match v.variable_type {
                    VariableType::OwnerDomain => {
                        owners.push(v.value.trim().to_ascii_lowercase());
                    }
                    VariableType::ManagerDomain => {
                        let domain = v.value.split(',').next().unwrap_or("").trim();
                        if !domain.is_empty() {
                            managers.push(domain.to_ascii_lowercase());
                        }
                    }
                    _ => {}
                }
            }
        }
        Self { owners, managers }
    }

    fn is_empty(&self) -> bool {
        self.owners.is_empty() && self.managers.is_empty()
    }

    fn contains(&self, domain: &str) -> bool {
        self.owners.iter().any(|d| d == domain) || self.managers.iter().any(|d| d == domain)
    }
}

// ---------------------------------------------------------------------------
// Per-domain memoization
// ---------------------------------------------------------------------------

struct DirectoryData {
    sellers: Vec<SellerRecord>,
    /// Trimmed seller_id → occurrence count under this ad-system domain.
    id_counts: HashMap<String, usize>,
}

enum DirectoryLookup {
    Available(DirectoryData),
    Missing,
    Failed(String),
}

/// One-per-call memo of directory lookups, keyed by lowercased ad-system
/// domain. Owned by the call, so a single validation pass is race-free
/// without locking and no state leaks across calls.
struct DirectoryCache<'a> {
    provider: &'a dyn SellersDirectoryProvider,
    lookups: HashMap<String, DirectoryLookup>,
}

impl<'a> DirectoryCache<'a> {
    fn new(provider: &'a dyn SellersDirectoryProvider) -> Self {
        Self {
            provider,
            lookups: HashMap::new(),
        }
    }

    fn lookup(&mut self, domain: &str) -> &DirectoryLookup {
        let key = domain.trim().to_ascii_lowercase();
        if !self.lookups.contains_key(&key) {
            let looked_up = resolve_directory(self.provider, &key);
            self.lookups.insert(key.clone(), looked_up);
        }
        self.lookups.get(&key).unwrap()
    }
}

fn resolve_directory(
    provider: &dyn SellersDirectoryProvider,
    domain: &str,
) -> DirectoryLookup {
    let document = match provider.get_by_domain(domain) {
        Ok(Some(doc)) => doc,
        Ok(None) => return DirectoryLookup::Missing,
        Err(err) => return DirectoryLookup::Failed(err.to_string()),
    };

    if document.status != FetchStatus::Success || document.content.trim().is_empty() {
        return DirectoryLookup::Missing;
    }

    let directory = match provider.parse_content(&document.content) {
        Ok(dir) => dir,
        Err(err) => return DirectoryLookup::Failed(err.to_string()),
    };

    let mut id_counts: HashMap<String, usize> = HashMap::new();
    for seller in &directory.sellers {
        if let Some(id) = seller.seller_id.as_deref() {
            let id = id.trim();
            if !id.is_empty() {
                *id_counts.entry(id.to_string()).or_insert(0) += 1;
            }
        }
    }

    DirectoryLookup::Available(DirectoryData {
        sellers: directory.sellers,
        id_counts,
    })
}

// ---------------------------------------------------------------------------
// Per-record rule matrix
// ---------------------------------------------------------------------------

fn check_record(
    record: &mut Record,
    publisher_domain: &str,
    declared: &DeclaredDomains,
    cache: &mut DirectoryCache,
) {
    let relationship = match record.relationship {
        Some(rel) => rel,
        None => return,
    };

    let mut results = CrossCheckResults::default();
    let ad_system_domain = record.domain.to_ascii_lowercase();

    let data = match cache.lookup(&record.domain) {
        DirectoryLookup::Failed(message) => {
            let message = message.clone();
            record.validation = Some(results);
            push_warning(
                record,
                WarningCode::DirectoryValidationError,
                &[("domain", &ad_system_domain), ("message", &message)],
            );
            return;
        }
        DirectoryLookup::Missing => {
            results.has_sellers_json = Some(false);
            record.validation = Some(results);
            push_warning(record, WarningCode::NoSellersJson, &[("domain", &ad_system_domain)]);
            return;
        }
        DirectoryLookup::Available(data) => data,
    };

    results.has_sellers_json = Some(true);

    let account_id = record.account_id.trim().to_string();
    let matched = data
        .sellers
        .iter()
        .find(|s| s.seller_id.as_deref().map(str::trim) == Some(account_id.as_str()));

    let seller = match matched {
        Some(seller) => seller.clone(),
        None => {
            let (field, code) = match relationship {
                Relationship::Direct => (
                    &mut results.direct_account_id_in_directory,
                    WarningCode::DirectAccountIdNotInDirectory,
                ),
                Relationship::Reseller => (
                    &mut results.reseller_account_id_in_directory,
                    WarningCode::ResellerAccountIdNotInDirectory,
                ),
            };
            *field = Some(false);
            record.validation = Some(results);
            push_warning(
                record,
                code,
                &[("domain", &ad_system_domain), ("account_id", &account_id)],
            );
            return;
        }
    };

    match relationship {
        Relationship::Direct => results.direct_account_id_in_directory = Some(true),
        Relationship::Reseller => results.reseller_account_id_in_directory = Some(true),
    }

    // Step 3: same-domain occurrence count for this seller_id. Counts never
    // span ad-system domains.
    let id_count = data.id_counts.get(&account_id).copied().unwrap_or(0);

    let seller_type = seller
        .seller_type
        .as_deref()
        .map(|t| t.trim().to_ascii_uppercase());
    let confidential = seller.is_confidential.unwrap_or(false);
    let seller_domain = seller
        .domain
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_ascii_lowercase);

    // Step 4: domain match. Skipped for confidential or domain-less
    // sellers; INTERMEDIARY/BOTH resellers are exempt.
    if !confidential {
        if let Some(ref seller_domain) = seller_domain {
            let exempt = relationship == Relationship::Reseller
                && matches!(seller_type.as_deref(), Some("INTERMEDIARY") | Some("BOTH"));
            if !exempt {
                let matches = if declared.is_empty() {
                    seller_domain == publisher_domain
                } else {
                    declared.contains(seller_domain)
                };
                match relationship {
                    Relationship::Direct => results.direct_domain_matches = Some(matches),
                    Relationship::Reseller => results.reseller_domain_matches = Some(matches),
                }
                if !matches {
                    push_warning(
                        record,
                        WarningCode::DomainMismatch,
                        &[
                            ("domain", &ad_system_domain),
                            ("account_id", &account_id),
                            ("seller_domain", seller_domain),
                        ],
                    );
                }
            }
        }
    }

    // Step 5: seller_type vs relationship.
    match relationship {
        Relationship::Direct => {
            let ok = matches!(seller_type.as_deref(), Some("PUBLISHER") | Some("BOTH"));
            results.direct_entry_is_publisher = Some(ok);
            if !ok {
                push_warning(
                    record,
                    WarningCode::DirectNotPublisher,
                    &[("domain", &ad_system_domain), ("account_id", &account_id)],
                );
            }
        }
        Relationship::Reseller => {
            let ok = matches!(seller_type.as_deref(), Some("INTERMEDIARY") | Some("BOTH"));
            results.reseller_entry_is_intermediary = Some(ok);
            if !ok {
                push_warning(
                    record,
                    WarningCode::ResellerNotIntermediary,
                    &[("domain", &ad_system_domain), ("account_id", &account_id)],
                );
            }
        }
    }

    // Step 6: uniqueness within the ad-system domain.
    results.seller_id_is_unique = Some(id_count <= 1);
    if id_count > 1 {
        push_warning(
            record,
            WarningCode::SellerIdNotUnique,
            &[
                ("domain", &ad_system_domain),
                ("account_id", &account_id),
                ("count", &id_count.to_string()),
            ],
        );
    }

    results.matched_seller = Some(seller);
    record.validation = Some(results);
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;
    use crate::error::ProviderError;
    use crate::parser::parse_content;
    use crate::providers::CachedDocument;

    /// Directory provider over canned JSON, counting fetches per domain.
    struct StaticDirectories {
        directories: HashMap<String, String>,
        fetches: RefCell<Vec<String>>,
    }

    impl StaticDirectories {
        fn new(directories: &[(&str, &str)]) -> Self {
            Self {
                directories: directories
                    .iter()
                    .map(|(d, c)| (d.to_string(), c.to_string()))
                    .collect(),
                fetches: RefCell::new(Vec::new()),
            }
        }
    }

    impl SellersDirectoryProvider for StaticDirectories {
        fn get_by_domain(&self, domain: &str) -> Result<Option<CachedDocument>, ProviderError> {
            self.fetches.borrow_mut().push(domain.to_string());
            Ok(self.directories.get(domain).map(|content| CachedDocument {
                status: FetchStatus::Success,
                content: content.clone(),
            }))
        }
    }

    struct FailingDirectories;

    impl SellersDirectoryProvider for FailingDirectories {
        fn get_by_domain(&self, _domain: &str) -> Result<Option<CachedDocument>, ProviderError> {
            Err(ProviderError::Fetch("timeout".into()))
        }
    }

    fn records(entries: &[Entry]) -> Vec<&Record> {
        entries.iter().filter_map(Entry::as_record).collect()
    }

    fn openx() -> (&'static str, &'static str) {
        (
            "openx.com",
            r#"{"sellers": [
                {"seller_id": "541058490", "domain": "pub.example.com", "seller_type": "PUBLISHER"},
                {"seller_id": "reseller-1", "domain": "mid.example.net", "seller_type": "INTERMEDIARY"}
            ]}"#,
        )
    }

    #[test]
    fn no_publisher_domain_is_a_pass_through() {
        let provider = StaticDirectories::new(&[openx()]);
        let entries = parse_content("openx.com, 541058490, DIRECT\n", None);
        let result = cross_check_records(None, entries, &provider);

        assert!(!records(&result)[0].has_warning());
        assert!(records(&result)[0].validation.is_none());
        assert!(provider.fetches.borrow().is_empty(), "pass-through must not fetch");
    }

    #[test]
    fn missing_directory_yields_no_sellers_json() {
        let provider = StaticDirectories::new(&[]);
        let entries = parse_content("openx.com, 541058490, DIRECT\n", None);
        let result = cross_check_records(Some("pub.example.com"), entries, &provider);

        let r = records(&result)[0];
        assert_eq!(r.warning().map(|w| w.code), Some(WarningCode::NoSellersJson));
        let v = r.validation.as_ref().unwrap();
        assert_eq!(v.has_sellers_json, Some(false));
        assert_eq!(v.direct_account_id_in_directory, None);
    }

    #[test]
    fn unknown_direct_account_id() {
        let provider = StaticDirectories::new(&[openx()]);
        let entries = parse_content("openx.com, 999999, DIRECT\n", None);
        let result = cross_check_records(Some("pub.example.com"), entries, &provider);

        let r = records(&result)[0];
        let w = r.warning().unwrap();
        assert_eq!(w.code, WarningCode::DirectAccountIdNotInDirectory);
        assert_eq!(w.params["domain"], "openx.com");
        assert_eq!(w.params["account_id"], "999999");
        let v = r.validation.as_ref().unwrap();
        assert_eq!(v.has_sellers_json, Some(true));
        assert_eq!(v.direct_account_id_in_directory, Some(false));
        assert_eq!(v.seller_id_is_unique, None, "later cases stay not-applicable");
    }

    #[test]
    fn unknown_reseller_account_id_uses_reseller_code() {
        let provider = StaticDirectories::new(&[openx()]);
        let entries = parse_content("openx.com, 999999, RESELLER\n", None);
        let result = cross_check_records(Some("pub.example.com"), entries, &provider);

        assert_eq!(
            records(&result)[0].warning().map(|w| w.code),
            Some(WarningCode::ResellerAccountIdNotInDirectory)
        );
    }

    #[test]
    fn clean_direct_record_passes_all_cases() {
        let provider = StaticDirectories::new(&[openx()]);
        let entries = parse_content("openx.com, 541058490, DIRECT\n", None);
        let result = cross_check_records(Some("pub.example.com"), entries, &provider);

        let r = records(&result)[0];
        assert!(!r.has_warning(), "unexpected warnings: {:?}", r.warnings);
        let v = r.validation.as_ref().unwrap();
        assert_eq!(v.has_sellers_json, Some(true));
        assert_eq!(v.direct_account_id_in_directory, Some(true));
        assert_eq!(v.direct_domain_matches, Some(true));
        assert_eq!(v.direct_entry_is_publisher, Some(true));
        assert_eq!(v.seller_id_is_unique, Some(true));
        assert_eq!(
            v.matched_seller.as_ref().and_then(|s| s.domain.as_deref()),
            Some("pub.example.com")
        );
    }

    #[test]
    fn domain_mismatch_against_publisher_fallback() {
        let provider = StaticDirectories::new(&[(
            "openx.com",
            r#"{"sellers": [{"seller_id": "a1", "domain": "somebody-else.com", "seller_type": "PUBLISHER"}]}"#,
        )]);
        let entries = parse_content("openx.com, a1, DIRECT\n", None);
        let result = cross_check_records(Some("pub.example.com"), entries, &provider);

        let r = records(&result)[0];
        let w = r.warning().unwrap();
        assert_eq!(w.code, WarningCode::DomainMismatch);
        assert_eq!(w.params["seller_domain"], "somebody-else.com");
        assert_eq!(r.validation.as_ref().unwrap().direct_domain_matches, Some(false));
    }

    #[test]
    fn declared_owner_domain_wins_over_publisher_fallback() {
        let provider = StaticDirectories::new(&[(
            "openx.com",
            r#"{"sellers": [{"seller_id": "a1", "domain": "declared-owner.com", "seller_type": "PUBLISHER"}]}"#,
        )]);
        let entries = parse_content(
            "OWNERDOMAIN=declared-owner.com\nopenx.com, a1, DIRECT\n",
            None,
        );
        let result = cross_check_records(Some("pub.example.com"), entries, &provider);
        assert!(!records(&result)[0].has_warning());
    }

    #[test]
    fn managerdomain_value_is_taken_before_the_country_suffix() {
        let provider = StaticDirectories::new(&[(
            "openx.com",
            r#"{"sellers": [{"seller_id": "a1", "domain": "manager.example.net", "seller_type": "PUBLISHER"}]}"#,
        )]);
        let entries = parse_content(
            "MANAGERDOMAIN=manager.example.net,US\nopenx.com, a1, DIRECT\n",
            None,
        );
        let result = cross_check_records(Some("pub.example.com"), entries, &provider);
        assert!(!records(&result)[0].has_warning());
    }

    #[test]
    fn intermediary_reseller_is_exempt_from_domain_match() {
        let provider = StaticDirectories::new(&[openx()]);
        let entries = parse_content("openx.com, reseller-1, RESELLER\n", None);
        let result = cross_check_records(Some("pub.example.com"), entries, &provider);

        let r = records(&result)[0];
        assert!(!r.has_warning(), "unexpected warnings: {:?}", r.warnings);
        let v = r.validation.as_ref().unwrap();
        assert_eq!(v.reseller_domain_matches, None, "exempt case stays not-applicable");
        assert_eq!(v.reseller_entry_is_intermediary, Some(true));
    }

    #[test]
    fn confidential_seller_skips_domain_match() {
        let provider = StaticDirectories::new(&[(
            "openx.com",
            r#"{"sellers": [{"seller_id": "a1", "domain": "hidden.com", "seller_type": "PUBLISHER", "is_confidential": 1}]}"#,
        )]);
        let entries = parse_content("openx.com, a1, DIRECT\n", None);
        let result = cross_check_records(Some("pub.example.com"), entries, &provider);

        let r = records(&result)[0];
        assert!(!r.has_warning());
        assert_eq!(r.validation.as_ref().unwrap().direct_domain_matches, None);
    }

    #[test]
    fn direct_record_to_intermediary_seller() {
        let provider = StaticDirectories::new(&[(
            "openx.com",
            r#"{"sellers": [{"seller_id": "a1", "domain": "pub.example.com", "seller_type": "INTERMEDIARY"}]}"#,
        )]);
        let entries = parse_content("openx.com, a1, DIRECT\n", None);
        let result = cross_check_records(Some("pub.example.com"), entries, &provider);

        let r = records(&result)[0];
        assert_eq!(r.warning().map(|w| w.code), Some(WarningCode::DirectNotPublisher));
        assert_eq!(r.validation.as_ref().unwrap().direct_entry_is_publisher, Some(false));
    }

    #[test]
    fn reseller_record_to_publisher_seller() {
        let provider = StaticDirectories::new(&[(
            "openx.com",
            r#"{"sellers": [{"seller_id": "a1", "domain": "pub.example.com", "seller_type": "PUBLISHER"}]}"#,
        )]);
        let entries = parse_content("openx.com, a1, RESELLER\n", None);
        let result = cross_check_records(Some("pub.example.com"), entries, &provider);

        let r = records(&result)[0];
        // Publisher-typed seller: domain check applies (not exempt) and
        // matches; the type check fails.
        assert_eq!(
            r.warning().map(|w| w.code),
            Some(WarningCode::ResellerNotIntermediary)
        );
        assert_eq!(r.validation.as_ref().unwrap().reseller_domain_matches, Some(true));
    }

    #[test]
    fn duplicate_seller_ids_within_one_domain_only() {
        let provider = StaticDirectories::new(&[
            (
                "ssp-a.com",
                r#"{"sellers": [
                    {"seller_id": "541058490", "domain": "pub.example.com", "seller_type": "PUBLISHER"},
                    {"seller_id": "541058490", "domain": "pub.example.com", "seller_type": "INTERMEDIARY"}
                ]}"#,
            ),
            (
                "ssp-b.com",
                r#"{"sellers": [
                    {"seller_id": "541058490", "domain": "pub.example.com", "seller_type": "PUBLISHER"}
                ]}"#,
            ),
        ]);
        let entries = parse_content(
            "ssp-a.com, 541058490, DIRECT\nssp-b.com, 541058490, DIRECT\n",
            None,
        );
        let result = cross_check_records(Some("pub.example.com"), entries, &provider);
        let result = records(&result);

        let warned: Vec<WarningCode> = result[0].warnings.iter().map(|w| w.code).collect();
        assert!(warned.contains(&WarningCode::SellerIdNotUnique));
        assert_eq!(result[0].validation.as_ref().unwrap().seller_id_is_unique, Some(false));

        // Same id under a different ad-system domain is not non-unique.
        assert!(!result[1].has_warning(), "got {:?}", result[1].warnings);
        assert_eq!(result[1].validation.as_ref().unwrap().seller_id_is_unique, Some(true));
    }

    #[test]
    fn warnings_accumulate_without_short_circuit() {
        let provider = StaticDirectories::new(&[(
            "ssp-a.com",
            r#"{"sellers": [
                {"seller_id": "a1", "domain": "stranger.com", "seller_type": "INTERMEDIARY"},
                {"seller_id": "a1", "domain": "stranger.com", "seller_type": "INTERMEDIARY"}
            ]}"#,
        )]);
        let entries = parse_content("ssp-a.com, a1, DIRECT\n", None);
        let result = cross_check_records(Some("pub.example.com"), entries, &provider);

        let r = records(&result)[0];
        let codes: Vec<WarningCode> = r.warnings.iter().map(|w| w.code).collect();
        assert_eq!(
            codes,
            vec![
                WarningCode::DomainMismatch,
                WarningCode::DirectNotPublisher,
                WarningCode::SellerIdNotUnique,
            ]
        );
        assert_eq!(r.warning().map(|w| w.code), Some(WarningCode::DomainMismatch));
    }

    #[test]
    fn provider_failure_degrades_to_a_per_record_warning() {
        let entries = parse_content(
            "broken.com, a1, DIRECT\nbroken.com, a2, RESELLER\n",
            None,
        );
        let result = cross_check_records(Some("pub.example.com"), entries, &FailingDirectories);
        let result = records(&result);

        for r in &result {
            let w = r.warning().unwrap();
            assert_eq!(w.code, WarningCode::DirectoryValidationError);
            assert!(w.params["message"].contains("timeout"));
        }
    }

    #[test]
    fn directory_fetched_once_per_domain() {
        let provider = StaticDirectories::new(&[openx()]);
        let entries = parse_content(
            "openx.com, 541058490, DIRECT\nOPENX.COM, reseller-1, RESELLER\nopenx.com, 999, DIRECT\n",
            None,
        );
        let _ = cross_check_records(Some("pub.example.com"), entries, &provider);
        assert_eq!(provider.fetches.borrow().len(), 1, "one lookup per distinct domain");
    }

    #[test]
    fn malformed_directory_content_is_isolated() {
        let provider = StaticDirectories::new(&[
            ("bad.com", "<html>oops</html>"),
            openx(),
        ]);
        let entries = parse_content(
            "bad.com, a1, DIRECT\nopenx.com, 541058490, DIRECT\n",
            None,
        );
        let result = cross_check_records(Some("pub.example.com"), entries, &provider);
        let result = records(&result);

        assert_eq!(
            result[0].warning().map(|w| w.code),
            Some(WarningCode::DirectoryValidationError)
        );
        assert!(!result[1].has_warning(), "sibling record must be unaffected");
    }

    #[test]
    fn invalid_records_and_variables_pass_through() {
        let provider = StaticDirectories::new(&[openx()]);
        let entries = parse_content(
            "CONTACT=ads@pub.example.com\nsub.openx.com, x, DIRECT\n",
            None,
        );
        let result = cross_check_records(Some("pub.example.com"), entries, &provider);

        assert!(result[0].as_variable().is_some());
        let invalid = result[1].as_record().unwrap();
        assert!(!invalid.is_valid());
        assert!(invalid.validation.is_none());
        assert!(provider.fetches.borrow().is_empty(), "invalid records trigger no lookups");
    }
}
