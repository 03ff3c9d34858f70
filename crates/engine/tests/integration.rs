//! End-to-end engine flow: parse → duplicate-check → cross-check →
//! canonicalize, with in-memory collaborators.

use std::collections::HashMap;

use sellercheck_engine::{
    check_against_cached, cross_check_records, optimize_ads_txt, parse_content,
    AdsTxtCacheProvider, CachedDocument, Entry, FetchStatus, ProviderError, Record, Relationship,
    SellersDirectoryProvider, VariableType, WarningCode,
};

struct StaticCache(HashMap<String, String>);

impl AdsTxtCacheProvider for StaticCache {
    fn get_by_domain(&self, domain: &str) -> Result<Option<CachedDocument>, ProviderError> {
        Ok(self.0.get(domain).map(|content| CachedDocument {
            status: FetchStatus::Success,
            content: content.clone(),
        }))
    }
}

struct StaticDirectories(HashMap<String, String>);

impl SellersDirectoryProvider for StaticDirectories {
    fn get_by_domain(&self, domain: &str) -> Result<Option<CachedDocument>, ProviderError> {
        Ok(self.0.get(domain).map(|content| CachedDocument {
            status: FetchStatus::Success,
            content: content.clone(),
        }))
    }
}

fn records(entries: &[Entry]) -> Vec<&Record> {
    entries.iter().filter_map(Entry::as_record).collect()
}

const DOCUMENT: &str = "\
CONTACT=a@b.com
google.com, pub-1, DIRECT
adnetwork.com, abcd, RESELLER, f08c47fec0942fa0
";

#[test]
fn parse_yields_records_variables_and_synthesized_owner() {
    let entries = parse_content(DOCUMENT, Some("pub.example.com"));
    assert_eq!(entries.len(), 4);

    let recs = records(&entries);
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].domain, "google.com");
    assert_eq!(recs[0].relationship, Some(Relationship::Direct));
    assert_eq!(recs[1].certification_authority_id.as_deref(), Some("f08c47fec0942fa0"));

    let variables: Vec<_> = entries.iter().filter_map(Entry::as_variable).collect();
    assert_eq!(variables.len(), 2);
    assert_eq!(variables[0].variable_type, VariableType::Contact);
    assert_eq!(variables[1].variable_type, VariableType::OwnerDomain);
    assert_eq!(variables[1].value, "example.com");
    assert_eq!(variables[1].line_number, -1);
}

#[test]
fn full_validation_pass() {
    let cache = StaticCache(HashMap::from([(
        "pub.example.com".to_string(),
        "google.com, pub-1, DIRECT\n".to_string(),
    )]));
    let directories = StaticDirectories(HashMap::from([(
        "google.com".to_string(),
        r#"{"sellers": [
            {"seller_id": "pub-1", "domain": "example.com", "seller_type": "PUBLISHER"}
        ]}"#
        .to_string(),
    )]));

    let entries = parse_content(DOCUMENT, Some("pub.example.com"));
    let entries = check_against_cached("pub.example.com", entries, &cache);
    let entries = cross_check_records(Some("pub.example.com"), entries, &directories);

    let recs = records(&entries);

    // google.com record: duplicate of the previously known version, but
    // otherwise clean against the directory (the synthesized
    // OWNERDOMAIN=example.com matches the seller's domain).
    let codes: Vec<WarningCode> = recs[0].warnings.iter().map(|w| w.code).collect();
    assert_eq!(codes, vec![WarningCode::Duplicate]);
    assert_eq!(recs[0].duplicate_domain.as_deref(), Some("pub.example.com"));
    let validation = recs[0].validation.as_ref().unwrap();
    assert_eq!(validation.has_sellers_json, Some(true));
    assert_eq!(validation.direct_account_id_in_directory, Some(true));
    assert_eq!(validation.direct_domain_matches, Some(true));
    assert_eq!(validation.direct_entry_is_publisher, Some(true));
    assert_eq!(validation.seller_id_is_unique, Some(true));

    // adnetwork.com publishes no sellers.json.
    assert_eq!(
        recs[1].warning().map(|w| w.code),
        Some(WarningCode::NoSellersJson)
    );
    assert!(recs[1].is_valid());
}

#[test]
fn rerun_replaces_validation_results() {
    let empty = StaticDirectories(HashMap::new());
    let full = StaticDirectories(HashMap::from([(
        "google.com".to_string(),
        r#"{"sellers": [{"seller_id": "pub-1", "domain": "example.com", "seller_type": "PUBLISHER"}]}"#.to_string(),
    )]));

    let entries = parse_content("google.com, pub-1, DIRECT\n", Some("example.com"));
    let entries = cross_check_records(Some("example.com"), entries, &empty);
    assert_eq!(
        records(&entries)[0].validation.as_ref().unwrap().has_sellers_json,
        Some(false)
    );

    let entries = cross_check_records(Some("example.com"), entries, &full);
    let validation = records(&entries)[0].validation.clone().unwrap();
    assert_eq!(validation.has_sellers_json, Some(true));
    assert_eq!(validation.direct_account_id_in_directory, Some(true));
}

#[test]
fn optimize_normalizes_the_document() {
    let out = optimize_ads_txt(DOCUMENT, Some("pub.example.com"));
    let expected = "\
# ads.txt

# CONTACT Variables
CONTACT=a@b.com

# OWNERDOMAIN Variables
OWNERDOMAIN=example.com

# Advertising System Records
adnetwork.com, abcd, RESELLER, f08c47fec0942fa0
google.com, pub-1, DIRECT
";
    assert_eq!(out, expected);
    assert_eq!(optimize_ads_txt(&out, Some("pub.example.com")), out);
}
