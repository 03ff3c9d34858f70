//! Domain and relationship validators used by the line classifier.

use crate::model::Relationship;

/// Maximum edit distance at which a bad relationship token is diagnosed as
/// a misspelling rather than garbage.
const MISSPELL_DISTANCE: usize = 2;

/// Reduce a domain to its registrable (public-suffix-plus-one) form,
/// lowercased. `None` for empty input, whitespace-carrying input, or names
/// the public-suffix list cannot reduce (bare suffixes, single labels).
pub fn root_domain(domain: &str) -> Option<String> {
    let lowered = domain.trim().to_ascii_lowercase();
    if lowered.is_empty() || lowered.chars().any(char::is_whitespace) {
        return None;
    }
    psl::domain_str(&lowered).map(str::to_string)
}

/// Whether `domain` already is a registrable root domain. Subdomains,
/// bare suffixes, and anything containing whitespace are rejected.
pub fn is_root_domain(domain: &str) -> bool {
    match root_domain(domain) {
        Some(root) => root == domain.trim().to_ascii_lowercase(),
        None => false,
    }
}

/// Typo-tolerant relationship matcher: `Some` on an exact
/// (case-insensitive) DIRECT/RESELLER token, which is just
/// [`Relationship::parse`] re-exported for the classifier's use.
pub fn match_relationship(token: &str) -> Option<Relationship> {
    Relationship::parse(token)
}

/// Whether a non-matching token is close enough to DIRECT or RESELLER to
/// be diagnosed as a misspelling.
pub fn is_misspelled_relationship(token: &str) -> bool {
    let upper = token.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return false;
    }
    strsim::levenshtein(&upper, "DIRECT") <= MISSPELL_DISTANCE
        || strsim::levenshtein(&upper, "RESELLER") <= MISSPELL_DISTANCE
}
