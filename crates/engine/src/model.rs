use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ParseErrorCode, ProviderError, WarningCode};

/// Line number assigned to entries synthesized by the parser rather than
/// read from the document.
pub const GENERATED_LINE: i32 = -1;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One parsed line of an ads.txt-style document.
#[derive(Debug, Clone)]
pub enum Entry {
    Record(Record),
    Variable(Variable),
}

impl Entry {
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Entry::Record(r) => Some(r),
            Entry::Variable(_) => None,
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Entry::Record(_) => None,
            Entry::Variable(v) => Some(v),
        }
    }
}

/// An advertising-system record line:
/// `domain, account_id, relationship[, certification_authority_id]`.
///
/// `domain` compares case-insensitively, `account_id` case-sensitively.
/// `account_type` keeps the raw third-field token as written; a valid
/// record always carries a parsed `relationship`.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub domain: String,
    pub account_id: String,
    pub account_type: String,
    pub relationship: Option<Relationship>,
    pub certification_authority_id: Option<String>,
    pub line_number: i32,
    pub raw_line: String,
    /// `Some` iff the line failed to parse.
    pub error: Option<ParseErrorCode>,
    /// Every finding against this record, in detection order. The first
    /// one is the primary warning.
    pub warnings: Vec<Warning>,
    /// Latest cross-check pass; fully replaced on re-run.
    pub validation: Option<CrossCheckResults>,
    pub duplicate_domain: Option<String>,
}

impl Record {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn has_warning(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// The primary (first-detected) warning, if any.
    pub fn warning(&self) -> Option<&Warning> {
        self.warnings.first()
    }
}

/// A `TYPE=value` variable line. Variables are always valid.
#[derive(Debug, Clone, Serialize)]
pub struct Variable {
    pub variable_type: VariableType,
    pub value: String,
    pub line_number: i32,
    pub raw_line: String,
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Declared relationship between publisher and account. Never a raw token
/// after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Relationship {
    Direct,
    Reseller,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "DIRECT",
            Self::Reseller => "RESELLER",
        }
    }

    /// Case-insensitive exact match; `None` for anything else.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("DIRECT") {
            Some(Self::Direct)
        } else if token.eq_ignore_ascii_case("RESELLER") {
            Some(Self::Reseller)
        } else {
            None
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed five-member variable-type set. Declaration order is the
/// canonical section order in optimized output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VariableType {
    Contact,
    Subdomain,
    InventoryPartnerDomain,
    OwnerDomain,
    ManagerDomain,
}

impl VariableType {
    pub const ALL: [VariableType; 5] = [
        VariableType::Contact,
        VariableType::Subdomain,
        VariableType::InventoryPartnerDomain,
        VariableType::OwnerDomain,
        VariableType::ManagerDomain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "CONTACT",
            Self::Subdomain => "SUBDOMAIN",
            Self::InventoryPartnerDomain => "INVENTORYPARTNERDOMAIN",
            Self::OwnerDomain => "OWNERDOMAIN",
            Self::ManagerDomain => "MANAGERDOMAIN",
        }
    }

    /// Case-insensitive match against the fixed set.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|vt| token.eq_ignore_ascii_case(vt.as_str()))
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// One finding against a record: a stable code plus string parameters
/// (deterministically ordered for serialization).
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub code: WarningCode,
    pub params: BTreeMap<String, String>,
}

impl Warning {
    pub fn new(code: WarningCode, params: &[(&str, &str)]) -> Self {
        Self {
            code,
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cross-check outcome
// ---------------------------------------------------------------------------

/// Outcome of every rule case of one cross-check pass. `None` means the
/// case did not apply to this record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrossCheckResults {
    pub has_sellers_json: Option<bool>,
    pub direct_account_id_in_directory: Option<bool>,
    pub reseller_account_id_in_directory: Option<bool>,
    pub direct_domain_matches: Option<bool>,
    pub reseller_domain_matches: Option<bool>,
    pub direct_entry_is_publisher: Option<bool>,
    pub reseller_entry_is_intermediary: Option<bool>,
    pub seller_id_is_unique: Option<bool>,
    /// Snapshot of the matched directory entry, if one was found.
    pub matched_seller: Option<SellerRecord>,
}

// ---------------------------------------------------------------------------
// Seller directory (externally sourced, read-only)
// ---------------------------------------------------------------------------

/// One entry of a sellers.json directory. Real-world files are sloppy:
/// seller_id may arrive as a JSON number and is_confidential as 0/1, so
/// both fields deserialize tolerantly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerRecord {
    #[serde(default, deserialize_with = "de_string_or_number")]
    pub seller_id: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub seller_type: Option<String>,
    #[serde(default, deserialize_with = "de_bool_or_int")]
    pub is_confidential: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A parsed sellers.json document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SellersDirectory {
    #[serde(default)]
    pub sellers: Vec<SellerRecord>,
    #[serde(default)]
    pub identifiers: Option<serde_json::Value>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default, deserialize_with = "de_string_or_number")]
    pub version: Option<String>,
}

impl SellersDirectory {
    pub fn from_json(raw: &str) -> Result<Self, ProviderError> {
        serde_json::from_str(raw).map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

fn de_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn de_bool_or_int<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => Some(b),
        Some(serde_json::Value::Number(n)) => Some(n.as_i64() == Some(1)),
        _ => None,
    })
}
