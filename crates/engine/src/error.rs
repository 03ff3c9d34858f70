use std::fmt;

/// Why a line failed to parse. Invalid records carry exactly one of these;
/// they are kept in the parse result for diagnostics but excluded from
/// canonicalized output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorCode {
    /// Fewer than 3 comma-separated fields.
    MissingFields,
    /// Variable-shaped line that is not a usable variable (unknown key or
    /// empty value).
    InvalidFormat,
    /// Relationship token is neither DIRECT nor RESELLER and not close to
    /// either.
    InvalidRelationship,
    /// Relationship token within edit distance 2 of DIRECT or RESELLER.
    MisspelledRelationship,
    /// Domain is not a registrable (public-suffix-plus-one) domain.
    InvalidRootDomain,
    /// Empty account id field.
    EmptyAccountId,
}

impl ParseErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingFields => "MISSING_FIELDS",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InvalidRelationship => "INVALID_RELATIONSHIP",
            Self::MisspelledRelationship => "MISSPELLED_RELATIONSHIP",
            Self::InvalidRootDomain => "INVALID_ROOT_DOMAIN",
            Self::EmptyAccountId => "EMPTY_ACCOUNT_ID",
        }
    }
}

impl fmt::Display for ParseErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finding raised against a syntactically valid record. Warnings never
/// flip a record to invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// Record already present in the previously known document version.
    Duplicate,
    /// No sellers.json available for the record's ad-system domain.
    NoSellersJson,
    /// DIRECT account id not found in the seller directory.
    DirectAccountIdNotInDirectory,
    /// RESELLER account id not found in the seller directory.
    ResellerAccountIdNotInDirectory,
    /// Matched seller's domain matches neither the declared owner/manager
    /// domains nor the publisher domain.
    DomainMismatch,
    /// DIRECT record whose seller is not PUBLISHER or BOTH.
    DirectNotPublisher,
    /// RESELLER record whose seller is not INTERMEDIARY or BOTH.
    ResellerNotIntermediary,
    /// seller_id appears more than once under the same ad-system domain.
    SellerIdNotUnique,
    /// Directory fetch or parse failed for this record's ad-system domain.
    DirectoryValidationError,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicate => "DUPLICATE",
            Self::NoSellersJson => "NO_SELLERS_JSON",
            Self::DirectAccountIdNotInDirectory => "DIRECT_ACCOUNT_ID_NOT_IN_DIRECTORY",
            Self::ResellerAccountIdNotInDirectory => "RESELLER_ACCOUNT_ID_NOT_IN_DIRECTORY",
            Self::DomainMismatch => "DOMAIN_MISMATCH",
            Self::DirectNotPublisher => "DIRECT_NOT_PUBLISHER",
            Self::ResellerNotIntermediary => "RESELLER_NOT_INTERMEDIARY",
            Self::SellerIdNotUnique => "SELLER_ID_NOT_UNIQUE",
            Self::DirectoryValidationError => "DIRECTORY_VALIDATION_ERROR",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure crossing the provider seam. The cross-validator converts these
/// into per-record `DIRECTORY_VALIDATION_ERROR` warnings; they are never
/// allowed to abort sibling records.
#[derive(Debug, Clone)]
pub enum ProviderError {
    /// Document could not be retrieved (transport, storage, …).
    Fetch(String),
    /// Document was retrieved but its content is malformed.
    Parse(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(msg) => write!(f, "fetch error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

impl serde::Serialize for ParseErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl serde::Serialize for WarningCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
