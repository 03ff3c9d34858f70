//! Collaborator seams. The engine never reaches into a concrete transport
//! or persistence layer — callers inject these traits.

use serde::Serialize;

use crate::error::ProviderError;
use crate::model::SellersDirectory;

/// How a previously fetched document attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Success,
    NotFound,
    Error,
}

impl FetchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotFound => "not_found",
            Self::Error => "error",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "success" => Some(Self::Success),
            "not_found" => Some(Self::NotFound),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// A document as a collaborator hands it back: the terminal status of the
/// fetch that produced it, plus the raw text.
#[derive(Debug, Clone)]
pub struct CachedDocument {
    pub status: FetchStatus,
    pub content: String,
}

/// Prior ads.txt text for a publisher domain, used by duplicate detection.
pub trait AdsTxtCacheProvider {
    fn get_by_domain(&self, domain: &str) -> Result<Option<CachedDocument>, ProviderError>;
}

/// Seller directory (sellers.json) access for an ad-system domain, used by
/// the cross-validator. `parse_content` has a default implementation over
/// the standard JSON shape; providers with pre-parsed storage may override
/// it.
pub trait SellersDirectoryProvider {
    fn get_by_domain(&self, domain: &str) -> Result<Option<CachedDocument>, ProviderError>;

    fn parse_content(&self, raw: &str) -> Result<SellersDirectory, ProviderError> {
        SellersDirectory::from_json(raw)
    }
}
