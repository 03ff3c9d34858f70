//! `sellercheck-engine` — ads.txt / sellers.json validation engine.
//!
//! Pure engine crate: receives already-materialized document text and
//! directory data, returns annotated entries or canonicalized text.
//! No HTTP or storage dependencies — collaborators are injected through
//! the provider traits in [`providers`].

pub mod crosscheck;
pub mod domain;
pub mod duplicates;
pub mod error;
pub mod model;
pub mod optimizer;
pub mod parser;
pub mod providers;
pub mod warnings;

pub use crosscheck::cross_check_records;
pub use duplicates::{check_against_cached, mark_duplicates};
pub use error::{ParseErrorCode, ProviderError, WarningCode};
pub use model::{Entry, Record, Relationship, Variable, VariableType};
pub use optimizer::optimize_ads_txt;
pub use parser::{parse_content, parse_line};
pub use providers::{AdsTxtCacheProvider, CachedDocument, FetchStatus, SellersDirectoryProvider};
pub use warnings::{summarize, ValidationSummary};
