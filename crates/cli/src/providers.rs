//! Provider implementations wired into the engine: local cache first,
//! then HTTP, with write-through.

use chrono::Duration;

use sellercheck_engine::{
    AdsTxtCacheProvider, CachedDocument, FetchStatus, ProviderError, SellersDirectoryProvider,
};
use sellercheck_store::{DocumentKind, DocumentStore, StoredDocument};

use crate::fetch::FetchClient;

/// Previously known ads.txt copies for duplicate detection. Reads the
/// cache only — the "previously known version" is whatever the last run
/// stored, regardless of age.
pub struct CachedAdsTxtProvider<'a> {
    pub store: &'a DocumentStore,
}

impl AdsTxtCacheProvider for CachedAdsTxtProvider<'_> {
    fn get_by_domain(&self, domain: &str) -> Result<Option<CachedDocument>, ProviderError> {
        let row = self
            .store
            .get(DocumentKind::AdsTxt, domain, Duration::MAX)
            .map_err(|e| ProviderError::Fetch(e.to_string()))?;
        Ok(row.and_then(usable))
    }
}

/// Seller directories: fresh cache rows are served as-is (negative results
/// included), everything else goes to HTTP and is written through. With no
/// client (`--offline`) the cache is consulted regardless of age and
/// misses stay misses.
pub struct CachingDirectoryProvider<'a> {
    pub store: &'a DocumentStore,
    pub client: Option<&'a FetchClient>,
    pub ttl: Duration,
    pub base_url: Option<String>,
}

impl SellersDirectoryProvider for CachingDirectoryProvider<'_> {
    fn get_by_domain(&self, domain: &str) -> Result<Option<CachedDocument>, ProviderError> {
        let ttl = if self.client.is_none() { Duration::MAX } else { self.ttl };
        let cached = self
            .store
            .get(DocumentKind::SellersJson, domain, ttl)
            .unwrap_or(None);
        if let Some(row) = cached {
            return Ok(usable(row));
        }

        let client = match self.client {
            Some(client) => client,
            None => return Ok(None),
        };

        let (status, content) = client
            .fetch_document(DocumentKind::SellersJson, domain, self.base_url.as_deref())
            .map_err(|e| ProviderError::Fetch(e.message))?;

        // Cache failures degrade silently; the fetched result still flows.
        let _ = self.store.put(DocumentKind::SellersJson, domain, status, &content);

        Ok(match status {
            FetchStatus::Success => Some(CachedDocument { status, content }),
            _ => None,
        })
    }
}

/// A stored row only counts as a document when its fetch succeeded;
/// cached negatives answer "no document" without another fetch.
fn usable(row: StoredDocument) -> Option<CachedDocument> {
    match row.status {
        FetchStatus::Success => Some(CachedDocument {
            status: row.status,
            content: row.content,
        }),
        FetchStatus::NotFound | FetchStatus::Error => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adstxt_provider_serves_cached_copies_of_any_age() {
        let store = DocumentStore::open_in_memory().unwrap();
        store
            .put(DocumentKind::AdsTxt, "pub.example.com", FetchStatus::Success, "google.com, 1, DIRECT\n")
            .unwrap();

        let provider = CachedAdsTxtProvider { store: &store };
        let doc = provider.get_by_domain("pub.example.com").unwrap().unwrap();
        assert!(doc.content.contains("google.com"));
        assert!(provider.get_by_domain("other.com").unwrap().is_none());
    }

    #[test]
    fn cached_not_found_answers_without_a_document() {
        let store = DocumentStore::open_in_memory().unwrap();
        store
            .put(DocumentKind::SellersJson, "openx.com", FetchStatus::NotFound, "")
            .unwrap();

        let provider = CachingDirectoryProvider {
            store: &store,
            client: None,
            ttl: Duration::hours(24),
            base_url: None,
        };
        assert!(provider.get_by_domain("openx.com").unwrap().is_none());
    }

    #[test]
    fn offline_misses_stay_misses() {
        let store = DocumentStore::open_in_memory().unwrap();
        let provider = CachingDirectoryProvider {
            store: &store,
            client: None,
            ttl: Duration::hours(24),
            base_url: None,
        };
        assert!(provider.get_by_domain("never-fetched.com").unwrap().is_none());
    }
}
