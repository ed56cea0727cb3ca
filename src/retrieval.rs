use serde::Serialize;

use crate::cache::ResultCache;
use crate::cmr::SearchTransport;
use crate::domain::{QueryIdentity, ResultSet};
use crate::error::CmrError;
use crate::events::{CatalogEvent, DownloadScope, DownloadStage, EventSink};
use crate::search::PagedFetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetrievalSource {
    /// Served from a valid cache entry, no request was made.
    Cache,
    /// Fetched because there was no cache entry or the cache was bypassed.
    Live,
    /// Fetched because the cache entry could not be read.
    Refetched,
}

#[derive(Debug, Clone)]
pub struct Retrieved {
    pub results: ResultSet,
    pub source: RetrievalSource,
    pub cache_written: bool,
}

/// Cache-first retrieval of one query, falling back to a paged live fetch.
pub struct CachedRetrieval<'a, T: SearchTransport> {
    cache: &'a ResultCache,
    fetcher: &'a PagedFetcher<T>,
}

impl<'a, T: SearchTransport> CachedRetrieval<'a, T> {
    pub fn new(cache: &'a ResultCache, fetcher: &'a PagedFetcher<T>) -> Self {
        Self { cache, fetcher }
    }

    pub fn retrieve(
        &self,
        identity: &QueryIdentity,
        scope: DownloadScope,
        ignore_cache: bool,
        sink: &dyn EventSink,
    ) -> Result<Retrieved, CmrError> {
        let notify = |stage: DownloadStage| {
            sink.event(CatalogEvent::Download {
                scope: scope.clone(),
                stage,
            });
        };

        let mut source = RetrievalSource::Live;
        if ignore_cache {
            tracing::debug!(resource = %identity.resource(), "cache bypassed");
        } else if self.cache.exists(identity) {
            notify(DownloadStage::Cached);
            match self.cache.read(identity) {
                Ok(results) => {
                    notify(DownloadStage::Succeeded {
                        count: results.len(),
                    });
                    return Ok(Retrieved {
                        results,
                        source: RetrievalSource::Cache,
                        cache_written: false,
                    });
                }
                Err(err) if err.is_recoverable_cache_error() => {
                    tracing::warn!(error = %err, "discarding unreadable cache entry");
                    notify(DownloadStage::CachedFailed {
                        message: err.to_string(),
                    });
                    source = RetrievalSource::Refetched;
                }
                Err(err) => return Err(err),
            }
        } else {
            tracing::debug!(path = %self.cache.path(identity), "cache miss");
        }

        notify(DownloadStage::Starting);
        let results = match self.fetcher.fetch(identity) {
            Ok(results) => results,
            Err(err) => {
                notify(DownloadStage::Failed {
                    message: err.to_string(),
                });
                return Err(err);
            }
        };

        let cache_written = match self.cache.write(identity, &results) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "keeping fetched results without caching them");
                notify(DownloadStage::CacheWriteFailed {
                    message: err.to_string(),
                });
                false
            }
        };
        notify(DownloadStage::Succeeded {
            count: results.len(),
        });

        Ok(Retrieved {
            results,
            source,
            cache_written,
        })
    }
}
