use serde::Serialize;

use crate::cache::ResultCache;
use crate::cmr::SearchTransport;
use crate::config::ResolvedConfig;
use crate::curl::CurlScriptWriter;
use crate::error::CmrError;
use crate::events::EventSink;
use crate::retrieval::RetrievalSource;
use crate::search::PagedFetcher;
use crate::store::Store;
use crate::walker::{CatalogWalker, WalkOptions};

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub collections: usize,
    pub datasets: Vec<DatasetSummary>,
    pub finished_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub dataset: String,
    pub concept_id: String,
    pub granules: usize,
    pub granule_hits: u64,
    pub granule_source: RetrievalSource,
    pub script_path: String,
}

pub struct App<T: SearchTransport> {
    config: ResolvedConfig,
    store: Store,
    cache: ResultCache,
    fetcher: PagedFetcher<T>,
}

impl<T: SearchTransport> App<T> {
    pub fn new(config: ResolvedConfig, transport: T) -> Self {
        let store = Store::new_with_paths(config.cache_dir.clone(), config.output_dir.clone());
        let cache = ResultCache::new(store.clone(), config.cache_key);
        let fetcher = PagedFetcher::new(transport, config.page_size, config.paging);
        Self {
            config,
            store,
            cache,
            fetcher,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn fetcher(&self) -> &PagedFetcher<T> {
        &self.fetcher
    }

    /// Walks the catalog and writes one curl script per collection.
    ///
    /// The first fatal error ends the run; scripts written for earlier
    /// collections and any cache entries stay on disk.
    pub fn run(&self, sink: &dyn EventSink) -> Result<RunSummary, CmrError> {
        self.store.ensure_cache_root()?;
        self.store.ensure_output_root()?;

        let walker = CatalogWalker::new(
            &self.cache,
            &self.fetcher,
            WalkOptions {
                provider: self.config.provider.clone(),
                project: self.config.project.clone(),
                update_collections: self.config.update_collections,
                update_granules: self.config.update_granules,
                naming: self.config.on_naming_error,
            },
        );
        let writer = CurlScriptWriter::new(&self.store, &self.config.base_url);

        let walk = walker.run(sink)?;
        let collections = walk.remaining();
        let mut datasets = Vec::with_capacity(collections);
        for pairing in walk {
            let pairing = pairing?;
            let script_path = writer.write(&pairing, sink)?;
            datasets.push(DatasetSummary {
                dataset: pairing.dataset,
                concept_id: pairing.concept_id.to_string(),
                granules: pairing.granules.len(),
                granule_hits: pairing.granule_hits,
                granule_source: pairing.granule_source,
                script_path: script_path.to_string(),
            });
        }

        Ok(RunSummary {
            collections,
            datasets,
            finished_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}
