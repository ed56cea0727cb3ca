use crate::cache::ResultCache;
use crate::cmr::SearchTransport;
use crate::domain::{ConceptId, Entry, QueryIdentity, ResourceType};
use crate::error::CmrError;
use crate::events::{CatalogEvent, DownloadScope, EventSink};
use crate::naming::{NamingPolicy, Resolution, dataset_name, granule_name};
use crate::retrieval::{CachedRetrieval, RetrievalSource};
use crate::search::PagedFetcher;

#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub provider: String,
    pub project: String,
    pub update_collections: bool,
    pub update_granules: bool,
    pub naming: NamingPolicy,
}

#[derive(Debug, Clone)]
pub struct NamedGranule {
    pub concept_id: ConceptId,
    pub name: String,
    pub entry: Entry,
}

/// One collection with every granule that belongs to it, ready to be written out.
#[derive(Debug, Clone)]
pub struct CollectionGranules {
    pub collection: Entry,
    pub concept_id: ConceptId,
    pub dataset: String,
    pub granules: Vec<NamedGranule>,
    pub granule_hits: u64,
    pub granule_source: RetrievalSource,
}

pub struct CatalogWalker<'a, T: SearchTransport> {
    retrieval: CachedRetrieval<'a, T>,
    options: WalkOptions,
}

impl<'a, T: SearchTransport> CatalogWalker<'a, T> {
    pub fn new(cache: &'a ResultCache, fetcher: &'a PagedFetcher<T>, options: WalkOptions) -> Self {
        Self {
            retrieval: CachedRetrieval::new(cache, fetcher),
            options,
        }
    }

    pub fn collections_query(&self) -> QueryIdentity {
        QueryIdentity::new(ResourceType::Collections)
            .param("project", self.options.project.as_str())
            .param("data_center", self.options.provider.as_str())
    }

    pub fn granules_query(concept_id: &ConceptId) -> QueryIdentity {
        QueryIdentity::new(ResourceType::Granules).param("concept_id", concept_id.as_str())
    }

    /// Retrieves the collection list and returns a walk over its collections.
    /// Granules are only retrieved as the walk advances.
    pub fn run<'w>(&'w self, sink: &'w dyn EventSink) -> Result<CatalogWalk<'w, T>, CmrError> {
        let retrieved = self.retrieval.retrieve(
            &self.collections_query(),
            DownloadScope::Collections,
            self.options.update_collections,
            sink,
        )?;
        tracing::info!(
            collections = retrieved.results.len(),
            source = ?retrieved.source,
            "collections retrieved"
        );
        Ok(CatalogWalk {
            walker: self,
            sink,
            collections: retrieved.results.into_entries().into_iter(),
            finished: false,
        })
    }

    fn pair(
        &self,
        collection: Entry,
        sink: &dyn EventSink,
    ) -> Result<Option<CollectionGranules>, CmrError> {
        let described = self
            .options
            .naming
            .resolve(describe_collection(&collection))?;
        let (concept_id, dataset) = match described {
            Resolution::Keep(described) => described,
            Resolution::Skip(err) => {
                skip(sink, &collection.id, err);
                return Ok(None);
            }
        };

        let retrieved = self.retrieval.retrieve(
            &Self::granules_query(&concept_id),
            DownloadScope::Granules {
                dataset: dataset.clone(),
            },
            self.options.update_granules,
            sink,
        )?;
        let granule_hits = retrieved.results.total_hits;
        let granule_source = retrieved.source;

        let mut granules = Vec::new();
        for entry in retrieved.results.into_entries() {
            match self.options.naming.resolve(describe_granule(&dataset, &entry))? {
                Resolution::Keep((concept_id, name)) => granules.push(NamedGranule {
                    concept_id,
                    name,
                    entry,
                }),
                Resolution::Skip(err) => skip(sink, &entry.id, err),
            }
        }

        tracing::info!(%dataset, granules = granules.len(), "collection ready");
        Ok(Some(CollectionGranules {
            collection,
            concept_id,
            dataset,
            granules,
            granule_hits,
            granule_source,
        }))
    }
}

/// Lazy sequence of [`CollectionGranules`], one per collection. Stops after the first error.
pub struct CatalogWalk<'w, T: SearchTransport> {
    walker: &'w CatalogWalker<'w, T>,
    sink: &'w dyn EventSink,
    collections: std::vec::IntoIter<Entry>,
    finished: bool,
}

impl<T: SearchTransport> CatalogWalk<'_, T> {
    pub fn remaining(&self) -> usize {
        if self.finished {
            0
        } else {
            self.collections.len()
        }
    }
}

impl<T: SearchTransport> Iterator for CatalogWalk<'_, T> {
    type Item = Result<CollectionGranules, CmrError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let collection = self.collections.next()?;
            match self.walker.pair(collection, self.sink) {
                Ok(Some(pairing)) => return Some(Ok(pairing)),
                Ok(None) => continue,
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

fn describe_collection(collection: &Entry) -> Result<(ConceptId, String), CmrError> {
    let concept_id = collection.concept_id()?;
    let short_name = collection
        .short_name()
        .ok_or_else(|| CmrError::NameDerivation {
            kind: "dataset",
            value: collection.id.clone(),
            message: "collection has no short_name".to_string(),
        })?;
    Ok((concept_id, dataset_name(short_name)?))
}

fn describe_granule(dataset: &str, granule: &Entry) -> Result<(ConceptId, String), CmrError> {
    let concept_id = granule.concept_id()?;
    let title = granule.title().ok_or_else(|| CmrError::NameDerivation {
        kind: "granule",
        value: granule.id.clone(),
        message: "granule has no title".to_string(),
    })?;
    Ok((concept_id, granule_name(dataset, title)?))
}

fn skip(sink: &dyn EventSink, what: &str, err: CmrError) {
    tracing::warn!(entry = what, error = %err, "skipping misnamed entry");
    sink.event(CatalogEvent::Skipped {
        what: what.to_string(),
        message: err.to_string(),
    });
}
