#![allow(dead_code)]

use std::sync::Mutex;

use camino::Utf8PathBuf;

use cmr_curl::cmr::{Page, PageCursor, PageRequest, SearchTransport};
use cmr_curl::config::ResolvedConfig;
use cmr_curl::domain::{Entry, QueryIdentity, ResourceType, SearchResponse};
use cmr_curl::error::CmrError;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub resource: ResourceType,
    pub params: Vec<(String, String)>,
    pub cursor: PageCursor,
}

struct Feed {
    identity: QueryIdentity,
    pages: Vec<Vec<Entry>>,
    hits: u64,
}

/// Scripted CMR: answers known queries page by page and fails on anything else.
#[derive(Default)]
pub struct FakeCmr {
    feeds: Vec<Feed>,
    omit_hits: bool,
    omit_scroll_id: bool,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeCmr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(self, identity: QueryIdentity, pages: Vec<Vec<Entry>>) -> Self {
        let hits = pages.iter().map(|page| page.len() as u64).sum();
        self.feed_with_hits(identity, pages, hits)
    }

    pub fn feed_with_hits(
        mut self,
        identity: QueryIdentity,
        pages: Vec<Vec<Entry>>,
        hits: u64,
    ) -> Self {
        self.feeds.push(Feed {
            identity,
            pages,
            hits,
        });
        self
    }

    pub fn without_hits(mut self) -> Self {
        self.omit_hits = true;
        self
    }

    pub fn without_scroll_id(mut self) -> Self {
        self.omit_scroll_id = true;
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl SearchTransport for FakeCmr {
    fn search_page(&self, request: &PageRequest<'_>) -> Result<Page, CmrError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            resource: request.resource,
            params: request.params.to_vec(),
            cursor: request.cursor.clone(),
        });

        let position = self
            .feeds
            .iter()
            .position(|feed| {
                feed.identity.resource() == request.resource
                    && feed.identity.params() == request.params
            })
            .ok_or_else(|| CmrError::Status {
                status: 400,
                message: format!("unexpected {} query", request.resource),
            })?;
        let feed = &self.feeds[position];
        let scroll_id = format!("scroll-{position}");

        let index = match &request.cursor {
            PageCursor::ScrollStart => 0,
            PageCursor::ScrollContinue(id) => {
                if *id != scroll_id {
                    return Err(CmrError::Status {
                        status: 404,
                        message: format!("unknown scroll id {id}"),
                    });
                }
                requests
                    .iter()
                    .filter(|seen| seen.cursor == PageCursor::ScrollContinue(scroll_id.clone()))
                    .count()
            }
            PageCursor::PageNumber(page) => *page as usize - 1,
        };
        let entries = feed.pages.get(index).cloned().unwrap_or_default();

        Ok(Page {
            response: SearchResponse::from_entries(entries),
            hits: (!self.omit_hits).then_some(feed.hits),
            scroll_id: (!self.omit_scroll_id).then_some(scroll_id),
        })
    }
}

pub fn collection(id: &str, short_name: &str) -> Entry {
    Entry::new(id).with_field("short_name", short_name)
}

pub fn granule(id: &str, title: &str) -> Entry {
    Entry::new(id).with_field("title", title)
}

pub fn entries(prefix: &str, count: usize) -> Vec<Entry> {
    (1..=count)
        .map(|n| Entry::new(format!("{prefix}{n}")))
        .collect()
}

pub fn utf8_dir(temp: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap()
}

pub fn test_config(root: &Utf8PathBuf) -> ResolvedConfig {
    ResolvedConfig {
        provider: "ORNL_DAAC".to_string(),
        project: "ABoVE".to_string(),
        cache_dir: root.join("tmp"),
        output_dir: root.join("out"),
        ..ResolvedConfig::default()
    }
}

pub fn collections_query() -> QueryIdentity {
    QueryIdentity::new(ResourceType::Collections)
        .param("project", "ABoVE")
        .param("data_center", "ORNL_DAAC")
}

pub fn granules_query(concept_id: &str) -> QueryIdentity {
    QueryIdentity::new(ResourceType::Granules).param("concept_id", concept_id)
}
