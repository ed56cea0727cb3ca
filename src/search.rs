use crate::cmr::{PageCursor, PageRequest, SearchTransport};
use crate::domain::{PagingStrategy, QueryIdentity, ResultSet, SearchResponse};
use crate::error::CmrError;

/// Upper bound on results a page-number walk will try to cover.
const PAGE_NUMBER_RESULT_CEILING: u32 = 1_000_000;

/// Reassembles every page of a search into one [`ResultSet`].
pub struct PagedFetcher<T: SearchTransport> {
    transport: T,
    page_size: u32,
    strategy: PagingStrategy,
}

impl<T: SearchTransport> PagedFetcher<T> {
    pub fn new(transport: T, page_size: u32, strategy: PagingStrategy) -> Self {
        Self {
            transport,
            page_size,
            strategy,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn strategy(&self) -> PagingStrategy {
        self.strategy
    }

    pub fn fetch(&self, identity: &QueryIdentity) -> Result<ResultSet, CmrError> {
        if self.page_size == 0 {
            return Err(CmrError::Protocol("page size of zero".to_string()));
        }
        match self.strategy {
            PagingStrategy::Scroll => self.fetch_scroll(identity),
            PagingStrategy::PageNumber => self.fetch_numbered(identity),
        }
    }

    fn request<'a>(&self, identity: &'a QueryIdentity, cursor: PageCursor) -> PageRequest<'a> {
        PageRequest {
            resource: identity.resource(),
            params: identity.params(),
            page_size: self.page_size,
            cursor,
        }
    }

    fn fetch_scroll(&self, identity: &QueryIdentity) -> Result<ResultSet, CmrError> {
        let page_size = u64::from(self.page_size);
        tracing::debug!(resource = %identity.resource(), "requesting first scroll page");
        let first = self
            .transport
            .search_page(&self.request(identity, PageCursor::ScrollStart))?;
        let hits = first.hits.ok_or_else(|| {
            CmrError::Protocol("response carries no CMR-Hits header".to_string())
        })?;

        let first_count = first.response.feed.entry.len() as u64;
        let mut remaining = hits.div_ceil(page_size).saturating_sub(1);
        if remaining > 0 && first_count < page_size {
            tracing::warn!(hits, first_count, "first page is short; treating it as the end");
            remaining = 0;
        }

        let mut response = first.response;
        if remaining == 0 {
            return Ok(ResultSet::new(response, hits));
        }

        let mut scroll_id = first.scroll_id.ok_or_else(|| {
            CmrError::Protocol(format!(
                "{hits} hits need more than one page but no CMR-Scroll-Id was returned"
            ))
        })?;

        for page_index in 1..=remaining {
            tracing::debug!(
                resource = %identity.resource(),
                page = page_index + 1,
                of = remaining + 1,
                "requesting scroll page"
            );
            let page = self.transport.search_page(
                &self.request(identity, PageCursor::ScrollContinue(scroll_id.clone())),
            )?;
            if let Some(next) = page.scroll_id {
                scroll_id = next;
            }
            let count = page.response.feed.entry.len() as u64;
            response.feed.entry.extend(page.response.feed.entry);
            if count < page_size {
                if page_index < remaining {
                    tracing::warn!(
                        hits,
                        received = response.feed.entry.len(),
                        "short scroll page before the expected end"
                    );
                }
                break;
            }
        }

        Ok(ResultSet::new(response, hits))
    }

    fn fetch_numbered(&self, identity: &QueryIdentity) -> Result<ResultSet, CmrError> {
        let ceiling = (PAGE_NUMBER_RESULT_CEILING / self.page_size).max(2);
        let mut response: Option<SearchResponse> = None;

        for page_num in 1..ceiling {
            tracing::debug!(resource = %identity.resource(), page = page_num, "requesting page");
            let page = self
                .transport
                .search_page(&self.request(identity, PageCursor::PageNumber(page_num)))?;
            let exhausted = page.response.feed.entry.is_empty();
            response = Some(match response.take() {
                Some(mut accumulated) => {
                    accumulated.feed.entry.extend(page.response.feed.entry);
                    accumulated
                }
                None => page.response,
            });
            if exhausted {
                let response = response.unwrap_or_else(|| SearchResponse::from_entries(Vec::new()));
                return Ok(ResultSet::from_stored(response));
            }
        }

        tracing::warn!(ceiling, "page ceiling reached before an empty page");
        let response = response.unwrap_or_else(|| SearchResponse::from_entries(Vec::new()));
        Ok(ResultSet::from_stored(response))
    }
}
