use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::{ResourceType, SearchResponse};
use crate::error::CmrError;

pub const HITS_HEADER: &str = "cmr-hits";
pub const SCROLL_ID_HEADER: &str = "cmr-scroll-id";

/// Where in a paged result a request points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// First page of a scroll session (`scroll=true`).
    ScrollStart,
    /// Any later page of that session, identified by the server's handle.
    ScrollContinue(String),
    /// Explicit 1-based page number.
    PageNumber(u32),
}

#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub resource: ResourceType,
    pub params: &'a [(String, String)],
    pub page_size: u32,
    pub cursor: PageCursor,
}

impl PageRequest<'_> {
    /// Query-string pairs for this request, caller parameters first.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.params.to_vec();
        pairs.push(("page_size".to_string(), self.page_size.to_string()));
        match &self.cursor {
            PageCursor::ScrollStart | PageCursor::ScrollContinue(_) => {
                pairs.push(("scroll".to_string(), "true".to_string()));
            }
            PageCursor::PageNumber(1) => {}
            PageCursor::PageNumber(page) => {
                pairs.push(("page_num".to_string(), page.to_string()));
            }
        }
        pairs
    }
}

/// One page as it came off the wire.
#[derive(Debug, Clone)]
pub struct Page {
    pub response: SearchResponse,
    pub hits: Option<u64>,
    pub scroll_id: Option<String>,
}

pub trait SearchTransport: Send + Sync {
    fn search_page(&self, request: &PageRequest<'_>) -> Result<Page, CmrError>;
}

#[derive(Clone)]
pub struct CmrHttpClient {
    client: Client,
    base_url: String,
}

impl CmrHttpClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, CmrError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("cmr-curl/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| CmrError::Transport(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| CmrError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn search_url(&self, resource: ResourceType) -> String {
        format!("{}/{}", self.base_url, resource.as_str())
    }

    fn handle_status(response: Response) -> Result<Response, CmrError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "CMR request failed".to_string());
        Err(CmrError::Status { status, message })
    }

    fn send_with_retries<F>(&self, mut make_req: F) -> Result<Response, CmrError>
    where
        F: FnMut() -> RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        tracing::debug!(status, attempt, "retrying CMR request");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        tracing::debug!(error = %err, attempt, "retrying CMR request");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(CmrError::Transport(err.to_string()));
                }
            }
        }
    }
}

impl SearchTransport for CmrHttpClient {
    fn search_page(&self, request: &PageRequest<'_>) -> Result<Page, CmrError> {
        let url = self.search_url(request.resource);
        let query = request.query_pairs();
        let response = self.send_with_retries(|| {
            let builder = self.client.get(&url).query(&query);
            match &request.cursor {
                PageCursor::ScrollContinue(scroll_id) => {
                    builder.header(SCROLL_ID_HEADER, scroll_id.as_str())
                }
                _ => builder,
            }
        })?;
        let response = Self::handle_status(response)?;

        let hits = response
            .headers()
            .get(HITS_HEADER)
            .map(|value| {
                value
                    .to_str()
                    .ok()
                    .and_then(|text| text.trim().parse::<u64>().ok())
                    .ok_or_else(|| {
                        CmrError::Protocol(format!("unparsable {HITS_HEADER} header: {value:?}"))
                    })
            })
            .transpose()?;
        let scroll_id = response
            .headers()
            .get(SCROLL_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body: SearchResponse = response
            .json()
            .map_err(|err| CmrError::Transport(format!("malformed response from {url}: {err}")))?;

        Ok(Page {
            response: body,
            hits,
            scroll_id,
        })
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}
