use std::sync::Mutex;

/// Which query a download event belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadScope {
    Collections,
    Granules { dataset: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStage {
    Starting,
    Cached,
    Succeeded { count: usize },
    Failed { message: String },
    CachedFailed { message: String },
    CacheWriteFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStage {
    Starting,
    Succeeded { lines: usize },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    Download {
        scope: DownloadScope,
        stage: DownloadStage,
    },
    CurlFile {
        dataset: String,
        path: String,
        stage: WriteStage,
    },
    Skipped {
        what: String,
        message: String,
    },
}

impl CatalogEvent {
    /// Stable snake_case name, e.g. `granules_download_cached_failed`.
    pub fn label(&self) -> &'static str {
        match self {
            CatalogEvent::Download { scope, stage } => match (scope, stage) {
                (DownloadScope::Collections, DownloadStage::Starting) => {
                    "collections_download_starting"
                }
                (DownloadScope::Collections, DownloadStage::Cached) => "collections_download_cached",
                (DownloadScope::Collections, DownloadStage::Succeeded { .. }) => {
                    "collections_download_succeeded"
                }
                (DownloadScope::Collections, DownloadStage::Failed { .. }) => {
                    "collections_download_failed"
                }
                (DownloadScope::Collections, DownloadStage::CachedFailed { .. }) => {
                    "collections_download_cached_failed"
                }
                (DownloadScope::Collections, DownloadStage::CacheWriteFailed { .. }) => {
                    "collections_cache_write_failed"
                }
                (DownloadScope::Granules { .. }, DownloadStage::Starting) => {
                    "granules_download_starting"
                }
                (DownloadScope::Granules { .. }, DownloadStage::Cached) => "granules_download_cached",
                (DownloadScope::Granules { .. }, DownloadStage::Succeeded { .. }) => {
                    "granules_download_succeeded"
                }
                (DownloadScope::Granules { .. }, DownloadStage::Failed { .. }) => {
                    "granules_download_failed"
                }
                (DownloadScope::Granules { .. }, DownloadStage::CachedFailed { .. }) => {
                    "granules_download_cached_failed"
                }
                (DownloadScope::Granules { .. }, DownloadStage::CacheWriteFailed { .. }) => {
                    "granules_cache_write_failed"
                }
            },
            CatalogEvent::CurlFile { stage, .. } => match stage {
                WriteStage::Starting => "writing_curl_file_starting",
                WriteStage::Succeeded { .. } => "writing_curl_file_succeeded",
                WriteStage::Failed { .. } => "writing_curl_file_failed",
            },
            CatalogEvent::Skipped { .. } => "entry_skipped",
        }
    }
}

/// Receives lifecycle notifications from retrieval and the catalog walk.
pub trait EventSink {
    fn event(&self, event: CatalogEvent);
}

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<CatalogEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<CatalogEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.events().iter().map(CatalogEvent::label).collect()
    }
}

impl EventSink for RecordingSink {
    fn event(&self, event: CatalogEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
