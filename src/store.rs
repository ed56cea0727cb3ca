use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::CmrError;

pub const CURL_SCRIPT_NAME: &str = "metadata.curl";
/// Sibling directory holding in-flight writes until they are renamed into place.
pub const STAGING_DIR_NAME: &str = ".partial";

/// Directory layout shared by the query cache and the generated scripts.
#[derive(Debug, Clone)]
pub struct Store {
    cache_root: Utf8PathBuf,
    output_root: Utf8PathBuf,
}

impl Store {
    pub fn new_with_paths(cache_root: Utf8PathBuf, output_root: Utf8PathBuf) -> Self {
        Self {
            cache_root,
            output_root,
        }
    }

    pub fn cache_root(&self) -> &Utf8Path {
        &self.cache_root
    }

    pub fn output_root(&self) -> &Utf8Path {
        &self.output_root
    }

    pub fn cache_path(&self, file_name: &str) -> Utf8PathBuf {
        self.cache_root.join(file_name)
    }

    pub fn dataset_metadata_dir(&self, dataset: &str) -> Utf8PathBuf {
        self.output_root.join(dataset).join("metadata")
    }

    pub fn curl_script_path(&self, dataset: &str) -> Utf8PathBuf {
        self.dataset_metadata_dir(dataset).join(CURL_SCRIPT_NAME)
    }

    pub fn ensure_cache_root(&self) -> Result<(), CmrError> {
        fs::create_dir_all(self.cache_root.as_std_path())
            .map_err(|err| CmrError::Storage(format!("create {}: {err}", self.cache_root)))
    }

    pub fn ensure_output_root(&self) -> Result<(), CmrError> {
        fs::create_dir_all(self.output_root.as_std_path())
            .map_err(|err| CmrError::Storage(format!("create {}: {err}", self.output_root)))
    }

    /// Replaces `path` wholesale; a failure leaves any previous file untouched.
    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), CmrError> {
        let parent = path
            .parent()
            .ok_or_else(|| CmrError::Storage(format!("invalid destination path {path}")))?;
        let staging = parent.join(STAGING_DIR_NAME);
        fs::create_dir_all(staging.as_std_path())
            .map_err(|err| CmrError::Storage(format!("create {staging}: {err}")))?;
        let mut temp = tempfile::Builder::new()
            .prefix("cmr-curl")
            .suffix(".tmp")
            .tempfile_in(staging.as_std_path())
            .map_err(|err| CmrError::Storage(format!("temp file in {staging}: {err}")))?;
        temp.write_all(content)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|err| CmrError::Storage(format!("write {path}: {err}")))?;
        temp.persist(path.as_std_path())
            .map_err(|err| CmrError::Storage(format!("persist {path}: {}", err.error)))?;
        Ok(())
    }
}
