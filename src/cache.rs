use std::fs;

use camino::Utf8PathBuf;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::domain::{KeyStyle, QueryIdentity, ResultSet, SearchResponse};
use crate::error::CmrError;
use crate::store::Store;

/// Search results persisted as one pretty-printed JSON document per query.
#[derive(Debug, Clone)]
pub struct ResultCache {
    store: Store,
    key_style: KeyStyle,
}

impl ResultCache {
    pub fn new(store: Store, key_style: KeyStyle) -> Self {
        Self { store, key_style }
    }

    pub fn key_style(&self) -> KeyStyle {
        self.key_style
    }

    pub fn path(&self, identity: &QueryIdentity) -> Utf8PathBuf {
        self.store
            .cache_path(&cache_file_name(identity, self.key_style))
    }

    pub fn exists(&self, identity: &QueryIdentity) -> bool {
        self.path(identity).as_std_path().is_file()
    }

    pub fn read(&self, identity: &QueryIdentity) -> Result<ResultSet, CmrError> {
        let path = self.path(identity);
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| CmrError::Storage(format!("read {path}: {err}")))?;
        let response: SearchResponse =
            serde_json::from_str(&content).map_err(|err| CmrError::CacheCorrupt {
                path: path.to_string(),
                message: err.to_string(),
            })?;
        tracing::debug!(%path, entries = response.feed.entry.len(), "cache read");
        Ok(ResultSet::from_stored(response))
    }

    pub fn write(&self, identity: &QueryIdentity, results: &ResultSet) -> Result<(), CmrError> {
        let path = self.path(identity);
        let content = to_pretty_json(&results.response)?;
        Store::write_bytes_atomic(&path, &content)?;
        tracing::debug!(%path, entries = results.len(), "cache written");
        Ok(())
    }
}

/// File name for a query. Positional keys join the parameter values only, so
/// the same values in the same order always map to the same file.
pub fn cache_file_name(identity: &QueryIdentity, style: KeyStyle) -> String {
    let key = match style {
        KeyStyle::Positional => identity.values().collect::<Vec<_>>().join("_"),
        KeyStyle::Named => {
            let mut pairs = identity
                .params()
                .iter()
                .map(|(name, value)| format!("{name}-{value}"))
                .collect::<Vec<_>>();
            pairs.sort();
            pairs.join("_")
        }
    };
    format!("{}_{}.json", identity.resource(), key)
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, CmrError> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .map_err(|err| CmrError::Storage(err.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceType;

    fn collections_query() -> QueryIdentity {
        QueryIdentity::new(ResourceType::Collections)
            .param("project", "ABoVE")
            .param("data_center", "ORNL_DAAC")
    }

    #[test]
    fn positional_key_joins_values_in_order() {
        assert_eq!(
            cache_file_name(&collections_query(), KeyStyle::Positional),
            "collections_ABoVE_ORNL_DAAC.json"
        );
        let reordered = QueryIdentity::new(ResourceType::Collections)
            .param("data_center", "ORNL_DAAC")
            .param("project", "ABoVE");
        assert_eq!(
            cache_file_name(&reordered, KeyStyle::Positional),
            "collections_ORNL_DAAC_ABoVE.json"
        );
    }

    #[test]
    fn positional_key_collides_on_equal_values() {
        let a = QueryIdentity::new(ResourceType::Granules).param("concept_id", "C1");
        let b = QueryIdentity::new(ResourceType::Granules).param("collection_concept_id", "C1");
        assert_eq!(
            cache_file_name(&a, KeyStyle::Positional),
            cache_file_name(&b, KeyStyle::Positional)
        );
        assert_ne!(
            cache_file_name(&a, KeyStyle::Named),
            cache_file_name(&b, KeyStyle::Named)
        );
    }

    #[test]
    fn named_key_ignores_parameter_order() {
        let reordered = QueryIdentity::new(ResourceType::Collections)
            .param("data_center", "ORNL_DAAC")
            .param("project", "ABoVE");
        assert_eq!(
            cache_file_name(&collections_query(), KeyStyle::Named),
            "collections_data_center-ORNL_DAAC_project-ABoVE.json"
        );
        assert_eq!(
            cache_file_name(&reordered, KeyStyle::Named),
            cache_file_name(&collections_query(), KeyStyle::Named)
        );
    }

    #[test]
    fn pretty_json_uses_four_space_indent() {
        let bytes = to_pretty_json(&SearchResponse::from_entries(Vec::new())).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\n    \"feed\""));
    }
}
