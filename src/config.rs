use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{KeyStyle, PagingStrategy};
use crate::error::CmrError;
use crate::naming::NamingPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "cmr-curl.json";
pub const DEFAULT_BASE_URL: &str = "https://cmr.earthdata.nasa.gov/search";
pub const DEFAULT_PAGE_SIZE: u32 = 2000;

/// On-disk configuration. Every field is optional; gaps are filled by [`ConfigLoader`].
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub paging: Option<PagingStrategy>,
    #[serde(default)]
    pub cache_key: Option<KeyStyle>,
    #[serde(default)]
    pub on_naming_error: Option<NamingPolicy>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub update_collections: Option<bool>,
    #[serde(default)]
    pub update_granules: Option<bool>,
}

/// Values supplied on the command line; they win over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub provider: Option<String>,
    pub project: Option<String>,
    pub cache_dir: Option<String>,
    pub output_dir: Option<String>,
    pub page_size: Option<u32>,
    pub paging: Option<PagingStrategy>,
    pub update_collections: bool,
    pub update_granules: bool,
    pub skip_misnamed: bool,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub provider: String,
    pub project: String,
    pub base_url: String,
    pub cache_dir: Utf8PathBuf,
    pub output_dir: Utf8PathBuf,
    pub page_size: u32,
    pub paging: PagingStrategy,
    pub cache_key: KeyStyle,
    pub on_naming_error: NamingPolicy,
    pub timeout: Option<Duration>,
    pub update_collections: bool,
    pub update_granules: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            provider: "ORNL_DAAC".to_string(),
            project: "ABoVE".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: Utf8PathBuf::from("./tmp"),
            output_dir: Utf8PathBuf::from("./out"),
            page_size: DEFAULT_PAGE_SIZE,
            paging: PagingStrategy::Scroll,
            cache_key: KeyStyle::Positional,
            on_naming_error: NamingPolicy::Abort,
            timeout: None,
            update_collections: false,
            update_granules: false,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(
        path: Option<&str>,
        overrides: &ConfigOverrides,
    ) -> Result<ResolvedConfig, CmrError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| CmrError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content).map_err(|err| CmrError::ConfigParse(err.to_string()))?
        };

        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: &ConfigOverrides,
    ) -> Result<ResolvedConfig, CmrError> {
        let defaults = ResolvedConfig::default();

        let page_size = overrides
            .page_size
            .or(config.page_size)
            .unwrap_or(defaults.page_size);
        if page_size == 0 {
            return Err(CmrError::InvalidConfig(
                "page_size must be greater than zero".to_string(),
            ));
        }

        let base_url = config
            .base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        if base_url.is_empty() {
            return Err(CmrError::InvalidConfig("base_url is empty".to_string()));
        }

        let on_naming_error = if overrides.skip_misnamed {
            NamingPolicy::Skip
        } else {
            config.on_naming_error.unwrap_or(defaults.on_naming_error)
        };

        Ok(ResolvedConfig {
            provider: overrides
                .provider
                .clone()
                .or(config.provider)
                .unwrap_or(defaults.provider),
            project: overrides
                .project
                .clone()
                .or(config.project)
                .unwrap_or(defaults.project),
            base_url,
            cache_dir: overrides
                .cache_dir
                .clone()
                .or(config.cache_dir)
                .map(Utf8PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            output_dir: overrides
                .output_dir
                .clone()
                .or(config.output_dir)
                .map(Utf8PathBuf::from)
                .unwrap_or(defaults.output_dir),
            page_size,
            paging: overrides
                .paging
                .or(config.paging)
                .unwrap_or(defaults.paging),
            cache_key: config.cache_key.unwrap_or(defaults.cache_key),
            on_naming_error,
            timeout: config.timeout_secs.map(Duration::from_secs),
            update_collections: overrides.update_collections
                || config.update_collections.unwrap_or(false),
            update_granules: overrides.update_granules || config.update_granules.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let resolved =
            ConfigLoader::resolve_config(Config::default(), &ConfigOverrides::default()).unwrap();
        assert_eq!(resolved.provider, "ORNL_DAAC");
        assert_eq!(resolved.project, "ABoVE");
        assert_eq!(resolved.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(resolved.paging, PagingStrategy::Scroll);
        assert_eq!(resolved.cache_key, KeyStyle::Positional);
        assert_eq!(resolved.on_naming_error, NamingPolicy::Abort);
        assert!(!resolved.update_collections);
        assert!(!resolved.update_granules);
    }

    #[test]
    fn trailing_slash_is_dropped_from_base_url() {
        let config = Config {
            base_url: Some("https://cmr.uat.earthdata.nasa.gov/search/".to_string()),
            ..Config::default()
        };
        let resolved = ConfigLoader::resolve_config(config, &ConfigOverrides::default()).unwrap();
        assert_eq!(resolved.base_url, "https://cmr.uat.earthdata.nasa.gov/search");
    }
}
