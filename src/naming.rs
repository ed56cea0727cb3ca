use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CmrError;

/// Derived names become a directory and a `curl -o` argument, so they are
/// limited to characters that need no quoting and cannot leave the output root.
static SAFE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").unwrap());

/// What to do with an entry whose name does not follow the `<dataset>_<suffix>` /
/// `<dataset>.<granule>.<ext>` convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingPolicy {
    #[default]
    Abort,
    Skip,
}

#[derive(Debug)]
pub enum Resolution<T> {
    Keep(T),
    Skip(CmrError),
}

impl NamingPolicy {
    pub fn resolve<T>(self, derived: Result<T, CmrError>) -> Result<Resolution<T>, CmrError> {
        match (derived, self) {
            (Ok(value), _) => Ok(Resolution::Keep(value)),
            (Err(err), NamingPolicy::Skip) => Ok(Resolution::Skip(err)),
            (Err(err), NamingPolicy::Abort) => Err(err),
        }
    }
}

/// `ABoVE_AirSWOT_Radar_Data_1646` -> `ABoVE_AirSWOT_Radar_Data`
pub fn dataset_name(short_name: &str) -> Result<String, CmrError> {
    let cut = short_name
        .rfind('_')
        .ok_or_else(|| naming_error("dataset", short_name, "no '_' separated suffix"))?;
    if cut == 0 {
        return Err(naming_error("dataset", short_name, "empty dataset name"));
    }
    checked_name("dataset", short_name, &short_name[..cut])
}

/// `ABoVE_AirSWOT_Radar_Data.elevation_utm_20170708171612.tif` under dataset
/// `ABoVE_AirSWOT_Radar_Data` -> `elevation_utm_20170708171612`
pub fn granule_name(dataset: &str, title: &str) -> Result<String, CmrError> {
    let rest = title
        .strip_prefix(dataset)
        .ok_or_else(|| naming_error("granule", title, "title does not start with dataset name"))?;
    let mut chars = rest.chars();
    if chars.next().is_none() {
        return Err(naming_error("granule", title, "nothing follows the dataset name"));
    }
    let rest = chars.as_str();
    let dot = rest
        .rfind('.')
        .ok_or_else(|| naming_error("granule", title, "no file extension"))?;
    if dot == 0 {
        return Err(naming_error("granule", title, "empty granule name"));
    }
    checked_name("granule", title, &rest[..dot])
}

fn checked_name(kind: &'static str, source: &str, name: &str) -> Result<String, CmrError> {
    if !SAFE_NAME_RE.is_match(name) {
        return Err(naming_error(
            kind,
            source,
            "name may only contain letters, digits, '.', '_' and '-'",
        ));
    }
    if name.starts_with('.') || name.contains("..") {
        return Err(naming_error(kind, source, "name must not be a relative path"));
    }
    Ok(name.to_string())
}

fn naming_error(kind: &'static str, value: &str, message: &str) -> CmrError {
    CmrError::NameDerivation {
        kind,
        value: value.to_string(),
        message: message.to_string(),
    }
}
