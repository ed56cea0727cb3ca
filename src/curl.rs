use std::fs::{self, File};
use std::io::{BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::ConceptId;
use crate::error::CmrError;
use crate::events::{CatalogEvent, EventSink, WriteStage};
use crate::store::Store;
use crate::walker::CollectionGranules;

/// `curl -s -o <name>.json -H 'Accept: application/json' "<base>/concepts/<id>"`
pub fn curl_line(base_url: &str, output_name: &str, concept_id: &ConceptId) -> String {
    format!(
        "curl -s -o {output_name}.json -H 'Accept: application/json' \"{base_url}/concepts/{concept_id}\""
    )
}

/// Collection record first, then one line per granule in feed order.
pub fn script_lines(base_url: &str, pairing: &CollectionGranules) -> Vec<String> {
    let mut lines = Vec::with_capacity(pairing.granules.len() + 1);
    lines.push(curl_line(base_url, &pairing.dataset, &pairing.concept_id));
    lines.extend(
        pairing
            .granules
            .iter()
            .map(|granule| curl_line(base_url, &granule.name, &granule.concept_id)),
    );
    lines
}

/// Writes `<output>/<dataset>/metadata/metadata.curl` for each pairing.
pub struct CurlScriptWriter<'a> {
    store: &'a Store,
    base_url: String,
}

impl<'a> CurlScriptWriter<'a> {
    pub fn new(store: &'a Store, base_url: &str) -> Self {
        Self {
            store,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn write(
        &self,
        pairing: &CollectionGranules,
        sink: &dyn EventSink,
    ) -> Result<Utf8PathBuf, CmrError> {
        let path = self.store.curl_script_path(&pairing.dataset);
        let notify = |stage: WriteStage| {
            sink.event(CatalogEvent::CurlFile {
                dataset: pairing.dataset.clone(),
                path: path.to_string(),
                stage,
            });
        };

        notify(WriteStage::Starting);
        let lines = script_lines(&self.base_url, pairing);
        match self.write_lines(&path, &lines) {
            Ok(()) => {
                notify(WriteStage::Succeeded { lines: lines.len() });
                Ok(path.clone())
            }
            Err(err) => {
                tracing::warn!(%path, error = %err, "could not write curl script");
                notify(WriteStage::Failed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn write_lines(&self, path: &Utf8Path, lines: &[String]) -> Result<(), CmrError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| CmrError::Storage(format!("create {parent}: {err}")))?;
        }
        let file = File::create(path.as_std_path())
            .map_err(|err| CmrError::Storage(format!("create {path}: {err}")))?;
        let mut writer = BufWriter::new(file);
        for line in lines {
            writeln!(writer, "{line}")
                .map_err(|err| CmrError::Storage(format!("write {path}: {err}")))?;
        }
        writer
            .flush()
            .map_err(|err| CmrError::Storage(format!("write {path}: {err}")))
    }
}
