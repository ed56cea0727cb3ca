use std::io::{self, Write};

use serde::Serialize;

use crate::app::RunSummary;
use crate::events::{CatalogEvent, DownloadScope, DownloadStage, EventSink, WriteStage};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl EventSink for JsonOutput {
    fn event(&self, _event: CatalogEvent) {}
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        for dataset in &summary.datasets {
            writeln!(
                stdout,
                "{} ({}): {} granules -> {}",
                dataset.dataset, dataset.concept_id, dataset.granules, dataset.script_path
            )?;
        }
        writeln!(
            stdout,
            "finished: {} of {} collections written",
            summary.datasets.len(),
            summary.collections
        )
    }
}

/// Progress lines on stderr while a run is in flight.
pub struct ConsoleEvents;

impl ConsoleEvents {
    fn render(event: &CatalogEvent) -> String {
        match event {
            CatalogEvent::Download { scope, stage } => {
                let what = match scope {
                    DownloadScope::Collections => "collections".to_string(),
                    DownloadScope::Granules { dataset } => {
                        format!("granules for dataset '{dataset}'")
                    }
                };
                match stage {
                    DownloadStage::Starting => format!("retrieving {what} ..."),
                    DownloadStage::Cached => format!("loading cached {what} ..."),
                    DownloadStage::Succeeded { count } => format!("got {count} {}", noun(scope)),
                    DownloadStage::Failed { message } => {
                        format!("failed to retrieve {what}: {message}")
                    }
                    DownloadStage::CachedFailed { message } => {
                        format!("cached {what} unusable ({message}), downloading again")
                    }
                    DownloadStage::CacheWriteFailed { message } => {
                        format!("could not cache {what}: {message}")
                    }
                }
            }
            CatalogEvent::CurlFile { path, stage, .. } => match stage {
                WriteStage::Starting => "writing curl commands ...".to_string(),
                WriteStage::Succeeded { lines } => format!("done ({lines} lines in {path})"),
                WriteStage::Failed { message } => format!("failed to write {path}: {message}"),
            },
            CatalogEvent::Skipped { what, message } => format!("skipping {what}: {message}"),
        }
    }
}

impl EventSink for ConsoleEvents {
    fn event(&self, event: CatalogEvent) {
        eprintln!("{}", Self::render(&event));
    }
}

fn noun(scope: &DownloadScope) -> &'static str {
    match scope {
        DownloadScope::Collections => "collections",
        DownloadScope::Granules { .. } => "granules",
    }
}
