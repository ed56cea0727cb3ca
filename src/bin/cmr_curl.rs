use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use cmr_curl::app::App;
use cmr_curl::cmr::CmrHttpClient;
use cmr_curl::config::{ConfigLoader, ConfigOverrides};
use cmr_curl::domain::PagingStrategy;
use cmr_curl::error::CmrError;
use cmr_curl::output::{ConsoleEvents, JsonOutput, OutputMode, TextOutput};

#[derive(Parser)]
#[command(name = "cmr-curl")]
#[command(
    about = "Generate metadata.curl scripts for every collection of a CMR project",
    long_about = "Downloads the collections of a provider/project from the CMR search API, then the \
                  granules of each collection, and writes <output>/<dataset>/metadata/metadata.curl \
                  with one curl command per metadata record. Search results are cached as JSON in \
                  the cache directory; use --update-collections / --update-granules to refresh them."
)]
#[command(version)]
struct Cli {
    /// JSON config file (default: ./cmr-curl.json when present)
    #[arg(long)]
    config: Option<String>,

    /// CMR data center / provider id
    #[arg(long)]
    provider: Option<String>,

    /// CMR project id
    #[arg(long)]
    project: Option<String>,

    #[arg(long)]
    cache_dir: Option<String>,

    #[arg(long)]
    output_dir: Option<String>,

    #[arg(long)]
    page_size: Option<u32>,

    #[arg(long, value_enum)]
    paging: Option<PagingStrategy>,

    /// Ignore cached collections
    #[arg(long)]
    update_collections: bool,

    /// Ignore cached granules
    #[arg(long)]
    update_granules: bool,

    /// Skip collections and granules whose names break the naming convention
    #[arg(long)]
    skip_misnamed: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<CmrError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CmrError) -> u8 {
    match error {
        CmrError::ConfigRead(_) | CmrError::ConfigParse(_) | CmrError::InvalidConfig(_) => 2,
        CmrError::Transport(_) | CmrError::Status { .. } | CmrError::Protocol(_) => 3,
        CmrError::NameDerivation { .. } | CmrError::InvalidConceptId(_) => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let overrides = ConfigOverrides {
        provider: cli.provider,
        project: cli.project,
        cache_dir: cli.cache_dir,
        output_dir: cli.output_dir,
        page_size: cli.page_size,
        paging: cli.paging,
        update_collections: cli.update_collections,
        update_granules: cli.update_granules,
        skip_misnamed: cli.skip_misnamed,
    };
    let config = ConfigLoader::resolve(cli.config.as_deref(), &overrides)?;
    let client = CmrHttpClient::new(&config.base_url, config.timeout)?;
    let app = App::new(config, client);

    match output_mode {
        OutputMode::Json => {
            let summary = app.run(&JsonOutput)?;
            JsonOutput::print_summary(&summary).into_diagnostic()?;
        }
        OutputMode::Text => {
            let summary = app.run(&ConsoleEvents)?;
            TextOutput::print_summary(&summary).into_diagnostic()?;
        }
    }
    Ok(())
}
