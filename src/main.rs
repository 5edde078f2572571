use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use reqwest::Client;
use tracing::{error, info};

use pictogram_harvester::config::{
    ExportConfig, ExtractConfig, ReportConfig, DEFAULT_CODE_OWNERS, DEFAULT_OUTPUT_DIR,
    DEFAULT_PACKAGE_JSON, ENV_FIGMA_FILE_ID, ENV_FIGMA_TOKEN, ENV_GITHUB_REPOSITORY,
    ENV_GITHUB_TOKEN,
};
use pictogram_harvester::exports::generate_exports;
use pictogram_harvester::figma::{build_http_client, FigmaClient, HttpFetcher, DEFAULT_FIGMA_API};
use pictogram_harvester::harvest::{Diagnostics, HarvestPipeline, HarvestResult, DEFAULT_BATCH_SIZE};
use pictogram_harvester::logging::{init_logging, LoggingConfig};
use pictogram_harvester::model::{read_package_version, MANIFEST_FILE_NAME};
use pictogram_harvester::report::{report_failure, GitHubIssues, DEFAULT_GITHUB_API};

#[derive(Debug, Parser)]
#[command(name = "pictogram-harvester")]
#[command(about = "Extract pictograms from a Figma file and generate package exports")]
#[command(version)]
struct Cli {
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download every pictogram of the Figma file and write the manifest.
    Extract(ExtractArgs),
    /// Generate index.cjs, index.mjs and index.d.ts from the manifest.
    Exports(ExportsArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Figma file key.
    #[arg(long, env = ENV_FIGMA_FILE_ID)]
    file_id: String,
    /// Figma personal access token.
    #[arg(long, env = ENV_FIGMA_TOKEN, hide_env_values = true)]
    figma_token: String,
    /// GitHub token used to file the failure issue.
    #[arg(long, env = ENV_GITHUB_TOKEN, hide_env_values = true, required_unless_present = "no_report")]
    github_token: Option<String>,
    /// Repository (owner/repo) receiving the failure issue.
    #[arg(long, env = ENV_GITHUB_REPOSITORY, required_unless_present = "no_report")]
    repository: Option<String>,
    /// Do not file an issue when the run fails.
    #[arg(long)]
    no_report: bool,
    /// Node ids per render URL request.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
    /// Directory receiving the pictograms and index.json.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
    /// package.json whose version is recorded in the manifest.
    #[arg(long, default_value = DEFAULT_PACKAGE_JSON)]
    package_json: PathBuf,
    /// CODEOWNERS file listing the failure issue assignees.
    #[arg(long, default_value = DEFAULT_CODE_OWNERS)]
    code_owners: PathBuf,
    /// Figma API base URL.
    #[arg(long, default_value = DEFAULT_FIGMA_API)]
    figma_api: String,
    /// GitHub API base URL.
    #[arg(long, default_value = DEFAULT_GITHUB_API)]
    github_api: String,
    /// Per-request timeout in seconds (default: none).
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl ExtractArgs {
    fn into_config(self) -> ExtractConfig {
        let report = match (self.no_report, self.github_token, self.repository) {
            (false, Some(token), Some(repository)) => Some(ReportConfig {
                github_api: self.github_api,
                code_owners: self.code_owners,
                ..ReportConfig::new(token, repository)
            }),
            _ => None,
        };

        ExtractConfig {
            figma_api: self.figma_api,
            batch_size: self.batch_size,
            output_dir: self.output_dir,
            package_json: self.package_json,
            request_timeout: self.timeout_secs.map(Duration::from_secs),
            report,
            ..ExtractConfig::new(self.file_id, self.figma_token)
        }
    }
}

#[derive(Debug, Args)]
struct ExportsArgs {
    /// Manifest written by `extract`.
    #[arg(long, default_value_os_t = PathBuf::from(DEFAULT_OUTPUT_DIR).join(MANIFEST_FILE_NAME))]
    manifest: PathBuf,
    /// Output directory (default: the manifest's directory).
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(&LoggingConfig {
        level: cli.log_level,
        json: cli.log_json,
    });

    match cli.command {
        Command::Extract(args) => run_extract(args.into_config()).await,
        Command::Exports(args) => run_exports(ExportConfig {
            manifest: args.manifest,
            output_dir: args.output_dir,
        }),
    }
}

async fn run_extract(config: ExtractConfig) -> ExitCode {
    let http = match build_http_client(config.request_timeout) {
        Ok(http) => http,
        Err(e) => {
            error!(error = %e, "Failed to create HTTP client");
            return ExitCode::FAILURE;
        }
    };

    let mut diagnostics = Diagnostics::new();
    match extract(&config, &http, &mut diagnostics).await {
        Ok(result) => {
            info!(
                pictograms = result.manifest.pictograms.len(),
                manifest = %result.manifest_path.display(),
                "Extraction succeeded"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Extraction failed: {e:#}");
            if let Some(report) = &config.report {
                file_issue(report, &http, &e, &diagnostics).await;
            }
            ExitCode::FAILURE
        }
    }
}

async fn extract(
    config: &ExtractConfig,
    http: &Client,
    diagnostics: &mut Diagnostics,
) -> anyhow::Result<HarvestResult> {
    let version = read_package_version(&config.package_json)
        .context("Failed to determine the package version")?;

    let source = FigmaClient::new(http.clone(), &config.file_id, &config.figma_token)
        .with_base_url(&config.figma_api);
    let fetcher = HttpFetcher::new(http.clone());

    let pipeline = HarvestPipeline::new(source, fetcher, version)
        .with_batch_size(config.batch_size)
        .with_output_dir(&config.output_dir);

    Ok(pipeline.execute(diagnostics).await?)
}

async fn file_issue(
    report: &ReportConfig,
    http: &Client,
    failure: &anyhow::Error,
    diagnostics: &Diagnostics,
) {
    let tracker = match GitHubIssues::new(http.clone(), &report.repository, &report.github_token) {
        Ok(tracker) => tracker.with_base_url(&report.github_api),
        Err(e) => {
            error!(error = %e, "Cannot report failure");
            return;
        }
    };

    let reason = format!("{failure:#}");
    match report_failure(&tracker, &report.code_owners, &reason, diagnostics).await {
        Ok(url) => info!(url = url.as_deref().unwrap_or("-"), "Reported failure"),
        Err(e) => error!(error = %e, "Failed to report failure"),
    }
}

fn run_exports(config: ExportConfig) -> ExitCode {
    match generate_exports(&config.manifest, &config.output_dir()) {
        Ok(paths) => {
            for path in &paths {
                info!("Wrote {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Export generation failed");
            ExitCode::FAILURE
        }
    }
}
