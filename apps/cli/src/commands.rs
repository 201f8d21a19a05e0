//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use jobscout_core::pipeline::{Phase, PipelineConfig, ProgressReporter, RunReport};
use jobscout_fetch::{FetchClient, RetryPolicy};
use jobscout_shared::{
    AppConfig, JobscoutError, RunConfig, init_config, load_config, validate_api_key,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// jobscout — rank job listings and draft applications.
#[derive(Parser)]
#[command(
    name = "jobscout",
    version,
    about = "Poll job boards, rank fresh postings against your profile, and draft cover letters.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run one aggregation pass: gather, rank, and draft letters.
    Run {
        /// Data directory override (defaults to the configured one).
        #[arg(long)]
        data_dir: Option<String>,

        /// Search query override.
        #[arg(short, long)]
        query: Option<String>,

        /// How many top-ranked postings to draft letters for.
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "jobscout=info",
        1 => "jobscout=debug",
        _ => "jobscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            data_dir,
            query,
            top,
        } => cmd_run(data_dir.as_deref(), query.as_deref(), top).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Run command
// ---------------------------------------------------------------------------

async fn cmd_run(data_dir: Option<&str>, query: Option<&str>, top: Option<usize>) -> Result<()> {
    // Validate API key before doing anything
    let config = load_config()?;
    let api_key = validate_api_key(&config)?;

    let mut run_config = RunConfig::from(&config);
    if let Some(dir) = data_dir {
        run_config.data_dir = PathBuf::from(dir);
    }
    if let Some(q) = query {
        run_config.query = q.to_string();
    }
    if let Some(n) = top {
        run_config.max_apply = n;
    }

    info!(
        query = %run_config.query,
        data_dir = %run_config.data_dir.display(),
        top = run_config.max_apply,
        "starting aggregation run"
    );

    let fetch = FetchClient::new(RetryPolicy::fetch(), run_config.timeout_secs)?;
    let connectors = jobscout_connectors::build_connectors(&run_config, &fetch);

    let pipeline_config = PipelineConfig {
        run: run_config,
        api_base: config.openai.api_base.clone(),
        api_key,
        embed_model: config.openai.embed_model.clone(),
        chat_model: config.openai.chat_model.clone(),
    };

    let reporter = CliProgress::new();

    let report = match jobscout_core::run(&pipeline_config, &connectors, &reporter).await {
        Ok(report) => report,
        // A concurrent run is not a failure: report it and exit cleanly
        Err(JobscoutError::Locked { path }) => {
            reporter.clear();
            println!("[locked] another run is active (lock: {})", path.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // Print summary
    println!();
    println!("  Run complete!");
    println!("  Gathered:  {}", report.gathered);
    println!("  Fresh:     {}", report.fresh);
    println!("  Selected:  {}", report.selected);
    println!("  Letters:   {}", report.accepted);
    println!("  Failed:    {}", report.failed);
    for letter in &report.letters {
        println!("    {}", letter.display());
    }
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn clear(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, phase: Phase) {
        self.spinner.set_message(phase.as_str());
    }

    fn source_done(&self, name: &str, count: usize, ok: bool) {
        if ok {
            self.spinner.set_message(format!("Gathering: {name} ({count} postings)"));
        } else {
            self.spinner.set_message(format!("Gathering: {name} failed, continuing"));
        }
    }

    fn outcome(&self, url: &str, accepted: bool) {
        let verdict = if accepted { "letter drafted" } else { "skipped" };
        self.spinner.set_message(format!("{verdict}: {url}"));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
