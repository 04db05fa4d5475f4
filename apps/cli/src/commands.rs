//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use edd_agents::{FrameworkAvailability, probe_framework};
use edd_core::{Backend, DispatchProgress, Dispatcher, PipelineState, ResearchRequest};
use edd_shared::{
    AppConfig, BackendOutcome, CredentialOverrides, DefaultCredentials, EddError, Mode,
    init_config, load_config,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// EDD — automated Enhanced Due Diligence research.
#[derive(Parser)]
#[command(
    name = "edd",
    version,
    about = "Run Enhanced Due Diligence compliance research on an entity or person.",
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

/// Report output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Markdown,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Research an entity or person.
    Search {
        /// Entity or person name(s) to research.
        target: String,

        /// Backends to run: agent_pipeline, direct_search, or both
        /// (aliases: crewai, perplexity). Defaults to the configured mode.
        #[arg(short, long)]
        mode: Option<String>,

        /// Two-letter country code used to localize results.
        #[arg(short, long)]
        region: Option<String>,

        /// Search API key for this request only.
        #[arg(long, env = "EDD_SEARCH_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Output format.
        #[arg(short, long, default_value = "markdown")]
        format: OutputFormat,
    },

    /// Report whether the agent framework can run.
    Probe,

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
        0 => "edd=info",
        1 => "edd=debug",
        _ => "edd=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so the report on stdout stays pipeable.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Search {
            target,
            mode,
            region,
            api_key,
            format,
        } => cmd_search(&target, mode.as_deref(), region, api_key, format).await,
        Command::Probe => cmd_probe().await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_search(
    target: &str,
    mode: Option<&str>,
    region: Option<String>,
    api_key: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let config = load_config()?;
    let mode: Mode = mode.unwrap_or(config.defaults.mode.as_str()).parse()?;

    let defaults = DefaultCredentials::from_env(&config);
    let framework = probe_framework(&config.agents, &defaults);
    let dispatcher = Dispatcher::from_config(&config, defaults, framework)?;

    let mut request = ResearchRequest::new(target, mode);
    if let Some(region) = region {
        request = request.with_region(region);
    }
    if let Some(key) = api_key {
        request = request.with_credentials(CredentialOverrides::with_search_key(key));
    }

    info!(entity = target, %mode, "starting research");

    let reporter = CliProgress::new();
    let result = dispatcher.dispatch(request, &reporter).await;
    reporter.finish();
    let response = result?;

    match format {
        OutputFormat::Markdown => print!("{}", edd_markdown::render_response(target, &response)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
    }

    Ok(())
}

async fn cmd_probe() -> Result<()> {
    let config = load_config()?;
    let defaults = DefaultCredentials::from_env(&config);

    println!();
    for line in key_status(&config, &defaults) {
        println!("{line}");
    }
    println!("  LLM model:   {}", config.agents.model);

    match probe_framework(&config.agents, &defaults) {
        FrameworkAvailability::Available => {
            println!("  Agents:      available");
            println!();
            Ok(())
        }
        FrameworkAvailability::Unavailable { reason } => {
            println!("  Agents:      unavailable ({reason})");
            println!();
            Err(EddError::BackendUnavailable(reason).into())
        }
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");

    let defaults = DefaultCredentials::from_env(&config);
    for line in key_status(&config, &defaults) {
        println!("{line}");
    }
    Ok(())
}

/// Presence of each API key, never its value.
fn key_status(config: &AppConfig, defaults: &DefaultCredentials) -> [String; 2] {
    let status = |present: bool| if present { "configured" } else { "missing" };
    [
        format!(
            "  Search key:  {} ({})",
            status(defaults.search_api_key.is_some()),
            config.search.api_key_env
        ),
        format!(
            "  LLM key:     {} ({})",
            status(defaults.llm_api_key.is_some()),
            config.agents.api_key_env
        ),
    ]
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
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl DispatchProgress for CliProgress {
    fn backend_started(&self, backend: Backend) {
        self.spinner.set_message(format!("Running {backend}..."));
    }

    fn backend_finished(&self, backend: Backend, outcome: &BackendOutcome) {
        let line = if let Some(reason) = outcome.skipped_reason {
            format!("  - {backend}: skipped ({reason})")
        } else if let Some(message) = outcome.error_message() {
            format!("  ✗ {backend}: {message}")
        } else {
            format!("  ✓ {backend}: done")
        };
        self.spinner.println(line);
    }

    fn pipeline_state(&self, state: PipelineState) {
        match state {
            PipelineState::Researching | PipelineState::Analyzing => {
                self.spinner.set_message(format!("Agent pipeline {state}..."));
            }
            _ => {}
        }
    }
}
