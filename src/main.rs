// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reelingo::api::{JobApi, TranslateTextRequest};
use reelingo::app_config::{Config, LogLevel};
use reelingo::jobs::{JobStatus, OrchestratorBuilder};
use reelingo::{Method, ProviderRegistry, TranslationService};

/// CLI wrapper for Method to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliMethod {
    Regional,
    Llm,
}

impl From<CliMethod> for Method {
    fn from(cli_method: CliMethod) -> Self {
        match cli_method {
            CliMethod::Regional => Method::Regional,
            CliMethod::Llm => Method::LanguageModel,
        }
    }
}

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a text file through a background job
    Translate(TranslateArgs),

    /// List the languages offered by the configured providers
    Languages {
        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,
    },

    /// Check the credentials of every configured provider
    CheckProviders {
        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,
    },

    /// Write a default configuration file
    InitConfig {
        /// Where to write the file
        #[arg(default_value = "conf.json")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completions for reelingo
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Text file to translate
    #[arg(value_name = "FILE")]
    input_path: PathBuf,

    /// Target language tag (e.g., 'hi-IN', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Source language tag; detected when omitted
    #[arg(short, long)]
    source_language: Option<String>,

    /// Preferred provider family
    #[arg(short, long, value_enum)]
    method: Option<CliMethod>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Write the result JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Reelingo - background translation jobs for text and video
#[derive(Parser, Debug)]
#[command(name = "reelingo")]
#[command(version)]
#[command(about = "Translate text through regional and LLM providers")]
#[command(long_about = "Reelingo runs translations as background jobs with provider fallback, chunking and quality scoring.

EXAMPLES:
    reelingo translate notes.txt -t hi-IN            # Translate with the default method
    reelingo translate notes.txt -t fr -m llm        # Prefer the LLM family
    reelingo languages                               # List supported languages
    reelingo init-config                             # Write conf.json with defaults
    reelingo completions bash > reelingo.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. API keys may be left empty
    and supplied through REGIONAL_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation; filtering follows `log::max_level()`
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and marker for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "✗"),
            Level::Warn => ("1;33", "!"),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "·"),
            Level::Trace => ("1;35", "…"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, marker) = Self::style_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "\x1B[{}m{} {} {}\x1B[0m", color, now, marker, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();
    match cli.command {
        Commands::Translate(args) => run_translate(args).await,
        Commands::Languages { config_path } => list_languages(&config_path),
        Commands::CheckProviders { config_path } => check_providers(&config_path).await,
        Commands::InitConfig { path, force } => init_config(&path, force),
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "reelingo", &mut std::io::stdout());
            Ok(())
        }
    }
}

// @returns: Config from `path`, or defaults written to `path` when missing
fn load_or_create_config(path: &str) -> Result<Config> {
    let mut config = if Path::new(path).exists() {
        Config::load(path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", path);
        let config = Config::default();
        config.save(path)?;
        config
    };
    config.apply_env_overrides();
    Ok(config)
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    if let Some(level) = &options.log_level {
        log::set_max_level(LogLevel::from(level.clone()).to_level_filter());
    }

    let mut config = load_or_create_config(&options.config_path)?;
    if let Some(source) = &options.source_language {
        config.source_language = source.clone();
    }
    if let Some(target) = &options.target_language {
        config.target_language = target.clone();
    }
    if let Some(method) = &options.method {
        config.translation.default_method = method.clone().into();
    }
    if let Some(level) = &options.log_level {
        config.log_level = level.clone().into();
    }
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let text = std::fs::read_to_string(&options.input_path)
        .with_context(|| format!("Failed to read input file: {}", options.input_path.display()))?;

    let service = TranslationService::from_config(&config)?;
    let orchestrator = Arc::new(OrchestratorBuilder::new(Arc::new(service)).config(config.jobs.clone()).start());
    let api = JobApi::new(Arc::clone(&orchestrator));

    let submitted = api.translate_text(TranslateTextRequest {
        text,
        target_language: config.target_language.clone(),
        source_language: options.source_language.clone(),
        method: config.translation.default_method,
    })?;
    info!(
        "Reelingo: {} -> {} ({})",
        options.input_path.display(),
        config.target_language,
        config.translation.default_method
    );

    let progress_bar = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("█▓▒░"));

    let job_id = submitted.job_id.to_string();
    let view = loop {
        let view = api
            .job_status(&job_id)
            .ok_or_else(|| anyhow!("Job {} disappeared", job_id))?;
        progress_bar.set_position(u64::from(view.progress));
        progress_bar.set_message(view.stage.to_string());
        if view.status.is_terminal() {
            break view;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    };
    progress_bar.finish_and_clear();
    orchestrator.shutdown().await;

    if view.status == JobStatus::Failed {
        let reason = view.error.unwrap_or_else(|| "unknown error".to_string());
        let hint = if view.retryable == Some(true) { " (retryable)" } else { "" };
        return Err(anyhow!("Translation failed{}: {}", hint, reason));
    }

    let result = view.result.ok_or_else(|| anyhow!("Job {} completed without a result", job_id))?;
    if result.is_low_accuracy() {
        warn!("Translation accuracy is low ({:.1})", result.translation_accuracy);
    }
    let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
    match &options.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write output file: {}", path.display()))?;
            info!("Success: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn list_languages(config_path: &str) -> Result<()> {
    let config = load_or_create_config(config_path)?;
    let registry = ProviderRegistry::from_config(&config.translation)?;
    for language in registry.supported_languages() {
        println!("{:<8} {}", language.code, language.name);
    }
    Ok(())
}

async fn check_providers(config_path: &str) -> Result<()> {
    let config = load_or_create_config(config_path)?;
    let registry = ProviderRegistry::from_config(&config.translation)?;
    let results = registry.validate_all().await;
    if results.is_empty() {
        warn!("No providers are enabled in {}", config_path);
    }
    for (name, ok) in &results {
        println!("{:<12} {}", name, if *ok { "ok" } else { "FAILED" });
    }
    if results.iter().any(|(_, ok)| !ok) {
        return Err(anyhow!("One or more providers failed the credential check"));
    }
    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow!("{} already exists. Use --force to overwrite.", path.display()));
    }
    Config::default().save(path)?;
    info!("Wrote default configuration to {}", path.display());
    Ok(())
}
