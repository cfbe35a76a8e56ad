//! Prefix Gate - Main entrypoint.
//!
//! Checks fully-qualified class names against the configured serialization
//! filter, lists the effective rules, and validates or generates
//! configuration files.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use prefix_gate_lib::config::{ConfigLoader, LogConfig, PrefixGateConfig, ENV_PREFIX};
use prefix_gate_lib::error::{
    get_error_reporting, set_error_reporter, ErrorContext, PrefixGateError, PrefixGateResult,
    TracingErrorReporter,
};
use prefix_gate_lib::serial_filter::ClassFilter;

/// Command line arguments for Prefix Gate.
#[derive(Parser, Debug)]
#[command(name = "prefix_gate", version, author, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Check class names against the filter
    Check {
        /// Fully-qualified class names or array descriptors
        #[arg(required = true)]
        classes: Vec<String>,

        /// Print one JSON decision per line
        #[arg(long)]
        json: bool,
    },

    /// List the effective filter rules
    Rules,

    /// Validate the configuration file
    Validate,

    /// Generate a default configuration file
    GenConfig {
        /// Path to output configuration file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Initialize the logging system. Logs go to stderr so stdout stays clean
/// for command output.
fn init_logging(log: &LogConfig) -> PrefixGateResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(log.source_location)
        .with_line_number(log.source_location)
        .with_thread_names(true)
        .with_writer(io::stderr);

    let result = if log.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| {
        PrefixGateError::Custom(format!("Failed to set global tracing subscriber: {e}"))
    })
}

/// Loads configuration, setting up logging from it (or from defaults when
/// loading fails, so the failure itself gets logged).
fn load_config(path: Option<&Path>) -> PrefixGateResult<PrefixGateConfig> {
    match ConfigLoader::new(path, ENV_PREFIX).load() {
        Ok(config) => {
            init_logging(&config.log)?;
            Ok(config)
        }
        Err(e) => {
            init_logging(&LogConfig::default())?;
            Err(e.into())
        }
    }
}

fn check(config: &PrefixGateConfig, classes: &[String], json: bool) -> PrefixGateResult<ExitCode> {
    let filter = ClassFilter::from_config(&config.filter, &config.trie)?;
    let mut out = io::stdout().lock();
    let mut rejected = 0;

    for class in classes {
        let decision = filter.check(class);
        if !decision.permitted {
            rejected += 1;
        }

        if json {
            serde_json::to_writer(&mut out, &decision)?;
            writeln!(out)?;
        } else {
            writeln!(
                out,
                "{}\t{}\t{}",
                if decision.permitted { "permitted" } else { "rejected" },
                decision.class_name,
                decision.matched_rule.as_deref().unwrap_or("<default>"),
            )?;
        }
    }

    info!(checked = classes.len(), rejected, "class check complete");
    Ok(if rejected == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn list_rules(config: &PrefixGateConfig) -> PrefixGateResult<ExitCode> {
    let filter = ClassFilter::from_config(&config.filter, &config.trie)?;
    let mut out = io::stdout().lock();
    for (rule, verdict) in filter.rules() {
        writeln!(out, "{verdict}\t{rule}")?;
    }
    writeln!(out, "{}\t<default>", filter.default_verdict())?;
    Ok(ExitCode::SUCCESS)
}

fn gen_config(output: &Path) -> PrefixGateResult<ExitCode> {
    info!("Generating default configuration");
    let default_config = PrefixGateConfig::default();

    // Create parent directories if they don't exist
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml = toml::to_string_pretty(&default_config)
        .map_err(|e| PrefixGateError::Custom(format!("Failed to serialize config: {e}")))?;
    std::fs::write(output, toml)?;

    info!("Default configuration written to {:?}", output);
    Ok(ExitCode::SUCCESS)
}

fn run(args: Args) -> PrefixGateResult<ExitCode> {
    match args.command {
        Command::GenConfig { output } => {
            init_logging(&LogConfig::default())?;
            gen_config(&output)
        }
        Command::Check { classes, json } => {
            let config = load_config(args.config.as_deref())?;
            check(&config, &classes, json)
        }
        Command::Rules => {
            let config = load_config(args.config.as_deref())?;
            list_rules(&config)
        }
        Command::Validate => {
            let config = load_config(args.config.as_deref())?;
            info!(
                rules = config.filter.rules.len(),
                mode = ?config.filter.mode,
                "Configuration validated successfully"
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Main entry point for the application.
fn main() -> ExitCode {
    set_error_reporter(Arc::new(TracingErrorReporter));

    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            get_error_reporting().report(ErrorContext::new(e, "prefix_gate"));
            ExitCode::FAILURE
        }
    }
}
