use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::content::dynamic::SeverityPolicy;
use crate::scan::scanner::DEFAULT_MAX_RESULTS;
use crate::suggest::suggest_model::SuggestConfig;

pub const DEFAULT_CONFIG_PATH: &str = "locator-healing.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "locator-healing",
    version,
    about = "Locator synthesis and self-healing element resolution"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: locator-healing.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Append one JSON line per resolution / heal / suggestion to this file
    #[arg(long, global = true)]
    pub audit_log: Option<String>,

    /// Scoring backend endpoint for `suggest`
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Print JSON instead of the console format
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a DOM snapshot and synthesize locators for every candidate
    Scan {
        /// DOM snapshot JSON
        #[arg(long)]
        document: String,

        /// Maximum ranked groups to print
        #[arg(long)]
        max: Option<usize>,
    },

    /// Report dynamic-content matches and severity for a text
    Classify {
        text: String,
    },

    /// Resolve stored element records against a DOM snapshot
    Resolve {
        #[arg(long)]
        document: String,

        /// Stored element records (JSON array)
        #[arg(long)]
        records: String,

        /// Only resolve this element id
        #[arg(long)]
        element: Option<String>,
    },

    /// Resolve records and propose healed versions where locators drifted
    Heal {
        #[arg(long)]
        document: String,

        #[arg(long)]
        records: String,

        /// Write the updated record set here (default: print proposals only)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Ask the scoring backend for locators matching an intent
    Suggest {
        #[arg(long)]
        document: String,

        /// What the user wants to interact with, e.g. "add to cart"
        #[arg(long)]
        intent: String,
    },

    /// Run a YAML check suite against resolved records
    Verify {
        #[arg(long)]
        document: String,

        #[arg(long)]
        records: String,

        /// Check suite YAML
        #[arg(long)]
        checks: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `locator-healing.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub suggest: SuggestConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub severity: SeverityPolicy,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendConfig {
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuditConfig {
    pub path: Option<String>,
}

// Serde default helpers
fn default_max_results() -> usize { DEFAULT_MAX_RESULTS }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|e| {
            warn!(path = config_path, error = %e, "ignoring malformed config file");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

// ============================================================================
// Resolved settings (CLI > config file > built-in default)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub max_results: usize,
    pub endpoint: Option<String>,
    pub audit_log: Option<String>,
    pub suggest: SuggestConfig,
    pub severity: SeverityPolicy,
}

pub fn resolve_settings(cli: &Cli, config: &AppConfig) -> Settings {
    let max_results = match &cli.command {
        Commands::Scan { max: Some(max), .. } => *max,
        _ => config.scan.max_results,
    };

    Settings {
        max_results,
        endpoint: cli.endpoint.clone().or_else(|| config.backend.endpoint.clone()),
        audit_log: cli.audit_log.clone().or_else(|| config.audit.path.clone()),
        suggest: config.suggest.clone(),
        severity: config.severity.clone(),
    }
}

/// `EnvFilter` directive for a `-v` count, used when `RUST_LOG` is unset.
pub fn log_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
