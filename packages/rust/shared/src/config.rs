//! Application configuration for jobscout.
//!
//! User config lives at `~/.jobscout/jobscout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{JobscoutError, Result};
use crate::types::Profile;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "jobscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".jobscout";

// ---------------------------------------------------------------------------
// Config structs (matching jobscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Applicant profile used for ranking and generation.
    #[serde(default)]
    pub profile: ProfileConfig,

    /// Listing sources to poll.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// OpenAI-compatible API settings (scoring + generation endpoints).
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Run limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// `[profile]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Applicant display name.
    #[serde(default = "default_applicant_name")]
    pub name: String,

    /// Headline achievements, one line each.
    #[serde(default)]
    pub top_skills: Vec<String>,

    /// Short career-goals paragraph.
    #[serde(default)]
    pub career_goals: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            name: default_applicant_name(),
            top_skills: Vec::new(),
            career_goals: String::new(),
        }
    }
}

fn default_applicant_name() -> String {
    "Ada Quantum-Smith".into()
}

impl From<&ProfileConfig> for Profile {
    fn from(config: &ProfileConfig) -> Self {
        Self {
            name: config.name.clone(),
            top_skills: config.top_skills.clone(),
            career_goals: config.career_goals.clone(),
        }
    }
}

/// `[sources]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Search query sent to every board.
    #[serde(default = "default_query")]
    pub query: String,

    /// Craigslist site subdomains, one connector each.
    #[serde(default = "default_craigslist_sites")]
    pub craigslist_sites: Vec<String>,

    /// Extra listing index URLs handled by the generic connector.
    #[serde(default)]
    pub extra_boards: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            query: default_query(),
            craigslist_sites: default_craigslist_sites(),
            extra_boards: Vec::new(),
        }
    }
}

fn default_query() -> String {
    "python developer".into()
}
fn default_craigslist_sites() -> Vec<String> {
    vec!["newyork".into()]
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// API base URL; overridable for proxies and tests.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Embedding model for relevance scoring.
    #[serde(default = "default_embed_model")]
    pub embed_model: String,

    /// Chat model for cover-letter generation.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_base: default_api_base(),
            embed_model: default_embed_model(),
            chat_model: default_chat_model(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".into()
}
fn default_embed_model() -> String {
    "text-embedding-3-small".into()
}
fn default_chat_model() -> String {
    "gpt-4o".into()
}

/// `[limits]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Top-K bound: how many ranked postings go to generation per run.
    #[serde(default = "default_max_apply")]
    pub max_apply: usize,

    /// Per-call HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Data directory holding seen.json, the lock, letters, and the journal.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_apply: default_max_apply(),
            timeout_secs: default_timeout_secs(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_max_apply() -> usize {
    3
}
fn default_timeout_secs() -> u64 {
    45
}
fn default_data_dir() -> String {
    "~/jobscout-data".into()
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime run configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Applicant profile.
    pub profile: Profile,
    /// Search query.
    pub query: String,
    /// Craigslist site subdomains.
    pub craigslist_sites: Vec<String>,
    /// Extra generic board URLs.
    pub extra_boards: Vec<String>,
    /// Top-K selection bound.
    pub max_apply: usize,
    /// Per-call HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// Resolved data directory.
    pub data_dir: PathBuf,
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            profile: Profile::from(&config.profile),
            query: config.sources.query.clone(),
            craigslist_sites: config.sources.craigslist_sites.clone(),
            extra_boards: config.sources.extra_boards.clone(),
            max_apply: config.limits.max_apply,
            timeout_secs: config.limits.timeout_secs,
            data_dir: expand_home(&config.limits.data_dir),
        }
    }
}

/// Expand a leading `~/` against the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.jobscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| JobscoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.jobscout/jobscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| JobscoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| JobscoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| JobscoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| JobscoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| JobscoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the API key env var is set and non-empty, and return the key.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.openai.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(JobscoutError::config(format!(
            "API key not found. Set the {var_name} environment variable."
        ))),
    }
}
