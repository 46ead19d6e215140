//! Service configuration loading from file and environment variables.

use leadline_dialogue::{DialogueSettings, KnowledgeError, LexiconError};
use leadline_dispatch::{AssignTargets, DispatchError};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub dialogue: DialogueConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub handoff: HandoffConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "leadline_dialogue=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Per-call dialogue tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct DialogueConfig {
    /// Language tag selecting the lexicon (`es-ES`, `en-US`, ...).
    #[serde(default = "default_language")]
    pub language: String,

    /// Pause after each spoken line before the next event is handled.
    #[serde(default)]
    pub speak_sleep_ms: u64,

    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    #[serde(default = "default_premature_phone_min_digits")]
    pub premature_phone_min_digits: usize,
}

/// Lead delivery settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    #[serde(default)]
    pub assign_url: Option<String>,

    /// Endpoint for franchise prospects; falls back to `assign_url`.
    #[serde(default)]
    pub assign_url_prospect: Option<String>,

    /// Endpoint for franchise support tickets; falls back to `assign_url`.
    #[serde(default)]
    pub assign_url_support: Option<String>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Optional append-only JSONL file receiving every lead.
    #[serde(default)]
    pub lead_log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandoffConfig {
    /// Number read out when a caller must be sent to a human directly.
    #[serde(default = "default_human_number")]
    pub human_number: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KnowledgeConfig {
    /// TOML topic table replacing the built-in one.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_language() -> String {
    "es-ES".to_string()
}

fn default_cooldown_ms() -> u64 {
    1200
}

fn default_premature_phone_min_digits() -> usize {
    leadline_dialogue::config::DEFAULT_PREMATURE_PHONE_DIGITS
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_human_number() -> String {
    leadline_dialogue::config::DEFAULT_HANDOFF_NUMBER.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            speak_sleep_ms: 0,
            cooldown_ms: default_cooldown_ms(),
            premature_phone_min_digits: default_premature_phone_min_digits(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            assign_url: None,
            assign_url_prospect: None,
            assign_url_support: None,
            timeout_ms: default_timeout_ms(),
            lead_log_path: None,
        }
    }
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            human_number: default_human_number(),
        }
    }
}

impl Config {
    /// Settings shared by every dialogue session.
    pub fn dialogue_settings(&self) -> DialogueSettings {
        DialogueSettings {
            language: self.dialogue.language.clone(),
            cooldown: Duration::from_millis(self.dialogue.cooldown_ms),
            premature_phone_min_digits: self.dialogue.premature_phone_min_digits,
            handoff_number: self.handoff.human_number.clone(),
        }
    }

    pub fn assign_targets(&self) -> AssignTargets {
        AssignTargets::new(
            self.dispatch.assign_url.clone(),
            self.dispatch.assign_url_prospect.clone(),
            self.dispatch.assign_url_support.clone(),
        )
    }

    pub fn speak_sleep(&self) -> Duration {
        Duration::from_millis(self.dialogue.speak_sleep_ms)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch.timeout_ms)
    }
}

/// Errors that can occur when loading configuration or building the
/// resources it names.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid knowledge table: {0}")]
    Knowledge(#[from] KnowledgeError),

    #[error("invalid lexicon: {0}")]
    Lexicon(#[from] LexiconError),

    #[error("failed to open lead log: {0}")]
    LeadLog(#[from] DispatchError),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `LEADLINE_HOST`, `LEADLINE_PORT` override `server.*`
/// - `LEADLINE_LOG_LEVEL`, `LEADLINE_LOG_JSON` override `logging.*`
/// - `CR_LANGUAGE`, `SPEAK_SLEEP_MS`, `COOLDOWN_MS` override `dialogue.*`
/// - `ASSIGN_URL`, `ASSIGN_URL_PROSPECT`, `ASSIGN_URL_SUPPORT`,
///   `ASSIGN_TIMEOUT_MS`, `LEAD_LOG_PATH` override `dispatch.*`
/// - `HUMAN_FALLBACK_NUMBER` overrides `handoff.human_number`
/// - `KNOWLEDGE_PATH` overrides `knowledge.path`
///
/// Unparsable numeric values are ignored.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies overrides from `lookup`, which maps a variable name to its value.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(parsed) = lookup("LEADLINE_HOST").and_then(|v| v.parse().ok()) {
        config.server.host = parsed;
    }
    if let Some(parsed) = lookup("LEADLINE_PORT").and_then(|v| v.parse().ok()) {
        config.server.port = parsed;
    }
    if let Some(level) = lookup("LEADLINE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("LEADLINE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    if let Some(language) = lookup("CR_LANGUAGE").filter(|v| !v.trim().is_empty()) {
        config.dialogue.language = language;
    }
    if let Some(parsed) = lookup("SPEAK_SLEEP_MS").and_then(|v| v.trim().parse().ok()) {
        config.dialogue.speak_sleep_ms = parsed;
    }
    if let Some(parsed) = lookup("COOLDOWN_MS").and_then(|v| v.trim().parse().ok()) {
        config.dialogue.cooldown_ms = parsed;
    }

    if let Some(url) = lookup("ASSIGN_URL") {
        config.dispatch.assign_url = Some(url);
    }
    if let Some(url) = lookup("ASSIGN_URL_PROSPECT") {
        config.dispatch.assign_url_prospect = Some(url);
    }
    if let Some(url) = lookup("ASSIGN_URL_SUPPORT") {
        config.dispatch.assign_url_support = Some(url);
    }
    if let Some(parsed) = lookup("ASSIGN_TIMEOUT_MS").and_then(|v| v.trim().parse().ok()) {
        config.dispatch.timeout_ms = parsed;
    }
    if let Some(path) = lookup("LEAD_LOG_PATH").filter(|v| !v.trim().is_empty()) {
        config.dispatch.lead_log_path = Some(PathBuf::from(path));
    }

    if let Some(number) = lookup("HUMAN_FALLBACK_NUMBER").filter(|v| !v.trim().is_empty()) {
        config.handoff.human_number = number;
    }
    if let Some(path) = lookup("KNOWLEDGE_PATH").filter(|v| !v.trim().is_empty()) {
        config.knowledge.path = Some(PathBuf::from(path));
    }
}
