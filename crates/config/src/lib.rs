//! Configuration loading, validation, and management for Wrenchwise.
//!
//! Loads configuration from `~/.wrenchwise/config.toml` with environment
//! variable overrides. Everything is validated at startup: a persona missing
//! a localized entry or an empty model ladder stops the process before any
//! request is served.

pub mod personas;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use wrenchwise_core::{AgentPersona, Language, ModelLadder, ModelTier};

pub use personas::builtin_personas;

/// Hazard keywords that trigger the safety preface.
///
/// Matched as case-insensitive substrings, so short entries such as "gas"
/// also fire inside unrelated words.
pub const DEFAULT_SAFETY_KEYWORDS: &[&str] = &[
    "230v",
    "240v",
    "400v",
    "mains",
    "high voltage",
    "live wire",
    "circuit breaker",
    "fuse box",
    "gas",
    "brake",
    "hochspannung",
    "starkstrom",
    "stromschlag",
    "sicherungskasten",
    "leitungsschutzschalter",
    "bremse",
];

/// The root configuration structure.
///
/// Maps directly to `~/.wrenchwise/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the inference provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Inference provider settings
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Model ladder and per-call behavior
    #[serde(default)]
    pub cascade: CascadeConfig,

    /// Safety preface settings
    #[serde(default)]
    pub safety: SafetyConfig,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Inline persona definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub personas: Vec<AgentPersona>,

    /// Separate TOML file holding `[[personas]]` entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personas_file: Option<PathBuf>,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("cascade", &self.cascade)
            .field("safety", &self.safety)
            .field("gateway", &self.gateway)
            .field(
                "personas",
                &self.personas.iter().map(|p| &p.id).collect::<Vec<_>>(),
            )
            .field("personas_file", &self.personas_file)
            .finish()
    }
}

/// Which provider backend to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini over HTTPS
    Gemini,
    /// Canned offline responses (demos, smoke tests)
    Scripted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_kind")]
    pub kind: ProviderKind,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout of the HTTP client
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_provider_kind() -> ProviderKind {
    ProviderKind::Gemini
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// A ladder entry as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    pub id: String,

    /// Overrides the capability derived from the identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_tools: Option<bool>,
}

impl TierConfig {
    fn to_tier(&self) -> ModelTier {
        match self.supports_tools {
            Some(flag) => ModelTier::with_tools(&self.id, flag),
            None => ModelTier::new(&self.id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Tiers in fallback order, highest priority first
    #[serde(default = "default_tiers")]
    pub tiers: Vec<TierConfig>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Most recent turns forwarded to the provider
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Deadline for establishing a tier call and for each following chunk (0 = none)
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    #[serde(default)]
    pub default_language: Language,
}

fn default_tiers() -> Vec<TierConfig> {
    ["gemini-2.5-pro", "gemini-2.5-flash", "gemini-2.5-flash-lite"]
        .into_iter()
        .map(|id| TierConfig {
            id: id.into(),
            supports_tools: None,
        })
        .collect()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_history_limit() -> usize {
    20
}
fn default_attempt_timeout_secs() -> u64 {
    90
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
            temperature: default_temperature(),
            history_limit: default_history_limit(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            default_language: Language::default(),
        }
    }
}

impl CascadeConfig {
    /// The per-attempt deadline, `None` when disabled.
    pub fn attempt_timeout(&self) -> Option<Duration> {
        (self.attempt_timeout_secs > 0).then(|| Duration::from_secs(self.attempt_timeout_secs))
    }

    /// Build the validated ladder.
    pub fn ladder(&self) -> Result<ModelLadder, ConfigError> {
        ModelLadder::new(self.tiers.iter().map(TierConfig::to_tier).collect())
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

fn default_keywords() -> Vec<String> {
    DEFAULT_SAFETY_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8787
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Shape of a standalone personas file.
#[derive(Debug, Deserialize)]
struct PersonaFile {
    #[serde(default)]
    personas: Vec<AgentPersona>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.wrenchwise/config.toml).
    ///
    /// Environment variables override file values:
    /// - `WRENCHWISE_API_KEY`, then `GEMINI_API_KEY`, then `GOOGLE_API_KEY`
    /// - `WRENCHWISE_TIERS` (comma-separated model ids)
    /// - `WRENCHWISE_PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from `path`, then apply environment overrides and re-validate.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// A missing file yields the defaults. A relative `personas_file` is
    /// resolved against the config file's directory.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            let mut config = Self::default();
            config.personas = builtin_personas();
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if let Some(file) = config.personas_file.clone() {
            let file = match path.parent() {
                Some(dir) if file.is_relative() => dir.join(file),
                _ => file,
            };
            config.personas.extend(Self::load_personas(&file)?);
        }
        if config.personas.is_empty() {
            config.personas = builtin_personas();
        }

        config.validate()?;
        Ok(config)
    }

    fn load_personas(path: &Path) -> Result<Vec<AgentPersona>, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let file: PersonaFile = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::debug!(count = file.personas.len(), path = %path.display(), "Loaded personas");
        Ok(file.personas)
    }

    /// Apply overrides from an environment-like lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.api_key.is_none() {
            self.api_key = lookup("WRENCHWISE_API_KEY")
                .or_else(|| lookup("GEMINI_API_KEY"))
                .or_else(|| lookup("GOOGLE_API_KEY"))
                .filter(|k| !k.trim().is_empty());
        }

        if let Some(tiers) = lookup("WRENCHWISE_TIERS") {
            self.cascade.tiers = tiers
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| TierConfig {
                    id: id.to_string(),
                    supports_tools: None,
                })
                .collect();
        }

        if let Some(port) = lookup("WRENCHWISE_PORT") {
            self.gateway.port = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("WRENCHWISE_PORT is not a valid port: {port}"))
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".wrenchwise")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.cascade.temperature) {
            return Err(ConfigError::ValidationError(
                "cascade.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.cascade.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "cascade.history_limit must be at least 1".into(),
            ));
        }

        self.cascade.ladder()?;

        let mut seen = HashSet::new();
        for persona in &self.personas {
            if !seen.insert(persona.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate persona id '{}'",
                    persona.id
                )));
            }
            let missing = persona.missing_entries();
            if !missing.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "persona '{}' is missing localized entries: {}",
                    persona.id,
                    missing.join(", ")
                )));
            }
        }

        Ok(())
    }

    /// Find a persona by id.
    pub fn persona(&self, id: &str) -> Option<&AgentPersona> {
        self.personas.iter().find(|p| p.id == id)
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: ProviderSettings::default(),
            cascade: CascadeConfig::default(),
            safety: SafetyConfig::default(),
            gateway: GatewayConfig::default(),
            personas: vec![],
            personas_file: None,
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cascade.history_limit, 20);
        assert_eq!(config.cascade.tiers[0].id, "gemini-2.5-pro");
        assert_eq!(config.provider.kind, ProviderKind::Gemini);
    }

    #[test]
    fn default_ladder_gates_tools_on_pro() {
        let ladder = AppConfig::default().cascade.ladder().unwrap();
        let flags: Vec<_> = ladder.iter().map(|t| t.supports_tools).collect();
        assert_eq!(flags, [true, false, false]);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.cascade.tiers, config.cascade.tiers);
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.cascade.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_ladder_rejected() {
        let mut config = AppConfig::default();
        config.cascade.tiers.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at least one tier"));
    }

    #[test]
    fn incomplete_persona_rejected() {
        let mut config = AppConfig::default();
        let mut persona = builtin_personas().remove(0);
        persona.system_instruction.de.clear();
        config.personas = vec![persona];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("system_instruction/de"));
    }

    #[test]
    fn duplicate_persona_rejected() {
        let mut config = AppConfig::default();
        let persona = builtin_personas().remove(0);
        config.personas = vec![persona.clone(), persona];
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults_with_builtin_personas() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert!(config.persona("electrician").is_some());
    }

    #[test]
    fn explicit_tool_flag_in_toml() {
        let toml_str = r#"
[cascade]
history_limit = 8
attempt_timeout_secs = 0

[[cascade.tiers]]
id = "tier-a"
supports_tools = true

[[cascade.tiers]]
id = "tier-b-pro"
supports_tools = false
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        let ladder = config.cascade.ladder().unwrap();
        assert!(ladder.tiers()[0].supports_tools);
        assert!(!ladder.tiers()[1].supports_tools);
        assert_eq!(config.cascade.attempt_timeout(), None);
        assert_eq!(config.cascade.history_limit, 8);
    }

    #[test]
    fn env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(env(&[
                ("GEMINI_API_KEY", "g-key"),
                ("WRENCHWISE_TIERS", "x-pro, y ,"),
                ("WRENCHWISE_PORT", "9000"),
            ]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("g-key"));
        let ids: Vec<_> = config.cascade.tiers.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["x-pro", "y"]);
        assert_eq!(config.gateway.port, 9000);
    }

    #[test]
    fn configured_key_wins_over_env() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config
            .apply_overrides(env(&[("WRENCHWISE_API_KEY", "from-env")]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn bad_port_override_rejected() {
        let mut config = AppConfig::default();
        assert!(
            config
                .apply_overrides(env(&[("WRENCHWISE_PORT", "not-a-port")]))
                .is_err()
        );
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("secret-key".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn personas_file_resolved_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let personas = r#"
[[personas]]
id = "gardener"
name = "Flora"
title = { en = "Gardener", de = "Gärtnerin" }
description = { en = "Plants", de = "Pflanzen" }
system_instruction = { en = "You garden.", de = "Du gärtnerst." }
warning = { en = "Wear gloves.", de = "Handschuhe tragen." }
"#;
        std::fs::write(dir.path().join("personas.toml"), personas).unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "personas_file = \"personas.toml\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.personas.len(), 1);
        assert_eq!(config.persona("gardener").unwrap().name, "Flora");
    }

    #[test]
    fn invalid_toml_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "cascade = [not valid").unwrap();
        match AppConfig::load_from(&path) {
            Err(ConfigError::ParseError { .. }) => {}
            other => panic!("Expected ParseError, got: {other:?}"),
        }
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini-2.5-flash"));
        assert!(toml_str.contains("history_limit = 20"));
    }
}
