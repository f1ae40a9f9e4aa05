//! Service configuration.
//!
//! Loaded from `interview.toml` (or an explicit path) with `${VAR}` references
//! resolved from the environment. Provider and store factories live in
//! `interview-providers` and `interview-store`; this module is data only.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::controller::DEFAULT_MAX_QUESTIONS;
use crate::scoring::{ScoringConfig, DEFAULT_SCORING_MODEL};

/// Configuration for a single LLM provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Together {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Together {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Together")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Ollama { base_url } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

/// Where questions are read from and audit records are written to.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// In-process store seeded from question-bank TOML files.
    Memory {
        #[serde(default)]
        question_bank: Option<PathBuf>,
    },
    /// Cloud Firestore over its REST API.
    Firestore {
        project_id: String,
        #[serde(default)]
        access_token: Option<String>,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default = "default_firestore_database")]
        database: String,
    },
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Memory { question_bank } => f
                .debug_struct("Memory")
                .field("question_bank", question_bank)
                .finish(),
            StoreConfig::Firestore {
                project_id,
                access_token,
                base_url,
                database,
            } => f
                .debug_struct("Firestore")
                .field("project_id", project_id)
                .field("access_token", &access_token.as_ref().map(|_| "***"))
                .field("base_url", base_url)
                .field("database", database)
                .finish(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Memory {
            question_bank: None,
        }
    }
}

fn default_firestore_database() -> String {
    "(default)".to_string()
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address to bind, e.g. `127.0.0.1:5000`.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

/// Session lifetime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Idle time after which a session is dropped. `0` keeps sessions forever.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    /// How often the expiry sweep runs.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// Questions sampled per interview.
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
}

impl SessionSettings {
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            max_questions: default_max_questions(),
        }
    }
}

fn default_ttl() -> u64 {
    4 * 60 * 60
}
fn default_sweep_interval() -> u64 {
    60
}
fn default_max_questions() -> usize {
    DEFAULT_MAX_QUESTIONS
}

/// Scoring model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSettings {
    /// Name of the entry in `[providers]` used for scoring.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// HTTP timeout for a single model call.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Max retries on transient provider errors.
    #[serde(default)]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

impl ScoringSettings {
    pub fn scoring_config(&self) -> ScoringConfig {
        ScoringConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
            max_retries: 0,
            retry_delay_ms: default_retry_delay(),
        }
    }
}

fn default_provider() -> String {
    "together".to_string()
}
fn default_model() -> String {
    DEFAULT_SCORING_MODEL.to_string()
}
fn default_temperature() -> f64 {
    0.5
}
fn default_max_tokens() -> u32 {
    100
}
fn default_timeout() -> u64 {
    120
}
fn default_retry_delay() -> u64 {
    1000
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterviewConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub sessions: SessionSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub store: StoreConfig,
}

impl InterviewConfig {
    /// The provider selected by `[scoring] provider`.
    pub fn scoring_provider(&self) -> Result<&ProviderConfig> {
        self.providers.get(&self.scoring.provider).with_context(|| {
            format!(
                "scoring provider '{}' is not configured; add [providers.{}] or set TOGETHER_API_KEY",
                self.scoring.provider, self.scoring.provider
            )
        })
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are copied verbatim and never rescanned.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Together { api_key, base_url } => ProviderConfig::Together {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_deref().map(resolve_env_vars),
        },
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_deref().map(resolve_env_vars),
            org_id: org_id.as_deref().map(resolve_env_vars),
        },
        ProviderConfig::Ollama { base_url } => ProviderConfig::Ollama {
            base_url: resolve_env_vars(base_url),
        },
    }
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Memory { question_bank } => StoreConfig::Memory {
            question_bank: question_bank.clone(),
        },
        StoreConfig::Firestore {
            project_id,
            access_token,
            base_url,
            database,
        } => StoreConfig::Firestore {
            project_id: resolve_env_vars(project_id),
            access_token: access_token.as_deref().map(resolve_env_vars),
            base_url: base_url.as_deref().map(resolve_env_vars),
            database: database.clone(),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `interview.toml` in the current directory
/// 2. `~/.config/interview/config.toml`
///
/// Environment variable override: `TOGETHER_API_KEY`.
pub fn load_config() -> Result<InterviewConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<InterviewConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("interview.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match &config_path {
        Some(path) => parse_config_file(path)?,
        None => InterviewConfig::default(),
    };

    if let Ok(key) = std::env::var("TOGETHER_API_KEY") {
        if !key.is_empty() {
            let entry = config
                .providers
                .entry("together".into())
                .or_insert(ProviderConfig::Together {
                    api_key: String::new(),
                    base_url: None,
                });
            if let ProviderConfig::Together { api_key, .. } = entry {
                *api_key = key;
            }
        }
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config.store = resolve_store_config(&config.store);

    // Relative question-bank paths are relative to the config file.
    if let (Some(path), StoreConfig::Memory { question_bank }) = (&config_path, &mut config.store)
    {
        if let (Some(bank), Some(dir)) = (question_bank.as_mut(), path.parent()) {
            if bank.is_relative() && !dir.as_os_str().is_empty() {
                *bank = dir.join(&*bank);
            }
        }
    }

    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<InterviewConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<InterviewConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("interview"))
}
