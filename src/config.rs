//! Service configuration.
//!
//! Settings are layered: built-in defaults, then an optional YAML file
//! (`TRACKSYNC_CONFIG`, default `tracksync.yaml`), then environment
//! variables. A `.env` file in the working directory is loaded first so its
//! values count as environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the YAML configuration file.
pub const CONFIG_ENV: &str = "TRACKSYNC_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "tracksync.yaml";

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but cannot be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`Settings`].
    #[error("cannot parse {path}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// A required value is empty.
    #[error("missing required setting '{0}'")]
    Missing(&'static str),

    /// A value is present but unusable.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Setting name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// GitLab connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitlabSettings {
    /// Base URL, without `/api/v4`.
    pub url: String,
    /// Personal or project access token.
    pub token: String,
    /// Shared secret expected in `X-Gitlab-Token`. Empty disables the check.
    pub webhook_secret: String,
}

impl Default for GitlabSettings {
    fn default() -> Self {
        Self { url: "http://localhost".into(), token: String::new(), webhook_secret: String::new() }
    }
}

/// Redmine connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedmineSettings {
    /// Base URL.
    pub url: String,
    /// REST API key.
    pub api_key: String,
    /// Maximum number of open issues listed in a classification prompt.
    pub max_open_issues: usize,
}

impl Default for RedmineSettings {
    fn default() -> Self {
        Self { url: "http://localhost:3000".into(), api_key: String::new(), max_open_issues: 50 }
    }
}

/// Language-model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Bearer token for the chat-completions endpoint.
    pub api_key: String,
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    /// Primary model, used for single-shot classification and synthesis.
    pub model: String,
    /// Lighter model used for per-chunk notes.
    pub chunk_model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Token cap for classification answers.
    pub max_tokens: u32,
    /// Token cap for per-chunk notes.
    pub chunk_max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o".into(),
            chunk_model: "gpt-4o-mini".into(),
            temperature: 0.0,
            max_tokens: 1500,
            chunk_max_tokens: 800,
        }
    }
}

/// Webhook server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Capacity of the event queue between the handler and the consumer.
    pub queue_capacity: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 8000, queue_capacity: 64 }
    }
}

/// Diff summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffSettings {
    /// Glob patterns of files left out of every summary.
    pub ignore_patterns: Vec<String>,
    /// Diffs with fewer total lines keep complete patches.
    pub full_max_lines: u64,
    /// Diffs with fewer total lines keep bounded previews.
    pub summary_max_lines: u64,
    /// Lines kept per file preview.
    pub preview_lines: usize,
    /// Files listed in a high-level summary.
    pub top_files: usize,
}

impl Default for DiffSettings {
    fn default() -> Self {
        let ignore_patterns = [
            "package-lock.json",
            "yarn.lock",
            "poetry.lock",
            "Pipfile.lock",
            "*.min.js",
            "*.min.css",
            "dist/*",
            "build/*",
            "node_modules/*",
            "*.png",
            "*.jpg",
            "*.jpeg",
            "*.gif",
            "*.svg",
            "*.ico",
            "*.woff",
            "*.woff2",
            "*.ttf",
            "*.eot",
        ];
        Self {
            ignore_patterns: ignore_patterns.iter().map(ToString::to_string).collect(),
            full_max_lines: 500,
            summary_max_lines: 2000,
            preview_lines: 20,
            top_files: 10,
        }
    }
}

/// Map/reduce classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkSettings {
    /// Whether oversized diffs are chunked at all.
    pub enabled: bool,
    /// Filtered line count from which a diff is chunked.
    pub threshold_lines: u64,
    /// Files per chunk.
    pub chunk_size: usize,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self { enabled: true, threshold_lines: 2000, chunk_size: 10 }
    }
}

/// Skip and resolution keyword rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    /// Messages starting with one of these (case-insensitive) are skipped.
    pub skip_prefixes: Vec<String>,
    /// Messages containing one of these (case-insensitive) are skipped.
    pub skip_markers: Vec<String>,
    /// Keywords that mark an explicitly referenced issue as nearly done.
    pub resolution_keywords: Vec<String>,
    /// Completion ratio set when a resolution keyword is present.
    pub resolved_done_ratio: u8,
}

impl Default for RuleSettings {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(ToString::to_string).collect();
        Self {
            skip_prefixes: strings(&["merge", "revert"]),
            skip_markers: strings(&["[bot]", "[skip ci]", "[ci skip]"]),
            resolution_keywords: strings(&["fix", "resolve", "close", "수정", "해결"]),
            resolved_done_ratio: 90,
        }
    }
}

/// Repository to tracker project mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Repository name to tracker project name overrides.
    pub mapping: BTreeMap<String, String>,
    /// Suffixes removed from repository names before matching (`-api`, ...).
    pub strip_suffixes: Vec<String>,
}

/// Complete service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// GitLab connection.
    pub gitlab: GitlabSettings,
    /// Redmine connection.
    pub redmine: RedmineSettings,
    /// Language model.
    pub llm: LlmSettings,
    /// Webhook server.
    pub server: ServerSettings,
    /// Diff summarization.
    pub diff: DiffSettings,
    /// Chunked classification.
    pub chunking: ChunkSettings,
    /// Skip and resolution rules.
    pub rules: RuleSettings,
    /// Project mapping.
    pub projects: ProjectSettings,
    /// Directory holding the ledger and the audit logs.
    pub state_dir: PathBuf,
    /// Directory holding rolling log files.
    pub log_dir: PathBuf,
    /// Default log level when `TRACKSYNC_LOG` is unset.
    pub log_level: String,
    /// Optional YAML file overriding prompt templates.
    pub prompts: Option<PathBuf>,
    /// Run every step except tracker mutations and ledger marking.
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gitlab: GitlabSettings::default(),
            redmine: RedmineSettings::default(),
            llm: LlmSettings::default(),
            server: ServerSettings::default(),
            diff: DiffSettings::default(),
            chunking: ChunkSettings::default(),
            rules: RuleSettings::default(),
            projects: ProjectSettings::default(),
            state_dir: PathBuf::from("state"),
            log_dir: PathBuf::from("logs"),
            log_level: "info".into(),
            prompts: None,
            dry_run: false,
        }
    }
}

impl Settings {
    /// Loads `.env`, the YAML file, and environment overrides.
    ///
    /// A missing YAML file is not an error; an unreadable or malformed one is.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the YAML file cannot be read or parsed, or
    /// an environment override has an invalid value.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let path = std::env::var(CONFIG_ENV)
            .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
        let mut settings = if path.exists() { Self::from_file(&path)? } else { Self::default() };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Parses a YAML configuration file; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        serde_yaml::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a non-numeric `SERVER_PORT`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let strings: [(&str, &mut String); 11] = [
            ("GITLAB_URL", &mut self.gitlab.url),
            ("GITLAB_TOKEN", &mut self.gitlab.token),
            ("GITLAB_WEBHOOK_SECRET", &mut self.gitlab.webhook_secret),
            ("REDMINE_URL", &mut self.redmine.url),
            ("REDMINE_API_KEY", &mut self.redmine.api_key),
            ("OPENAI_API_KEY", &mut self.llm.api_key),
            ("OPENAI_BASE_URL", &mut self.llm.base_url),
            ("LLM_MODEL", &mut self.llm.model),
            ("LLM_CHUNK_MODEL", &mut self.llm.chunk_model),
            ("SERVER_HOST", &mut self.server.host),
            ("LOG_LEVEL", &mut self.log_level),
        ];
        for (key, slot) in strings {
            if let Some(value) = lookup(key) {
                *slot = value;
            }
        }

        if let Some(prompts) = lookup("TRACKSYNC_PROMPTS") {
            self.prompts = Some(PathBuf::from(prompts));
        }
        if let Some(dir) = lookup("TRACKSYNC_STATE_DIR") {
            self.state_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("TRACKSYNC_LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = port.trim().parse().map_err(|e| ConfigError::InvalidValue {
                field: "SERVER_PORT",
                reason: format!("{e}"),
            })?;
        }
        self.log_level = self.log_level.to_lowercase();
        Ok(())
    }

    /// Checks that the secrets needed to talk to upstream services are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming the first empty secret, or
    /// [`ConfigError::InvalidValue`] for inconsistent thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("gitlab.token", &self.gitlab.token),
            ("redmine.api_key", &self.redmine.api_key),
            ("llm.api_key", &self.llm.api_key),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::Missing(name));
        }
        if self.diff.full_max_lines >= self.diff.summary_max_lines {
            return Err(ConfigError::InvalidValue {
                field: "diff.full_max_lines",
                reason: format!(
                    "must be below diff.summary_max_lines ({})",
                    self.diff.summary_max_lines
                ),
            });
        }
        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "chunking.chunk_size",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
