//! TOML-based configuration for the Knowledge Assistant server
//!
//! Everything is read from a single `kassist.toml`. Secrets never live in the
//! file: sections name the environment variable that holds them
//! (`api_key_env`, `turso_token_env`), resolved at the point of use.
//!
//! # Hot Reloading
//!
//! RAG and chat parameters are read per request from
//! [`KassistConfigManager::config`], so edits to the file take effect without
//! a restart once [`KassistConfigManager::start_watching`] is running.
//! Server address, database and upload directory are only read at startup.

use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Root configuration structure loaded from kassist.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KassistConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub rag: RagConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub public: PublicConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local database path, or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Environment variable for Turso URL (optional cloud config)
    pub turso_url_env: Option<String>,

    /// Environment variable for Turso auth token
    pub turso_token_env: Option<String>,
}

fn default_database_url() -> String {
    "./data/kassist.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            turso_url_env: None,
            turso_token_env: None,
        }
    }
}

// ============= Storage Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the original uploaded files
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_max_file_size() -> usize {
    10 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            max_file_size: default_max_file_size(),
        }
    }
}

// ============= OCR Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract executable, looked up on `PATH` unless absolute
    #[serde(default = "default_tesseract_binary")]
    pub binary: String,

    /// Tesseract language pack(s), e.g. `eng` or `eng+deu`
    #[serde(default = "default_ocr_language")]
    pub language: String,
}

fn default_tesseract_binary() -> String {
    "tesseract".to_string()
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            binary: default_tesseract_binary(),
            language: default_ocr_language(),
        }
    }
}

// ============= Provider Configuration =============

/// Remote API family used for embeddings or generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Generative Language API
    #[default]
    Gemini,
    /// OpenAI or any OpenAI-compatible endpoint
    OpenAI,
    /// Local Ollama server
    Ollama,
}

impl ProviderKind {
    /// Base URL used when the config doesn't set one
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::OpenAI => "https://api.openai.com/v1",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }

    /// Environment variable holding the API key when the config doesn't name one
    pub fn default_api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::OpenAI => Some("OPENAI_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAI => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    pub base_url: Option<String>,

    /// Environment variable containing the API key
    pub api_key_env: Option<String>,

    /// Embedding requests in flight per upload
    #[serde(default = "default_embedding_concurrency")]
    pub concurrency: usize,

    /// Number of embeddings kept in the in-memory LRU cache (0 disables it)
    #[serde(default = "default_embedding_cache_size")]
    pub cache_size: usize,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_model() -> String {
    "models/embedding-001".to_string()
}

fn default_embedding_concurrency() -> usize {
    4
}

fn default_embedding_cache_size() -> usize {
    1000
}

fn default_embedding_timeout() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: default_embedding_model(),
            base_url: None,
            api_key_env: None,
            concurrency: default_embedding_concurrency(),
            cache_size: default_embedding_cache_size(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl EmbeddingConfig {
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
    }

    pub fn api_key_env(&self) -> Option<String> {
        self.api_key_env
            .clone()
            .or_else(|| self.provider.default_api_key_env().map(str::to_string))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default = "default_llm_model")]
    pub model: String,

    pub base_url: Option<String>,

    /// Environment variable containing the API key
    pub api_key_env: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_model() -> String {
    "gemini-pro".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_llm_timeout() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: default_llm_model(),
            base_url: None,
            api_key_env: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl LlmConfig {
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
    }

    pub fn api_key_env(&self) -> Option<String> {
        self.api_key_env
            .clone()
            .or_else(|| self.provider.default_api_key_env().map(str::to_string))
    }
}

// ============= RAG / Chat Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Upper bound for `k` on the search endpoint
    #[serde(default = "default_max_search_results")]
    pub max_search_results: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_max_search_results() -> usize {
    20
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            max_search_results: default_max_search_results(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    #[serde(default = "default_max_sources")]
    pub default_max_sources: usize,

    #[serde(default = "default_max_sources_limit")]
    pub max_sources_limit: usize,
}

fn default_max_message_chars() -> usize {
    2000
}

fn default_max_sources() -> usize {
    5
}

fn default_max_sources_limit() -> usize {
    10
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_chars: default_max_message_chars(),
            default_max_sources: default_max_sources(),
            max_sources_limit: default_max_sources_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicConfig {
    /// Frontend origin used for share links and CORS
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for PublicConfig {
    fn default() -> Self {
        Self {
            frontend_url: default_frontend_url(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),
}

impl KassistConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: KassistConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate limits and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rag.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "rag.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }
        if self.rag.max_search_results == 0 {
            return Err(ConfigError::ValidationError(
                "rag.max_search_results must be at least 1".to_string(),
            ));
        }
        if self.storage.max_file_size == 0 {
            return Err(ConfigError::ValidationError(
                "storage.max_file_size must be greater than zero".to_string(),
            ));
        }
        if self.embedding.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.concurrency must be at least 1".to_string(),
            ));
        }
        if self.chat.max_message_chars == 0 || self.chat.max_sources_limit == 0 {
            return Err(ConfigError::ValidationError(
                "chat limits must be greater than zero".to_string(),
            ));
        }
        if self.chat.default_max_sources == 0
            || self.chat.default_max_sources > self.chat.max_sources_limit
        {
            return Err(ConfigError::ValidationError(format!(
                "chat.default_max_sources must be between 1 and {}",
                self.chat.max_sources_limit
            )));
        }
        if !matches!(self.server.log_format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "server.log_format must be 'pretty' or 'json', got '{}'",
                self.server.log_format
            )));
        }

        if let Some(env) = self.embedding.api_key_env() {
            self.validate_env_var(&env)?;
        }
        if let Some(env) = self.llm.api_key_env() {
            self.validate_env_var(&env)?;
        }
        if let Some(ref env) = self.database.turso_url_env {
            self.validate_env_var(env)?;
        }
        if let Some(ref env) = self.database.turso_token_env {
            self.validate_env_var(env)?;
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    /// API key for the embedding provider, if it needs one
    pub fn embedding_api_key(&self) -> Result<Option<String>, ConfigError> {
        match self.embedding.api_key_env() {
            Some(env) => self
                .resolve_env(&env)
                .map(Some)
                .ok_or(ConfigError::MissingEnvVar(env)),
            None => Ok(None),
        }
    }

    /// API key for the LLM provider, if it needs one
    pub fn llm_api_key(&self) -> Result<Option<String>, ConfigError> {
        match self.llm.api_key_env() {
            Some(env) => self
                .resolve_env(&env)
                .map(Some)
                .ok_or(ConfigError::MissingEnvVar(env)),
            None => Ok(None),
        }
    }

    /// Turso URL and token, when both env vars are configured and set
    pub fn turso_remote(&self) -> Option<(String, String)> {
        let url = self.resolve_env(self.database.turso_url_env.as_deref()?)?;
        let token = self.resolve_env(self.database.turso_token_env.as_deref()?)?;
        Some((url, token))
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// ============= Hot Reloading Configuration Manager =============

/// Thread-safe configuration manager with hot reloading support
pub struct KassistConfigManager {
    config: Arc<ArcSwap<KassistConfig>>,
    config_path: PathBuf,
    watcher: RwLock<Option<RecommendedWatcher>>,
}

impl KassistConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Absolute path for reliable file watching
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = KassistConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: path,
            watcher: RwLock::new(None),
        })
    }

    /// Create a config manager directly from a config (useful for testing).
    /// This won't have file watching capabilities.
    pub fn from_config(config: KassistConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: PathBuf::from("kassist.toml"),
            watcher: RwLock::new(None),
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<KassistConfig> {
        self.config.load_full()
    }

    /// Path the configuration was loaded from
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Manually reload the configuration from disk
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!("Reloading configuration from {:?}", self.config_path);

        let new_config = KassistConfig::load(&self.config_path)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Start watching for configuration file changes
    pub fn start_watching(&self) -> Result<(), ConfigError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let config_path = self.config_path.clone();
        let file_name = config_path.file_name().map(|n| n.to_os_string());
        let config_arc = Arc::clone(&self.config);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if touches_config && (event.kind.is_modify() || event.kind.is_create()) {
                        // Debounced in the receiver
                        let _ = tx.send(());
                    }
                }
                Err(e) => {
                    error!("Config watcher error: {:?}", e);
                }
            }
        })?;

        // Watch the parent directory so editors that replace the file are seen
        if let Some(parent) = self.config_path.parent() {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }

        *self.watcher.write() = Some(watcher);

        tokio::spawn(async move {
            let debounce = Duration::from_millis(500);
            let mut last_reload: Option<std::time::Instant> = None;

            while rx.recv().await.is_some() {
                if last_reload.is_some_and(|t| t.elapsed() < debounce) {
                    continue;
                }

                // Let the writer finish
                tokio::time::sleep(Duration::from_millis(100)).await;

                match KassistConfig::load(&config_path) {
                    Ok(new_config) => {
                        config_arc.store(Arc::new(new_config));
                        info!("Configuration hot-reloaded successfully");
                        last_reload = Some(std::time::Instant::now());
                    }
                    Err(e) => {
                        warn!(
                            "Failed to hot-reload config: {}. Keeping previous config.",
                            e
                        );
                    }
                }
            }
        });

        info!("Configuration hot-reload watcher started");
        Ok(())
    }

    /// Stop watching for configuration changes
    pub fn stop_watching(&self) {
        *self.watcher.write() = None;
        info!("Configuration hot-reload watcher stopped");
    }
}

impl Clone for KassistConfigManager {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            config_path: self.config_path.clone(),
            watcher: RwLock::new(None), // Watcher is not cloned
        }
    }
}
