//! Init command implementation
//!
//! Scaffolds a new Knowledge Assistant project: `kassist.toml`,
//! `.env.example`, `.gitignore` and the `uploads/` and `data/` directories.

use super::output::Output;
use crate::utils::toml_config::ProviderKind;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Project already exists (kassist.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Provider for embeddings and chat (gemini, openai or ollama)
    pub provider: String,
    /// Host address for the server
    pub host: String,
    /// Port for the server
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing Knowledge Assistant Project");

    let provider = match parse_provider(&config.provider) {
        Some(provider) => provider,
        None => {
            let message = format!(
                "Unknown provider '{}'. Use gemini, openai or ollama",
                config.provider
            );
            output.error(&message);
            return InitResult::Error(message);
        }
    };

    let base_path = &config.path;

    let config_path = base_path.join("kassist.toml");
    if config_path.exists() && !config.force {
        output.warning("kassist.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    output.subheader("Creating directories");

    for dir in ["data", "uploads"] {
        let dir_path = base_path.join(dir);
        if dir_path.exists() {
            output.skipped(dir, "already exists");
            continue;
        }
        if let Err(e) = fs::create_dir_all(&dir_path) {
            output.error(&format!("Failed to create {}: {}", dir, e));
            return InitResult::Error(e.to_string());
        }
        output.created("directory", dir);
    }

    output.subheader("Creating configuration files");

    let toml_content = generate_kassist_toml(&config, provider);
    if let Err(e) = write_file(&config_path, &toml_content, config.force) {
        output.error(&format!("Failed to create kassist.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "kassist.toml");

    let env_example_path = base_path.join(".env.example");
    if let Err(e) = write_file(&env_example_path, &generate_env_example(provider), config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("env", ".env.example");

    let gitignore_path = base_path.join(".gitignore");
    if !gitignore_path.exists() {
        if let Err(e) = write_file(&gitignore_path, &generate_gitignore(), false) {
            output.warning(&format!("Failed to create .gitignore: {}", e));
        } else {
            output.created("file", ".gitignore");
        }
    }

    output.complete("Knowledge Assistant project initialized successfully!");

    output.header("Next Steps");
    output.newline();
    output.info("1. Set up environment variables:");
    output.command("cp .env.example .env");
    if let Some(env) = provider.default_api_key_env() {
        output.command(&format!("# Edit .env and set {}", env));
    }
    output.newline();

    if provider == ProviderKind::Ollama {
        output.info("2. Start Ollama and pull the models:");
        output.command("ollama serve");
        output.command("ollama pull nomic-embed-text && ollama pull llama3.2");
        output.newline();
    }

    output.info("3. Install tesseract for image uploads (optional)");
    output.info("4. Start the server:");
    output.command("kassist-server");
    output.newline();

    output.hint(&format!(
        "Server will be available at http://{}:{}",
        config.host, config.port
    ));
    output.hint("OpenAPI document at /api/openapi.json, Swagger UI at /docs with the 'swagger-ui' feature");

    InitResult::Success
}

fn parse_provider(name: &str) -> Option<ProviderKind> {
    match name.trim().to_ascii_lowercase().as_str() {
        "gemini" => Some(ProviderKind::Gemini),
        "openai" => Some(ProviderKind::OpenAI),
        "ollama" => Some(ProviderKind::Ollama),
        _ => None,
    }
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

/// (embedding model, chat model) written into a fresh config.
fn default_models(provider: ProviderKind) -> (&'static str, &'static str) {
    match provider {
        ProviderKind::Gemini => ("models/embedding-001", "gemini-pro"),
        ProviderKind::OpenAI => ("text-embedding-3-small", "gpt-4o-mini"),
        ProviderKind::Ollama => ("nomic-embed-text", "llama3.2"),
    }
}

fn generate_kassist_toml(config: &InitConfig, provider: ProviderKind) -> String {
    let (embedding_model, llm_model) = default_models(provider);
    let api_key_line = provider
        .default_api_key_env()
        .map(|env| format!("api_key_env = \"{}\"\n", env))
        .unwrap_or_default();

    format!(
        r#"# Knowledge Assistant Configuration
# =================================
# Generated by: kassist-server init
#
# Secrets are never stored here. Sections name the environment variable
# holding them (api_key_env); put the values in .env.
#
# Hot Reloading: RAG and chat settings are re-read on every request, so edits
# take effect without a restart.

# =============================================================================
# Server Configuration
# =============================================================================
[server]
host = "{host}"
port = {port}
log_level = "info"
# "pretty" or "json"
log_format = "pretty"

# =============================================================================
# Database Configuration
# =============================================================================
[database]
url = "./data/kassist.db"
# Remote Turso database (used when both variables are set)
# turso_url_env = "TURSO_URL"
# turso_token_env = "TURSO_AUTH_TOKEN"

# =============================================================================
# Uploaded Files
# =============================================================================
[storage]
upload_dir = "./uploads"
# 10 MB
max_file_size = 10485760

[ocr]
binary = "tesseract"
language = "eng"

# =============================================================================
# Providers
# =============================================================================
[embedding]
provider = "{provider}"
model = "{embedding_model}"
{api_key_line}concurrency = 4
cache_size = 1000
timeout_secs = 30

[llm]
provider = "{provider}"
model = "{llm_model}"
{api_key_line}temperature = 0.7
max_tokens = 2048
timeout_secs = 60

# =============================================================================
# Retrieval and Chat
# =============================================================================
[rag]
chunk_size = 1000
chunk_overlap = 200
max_search_results = 20

[chat]
max_message_chars = 2000
default_max_sources = 5
max_sources_limit = 10

# =============================================================================
# Public Sharing
# =============================================================================
[public]
frontend_url = "http://localhost:3000"
"#,
        host = config.host,
        port = config.port,
        provider = provider.as_str(),
        embedding_model = embedding_model,
        llm_model = llm_model,
        api_key_line = api_key_line,
    )
}

fn generate_env_example(provider: ProviderKind) -> String {
    let key_section = match provider.default_api_key_env() {
        Some(env) => format!("# REQUIRED: API key for embeddings and chat\n{}=your-api-key-here\n", env),
        None => "# Ollama runs locally and needs no API key\n".to_string(),
    };

    format!(
        r#"# Knowledge Assistant Environment Variables
# =========================================
# Copy this file to .env and fill in the values.

{key_section}
# Optional: Logging level (overrides server.log_level)
RUST_LOG=info,kassist=debug

# Optional: Turso cloud database
# TURSO_URL=libsql://your-db.turso.io
# TURSO_AUTH_TOKEN=your-token
"#,
        key_section = key_section
    )
}

fn generate_gitignore() -> String {
    r#"# Knowledge Assistant Generated Files
/data/
/uploads/
*.db
*.db-journal

# Environment
.env
.env.local
.env.*.local

# Rust
/target/

# IDE
.idea/
.vscode/
*.swp

# OS
.DS_Store
Thumbs.db
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::toml_config::KassistConfig;
    use tempfile::TempDir;

    fn init_config(path: &Path, provider: &str, force: bool) -> InitConfig {
        InitConfig {
            path: path.to_path_buf(),
            force,
            provider: provider.to_string(),
            host: "127.0.0.1".to_string(),
            port: 9100,
        }
    }

    #[test]
    fn test_generated_toml_parses_for_every_provider() {
        let dir = TempDir::new().unwrap();
        for name in ["gemini", "openai", "ollama"] {
            let provider = parse_provider(name).unwrap();
            let toml = generate_kassist_toml(&init_config(dir.path(), name, false), provider);
            let config: KassistConfig = toml::from_str(&toml).unwrap();

            assert_eq!(config.embedding.provider, provider);
            assert_eq!(config.llm.provider, provider);
            assert_eq!(config.bind_addr(), "127.0.0.1:9100");
            assert_eq!(config.rag.chunk_size, 1000);
        }
    }

    #[test]
    fn test_ollama_toml_has_no_api_key_env() {
        let dir = TempDir::new().unwrap();
        let toml = generate_kassist_toml(
            &init_config(dir.path(), "ollama", false),
            ProviderKind::Ollama,
        );
        assert!(!toml.contains("api_key_env ="));

        let config: KassistConfig = toml::from_str(&toml).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_example_names_the_key() {
        assert!(generate_env_example(ProviderKind::OpenAI).contains("OPENAI_API_KEY="));
        assert!(!generate_env_example(ProviderKind::Ollama).contains("API_KEY="));
    }

    #[test]
    fn test_write_file_respects_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.txt");

        write_file(&path, "first", false).unwrap();
        write_file(&path, "second", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");

        write_file(&path, "third", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "third");
    }

    #[test]
    fn test_run_creates_project() {
        let dir = TempDir::new().unwrap();
        let result = run(init_config(dir.path(), "gemini", false), &Output::no_color());

        assert!(matches!(result, InitResult::Success));
        assert!(dir.path().join("kassist.toml").is_file());
        assert!(dir.path().join(".env.example").is_file());
        assert!(dir.path().join(".gitignore").is_file());
        assert!(dir.path().join("uploads").is_dir());
        assert!(dir.path().join("data").is_dir());
    }

    #[test]
    fn test_run_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("kassist.toml"), "# mine").unwrap();

        let result = run(init_config(dir.path(), "gemini", false), &Output::no_color());
        assert!(matches!(result, InitResult::AlreadyExists));
        assert_eq!(
            fs::read_to_string(dir.path().join("kassist.toml")).unwrap(),
            "# mine"
        );

        let result = run(init_config(dir.path(), "gemini", true), &Output::no_color());
        assert!(matches!(result, InitResult::Success));
        assert!(fs::read_to_string(dir.path().join("kassist.toml"))
            .unwrap()
            .contains("[embedding]"));
    }

    #[test]
    fn test_run_rejects_unknown_provider() {
        let dir = TempDir::new().unwrap();
        let result = run(init_config(dir.path(), "anthropic", false), &Output::no_color());
        assert!(matches!(result, InitResult::Error(_)));
        assert!(!dir.path().join("kassist.toml").exists());
    }
}
