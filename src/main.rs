use anyhow::Context;
use kassist::{
    api::routes::build_app,
    cli::{
        init::{self, InitConfig, InitResult},
        output::Output,
        secrets, Cli, Commands,
    },
    extract::TesseractOcr,
    rag::{CachedEmbedder, Embedder, HttpEmbedder},
    AppState, ConfigBasedLLMFactory, KassistConfig, KassistConfigManager, TursoClient,
};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        Some(Commands::Init {
            path,
            force,
            provider,
            host,
            port,
        }) => {
            let result = init::run(
                InitConfig {
                    path,
                    force,
                    provider,
                    host,
                    port,
                },
                &output,
            );
            match result {
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
                InitResult::Error(e) => anyhow::bail!(e),
            }
        }
        Some(Commands::Config { full, validate }) => {
            show_config(&cli.config, full, validate, &output)
        }
        Some(Commands::Secrets { length }) => {
            secrets::run(length, &output);
            Ok(())
        }
        None => serve(&cli.config, cli.verbose, &output).await,
    }
}

fn init_tracing(config: &KassistConfig, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.server.log_format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn serve(config_path: &Path, verbose: bool, output: &Output) -> anyhow::Result<()> {
    if !config_path.exists() {
        output.error(&format!("{} not found", config_path.display()));
        output.hint("Run 'kassist-server init' to create one");
        anyhow::bail!("configuration file {} not found", config_path.display());
    }

    let config_manager = Arc::new(
        KassistConfigManager::new(config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?,
    );
    let config = config_manager.config();

    init_tracing(&config, verbose);
    tracing::info!(config = %config_path.display(), "Starting Knowledge Assistant server");

    let turso = Arc::new(
        TursoClient::from_config(&config)
            .await
            .context("failed to open database")?,
    );

    let http_embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::from_config(
        &config.embedding,
        config.embedding_api_key()?,
    )?);
    let embedder: Arc<dyn Embedder> = if config.embedding.cache_size > 0 {
        Arc::new(CachedEmbedder::new(
            http_embedder,
            config.embedding.cache_size,
        ))
    } else {
        http_embedder
    };
    tracing::info!(
        provider = %config.embedding.provider,
        model = %config.embedding.model,
        cache_size = config.embedding.cache_size,
        "Embedding provider ready"
    );

    let llm_factory = Arc::new(ConfigBasedLLMFactory::new(config_manager.clone()));
    let ocr = Arc::new(TesseractOcr::from_config(&config.ocr));

    tokio::fs::create_dir_all(&config.storage.upload_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create upload directory {}",
                config.storage.upload_dir.display()
            )
        })?;

    if let Err(e) = config_manager.start_watching() {
        tracing::warn!(error = %e, "Config hot reload disabled");
    }

    let state = AppState::new(config_manager.clone(), turso, embedder, llm_factory, ocr);
    let app = build_app(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(addr = %addr, "Server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    config_manager.stop_watching();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn show_config(path: &Path, full: bool, validate: bool, output: &Output) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: KassistConfig =
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))?;

    output.header("Configuration");
    output.kv("file", &path.display().to_string());

    if full {
        output.newline();
        println!("{}", toml::to_string_pretty(&config)?);
    } else {
        output.kv("listen", &config.bind_addr());
        output.kv("database", &config.database.url);
        output.kv("upload_dir", &config.storage.upload_dir.display().to_string());
        output.kv(
            "embedding",
            &format!("{} ({})", config.embedding.provider, config.embedding.model),
        );
        output.kv(
            "llm",
            &format!("{} ({})", config.llm.provider, config.llm.model),
        );
        output.kv(
            "chunking",
            &format!(
                "{} chars, {} overlap",
                config.rag.chunk_size, config.rag.chunk_overlap
            ),
        );
        output.kv("frontend_url", &config.public.frontend_url);
    }

    if validate {
        output.newline();
        match config.validate() {
            Ok(()) => output.success("Configuration is valid"),
            Err(e) => {
                output.error(&e.to_string());
                anyhow::bail!("invalid configuration");
            }
        }
    }

    Ok(())
}
