//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod mocks;

use kassist::{
    api::routes::build_app, utils::toml_config::ProviderKind, AppState, KassistConfig,
    KassistConfigManager, TursoClient,
};
use mocks::{MockEmbedder, MockLLMClient, MockLLMFactory, StubOcr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Largest upload accepted by test servers.
pub const TEST_MAX_FILE_SIZE: usize = 4 * 1024;

/// Configuration pointing at a temporary upload directory, with no secrets.
pub fn test_config(upload_dir: &TempDir) -> KassistConfig {
    let mut config = KassistConfig::default();
    config.database.url = ":memory:".to_string();
    config.storage.upload_dir = upload_dir.path().to_path_buf();
    config.storage.max_file_size = TEST_MAX_FILE_SIZE;
    config.embedding.provider = ProviderKind::Ollama;
    config.llm.provider = ProviderKind::Ollama;
    config.rag.chunk_size = 200;
    config.rag.chunk_overlap = 20;
    config.public.frontend_url = "https://kassist.test".to_string();
    config
}

pub fn write_config(path: &Path, config: &KassistConfig) {
    let content = toml::to_string(config).expect("serialize config");
    std::fs::write(path, content).expect("write config");
}

/// Everything a test needs to drive the app and inspect its side effects.
pub struct TestApp {
    pub state: AppState,
    pub llm: MockLLMClient,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_llm(MockLLMClient::new("Mock answer")).await
    }

    pub async fn with_llm(llm: MockLLMClient) -> Self {
        let upload_dir = TempDir::new().expect("temp upload dir");
        let manager = KassistConfigManager::from_config(test_config(&upload_dir));
        Self::assemble(llm, upload_dir, manager).await
    }

    /// App configured from a `kassist.toml` written into `upload_dir`, so tests
    /// can edit the file and reload it.
    pub async fn from_config_file() -> (Self, PathBuf) {
        let upload_dir = TempDir::new().expect("temp upload dir");
        let path = upload_dir.path().join("kassist.toml");
        write_config(&path, &test_config(&upload_dir));
        let manager = KassistConfigManager::new(&path).expect("config manager");
        let app = Self::assemble(MockLLMClient::new("Mock answer"), upload_dir, manager).await;
        (app, path)
    }

    async fn assemble(
        llm: MockLLMClient,
        upload_dir: TempDir,
        manager: KassistConfigManager,
    ) -> Self {
        let turso = Arc::new(TursoClient::new_memory().await.expect("memory db"));
        let state = AppState::new(
            Arc::new(manager),
            turso,
            Arc::new(MockEmbedder::new()),
            Arc::new(MockLLMFactory::new(llm.clone())),
            Arc::new(StubOcr::new("Scanned receipt total 42", vec![91.0, 87.0, 95.0])),
        );

        Self {
            state,
            llm,
            upload_dir,
        }
    }

    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::new(build_app(self.state.clone())).expect("test server")
    }
}
