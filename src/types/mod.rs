use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

// ============= Document Types =============

/// A stored document with its extracted text.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub id: String,
    pub filename: String,
    /// Lower-cased file extension
    pub file_type: String,
    pub content: String,
    pub file_size: i64,
    pub is_public: bool,
    pub metadata: DocumentMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How a document's text was obtained and where its original lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentMetadata {
    /// Path of the stored original file
    #[serde(default)]
    pub file_path: Option<String>,
    pub extraction_method: String,
    /// 0-100
    pub extraction_confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_details: Option<OcrDetails>,
    #[serde(default = "default_total_pages")]
    pub total_pages: u32,
}

fn default_total_pages() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OcrDetails {
    pub words_detected: usize,
    pub word_confidences: Vec<f32>,
}

/// Document listing entry (no content).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub metadata: DocumentMetadata,
}

impl From<Document> for DocumentSummary {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename,
            file_type: doc.file_type,
            file_size: doc.file_size,
            is_public: doc.is_public,
            created_at: doc.created_at,
            metadata: doc.metadata,
        }
    }
}

/// Chunk ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChunk {
    pub content: String,
    pub chunk_index: usize,
    pub start_char: usize,
    pub end_char: usize,
    pub page_number: Option<u32>,
    /// `None` when embedding the chunk failed
    pub embedding: Option<Vec<f32>>,
}

/// A stored chunk joined with its parent document, as scanned by search.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub document_id: String,
    pub document_name: String,
    pub is_public: bool,
    pub content: String,
    pub chunk_index: usize,
    pub start_char: usize,
    pub end_char: usize,
    pub page_number: Option<u32>,
    pub embedding: Vec<f32>,
}

/// A chunk ranked against a query.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchHit {
    pub document_id: String,
    pub document_name: String,
    pub chunk_content: String,
    pub similarity_score: f32,
    pub chunk_index: usize,
    pub start_char: usize,
    pub end_char: usize,
    pub page_number: Option<u32>,
    pub is_public: bool,
}

// ============= Conversation Types =============

/// Source reference persisted with a conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SourceRef {
    pub document_id: String,
    pub document_name: String,
    pub similarity_score: f32,
    pub chunk_index: usize,
}

impl From<&SearchHit> for SourceRef {
    fn from(hit: &SearchHit) -> Self {
        Self {
            document_id: hit.document_id.clone(),
            document_name: hit.document_name.clone(),
            similarity_score: hit.similarity_score,
            chunk_index: hit.chunk_index,
        }
    }
}

/// One question/answer turn of a chat session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationRecord {
    pub id: String,
    pub session_id: String,
    pub user_message: String,
    pub ai_response: String,
    pub mode: String,
    pub sources_used: Vec<SourceRef>,
    pub confidence_score: f64,
    pub created_at: DateTime<Utc>,
}

// ============= Public Share Types =============

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicShare {
    pub id: String,
    pub document_id: String,
    pub share_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl PublicShare {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry < now)
    }
}

// ============= API Request/Response Types =============

#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_page_limit")]
    pub limit: u32,
}

fn default_page_limit() -> u32 {
    50
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_page_limit(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub document_id: String,
    pub filename: String,
    pub chunks_created: usize,
    pub text_preview: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_search_k")]
    pub k: usize,
    #[serde(default = "default_true")]
    pub include_private: bool,
}

fn default_search_k() -> usize {
    5
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub total_results: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
    pub total: u64,
    pub skip: u32,
    pub limit: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentStats {
    pub total_documents: u64,
    pub public_documents: u64,
    pub private_documents: u64,
    pub file_type_distribution: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteDocumentResponse {
    pub message: String,
    pub document_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// One of `chat`, `summarize`, `insights`, `planning`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sources: Option<usize>,
}

/// Source as presented in a chat answer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatSource {
    pub id: usize,
    pub document_name: String,
    pub document_id: String,
    pub relevance_score: f32,
    pub chunk_index: usize,
    pub content_preview: String,
    pub page_number: Option<u32>,
    pub is_public: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub response: String,
    pub reasoning: String,
    pub sources: Vec<ChatSource>,
    pub confidence_score: f64,
    pub context_summary: String,
    pub mode: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    #[serde(default = "default_page_limit")]
    pub limit: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatHistoryResponse {
    pub session_id: String,
    pub conversations: Vec<ConversationRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClearHistoryResponse {
    pub message: String,
    pub session_id: String,
    pub deleted: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatModeInfo {
    pub name: String,
    pub description: String,
    pub use_case: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatModesResponse {
    pub modes: Vec<ChatModeInfo>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShareRequest {
    pub document_id: String,
    /// Omit for a link that never expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShareResponse {
    pub share_token: String,
    pub public_url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub document_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShareInfo {
    pub share_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicDocumentResponse {
    pub id: String,
    pub filename: String,
    pub file_type: String,
    pub content: String,
    pub file_size: i64,
    pub metadata: DocumentMetadata,
    pub created_at: DateTime<Utc>,
    pub share_info: ShareInfo,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicListMetadata {
    pub total_pages: u32,
    pub extraction_method: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicListEntry {
    pub id: String,
    pub filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
    pub metadata: PublicListMetadata,
    pub share_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicListResponse {
    pub documents: Vec<PublicListEntry>,
    pub total: u64,
    pub skip: u32,
    pub limit: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevokeShareResponse {
    pub message: String,
    pub share_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicStats {
    pub total_public_documents: u64,
    pub total_shares: u64,
    pub file_type_distribution: BTreeMap<String, u64>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub docs: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub upload_dir: bool,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Gone: {0}")]
    Gone(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::LLM(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Embedding(_) => StatusCode::BAD_GATEWAY,
            AppError::Extraction(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Gone(_) => StatusCode::GONE,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let message = match self {
            AppError::Database(msg)
            | AppError::LLM(msg)
            | AppError::Embedding(msg)
            | AppError::Extraction(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidInput(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::Gone(msg)
            | AppError::Unavailable(msg)
            | AppError::Internal(msg) => msg,
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "Request failed");
        }

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<kassist_retrieval::Error> for AppError {
    fn from(err: kassist_retrieval::Error) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<crate::utils::toml_config::ConfigError> for AppError {
    fn from(err: crate::utils::toml_config::ConfigError) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
