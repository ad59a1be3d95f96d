use crate::api::handlers::{chat, documents, health, public};
use crate::types::{
    ChatHistoryResponse, ChatModeInfo, ChatModesResponse, ChatRequest, ChatResponse, ChatSource,
    ClearHistoryResponse, ConversationRecord, DeleteDocumentResponse, Document,
    DocumentListResponse, DocumentMetadata, DocumentStats, DocumentSummary, HealthResponse,
    OcrDetails, PublicDocumentResponse, PublicListEntry, PublicListMetadata, PublicListResponse,
    PublicStats, RevokeShareResponse, SearchHit, SearchResponse, ServiceInfo, ShareInfo,
    ShareRequest, ShareResponse, SourceRef, UploadResponse,
};
use crate::AppState;
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Request, State},
    http::{HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use http_body_util::Limited;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// Extra room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Origin always allowed alongside the configured frontend.
const DEV_ORIGIN: &str = "http://localhost:3000";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Knowledge Assistant API",
        description = "Document upload, semantic search and retrieval-augmented chat"
    ),
    paths(
        health::root,
        health::health,
        documents::upload_document,
        documents::search_documents,
        documents::list_documents,
        documents::list_public_documents,
        documents::document_stats,
        documents::get_document,
        documents::delete_document,
        chat::chat,
        chat::get_history,
        chat::clear_history,
        chat::list_modes,
        public::create_share,
        public::get_public_document,
        public::download_public_document,
        public::list_public,
        public::revoke_share,
        public::public_stats,
    ),
    components(schemas(
        ServiceInfo,
        HealthResponse,
        Document,
        DocumentMetadata,
        DocumentSummary,
        OcrDetails,
        UploadResponse,
        SearchHit,
        SearchResponse,
        DocumentListResponse,
        DocumentStats,
        DeleteDocumentResponse,
        ChatRequest,
        ChatResponse,
        ChatSource,
        SourceRef,
        ConversationRecord,
        ChatHistoryResponse,
        ClearHistoryResponse,
        ChatModeInfo,
        ChatModesResponse,
        ShareRequest,
        ShareResponse,
        ShareInfo,
        PublicDocumentResponse,
        PublicListEntry,
        PublicListMetadata,
        PublicListResponse,
        RevokeShareResponse,
        PublicStats,
    )),
    tags(
        (name = "health", description = "Service status"),
        (name = "documents", description = "Upload, search and manage documents"),
        (name = "chat", description = "Retrieval-augmented chat and history"),
        (name = "public", description = "Public share links")
    )
)]
pub struct ApiDoc;

/// All API routes, without middleware.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        // Documents
        .route("/api/documents", get(documents::list_documents))
        .route("/api/documents/upload", post(documents::upload_document))
        .route("/api/documents/search", get(documents::search_documents))
        .route("/api/documents/public", get(documents::list_public_documents))
        .route("/api/documents/stats/summary", get(documents::document_stats))
        .route(
            "/api/documents/{document_id}",
            get(documents::get_document).delete(documents::delete_document),
        )
        // Chat
        .route("/api/chat", post(chat::chat))
        .route("/api/chat/modes", get(chat::list_modes))
        .route(
            "/api/chat/history/{session_id}",
            get(chat::get_history).delete(chat::clear_history),
        )
        // Public shares
        .route("/api/public/share", post(public::create_share))
        .route("/api/public/share/{share_token}", delete(public::revoke_share))
        .route(
            "/api/public/document/{share_token}",
            get(public::get_public_document),
        )
        .route(
            "/api/public/download/{share_token}",
            get(public::download_public_document),
        )
        .route("/api/public/list", get(public::list_public))
        .route("/api/public/stats", get(public::public_stats))
        .merge(docs_routes())
}

#[cfg(not(feature = "swagger-ui"))]
fn docs_routes() -> Router<AppState> {
    Router::new().route("/api/openapi.json", get(openapi_json))
}

#[cfg(feature = "swagger-ui")]
fn docs_routes() -> Router<AppState> {
    use utoipa_swagger_ui::SwaggerUi;

    Router::new().merge(SwaggerUi::new("/docs").url("/api/openapi.json", ApiDoc::openapi()))
}

#[cfg(not(feature = "swagger-ui"))]
async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    axum::Json(ApiDoc::openapi())
}

/// CORS for the configured frontend plus the local dev origin.
pub fn cors_layer(frontend_url: &str) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = Vec::new();
    for origin in [frontend_url.trim_end_matches('/'), DEV_ORIGIN] {
        match HeaderValue::from_str(origin) {
            Ok(value) if !origins.contains(&value) => origins.push(value),
            Ok(_) => {}
            Err(_) => tracing::warn!(origin = %origin, "Ignoring invalid CORS origin"),
        }
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

/// Caps the request body at the current `storage.max_file_size`, so a
/// reloaded limit applies to the next request.
async fn limit_body(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limit = state
        .config_manager
        .config()
        .storage
        .max_file_size
        .saturating_add(MULTIPART_OVERHEAD);
    next.run(request.map(|body| Body::new(Limited::new(body, limit))))
        .await
}

/// The complete application: routes, state and middleware.
pub fn build_app(state: AppState) -> Router {
    let config = state.config_manager.config();

    create_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.public.frontend_url))
                .layer(DefaultBodyLimit::disable())
                .layer(middleware::from_fn_with_state(state.clone(), limit_body)),
        )
        .with_state(state)
}
