//! Document upload, search, listing and deletion.

use crate::{
    documents::too_large,
    types::{
        AppError, DeleteDocumentResponse, Document, DocumentListResponse, DocumentStats,
        Pagination, Result, SearchParams, SearchResponse, UploadResponse,
    },
    AppState,
};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};

/// Largest page accepted by listing endpoints.
pub const MAX_PAGE_LIMIT: u32 = 100;

pub(crate) fn check_page_limit(pagination: &Pagination) -> Result<()> {
    if pagination.limit > MAX_PAGE_LIMIT {
        return Err(AppError::InvalidInput(format!(
            "Limit cannot exceed {}",
            MAX_PAGE_LIMIT
        )));
    }
    Ok(())
}

fn multipart_err(max_file_size: usize) -> impl Fn(MultipartError) -> AppError {
    move |e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            too_large(max_file_size)
        } else {
            AppError::InvalidInput(format!("Invalid multipart body: {}", e.body_text()))
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Upload a document
///
/// Multipart fields: `file` (required) and `is_public` (`true`/`false`, default false).
#[utoipa::path(
    post,
    path = "/api/documents/upload",
    responses(
        (status = 200, description = "Document processed", body = UploadResponse),
        (status = 400, description = "Missing filename, unsupported type, empty file or unreadable content"),
        (status = 413, description = "File exceeds the configured maximum size")
    ),
    tag = "documents"
)]
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let max_file_size = state.config_manager.config().storage.max_file_size;
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut is_public = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_err(max_file_size))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_err(max_file_size))?;
                file = Some((filename, bytes.to_vec()));
            }
            "is_public" => {
                let value = field.text().await.map_err(multipart_err(max_file_size))?;
                is_public = parse_bool(&value);
            }
            _ => {}
        }
    }

    let (filename, data) =
        file.ok_or_else(|| AppError::InvalidInput("Missing 'file' field".to_string()))?;
    tracing::info!(filename = %filename, bytes = data.len(), is_public, "Processing upload");

    let outcome = state.documents.upload(data, &filename, is_public).await?;
    Ok(Json(outcome.into()))
}

/// Semantic search over document chunks
#[utoipa::path(
    get,
    path = "/api/documents/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Ranked chunks", body = SearchResponse),
        (status = 400, description = "Blank query or k out of range")
    ),
    tag = "documents"
)]
pub async fn search_documents(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    if params.query.trim().is_empty() {
        return Err(AppError::InvalidInput("Query cannot be empty".to_string()));
    }
    let max_k = state.config_manager.config().rag.max_search_results;
    if params.k < 1 || params.k > max_k {
        return Err(AppError::InvalidInput(format!(
            "k must be between 1 and {}",
            max_k
        )));
    }

    let results = state
        .documents
        .search(&params.query, params.k, params.include_private)
        .await?;

    Ok(Json(SearchResponse {
        query: params.query,
        total_results: results.len(),
        results,
    }))
}

/// List all documents, newest first
#[utoipa::path(
    get,
    path = "/api/documents",
    params(Pagination),
    responses((status = 200, description = "Documents", body = DocumentListResponse)),
    tag = "documents"
)]
pub async fn list_documents(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<DocumentListResponse>> {
    list(&state, pagination, false).await
}

/// List public documents, newest first
#[utoipa::path(
    get,
    path = "/api/documents/public",
    params(Pagination),
    responses((status = 200, description = "Public documents", body = DocumentListResponse)),
    tag = "documents"
)]
pub async fn list_public_documents(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<DocumentListResponse>> {
    list(&state, pagination, true).await
}

async fn list(
    state: &AppState,
    pagination: Pagination,
    public_only: bool,
) -> Result<Json<DocumentListResponse>> {
    check_page_limit(&pagination)?;

    let documents = state
        .turso
        .list_documents(pagination.skip, pagination.limit, public_only)
        .await?;
    let total = state.turso.count_documents(public_only).await?;

    Ok(Json(DocumentListResponse {
        documents,
        total,
        skip: pagination.skip,
        limit: pagination.limit,
    }))
}

/// Document totals and file type distribution
#[utoipa::path(
    get,
    path = "/api/documents/stats/summary",
    responses((status = 200, description = "Statistics", body = DocumentStats)),
    tag = "documents"
)]
pub async fn document_stats(State(state): State<AppState>) -> Result<Json<DocumentStats>> {
    let total_documents = state.turso.count_documents(false).await?;
    let public_documents = state.turso.count_documents(true).await?;
    let file_type_distribution = state.turso.file_type_distribution(false).await?;

    Ok(Json(DocumentStats {
        total_documents,
        public_documents,
        private_documents: total_documents.saturating_sub(public_documents),
        file_type_distribution,
    }))
}

/// Fetch a document with its full text
#[utoipa::path(
    get,
    path = "/api/documents/{document_id}",
    params(("document_id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document", body = Document),
        (status = 404, description = "Document not found")
    ),
    tag = "documents"
)]
pub async fn get_document(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<Json<Document>> {
    state
        .turso
        .get_document(&document_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))
}

/// Delete a document, its chunks, shares and stored file
#[utoipa::path(
    delete,
    path = "/api/documents/{document_id}",
    params(("document_id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Deleted", body = DeleteDocumentResponse),
        (status = 404, description = "Document not found")
    ),
    tag = "documents"
)]
pub async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<Json<DeleteDocumentResponse>> {
    state.documents.delete(&document_id).await?;

    Ok(Json(DeleteDocumentResponse {
        message: "Document deleted successfully".to_string(),
        document_id,
    }))
}
