//! Public share links: creation, anonymous access and revocation.

use crate::{
    api::handlers::documents::check_page_limit,
    types::{
        AppError, Pagination, PublicDocumentResponse, PublicListEntry, PublicListMetadata,
        PublicListResponse, PublicShare, PublicStats, Result, RevokeShareResponse, ShareInfo,
        ShareRequest, ShareResponse,
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};

/// 32 random bytes, URL-safe base64 without padding (43 characters).
pub fn generate_share_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Resolve a token to a live share, distinguishing unknown (404) from expired (410).
async fn active_share(state: &AppState, share_token: &str) -> Result<PublicShare> {
    let share = state
        .turso
        .get_share_by_token(share_token)
        .await?
        .ok_or_else(|| AppError::NotFound("Public share not found".to_string()))?;

    if share.is_expired(Utc::now()) {
        return Err(AppError::Gone("Public share has expired".to_string()));
    }
    Ok(share)
}

/// Create or refresh the share link for a document
#[utoipa::path(
    post,
    path = "/api/public/share",
    request_body = ShareRequest,
    responses(
        (status = 200, description = "Share created", body = ShareResponse),
        (status = 400, description = "expires_in_days below 1"),
        (status = 404, description = "Document not found")
    ),
    tag = "public"
)]
pub async fn create_share(
    State(state): State<AppState>,
    Json(request): Json<ShareRequest>,
) -> Result<Json<ShareResponse>> {
    if let Some(days) = request.expires_in_days {
        if days < 1 {
            return Err(AppError::InvalidInput(
                "expires_in_days must be at least 1".to_string(),
            ));
        }
    }

    let document = state
        .turso
        .get_document(&request.document_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    let expires_at = match request.expires_in_days {
        Some(days) => Some(
            Duration::try_days(days)
                .and_then(|d| Utc::now().checked_add_signed(d))
                .ok_or_else(|| AppError::InvalidInput("expires_in_days is too large".to_string()))?,
        ),
        None => None,
    };

    let share_token = generate_share_token();
    let share = state
        .turso
        .upsert_share(&document.id, &share_token, expires_at)
        .await?;

    let frontend_url = state.config_manager.config().public.frontend_url.clone();
    tracing::info!(document_id = %document.id, expires_at = ?share.expires_at, "Public share created");

    Ok(Json(ShareResponse {
        public_url: format!(
            "{}/public/{}",
            frontend_url.trim_end_matches('/'),
            share.share_token
        ),
        share_token: share.share_token,
        expires_at: share.expires_at,
        document_name: document.filename,
    }))
}

/// Read a shared document
#[utoipa::path(
    get,
    path = "/api/public/document/{share_token}",
    params(("share_token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "Shared document", body = PublicDocumentResponse),
        (status = 404, description = "Unknown share"),
        (status = 410, description = "Share expired")
    ),
    tag = "public"
)]
pub async fn get_public_document(
    State(state): State<AppState>,
    Path(share_token): Path<String>,
) -> Result<Json<PublicDocumentResponse>> {
    let share = active_share(&state, &share_token).await?;
    let document = state
        .turso
        .get_document(&share.document_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    Ok(Json(PublicDocumentResponse {
        id: document.id,
        filename: document.filename,
        file_type: document.file_type,
        content: document.content,
        file_size: document.file_size,
        metadata: document.metadata,
        created_at: document.created_at,
        share_info: ShareInfo {
            share_token: share.share_token,
            expires_at: share.expires_at,
        },
    }))
}

/// Download the original file of a shared document
#[utoipa::path(
    get,
    path = "/api/public/download/{share_token}",
    params(("share_token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "Original file", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown share or file missing"),
        (status = 410, description = "Share expired")
    ),
    tag = "public"
)]
pub async fn download_public_document(
    State(state): State<AppState>,
    Path(share_token): Path<String>,
) -> Result<impl IntoResponse> {
    let share = active_share(&state, &share_token).await?;
    let document = state
        .turso
        .get_document(&share.document_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    let not_on_disk = || AppError::NotFound("File not found on server".to_string());
    let path = document.metadata.file_path.clone().ok_or_else(not_on_disk)?;
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_on_disk()),
        Err(e) => return Err(AppError::Internal(format!("Failed to read stored file: {}", e))),
    };

    let disposition = format!(
        "attachment; filename=\"{}\"",
        document.filename.replace(['"', '\\'], "_")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// List public documents with their share tokens
#[utoipa::path(
    get,
    path = "/api/public/list",
    params(Pagination),
    responses((status = 200, description = "Public documents", body = PublicListResponse)),
    tag = "public"
)]
pub async fn list_public(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PublicListResponse>> {
    check_page_limit(&pagination)?;

    let summaries = state
        .turso
        .list_documents(pagination.skip, pagination.limit, true)
        .await?;
    let total = state.turso.count_documents(true).await?;

    let mut documents = Vec::with_capacity(summaries.len());
    for doc in summaries {
        let share_token = state
            .turso
            .get_share_for_document(&doc.id)
            .await?
            .map(|share| share.share_token);

        documents.push(PublicListEntry {
            id: doc.id,
            filename: doc.filename,
            file_type: doc.file_type,
            file_size: doc.file_size,
            created_at: doc.created_at,
            metadata: PublicListMetadata {
                total_pages: doc.metadata.total_pages,
                extraction_method: doc.metadata.extraction_method,
            },
            share_token,
        });
    }

    Ok(Json(PublicListResponse {
        documents,
        total,
        skip: pagination.skip,
        limit: pagination.limit,
    }))
}

/// Revoke a share link
#[utoipa::path(
    delete,
    path = "/api/public/share/{share_token}",
    params(("share_token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "Share revoked", body = RevokeShareResponse),
        (status = 404, description = "Unknown share")
    ),
    tag = "public"
)]
pub async fn revoke_share(
    State(state): State<AppState>,
    Path(share_token): Path<String>,
) -> Result<Json<RevokeShareResponse>> {
    let document_id = state
        .turso
        .delete_share(&share_token)
        .await?
        .ok_or_else(|| AppError::NotFound("Public share not found".to_string()))?;

    tracing::info!(document_id = %document_id, "Public share revoked");

    Ok(Json(RevokeShareResponse {
        message: "Public share revoked successfully".to_string(),
        share_token,
    }))
}

/// Public sharing statistics
#[utoipa::path(
    get,
    path = "/api/public/stats",
    responses((status = 200, description = "Statistics", body = PublicStats)),
    tag = "public"
)]
pub async fn public_stats(State(state): State<AppState>) -> Result<Json<PublicStats>> {
    Ok(Json(PublicStats {
        total_public_documents: state.turso.count_documents(true).await?,
        total_shares: state.turso.count_shares().await?,
        file_type_distribution: state.turso.file_type_distribution(true).await?,
        last_updated: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_share_token_shape() {
        let token = generate_share_token();
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_share_tokens_are_unique() {
        let tokens: HashSet<String> = (0..100).map(|_| generate_share_token()).collect();
        assert_eq!(tokens.len(), 100);
    }
}
