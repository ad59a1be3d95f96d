//! HTTP API handlers and routes
//!
//! This module provides the REST API layer for the Knowledge Assistant, built
//! on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route table, middleware and OpenAPI document
//!
//! # API Endpoints
//!
//! ## Documents (`/api/documents`)
//! - `POST /api/documents/upload` - Upload a file (multipart `file`, `is_public`)
//! - `GET /api/documents/search` - Semantic search over chunks
//! - `GET /api/documents` / `GET /api/documents/public` - Paginated listings
//! - `GET /api/documents/stats/summary` - Totals and file type distribution
//! - `GET /api/documents/{id}` / `DELETE /api/documents/{id}`
//!
//! ## Chat (`/api/chat`)
//! - `POST /api/chat` - Ask a question against the uploaded documents
//! - `GET /api/chat/history/{session_id}` / `DELETE /api/chat/history/{session_id}`
//! - `GET /api/chat/modes` - Mode catalogue
//!
//! ## Public shares (`/api/public`)
//! - `POST /api/public/share` / `DELETE /api/public/share/{token}`
//! - `GET /api/public/document/{token}` / `GET /api/public/download/{token}`
//! - `GET /api/public/list` / `GET /api/public/stats`
//!
//! Errors are returned as `{"error": "..."}` with the status of the
//! underlying [`AppError`](crate::types::AppError).
//!
//! # OpenAPI Documentation
//!
//! The OpenAPI document is served at `/api/openapi.json`. With the
//! `swagger-ui` feature enabled, interactive documentation is at `/docs`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
