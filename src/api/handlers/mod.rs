//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Chat, history and mode catalogue handlers.
pub mod chat;
/// Document upload, search and management handlers.
pub mod documents;
/// Service banner and health check.
pub mod health;
/// Public share link handlers.
pub mod public;
