//! Relational storage.
//!
//! A single libsql-backed client ([`TursoClient`]) holds documents, their
//! chunks and embeddings, chat history and public share links. It runs
//! against a local SQLite file, an in-memory database (tests), or a remote
//! Turso database.

#![allow(missing_docs)]

pub mod turso;

pub use turso::TursoClient;
