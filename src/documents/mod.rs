//! Document ingestion and semantic search.
//!
//! Upload pipeline: extract text, store the original file, insert the
//! document row, then chunk, embed and insert the chunks. Search embeds the
//! query and linearly scans every stored chunk embedding.

use crate::db::TursoClient;
use crate::extract::{self, OcrEngine, SUPPORTED_EXTENSIONS};
use crate::rag::embeddings::{embed_all, Embedder};
use crate::types::{
    AppError, Document, DocumentMetadata, NewChunk, Result, SearchHit, UploadResponse,
};
use crate::utils::toml_config::KassistConfigManager;
use chrono::Utc;
use kassist_retrieval::{rank, TextChunker};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Characters of extracted text echoed back after an upload.
pub const PREVIEW_CHARS: usize = 500;

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub document_id: String,
    pub filename: String,
    pub chunks_created: usize,
    pub text_preview: String,
    pub metadata: DocumentMetadata,
}

impl From<UploadOutcome> for UploadResponse {
    fn from(outcome: UploadOutcome) -> Self {
        Self {
            success: true,
            document_id: outcome.document_id,
            filename: outcome.filename,
            chunks_created: outcome.chunks_created,
            text_preview: outcome.text_preview,
            metadata: outcome.metadata,
        }
    }
}

pub struct DocumentService {
    db: Arc<TursoClient>,
    embedder: Arc<dyn Embedder>,
    ocr: Arc<dyn OcrEngine>,
    config: Arc<KassistConfigManager>,
}

impl DocumentService {
    pub fn new(
        db: Arc<TursoClient>,
        embedder: Arc<dyn Embedder>,
        ocr: Arc<dyn OcrEngine>,
        config: Arc<KassistConfigManager>,
    ) -> Self {
        Self {
            db,
            embedder,
            ocr,
            config,
        }
    }

    /// Ingest an uploaded file.
    pub async fn upload(
        &self,
        data: Vec<u8>,
        filename: &str,
        is_public: bool,
    ) -> Result<UploadOutcome> {
        let config = self.config.config();
        let filename = base_name(filename);

        if data.len() > config.storage.max_file_size {
            return Err(too_large(config.storage.max_file_size));
        }
        if filename.is_empty() {
            return Err(AppError::InvalidInput("Filename is required".to_string()));
        }
        let extension = extract::file_extension(&filename)
            .unwrap_or_else(|| filename.to_lowercase());
        if !extract::is_supported(&extension) {
            return Err(unsupported_type(&extension));
        }
        if data.is_empty() {
            return Err(AppError::InvalidInput("Empty file".to_string()));
        }

        let data = Arc::new(data);
        let extraction = {
            let data = Arc::clone(&data);
            let ocr = Arc::clone(&self.ocr);
            let extension = extension.clone();
            tokio::task::spawn_blocking(move || extract::extract(&data, &extension, ocr.as_ref()))
                .await
                .map_err(|e| AppError::Extraction(format!("Extraction task failed: {}", e)))??
        };

        let document_id = uuid::Uuid::new_v4().to_string();
        let file_path = stored_path(&config.storage.upload_dir, &document_id, &filename);

        tokio::fs::create_dir_all(&config.storage.upload_dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload dir: {}", e)))?;
        tokio::fs::write(&file_path, data.as_slice())
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

        let metadata = DocumentMetadata {
            file_path: Some(file_path.to_string_lossy().into_owned()),
            extraction_method: extraction.method.to_string(),
            extraction_confidence: extraction.confidence,
            ocr_details: extraction.ocr_details.clone(),
            total_pages: extraction.total_pages,
        };
        let now = Utc::now();
        let document = Document {
            id: document_id.clone(),
            filename: filename.clone(),
            file_type: extension,
            content: extraction.text.clone(),
            file_size: data.len() as i64,
            is_public,
            metadata: metadata.clone(),
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.db.create_document(&document).await {
            remove_file(&file_path).await;
            return Err(e);
        }

        let chunks_created = match self.index_chunks(&document_id, &extraction).await {
            Ok(count) => count,
            Err(e) => {
                if let Err(cleanup) = self.db.delete_document(&document_id).await {
                    tracing::warn!(document_id = %document_id, error = %cleanup, "Rollback of document failed");
                }
                remove_file(&file_path).await;
                return Err(e);
            }
        };

        tracing::info!(
            document_id = %document_id,
            filename = %filename,
            method = extraction.method,
            chunks = chunks_created,
            bytes = data.len(),
            "Document uploaded"
        );

        Ok(UploadOutcome {
            document_id,
            filename,
            chunks_created,
            text_preview: preview(&extraction.text, PREVIEW_CHARS),
            metadata,
        })
    }

    async fn index_chunks(
        &self,
        document_id: &str,
        extraction: &extract::Extraction,
    ) -> Result<usize> {
        let config = self.config.config();
        let chunker = TextChunker::new(config.rag.chunk_size, config.rag.chunk_overlap)?;
        let chunks = chunker.chunk(&extraction.text);
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = embed_all(&self.embedder, &texts, config.embedding.concurrency).await;
        let embedded = vectors.iter().filter(|v| v.is_some()).count();
        if embedded < chunks.len() {
            tracing::warn!(
                document_id = %document_id,
                failed = chunks.len() - embedded,
                "Some chunks were stored without embeddings"
            );
        }

        let new_chunks: Vec<NewChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, embedding)| NewChunk {
                page_number: extraction.page_at(chunk.start_char),
                content: chunk.content,
                chunk_index: chunk.index,
                start_char: chunk.start_char,
                end_char: chunk.end_char,
                embedding,
            })
            .collect();

        self.db.insert_chunks(document_id, &new_chunks).await?;
        Ok(new_chunks.len())
    }

    /// Top `k` chunks by cosine similarity to `query`.
    ///
    /// When `include_private` is false, private hits are dropped from the
    /// top `k` after ranking, so fewer than `k` results may come back. A
    /// query that cannot be embedded yields no results.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        include_private: bool,
    ) -> Result<Vec<SearchHit>> {
        let query_vector = match self.embedder.embed(query).await {
            Ok(vector) => vector,
            Err(e) => {
                tracing::warn!(error = %e, "Query embedding failed, returning no results");
                return Ok(Vec::new());
            }
        };

        let stored = self.db.chunks_with_embeddings().await?;
        let scanned = stored.len();
        let candidates = stored.into_iter().map(|mut chunk| {
            let embedding = std::mem::take(&mut chunk.embedding);
            (chunk, embedding)
        });

        let hits: Vec<SearchHit> = rank(&query_vector, candidates, k)
            .into_iter()
            .filter(|scored| include_private || scored.item.is_public)
            .map(|scored| SearchHit {
                document_id: scored.item.document_id,
                document_name: scored.item.document_name,
                chunk_content: scored.item.content,
                similarity_score: scored.score,
                chunk_index: scored.item.chunk_index,
                start_char: scored.item.start_char,
                end_char: scored.item.end_char,
                page_number: scored.item.page_number,
                is_public: scored.item.is_public,
            })
            .collect();

        tracing::debug!(scanned, returned = hits.len(), k, "Search completed");
        Ok(hits)
    }

    /// Delete a document with its chunks, shares and stored file.
    pub async fn delete(&self, document_id: &str) -> Result<()> {
        let document = self
            .db
            .get_document(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

        if !self.db.delete_document(document_id).await? {
            return Err(AppError::NotFound("Document not found".to_string()));
        }

        if let Some(path) = document.metadata.file_path.as_deref() {
            remove_file(Path::new(path)).await;
        }

        tracing::info!(document_id = %document_id, filename = %document.filename, "Document deleted");
        Ok(())
    }
}

fn unsupported_type(extension: &str) -> AppError {
    AppError::InvalidInput(format!(
        "Unsupported file type: {}. Supported: {}",
        extension,
        SUPPORTED_EXTENSIONS.join(", ")
    ))
}

pub(crate) fn too_large(max_bytes: usize) -> AppError {
    AppError::PayloadTooLarge(format!(
        "File too large. Maximum size: {:.1}MB",
        max_bytes as f64 / (1024.0 * 1024.0)
    ))
}

async fn remove_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove stored file"),
    }
}

/// Final path component of a client-supplied name.
fn base_name(filename: &str) -> String {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Filename safe to use on disk.
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// First `max_chars` characters, with `...` appended when truncated.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Where an upload for `document_id` named `filename` is stored.
pub fn stored_path(upload_dir: &Path, document_id: &str, filename: &str) -> PathBuf {
    upload_dir.join(format!("{}_{}", document_id, sanitize_filename(filename)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("report.pdf", "report.pdf")]
    #[case("../../etc/passwd", "passwd")]
    #[case("C:\\Users\\me\\notes.txt", "notes.txt")]
    #[case("  spaced.txt ", "spaced.txt")]
    fn test_base_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(base_name(input), expected);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my report (v2).pdf"), "my_report__v2_.pdf");
        assert_eq!(sanitize_filename("résumé.txt"), "r_sum_.txt");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("ééééé", 3), "ééé...");
        assert_eq!(preview(&"a".repeat(500), 500), "a".repeat(500));
    }

    #[test]
    fn test_unsupported_type_message() {
        assert_eq!(
            unsupported_type("exe").to_string(),
            "Invalid input: Unsupported file type: exe. Supported: pdf, docx, doc, txt, jpg, jpeg, png, tiff, bmp"
        );
    }

    #[test]
    fn test_too_large_message() {
        assert_eq!(
            too_large(10 * 1024 * 1024).to_string(),
            "Payload too large: File too large. Maximum size: 10.0MB"
        );
    }
}
