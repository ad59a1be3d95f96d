//! Text extraction from uploaded files.
//!
//! Dispatches on the lower-cased file extension:
//!
//! | Extension | Method | Confidence |
//! |-----------|--------|------------|
//! | `pdf` | [`pdf`] (`pdf-extract`) | 95 |
//! | `docx`, `doc` | [`docx`] (`word/document.xml`) | 98 |
//! | `jpg jpeg png tiff bmp` | [`ocr`] (tesseract) | average word confidence |
//! | `txt` | UTF-8 decode | 100 |
//!
//! Everything here is synchronous and CPU or process bound; callers run it
//! inside `tokio::task::spawn_blocking`.

pub mod docx;
pub mod ocr;
pub mod pdf;

pub use ocr::{OcrEngine, OcrOutput, TesseractOcr};

use crate::types::{AppError, OcrDetails, Result};

/// Extensions accepted for upload, in the order they are reported to clients.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "pdf", "docx", "doc", "txt", "jpg", "jpeg", "png", "tiff", "bmp",
];

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "bmp"];

pub const METHOD_PDF: &str = "pdf_extraction";
pub const METHOD_DOCX: &str = "docx_extraction";
pub const METHOD_OCR: &str = "ocr_extraction";
pub const METHOD_TEXT: &str = "text_file";

/// Text pulled out of a file plus how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub text: String,
    pub method: &'static str,
    pub confidence: f64,
    pub total_pages: u32,
    /// Character offset in `text` where each page begins. Empty when the
    /// format has no page structure.
    pub page_starts: Vec<usize>,
    pub ocr_details: Option<OcrDetails>,
}

impl Extraction {
    fn single_page(text: String, method: &'static str, confidence: f64) -> Self {
        Self {
            text,
            method,
            confidence,
            total_pages: 1,
            page_starts: Vec::new(),
            ocr_details: None,
        }
    }

    /// 1-based page containing the character at `offset`, if paginated.
    pub fn page_at(&self, offset: usize) -> Option<u32> {
        if self.page_starts.is_empty() {
            return None;
        }
        let page = self.page_starts.partition_point(|&start| start <= offset);
        Some(page.max(1) as u32)
    }
}

/// Lower-cased extension of `filename` (text after the last dot).
pub fn file_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

pub fn is_supported(extension: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension)
}

/// Extract text from `data` according to `extension`.
pub fn extract(data: &[u8], extension: &str, ocr: &dyn OcrEngine) -> Result<Extraction> {
    match extension {
        "pdf" => pdf::extract(data),
        "docx" | "doc" => {
            let text = docx::extract(data)?;
            Ok(Extraction::single_page(text, METHOD_DOCX, 98.0))
        }
        ext if IMAGE_EXTENSIONS.contains(&ext) => {
            let output = ocr.recognize(data)?;
            let confidence = output.average_confidence();
            let mut extraction = Extraction::single_page(output.text, METHOD_OCR, confidence);
            extraction.ocr_details = Some(OcrDetails {
                words_detected: output.word_confidences.len(),
                word_confidences: output.word_confidences,
            });
            Ok(extraction)
        }
        "txt" => {
            let text = String::from_utf8(data.to_vec()).map_err(|e| {
                AppError::Extraction(format!("Text file is not valid UTF-8: {}", e))
            })?;
            Ok(Extraction::single_page(text, METHOD_TEXT, 100.0))
        }
        other => Err(AppError::InvalidInput(format!(
            "Unsupported file type: {}",
            other
        ))),
    }
}
