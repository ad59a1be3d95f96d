//! Optical character recognition for image uploads.
//!
//! [`TesseractOcr`] shells out to the `tesseract` CLI, feeding the image on
//! stdin and reading TSV from stdout, so no native bindings are linked.

use crate::types::{AppError, Result};
use crate::utils::toml_config::OcrConfig;
use std::io::Write;
use std::process::{Command, Stdio};

/// Words at or below this confidence are dropped from the statistics.
pub const MIN_WORD_CONFIDENCE: f32 = 30.0;

/// Recognized text and the confidences of the words that were kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrOutput {
    pub text: String,
    pub word_confidences: Vec<f32>,
}

impl OcrOutput {
    /// Mean of the kept word confidences, `0` when none were kept.
    pub fn average_confidence(&self) -> f64 {
        if self.word_confidences.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.word_confidences.iter().map(|&c| f64::from(c)).sum();
        sum / self.word_confidences.len() as f64
    }
}

/// Image to text.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &[u8]) -> Result<OcrOutput>;
}

#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
    language: String,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(config.binary.clone(), config.language.clone())
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &[u8]) -> Result<OcrOutput> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", &self.language, "tsv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AppError::Extraction(format!("Failed to run {}: {}", self.binary, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Extraction("tesseract stdin unavailable".to_string()))?;
        let image = image.to_vec();
        // Written from another thread so a full stdout pipe cannot deadlock us.
        let writer = std::thread::spawn(move || stdin.write_all(&image));

        let output = child
            .wait_with_output()
            .map_err(|e| AppError::Extraction(format!("tesseract failed: {}", e)))?;
        let _ = writer.join();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Extraction(format!(
                "OCR failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        tracing::debug!(bytes = output.stdout.len(), "tesseract finished");
        Ok(parse_tsv(&tsv))
    }
}

/// Parse tesseract TSV output.
///
/// Columns: `level page_num block_num par_num line_num word_num left top
/// width height conf text`. Level 5 rows are words; words are rejoined into
/// lines by their `(block, par, line)` key.
pub fn parse_tsv(tsv: &str) -> OcrOutput {
    let mut lines: Vec<String> = Vec::new();
    let mut current_line: Option<(&str, &str, &str)> = None;
    let mut word_confidences = Vec::new();

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }

        let word = cols[11].trim();
        if word.is_empty() {
            continue;
        }

        let key = (cols[2], cols[3], cols[4]);
        if current_line == Some(key) {
            if let Some(line) = lines.last_mut() {
                line.push(' ');
                line.push_str(word);
            }
        } else {
            lines.push(word.to_string());
            current_line = Some(key);
        }

        let confidence: f32 = cols[10].trim().parse().unwrap_or(-1.0);
        if confidence > MIN_WORD_CONFIDENCE {
            word_confidences.push(confidence);
        }
    }

    OcrOutput {
        text: lines.join("\n"),
        word_confidences,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn word(block: u32, line: u32, n: u32, conf: &str, text: &str) -> String {
        format!("5\t1\t{block}\t1\t{line}\t{n}\t0\t0\t10\t10\t{conf}\t{text}")
    }

    #[test]
    fn test_parse_tsv_groups_lines_and_filters_confidence() {
        let tsv = [
            HEADER.to_string(),
            "1\t1\t0\t0\t0\t0\t0\t0\t100\t100\t-1\t".to_string(),
            word(1, 1, 1, "96.5", "Hello"),
            word(1, 1, 2, "91", "world"),
            word(1, 2, 1, "12", "smudge"),
            word(2, 1, 1, "-1", " "),
            word(2, 1, 2, "88.0", "Total"),
        ]
        .join("\n");

        let output = parse_tsv(&tsv);
        assert_eq!(output.text, "Hello world\nsmudge\nTotal");
        assert_eq!(output.word_confidences, vec![96.5, 91.0, 88.0]);
        assert!((output.average_confidence() - 91.833).abs() < 0.01);
    }

    #[test]
    fn test_parse_tsv_empty() {
        let output = parse_tsv(HEADER);
        assert!(output.text.is_empty());
        assert_eq!(output.average_confidence(), 0.0);
    }

    #[test]
    fn test_missing_binary_is_an_extraction_error() {
        let ocr = TesseractOcr::new("kassist-no-such-tesseract", "eng");
        let err = ocr.recognize(b"image").unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }
}
