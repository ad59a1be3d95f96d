use super::{Extraction, METHOD_PDF};
use crate::types::{AppError, Result};

/// Extract every page and join them behind `--- Page N ---` markers.
pub fn extract(data: &[u8]) -> Result<Extraction> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(data)
        .map_err(|e| AppError::Extraction(format!("PDF parse error: {}", e)))?;

    let (text, page_starts) = join_pages(&pages);

    Ok(Extraction {
        text,
        method: METHOD_PDF,
        confidence: 95.0,
        total_pages: pages.len() as u32,
        page_starts,
        ocr_details: None,
    })
}

/// Concatenate pages with markers, returning the trimmed text and the
/// character offset at which each page's marker starts.
fn join_pages(pages: &[String]) -> (String, Vec<usize>) {
    let mut joined = String::new();
    let mut starts = Vec::with_capacity(pages.len());
    let mut chars = 0usize;

    for (i, page) in pages.iter().enumerate() {
        joined.push('\n');
        chars += 1;
        starts.push(chars);

        let marker = format!("--- Page {} ---\n", i + 1);
        chars += marker.chars().count() + page.chars().count();
        joined.push_str(&marker);
        joined.push_str(page);
    }

    let trimmed_start = joined.trim_start();
    let leading = chars - trimmed_start.chars().count();
    let text = trimmed_start.trim_end().to_string();
    let starts = starts
        .into_iter()
        .map(|s| s.saturating_sub(leading))
        .collect();

    (text, starts)
}
