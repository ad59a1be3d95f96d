//! Word documents: paragraphs from `word/document.xml` inside the zip container.

use crate::types::{AppError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract the document body, one line per paragraph.
pub fn extract(data: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| AppError::Extraction(format!("Not a DOCX archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| AppError::Extraction(format!("Missing {}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| AppError::Extraction(format!("Failed to read {}: {}", DOCUMENT_PART, e)))?;

    paragraphs_from_xml(&xml)
}

fn paragraphs_from_xml(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                let text = t
                    .unescape()
                    .map_err(|e| AppError::Extraction(format!("Malformed DOCX text: {}", e)))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(AppError::Extraction(format!(
                    "Malformed DOCX XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    Ok(out.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Quarterly</w:t></w:r><w:r><w:t xml:space="preserve"> report</w:t></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t>Revenue &amp; costs</w:t><w:tab/><w:t>up</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            zip.start_file(DOCUMENT_PART, SimpleFileOptions::default())
                .unwrap();
            zip.write_all(document_xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_paragraphs_become_lines() {
        let text = extract(&docx_bytes(BODY)).unwrap();
        assert_eq!(text, "Quarterly report\n\nRevenue & costs\tup");
    }

    #[test]
    fn test_not_a_zip() {
        let err = extract(b"plain bytes").unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[test]
    fn test_zip_without_document_part() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            zip.start_file("other.txt", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"hi").unwrap();
            zip.finish().unwrap();
        }

        let err = extract(&buf.into_inner()).unwrap_err();
        assert!(err.to_string().contains(DOCUMENT_PART));
    }
}
