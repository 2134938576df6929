//! PDF text reader.
//!
//! Yields one [`Page`] per PDF page. pdf-extract is tried first for the whole
//! document; if it fails (or panics, which it does on some malformed files)
//! lopdf extracts page by page and any page that cannot be read becomes an
//! empty page instead of failing the document.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tracing::{debug, warn};

use crate::core::errors::{AppError, AppResult};
use crate::core::types::Page;

const READ_FAILED: &str = "Failed to read the PDF.";

pub fn read_pages(file_path: &Path, max_pages: usize) -> AppResult<Vec<Page>> {
    let bytes = std::fs::read(file_path)
        .map_err(|e| AppError::Io(format!("cannot read PDF: {e}")))?;
    read_pages_from_mem(&bytes, max_pages)
}

pub fn read_pages_from_mem(bytes: &[u8], max_pages: usize) -> AppResult<Vec<Page>> {
    let document = lopdf::Document::load_mem(bytes).map_err(|e| {
        debug!(error = %e, "lopdf could not load document");
        AppError::DocumentRead(READ_FAILED.to_string())
    })?;
    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    if page_numbers.len() > max_pages {
        return Err(AppError::TooManyPages {
            pages: page_numbers.len(),
            max: max_pages,
        });
    }

    match extract_with_pdf_extract(bytes) {
        Ok(texts) if texts.len() == page_numbers.len() => Ok(texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Page::new(index, text))
            .collect()),
        Ok(texts) => {
            warn!(
                extracted = texts.len(),
                expected = page_numbers.len(),
                "pdf-extract page count mismatch; falling back to lopdf"
            );
            Ok(extract_with_lopdf(&document, &page_numbers))
        }
        Err(reason) => {
            warn!(%reason, "pdf-extract failed; falling back to lopdf");
            Ok(extract_with_lopdf(&document, &page_numbers))
        }
    }
}

fn extract_with_pdf_extract(bytes: &[u8]) -> Result<Vec<String>, String> {
    match panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    })) {
        Ok(Ok(texts)) => Ok(texts),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("pdf-extract panicked".to_string()),
    }
}

fn extract_with_lopdf(document: &lopdf::Document, page_numbers: &[u32]) -> Vec<Page> {
    page_numbers
        .iter()
        .enumerate()
        .map(|(index, number)| {
            let text = document.extract_text(&[*number]).unwrap_or_else(|e| {
                debug!(page = index, error = %e, "page text extraction failed");
                String::new()
            });
            Page::new(index, text)
        })
        .collect()
}
