use std::path::Path;
use std::time::Instant;

use lopdf::Document;

use crate::error::{AppError, AppResult};
use crate::models::{FileKind, UploadedDocument};

/// Turns an uploaded file into plain text.
///
/// Plain text is decoded as UTF-8 (invalid sequences replaced), PDFs are read
/// page by page, and every other kind yields a placeholder sentence rather
/// than an error so the upload flow can continue.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    pub async fn extract(&self, file: &UploadedDocument) -> AppResult<String> {
        let start = Instant::now();

        tracing::info!(
            "Starting text extraction for file: {} ({} bytes)",
            file.name,
            file.size
        );

        let text = match &file.kind {
            FileKind::Txt => String::from_utf8_lossy(&file.content).into_owned(),
            FileKind::Pdf => {
                let content = file.content.clone();
                tokio::task::spawn_blocking(move || extract_pdf_text(&content))
                    .await
                    .map_err(|e| AppError::internal(format!("PDF extraction task failed: {}", e)))??
            }
            other => unsupported_placeholder(other),
        };

        tracing::info!(
            "Extraction completed in {}ms, {} characters",
            start.elapsed().as_millis(),
            text.len()
        );
        Ok(text)
    }
}

/// Reads a file from disk to completion.
pub async fn read_file(path: impl AsRef<Path>) -> AppResult<UploadedDocument> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or(AppError::MissingFile)?;
    let content = tokio::fs::read(path).await.map_err(|e| {
        AppError::extraction(format!("Failed to read {}: {}", path.display(), e))
    })?;
    Ok(UploadedDocument::new(name, content))
}

pub fn unsupported_placeholder(kind: &FileKind) -> String {
    format!(
        "Uploaded file ({}) not supported for text extraction.",
        kind.extension()
    )
}

/// Page text in ascending page order: tokens joined by one space, one line per page.
pub fn extract_pdf_text(content: &[u8]) -> AppResult<String> {
    let doc = load_pdf(content)?;

    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        let page_text = doc.extract_text(&[*page_number]).map_err(|e| {
            AppError::extraction(format!("Failed to read page {}: {}", page_number, e))
        })?;
        let tokens: Vec<&str> = page_text.split_whitespace().collect();
        text.push_str(&tokens.join(" "));
        text.push('\n');
    }

    tracing::debug!("PDF text extraction successful, {} characters", text.len());
    Ok(text)
}

pub fn page_count(content: &[u8]) -> AppResult<usize> {
    Ok(load_pdf(content)?.get_pages().len())
}

pub(crate) fn load_pdf(content: &[u8]) -> AppResult<Document> {
    Document::load_mem(content).map_err(|e| {
        tracing::warn!("PDF structure validation failed: {}", e);
        AppError::extraction(format!("Malformed PDF: {}", e))
    })
}
