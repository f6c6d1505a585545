use base64::{engine::general_purpose::STANDARD, Engine as _};
use lopdf::{Document, Object, ObjectId};
use tracing::warn;

use crate::client::chat::ChatSession;
use crate::client::store::{PersistedRecord, RecordStore};
use crate::error::{AppError, AppResult};
use crate::services::classifier::{word_count, DocumentClassifier, DocumentMetadata};
use crate::services::extractor::load_pdf;

pub const UNKNOWN_DOCUMENT: &str = "Unknown Document";
pub const UNKNOWN_SIZE: &str = "Unknown Size";
pub const NO_PAGE_COUNT: &str = "—";

const PDF_DATA_URL_PREFIX: &str = "data:application/pdf";

/// US Letter width in points, used when a page carries no MediaBox.
const DEFAULT_PAGE_WIDTH: f32 = 612.0;
const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// Guards against cyclic `Parent` chains in broken files.
const MAX_TREE_DEPTH: usize = 32;

/// One rendered page request.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRender {
    pub page_number: usize,
    pub total_pages: usize,
    pub scale: f32,
    pub width: f32,
    pub height: f32,
}

impl PageRender {
    pub fn label(&self) -> String {
        format!("Page {} of {}", self.page_number, self.total_pages)
    }
}

/// Paginated view over a decoded PDF.
pub struct PdfPreview {
    document: Document,
    page_ids: Vec<ObjectId>,
    current: usize,
}

impl PdfPreview {
    pub fn from_bytes(bytes: &[u8]) -> AppResult<Self> {
        let document = load_pdf(bytes)?;
        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(AppError::extraction("PDF has no pages"));
        }
        Ok(Self {
            document,
            page_ids,
            current: 1,
        })
    }

    /// Decodes a `data:application/pdf;base64,...` URL.
    pub fn from_data_url(data_url: &str) -> AppResult<Self> {
        if !data_url.starts_with(PDF_DATA_URL_PREFIX) {
            return Err(AppError::validation("Not a PDF data URL"));
        }
        let payload = data_url
            .split_once(',')
            .map(|(_, payload)| payload)
            .ok_or_else(|| AppError::validation("Data URL has no payload"))?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| AppError::extraction(format!("Invalid base64 payload: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn total_pages(&self) -> usize {
        self.page_ids.len()
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    /// Returns false when already on the last page.
    pub fn next(&mut self) -> bool {
        if self.current < self.total_pages() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.current > 1 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Sizes the current page to fill `container_width`. Call on every render
    /// so layout changes are picked up.
    pub fn render_current(&self, container_width: f32) -> PageRender {
        let (page_width, page_height) = self.page_size(self.page_ids[self.current - 1]);
        let scale = container_width / page_width;
        PageRender {
            page_number: self.current,
            total_pages: self.total_pages(),
            scale,
            width: page_width * scale,
            height: page_height * scale,
        }
    }

    /// MediaBox of the page, following `Parent` links for inherited boxes.
    fn page_size(&self, page_id: ObjectId) -> (f32, f32) {
        let mut node = self.document.get_dictionary(page_id).ok();
        let mut depth = 0;
        while let Some(dict) = node {
            depth += 1;
            if depth > MAX_TREE_DEPTH {
                break;
            }
            if let Ok(media_box) = dict.get(b"MediaBox").and_then(Object::as_array) {
                let values: Vec<f32> = media_box.iter().filter_map(number).collect();
                if values.len() == 4 {
                    let width = (values[2] - values[0]).abs();
                    let height = (values[3] - values[1]).abs();
                    if width > 0.0 && height > 0.0 {
                        return (width, height);
                    }
                }
            }
            node = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|parent| self.document.get_dictionary(parent))
                .ok();
        }
        (DEFAULT_PAGE_WIDTH, DEFAULT_PAGE_HEIGHT)
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

pub enum Preview {
    Pdf(PdfPreview),
    /// Static panel for non-PDF files or undecodable data.
    Fallback,
}

impl Preview {
    pub fn page_count_label(&self) -> String {
        match self {
            Preview::Pdf(pdf) => pdf.total_pages().to_string(),
            Preview::Fallback => NO_PAGE_COUNT.to_string(),
        }
    }
}

/// Everything the results page shows, rebuilt from the persisted record.
pub struct ResultsView {
    pub title: String,
    pub size_label: String,
    pub summary: String,
    pub text: String,
    pub word_count: usize,
    pub metadata: DocumentMetadata,
    pub preview: Preview,
}

impl ResultsView {
    /// Never fails: missing fields and unreadable storage fall back to placeholders.
    pub async fn load(store: &dyn RecordStore, classifier: &dyn DocumentClassifier) -> Self {
        let record = match store.load().await {
            Ok(record) => record.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Could not read persisted record, rendering placeholders");
                PersistedRecord::default()
            }
        };
        Self::from_record(record, classifier)
    }

    /// Metadata and word count are derived from the stored text; the summary
    /// stands in only when no text was stored. Every field is classified from
    /// the same input, unlike a doc-type-from-summary split.
    pub fn from_record(record: PersistedRecord, classifier: &dyn DocumentClassifier) -> Self {
        let summary = record.doc_summary.unwrap_or_default();
        let text = record.doc_text.unwrap_or_default();

        let analyzed = if text.is_empty() { &summary } else { &text };
        let word_count = word_count(analyzed);
        let metadata = classifier.classify(analyzed);

        let preview = match record.doc_file.as_deref() {
            Some(url) if url.starts_with(PDF_DATA_URL_PREFIX) => match PdfPreview::from_data_url(url) {
                Ok(pdf) => Preview::Pdf(pdf),
                Err(e) => {
                    warn!(error = %e, "PDF preview failed");
                    Preview::Fallback
                }
            },
            _ => Preview::Fallback,
        };

        Self {
            title: record.doc_name.unwrap_or_else(|| UNKNOWN_DOCUMENT.to_string()),
            size_label: record.doc_size.unwrap_or_else(|| UNKNOWN_SIZE.to_string()),
            summary,
            text,
            word_count,
            metadata,
            preview,
        }
    }

    /// Chat seeded with the document text, or the summary if there is none.
    pub fn chat(&self) -> ChatSession {
        let context = if self.text.is_empty() {
            &self.summary
        } else {
            &self.text
        };
        ChatSession::new(context.clone())
    }
}
