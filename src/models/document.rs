use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::Mode;

/// File kinds the upload flow recognises, derived from the name's extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    Txt,
    Pdf,
    Doc,
    Docx,
    Other(String),
}

impl FileKind {
    pub fn from_name(name: &str) -> Self {
        let extension = name.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
        match extension.as_str() {
            "txt" => FileKind::Txt,
            "pdf" => FileKind::Pdf,
            "doc" => FileKind::Doc,
            "docx" => FileKind::Docx,
            _ => FileKind::Other(extension),
        }
    }

    pub fn extension(&self) -> &str {
        match self {
            FileKind::Txt => "txt",
            FileKind::Pdf => "pdf",
            FileKind::Doc => "doc",
            FileKind::Docx => "docx",
            FileKind::Other(ext) => ext,
        }
    }

    /// Whether the upload flow accepts this kind at all.
    pub fn is_supported(&self) -> bool {
        !matches!(self, FileKind::Other(_))
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            FileKind::Txt => "text/plain",
            FileKind::Pdf => "application/pdf",
            FileKind::Doc => "application/msword",
            FileKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FileKind::Other(_) => "application/octet-stream",
        }
    }
}

/// A file picked by the user. Immutable once selected.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    pub size: usize,
    pub kind: FileKind,
    pub content: Bytes,
}

impl UploadedDocument {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let name = name.into();
        let content = content.into();
        Self {
            kind: FileKind::from_name(&name),
            size: content.len(),
            name,
            content,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.kind == FileKind::Pdf
    }

    /// Size rendered as megabytes with two decimals, e.g. `1.50 MB`.
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size as f64 / 1024.0 / 1024.0)
    }
}

/// Summary produced by the relay for one submitted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary_text: String,
    pub mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub sender: Sender,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
        }
    }
}
