//! Upload flow: validate, extract, check legality, analyze, persist.
//!
//! Each attempt walks
//! `Idle → FileSelected → Validating → Extracting → Classifying → Analyzing → Persisted|Failed`.
//! Every network step issues exactly one relay call and nothing is retried;
//! a failed attempt can be started again from the same session.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, warn};

use crate::client::relay_client::AnalyzeClient;
use crate::client::store::{PersistedRecord, RecordStore};
use crate::error::{AppError, AppResult};
use crate::models::{AnalysisResult, Mode, UploadedDocument};
use crate::services::TextExtractor;

pub const MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Characters of extracted text sent with the legality check.
pub const CLASSIFICATION_CHAR_LIMIT: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    FileSelected,
    Validating,
    Extracting,
    Classifying,
    Analyzing,
    Persisted,
    Failed,
}

/// Which results view the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    /// Quick summary page.
    Summary,
    /// Detail page with the chat panel.
    Details,
}

impl UploadTarget {
    pub fn path(&self) -> &'static str {
        match self {
            UploadTarget::Summary => "/summary",
            UploadTarget::Details => "/details",
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            UploadTarget::Summary => Mode::Quick,
            UploadTarget::Details => Mode::Sectioned,
        }
    }
}

/// Emitted once the record is durably written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub target: UploadTarget,
    pub path: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// What a rendering layer needs to follow an upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    StateChanged(UploadState),
    Notification {
        level: NotificationLevel,
        message: String,
    },
}

/// Per-user upload state.
#[derive(Debug, Default)]
pub struct UploadSession {
    document: Option<UploadedDocument>,
    extracted_text: Option<String>,
    result: Option<AnalysisResult>,
    state: UploadState,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn document(&self) -> Option<&UploadedDocument> {
        self.document.as_ref()
    }

    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_text.as_deref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorOptions {
    /// Ask the relay whether the text is a legal document before analyzing it.
    pub legality_check: bool,
    pub max_file_size: usize,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            legality_check: true,
            max_file_size: MAX_FILE_SIZE_BYTES,
        }
    }
}

/// Rejects unsupported extensions and files over `max_size` bytes.
pub fn validate_document(document: &UploadedDocument, max_size: usize) -> AppResult<()> {
    if !document.kind.is_supported() {
        return Err(AppError::UnsupportedFileType {
            extension: document.kind.extension().to_string(),
        });
    }
    if document.size > max_size {
        return Err(AppError::FileTooLarge {
            size: document.size,
            limit: max_size,
        });
    }
    Ok(())
}

pub fn classification_prompt(text: &str) -> String {
    let excerpt: String = text.chars().take(CLASSIFICATION_CHAR_LIMIT).collect();
    format!(
        "Classify this document: Is it a legal document (contract, agreement, court filing, law text, etc.)? Answer strictly with YES or NO.\n\nDocument:\n{}",
        excerpt
    )
}

pub fn is_affirmative(reply: &str) -> bool {
    reply.trim().to_lowercase().starts_with("yes")
}

pub struct UploadOrchestrator {
    client: Arc<dyn AnalyzeClient>,
    store: Arc<dyn RecordStore>,
    extractor: TextExtractor,
    options: OrchestratorOptions,
    in_flight: Semaphore,
    events: Option<mpsc::UnboundedSender<UploadEvent>>,
}

impl UploadOrchestrator {
    pub fn new(client: Arc<dyn AnalyzeClient>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            client,
            store,
            extractor: TextExtractor::new(),
            options: OrchestratorOptions::default(),
            in_flight: Semaphore::new(1),
            events: None,
        }
    }

    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<UploadEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn options(&self) -> OrchestratorOptions {
        self.options
    }

    pub async fn wake(&self) {
        self.client.wake().await;
    }

    /// Accepts a newly picked file. A rejected file leaves the session idle.
    pub fn select_file(&self, session: &mut UploadSession, document: UploadedDocument) -> AppResult<()> {
        session.reset();
        if let Err(e) = validate_document(&document, self.options.max_file_size) {
            warn!(file_name = %document.name, file_size = document.size, error = %e, "File rejected");
            self.notify(NotificationLevel::Error, e.user_message());
            return Err(e);
        }

        info!(file_name = %document.name, file_size = document.size, "File selected");
        session.document = Some(document);
        self.transition(session, UploadState::FileSelected);
        Ok(())
    }

    pub fn reset(&self, session: &mut UploadSession) {
        session.reset();
        self.transition(session, UploadState::Idle);
    }

    /// Runs one full attempt for the session's selected file.
    ///
    /// Only one attempt may be in flight per orchestrator; a second caller
    /// gets [`AppError::AnalysisInProgress`] without touching its session.
    pub async fn analyze(
        &self,
        session: &mut UploadSession,
        target: UploadTarget,
    ) -> AppResult<Navigation> {
        let _permit = self.in_flight.try_acquire().map_err(|_| {
            let e = AppError::AnalysisInProgress;
            self.notify(NotificationLevel::Warning, e.user_message());
            e
        })?;

        let document = match session.document.clone() {
            Some(document) => document,
            None => {
                let e = AppError::MissingFile;
                self.notify(NotificationLevel::Warning, e.user_message());
                return Err(e);
            }
        };

        self.transition(session, UploadState::Validating);
        if let Err(e) = validate_document(&document, self.options.max_file_size) {
            session.reset();
            self.transition(session, UploadState::Idle);
            self.notify(NotificationLevel::Error, e.user_message());
            return Err(e);
        }

        self.transition(session, UploadState::Extracting);
        session.extracted_text = None;
        session.result = None;
        let text = match self.extractor.extract(&document).await {
            Ok(text) => text,
            Err(e) => return Err(self.fail(session, e)),
        };
        session.extracted_text = Some(text.clone());

        if self.options.legality_check {
            self.transition(session, UploadState::Classifying);
            let verdict = match self.client.analyze(&classification_prompt(&text), None).await {
                Ok(verdict) => verdict,
                Err(e) => return Err(self.fail(session, e)),
            };
            if !is_affirmative(&verdict) {
                info!(file_name = %document.name, "Document judged not legal");
                return Err(self.fail(session, AppError::NotLegalDocument));
            }
        }

        self.transition(session, UploadState::Analyzing);
        let mode = target.mode();
        let summary = match self.client.analyze(&text, Some(mode)).await {
            Ok(summary) => summary,
            Err(e) => return Err(self.fail(session, e)),
        };
        let result = AnalysisResult {
            summary_text: summary,
            mode,
        };

        let record = match build_record(&document, &text, &result).await {
            Ok(record) => record,
            Err(e) => return Err(self.fail(session, e)),
        };
        if let Err(e) = self.store.save(&record).await {
            return Err(self.fail(session, e));
        }

        session.result = Some(result);
        self.transition(session, UploadState::Persisted);
        info!(file_name = %document.name, path = target.path(), "Analysis persisted");

        Ok(Navigation {
            target,
            path: target.path(),
        })
    }

    fn transition(&self, session: &mut UploadSession, state: UploadState) {
        debug!(from = ?session.state, to = ?state, "Upload state change");
        session.state = state;
        self.emit(UploadEvent::StateChanged(state));
    }

    fn fail(&self, session: &mut UploadSession, e: AppError) -> AppError {
        error!(state = ?session.state, error = %e, "Upload attempt failed");
        self.transition(session, UploadState::Failed);
        self.notify(NotificationLevel::Error, e.user_message());
        e
    }

    fn notify(&self, level: NotificationLevel, message: String) {
        self.emit(UploadEvent::Notification { level, message });
    }

    fn emit(&self, event: UploadEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver just means nobody is rendering.
            let _ = events.send(event);
        }
    }
}

/// Builds the record, base64-encoding the original bytes off the async runtime.
async fn build_record(
    document: &UploadedDocument,
    text: &str,
    result: &AnalysisResult,
) -> AppResult<PersistedRecord> {
    let content = document.content.clone();
    let mime = document.kind.mime_type();
    let data_url = tokio::task::spawn_blocking(move || {
        format!("data:{};base64,{}", mime, STANDARD.encode(&content))
    })
    .await
    .map_err(|e| AppError::internal(format!("Encoding task failed: {}", e)))?;

    Ok(PersistedRecord {
        doc_name: Some(document.name.clone()),
        doc_size: Some(document.size_label()),
        doc_text: Some(text.to_string()),
        doc_summary: Some(result.summary_text.clone()),
        summary_mode: Some(result.mode),
        doc_file: Some(data_url),
        saved_at: Some(Utc::now()),
    })
}
