pub mod auth;
pub mod chat;
pub mod orchestrator;
pub mod relay_client;
pub mod store;
pub mod viewer;

pub use auth::{AuthGate, AuthUser, IdentityProvider};
pub use chat::{ChatReply, ChatSession};
pub use orchestrator::{
    Navigation, OrchestratorOptions, UploadEvent, UploadOrchestrator, UploadSession, UploadState,
    UploadTarget,
};
pub use relay_client::{AnalyzeClient, HttpRelayClient};
pub use store::{JsonFileRecordStore, MemoryRecordStore, PersistedRecord, RecordStore};
pub use viewer::{PdfPreview, Preview, ResultsView};
