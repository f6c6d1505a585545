use tracing::{debug, warn};

use crate::client::relay_client::AnalyzeClient;
use crate::models::{ChatMessage, Mode};

pub const EMPTY_REPLY: &str = "Sorry, I couldn't answer that.";
pub const CONNECTION_ERROR_REPLY: &str = "⚠️ Error connecting to AI service.";

/// The bot's answer to one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub message: ChatMessage,
    /// True only when the question came in by voice.
    pub speak: bool,
}

/// Chat over one document. The transcript lives only as long as the session.
#[derive(Debug, Clone)]
pub struct ChatSession {
    context: String,
    transcript: Vec<ChatMessage>,
    speak_next: bool,
}

impl ChatSession {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            transcript: Vec::new(),
            speak_next: false,
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Marks the next exchange as voice-initiated.
    pub fn mark_voice_input(&mut self) {
        self.speak_next = true;
    }

    pub fn prompt_for(&self, question: &str) -> String {
        format!(
            "Document context:\n{}\n\nUser question: {}",
            self.context, question
        )
    }

    /// Sends one message. Blank input is ignored and returns `None`.
    ///
    /// Relay failures become a bot message instead of an error so the chat
    /// stays usable.
    pub async fn send(&mut self, client: &dyn AnalyzeClient, message: &str) -> Option<ChatReply> {
        // One-shot: consumed by this call even when the input turns out blank.
        let speak = std::mem::take(&mut self.speak_next);

        let question = message.trim();
        if question.is_empty() {
            return None;
        }
        self.transcript.push(ChatMessage::user(question));

        let text = match client.analyze(&self.prompt_for(question), Some(Mode::Chat)).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => EMPTY_REPLY.to_string(),
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                CONNECTION_ERROR_REPLY.to_string()
            }
        };
        debug!(reply_chars = text.len(), speak, "Chat reply received");

        let reply = ChatMessage::bot(text);
        self.transcript.push(reply.clone());
        Some(ChatReply {
            message: reply,
            speak,
        })
    }
}
