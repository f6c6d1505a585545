//! Shared fixtures for the integration test crates.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tokio::net::TcpListener;

use legalease::client::AnalyzeClient;
use legalease::error::{AppError, AppResult};
use legalease::models::Mode;
use legalease::services::GenerativeProvider;
use legalease::Config;

/// Builds a PDF with one Courier text line per page and an inherited A4 MediaBox.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

pub fn config_from(vars: &[(&str, &str)]) -> Config {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_source(|name| map.get(name).cloned()).unwrap()
}

/// Relay client that replays canned answers and records every call.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<AppResult<String>>>,
    calls: Mutex<Vec<(String, Option<Mode>)>>,
    wakes: Mutex<usize>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<AppResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    pub fn answering(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn calls(&self) -> Vec<(String, Option<Mode>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn wake_count(&self) -> usize {
        *self.wakes.lock().unwrap()
    }
}

#[async_trait]
impl AnalyzeClient for ScriptedClient {
    async fn analyze(&self, text: &str, mode: Option<Mode>) -> AppResult<String> {
        self.calls.lock().unwrap().push((text.to_string(), mode));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::relay_transport("no scripted reply left")))
    }

    async fn wake(&self) {
        *self.wakes.lock().unwrap() += 1;
    }
}

type Responder = dyn Fn(&str, &str) -> AppResult<Option<String>> + Send + Sync;

/// Provider whose answer is computed from `(template, text)`.
pub struct FakeProvider {
    respond: Box<Responder>,
    configured: bool,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeProvider {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&str, &str) -> AppResult<Option<String>> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            configured: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(reply: &'static str) -> Self {
        Self::new(move |_, _| Ok(Some(reply.to_string())))
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeProvider for FakeProvider {
    async fn generate(&self, template: &str, text: &str) -> AppResult<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((template.to_string(), text.to_string()));
        (self.respond)(template, text)
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

/// Serves `app` on an ephemeral localhost port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
