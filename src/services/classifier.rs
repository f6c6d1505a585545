//! Best-effort document metadata from free text.
//!
//! The heuristics are deliberately approximate: a handful of substring checks
//! and regular expressions. Oddly formatted or adversarial text will produce
//! wrong or missing values, which is accepted behaviour.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const NOT_DETECTED: &str = "Not detected";

static PARTIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)between\s+(.+?)\s+and\s+(.+?)[.,]").expect("valid regex"));

static JURISDICTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)laws of\s+([A-Za-z\s]+)").expect("valid regex"));

static DATES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:\d{1,2}[-/]\d{1,2}[-/]\d{2,4}|\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\b\s+\d{1,2},?\s+\d{4})",
    )
    .expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub doc_type: String,
    pub parties: String,
    pub jurisdiction: String,
    pub dates: String,
}

/// Replaceable strategy for deriving [`DocumentMetadata`] from text.
pub trait DocumentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> DocumentMetadata;
}

/// Regex and keyword classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl DocumentClassifier for HeuristicClassifier {
    fn classify(&self, text: &str) -> DocumentMetadata {
        DocumentMetadata {
            doc_type: detect_doc_type(text).to_string(),
            parties: detect_parties(text),
            jurisdiction: detect_jurisdiction(text),
            dates: detect_dates(text),
        }
    }
}

/// First match wins: lease, contract/agreement, policy, will/testament.
pub fn detect_doc_type(text: &str) -> &'static str {
    let t = text.to_lowercase();
    if t.contains("lease") {
        "Lease Agreement"
    } else if t.contains("contract") || t.contains("agreement") {
        "Contract / Agreement"
    } else if t.contains("policy") {
        "Policy Document"
    } else if t.contains("testament") || t.contains("will") {
        "Legal Will"
    } else {
        "Legal Document"
    }
}

pub fn detect_parties(text: &str) -> String {
    PARTIES
        .captures(text)
        .map(|caps| format!("{} & {}", &caps[1], &caps[2]))
        .unwrap_or_else(|| NOT_DETECTED.to_string())
}

pub fn detect_jurisdiction(text: &str) -> String {
    JURISDICTION
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| NOT_DETECTED.to_string())
}

/// All numeric and month-name dates, in order of appearance.
pub fn detect_dates(text: &str) -> String {
    let matches: Vec<&str> = DATES.find_iter(text).map(|m| m.as_str()).collect();
    if matches.is_empty() {
        NOT_DETECTED.to_string()
    } else {
        matches.join(", ")
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
