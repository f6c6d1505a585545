//! LegalEase document assistant
//!
//! A stateless relay that forwards document text to a generative-language
//! provider, plus the client pipeline that extracts text from uploads,
//! submits it, persists the result, and renders it for chat.

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
