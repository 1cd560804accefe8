//! `stride` — Rust client for the Stride realtime analytics API.
//!
//! Stride exposes three resource families over HTTP: `collect` (raw event
//! streams), `process` (continuous transformations), and `analyze` (saved
//! queries). This crate wraps that versioned REST surface plus the
//! long-lived subscription endpoints that push CRLF-delimited JSON events.
//!
//! # Architecture
//!
//! ```text
//! Stride             ← holds credentials + reqwest::Client
//!     │                 every URL is checked against the endpoint
//!     │                 whitelist before a request is built
//!     ▼
//! ApiResponse        ← CRUD calls: {status, parsed JSON body}
//!
//! Stride::subscribe
//!     │
//!     ▼
//! EventStream        ← implements futures::Stream<Item = Result<JsonObject>>
//!                       background task decodes CRLF-framed records
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use serde_json::json;
//! use stride::Stride;
//!
//! let client = Stride::new("my-token")?;
//!
//! client.post("/collect/clicks", &json!({"url": "/pricing"})).await?;
//!
//! let sub = client.subscribe("/collect/clicks/subscribe").await?;
//! if let Some(mut events) = sub.stream {
//!     while let Some(event) = events.next().await {
//!         println!("click: {:?}", event?);
//!     }
//! }
//! ```

pub mod client;
pub mod error;
pub mod stream;
pub mod types;

pub(crate) mod validate;

pub use client::Stride;
pub use error::StrideError;
pub use stream::EventStream;
pub use types::{ApiMethod, ApiResponse, ClientOptions, JsonObject, Subscription};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, StrideError>;
