use crate::stream::EventStream;

/// A decoded event record. The API defines per-endpoint payload shapes;
/// this layer only guarantees each record is a JSON object.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

// ─── ApiMethod ─────────────────────────────────────────────────────────────

/// The request methods the API accepts.
///
/// `GetStream` is synthetic: subscriptions go over the wire as `GET`, but
/// they are validated against their own endpoint whitelist, so the validator
/// needs to tell the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    Get,
    Post,
    Put,
    Delete,
    /// Long-lived subscription read (wire-level `GET`).
    GetStream,
}

impl ApiMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMethod::Get => "GET",
            ApiMethod::Post => "POST",
            ApiMethod::Put => "PUT",
            ApiMethod::Delete => "DELETE",
            ApiMethod::GetStream => "GET_STREAM",
        }
    }

    /// The method actually sent over the wire.
    pub(crate) fn wire(&self) -> reqwest::Method {
        match self {
            ApiMethod::Get | ApiMethod::GetStream => reqwest::Method::GET,
            ApiMethod::Post => reqwest::Method::POST,
            ApiMethod::Put => reqwest::Method::PUT,
            ApiMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

// ─── ClientOptions ─────────────────────────────────────────────────────────

/// Connection settings for a [`crate::Stride`] client.
///
/// ```rust,ignore
/// use stride::{ClientOptions, Stride};
///
/// let client = Stride::with_options(
///     "my-token",
///     ClientOptions {
///         base_url: "http://localhost:18181".to_string(),
///         ..ClientOptions::default()
///     },
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Scheme and host of the API, without a trailing slash or version.
    pub base_url: String,
    /// API version segment appended to the base URL.
    pub version: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            base_url: "https://api.stride.io".to_string(),
            version: "v1".to_string(),
        }
    }
}

// ─── Responses ─────────────────────────────────────────────────────────────

/// Outcome of a non-streaming call.
///
/// Non-2xx statuses are not errors at this layer: the server's body (e.g.
/// `{"message": "bad request"}`) is passed through for the caller to
/// interpret alongside the status code.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body; `Null` when the body was empty, or the raw text as
    /// a JSON string when the server sent something that is not JSON.
    pub response: serde_json::Value,
}

/// Outcome of a subscribe call.
#[derive(Debug)]
pub struct Subscription {
    pub status: u16,
    /// The event stream; `None` unless the server answered HTTP 200.
    pub stream: Option<EventStream>,
}

// ─── Tests ─────────────────────────────────────────────────────────────────
