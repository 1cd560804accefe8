use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;

use crate::stream::EventStream;
use crate::types::{ApiMethod, ApiResponse, ClientOptions, Subscription};
use crate::validate::validate_url;
use crate::Result;

/// Client identification string sent with every request.
const USER_AGENT: &str = concat!("stride-rust/", env!("CARGO_PKG_VERSION"));

// ─── Stride ────────────────────────────────────────────────────────────────

/// A client for the Stride realtime analytics API.
///
/// Every call names an endpoint by its path relative to the versioned base
/// URL (for example `/collect/clicks`); the path is checked against the API's
/// endpoint whitelist before any request goes out. Non-2xx statuses are
/// returned, not raised, so callers can inspect the server's error body.
///
/// ```rust,ignore
/// use serde_json::json;
/// use stride::Stride;
///
/// let client = Stride::new("my-token")?;
/// let created = client.post("/collect/clicks", &json!({"url": "/pricing"})).await?;
/// assert_eq!(created.status, 200);
/// ```
pub struct Stride {
    http: reqwest::Client,
    basic_auth: String,
    base_url: String,
    version: String,
}

impl Stride {
    /// Create a client for the hosted API with [`ClientOptions::default`].
    pub fn new(token: &str) -> Result<Self> {
        Self::with_options(token, ClientOptions::default())
    }

    /// Create a client against a specific host and API version.
    pub fn with_options(token: &str, options: ClientOptions) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Stride {
            http,
            basic_auth: format!("Basic {}", STANDARD.encode(format!("{token}:"))),
            base_url: options.base_url.trim_end_matches('/').to_string(),
            version: options.version,
        })
    }

    /// Fetch a resource listing, a single resource, or a derived view
    /// (`/stats`, `/results`).
    pub async fn get(&self, url: &str) -> Result<ApiResponse> {
        execute(self.prepare(ApiMethod::Get, url)?).await
    }

    /// Create a resource or append events to a stream.
    pub async fn post<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<ApiResponse> {
        execute(self.prepare(ApiMethod::Post, url)?.json(body)).await
    }

    /// Replace an analyze query.
    pub async fn put<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<ApiResponse> {
        execute(self.prepare(ApiMethod::Put, url)?.json(body)).await
    }

    /// Delete a resource.
    pub async fn delete(&self, url: &str) -> Result<ApiResponse> {
        execute(self.prepare(ApiMethod::Delete, url)?).await
    }

    /// Open a long-lived subscription to `/collect/{name}/subscribe` or
    /// `/process/{name}/subscribe`.
    ///
    /// The stream field is populated only when the server answers HTTP 200;
    /// any other status comes back with `stream: None` and no connection
    /// left open.
    pub async fn subscribe(&self, url: &str) -> Result<Subscription> {
        let response = self.prepare(ApiMethod::GetStream, url)?.send().await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Ok(Subscription {
                status,
                stream: None,
            });
        }
        Ok(Subscription {
            status,
            stream: Some(EventStream::new(response)),
        })
    }

    /// Validate the URL for `method`, then start a request with the standard
    /// headers. Nothing is serialized or sent for a URL the API would reject.
    fn prepare(&self, method: ApiMethod, url: &str) -> Result<reqwest::RequestBuilder> {
        validate_url(method, url)?;
        tracing::debug!(method = method.as_str(), url, "dispatching API request");
        Ok(self
            .http
            .request(method.wire(), self.endpoint(url))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, self.basic_auth.as_str()))
    }

    fn endpoint(&self, url: &str) -> String {
        format!("{}/{}{}", self.base_url, self.version, url)
    }
}

async fn execute(request: reqwest::RequestBuilder) -> Result<ApiResponse> {
    let response = request.send().await?;
    let status = response.status().as_u16();
    let text = response.text().await?;
    Ok(ApiResponse {
        status,
        response: parse_body(&text),
    })
}

/// Interpret a response body: parsed JSON when it parses, `Null` when empty,
/// the raw text as a JSON string otherwise.
fn parse_body(text: &str) -> serde_json::Value {
    if text.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
}

// ─── Tests ─────────────────────────────────────────────────────────────────
