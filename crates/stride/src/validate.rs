use std::sync::OnceLock;

use regex::Regex;

use crate::error::StrideError;
use crate::types::ApiMethod;
use crate::Result;

// ─── Endpoint whitelist ────────────────────────────────────────────────────

/// Resource names start with a letter, then letters, digits, or underscores.
const NAME: &str = "[A-Za-z][A-Za-z0-9_]*";

static VERSION_RE: OnceLock<Regex> = OnceLock::new();
static ENDPOINT_TABLE: OnceLock<Vec<(ApiMethod, Vec<Regex>)>> = OnceLock::new();

fn version_re() -> &'static Regex {
    VERSION_RE.get_or_init(|| Regex::new(r"^/v\d+(/|$)").unwrap())
}

/// Accepted path shapes per method, mirroring the server-side routing table.
/// `{name}` stands for a resource name. Subscriptions (`GetStream`) have
/// their own row; `Get` does not cover them.
fn endpoint_table() -> &'static [(ApiMethod, Vec<Regex>)] {
    ENDPOINT_TABLE.get_or_init(|| {
        vec![
            (
                ApiMethod::Get,
                compile_shapes(&[
                    "/collect",
                    "/collect/{name}",
                    "/process",
                    "/process/{name}",
                    "/process/{name}/stats",
                    "/analyze",
                    "/analyze/{name}",
                    "/analyze/{name}/results",
                ]),
            ),
            (
                ApiMethod::Post,
                compile_shapes(&[
                    "/collect",
                    "/collect/{name}",
                    "/process/{name}",
                    "/analyze",
                    "/analyze/{name}",
                ]),
            ),
            (ApiMethod::Put, compile_shapes(&["/analyze/{name}"])),
            (
                ApiMethod::Delete,
                compile_shapes(&["/collect/{name}", "/process/{name}", "/analyze/{name}"]),
            ),
            (
                ApiMethod::GetStream,
                compile_shapes(&["/collect/{name}/subscribe", "/process/{name}/subscribe"]),
            ),
        ]
    })
}

fn compile_shapes(shapes: &[&str]) -> Vec<Regex> {
    shapes
        .iter()
        .map(|shape| {
            let pattern = format!("^{}$", shape.replace("{name}", NAME));
            Regex::new(&pattern).unwrap()
        })
        .collect()
}

fn allowed(method: ApiMethod, path: &str) -> bool {
    endpoint_table()
        .iter()
        .find(|(m, _)| *m == method)
        .is_some_and(|(_, shapes)| shapes.iter().any(|shape| shape.is_match(path)))
}

// ─── Validation ────────────────────────────────────────────────────────────

/// Check a caller-supplied URL against the whitelist for `method` before any
/// request work happens.
///
/// Checks run in a fixed order so the error names the first problem found:
/// leading slash, then no version segment, then a known resource family, then
/// the method-specific shape patterns. The query string is ignored for
/// matching but kept in the reported URL.
pub(crate) fn validate_url(method: ApiMethod, url: &str) -> Result<()> {
    if !url.starts_with('/') {
        return Err(StrideError::invalid_url(url, "missing leading slash"));
    }

    let path = strip_query(url);

    if version_re().is_match(path) {
        return Err(StrideError::invalid_url(url, "omit the version number"));
    }

    let family = path
        .strip_prefix('/')
        .unwrap_or(path)
        .split('/')
        .next()
        .unwrap_or("");
    if !matches!(family, "collect" | "process" | "analyze") {
        return Err(StrideError::invalid_url(url, "unsupported endpoint family"));
    }

    if !allowed(method, path) {
        return Err(StrideError::invalid_url(
            url,
            format!("URL not supported for the {} method", method.as_str()),
        ));
    }

    Ok(())
}

fn strip_query(url: &str) -> &str {
    match url.find('?') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────
