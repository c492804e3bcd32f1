//! Redaction helpers for anything that ends up in logs or tool output.

use url::Url;

/// Longest remote error body carried into an error message.
pub const MAX_ERROR_BODY_CHARS: usize = 512;

/// Strip credentials, query and fragment from a URL.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

/// Render a transport error without leaking credentials or query parameters.
#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}

/// Trim a remote error body to a bounded, single-line message.
#[must_use]
pub fn truncate_body(body: &str) -> String {
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX_ERROR_BODY_CHARS {
        return flat;
    }
    let mut out: String = flat.chars().take(MAX_ERROR_BODY_CHARS).collect();
    out.push('…');
    out
}
