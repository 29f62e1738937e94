//! Minimal HTTP client with safe logging and bearer auth.
//!
//! - Request options: headers, `Auth`, query params, timeout, retries
//! - Bodies: JSON, raw bytes, or multipart forms (rebuilt on every attempt)
//! - Responses: decoded JSON or raw bytes (chart images, KV values)
//! - Retries 429/5xx with exponential backoff and `Retry-After` support, but the
//!   default budget is zero: a failed call fails the cycle
//! - Optional *raw* request/response logging via `THREADCOUNT_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), threadcount_http::HttpError> {
//! let client = threadcount_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", threadcount_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Security: `Auth::Bearer` values are sanitized before use, and logs only
//! ever include the auth kind (bearer/none), not the secret.

use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, HeaderMap, RETRY_AFTER};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Request, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;

// ==============================
// Raw logging
// ==============================

const RAW_ENV: &str = "THREADCOUNT_HTTP_RAW";
/// Raw body logs are cut at 64 KiB.
const RAW_MAX_BODY: usize = 64 * 1024;
/// Body excerpt kept in warnings and decode errors.
const SNIPPET_LEN: usize = 500;

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(0);

fn raw_enabled() -> bool {
    env::var(RAW_ENV).is_ok_and(|v| matches!(v.trim(), "1" | "true" | "yes"))
}

fn next_request_id() -> String {
    format!("r{:04}", REQUEST_SEQ.fetch_add(1, Ordering::Relaxed) + 1)
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Equivalent curl invocation for reproducing a request; credentials are masked.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap, body: Option<&[u8]>) -> String {
    let mut cmd = format!("curl -X{method}");
    for (name, value) in redact_headers(headers) {
        cmd.push_str(" -H ");
        cmd.push_str(&shell_quote(&format!("{name}: {value}")));
    }
    if let Some(bytes) = body {
        match std::str::from_utf8(bytes) {
            Ok(text) => {
                cmd.push_str(" -d ");
                cmd.push_str(&shell_quote(truncate_utf8(text, RAW_MAX_BODY)));
            }
            Err(_) => cmd.push_str(&format!(" --data-binary @- # ({} bytes)", bytes.len())),
        }
    }
    cmd.push(' ');
    cmd.push_str(&shell_quote(url.as_str()));
    cmd
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(name, value)| {
            let shown = if *name == AUTHORIZATION {
                "<redacted>".to_string()
            } else {
                value.to_str().unwrap_or("<binary>").to_string()
            };
            (name.as_str().to_string(), shown)
        })
        .collect()
}


// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// True when the server answered 404; KV backends read this as "absent".
    pub fn is_not_found(&self) -> bool {
        matches!(self, HttpError::Api { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

// ==============================
// Auth, bodies & request options
// ==============================

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use threadcount_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// match bearer {
///     Auth::Bearer(value) => assert_eq!(value, "token"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    None,
}

/// One field of a multipart form.
///
/// Kept as plain data so the form can be rebuilt for every attempt
/// (`reqwest::multipart::Form` is consumed by `send`).
#[derive(Clone, Debug)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: String,
        data: Bytes,
    },
}

/// Request payloads understood by [`HttpClient`].
#[derive(Clone, Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Vec<u8>),
    Raw {
        data: Bytes,
        content_type: &'static str,
    },
    Multipart(Vec<FormPart>),
}

impl RequestBody {
    /// Serialize `value` as a JSON body.
    pub fn json<B: Serialize + ?Sized>(value: &B) -> Result<Self, HttpError> {
        serde_json::to_vec(value)
            .map(RequestBody::Json)
            .map_err(|e| HttpError::Build(format!("json body: {e}")))
    }

    fn is_present(&self) -> bool {
        !matches!(self, RequestBody::Empty)
    }

    fn log_bytes(&self) -> Option<&[u8]> {
        match self {
            RequestBody::Json(b) => Some(b),
            RequestBody::Raw { data, .. } => Some(data),
            _ => None,
        }
    }

    fn apply(&self, rb: RequestBuilder) -> Result<RequestBuilder, HttpError> {
        Ok(match self {
            RequestBody::Empty => rb,
            RequestBody::Json(bytes) => rb
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(bytes.clone()),
            RequestBody::Raw { data, content_type } => rb
                .header(reqwest::header::CONTENT_TYPE, *content_type)
                .body(data.clone()),
            RequestBody::Multipart(parts) => {
                let mut form = Form::new();
                for part in parts {
                    form = match part {
                        FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
                        FormPart::File {
                            name,
                            file_name,
                            mime,
                            data,
                        } => {
                            let p = Part::bytes(data.to_vec())
                                .file_name(file_name.clone())
                                .mime_str(mime)
                                .map_err(|e| HttpError::Build(format!("multipart mime: {e}")))?;
                            form.part(name.clone(), p)
                        }
                    };
                }
                rb.multipart(form)
            }
        })
    }
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use threadcount_http::{Auth, RequestOpts};
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     retries: Some(1),
///     auth: Some(Auth::Bearer("demo")),
///     query: Some(vec![("limit", Cow::Borrowed("40"))]),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(opts.headers.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>, // e.g. [("limit", "40".into())]
}

// ==============================
// Client
// ==============================

#[derive(Clone, Debug)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// A trailing `/` is added to the base path so relative paths join under it.
    ///
    /// ```no_run
    /// use threadcount_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com/v1")?;
    /// assert_eq!(client.base().as_str(), "https://api.example.com/v1/");
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 0);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let mut base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("threadcount/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 0,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Override the default retry budget (zero) returned by [`HttpClient::new`].
    ///
    /// ```no_run
    /// use threadcount_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new("https://api.example.com")?.with_retries(5);
    /// assert_eq!(client.max_retries, 5);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    /// GET and decode a JSON response.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let bytes = self
            .request(Method::GET, path, RequestBody::Empty, opts)
            .await?;
        decode_json(&bytes)
    }

    /// GET the raw response body.
    pub async fn get_bytes(&self, path: &str, opts: RequestOpts<'_>) -> Result<Bytes, HttpError> {
        self.request(Method::GET, path, RequestBody::Empty, opts)
            .await
    }

    /// POST a JSON body and decode a JSON response.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self
            .request(Method::POST, path, RequestBody::json(body)?, opts)
            .await?;
        decode_json(&bytes)
    }

    /// POST a JSON body and hand back the raw response (e.g. a rendered image).
    pub async fn post_json_for_bytes<B>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<Bytes, HttpError>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, RequestBody::json(body)?, opts)
            .await
    }

    /// POST a multipart form and decode a JSON response.
    pub async fn post_multipart<T>(
        &self,
        path: &str,
        parts: Vec<FormPart>,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let bytes = self
            .request(Method::POST, path, RequestBody::Multipart(parts), opts)
            .await?;
        decode_json(&bytes)
    }

    /// PUT a raw body; the response body is returned undecoded.
    pub async fn put_bytes(
        &self,
        path: &str,
        data: Bytes,
        content_type: &'static str,
        opts: RequestOpts<'_>,
    ) -> Result<Bytes, HttpError> {
        self.request(
            Method::PUT,
            path,
            RequestBody::Raw { data, content_type },
            opts,
        )
        .await
    }

    // ==============================
    // Core request implementation
    // ==============================

    /// Send `body` to `path` (relative to the base) and return the body of the
    /// first 2xx response.
    ///
    /// 429, 5xx and transport failures are retried while the budget lasts;
    /// any other status fails immediately.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        opts: RequestOpts<'_>,
    ) -> Result<Bytes, HttpError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;
        let bearer = match &opts.auth {
            Some(Auth::Bearer(token)) => Some(sanitize_bearer(token)?),
            Some(Auth::None) | None => None,
        };
        let budget = opts.retries.unwrap_or(self.max_retries);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let req_id = next_request_id();
            let prepared = self.prepare(&method, &url, &body, &opts, bearer.as_deref(), timeout)?;

            tracing::debug!(
                %req_id,
                attempt,
                budget,
                %method,
                target = %format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
                query = ?redact_query(opts.query.as_deref()),
                timeout_ms = timeout.as_millis() as u64,
                auth = if bearer.is_some() { "bearer" } else { "none" },
                has_body = body.is_present(),
                "http.request.start"
            );
            if raw_enabled() {
                // Headers as sent, including the Authorization set from `bearer`.
                let curl = make_curl(&method, &url, prepared.headers(), body.log_bytes());
                tracing::debug!(target: "http.raw", %req_id, %curl, "request");
            }

            let (error, wait) = match send_once(&self.inner, prepared, &req_id).await {
                Outcome::Done(bytes) => return Ok(bytes),
                Outcome::Fatal(error) => return Err(error),
                Outcome::Retryable { error, wait } => (error, wait),
            };
            if attempt > budget {
                return Err(error);
            }
            let delay = wait.unwrap_or_else(|| backoff(attempt));
            tracing::warn!(
                %req_id,
                attempt,
                budget,
                backoff_ms = delay.as_millis() as u64,
                %error,
                "http.retrying"
            );
            sleep(delay).await;
        }
    }

    fn prepare(
        &self,
        method: &Method,
        url: &Url,
        body: &RequestBody,
        opts: &RequestOpts<'_>,
        bearer: Option<&str>,
        timeout: Duration,
    ) -> Result<Request, HttpError> {
        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .timeout(timeout);
        if let Some(query) = &opts.query {
            let pairs: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }
        rb = body.apply(rb)?;
        if let Some(headers) = &opts.headers {
            rb = rb.headers(headers.clone());
        }
        if let Some(token) = bearer {
            rb = rb.bearer_auth(token);
        }
        rb.build().map_err(|e| HttpError::Build(e.to_string()))
    }
}

/// Result of one attempt, before the retry budget is consulted.
enum Outcome {
    Done(Bytes),
    Retryable {
        error: HttpError,
        /// Server-requested wait; exponential backoff otherwise.
        wait: Option<Duration>,
    },
    Fatal(HttpError),
}

async fn send_once(client: &Client, request: Request, req_id: &str) -> Outcome {
    let started = Instant::now();
    let resp = match client.execute(request).await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!(%req_id, error = %e, "http.network_error.send");
            return Outcome::Retryable {
                error: HttpError::Network(e.to_string()),
                wait: None,
            };
        }
    };
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = match resp.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(%req_id, %status, error = %e, "http.network_error.body");
            return Outcome::Retryable {
                error: HttpError::Network(format!("reading body: {e}")),
                wait: None,
            };
        }
    };

    let upstream_id = header_str(&headers, "x-request-id")
        .or_else(|| header_str(&headers, "cf-ray"))
        .unwrap_or("-");
    tracing::debug!(
        %req_id,
        %status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        body_len = bytes.len(),
        upstream_id,
        rate_limit.remaining = ?header_str(&headers, "x-ratelimit-remaining"),
        rate_limit.reset = ?header_str(&headers, "x-ratelimit-reset"),
        "http.response"
    );
    if raw_enabled() {
        let text = String::from_utf8_lossy(&bytes[..bytes.len().min(RAW_MAX_BODY)]);
        tracing::debug!(
            target: "http.raw",
            %req_id,
            %status,
            headers = ?redact_headers(&headers),
            body = %text,
            truncated = bytes.len() > RAW_MAX_BODY,
            "response"
        );
    }

    if status.is_success() {
        return Outcome::Done(bytes);
    }

    let error = HttpError::Api {
        status,
        message: extract_error_message(&bytes),
        request_id: upstream_id.to_string(),
    };
    tracing::warn!(
        %req_id,
        %status,
        upstream_id,
        body_snippet = %snip_body(&bytes),
        "http.error"
    );
    if status == StatusCode::TOO_MANY_REQUESTS {
        // No Retry-After on a 429 still means "not right now".
        let wait = retry_after(&headers).unwrap_or(Duration::from_secs(1));
        Outcome::Retryable {
            error,
            wait: Some(wait),
        }
    } else if status.is_server_error() {
        Outcome::Retryable {
            error,
            wait: retry_after(&headers),
        }
    } else {
        Outcome::Fatal(error)
    }
}

// ==============================
// Helpers
// ==============================

fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, HttpError> {
    serde_json::from_slice::<T>(bytes).map_err(|e| {
        let snippet = snip_body(bytes);
        tracing::warn!(
            line = e.line(),
            column = e.column(),
            error = %e,
            body_snippet = %snippet,
            "http.response.decode_error"
        );
        HttpError::Decode(e.to_string(), snippet)
    })
}

/// 200ms, 400ms, 800ms... capped at 2^8 steps.
fn backoff(attempt: usize) -> Duration {
    let step = attempt.saturating_sub(1).min(8) as u32;
    Duration::from_millis(200) * 2u32.pow(step)
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    header_str(headers, RETRY_AFTER.as_str())?
        .trim()
        .parse()
        .ok()
        .map(Duration::from_secs)
}

/// Human-readable reason from an error body.
///
/// Understands Cloudflare (`errors[].message`) and Mastodon
/// (`error_description`, `error`); falls back to a body excerpt.
fn extract_error_message(body: &[u8]) -> String {
    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct ErrorBody {
        errors: Vec<ErrorItem>,
        error_description: Option<String>,
        error: Option<String>,
        message: Option<String>,
    }
    #[derive(Deserialize)]
    struct ErrorItem {
        #[serde(default)]
        message: String,
    }

    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    parsed
        .errors
        .into_iter()
        .map(|e| e.message)
        .chain(parsed.error_description)
        .chain(parsed.error)
        .chain(parsed.message)
        .find(|m| !m.trim().is_empty())
        .unwrap_or_else(|| snip_body(body))
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(&body[..body.len().min(SNIPPET_LEN)]).into_owned();
    if body.len() > SNIPPET_LEN {
        snip.push_str("...");
    }
    snip
}

const SECRET_PARAMS: &[&str] = &[
    "access_token",
    "authorization",
    "token",
    "secret",
    "api_key",
    "key",
];

fn redact_query(query: Option<&[(&str, Cow<'_, str>)]>) -> Vec<(String, String)> {
    query
        .unwrap_or_default()
        .iter()
        .map(|(k, v)| {
            let shown = if SECRET_PARAMS.iter().any(|s| k.eq_ignore_ascii_case(s)) {
                "<redacted>".to_string()
            } else {
                v.to_string()
            };
            (k.to_string(), shown)
        })
        .collect()
}

/// Strip quotes and whitespace picked up when a token is pasted into an env
/// var, then reject anything that cannot go into a header.
fn sanitize_bearer(raw: &str) -> Result<String, HttpError> {
    let token: String = raw
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if token.is_empty() {
        return Err(HttpError::Build("bearer token is empty".into()));
    }
    if !token.chars().all(|c| c.is_ascii_graphic()) {
        return Err(HttpError::Build(
            "bearer token must be printable ASCII".into(),
        ));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_quotes_and_whitespace() {
        assert_eq!(sanitize_bearer(" \"abc def\"\n").unwrap(), "abcdef");
        assert!(sanitize_bearer("   ").is_err());
        assert!(sanitize_bearer("tøken").is_err());
    }

    #[test]
    fn error_message_prefers_structured_fields() {
        let mastodon = br#"{"error":"The access token is invalid"}"#;
        assert_eq!(extract_error_message(mastodon), "The access token is invalid");

        let cloudflare = br#"{"success":false,"errors":[{"code":10009,"message":"key not found"}]}"#;
        assert_eq!(extract_error_message(cloudflare), "key not found");

        assert_eq!(extract_error_message(b"plain failure"), "plain failure");
    }

    #[test]
    fn query_secrets_are_redacted() {
        let q = vec![("limit", Cow::Borrowed("40")), ("access_token", Cow::Borrowed("s3cret"))];
        let red = redact_query(Some(q.as_slice()));
        assert_eq!(red[0], ("limit".to_string(), "40".to_string()));
        assert_eq!(red[1].1, "<redacted>");
    }

    #[test]
    fn base_gets_trailing_slash() {
        let client = HttpClient::new("https://api.fedidb.org/v1").unwrap();
        assert_eq!(
            client.base().join("software").unwrap().as_str(),
            "https://api.fedidb.org/v1/software"
        );
    }

    #[test]
    fn not_found_is_detected() {
        let err = HttpError::Api {
            status: StatusCode::NOT_FOUND,
            message: "missing".into(),
            request_id: "-".into(),
        };
        assert!(err.is_not_found());
        assert!(!HttpError::Network("reset".into()).is_not_found());
    }

    #[test]
    fn snippet_is_capped() {
        let long = vec![b'a'; 600];
        let s = snip_body(&long);
        assert_eq!(s.len(), 503);
        assert!(s.ends_with("..."));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff(1), Duration::from_millis(200));
        assert_eq!(backoff(3), Duration::from_millis(800));
        assert_eq!(backoff(50), backoff(9));
    }

    #[test]
    fn retry_after_reads_seconds() {
        let mut h = HeaderMap::new();
        assert_eq!(retry_after(&h), None);
        h.insert(RETRY_AFTER, " 7 ".parse().unwrap());
        assert_eq!(retry_after(&h), Some(Duration::from_secs(7)));
        h.insert(RETRY_AFTER, "Wed, 21 Oct 2015 07:28:00 GMT".parse().unwrap());
        assert_eq!(retry_after(&h), None);
    }

    #[test]
    fn curl_of_prepared_request_masks_bearer() {
        let client = HttpClient::new("https://botsin.space/").unwrap();
        let url = client.base.join("api/v1/statuses").unwrap();
        let body = RequestBody::json(&serde_json::json!({ "status": "it's up" })).unwrap();
        let opts = RequestOpts {
            auth: Some(Auth::Bearer("s3cret")),
            ..Default::default()
        };
        let prepared = client
            .prepare(&Method::POST, &url, &body, &opts, Some("s3cret"), Duration::from_secs(5))
            .unwrap();

        let curl = make_curl(&Method::POST, &url, prepared.headers(), body.log_bytes());
        assert!(!curl.contains("s3cret"));
        assert!(curl.contains("authorization: <redacted>"));
        assert!(curl.contains("content-type: application/json"));
        assert!(curl.contains(r"it'\''s up"));
        assert!(curl.ends_with("'https://botsin.space/api/v1/statuses'"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_utf8("héllo", 2), "h");
        assert_eq!(truncate_utf8("hello", 10), "hello");
    }
}
