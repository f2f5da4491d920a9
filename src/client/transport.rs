//! Transport layer the rule sets probe through.
//!
//! Provides the [`Transport`] trait (GET, POST-JSON, OPEN-SSE) and
//! [`HttpTransport`], its `reqwest` implementation. Unlike an SDK transport,
//! non-2xx statuses are *not* errors here: the status, headers and body are
//! observations the rule sets score. Only failures below HTTP are `Err`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{ProbeError, ProbeResult};
use crate::utils::constants::{JSON_MEDIA_TYPE, SSE_MEDIA_TYPE};

use super::sse::SseStream;

/// An HTTP response as observed by a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header map with lowercase names.
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<String>) -> Self {
        let mut headers = HashMap::new();
        if let Some(ct) = content_type {
            headers.insert("content-type".to_string(), ct.to_string());
        }
        HttpResponse {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Value of a header, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// `content-type` header, or `""` when absent.
    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or("")
    }

    /// Whether the content type declares JSON.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .to_ascii_lowercase()
            .contains(JSON_MEDIA_TYPE)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body parsed as JSON, regardless of the declared content type.
    pub fn json(&self) -> ProbeResult<Value> {
        serde_json::from_str(&self.body)
            .map_err(|e| ProbeError::InvalidJson(format!("response body is not JSON: {e}")))
    }
}

/// Transport abstraction the probes depend on.
///
/// Implementations report any HTTP response as `Ok`; `Err` means no response
/// was obtained (connection refused, DNS, TLS, timeout).
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET url` with the configured credentials.
    async fn get(&self, url: &str) -> ProbeResult<HttpResponse>;

    /// `POST url` with a JSON body and the configured credentials.
    async fn post_json(&self, url: &str, body: &Value) -> ProbeResult<HttpResponse>;

    /// `POST url` with a JSON body and no `Authorization` header.
    ///
    /// The default implementation sends with credentials; transports that hold
    /// none need not override it.
    async fn post_json_anonymous(&self, url: &str, body: &Value) -> ProbeResult<HttpResponse> {
        self.post_json(url, body).await
    }

    /// `POST url` expecting `text/event-stream`.
    ///
    /// Fails with [`ProbeError::Http`] on a non-2xx status and with
    /// [`ProbeError::InvalidResponse`] when the response is not an event
    /// stream. The returned stream releases the connection when dropped.
    async fn open_sse(&self, url: &str, body: &Value) -> ProbeResult<SseStream>;
}

/// `reqwest`-backed transport built from [`Settings`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    bearer: Option<String>,
    timeout: Duration,
    stream_timeout: Duration,
}

impl HttpTransport {
    /// Build a transport: TLS verification, redirects, extra headers and the
    /// bearer token all come from `settings`.
    pub fn new(settings: &Settings) -> ProbeResult<Self> {
        let mut default_headers = HeaderMap::new();
        for (key, value) in &settings.extra_headers {
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(val)) => {
                    default_headers.insert(name, val);
                }
                _ => warn!(header = %key, "ignoring invalid extra header"),
            }
        }

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!settings.verify_tls)
            .redirect(reqwest::redirect::Policy::limited(10))
            .default_headers(default_headers)
            .build()
            .map_err(|e| ProbeError::Other(format!("failed to build HTTP client: {e}")))?;

        debug!(
            verify_tls = settings.verify_tls,
            timeout_s = settings.timeout.as_secs_f64(),
            stream_timeout_s = settings.stream_timeout.as_secs_f64(),
            auth = %settings.masked_bearer(),
            "HTTP transport ready"
        );

        Ok(Self {
            client,
            bearer: settings.auth_bearer.clone(),
            timeout: settings.timeout,
            stream_timeout: settings.stream_timeout,
        })
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        }
    }

    async fn execute(
        &self,
        context: &str,
        builder: reqwest::RequestBuilder,
    ) -> ProbeResult<HttpResponse> {
        let response = builder
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ProbeError::from_reqwest(context, e))?;
        read_response(context, response).await
    }
}

async fn read_response(context: &str, response: reqwest::Response) -> ProbeResult<HttpResponse> {
    let status = response.status().as_u16();
    let headers = lowercase_headers(response.headers());
    let body = response
        .text()
        .await
        .map_err(|e| ProbeError::from_reqwest(context, e))?;
    debug!(%status, bytes = body.len(), "{context} answered");
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn lowercase_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect()
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> ProbeResult<HttpResponse> {
        debug!(%url, "GET");
        let context = format!("GET {url}");
        self.execute(&context, self.authorize(self.client.get(url)))
            .await
    }

    async fn post_json(&self, url: &str, body: &Value) -> ProbeResult<HttpResponse> {
        debug!(%url, "POST");
        let context = format!("POST {url}");
        self.execute(&context, self.authorize(self.client.post(url).json(body)))
            .await
    }

    async fn post_json_anonymous(&self, url: &str, body: &Value) -> ProbeResult<HttpResponse> {
        debug!(%url, "POST (anonymous)");
        let context = format!("POST {url}");
        self.execute(&context, self.client.post(url).json(body))
            .await
    }

    async fn open_sse(&self, url: &str, body: &Value) -> ProbeResult<SseStream> {
        debug!(%url, "POST (event stream)");
        let context = format!("stream {url}");
        let builder = self
            .authorize(self.client.post(url).json(body))
            .header(ACCEPT, SSE_MEDIA_TYPE)
            // Bound the whole body read a little past the consumer's own deadline.
            .timeout(self.stream_timeout + self.timeout);

        let response = builder
            .send()
            .await
            .map_err(|e| ProbeError::from_reqwest(&context, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProbeError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.contains(SSE_MEDIA_TYPE) {
            return Err(ProbeError::InvalidResponse(format!(
                "expected {SSE_MEDIA_TYPE}, got content-type '{content_type}'"
            )));
        }

        Ok(SseStream::from_response(response))
    }
}
