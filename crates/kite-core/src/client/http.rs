//! reqwest-backed transport.

use super::{CookieJar, KiteClient, Method, RequestOptions, Response, TransportError, parse_set_cookies};
use crate::config::ConnectorConfig;
use async_trait::async_trait;
use std::time::Duration;
use tracing::trace;

/// HTTP transport to the daemon's local API.
///
/// Cookies set by the daemon are kept in a shared [`CookieJar`] and sent
/// back on every subsequent request.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    cookies: CookieJar,
}

impl HttpClient {
    /// Creates a client for `base_url` (e.g. `http://localhost:46624`).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cookies: CookieJar::new(),
        })
    }

    /// Creates a client from connector settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn from_config(config: &ConnectorConfig) -> Result<Self, TransportError> {
        Self::new(config.base_url())
    }

    /// Returns the base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the cookie jar shared by clones of this client.
    #[must_use]
    pub const fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

const fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
    }
}

fn classify(err: &reqwest::Error, timeout: Option<Duration>) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout.unwrap_or_default())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_builder() {
        TransportError::InvalidUrl(err.to_string())
    } else {
        TransportError::Http(err.to_string())
    }
}

#[async_trait]
impl KiteClient for HttpClient {
    async fn request(
        &self,
        options: &RequestOptions,
        body: Option<&[u8]>,
        timeout: Option<Duration>,
    ) -> Result<Response, TransportError> {
        let url = self.url_for(&options.path);
        trace!(method = %options.method, url = %url, "sending request");

        let mut builder = self.client.request(reqwest_method(options.method), &url);
        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookie) = self.cookies.header() {
            builder = builder.header(reqwest::header::COOKIE, cookie);
        }
        if let Some(body) = body {
            builder = builder.body(body.to_vec());
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| classify(&e, timeout))?;

        let status_code = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify(&e, timeout))?
            .to_vec();

        let response = Response {
            status_code,
            headers,
            body,
        };
        let set_cookies = parse_set_cookies(response.header_values("set-cookie"));
        if !set_cookies.is_empty() {
            self.cookies.store(set_cookies);
        }
        Ok(response)
    }
}
