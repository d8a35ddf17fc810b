//! Request debug mode.

use super::{KiteClient, RequestOptions, Response, TransportError};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::debug;

/// Wraps a transport and logs every request and its outcome at `debug`.
#[derive(Debug, Clone)]
pub struct TracingClient<C> {
    inner: C,
}

impl<C> TracingClient<C> {
    /// Wraps `inner`.
    pub const fn new(inner: C) -> Self {
        Self { inner }
    }

    /// Returns the wrapped transport.
    pub const fn inner(&self) -> &C {
        &self.inner
    }

    /// Unwraps the transport.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

#[async_trait]
impl<C: KiteClient> KiteClient for TracingClient<C> {
    async fn request(
        &self,
        options: &RequestOptions,
        body: Option<&[u8]>,
        timeout: Option<Duration>,
    ) -> Result<Response, TransportError> {
        debug!(
            method = %options.method,
            path = %options.path,
            body_len = body.map_or(0, <[u8]>::len),
            ?timeout,
            "kite request"
        );
        let started = Instant::now();
        let result = self.inner.request(options, body, timeout).await;
        let elapsed = started.elapsed();
        match &result {
            Ok(response) => debug!(
                path = %options.path,
                status = response.status_code,
                ?elapsed,
                body = %response.text(),
                "kite response"
            ),
            Err(e) => debug!(path = %options.path, ?elapsed, error = %e, "kite request failed"),
        }
        result
    }
}
