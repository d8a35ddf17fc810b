//! Routed in-memory transport.
//!
//! Routes are `(matcher, handler)` pairs tried in order; the first matcher
//! that accepts the request produces the answer. [`TestClient::add_route`]
//! puts a route in front of the existing ones, so later routes override
//! earlier ones. A catch-all 404 route is always last.

use async_trait::async_trait;
use kite_core::{KiteClient, Method, RequestOptions, Response, TransportError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

type Matcher = Arc<dyn Fn(&RequestOptions) -> bool + Send + Sync>;
type Handler = Arc<dyn Fn(&RequestOptions, Option<&[u8]>) -> Result<Response, TransportError> + Send + Sync>;

/// Builds a response with `status` and a text body.
#[must_use]
pub fn fake_response(status: u16, body: &str) -> Response {
    Response::new(status, body.as_bytes().to_vec())
}

/// A request seen by [`TestClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Method and path.
    pub options: RequestOptions,
    /// Request body.
    pub body: Option<Vec<u8>>,
    /// Requested timeout.
    pub timeout: Option<Duration>,
}

/// Transport that answers from a route table and records every request.
pub struct TestClient {
    routes: Mutex<Vec<(Matcher, Handler)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClient {
    /// Creates a client that answers 404 to everything.
    #[must_use]
    pub fn new() -> Self {
        let client = Self {
            routes: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        };
        client.append_route(|_| true, |_, _| Ok(fake_response(404, "not found")));
        client
    }

    /// Adds a route in front of the existing ones.
    pub fn add_route<M, H>(&self, matcher: M, handler: H)
    where
        M: Fn(&RequestOptions) -> bool + Send + Sync + 'static,
        H: Fn(&RequestOptions, Option<&[u8]>) -> Result<Response, TransportError> + Send + Sync + 'static,
    {
        self.routes.lock().insert(0, (Arc::new(matcher), Arc::new(handler)));
    }

    /// Adds a route behind the existing ones.
    pub fn append_route<M, H>(&self, matcher: M, handler: H)
    where
        M: Fn(&RequestOptions) -> bool + Send + Sync + 'static,
        H: Fn(&RequestOptions, Option<&[u8]>) -> Result<Response, TransportError> + Send + Sync + 'static,
    {
        self.routes.lock().push((Arc::new(matcher), Arc::new(handler)));
    }

    /// Answers `method path` with a fixed response.
    pub fn route(&self, method: Method, path: &str, response: Response) {
        let path = path.to_string();
        self.add_route(
            move |o| o.method == method && o.path == path,
            move |_, _| Ok(response.clone()),
        );
    }

    /// Answers `GET path` with `status` and `body`.
    pub fn route_get(&self, path: &str, status: u16, body: &str) {
        self.route(Method::Get, path, fake_response(status, body));
    }

    /// Fails every request with a connection error.
    pub fn refuse_all(&self) {
        self.add_route(
            |_| true,
            |o, _| Err(TransportError::Connect(format!("connection refused: {}", o.path))),
        );
    }

    /// Returns every request seen so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Returns how many requests were made to `path`.
    #[must_use]
    pub fn request_count(&self, path: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.options.path == path).count()
    }

    /// Forgets recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    fn handler_for(&self, options: &RequestOptions) -> Option<Handler> {
        self.routes
            .lock()
            .iter()
            .find(|(matcher, _)| matcher(options))
            .map(|(_, handler)| Arc::clone(handler))
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("routes", &self.routes.lock().len())
            .field("requests", &self.requests.lock().len())
            .finish()
    }
}

#[async_trait]
impl KiteClient for TestClient {
    async fn request(
        &self,
        options: &RequestOptions,
        body: Option<&[u8]>,
        timeout: Option<Duration>,
    ) -> Result<Response, TransportError> {
        self.requests.lock().push(RecordedRequest {
            options: options.clone(),
            body: body.map(<[u8]>::to_vec),
            timeout,
        });
        // The route lock is released before the handler runs, so handlers
        // may add routes.
        match self.handler_for(options) {
            Some(handler) => handler(options, body),
            None => Ok(fake_response(404, "not found")),
        }
    }
}
