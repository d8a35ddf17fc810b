//! Connector test harness.

use kite_core::{ConnectorConfig, KiteConnector, Method, TransportError};
use std::sync::Arc;

use crate::adapter::TestAdapter;
use crate::client::{TestClient, fake_response};
use crate::setup::{KiteSetup, KiteState};

/// Body returned by the simulated user endpoint.
pub const TEST_USER: &str = r#"{"id":1,"name":"kite"}"#;

/// A connector wired to a [`TestAdapter`] and a [`TestClient`].
///
/// Reachability and authentication are read from the adapter's state on
/// every request, so `update_state` on the adapter is enough to simulate the
/// daemon coming up or a user logging out.
#[derive(Debug)]
pub struct KiteTestHarness {
    /// The connector under test.
    pub connector: KiteConnector,
    /// The adapter it holds.
    pub adapter: Arc<TestAdapter>,
    /// The transport it holds.
    pub client: Arc<TestClient>,
}

impl KiteTestHarness {
    /// Builds a harness for `setup` with the default connector settings.
    #[must_use]
    pub fn new(setup: &KiteSetup) -> Self {
        Self::with_config(setup, ConnectorConfig::default())
    }

    /// Builds a harness for `setup` using the probe paths from `config`.
    #[must_use]
    pub fn with_config(setup: &KiteSetup, config: ConnectorConfig) -> Self {
        let adapter = Arc::new(TestAdapter::new(setup));
        let client = Arc::new(TestClient::new());
        install_daemon_routes(&client, &adapter, &config);

        let connector = KiteConnector::new(adapter.clone(), client.clone()).with_config(config);
        tracing::debug!(state = %adapter.state(), "test harness ready");
        Self {
            connector,
            adapter,
            client,
        }
    }

    /// Returns the adapter's current state.
    #[must_use]
    pub fn state(&self) -> KiteState {
        self.adapter.state()
    }
}

/// Builds a harness for `setup`.
#[must_use]
pub fn with_kite(setup: KiteSetup) -> KiteTestHarness {
    KiteTestHarness::new(&setup)
}

fn install_daemon_routes(client: &TestClient, adapter: &Arc<TestAdapter>, config: &ConnectorConfig) {
    client.route_get(&config.health_path, 200, "");

    let user_path = config.user_path.clone();
    let auth = Arc::clone(adapter);
    client.add_route(
        move |o| o.method == Method::Get && o.path == user_path,
        move |_, _| {
            if auth.state().authenticated() {
                Ok(fake_response(200, TEST_USER))
            } else {
                Ok(fake_response(401, "unauthorized"))
            }
        },
    );

    let reach = Arc::clone(adapter);
    client.add_route(
        move |_| !reach.state().reachable,
        |o, _| Err(TransportError::Connect(format!("kite is not reachable: {}", o.path))),
    );
}
