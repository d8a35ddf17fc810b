//! Declarative description of a simulated daemon.
//!
//! A [`KiteSetup`] only needs the most advanced fact about the daemon:
//! mentioning reachability at all implies it is running, mentioning
//! running implies it is installed, and so on down to supported.
//! [`KiteSetup::resolve`] fills in the implied facts and then clears the
//! ones that would be illegal (nothing can be installed on an unsupported
//! host, nothing stopped can be reachable).

use std::fmt;

/// Partial description of the simulated daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KiteSetup {
    supported: Option<bool>,
    installed: Option<bool>,
    running: Option<bool>,
    installed_enterprise: Option<bool>,
    running_enterprise: Option<bool>,
    reachable: Option<bool>,
    authenticated: Option<bool>,
    admin: bool,
    can_download: bool,
}

macro_rules! setup_flag {
    ($(#[$doc:meta] $name:ident),* $(,)?) => {
        $(
            #[$doc]
            #[must_use]
            pub const fn $name(mut self, value: bool) -> Self {
                self.$name = Some(value);
                self
            }
        )*
    };
}

impl KiteSetup {
    /// Creates an empty setup: an unsupported host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    setup_flag! {
        /// Sets whether the host is supported.
        supported,
        /// Sets whether the community edition is installed.
        installed,
        /// Sets whether the community edition is running.
        running,
        /// Sets whether the enterprise edition is installed.
        installed_enterprise,
        /// Sets whether the enterprise edition is running.
        running_enterprise,
        /// Sets whether the daemon answers HTTP.
        reachable,
        /// Sets whether a user is logged in.
        authenticated,
    }

    /// Sets whether the user has administrator rights.
    #[must_use]
    pub const fn admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    /// Sets whether downloads succeed.
    #[must_use]
    pub const fn can_download(mut self, can_download: bool) -> Self {
        self.can_download = can_download;
        self
    }

    /// Fills in implied facts and removes contradictory ones.
    #[must_use]
    pub fn resolve(&self) -> KiteState {
        let defined = |flag: Option<bool>| flag.map(|_| true);
        let running = self.running.or(defined(self.reachable));
        let installed = self.installed.or(defined(running));
        let installed_enterprise = self.installed_enterprise.or(defined(self.running_enterprise));
        let supported = self
            .supported
            .or(defined(installed))
            .or(defined(installed_enterprise));

        let supported = supported.unwrap_or(false);
        let installed = supported && installed.unwrap_or(false);
        let installed_enterprise = supported && installed_enterprise.unwrap_or(false);
        let running = installed && running.unwrap_or(false);
        let running_enterprise = installed_enterprise && self.running_enterprise.unwrap_or(false);
        let reachable = (running || running_enterprise) && self.reachable.unwrap_or(false);

        KiteState {
            supported,
            installed,
            running,
            installed_enterprise,
            running_enterprise,
            reachable,
            logged_in: self.authenticated.unwrap_or(true),
            admin: self.admin,
            can_download: self.can_download,
        }
    }
}

/// Fully resolved state of the simulated daemon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct KiteState {
    /// The host is supported.
    pub supported: bool,
    /// The community edition is installed.
    pub installed: bool,
    /// The community edition is running.
    pub running: bool,
    /// The enterprise edition is installed.
    pub installed_enterprise: bool,
    /// The enterprise edition is running.
    pub running_enterprise: bool,
    /// The daemon answers HTTP.
    pub reachable: bool,
    /// A user session exists. It is only observable while reachable.
    pub logged_in: bool,
    /// The user has administrator rights.
    pub admin: bool,
    /// Downloads succeed.
    pub can_download: bool,
}

impl KiteState {
    /// Returns true if either edition is installed.
    #[must_use]
    pub const fn any_installed(&self) -> bool {
        self.installed || self.installed_enterprise
    }

    /// Returns true if either edition is running.
    #[must_use]
    pub const fn any_running(&self) -> bool {
        self.running || self.running_enterprise
    }

    /// Returns true if the daemon would report a logged-in user.
    #[must_use]
    pub const fn authenticated(&self) -> bool {
        self.reachable && self.logged_in
    }
}

impl fmt::Display for KiteState {
    /// Short description, e.g. `with kite supported and not installed`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reachable {
            return f.write_str("with kite reachable");
        }
        if self.any_running() {
            return f.write_str("with kite running");
        }
        if self.any_installed() {
            return f.write_str("with kite installed");
        }
        if self.supported {
            f.write_str("with kite supported and not installed")
        } else {
            f.write_str("with kite not supported")
        }
    }
}
