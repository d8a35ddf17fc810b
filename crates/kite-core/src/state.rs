//! Health states and daemon editions.
//!
//! States are totally ordered by how far the daemon is from being usable.
//! Reaching a state implies every lower state's precondition holds:
//!
//! ```text
//! Unsupported < Uninstalled < NotRunning < Unreachable < Unlogged < NotWhitelisted < Ready
//! ```

use serde::{Deserialize, Serialize};

/// Readiness of the Kite daemon, from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum HealthState {
    /// The running operating system cannot host the daemon.
    Unsupported = 0,
    /// No installation was found.
    Uninstalled = 1,
    /// Installed, but no daemon process is alive.
    NotRunning = 2,
    /// The process is alive but does not answer on the network.
    Unreachable = 3,
    /// The daemon answers but no user is logged in.
    Unlogged = 4,
    /// A logged-in user asked for a path the daemon may not operate on.
    NotWhitelisted = 5,
    /// The daemon is reachable and a user is authenticated.
    Ready = 6,
}

impl HealthState {
    /// Legacy alias: an installed daemon is, at best, not running yet.
    pub const INSTALLED: Self = Self::NotRunning;
    /// Legacy alias: a running daemon is, at best, not reachable yet.
    pub const RUNNING: Self = Self::Unreachable;
    /// Legacy alias: a reachable daemon still needs a login.
    pub const REACHABLE: Self = Self::Unlogged;
    /// Alias used by the authentication stage.
    pub const AUTHENTICATED: Self = Self::Ready;

    /// All states in ascending order.
    pub const ALL: [Self; 7] = [
        Self::Unsupported,
        Self::Uninstalled,
        Self::NotRunning,
        Self::Unreachable,
        Self::Unlogged,
        Self::NotWhitelisted,
        Self::Ready,
    ];

    /// Returns the numeric ordinal of the state.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Looks up a state from its ordinal.
    #[must_use]
    pub const fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Unsupported),
            1 => Some(Self::Uninstalled),
            2 => Some(Self::NotRunning),
            3 => Some(Self::Unreachable),
            4 => Some(Self::Unlogged),
            5 => Some(Self::NotWhitelisted),
            6 => Some(Self::Ready),
            _ => None,
        }
    }

    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unsupported => "UNSUPPORTED",
            Self::Uninstalled => "UNINSTALLED",
            Self::NotRunning => "NOT_RUNNING",
            Self::Unreachable => "UNREACHABLE",
            Self::Unlogged => "UNLOGGED",
            Self::NotWhitelisted => "NOT_WHITELISTED",
            Self::Ready => "READY",
        }
    }

    /// Returns true if the daemon is fully usable.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns true if the daemon process answers on the network.
    #[must_use]
    pub fn is_reachable(self) -> bool {
        self >= Self::REACHABLE
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Kite distribution tracked by a separate install/run check pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    /// The community (default) edition.
    #[default]
    Community,
    /// The enterprise edition, installed alongside the community one.
    Enterprise,
}

impl Edition {
    /// Both editions, community first.
    pub const ALL: [Self; 2] = [Self::Community, Self::Enterprise];

    /// Returns the edition name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Community => "community",
            Self::Enterprise => "enterprise",
        }
    }
}

impl std::fmt::Display for Edition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
