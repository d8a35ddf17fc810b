//! Operating systems the daemon can be managed on.

use serde::{Deserialize, Serialize};

/// Host operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// macOS.
    MacOS,
    /// Windows.
    Windows,
    /// Linux.
    Linux,
    /// Any other operating system.
    Unsupported,
}

impl Platform {
    /// Returns the platform name as a static string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MacOS => "macos",
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Unsupported => "unsupported",
        }
    }

    /// Returns true if a dedicated adapter exists for this platform.
    #[must_use]
    pub const fn has_adapter(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    /// Returns true if the enterprise edition ships for this platform.
    #[must_use]
    pub const fn supports_enterprise(&self) -> bool {
        matches!(self, Self::MacOS)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detects the platform this binary was built for.
#[must_use]
pub const fn detect_platform() -> Platform {
    if cfg!(target_os = "macos") {
        Platform::MacOS
    } else if cfg!(target_os = "windows") {
        Platform::Windows
    } else if cfg!(target_os = "linux") {
        Platform::Linux
    } else {
        Platform::Unsupported
    }
}
