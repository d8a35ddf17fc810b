//! Error types for kite-core.
//!
//! Every failure surfaced by the connector is a [`KiteError`]. The
//! [`ErrorKind`] discriminant separates expected state errors, which only
//! `check_health` turns into a value, from unexpected status and process
//! errors that always propagate.

use crate::client::Response;
use crate::state::HealthState;

/// Result type alias for connector operations.
pub type Result<T> = std::result::Result<T, KiteError>;

/// Coarse classification of a [`KiteError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A health precondition is not met.
    BadState,
    /// The daemon or a download server answered with an unexpected status.
    BadStatus,
    /// A subprocess or filesystem operation failed.
    ProcessError,
}

impl ErrorKind {
    /// Returns the wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadState => "bad_state",
            Self::BadStatus => "bad_status",
            Self::ProcessError => "process_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Captured outcome of a failed subprocess.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (cmd: {cmd})")]
pub struct ProcessFailure {
    /// Short machine-readable tag, e.g. `hdiutil_attach_error`.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
    /// Command line that was executed.
    pub cmd: String,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ProcessFailure {
    /// Creates a failure with empty output buffers.
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            cmd: cmd.into(),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Attaches captured output.
    #[must_use]
    pub fn with_output(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self.stderr = stderr.into();
        self
    }
}

/// Comprehensive error type for connector operations.
#[derive(Debug, thiserror::Error)]
pub enum KiteError {
    /// A health precondition failed.
    #[error("kite is {state}: {message}")]
    BadState {
        /// The state the daemon was found in.
        state: HealthState,
        /// Description of the failed check.
        message: String,
    },

    /// The daemon answered with an unexpected HTTP status.
    #[error("bad status {status}{}", .content.as_deref().map(|c| format!(": {c}")).unwrap_or_default())]
    BadStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, if it was read.
        content: Option<String>,
        /// Full response snapshot.
        response: Option<Box<Response>>,
    },

    /// A download or other outbound request failed.
    #[error("request failed: {message}")]
    Request {
        /// Description of the failure.
        message: String,
        /// HTTP status code when a response was received.
        status: Option<u16>,
    },

    /// A subprocess exited unsuccessfully or could not be spawned.
    #[error("process error: {0}")]
    Process(#[from] ProcessFailure),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KiteError {
    /// Creates a state error.
    #[must_use]
    pub fn bad_state(state: HealthState, message: impl Into<String>) -> Self {
        Self::BadState {
            state,
            message: message.into(),
        }
    }

    /// Creates a status error without a response snapshot.
    #[must_use]
    pub const fn bad_status(status: u16, content: Option<String>) -> Self {
        Self::BadStatus {
            status,
            content,
            response: None,
        }
    }

    /// Creates a status error from a received response, keeping its body
    /// as content.
    #[must_use]
    pub fn from_response(response: Response) -> Self {
        Self::BadStatus {
            status: response.status_code,
            content: Some(response.text()),
            response: Some(Box::new(response)),
        }
    }

    /// Creates a request error.
    #[must_use]
    pub fn request(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Request {
            message: message.into(),
            status,
        }
    }

    /// Creates a process error.
    #[must_use]
    pub fn process(kind: impl Into<String>, message: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self::Process(ProcessFailure::new(kind, message, cmd))
    }

    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::BadState { .. } => ErrorKind::BadState,
            Self::BadStatus { .. } | Self::Request { .. } => ErrorKind::BadStatus,
            Self::Process(_) | Self::Io(_) => ErrorKind::ProcessError,
        }
    }

    /// Returns true if this is a state error.
    #[must_use]
    pub const fn is_bad_state(&self) -> bool {
        matches!(self, Self::BadState { .. })
    }

    /// Returns the carried health state, if any.
    #[must_use]
    pub const fn state(&self) -> Option<HealthState> {
        match self {
            Self::BadState { state, .. } => Some(*state),
            _ => None,
        }
    }

    /// Returns the carried HTTP status, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::BadStatus { status, .. } => Some(*status),
            Self::Request { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns the response body carried by a status error.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::BadStatus { content, .. } => content.as_deref(),
            _ => None,
        }
    }
}
