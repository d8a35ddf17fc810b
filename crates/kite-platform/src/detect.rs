//! Host detection.
//!
//! The platform itself is fixed at compile time; everything else (kernel
//! release, home directory, group membership) is read from the running
//! host.

use std::path::PathBuf;

pub use kite_core::{Platform, detect_platform};

/// Returns the current user's home directory.
#[must_use]
pub fn home_dir() -> Option<PathBuf> {
    dirs_next::home_dir()
}

/// Returns `~/.kite/<name>`, the daemon's per-user data location.
#[must_use]
pub fn kite_home_file(name: &str) -> Option<PathBuf> {
    home_dir().map(|home| home.join(".kite").join(name))
}

/// Returns the kernel release string, e.g. `23.1.0` on macOS.
#[cfg(unix)]
#[must_use]
pub fn os_release() -> Option<String> {
    nix::sys::utsname::uname()
        .ok()
        .map(|uts| uts.release().to_string_lossy().into_owned())
}

/// Returns the kernel release string.
#[cfg(not(unix))]
#[must_use]
pub fn os_release() -> Option<String> {
    None
}

/// Parses the leading `major.minor` number out of a version string.
///
/// Leading non-digits are skipped and anything after the second component
/// is ignored, so `"Release:\t18.04"` is `18.04` and `"10.0.19045"` is `10.0`.
#[must_use]
pub fn parse_version(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let tail = &text[start..];
    let end = tail
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(tail.len());
    let mut parts = tail[..end].split('.').filter(|p| !p.is_empty());
    let major = parts.next()?;
    match parts.next() {
        Some(minor) => format!("{major}.{minor}").parse().ok(),
        None => major.parse().ok(),
    }
}

/// Returns true if the current user is root or a member of any of `groups`.
#[cfg(unix)]
#[must_use]
pub fn user_in_groups(groups: &[&str]) -> bool {
    use nix::unistd::{Group, User, getuid};

    let uid = getuid();
    if uid.is_root() {
        return true;
    }
    let Ok(Some(user)) = User::from_uid(uid) else {
        return false;
    };
    groups.iter().any(|name| match Group::from_name(name) {
        Ok(Some(group)) => group.gid == user.gid || group.mem.iter().any(|m| *m == user.name),
        _ => false,
    })
}

/// Returns true if the current user is a member of any of `groups`.
#[cfg(not(unix))]
#[must_use]
pub fn user_in_groups(_groups: &[&str]) -> bool {
    false
}
