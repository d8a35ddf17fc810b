//! Session cookies set by the daemon.

use parking_lot::Mutex;
use std::sync::Arc;

/// A cookie parsed from a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// `Path` attribute.
    pub path: String,
    /// `Domain` attribute.
    pub domain: String,
    /// Raw `Expires` attribute.
    pub expires: Option<String>,
    /// `Max-Age` attribute, 0 when absent or malformed.
    pub max_age: i64,
    /// `Secure` flag.
    pub secure: bool,
    /// `HttpOnly` flag.
    pub http_only: bool,
}

impl Cookie {
    /// Parses one `Set-Cookie` header value.
    ///
    /// Unknown attributes are taken as the name/value pair, so the last
    /// unknown `key=value` segment wins.
    #[must_use]
    pub fn parse(header: &str) -> Self {
        let mut cookie = Self::default();
        for segment in header.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            if segment.eq_ignore_ascii_case("HttpOnly") {
                cookie.http_only = true;
                continue;
            }
            if segment.eq_ignore_ascii_case("Secure") {
                cookie.secure = true;
                continue;
            }
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            match key.to_ascii_lowercase().as_str() {
                "path" => cookie.path = value.to_string(),
                "domain" => cookie.domain = value.to_string(),
                "expires" => cookie.expires = Some(value.to_string()),
                "max-age" | "maxage" => cookie.max_age = value.parse().unwrap_or(0),
                _ => {
                    cookie.name = key.to_string();
                    cookie.value = value.to_string();
                }
            }
        }
        cookie
    }
}

/// Parses every `Set-Cookie` header value.
pub fn parse_set_cookies<'a>(headers: impl IntoIterator<Item = &'a str>) -> Vec<Cookie> {
    headers.into_iter().map(Cookie::parse).collect()
}

/// Finds the first cookie named `name`.
#[must_use]
pub fn find_cookie<'a>(cookies: &'a [Cookie], name: &str) -> Option<&'a Cookie> {
    cookies.iter().find(|c| c.name == name)
}

/// Serializes cookies as a `Cookie` request header value.
#[must_use]
pub fn dump_cookies(cookies: &[Cookie]) -> String {
    cookies
        .iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Shared cookie store, last write wins per cookie name.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    inner: Arc<Mutex<Vec<Cookie>>>,
}

impl CookieJar {
    /// Creates an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores cookies, replacing any existing cookie with the same name.
    pub fn store(&self, cookies: impl IntoIterator<Item = Cookie>) {
        let mut jar = self.inner.lock();
        for cookie in cookies {
            if let Some(existing) = jar.iter_mut().find(|c| c.name == cookie.name) {
                *existing = cookie;
            } else {
                jar.push(cookie);
            }
        }
    }

    /// Returns a copy of every stored cookie.
    #[must_use]
    pub fn cookies(&self) -> Vec<Cookie> {
        self.inner.lock().clone()
    }

    /// Returns the `Cookie` header value, or `None` when empty.
    #[must_use]
    pub fn header(&self) -> Option<String> {
        let jar = self.inner.lock();
        if jar.is_empty() {
            None
        } else {
            Some(dump_cookies(&jar))
        }
    }

    /// Removes every cookie.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}
