//! Cookie header parsing and `Set-Cookie` rendering.

use chrono::{DateTime, Utc};
use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

/// Header name used for outgoing cookies.
pub const SET_COOKIE: &str = "Set-Cookie";

/// A `(header name, header value)` pair ready for the response layer.
pub type HeaderPair = (String, String);

/// Split an incoming `Cookie` header into `(name, value)` pairs.
///
/// Pairs without `=` or with an empty name are skipped. One layer of
/// surrounding double quotes is stripped from values.
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

/// Find the first cookie called `name` in an incoming `Cookie` header.
pub fn find_cookie(header: &str, name: &str) -> Option<String> {
    parse_cookie_header(header)
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Split a rendered header line at its first `:`.
pub fn parse_header_line(line: &str) -> Option<HeaderPair> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

/// The cookie a session sends back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    /// Relative lifetime in seconds; `-1` tells the client to drop the cookie.
    pub expires: Option<i64>,
}

impl OutgoingCookie {
    /// Empty-valued cookie with no expiry.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            path: path.into(),
            expires: None,
        }
    }

    /// Header value without the `Set-Cookie:` prefix.
    ///
    /// `now` (epoch seconds) anchors the absolute `expires` date.
    pub fn header_value(&self, now: i64) -> String {
        let mut out = format!("{}={}; Path={}", self.name, self.value, self.path);
        if let Some(secs) = self.expires {
            let (max_age, at) = if secs < 0 {
                (0, 0)
            } else {
                (secs, now.saturating_add(secs))
            };
            out.push_str(&format!("; Max-Age={max_age}; expires={}", http_date(at)));
        }
        out
    }

    /// Full `Set-Cookie: ...` line.
    pub fn render(&self, now: i64) -> String {
        format!("{SET_COOKIE}: {}", self.header_value(now))
    }
}

/// Render several cookies as CRLF-separated header lines.
pub fn render_cookies(cookies: &[OutgoingCookie], now: i64) -> String {
    cookies
        .iter()
        .map(|c| c.render(now))
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// IMF-fixdate, e.g. `Thu, 01 Jan 1970 00:00:00 GMT`.
fn http_date(epoch_secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch_secs, 0)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Destination for outgoing response headers.
pub trait HeaderSink {
    fn add(&mut self, name: &str, value: &str);
}

impl HeaderSink for Vec<HeaderPair> {
    fn add(&mut self, name: &str, value: &str) {
        self.push((name.to_string(), value.to_string()));
    }
}

impl HeaderSink for HeaderMap {
    fn add(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.append(name, value);
            }
            _ => warn!(header = %name, "Dropping header that is not valid HTTP"),
        }
    }
}
