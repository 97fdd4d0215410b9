//! The request collaborator a session reads from and logs through.

use http::HeaderMap;
use http::header::COOKIE;
use tracing::Level;

/// What a session needs from the host request.
pub trait RequestContext {
    /// Raw incoming `Cookie` header, if the request carried one.
    fn cookie_header(&self) -> Option<&str>;

    /// Key used to derive the cookie keystream.
    fn secret(&self) -> &[u8];

    /// Leveled diagnostic channel. Forwards to `tracing` unless overridden.
    fn log(&self, level: Level, message: &str) {
        if level == Level::ERROR {
            tracing::error!("{message}");
        } else if level == Level::WARN {
            tracing::warn!("{message}");
        } else if level == Level::INFO {
            tracing::info!("{message}");
        } else if level == Level::DEBUG {
            tracing::debug!("{message}");
        } else {
            tracing::trace!("{message}");
        }
    }
}

/// Context over an `http` header map.
///
/// HTTP/2 may split cookies across several `Cookie` headers; they are joined
/// with `"; "` as RFC 9113 prescribes.
#[derive(Debug, Clone)]
pub struct HttpRequestContext<'a> {
    cookie: Option<String>,
    secret: &'a [u8],
}

impl<'a> HttpRequestContext<'a> {
    pub fn new(headers: &HeaderMap, secret: &'a [u8]) -> Self {
        let parts: Vec<&str> = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        let cookie = (!parts.is_empty()).then(|| parts.join("; "));
        Self { cookie, secret }
    }
}

impl RequestContext for HttpRequestContext<'_> {
    fn cookie_header(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    fn secret(&self) -> &[u8] {
        self.secret
    }
}

/// Owned context, handy for tools and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    cookie_header: Option<String>,
    secret: Vec<u8>,
}

impl StaticContext {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            cookie_header: None,
            secret: secret.into(),
        }
    }

    /// Set the incoming `Cookie` header.
    pub fn with_cookie_header(mut self, header: impl Into<String>) -> Self {
        self.cookie_header = Some(header.into());
        self
    }
}

impl RequestContext for StaticContext {
    fn cookie_header(&self) -> Option<&str> {
        self.cookie_header.as_deref()
    }

    fn secret(&self) -> &[u8] {
        &self.secret
    }
}
