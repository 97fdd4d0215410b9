//! Per-request session lifecycle.
//!
//! A [`Session`] is loaded from the incoming cookie (or a fallback raw value),
//! mutated by request handling, and written back as a `Set-Cookie` header.
//! Nothing here fails: broken or expired cookies start an empty session.

use serde::Serialize;
use serde_json::Value;
use tracing::Level;

use crate::clock::{Clock, SystemClock};
use crate::codec::SessionCodec;
use crate::config::SessionConfig;
use crate::context::RequestContext;
use crate::cookie::{self, HeaderPair, HeaderSink, OutgoingCookie};
use crate::data::{DESTROYED, SessionData};
use crate::error::Result;

/// Where a session is in its single-request life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Freshly loaded; data is untouched.
    Loaded,
    /// Data was edited, renewed or destroyed.
    Mutated,
    /// Cookie value was computed by `write` or `header`.
    Finalized,
}

/// Cookie-backed session owned by one request.
#[derive(Debug)]
pub struct Session<C: Clock = SystemClock> {
    config: SessionConfig,
    data: SessionData,
    cookie: OutgoingCookie,
    state: SessionState,
    clock: C,
}

impl Session<SystemClock> {
    /// Load the session from the request's `Cookie` header.
    pub fn load(ctx: &impl RequestContext, config: SessionConfig) -> Self {
        Self::load_with_clock(ctx, config, None, SystemClock)
    }

    /// Load the session, using `fallback` when the request has no `Cookie` header.
    pub fn load_with_fallback(
        ctx: &impl RequestContext,
        config: SessionConfig,
        fallback: Option<&str>,
    ) -> Self {
        Self::load_with_clock(ctx, config, fallback, SystemClock)
    }
}

impl<C: Clock> Session<C> {
    /// Load the session with an explicit time source.
    ///
    /// A config that fails [`SessionConfig::validate`] is logged at error level
    /// and replaced by the defaults, so the outgoing header stays one line.
    pub fn load_with_clock(
        ctx: &impl RequestContext,
        config: SessionConfig,
        fallback: Option<&str>,
        clock: C,
    ) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                ctx.log(
                    Level::ERROR,
                    &format!("Unusable session config, using defaults: {e}"),
                );
                SessionConfig::default()
            }
        };

        let raw = match ctx.cookie_header() {
            Some(header) => cookie::find_cookie(header, &config.cookie_name),
            None => fallback.map(str::to_owned),
        }
        .filter(|raw| !raw.is_empty());

        let mut data = SessionData::new();
        if let Some(raw) = raw {
            data = SessionCodec::new(ctx.secret())
                .try_decode(&raw)
                .unwrap_or_else(|e| {
                    ctx.log(Level::ERROR, &format!("Bad session data: {e}"));
                    SessionData::new()
                });

            let now = clock.now();
            if data.is_expired_at(now) {
                ctx.log(Level::INFO, "Session was expired, generating new.");
                tracing::debug!(
                    cookie_name = %config.cookie_name,
                    expires = ?data.expires(),
                    now,
                    "Discarding expired session"
                );
                data = SessionData::new();
            }
        }

        ctx.log(
            Level::DEBUG,
            &format!("Loaded session '{}' with {} keys", config.cookie_name, data.len()),
        );

        let cookie = OutgoingCookie::new(&config.cookie_name, &config.path);
        Self {
            config,
            data,
            cookie,
            state: SessionState::Loaded,
            clock,
        }
    }

    /// Effective config (defaults if the supplied one was invalid).
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Session data.
    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Mutable session data; marks the session as mutated.
    pub fn data_mut(&mut self) -> &mut SessionData {
        self.touch();
        &mut self.data
    }

    /// The cookie that `write` fills in.
    pub fn cookie(&self) -> &OutgoingCookie {
        &self.cookie
    }

    /// Look up an application value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Store a value; `expires` must be an integer.
    pub fn insert<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) -> Result<Option<Value>> {
        self.data_mut().insert(key, value)
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data_mut().remove(key)
    }

    /// Push the expiry forward by the configured lifetime, or drop it when
    /// no lifetime is configured. Renewing a destroyed session revives it.
    pub fn renew(&mut self) {
        self.touch();
        if self.cookie.expires == Some(DESTROYED) {
            self.cookie.expires = None;
        }
        match self.config.lifetime() {
            Some(lifetime) => self.data.set_expires(self.clock.now().saturating_add(lifetime)),
            None => {
                self.data.clear_expires();
            }
        }
    }

    /// Mark the session for deletion on the client.
    pub fn destroy(&mut self) {
        self.touch();
        self.data = SessionData::destroyed();
        self.cookie.expires = Some(DESTROYED);
    }

    /// Encode the data into the outgoing cookie and return the raw value.
    ///
    /// With a lifetime configured, the absolute expiry is refreshed first.
    /// A destroyed session keeps its `-1` expiry. Encoding failures are
    /// logged and produce an empty cookie value.
    pub fn write(&mut self, ctx: &impl RequestContext) -> String {
        if let Some(lifetime) = self.config.lifetime()
            && !self.data.is_destroyed()
        {
            self.data.set_expires(self.clock.now().saturating_add(lifetime));
            self.cookie.expires = Some(lifetime);
        }

        let raw = SessionCodec::new(ctx.secret())
            .encode(&self.data)
            .unwrap_or_else(|e| {
                ctx.log(Level::ERROR, &format!("Failed to encode session: {e}"));
                String::new()
            });

        self.cookie.value = raw.clone();
        self.cookie.path = self.config.path.clone();
        self.state = SessionState::Finalized;

        ctx.log(
            Level::DEBUG,
            &format!("Wrote session '{}' ({} bytes)", self.config.cookie_name, raw.len()),
        );
        raw
    }

    /// Write the session and return its `Set-Cookie` header pairs,
    /// also appending them to `sink` when given.
    pub fn header(
        &mut self,
        ctx: &impl RequestContext,
        mut sink: Option<&mut dyn HeaderSink>,
    ) -> Vec<HeaderPair> {
        self.write(ctx);

        let now = self.clock.now();
        let rendered = cookie::render_cookies(std::slice::from_ref(&self.cookie), now);
        let mut pairs = Vec::new();
        for line in rendered.split("\r\n") {
            let Some((name, value)) = cookie::parse_header_line(line) else {
                continue;
            };
            if let Some(sink) = sink.as_mut() {
                sink.add(&name, &value);
            }
            pairs.push((name, value));
        }
        pairs
    }

    fn touch(&mut self) {
        if self.state == SessionState::Loaded {
            self.state = SessionState::Mutated;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::codec;
    use crate::context::StaticContext;
    use serde_json::json;
    use std::cell::RefCell;

    const NOW: i64 = 1_700_000_000;

    /// Context that records diagnostics instead of emitting them.
    #[derive(Default)]
    struct Recorder {
        header: Option<String>,
        logs: RefCell<Vec<(Level, String)>>,
    }

    impl Recorder {
        fn with_cookie(header: impl Into<String>) -> Self {
            Self {
                header: Some(header.into()),
                ..Default::default()
            }
        }

        fn count(&self, level: Level) -> usize {
            self.logs.borrow().iter().filter(|(l, _)| *l == level).count()
        }
    }

    impl RequestContext for Recorder {
        fn cookie_header(&self) -> Option<&str> {
            self.header.as_deref()
        }

        fn secret(&self) -> &[u8] {
            b"s3cr3t"
        }

        fn log(&self, level: Level, message: &str) {
            self.logs.borrow_mut().push((level, message.to_string()));
        }
    }

    fn raw_for(value: serde_json::Value) -> String {
        codec::encode(&SessionData::from_value(value).unwrap(), "s3cr3t").unwrap()
    }

    fn load(ctx: &Recorder, config: SessionConfig, fallback: Option<&str>) -> Session<FixedClock> {
        Session::load_with_clock(ctx, config, fallback, FixedClock::new(NOW))
    }

    #[test]
    fn test_empty_request_starts_empty_without_diagnostics() {
        let ctx = Recorder::default();
        let session = load(&ctx, SessionConfig::default(), None);
        assert!(session.data().is_empty());
        assert_eq!(session.state(), SessionState::Loaded);
        assert_eq!(ctx.count(Level::ERROR), 0);
        assert_eq!(ctx.count(Level::INFO), 0);
    }

    #[test]
    fn test_blank_cookie_header_starts_empty_without_diagnostics() {
        let ctx = Recorder::with_cookie("");
        let session = load(&ctx, SessionConfig::default(), None);
        assert!(session.data().is_empty());
        assert_eq!(ctx.count(Level::ERROR), 0);
        assert_eq!(ctx.count(Level::INFO), 0);
    }

    #[test]
    fn test_invalid_path_falls_back_to_defaults() {
        let ctx = Recorder::default();
        let config = SessionConfig::new().with_path("/\r\nX-Evil: 1");
        let mut session = load(&ctx, config, None);
        assert_eq!(ctx.count(Level::ERROR), 1);
        assert_eq!(session.config(), &SessionConfig::default());

        let pairs = session.header(&ctx, None);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "Set-Cookie");
        assert!(pairs[0].1.ends_with("; Path=/"));
    }

    #[test]
    fn test_invalid_cookie_name_falls_back_to_defaults() {
        let raw = raw_for(json!({"user": "alice"}));
        let ctx = Recorder::with_cookie(format!("SESSID={raw}"));
        let session = load(&ctx, SessionConfig::new().with_cookie_name("a\nb"), None);
        assert_eq!(ctx.count(Level::ERROR), 1);
        assert_eq!(session.config().cookie_name, "SESSID");
        assert_eq!(session.get("user"), Some(&json!("alice")));
    }

    #[test]
    fn test_loads_from_cookie_header() {
        let raw = raw_for(json!({"user": "alice"}));
        let ctx = Recorder::with_cookie(format!("theme=dark; SESSID={raw}"));
        let session = load(&ctx, SessionConfig::default(), None);
        assert_eq!(session.get("user"), Some(&json!("alice")));
    }

    #[test]
    fn test_custom_cookie_name() {
        let raw = raw_for(json!({"user": "bob"}));
        let ctx = Recorder::with_cookie(format!("SESSID=junk; app={raw}"));
        let session = load(&ctx, SessionConfig::new().with_cookie_name("app"), None);
        assert_eq!(session.get("user"), Some(&json!("bob")));
    }

    #[test]
    fn test_loads_from_fallback_without_cookie_header() {
        let raw = raw_for(json!({"user": "carol"}));
        let ctx = Recorder::default();
        let session = load(&ctx, SessionConfig::default(), Some(&raw));
        assert_eq!(session.get("user"), Some(&json!("carol")));
    }

    #[test]
    fn test_cookie_header_takes_precedence_over_fallback() {
        let raw = raw_for(json!({"user": "carol"}));
        let ctx = Recorder::with_cookie("other=1");
        let session = load(&ctx, SessionConfig::default(), Some(&raw));
        assert!(session.data().is_empty());
    }

    #[test]
    fn test_bad_cookie_logs_error_and_starts_empty() {
        let ctx = Recorder::with_cookie("SESSID=%%%garbage%%%");
        let session = load(&ctx, SessionConfig::default(), None);
        assert!(session.data().is_empty());
        assert_eq!(ctx.count(Level::ERROR), 1);
    }

    #[test]
    fn test_expired_session_is_discarded() {
        let raw = raw_for(json!({"user": "alice", "expires": NOW - 10}));
        let ctx = Recorder::with_cookie(format!("SESSID={raw}"));
        let session = load(&ctx, SessionConfig::default(), None);
        assert!(session.data().is_empty());
        assert_eq!(ctx.count(Level::INFO), 1);
        assert_eq!(ctx.count(Level::ERROR), 0);
    }

    #[test]
    fn test_expiry_equal_to_now_is_kept() {
        let raw = raw_for(json!({"user": "alice", "expires": NOW}));
        let ctx = Recorder::with_cookie(format!("SESSID={raw}"));
        let session = load(&ctx, SessionConfig::default(), None);
        assert_eq!(session.data().expires(), Some(NOW));
    }

    #[test]
    fn test_destroyed_cookie_loads_empty() {
        let raw = raw_for(json!({"expires": -1}));
        let ctx = Recorder::with_cookie(format!("SESSID={raw}"));
        let session = load(&ctx, SessionConfig::default(), None);
        assert!(session.data().is_empty());
    }

    #[test]
    fn test_renew_with_lifetime() {
        let ctx = Recorder::default();
        let mut session = load(&ctx, SessionConfig::new().with_expires_secs(600), None);
        session.renew();
        assert_eq!(session.data().expires(), Some(NOW + 600));
        assert_eq!(session.state(), SessionState::Mutated);
    }

    #[test]
    fn test_renew_without_lifetime_drops_expiry() {
        let raw = raw_for(json!({"user": "alice", "expires": NOW + 50}));
        let ctx = Recorder::with_cookie(format!("SESSID={raw}"));
        let mut session = load(&ctx, SessionConfig::default(), None);
        assert!(session.data().contains_key("expires"));

        session.renew();
        assert!(!session.data().contains_key("expires"));
        assert_eq!(session.get("user"), Some(&json!("alice")));
    }

    #[test]
    fn test_destroy() {
        let ctx = Recorder::default();
        let mut session = load(&ctx, SessionConfig::default(), None);
        session.insert("user", "alice").unwrap();
        session.destroy();

        assert_eq!(session.data(), &SessionData::destroyed());
        assert_eq!(session.cookie().expires, Some(-1));
    }

    #[test]
    fn test_destroy_survives_write_with_lifetime() {
        let ctx = Recorder::default();
        let mut session = load(&ctx, SessionConfig::new().with_expires_secs(60), None);
        session.destroy();
        let raw = session.write(&ctx);

        assert_eq!(session.data().expires(), Some(-1));
        assert_eq!(session.cookie().expires, Some(-1));
        assert_eq!(codec::decode(&raw, "s3cr3t"), SessionData::destroyed());
    }

    #[test]
    fn test_renew_revives_destroyed_session() {
        let ctx = Recorder::default();
        let mut session = load(&ctx, SessionConfig::default(), None);
        session.destroy();
        session.renew();
        assert!(session.data().is_empty());
        assert_eq!(session.cookie().expires, None);
    }

    #[test]
    fn test_write_refreshes_expiry() {
        let ctx = Recorder::default();
        let mut session = load(&ctx, SessionConfig::new().with_expires_secs(3600), None);
        session.insert("user", "alice").unwrap();
        let raw = session.write(&ctx);

        assert_eq!(session.data().expires(), Some(NOW + 3600));
        assert_eq!(session.cookie().value, raw);
        assert_eq!(session.cookie().expires, Some(3600));
        assert_eq!(session.state(), SessionState::Finalized);

        let decoded = codec::decode(&raw, "s3cr3t");
        assert_eq!(decoded.expires(), Some(NOW + 3600));
        assert_eq!(decoded.get("user"), Some(&json!("alice")));
    }

    #[test]
    fn test_write_without_lifetime_leaves_cookie_expiry_unset() {
        let ctx = Recorder::default();
        let mut session = load(&ctx, SessionConfig::new().with_path("/app"), None);
        session.write(&ctx);
        assert_eq!(session.cookie().expires, None);
        assert_eq!(session.cookie().path, "/app");
        assert!(session.data().expires().is_none());
    }

    #[test]
    fn test_header_pairs_and_sink() {
        let ctx = Recorder::default();
        let mut session = load(&ctx, SessionConfig::default(), None);
        session.insert("user", "alice").unwrap();

        let mut sink: Vec<HeaderPair> = Vec::new();
        let pairs = session.header(&ctx, Some(&mut sink));

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs, sink);
        let (name, value) = &pairs[0];
        assert_eq!(name, "Set-Cookie");
        assert_eq!(value, &format!("SESSID={}; Path=/", session.cookie().value));
    }

    #[test]
    fn test_header_with_lifetime_carries_expiry() {
        let ctx = Recorder::default();
        let mut session = load(&ctx, SessionConfig::new().with_expires_secs(3600), None);
        let pairs = session.header(&ctx, None);
        assert!(pairs[0].1.contains("; Max-Age=3600; expires="));
    }

    #[test]
    fn test_state_never_returns_to_loaded() {
        let ctx = StaticContext::new("s3cr3t");
        let mut session =
            Session::load_with_clock(&ctx, SessionConfig::default(), None, FixedClock::new(NOW));
        session.write(&ctx);
        session.insert("late", 1).unwrap();
        assert_eq!(session.state(), SessionState::Finalized);
    }
}
