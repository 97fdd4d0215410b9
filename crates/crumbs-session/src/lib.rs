//! Stateless cookie sessions.
//!
//! The whole session lives in a single cookie: application data is
//! serialized to JSON, XOR-ed with a keystream derived from a secret,
//! zlib-compressed and base64-encoded. There is no server-side store.
//!
//! The cipher hides the payload from casual inspection only. It carries no
//! integrity check, so a client can corrupt or replay its cookie; corrupted
//! cookies decode to an empty session.
//!
//! # Example
//!
//! ```rust,ignore
//! use crumbs_session::{Session, SessionConfig, StaticContext};
//!
//! let ctx = StaticContext::new("s3cr3t").with_cookie_header(incoming);
//! let mut session = Session::load(&ctx, SessionConfig::new().with_expires_secs(3600));
//! session.insert("user", "alice")?;
//! for (name, value) in session.header(&ctx, None) {
//!     response.add_header(name, value);
//! }
//! ```

mod cipher;
mod clock;
mod codec;
mod config;
mod context;
pub mod cookie;
mod data;
mod error;
mod session;

pub use cipher::{KEYSTREAM_LEN, KeystreamCipher, transform};
pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{MAX_PAYLOAD_LEN, SessionCodec, decode, encode};
pub use config::{DEFAULT_COOKIE_NAME, DEFAULT_EXPIRES_SECS, DEFAULT_PATH, SessionConfig};
pub use context::{HttpRequestContext, RequestContext, StaticContext};
pub use cookie::{HeaderPair, HeaderSink, OutgoingCookie};
pub use data::{DESTROYED, EXPIRES_KEY, SessionData};
pub use error::{Error, Result};
pub use session::{Session, SessionState};
