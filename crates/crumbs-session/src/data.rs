//! Typed session payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Reserved key holding the absolute expiry (epoch seconds).
pub const EXPIRES_KEY: &str = "expires";

/// Expiry sentinel for a destroyed session.
pub const DESTROYED: i64 = -1;

/// Application data carried by a session cookie.
///
/// Serializes to one flat JSON object: the reserved `expires` key sits next to
/// the application keys. Anything that is not an object, or whose `expires`
/// is not an integer, fails to deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires: Option<i64>,

    #[serde(flatten)]
    values: Map<String, Value>,
}

impl SessionData {
    /// Create an empty session payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload of a destroyed session: only `expires = -1`.
    pub fn destroyed() -> Self {
        Self {
            expires: Some(DESTROYED),
            values: Map::new(),
        }
    }

    /// Absolute expiry in epoch seconds, if set.
    pub fn expires(&self) -> Option<i64> {
        self.expires
    }

    /// Set the absolute expiry.
    pub fn set_expires(&mut self, at: i64) {
        self.expires = Some(at);
    }

    /// Remove the expiry, returning the previous one.
    pub fn clear_expires(&mut self) -> Option<i64> {
        self.expires.take()
    }

    /// Whether the expiry lies strictly before `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires.is_some_and(|at| at < now)
    }

    /// Whether the payload carries the destroyed sentinel.
    pub fn is_destroyed(&self) -> bool {
        self.expires == Some(DESTROYED)
    }

    /// Look up an application value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Look up an application value and convert it to `T`.
    /// Returns `None` when the key is missing or holds another type.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Store a value, returning the previous one.
    ///
    /// Writing `expires` routes to the typed expiry and requires an integer.
    pub fn insert<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) -> Result<Option<Value>> {
        let key = key.into();
        let value = serde_json::to_value(value).map_err(Error::Serialize)?;

        if key == EXPIRES_KEY {
            let at = value.as_i64().ok_or(Error::ReservedKey {
                key,
                expected: "an integer epoch timestamp",
            })?;
            return Ok(self.expires.replace(at).map(Value::from));
        }

        Ok(self.values.insert(key, value))
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        if key == EXPIRES_KEY {
            return self.expires.take().map(Value::from);
        }
        self.values.remove(key)
    }

    /// Whether `key` is present (including `expires`).
    pub fn contains_key(&self, key: &str) -> bool {
        if key == EXPIRES_KEY {
            return self.expires.is_some();
        }
        self.values.contains_key(key)
    }

    /// Number of keys, counting `expires` when set.
    pub fn len(&self) -> usize {
        self.values.len() + usize::from(self.expires.is_some())
    }

    /// Whether there are no keys at all.
    pub fn is_empty(&self) -> bool {
        self.expires.is_none() && self.values.is_empty()
    }

    /// Drop every key, including `expires`.
    pub fn clear(&mut self) {
        self.expires = None;
        self.values.clear();
    }

    /// Iterate application values (excludes `expires`).
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Render as a single JSON object, `expires` included.
    pub fn to_value(&self) -> Value {
        let mut map = self.values.clone();
        if let Some(at) = self.expires {
            map.insert(EXPIRES_KEY.to_string(), Value::from(at));
        }
        Value::Object(map)
    }

    /// Build from a JSON value, rejecting non-objects and non-integer `expires`.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(Error::Deserialize)
    }
}
