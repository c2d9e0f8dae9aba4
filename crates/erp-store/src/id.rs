//! Entity identifiers
//!
//! Every id is coerced to its string form before it becomes a cache key, so a
//! numeric `7` and a string `"7"` address the same slot.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use std::fmt;

/// String-backed cache key for an entity record
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create an id from anything string-like
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the key
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Coerce a JSON scalar the way a string conversion would.
    ///
    /// Returns `None` for null, arrays and objects.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(number_key(n))),
            Value::Bool(b) => Some(Self(b.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

/// Number rendering of a JSON number: integers verbatim, floats in
/// shortest form, switching to exponent notation (`1e+21`, `1e-7`) outside
/// `[1e-6, 1e21)`
fn number_key(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        // 7.0 and 7 must land in the same slot
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.is_finite() && (f.abs() >= 1e21 || f.abs() < 1e-6) => exponent_key(f),
        Some(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn exponent_key(f: f64) -> String {
    let shortest = format!("{f:e}");
    match shortest.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => shortest,
    }
}

/// Extract the cache key of a raw record: `id`, falling back to `_id`
#[must_use]
pub fn record_key(record: &Value) -> Option<EntityId> {
    let field = |name: &str| record.get(name).filter(|v| !v.is_null());
    field("id").or_else(|| field("_id")).and_then(EntityId::from_json)
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&EntityId> for EntityId {
    fn from(id: &EntityId) -> Self {
        id.clone()
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for EntityId {
                fn from(id: $t) -> Self {
                    Self(id.to_string())
                }
            }
        )*
    };
}

impl_from_int!(u32, u64, i32, i64, usize);
