//! The tagged JSON value and its access API.

use std::fmt;

/// Shared null sentinel returned by the legacy accessors.
static NULL: Value = Value::Null;

/// A dynamically-typed JSON value.
///
/// Objects preserve insertion order and keep keys unique; numeric subtypes
/// are distinct and never coerced implicitly by accessors. Equality is
/// structural, except that `Int` and `UInt` compare by numeric value (the
/// wire cannot tell them apart).
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    String(String),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Empty object constructor.
    pub fn object() -> Self {
        Value::Object(Vec::new())
    }

    /// Empty array constructor.
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    // ── Legacy access (compatibility shim) ───────────────────────────────

    /// Key lookup that never fails: a missing key, or a lookup on a
    /// non-object, reads as null. Callers that need to distinguish the two
    /// must use [`Value::contains`] first.
    pub fn get(&self, key: &str) -> &Value {
        match self {
            Value::Object(entries) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v)
                .unwrap_or(&NULL),
            _ => &NULL,
        }
    }

    /// Index lookup that never fails: out of bounds, or lookup on a
    /// non-array, reads as null.
    pub fn at(&self, index: usize) -> &Value {
        match self {
            Value::Array(items) => items.get(index).unwrap_or(&NULL),
            _ => &NULL,
        }
    }

    /// Whether `key` is present (possibly with a null value).
    pub fn contains(&self, key: &str) -> bool {
        match self {
            Value::Object(entries) => entries.iter().any(|(k, _)| k == key),
            _ => false,
        }
    }

    // ── Strict accessors ─────────────────────────────────────────────────

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::UInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Unsigned view of a numeric value. Negative integers and doubles are
    /// rejected rather than coerced.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(n) => Some(*n),
            Value::Int(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        self.as_u64().and_then(|n| u32::try_from(n).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Int(n) => Some(*n as f64),
            Value::UInt(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Iterate object entries in insertion order. Empty for non-objects.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        let entries: &[(String, Value)] = match self {
            Value::Object(entries) => entries,
            _ => &[],
        };
        entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    // ── Builders ─────────────────────────────────────────────────────────

    /// Set `key` to `value`, converting `self` to an object if it is null.
    /// An existing key keeps its original position; a new key appends.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        if self.is_null() {
            *self = Value::object();
        }
        if let Value::Object(entries) = self {
            let key = key.into();
            let value = value.into();
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some((_, slot)) => *slot = value,
                None => entries.push((key, value)),
            }
        }
        self
    }

    /// Append `value`, converting `self` to an array if it is null.
    pub fn push(&mut self, value: impl Into<Value>) -> &mut Self {
        if self.is_null() {
            *self = Value::array();
        }
        if let Value::Array(items) = self {
            items.push(value.into());
        }
        self
    }

    /// Number of array elements or object entries; 0 otherwise.
    pub fn len(&self) -> usize {
        match self {
            Value::Array(items) => items.len(),
            Value::Object(entries) => entries.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Int(a), Value::UInt(b)) | (Value::UInt(b), Value::Int(a)) => {
                u64::try_from(*a).map(|a| a == *b).unwrap_or(false)
            }
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::UInt(n as u64)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::ser::to_string(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_as_null() {
        let mut v = Value::object();
        v.set("present", Value::Null);
        assert!(v.get("absent").is_null());
        assert!(v.get("present").is_null());
        // contains is the only way to tell the two apart
        assert!(v.contains("present"));
        assert!(!v.contains("absent"));
    }

    #[test]
    fn get_on_non_object_reads_as_null() {
        assert!(Value::Int(3).get("x").is_null());
        assert!(Value::Null.at(9).is_null());
    }

    #[test]
    fn set_preserves_first_insertion_position() {
        let mut v = Value::object();
        v.set("a", 1i64).set("b", 2i64).set("a", 3i64);
        let keys: Vec<&str> = v.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(v.get("a").as_i64(), Some(3));
    }

    #[test]
    fn numeric_conversion_is_range_checked() {
        assert_eq!(Value::Int(-1).as_u64(), None);
        assert_eq!(Value::UInt(u64::MAX).as_i64(), None);
        assert_eq!(Value::UInt(1 << 40).as_u32(), None);
        assert_eq!(Value::Double(3.5).as_u64(), None);
        assert_eq!(Value::Int(7).as_u32(), Some(7));
    }

    #[test]
    fn push_builds_arrays() {
        let mut v = Value::Null;
        v.push(1i64).push("two");
        assert_eq!(v.len(), 2);
        assert_eq!(v.at(1).as_str(), Some("two"));
    }
}
