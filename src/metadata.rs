//! Key/value metadata carried alongside decoded pixels.
//!
//! Decoders only fill this when asked to; see
//! [`ReadRequest::with_metadata`](crate::ReadRequest::with_metadata).
//! Keys are format-specific tag names ("ImageDescription", "gamma", ...).
//! Insertion order is preserved.

use core::fmt;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum MetaValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Int(v) => write!(f, "{}", v),
            MetaValue::Float(v) => write!(f, "{}", v),
            MetaValue::Text(v) => f.write_str(v),
            MetaValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

/// Ordered collection of metadata entries.
///
/// Duplicate keys are allowed (some formats repeat tags); lookups
/// return the first match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<(String, MetaValue)>,
}

impl Metadata {
    pub fn new() -> Self {
        Metadata::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, key: impl Into<String>, value: MetaValue) {
        self.entries.push((key.into(), value));
    }

    /// First value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, MetaValue)> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = &'a (String, MetaValue);
    type IntoIter = core::slice::Iter<'a, (String, MetaValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_get_preserves_order() {
        let mut meta = Metadata::new();
        meta.push("ImageDescription", MetaValue::Text("scan 4".into()));
        meta.push("XResolution", MetaValue::Float(300.0));
        meta.push("ImageDescription", MetaValue::Text("shadowed".into()));

        assert_eq!(meta.len(), 3);
        assert_eq!(
            meta.get("ImageDescription"),
            Some(&MetaValue::Text("scan 4".into()))
        );
        assert_eq!(meta.get("missing"), None);

        let keys: Vec<&str> = meta.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            ["ImageDescription", "XResolution", "ImageDescription"]
        );
    }

    #[test]
    fn display_forms() {
        assert_eq!(MetaValue::Int(-3).to_string(), "-3");
        assert_eq!(MetaValue::Text("abc".into()).to_string(), "abc");
        assert_eq!(MetaValue::Bytes(vec![0; 10]).to_string(), "<10 bytes>");
    }
}
