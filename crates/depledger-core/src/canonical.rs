//! # Canonical Serialization: JCS-Compatible Byte Production
//!
//! `CanonicalBytes` is the sole construction path for bytes that get
//! hashed: repository address derivation and journal receipt digests both
//! go through it. The inner buffer is private, so a digest can never be
//! computed over an ad-hoc `serde_json::to_vec()` rendering.
//!
//! Rules applied before RFC 8785 serialization (`serde_jcs`):
//!
//! 1. Fractional numbers anywhere in the tree are rejected. Amounts
//!    serialize as decimal strings and never reach this check.
//! 2. Keys are sorted and separators compact, per `serde_jcs`.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Hash input in RFC 8785 form. Only [`CanonicalBytes::new`] builds one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Render `value` canonically.
    ///
    /// Fails with `FloatRejected` if any number in the tree is fractional.
    pub fn new(value: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let tree = serde_json::to_value(value)?;
        ensure_integral(&tree)?;
        Ok(Self(serde_jcs::to_vec(&tree)?))
    }

    /// The bytes to hash.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Walk the tree and fail on the first fractional number.
fn ensure_integral(tree: &Value) -> Result<(), CanonicalizationError> {
    let mut pending = vec![tree];
    while let Some(node) = pending.pop() {
        match node {
            Value::Number(n) if n.as_i64().is_none() && n.as_u64().is_none() => {
                return Err(CanonicalizationError::FloatRejected(
                    n.as_f64().unwrap_or(f64::NAN),
                ));
            }
            Value::Array(items) => pending.extend(items),
            Value::Object(fields) => pending.extend(fields.values()),
            _ => {}
        }
    }
    Ok(())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Same input always produces the same bytes, whatever the key order.
        #[test]
        fn test_canonical_bytes_ignore_insertion_order(
            entries in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..8)
        ) {
            let forward: serde_json::Map<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::json!(v)))
                .collect();
            let reversed: serde_json::Map<String, Value> = entries
                .iter()
                .rev()
                .map(|(k, v)| (k.clone(), serde_json::json!(v)))
                .collect();
            let left = CanonicalBytes::new(&Value::Object(forward)).unwrap();
            let right = CanonicalBytes::new(&Value::Object(reversed)).unwrap();
            prop_assert_eq!(left, right);
        }
    }
}
