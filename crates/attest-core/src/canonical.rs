//! Deterministic JSON encoding.
//!
//! Every digest and every signature in the workspace is computed over
//! [`CanonicalBytes`]. A value is first lowered to a `serde_json::Value`,
//! checked for non-integer numbers, then written out in RFC 8785 (JCS)
//! form. Two parties that agree on a record's JSON shape therefore agree on
//! its schema id, uid and delegated-signing message.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// JCS output for some serializable value.
///
/// Can only be built through [`CanonicalBytes::new`]; floats are refused so
/// that number formatting never enters the byte stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// # Errors
    ///
    /// [`CanonicalizationError::FloatRejected`] when any number in the tree
    /// is not an integer; [`CanonicalizationError::SerializationFailed`] when
    /// serde cannot produce JSON at all.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let tree = serde_json::to_value(obj)?;
        ensure_integral(&tree)?;
        Ok(Self(serde_jcs::to_vec(&tree)?))
    }

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

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

fn ensure_integral(tree: &Value) -> Result<(), CanonicalizationError> {
    match tree {
        Value::Number(n) if n.is_f64() => Err(CanonicalizationError::FloatRejected(
            n.as_f64().unwrap_or(f64::NAN),
        )),
        Value::Array(items) => items.iter().try_for_each(ensure_integral),
        Value::Object(fields) => fields.values().try_for_each(ensure_integral),
        _ => Ok(()),
    }
}
