//! Failures in the value layer. Registry, engine and delegation errors are
//! defined next to the operations that raise them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),

    #[error("malformed hex: {0}")]
    InvalidHex(String),

    /// Decoded bytes do not fit the identifier being parsed.
    #[error("{kind} must be {expected} bytes, found {actual}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("unparseable timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Why a value could not be turned into [`crate::CanonicalBytes`].
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    #[error("non-integer number {0} cannot be canonicalized")]
    FloatRejected(f64),

    #[error("value is not representable as JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_length_display_names_kind() {
        let err = CoreError::InvalidLength {
            kind: "address",
            expected: 20,
            actual: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("address"));
        assert!(msg.contains("20"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn float_rejected_converts_into_core_error() {
        let err: CoreError = CanonicalizationError::FloatRejected(0.5).into();
        assert!(matches!(err, CoreError::Canonicalization(_)));
    }
}
