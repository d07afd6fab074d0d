use thiserror::Error;

/// Failures handling keys or checking signatures.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The signature does not match the message under the given key.
    #[error("signature check failed: {0}")]
    VerificationFailed(String),

    /// The bytes are not a usable Ed25519 point.
    #[error("unusable public key: {0}")]
    InvalidPublicKey(String),

    /// Malformed or wrong-length hex.
    #[error("bad hex: {0}")]
    HexDecode(String),
}
