use crate::codec::CodecError;
use crate::engine::EngineError;
use crate::Algorithm;

/// Errors returned while building keys, issuing tokens, or verifying them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The key text was empty.
    #[error("input key cannot be empty")]
    EmptyKeyInput,
    /// A key was requested for an algorithm we cannot build keys for.
    #[error("unsupported algorithm {0}")]
    UnsupportedAlgorithm(Algorithm),
    /// The algorithm has no signature engine identifier.
    #[error("unknown signer algorithm")]
    UnknownAlgorithm,
    /// The structured key text could not be parsed.
    #[error("key parse error")]
    KeyParse(#[from] CodecError),
    /// The parsed key holds neither a private nor a public key.
    #[error("no public or private key instance found")]
    NoUsableKeyInstance,
    /// The parsed key belongs to a different algorithm family.
    #[error("{found} key cannot be used with {expected}")]
    AlgorithmMismatch {
        /// The algorithm the caller asked for.
        expected: Algorithm,
        /// The algorithm the key material belongs to.
        found: Algorithm,
    },
    /// No key was supplied at all.
    #[error("key cannot be empty")]
    MissingKey,
    /// Signing needs a private or symmetric key.
    #[error("expected private key for creating signature, none found")]
    SigningCapabilityRequired,
    /// Verification needs a public or symmetric key.
    #[error("expected public key for verifying signature, none found")]
    VerificationCapabilityRequired,
    /// The signature engine failed to produce a token.
    #[error("signature engine error")]
    SignatureEngine(#[from] EngineError),
    /// The token is malformed or its signature does not match.
    #[error("invalid token signature")]
    SignatureInvalid,
    /// The signed payload is not a claims object.
    #[error("malformed token payload")]
    MalformedPayload(#[source] serde_json::Error),
    /// The token carries no `iat` claim.
    #[error("missing issued at")]
    MissingIssuedAt,
    /// The `iat` claim lies outside the host's validity window.
    #[error("authorization exceeds validity period")]
    ValidityWindowExceeded,
    /// The `nbf` claim is in the future.
    #[error("authorization request (nbf) is in the future")]
    NotYetValid,
}
