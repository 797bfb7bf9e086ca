use std::fmt::{self, Display};
use std::str::FromStr;

use crate::codec::{self, KeyType};
use crate::Error;

/// Signature algorithms a [`Key`](crate::Key) can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Algorithm {
    /// No algorithm selected. Never accepted when building keys.
    #[default]
    Unknown = 0,
    /// EdDSA over Curve25519 (public/private key)
    Ed25519 = 1,
    /// ECDSA using P-256 and SHA-256 (public/private key)
    Es256 = 2,
    /// ECDSA using P-384 and SHA-384 (public/private key)
    Es384 = 3,
    /// ECDSA using P-521 and SHA-512 (public/private key)
    Es512 = 4,
    /// HMAC using SHA-256 (shared secret)
    Hs256 = 5,
    /// HMAC using SHA-384 (shared secret)
    Hs384 = 6,
    /// HMAC using SHA-512 (shared secret)
    Hs512 = 7,
}

/// The algorithm identifier used by the signature engine.
///
/// This is also the value of the `alg` field in the token header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JwsAlgorithm {
    /// `EdDSA`
    EdDSA,
    /// `ES256`
    ES256,
    /// `ES384`
    ES384,
    /// `ES512`
    ES512,
    /// `HS256`
    HS256,
    /// `HS384`
    HS384,
    /// `HS512`
    HS512,
}

impl JwsAlgorithm {
    /// The header name of this algorithm.
    pub const fn as_str(self) -> &'static str {
        match self {
            JwsAlgorithm::EdDSA => "EdDSA",
            JwsAlgorithm::ES256 => "ES256",
            JwsAlgorithm::ES384 => "ES384",
            JwsAlgorithm::ES512 => "ES512",
            JwsAlgorithm::HS256 => "HS256",
            JwsAlgorithm::HS384 => "HS384",
            JwsAlgorithm::HS512 => "HS512",
        }
    }
}

impl Display for JwsAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Algorithm {
    /// Resolve the signature engine identifier for this algorithm.
    pub fn jws(self) -> Result<JwsAlgorithm, Error> {
        let alg = match self {
            Algorithm::Ed25519 => JwsAlgorithm::EdDSA,
            Algorithm::Es256 => JwsAlgorithm::ES256,
            Algorithm::Es384 => JwsAlgorithm::ES384,
            Algorithm::Es512 => JwsAlgorithm::ES512,
            Algorithm::Hs256 => JwsAlgorithm::HS256,
            Algorithm::Hs384 => JwsAlgorithm::HS384,
            Algorithm::Hs512 => JwsAlgorithm::HS512,
            Algorithm::Unknown => return Err(Error::UnknownAlgorithm),
        };
        Ok(alg)
    }

    /// Returns true if the same secret is used to sign and verify.
    pub fn is_symmetric(self) -> bool {
        matches!(self, Algorithm::Hs256 | Algorithm::Hs384 | Algorithm::Hs512)
    }

    /// Recommend an algorithm for a key we know nothing about.
    ///
    /// PEM encoded Ed25519 and NIST curve keys select the matching asymmetric
    /// algorithm. Anything else is treated as a shared secret, and gets
    /// HMAC with SHA-256.
    pub fn infer(input_key: &str) -> Algorithm {
        match codec::parse(input_key) {
            Ok(parsed) => parsed.key_type().map_or(Algorithm::Hs256, Algorithm::from),
            Err(e) => {
                tracing::debug!("not a structured key ({e}), assuming shared secret");
                Algorithm::Hs256
            }
        }
    }

    /// The display name of this algorithm.
    pub const fn name(self) -> &'static str {
        match self {
            Algorithm::Unknown => "unknown",
            Algorithm::Ed25519 => "ED25519",
            Algorithm::Es256 => "ES256",
            Algorithm::Es384 => "ES384",
            Algorithm::Es512 => "ES512",
            Algorithm::Hs256 => "HS256",
            Algorithm::Hs384 => "HS384",
            Algorithm::Hs512 => "HS512",
        }
    }
}

impl From<KeyType> for Algorithm {
    fn from(key_type: KeyType) -> Self {
        match key_type {
            KeyType::Ed25519 => Algorithm::Ed25519,
            KeyType::P256 => Algorithm::Es256,
            KeyType::P384 => Algorithm::Es384,
            KeyType::P521 => Algorithm::Es512,
        }
    }
}

// Ordinals outside the known range are treated as unknown.
impl From<u8> for Algorithm {
    fn from(ordinal: u8) -> Self {
        match ordinal {
            1 => Algorithm::Ed25519,
            2 => Algorithm::Es256,
            3 => Algorithm::Es384,
            4 => Algorithm::Es512,
            5 => Algorithm::Hs256,
            6 => Algorithm::Hs384,
            7 => Algorithm::Hs512,
            _ => Algorithm::Unknown,
        }
    }
}

impl From<Algorithm> for u8 {
    fn from(alg: Algorithm) -> Self {
        alg as u8
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let alg = match s.to_ascii_uppercase().as_str() {
            "ED25519" | "EDDSA" => Algorithm::Ed25519,
            "ES256" => Algorithm::Es256,
            "ES384" => Algorithm::Es384,
            "ES512" => Algorithm::Es512,
            "HS256" => Algorithm::Hs256,
            "HS384" => Algorithm::Hs384,
            "HS512" => Algorithm::Hs512,
            _ => return Err(Error::UnknownAlgorithm),
        };
        Ok(alg)
    }
}
