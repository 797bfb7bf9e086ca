//! Compact JWS signing and verification.
//!
//! Tokens are `header.payload.signature`, each segment base64url encoded
//! without padding. `jsonwebtoken` does the cryptography for every algorithm
//! except ES512, which it doesn't support; that one goes through `p521`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::{DecodingKey, EncodingKey};
use p521::ecdsa::signature::{Signer as _, Verifier as _};
use p521::pkcs8::DecodePrivateKey as _;
use serde::{Deserialize, Serialize};

use crate::codec::{PrivateKey, PublicKey};
use crate::{Error, JwsAlgorithm};

/// Failures inside the signature engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `jsonwebtoken` rejected the key or failed to sign.
    #[error("jwt signing failed")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    /// The P-521 key or signature operation failed.
    #[error("ecdsa failure")]
    Ecdsa(#[from] p521::ecdsa::Error),
    /// The P-521 private key is not valid PKCS#8.
    #[error("invalid P-521 private key")]
    Pkcs8(#[from] p521::pkcs8::Error),
    /// The header or payload could not be serialized.
    #[error("serialization failed")]
    Encode(#[from] serde_json::Error),
    /// The key handle cannot be used with this algorithm.
    #[error("{0} cannot be used with this key")]
    KeyFamily(JwsAlgorithm),
}

/// A basic JWT header.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Header {
    #[serde(skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alg: Option<String>,
}

/// Key material able to produce signatures.
pub(crate) enum SignerHandle {
    Jwt(EncodingKey),
    P521(p521::ecdsa::SigningKey),
}

/// Key material able to check signatures.
pub(crate) enum VerifierHandle {
    Jwt(DecodingKey),
    P521(p521::ecdsa::VerifyingKey),
}

impl std::fmt::Debug for SignerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignerHandle::Jwt(_) => f.write_str("SignerHandle::Jwt"),
            SignerHandle::P521(_) => f.write_str("SignerHandle::P521"),
        }
    }
}

impl std::fmt::Debug for VerifierHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerifierHandle::Jwt(_) => f.write_str("VerifierHandle::Jwt"),
            VerifierHandle::P521(_) => f.write_str("VerifierHandle::P521"),
        }
    }
}

/// Build the signing and verifying handles for an HMAC secret.
pub(crate) fn hmac_handles(secret: &[u8]) -> (SignerHandle, VerifierHandle) {
    (
        SignerHandle::Jwt(EncodingKey::from_secret(secret)),
        VerifierHandle::Jwt(DecodingKey::from_secret(secret)),
    )
}

/// Build a signing handle from a PKCS#8 private key.
pub(crate) fn signer_from_private(
    alg: JwsAlgorithm,
    key: &PrivateKey,
) -> Result<SignerHandle, EngineError> {
    let der = key.pkcs8_der();
    let handle = match alg {
        JwsAlgorithm::EdDSA => SignerHandle::Jwt(EncodingKey::from_ed_der(der)),
        JwsAlgorithm::ES256 | JwsAlgorithm::ES384 => {
            SignerHandle::Jwt(EncodingKey::from_ec_der(der))
        }
        JwsAlgorithm::ES512 => {
            let secret = p521::SecretKey::from_pkcs8_der(der)?;
            SignerHandle::P521(p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())?)
        }
        JwsAlgorithm::HS256 | JwsAlgorithm::HS384 | JwsAlgorithm::HS512 => {
            return Err(EngineError::KeyFamily(alg))
        }
    };
    Ok(handle)
}

/// Build a verifying handle from the raw bytes of a public key.
pub(crate) fn verifier_from_public(
    alg: JwsAlgorithm,
    key: &PublicKey,
) -> Result<VerifierHandle, EngineError> {
    let bytes = key.key_bytes();
    let handle = match alg {
        JwsAlgorithm::EdDSA => VerifierHandle::Jwt(DecodingKey::from_ed_der(bytes)),
        JwsAlgorithm::ES256 | JwsAlgorithm::ES384 => {
            VerifierHandle::Jwt(DecodingKey::from_ec_der(bytes))
        }
        JwsAlgorithm::ES512 => {
            VerifierHandle::P521(p521::ecdsa::VerifyingKey::from_sec1_bytes(bytes)?)
        }
        JwsAlgorithm::HS256 | JwsAlgorithm::HS384 | JwsAlgorithm::HS512 => {
            return Err(EngineError::KeyFamily(alg))
        }
    };
    Ok(handle)
}

fn jwt_algorithm(alg: JwsAlgorithm) -> Option<jsonwebtoken::Algorithm> {
    match alg {
        JwsAlgorithm::EdDSA => Some(jsonwebtoken::Algorithm::EdDSA),
        JwsAlgorithm::ES256 => Some(jsonwebtoken::Algorithm::ES256),
        JwsAlgorithm::ES384 => Some(jsonwebtoken::Algorithm::ES384),
        JwsAlgorithm::HS256 => Some(jsonwebtoken::Algorithm::HS256),
        JwsAlgorithm::HS384 => Some(jsonwebtoken::Algorithm::HS384),
        JwsAlgorithm::HS512 => Some(jsonwebtoken::Algorithm::HS512),
        JwsAlgorithm::ES512 => None,
    }
}

/// Sign a payload, returning the compact token.
pub(crate) fn sign(
    alg: JwsAlgorithm,
    key: &SignerHandle,
    payload: &[u8],
) -> Result<String, EngineError> {
    let header = Header {
        typ: Some("JWT".to_owned()),
        alg: Some(alg.as_str().to_owned()),
    };
    let header = b64encode(&serde_json::to_vec(&header)?);
    let message = format!("{header}.{}", b64encode(payload));

    let signature = match (key, jwt_algorithm(alg)) {
        (SignerHandle::Jwt(key), Some(jwt_alg)) => {
            jsonwebtoken::crypto::sign(message.as_bytes(), key, jwt_alg)?
        }
        (SignerHandle::P521(key), None) => {
            let signature: p521::ecdsa::Signature = key.try_sign(message.as_bytes())?;
            b64encode(&signature.to_bytes())
        }
        _ => return Err(EngineError::KeyFamily(alg)),
    };

    Ok(format!("{message}.{signature}"))
}

/// Check the token signature.
///
/// Returns the payload bytes. Every failure, including a malformed token or
/// a header naming a different algorithm, is `SignatureInvalid`.
pub(crate) fn verify(
    alg: JwsAlgorithm,
    key: &VerifierHandle,
    token: &str,
) -> Result<Vec<u8>, Error> {
    let (message, signature) = token.rsplit_once('.').ok_or(Error::SignatureInvalid)?;
    let (header, payload) = message.split_once('.').ok_or(Error::SignatureInvalid)?;

    let header = b64decode(header).ok_or(Error::SignatureInvalid)?;
    let payload = b64decode(payload).ok_or(Error::SignatureInvalid)?;

    let valid = match (key, jwt_algorithm(alg)) {
        (VerifierHandle::Jwt(key), Some(jwt_alg)) => {
            jsonwebtoken::crypto::verify(signature, message.as_bytes(), key, jwt_alg)
                .unwrap_or(false)
        }
        (VerifierHandle::P521(key), None) => b64decode(signature)
            .and_then(|bytes| p521::ecdsa::Signature::from_slice(&bytes).ok())
            .is_some_and(|signature| key.verify(message.as_bytes(), &signature).is_ok()),
        _ => false,
    };
    if !valid {
        return Err(Error::SignatureInvalid);
    }

    // Ensure the header agrees with the key we verified against.
    let header: Header = serde_json::from_slice(&header).map_err(|_| Error::SignatureInvalid)?;
    if header.alg.as_deref() != Some(alg.as_str()) {
        tracing::debug!("header algorithm mismatch");
        return Err(Error::SignatureInvalid);
    }
    if !matches!(header.typ.as_deref(), None | Some("JWT")) {
        tracing::debug!("unexpected token type");
        return Err(Error::SignatureInvalid);
    }

    Ok(payload)
}

fn b64decode(input: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(input).ok()
}

fn b64encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}
