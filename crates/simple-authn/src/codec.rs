//! Parsing of textual key material.
//!
//! Asymmetric keys are accepted as PEM documents, `PRIVATE KEY` (PKCS#8)
//! or `PUBLIC KEY` (SubjectPublicKeyInfo), or as a JSON Web Key with `kty`
//! of `OKP` or `EC`. For PEM the key type is read from the algorithm
//! identifier inside the DER structure; a JWK is re-encoded to the same
//! DER forms so both inputs produce identical keys.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, SECP_256_R_1, SECP_384_R_1, SECP_521_R_1};
use const_oid::db::rfc8410::ID_ED_25519;
use pkcs8::der::asn1::OctetStringRef;
use pkcs8::der::Encode;
use pkcs8::spki::{AlgorithmIdentifierRef, SubjectPublicKeyInfoRef};
use pkcs8::{ObjectIdentifier, PrivateKeyInfo};
use serde::Deserialize;

const PRIVATE_KEY_TAG: &str = "PRIVATE KEY";
const PUBLIC_KEY_TAG: &str = "PUBLIC KEY";

/// Errors from [`parse`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The input is not a PEM document.
    #[error("not a PEM document")]
    Pem(#[from] pem::PemError),
    /// The PEM contents are not a valid key structure.
    #[error("malformed key structure")]
    Der(#[from] pkcs8::der::Error),
    /// The `PRIVATE KEY` contents are not a valid PKCS#8 structure.
    #[error("malformed private key")]
    Pkcs8(#[from] pkcs8::Error),
    /// The algorithm identifier is missing its parameters.
    #[error("malformed key algorithm")]
    Spki(#[from] pkcs8::spki::Error),
    /// The public key bit string does not hold whole bytes.
    #[error("malformed public key bits")]
    PublicKeyBits,
    /// The key uses an algorithm we don't handle.
    #[error("unsupported key type {0}")]
    UnsupportedKeyType(ObjectIdentifier),
    /// The elliptic curve key uses a curve we don't handle.
    #[error("unsupported curve {0}")]
    UnsupportedCurve(ObjectIdentifier),
    /// The input looks like JSON but is not a JSON Web Key.
    #[error("malformed JWK")]
    Jwk(#[from] serde_json::Error),
    /// The JWK key type or curve is not one we handle.
    #[error("unsupported JWK key type {kty:?} with curve {crv:?}")]
    UnsupportedJwk {
        /// The `kty` member.
        kty: String,
        /// The `crv` member.
        crv: String,
    },
    /// A JWK member is missing, not base64url, or the wrong length.
    #[error("invalid JWK member {0:?}")]
    JwkMember(&'static str),
}

/// The family and strength of a parsed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// Ed25519
    Ed25519,
    /// NIST P-256
    P256,
    /// NIST P-384
    P384,
    /// NIST P-521
    P521,
}

impl KeyType {
    fn from_jwk(kty: &str, crv: &str) -> Option<Self> {
        match (kty, crv) {
            ("OKP", "Ed25519") => Some(KeyType::Ed25519),
            ("EC", "P-256") => Some(KeyType::P256),
            ("EC", "P-384") => Some(KeyType::P384),
            ("EC", "P-521") => Some(KeyType::P521),
            _ => None,
        }
    }

    /// Bytes in a scalar or coordinate for this curve.
    fn field_len(self) -> usize {
        match self {
            KeyType::Ed25519 | KeyType::P256 => 32,
            KeyType::P384 => 48,
            KeyType::P521 => 66,
        }
    }

    fn curve(self) -> Option<ObjectIdentifier> {
        match self {
            KeyType::Ed25519 => None,
            KeyType::P256 => Some(SECP_256_R_1),
            KeyType::P384 => Some(SECP_384_R_1),
            KeyType::P521 => Some(SECP_521_R_1),
        }
    }

    fn identify(algorithm: &AlgorithmIdentifierRef<'_>) -> Result<Self, CodecError> {
        if algorithm.oid == ID_ED_25519 {
            return Ok(KeyType::Ed25519);
        }
        if algorithm.oid != ID_EC_PUBLIC_KEY {
            return Err(CodecError::UnsupportedKeyType(algorithm.oid));
        }
        match algorithm.parameters_oid()? {
            SECP_256_R_1 => Ok(KeyType::P256),
            SECP_384_R_1 => Ok(KeyType::P384),
            SECP_521_R_1 => Ok(KeyType::P521),
            curve => Err(CodecError::UnsupportedCurve(curve)),
        }
    }
}

/// A private key, kept as its PKCS#8 DER encoding.
#[derive(Clone)]
pub struct PrivateKey {
    key_type: KeyType,
    pkcs8_der: Vec<u8>,
}

impl PrivateKey {
    /// The key family.
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// The PKCS#8 `PrivateKeyInfo` DER bytes.
    pub fn pkcs8_der(&self) -> &[u8] {
        &self.pkcs8_der
    }
}

// Never print private key bytes.
impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("key_type", &self.key_type)
            .finish_non_exhaustive()
    }
}

/// A public key, kept as the raw key bytes from the SubjectPublicKeyInfo.
///
/// For elliptic curve keys this is the SEC1 encoded point; for Ed25519
/// it is the 32-byte public key.
#[derive(Debug, Clone)]
pub struct PublicKey {
    key_type: KeyType,
    key_bytes: Vec<u8>,
}

impl PublicKey {
    /// The key family.
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// The raw public key bytes.
    pub fn key_bytes(&self) -> &[u8] {
        &self.key_bytes
    }
}

/// The result of parsing key text.
#[derive(Debug, Clone)]
pub enum ParsedKey {
    /// A private key.
    Private(PrivateKey),
    /// A public key.
    Public(PublicKey),
    /// A well-formed PEM document that holds no key, e.g. a certificate.
    ///
    /// Contains the PEM tag.
    Other(String),
}

impl ParsedKey {
    /// The key family, if this is a key at all.
    pub fn key_type(&self) -> Option<KeyType> {
        match self {
            ParsedKey::Private(key) => Some(key.key_type),
            ParsedKey::Public(key) => Some(key.key_type),
            ParsedKey::Other(_) => None,
        }
    }
}

/// Parse a PEM or JWK encoded private or public key.
pub fn parse(input: &str) -> Result<ParsedKey, CodecError> {
    if input.trim_start().starts_with('{') {
        return parse_jwk(input);
    }
    let pem = pem::parse(input)?;
    match pem.tag() {
        PRIVATE_KEY_TAG => {
            let info = PrivateKeyInfo::try_from(pem.contents())?;
            let key_type = KeyType::identify(&info.algorithm)?;
            Ok(ParsedKey::Private(PrivateKey {
                key_type,
                pkcs8_der: pem.contents().to_vec(),
            }))
        }
        PUBLIC_KEY_TAG => {
            let info = SubjectPublicKeyInfoRef::try_from(pem.contents())?;
            let key_type = KeyType::identify(&info.algorithm)?;
            let key_bytes = info
                .subject_public_key
                .as_bytes()
                .ok_or(CodecError::PublicKeyBits)?;
            Ok(ParsedKey::Public(PublicKey {
                key_type,
                key_bytes: key_bytes.to_vec(),
            }))
        }
        tag => Ok(ParsedKey::Other(tag.to_owned())),
    }
}

/// The members of an `OKP` or `EC` JSON Web Key that we use.
#[derive(Deserialize)]
struct Jwk {
    kty: String,
    #[serde(default)]
    crv: String,
    x: Option<String>,
    y: Option<String>,
    d: Option<String>,
}

fn jwk_member(
    value: Option<&str>,
    name: &'static str,
    len: usize,
) -> Result<Vec<u8>, CodecError> {
    let bytes = value
        .and_then(|value| URL_SAFE_NO_PAD.decode(value).ok())
        .ok_or(CodecError::JwkMember(name))?;
    if bytes.len() != len {
        return Err(CodecError::JwkMember(name));
    }
    Ok(bytes)
}

fn parse_jwk(input: &str) -> Result<ParsedKey, CodecError> {
    let jwk: Jwk = serde_json::from_str(input)?;
    let key_type =
        KeyType::from_jwk(&jwk.kty, &jwk.crv).ok_or_else(|| CodecError::UnsupportedJwk {
            kty: jwk.kty.clone(),
            crv: jwk.crv.clone(),
        })?;
    let len = key_type.field_len();

    // Ed25519 public keys are the x value; EC public keys the uncompressed
    // SEC1 point.
    let x = jwk_member(jwk.x.as_deref(), "x", len)?;
    let public = match key_type.curve() {
        None => x,
        Some(_) => {
            let y = jwk_member(jwk.y.as_deref(), "y", len)?;
            let mut point = Vec::with_capacity(1 + 2 * len);
            point.push(0x04);
            point.extend_from_slice(&x);
            point.extend_from_slice(&y);
            point
        }
    };

    let Some(d) = jwk.d.as_deref() else {
        return Ok(ParsedKey::Public(PublicKey {
            key_type,
            key_bytes: public,
        }));
    };
    let d = jwk_member(Some(d), "d", len)?;

    let pkcs8_der = match key_type.curve() {
        None => {
            let private_key = OctetStringRef::new(&d)?.to_der()?;
            let algorithm = AlgorithmIdentifierRef {
                oid: ID_ED_25519,
                parameters: None,
            };
            PrivateKeyInfo::new(algorithm, &private_key).to_der()?
        }
        Some(curve) => {
            let private_key = sec1::EcPrivateKey {
                private_key: &d,
                parameters: None,
                public_key: Some(&public),
            }
            .to_der()?;
            let algorithm = AlgorithmIdentifierRef {
                oid: ID_EC_PUBLIC_KEY,
                parameters: Some((&curve).into()),
            };
            PrivateKeyInfo::new(algorithm, &private_key).to_der()?
        }
    };
    Ok(ParsedKey::Private(PrivateKey {
        key_type,
        pkcs8_der,
    }))
}
