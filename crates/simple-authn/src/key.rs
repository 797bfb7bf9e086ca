use std::sync::Arc;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

use crate::codec::{self, ParsedKey};
use crate::engine::{self, SignerHandle, VerifierHandle};
use crate::{Algorithm, Error, JwsAlgorithm};

type Blake2b256 = Blake2b<U32>;

/// The capability to sign tokens.
///
/// Obtained from a [`Key`] built from a private key or a shared secret.
#[derive(Debug, Clone)]
pub struct SigningKey {
    pub(crate) alg: JwsAlgorithm,
    pub(crate) handle: Arc<SignerHandle>,
}

/// The capability to verify tokens.
///
/// Obtained from a [`Key`] built from a public key or a shared secret.
#[derive(Debug, Clone)]
pub struct VerifyingKey {
    pub(crate) alg: JwsAlgorithm,
    pub(crate) handle: Arc<VerifierHandle>,
}

impl SigningKey {
    /// The algorithm this key signs with.
    pub fn algorithm(&self) -> JwsAlgorithm {
        self.alg
    }
}

impl VerifyingKey {
    /// The algorithm this key verifies.
    pub fn algorithm(&self) -> JwsAlgorithm {
        self.alg
    }
}

/// Key material for a specific algorithm.
///
/// A key built from a shared secret can both sign and verify. A key
/// built from a private key can only sign, and one built from a public
/// key can only verify.
#[derive(Debug, Clone)]
pub struct Key {
    algorithm: Algorithm,
    signing: Option<SigningKey>,
    verifying: Option<VerifyingKey>,
}

impl Key {
    /// Create a key for `algorithm`.
    ///
    /// For ECDSA and EdDSA, `input_key` must be a PEM encoded PKCS#8 private
    /// key or SubjectPublicKeyInfo public key, or a JSON Web Key. For HMAC
    /// it may be any string; the secret used is its BLAKE2b-256 digest, so
    /// passphrases are fine.
    pub fn new(algorithm: Algorithm, input_key: &str) -> Result<Self, Error> {
        if input_key.is_empty() {
            return Err(Error::EmptyKeyInput);
        }
        let alg = algorithm
            .jws()
            .map_err(|_| Error::UnsupportedAlgorithm(algorithm))?;

        let (signing, verifying) = if algorithm.is_symmetric() {
            let secret = Blake2b256::digest(input_key.as_bytes());
            let (signer, verifier) = engine::hmac_handles(&secret);
            (
                Some(SigningKey {
                    alg,
                    handle: Arc::new(signer),
                }),
                Some(VerifyingKey {
                    alg,
                    handle: Arc::new(verifier),
                }),
            )
        } else {
            match codec::parse(input_key)? {
                ParsedKey::Private(key) => {
                    check_family(algorithm, key.key_type().into())?;
                    let handle = engine::signer_from_private(alg, &key)?;
                    let signing = SigningKey {
                        alg,
                        handle: Arc::new(handle),
                    };
                    (Some(signing), None)
                }
                ParsedKey::Public(key) => {
                    check_family(algorithm, key.key_type().into())?;
                    let handle = engine::verifier_from_public(alg, &key)?;
                    let verifying = VerifyingKey {
                        alg,
                        handle: Arc::new(handle),
                    };
                    (None, Some(verifying))
                }
                ParsedKey::Other(tag) => {
                    tracing::debug!("PEM document {tag:?} holds no key");
                    return Err(Error::NoUsableKeyInstance);
                }
            }
        };

        Ok(Self {
            algorithm,
            signing,
            verifying,
        })
    }

    /// Create a key, inferring the algorithm from the key text.
    ///
    /// See [`Algorithm::infer`].
    pub fn infer(input_key: &str) -> Result<Self, Error> {
        Self::new(Algorithm::infer(input_key), input_key)
    }

    /// The algorithm this key was built for.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Returns true if this key can sign tokens.
    pub fn can_sign(&self) -> bool {
        self.signing.is_some()
    }

    /// Returns true if this key can verify tokens.
    pub fn can_verify(&self) -> bool {
        self.verifying.is_some()
    }

    /// The signing capability of this key.
    pub fn signing_key(&self) -> Result<&SigningKey, Error> {
        self.signing
            .as_ref()
            .ok_or(Error::SigningCapabilityRequired)
    }

    /// The verifying capability of this key.
    pub fn verifying_key(&self) -> Result<&VerifyingKey, Error> {
        self.verifying
            .as_ref()
            .ok_or(Error::VerificationCapabilityRequired)
    }
}

fn check_family(expected: Algorithm, found: Algorithm) -> Result<(), Error> {
    if expected != found {
        return Err(Error::AlgorithmMismatch { expected, found });
    }
    Ok(())
}
