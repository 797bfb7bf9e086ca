//! Short-lived signed authentication tokens.
//!
//! A caller holding a private key or shared secret issues a signed token
//! carrying a claims payload. A relying party holding the matching public key
//! or shared secret verifies the signature, checks that the token was issued
//! recently enough, and only then hands back the payload.
//!
//! ```
//! use simple_authn::{issue, Algorithm, Claims, Host, Key};
//!
//! let key = Key::new(Algorithm::Hs256, "super-secret-key")?;
//! let host = Host::new(&key, 30)?;
//!
//! let token = issue(&key, &Claims::new(std::time::Duration::from_secs(120)))?;
//! let claims: Claims = host.verify(&token)?;
//! assert!(claims.iat > 0);
//! # Ok::<(), simple_authn::Error>(())
//! ```
//!
//! Tokens are compact JWS (`header.payload.signature`). Supported algorithms
//! are HMAC (HS256/HS384/HS512), ECDSA (ES256/ES384/ES512) and EdDSA.

pub mod codec;

mod algorithm;
mod claims;
mod engine;
mod error;
mod host;
mod issue;
mod key;

pub use algorithm::{Algorithm, JwsAlgorithm};
pub use claims::{now, Claims};
pub use engine::EngineError;
pub use error::Error;
pub use host::Host;
pub use issue::issue;
pub use key::{Key, SigningKey, VerifyingKey};
