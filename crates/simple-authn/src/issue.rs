use serde::Serialize;

use crate::engine::{self, EngineError};
use crate::{Error, Key, SigningKey};

/// Create a signed token carrying `payload`.
///
/// The key must be able to sign: a private key or a shared secret.
/// `payload` is usually a [`Claims`](crate::Claims), or a caller type that
/// embeds one.
pub fn issue<T: Serialize + ?Sized>(key: &Key, payload: &T) -> Result<String, Error> {
    key.signing_key()?.sign(payload)
}

impl SigningKey {
    /// Create a signed token carrying `payload`.
    pub fn sign<T: Serialize + ?Sized>(&self, payload: &T) -> Result<String, Error> {
        let bytes = serde_json::to_vec(payload).map_err(EngineError::from)?;
        let token = engine::sign(self.alg, &self.handle, &bytes)?;
        Ok(token)
    }
}
