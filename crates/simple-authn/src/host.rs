use serde::de::DeserializeOwned;

use crate::claims::{self, Claims};
use crate::{engine, Error, Key, VerifyingKey};

impl VerifyingKey {
    /// Check the token signature, returning the raw payload.
    ///
    /// Note: this does not validate the token timestamps.
    pub fn verify_signature(&self, token: &str) -> Result<Vec<u8>, Error> {
        engine::verify(self.alg, &self.handle, token)
    }
}

/// Verifies tokens on behalf of a relying party.
///
/// A token is accepted if its signature is valid and its `iat` lies within
/// the last `validity` seconds. `nbf` is honored if present. `exp` is handed
/// back to the caller unchecked.
#[derive(Debug, Clone)]
pub struct Host {
    key: VerifyingKey,
    validity: i64,
}

impl Host {
    /// Create a host that accepts tokens issued in the last `validity` seconds.
    ///
    /// The key must be able to verify: a public key or a shared secret.
    pub fn new(key: &Key, validity: u32) -> Result<Self, Error> {
        let key = key.verifying_key()?.clone();
        Ok(Self {
            key,
            validity: i64::from(validity),
        })
    }

    /// The validity window, in seconds.
    pub fn validity(&self) -> i64 {
        self.validity
    }

    /// Verify a token and decode its payload.
    ///
    /// `T` may be [`Claims`], a caller type embedding it, or any type that
    /// can be decoded from the payload.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, Error> {
        self.verify_at(token, claims::now())
    }

    /// Verify a token and return only its temporal claims.
    pub fn verify_claims(&self, token: &str) -> Result<Claims, Error> {
        self.verify(token)
    }

    /// Verify a token as if the current time were `now`.
    pub fn verify_at<T: DeserializeOwned>(&self, token: &str, now: i64) -> Result<T, Error> {
        let payload = self.key.verify_signature(token).map_err(|e| {
            tracing::debug!("rejected token: {e}");
            e
        })?;

        let claims: Claims = serde_json::from_slice(&payload).map_err(|e| {
            tracing::debug!("rejected token: payload is not a claims object");
            Error::MalformedPayload(e)
        })?;
        self.validate_timestamps(&claims, now)?;

        serde_json::from_slice(&payload).map_err(Error::MalformedPayload)
    }

    /// Validate the `iat` and `nbf` fields of a token payload.
    pub fn validate_timestamps(&self, claims: &Claims, now: i64) -> Result<(), Error> {
        // A token without iat can never be range checked.
        if claims.iat == 0 {
            tracing::debug!("rejected token: missing iat");
            return Err(Error::MissingIssuedAt);
        }

        // Accept iat in [now - validity, now].
        let diff = claims
            .iat
            .checked_sub(now)
            .and_then(|diff| diff.checked_add(self.validity));
        if !matches!(diff, Some(diff) if (0..=self.validity).contains(&diff)) {
            tracing::debug!(
                "rejected token: iat {} outside {}s window at {now}",
                claims.iat,
                self.validity
            );
            return Err(Error::ValidityWindowExceeded);
        }

        if let Some(nbf) = claims.nbf {
            if nbf != 0 && nbf > now {
                tracing::debug!("rejected token: nbf {nbf} is in the future");
                return Err(Error::NotYetValid);
            }
        }

        Ok(())
    }
}
