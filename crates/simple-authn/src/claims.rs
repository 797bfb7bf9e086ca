use std::fmt::{self, Display};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Deserializer, Serialize};

/// The temporal claims carried by every token.
///
/// Application claims are added by embedding this struct with
/// `#[serde(flatten)]`:
///
/// ```
/// use serde::{Deserialize, Deserializer, Serialize};
/// use simple_authn::Claims;
///
/// #[derive(Serialize, Deserialize)]
/// struct RoleClaims {
///     #[serde(flatten)]
///     claims: Claims,
///     role: String,
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issued at, as a UTC timestamp. Hosts bound token lifetime by this.
    ///
    /// Absent or `null` decodes as 0, which hosts treat as missing.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub iat: i64,
    /// Not before, as a UTC timestamp. Zero means unset.
    #[serde(default, skip_serializing_if = "is_unset")]
    pub nbf: Option<i64>,
    /// Expiry, as a UTC timestamp. Zero means unset.
    ///
    /// Hosts do not enforce this; see [`Claims::is_expired_at`].
    #[serde(default, skip_serializing_if = "is_unset")]
    pub exp: Option<i64>,
    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Option::<i64>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn is_unset(timestamp: &Option<i64>) -> bool {
    matches!(timestamp, None | Some(0))
}

impl Claims {
    /// Claims issued now, usable immediately, expiring after `expiry`.
    pub fn new(expiry: Duration) -> Self {
        let iat = now();
        let lifetime = i64::try_from(expiry.as_secs()).unwrap_or(i64::MAX);
        Self {
            iat,
            nbf: Some(iat),
            exp: Some(iat.saturating_add(lifetime)),
            iss: None,
        }
    }

    /// Claims with only the issue time set.
    pub fn issued_at(iat: i64) -> Self {
        Self {
            iat,
            ..Default::default()
        }
    }

    /// Set the not-before time.
    pub fn with_not_before(mut self, nbf: i64) -> Self {
        self.nbf = Some(nbf);
        self
    }

    /// Set the expiry time.
    pub fn with_expiry(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Set the issuer.
    pub fn with_issuer(mut self, iss: impl Into<String>) -> Self {
        self.iss = Some(iss.into());
        self
    }

    /// Returns true if `exp` is set and is before `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        matches!(self.exp, Some(exp) if exp != 0 && exp < now)
    }
}

impl Display for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// The current UTC time, in seconds since the Unix epoch.
pub fn now() -> i64 {
    let since_epoch = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from(since_epoch.as_secs()).unwrap_or(i64::MAX)
}
