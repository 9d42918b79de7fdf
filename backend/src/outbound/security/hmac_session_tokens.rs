//! HMAC-SHA256 signed session tokens.
//!
//! Format: `v1.<claims>.<signature>`, both segments base64url without
//! padding. The signature covers `v1.<claims>`. Claims are JSON:
//! `{"sub": uuid, "role": "ciudadano"|"operador", "iat": secs, "exp": secs}`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::domain::ports::{SessionTokenError, SessionTokens};
use crate::domain::{Role, SessionClaims, SessionToken, UserId};

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION: &str = "v1";
const MAX_TOKEN_LEN: usize = 1024;
/// Shortest signing secret accepted outside debug builds.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Serialize, Deserialize)]
struct WireClaims {
    sub: Uuid,
    role: Role,
    iat: i64,
    exp: i64,
}

/// Stateless token codec keyed by a shared secret.
pub struct HmacSessionTokens {
    secret: Zeroizing<Vec<u8>>,
}

impl HmacSessionTokens {
    /// Create a codec signing with `secret`.
    pub fn new(secret: Zeroizing<Vec<u8>>) -> Self {
        Self { secret }
    }

    fn mac(&self) -> Result<HmacSha256, SessionTokenError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|err| SessionTokenError::signing(err.to_string()))
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, SessionTokenError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(SessionTokenError::malformed)
}

impl SessionTokens for HmacSessionTokens {
    fn issue(&self, claims: &SessionClaims) -> Result<SessionToken, SessionTokenError> {
        let wire = WireClaims {
            sub: *claims.subject.as_uuid(),
            role: claims.role,
            iat: claims.issued_at.timestamp(),
            exp: claims.expires_at.timestamp(),
        };
        let payload = serde_json::to_vec(&wire)
            .map_err(|err| SessionTokenError::signing(err.to_string()))?;
        let signed = format!("{TOKEN_VERSION}.{}", URL_SAFE_NO_PAD.encode(payload));
        let mut mac = self.mac()?;
        mac.update(signed.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(SessionToken::new(format!("{signed}.{signature}")))
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionTokenError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(SessionTokenError::malformed());
        }
        let (signed, signature) = token.rsplit_once('.').ok_or_else(SessionTokenError::malformed)?;
        let (version, payload) = signed.split_once('.').ok_or_else(SessionTokenError::malformed)?;
        if version != TOKEN_VERSION || payload.is_empty() {
            return Err(SessionTokenError::malformed());
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| SessionTokenError::malformed())?;
        let mut mac = self.mac()?;
        mac.update(signed.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SessionTokenError::bad_signature())?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| SessionTokenError::malformed())?;
        let wire: WireClaims =
            serde_json::from_slice(&payload).map_err(|_| SessionTokenError::malformed())?;
        let claims = SessionClaims {
            subject: UserId::from_uuid(wire.sub),
            role: wire.role,
            issued_at: timestamp(wire.iat)?,
            expires_at: timestamp(wire.exp)?,
        };
        if claims.is_expired(now) {
            return Err(SessionTokenError::expired());
        }
        Ok(claims)
    }
}
