use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::AuthError;

/// Claims
///
/// Payload of an admin bearer token. `sub` is the admin's id, the stable reference;
/// `email` travels along so handlers can log who acted without a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub email: String,
    /// Issued At, seconds since the epoch.
    pub iat: i64,
    /// Expiration, seconds since the epoch. The token is dead once `now >= exp`.
    pub exp: i64,
}

/// The verified identity carried by a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub email: String,
}

/// A freshly signed token plus the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
    pub expires_at: DateTime<Utc>,
}

/// TokenService
///
/// Issues and verifies HS256 tokens with a single process-wide secret. There is no
/// revocation list: expiry is the only way a token stops working.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: chrono::Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("keys", &"[hidden]")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: chrono::Duration::from_std(lifetime).unwrap_or(chrono::Duration::hours(24)),
        }
    }

    pub fn issue(&self, user_id: i32, email: &str) -> Result<IssuedToken, AuthError> {
        self.issue_at(user_id, email, Utc::now())
    }

    /// issue_at
    ///
    /// Signs claims for `now` with `exp = now + lifetime`, both truncated to whole seconds.
    pub fn issue_at(
        &self,
        user_id: i32,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let iat = now.timestamp();
        let exp = iat + self.lifetime.num_seconds();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat,
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: DateTime::from_timestamp(exp, 0).unwrap_or(now + self.lifetime),
            claims,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// verify_at
    ///
    /// Checks the signature and structure first (`Malformed` on failure), then expiry
    /// against `now` (`Expired` when `now >= exp`). Expiry is checked here rather than by
    /// `jsonwebtoken`, whose rule is `exp < now - leeway`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, AuthError> {
        let claims = self.decode_claims(token)?;

        if now.timestamp() >= claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(Identity {
            user_id: claims.sub,
            email: claims.email,
        })
    }

    /// Decodes and checks the signature without looking at the clock.
    pub fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected bearer token");
                AuthError::Malformed
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn service() -> TokenService {
        TokenService::new("unit-test-secret", Duration::from_secs(24 * 60 * 60))
    }

    #[test]
    fn issued_token_round_trips_identity() {
        let tokens = service();
        let issued = tokens.issue(7, "admin@example.com").unwrap();

        let identity = tokens.verify(&issued.token).unwrap();

        assert_eq!(identity.user_id, 7);
        assert_eq!(identity.email, "admin@example.com");
    }

    #[test]
    fn expiry_is_exactly_issue_time_plus_lifetime() {
        let tokens = service();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let issued = tokens.issue_at(1, "a@example.com", now).unwrap();
        let claims = tokens.decode_claims(&issued.token).unwrap();

        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        assert_eq!(issued.expires_at, now + chrono::Duration::hours(24));
    }

    #[test]
    fn token_dies_at_the_expiry_instant() {
        let tokens = service();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let issued = tokens.issue_at(1, "a@example.com", now).unwrap();

        let just_before = now + chrono::Duration::hours(24) - chrono::Duration::seconds(1);
        assert!(tokens.verify_at(&issued.token, just_before).is_ok());

        let at_expiry = now + chrono::Duration::hours(24);
        assert!(matches!(
            tokens.verify_at(&issued.token, at_expiry),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn foreign_signature_is_malformed() {
        let other = TokenService::new("someone-else", Duration::from_secs(3600));
        let issued = other.issue(1, "a@example.com").unwrap();

        assert!(matches!(
            service().verify(&issued.token),
            Err(AuthError::Malformed)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            service().verify("not.a.token"),
            Err(AuthError::Malformed)
        ));
        assert!(matches!(service().verify(""), Err(AuthError::Malformed)));
    }
}
