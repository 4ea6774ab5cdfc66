//! HS256 token issue/verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use nova_core::UserId;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

/// Verifies bearer tokens (transport-agnostic).
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// A freshly signed token and its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: JwtClaims,
    pub max_age_secs: i64,
}

/// Shared-secret HS256 issuer and validator.
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256Jwt {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, sub: UserId, now: DateTime<Utc>) -> Result<IssuedToken, TokenValidationError> {
        let claims = JwtClaims::new(sub, now, now + self.ttl);
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;
        Ok(IssuedToken {
            token,
            claims,
            max_age_secs: self.ttl.num_seconds(),
        })
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks run against the caller's clock in `validate_claims`.
        validation.validate_exp = false;

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_validates_until_expiry() {
        let jwt = Hs256Jwt::new(b"test-secret", Duration::minutes(10));
        let now = Utc::now();
        let user = UserId::new();
        let issued = jwt.issue(user, now).unwrap();

        let claims = jwt.validate(&issued.token, now).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(issued.max_age_secs, 600);

        let later = now + Duration::minutes(11);
        assert_eq!(
            jwt.validate(&issued.token, later),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let now = Utc::now();
        let issued = Hs256Jwt::new(b"a", Duration::minutes(10))
            .issue(UserId::new(), now)
            .unwrap();
        let other = Hs256Jwt::new(b"b", Duration::minutes(10));
        assert!(matches!(
            other.validate(&issued.token, now),
            Err(TokenValidationError::Malformed(_))
        ));
    }
}
