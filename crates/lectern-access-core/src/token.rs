//! Validation of access tokens issued by the hosted auth service

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use lectern_types::UserId;

use crate::{AccessConfig, AccessError};

/// Claims carried by a hosted auth access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Subject (user id)
    pub sub: String,
    pub email: Option<String>,
    /// Audience
    pub aud: Option<String>,
    /// Issuer
    pub iss: Option<String>,
    /// Issued at timestamp
    #[serde(default)]
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

impl AuthClaims {
    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Identity extracted from a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub user_id: UserId,
    pub email: Option<String>,
}

/// HS256 access token validator
#[derive(Clone)]
pub struct AuthTokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthTokenValidator {
    /// Create a validator from the shared secret, audience and issuer in `config`
    pub fn new(config: &AccessConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.jwt_audience.as_str()]);
        if let Some(issuer) = &config.jwt_issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }
        validation.leeway = 30;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Validate a bearer token and return the user it identifies
    pub fn validate(&self, token: &str) -> Result<VerifiedUser, AccessError> {
        let token_data =
            decode::<AuthClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::debug!("Token validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AccessError::TokenExpired,
                    _ => AccessError::InvalidToken,
                }
            })?;

        let claims = token_data.claims;
        let user_id = UserId::parse(&claims.sub).map_err(|_| {
            tracing::debug!("Token subject is not a uuid: {}", claims.sub);
            AccessError::InvalidToken
        })?;

        Ok(VerifiedUser {
            user_id,
            email: claims.email,
        })
    }
}

impl std::fmt::Debug for AuthTokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokenValidator")
            .field("audience", &self.validation.aud)
            .field("issuer", &self.validation.iss)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const JWT_SECRET: &str = "hosted-auth-secret";
    const CAP_SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn sign(claims: &AuthClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(sub: &str, aud: &str, exp_offset: i64) -> AuthClaims {
        let now = Utc::now().timestamp();
        AuthClaims {
            sub: sub.to_string(),
            email: Some("ada@example.com".to_string()),
            aud: Some(aud.to_string()),
            iss: None,
            iat: now,
            exp: now + exp_offset,
        }
    }

    #[test]
    fn test_valid_token() {
        let config = AccessConfig::try_new(JWT_SECRET, CAP_SECRET).unwrap();
        let validator = AuthTokenValidator::new(&config);
        let user_id = UserId::new();

        let token = sign(&claims(&user_id.to_string(), "authenticated", 3600), JWT_SECRET);
        let user = validator.validate(&token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = AccessConfig::try_new(JWT_SECRET, CAP_SECRET).unwrap();
        let validator = AuthTokenValidator::new(&config);

        let token = sign(&claims(&UserId::new().to_string(), "authenticated", 3600), "other");
        assert!(matches!(validator.validate(&token), Err(AccessError::InvalidToken)));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let config = AccessConfig::try_new(JWT_SECRET, CAP_SECRET).unwrap();
        let validator = AuthTokenValidator::new(&config);

        let token = sign(&claims(&UserId::new().to_string(), "anon", 3600), JWT_SECRET);
        assert!(matches!(validator.validate(&token), Err(AccessError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let config = AccessConfig::try_new(JWT_SECRET, CAP_SECRET).unwrap();
        let validator = AuthTokenValidator::new(&config);

        let token = sign(&claims(&UserId::new().to_string(), "authenticated", -3600), JWT_SECRET);
        assert!(matches!(validator.validate(&token), Err(AccessError::TokenExpired)));
    }

    #[test]
    fn test_non_uuid_subject_rejected() {
        let config = AccessConfig::try_new(JWT_SECRET, CAP_SECRET).unwrap();
        let validator = AuthTokenValidator::new(&config);

        let token = sign(&claims("not-a-uuid", "authenticated", 3600), JWT_SECRET);
        assert!(matches!(validator.validate(&token), Err(AccessError::InvalidToken)));
    }

    #[test]
    fn test_issuer_enforced_when_configured() {
        let config = AccessConfig::try_new(JWT_SECRET, CAP_SECRET)
            .unwrap()
            .with_issuer("https://auth.lectern.dev");
        let validator = AuthTokenValidator::new(&config);

        let token = sign(&claims(&UserId::new().to_string(), "authenticated", 3600), JWT_SECRET);
        assert!(validator.validate(&token).is_err());
    }
}
