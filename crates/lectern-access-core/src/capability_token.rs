//! Signed capability tokens
//!
//! Format: `base64url(json payload).base64url(hmac-sha256)`. The payload
//! carries a `kind` tag so a guest demo token never verifies as a play
//! token and vice versa.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lectern_types::{AccessType, CourseId, GuestId, ResourceId, UserId};

use crate::crypto::{HmacKey, HmacKeyError};

/// Capability token errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("bad signature")]
    BadSignature,

    #[error("token is not a {expected} token")]
    WrongKind { expected: &'static str },

    #[error("token expired")]
    Expired,

    #[error("failed to encode token: {0}")]
    Encode(String),
}

/// A guest's demo window for one course and access type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestDemoClaims {
    pub guest_id: GuestId,
    pub course_id: CourseId,
    pub access_type: AccessType,
    /// The one resource the demo unlocks
    pub resource_id: Option<ResourceId>,
    pub granted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl GuestDemoClaims {
    /// Whether these claims cover the given course and access type
    pub fn covers(&self, course_id: CourseId, access_type: AccessType) -> bool {
        self.course_id == course_id && self.access_type == access_type
    }

    /// Whether the window has closed at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        lectern_types::is_expired(self.expires_at, now)
    }
}

/// Who a play token was issued to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum PlaySubject {
    User(UserId),
    Guest(GuestId),
}

/// Short-lived permission to play or book one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayClaims {
    pub subject: PlaySubject,
    pub course_id: CourseId,
    pub resource_id: ResourceId,
    pub access_type: AccessType,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Payload of any capability token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapabilityClaims {
    GuestDemo(GuestDemoClaims),
    Play(PlayClaims),
}

/// Signs and verifies capability tokens
#[derive(Clone, Debug)]
pub struct CapabilitySigner {
    key: HmacKey,
}

impl CapabilitySigner {
    /// Create a signer from a secret of at least 32 bytes
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, HmacKeyError> {
        Ok(Self {
            key: HmacKey::new(secret)?,
        })
    }

    /// Sign claims into a token
    pub fn sign(&self, claims: &CapabilityClaims) -> Result<String, TokenError> {
        let json = serde_json::to_vec(claims).map_err(|e| TokenError::Encode(e.to_string()))?;
        let payload_b64 = URL_SAFE_NO_PAD.encode(json);
        let signature = URL_SAFE_NO_PAD.encode(self.key.sign(payload_b64.as_bytes()));
        Ok(format!("{payload_b64}.{signature}"))
    }

    /// Verify a token's signature and decode its claims
    pub fn decode(&self, token: &str) -> Result<CapabilityClaims, TokenError> {
        let (payload_b64, signature_b64) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed)?;

        if !self.key.verify(payload_b64.as_bytes(), &signature) {
            tracing::debug!("Capability token signature mismatch");
            return Err(TokenError::BadSignature);
        }

        let json = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::Malformed)?;
        serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)
    }

    /// Issue a guest demo token
    pub fn issue_guest_demo(&self, claims: GuestDemoClaims) -> Result<String, TokenError> {
        self.sign(&CapabilityClaims::GuestDemo(claims))
    }

    /// Verify a guest demo token.
    ///
    /// Expiry is not checked here: an expired window is still a valid
    /// statement about the guest and decides between "Demo Expired" and
    /// "sign up".
    pub fn verify_guest_demo(&self, token: &str) -> Result<GuestDemoClaims, TokenError> {
        match self.decode(token)? {
            CapabilityClaims::GuestDemo(claims) => Ok(claims),
            CapabilityClaims::Play(_) => Err(TokenError::WrongKind {
                expected: "guest demo",
            }),
        }
    }

    /// Issue a play token
    pub fn issue_play(&self, claims: PlayClaims) -> Result<String, TokenError> {
        self.sign(&CapabilityClaims::Play(claims))
    }

    /// Verify a play token and check it has not expired at `now`
    pub fn verify_play(&self, token: &str, now: DateTime<Utc>) -> Result<PlayClaims, TokenError> {
        let claims = match self.decode(token)? {
            CapabilityClaims::Play(claims) => claims,
            CapabilityClaims::GuestDemo(_) => {
                return Err(TokenError::WrongKind { expected: "play" })
            }
        };

        if lectern_types::is_expired(claims.expires_at, now) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn signer() -> CapabilitySigner {
        CapabilitySigner::new("test-capability-secret-0123456789ab").unwrap()
    }

    fn guest_claims(now: DateTime<Utc>) -> GuestDemoClaims {
        GuestDemoClaims {
            guest_id: GuestId::new(),
            course_id: CourseId::new(),
            access_type: AccessType::LectureRecording,
            resource_id: Some(ResourceId::new()),
            granted_at: now,
            expires_at: now + Duration::hours(24),
        }
    }

    fn play_claims(now: DateTime<Utc>) -> PlayClaims {
        PlayClaims {
            subject: PlaySubject::User(UserId::new()),
            course_id: CourseId::new(),
            resource_id: ResourceId::new(),
            access_type: AccessType::LiveClass,
            issued_at: now,
            expires_at: now + Duration::minutes(5),
        }
    }

    #[test]
    fn test_guest_token_verifies() {
        let now = Utc::now();
        let claims = guest_claims(now);
        let token = signer().issue_guest_demo(claims.clone()).unwrap();
        assert_eq!(signer().verify_guest_demo(&token).unwrap(), claims);
    }

    #[test]
    fn test_expired_guest_token_still_decodes() {
        let now = Utc::now();
        let claims = guest_claims(now - Duration::hours(30));
        let token = signer().issue_guest_demo(claims.clone()).unwrap();
        let decoded = signer().verify_guest_demo(&token).unwrap();
        assert!(decoded.is_expired(now));
    }

    #[test]
    fn test_other_key_rejected() {
        let now = Utc::now();
        let token = signer().issue_guest_demo(guest_claims(now)).unwrap();
        let other = CapabilitySigner::new("another-capability-secret-0123456789").unwrap();
        assert_eq!(other.verify_guest_demo(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_kinds_do_not_cross() {
        let now = Utc::now();
        let guest = signer().issue_guest_demo(guest_claims(now)).unwrap();
        let play = signer().issue_play(play_claims(now)).unwrap();

        assert!(matches!(
            signer().verify_play(&guest, now),
            Err(TokenError::WrongKind { .. })
        ));
        assert!(matches!(
            signer().verify_guest_demo(&play),
            Err(TokenError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_play_token_expiry() {
        let now = Utc::now();
        let claims = play_claims(now);
        let token = signer().issue_play(claims.clone()).unwrap();

        assert_eq!(signer().verify_play(&token, now).unwrap(), claims);
        assert_eq!(
            signer().verify_play(&token, claims.expires_at),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        assert_eq!(signer().decode("no-dot"), Err(TokenError::Malformed));
        assert_eq!(signer().decode("abc.!!!"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_signature_valid_but_payload_not_json() {
        let s = signer();
        let payload = URL_SAFE_NO_PAD.encode(b"not json");
        let sig = URL_SAFE_NO_PAD.encode(s.key.sign(payload.as_bytes()));
        assert_eq!(s.decode(&format!("{payload}.{sig}")), Err(TokenError::Malformed));
    }
}
