//! Survey credentials
//!
//! Short-lived HS256 tokens binding a survey id to one conversation. The
//! survey service validates them; nothing here refreshes an expired one.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fixed `sub` claim the survey service expects from this bot
pub const CREDENTIAL_SUBJECT: &str = "telegramSurveityBot";

/// Validity window of a freshly issued credential
pub const CREDENTIAL_TTL_HOURS: i64 = 2;

/// Token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub exp: i64,
    pub iat: i64,
    pub test_id: String,
    pub sub: String,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to sign credential: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("invalid credential: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("credential timestamp out of range")]
    TimestampOutOfRange,
}

/// A signed credential
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Credential {
    /// The encoded token, sent as the bearer value
    pub fn token(&self) -> &str {
        &self.token
    }

    #[allow(dead_code)] // Diagnostics
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Mints and verifies credentials with a shared secret
pub struct CredentialIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl CredentialIssuer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(CREDENTIAL_TTL_HOURS),
        }
    }

    /// Issue a credential for `test_id`, valid from now
    pub fn issue(&self, test_id: &str) -> Result<Credential, CredentialError> {
        self.issue_at(test_id, Utc::now())
    }

    /// Issue a credential as if minted at `now`
    pub fn issue_at(&self, test_id: &str, now: DateTime<Utc>) -> Result<Credential, CredentialError> {
        // Claims carry whole seconds; keep the struct in step with the token
        let issued_at = Utc
            .timestamp_opt(now.timestamp(), 0)
            .single()
            .ok_or(CredentialError::TimestampOutOfRange)?;
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or(CredentialError::TimestampOutOfRange)?;

        let claims = Claims {
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            test_id: test_id.to_string(),
            sub: CREDENTIAL_SUBJECT.to_string(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(CredentialError::Signing)?;

        Ok(Credential {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Decode a token, checking signature, subject and expiry
    #[allow(dead_code)] // Diagnostics
    pub fn verify(&self, token: &str) -> Result<Claims, CredentialError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);
        validation.sub = Some(CREDENTIAL_SUBJECT.to_string());

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(CredentialError::Invalid)
    }
}
