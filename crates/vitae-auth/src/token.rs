//! Email confirmation tokens.
//!
//! A token is an HS256-signed JWT carrying the email address, a purpose
//! tag and an expiry. The signing key is the application secret combined
//! with the password salt, so rotating either invalidates outstanding links.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use vitae_core::{Error, Result};

const CONFIRM_PURPOSE: &str = "email-confirm";

/// Claims carried by a confirmation token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationClaims {
    /// Email address being confirmed.
    pub sub: String,
    pub purpose: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Issues and checks email confirmation tokens.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    max_age_secs: u64,
}

impl TokenSigner {
    pub fn new(key: &str, max_age_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(key.as_bytes()),
            decoding: DecodingKey::from_secret(key.as_bytes()),
            max_age_secs,
        }
    }

    /// Create a token confirming `email`.
    pub fn generate_confirmation_token(&self, email: &str) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let exp = i64::try_from(self.max_age_secs)
            .ok()
            .and_then(|age| now.checked_add(age))
            .ok_or_else(|| Error::Token("Token lifetime out of range".into()))?;
        let claims = ConfirmationClaims {
            sub: email.to_string(),
            purpose: CONFIRM_PURPOSE.to_string(),
            iat: now,
            exp,
        };
        self.sign(&claims)
    }

    /// Check a token and return the email it confirms.
    pub fn confirm_token(&self, token: &str) -> Result<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<ConfirmationClaims>(token, &self.decoding, &validation)
            .map_err(|e| Error::Token(format!("Invalid confirmation token: {}", e)))?;

        if data.claims.purpose != CONFIRM_PURPOSE {
            debug!("Rejected token with purpose {}", data.claims.purpose);
            return Err(Error::Token("Token was not issued for email confirmation".into()));
        }
        Ok(data.claims.sub)
    }

    fn sign(&self, claims: &ConfirmationClaims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| Error::Token(format!("Failed to sign token: {}", e)))
    }
}
