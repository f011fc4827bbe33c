//! Google ID token verification
//!
//! Verifies client-obtained Google ID tokens against the tokeninfo endpoint
//! rather than validating locally; Google rotates its signing keys and the
//! endpoint rejects expired or tampered tokens for us.

use serde::Deserialize;
use thiserror::Error;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Errors from Google token verification
#[derive(Error, Debug)]
pub enum GoogleAuthError {
    #[error("Token rejected by Google: {0}")]
    Rejected(String),

    #[error("Token audience mismatch")]
    AudienceMismatch,

    #[error("tokeninfo request failed: {0}")]
    RequestFailed(String),
}

/// The subset of tokeninfo fields the marketplace cares about
#[derive(Debug, Deserialize)]
pub struct GoogleProfile {
    /// Google's stable subject identifier for the account
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub aud: String,
}

/// Verifier for Google sign-in ID tokens
#[derive(Clone)]
pub struct GoogleTokenVerifier {
    http: reqwest::Client,
    client_id: Option<String>,
}

impl GoogleTokenVerifier {
    /// `client_id` binds accepted tokens to our OAuth client; when `None`
    /// the audience check is skipped (development only).
    pub fn new(client_id: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
        }
    }

    /// Verify an ID token and return the Google profile it asserts.
    pub async fn verify(&self, id_token: &str) -> Result<GoogleProfile, GoogleAuthError> {
        let response = self
            .http
            .get(TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| GoogleAuthError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GoogleAuthError::Rejected(format!(
                "tokeninfo returned {}",
                status
            )));
        }

        let profile: GoogleProfile = response
            .json()
            .await
            .map_err(|e| GoogleAuthError::RequestFailed(e.to_string()))?;

        if let Some(expected) = &self.client_id {
            if &profile.aud != expected {
                return Err(GoogleAuthError::AudienceMismatch);
            }
        }

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_deserializes_tokeninfo_shape() {
        let body = r#"{
            "sub": "110169484474386276334",
            "email": "person@example.com",
            "name": "A Person",
            "aud": "client-123.apps.googleusercontent.com",
            "iss": "https://accounts.google.com"
        }"#;

        let profile: GoogleProfile = serde_json::from_str(body).unwrap();
        assert_eq!(profile.sub, "110169484474386276334");
        assert_eq!(profile.email.as_deref(), Some("person@example.com"));
        assert_eq!(profile.aud, "client-123.apps.googleusercontent.com");
    }

    #[test]
    fn test_profile_tolerates_missing_optional_fields() {
        let body = r#"{"sub": "123"}"#;
        let profile: GoogleProfile = serde_json::from_str(body).unwrap();
        assert!(profile.email.is_none());
        assert!(profile.name.is_none());
        assert!(profile.aud.is_empty());
    }
}
