//! Bearer-token authentication.
//!
//! The HTTP layer only knows the [`AuthVerifier`] contract: given the
//! credentials from the `Authorization` header, produce a verified user id
//! or fail. Two implementations ship here — a stateless HMAC-signed token
//! verifier for deployments and a fixed-map verifier for tests and demos.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use grimoire_core::{AuthVerifier, Error, Result};

use crate::{ApiError, AppState};

type HmacSha256 = Hmac<Sha256>;

const TOKEN_PREFIX: &str = "gr_";

// =============================================================================
// EXTRACTOR
// =============================================================================

/// Extractor for authenticated requests.
///
/// Reads `Authorization: Bearer …`, delegates to the injected verifier, and
/// attaches the verified principal. Missing or failed credentials reject
/// with 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let token = match auth_header {
            Some(h) if h.starts_with("Bearer ") => h.trim_start_matches("Bearer ").trim(),
            _ => {
                return Err(ApiError::Unauthorized(
                    "Authentication required".to_string(),
                ))
            }
        };

        let user_id = state
            .verifier
            .verify(token)
            .await
            .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

        Ok(AuthUser { user_id })
    }
}

// =============================================================================
// VERIFIERS
// =============================================================================

/// Stateless bearer tokens: `gr_<user id>.<hex hmac-sha256>`.
///
/// The signature covers the raw user id bytes, keyed by the server secret,
/// so tokens survive restarts without a session table. Verification is
/// constant-time via `Mac::verify_slice`.
pub struct HmacTokenVerifier {
    key: Vec<u8>,
}

impl HmacTokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    /// Mint a token for `user_id`. Operator-facing: how clients get
    /// provisioned is upstream's concern.
    pub fn mint(&self, user_id: Uuid) -> String {
        format!(
            "{}{}.{}",
            TOKEN_PREFIX,
            user_id.simple(),
            hex::encode(self.sign(user_id))
        )
    }

    fn sign(&self, user_id: Uuid) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(user_id.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

#[async_trait]
impl AuthVerifier for HmacTokenVerifier {
    async fn verify(&self, credentials: &str) -> Result<Uuid> {
        let unauthorized = || Error::Unauthorized("invalid token".to_string());

        let rest = credentials.strip_prefix(TOKEN_PREFIX).ok_or_else(unauthorized)?;
        let (user_part, sig_part) = rest.split_once('.').ok_or_else(unauthorized)?;
        let user_id = Uuid::parse_str(user_part).map_err(|_| unauthorized())?;
        let sig = hex::decode(sig_part).map_err(|_| unauthorized())?;

        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(user_id.as_bytes());
        mac.verify_slice(&sig)
            .map_err(|_| Error::Unauthorized("invalid token signature".to_string()))?;

        Ok(user_id)
    }
}

/// Fixed token→user map for tests and demo seeds.
#[derive(Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Uuid>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, user_id: Uuid) -> Self {
        self.tokens.insert(token.into(), user_id);
        self
    }
}

#[async_trait]
impl AuthVerifier for StaticTokenVerifier {
    async fn verify(&self, credentials: &str) -> Result<Uuid> {
        self.tokens
            .get(credentials)
            .copied()
            .ok_or_else(|| Error::Unauthorized("unknown token".to_string()))
    }
}
