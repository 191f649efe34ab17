use crate::rest::controllers::ApiError;
use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode, header};
use beacon_core::{BeaconError, Result};
use std::collections::HashMap;

/// Resolves an opaque bearer token to an authenticated user id.
///
/// How tokens are minted is a deployment concern (an identity provider or
/// auth proxy); the server only consumes them through this seam.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<String>;
}

/// Fixed token-to-user mapping for development and tests.
#[derive(Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), user_id.into());
        self
    }

    /// Parse `token=user` pairs separated by commas, the format of the
    /// `BEACON_API_TOKENS` environment variable.
    pub fn from_pairs(spec: &str) -> Result<Self> {
        let mut verifier = Self::new();
        for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (token, user_id) = pair
                .split_once('=')
                .ok_or_else(|| BeaconError::Config(format!("malformed token pair {pair:?}")))?;
            verifier.tokens.insert(token.trim().to_string(), user_id.trim().to_string());
        }
        Ok(verifier)
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<String> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| BeaconError::Session("unknown token".to_string()))
    }
}

/// Extract and verify the bearer token from request headers.
///
/// Missing header or token is 401, a token the verifier rejects is 403.
pub async fn require_user(
    headers: &HeaderMap,
    verifier: &dyn TokenVerifier,
) -> std::result::Result<String, ApiError> {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            ApiError::new(StatusCode::UNAUTHORIZED, "authorization header missing")
        })?;

    let token = header_value
        .strip_prefix("Bearer ")
        .or_else(|| header_value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "token missing"))?;

    verifier
        .verify(token)
        .await
        .map_err(|_| ApiError::new(StatusCode::FORBIDDEN, "invalid token"))
}
