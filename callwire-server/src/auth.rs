//! Bearer-token authentication for the signaling endpoint.
//!
//! Tokens are HS256 JWTs carrying the numeric user id and role issued by the
//! platform's login flow. A verified request carries an [`Identity`] in its
//! extensions.

use crate::error::RelayError;
use async_trait::async_trait;
use axum::extract::{Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use callwire_core::UserId;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Who is on the other end of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("authorization token is required")]
    MissingToken,

    #[error("authorization header must be in the format 'Bearer {{token}}'")]
    MalformedHeader,

    #[error("token has expired")]
    Expired,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token generation failed: {0}")]
    Generation(String),
}

/// Turns a bearer token into an [`Identity`].
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Claims understood by [`JwtVerifier`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: u64,
    #[serde(default)]
    pub role: String,
    #[serde(rename = "twoFactorEnabled", default)]
    pub two_factor_enabled: bool,
    pub exp: u64,
}

/// HS256 verifier over a shared secret.
pub struct JwtVerifier {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            decoding: DecodingKey::from_secret(secret),
            encoding: EncodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::Invalid(e.to_string()),
            })
    }

    /// Signs a token for `user_id` valid for `ttl_secs` from now.
    pub fn issue(&self, user_id: UserId, role: &str, ttl_secs: u64) -> Result<String, AuthError> {
        let claims = Claims {
            user_id: user_id.0,
            role: role.to_owned(),
            two_factor_enabled: false,
            exp: jsonwebtoken::get_current_timestamp() + ttl_secs,
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Generation(e.to_string()))
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.decode(token)?;
        Ok(Identity {
            user_id: UserId(claims.user_id),
            role: claims.role,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    token: Option<String>,
}

/// Axum middleware: verifies the bearer token and stores the resulting
/// [`Identity`] in the request extensions.
///
/// Browsers cannot set headers on a WebSocket handshake, so `?token=` is
/// accepted when no `Authorization` header is present.
pub async fn authenticate(
    State(verifier): State<Arc<dyn TokenVerifier>>,
    Query(query): Query<TokenQuery>,
    mut request: Request,
    next: Next,
) -> Result<Response, RelayError> {
    let token = match request.headers().get(AUTHORIZATION) {
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_owned)
            .ok_or(AuthError::MalformedHeader)?,
        None => query.token.ok_or(AuthError::MissingToken)?,
    };

    let identity = verifier.verify(token.trim()).await.inspect_err(|e| {
        debug!(path = %request.uri().path(), "Rejected token: {}", e);
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
