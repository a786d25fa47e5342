//! Password hashing and access tokens.
//!
//! Passwords are hashed with bcrypt on actix's blocking thread pool, so a slow hash never stalls a worker.
//! Access tokens are HS256 JWTs. A token is accepted from either the `Authorization: Bearer` header or the `token`
//! cookie; the [`JwtClaims`] extractor rejects requests that carry neither with a 401.
use std::{
    future::{ready, Ready},
    time::Duration,
};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

/// The name of the cookie that carries the access token.
pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user's login
    pub sub: String,
    pub exp: u64,
    pub iat: u64,
}

impl JwtClaims {
    pub fn login(&self) -> &str {
        &self.sub
    }
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenIssuer (expiry: {}s)", self.expiry.as_secs())
    }
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            expiry: config.token_expiry,
        }
    }

    /// Issue a new access token for `login`.
    /// This method DOES NOT check the user's credentials. That must be done prior to calling `issue_token`.
    pub fn issue_token(&self, login: &str) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp().max(0) as u64;
        let claims = JwtClaims { sub: login.to_string(), iat, exp: iat + self.expiry.as_secs() };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))
    }

    /// Checks the token signature and expiry, and returns its claims.
    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::ValidationError(e.to_string()))
    }
}

fn token_from_request(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string());
    bearer.or_else(|| req.cookie(TOKEN_COOKIE).map(|c| c.value().to_string()))
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let Some(issuer) = req.app_data::<web::Data<TokenIssuer>>() else {
            error!("🔑️ No token issuer has been configured. Rejecting all authenticated requests.");
            return ready(Err(ServerError::InitializeError("Token issuer is not configured".into())));
        };
        let result = match token_from_request(req) {
            Some(token) => issuer.validate(&token),
            None => Err(AuthError::MissingToken),
        };
        if let Err(e) = &result {
            debug!("🔑️ Rejected request to {}. {e}", req.path());
        }
        ready(result.map_err(ServerError::from))
    }
}

/// Hashes `password` with bcrypt on the blocking thread pool.
pub async fn hash_password(password: String, cost: u32) -> Result<String, AuthError> {
    web::block(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::HashingError(e.to_string()))?
        .map_err(|e| AuthError::HashingError(e.to_string()))
}

/// Checks `password` against a stored bcrypt hash on the blocking thread pool. Hashes that cannot be parsed never
/// match.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    let matched = web::block(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::HashingError(e.to_string()))?
        .unwrap_or_else(|e| {
            warn!("🔑️ Stored password hash could not be read. {e}");
            false
        });
    Ok(matched)
}
