//! Credential handling and the signed session token.
//!
//! Passwords are stored as bcrypt hashes (cost 10). Login issues a signed
//! bearer token (HS256) carrying the user's id, email, and role; mutating
//! catalog endpoints verify that token server-side instead of trusting any
//! client-held role claim.

use std::fmt;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::Json,
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use model::entities::user::{self, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::schemas::{AppState, ErrorResponse};

/// Bcrypt cost factor used for all stored password hashes.
pub const BCRYPT_COST: u32 = 10;

/// Issued tokens expire after this many hours.
const TOKEN_TTL_HOURS: i64 = 24;

/// A demo account with well-known literal credentials.
pub struct SeedAccount {
    pub name: &'static str,
    pub email: &'static str,
    pub password: &'static str,
    pub role: Role,
}

/// The two demo accounts. At login these pairs are compared verbatim before
/// any hash verification, so they authenticate regardless of the stored hash.
/// Gated by `AuthConfig::seed_logins_enabled`.
pub const SEED_ACCOUNTS: [SeedAccount; 2] = [
    SeedAccount {
        name: "Admin User",
        email: "admin@bookstore.com",
        password: "password123",
        role: Role::Admin,
    },
    SeedAccount {
        name: "Demo User",
        email: "user@bookstore.com",
        password: "user123",
        role: Role::User,
    },
];

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid or expired token")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("password hashing failed")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Claims carried by the signed bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i32,
    pub email: String,
    pub role: Role,
    /// Expiry as a unix timestamp.
    pub exp: usize,
}

/// Token signing configuration, part of the shared application state.
#[derive(Clone)]
pub struct AuthConfig {
    jwt_secret: String,
    pub seed_logins_enabled: bool,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("seed_logins_enabled", &self.seed_logins_enabled)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: String, seed_logins_enabled: bool) -> Self {
        Self {
            jwt_secret,
            seed_logins_enabled,
        }
    }

    /// Sign a token for a successfully authenticated user.
    pub fn issue_token(&self, user: &user::Model) -> Result<String, AuthError> {
        let exp = (Utc::now() + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize;
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            exp,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Verify a bearer token and return its claims. Expiry is checked.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }

    /// Literal credential check for the demo seed accounts.
    pub fn is_seed_login(&self, email: &str, password: &str) -> bool {
        self.seed_logins_enabled
            && SEED_ACCOUNTS
                .iter()
                .any(|seed| seed.email == email && seed.password == password)
    }
}

/// Hash a plaintext password for storage.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

/// Compare a submitted password against a stored hash. A malformed stored
/// hash (e.g. a seeded placeholder) counts as a mismatch, not an error.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    bcrypt::verify(password, stored_hash).unwrap_or(false)
}

fn unauthorized(message: &str, code: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Extractor for any authenticated caller: requires a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                debug!("Request without bearer token rejected");
                unauthorized("Authentication required", "UNAUTHORIZED")
            })?;

        match state.auth.verify_token(token) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(e) => {
                debug!("Token verification failed: {}", e);
                Err(unauthorized("Invalid or expired token", "INVALID_TOKEN"))
            }
        }
    }
}

/// Extractor for catalog mutations: requires a valid token with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if claims.role != Role::Admin {
            warn!("User {} denied admin-only operation", claims.sub);
            return Err((
                StatusCode::FORBIDDEN,
                Json(ErrorResponse {
                    error: "Admin role required".to_string(),
                    code: "FORBIDDEN".to_string(),
                    success: false,
                }),
            ));
        }
        Ok(AdminUser(claims))
    }
}
