use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::auth::AuthConfig;
use crate::handlers::auth::{AuthResponse, LoginRequest, RegisterRequest, RegisterResponse, UserResponse};
use crate::handlers::books::{BookResponse, CreateBookRequest, DeleteBookResponse, UpdateBookRequest};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Token signing and seed-login configuration
    pub auth: AuthConfig,
}

/// Error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::login,
        crate::handlers::auth::register,
        crate::handlers::books::get_books,
        crate::handlers::books::get_book,
        crate::handlers::books::create_book,
        crate::handlers::books::update_book,
        crate::handlers::books::delete_book,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            LoginRequest,
            RegisterRequest,
            UserResponse,
            AuthResponse,
            RegisterResponse,
            BookResponse,
            CreateBookRequest,
            UpdateBookRequest,
            DeleteBookResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and login"),
        (name = "books", description = "Catalog management endpoints"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Bookstore API",
        description = "Bookstore management API - registration, login, and role-gated catalog CRUD",
        version = "0.1.0",
    )
)]
pub struct ApiDoc;

/// Registers the bearer-token security scheme referenced by the mutating
/// catalog endpoints.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
