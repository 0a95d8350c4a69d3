use crate::handlers::{
    auth::{login, register},
    books::{create_book, delete_book, get_book, get_books, update_book},
    health::health_check,
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Auth routes
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        // Catalog CRUD routes
        .route("/books", post(create_book))
        .route("/books", get(get_books))
        .route("/books/:book_id", get(get_book))
        .route("/books/:book_id", put(update_book))
        .route("/books/:book_id", delete(delete_book))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
