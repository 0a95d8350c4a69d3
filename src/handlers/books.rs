use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use model::entities::{book, user};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::auth::AdminUser;
use crate::schemas::{AppState, ErrorResponse};

/// Request body for creating a new book
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub description: Option<String>,
    /// URL of the cover image
    pub cover_image: Option<String>,
    pub stock_quantity: i32,
    /// ID of the user recorded as the creator
    pub created_by: Option<i32>,
}

/// Request body for updating a book.
///
/// Updates are a full replace of the mutable fields, not a merge: optional
/// fields absent from the request become NULL on the stored row.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateBookRequest {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub stock_quantity: i32,
}

/// Book response model, enriched with the creator's display name.
#[derive(Debug, Serialize, FromQueryResult, ToSchema)]
pub struct BookResponse {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub stock_quantity: i32,
    pub created_by: Option<i32>,
    #[schema(value_type = String)]
    pub created_at: chrono::NaiveDateTime,
    /// Display name of the creating user; null when the creator is absent.
    pub created_by_name: Option<String>,
}

/// Confirmation returned by a successful delete
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteBookResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "deletedId")]
    pub deleted_id: i32,
}

fn error_response(
    status: StatusCode,
    error: &str,
    code: &str,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: code.to_string(),
            success: false,
        }),
    )
}

fn book_not_found() -> (StatusCode, Json<ErrorResponse>) {
    error_response(StatusCode::NOT_FOUND, "Book not found", "BOOK_NOT_FOUND")
}

fn internal_error() -> (StatusCode, Json<ErrorResponse>) {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
        "DATABASE_ERROR",
    )
}

/// Base select for catalog reads: every book row plus the creator's display
/// name resolved through a left join, so missing creators yield null.
fn with_creator() -> Select<book::Entity> {
    book::Entity::find()
        .column_as(user::Column::Name, "created_by_name")
        .join(JoinType::LeftJoin, book::Relation::User.def())
}

/// List the whole catalog, newest first
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "Books retrieved successfully", body = Vec<BookResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_books(
    State(state): State<AppState>,
) -> Result<Json<Vec<BookResponse>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_books function");

    // id is the tiebreak so same-second inserts still list newest first
    match with_creator()
        .order_by_desc(book::Column::CreatedAt)
        .order_by_desc(book::Column::Id)
        .into_model::<BookResponse>()
        .all(&state.db)
        .await
    {
        Ok(books) => {
            info!("Fetched {} books", books.len());
            Ok(Json(books))
        }
        Err(db_error) => {
            error!("Failed to fetch books: {}", db_error);
            Err(internal_error())
        }
    }
}

/// Get a single book by ID
#[utoipa::path(
    get,
    path = "/books/{book_id}",
    tag = "books",
    params(
        ("book_id" = i32, Path, description = "Book ID"),
    ),
    responses(
        (status = 200, description = "Book retrieved successfully", body = BookResponse),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_book(
    Path(book_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<BookResponse>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_book function for book_id: {}", book_id);

    match with_creator()
        .filter(book::Column::Id.eq(book_id))
        .into_model::<BookResponse>()
        .one(&state.db)
        .await
    {
        Ok(Some(book)) => {
            debug!("Retrieved book ID {}: {}", book.id, book.title);
            Ok(Json(book))
        }
        Ok(None) => {
            warn!("Book with ID {} not found", book_id);
            Err(book_not_found())
        }
        Err(db_error) => {
            error!("Failed to fetch book with ID {}: {}", book_id, db_error);
            Err(internal_error())
        }
    }
}

/// Create a new book (admin only)
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBookRequest,
    security(("bearer_token" = [])),
    responses(
        (status = 201, description = "Book created successfully", body = BookResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(title = %request.title))]
pub async fn create_book(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(request): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering create_book function");
    debug!(
        "Creating book '{}' by '{}', requested by admin ID {}",
        request.title, request.author, admin.0.sub
    );

    let new_book = book::ActiveModel {
        title: Set(request.title.clone()),
        author: Set(request.author.clone()),
        isbn: Set(request.isbn.clone()),
        price: Set(request.price),
        description: Set(request.description.clone()),
        cover_image: Set(request.cover_image.clone()),
        stock_quantity: Set(request.stock_quantity),
        created_by: Set(request.created_by),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    let inserted = match new_book.insert(&state.db).await {
        Ok(book_model) => book_model,
        Err(db_error) => {
            error!("Failed to create book '{}': {}", request.title, db_error);
            return Err(internal_error());
        }
    };

    info!("Book created with ID: {}", inserted.id);

    // Re-read with the join so the response carries created_by_name
    match with_creator()
        .filter(book::Column::Id.eq(inserted.id))
        .into_model::<BookResponse>()
        .one(&state.db)
        .await
    {
        Ok(Some(book)) => Ok((StatusCode::CREATED, Json(book))),
        Ok(None) => {
            error!("Book ID {} vanished between insert and re-read", inserted.id);
            Err(internal_error())
        }
        Err(db_error) => {
            error!("Failed to re-read book ID {}: {}", inserted.id, db_error);
            Err(internal_error())
        }
    }
}

/// Replace a book's mutable fields (admin only)
#[utoipa::path(
    put,
    path = "/books/{book_id}",
    tag = "books",
    params(
        ("book_id" = i32, Path, description = "Book ID"),
    ),
    request_body = UpdateBookRequest,
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Book updated successfully", body = BookResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_book(
    admin: AdminUser,
    Path(book_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateBookRequest>,
) -> Result<Json<BookResponse>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering update_book function for book_id: {}", book_id);
    debug!("Update requested by admin ID {}", admin.0.sub);

    let existing = match book::Entity::find_by_id(book_id).one(&state.db).await {
        Ok(Some(book)) => book,
        Ok(None) => {
            warn!("Book with ID {} not found for update", book_id);
            return Err(book_not_found());
        }
        Err(db_error) => {
            error!("Failed to look up book ID {} for update: {}", book_id, db_error);
            return Err(internal_error());
        }
    };

    // Full replace: every mutable field is overwritten, optional fields
    // absent from the request end up NULL. created_by and created_at stay.
    let mut book_active: book::ActiveModel = existing.into();
    book_active.title = Set(request.title);
    book_active.author = Set(request.author);
    book_active.isbn = Set(request.isbn);
    book_active.price = Set(request.price);
    book_active.description = Set(request.description);
    book_active.cover_image = Set(request.cover_image);
    book_active.stock_quantity = Set(request.stock_quantity);

    if let Err(db_error) = book_active.update(&state.db).await {
        error!("Failed to update book with ID {}: {}", book_id, db_error);
        return Err(internal_error());
    }

    info!("Book with ID {} updated successfully", book_id);

    match with_creator()
        .filter(book::Column::Id.eq(book_id))
        .into_model::<BookResponse>()
        .one(&state.db)
        .await
    {
        Ok(Some(book)) => Ok(Json(book)),
        Ok(None) => {
            error!("Book ID {} vanished between update and re-read", book_id);
            Err(internal_error())
        }
        Err(db_error) => {
            error!("Failed to re-read book ID {}: {}", book_id, db_error);
            Err(internal_error())
        }
    }
}

/// Delete a book (admin only)
#[utoipa::path(
    delete,
    path = "/books/{book_id}",
    tag = "books",
    params(
        ("book_id" = String, Path, description = "Book ID, must parse as a positive integer"),
    ),
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Book deleted successfully", body = DeleteBookResponse),
        (status = 400, description = "Invalid book ID", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_book(
    admin: AdminUser,
    Path(raw_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DeleteBookResponse>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering delete_book function for raw id: {}", raw_id);
    debug!("Delete requested by admin ID {}", admin.0.sub);

    // The id arrives as a path segment; reject anything that is not a
    // positive integer before touching the database.
    let book_id = match raw_id.parse::<i32>() {
        Ok(id) if id > 0 => id,
        _ => {
            warn!("Rejected invalid book id: {}", raw_id);
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                &format!("Invalid book ID: {raw_id}. Must be a positive number."),
                "INVALID_BOOK_ID",
            ));
        }
    };

    // A single conditional delete closes the check-then-delete race: the
    // affected-row count is the existence check.
    match book::Entity::delete_by_id(book_id).exec(&state.db).await {
        Ok(delete_result) => {
            debug!(
                "Delete operation completed. Rows affected: {}",
                delete_result.rows_affected
            );
            if delete_result.rows_affected > 0 {
                info!("Book with ID {} deleted successfully", book_id);
                Ok(Json(DeleteBookResponse {
                    success: true,
                    message: "Book deleted successfully".to_string(),
                    deleted_id: book_id,
                }))
            } else {
                warn!("Book with ID {} not found for deletion", book_id);
                Err(book_not_found())
            }
        }
        Err(db_error) => {
            error!("Failed to delete book with ID {}: {}", book_id, db_error);
            Err(internal_error())
        }
    }
}
