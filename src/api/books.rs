//! Book (catalog) endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{
        book::{Availability, Book, CreateBook, UpdateBook},
        query::ListQuery,
    },
    AppState,
};

use super::{ApiJson, ApiPath, ApiQuery, AuthenticatedUser, PaginatedResponse};

/// List books with search, ordering and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "List of books", body = PaginatedResponse<Book>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    let page = state.services.books.search(&query, Availability::Any).await?;
    Ok(Json(PaginatedResponse::new(page, &query)))
}

/// Books with at least one copy on the shelf
#[utoipa::path(
    get,
    path = "/books/available",
    tag = "books",
    security(("bearer_auth" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Available books", body = PaginatedResponse<Book>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_available_books(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    let page = state
        .services
        .books
        .search(&query, Availability::Available)
        .await?;
    Ok(Json(PaginatedResponse::new(page, &query)))
}

/// Books with at least one copy lent out
#[utoipa::path(
    get,
    path = "/books/on-loan",
    tag = "books",
    security(("bearer_auth" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Books on loan", body = PaginatedResponse<Book>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books_on_loan(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    let page = state.services.books.search(&query, Availability::OnLoan).await?;
    Ok(Json(PaginatedResponse::new(page, &query)))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get(id).await?;
    Ok(Json(book))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input or duplicate ISBN", body = crate::error::ErrorResponse),
        (status = 403, description = "Librarians only", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(book): ApiJson<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let created = state.services.books.create(&user.caller(), book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Librarians only", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(update): ApiJson<UpdateBook>,
) -> AppResult<Json<Book>> {
    let updated = state.services.books.update(&user.caller(), id, update).await?;
    Ok(Json(updated))
}

/// Delete a book and its loans
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 403, description = "Librarians only", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<StatusCode> {
    state.services.books.delete(&user.caller(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Register one more copy of a book
#[utoipa::path(
    post,
    path = "/books/{id}/add-copy",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Copy added", body = Book),
        (status = 403, description = "Librarians only", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_copy(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.add_copy(&user.caller(), id).await?;
    Ok(Json(book))
}
