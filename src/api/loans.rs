//! Loan endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{
        loan::{CreateLoan, ExtendLoan, Loan, LoanFilter, LoanStatistics, UpdateLoan},
        query::ListQuery,
    },
    AppState,
};

use super::{ApiJson, ApiPath, ApiQuery, AuthenticatedUser, OptionalJson, PaginatedResponse};

/// List loans (patrons only see their own)
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "List of loans", body = PaginatedResponse<Loan>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Loan>>> {
    let page = state
        .services
        .loans
        .search(&user.caller(), LoanFilter::All, &query)
        .await?;
    Ok(Json(PaginatedResponse::new(page, &query)))
}

/// Ongoing loans
#[utoipa::path(
    get,
    path = "/loans/ongoing",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Ongoing loans", body = PaginatedResponse<Loan>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_ongoing_loans(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Loan>>> {
    let page = state
        .services
        .loans
        .search_ongoing(&user.caller(), &query)
        .await?;
    Ok(Json(PaginatedResponse::new(page, &query)))
}

/// Overdue loans
#[utoipa::path(
    get,
    path = "/loans/overdue",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Overdue loans", body = PaginatedResponse<Loan>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_overdue_loans(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Loan>>> {
    let page = state
        .services
        .loans
        .search_overdue(&user.caller(), &query)
        .await?;
    Ok(Json(PaginatedResponse::new(page, &query)))
}

/// Loan counts by status
#[utoipa::path(
    get,
    path = "/loans/statistics",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Loan statistics", body = LoanStatistics),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn loan_statistics(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<LoanStatistics>> {
    let stats = state.services.loans.statistics(&user.caller()).await?;
    Ok(Json(stats))
}

/// Get a loan by ID
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan details", body = Loan),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.get(&user.caller(), id).await?;
    Ok(Json(loan))
}

/// Lend a book
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 400, description = "No copy available, inactive member or invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<CreateLoan>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let loan = state.services.loans.create(&user.caller(), request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Edit a loan
#[utoipa::path(
    put,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = UpdateLoan,
    responses(
        (status = 200, description = "Loan updated", body = Loan),
        (status = 400, description = "Invalid input or transition", body = crate::error::ErrorResponse),
        (status = 403, description = "Librarians only", body = crate::error::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(update): ApiJson<UpdateLoan>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.update(&user.caller(), id, update).await?;
    Ok(Json(loan))
}

/// Delete a loan and put the copy back
#[utoipa::path(
    delete,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 204, description = "Loan deleted"),
        (status = 403, description = "Librarians only", body = crate::error::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<StatusCode> {
    state.services.loans.delete(&user.caller(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Push the expected return date back
#[utoipa::path(
    post,
    path = "/loans/{id}/extend",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    request_body(content = ExtendLoan, description = "Defaults to the configured extension when empty"),
    responses(
        (status = 200, description = "Loan extended", body = Loan),
        (status = 400, description = "Loan already closed or invalid days", body = crate::error::ErrorResponse),
        (status = 403, description = "Librarians only", body = crate::error::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn extend_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    OptionalJson(body): OptionalJson<ExtendLoan>,
) -> AppResult<Json<Loan>> {
    let days = body.and_then(|extend| extend.days);
    let loan = state.services.loans.extend(&user.caller(), id, days).await?;
    Ok(Json(loan))
}

/// Record a return
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan returned", body = Loan),
        (status = 400, description = "Loan already closed", body = crate::error::ErrorResponse),
        (status = 403, description = "Librarians only", body = crate::error::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.return_loan(&user.caller(), id).await?;
    Ok(Json(loan))
}
