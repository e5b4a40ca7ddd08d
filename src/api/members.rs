//! Member endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{
        loan::Loan,
        member::{CreateMember, Member, MemberStatus, UpdateMember},
        query::ListQuery,
    },
    AppState,
};

use super::{ApiJson, ApiPath, ApiQuery, AuthenticatedUser, PaginatedResponse};

/// List members (patrons only see their own record)
#[utoipa::path(
    get,
    path = "/members",
    tag = "members",
    security(("bearer_auth" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "List of members", body = PaginatedResponse<Member>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_members(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Member>>> {
    let page = state.services.members.search(&user.caller(), &query).await?;
    Ok(Json(PaginatedResponse::new(page, &query)))
}

/// List active members
#[utoipa::path(
    get,
    path = "/members/active",
    tag = "members",
    security(("bearer_auth" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Active members", body = PaginatedResponse<Member>),
        (status = 403, description = "Librarians only", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_active_members(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Member>>> {
    let page = state
        .services
        .members
        .search_active(&user.caller(), &query)
        .await?;
    Ok(Json(PaginatedResponse::new(page, &query)))
}

/// Get a member by ID
#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "members",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member details", body = Member),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_member(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<Member>> {
    let member = state.services.members.get(&user.caller(), id).await?;
    Ok(Json(member))
}

/// Create a member
#[utoipa::path(
    post,
    path = "/members",
    tag = "members",
    security(("bearer_auth" = [])),
    request_body = CreateMember,
    responses(
        (status = 201, description = "Member created", body = Member),
        (status = 400, description = "Invalid input or email already used", body = crate::error::ErrorResponse),
        (status = 403, description = "Librarians only", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_member(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(member): ApiJson<CreateMember>,
) -> AppResult<(StatusCode, Json<Member>)> {
    let created = state.services.members.create(&user.caller(), member).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a member
#[utoipa::path(
    put,
    path = "/members/{id}",
    tag = "members",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    request_body = UpdateMember,
    responses(
        (status = 200, description = "Member updated", body = Member),
        (status = 403, description = "Librarians only", body = crate::error::ErrorResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_member(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(update): ApiJson<UpdateMember>,
) -> AppResult<Json<Member>> {
    let updated = state
        .services
        .members
        .update(&user.caller(), id, update)
        .await?;
    Ok(Json(updated))
}

/// Delete a member and all of its loans
#[utoipa::path(
    delete,
    path = "/members/{id}",
    tag = "members",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 204, description = "Member deleted"),
        (status = 403, description = "Librarians only", body = crate::error::ErrorResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_member(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<StatusCode> {
    state.services.members.delete(&user.caller(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Open loans of a member
#[utoipa::path(
    get,
    path = "/members/{id}/current-loans",
    tag = "members",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member ID"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Ongoing and overdue loans", body = PaginatedResponse<Loan>),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn current_loans(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Loan>>> {
    let page = state
        .services
        .loans
        .current_for_member(&user.caller(), id, &query)
        .await?;
    Ok(Json(PaginatedResponse::new(page, &query)))
}

/// Suspend a member
#[utoipa::path(
    post,
    path = "/members/{id}/suspend",
    tag = "members",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member suspended", body = Member),
        (status = 403, description = "Librarians only", body = crate::error::ErrorResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn suspend_member(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<Member>> {
    let member = state
        .services
        .members
        .set_status(&user.caller(), id, MemberStatus::Suspended)
        .await?;
    Ok(Json(member))
}

/// Reactivate a member
#[utoipa::path(
    post,
    path = "/members/{id}/reactivate",
    tag = "members",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member reactivated", body = Member),
        (status = 403, description = "Librarians only", body = crate::error::ErrorResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn reactivate_member(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<Member>> {
    let member = state
        .services
        .members
        .set_status(&user.caller(), id, MemberStatus::Active)
        .await?;
    Ok(Json(member))
}
