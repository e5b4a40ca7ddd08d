//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, loans, members};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblio API",
        version = "0.3.0",
        description = "Library management REST API: books, members and loans"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::register,
        auth::register_librarian,
        auth::logout,
        auth::me,
        // Books
        books::list_books,
        books::list_available_books,
        books::list_books_on_loan,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::add_copy,
        // Members
        members::list_members,
        members::list_active_members,
        members::get_member,
        members::create_member,
        members::update_member,
        members::delete_member,
        members::current_loans,
        members::suspend_member,
        members::reactivate_member,
        // Loans
        loans::list_loans,
        loans::list_ongoing_loans,
        loans::list_overdue_loans,
        loans::loan_statistics,
        loans::get_loan,
        loans::create_loan,
        loans::update_loan,
        loans::delete_loan,
        loans::extend_loan,
        loans::return_loan,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::LogoutResponse,
            crate::models::user::AccountInfo,
            crate::models::user::Role,
            crate::models::user::Portal,
            crate::models::user::RegisterPatron,
            crate::models::user::RegisterLibrarian,
            // Books
            crate::models::book::Book,
            crate::models::book::Genre,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Members
            crate::models::member::Member,
            crate::models::member::MemberStatus,
            crate::models::member::CreateMember,
            crate::models::member::UpdateMember,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanStatus,
            crate::models::loan::CreateLoan,
            crate::models::loan::UpdateLoan,
            crate::models::loan::ExtendLoan,
            crate::models::loan::LoanStatistics,
            crate::models::query::ListQuery,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "members", description = "Member management"),
        (name = "loans", description = "Loan lifecycle")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
