//! Role-based access rules
//!
//! Every check takes the caller explicitly. Librarians may do everything;
//! patrons read the catalog, borrow for themselves, and only see their own
//! member record and loans.

use crate::{
    error::{AppError, AppResult},
    models::{
        member::Member,
        user::{Portal, Role, UserClaims},
    },
};

/// The authenticated principal behind a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub account_id: i32,
    pub email: String,
    pub role: Role,
}

/// Which records a caller may see in a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    /// Only records of the member whose email matches
    OwnMember(String),
}

impl Scope {
    /// Email bound into scoped queries (`NULL` means no restriction)
    pub fn member_email(&self) -> Option<&str> {
        match self {
            Scope::All => None,
            Scope::OwnMember(email) => Some(email.as_str()),
        }
    }
}

impl From<&UserClaims> for Caller {
    fn from(claims: &UserClaims) -> Self {
        Self {
            account_id: claims.account_id,
            email: claims.email.clone(),
            role: claims.role,
        }
    }
}

impl Caller {
    pub fn is_librarian(&self) -> bool {
        self.role == Role::Librarian
    }

    /// Gate for every catalog/member/loan mutation except loan creation
    pub fn require_librarian(&self, action: &str) -> AppResult<()> {
        if self.is_librarian() {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Only librarians may {}",
                action
            )))
        }
    }

    pub fn scope(&self) -> Scope {
        match self.role {
            Role::Librarian => Scope::All,
            Role::Patron => Scope::OwnMember(self.email.clone()),
        }
    }

    /// Patrons only see their own member record. Others are reported missing.
    pub fn ensure_can_read_member(&self, member: &Member) -> AppResult<()> {
        if self.is_librarian() || member.is_owned_by(&self.email) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Member with id {} not found", member.id)))
        }
    }

    /// Member a new loan is booked against.
    ///
    /// Librarians must name the member. Patrons always borrow for their own
    /// linked member record, whatever the request says.
    pub fn loan_member(&self, requested: Option<i32>, own_member: Option<&Member>) -> AppResult<i32> {
        match self.role {
            Role::Librarian => requested.ok_or_else(|| {
                AppError::Validation("member_id is required".to_string())
            }),
            Role::Patron => own_member.map(|m| m.id).ok_or_else(|| {
                AppError::Validation("No member record is linked to this account".to_string())
            }),
        }
    }
}

/// Portal restrictions applied at login
pub fn check_portal(
    role: Role,
    portal: Option<Portal>,
    access_code: Option<&str>,
    expected_code: &str,
) -> AppResult<()> {
    match (portal, role) {
        (Some(Portal::Librarian), Role::Patron) => Err(AppError::Forbidden(
            "This account may not use the librarian portal".to_string(),
        )),
        (Some(Portal::Librarian), Role::Librarian) => verify_access_code(access_code, expected_code),
        (Some(Portal::Patron), Role::Librarian) => Err(AppError::Forbidden(
            "This account may not use the patron portal".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Shared secret gating librarian registration and the librarian portal
pub fn verify_access_code(supplied: Option<&str>, expected: &str) -> AppResult<()> {
    match supplied {
        Some(code) if !expected.is_empty() && code == expected => Ok(()),
        _ => Err(AppError::Forbidden("Incorrect librarian access code".to_string())),
    }
}
