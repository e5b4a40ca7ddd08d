//! Accounts, roles and JWT claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::text_column;

/// Access role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Staff member with full access
    Librarian,
    /// Borrower scoped to their own member record
    Patron,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Librarian => "librarian",
            Role::Patron => "patron",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "librarian" => Ok(Role::Librarian),
            "patron" => Ok(Role::Patron),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

text_column!(Role);

/// Login portal, i.e. which front-end the caller signs in from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Portal {
    Librarian,
    Patron,
}

/// Account model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Account {
    pub id: i32,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Public account view, with the member record linked by email
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountInfo {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub member_id: Option<i32>,
}

impl AccountInfo {
    pub fn new(account: &Account, member_id: Option<i32>) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role,
            member_id,
        }
    }
}

/// Patron self-registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterPatron {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub portal: Option<Portal>,
}

/// Librarian registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterLibrarian {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub access_code: String,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub account_id: i32,
    pub email: String,
    pub role: Role,
    /// Token id, used to revoke the token on logout
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Seconds until the token expires (zero once expired)
    pub fn remaining_seconds(&self, now: i64) -> u64 {
        (self.exp - now).max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp: i64) -> UserClaims {
        UserClaims {
            sub: "lib@biblio.fr".to_string(),
            account_id: 3,
            email: "lib@biblio.fr".to_string(),
            role: Role::Librarian,
            jti: "b2c6c1c4-1c43-4c6e-9d57-5c1f1a9e0f3e".to_string(),
            exp,
            iat: exp - 3600,
        }
    }

    #[test]
    fn test_token_roundtrip_and_wrong_secret() {
        let exp = Utc::now().timestamp() + 3600;
        let token = claims(exp).create_token("secret").unwrap();

        let decoded = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(decoded.account_id, 3);
        assert_eq!(decoded.role, Role::Librarian);

        assert!(UserClaims::from_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let exp = Utc::now().timestamp() - 3600;
        let token = claims(exp).create_token("secret").unwrap();
        assert!(UserClaims::from_token(&token, "secret").is_err());
    }

    #[test]
    fn test_remaining_seconds() {
        assert_eq!(claims(1_000).remaining_seconds(400), 600);
        assert_eq!(claims(1_000).remaining_seconds(2_000), 0);
    }
}
