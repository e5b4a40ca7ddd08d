//! Authentication and account service

use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rand::rngs::OsRng;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{
        Account, AccountInfo, Portal, RegisterLibrarian, RegisterPatron, Role, UserClaims,
    },
    policy::{self, Caller},
    repository::{
        accounts::{MemberContact, NewAccount},
        Repository,
    },
};

use super::sessions::SessionStore;

/// Issued token with the account it belongs to
#[derive(Debug)]
pub struct Session {
    pub token: String,
    pub expires_in: i64,
    pub account: AccountInfo,
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
    sessions: Arc<dyn SessionStore>,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            repository,
            config,
            sessions,
        }
    }

    /// Check credentials and portal rules, then issue a token
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        portal: Option<Portal>,
        access_code: Option<&str>,
    ) -> AppResult<Session> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Identifier and password are required".to_string(),
            ));
        }

        let account = self
            .repository
            .accounts
            .get_by_email(identifier)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        if !verify_password(&account, password)? {
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        policy::check_portal(
            account.role,
            portal,
            access_code,
            &self.config.librarian_access_code,
        )?;

        let session = self.issue(&account).await?;
        tracing::info!(account_id = account.id, role = %account.role, "Login");
        Ok(session)
    }

    /// Patron self-registration: account plus linked member record
    pub async fn register(&self, request: RegisterPatron) -> AppResult<AccountInfo> {
        request.validate()?;
        if matches!(request.portal, Some(Portal::Librarian)) {
            return Err(AppError::Forbidden(
                "Accounts can only be created from the patron portal".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password)?;
        let (account, member_id) = self
            .repository
            .accounts
            .create_patron(
                NewAccount {
                    email: &request.email,
                    password_hash: &password_hash,
                    name: &request.name,
                    role: Role::Patron,
                },
                MemberContact {
                    phone: request.phone.as_deref(),
                    address: request.address.as_deref(),
                },
            )
            .await?;

        tracing::info!(account_id = account.id, member_id, "Patron registered");
        Ok(AccountInfo::new(&account, Some(member_id)))
    }

    /// Librarian registration, gated by the shared access code
    pub async fn register_librarian(&self, request: RegisterLibrarian) -> AppResult<AccountInfo> {
        policy::verify_access_code(
            Some(request.access_code.as_str()),
            &self.config.librarian_access_code,
        )?;
        request.validate()?;

        let password_hash = hash_password(&request.password)?;
        let account = self
            .repository
            .accounts
            .create(NewAccount {
                email: &request.email,
                password_hash: &password_hash,
                name: &request.name,
                role: Role::Librarian,
            })
            .await?;

        tracing::info!(account_id = account.id, "Librarian registered");
        Ok(AccountInfo::new(&account, None))
    }

    /// Revoke the presented token until its natural expiry
    pub async fn logout(&self, claims: &UserClaims) -> AppResult<()> {
        let ttl = claims.remaining_seconds(Utc::now().timestamp());
        self.sessions.revoke(&claims.jti, ttl).await?;
        tracing::info!(account_id = claims.account_id, "Logout");
        Ok(())
    }

    /// Whether a token was logged out
    pub async fn is_revoked(&self, claims: &UserClaims) -> AppResult<bool> {
        self.sessions.is_revoked(&claims.jti).await
    }

    /// Current account with its linked member id
    pub async fn me(&self, caller: &Caller) -> AppResult<AccountInfo> {
        let account = self
            .repository
            .accounts
            .get_by_id(caller.account_id)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::Authentication("Account no longer exists".to_string()),
                other => other,
            })?;
        let member = self.repository.members.find_by_email(&account.email).await?;
        Ok(AccountInfo::new(&account, member.map(|m| m.id)))
    }

    async fn issue(&self, account: &Account) -> AppResult<Session> {
        let now = Utc::now().timestamp();
        let expires_in = self.config.jwt_expiration_hours as i64 * 3600;

        let claims = UserClaims {
            sub: account.email.clone(),
            account_id: account.id,
            email: account.email.clone(),
            role: account.role,
            jti: Uuid::new_v4().to_string(),
            exp: now + expires_in,
            iat: now,
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        let member = self.repository.members.find_by_email(&account.email).await?;

        Ok(Session {
            token,
            expires_in,
            account: AccountInfo::new(account, member.map(|m| m.id)),
        })
    }
}

fn verify_password(account: &Account, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&account.password_hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("secret-pw").unwrap();
        let account = Account {
            id: 1,
            email: "a@b.fr".to_string(),
            password_hash: hash,
            name: "A".to_string(),
            role: Role::Patron,
            created_at: Utc::now(),
        };
        assert!(verify_password(&account, "secret-pw").unwrap());
        assert!(!verify_password(&account, "wrong").unwrap());
    }
}
