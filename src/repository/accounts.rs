//! Accounts repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        member::{normalize_email, MemberStatus},
        user::{Account, Role},
    },
};

/// New account with an already hashed password
#[derive(Debug)]
pub struct NewAccount<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
    pub role: Role,
}

/// Contact details for the member record created alongside a patron account
#[derive(Debug, Default)]
pub struct MemberContact<'a> {
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
}

#[derive(Clone)]
pub struct AccountsRepository {
    pool: Pool<Postgres>,
}

impl AccountsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get account by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Account> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account with id {} not found", id)))
    }

    /// Get account by email (login identifier)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Create an account on its own (librarians)
    pub async fn create(&self, account: NewAccount<'_>) -> AppResult<Account> {
        let created = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (email, password_hash, name, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(normalize_email(account.email))
        .bind(account.password_hash)
        .bind(account.name.trim())
        .bind(account.role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Create an account and its member record in one transaction.
    ///
    /// An existing member with the same email is reused as-is. Returns the
    /// account and the linked member id.
    pub async fn create_patron(
        &self,
        account: NewAccount<'_>,
        contact: MemberContact<'_>,
    ) -> AppResult<(Account, i32)> {
        let email = normalize_email(account.email);
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (email, password_hash, name, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&email)
        .bind(account.password_hash)
        .bind(account.name.trim())
        .bind(account.role)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO members (name, email, phone, address, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT ((LOWER(email))) DO NOTHING
            "#,
        )
        .bind(account.name.trim())
        .bind(&email)
        .bind(contact.phone.unwrap_or_default())
        .bind(contact.address)
        .bind(MemberStatus::Active)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let member_id: i32 =
            sqlx::query_scalar("SELECT id FROM members WHERE LOWER(email) = LOWER($1)")
                .bind(&email)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok((created, member_id))
    }
}
