//! Members repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        member::{normalize_email, CreateMember, Member, MemberStatus, UpdateMember},
        query::ListQuery,
    },
    policy::Scope,
};

use super::loans::LoansRepository;

const ORDERING: &[(&str, &str)] = &[
    ("name", "name"),
    ("created_at", "created_at"),
    ("status", "status"),
];

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Postgres>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get member by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Member> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))
    }

    /// Member record linked to an account email
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            "SELECT * FROM members WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Search members with pagination
    pub async fn search(
        &self,
        scope: &Scope,
        status: Option<MemberStatus>,
        query: &ListQuery,
    ) -> AppResult<(Vec<Member>, i64)> {
        let order_by = query.order_by(ORDERING, "-created_at")?;
        let offset = query.offset()?;
        let pattern = query.search_pattern();
        let status = status.map(|s| s.as_str());

        let where_clause = r#"
            WHERE ($1::text IS NULL OR LOWER(email) = LOWER($1))
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR name ILIKE $3 OR email ILIKE $3 OR phone ILIKE $3)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM members {}", where_clause))
            .bind(scope.member_email())
            .bind(status)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let members = sqlx::query_as::<_, Member>(&format!(
            "SELECT * FROM members {} ORDER BY {}, id DESC LIMIT $4 OFFSET $5",
            where_clause, order_by
        ))
        .bind(scope.member_email())
        .bind(status)
        .bind(&pattern)
        .bind(query.per_page())
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((members, total))
    }

    /// Create a new member
    pub async fn create(&self, member: &CreateMember) -> AppResult<Member> {
        let now = Utc::now();

        let created = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (name, email, phone, address, status, note, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(member.name.trim())
        .bind(normalize_email(&member.email))
        .bind(member.phone.clone().unwrap_or_default())
        .bind(&member.address)
        .bind(member.status.unwrap_or_default())
        .bind(&member.note)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update a member under a row lock
    pub async fn update(&self, id: i32, update: UpdateMember) -> AppResult<Member> {
        let mut tx = self.pool.begin().await?;

        let mut member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))?;

        member.apply_update(update);
        member.updated_at = Utc::now();

        let updated = sqlx::query_as::<_, Member>(
            r#"
            UPDATE members SET
                name = $1, email = $2, phone = $3, address = $4, status = $5,
                note = $6, updated_at = $7
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.phone)
        .bind(&member.address)
        .bind(member.status)
        .bind(&member.note)
        .bind(member.updated_at)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Suspend or reactivate
    pub async fn set_status(&self, id: i32, status: MemberStatus) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(
            "UPDATE members SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))
    }

    /// Delete a member together with its loans.
    ///
    /// Each loan goes through the loan delete path so every borrowed copy is
    /// put back before the member row disappears.
    pub async fn delete(&self, id: i32) -> AppResult<usize> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, i32>("SELECT id FROM members WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))?;

        let loan_ids: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM loans WHERE member_id = $1 ORDER BY id FOR UPDATE")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        for loan_id in &loan_ids {
            LoansRepository::delete_in(&mut *tx, *loan_id).await?;
        }

        sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(loan_ids.len())
    }
}
