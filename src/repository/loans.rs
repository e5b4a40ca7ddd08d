//! Loans repository for database operations
//!
//! State changes follow the same pattern: lock the loan row, run the transition
//! on the in-memory [`Loan`], write it back and adjust the book's availability,
//! all inside one transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{Loan, LoanFilter, LoanStatistics, LoanStatus, UpdateLoan},
        member::{Member, MemberStatus},
        query::ListQuery,
    },
    policy::Scope,
};

use super::ledger;

const LOAN_SELECT: &str = r#"
    SELECT l.id, l.book_id, b.title AS book_title, l.member_id, m.name AS member_name,
           l.loan_date, l.expected_return_date, l.actual_return_date, l.status,
           l.days_overdue, l.fine_amount, l.note
    FROM loans l
    JOIN books b ON b.id = l.book_id
    JOIN members m ON m.id = l.member_id
"#;

const ORDERING: &[(&str, &str)] = &[
    ("loan_date", "l.loan_date"),
    ("expected_return_date", "l.expected_return_date"),
    ("status", "l.status"),
];

/// New loan, already validated by the service
#[derive(Debug)]
pub struct NewLoan {
    pub book_id: i32,
    pub member_id: i32,
    pub loan_date: DateTime<Utc>,
    pub expected_return_date: NaiveDate,
    pub note: Option<String>,
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Age the open loans visible to `scope` against `today`.
    ///
    /// Set-based equivalent of [`Loan::refresh_overdue`], run before listings so
    /// status filters see current values. Only the rows about to be read are touched.
    pub async fn sweep_overdue(
        &self,
        scope: &Scope,
        member_id: Option<i32>,
        today: NaiveDate,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE loans l
            SET status = 'overdue', days_overdue = ($1::date - l.expected_return_date)
            FROM members m
            WHERE m.id = l.member_id
              AND ($2::text IS NULL OR LOWER(m.email) = LOWER($2))
              AND ($3::int IS NULL OR l.member_id = $3)
              AND l.status IN ('ongoing', 'overdue')
              AND l.expected_return_date < $1::date
              AND (l.status <> 'overdue' OR l.days_overdue <> ($1::date - l.expected_return_date))
            "#,
        )
        .bind(today)
        .bind(scope.member_email())
        .bind(member_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            tracing::debug!(count = result.rows_affected(), "Loans aged");
        }
        Ok(result.rows_affected())
    }

    /// Get loan by ID, aged against `today`, within the caller's scope
    pub async fn get_by_id(&self, id: i32, scope: &Scope, today: NaiveDate) -> AppResult<Loan> {
        let mut loan = sqlx::query_as::<_, Loan>(&format!(
            "{} WHERE l.id = $1 AND ($2::text IS NULL OR LOWER(m.email) = LOWER($2))",
            LOAN_SELECT
        ))
        .bind(id)
        .bind(scope.member_email())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;

        if loan.refresh_overdue(today) {
            // Only touches loans that are still open, so a concurrent return wins
            sqlx::query(
                "UPDATE loans SET status = $1, days_overdue = $2 WHERE id = $3 AND status IN ('ongoing', 'overdue')",
            )
            .bind(loan.status)
            .bind(loan.days_overdue)
            .bind(loan.id)
            .execute(&self.pool)
            .await?;
        }

        Ok(loan)
    }

    /// Search loans with pagination
    pub async fn search(
        &self,
        scope: &Scope,
        filter: LoanFilter,
        member_id: Option<i32>,
        query: &ListQuery,
        today: NaiveDate,
    ) -> AppResult<(Vec<Loan>, i64)> {
        self.sweep_overdue(scope, member_id, today).await?;

        let order_by = query.order_by(ORDERING, "-loan_date")?;
        let offset = query.offset()?;
        let pattern = query.search_pattern();

        let status_clause = match filter {
            LoanFilter::All => "TRUE".to_string(),
            LoanFilter::Status(status) => format!("l.status = '{}'", status.as_str()),
            LoanFilter::Open => "l.status IN ('ongoing', 'overdue')".to_string(),
        };

        let where_clause = format!(
            r#"
            WHERE ($1::text IS NULL OR LOWER(m.email) = LOWER($1))
              AND ($2::int IS NULL OR l.member_id = $2)
              AND ($3::text IS NULL OR b.title ILIKE $3 OR m.name ILIKE $3 OR l.status ILIKE $3)
              AND {}
            "#,
            status_clause
        );

        let total: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*)
            FROM loans l
            JOIN books b ON b.id = l.book_id
            JOIN members m ON m.id = l.member_id
            {}
            "#,
            where_clause
        ))
        .bind(scope.member_email())
        .bind(member_id)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let loans = sqlx::query_as::<_, Loan>(&format!(
            "{} {} ORDER BY {}, l.id DESC LIMIT $4 OFFSET $5",
            LOAN_SELECT, where_clause, order_by
        ))
        .bind(scope.member_email())
        .bind(member_id)
        .bind(&pattern)
        .bind(query.per_page())
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((loans, total))
    }

    /// Create a loan and take the copy off the shelf
    pub async fn create(&self, new: NewLoan) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        // Shared lock: the member cannot be suspended or deleted under us
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1 FOR SHARE")
            .bind(new.member_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Member with id {} not found", new.member_id))
            })?;

        if member.status != MemberStatus::Active {
            return Err(AppError::Validation(format!(
                "Member {} is {} and cannot borrow",
                member.id, member.status
            )));
        }

        let book = ledger::take_copy(&mut *tx, new.book_id).await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO loans (book_id, member_id, loan_date, expected_return_date, status, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(book.id)
        .bind(member.id)
        .bind(new.loan_date)
        .bind(new.expected_return_date)
        .bind(LoanStatus::Ongoing)
        .bind(&new.note)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Loan {
            id,
            book_id: book.id,
            book_title: book.title,
            member_id: member.id,
            member_name: member.name,
            loan_date: new.loan_date,
            expected_return_date: new.expected_return_date,
            actual_return_date: None,
            status: LoanStatus::Ongoing,
            days_overdue: 0,
            fine_amount: Decimal::ZERO,
            note: new.note,
        })
    }

    /// Lock a loan row and age it
    async fn lock(conn: &mut PgConnection, id: i32, today: NaiveDate) -> AppResult<Loan> {
        let mut loan = sqlx::query_as::<_, Loan>(&format!(
            "{} WHERE l.id = $1 FOR UPDATE OF l",
            LOAN_SELECT
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;

        loan.refresh_overdue(today);
        Ok(loan)
    }

    async fn write(conn: &mut PgConnection, loan: &Loan) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE loans SET
                expected_return_date = $1, actual_return_date = $2, status = $3,
                days_overdue = $4, fine_amount = $5, note = $6
            WHERE id = $7
            "#,
        )
        .bind(loan.expected_return_date)
        .bind(loan.actual_return_date)
        .bind(loan.status)
        .bind(loan.days_overdue)
        .bind(loan.fine_amount)
        .bind(&loan.note)
        .bind(loan.id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Apply a librarian edit
    pub async fn update(&self, id: i32, update: UpdateLoan, today: NaiveDate) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let mut loan = Self::lock(&mut *tx, id, today).await?;
        loan.apply_update(update)?;
        loan.refresh_overdue(today);
        Self::write(&mut *tx, &loan).await?;

        tx.commit().await?;
        Ok(loan)
    }

    /// Push the expected return date back
    pub async fn extend(&self, id: i32, days: i64, today: NaiveDate) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let mut loan = Self::lock(&mut *tx, id, today).await?;
        loan.extend(days)?;
        Self::write(&mut *tx, &loan).await?;

        tx.commit().await?;
        Ok(loan)
    }

    /// Close a loan as returned and put the copy back.
    ///
    /// The row lock makes a concurrent second return wait, then fail on the
    /// already-returned status, so availability moves exactly once.
    pub async fn return_loan(&self, id: i32, today: NaiveDate) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let mut loan = Self::lock(&mut *tx, id, today).await?;
        loan.mark_returned(today)?;
        Self::write(&mut *tx, &loan).await?;
        ledger::restore_copy(&mut *tx, loan.book_id).await?;

        tx.commit().await?;
        Ok(loan)
    }

    /// Delete a loan on an open transaction and reconcile the book.
    ///
    /// Returns the book id.
    pub(crate) async fn delete_in(conn: &mut PgConnection, id: i32) -> AppResult<i32> {
        let book_id: i32 = sqlx::query_scalar("DELETE FROM loans WHERE id = $1 RETURNING book_id")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;

        ledger::restore_copy(conn, book_id).await?;
        Ok(book_id)
    }

    /// Hard-delete a loan, whatever its status
    pub async fn delete(&self, id: i32) -> AppResult<i32> {
        let mut tx = self.pool.begin().await?;
        let book_id = Self::delete_in(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(book_id)
    }

    /// Loan counts by status within the caller's scope
    pub async fn statistics(&self, scope: &Scope, today: NaiveDate) -> AppResult<LoanStatistics> {
        self.sweep_overdue(scope, None, today).await?;

        let counts = sqlx::query_as::<_, (LoanStatus, i64)>(
            r#"
            SELECT l.status, COUNT(*)
            FROM loans l
            JOIN members m ON m.id = l.member_id
            WHERE ($1::text IS NULL OR LOWER(m.email) = LOWER($1))
            GROUP BY l.status
            "#,
        )
        .bind(scope.member_email())
        .fetch_all(&self.pool)
        .await?;

        Ok(LoanStatistics::from_counts(counts))
    }
}
