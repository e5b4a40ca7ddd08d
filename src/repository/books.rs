//! Books repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Availability, Book, CreateBook, UpdateBook},
        query::ListQuery,
    },
};

use super::ledger;

const ORDERING: &[(&str, &str)] = &[
    ("title", "title"),
    ("created_at", "created_at"),
    ("available_copies", "available_copies"),
];

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Search books with pagination
    pub async fn search(
        &self,
        query: &ListQuery,
        availability: Availability,
    ) -> AppResult<(Vec<Book>, i64)> {
        let order_by = query.order_by(ORDERING, "-created_at")?;
        let offset = query.offset()?;
        let pattern = query.search_pattern();

        let availability_clause = match availability {
            Availability::Any => "TRUE",
            Availability::Available => "available_copies > 0",
            Availability::OnLoan => "available_copies < total_copies",
        };

        let where_clause = format!(
            r#"
            WHERE ($1::text IS NULL
                   OR title ILIKE $1 OR author ILIKE $1 OR isbn ILIKE $1 OR genre ILIKE $1)
              AND {}
            "#,
            availability_clause
        );

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM books {}", where_clause))
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT * FROM books {} ORDER BY {}, id DESC LIMIT $2 OFFSET $3",
            where_clause, order_by
        ))
        .bind(&pattern)
        .bind(query.per_page())
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((books, total))
    }

    /// Create a new book
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let available = book.initial_available()?;
        let now = Utc::now();

        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                title, author, isbn, publisher, year, genre, description,
                rating, total_copies, available_copies, location, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.isbn.to_uppercase())
        .bind(&book.publisher)
        .bind(book.year)
        .bind(book.genre)
        .bind(&book.description)
        .bind(book.rating.unwrap_or(0.0))
        .bind(book.total())
        .bind(available)
        .bind(book.location.clone().unwrap_or_default())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update a book under a row lock
    pub async fn update(&self, id: i32, update: UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let mut book = ledger::lock_book(&mut *tx, id).await?;
        book.apply_update(update)?;
        book.updated_at = Utc::now();

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = $1, author = $2, publisher = $3, year = $4, genre = $5,
                description = $6, rating = $7, total_copies = $8, available_copies = $9,
                location = $10, updated_at = $11
            WHERE id = $12
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(book.year)
        .bind(book.genre)
        .bind(&book.description)
        .bind(book.rating)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(&book.location)
        .bind(book.updated_at)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a book; its loans go with it (ON DELETE CASCADE)
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        Ok(())
    }

    /// Register one more physical copy
    pub async fn add_copy(&self, id: i32) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;
        let book = ledger::add_copy(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(book)
    }
}
