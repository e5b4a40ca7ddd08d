//! Availability ledger
//!
//! Keeps `books.available_copies` in step with the loans that reference a book.
//! Every function runs on the caller's transaction and locks the book row with
//! `FOR UPDATE` before changing it, so concurrent loans on the same book are
//! serialized and the count can never go negative.

use chrono::Utc;
use sqlx::PgConnection;

use crate::{
    error::{AppError, AppResult},
    models::book::Book,
};

/// Lock a book row for the rest of the transaction
pub async fn lock_book(conn: &mut PgConnection, book_id: i32) -> AppResult<Book> {
    sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
        .bind(book_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))
}

async fn store_counts(conn: &mut PgConnection, book: &mut Book) -> AppResult<()> {
    book.updated_at = Utc::now();
    sqlx::query(
        "UPDATE books SET total_copies = $1, available_copies = $2, updated_at = $3 WHERE id = $4",
    )
    .bind(book.total_copies)
    .bind(book.available_copies)
    .bind(book.updated_at)
    .bind(book.id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// A loan was created: one fewer copy on the shelf.
///
/// Fails with a validation error when no copy is available.
pub async fn take_copy(conn: &mut PgConnection, book_id: i32) -> AppResult<Book> {
    let mut book = lock_book(conn, book_id).await?;
    book.take_copy()?;
    store_counts(conn, &mut book).await?;
    tracing::debug!(book_id, available = book.available_copies, "Copy taken");
    Ok(book)
}

/// A loan was returned or deleted: one more copy, capped at the total.
pub async fn restore_copy(conn: &mut PgConnection, book_id: i32) -> AppResult<Book> {
    let mut book = lock_book(conn, book_id).await?;
    book.restore_copy();
    store_counts(conn, &mut book).await?;
    tracing::debug!(book_id, available = book.available_copies, "Copy restored");
    Ok(book)
}

/// A new physical copy joined the collection.
pub async fn add_copy(conn: &mut PgConnection, book_id: i32) -> AppResult<Book> {
    let mut book = lock_book(conn, book_id).await?;
    book.add_copy()?;
    store_counts(conn, &mut book).await?;
    Ok(book)
}
