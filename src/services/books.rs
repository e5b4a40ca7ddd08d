//! Catalog service

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        book::{Availability, Book, CreateBook, UpdateBook},
        query::ListQuery,
    },
    policy::Caller,
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn search(
        &self,
        query: &ListQuery,
        availability: Availability,
    ) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query, availability).await
    }

    pub async fn get(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn create(&self, caller: &Caller, book: CreateBook) -> AppResult<Book> {
        caller.require_librarian("add books")?;
        book.validate()?;

        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = created.id, isbn = %created.isbn, "Book created");
        Ok(created)
    }

    pub async fn update(&self, caller: &Caller, id: i32, update: UpdateBook) -> AppResult<Book> {
        caller.require_librarian("edit books")?;
        update.validate()?;
        self.repository.books.update(id, update).await
    }

    pub async fn delete(&self, caller: &Caller, id: i32) -> AppResult<()> {
        caller.require_librarian("delete books")?;
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    /// One more physical copy on the shelf
    pub async fn add_copy(&self, caller: &Caller, id: i32) -> AppResult<Book> {
        caller.require_librarian("add copies")?;
        let book = self.repository.books.add_copy(id).await?;
        tracing::info!(
            book_id = id,
            total = book.total_copies,
            available = book.available_copies,
            "Copy added"
        );
        Ok(book)
    }
}
