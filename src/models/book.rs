//! Book (catalog entry) model and availability arithmetic

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::text_column;
use crate::error::{AppError, AppResult};

/// ISBN-10 (optional trailing X check digit) or ISBN-13, without separators
static ISBN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{9}[\dXx]|\d{13})$").unwrap());

/// Upper bound on the copies of a single title
pub const MAX_COPIES: i32 = 10_000;

/// Book genre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Novel,
    Science,
    History,
    Comics,
    Youth,
    Other,
}

impl Genre {
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Novel => "novel",
            Genre::Science => "science",
            Genre::History => "history",
            Genre::Comics => "comics",
            Genre::Youth => "youth",
            Genre::Other => "other",
        }
    }
}

impl std::str::FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "novel" => Ok(Genre::Novel),
            "science" => Ok(Genre::Science),
            "history" => Ok(Genre::History),
            "comics" => Ok(Genre::Comics),
            "youth" => Ok(Genre::Youth),
            "other" => Ok(Genre::Other),
            _ => Err(format!("Invalid genre: {}", s)),
        }
    }
}

text_column!(Genre);

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub year: i32,
    pub genre: Genre,
    pub description: Option<String>,
    pub rating: f64,
    pub total_copies: i32,
    pub available_copies: i32,
    /// Shelf location (free text)
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    pub fn copies_on_loan(&self) -> i32 {
        self.total_copies - self.available_copies
    }

    /// Hand one copy out. Refuses to go below zero.
    pub fn take_copy(&mut self) -> AppResult<()> {
        if self.available_copies <= 0 {
            return Err(AppError::Validation(format!(
                "No copies of '{}' are available",
                self.title
            )));
        }
        self.available_copies -= 1;
        Ok(())
    }

    /// Put one copy back on the shelf, never above `total_copies`.
    pub fn restore_copy(&mut self) {
        self.available_copies = self.available_copies.saturating_add(1).min(self.total_copies);
    }

    /// Register a newly acquired copy.
    pub fn add_copy(&mut self) -> AppResult<()> {
        if self.total_copies >= MAX_COPIES {
            return Err(AppError::Validation(format!(
                "'{}' already has the maximum of {} copies",
                self.title, MAX_COPIES
            )));
        }
        self.total_copies += 1;
        self.available_copies = (self.available_copies + 1).min(self.total_copies);
        Ok(())
    }

    /// Apply a librarian edit.
    ///
    /// A change of `total_copies` moves `available_copies` by the same delta, so the
    /// number of copies on loan is preserved.
    pub fn apply_update(&mut self, update: UpdateBook) -> AppResult<()> {
        if let Some(isbn) = update.isbn.as_deref() {
            if !isbn.trim().eq_ignore_ascii_case(&self.isbn) {
                return Err(AppError::Validation("ISBN cannot be changed".to_string()));
            }
        }

        if let Some(total) = update.total_copies {
            let available = self.available_copies + (total - self.total_copies);
            if available < 0 {
                return Err(AppError::Validation(format!(
                    "Cannot reduce total copies to {}: {} copies are on loan",
                    total,
                    self.copies_on_loan()
                )));
            }
            self.total_copies = total;
            self.available_copies = available;
        }

        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(author) = update.author {
            self.author = author;
        }
        if let Some(publisher) = update.publisher {
            self.publisher = publisher;
        }
        if let Some(year) = update.year {
            self.year = year;
        }
        if let Some(genre) = update.genre {
            self.genre = genre;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(rating) = update.rating {
            self.rating = rating;
        }
        if let Some(location) = update.location {
            self.location = location;
        }

        Ok(())
    }
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 200, message = "Author is required"))]
    pub author: String,
    #[validate(regex(path = *ISBN_RE, message = "ISBN must be 10 or 13 digits"))]
    pub isbn: String,
    #[validate(length(min = 1, max = 200, message = "Publisher is required"))]
    pub publisher: String,
    #[validate(range(min = 1000, max = 9999, message = "Year must have four digits"))]
    pub year: i32,
    pub genre: Genre,
    pub description: Option<String>,
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub rating: Option<f64>,
    #[validate(range(min = 1, max = 10000, message = "A book has between 1 and 10000 copies"))]
    pub total_copies: Option<i32>,
    #[validate(range(min = 0, max = 10000, message = "Available copies must be between 0 and 10000"))]
    pub available_copies: Option<i32>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
}

impl CreateBook {
    pub fn total(&self) -> i32 {
        self.total_copies.unwrap_or(1)
    }

    /// Initial shelf count; defaults to every copy being available
    pub fn initial_available(&self) -> AppResult<i32> {
        let total = self.total();
        match self.available_copies {
            Some(available) if available > total => Err(AppError::Validation(format!(
                "Available copies ({}) cannot exceed total copies ({})",
                available, total
            ))),
            Some(available) => Ok(available),
            None => Ok(total),
        }
    }
}

/// Update book request. The ISBN may be echoed back but not changed.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub author: Option<String>,
    pub isbn: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub publisher: Option<String>,
    #[validate(range(min = 1000, max = 9999, message = "Year must have four digits"))]
    pub year: Option<i32>,
    pub genre: Option<Genre>,
    pub description: Option<String>,
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub rating: Option<f64>,
    #[validate(range(min = 1, max = 10000, message = "A book has between 1 and 10000 copies"))]
    pub total_copies: Option<i32>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
}

/// Availability filter for book listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Any,
    /// At least one copy on the shelf
    Available,
    /// At least one copy lent out
    OnLoan,
}
