//! Loan model and lifecycle rules
//!
//! A loan starts `Ongoing`, may age into `Overdue`, and ends either `Returned`
//! or `Lost`. Overdue status is recomputed whenever a loan is loaded or written,
//! never by a background job.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::text_column;
use crate::error::{AppError, AppResult};

/// Loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Ongoing,
    Overdue,
    Returned,
    Lost,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Ongoing => "ongoing",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Returned => "returned",
            LoanStatus::Lost => "lost",
        }
    }

    /// The copy is still out with the member
    pub fn is_open(&self) -> bool {
        matches!(self, LoanStatus::Ongoing | LoanStatus::Overdue)
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ongoing" => Ok(LoanStatus::Ongoing),
            "overdue" => Ok(LoanStatus::Overdue),
            "returned" => Ok(LoanStatus::Returned),
            "lost" => Ok(LoanStatus::Lost),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

text_column!(LoanStatus);

/// Loan model, joined with the book title and member name for display
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub member_id: i32,
    pub member_name: String,
    pub loan_date: DateTime<Utc>,
    pub expected_return_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub status: LoanStatus,
    pub days_overdue: i32,
    #[schema(value_type = String, example = "0.00")]
    pub fine_amount: Decimal,
    pub note: Option<String>,
}

impl Loan {
    /// Age an open loan against `today`.
    ///
    /// Returns true when status or `days_overdue` changed and the row must be
    /// written back. An overdue loan that was extended past `today` stays
    /// overdue and keeps its last count.
    pub fn refresh_overdue(&mut self, today: NaiveDate) -> bool {
        if !self.status.is_open() || today <= self.expected_return_date {
            return false;
        }

        let days = (today - self.expected_return_date).num_days() as i32;
        let changed = self.status != LoanStatus::Overdue || self.days_overdue != days;
        self.status = LoanStatus::Overdue;
        self.days_overdue = days;
        changed
    }

    fn ensure_open(&self, action: &str) -> AppResult<()> {
        match self.status {
            LoanStatus::Ongoing | LoanStatus::Overdue => Ok(()),
            LoanStatus::Returned => Err(AppError::InvalidTransition(format!(
                "Cannot {} loan {}: the book has already been returned",
                action, self.id
            ))),
            LoanStatus::Lost => Err(AppError::InvalidTransition(format!(
                "Cannot {} loan {}: the book was reported lost",
                action, self.id
            ))),
        }
    }

    /// Push the expected return date back by `days`.
    pub fn extend(&mut self, days: i64) -> AppResult<()> {
        self.ensure_open("extend")?;
        if days < 1 {
            return Err(AppError::Validation(
                "Extension must be at least one day".to_string(),
            ));
        }
        self.expected_return_date = Duration::try_days(days)
            .and_then(|delta| self.expected_return_date.checked_add_signed(delta))
            .ok_or_else(|| AppError::Validation(format!("Cannot extend by {} days", days)))?;
        Ok(())
    }

    /// Close the loan as returned today. The caller must restore the copy.
    pub fn mark_returned(&mut self, today: NaiveDate) -> AppResult<()> {
        self.ensure_open("return")?;
        self.actual_return_date = Some(today);
        self.status = LoanStatus::Returned;
        Ok(())
    }

    /// Close the loan as lost. The copy never comes back to the shelf.
    pub fn mark_lost(&mut self) -> AppResult<()> {
        self.ensure_open("mark as lost")?;
        self.status = LoanStatus::Lost;
        Ok(())
    }

    /// Apply a librarian edit (dates, fine, note, or a move to `Lost`).
    pub fn apply_update(&mut self, update: UpdateLoan) -> AppResult<()> {
        if let Some(status) = update.status {
            match status {
                s if s == self.status => {}
                LoanStatus::Lost => self.mark_lost()?,
                LoanStatus::Returned => {
                    return Err(AppError::InvalidTransition(
                        "Use POST /loans/{id}/return to return a book".to_string(),
                    ))
                }
                other => {
                    return Err(AppError::InvalidTransition(format!(
                        "Cannot move loan {} from {} to {}",
                        self.id, self.status, other
                    )))
                }
            }
        }

        if let Some(date) = update.expected_return_date {
            if date < self.loan_date.date_naive() {
                return Err(AppError::Validation(
                    "Expected return date cannot precede the loan date".to_string(),
                ));
            }
            self.expected_return_date = date;
        }

        if let Some(fine) = update.fine_amount {
            if fine.is_sign_negative() {
                return Err(AppError::Validation("Fine amount cannot be negative".to_string()));
            }
            self.fine_amount = fine.round_dp(2);
        }

        if let Some(note) = update.note {
            self.note = Some(note);
        }

        Ok(())
    }
}

/// Due date for a new loan: caller's choice, or `today + default_days`
pub fn due_date(
    requested: Option<NaiveDate>,
    today: NaiveDate,
    default_days: i64,
) -> AppResult<NaiveDate> {
    match requested {
        Some(date) if date < today => Err(AppError::Validation(
            "Expected return date cannot be in the past".to_string(),
        )),
        Some(date) => Ok(date),
        None => Duration::try_days(default_days)
            .and_then(|delta| today.checked_add_signed(delta))
            .ok_or_else(|| AppError::Internal(format!("Invalid loan period of {} days", default_days))),
    }
}

/// Create loan request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLoan {
    pub book_id: i32,
    /// Required for librarians; ignored for patrons, who always borrow for themselves
    pub member_id: Option<i32>,
    pub expected_return_date: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

/// Update loan request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLoan {
    pub expected_return_date: Option<NaiveDate>,
    pub status: Option<LoanStatus>,
    #[schema(value_type = Option<String>, example = "2.50")]
    pub fine_amount: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

/// Extend loan request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ExtendLoan {
    /// Extra days (defaults to the configured extension)
    pub days: Option<i64>,
}

/// Status filter for loan listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanFilter {
    All,
    Status(LoanStatus),
    /// Ongoing or overdue
    Open,
}

/// Loan counts by status. Wire keys are those the dashboard client reads.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LoanStatistics {
    pub total: i64,
    #[serde(rename = "en_cours")]
    pub ongoing: i64,
    #[serde(rename = "en_retard")]
    pub overdue: i64,
    #[serde(rename = "retournes")]
    pub returned: i64,
}

impl LoanStatistics {
    pub fn from_counts(counts: impl IntoIterator<Item = (LoanStatus, i64)>) -> Self {
        counts
            .into_iter()
            .fold(LoanStatistics::default(), |mut stats, (status, count)| {
                stats.total += count;
                match status {
                    LoanStatus::Ongoing => stats.ongoing += count,
                    LoanStatus::Overdue => stats.overdue += count,
                    LoanStatus::Returned => stats.returned += count,
                    LoanStatus::Lost => {}
                }
                stats
            })
    }
}
