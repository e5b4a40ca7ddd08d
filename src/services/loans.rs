//! Loan lifecycle service
//!
//! Resolves who a loan is for, picks dates from configuration, and hands the
//! state change to the repository, which applies it together with the
//! availability adjustment.

use chrono::{NaiveDate, Utc};
use validator::Validate;

use crate::{
    config::LoansConfig,
    error::AppResult,
    models::{
        loan::{due_date, CreateLoan, Loan, LoanFilter, LoanStatistics, LoanStatus, UpdateLoan},
        query::ListQuery,
    },
    policy::Caller,
    repository::{loans::NewLoan, Repository},
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    config: LoansConfig,
}

impl LoansService {
    pub fn new(repository: Repository, config: LoansConfig) -> Self {
        Self { repository, config }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Loans visible to the caller, optionally narrowed by status
    pub async fn search(
        &self,
        caller: &Caller,
        filter: LoanFilter,
        query: &ListQuery,
    ) -> AppResult<(Vec<Loan>, i64)> {
        self.repository
            .loans
            .search(&caller.scope(), filter, None, query, Self::today())
            .await
    }

    pub async fn search_ongoing(&self, caller: &Caller, query: &ListQuery) -> AppResult<(Vec<Loan>, i64)> {
        self.search(caller, LoanFilter::Status(LoanStatus::Ongoing), query)
            .await
    }

    pub async fn search_overdue(&self, caller: &Caller, query: &ListQuery) -> AppResult<(Vec<Loan>, i64)> {
        self.search(caller, LoanFilter::Status(LoanStatus::Overdue), query)
            .await
    }

    /// Open loans of one member
    pub async fn current_for_member(
        &self,
        caller: &Caller,
        member_id: i32,
        query: &ListQuery,
    ) -> AppResult<(Vec<Loan>, i64)> {
        let member = self.repository.members.get_by_id(member_id).await?;
        caller.ensure_can_read_member(&member)?;

        self.repository
            .loans
            .search(
                &caller.scope(),
                LoanFilter::Open,
                Some(member.id),
                query,
                Self::today(),
            )
            .await
    }

    pub async fn get(&self, caller: &Caller, id: i32) -> AppResult<Loan> {
        self.repository
            .loans
            .get_by_id(id, &caller.scope(), Self::today())
            .await
    }

    /// Lend a copy. Patrons always borrow for their own member record.
    pub async fn create(&self, caller: &Caller, request: CreateLoan) -> AppResult<Loan> {
        request.validate()?;

        let own_member = if caller.is_librarian() {
            None
        } else {
            self.repository.members.find_by_email(&caller.email).await?
        };
        let member_id = caller.loan_member(request.member_id, own_member.as_ref())?;

        let now = Utc::now();
        let expected_return_date = due_date(
            request.expected_return_date,
            now.date_naive(),
            self.config.default_duration_days,
        )?;

        let loan = self
            .repository
            .loans
            .create(NewLoan {
                book_id: request.book_id,
                member_id,
                loan_date: now,
                expected_return_date,
                note: request.note,
            })
            .await?;

        tracing::info!(
            loan_id = loan.id,
            book_id = loan.book_id,
            member_id = loan.member_id,
            due = %loan.expected_return_date,
            "Loan created"
        );
        Ok(loan)
    }

    pub async fn update(&self, caller: &Caller, id: i32, update: UpdateLoan) -> AppResult<Loan> {
        caller.require_librarian("edit loans")?;
        update.validate()?;

        let loan = self
            .repository
            .loans
            .update(id, update, Self::today())
            .await?;
        tracing::info!(loan_id = id, status = %loan.status, "Loan updated");
        Ok(loan)
    }

    /// Extend by `days`, or by the configured default
    pub async fn extend(&self, caller: &Caller, id: i32, days: Option<i64>) -> AppResult<Loan> {
        caller.require_librarian("extend loans")?;
        let days = days.unwrap_or(self.config.default_extension_days);

        let loan = self.repository.loans.extend(id, days, Self::today()).await?;
        tracing::info!(
            loan_id = id,
            days,
            due = %loan.expected_return_date,
            "Loan extended"
        );
        Ok(loan)
    }

    pub async fn return_loan(&self, caller: &Caller, id: i32) -> AppResult<Loan> {
        caller.require_librarian("record returns")?;

        let loan = self.repository.loans.return_loan(id, Self::today()).await?;
        tracing::info!(loan_id = id, book_id = loan.book_id, "Loan returned");
        Ok(loan)
    }

    pub async fn delete(&self, caller: &Caller, id: i32) -> AppResult<()> {
        caller.require_librarian("delete loans")?;

        let book_id = self.repository.loans.delete(id).await?;
        tracing::info!(loan_id = id, book_id, "Loan deleted");
        Ok(())
    }

    pub async fn statistics(&self, caller: &Caller) -> AppResult<LoanStatistics> {
        self.repository
            .loans
            .statistics(&caller.scope(), Self::today())
            .await
    }
}
