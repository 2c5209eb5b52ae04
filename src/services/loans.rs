//! Loan lifecycle coordinator.
//!
//! Every lifecycle intent runs in one store transaction: load current state,
//! ask the state machine for a plan, apply its ledger operations, write the
//! loan row, then commit. Any failure rolls the whole transaction back.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    error::{LifecycleError, LifecycleResult},
    lifecycle::{ledger, state_machine, LoanStore, LoanTransaction},
    models::loan::{CreateLoan, Loan, UpdateLoan},
};

#[derive(Clone)]
pub struct LoansService {
    store: Arc<dyn LoanStore>,
}

impl LoansService {
    pub fn new(store: Arc<dyn LoanStore>) -> Self {
        Self { store }
    }

    /// Create a new loan, reserving a copy when it starts out borrowed
    #[tracing::instrument(skip(self, request), fields(book_id = request.book_id, reader_id = request.reader_id))]
    pub async fn create_loan(&self, request: CreateLoan) -> LifecycleResult<Loan> {
        let plan = state_machine::plan_create(&request, Utc::now())?;

        let mut tx = self.store.begin().await?;
        let result = async {
            ensure_reader(tx.as_mut(), plan.loan.reader_id).await?;
            ensure_book(tx.as_mut(), plan.loan.book_id).await?;
            ledger::apply(tx.as_mut(), &plan.ops).await?;
            tx.insert_loan(&plan.loan).await
        }
        .await;

        let loan = finish(tx, result).await?;
        tracing::info!(loan_id = loan.id, status = %loan.status, "Loan created");
        Ok(loan)
    }

    /// Update a loan, moving copy claims between books as its status and
    /// book change
    #[tracing::instrument(skip(self, changes))]
    pub async fn update_loan(&self, loan_id: i32, changes: UpdateLoan) -> LifecycleResult<Loan> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let current = load(tx.as_mut(), loan_id).await?;
            let plan = state_machine::plan_update(&current, &changes, Utc::now())?;

            if plan.loan.reader_id != current.reader_id {
                ensure_reader(tx.as_mut(), plan.loan.reader_id).await?;
            }
            if plan.loan.book_id != current.book_id {
                ensure_book(tx.as_mut(), plan.loan.book_id).await?;
            }
            ledger::apply(tx.as_mut(), &plan.ops).await?;
            let updated = tx.update_loan(loan_id, &plan.loan).await?;
            Ok::<_, LifecycleError>((current.status, updated))
        }
        .await;

        let (from, loan) = finish(tx, result).await?;
        tracing::info!(from = %from, to = %loan.status, book_id = loan.book_id, "Loan updated");
        Ok(loan)
    }

    /// Delete a loan, releasing its copy if it was still borrowed
    #[tracing::instrument(skip(self))]
    pub async fn delete_loan(&self, loan_id: i32) -> LifecycleResult<()> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let current = load(tx.as_mut(), loan_id).await?;
            let ops = state_machine::plan_delete(&current);
            ledger::apply(tx.as_mut(), &ops).await?;
            tx.delete_loan(loan_id).await
        }
        .await;

        finish(tx, result).await?;
        tracing::info!("Loan deleted");
        Ok(())
    }

    /// Get a single loan
    pub async fn get_loan(&self, loan_id: i32) -> LifecycleResult<Loan> {
        self.store
            .get_loan(loan_id)
            .await?
            .ok_or_else(|| not_found(loan_id))
    }

    pub async fn loans_by_book(&self, book_id: i32) -> LifecycleResult<Vec<Loan>> {
        self.store.loans_by_book(book_id).await
    }

    pub async fn loans_by_reader(&self, reader_id: i32) -> LifecycleResult<Vec<Loan>> {
        self.store.loans_by_reader(reader_id).await
    }

    pub async fn active_loans_by_reader(&self, reader_id: i32) -> LifecycleResult<Vec<Loan>> {
        self.store.active_loans_by_reader(reader_id).await
    }

    /// Borrowed loans past their due date at `now`
    pub async fn overdue_loans(
        &self,
        now: DateTime<Utc>,
        reader_id: Option<i32>,
    ) -> LifecycleResult<Vec<Loan>> {
        self.store.overdue_loans(now, reader_id).await
    }

    /// Check that the store is reachable
    pub async fn ping(&self) -> LifecycleResult<()> {
        self.store.ping().await
    }
}

fn not_found(loan_id: i32) -> LifecycleError {
    LifecycleError::NotFound(format!("Loan with id {} not found", loan_id))
}

async fn load(tx: &mut dyn LoanTransaction, loan_id: i32) -> LifecycleResult<Loan> {
    tx.load_loan(loan_id).await?.ok_or_else(|| not_found(loan_id))
}

async fn ensure_book(tx: &mut dyn LoanTransaction, book_id: i32) -> LifecycleResult<()> {
    if !tx.book_exists(book_id).await? {
        return Err(LifecycleError::InvalidReference(format!("Book {} does not exist", book_id)));
    }
    Ok(())
}

async fn ensure_reader(tx: &mut dyn LoanTransaction, reader_id: i32) -> LifecycleResult<()> {
    if !tx.reader_exists(reader_id).await? {
        return Err(LifecycleError::InvalidReference(format!(
            "Reader {} does not exist",
            reader_id
        )));
    }
    Ok(())
}

/// Commit on success, roll back on failure
async fn finish<T>(tx: Box<dyn LoanTransaction>, result: LifecycleResult<T>) -> LifecycleResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            match &err {
                LifecycleError::Storage(e) => tracing::error!("Lifecycle aborted by storage failure: {}", e),
                other => tracing::warn!("Lifecycle intent rejected: {}", other),
            }
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}
