//! Storage abstraction consumed by the lifecycle coordinator

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::ledger::InventoryLedger;
use crate::{
    error::LifecycleResult,
    models::{
        book::{Book, CreateBook},
        loan::{Loan, LoanDraft},
        reader::{CreateReader, Reader},
    },
};

/// A unit of work against the store.
///
/// Nothing written through a transaction is visible to other callers until
/// `commit` succeeds. Dropping a transaction without committing discards
/// its writes.
#[async_trait]
pub trait LoanTransaction: InventoryLedger {
    async fn book_exists(&mut self, book_id: i32) -> LifecycleResult<bool>;

    async fn reader_exists(&mut self, reader_id: i32) -> LifecycleResult<bool>;

    /// Load a loan and lock it against concurrent lifecycle changes
    async fn load_loan(&mut self, loan_id: i32) -> LifecycleResult<Option<Loan>>;

    async fn insert_loan(&mut self, draft: &LoanDraft) -> LifecycleResult<Loan>;

    async fn update_loan(&mut self, loan_id: i32, draft: &LoanDraft) -> LifecycleResult<Loan>;

    async fn delete_loan(&mut self, loan_id: i32) -> LifecycleResult<()>;

    async fn commit(self: Box<Self>) -> LifecycleResult<()>;

    async fn rollback(self: Box<Self>) -> LifecycleResult<()>;
}

/// Loan storage backend
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn begin(&self) -> LifecycleResult<Box<dyn LoanTransaction>>;

    /// Check that the backend is reachable
    async fn ping(&self) -> LifecycleResult<()>;

    async fn get_loan(&self, loan_id: i32) -> LifecycleResult<Option<Loan>>;

    /// Register a book with its starting stock.
    ///
    /// Fails with `Duplicate` when the ISBN is already registered.
    async fn create_book(&self, book: &CreateBook) -> LifecycleResult<Book>;

    async fn get_book(&self, book_id: i32) -> LifecycleResult<Option<Book>>;

    /// Register a reader; fails with `Duplicate` on a known email
    async fn create_reader(&self, reader: &CreateReader) -> LifecycleResult<Reader>;

    async fn get_reader(&self, reader_id: i32) -> LifecycleResult<Option<Reader>>;

    async fn loans_by_book(&self, book_id: i32) -> LifecycleResult<Vec<Loan>>;

    async fn loans_by_reader(&self, reader_id: i32) -> LifecycleResult<Vec<Loan>>;

    /// Borrowed loans of a reader
    async fn active_loans_by_reader(&self, reader_id: i32) -> LifecycleResult<Vec<Loan>>;

    /// Borrowed loans whose due date is before `now`, optionally for one reader
    async fn overdue_loans(
        &self,
        now: DateTime<Utc>,
        reader_id: Option<i32>,
    ) -> LifecycleResult<Vec<Loan>>;
}
