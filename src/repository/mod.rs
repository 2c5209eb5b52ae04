//! Repository layer for database operations

pub mod books;
pub mod loans;
pub mod readers;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{LifecycleError, LifecycleResult},
    lifecycle::{InventoryLedger, LoanStore, LoanTransaction},
    models::{
        book::{Book, CreateBook},
        loan::{Loan, LoanDraft},
        reader::{CreateReader, Reader},
    },
};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub loans: loans::LoansRepository,
    pub readers: readers::ReadersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            readers: readers::ReadersRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Map a unique-constraint violation to `Duplicate`, anything else to `Storage`
fn duplicate_or(err: sqlx::Error, message: String) -> LifecycleError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => LifecycleError::Duplicate(message),
        _ => LifecycleError::Storage(err),
    }
}

/// Lifecycle transaction over a Postgres transaction
pub struct PgLoanTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl InventoryLedger for PgLoanTransaction {
    async fn try_reserve(&mut self, book_id: i32) -> LifecycleResult<()> {
        books::reserve_copy(&mut self.tx, book_id).await
    }

    async fn release(&mut self, book_id: i32) -> LifecycleResult<()> {
        books::release_copy(&mut self.tx, book_id).await
    }
}

#[async_trait]
impl LoanTransaction for PgLoanTransaction {
    async fn book_exists(&mut self, book_id: i32) -> LifecycleResult<bool> {
        books::exists(&mut self.tx, book_id).await
    }

    async fn reader_exists(&mut self, reader_id: i32) -> LifecycleResult<bool> {
        readers::exists(&mut self.tx, reader_id).await
    }

    async fn load_loan(&mut self, loan_id: i32) -> LifecycleResult<Option<Loan>> {
        loans::lock_by_id(&mut self.tx, loan_id).await
    }

    async fn insert_loan(&mut self, draft: &LoanDraft) -> LifecycleResult<Loan> {
        loans::insert(&mut self.tx, draft).await
    }

    async fn update_loan(&mut self, loan_id: i32, draft: &LoanDraft) -> LifecycleResult<Loan> {
        loans::update(&mut self.tx, loan_id, draft).await
    }

    async fn delete_loan(&mut self, loan_id: i32) -> LifecycleResult<()> {
        loans::delete(&mut self.tx, loan_id).await
    }

    async fn commit(self: Box<Self>) -> LifecycleResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> LifecycleResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl LoanStore for Repository {
    async fn begin(&self) -> LifecycleResult<Box<dyn LoanTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLoanTransaction { tx }))
    }

    async fn ping(&self) -> LifecycleResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_loan(&self, loan_id: i32) -> LifecycleResult<Option<Loan>> {
        self.loans.get_by_id(loan_id).await
    }

    async fn create_book(&self, book: &CreateBook) -> LifecycleResult<Book> {
        self.books.create(book).await
    }

    async fn get_book(&self, book_id: i32) -> LifecycleResult<Option<Book>> {
        self.books.get_by_id(book_id).await
    }

    async fn create_reader(&self, reader: &CreateReader) -> LifecycleResult<Reader> {
        self.readers.create(reader).await
    }

    async fn get_reader(&self, reader_id: i32) -> LifecycleResult<Option<Reader>> {
        self.readers.get_by_id(reader_id).await
    }

    async fn loans_by_book(&self, book_id: i32) -> LifecycleResult<Vec<Loan>> {
        self.loans.get_by_book(book_id).await
    }

    async fn loans_by_reader(&self, reader_id: i32) -> LifecycleResult<Vec<Loan>> {
        self.loans.get_by_reader(reader_id).await
    }

    async fn active_loans_by_reader(&self, reader_id: i32) -> LifecycleResult<Vec<Loan>> {
        self.loans.get_active_by_reader(reader_id).await
    }

    async fn overdue_loans(
        &self,
        now: DateTime<Utc>,
        reader_id: Option<i32>,
    ) -> LifecycleResult<Vec<Loan>> {
        self.loans.get_overdue(now, reader_id).await
    }
}
