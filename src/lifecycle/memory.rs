//! In-process loan store.
//!
//! Each transaction holds the store lock from `begin` until it commits or is
//! dropped, and works on a private copy of the state, so transactions are
//! serializable and a rolled-back transaction leaves no trace.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    ledger::InventoryLedger,
    overdue,
    store::{LoanStore, LoanTransaction},
};
use crate::{
    error::{LifecycleError, LifecycleResult},
    models::{
        book::{Book, CreateBook},
        loan::{Loan, LoanDraft, LoanStatus},
        reader::{CreateReader, Reader},
    },
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    books: BTreeMap<i32, Book>,
    readers: BTreeMap<i32, Reader>,
    loans: BTreeMap<i32, Loan>,
    last_book_id: i32,
    last_reader_id: i32,
    last_loan_id: i32,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_loan_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: make every loan row write from transactions begun after
    /// this call fail with a storage error. Nothing in the server calls it.
    #[doc(hidden)]
    pub fn fail_loan_writes(&self, fail: bool) {
        self.fail_loan_writes.store(fail, Ordering::SeqCst);
    }

    async fn filtered<F>(&self, keep: F) -> Vec<Loan>
    where
        F: Fn(&Loan) -> bool,
    {
        let state = self.state.lock().await;
        state.loans.values().filter(|l| keep(*l)).cloned().collect()
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
    fail_loan_writes: bool,
}

impl MemoryTransaction {
    fn check_writable(&self) -> LifecycleResult<()> {
        if self.fail_loan_writes {
            return Err(LifecycleError::Storage(sqlx::Error::Protocol(
                "loan write rejected by store".to_string(),
            )));
        }
        Ok(())
    }

    fn book_mut(&mut self, book_id: i32) -> LifecycleResult<&mut Book> {
        self.staged
            .books
            .get_mut(&book_id)
            .ok_or_else(|| LifecycleError::InvalidReference(format!("Book {} does not exist", book_id)))
    }
}

#[async_trait]
impl InventoryLedger for MemoryTransaction {
    async fn try_reserve(&mut self, book_id: i32) -> LifecycleResult<()> {
        let book = self.book_mut(book_id)?;
        if book.available_copies <= 0 {
            return Err(LifecycleError::InsufficientCopies { book_id });
        }
        book.available_copies -= 1;
        Ok(())
    }

    async fn release(&mut self, book_id: i32) -> LifecycleResult<()> {
        let book = self.book_mut(book_id)?;
        book.available_copies += 1;
        Ok(())
    }
}

#[async_trait]
impl LoanTransaction for MemoryTransaction {
    async fn book_exists(&mut self, book_id: i32) -> LifecycleResult<bool> {
        Ok(self.staged.books.contains_key(&book_id))
    }

    async fn reader_exists(&mut self, reader_id: i32) -> LifecycleResult<bool> {
        Ok(self.staged.readers.contains_key(&reader_id))
    }

    async fn load_loan(&mut self, loan_id: i32) -> LifecycleResult<Option<Loan>> {
        Ok(self.staged.loans.get(&loan_id).cloned())
    }

    async fn insert_loan(&mut self, draft: &LoanDraft) -> LifecycleResult<Loan> {
        self.check_writable()?;
        self.staged.last_loan_id += 1;
        let loan = draft.clone().into_loan(self.staged.last_loan_id);
        self.staged.loans.insert(loan.id, loan.clone());
        Ok(loan)
    }

    async fn update_loan(&mut self, loan_id: i32, draft: &LoanDraft) -> LifecycleResult<Loan> {
        self.check_writable()?;
        let slot = self
            .staged
            .loans
            .get_mut(&loan_id)
            .ok_or_else(|| LifecycleError::NotFound(format!("Loan with id {} not found", loan_id)))?;
        *slot = draft.clone().into_loan(loan_id);
        Ok(slot.clone())
    }

    async fn delete_loan(&mut self, loan_id: i32) -> LifecycleResult<()> {
        self.check_writable()?;
        self.staged
            .loans
            .remove(&loan_id)
            .map(|_| ())
            .ok_or_else(|| LifecycleError::NotFound(format!("Loan with id {} not found", loan_id)))
    }

    async fn commit(self: Box<Self>) -> LifecycleResult<()> {
        let MemoryTransaction { mut guard, staged, .. } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> LifecycleResult<()> {
        Ok(())
    }
}

#[async_trait]
impl LoanStore for MemoryStore {
    async fn begin(&self) -> LifecycleResult<Box<dyn LoanTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            staged,
            fail_loan_writes: self.fail_loan_writes.load(Ordering::SeqCst),
        }))
    }

    async fn ping(&self) -> LifecycleResult<()> {
        Ok(())
    }

    async fn get_loan(&self, loan_id: i32) -> LifecycleResult<Option<Loan>> {
        Ok(self.state.lock().await.loans.get(&loan_id).cloned())
    }

    async fn create_book(&self, book: &CreateBook) -> LifecycleResult<Book> {
        let mut state = self.state.lock().await;
        if state.books.values().any(|b| b.isbn == book.isbn) {
            return Err(LifecycleError::Duplicate(format!("ISBN {} is already registered", book.isbn)));
        }
        state.last_book_id += 1;
        let book = Book {
            id: state.last_book_id,
            title: book.title.clone(),
            isbn: book.isbn.clone(),
            available_copies: book.available_copies,
        };
        state.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn get_book(&self, book_id: i32) -> LifecycleResult<Option<Book>> {
        Ok(self.state.lock().await.books.get(&book_id).cloned())
    }

    async fn create_reader(&self, reader: &CreateReader) -> LifecycleResult<Reader> {
        let mut state = self.state.lock().await;
        if state.readers.values().any(|r| r.email == reader.email) {
            return Err(LifecycleError::Duplicate(format!("Email {} is already registered", reader.email)));
        }
        state.last_reader_id += 1;
        let reader = Reader {
            id: state.last_reader_id,
            first_name: reader.first_name.clone(),
            last_name: reader.last_name.clone(),
            email: reader.email.clone(),
            phone: reader.phone.clone(),
        };
        state.readers.insert(reader.id, reader.clone());
        Ok(reader)
    }

    async fn get_reader(&self, reader_id: i32) -> LifecycleResult<Option<Reader>> {
        Ok(self.state.lock().await.readers.get(&reader_id).cloned())
    }

    async fn loans_by_book(&self, book_id: i32) -> LifecycleResult<Vec<Loan>> {
        Ok(self.filtered(|l| l.book_id == book_id).await)
    }

    async fn loans_by_reader(&self, reader_id: i32) -> LifecycleResult<Vec<Loan>> {
        Ok(self.filtered(|l| l.reader_id == reader_id).await)
    }

    async fn active_loans_by_reader(&self, reader_id: i32) -> LifecycleResult<Vec<Loan>> {
        Ok(self
            .filtered(|l| l.reader_id == reader_id && l.status == LoanStatus::Borrowed)
            .await)
    }

    async fn overdue_loans(
        &self,
        now: DateTime<Utc>,
        reader_id: Option<i32>,
    ) -> LifecycleResult<Vec<Loan>> {
        let loans = self
            .filtered(|l| reader_id.map_or(true, |id| l.reader_id == id))
            .await;
        Ok(overdue::overdue_at(loans, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn shelve(store: &MemoryStore, copies: i32) -> Book {
        store
            .create_book(&CreateBook {
                title: "Dune".to_string(),
                isbn: "9780441013593".to_string(),
                available_copies: copies,
            })
            .await
            .unwrap()
    }

    async fn enrol(store: &MemoryStore) -> i32 {
        store
            .create_reader(&CreateReader {
                first_name: "Paul".to_string(),
                last_name: "Atreides".to_string(),
                email: "paul@arrakis.example".to_string(),
                phone: None,
            })
            .await
            .unwrap()
            .id
    }

    fn draft(book_id: i32, reader_id: i32) -> LoanDraft {
        let now = Utc::now();
        LoanDraft {
            book_id,
            reader_id,
            loan_date: now,
            due_date: now + Duration::days(14),
            return_date: None,
            status: LoanStatus::Borrowed,
        }
    }

    #[tokio::test]
    async fn committed_writes_become_visible() {
        let store = MemoryStore::new();
        let book = shelve(&store, 2).await;
        let reader = enrol(&store).await;

        let mut tx = store.begin().await.unwrap();
        tx.try_reserve(book.id).await.unwrap();
        let loan = tx.insert_loan(&draft(book.id, reader)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.get_book(book.id).await.unwrap().unwrap().available_copies, 1);
        assert_eq!(store.get_loan(loan.id).await.unwrap(), Some(loan));
    }

    #[tokio::test]
    async fn rolled_back_writes_leave_no_trace() {
        let store = MemoryStore::new();
        let book = shelve(&store, 2).await;
        let reader = enrol(&store).await;

        let mut tx = store.begin().await.unwrap();
        tx.try_reserve(book.id).await.unwrap();
        tx.insert_loan(&draft(book.id, reader)).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.get_book(book.id).await.unwrap().unwrap().available_copies, 2);
        assert!(store.loans_by_book(book.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dropped_transaction_is_discarded() {
        let store = MemoryStore::new();
        let book = shelve(&store, 1).await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.try_reserve(book.id).await.unwrap();
        }

        assert_eq!(store.get_book(book.id).await.unwrap().unwrap().available_copies, 1);
    }

    #[tokio::test]
    async fn reserve_fails_without_copies() {
        let store = MemoryStore::new();
        let book = shelve(&store, 0).await;

        let mut tx = store.begin().await.unwrap();
        let err = tx.try_reserve(book.id).await.unwrap_err();
        assert!(matches!(err, LifecycleError::InsufficientCopies { book_id } if book_id == book.id));
    }

    #[tokio::test]
    async fn ledger_rejects_unknown_books() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.try_reserve(99).await,
            Err(LifecycleError::InvalidReference(_))
        ));
        assert!(matches!(
            tx.release(99).await,
            Err(LifecycleError::InvalidReference(_))
        ));
    }

    #[tokio::test]
    async fn injected_write_failure_is_a_storage_error() {
        let store = MemoryStore::new();
        let book = shelve(&store, 1).await;
        let reader = enrol(&store).await;
        store.fail_loan_writes(true);

        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.insert_loan(&draft(book.id, reader)).await,
            Err(LifecycleError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn registrations_reject_duplicates() {
        let store = MemoryStore::new();
        shelve(&store, 1).await;
        enrol(&store).await;

        let book = CreateBook {
            title: "Dune Messiah".to_string(),
            isbn: "9780441013593".to_string(),
            available_copies: 1,
        };
        assert!(matches!(store.create_book(&book).await, Err(LifecycleError::Duplicate(_))));

        let reader = CreateReader {
            first_name: "Alia".to_string(),
            last_name: "Atreides".to_string(),
            email: "paul@arrakis.example".to_string(),
            phone: None,
        };
        assert!(matches!(store.create_reader(&reader).await, Err(LifecycleError::Duplicate(_))));
    }

    #[tokio::test]
    async fn registered_reader_is_visible_to_transactions() {
        let store = MemoryStore::new();
        let reader = enrol(&store).await;

        let mut tx = store.begin().await.unwrap();
        assert!(tx.reader_exists(reader).await.unwrap());
        assert!(!tx.reader_exists(reader + 1).await.unwrap());
    }
}
