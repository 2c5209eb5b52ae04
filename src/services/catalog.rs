//! Book and reader registration

use std::sync::Arc;

use crate::{
    error::{LifecycleError, LifecycleResult},
    lifecycle::LoanStore,
    models::{
        book::{Book, CreateBook},
        reader::{CreateReader, Reader},
    },
};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn LoanStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn LoanStore>) -> Self {
        Self { store }
    }

    /// Register a book with its starting number of copies
    #[tracing::instrument(skip(self, book), fields(isbn = %book.isbn))]
    pub async fn create_book(&self, book: CreateBook) -> LifecycleResult<Book> {
        let book = self.store.create_book(&book).await?;
        tracing::info!(book_id = book.id, copies = book.available_copies, "Book registered");
        Ok(book)
    }

    /// Get a book with its current availability
    pub async fn get_book(&self, book_id: i32) -> LifecycleResult<Book> {
        self.store
            .get_book(book_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("Book with id {} not found", book_id)))
    }

    #[tracing::instrument(skip(self, reader))]
    pub async fn create_reader(&self, reader: CreateReader) -> LifecycleResult<Reader> {
        let reader = self.store.create_reader(&reader).await?;
        tracing::info!(reader_id = reader.id, "Reader registered");
        Ok(reader)
    }

    pub async fn get_reader(&self, reader_id: i32) -> LifecycleResult<Reader> {
        self.store
            .get_reader(reader_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("Reader with id {} not found", reader_id)))
    }
}
