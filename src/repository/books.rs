//! Books repository: inventory reads and the ledger's conditional updates

use sqlx::{PgConnection, Pool, Postgres};

use super::duplicate_or;
use crate::{
    error::{LifecycleError, LifecycleResult},
    models::book::{Book, CreateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> LifecycleResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT id, title, isbn, available_copies FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    /// Register a new book
    pub async fn create(&self, book: &CreateBook) -> LifecycleResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, isbn, available_copies)
            VALUES ($1, $2, $3)
            RETURNING id, title, isbn, available_copies
            "#,
        )
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(book.available_copies)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_or(e, format!("ISBN {} is already registered", book.isbn)))
    }
}

pub(super) async fn exists(conn: &mut PgConnection, id: i32) -> LifecycleResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

/// Take one copy of a book, in a single conditional update
pub(super) async fn reserve_copy(conn: &mut PgConnection, id: i32) -> LifecycleResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE books SET available_copies = available_copies - 1
        WHERE id = $1 AND available_copies > 0
        "#,
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        // Either the book is gone or it had no copy left
        if exists(conn, id).await? {
            return Err(LifecycleError::InsufficientCopies { book_id: id });
        }
        return Err(LifecycleError::InvalidReference(format!("Book {} does not exist", id)));
    }
    Ok(())
}

/// Give back one copy of a book
pub(super) async fn release_copy(conn: &mut PgConnection, id: i32) -> LifecycleResult<()> {
    let result = sqlx::query("UPDATE books SET available_copies = available_copies + 1 WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(LifecycleError::InvalidReference(format!("Book {} does not exist", id)));
    }
    Ok(())
}
