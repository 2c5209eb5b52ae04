//! Loans repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{LifecycleError, LifecycleResult},
    models::loan::{Loan, LoanDraft},
};

const LOAN_COLUMNS: &str = "id, book_id, reader_id, loan_date, due_date, return_date, status";

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> LifecycleResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {} FROM loans WHERE id = $1",
            LOAN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(loan)
    }

    /// Get all loans of a book
    pub async fn get_by_book(&self, book_id: i32) -> LifecycleResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {} FROM loans WHERE book_id = $1 ORDER BY id",
            LOAN_COLUMNS
        ))
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Get all loans of a reader
    pub async fn get_by_reader(&self, reader_id: i32) -> LifecycleResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {} FROM loans WHERE reader_id = $1 ORDER BY id",
            LOAN_COLUMNS
        ))
        .bind(reader_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Get the borrowed loans of a reader
    pub async fn get_active_by_reader(&self, reader_id: i32) -> LifecycleResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {} FROM loans WHERE reader_id = $1 AND status = 'borrowed' ORDER BY id",
            LOAN_COLUMNS
        ))
        .bind(reader_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Get overdue loans, optionally restricted to one reader
    pub async fn get_overdue(
        &self,
        now: DateTime<Utc>,
        reader_id: Option<i32>,
    ) -> LifecycleResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            r#"
            SELECT {} FROM loans
            WHERE status = 'borrowed' AND due_date < $1
              AND ($2::INTEGER IS NULL OR reader_id = $2)
            ORDER BY id
            "#,
            LOAN_COLUMNS
        ))
        .bind(now)
        .bind(reader_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }
}

/// Load a loan and hold a row lock on it until the transaction ends
pub(super) async fn lock_by_id(conn: &mut PgConnection, id: i32) -> LifecycleResult<Option<Loan>> {
    let loan = sqlx::query_as::<_, Loan>(&format!(
        "SELECT {} FROM loans WHERE id = $1 FOR UPDATE",
        LOAN_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(loan)
}

pub(super) async fn insert(conn: &mut PgConnection, draft: &LoanDraft) -> LifecycleResult<Loan> {
    let loan = sqlx::query_as::<_, Loan>(&format!(
        r#"
        INSERT INTO loans (book_id, reader_id, loan_date, due_date, return_date, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {}
        "#,
        LOAN_COLUMNS
    ))
    .bind(draft.book_id)
    .bind(draft.reader_id)
    .bind(draft.loan_date)
    .bind(draft.due_date)
    .bind(draft.return_date)
    .bind(draft.status)
    .fetch_one(&mut *conn)
    .await?;
    Ok(loan)
}

pub(super) async fn update(
    conn: &mut PgConnection,
    id: i32,
    draft: &LoanDraft,
) -> LifecycleResult<Loan> {
    sqlx::query_as::<_, Loan>(&format!(
        r#"
        UPDATE loans
        SET book_id = $1, reader_id = $2, loan_date = $3, due_date = $4,
            return_date = $5, status = $6, updated_at = NOW()
        WHERE id = $7
        RETURNING {}
        "#,
        LOAN_COLUMNS
    ))
    .bind(draft.book_id)
    .bind(draft.reader_id)
    .bind(draft.loan_date)
    .bind(draft.due_date)
    .bind(draft.return_date)
    .bind(draft.status)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| LifecycleError::NotFound(format!("Loan with id {} not found", id)))
}

pub(super) async fn delete(conn: &mut PgConnection, id: i32) -> LifecycleResult<()> {
    let result = sqlx::query("DELETE FROM loans WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(LifecycleError::NotFound(format!("Loan with id {} not found", id)));
    }
    Ok(())
}
