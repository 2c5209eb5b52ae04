//! Readers repository

use sqlx::{PgConnection, Pool, Postgres};

use super::duplicate_or;
use crate::{
    error::LifecycleResult,
    models::reader::{CreateReader, Reader},
};

const READER_COLUMNS: &str = "id, first_name, last_name, email, phone";

#[derive(Clone)]
pub struct ReadersRepository {
    pool: Pool<Postgres>,
}

impl ReadersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reader by ID
    pub async fn get_by_id(&self, id: i32) -> LifecycleResult<Option<Reader>> {
        let reader = sqlx::query_as::<_, Reader>(&format!(
            "SELECT {} FROM readers WHERE id = $1",
            READER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(reader)
    }

    /// Register a new reader
    pub async fn create(&self, reader: &CreateReader) -> LifecycleResult<Reader> {
        sqlx::query_as::<_, Reader>(&format!(
            r#"
            INSERT INTO readers (first_name, last_name, email, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            READER_COLUMNS
        ))
        .bind(&reader.first_name)
        .bind(&reader.last_name)
        .bind(&reader.email)
        .bind(&reader.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_or(e, format!("Email {} is already registered", reader.email)))
    }
}

pub(super) async fn exists(conn: &mut PgConnection, id: i32) -> LifecycleResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM readers WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}
