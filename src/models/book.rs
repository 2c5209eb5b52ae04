//! Book model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book inventory row.
///
/// `available_copies` is only ever changed by the inventory ledger once the
/// book exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub isbn: String,
    pub available_copies: i32,
}

/// Register book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "title must be 1 to 255 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 13, message = "isbn must be 1 to 13 characters"))]
    pub isbn: String,
    /// Copies on the shelf when the book is registered
    #[validate(range(min = 0, message = "available_copies cannot be negative"))]
    pub available_copies: i32,
}
