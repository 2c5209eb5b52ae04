//! Loan model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

use crate::lifecycle::overdue;

/// Loan status.
///
/// A `Borrowed` loan holds a claim on one copy of its book; a `Returned`
/// loan holds none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Borrowed,
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Borrowed => "borrowed",
            LoanStatus::Returned => "returned",
        }
    }

    /// Whether a loan in this status holds a copy of its book
    pub fn holds_copy(&self) -> bool {
        matches!(self, LoanStatus::Borrowed)
    }
}

impl Default for LoanStatus {
    fn default() -> Self {
        LoanStatus::Borrowed
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrowed" => Ok(LoanStatus::Borrowed),
            "returned" => Ok(LoanStatus::Returned),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

// SQLx conversion for LoanStatus (stored as TEXT)
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Loan model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub book_id: i32,
    pub reader_id: i32,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

/// Create loan request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLoan {
    #[validate(range(min = 1, message = "book_id must be a positive id"))]
    pub book_id: i32,
    #[validate(range(min = 1, message = "reader_id must be a positive id"))]
    pub reader_id: i32,
    /// Defaults to the current time
    pub loan_date: Option<DateTime<Utc>>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    /// Defaults to `borrowed`
    pub status: Option<LoanStatus>,
}

/// Update loan request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLoan {
    #[validate(range(min = 1, message = "book_id must be a positive id"))]
    pub book_id: Option<i32>,
    #[validate(range(min = 1, message = "reader_id must be a positive id"))]
    pub reader_id: Option<i32>,
    pub loan_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: Option<LoanStatus>,
}

/// Field values of a loan row as they will be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct LoanDraft {
    pub book_id: i32,
    pub reader_id: i32,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

impl LoanDraft {
    pub fn into_loan(self, id: i32) -> Loan {
        Loan {
            id,
            book_id: self.book_id,
            reader_id: self.reader_id,
            loan_date: self.loan_date,
            due_date: self.due_date,
            return_date: self.return_date,
            status: self.status,
        }
    }
}

/// Loan as returned by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanDetails {
    #[serde(flatten)]
    pub loan: Loan,
    pub is_overdue: bool,
}

impl LoanDetails {
    pub fn new(loan: Loan, now: DateTime<Utc>) -> Self {
        let is_overdue = overdue::is_overdue(&loan, now);
        Self { loan, is_overdue }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn loan(status: LoanStatus, due_in_days: i64) -> Loan {
        let now = Utc::now();
        Loan {
            id: 1,
            book_id: 1,
            reader_id: 1,
            loan_date: now - Duration::days(30),
            due_date: now + Duration::days(due_in_days),
            return_date: None,
            status,
        }
    }

    #[test]
    fn status_parses_known_values_only() {
        assert_eq!("borrowed".parse::<LoanStatus>(), Ok(LoanStatus::Borrowed));
        assert_eq!("returned".parse::<LoanStatus>(), Ok(LoanStatus::Returned));
        assert!("lost".parse::<LoanStatus>().is_err());
        assert!("Borrowed".parse::<LoanStatus>().is_err());
    }

    #[test]
    fn status_rejects_unknown_values_in_json() {
        let ok: Result<LoanStatus, _> = serde_json::from_str("\"returned\"");
        assert_eq!(ok.ok(), Some(LoanStatus::Returned));
        let bad: Result<LoanStatus, _> = serde_json::from_str("\"overdue\"");
        assert!(bad.is_err());
    }

    #[test]
    fn details_flatten_loan_fields() {
        let now = Utc::now();
        let details = LoanDetails::new(loan(LoanStatus::Borrowed, -2), now);
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["status"], "borrowed");
        assert_eq!(json["book_id"], 1);
        assert_eq!(json["is_overdue"], true);
    }
}
