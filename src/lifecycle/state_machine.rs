//! Loan state machine.
//!
//! Pure decision logic: for every lifecycle intent it computes the ledger
//! operations and the resulting loan fields, or rejects the intent. It
//! never touches storage.
//!
//! | From     | Intent               | To       | Ledger                       |
//! |----------|----------------------|----------|------------------------------|
//! | -        | create (borrowed)    | Borrowed | reserve book                 |
//! | -        | create (returned)    | Returned | none                         |
//! | Borrowed | change book B1 -> B2 | Borrowed | release B1, reserve B2       |
//! | Borrowed | status -> returned   | Returned | release current book         |
//! | Borrowed | delete               | -        | release book                 |
//! | Returned | delete               | -        | none                         |
//! | Returned | status -> borrowed   | rejected | -                            |

use chrono::{DateTime, Utc};

use super::ledger::LedgerOp;
use crate::{
    error::{LifecycleError, LifecycleResult},
    models::loan::{CreateLoan, Loan, LoanDraft, LoanStatus, UpdateLoan},
};

/// Ledger operations and loan fields implied by a lifecycle intent
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub ops: Vec<LedgerOp>,
    pub loan: LoanDraft,
}

fn ensure_dates(loan_date: DateTime<Utc>, due_date: DateTime<Utc>) -> LifecycleResult<()> {
    if due_date < loan_date {
        return Err(LifecycleError::Validation(format!(
            "due_date {} is before loan_date {}",
            due_date, loan_date
        )));
    }
    Ok(())
}

/// Plan the creation of a loan.
///
/// A loan created as `borrowed` (the default) reserves one copy. A loan
/// created directly as `returned` reserves nothing and gets a return date.
pub fn plan_create(request: &CreateLoan, now: DateTime<Utc>) -> LifecycleResult<Plan> {
    let status = request.status.unwrap_or_default();
    let loan_date = request.loan_date.unwrap_or(now);
    ensure_dates(loan_date, request.due_date)?;

    let (ops, return_date) = match status {
        LoanStatus::Borrowed => (vec![LedgerOp::Reserve(request.book_id)], request.return_date),
        LoanStatus::Returned => (Vec::new(), Some(request.return_date.unwrap_or(now))),
    };

    Ok(Plan {
        ops,
        loan: LoanDraft {
            book_id: request.book_id,
            reader_id: request.reader_id,
            loan_date,
            due_date: request.due_date,
            return_date,
            status,
        },
    })
}

/// Plan an update of an existing loan.
pub fn plan_update(
    current: &Loan,
    changes: &UpdateLoan,
    now: DateTime<Utc>,
) -> LifecycleResult<Plan> {
    let from = current.status;
    let to = changes.status.unwrap_or(from);
    let book_id = changes.book_id.unwrap_or(current.book_id);
    let book_changed = book_id != current.book_id;

    let ops = match (from, to) {
        (LoanStatus::Borrowed, LoanStatus::Borrowed) if book_changed => {
            vec![LedgerOp::Release(current.book_id), LedgerOp::Reserve(book_id)]
        }
        (LoanStatus::Borrowed, LoanStatus::Borrowed) => Vec::new(),
        // The claim being released is the one held on the current book;
        // a simultaneous reassignment carries no claim to the new book.
        (LoanStatus::Borrowed, LoanStatus::Returned) => vec![LedgerOp::Release(current.book_id)],
        (LoanStatus::Returned, LoanStatus::Returned) => Vec::new(),
        (LoanStatus::Returned, LoanStatus::Borrowed) => {
            return Err(LifecycleError::InvalidTransition { from, to });
        }
    };

    let mut return_date = changes.return_date.or(current.return_date);
    if from == LoanStatus::Borrowed && to == LoanStatus::Returned && return_date.is_none() {
        return_date = Some(now);
    }

    let loan_date = changes.loan_date.unwrap_or(current.loan_date);
    let due_date = changes.due_date.unwrap_or(current.due_date);
    ensure_dates(loan_date, due_date)?;

    Ok(Plan {
        ops,
        loan: LoanDraft {
            book_id,
            reader_id: changes.reader_id.unwrap_or(current.reader_id),
            loan_date,
            due_date,
            return_date,
            status: to,
        },
    })
}

/// Plan the deletion of a loan
pub fn plan_delete(current: &Loan) -> Vec<LedgerOp> {
    if current.status.holds_copy() {
        vec![LedgerOp::Release(current.book_id)]
    } else {
        Vec::new()
    }
}
