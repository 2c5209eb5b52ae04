//! Inventory ledger: the only writer of `books.available_copies`.

use async_trait::async_trait;

use crate::error::LifecycleResult;

/// Atomic per-book copy counter.
///
/// Implementations must perform each operation as a single
/// read-modify-write against the backing store, never as a separate read
/// followed by a write.
#[async_trait]
pub trait InventoryLedger: Send {
    /// Decrement the book's available copies if at least one is available.
    ///
    /// Fails with `InsufficientCopies` without touching the counter when
    /// none is available, and with `InvalidReference` when the book does
    /// not exist.
    async fn try_reserve(&mut self, book_id: i32) -> LifecycleResult<()>;

    /// Increment the book's available copies.
    ///
    /// Fails only with `InvalidReference` when the book does not exist.
    async fn release(&mut self, book_id: i32) -> LifecycleResult<()>;
}

/// A single ledger operation required by a lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOp {
    Reserve(i32),
    Release(i32),
}

impl LedgerOp {
    pub fn book_id(&self) -> i32 {
        match *self {
            LedgerOp::Reserve(book_id) | LedgerOp::Release(book_id) => book_id,
        }
    }
}

/// Apply ledger operations in ascending book id order, stopping at the
/// first failure.
///
/// Each operation is an independent delta on one book, so the order does
/// not change the outcome of a committed plan. A fixed order means two
/// transactions touching the same books lock their rows in the same
/// sequence and cannot deadlock each other.
///
/// Operations already applied are not undone here; the caller owns the
/// transaction and rolls it back.
pub async fn apply<L>(ledger: &mut L, ops: &[LedgerOp]) -> LifecycleResult<()>
where
    L: InventoryLedger + ?Sized,
{
    let mut ordered = ops.to_vec();
    ordered.sort_by_key(LedgerOp::book_id);

    for op in &ordered {
        tracing::debug!(?op, "Applying ledger operation");
        match *op {
            LedgerOp::Reserve(book_id) => ledger.try_reserve(book_id).await?,
            LedgerOp::Release(book_id) => ledger.release(book_id).await?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LifecycleError;
    use std::collections::HashMap;

    #[derive(Default)]
    struct CountingLedger {
        copies: HashMap<i32, i32>,
        calls: Vec<LedgerOp>,
    }

    #[async_trait]
    impl InventoryLedger for CountingLedger {
        async fn try_reserve(&mut self, book_id: i32) -> LifecycleResult<()> {
            self.calls.push(LedgerOp::Reserve(book_id));
            let copies = self
                .copies
                .get_mut(&book_id)
                .ok_or_else(|| LifecycleError::InvalidReference(format!("Book {}", book_id)))?;
            if *copies == 0 {
                return Err(LifecycleError::InsufficientCopies { book_id });
            }
            *copies -= 1;
            Ok(())
        }

        async fn release(&mut self, book_id: i32) -> LifecycleResult<()> {
            self.calls.push(LedgerOp::Release(book_id));
            let copies = self
                .copies
                .get_mut(&book_id)
                .ok_or_else(|| LifecycleError::InvalidReference(format!("Book {}", book_id)))?;
            *copies += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn applies_operations_in_book_order() {
        let mut ledger = CountingLedger::default();
        ledger.copies.insert(2, 1);
        ledger.copies.insert(7, 0);

        // Moving a loan from book 7 to book 2 touches book 2 first
        apply(&mut ledger, &[LedgerOp::Release(7), LedgerOp::Reserve(2)])
            .await
            .unwrap();

        assert_eq!(ledger.calls, vec![LedgerOp::Reserve(2), LedgerOp::Release(7)]);
        assert_eq!(ledger.copies[&2], 0);
        assert_eq!(ledger.copies[&7], 1);
    }

    #[tokio::test]
    async fn applies_every_operation() {
        let mut ledger = CountingLedger::default();
        ledger.copies.insert(1, 0);
        ledger.copies.insert(2, 1);

        apply(&mut ledger, &[LedgerOp::Release(1), LedgerOp::Reserve(2)])
            .await
            .unwrap();

        assert_eq!(ledger.calls, vec![LedgerOp::Release(1), LedgerOp::Reserve(2)]);
        assert_eq!(ledger.copies[&1], 1);
        assert_eq!(ledger.copies[&2], 0);
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let mut ledger = CountingLedger::default();
        ledger.copies.insert(1, 0);
        ledger.copies.insert(2, 5);

        let err = apply(
            &mut ledger,
            &[LedgerOp::Reserve(1), LedgerOp::Release(2)],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LifecycleError::InsufficientCopies { book_id: 1 }));
        assert_eq!(ledger.calls, vec![LedgerOp::Reserve(1)]);
        assert_eq!(ledger.copies[&2], 5);
    }
}
