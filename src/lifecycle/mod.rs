//! Loan lifecycle and inventory consistency core.
//!
//! The state machine decides which ledger operations a lifecycle intent
//! requires; the coordinator in `services::loans` applies them through a
//! `LoanStore` transaction.

pub mod ledger;
pub mod memory;
pub mod overdue;
pub mod state_machine;
pub mod store;

pub use ledger::{InventoryLedger, LedgerOp};
pub use memory::MemoryStore;
pub use state_machine::Plan;
pub use store::{LoanStore, LoanTransaction};
