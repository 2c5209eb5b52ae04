//! Business logic services

pub mod catalog;
pub mod loans;

use std::sync::Arc;

use crate::lifecycle::LoanStore;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
}

impl Services {
    /// Create all services on top of the given loan store
    pub fn new(store: Arc<dyn LoanStore>) -> Self {
        Self {
            catalog: catalog::CatalogService::new(store.clone()),
            loans: loans::LoansService::new(store),
        }
    }
}
