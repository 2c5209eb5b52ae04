//! Libris loan lifecycle server
//!
//! Keeps book inventory consistent with the loans made against it and
//! exposes the loan lifecycle over a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult, LifecycleError, LifecycleResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<services::Services>,
}

impl AppState {
    pub fn new(store: Arc<dyn lifecycle::LoanStore>) -> Self {
        Self {
            services: Arc::new(services::Services::new(store)),
        }
    }
}
