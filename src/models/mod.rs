//! Data models for Libris

pub mod book;
pub mod loan;
pub mod reader;
