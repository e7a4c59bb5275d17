//! Command implementations for rollbook CLI

pub mod demo;
pub mod query;
pub mod students;

// Re-export main dispatcher functions for flat access from main.rs
pub use demo::run_demo;
pub use query::run_query;
pub use students::{run_add, run_init, run_list, run_remove, run_seed, run_update_email};
