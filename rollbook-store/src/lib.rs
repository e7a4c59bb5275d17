//! rollbook-store: student records in PostgreSQL
//!
//! A [`RecordStore`] owns one connection and exposes the student operations:
//! list, add, update email, remove, plus raw parameterized statements via
//! [`RecordStore::run`]. Use [`with_store`] to get a connection that is closed
//! even when the work in between fails.

pub mod config;
pub mod error;
pub mod models;
pub mod result;
pub mod schema;
pub mod store;

pub use config::{DatabaseConfig, RollbookConfig};
pub use error::{Result, StoreError};
pub use models::{NewStudent, Student};
pub use result::{ResultSet, SqlParam};
pub use store::{with_store, RecordStore};
