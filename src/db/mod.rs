//! Database module: store bootstrap, request sessions and row decoding.
//!
//! Layout:
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `storage.rs`: pool construction and schema bootstrap
//! - `session.rs`: request-scoped executor owning a connection and its handles
//! - `record.rs`: row -> record conversion and the fetch helpers
//! - `models.rs`: typed rows read by the auth guard

pub mod models;
pub mod record;
pub mod schema;
pub mod session;
pub mod storage;

pub use models::{AuthRecord, UserProfile};
pub use record::Record;
pub use schema::SQLITE_INIT;
pub use session::{ErrorMode, Handle, Session};
pub use storage::{SqlitePool, connect, init_schema};
