//! SQL DDL for the credential and profile tables.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `auths`: one shared secret per user code
/// - `users`: profile row per user code; `administrator` > 0 marks admins
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS auths (
    code TEXT PRIMARY KEY,
    auth TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    code TEXT PRIMARY KEY,
    name TEXT NULL,
    administrator INTEGER NOT NULL DEFAULT 0
);
"#;
