use crate::db::record::{Record, row_to_assoc, row_to_indexed};
use crate::db::storage::SqlitePool;
use crate::error::{GatewayError, GatewayResult};
use crate::query::{SqlValue, Statement};
use sqlx::Sqlite;
use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, warn};

/// Opaque cursor over the rows of one executed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle(usize);

/// What `Session::execute` does with a driver error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Return the error to the caller.
    #[default]
    Surface,
    /// Log it and report "no result" instead.
    Safe,
}

/// Request-scoped executor.
///
/// Owns one pooled connection and the result sets produced through it. Every
/// handle is released exactly once, either explicitly or by `quit`, which
/// also hands the connection back to the pool. Dropping the session quits it.
pub struct Session {
    conn: Option<PoolConnection<Sqlite>>,
    handles: Vec<Option<VecDeque<SqliteRow>>>,
    timeout: Option<Duration>,
}

impl Session {
    pub async fn begin(pool: &SqlitePool, timeout: Option<Duration>) -> GatewayResult<Self> {
        let conn = pool.acquire().await?;
        debug!("session opened");
        Ok(Self {
            conn: Some(conn),
            handles: Vec::new(),
            timeout,
        })
    }

    /// Run a statement and keep its rows under a new handle.
    ///
    /// In `ErrorMode::Safe` a failing statement yields `Ok(None)`.
    pub async fn execute(
        &mut self,
        stmt: &Statement,
        mode: ErrorMode,
    ) -> GatewayResult<Option<Handle>> {
        match self.run(stmt).await {
            Ok(rows) => {
                self.handles.push(Some(rows.into()));
                Ok(Some(Handle(self.handles.len() - 1)))
            }
            Err(e) if mode == ErrorMode::Safe => {
                warn!(sql = %stmt.sql, error = %e, "statement failed; no result");
                Ok(None)
            }
            Err(e) => {
                warn!(sql = %stmt.sql, error = %e, "statement failed");
                Err(e)
            }
        }
    }

    async fn run(&mut self, stmt: &Statement) -> GatewayResult<Vec<SqliteRow>> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| GatewayError::query("Database Query Error: session is closed"))?;
        debug!(sql = %stmt.sql, params = stmt.params.len(), "executing statement");

        let fut = bind_params(sqlx::query(&stmt.sql), &stmt.params).fetch_all(&mut **conn);
        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(rows) => Ok(rows?),
                Err(_) => Err(GatewayError::query(format!(
                    "Database Query Error: statement exceeded the {limit:?} deadline"
                ))),
            },
            None => Ok(fut.await?),
        }
    }

    /// Next row as a column name -> value record.
    pub fn fetch_assoc(&mut self, handle: Handle) -> GatewayResult<Option<Record>> {
        self.next_row(handle)
            .map(|row| row_to_assoc(&row).map_err(GatewayError::from))
            .transpose()
    }

    /// Next row keyed both by column position and by column name.
    pub fn fetch_array(&mut self, handle: Handle) -> GatewayResult<Option<Record>> {
        self.next_row(handle)
            .map(|row| row_to_indexed(&row).map_err(GatewayError::from))
            .transpose()
    }

    fn next_row(&mut self, handle: Handle) -> Option<SqliteRow> {
        self.handles.get_mut(handle.0)?.as_mut()?.pop_front()
    }

    /// Release one handle. Returns false if it was already released.
    pub fn release(&mut self, handle: Handle) -> bool {
        self.handles
            .get_mut(handle.0)
            .and_then(Option::take)
            .is_some()
    }

    pub fn open_handles(&self) -> usize {
        self.handles.iter().filter(|h| h.is_some()).count()
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Release every open handle, then return the connection. Idempotent.
    pub fn quit(&mut self) {
        let released = self.handles.iter_mut().filter_map(Option::take).count();
        if let Some(conn) = self.conn.take() {
            drop(conn);
            debug!(released, "session closed");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.quit();
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlValue::Integer(i) => query.bind(*i),
            SqlValue::Text(s) => query.bind(s.as_str()),
        };
    }
    query
}
