//! The `Oracle` handle: a named pool decoration with a JSON query layer.
//!
//! Pooling, connection health and backpressure belong to the driver;
//! this type only bridges its blocking API onto the async runtime with
//! `spawn_blocking` and applies the configured row formats.

use std::fmt;
use std::sync::Arc;

use oracle::pool::{CloseMode, Pool};
use oracle::sql_type::ToSql;
use serde_json::Value;

use crate::config::{FetchAsString, OutFormat};
use crate::error::OracleError;
use crate::rows;
use crate::rows::BindValue;

struct OracleInner {
    name: String,
    pool: Pool,
    out_format: OutFormat,
    fetch_as_string: Vec<FetchAsString>,
}

/// Cheaply clonable handle over a registered Oracle connection pool.
///
/// This is the object handlers receive, either from
/// [`OracleRegistry::get`](crate::registry::OracleRegistry::get) or
/// directly through the [`FromRequestParts`](axum::extract::FromRequestParts)
/// extractor. Every driver call runs on the blocking thread pool.
#[derive(Clone)]
pub struct Oracle {
    inner: Arc<OracleInner>,
}

impl fmt::Debug for Oracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Oracle")
            .field("name", &self.inner.name)
            .field("out_format", &self.inner.out_format)
            .field("fetch_as_string", &self.inner.fetch_as_string)
            .finish_non_exhaustive()
    }
}

impl Oracle {
    pub(crate) fn from_parts(
        name: String,
        pool: Pool,
        out_format: OutFormat,
        fetch_as_string: Vec<FetchAsString>,
    ) -> Self {
        Self {
            inner: Arc::new(OracleInner {
                name,
                pool,
                out_format,
                fetch_as_string,
            }),
        }
    }

    /// The name this pool is registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The row rendering format applied by [`Oracle::query`].
    #[must_use]
    pub fn out_format(&self) -> OutFormat {
        self.inner.out_format
    }

    /// The raw driver pool handle.
    ///
    /// Use this to reach driver features the convenience interface does
    /// not cover. The handle shares the underlying pool.
    #[must_use]
    pub fn pool(&self) -> Pool {
        self.inner.pool.clone()
    }

    /// Checks a connection out of the pool.
    ///
    /// The connection returns to the pool when dropped. The driver's
    /// connections are blocking; run statement calls on them inside
    /// `spawn_blocking` or prefer [`Oracle::query`] / [`Oracle::transact`].
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Driver`] when the pool cannot supply a
    /// connection within its queue timeout.
    pub async fn connection(&self) -> Result<oracle::Connection, OracleError> {
        let inner = Arc::clone(&self.inner);
        run_blocking(move || inner.pool.get()).await
    }

    /// Runs a query and returns rows as JSON values.
    ///
    /// `binds` are positional parameters; only JSON scalars are
    /// accepted. Rows are shaped per the registered out format, with
    /// fetch-as-string coercions applied.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::InvalidBind`] for non-scalar binds and
    /// [`OracleError::Driver`] for connection or statement failures.
    pub async fn query(&self, sql: &str, binds: &[Value]) -> Result<Vec<Value>, OracleError> {
        let binds = rows::bind_values(binds)?;
        let inner = Arc::clone(&self.inner);
        let sql = sql.to_string();
        run_blocking(move || {
            let conn = inner.pool.get()?;
            let refs: Vec<&dyn ToSql> = binds.iter().map(BindValue::to_sql_ref).collect();
            let result_set = conn.query(&sql, &refs)?;
            let columns = result_set.column_info();
            let names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
            let types: Vec<_> = columns.iter().map(|c| c.oracle_type().clone()).collect();
            let mut out = Vec::new();
            for row in result_set {
                let row = row?;
                out.push(rows::row_to_json(
                    &row,
                    &types,
                    &names,
                    inner.out_format,
                    &inner.fetch_as_string,
                )?);
            }
            Ok(out)
        })
        .await
    }

    /// Runs a query and returns the first row, if any.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Oracle::query`].
    pub async fn query_one(&self, sql: &str, binds: &[Value]) -> Result<Option<Value>, OracleError> {
        Ok(self.query(sql, binds).await?.into_iter().next())
    }

    /// Executes a DML or DDL statement and commits.
    ///
    /// Returns the number of affected rows. For multi-statement
    /// atomicity use [`Oracle::transact`].
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::InvalidBind`] for non-scalar binds and
    /// [`OracleError::Driver`] for statement or commit failures.
    pub async fn execute(&self, sql: &str, binds: &[Value]) -> Result<u64, OracleError> {
        let binds = rows::bind_values(binds)?;
        let inner = Arc::clone(&self.inner);
        let sql = sql.to_string();
        run_blocking(move || {
            let conn = inner.pool.get()?;
            let refs: Vec<&dyn ToSql> = binds.iter().map(BindValue::to_sql_ref).collect();
            let statement = conn.execute(&sql, &refs)?;
            let count = statement.row_count()?;
            conn.commit()?;
            Ok(count)
        })
        .await
    }

    /// Runs `work` against one pooled connection inside a transaction.
    ///
    /// Commits when `work` returns `Ok`, rolls back when it returns
    /// `Err`. A rollback failure is logged and the original error is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Driver`] with the closure's error, a
    /// checkout failure, or a commit failure.
    pub async fn transact<F, T>(&self, work: F) -> Result<T, OracleError>
    where
        F: FnOnce(&oracle::Connection) -> Result<T, oracle::Error> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        run_blocking(move || {
            let conn = inner.pool.get()?;
            match work(&conn) {
                Ok(value) => {
                    conn.commit()?;
                    Ok(value)
                }
                Err(err) => {
                    if let Err(rollback_err) = conn.rollback() {
                        tracing::warn!(
                            pool = %inner.name,
                            error = %rollback_err,
                            "rollback after failed transaction also failed"
                        );
                    }
                    Err(err)
                }
            }
        })
        .await
    }

    /// Closes the underlying pool.
    ///
    /// With `force` the driver terminates active connections; otherwise
    /// closing fails while connections are checked out. Prefer
    /// [`OracleRegistry::close_all`](crate::registry::OracleRegistry::close_all)
    /// at shutdown so the registry entry is removed too.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Driver`] when the driver rejects the close.
    pub async fn close(&self, force: bool) -> Result<(), OracleError> {
        let inner = Arc::clone(&self.inner);
        run_blocking(move || {
            let mode = if force {
                CloseMode::Force
            } else {
                CloseMode::Default
            };
            inner.pool.close(&mode)
        })
        .await?;
        tracing::info!(pool = %self.inner.name, force, "oracle pool closed");
        Ok(())
    }
}

/// Bridges one blocking driver call onto the async runtime.
async fn run_blocking<T, F>(work: F) -> Result<T, OracleError>
where
    F: FnOnce() -> Result<T, oracle::Error> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(OracleError::Driver(err)),
        Err(join_err) => Err(OracleError::Internal(format!(
            "blocking database task failed: {join_err}"
        ))),
    }
}
