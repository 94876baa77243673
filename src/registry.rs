//! Named pool registry: duplicate-registration bookkeeping.
//!
//! [`OracleRegistry`] owns every pool registered with the plugin, keyed
//! by name. Registration validates configuration, resolves the pool
//! source (fresh settings, an existing handle, or an alias of a prior
//! registration) and rejects duplicates before any driver call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use oracle::pool::{GetMode, Pool, PoolBuilder};
use tokio::sync::RwLock;

use crate::config::{OracleConfig, PoolSettings, PoolSource};
use crate::error::OracleError;
use crate::pool::Oracle;

/// Name used when a registration does not specify one.
pub const DEFAULT_POOL_NAME: &str = "default";

/// One registry entry: the handle plus whether this registration owns
/// the underlying driver pool. Pools created from settings are owned;
/// client-supplied handles and aliases borrow a pool someone else
/// closes, so registry close paths skip them.
#[derive(Debug, Clone)]
struct Registration {
    oracle: Oracle,
    owns_pool: bool,
}

/// Central store for all registered Oracle pools.
///
/// Cheap to clone; all clones share the same map. Attach one registry
/// to a router via [`attach`](crate::extract::attach) and register
/// pools before serving.
#[derive(Debug, Clone)]
pub struct OracleRegistry {
    pools: Arc<RwLock<HashMap<String, Registration>>>,
}

impl OracleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pools: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers a pool from the given configuration.
    ///
    /// The registration name defaults to [`DEFAULT_POOL_NAME`]. The
    /// source resolves in order: an existing handle is wrapped as-is,
    /// an alias shares the pool already registered under that name, and
    /// settings are validated and handed to the driver's pool builder
    /// on the blocking thread pool. Only pools built from settings are
    /// owned by the registry; borrowed handles (clients and aliases)
    /// are left open by [`OracleRegistry::close`] and
    /// [`OracleRegistry::close_all`].
    ///
    /// # Errors
    ///
    /// - [`OracleError::AlreadyRegistered`] / [`OracleError::DuplicateName`]
    ///   when the name is taken.
    /// - [`OracleError::MissingPoolSource`] when no source was supplied.
    /// - [`OracleError::UnknownAlias`] when the alias matches nothing.
    /// - [`OracleError::InvalidPoolSettings`] when validation fails.
    /// - [`OracleError::PoolCreation`] when the driver rejects the pool.
    pub async fn register(&self, config: OracleConfig) -> Result<Oracle, OracleError> {
        let name = config
            .name
            .unwrap_or_else(|| DEFAULT_POOL_NAME.to_string());
        if self.pools.read().await.contains_key(&name) {
            return Err(duplicate(&name));
        }

        let source = config.source.ok_or(OracleError::MissingPoolSource)?;
        let (pool, owns_pool) = match source {
            // The caller keeps ownership of a supplied handle.
            PoolSource::Client(pool) => (pool, false),
            // An alias borrows the pool owned by the original registration.
            PoolSource::Alias(alias) => {
                let pools = self.pools.read().await;
                match pools.get(&alias) {
                    Some(existing) => (existing.oracle.pool(), false),
                    None => return Err(OracleError::UnknownAlias(alias)),
                }
            }
            PoolSource::Settings(settings) => {
                settings.validate()?;
                (build_pool(settings).await?, true)
            }
        };

        let oracle = Oracle::from_parts(
            name.clone(),
            pool,
            config.out_format,
            config.fetch_as_string,
        );
        let mut pools = self.pools.write().await;
        // Re-check under the write lock; a concurrent registration may
        // have won the name while the pool was being built.
        if pools.contains_key(&name) {
            return Err(duplicate(&name));
        }
        pools.insert(
            name.clone(),
            Registration {
                oracle: oracle.clone(),
                owns_pool,
            },
        );
        tracing::info!(pool = %name, owns_pool, "oracle pool registered");
        Ok(oracle)
    }

    /// Returns the pool registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::PoolNotFound`] when nothing is registered
    /// under that name.
    pub async fn get(&self, name: &str) -> Result<Oracle, OracleError> {
        self.pools
            .read()
            .await
            .get(name)
            .map(|registration| registration.oracle.clone())
            .ok_or_else(|| OracleError::PoolNotFound(name.to_string()))
    }

    /// Returns the pool registered under [`DEFAULT_POOL_NAME`].
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::PoolNotFound`] when no default pool exists.
    pub async fn default_pool(&self) -> Result<Oracle, OracleError> {
        self.get(DEFAULT_POOL_NAME).await
    }

    /// Returns the names of all registered pools.
    pub async fn names(&self) -> Vec<String> {
        self.pools.read().await.keys().cloned().collect()
    }

    /// Returns the number of registered pools.
    pub async fn len(&self) -> usize {
        self.pools.read().await.len()
    }

    /// Returns `true` when no pools are registered.
    pub async fn is_empty(&self) -> bool {
        self.pools.read().await.is_empty()
    }

    /// Closes the named pool and removes its registration.
    ///
    /// When the driver rejects the close (a non-force close with
    /// connections still checked out), the registration is put back so
    /// the still-open pool stays reachable for a retry. Registrations
    /// that borrow their pool (aliases and client-supplied handles)
    /// are removed without a driver close; the owning registration or
    /// caller closes the pool itself.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::PoolNotFound`] for an unknown name, or
    /// [`OracleError::Driver`] when the driver rejects the close (the
    /// registration is kept in that case).
    pub async fn close(&self, name: &str, force: bool) -> Result<(), OracleError> {
        let registration = self
            .pools
            .write()
            .await
            .remove(name)
            .ok_or_else(|| OracleError::PoolNotFound(name.to_string()))?;
        if registration.owns_pool
            && let Err(err) = registration.oracle.close(force).await
        {
            // Put the registration back so the pool stays reachable for
            // a retry, typically with `force`.
            self.pools
                .write()
                .await
                .insert(name.to_string(), registration);
            return Err(err);
        }
        Ok(())
    }

    /// Drains every registration (the application-shutdown hook).
    ///
    /// Each owned pool is closed exactly once; alias and client
    /// registrations are removed without touching the shared pool, so
    /// a pool registered under several names is never closed twice.
    /// Entries whose close fails are logged and put back so they can
    /// be retried (typically with `force`).
    ///
    /// # Errors
    ///
    /// Returns the first [`OracleError::Driver`] encountered, if any.
    pub async fn close_all(&self, force: bool) -> Result<(), OracleError> {
        let drained = {
            let mut pools = self.pools.write().await;
            std::mem::take(&mut *pools)
        };
        let mut failed = HashMap::new();
        let mut first_err = None;
        for (name, registration) in drained {
            if !registration.owns_pool {
                continue;
            }
            if let Err(err) = registration.oracle.close(force).await {
                tracing::error!(pool = %name, error = %err, "failed to close oracle pool");
                failed.insert(name, registration);
                first_err.get_or_insert(err);
            }
        }
        if !failed.is_empty() {
            self.pools.write().await.extend(failed);
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for OracleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn duplicate(name: &str) -> OracleError {
    if name == DEFAULT_POOL_NAME {
        OracleError::AlreadyRegistered
    } else {
        OracleError::DuplicateName(name.to_string())
    }
}

/// Builds a driver pool from validated settings on the blocking pool.
async fn build_pool(settings: PoolSettings) -> Result<Pool, OracleError> {
    let PoolSettings {
        username,
        password,
        connect_string,
        min_connections,
        max_connections,
        connection_increment,
        queue_timeout_secs,
    } = settings;
    tokio::task::spawn_blocking(move || {
        let mut builder = PoolBuilder::new(username, password, connect_string);
        builder
            .min_connections(min_connections)
            .max_connections(max_connections)
            .connection_increment(connection_increment)
            .get_mode(GetMode::TimedWait(Duration::from_secs(queue_timeout_secs)));
        builder.build()
    })
    .await
    .map_err(|join_err| {
        OracleError::Internal(format!("blocking database task failed: {join_err}"))
    })?
    .map_err(OracleError::PoolCreation)
}
