//! Connection pool with automatic test transaction management.
//!
//! In test mode the pool holds a single connection and begins a test
//! transaction on first checkout, so every test rolls back its writes.
//! In production mode it is a normal bb8 pool with tuned settings.

#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(not(test))]
use {diesel_async::RunQueryDsl, std::time::Duration};

#[cfg(test)]
use diesel_async::AsyncConnection;
use diesel_async::{
    pooled_connection::{bb8::Pool, AsyncDieselConnectionManager},
    AsyncPgConnection,
};

use super::error::RepositoryError;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConnection<'a> =
    diesel_async::pooled_connection::bb8::PooledConnection<'a, AsyncPgConnection>;

/// Smart connection pool that automatically manages test transactions.
pub struct SmartPool {
    inner: Arc<DbPool>,

    /// Track whether the test transaction has been initialized (test mode
    /// only).
    #[cfg(test)]
    test_tx_initialized: AtomicBool,
}

impl SmartPool {
    /// Create a new SmartPool against the given PostgreSQL URL.
    pub async fn new(database_url: &str) -> Result<Self, RepositoryError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);

        #[cfg(test)]
        let pool = {
            // Single connection so the test transaction spans the whole test
            Pool::builder()
                .max_size(1)
                .build(manager)
                .await
                .map_err(|e| RepositoryError::Pool(format!("Failed to create test pool: {}", e)))?
        };

        #[cfg(not(test))]
        let pool = {
            let pool = Pool::builder()
                .max_size(32)
                .connection_timeout(Duration::from_secs(15))
                .idle_timeout(Some(Duration::from_secs(300)))
                .max_lifetime(Some(Duration::from_secs(3600)))
                .min_idle(Some(4))
                .build(manager)
                .await
                .map_err(|e| {
                    RepositoryError::Pool(format!("Failed to create production pool: {}", e))
                })?;

            // Immediate health-check to surface connection errors early
            {
                let mut conn = pool.get().await.map_err(|e| {
                    RepositoryError::Pool(format!("Failed to get connection: {}", e))
                })?;
                diesel::sql_query("SELECT 1")
                    .execute(&mut conn)
                    .await
                    .map_err(|e| RepositoryError::Pool(format!("Healthcheck failed: {}", e)))?;
            }

            pool
        };

        Ok(Self {
            inner: Arc::new(pool),
            #[cfg(test)]
            test_tx_initialized: AtomicBool::new(false),
        })
    }

    /// Get a connection from the pool.
    ///
    /// In test mode this begins a test transaction on the first call,
    /// which rolls back automatically when the test ends.
    pub async fn get(&self) -> Result<DbConnection<'_>, RepositoryError> {
        #[allow(unused_mut)]
        let mut conn = self
            .inner
            .get()
            .await
            .map_err(|e| RepositoryError::Pool(format!("Failed to get connection: {}", e)))?;

        #[cfg(test)]
        {
            if self
                .test_tx_initialized
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                conn.begin_test_transaction()
                    .await
                    .map_err(RepositoryError::Database)?;
            }
        }

        Ok(conn)
    }
}
