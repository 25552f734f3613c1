//! Async store with a dedicated SQLite executor thread.
//!
//! All operations are sent to a single background thread via channel, the
//! callers await results without blocking their own runtime threads.
//! Queries execute in FIFO order, so a delivery run and a cleanup run
//! never observe a record mid-transition.
//!
//! Only SQL should run inside [`Store::call`] closures; anything heavier
//! (network, hashing, file IO) starves every other query on the single
//! thread.

use crate::{queries, DataTrack, RequestState, StoreError, StoreResult};
use std::path::Path;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

/// Convert a tokio_rusqlite::Error to StoreError.
fn from_tokio_rusqlite(e: tokio_rusqlite::Error) -> StoreError {
    match e {
        tokio_rusqlite::Error::Rusqlite(e) => StoreError::Sqlite(e),
        tokio_rusqlite::Error::Close(_) => StoreError::Connection("Connection closed".to_string()),
        other => StoreError::Connection(other.to_string()),
    }
}

/// Durable track request store.
///
/// Cheap to clone; clones share the same executor thread.
#[derive(Clone)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open a store at the given path.
    ///
    /// Creates the file if missing, enables WAL mode and foreign keys,
    /// runs pending migrations, and starts the executor thread.
    pub async fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!(path = %path.display(), "Opening track request store");

        let conn = Connection::open(path.to_path_buf())
            .await
            .map_err(from_tokio_rusqlite)?;
        let store = Self { conn };

        store
            .call(|conn| {
                conn.execute_batch(
                    "
                    PRAGMA journal_mode = WAL;
                    PRAGMA synchronous = NORMAL;
                    PRAGMA foreign_keys = ON;
                    PRAGMA busy_timeout = 5000;
                    ",
                )?;
                Ok(())
            })
            .await?;

        store.call(|conn| crate::run_migrations(conn)).await?;

        Ok(store)
    }

    /// Open an in-memory store for testing.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(from_tokio_rusqlite)?;
        let store = Self { conn };

        // WAL mode does not apply to in-memory databases
        store
            .call(|conn| {
                conn.execute_batch("PRAGMA foreign_keys = ON;")?;
                Ok(())
            })
            .await?;
        store.call(|conn| crate::run_migrations(conn)).await?;

        Ok(store)
    }

    /// Execute a closure on the store's connection.
    ///
    /// The closure runs on the dedicated SQLite thread; the caller's task
    /// is parked, not blocked, until the result is ready.
    pub async fn call<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut rusqlite::Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        // Wrap our StoreResult inside the tokio_rusqlite Ok variant, then
        // flatten after the await.
        let outer = self.conn.call(move |conn| Ok(f(conn))).await;
        match outer {
            Ok(inner) => inner,
            Err(e) => Err(from_tokio_rusqlite(e)),
        }
    }

    /// Insert a track request and its custom params atomically.
    ///
    /// Returns the assigned record id. Fails without partial commits when
    /// the underlying storage is unavailable.
    pub async fn enqueue(&self, payload: &str, params: &[(String, String)]) -> StoreResult<i64> {
        let payload = payload.to_string();
        let params = params.to_vec();
        let id = self
            .call(move |conn| queries::insert_track_request(conn, &payload, &params))
            .await?;
        debug!(id, "Cached track request");
        Ok(id)
    }

    /// Fetch all requests in the given states, in insertion order.
    pub async fn fetch_by_state(&self, states: &[RequestState]) -> StoreResult<Vec<DataTrack>> {
        let states = states.to_vec();
        self.call(move |conn| queries::fetch_by_state(conn, &states))
            .await
    }

    /// Transition requests to a new state; vanished ids are skipped.
    pub async fn mark_state(&self, ids: &[i64], state: RequestState) -> StoreResult<usize> {
        let ids = ids.to_vec();
        self.call(move |conn| queries::mark_state(conn, &ids, state))
            .await
    }

    /// Delete requests and cascade their custom params. Idempotent.
    pub async fn delete_requests(&self, ids: &[i64]) -> StoreResult<usize> {
        let ids = ids.to_vec();
        self.call(move |conn| queries::delete_requests(conn, &ids))
            .await
    }

    /// Remove custom params whose owning request no longer exists.
    pub async fn sweep_orphaned_params(&self) -> StoreResult<usize> {
        self.call(|conn| queries::sweep_orphaned_params(conn)).await
    }

    /// Count requests in a given state.
    pub async fn count_by_state(&self, state: RequestState) -> StoreResult<i64> {
        self.call(move |conn| queries::count_by_state(conn, state))
            .await
    }

    /// Close the store, waiting for pending operations to finish.
    pub async fn close(self) -> StoreResult<()> {
        self.conn
            .close()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to close store: {e:?}")))?;
        debug!("Track request store closed");
        Ok(())
    }
}
