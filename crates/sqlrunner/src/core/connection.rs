use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use rusqlite::{Connection, OpenFlags};

use crate::error::{AppError, AppResult};

/// Handle to the single database file the gateway serves.
///
/// Holds no connection itself: every call to [`Database::run`] opens a fresh
/// one on the blocking pool and drops it before returning, on success and
/// error alike.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            busy_timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open(&self) -> AppResult<Connection> {
        open_conn(&self.path, self.busy_timeout)
    }

    pub async fn run<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.open()?;
            f(&conn)
        })
        .await
        .map_err(|e| AppError::Internal(format!("db task join error: {e}")))?
    }
}

fn open_conn(path: &Path, busy_timeout: Duration) -> AppResult<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags).map_err(|source| {
        tracing::error!(error = %source, path = %path.display(), "failed to open db");
        AppError::DbOpenFailed {
            path: path.to_path_buf(),
            source,
        }
    })?;
    conn.busy_timeout(busy_timeout)?;
    Ok(conn)
}
