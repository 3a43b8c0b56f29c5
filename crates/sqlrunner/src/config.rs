use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    cli::Args,
    error::{AppError, AppResult},
};

/// Settings shared by every request. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub db_path: PathBuf,
    pub listen: String,
    pub allow_non_select: bool,
    pub query_row_limit: usize,
    pub table_sample_limit: usize,
    pub busy_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("sample.db"),
            listen: "127.0.0.1:8000".into(),
            allow_non_select: false,
            query_row_limit: 1000,
            table_sample_limit: 10,
            busy_timeout: Duration::from_millis(2_000),
        }
    }
}

impl GatewayConfig {
    pub fn from_args(args: &Args) -> AppResult<Self> {
        if args.query_row_limit == 0 {
            return Err(AppError::InvalidRequest(
                "--query-row-limit must be greater than zero".into(),
            ));
        }
        if args.table_sample_limit == 0 {
            return Err(AppError::InvalidRequest(
                "--table-sample-limit must be greater than zero".into(),
            ));
        }

        Ok(Self {
            db_path: absolutize(&args.db_path)?,
            listen: args.listen.clone(),
            allow_non_select: args.allow_non_select,
            query_row_limit: args.query_row_limit,
            table_sample_limit: args.table_sample_limit,
            busy_timeout: Duration::from_millis(args.busy_timeout_ms),
        })
    }
}

fn absolutize(path: &Path) -> AppResult<PathBuf> {
    // canonicalize requires the file to exist; SQLite creates it on open.
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir()?;
        Ok(cwd.join(path))
    }
}
