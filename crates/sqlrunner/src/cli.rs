use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "sqlrunner", about = "HTTP gateway for ad-hoc SQL against a single SQLite file")]
pub struct Args {
    /// SQLite database file. Created on first use if missing.
    #[arg(long, env = "SQLRUNNER_DB_PATH", default_value = "sample.db")]
    pub db_path: PathBuf,

    /// Address the HTTP server binds to.
    #[arg(long, env = "SQLRUNNER_LISTEN", default_value = "127.0.0.1:8000")]
    pub listen: String,

    /// Permit statements that are not plain SELECTs on the execute endpoint.
    #[arg(long, env = "SQLRUNNER_ALLOW_NON_SELECT", default_value_t = false)]
    pub allow_non_select: bool,

    /// Row cap appended to SELECTs that carry no LIMIT of their own.
    #[arg(long, env = "SQLRUNNER_QUERY_ROW_LIMIT", default_value_t = 1000)]
    pub query_row_limit: usize,

    /// Sample rows returned by the table detail endpoint when `?limit=` is absent.
    #[arg(long, env = "SQLRUNNER_TABLE_SAMPLE_LIMIT", default_value_t = 10)]
    pub table_sample_limit: usize,

    /// How long a connection waits on a locked database file.
    #[arg(long, env = "SQLRUNNER_BUSY_TIMEOUT_MS", default_value_t = 2_000)]
    pub busy_timeout_ms: u64,

    /// Logging level (stderr). Also supports RUST_LOG.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
