mod adapters;
mod cli;
mod config;
mod core;
mod error;
mod logging;

use clap::Parser;

use crate::{cli::Args, config::GatewayConfig, error::AppResult};

fn main() -> AppResult<()> {
    let args = Args::parse();
    logging::init(&args.log_level);

    let config = GatewayConfig::from_args(&args)?;
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| error::AppError::Internal(e.to_string()))?;
    rt.block_on(adapters::http::run(config))
}
