//! plaintext-server: benchmark responder entry point
//!
//! Parses flags, installs logging, builds a multi-threaded runtime and serves
//! until killed. A bind failure exits with a non-zero status.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod cli;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plaintext_core=info,plaintext_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = cli.listen_config();
    let workers = cli.worker_threads();

    tracing::info!(
        profile = %cli.profile,
        bind_address = %config.bind_address,
        route = %config.route,
        compression = config.compression,
        workers,
        "Configuration loaded"
    );

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(plaintext_core::serve(config)) {
        Ok(never) => match never {},
        Err(e) => {
            tracing::error!(error = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}
