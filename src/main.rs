//! # Stat Server - Entry Point
//! src/main.rs
//!
//! Uso: `stat_server <port> <threads> <queue_size> [opciones]`
//!
//! Cualquier error de configuración o de arranque termina el proceso con
//! código 1 antes de atender requests.

use clap::Parser;
use stat_server::config::Config;
use stat_server::server::Server;
use stat_server::telemetry;
use std::process;
use tracing::error;

fn main() {
    let config = match Config::try_parse() {
        Ok(config) => config,
        // --help / --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = telemetry::init(&config.log_filter) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    config.log_summary();

    let server = match Server::bind(&config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "failed to start server");
            process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        error!(error = %e, "server terminated with error");
        process::exit(1);
    }
}
