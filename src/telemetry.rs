//! # Logging Operacional
//! src/telemetry.rs
//!
//! Instala el subscriber de `tracing`. No confundir con `SyncLog`: este es
//! el log del operador, aquel es el log de requests que se sirve a clientes.

use crate::error::ServerError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Inicializa el subscriber global con el filtro dado (sintaxis de `RUST_LOG`)
///
/// Falla si el filtro es inválido o si ya había un subscriber instalado.
pub fn init(filter: &str) -> Result<(), ServerError> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|e| ServerError::Telemetry(format!("invalid filter '{}': {}", filter, e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_names(true))
        .try_init()
        .map_err(|e| ServerError::Telemetry(e.to_string()))
}
