//! # Errores del Servidor
//! src/error.rs
//!
//! Taxonomía de errores del núcleo:
//! - Errores de configuración: fatales, el proceso termina antes de crear threads
//! - Agotamiento de recursos (crecimiento del log): se reporta al llamador
//! - Fallo al crear un worker: fatal en el arranque, sin reintentos
//!
//! Los errores por request (request malformado, archivo inexistente, etc.)
//! los resuelve el handler y nunca llegan hasta aquí.

use std::collections::TryReserveError;
use std::fmt;
use thiserror::Error;

/// Errores fatales del servidor
#[derive(Debug, Error)]
pub enum ServerError {
    /// Parámetro de configuración inválido (puerto, threads, cola, ...)
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No se pudo abrir el socket de escucha
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// El sistema operativo no pudo crear un thread del pool
    #[error("failed to spawn worker {worker_id}: {source}")]
    Spawn {
        worker_id: usize,
        #[source]
        source: std::io::Error,
    },

    /// Error de I/O sobre el socket de escucha
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No se pudo reservar el buffer inicial del log
    #[error(transparent)]
    Log(#[from] LogError),

    /// No se pudo instalar el subscriber de tracing
    #[error("failed to initialize logging: {0}")]
    Telemetry(String),
}

/// Errores del log compartido
#[derive(Debug, Error)]
pub enum LogError {
    /// No hubo memoria para duplicar la capacidad del buffer
    #[error("log buffer could not grow to {requested} bytes: {source}")]
    Allocation {
        requested: usize,
        #[source]
        source: TryReserveError,
    },
}

/// La cola fue cerrada; devuelve el elemento al llamador
///
/// La conexión no se pierde: quien intentó encolar sigue siendo su dueño
/// y decide cómo cerrarla.
#[derive(PartialEq, Eq, Error)]
#[error("request queue is closed")]
pub struct QueueClosed<T>(pub T);

impl<T> QueueClosed<T> {
    /// Recupera el elemento rechazado
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueueClosed(..)")
    }
}
