//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración por argumentos CLI con respaldo en variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./stat_server 8080 4 16 --root ./public --admission queue
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! SERVER_PORT=8080 SERVER_THREADS=4 SERVER_QUEUE_SIZE=16 ./stat_server
//! ```

use crate::error::ServerError;
use crate::log::DEFAULT_LOG_CAPACITY;
use crate::queue::AdmissionPolicy;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Configuración del servidor
#[derive(Debug, Clone, Parser)]
#[command(name = "stat_server")]
#[command(about = "Servidor HTTP/1.0 con pool fijo de workers y log compartido")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(env = "SERVER_PORT")]
    pub port: u16,

    /// Número de workers del pool
    #[arg(env = "SERVER_THREADS")]
    pub threads: usize,

    /// Capacidad de la cola de requests
    #[arg(env = "SERVER_QUEUE_SIZE")]
    pub queue_size: usize,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "SERVER_HOST")]
    pub host: String,

    /// Directorio desde el que se sirven archivos y programas CGI
    #[arg(long = "root", default_value = "./public", env = "DOCUMENT_ROOT")]
    pub document_root: PathBuf,

    /// Qué cuenta contra la capacidad de la cola
    #[arg(long, value_enum, default_value = "in-flight", env = "SERVER_ADMISSION")]
    pub admission: AdmissionPolicy,

    /// Capacidad inicial del log en bytes
    #[arg(long = "log-capacity", default_value_t = DEFAULT_LOG_CAPACITY, env = "SERVER_LOG_CAPACITY")]
    pub log_capacity: usize,

    /// Filtro de tracing (ej: "info", "stat_server=debug")
    #[arg(long = "log-filter", default_value = "info", env = "RUST_LOG")]
    pub log_filter: String,
}

impl Config {
    /// Dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use stat_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "0.0.0.0:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    ///
    /// Cualquier error es fatal: se reporta antes de crear threads.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.port == 0 {
            return Err(ServerError::InvalidConfig("Port must be between 1 and 65535".to_string()));
        }
        if self.threads == 0 {
            return Err(ServerError::InvalidConfig("Threads must be >= 1".to_string()));
        }
        if self.queue_size == 0 {
            return Err(ServerError::InvalidConfig("Queue size must be >= 1".to_string()));
        }
        if self.log_capacity == 0 {
            return Err(ServerError::InvalidConfig("Log capacity must be >= 1".to_string()));
        }
        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn log_summary(&self) {
        info!(
            address = %self.address(),
            threads = self.threads,
            queue_size = self.queue_size,
            admission = self.admission.as_str(),
            document_root = %self.document_root.display(),
            log_capacity = self.log_capacity,
            "server configuration"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            threads: 4,
            queue_size: 16,
            host: "0.0.0.0".to_string(),
            document_root: PathBuf::from("./public"),
            admission: AdmissionPolicy::InFlight,
            log_capacity: DEFAULT_LOG_CAPACITY,
            log_filter: "info".to_string(),
        }
    }
}
