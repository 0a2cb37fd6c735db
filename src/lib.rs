//! # Stat Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 con un pool fijo de workers, una cola acotada entre
//! el acceptor y los workers, y un log compartido protegido por un lock
//! lector-escritor con preferencia de escritores.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `config`: Argumentos CLI y variables de entorno
//! - `error`: Errores del núcleo
//! - `telemetry`: Logging operacional con `tracing`
//! - `log`: Lock lector-escritor y el log compartido de requests
//! - `queue`: Cola circular productor/consumidor
//! - `workers`: Pool de workers y sus estadísticas
//! - `http`: Parsing y respuestas HTTP/1.0
//! - `handlers`: Contenido estático, CGI y reporte del log
//! - `server`: Acceptor y apagado ordenado
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use stat_server::config::Config;
//! use stat_server::server::Server;
//!
//! let config = Config::default();
//! config.validate().expect("configuración inválida");
//!
//! let server = Server::bind(&config).expect("no se pudo abrir el puerto");
//! let stats = server.run().expect("error en el acceptor");
//! println!("{} workers terminaron", stats.len());
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod log;
pub mod queue;
pub mod server;
pub mod telemetry;
pub mod workers;
