//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el acceptor:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones entrantes y marca su llegada
//! 3. Las encola para el pool de workers
//! 4. Al apagarse, drena la cola y reporta las estadísticas

pub mod tcp;

pub use tcp::{Server, ShutdownHandle};
