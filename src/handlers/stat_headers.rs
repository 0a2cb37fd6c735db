//! # Headers de Estadísticas
//! src/handlers/stat_headers.rs
//!
//! Cada respuesta lleva el bloque de estadísticas del request y del worker
//! que lo atendió. El mismo bloque es la entrada que se agrega al log.
//!
//! ```text
//! Stat-Req-Arrival:: 1700000000.123456
//! Stat-Req-Dispatch:: 0.000210
//! Stat-Thread-Id:: 1
//! Stat-Thread-Count:: 3
//! Stat-Thread-Static:: 2
//! Stat-Thread-Dynamic:: 0
//! Stat-Thread-Post:: 1
//! ```
//!
//! El doble dos-puntos es parte del formato: el nombre del header ya
//! termina en ':'.

use crate::http::Response;
use crate::workers::WorkerStats;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Tiempos de un request
#[derive(Debug, Clone, Copy)]
pub struct RequestTiming {
    pub arrival: SystemTime,
    pub dispatch_interval: Duration,
}

/// `segundos.microsegundos` desde la época Unix
pub fn format_timestamp(time: SystemTime) -> String {
    format_duration(time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO))
}

/// `segundos.microsegundos` con 6 decimales
pub fn format_duration(d: Duration) -> String {
    format!("{}.{:06}", d.as_secs(), d.subsec_micros())
}

/// Bloque completo de estadísticas en orden de reporte
pub fn stat_block(timing: &RequestTiming, stats: &WorkerStats) -> Vec<(String, String)> {
    let mut block = Vec::with_capacity(7);
    block.push(("Stat-Req-Arrival:".to_string(), format_timestamp(timing.arrival)));
    block.push((
        "Stat-Req-Dispatch:".to_string(),
        format_duration(timing.dispatch_interval),
    ));
    for (name, value) in stats.stat_fields() {
        block.push((format!("{}:", name), value));
    }
    block
}

/// Agrega el bloque como headers de la respuesta
pub fn apply(response: &mut Response, block: &[(String, String)]) {
    for (name, value) in block {
        response.add_header(name, value);
    }
}

/// Entrada de log: una línea `Nombre:: valor` por campo
pub fn log_entry(block: &[(String, String)]) -> String {
    block
        .iter()
        .map(|(name, value)| format!("{}: {}\n", name, value))
        .collect()
}
