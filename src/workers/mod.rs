//! # Sistema de Workers
//! src/workers/mod.rs
//!
//! Pool fijo de threads que consumen de la `RequestQueue` y delegan cada
//! conexión en un `RequestHandler`.
//!
//! ## Ciclo de vida de un worker
//!
//! ```text
//! Idle → Dequeuing → Handling → Idle ...
//! ```
//!
//! Solo terminan cuando la cola se cierra y ya no quedan requests.

pub mod pool;
pub mod stats;

pub use pool::{Connection, RequestHandler, WorkerPool};
pub use stats::{RequestKind, WorkerStats};
