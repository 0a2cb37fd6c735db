//! # Cola de Requests
//!
//! Punto de entrega entre el acceptor y el pool de workers.
//! Una sola cola de capacidad fija para toda la vida del proceso.

pub mod request_queue;

pub use request_queue::{AdmissionPolicy, Dispatched, PendingRequest, QueueStats, RequestQueue};
