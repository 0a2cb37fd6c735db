//! # Log del Servidor
//! src/log/mod.rs
//!
//! Log compartido por todos los workers durante toda la vida del proceso.
//!
//! - `rwlock`: lock lector-escritor con preferencia de escritores
//! - `sync_log`: buffer creciente protegido por ese lock

pub mod rwlock;
pub mod sync_log;

pub use rwlock::{LockState, ReadGuard, WriteGuard, WriterPreferringLock};
pub use sync_log::{SyncLog, DEFAULT_LOG_CAPACITY};
