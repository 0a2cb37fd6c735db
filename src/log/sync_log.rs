//! # Log Compartido del Servidor
//! src/log/sync_log.rs
//!
//! Buffer de bytes que crece geométricamente, protegido por un
//! `WriterPreferringLock`. Los workers agregan entradas (escritura) y
//! cualquier thread puede pedir una copia completa (lectura).
//!
//! La reasignación del buffer ocurre siempre con acceso exclusivo, así que
//! ningún lector ve un buffer a medio copiar.

use super::rwlock::{LockState, WriterPreferringLock};
use crate::error::LogError;

/// Capacidad inicial por defecto (bytes)
pub const DEFAULT_LOG_CAPACITY: usize = 4096;

/// Datos protegidos por el lock
struct LogBuffer {
    /// Bytes válidos (`bytes.len()` es la longitud lógica)
    bytes: Vec<u8>,

    /// Tamaño reservado; siempre `capacity >= bytes.len() + 1`
    capacity: usize,
}

/// Log compartido con lecturas concurrentes y escrituras exclusivas
pub struct SyncLog {
    inner: WriterPreferringLock<LogBuffer>,
}

impl SyncLog {
    /// Crea un log vacío con la capacidad inicial indicada
    ///
    /// Una capacidad de 0 se sube a 1 para mantener el byte de reserva.
    pub fn new(capacity: usize) -> Result<Self, LogError> {
        let capacity = capacity.max(1);
        let bytes = allocate(capacity)?;

        Ok(Self {
            inner: WriterPreferringLock::new(LogBuffer { bytes, capacity }),
        })
    }

    /// Agrega `data` al final del log
    ///
    /// No hace nada si `data` está vacío. Si no hay espacio, duplica la
    /// capacidad (las veces necesarias) antes de copiar.
    pub fn append(&self, data: &[u8]) -> Result<(), LogError> {
        if data.is_empty() {
            return Ok(());
        }

        let mut buffer = self.inner.write();
        let required = buffer.bytes.len() + data.len() + 1;

        if required > buffer.capacity {
            let mut new_capacity = buffer.capacity.saturating_mul(2);
            while new_capacity < required {
                new_capacity = new_capacity.saturating_mul(2);
            }

            let mut grown = allocate(new_capacity)?;
            grown.extend_from_slice(&buffer.bytes);
            buffer.bytes = grown;
            buffer.capacity = new_capacity;
        }

        buffer.bytes.extend_from_slice(data);
        Ok(())
    }

    /// Retorna una copia del contenido actual
    pub fn snapshot(&self) -> Vec<u8> {
        self.inner.read().bytes.clone()
    }

    /// Copia del contenido junto a su longitud lógica
    ///
    /// Punto de entrada para reportes/administración: bloquea como mucho lo
    /// que dure una escritura en curso (más las ya encoladas).
    pub fn get_log(&self) -> (Vec<u8>, usize) {
        let buffer = self.inner.read();
        (buffer.bytes.clone(), buffer.bytes.len())
    }

    /// Número de bytes almacenados
    pub fn len(&self) -> usize {
        self.inner.read().bytes.len()
    }

    /// Verifica si el log está vacío
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacidad reservada actual
    pub fn capacity(&self) -> usize {
        self.inner.read().capacity
    }

    /// Contadores del lock lector-escritor
    pub fn lock_state(&self) -> LockState {
        self.inner.state()
    }
}

impl std::fmt::Debug for SyncLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let buffer = self.inner.read();
        f.debug_struct("SyncLog")
            .field("len", &buffer.bytes.len())
            .field("capacity", &buffer.capacity)
            .finish()
    }
}

/// Reserva un buffer vacío de `capacity` bytes sin abortar si falla
fn allocate(capacity: usize) -> Result<Vec<u8>, LogError> {
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(capacity)
        .map_err(|source| LogError::Allocation {
            requested: capacity,
            source,
        })?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_new_log_is_empty() {
        let log = SyncLog::new(DEFAULT_LOG_CAPACITY).unwrap();
        assert!(log.is_empty());
        assert_eq!(log.capacity(), 4096);
        assert_eq!(log.get_log(), (Vec::new(), 0));
    }

    #[test]
    fn test_append_empty_is_noop() {
        let log = SyncLog::new(16).unwrap();
        log.append(b"").unwrap();
        assert_eq!(log.len(), 0);
        assert_eq!(log.lock_state(), LockState::default());
    }

    #[test]
    fn test_sequential_appends_concatenate() {
        let log = SyncLog::new(DEFAULT_LOG_CAPACITY).unwrap();
        log.append(b"GET /a\n").unwrap();
        log.append(b"GET /b\n").unwrap();

        let (bytes, len) = log.get_log();
        assert_eq!(bytes, b"GET /a\nGET /b\n");
        assert_eq!(len, 14);
    }

    #[test]
    fn test_growth_doubles_until_sufficient() {
        let log = SyncLog::new(8).unwrap();
        log.append(b"1234").unwrap();
        assert_eq!(log.capacity(), 8);

        // 4 + 30 + 1 = 35 bytes necesarios: 8 -> 16 -> 32 -> 64
        let block = [b'x'; 30];
        log.append(&block).unwrap();
        assert_eq!(log.capacity(), 64);

        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 34);
        assert_eq!(&snapshot[..4], b"1234");
        assert!(snapshot[4..].iter().all(|b| *b == b'x'));
    }

    #[test]
    fn test_reserved_byte_triggers_growth() {
        let log = SyncLog::new(4).unwrap();
        log.append(b"abc").unwrap();
        assert_eq!(log.capacity(), 4);

        log.append(b"d").unwrap();
        assert_eq!(log.capacity(), 8);
        assert_eq!(log.snapshot(), b"abcd");
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let log = SyncLog::new(0).unwrap();
        assert_eq!(log.capacity(), 1);
        log.append(b"hello").unwrap();
        assert_eq!(log.snapshot(), b"hello");
        assert!(log.capacity() >= 6);
    }

    #[test]
    fn test_concurrent_appenders_do_not_tear() {
        let log = Arc::new(SyncLog::new(4096).unwrap());
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4u8)
            .map(|i| {
                let log = Arc::clone(&log);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let block = vec![b'a' + i; 1000];
                    barrier.wait();
                    log.append(&block).unwrap();
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        let (bytes, len) = log.get_log();
        assert_eq!(len, 4000);
        assert_eq!(log.capacity(), 4096);

        // Cada bloque de 1000 bytes debe ser homogéneo y aparecer una vez
        let mut seen: Vec<u8> = bytes
            .chunks(1000)
            .map(|chunk| {
                assert!(chunk.iter().all(|b| *b == chunk[0]), "bloque mezclado");
                chunk[0]
            })
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![b'a', b'b', b'c', b'd']);
    }

    #[test]
    fn test_snapshots_never_see_partial_append() {
        let log = Arc::new(SyncLog::new(16).unwrap());
        let writer = thread::spawn({
            let log = Arc::clone(&log);
            move || {
                for _ in 0..500 {
                    log.append(&[b'z'; 100]).unwrap();
                }
            }
        });

        let readers: Vec<_> = (0..3)
            .map(|_| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let (bytes, len) = log.get_log();
                        assert_eq!(bytes.len(), len);
                        assert_eq!(len % 100, 0, "lectura con append parcial");
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(log.len(), 50_000);
    }

    proptest! {
        #[test]
        fn prop_snapshot_is_concatenation(
            chunks in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..300), 0..20),
            capacity in 1usize..64,
        ) {
            let log = SyncLog::new(capacity).unwrap();
            for chunk in &chunks {
                log.append(chunk).unwrap();
            }

            let expected: Vec<u8> = chunks.concat();
            let (bytes, len) = log.get_log();
            prop_assert_eq!(len, expected.len());
            prop_assert_eq!(bytes, expected);
            prop_assert!(log.capacity() >= len + 1);
        }
    }
}
