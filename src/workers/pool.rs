//! # Pool de Workers
//! src/workers/pool.rs
//!
//! Conjunto fijo de threads de larga vida. Cada worker repite:
//!
//! ```text
//! dequeue → handler.handle(...) → close(conexión) → finish_handling
//! ```
//!
//! Los ids se asignan una sola vez (1..=N) al crear el pool. No hay
//! supervisión: si un handler entra en pánico ese worker desaparece y el
//! pool queda con un thread menos. El cupo en vuelo del request que
//! atendía sí se libera.

use crate::error::ServerError;
use crate::log::SyncLog;
use crate::queue::{Dispatched, RequestQueue};
use crate::workers::stats::WorkerStats;
use std::io;
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info};

/// Conexión que el worker cierra al terminar el request
pub trait Connection: Send + 'static {
    /// Cierra la conexión consumiéndola
    fn close(self) -> io::Result<()>;
}

impl Connection for TcpStream {
    fn close(self) -> io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            // El cliente ya cerró su lado
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

/// Handler de requests invocado por cada worker
///
/// Se llama exactamente una vez por request desencolado, de forma
/// síncrona. Puede escribir en el log cero o más veces y debe clasificar
/// el request en `stats`. Si nunca retorna, ese worker queda detenido.
pub trait RequestHandler<C>: Send + Sync + 'static {
    fn handle(
        &self,
        connection: &mut C,
        arrival: SystemTime,
        dispatch_interval: Duration,
        stats: &mut WorkerStats,
        log: &SyncLog,
    );
}

impl<C, F> RequestHandler<C> for F
where
    F: Fn(&mut C, SystemTime, Duration, &mut WorkerStats, &SyncLog) + Send + Sync + 'static,
{
    fn handle(
        &self,
        connection: &mut C,
        arrival: SystemTime,
        dispatch_interval: Duration,
        stats: &mut WorkerStats,
        log: &SyncLog,
    ) {
        self(connection, arrival, dispatch_interval, stats, log)
    }
}

/// Thread del pool
struct Worker {
    id: usize,
    thread: Option<JoinHandle<WorkerStats>>,
}

/// Pool fijo de workers consumiendo de una `RequestQueue`
pub struct WorkerPool<C: Connection> {
    workers: Vec<Worker>,
    queue: Arc<RequestQueue<C>>,
}

impl<C: Connection> WorkerPool<C> {
    /// Crea `size` workers (ids 1..=size)
    ///
    /// Si el sistema operativo no puede crear alguno, cierra la cola, espera
    /// a los ya creados y retorna el error.
    pub fn spawn<H: RequestHandler<C>>(
        size: usize,
        queue: Arc<RequestQueue<C>>,
        log: Arc<SyncLog>,
        handler: Arc<H>,
    ) -> Result<Self, ServerError> {
        let mut pool = Self {
            workers: Vec::with_capacity(size),
            queue,
        };

        for id in 1..=size {
            let queue = Arc::clone(&pool.queue);
            let log = Arc::clone(&log);
            let handler = Arc::clone(&handler);

            let spawned = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || worker_loop(id, queue, log, handler));

            match spawned {
                Ok(thread) => pool.workers.push(Worker {
                    id,
                    thread: Some(thread),
                }),
                Err(source) => {
                    // Drop de `pool` cierra la cola y espera a los creados
                    return Err(ServerError::Spawn { worker_id: id, source });
                }
            }
        }

        info!(workers = size, "worker pool started");
        Ok(pool)
    }

    /// Número de workers
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Cola compartida con el acceptor
    pub fn queue(&self) -> &Arc<RequestQueue<C>> {
        &self.queue
    }

    /// Cierra la cola, deja que los workers drenen lo pendiente y los espera
    ///
    /// Retorna las estadísticas finales ordenadas por id. Los workers que
    /// terminaron en pánico se reportan y se omiten.
    pub fn shutdown(mut self) -> Vec<WorkerStats> {
        self.queue.close();
        self.join_all()
    }

    fn join_all(&mut self) -> Vec<WorkerStats> {
        let mut finished = Vec::with_capacity(self.workers.len());
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                match thread.join() {
                    Ok(stats) => finished.push(stats),
                    Err(_) => error!(worker_id = worker.id, "worker panicked"),
                }
            }
        }
        finished
    }
}

impl<C: Connection> Drop for WorkerPool<C> {
    fn drop(&mut self) {
        if self.workers.iter().any(|w| w.thread.is_some()) {
            self.queue.close();
            self.join_all();
        }
    }
}

/// Cupo en vuelo de un request desencolado
///
/// Llama `finish_handling` al soltarse, también si el handler entra en
/// pánico, así la cola no pierde capacidad de admisión.
struct InFlightSlot<'a, C> {
    queue: &'a RequestQueue<C>,
}

impl<C> Drop for InFlightSlot<'_, C> {
    fn drop(&mut self) {
        self.queue.finish_handling();
    }
}

/// Loop principal del worker; retorna sus estadísticas al cerrarse la cola
fn worker_loop<C: Connection, H: RequestHandler<C>>(
    id: usize,
    queue: Arc<RequestQueue<C>>,
    log: Arc<SyncLog>,
    handler: Arc<H>,
) -> WorkerStats {
    let mut stats = WorkerStats::new(id);
    debug!(worker_id = id, "worker started");

    while let Some(request) = queue.dequeue() {
        // Se declara antes que la conexión: en un pánico se suelta después
        let _slot = InFlightSlot { queue: &queue };
        let dispatch_interval = request.dispatch_interval();
        let Dispatched {
            mut connection,
            arrival,
            ..
        } = request;

        debug!(
            worker_id = id,
            dispatch_us = dispatch_interval.as_micros() as u64,
            "request dispatched"
        );

        handler.handle(&mut connection, arrival, dispatch_interval, &mut stats, &log);

        if let Err(e) = connection.close() {
            debug!(worker_id = id, error = %e, "failed to close connection");
        }
    }

    debug!(worker_id = id, total = stats.total, "worker stopped");
    stats
}
