//! # Servidor TCP con Pool Fijo
//! src/server/tcp.rs
//!
//! El thread que llama `run` es el acceptor (único productor):
//!
//! ```text
//! accept → marca de llegada → enqueue ──► RequestQueue ──► N workers
//! ```
//!
//! El acceptor nunca atiende requests. Si la cola está llena se bloquea
//! en `enqueue` y deja de aceptar hasta que un worker libere espacio.

use crate::config::Config;
use crate::error::{QueueClosed, ServerError};
use crate::handlers::HttpHandler;
use crate::log::SyncLog;
use crate::queue::{QueueStats, RequestQueue};
use crate::workers::{WorkerPool, WorkerStats};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use std::thread;
use tracing::{debug, info, warn};

const ACCEPT_BACKOFF_BASE: Duration = Duration::from_millis(10);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Servidor HTTP/1.0 con cola acotada y pool de workers
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    queue: Arc<RequestQueue<TcpStream>>,
    log: Arc<SyncLog>,
    pool: WorkerPool<TcpStream>,
    stop: Arc<AtomicBool>,
}

impl Server {
    /// Abre el socket, crea la cola, el log y el pool de workers
    ///
    /// No valida `config`; eso le corresponde al llamador.
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        let address = config.address();
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;
        let local_addr = listener.local_addr()?;

        let queue = Arc::new(RequestQueue::new(config.queue_size, config.admission));
        let log = Arc::new(SyncLog::new(config.log_capacity)?);
        let handler = Arc::new(HttpHandler::new(config.document_root.clone()));
        let pool = WorkerPool::spawn(config.threads, Arc::clone(&queue), Arc::clone(&log), handler)?;

        info!(
            address = %local_addr,
            threads = config.threads,
            queue_size = config.queue_size,
            admission = config.admission.as_str(),
            "server listening"
        );

        Ok(Self {
            listener,
            local_addr,
            queue,
            log,
            pool,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Dirección real de escucha (útil con puerto 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Log compartido con los workers
    pub fn log(&self) -> &Arc<SyncLog> {
        &self.log
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Handle para detener el servidor desde otro thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            stop: Arc::clone(&self.stop),
            queue: Arc::clone(&self.queue),
            wake_addr: wake_address(self.local_addr),
        }
    }

    /// Loop de aceptación; bloquea hasta que se pida el apagado
    ///
    /// Al terminar, los workers drenan los requests pendientes y se
    /// retornan sus estadísticas finales.
    pub fn run(self) -> Result<Vec<WorkerStats>, ServerError> {
        let mut accept_failures: u32 = 0;

        for stream in self.listener.incoming() {
            if self.stop.load(Ordering::SeqCst) {
                break;
            }

            let stream = match stream {
                Ok(stream) => {
                    accept_failures = 0;
                    stream
                }
                Err(e) => {
                    // Ej: EMFILE; reintentar de inmediato solo gira en vacío
                    accept_failures = accept_failures.saturating_add(1);
                    let delay = accept_backoff(accept_failures);
                    warn!(
                        error = %e,
                        failures = accept_failures,
                        retry_ms = delay.as_millis() as u64,
                        "failed to accept connection"
                    );
                    thread::sleep(delay);
                    continue;
                }
            };

            let arrival = SystemTime::now();
            if let Ok(peer) = stream.peer_addr() {
                debug!(peer = %peer, "connection accepted");
            }

            if let Err(QueueClosed(rejected)) = self.queue.enqueue(stream, arrival) {
                drop(rejected);
                break;
            }
        }

        info!("acceptor stopped, draining workers");
        let stats = self.pool.shutdown();
        let total: u64 = stats.iter().map(|s| s.total).sum();
        info!(workers = stats.len(), requests = total, "server stopped");
        Ok(stats)
    }
}

/// Detiene un `Server` en ejecución
#[derive(Clone)]
pub struct ShutdownHandle {
    stop: Arc<AtomicBool>,
    queue: Arc<RequestQueue<TcpStream>>,
    wake_addr: SocketAddr,
}

impl ShutdownHandle {
    /// Marca el apagado, cierra la cola y desbloquea el `accept`
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.queue.close();

        // Conexión propia para sacar al acceptor del accept bloqueante
        if let Err(e) = TcpStream::connect_timeout(&self.wake_addr, Duration::from_secs(1)) {
            debug!(error = %e, "wake-up connection failed");
        }
    }
}

/// Espera entre fallos consecutivos de `accept`: 10 ms duplicando hasta 1 s
fn accept_backoff(failures: u32) -> Duration {
    let exponent = failures.saturating_sub(1).min(7);
    (ACCEPT_BACKOFF_BASE * 2u32.pow(exponent)).min(ACCEPT_BACKOFF_MAX)
}

/// Una dirección sin especificar (0.0.0.0 / ::) se despierta por loopback
fn wake_address(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port()),
        IpAddr::V6(ip) if ip.is_unspecified() => SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), addr.port()),
        _ => addr,
    }
}
