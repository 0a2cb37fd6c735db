//! # Cola Circular de Requests
//! src/queue/request_queue.rs
//!
//! Cola acotada y thread-safe entre el acceptor (un productor) y los
//! workers (N consumidores). FIFO estricto, sin prioridades ni descartes:
//! cuando está llena el productor se bloquea.
//!
//! ## Contadores
//!
//! - `queued`: requests en el buffer, aún no tomados por un worker
//! - `in_flight`: requests aceptados y no terminados (en buffer + en manos
//!   de un worker). Siempre `in_flight >= queued`.
//!
//! La política de admisión decide cuál de los dos define "llena".

use crate::error::QueueClosed;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

/// Política de admisión (qué contador limita al productor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AdmissionPolicy {
    /// Llena cuando hay `capacity` requests aceptados sin terminar.
    /// Un worker libera espacio al llamar `finish_handling`.
    InFlight,

    /// Llena cuando el buffer tiene `capacity` requests esperando.
    /// Un worker libera espacio al hacer `dequeue`.
    Queue,
}

impl AdmissionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionPolicy::InFlight => "in-flight",
            AdmissionPolicy::Queue => "queue",
        }
    }
}

/// Request aceptado esperando en la cola
#[derive(Debug)]
pub struct PendingRequest<C> {
    /// Conexión aceptada; la cola es su dueña mientras espera
    pub connection: C,

    /// Momento en que el acceptor recibió la conexión
    pub arrival: SystemTime,
}

/// Request entregado a un worker
#[derive(Debug)]
pub struct Dispatched<C> {
    /// Conexión; el worker que la recibe es su único dueño
    pub connection: C,

    /// Momento de llegada (estampado por el acceptor)
    pub arrival: SystemTime,

    /// Momento exacto en que salió de la cola
    pub dispatch: SystemTime,
}

impl<C> Dispatched<C> {
    /// Tiempo que el request pasó en la cola
    pub fn dispatch_interval(&self) -> Duration {
        self.dispatch
            .duration_since(self.arrival)
            .unwrap_or(Duration::ZERO)
    }
}

/// Estado interno protegido por el mutex
struct QueueState<C> {
    slots: Vec<Option<PendingRequest<C>>>,
    front: usize,
    rear: usize,
    queued: usize,
    in_flight: usize,
    closed: bool,
}

/// Cola circular acotada de requests pendientes
pub struct RequestQueue<C> {
    state: Mutex<QueueState<C>>,

    /// Productores esperando espacio
    not_full: Condvar,

    /// Consumidores esperando requests
    not_empty: Condvar,

    capacity: usize,
    policy: AdmissionPolicy,
}

impl<C> RequestQueue<C> {
    /// Crea una cola con capacidad fija
    ///
    /// # Panics
    ///
    /// Si `capacity` es 0 (la configuración ya lo valida antes).
    pub fn new(capacity: usize, policy: AdmissionPolicy) -> Self {
        assert!(capacity > 0, "queue capacity must be >= 1");

        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);

        Self {
            state: Mutex::new(QueueState {
                slots,
                front: 0,
                rear: 0,
                queued: 0,
                in_flight: 0,
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
            policy,
        }
    }

    // Las secciones críticas no entran en pánico; el estado sigue
    // siendo válido aunque el mutex esté envenenado.
    fn lock(&self) -> MutexGuard<'_, QueueState<C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_full(&self, state: &QueueState<C>) -> bool {
        match self.policy {
            AdmissionPolicy::InFlight => state.in_flight >= self.capacity,
            AdmissionPolicy::Queue => state.queued >= self.capacity,
        }
    }

    /// Encola una conexión
    ///
    /// Bloquea mientras la cola esté llena según la política. La cola pasa a
    /// ser dueña de la conexión. Si la cola se cierra (antes o durante la
    /// espera) la conexión se devuelve en el error.
    pub fn enqueue(&self, connection: C, arrival: SystemTime) -> Result<(), QueueClosed<C>> {
        let mut state = self.lock();
        while !state.closed && self.is_full(&state) {
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.closed {
            return Err(QueueClosed(connection));
        }

        let rear = state.rear;
        state.slots[rear] = Some(PendingRequest { connection, arrival });
        state.rear = (rear + 1) % self.capacity;
        state.queued += 1;
        state.in_flight += 1;

        self.not_empty.notify_one();
        Ok(())
    }

    /// Desencola el request más antiguo
    ///
    /// Bloquea mientras no haya requests. El tiempo de despacho se toma con
    /// el mutex tomado. Retorna `None` solo si la cola está cerrada y ya
    /// no quedan requests por drenar.
    pub fn dequeue(&self) -> Option<Dispatched<C>> {
        let mut state = self.lock();
        while state.queued == 0 && !state.closed {
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.queued == 0 {
            return None;
        }

        let front = state.front;
        let pending = state.slots[front]
            .take()
            .expect("queued > 0 implies the front slot is occupied");
        state.front = (front + 1) % self.capacity;
        state.queued -= 1;
        let dispatch = SystemTime::now();

        if self.policy == AdmissionPolicy::Queue {
            self.not_full.notify_one();
        }

        Some(Dispatched {
            connection: pending.connection,
            arrival: pending.arrival,
            dispatch,
        })
    }

    /// Marca como terminado un request previamente desencolado
    ///
    /// Cada `dequeue` exitoso debe balancearse con exactamente una llamada.
    /// Con `AdmissionPolicy::InFlight` es lo que despierta al productor.
    pub fn finish_handling(&self) {
        let mut state = self.lock();
        debug_assert!(
            state.in_flight > state.queued,
            "finish_handling without a matching dequeue"
        );
        if state.in_flight > state.queued {
            state.in_flight -= 1;
        }

        if self.policy == AdmissionPolicy::InFlight {
            self.not_full.notify_one();
        }
    }

    /// Cierra la cola y despierta a todos los threads bloqueados
    ///
    /// Los productores reciben `QueueClosed`; los consumidores siguen
    /// drenando lo que quede y luego reciben `None`. Es idempotente.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// Verifica si la cola fue cerrada
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Requests esperando en el buffer
    pub fn len(&self) -> usize {
        self.lock().queued
    }

    /// Verifica si el buffer está vacío
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Requests aceptados y no terminados
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Retorna la capacidad máxima
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retorna la política de admisión
    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Obtiene estadísticas de la cola
    pub fn stats(&self) -> QueueStats {
        let state = self.lock();
        QueueStats {
            capacity: self.capacity,
            queued: state.queued,
            in_flight: state.in_flight,
            policy: self.policy,
            closed: state.closed,
        }
    }
}

/// Estadísticas de la cola
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStats {
    pub capacity: usize,
    pub queued: usize,
    pub in_flight: usize,
    pub policy: AdmissionPolicy,
    pub closed: bool,
}
