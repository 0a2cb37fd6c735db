//! # Lock Lector-Escritor con Preferencia de Escritores
//! src/log/rwlock.rs
//!
//! Implementado con un `Mutex` para el estado y dos `Condvar`:
//! una para lectores y otra para escritores.
//!
//! ## Protocolo
//!
//! ```text
//! read():   espera mientras (escritores activos > 0 || escritores esperando > 0)
//!           lectores activos += 1
//! write():  escritores esperando += 1
//!           espera mientras (lectores activos > 0 || escritores activos > 0)
//!           escritores esperando -= 1; escritores activos = 1
//! fin lectura:  lectores -= 1; si llegó a 0 despierta UN escritor
//! fin escritura: si hay escritores esperando despierta UNO,
//!                si no, despierta a TODOS los lectores
//! ```
//!
//! Un lector nunca se adelanta a un escritor que ya está esperando, así que
//! la espera de un escritor queda acotada por la lectura en curso más los
//! escritores que ya estaban en fila.

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Contadores internos del lock
///
/// Invariante: `active_writers <= 1`, y nunca hay lectores y escritor
/// activos al mismo tiempo.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LockState {
    /// Lectores dentro de la sección crítica
    pub active_readers: usize,

    /// 0 o 1
    pub active_writers: usize,

    /// Escritores bloqueados esperando acceso
    pub waiting_writers: usize,
}

/// Lock lector-escritor que da preferencia a los escritores
pub struct WriterPreferringLock<T> {
    state: Mutex<LockState>,
    readers_cond: Condvar,
    writers_cond: Condvar,
    data: UnsafeCell<T>,
}

// SAFETY: el acceso a `data` está mediado por el protocolo de `state`:
// varios `&T` solo con lectores activos, un único `&mut T` solo con el
// escritor activo. Mismos requisitos que `std::sync::RwLock`.
unsafe impl<T: Send> Send for WriterPreferringLock<T> {}
unsafe impl<T: Send + Sync> Sync for WriterPreferringLock<T> {}

impl<T> WriterPreferringLock<T> {
    /// Crea un lock nuevo protegiendo `value`
    pub fn new(value: T) -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            readers_cond: Condvar::new(),
            writers_cond: Condvar::new(),
            data: UnsafeCell::new(value),
        }
    }

    // Ninguna sección crítica sobre `state` puede entrar en pánico,
    // así que un mutex envenenado sigue teniendo contadores consistentes.
    fn lock_state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adquiere acceso de lectura (compartido)
    ///
    /// Bloquea mientras haya un escritor activo o esperando.
    pub fn read(&self) -> ReadGuard<'_, T> {
        let mut state = self.lock_state();
        while state.active_writers > 0 || state.waiting_writers > 0 {
            state = self
                .readers_cond
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.active_readers += 1;
        ReadGuard { lock: self }
    }

    /// Adquiere acceso de escritura (exclusivo)
    ///
    /// Se anota como escritor esperando antes de bloquear; desde ese momento
    /// ningún lector nuevo puede entrar.
    pub fn write(&self) -> WriteGuard<'_, T> {
        let mut state = self.lock_state();
        state.waiting_writers += 1;
        while state.active_readers > 0 || state.active_writers > 0 {
            state = self
                .writers_cond
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.waiting_writers -= 1;
        state.active_writers = 1;
        WriteGuard { lock: self }
    }

    fn end_read(&self) {
        let mut state = self.lock_state();
        state.active_readers -= 1;
        if state.active_readers == 0 {
            self.writers_cond.notify_one();
        }
    }

    fn end_write(&self) {
        let mut state = self.lock_state();
        state.active_writers = 0;
        if state.waiting_writers > 0 {
            self.writers_cond.notify_one();
        } else {
            self.readers_cond.notify_all();
        }
    }

    /// Copia de los contadores actuales (para diagnóstico y tests)
    pub fn state(&self) -> LockState {
        *self.lock_state()
    }

    /// Consume el lock y retorna el valor protegido
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: Default> Default for WriterPreferringLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Guard de lectura; libera el acceso al salir de scope
pub struct ReadGuard<'a, T> {
    lock: &'a WriterPreferringLock<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: mientras exista este guard `active_readers > 0`,
        // por lo que no hay escritor activo.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.end_read();
    }
}

/// Guard de escritura; libera el acceso al salir de scope
pub struct WriteGuard<'a, T> {
    lock: &'a WriterPreferringLock<T>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: este guard es el único escritor y no hay lectores.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: ídem; el acceso exclusivo dura lo que dure `&mut self`.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.end_write();
    }
}
