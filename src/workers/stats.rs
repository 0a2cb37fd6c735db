//! # Estadísticas por Worker
//! src/workers/stats.rs
//!
//! Cada worker es dueño exclusivo de su `WorkerStats`: no se comparte
//! entre threads, así que no necesita sincronización.

/// Categoría de un request atendido
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Archivo servido desde el document root
    Static,

    /// Programa CGI ejecutado
    Dynamic,

    /// Lectura del log del servidor
    Post,
}

/// Contadores de un worker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Identificador del worker (1..=N), asignado al crear el pool
    pub id: usize,

    /// Requests atendidos (incluye los que terminaron en error)
    pub total: u64,

    pub static_count: u64,
    pub dynamic_count: u64,
    pub post_count: u64,
}

impl WorkerStats {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Registra un request exitoso de la categoría indicada
    pub fn record(&mut self, kind: RequestKind) {
        self.total += 1;
        match kind {
            RequestKind::Static => self.static_count += 1,
            RequestKind::Dynamic => self.dynamic_count += 1,
            RequestKind::Post => self.post_count += 1,
        }
    }

    /// Registra un request que no llegó a clasificarse (400, 404, 501...)
    pub fn record_error(&mut self) {
        self.total += 1;
    }

    /// Campos `Stat-Thread-*` en el orden en que se reportan
    pub fn stat_fields(&self) -> [(&'static str, String); 5] {
        [
            ("Stat-Thread-Id", self.id.to_string()),
            ("Stat-Thread-Count", self.total.to_string()),
            ("Stat-Thread-Static", self.static_count.to_string()),
            ("Stat-Thread-Dynamic", self.dynamic_count.to_string()),
            ("Stat-Thread-Post", self.post_count.to_string()),
        ]
    }
}
