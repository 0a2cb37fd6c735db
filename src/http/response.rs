//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! ## Formato de una respuesta HTTP/1.0
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Server: Stat Web Server\r\n
//! Content-Length: 5\r\n
//! Content-Type: text/plain\r\n
//! Stat-Req-Arrival:: 1700000000.123456\r\n
//! \r\n
//! hello
//! ```
//!
//! Los headers se emiten en el orden en que se agregaron.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use stat_server::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_header("Content-Type", "text/plain")
//!     .with_body(b"hello".to_vec());
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.0 200 OK\r\n"));
//! ```

use super::StatusCode;
use std::io::{self, Write};

pub const SERVER_NAME: &str = "Stat Web Server";

/// Representa una respuesta HTTP/1.0 completa
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// Headers en orden de inserción; un nombre repetido se sobrescribe
    headers: Vec<(String, String)>,

    body: Vec<u8>,
}

impl Response {
    /// Respuesta sin body con el header `Server`
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: vec![("Server".to_string(), SERVER_NAME.to_string())],
            body: Vec::new(),
        }
    }

    /// Agrega un header (versión builder)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Agrega un header; si ya existe, se sobrescribe
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el body y el `Content-Length`
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        let len = body.len().to_string();
        self.body = body;
        self.add_header("Content-Length", &len);
        self
    }

    /// Respuesta 200 con contenido y tipo
    pub fn content(content_type: &str, body: Vec<u8>) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", content_type)
            .with_body(body)
    }

    /// Respuesta de error con una página HTML breve
    pub fn error(status: StatusCode, cause: &str, message: &str) -> Self {
        let body = format!(
            "<html><title>Server Error</title><body>\r\n{}: {}\r\n<p>{}: {}\r\n</body></html>\r\n",
            status.as_u16(),
            status.reason_phrase(),
            message,
            cause
        );
        Self::new(status)
            .with_header("Content-Type", "text/html")
            .with_body(body.into_bytes())
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(128 + self.body.len());

        // 1. Status line
        result.extend_from_slice(format!("HTTP/1.0 {}\r\n", self.status).as_bytes());

        // 2. Headers
        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        // 3. Línea vacía y body
        result.extend_from_slice(b"\r\n");
        result.extend_from_slice(&self.body);

        result
    }

    /// Escribe la respuesta completa en `out`
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(&self.to_bytes())?;
        out.flush()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
