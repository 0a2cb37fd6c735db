//! # Handler de Requests HTTP
//! src/handlers/mod.rs
//!
//! `HttpHandler` es el `RequestHandler` que usan los workers del servidor:
//!
//! 1. Lee un request (hasta 8 KiB) y lo parsea
//! 2. Clasifica y actualiza las estadísticas del worker
//! 3. Genera el contenido:
//!    - `GET` con `cgi` en el path → programa CGI
//!    - otro `GET` → archivo estático
//!    - `POST` sobre un path existente → contenido actual del log
//! 4. Agrega los headers `Stat-*` y escribe la respuesta
//!
//! Los GET exitosos agregan su bloque de estadísticas al log compartido.

pub mod cgi;
pub mod stat_headers;
pub mod static_files;

pub use static_files::ContentError;
pub use stat_headers::RequestTiming;

use crate::http::{Method, ParseError, Request, Response, StatusCode};
use crate::log::SyncLog;
use crate::workers::{RequestHandler, RequestKind, WorkerStats};
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Tamaño máximo del request que se lee
pub const MAX_REQUEST_SIZE: usize = 8192;

/// Handler HTTP sobre un document root
#[derive(Debug, Clone)]
pub struct HttpHandler {
    document_root: PathBuf,
}

impl HttpHandler {
    pub fn new(document_root: impl Into<PathBuf>) -> Self {
        Self {
            document_root: document_root.into(),
        }
    }

    pub fn document_root(&self) -> &Path {
        &self.document_root
    }

    /// Atiende un request completo sobre cualquier stream
    ///
    /// Retorna el status enviado, o `None` si el cliente cerró sin mandar
    /// nada o la lectura falló.
    pub fn respond<S: Read + Write>(
        &self,
        stream: &mut S,
        timing: RequestTiming,
        stats: &mut WorkerStats,
        log: &SyncLog,
    ) -> Option<StatusCode> {
        let raw = match read_request(stream) {
            Ok(raw) if raw.is_empty() => {
                debug!(worker_id = stats.id, "connection closed before request");
                stats.record_error();
                return None;
            }
            Ok(raw) => raw,
            Err(e) => {
                warn!(worker_id = stats.id, error = %e, "failed to read request");
                stats.record_error();
                return None;
            }
        };

        let (mut response, kind, path) = match Request::parse(&raw) {
            Ok(request) => {
                let path = request.path().to_string();
                let (response, kind) = self.dispatch(&request, log);
                (response, kind, path)
            }
            Err(e) => (parse_error_response(&e), None, String::new()),
        };

        // Los contadores se actualizan antes de renderizar los headers
        match kind {
            Some(kind) => stats.record(kind),
            None => stats.record_error(),
        }

        let block = stat_headers::stat_block(&timing, stats);
        stat_headers::apply(&mut response, &block);

        if matches!(kind, Some(RequestKind::Static) | Some(RequestKind::Dynamic)) {
            let entry = stat_headers::log_entry(&block);
            if let Err(e) = log.append(entry.as_bytes()) {
                warn!(worker_id = stats.id, error = %e, "failed to append log entry");
            }
        }

        let status = response.status();
        info!(
            worker_id = stats.id,
            path = %path,
            status = status.as_u16(),
            "request served"
        );

        if let Err(e) = response.write_to(stream) {
            debug!(worker_id = stats.id, error = %e, "failed to write response");
        }
        Some(status)
    }

    /// Produce la respuesta y la categoría (None si terminó en error)
    fn dispatch(&self, request: &Request, log: &SyncLog) -> (Response, Option<RequestKind>) {
        match request.method() {
            Method::GET => {
                let (result, kind) = if cgi::is_dynamic(request.path()) {
                    (
                        cgi::run(&self.document_root, request.path(), request.query()),
                        RequestKind::Dynamic,
                    )
                } else {
                    (
                        static_files::serve(&self.document_root, request.path()),
                        RequestKind::Static,
                    )
                };
                match result {
                    Ok(response) => (response, Some(kind)),
                    Err(e) => {
                        debug!(error = %e, "content request failed");
                        (e.to_response(), None)
                    }
                }
            }
            Method::POST => match static_files::ensure_exists(&self.document_root, request.path()) {
                Ok(()) => (log_report(log), Some(RequestKind::Post)),
                Err(e) => {
                    debug!(error = %e, "log report target rejected");
                    (e.to_response(), None)
                }
            },
            Method::HEAD => (
                Response::error(
                    StatusCode::NotImplemented,
                    request.method().as_str(),
                    "Method not implemented",
                ),
                None,
            ),
        }
    }
}

impl RequestHandler<TcpStream> for HttpHandler {
    fn handle(
        &self,
        connection: &mut TcpStream,
        arrival: SystemTime,
        dispatch_interval: Duration,
        stats: &mut WorkerStats,
        log: &SyncLog,
    ) {
        let timing = RequestTiming {
            arrival,
            dispatch_interval,
        };
        self.respond(connection, timing, stats, log);
    }
}

/// Lee hasta el fin de los headers, EOF o `MAX_REQUEST_SIZE` bytes
///
/// El request puede llegar partido en varios segmentos TCP.
fn read_request<R: Read>(stream: &mut R) -> io::Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(512);
    let mut chunk = [0u8; 1024];

    while raw.len() < MAX_REQUEST_SIZE && !has_header_end(&raw) {
        let limit = chunk.len().min(MAX_REQUEST_SIZE - raw.len());
        match stream.read(&mut chunk[..limit]) {
            Ok(0) => break,
            Ok(n) => raw.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(raw)
}

fn has_header_end(raw: &[u8]) -> bool {
    raw.windows(4).any(|w| w == b"\r\n\r\n") || raw.windows(2).any(|w| w == b"\n\n")
}

/// Respuesta a un POST: el log completo como texto plano
fn log_report(log: &SyncLog) -> Response {
    Response::content("text/plain", log.snapshot())
}

fn parse_error_response(error: &ParseError) -> Response {
    match error {
        ParseError::UnsupportedMethod(method) => {
            Response::error(StatusCode::NotImplemented, method, "Method not implemented")
        }
        other => Response::error(StatusCode::BadRequest, &other.to_string(), "Invalid request"),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::TempRoot;
    use super::*;
    use std::io::{self, Cursor};

    /// Stream en memoria: lee de `input`, acumula lo escrito en `output`
    struct MemoryStream {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl MemoryStream {
        fn new(request: &[u8]) -> Self {
            Self {
                input: Cursor::new(request.to_vec()),
                output: Vec::new(),
            }
        }

        fn text(&self) -> String {
            String::from_utf8_lossy(&self.output).into_owned()
        }
    }

    impl Read for MemoryStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MemoryStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn timing() -> RequestTiming {
        RequestTiming {
            arrival: SystemTime::now(),
            dispatch_interval: Duration::from_micros(250),
        }
    }

    fn fixture() -> (TempRoot, HttpHandler, SyncLog) {
        let root = TempRoot::new("handler");
        root.write("home.html", b"<html>home</html>");
        let handler = HttpHandler::new(root.path());
        (root, handler, SyncLog::new(256).unwrap())
    }

    #[test]
    fn test_static_get_counts_and_logs() {
        let (_root, handler, log) = fixture();
        let mut stats = WorkerStats::new(1);
        let mut stream = MemoryStream::new(b"GET /home.html HTTP/1.0\r\n\r\n");

        let status = handler.respond(&mut stream, timing(), &mut stats, &log);
        assert_eq!(status, Some(StatusCode::Ok));

        let text = stream.text();
        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.contains("Stat-Req-Dispatch:: 0.000250\r\n"));
        assert!(text.contains("Stat-Thread-Id:: 1\r\n"));
        assert!(text.contains("Stat-Thread-Count:: 1\r\n"));
        assert!(text.contains("Stat-Thread-Static:: 1\r\n"));
        assert!(text.ends_with("<html>home</html>"));

        let logged = String::from_utf8(log.snapshot()).unwrap();
        assert!(logged.contains("Stat-Thread-Static:: 1\n"));
        assert_eq!(logged.lines().count(), 7);
    }

    #[test]
    fn test_post_returns_log_without_appending() {
        let (_root, handler, log) = fixture();
        let mut stats = WorkerStats::new(2);

        let mut first = MemoryStream::new(b"GET /home.html HTTP/1.0\r\n\r\n");
        handler.respond(&mut first, timing(), &mut stats, &log);
        let before = log.snapshot();

        let mut post = MemoryStream::new(b"POST /home.html HTTP/1.0\r\n\r\n");
        let status = handler.respond(&mut post, timing(), &mut stats, &log);

        assert_eq!(status, Some(StatusCode::Ok));
        assert_eq!(log.snapshot(), before);
        assert_eq!(stats.post_count, 1);

        let text = post.text();
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Stat-Thread-Post:: 1\r\n"));
        assert!(text.ends_with(&String::from_utf8(before).unwrap()));
    }

    #[test]
    fn test_post_to_missing_path_is_404() {
        let (_root, handler, log) = fixture();
        let mut stats = WorkerStats::new(1);
        let mut stream = MemoryStream::new(b"POST /missing.txt HTTP/1.0\r\n\r\n");

        let status = handler.respond(&mut stream, timing(), &mut stats, &log);

        assert_eq!(status, Some(StatusCode::NotFound));
        assert_eq!(stats.post_count, 0);
        assert_eq!(stats.total, 1);
        assert!(stream.text().contains("Stat-Thread-Post:: 0\r\n"));
    }

    /// Entrega el request de a pedazos, como segmentos TCP separados
    struct ChunkedStream {
        chunks: Vec<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Read for ChunkedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.chunks.is_empty() {
                return Ok(0);
            }
            let chunk = self.chunks.remove(0);
            assert!(chunk.len() <= buf.len());
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    impl Write for ChunkedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_request_split_across_reads() {
        let (_root, handler, log) = fixture();
        let mut stats = WorkerStats::new(1);
        let mut stream = ChunkedStream {
            chunks: vec![
                b"GET /ho".to_vec(),
                b"me.html HTT".to_vec(),
                b"P/1.0\r\nHost: x\r\n".to_vec(),
                b"\r\n".to_vec(),
            ],
            output: Vec::new(),
        };

        let status = handler.respond(&mut stream, timing(), &mut stats, &log);

        assert_eq!(status, Some(StatusCode::Ok));
        assert_eq!(stats.static_count, 1);
        assert!(String::from_utf8_lossy(&stream.output).ends_with("<html>home</html>"));
    }

    #[test]
    fn test_read_request_stops_at_header_end() {
        let mut stream = ChunkedStream {
            chunks: vec![b"GET / HTTP/1.0\n\n".to_vec(), b"never read".to_vec()],
            output: Vec::new(),
        };

        assert_eq!(read_request(&mut stream).unwrap(), b"GET / HTTP/1.0\n\n");
        assert_eq!(stream.chunks.len(), 1);
    }

    #[test]
    fn test_missing_file_is_404_and_not_logged() {
        let (_root, handler, log) = fixture();
        let mut stats = WorkerStats::new(1);
        let mut stream = MemoryStream::new(b"GET /missing.txt HTTP/1.0\r\n\r\n");

        let status = handler.respond(&mut stream, timing(), &mut stats, &log);

        assert_eq!(status, Some(StatusCode::NotFound));
        assert!(stream.text().contains("Stat-Thread-Count:: 1\r\n"));
        assert_eq!(stats.static_count, 0);
        assert!(log.is_empty());
    }

    #[test]
    fn test_head_and_unknown_methods_are_501() {
        let (_root, handler, log) = fixture();
        let mut stats = WorkerStats::new(1);

        let mut head = MemoryStream::new(b"HEAD /home.html HTTP/1.0\r\n\r\n");
        assert_eq!(
            handler.respond(&mut head, timing(), &mut stats, &log),
            Some(StatusCode::NotImplemented)
        );

        let mut put = MemoryStream::new(b"PUT /home.html HTTP/1.0\r\n\r\n");
        assert_eq!(
            handler.respond(&mut put, timing(), &mut stats, &log),
            Some(StatusCode::NotImplemented)
        );
        assert_eq!(stats.total, 2);
    }

    #[test]
    fn test_garbage_is_400() {
        let (_root, handler, log) = fixture();
        let mut stats = WorkerStats::new(1);
        let mut stream = MemoryStream::new(b"\x00\x01\x02garbage");

        let status = handler.respond(&mut stream, timing(), &mut stats, &log);
        assert_eq!(status, Some(StatusCode::BadRequest));
        assert!(stream.text().contains("Stat-Thread-Id:: 1\r\n"));
    }

    #[test]
    fn test_empty_connection_writes_nothing() {
        let (_root, handler, log) = fixture();
        let mut stats = WorkerStats::new(1);
        let mut stream = MemoryStream::new(b"");

        assert_eq!(handler.respond(&mut stream, timing(), &mut stats, &log), None);
        assert!(stream.output.is_empty());
        assert_eq!(stats.total, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_cgi_get_is_dynamic() {
        let (root, handler, log) = fixture();
        root.write_executable("output.cgi", b"#!/bin/sh\nprintf '%s' \"$QUERY_STRING\"\n");
        let mut stats = WorkerStats::new(3);
        let mut stream = MemoryStream::new(b"GET /output.cgi?0.1 HTTP/1.0\r\n\r\n");

        let status = handler.respond(&mut stream, timing(), &mut stats, &log);

        assert_eq!(status, Some(StatusCode::Ok));
        assert_eq!(stats.dynamic_count, 1);
        let text = stream.text();
        assert!(text.contains("Stat-Thread-Dynamic:: 1\r\n"));
        assert!(text.ends_with("\r\n\r\n0.1"));
        assert!(String::from_utf8(log.snapshot()).unwrap().contains("Stat-Thread-Dynamic:: 1\n"));
    }
}
