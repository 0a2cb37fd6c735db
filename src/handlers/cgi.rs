//! # Contenido Dinámico (CGI)
//! src/handlers/cgi.rs
//!
//! Un GET cuyo path contiene `cgi` ejecuta el programa correspondiente
//! bajo el document root. La query string cruda va en `QUERY_STRING` y la
//! salida estándar del programa es el body de la respuesta.

use super::static_files::{classify, resolve, ContentError};
use crate::http::Response;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::warn;

/// ¿El path del request pide contenido dinámico?
pub fn is_dynamic(request_path: &str) -> bool {
    request_path.contains("cgi")
}

/// Ejecuta el programa y espera a que termine
pub fn run(root: &Path, request_path: &str, query: &str) -> Result<Response, ContentError> {
    let program = resolve(root, request_path)?;

    let metadata = fs::metadata(&program).map_err(|e| classify(e, request_path))?;
    if !metadata.is_file() || !is_executable(&metadata) {
        return Err(ContentError::Forbidden(request_path.to_string()));
    }

    let output = Command::new(&program)
        .env("QUERY_STRING", query)
        .current_dir(root)
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .output()
        .map_err(|source| ContentError::Cgi {
            path: request_path.to_string(),
            source,
        })?;

    if !output.status.success() {
        warn!(program = %request_path, status = %output.status, "CGI program exited with failure");
    }

    Ok(Response::content("text/html", output.stdout))
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}
