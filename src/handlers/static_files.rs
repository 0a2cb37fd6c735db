//! # Contenido Estático
//! src/handlers/static_files.rs
//!
//! Resolución de paths dentro del document root y lectura de archivos.
//! También define `ContentError`, compartido con el módulo CGI.

use crate::http::{Response, StatusCode};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Archivo servido cuando el path termina en '/'
pub const DEFAULT_PAGE: &str = "home.html";

/// Fallas al resolver el path de un GET o POST
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Failed to run CGI program {path}: {source}")]
    Cgi {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ContentError {
    pub fn status(&self) -> StatusCode {
        match self {
            ContentError::NotFound(_) => StatusCode::NotFound,
            ContentError::Forbidden(_) => StatusCode::Forbidden,
            ContentError::Cgi { .. } => StatusCode::InternalServerError,
        }
    }

    /// Página de error para el cliente
    pub fn to_response(&self) -> Response {
        let (cause, message) = match self {
            ContentError::NotFound(path) => (path.as_str(), "File not found"),
            ContentError::Forbidden(path) => (path.as_str(), "Access denied"),
            ContentError::Cgi { path, .. } => (path.as_str(), "Could not run CGI program"),
        };
        Response::error(self.status(), cause, message)
    }
}

/// Traduce el path del request a un archivo bajo `root`
///
/// Cualquier componente `..` o prefijo absoluto se rechaza con 403.
pub fn resolve(root: &Path, request_path: &str) -> Result<PathBuf, ContentError> {
    let relative = request_path.trim_start_matches('/');
    let mut resolved = root.to_path_buf();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return Err(ContentError::Forbidden(request_path.to_string())),
        }
    }

    if request_path.is_empty() || request_path.ends_with('/') {
        resolved.push(DEFAULT_PAGE);
    }
    Ok(resolved)
}

/// Content-Type según la extensión
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html",
        Some("gif") => "image/gif",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "text/plain",
    }
}

/// Sirve un archivo regular del document root
pub fn serve(root: &Path, request_path: &str) -> Result<Response, ContentError> {
    let file = resolve(root, request_path)?;

    let metadata = fs::metadata(&file).map_err(|e| classify(e, request_path))?;
    if !metadata.is_file() {
        return Err(ContentError::Forbidden(request_path.to_string()));
    }

    let body = fs::read(&file).map_err(|e| classify(e, request_path))?;
    Ok(Response::content(content_type(&file), body))
}

/// Verifica que el path exista bajo `root` sin leerlo
pub fn ensure_exists(root: &Path, request_path: &str) -> Result<(), ContentError> {
    let target = resolve(root, request_path)?;
    fs::metadata(&target)
        .map(|_| ())
        .map_err(|e| classify(e, request_path))
}

/// Errores de sistema de archivos → 404 o 403
pub(crate) fn classify(error: io::Error, request_path: &str) -> ContentError {
    match error.kind() {
        io::ErrorKind::NotFound => ContentError::NotFound(request_path.to_string()),
        _ => ContentError::Forbidden(request_path.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::TempRoot;

    #[test]
    fn test_resolve_stays_under_root() {
        let root = Path::new("/srv/public");
        assert_eq!(resolve(root, "/home.html").unwrap(), root.join("home.html"));
        assert_eq!(resolve(root, "/a/./b.txt").unwrap(), root.join("a").join("b.txt"));
        assert_eq!(resolve(root, "/").unwrap(), root.join(DEFAULT_PAGE));
        assert_eq!(resolve(root, "/docs/").unwrap(), root.join("docs").join(DEFAULT_PAGE));
    }

    #[test]
    fn test_resolve_rejects_parent_components() {
        let root = Path::new("/srv/public");
        assert!(matches!(resolve(root, "/../etc/passwd"), Err(ContentError::Forbidden(_))));
        assert!(matches!(resolve(root, "/a/../../x"), Err(ContentError::Forbidden(_))));
    }

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type(Path::new("home.html")), "text/html");
        assert_eq!(content_type(Path::new("a.GIF")), "image/gif");
        assert_eq!(content_type(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(content_type(Path::new("a.png")), "image/png");
        assert_eq!(content_type(Path::new("notes.txt")), "text/plain");
        assert_eq!(content_type(Path::new("README")), "text/plain");
    }

    #[test]
    fn test_serve_existing_file() {
        let root = TempRoot::new("static-ok");
        root.write("home.html", b"<h1>hi</h1>");

        let response = serve(root.path(), "/home.html").unwrap();
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.header("Content-Type"), Some("text/html"));
        assert_eq!(response.body(), b"<h1>hi</h1>");
    }

    #[test]
    fn test_serve_missing_file_is_404() {
        let root = TempRoot::new("static-missing");
        let err = serve(root.path(), "/nope.txt").unwrap_err();

        assert_eq!(err.status(), StatusCode::NotFound);
        let body = String::from_utf8(err.to_response().body().to_vec()).unwrap();
        assert!(body.contains("File not found: /nope.txt"));
    }

    #[test]
    fn test_ensure_exists() {
        let root = TempRoot::new("static-exists");
        root.write("pageA.txt", b"a");

        assert!(ensure_exists(root.path(), "/pageA.txt").is_ok());
        assert_eq!(
            ensure_exists(root.path(), "/missing.txt").unwrap_err().status(),
            StatusCode::NotFound
        );
        assert_eq!(
            ensure_exists(root.path(), "/../pageA.txt").unwrap_err().status(),
            StatusCode::Forbidden
        );
    }

    #[test]
    fn test_serve_directory_is_403() {
        let root = TempRoot::new("static-dir");
        root.mkdir("sub");
        root.write("sub/home.html", b"x");

        // El directorio en sí no es un archivo regular
        assert_eq!(serve(root.path(), "/sub").unwrap_err().status(), StatusCode::Forbidden);
        // Con '/' final se sirve la página por defecto
        assert!(serve(root.path(), "/sub/").is_ok());
    }
}
