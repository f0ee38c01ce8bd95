use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ResolveError;

/// Pipeline stage a shader source is declared for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shader text tagged with the stage it was declared for.
///
/// The text is never transformed after loading. The kind comes from the
/// caller, never from inspecting the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    kind: ShaderKind,
    text: String,
    origin: Option<PathBuf>,
}

impl ShaderSource {
    /// Wraps in-memory text, e.g. from `include_str!`.
    pub fn new(kind: ShaderKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into(), origin: None }
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// File the text was read from, if it came from disk.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// The two sources handed to the module initializer, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPair {
    pub vertex: ShaderSource,
    pub fragment: ShaderSource,
}

impl ShaderPair {
    /// Builds a pair from raw text.
    pub fn from_text(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: ShaderSource::new(ShaderKind::Vertex, vertex),
            fragment: ShaderSource::new(ShaderKind::Fragment, fragment),
        }
    }

    /// Returns `(vertex, fragment)` text in initializer argument order.
    pub fn as_args(&self) -> (&str, &str) {
        (self.vertex.text(), self.fragment.text())
    }

    pub fn get(&self, kind: ShaderKind) -> &ShaderSource {
        match kind {
            ShaderKind::Vertex => &self.vertex,
            ShaderKind::Fragment => &self.fragment,
        }
    }
}

/// Reads the shader at `path` verbatim and tags it with `kind`.
pub fn resolve(path: impl AsRef<Path>, kind: ShaderKind) -> Result<ShaderSource, ResolveError> {
    let path = path.as_ref();

    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ResolveError::NotFound { kind, path: path.to_path_buf() }
        } else {
            ResolveError::Io { kind, path: path.to_path_buf(), source }
        }
    })?;

    let text = String::from_utf8(bytes)
        .map_err(|_| ResolveError::InvalidUtf8 { kind, path: path.to_path_buf() })?;

    Ok(ShaderSource { kind, text, origin: Some(path.to_path_buf()) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, bytes).unwrap();
        p
    }

    #[test]
    fn resolve_returns_text_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        // Trailing whitespace, CRLF and a BOM-free unicode char must survive.
        let src = "attribute vec3 pos;\r\nvoid main() { gl_Position = vec4(pos, 1.0); } // é  \n";
        let p = write(dir.path(), "vertex.glsl", src.as_bytes());

        let shader = resolve(&p, ShaderKind::Vertex).unwrap();
        assert_eq!(shader.text(), src);
        assert_eq!(shader.origin(), Some(p.as_path()));
    }

    #[test]
    fn kind_comes_from_caller_not_content() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "vertex.glsl", b"gl_Position = x;");

        let shader = resolve(&p, ShaderKind::Fragment).unwrap();
        assert_eq!(shader.kind(), ShaderKind::Fragment);
    }

    #[test]
    fn empty_file_is_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "empty.glsl", b"");
        assert_eq!(resolve(&p, ShaderKind::Vertex).unwrap().text(), "");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve(dir.path().join("fragment.glsl"), ShaderKind::Fragment).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { kind: ShaderKind::Fragment, .. }));
        assert!(err.to_string().contains("fragment shader not found"));
    }

    #[test]
    fn non_utf8_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "bad.glsl", &[0xff, 0xfe, 0x00]);
        let err = resolve(&p, ShaderKind::Vertex).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidUtf8 { .. }));
    }

    #[test]
    fn directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve(dir.path(), ShaderKind::Vertex).unwrap_err();
        assert!(matches!(err, ResolveError::Io { .. }));
    }

    #[test]
    fn pair_args_are_vertex_then_fragment() {
        let pair = ShaderPair::from_text("A", "B");
        assert_eq!(pair.as_args(), ("A", "B"));
        assert_eq!(pair.get(ShaderKind::Fragment).text(), "B");
    }
}
