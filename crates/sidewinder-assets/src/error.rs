use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::shader::ShaderKind;

/// A shader path that could not be turned into text.
#[derive(Debug)]
pub enum ResolveError {
    /// The declared path does not exist.
    NotFound { kind: ShaderKind, path: PathBuf },
    /// The file exists but could not be read.
    Io { kind: ShaderKind, path: PathBuf, source: io::Error },
    /// The file is not valid UTF-8 and cannot be delivered as text.
    InvalidUtf8 { kind: ShaderKind, path: PathBuf },
}

impl ResolveError {
    /// Path of the shader that failed to resolve.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound { path, .. }
            | Self::Io { path, .. }
            | Self::InvalidUtf8 { path, .. } => path,
        }
    }

    pub fn kind(&self) -> ShaderKind {
        match self {
            Self::NotFound { kind, .. }
            | Self::Io { kind, .. }
            | Self::InvalidUtf8 { kind, .. } => *kind,
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { kind, path } => {
                write!(f, "{kind} shader not found: {}", path.display())
            }
            Self::Io { kind, path, source } => {
                write!(f, "failed to read {kind} shader {}: {source}", path.display())
            }
            Self::InvalidUtf8 { kind, path } => {
                write!(f, "{kind} shader {} is not valid UTF-8", path.display())
            }
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A module binary whose header is not a loadable WebAssembly module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryError {
    /// Fewer bytes than the 8-byte preamble.
    Truncated { len: usize },
    /// The first four bytes are not `\0asm`.
    BadMagic([u8; 4]),
    /// Magic matched but the binary format version is not 1.
    UnsupportedVersion(u32),
}

impl fmt::Display for BinaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { len } => {
                write!(f, "module binary truncated: {len} bytes, expected at least 8")
            }
            Self::BadMagic(m) => write!(f, "module binary has bad magic {m:02x?}"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported module binary version {v}"),
        }
    }
}

impl std::error::Error for BinaryError {}
