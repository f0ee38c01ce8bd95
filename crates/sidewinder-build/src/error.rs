use std::fmt;
use std::io;
use std::path::PathBuf;

use sidewinder_assets::BinaryError;

/// Failure to produce the packaged module.
#[derive(Debug)]
pub enum PackageError {
    /// A required module file is absent from the package directory.
    MissingArtifact { role: &'static str, path: PathBuf },
    /// The module binary does not carry a valid preamble.
    MalformedBinary { path: PathBuf, source: BinaryError },
    /// The configured module build command could not be run or exited non-zero.
    BuildCommand { command: String, status: Option<i32>, detail: String },
    Io { context: String, source: io::Error },
}

impl PackageError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }
}

impl fmt::Display for PackageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArtifact { role, path } => {
                write!(f, "module package is missing its {role}: {}", path.display())
            }
            Self::MalformedBinary { path, source } => {
                write!(f, "module binary {} is malformed: {source}", path.display())
            }
            Self::BuildCommand { command, status: Some(code), .. } => {
                write!(f, "module build command `{command}` exited with status {code}")
            }
            Self::BuildCommand { command, status: None, detail } => {
                write!(f, "module build command `{command}` failed: {detail}")
            }
            Self::Io { context, source } => write!(f, "{context}: {source}"),
        }
    }
}

impl std::error::Error for PackageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedBinary { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure to assemble or verify a bundle.
///
/// Assembly is all-or-nothing: when one of these is returned, no new output
/// directory has been put in place.
#[derive(Debug)]
pub enum AssemblyError {
    MissingStaticDir(PathBuf),
    MissingEntry(PathBuf),
    /// The entry script reaches the compiled module through a static import.
    SynchronousModuleImport { specifier: String, line: usize },
    /// A shader import survived into the entry script.
    UnresolvedShader { specifier: String, line: usize, reason: &'static str },
    /// The entry script never loads the module glue through `import()`.
    ModuleUnreachable,
    /// A static asset would overwrite a generated artifact.
    AssetCollision(String),
    InvalidLayout(String),
    /// `bundle.json` lists an artifact that is not on disk.
    MissingArtifact(String),
    DigestMismatch { path: String, expected: String, actual: String },
    Manifest(String),
    Io { context: String, source: io::Error },
}

impl AssemblyError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStaticDir(p) => write!(f, "static asset directory not found: {}", p.display()),
            Self::MissingEntry(p) => write!(f, "entry script not found: {}", p.display()),
            Self::SynchronousModuleImport { specifier, line } => write!(
                f,
                "entry script line {line}: `{specifier}` is imported statically; \
                 the compiled module may only be loaded with import()"
            ),
            Self::UnresolvedShader { specifier, line, reason } => {
                write!(f, "entry script line {line}: shader `{specifier}` not embedded: {reason}")
            }
            Self::ModuleUnreachable => {
                write!(f, "entry script never loads the module glue through import()")
            }
            Self::AssetCollision(p) => {
                write!(f, "static asset `{p}` collides with a generated bundle artifact")
            }
            Self::InvalidLayout(msg) => write!(f, "invalid build layout: {msg}"),
            Self::MissingArtifact(p) => write!(f, "bundle artifact missing: {p}"),
            Self::DigestMismatch { path, expected, actual } => {
                write!(f, "bundle artifact {path} changed: expected sha256 {expected}, found {actual}")
            }
            Self::Manifest(msg) => write!(f, "bundle manifest: {msg}"),
            Self::Io { context, source } => write!(f, "{context}: {source}"),
        }
    }
}

impl std::error::Error for AssemblyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
