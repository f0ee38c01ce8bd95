use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use sidewinder_assets::check_module_header;

use crate::error::AcquisitionError;
use crate::module::Module;

/// Single-shot source of the compiled module.
///
/// `acquire` consumes the loader, so one loader can start at most one
/// acquisition. The returned future covers both fetching and instantiating;
/// it is the only point where the bootstrap suspends.
pub trait ModuleLoader {
    type Module: Module;

    fn acquire(self) -> impl Future<Output = Result<Self::Module, AcquisitionError>>;
}

/// Adapts an async closure into a [`ModuleLoader`].
///
/// ```rust,ignore
/// let loader = FnLoader::new(|| async { Ok(MyModule::default()) });
/// ```
pub struct FnLoader<F>(F);

impl<F> FnLoader<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F, Fut, M> ModuleLoader for FnLoader<F>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<M, AcquisitionError>>,
    M: Module,
{
    type Module = M;

    fn acquire(self) -> impl Future<Output = Result<M, AcquisitionError>> {
        (self.0)()
    }
}

/// Loads a packaged module binary from disk.
///
/// The bytes are read asynchronously, checked for a valid module preamble,
/// and then passed to `instantiate`, which turns them into a live module.
/// Must be polled inside a Tokio runtime.
pub struct FileModuleLoader<F> {
    path: PathBuf,
    instantiate: F,
}

impl<F> FileModuleLoader<F> {
    pub fn new(path: impl Into<PathBuf>, instantiate: F) -> Self {
        Self { path: path.into(), instantiate }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<F, M> ModuleLoader for FileModuleLoader<F>
where
    F: FnOnce(Vec<u8>) -> Result<M, AcquisitionError>,
    M: Module,
{
    type Module = M;

    async fn acquire(self) -> Result<M, AcquisitionError> {
        log::debug!("fetching module binary {}", self.path.display());

        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| fetch_error(&self.path, e))?;

        check_module_header(&bytes)
            .map_err(|e| AcquisitionError::malformed(format!("{}: {e}", self.path.display())))?;

        log::debug!("instantiating module ({} bytes)", bytes.len());
        (self.instantiate)(bytes)
    }
}

fn fetch_error(path: &Path, e: io::Error) -> AcquisitionError {
    match e.kind() {
        io::ErrorKind::NotFound => {
            AcquisitionError::transport(format!("{} not found", path.display()))
        }
        _ => AcquisitionError::transport(format!("failed to read {}: {e}", path.display())),
    }
}
