//! Runtime bootstrap for sidewinder.
//!
//! Startup is a single ordered sequence:
//! 1. acquire the compiled module asynchronously (fetch + instantiate)
//! 2. call its `init` entry point once with the vertex and fragment shader text
//!
//! The loader, shader source and failure sink are all injected, so hosts and
//! tests can swap any of them without process-wide side effects.

mod app;
mod diagnostics;
mod error;
mod loader;
mod module;
mod shaders;

pub use app::{Application, BootState};
pub use diagnostics::{Diagnostics, LogDiagnostics};
pub use error::{AcquisitionError, AcquisitionErrorKind, BootError, InitError};
pub use loader::{FileModuleLoader, FnLoader, ModuleLoader};
pub use module::Module;
pub use shaders::{EmbeddedShaders, ShaderProvider};

pub use sidewinder_assets::{ShaderKind, ShaderPair, ShaderSource};
