//! Build-time assets for **sidewinder**: shader sources and module binaries.
//!
//! Shared by the build pipeline (`sidewinder-build`) and the bootstrap
//! runtime (`sidewinder-boot`).
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`shader`] | `ShaderKind`, `ShaderSource`, `ShaderPair`, `resolve` |
//! | [`binary`] | module binary header check |
//! | [`error`] | `ResolveError`, `BinaryError` |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use sidewinder_assets::{resolve, ShaderKind};
//!
//! let vertex = resolve("shaders/vertex.glsl", ShaderKind::Vertex).unwrap();
//! assert_eq!(vertex.kind(), ShaderKind::Vertex);
//! ```

pub mod binary;
pub mod error;
pub mod shader;

pub use binary::check_module_header;
pub use error::{BinaryError, ResolveError};
pub use shader::{resolve, ShaderKind, ShaderPair, ShaderSource};
