//! Build pipeline for sidewinder.
//!
//! Turns a project (entry script, compiled module package, shader files and a
//! static asset tree) into one deployable directory in which the compiled
//! module is only ever reachable through an asynchronous `import()`.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`config`] | `BuildConfig` (`Sidewinder.toml`) |
//! | [`package`] | module build command, `ModulePackage` |
//! | [`entry`] | entry script import scanning, rewriting, verification |
//! | [`assemble`] | staged, all-or-nothing bundle assembly; `check_bundle` |
//! | [`manifest`] | `bundle.json` |
//! | [`pipeline`] | `resolve_shaders -> package_module -> assemble_bundle` |
//! | [`logging`] | `env_logger` setup for binaries |

pub mod assemble;
pub mod config;
pub mod entry;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod package;
pub mod pipeline;

mod fsutil;

pub use assemble::{check_bundle, Bundle, BundleReport};
pub use config::BuildConfig;
pub use error::{AssemblyError, PackageError};
pub use manifest::BundleManifest;
pub use package::ModulePackage;
pub use pipeline::BuildOptions;
