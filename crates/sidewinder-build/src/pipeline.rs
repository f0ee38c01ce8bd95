//! The build as an explicit ordered pipeline:
//! `resolve_shaders -> package_module -> assemble_bundle`.
//!
//! Each step only consumes the outputs of the steps before it, so a failure
//! anywhere stops the build before anything is written to the output.

use anyhow::{Context, Result};
use sidewinder_assets::{resolve, ResolveError, ShaderKind, ShaderPair};

use crate::assemble::{assemble, Bundle};
use crate::config::BuildConfig;
use crate::error::{AssemblyError, PackageError};
use crate::package::{self, ModulePackage};

/// Knobs for a single build invocation.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Package whatever is already in the module directory instead of running
    /// `module.build_command` first.
    pub skip_module_build: bool,
}

/// Reads both configured shaders as text.
pub fn resolve_shaders(config: &BuildConfig) -> Result<ShaderPair, ResolveError> {
    let vertex = resolve(&config.shaders.vertex, ShaderKind::Vertex)?;
    let fragment = resolve(&config.shaders.fragment, ShaderKind::Fragment)?;
    Ok(ShaderPair { vertex, fragment })
}

/// Builds (unless skipped) and collects the compiled module.
pub fn package_module(config: &BuildConfig, options: &BuildOptions) -> Result<ModulePackage, PackageError> {
    if !options.skip_module_build {
        package::build_module(config)?;
    }
    package::package_module(config)
}

pub fn assemble_bundle(
    config: &BuildConfig,
    shaders: &ShaderPair,
    package: &ModulePackage,
) -> Result<Bundle, AssemblyError> {
    assemble(config, shaders, package)
}

/// Runs the whole build.
pub fn run(config: &BuildConfig, options: &BuildOptions) -> Result<Bundle> {
    let shaders = resolve_shaders(config).context("failed to resolve shader sources")?;
    log::debug!(
        "resolved shaders: vertex {} bytes, fragment {} bytes",
        shaders.vertex.text().len(),
        shaders.fragment.text().len()
    );

    let package = package_module(config, options).context("failed to package module")?;

    assemble_bundle(config, &shaders, &package).context("failed to assemble bundle")
}
