//! Module packager.
//!
//! Collects the compiled module and its loader glue from the module build
//! directory, optionally running the module build command first. The result
//! is held in memory so assembly can write it into a staging directory.

use std::path::{Path, PathBuf};
use std::process::Command;

use sidewinder_assets::check_module_header;
use walkdir::WalkDir;

use crate::config::BuildConfig;
use crate::error::PackageError;
use crate::fsutil::slash_path;

/// A file destined for the bundle, with its path relative to its group root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub rel_path: String,
    pub bytes: Vec<u8>,
}

/// The compiled module plus everything its glue needs at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePackage {
    pub name: String,
    /// `<name>.js`, the only file the entry script may load (dynamically).
    pub glue: Artifact,
    /// `<name>_bg.wasm`.
    pub binary: Artifact,
    /// Extra glue files (`<name>_bg.js`, `snippets/**`), sorted by path.
    pub support: Vec<Artifact>,
}

impl ModulePackage {
    /// Every artifact, glue first, binary second, then support files.
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        [&self.glue, &self.binary].into_iter().chain(self.support.iter())
    }
}

/// Runs the configured module build command, if any.
pub fn build_module(config: &BuildConfig) -> Result<(), PackageError> {
    let Some(cmd) = config.module.build_command.as_ref() else {
        log::debug!("no module build command configured");
        return Ok(());
    };
    let Some((program, args)) = cmd.split_first() else {
        return Ok(());
    };

    let shown = cmd.join(" ");
    log::info!("building module: {shown}");

    let status = Command::new(program)
        .args(args)
        .current_dir(config.crate_dir())
        .status()
        .map_err(|e| PackageError::BuildCommand {
            command: shown.clone(),
            status: None,
            detail: e.to_string(),
        })?;

    if !status.success() {
        return Err(PackageError::BuildCommand {
            command: shown,
            status: status.code(),
            detail: status.to_string(),
        });
    }

    Ok(())
}

/// Reads the module package from `config.module.dir`.
pub fn package_module(config: &BuildConfig) -> Result<ModulePackage, PackageError> {
    let dir = &config.module.dir;
    let glue_name = config.module.glue_file();
    let binary_name = config.module.binary_file();

    let glue_path = dir.join(&glue_name);
    let binary_path = dir.join(&binary_name);

    let glue = read_required(&glue_path, "loader glue")?;
    let binary = read_required(&binary_path, "module binary")?;

    check_module_header(&binary)
        .map_err(|source| PackageError::MalformedBinary { path: binary_path.clone(), source })?;

    let support = collect_support(dir, &config.module.name)?;

    log::debug!(
        "packaged module `{}`: glue {} bytes, binary {} bytes, {} support file(s)",
        config.module.name,
        glue.len(),
        binary.len(),
        support.len()
    );

    Ok(ModulePackage {
        name: config.module.name.clone(),
        glue: Artifact { rel_path: glue_name, bytes: glue },
        binary: Artifact { rel_path: binary_name, bytes: binary },
        support,
    })
}

fn read_required(path: &Path, role: &'static str) -> Result<Vec<u8>, PackageError> {
    if !path.is_file() {
        return Err(PackageError::MissingArtifact { role, path: path.to_path_buf() });
    }
    std::fs::read(path).map_err(|e| PackageError::io(format!("failed to read {}", path.display()), e))
}

fn collect_support(dir: &Path, name: &str) -> Result<Vec<Artifact>, PackageError> {
    let bg_glue = format!("{name}_bg.js");
    let mut paths: Vec<PathBuf> = Vec::new();

    let bg = dir.join(&bg_glue);
    if bg.is_file() {
        paths.push(bg);
    }

    let snippets = dir.join("snippets");
    if snippets.is_dir() {
        for entry in WalkDir::new(&snippets).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let msg = format!("failed to walk {}", snippets.display());
                PackageError::io(msg, e.into())
            })?;
            if entry.file_type().is_file() {
                paths.push(entry.into_path());
            }
        }
    }

    paths
        .into_iter()
        .map(|p| {
            let rel = p.strip_prefix(dir).unwrap_or(&p);
            let bytes = std::fs::read(&p)
                .map_err(|e| PackageError::io(format!("failed to read {}", p.display()), e))?;
            Ok(Artifact { rel_path: slash_path(rel), bytes })
        })
        .collect()
}
