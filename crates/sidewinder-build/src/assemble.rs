//! Bundle assembler.
//!
//! Output layout:
//!
//! ```text
//! <output>/
//! ├── index.js              entry script, shader text embedded
//! ├── bundle.json           artifact manifest
//! ├── pkg/
//! │   ├── <name>.js         module glue, loaded only through import()
//! │   ├── <name>_bg.wasm    module binary
//! │   └── …                 support glue
//! └── …                     static asset tree, copied verbatim
//! ```
//!
//! Everything is written to a staging directory next to `<output>` and
//! renamed into place at the end. A failed assembly removes the staging
//! directory and leaves any previous output untouched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sidewinder_assets::ShaderPair;
use walkdir::WalkDir;

use crate::config::BuildConfig;
use crate::entry::{self, Resolver, MODULE_DIR};
use crate::error::AssemblyError;
use crate::fsutil::{sha256_hex, slash_path, write_file};
use crate::manifest::{ArtifactRole, BundleManifest, MANIFEST_FILE};
use crate::package::ModulePackage;

pub const ENTRY_FILE: &str = "index.js";

const STAGING_PREFIX: &str = ".sidewinder-staging-";

/// A bundle that has been put in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub root: PathBuf,
    pub manifest: BundleManifest,
}

/// What [`check_bundle`] found in a bundle directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleReport {
    pub manifest: BundleManifest,
    /// Shader text the entry script hands to `init`, when recognizable.
    pub shaders: Option<ShaderPair>,
}

enum StaticEntry {
    Dir(String),
    File { rel: String, src: PathBuf },
}

/// Assembles the bundle into `config.paths.output`.
pub fn assemble(
    config: &BuildConfig,
    shaders: &ShaderPair,
    package: &ModulePackage,
) -> Result<Bundle, AssemblyError> {
    let output = &config.paths.output;
    let static_dir = &config.paths.static_dir;

    if !static_dir.is_dir() {
        return Err(AssemblyError::MissingStaticDir(static_dir.clone()));
    }
    check_layout(config)?;

    let entry_src = render_entry(config, shaders, package)?;
    let assets = collect_static(static_dir)?;

    let parent = output
        .parent()
        .ok_or_else(|| AssemblyError::InvalidLayout("output directory has no parent".into()))?;
    fs::create_dir_all(parent)
        .map_err(|e| AssemblyError::io(format!("failed to create {}", parent.display()), e))?;

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(parent)
        .map_err(|e| AssemblyError::io(format!("failed to create staging dir in {}", parent.display()), e))?;

    log::debug!("staging bundle in {}", staging.path().display());
    let manifest = write_bundle(staging.path(), &entry_src, package, &assets)?;

    let staged = staging.keep();
    if let Err(e) = swap_into_place(&staged, output) {
        let _ = fs::remove_dir_all(&staged);
        return Err(e);
    }

    log::info!(
        "bundle assembled at {} ({} static asset(s))",
        output.display(),
        manifest.count(ArtifactRole::Static)
    );

    Ok(Bundle { root: output.clone(), manifest })
}

fn check_layout(config: &BuildConfig) -> Result<(), AssemblyError> {
    let output = &config.paths.output;
    let static_dir = &config.paths.static_dir;

    if output.starts_with(static_dir) {
        return Err(AssemblyError::InvalidLayout(format!(
            "output {} lies inside the static asset directory",
            output.display()
        )));
    }

    // The output is replaced wholesale, so no build input may live under it.
    let inputs = [
        ("project root", Some(&config.root)),
        ("static asset directory", Some(static_dir)),
        ("module directory", Some(&config.module.dir)),
        ("module crate directory", config.module.crate_dir.as_ref()),
        ("entry script", config.paths.entry.as_ref()),
        ("vertex shader", Some(&config.shaders.vertex)),
        ("fragment shader", Some(&config.shaders.fragment)),
    ];
    for (role, path) in inputs {
        if let Some(path) = path {
            if !path.as_os_str().is_empty() && path.starts_with(output) {
                return Err(AssemblyError::InvalidLayout(format!(
                    "{role} {} lies inside the output directory {}",
                    path.display(),
                    output.display()
                )));
            }
        }
    }
    Ok(())
}

fn render_entry(
    config: &BuildConfig,
    shaders: &ShaderPair,
    package: &ModulePackage,
) -> Result<String, AssemblyError> {
    let glue = package.glue.rel_path.as_str();

    let rendered = match &config.paths.entry {
        None => entry::default_entry(shaders, glue),
        Some(path) => {
            let src = fs::read_to_string(path).map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => AssemblyError::MissingEntry(path.clone()),
                _ => AssemblyError::io(format!("failed to read entry script {}", path.display()), e),
            })?;

            let base = path.parent().unwrap_or(Path::new("."));
            let resolver = Resolver::new(base, &config.module.dir, glue)
                .with_shaders(&config.shaders.vertex, &config.shaders.fragment);
            entry::rewrite(&src, &resolver, shaders, glue)?
        }
    };

    // Re-check against the output layout: a template import that looked
    // harmless next to its source may point into pkg/ once bundled.
    let output = &config.paths.output;
    entry::verify(&rendered, &Resolver::new(output, &output.join(MODULE_DIR), glue))?;

    Ok(rendered)
}

fn collect_static(static_dir: &Path) -> Result<Vec<StaticEntry>, AssemblyError> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(static_dir).follow_links(true).sort_by_file_name().min_depth(1) {
        let entry = entry.map_err(|e| {
            AssemblyError::io(format!("failed to walk {}", static_dir.display()), e.into())
        })?;

        let rel = slash_path(entry.path().strip_prefix(static_dir).unwrap_or(entry.path()));
        if is_reserved(&rel) {
            return Err(AssemblyError::AssetCollision(rel));
        }

        if entry.file_type().is_dir() {
            entries.push(StaticEntry::Dir(rel));
        } else {
            entries.push(StaticEntry::File { rel, src: entry.into_path() });
        }
    }

    Ok(entries)
}

fn is_reserved(rel: &str) -> bool {
    rel == ENTRY_FILE
        || rel == MANIFEST_FILE
        || rel == MODULE_DIR
        || rel.strip_prefix(MODULE_DIR).is_some_and(|rest| rest.starts_with('/'))
}

fn write_bundle(
    root: &Path,
    entry_src: &str,
    package: &ModulePackage,
    assets: &[StaticEntry],
) -> Result<BundleManifest, AssemblyError> {
    let glue_rel = format!("{MODULE_DIR}/{}", package.glue.rel_path);
    let binary_rel = format!("{MODULE_DIR}/{}", package.binary.rel_path);
    let mut manifest = BundleManifest::new(ENTRY_FILE, &glue_rel, &binary_rel);

    let mut put = |rel: &str, role: ArtifactRole, bytes: &[u8]| -> Result<(), AssemblyError> {
        write_file(&root.join(rel), bytes)
            .map_err(|e| AssemblyError::io(format!("failed to write {rel}"), e))?;
        manifest.record(rel, role, bytes);
        Ok(())
    };

    put(ENTRY_FILE, ArtifactRole::Entry, entry_src.as_bytes())?;
    put(&glue_rel, ArtifactRole::ModuleGlue, &package.glue.bytes)?;
    put(&binary_rel, ArtifactRole::ModuleBinary, &package.binary.bytes)?;
    for artifact in &package.support {
        let rel = format!("{MODULE_DIR}/{}", artifact.rel_path);
        put(&rel, ArtifactRole::ModuleSupport, &artifact.bytes)?;
    }

    for asset in assets {
        match asset {
            StaticEntry::Dir(rel) => fs::create_dir_all(root.join(rel))
                .map_err(|e| AssemblyError::io(format!("failed to create {rel}"), e))?,
            StaticEntry::File { rel, src } => {
                let bytes = fs::read(src)
                    .map_err(|e| AssemblyError::io(format!("failed to read {}", src.display()), e))?;
                put(rel, ArtifactRole::Static, &bytes)?;
            }
        }
    }

    write_file(&root.join(MANIFEST_FILE), manifest.to_json().as_bytes())
        .map_err(|e| AssemblyError::io(format!("failed to write {MANIFEST_FILE}"), e))?;

    Ok(manifest)
}

fn swap_into_place(staged: &Path, output: &Path) -> Result<(), AssemblyError> {
    let swap_err = |what: &str, e| AssemblyError::io(format!("failed to {what} {}", output.display()), e);

    if fs::symlink_metadata(output).is_err() {
        return fs::rename(staged, output).map_err(|e| swap_err("create", e));
    }

    let name = output
        .file_name()
        .ok_or_else(|| AssemblyError::InvalidLayout("output directory has no name".into()))?;
    let backup = output.with_file_name(format!(".{}.sidewinder-old", name.to_string_lossy()));

    remove_path(&backup).map_err(|e| swap_err("clear backup of", e))?;
    fs::rename(output, &backup).map_err(|e| swap_err("move aside", e))?;

    if let Err(e) = fs::rename(staged, output) {
        let _ = fs::rename(&backup, output);
        return Err(swap_err("replace", e));
    }

    if let Err(e) = remove_path(&backup) {
        log::warn!("failed to remove previous bundle {}: {e}", backup.display());
    }
    Ok(())
}

fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Re-reads a bundle and checks it against its manifest and the load-order
/// invariant.
pub fn check_bundle(root: impl AsRef<Path>) -> Result<BundleReport, AssemblyError> {
    let root = root.as_ref();

    let manifest_src = read_artifact(root, MANIFEST_FILE)?;
    let manifest_src = String::from_utf8(manifest_src)
        .map_err(|_| AssemblyError::Manifest("not valid UTF-8".into()))?;
    let manifest =
        BundleManifest::from_json(&manifest_src).map_err(|e| AssemblyError::Manifest(e.to_string()))?;

    for (path, role) in [
        (&manifest.entry, ArtifactRole::Entry),
        (&manifest.module_glue, ArtifactRole::ModuleGlue),
        (&manifest.module_binary, ArtifactRole::ModuleBinary),
    ] {
        match manifest.artifacts.get(path.as_str()) {
            Some(rec) if rec.role == role => {}
            _ => return Err(AssemblyError::Manifest(format!("`{path}` is not listed as {role:?}"))),
        }
    }

    for (path, record) in &manifest.artifacts {
        let bytes = read_artifact(root, path)?;
        let actual = sha256_hex(&bytes);
        if actual != record.sha256 {
            return Err(AssemblyError::DigestMismatch {
                path: path.clone(),
                expected: record.sha256.clone(),
                actual,
            });
        }
    }

    let entry_src = String::from_utf8(read_artifact(root, &manifest.entry)?)
        .map_err(|_| AssemblyError::Manifest(format!("{} is not valid UTF-8", manifest.entry)))?;

    let glue_path = root.join(&manifest.module_glue);
    let module_dir = glue_path.parent().unwrap_or(root);
    let glue_file = glue_path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    entry::verify(&entry_src, &Resolver::new(root, module_dir, &glue_file))?;

    let shaders = entry::embedded_shaders(&entry_src);
    Ok(BundleReport { manifest, shaders })
}

fn read_artifact(root: &Path, rel: &str) -> Result<Vec<u8>, AssemblyError> {
    let path = root.join(rel);
    fs::read(&path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => AssemblyError::MissingArtifact(rel.to_string()),
        _ => AssemblyError::io(format!("failed to read {}", path.display()), e),
    })
}
