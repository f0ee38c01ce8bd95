//! Build configuration (`Sidewinder.toml`).
//!
//! ```toml
//! [paths]
//! entry  = "js/bootstrap.js"   # optional, default glue is generated
//! output = "pack"
//! static = "static"
//!
//! [module]
//! dir  = "build"
//! name = "index"
//! build_command = ["wasm-pack", "build", "--target", "web", "--out-dir", "build"]
//!
//! [shaders]
//! vertex   = "shaders/vertex.glsl"
//! fragment = "shaders/fragment.glsl"
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::fsutil::normalize;

pub const DEFAULT_CONFIG_FILE: &str = "Sidewinder.toml";

/// Configuration for one build invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub module: ModuleConfig,
    pub shaders: ShadersConfig,

    /// Directory the config was loaded from. Not part of the file.
    #[serde(skip)]
    pub root: PathBuf,
}

/// The three directory roles of a build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Entry script template. `None` generates the default bootstrap glue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<PathBuf>,

    #[serde(default = "default_output")]
    pub output: PathBuf,

    #[serde(rename = "static", default = "default_static")]
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Directory holding the compiled module and its glue.
    #[serde(default = "default_module_dir")]
    pub dir: PathBuf,

    /// Base name: glue is `<name>.js`, binary is `<name>_bg.wasm`.
    #[serde(default = "default_module_name")]
    pub name: String,

    /// Command that (re)builds the module into `dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_command: Option<Vec<String>>,

    /// Working directory for `build_command`. Defaults to the config root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crate_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadersConfig {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

fn default_output() -> PathBuf {
    PathBuf::from("pack")
}

fn default_static() -> PathBuf {
    PathBuf::from("static")
}

fn default_module_dir() -> PathBuf {
    PathBuf::from("build")
}

fn default_module_name() -> String {
    "index".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self { entry: None, output: default_output(), static_dir: default_static() }
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            dir: default_module_dir(),
            name: default_module_name(),
            build_command: None,
            crate_dir: None,
        }
    }
}

impl ModuleConfig {
    pub fn glue_file(&self) -> String {
        format!("{}.js", self.name)
    }

    pub fn binary_file(&self) -> String {
        format!("{}_bg.wasm", self.name)
    }
}

impl BuildConfig {
    /// Reads and parses a config file; relative paths resolve against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read build config {}", path.display()))?;

        let root = path.parent().unwrap_or_else(|| Path::new("."));
        let root = std::path::absolute(root)
            .with_context(|| format!("failed to resolve config directory {}", root.display()))?;

        Self::parse(&src, root).with_context(|| format!("invalid build config {}", path.display()))
    }

    /// Parses config text with `root` as the base for relative paths.
    pub fn parse(src: &str, root: impl Into<PathBuf>) -> Result<Self> {
        let mut config: BuildConfig = toml::from_str(src).context("failed to parse TOML")?;
        config.root = normalize(&root.into());
        config.resolve_paths();
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self) {
        let root = self.root.clone();
        let join = |p: &mut PathBuf| *p = normalize(&root.join(&*p));

        if let Some(entry) = self.paths.entry.as_mut() {
            join(entry);
        }
        join(&mut self.paths.output);
        join(&mut self.paths.static_dir);
        join(&mut self.module.dir);
        if let Some(dir) = self.module.crate_dir.as_mut() {
            join(dir);
        }
        join(&mut self.shaders.vertex);
        join(&mut self.shaders.fragment);
    }

    fn validate(&self) -> Result<()> {
        let name = &self.module.name;
        anyhow::ensure!(!name.is_empty(), "module.name must not be empty");
        anyhow::ensure!(
            !name.contains(['/', '\\']) && name != "." && name != "..",
            "module.name `{name}` must be a plain file stem"
        );

        if let Some(cmd) = &self.module.build_command {
            anyhow::ensure!(!cmd.is_empty(), "module.build_command must name a program");
        }

        anyhow::ensure!(
            self.paths.output != self.root,
            "paths.output must not be the project root"
        );

        Ok(())
    }

    /// Working directory for the module build command.
    pub fn crate_dir(&self) -> &Path {
        self.module.crate_dir.as_deref().unwrap_or(&self.root)
    }
}
