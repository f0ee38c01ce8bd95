//! `bundle.json`: the list of artifacts a bundle is made of.
//!
//! Paths are `/`-separated and relative to the bundle root. Entries are kept
//! sorted and carry no timestamps, so an unchanged build writes an identical
//! manifest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fsutil::sha256_hex;

pub const MANIFEST_FILE: &str = "bundle.json";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactRole {
    Entry,
    ModuleGlue,
    ModuleBinary,
    ModuleSupport,
    Static,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub role: ArtifactRole,
    pub size: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Entry script path (always `index.js`).
    pub entry: String,
    /// Module glue path, reachable from the entry only through `import()`.
    pub module_glue: String,
    pub module_binary: String,
    pub artifacts: BTreeMap<String, ArtifactRecord>,
}

impl BundleManifest {
    pub fn new(entry: &str, module_glue: &str, module_binary: &str) -> Self {
        Self {
            entry: entry.to_string(),
            module_glue: module_glue.to_string(),
            module_binary: module_binary.to_string(),
            artifacts: BTreeMap::new(),
        }
    }

    /// Records `bytes` under `path`.
    pub fn record(&mut self, path: &str, role: ArtifactRole, bytes: &[u8]) {
        self.artifacts.insert(
            path.to_string(),
            ArtifactRecord { role, size: bytes.len() as u64, sha256: sha256_hex(bytes) },
        );
    }

    pub fn count(&self, role: ArtifactRole) -> usize {
        self.artifacts.values().filter(|a| a.role == role).count()
    }

    pub fn to_json(&self) -> String {
        let mut s = serde_json::to_string_pretty(self).unwrap_or_default();
        s.push('\n');
        s
    }

    pub fn from_json(src: &str) -> serde_json::Result<Self> {
        serde_json::from_str(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_sorted_by_path() {
        let mut m = BundleManifest::new("index.js", "pkg/index.js", "pkg/index_bg.wasm");
        m.record("z.css", ArtifactRole::Static, b"z");
        m.record("index.js", ArtifactRole::Entry, b"i");
        m.record("a.png", ArtifactRole::Static, b"a");

        let keys: Vec<_> = m.artifacts.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a.png", "index.js", "z.css"]);
        assert_eq!(m.count(ArtifactRole::Static), 2);
    }

    #[test]
    fn json_uses_snake_case_roles() {
        let mut m = BundleManifest::new("index.js", "pkg/index.js", "pkg/index_bg.wasm");
        m.record("pkg/index_bg.wasm", ArtifactRole::ModuleBinary, b"");
        let json = m.to_json();
        assert!(json.contains("\"module_binary\""));
        assert_eq!(BundleManifest::from_json(&json).unwrap(), m);
    }
}
