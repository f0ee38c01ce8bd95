//! Entry script analysis and rewriting.
//!
//! The entry script is the only file the page loads synchronously. It must
//! reach the compiled module exclusively through a dynamic `import()`, and
//! it must carry the shader text as string constants rather than imports.
//!
//! Import detection is lexical. `import … from`, bare `import "…"` and
//! `export … from` count when they start a statement (line start, or after
//! `;`, `}` or a block comment); `import("…")` counts anywhere.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use sidewinder_assets::{ShaderKind, ShaderPair};

use crate::error::AssemblyError;
use crate::fsutil::normalize;

/// Directory, relative to the bundle root, that holds the module package.
pub const MODULE_DIR: &str = "pkg";

const SHADER_EXTENSIONS: &[&str] = &["glsl", "vert", "frag", "vs", "fs"];

static STATIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\bimport\b\s*(?:(?P<clause>[\w$\s{},*]+?)\s*from\s*)?["'](?P<spec>[^"'\r\n]+)["'][ \t]*;?"#,
    )
    .expect("static import pattern")
});

static RE_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\bexport\b\s*(?P<clause>[\w$\s{},*]+?)\s*from\s*["'](?P<spec>[^"'\r\n]+)["'][ \t]*;?"#,
    )
    .expect("re-export pattern")
});

static DYNAMIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\(\s*["'](?P<spec>[^"'\r\n]+)["']\s*\)"#).expect("dynamic import pattern")
});

static IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][\w$]*$").expect("identifier pattern"));

static INIT_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.init\(\s*(?P<vertex>[A-Za-z_$][\w$]*)\s*,\s*(?P<fragment>[A-Za-z_$][\w$]*)\s*\)")
        .expect("init call pattern")
});

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ImportKind {
    /// `import x from "…"` or `import "…"`; evaluated before the script runs.
    Static,
    /// `export … from "…"`; also a static dependency.
    ReExport,
    /// `import("…")`; resolved asynchronously at run time.
    Dynamic,
}

impl ImportKind {
    pub fn is_synchronous(self) -> bool {
        !matches!(self, Self::Dynamic)
    }
}

/// One import found in an entry script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRef {
    pub kind: ImportKind,
    pub specifier: String,
    /// Default-import binding name, when the clause is a single identifier.
    pub binding: Option<String>,
    /// 1-based line of the import.
    pub line: usize,
    span: Range<usize>,
}

/// Lists every import in `src`, in source order.
pub fn scan_imports(src: &str) -> Vec<ImportRef> {
    let mut found = Vec::new();

    for (re, kind) in [(&*STATIC_IMPORT, ImportKind::Static), (&*RE_EXPORT, ImportKind::ReExport)] {
        let mut at = 0;
        while let Some(caps) = re.captures_at(src, at) {
            let Some(whole) = caps.get(0) else { break };
            if !starts_statement(src, whole.start()) {
                // Resume inside the rejected match; it may hide a real import.
                at = whole.start() + 1;
                continue;
            }
            at = whole.end();
            let binding = caps
                .name("clause")
                .map(|c| c.as_str().trim())
                .filter(|c| kind == ImportKind::Static && IDENT.is_match(c))
                .map(str::to_string);
            found.push(ImportRef {
                kind,
                specifier: caps["spec"].to_string(),
                binding,
                line: line_of(src, whole.start()),
                span: whole.range(),
            });
        }
    }

    for caps in DYNAMIC_IMPORT.captures_iter(src) {
        let Some(whole) = caps.get(0) else { continue };
        found.push(ImportRef {
            kind: ImportKind::Dynamic,
            specifier: caps["spec"].to_string(),
            binding: None,
            line: line_of(src, whole.start()),
            span: whole.range(),
        });
    }

    found.sort_by_key(|i| i.span.start);
    found
}

/// Whether a declaration at `offset` would begin a new statement.
fn starts_statement(src: &str, offset: usize) -> bool {
    let before = src[..offset].trim_end_matches([' ', '\t']);
    before.is_empty() || before.ends_with(['\n', '\r', ';', '}']) || before.ends_with("*/")
}

fn line_of(src: &str, offset: usize) -> usize {
    src[..offset].bytes().filter(|&b| b == b'\n').count() + 1
}

/// What an import specifier points at.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Target {
    /// One of the configured shader files.
    Shader(ShaderKind),
    /// A shader-looking file that is not configured.
    UnknownShader,
    ModuleGlue,
    /// Any other file of the module package, or any `.wasm` file.
    ModuleArtifact,
    Other,
}

/// Maps import specifiers to files for one entry script.
#[derive(Debug, Clone)]
pub struct Resolver {
    base: PathBuf,
    vertex: Option<PathBuf>,
    fragment: Option<PathBuf>,
    module_dir: PathBuf,
    glue: PathBuf,
}

impl Resolver {
    /// `base` is the entry script's directory; `module_dir` holds `glue_file`.
    pub fn new(base: &Path, module_dir: &Path, glue_file: &str) -> Self {
        let module_dir = normalize(module_dir);
        Self {
            base: normalize(base),
            vertex: None,
            fragment: None,
            glue: module_dir.join(glue_file),
            module_dir,
        }
    }

    pub fn with_shaders(mut self, vertex: &Path, fragment: &Path) -> Self {
        self.vertex = Some(normalize(vertex));
        self.fragment = Some(normalize(fragment));
        self
    }

    pub fn classify(&self, specifier: &str) -> Target {
        let ext = Path::new(specifier).extension().and_then(|e| e.to_str()).unwrap_or("");

        if ext.eq_ignore_ascii_case("wasm") {
            return Target::ModuleArtifact;
        }

        let relative = specifier.starts_with("./") || specifier.starts_with("../");
        let absolute = specifier.starts_with('/');
        if !relative && !absolute {
            // Bare package specifier, resolved by whoever serves node_modules.
            return Target::Other;
        }

        let resolved = if absolute {
            normalize(Path::new(specifier))
        } else {
            normalize(&self.base.join(specifier))
        };

        if self.vertex.as_ref() == Some(&resolved) {
            return Target::Shader(ShaderKind::Vertex);
        }
        if self.fragment.as_ref() == Some(&resolved) {
            return Target::Shader(ShaderKind::Fragment);
        }
        if resolved == self.glue {
            return Target::ModuleGlue;
        }
        if resolved.starts_with(&self.module_dir) {
            return Target::ModuleArtifact;
        }
        if SHADER_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s)) {
            return Target::UnknownShader;
        }
        Target::Other
    }
}

/// Produces the bundled entry script from a template.
///
/// Default imports of the configured shaders become string constants, and
/// dynamic imports of the module glue are pointed at `./pkg/<glue>`.
pub fn rewrite(
    src: &str,
    resolver: &Resolver,
    shaders: &ShaderPair,
    glue_file: &str,
) -> Result<String, AssemblyError> {
    let glue_specifier = js_string(&format!("./{MODULE_DIR}/{glue_file}"));

    let mut out = String::with_capacity(
        src.len() + shaders.vertex.text().len() + shaders.fragment.text().len(),
    );
    let mut cursor = 0;
    let mut reaches_module = false;

    for imp in scan_imports(src) {
        if imp.span.start < cursor {
            continue;
        }
        out.push_str(&src[cursor..imp.span.start]);
        cursor = imp.span.end;

        let original = &src[imp.span.clone()];
        match (imp.kind, resolver.classify(&imp.specifier)) {
            (ImportKind::Dynamic, Target::ModuleGlue) => {
                reaches_module = true;
                out.push_str(&format!("import({glue_specifier})"));
            }
            (ImportKind::Dynamic, _) => out.push_str(original),
            (_, Target::ModuleGlue | Target::ModuleArtifact) => {
                return Err(AssemblyError::SynchronousModuleImport {
                    specifier: imp.specifier,
                    line: imp.line,
                });
            }
            (ImportKind::Static, Target::Shader(kind)) => {
                let Some(binding) = imp.binding.as_deref() else {
                    return Err(AssemblyError::UnresolvedShader {
                        specifier: imp.specifier,
                        line: imp.line,
                        reason: "only `import name from \"…\"` can be embedded",
                    });
                };
                log::debug!("embedding {kind} shader as `{binding}`");
                out.push_str(&format!("const {binding} = {};", js_string(shaders.get(kind).text())));
            }
            (_, Target::Shader(_) | Target::UnknownShader) => {
                return Err(AssemblyError::UnresolvedShader {
                    specifier: imp.specifier,
                    line: imp.line,
                    reason: "not one of the configured vertex/fragment shaders",
                });
            }
            (_, Target::Other) => out.push_str(original),
        }
    }
    out.push_str(&src[cursor..]);

    if !reaches_module {
        return Err(AssemblyError::ModuleUnreachable);
    }
    Ok(out)
}

/// Bootstrap glue used when no entry template is configured.
pub fn default_entry(shaders: &ShaderPair, glue_file: &str) -> String {
    let (vertex, fragment) = shaders.as_args();
    format!(
        "// generated by sidewinder\n\
         const VERTEX_SHADER_SRC = {vertex};\n\
         const FRAGMENT_SHADER_SRC = {fragment};\n\
         \n\
         // the module graph contains wasm, so it is only ever loaded through import()\n\
         import({glue})\n  \
           .then(module => module.init(VERTEX_SHADER_SRC, FRAGMENT_SHADER_SRC))\n  \
           .catch(console.error);\n",
        vertex = js_string(vertex),
        fragment = js_string(fragment),
        glue = js_string(&format!("./{MODULE_DIR}/{glue_file}")),
    )
}

/// Checks the load-order invariant on an already bundled entry script.
pub fn verify(src: &str, resolver: &Resolver) -> Result<(), AssemblyError> {
    let mut reaches_module = false;

    for imp in scan_imports(src) {
        match (imp.kind, resolver.classify(&imp.specifier)) {
            (ImportKind::Dynamic, Target::ModuleGlue) => reaches_module = true,
            (ImportKind::Dynamic, _) | (_, Target::Other) => {}
            (_, Target::ModuleGlue | Target::ModuleArtifact) => {
                return Err(AssemblyError::SynchronousModuleImport {
                    specifier: imp.specifier,
                    line: imp.line,
                });
            }
            (_, Target::Shader(_) | Target::UnknownShader) => {
                return Err(AssemblyError::UnresolvedShader {
                    specifier: imp.specifier,
                    line: imp.line,
                    reason: "bundled entry still imports shader files",
                });
            }
        }
    }

    if reaches_module { Ok(()) } else { Err(AssemblyError::ModuleUnreachable) }
}

/// Recovers the shader text an entry script passes to `module.init(…)`.
///
/// Returns `None` unless the script calls `.init(a, b)` with two identifiers
/// that are both bound to string-literal constants.
pub fn embedded_shaders(src: &str) -> Option<ShaderPair> {
    let caps = INIT_CALL.captures(src)?;
    let vertex = const_string(src, &caps["vertex"])?;
    let fragment = const_string(src, &caps["fragment"])?;
    Some(ShaderPair::from_text(vertex, fragment))
}

fn const_string(src: &str, name: &str) -> Option<String> {
    let pattern = format!(r#"\bconst\s+{}\s*=\s*(?P<lit>"(?:[^"\\]|\\.)*")\s*;"#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(src)?;
    serde_json::from_str(&caps["lit"]).ok()
}

/// JSON string literals are valid JavaScript string literals.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
