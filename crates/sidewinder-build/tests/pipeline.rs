//! End-to-end: build a bundle, then boot a fake module from what it embeds.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use sidewinder_boot::{
    AcquisitionError, Application, BootError, BootState, Diagnostics, FnLoader, InitError, Module,
};
use sidewinder_build::entry::{scan_imports, ImportKind};
use sidewinder_build::pipeline::{self, BuildOptions};
use sidewinder_build::{check_bundle, BuildConfig};
use walkdir::WalkDir;

const EMPTY_MODULE: [u8; 8] = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

const CONFIG: &str = r#"
[paths]
output = "pack"
static = "static"

[module]
dir = "build"
name = "index"

[shaders]
vertex = "shaders/vertex.glsl"
fragment = "shaders/fragment.glsl"
"#;

fn write(root: &Path, rel: &str, bytes: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

fn project(vertex: &str, fragment: Option<&str>) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "Sidewinder.toml", CONFIG.as_bytes());
    write(root, "static/index.html", b"<canvas></canvas><script src=\"index.js\"></script>");
    write(root, "build/index.js", b"export function init(vertex, fragment) {}");
    write(root, "build/index_bg.wasm", &EMPTY_MODULE);
    write(root, "shaders/vertex.glsl", vertex.as_bytes());
    if let Some(fragment) = fragment {
        write(root, "shaders/fragment.glsl", fragment.as_bytes());
    }
    dir
}

fn build(root: &Path) -> anyhow::Result<sidewinder_build::Bundle> {
    let config = BuildConfig::load(root.join("Sidewinder.toml"))?;
    pipeline::run(&config, &BuildOptions::default())
}

type Calls = Rc<RefCell<Vec<(String, String)>>>;

struct FakeModule(Calls);

impl Module for FakeModule {
    fn init(&mut self, vertex: &str, fragment: &str) -> Result<(), InitError> {
        self.0.borrow_mut().push((vertex.to_string(), fragment.to_string()));
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<String>>>);

impl Diagnostics for Recorder {
    fn report(&mut self, error: &BootError) {
        self.0.borrow_mut().push(error.to_string());
    }
}

/// Boots a fake module with the shader text the bundled entry script embeds.
fn boot_from_bundle(root: &Path) -> Vec<(String, String)> {
    let report = check_bundle(root.join("pack")).unwrap();
    let shaders = report.shaders.expect("entry script embeds shader constants");

    let calls = Calls::default();
    let module_calls = calls.clone();
    let mut app = Application::new(
        FnLoader::new(move || async move { Ok::<_, AcquisitionError>(FakeModule(module_calls)) }),
        shaders,
    );
    assert_eq!(app.run(), BootState::Initialized);

    calls.borrow().clone()
}

#[test]
fn init_receives_exact_shader_text() {
    let p = project("A", Some("B"));
    build(p.path()).unwrap();

    assert_eq!(boot_from_bundle(p.path()), vec![("A".to_string(), "B".to_string())]);
}

#[test]
fn shader_text_survives_byte_for_byte() {
    let vertex = "#version 100\r\nattribute vec3 a_pos; // \"quoted\" \\ back\tslash\n\n";
    let fragment = "precision mediump float;\nuniform vec4 u_color; /* ünïcødé ✓ */\nvoid main(){gl_FragColor=u_color;}";
    let p = project(vertex, Some(fragment));
    build(p.path()).unwrap();

    assert_eq!(boot_from_bundle(p.path()), vec![(vertex.to_string(), fragment.to_string())]);
}

#[test]
fn missing_fragment_shader_aborts_without_output() {
    let p = project("A", None);
    let err = build(p.path()).unwrap_err();

    assert!(format!("{err:#}").contains("fragment shader not found"));
    assert!(!p.path().join("pack").exists());
}

#[test]
fn missing_module_package_aborts_without_output() {
    let p = project("A", Some("B"));
    fs::remove_file(p.path().join("build/index_bg.wasm")).unwrap();

    let err = build(p.path()).unwrap_err();
    assert!(format!("{err:#}").contains("module binary"));
    assert!(!p.path().join("pack").exists());
}

#[test]
fn entry_never_statically_references_module() {
    let p = project("A", Some("B"));
    let bundle = build(p.path()).unwrap();

    let entry = fs::read_to_string(p.path().join("pack/index.js")).unwrap();
    let imports = scan_imports(&entry);

    assert!(imports.iter().all(|i| !i.kind.is_synchronous()));
    assert!(imports
        .iter()
        .any(|i| i.kind == ImportKind::Dynamic && i.specifier == format!("./{}", bundle.manifest.module_glue)));
    assert!(!entry.contains(".wasm"));
}

#[test]
fn rebuild_is_byte_identical() {
    let p = project("A", Some("B"));
    build(p.path()).unwrap();
    let first = snapshot(&p.path().join("pack"));
    build(p.path()).unwrap();
    let second = snapshot(&p.path().join("pack"));

    assert_eq!(first, second);
}

#[test]
fn failed_acquisition_never_calls_init() {
    let p = project("A", Some("B"));
    build(p.path()).unwrap();
    let shaders = check_bundle(p.path().join("pack")).unwrap().shaders.unwrap();

    let attempts = Rc::new(Cell::new(0));
    let diag = Recorder::default();
    let loader_attempts = attempts.clone();
    let mut app = Application::new(
        FnLoader::new(move || async move {
            loader_attempts.set(loader_attempts.get() + 1);
            Err::<FakeModule, _>(AcquisitionError::transport("HTTP 404 for pkg/index_bg.wasm"))
        }),
        shaders,
    )
    .diagnostics(diag.clone());

    assert_eq!(app.run(), BootState::Failed);
    assert_eq!(attempts.get(), 1);
    assert!(app.module().is_none());
    assert_eq!(diag.0.borrow().len(), 1);
}

#[test]
fn output_over_shader_dir_keeps_shaders() {
    let p = project("A", Some("B"));
    let config = CONFIG.replace("output = \"pack\"", "output = \"shaders\"");
    write(p.path(), "Sidewinder.toml", config.as_bytes());

    let err = build(p.path()).unwrap_err();
    assert!(format!("{err:#}").contains("lies inside the output directory"));
    assert_eq!(fs::read_to_string(p.path().join("shaders/vertex.glsl")).unwrap(), "A");
    assert_eq!(fs::read_to_string(p.path().join("shaders/fragment.glsl")).unwrap(), "B");

    // The layout error leaves the project buildable once the output moves.
    write(p.path(), "Sidewinder.toml", CONFIG.as_bytes());
    build(p.path()).unwrap();
}

fn snapshot(root: &Path) -> Vec<(String, Vec<u8>)> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .map(Result::unwrap)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_string_lossy().into_owned();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}
