use std::fmt;

use crate::diagnostics::{Diagnostics, LogDiagnostics};
use crate::error::BootError;
use crate::loader::ModuleLoader;
use crate::module::Module;
use crate::shaders::ShaderProvider;

/// Bootstrap progress.
///
/// `Initialized` and `Failed` are terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BootState {
    Idle,
    Acquiring,
    Initialized,
    Failed,
}

impl BootState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Initialized | Self::Failed)
    }
}

impl fmt::Display for BootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Acquiring => "acquiring",
            Self::Initialized => "initialized",
            Self::Failed => "failed",
        })
    }
}

/// Startup sequence for the application.
///
/// Acquires the compiled module through `L` exactly once, then calls its
/// initializer exactly once with `(vertex, fragment)` shader text. Failures
/// are reported to the diagnostics sink and are terminal: there is no retry.
///
/// ```rust,ignore
/// let mut app = Application::new(
///     FnLoader::new(|| async { Ok(GameModule::new()) }),
///     EmbeddedShaders::new(include_str!("vertex.glsl"), include_str!("fragment.glsl")),
/// );
/// app.run();
/// ```
pub struct Application<L: ModuleLoader> {
    /// Taken by the first `start`; `None` afterwards.
    loader: Option<L>,
    shaders: Box<dyn ShaderProvider>,
    diagnostics: Box<dyn Diagnostics>,

    state: BootState,
    module: Option<L::Module>,
    failure: Option<BootError>,
}

impl<L: ModuleLoader> Application<L> {
    pub fn new(loader: L, shaders: impl ShaderProvider + 'static) -> Self {
        Self {
            loader: Some(loader),
            shaders: Box::new(shaders),
            diagnostics: Box::new(LogDiagnostics),
            state: BootState::Idle,
            module: None,
            failure: None,
        }
    }

    /// Replace the failure sink (defaults to [`LogDiagnostics`]).
    pub fn diagnostics(mut self, sink: impl Diagnostics + 'static) -> Self {
        self.diagnostics = Box::new(sink);
        self
    }

    pub fn state(&self) -> BootState {
        self.state
    }

    /// The failure that ended the sequence, if it failed.
    pub fn failure(&self) -> Option<&BootError> {
        self.failure.as_ref()
    }

    /// The initialized module. `None` unless the state is `Initialized`.
    pub fn module(&self) -> Option<&L::Module> {
        self.module.as_ref()
    }

    pub fn module_mut(&mut self) -> Option<&mut L::Module> {
        self.module.as_mut()
    }

    /// Runs the startup sequence.
    ///
    /// Only the first call does anything; later calls log a warning and
    /// return the current state. Dropping the returned future before it
    /// completes leaves the application in `Acquiring` for good.
    pub async fn start(&mut self) -> BootState {
        let Some(loader) = self.loader.take() else {
            log::warn!("bootstrap already started (state: {}); ignoring", self.state);
            return self.state;
        };

        let shaders = self.shaders.shaders();

        self.state = BootState::Acquiring;
        log::debug!("acquiring module");

        let mut module = match loader.acquire().await {
            Ok(m) => m,
            Err(e) => {
                self.fail(e.into());
                return self.state;
            }
        };

        let (vertex, fragment) = shaders.as_args();
        match module.init(vertex, fragment) {
            Ok(()) => {
                log::info!("module initialized");
                self.module = Some(module);
                self.state = BootState::Initialized;
            }
            Err(e) => self.fail(e.into()),
        }

        self.state
    }

    /// Drives [`start`](Self::start) to completion on the current thread.
    ///
    /// Use `start().await` instead when the loader needs an async runtime,
    /// e.g. [`FileModuleLoader`](crate::FileModuleLoader) under Tokio.
    pub fn run(&mut self) -> BootState {
        pollster::block_on(self.start())
    }

    fn fail(&mut self, error: BootError) {
        self.diagnostics.report(&error);
        self.failure = Some(error);
        self.state = BootState::Failed;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::future::Future;
    use std::pin::Pin;
    use std::rc::Rc;
    use std::task::{Context, Poll};

    use sidewinder_assets::ShaderPair;

    use super::*;
    use crate::error::{AcquisitionError, AcquisitionErrorKind, InitError};
    use crate::loader::FnLoader;
    use crate::shaders::EmbeddedShaders;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records every `init` call into a shared event log.
    struct Recording {
        events: Log,
        fail_with: Option<&'static str>,
    }

    impl Module for Recording {
        fn init(&mut self, vertex: &str, fragment: &str) -> Result<(), InitError> {
            self.events.borrow_mut().push(format!("init({vertex}, {fragment})"));
            match self.fail_with {
                Some(msg) => Err(InitError::new(msg)),
                None => Ok(()),
            }
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl Diagnostics for Recorder {
        fn report(&mut self, error: &BootError) {
            self.0.borrow_mut().push(error.to_string());
        }
    }

    /// Pending on first poll, ready on second.
    struct YieldOnce(bool);

    impl Future for YieldOnce {
        type Output = ();
        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 {
                Poll::Ready(())
            } else {
                self.0 = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    fn ok_loader(events: Log, acquisitions: Rc<Cell<u32>>) -> impl ModuleLoader<Module = Recording> {
        FnLoader::new(move || async move {
            acquisitions.set(acquisitions.get() + 1);
            events.borrow_mut().push("acquire:begin".into());
            YieldOnce(false).await;
            events.borrow_mut().push("acquire:end".into());
            Ok::<_, AcquisitionError>(Recording { events, fail_with: None })
        })
    }

    #[test]
    fn starts_idle() {
        let events = Log::default();
        let app = Application::new(ok_loader(events, Rc::default()), ShaderPair::from_text("A", "B"));
        assert_eq!(app.state(), BootState::Idle);
        assert!(app.module().is_none());
    }

    #[test]
    fn init_receives_vertex_then_fragment() {
        let events = Log::default();
        let mut app = Application::new(
            ok_loader(events.clone(), Rc::default()),
            ShaderPair::from_text("A", "B"),
        );

        assert_eq!(app.run(), BootState::Initialized);
        assert_eq!(events.borrow().iter().filter(|e| e.starts_with("init")).count(), 1);
        assert!(events.borrow().contains(&"init(A, B)".to_string()));
        assert!(app.module().is_some());
        assert!(app.failure().is_none());
    }

    #[test]
    fn init_waits_for_acquisition() {
        let events = Log::default();
        let mut app = Application::new(
            ok_loader(events.clone(), Rc::default()),
            EmbeddedShaders::new("v", "f"),
        );
        app.run();

        assert_eq!(*events.borrow(), vec!["acquire:begin", "acquire:end", "init(v, f)"]);
    }

    #[test]
    fn second_start_does_not_reacquire_or_reinit() {
        let events = Log::default();
        let acquisitions = Rc::new(Cell::new(0));
        let mut app = Application::new(
            ok_loader(events.clone(), acquisitions.clone()),
            ShaderPair::from_text("A", "B"),
        );

        assert_eq!(app.run(), BootState::Initialized);
        assert_eq!(app.run(), BootState::Initialized);

        assert_eq!(acquisitions.get(), 1);
        assert_eq!(events.borrow().iter().filter(|e| e.starts_with("init")).count(), 1);
    }

    #[test]
    fn acquisition_failure_skips_init_and_reports_once() {
        let events = Log::default();
        let diag = Recorder::default();
        let loader_events = events.clone();
        let loader = FnLoader::new(move || async move {
            loader_events.borrow_mut().push("acquire:begin".into());
            YieldOnce(false).await;
            Err::<Recording, _>(AcquisitionError::transport("connection reset"))
        });

        let mut app = Application::new(loader, ShaderPair::from_text("A", "B"))
            .diagnostics(diag.clone());

        assert_eq!(app.run(), BootState::Failed);
        assert_eq!(*events.borrow(), vec!["acquire:begin"]);
        assert_eq!(diag.0.borrow().len(), 1);
        assert!(diag.0.borrow()[0].contains("connection reset"));
        assert!(matches!(
            app.failure(),
            Some(BootError::Acquisition(AcquisitionError { kind: AcquisitionErrorKind::Transport, .. }))
        ));
    }

    #[test]
    fn failure_is_terminal() {
        let diag = Recorder::default();
        let loader = FnLoader::new(|| async {
            Err::<Recording, _>(AcquisitionError::malformed("bad magic"))
        });
        let mut app = Application::new(loader, ShaderPair::from_text("A", "B"))
            .diagnostics(diag.clone());

        app.run();
        assert_eq!(app.run(), BootState::Failed);
        assert_eq!(diag.0.borrow().len(), 1);
        assert!(app.module().is_none());
    }

    #[test]
    fn init_error_is_reported_like_acquisition_error() {
        let events = Log::default();
        let diag = Recorder::default();
        let module_events = events.clone();
        let loader = FnLoader::new(move || async move {
            Ok::<_, AcquisitionError>(Recording { events: module_events, fail_with: Some("no webgl") })
        });

        let mut app = Application::new(loader, ShaderPair::from_text("A", "B"))
            .diagnostics(diag.clone());

        assert_eq!(app.run(), BootState::Failed);
        assert_eq!(*events.borrow(), vec!["init(A, B)"]);
        assert_eq!(diag.0.borrow().len(), 1);
        assert!(matches!(app.failure(), Some(BootError::Initialization(_))));
        assert!(app.module().is_none());
    }

    #[test]
    fn terminal_states() {
        assert!(!BootState::Idle.is_terminal());
        assert!(!BootState::Acquiring.is_terminal());
        assert!(BootState::Initialized.is_terminal());
        assert!(BootState::Failed.is_terminal());
    }
}
