use std::fmt;

/// Why module acquisition failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AcquisitionErrorKind {
    /// Fetching the module bytes failed.
    Transport,
    /// The bytes are not a loadable module.
    Malformed,
    /// The host rejected the module while instantiating it.
    Instantiation,
    /// The host environment cannot run modules at all.
    Unsupported,
}

impl AcquisitionErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Malformed => "malformed binary",
            Self::Instantiation => "instantiation",
            Self::Unsupported => "unsupported host",
        }
    }
}

/// Failure to fetch or instantiate the compiled module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionError {
    pub kind: AcquisitionErrorKind,
    pub message: String,
}

impl AcquisitionError {
    pub fn new(kind: AcquisitionErrorKind, msg: impl Into<String>) -> Self {
        Self { kind, message: msg.into() }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(AcquisitionErrorKind::Transport, msg)
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::new(AcquisitionErrorKind::Malformed, msg)
    }

    pub fn instantiation(msg: impl Into<String>) -> Self {
        Self::new(AcquisitionErrorKind::Instantiation, msg)
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::new(AcquisitionErrorKind::Unsupported, msg)
    }
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module acquisition failed ({}): {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for AcquisitionError {}

/// Failure reported by the module's own initialization entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitError(pub String);

impl InitError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module initialization failed: {}", self.0)
    }
}

impl std::error::Error for InitError {}

/// Terminal bootstrap failure. Both variants are handled the same way:
/// reported once, never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootError {
    Acquisition(AcquisitionError),
    Initialization(InitError),
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acquisition(e) => e.fmt(f),
            Self::Initialization(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for BootError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Acquisition(e) => Some(e),
            Self::Initialization(e) => Some(e),
        }
    }
}

impl From<AcquisitionError> for BootError {
    fn from(e: AcquisitionError) -> Self {
        Self::Acquisition(e)
    }
}

impl From<InitError> for BootError {
    fn from(e: InitError) -> Self {
        Self::Initialization(e)
    }
}
