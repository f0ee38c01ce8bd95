use crate::error::BootError;

/// Receives terminal bootstrap failures.
pub trait Diagnostics {
    fn report(&mut self, error: &BootError);
}

/// Forwards failures to the `log` facade at error level.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&mut self, error: &BootError) {
        log::error!("{error}");
    }
}
