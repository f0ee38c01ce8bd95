//! Logging utilities.
//!
//! Libraries in this workspace only emit through the `log` facade. Binaries
//! install the `env_logger` backend once, early in `main`.

mod init;

pub use init::{init_logging, LoggingConfig};
