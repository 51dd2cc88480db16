//! Entry point for the bridge host process.
//!
//! Requests arrive on stdin and responses leave on stdout, one JSON document
//! per line. Logs go to stderr.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use foreign_bridged::{StructuredHealthReporter, SystemConfigLoader};

fn main() -> ExitCode {
    let mut stderr = io::stderr().lock();
    foreign_bridged::run(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        &mut stderr,
    )
}
