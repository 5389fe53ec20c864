pub mod init;
pub mod inject;
pub mod inspect;
pub mod probe;

use std::path::{Path, PathBuf};

use spyglass_core::log::{self, LogConfig};

/// Directory holding the running executable; relative library paths
/// resolve against it.
pub fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_default()
}

/// Starts file logging. Failure is reported and the command carries on
/// without a log.
pub fn start_logging(config: &LogConfig) {
    if let Err(e) = log::init(config) {
        eprintln!("Warning: file logging disabled: {e}");
    }
}

/// Prints the error for a platform without window probing and exits.
#[cfg(not(windows))]
pub fn unsupported(what: &str) -> ! {
    eprintln!("Error: {what} is only supported on Windows.");
    std::process::exit(1);
}
