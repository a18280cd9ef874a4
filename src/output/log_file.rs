//! Run log file written next to the CSV export

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::fmt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// File name of the run log inside the log directory
pub const LOG_FILE_NAME: &str = "catalog-spider.log";

/// Path of the run log: `log_directory` is taken relative to the output
/// directory unless it is absolute
pub fn log_file_path(output_directory: &Path, log_directory: &str) -> PathBuf {
    output_directory.join(log_directory).join(LOG_FILE_NAME)
}

/// Creates the log directory if needed and opens the log for appending
///
/// Runs append to the same file, so earlier runs stay readable.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Formatting layer writing plain-text events to `file`
pub fn log_file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(Mutex::new(file))
}
