//! Output module for crawl results
//!
//! This module handles:
//! - Exporting item records as a dated CSV file in the configured encoding
//! - Summarising task outcomes at the end of a run
//! - The run log file under the output directory

mod export;
mod log_file;
pub mod stats;

pub use export::{export_records, output_encoding, output_path, write_records, HEADER};
pub use log_file::{log_file_layer, log_file_path, open_log_file, LOG_FILE_NAME};
pub use stats::{format_summary, print_summary, RunSummary};
