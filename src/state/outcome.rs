//! Outcome definitions for finished task deliveries
//!
//! Every delivery of a task to its handler ends in exactly one of these.

use std::fmt;

/// Final status of one handler invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Outcome {
    /// Page handled; follow-up tasks enqueued or a record appended
    Ok,

    /// Transient response; the task was handed back to the scheduler
    Retry,

    /// Non-retryable response, or a transient one with no attempts left
    Fatal,

    /// Extraction failed on an otherwise good response
    ParseError,

    /// Expected data was missing; nothing emitted, nothing wrong
    Skipped,
}

impl Outcome {
    /// Number of distinct outcomes
    pub const COUNT: usize = 5;

    /// All outcomes, in counter-slot order
    pub const ALL: [Outcome; Self::COUNT] = [
        Outcome::Ok,
        Outcome::Retry,
        Outcome::Fatal,
        Outcome::ParseError,
        Outcome::Skipped,
    ];

    /// Returns true for outcomes that indicate something went wrong
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Fatal | Self::ParseError)
    }

    /// Index into per-outcome counter arrays
    pub(crate) fn slot(&self) -> usize {
        match self {
            Self::Ok => 0,
            Self::Retry => 1,
            Self::Fatal => 2,
            Self::ParseError => 3,
            Self::Skipped => 4,
        }
    }

    /// Short code used in logs and the run summary
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Retry => "retry",
            Self::Fatal => "fatal",
            Self::ParseError => "parse_error",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
