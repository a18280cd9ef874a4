//! Body-error check and retry policy
//!
//! Every fetched response is classified before any stage extraction runs:
//!
//! | Condition | Class |
//! |-----------|-------|
//! | Timeout / connection / body read failure | transient |
//! | HTTP 408, 429, 5xx | transient |
//! | Any other non-2xx status | fatal |
//! | 2xx with a blank body | transient |
//! | 2xx whose body contains a configured error marker | transient |
//! | Anything else | ok |

use crate::crawler::{FetchResult, NetworkErrorKind, Task};
use url::Url;

/// Classification of one fetched response
#[derive(Debug, PartialEq, Eq)]
pub enum BodyCheck<'a> {
    /// Usable page; carries the body for extraction and the URL it was
    /// served from, which relative links on it resolve against
    Ok { body: &'a str, final_url: &'a Url },
    /// Worth another attempt
    Transient(String),
    /// Retrying will not help
    Fatal(String),
}

/// Runs the body-error check on a fetched response
pub fn check_body_errors<'a>(fetched: &'a FetchResult, error_markers: &[String]) -> BodyCheck<'a> {
    match fetched {
        FetchResult::NetworkError { error, kind } => {
            let what = match kind {
                NetworkErrorKind::Timeout => "timeout",
                NetworkErrorKind::Connect => "connection error",
                NetworkErrorKind::Other => "network error",
            };
            BodyCheck::Transient(format!("{}: {}", what, error))
        }

        FetchResult::HttpError { status_code } => {
            if is_transient_status(*status_code) {
                BodyCheck::Transient(format!("HTTP {}", status_code))
            } else {
                BodyCheck::Fatal(format!("HTTP {}", status_code))
            }
        }

        FetchResult::Success {
            body, final_url, ..
        } => {
            if body.trim().is_empty() {
                return BodyCheck::Transient("empty body".to_string());
            }

            if let Some(marker) = error_markers.iter().find(|m| body.contains(m.as_str())) {
                return BodyCheck::Transient(format!("error marker in body: {:?}", marker));
            }

            BodyCheck::Ok { body, final_url }
        }
    }
}

fn is_transient_status(status_code: u16) -> bool {
    matches!(status_code, 408 | 429) || (500..600).contains(&status_code)
}

/// Immutable retry policy handed to the scheduler at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    try_limit: u32,
}

impl RetryPolicy {
    /// `try_limit` counts every delivery, the first one included; it is
    /// clamped to at least 1
    pub fn new(try_limit: u32) -> Self {
        Self {
            try_limit: try_limit.max(1),
        }
    }

    pub fn try_limit(&self) -> u32 {
        self.try_limit
    }

    /// Whether a task that just failed transiently gets another delivery
    pub fn allows_retry(&self, task: &Task) -> bool {
        task.attempt() + 1 < self.try_limit
    }
}
