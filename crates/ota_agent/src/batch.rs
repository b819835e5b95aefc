//! Sequential batch processing
//!
//! Directives run strictly in server order, one at a time. The failure policy
//! decides whether the first error ends the batch.

use crate::dispatcher::{Dispatcher, Outcome};
use crate::error::OtaError;
use ota_common::UpdateDirective;
use tracing::{error, info};

/// What to do after a directive fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failure; later directives are not attempted
    #[default]
    Abort,
    /// Record the failure and carry on with the next directive
    Continue,
}

impl FailurePolicy {
    pub fn from_continue_flag(continue_on_error: bool) -> Self {
        if continue_on_error {
            Self::Continue
        } else {
            Self::Abort
        }
    }
}

/// Outcome of one directive in a batch
#[derive(Debug)]
pub struct DirectiveReport {
    /// Position in the server's list
    pub index: usize,
    pub label: String,
    pub result: Result<Outcome, OtaError>,
}

/// Outcome of a whole batch
#[derive(Debug, Default)]
pub struct BatchReport {
    pub reports: Vec<DirectiveReport>,
    /// Directives never attempted because the batch aborted
    pub not_attempted: usize,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.not_attempted == 0 && self.reports.iter().all(|r| r.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &DirectiveReport> {
        self.reports.iter().filter(|r| r.result.is_err())
    }

    pub fn first_error(&self) -> Option<&OtaError> {
        self.reports.iter().find_map(|r| r.result.as_ref().err())
    }
}

/// Process `directives` in order under `policy`
pub fn run_batch(
    dispatcher: &Dispatcher<'_>,
    directives: &[UpdateDirective],
    policy: FailurePolicy,
) -> BatchReport {
    let mut report = BatchReport::default();

    for (index, directive) in directives.iter().enumerate() {
        let label = directive.label();
        let result = dispatcher.process(directive);

        let failed = match &result {
            Ok(outcome) => {
                info!("[{}/{}] {}: {}", index + 1, directives.len(), label, outcome.describe());
                false
            }
            Err(e) => {
                error!("[{}/{}] {}: {} error: {}", index + 1, directives.len(), label, e.kind(), e);
                true
            }
        };

        report.reports.push(DirectiveReport {
            index,
            label,
            result,
        });

        if failed && policy == FailurePolicy::Abort {
            report.not_attempted = directives.len() - index - 1;
            break;
        }
    }

    report
}
