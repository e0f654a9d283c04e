//! Harness Error Taxonomy
//!
//! Every fallible operation in the crate returns [`HarnessError`]. The variants
//! separate infrastructure failures (missing binaries, timeouts, I/O) from
//! cryptographic outcomes (a rejected proof) and from defects in the harness
//! itself (a mutation that broke the hex contract).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    /// A precondition failed before any external process was started.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A prover, verifier or permutation binary is missing or failed to run.
    #[error("external process `{program}` failed: {detail}")]
    ExternalProcess { program: String, detail: String },

    /// An external process exceeded the caller-set timeout and was killed.
    #[error("external process `{program}` timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    /// The verifier rejected an honest proof that it should have accepted.
    ///
    /// A rejection in a scenario that expects one is a pass, not this error.
    #[error("{scheme} verifier unexpectedly rejected an honest proof (exit code {exit_code:?})")]
    UnexpectedRejection {
        scheme: &'static str,
        exit_code: Option<i32>,
    },

    /// The verifier accepted, but its annotation log differs from the prover's.
    #[error("prover and verifier annotation logs differ at line {line}")]
    AnnotationMismatch { line: usize },

    /// A corruption operator emitted a value outside the hex-encoding contract.
    #[error("mutation `{operator}` produced malformed proof hex `{output}`")]
    MutationInvariantViolation {
        operator: &'static str,
        output: String,
    },

    /// The verifier's exit code and diagnostics disagree with the expectation.
    #[error("{scheme} outcome mismatch: {detail}")]
    OutcomeMismatch { scheme: &'static str, detail: String },

    #[error("internal defect: {0}")]
    Internal(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HarnessError {
    /// Stable short label used in suite reports.
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::InvalidParameter(_) => "invalid_parameter",
            HarnessError::ExternalProcess { .. } => "external_process",
            HarnessError::Timeout { .. } => "timeout",
            HarnessError::UnexpectedRejection { .. } => "unexpected_rejection",
            HarnessError::AnnotationMismatch { .. } => "annotation_mismatch",
            HarnessError::MutationInvariantViolation { .. } => "mutation_invariant",
            HarnessError::OutcomeMismatch { .. } => "outcome_mismatch",
            HarnessError::Internal(_) => "internal",
            HarnessError::Io { .. } => "io",
            HarnessError::Json { .. } => "json",
        }
    }

    /// True for failures of the surrounding infrastructure rather than of the
    /// proving system under test.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            HarnessError::ExternalProcess { .. }
                | HarnessError::Timeout { .. }
                | HarnessError::Io { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        HarnessError::Json {
            context: context.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct_for_process_failures() {
        let spawn = HarnessError::ExternalProcess {
            program: "rescue_prover".into(),
            detail: "not found".into(),
        };
        let timeout = HarnessError::Timeout {
            program: "rescue_prover".into(),
            timeout: Duration::from_secs(1),
        };
        let mismatch = HarnessError::OutcomeMismatch {
            scheme: "rescue",
            detail: "accepted".into(),
        };
        assert_ne!(spawn.kind(), timeout.kind());
        assert_ne!(timeout.kind(), mismatch.kind());
        assert!(spawn.is_infrastructure());
        assert!(timeout.is_infrastructure());
        assert!(!mismatch.is_infrastructure());
    }

    #[test]
    fn test_rejection_of_honest_proof_is_a_verdict_failure() {
        let err = HarnessError::UnexpectedRejection {
            scheme: "ziggy",
            exit_code: Some(1),
        };
        assert_eq!(err.kind(), "unexpected_rejection");
        assert!(!err.is_infrastructure());
        assert!(err.to_string().contains("unexpectedly rejected"));
    }
}
