//! One-way permutation boundary
//!
//! The 8-to-4 permutation that drives both the hash-chain statement and the
//! signature public key lives outside this crate. It is consumed through
//! [`OneWayPermutation`]; [`CommandPermutation`] delegates each call to an
//! external executable speaking a small JSON protocol:
//!
//! ```text
//! stdin:  {"input":  ["0x..", ... 8 elements]}
//! stdout: {"output": ["0x..", ... 4 elements]}
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;
use crate::field::Felt;
use crate::process::run_process;

/// Elements absorbed per permutation call.
pub const PERMUTATION_INPUT_WIDTH: usize = 8;

/// Elements returned per permutation call.
pub const PERMUTATION_OUTPUT_WIDTH: usize = 4;

pub trait OneWayPermutation: Send + Sync {
    fn permute(
        &self,
        input: &[Felt; PERMUTATION_INPUT_WIDTH],
    ) -> Result<[Felt; PERMUTATION_OUTPUT_WIDTH], HarnessError>;
}

/// Folds rows into a running state: the state starts as row 0 and each later
/// row is absorbed as `state = permute(state || row)`.
pub fn hash_chain<P: OneWayPermutation + ?Sized>(
    rows: &[[Felt; PERMUTATION_OUTPUT_WIDTH]],
    permutation: &P,
) -> Result<[Felt; PERMUTATION_OUTPUT_WIDTH], HarnessError> {
    let (first, rest) = rows
        .split_first()
        .ok_or_else(|| HarnessError::InvalidParameter("hash chain needs at least one row".into()))?;
    let mut state = *first;
    for row in rest {
        let mut input = [Felt::ZERO; PERMUTATION_INPUT_WIDTH];
        input[..PERMUTATION_OUTPUT_WIDTH].copy_from_slice(&state);
        input[PERMUTATION_OUTPUT_WIDTH..].copy_from_slice(row);
        state = permutation.permute(&input)?;
    }
    Ok(state)
}

#[derive(Serialize)]
struct PermutationRequest {
    input: Vec<String>,
}

#[derive(Deserialize)]
struct PermutationResponse {
    output: Vec<String>,
}

/// Permutation served by an external executable.
#[derive(Debug, Clone)]
pub struct CommandPermutation {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandPermutation {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, timeout: Duration) -> Self {
        CommandPermutation {
            program: program.into(),
            args,
            timeout,
        }
    }
}

impl OneWayPermutation for CommandPermutation {
    fn permute(
        &self,
        input: &[Felt; PERMUTATION_INPUT_WIDTH],
    ) -> Result<[Felt; PERMUTATION_OUTPUT_WIDTH], HarnessError> {
        let request = PermutationRequest {
            input: input.iter().map(|felt| felt.to_hex()).collect(),
        };
        let payload = serde_json::to_vec(&request)
            .map_err(|error| HarnessError::json("permutation request", error))?;

        let output = run_process(&self.program, &self.args, Some(&payload), self.timeout)?;
        if !output.success() {
            return Err(HarnessError::ExternalProcess {
                program: self.program.display().to_string(),
                detail: format!(
                    "exited with status {:?}: {}",
                    output.exit_code,
                    output.stderr_text().trim()
                ),
            });
        }

        let response: PermutationResponse = serde_json::from_slice(&output.stdout)
            .map_err(|error| HarnessError::json("permutation response", error))?;
        if response.output.len() != PERMUTATION_OUTPUT_WIDTH {
            return Err(HarnessError::InvalidParameter(format!(
                "permutation returned {} elements, expected {PERMUTATION_OUTPUT_WIDTH}",
                response.output.len()
            )));
        }
        let mut out = [Felt::ZERO; PERMUTATION_OUTPUT_WIDTH];
        for (slot, text) in out.iter_mut().zip(&response.output) {
            *slot = Felt::from_hex(text)?;
        }
        Ok(out)
    }
}

/// Stand-in used when no permutation command is configured. Scenarios that
/// only use golden fixtures never call it.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredPermutation;

impl OneWayPermutation for UnconfiguredPermutation {
    fn permute(
        &self,
        _input: &[Felt; PERMUTATION_INPUT_WIDTH],
    ) -> Result<[Felt; PERMUTATION_OUTPUT_WIDTH], HarnessError> {
        Err(HarnessError::InvalidParameter(
            "no permutation command configured (set permutation_command)".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::PRIME;
    use std::sync::Mutex;

    /// Records calls and sums adjacent pairs, so chain order is observable.
    #[derive(Default)]
    struct PairSum {
        calls: Mutex<Vec<[Felt; PERMUTATION_INPUT_WIDTH]>>,
    }

    impl OneWayPermutation for PairSum {
        fn permute(
            &self,
            input: &[Felt; PERMUTATION_INPUT_WIDTH],
        ) -> Result<[Felt; PERMUTATION_OUTPUT_WIDTH], HarnessError> {
            self.calls.lock().expect("lock").push(*input);
            let mut out = [Felt::ZERO; PERMUTATION_OUTPUT_WIDTH];
            for (i, slot) in out.iter_mut().enumerate() {
                let sum = (input[i].value() + input[i + 4].value()) % PRIME;
                *slot = Felt::new(sum).expect("reduced");
            }
            Ok(out)
        }
    }

    fn row(values: [u64; 4]) -> [Felt; 4] {
        values.map(|v| Felt::new(v).expect("small"))
    }

    #[test]
    fn test_hash_chain_absorbs_rows_in_order() {
        let permutation = PairSum::default();
        let rows = [row([1, 2, 3, 4]), row([5, 6, 7, 8]), row([1, 1, 1, 1])];
        let out = hash_chain(&rows, &permutation).expect("chain");
        assert_eq!(out, row([7, 9, 11, 13]));

        let calls = permutation.calls.lock().expect("lock");
        assert_eq!(calls.len(), 2);
        assert_eq!(&calls[0][..4], &rows[0]);
        assert_eq!(&calls[0][4..], &rows[1]);
        assert_eq!(&calls[1][..4], &row([6, 8, 10, 12]));
    }

    #[test]
    fn test_single_row_chain_is_identity() {
        let permutation = PairSum::default();
        let rows = [row([9, 8, 7, 6])];
        assert_eq!(hash_chain(&rows, &permutation).expect("chain"), rows[0]);
        assert!(permutation.calls.lock().expect("lock").is_empty());
    }

    #[test]
    fn test_empty_chain_rejected() {
        let err = hash_chain(&[], &PairSum::default()).expect_err("no rows");
        assert_eq!(err.kind(), "invalid_parameter");
    }

    #[test]
    fn test_unconfigured_permutation_errors() {
        let err = UnconfiguredPermutation
            .permute(&[Felt::ZERO; 8])
            .expect_err("unconfigured");
        assert_eq!(err.kind(), "invalid_parameter");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_permutation_protocol() {
        let permutation = CommandPermutation::new(
            "/bin/sh",
            vec![
                "-c".into(),
                r#"cat >/dev/null; echo '{"output":["0x1","0x2","0x3","0x4"]}'"#.into(),
            ],
            Duration::from_secs(10),
        );
        let out = permutation.permute(&[Felt::ZERO; 8]).expect("permute");
        assert_eq!(out, row([1, 2, 3, 4]));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_permutation_rejects_short_output() {
        let permutation = CommandPermutation::new(
            "/bin/sh",
            vec!["-c".into(), r#"cat >/dev/null; echo '{"output":["0x1"]}'"#.into()],
            Duration::from_secs(10),
        );
        let err = permutation.permute(&[Felt::ZERO; 8]).expect_err("short");
        assert_eq!(err.kind(), "invalid_parameter");
    }
}
