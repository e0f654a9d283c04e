//! FRI Parameter Scheduling
//!
//! Computes the prover parameter file for the low-degree test:
//! 1. Trace length = next power of two of `chain_length * air_height / hashes_per_instance`
//! 2. Zero knowledge pads the trace by a power-of-two slackness factor large
//!    enough to hold `n_queries + 2` extra rows
//! 3. The step list is one leading 0 followed by one unit fold per halving of
//!    the (padded) trace, collapsing it down to the degree bound

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

pub const LOG_N_COSETS: u32 = 4;
pub const LAST_LAYER_DEGREE_BOUND: u32 = 1;
pub const PROOF_OF_WORK_BITS: u32 = 15;
pub const CONSTRAINT_POLYNOMIAL_TASK_SIZE: u32 = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriParameters {
    pub last_layer_degree_bound: u32,
    pub n_queries: u32,
    pub fri_step_list: Vec<u32>,
    pub proof_of_work_bits: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarkParameters {
    pub log_n_cosets: u32,
    pub enable_zero_knowledge: bool,
    pub fri: FriParameters,
}

/// Contents of the `--parameter_file` handed to the prover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverParameters {
    pub stark: StarkParameters,
}

impl ProverParameters {
    /// Number of FRI folding rounds after the leading zero step.
    pub fn fri_rounds(&self) -> usize {
        self.stark.fri.fri_step_list.len().saturating_sub(1)
    }
}

/// Contents of the `--prover_config_file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverConfig {
    pub constraint_polynomial_task_size: u32,
}

impl Default for ProverConfig {
    fn default() -> Self {
        ProverConfig {
            constraint_polynomial_task_size: CONSTRAINT_POLYNOMIAL_TASK_SIZE,
        }
    }
}

/// Chain length must be a positive multiple of the hashes per AIR instance.
pub fn validate_chain_length(chain_length: u64, hashes_per_instance: u64) -> Result<(), HarnessError> {
    if hashes_per_instance == 0 {
        return Err(HarnessError::InvalidParameter(
            "hashes_per_instance must be positive".into(),
        ));
    }
    if chain_length == 0 || chain_length % hashes_per_instance != 0 {
        return Err(HarnessError::InvalidParameter(format!(
            "chain_length must be a positive multiple of {hashes_per_instance}, got {chain_length}"
        )));
    }
    Ok(())
}

/// Power-of-two trace length of a hash chain of `chain_length` hashes.
pub fn trace_length(chain_length: u64, air_height: u64, hashes_per_instance: u64) -> Result<u64, HarnessError> {
    validate_chain_length(chain_length, hashes_per_instance)?;
    if air_height == 0 {
        return Err(HarnessError::InvalidParameter("air_height must be positive".into()));
    }
    (chain_length / hashes_per_instance)
        .checked_mul(air_height)
        .and_then(u64::checked_next_power_of_two)
        .ok_or_else(|| {
            HarnessError::InvalidParameter(format!("trace for chain_length {chain_length} overflows"))
        })
}

/// Smallest power of two `s` with `s * trace_length >= trace_length + n_queries + 2`.
fn slackness_factor(trace_length: u64, n_queries: u32) -> u64 {
    (trace_length + n_queries as u64 + 2)
        .div_ceil(trace_length)
        .next_power_of_two()
}

/// Parameters for a trace whose length is already known.
pub fn schedule_for_trace_length(
    trace_length: u64,
    n_queries: u32,
    zero_knowledge: bool,
) -> Result<ProverParameters, HarnessError> {
    if !trace_length.is_power_of_two() {
        return Err(HarnessError::InvalidParameter(format!(
            "trace length {trace_length} is not a power of two"
        )));
    }
    if n_queries == 0 {
        return Err(HarnessError::InvalidParameter("n_queries must be positive".into()));
    }
    let slackness = if zero_knowledge {
        slackness_factor(trace_length, n_queries)
    } else {
        1
    };
    let padded = slackness.checked_mul(trace_length).ok_or_else(|| {
        HarnessError::InvalidParameter(format!("padded trace of length {trace_length} overflows"))
    })?;

    let mut fri_step_list = vec![0];
    fri_step_list.extend(std::iter::repeat(1).take(padded.trailing_zeros() as usize));

    Ok(ProverParameters {
        stark: StarkParameters {
            log_n_cosets: LOG_N_COSETS,
            enable_zero_knowledge: zero_knowledge,
            fri: FriParameters {
                last_layer_degree_bound: LAST_LAYER_DEGREE_BOUND,
                n_queries,
                fri_step_list,
                proof_of_work_bits: PROOF_OF_WORK_BITS,
            },
        },
    })
}

/// Parameters for a hash chain of `chain_length` hashes.
pub fn schedule(
    chain_length: u64,
    air_height: u64,
    hashes_per_instance: u64,
    n_queries: u32,
    zero_knowledge: bool,
) -> Result<ProverParameters, HarnessError> {
    let trace_length = trace_length(chain_length, air_height, hashes_per_instance)?;
    schedule_for_trace_length(trace_length, n_queries, zero_knowledge)
}
