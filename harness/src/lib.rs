//! STARK Prover/Verifier Test Harness
//!
//! Derives signature keys and hash-chain witnesses, schedules FRI parameters,
//! and drives external STARK provers and verifiers through positive and
//! adversarial scenarios. Can be used as a library or via the CLI binary.

pub mod artifact;
pub mod claim;
pub mod config;
pub mod error;
pub mod field;
pub mod fixtures;
pub mod hash;
pub mod keys;
pub mod mutate;
pub mod params;
pub mod permutation;
pub mod process;
pub mod runner;
pub mod sampler;
pub mod scenario;
pub mod scheme;
pub mod scratch;
pub mod witness;

use rand::Rng;

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::runner::{run_suite, SuiteOptions, SuiteReport};
use crate::scenario::{Scenario, ScenarioProgress};
use crate::scheme::Scheme;

/// Run a scheme's scenario table with binaries, permutation and seed taken
/// from `config`.
pub fn run_configured_suite<S: Scheme + Sync>(
    config: &HarnessConfig,
    scenarios: &[Scenario<S>],
) -> Result<SuiteReport, HarnessError> {
    run_configured_suite_with_progress(config, scenarios, |_| {})
}

/// Same as [`run_configured_suite`], reporting each stage transition.
pub fn run_configured_suite_with_progress<S: Scheme + Sync>(
    config: &HarnessConfig,
    scenarios: &[Scenario<S>],
    on_progress: impl Fn(ScenarioProgress) + Sync,
) -> Result<SuiteReport, HarnessError> {
    let permutation = config.permutation()?;
    let options = SuiteOptions {
        jobs: config.jobs,
        seed: config.seed.unwrap_or_else(|| rand::rng().random()),
        timeout: config.timeout(),
    };
    run_suite(
        scenarios,
        &config.binaries::<S>(),
        permutation.as_ref(),
        &options,
        on_progress,
    )
}
