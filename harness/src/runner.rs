//! Scenario Orchestration
//!
//! Drives one scenario through its stages:
//!   1. Prepare witness or keys, parameters and claim; write the input files
//!   2. Run the external prover and load its artifact
//!   3. Apply the scenario's proof mutation and claim corruption
//!   4. Run the external verifier on the rewritten artifact
//!   5. Check exit code, diagnostic marker and (on acceptance) annotations
//!
//! Within a scenario exactly one external process is live at a time. Scenarios
//! share nothing, so [`run_suite`] may run a table on a thread pool.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::artifact::{compare_annotations, write_json, ProofArtifact};
use crate::error::HarnessError;
use crate::hash::blake2s_concat;
use crate::permutation::OneWayPermutation;
use crate::process::{run_process, ProcessOutput};
use crate::scenario::{Scenario, ScenarioProgress, Stage};
use crate::scheme::{Expectation, Scheme};
use crate::scratch::{
    ScratchDir, MODIFIED_PROOF_FILE, PARAMETER_FILE, PRIVATE_INPUT_FILE, PROOF_FILE,
    PROVER_CONFIG_FILE, PUBLIC_INPUT_FILE, VERIFIER_ANNOTATION_FILE,
};

/// Prover and verifier executables of one scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeBinaries {
    pub prover: PathBuf,
    pub verifier: PathBuf,
}

impl SchemeBinaries {
    /// Fails when either executable is missing, before any scenario starts.
    pub fn ensure_present(&self) -> Result<(), HarnessError> {
        for path in [&self.prover, &self.verifier] {
            if !path.is_file() {
                return Err(HarnessError::ExternalProcess {
                    program: path.display().to_string(),
                    detail: "executable not found".into(),
                });
            }
        }
        Ok(())
    }
}

/// What a finished scenario observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioOutcome {
    pub verifier_exit_code: Option<i32>,
    pub proof_bytes: usize,
    pub n_queries: u32,
}

fn flag(name: &str, path: &Path) -> String {
    format!("--{name}={}", path.display())
}

fn forward_diagnostics(program: &Path, output: &ProcessOutput) {
    for line in output.stderr_text().lines() {
        debug!(program = %program.display(), "{line}");
    }
}

/// Runs one scenario to completion. Scratch files are removed on every path.
pub fn run_scenario<S, P, R, F>(
    scenario: &Scenario<S>,
    binaries: &SchemeBinaries,
    permutation: &P,
    timeout: Duration,
    rng: &mut R,
    on_progress: &F,
) -> Result<ScenarioOutcome, HarnessError>
where
    S: Scheme,
    P: OneWayPermutation + ?Sized,
    R: Rng + ?Sized,
    F: Fn(ScenarioProgress) + ?Sized,
{
    let report = |stage: Stage, detail: String| {
        on_progress(ScenarioProgress {
            scheme: S::NAME,
            scenario: scenario.name,
            stage,
            detail,
        })
    };

    report(Stage::Init, format!("{:?} inputs", scenario.source));
    let scratch = ScratchDir::new(S::NAME)?;

    // Step 1: Input files
    let inputs = S::prepare(scenario.source, scenario.options, permutation, rng)?;
    let n_queries = inputs.parameters.stark.fri.n_queries;
    write_json(&scratch.file(PARAMETER_FILE), &inputs.parameters)?;
    write_json(&scratch.file(PUBLIC_INPUT_FILE), &inputs.public_input)?;
    write_json(&scratch.file(PRIVATE_INPUT_FILE), &inputs.private_input)?;
    write_json(&scratch.file(PROVER_CONFIG_FILE), &inputs.config)?;
    debug!(
        scheme = S::NAME,
        scenario = scenario.name,
        n_queries,
        fri_rounds = inputs.parameters.fri_rounds(),
        zero_knowledge = inputs.parameters.stark.enable_zero_knowledge,
        dir = %scratch.path().display(),
        "prover inputs written"
    );
    report(Stage::InputsPrepared, format!("{n_queries} queries"));

    // Step 2: Prove
    let proof_path = scratch.file(PROOF_FILE);
    let prover_args = vec![
        flag("parameter_file", &scratch.file(PARAMETER_FILE)),
        flag("public_input_file", &scratch.file(PUBLIC_INPUT_FILE)),
        flag("private_input_file", &scratch.file(PRIVATE_INPUT_FILE)),
        flag("out_file", &proof_path),
        "--generate_annotations".to_string(),
        flag("prover_config_file", &scratch.file(PROVER_CONFIG_FILE)),
        "--logtostderr".to_string(),
    ];
    let proved = run_process(&binaries.prover, &prover_args, None, timeout)?;
    forward_diagnostics(&binaries.prover, &proved);
    if !proved.success() {
        return Err(HarnessError::ExternalProcess {
            program: binaries.prover.display().to_string(),
            detail: format!("prover exited with status {:?}", proved.exit_code),
        });
    }
    let artifact = ProofArtifact::load(&proof_path)?;
    debug!("{}", artifact.summary());
    report(Stage::Proved, format!("{} proof bytes", artifact.proof_len()));

    // Step 3: Mutate
    let mut modified = artifact.clone();
    modified.proof_hex = scenario.mutation.apply(&artifact.proof_hex, rng)?;
    if let Some(corruption) = scenario.corruption {
        S::corrupt_claim(corruption, &mut modified.public_input, rng)?;
    }
    let modified_path = scratch.file(MODIFIED_PROOF_FILE);
    modified.save(&modified_path)?;
    report(
        Stage::Mutated,
        format!(
            "{} / {}",
            scenario.mutation.name(),
            scenario.corruption_name().unwrap_or("no claim change")
        ),
    );

    // Step 4: Verify
    let annotation_path = scratch.file(VERIFIER_ANNOTATION_FILE);
    let verifier_args = vec![
        flag("in_file", &modified_path),
        flag("annotation_file", &annotation_path),
        "--logtostderr".to_string(),
    ];
    let verified = run_process(&binaries.verifier, &verifier_args, None, timeout)?;
    forward_diagnostics(&binaries.verifier, &verified);
    report(Stage::Verified, format!("exit code {:?}", verified.exit_code));

    // Step 5: Assert
    check_outcome::<S>(scenario.expectation, &verified, &artifact, &annotation_path)?;
    report(Stage::Asserted, "pass".to_string());

    Ok(ScenarioOutcome {
        verifier_exit_code: verified.exit_code,
        proof_bytes: artifact.proof_len(),
        n_queries,
    })
}

fn check_outcome<S: Scheme>(
    expectation: Expectation,
    verified: &ProcessOutput,
    artifact: &ProofArtifact,
    annotation_path: &Path,
) -> Result<(), HarnessError> {
    let diagnostics = verified.stderr_text();
    let accepted = verified.success() && diagnostics.contains(S::SUCCESS_MARKER);
    let rejected = !verified.success() && diagnostics.contains(S::FAILURE_MARKER);

    match expectation {
        Expectation::Accept if accepted => {
            // An accepting verifier that wrote no log diverges at the first line.
            let verifier_log = match fs::read_to_string(annotation_path) {
                Ok(log) => log,
                Err(error) if error.kind() == io::ErrorKind::NotFound => {
                    return Err(HarnessError::AnnotationMismatch { line: 1 });
                }
                Err(error) => return Err(HarnessError::io(annotation_path, error)),
            };
            compare_annotations(&artifact.annotation_log(), &verifier_log)
        }
        Expectation::Accept if rejected => Err(HarnessError::UnexpectedRejection {
            scheme: S::NAME,
            exit_code: verified.exit_code,
        }),
        Expectation::Reject if rejected => Ok(()),
        Expectation::Accept => Err(HarnessError::OutcomeMismatch {
            scheme: S::NAME,
            detail: format!(
                "expected acceptance, verifier exited with {:?} without {:?}",
                verified.exit_code,
                S::SUCCESS_MARKER
            ),
        }),
        Expectation::Reject => Err(HarnessError::OutcomeMismatch {
            scheme: S::NAME,
            detail: format!(
                "expected rejection, verifier exited with {:?} without reporting {:?}",
                verified.exit_code,
                S::FAILURE_MARKER
            ),
        }),
    }
}

/// Per-scenario RNG: `BLAKE2s(master_seed || scheme || index)`.
pub fn scenario_rng(master_seed: u64, scheme: &str, index: usize) -> StdRng {
    StdRng::from_seed(blake2s_concat(&[
        master_seed.to_be_bytes().as_slice(),
        scheme.as_bytes(),
        (index as u64).to_be_bytes().as_slice(),
    ]))
}

#[derive(Debug, Clone)]
pub struct SuiteOptions {
    pub jobs: usize,
    pub seed: u64,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub index: usize,
    pub scenario: &'static str,
    pub expectation: Expectation,
    pub passed: bool,
    pub last_stage: Stage,
    pub verifier_exit_code: Option<i32>,
    pub proof_bytes: Option<usize>,
    pub n_queries: Option<u32>,
    pub error_kind: Option<&'static str>,
    pub infrastructure_failure: bool,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub scheme: &'static str,
    pub seed: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} suite (seed {}): {}/{} passed",
            self.scheme,
            self.seed,
            self.passed(),
            self.results.len()
        );
        for result in &self.results {
            let verdict = if result.passed { "ok" } else { "FAIL" };
            out.push_str(&format!(
                "\n  [{verdict:>4}] {:<24} {:>6} ms",
                result.scenario, result.elapsed_ms
            ));
            if let Some(error) = &result.error {
                out.push_str(&format!("  {error}"));
            }
        }
        out
    }

    pub fn to_json(&self) -> Result<String, HarnessError> {
        serde_json::to_string_pretty(self).map_err(|error| HarnessError::json("suite report", error))
    }
}

/// Runs a scenario table on a pool of `options.jobs` threads. Results keep
/// table order regardless of completion order.
pub fn run_suite<S, P>(
    scenarios: &[Scenario<S>],
    binaries: &SchemeBinaries,
    permutation: &P,
    options: &SuiteOptions,
    on_progress: impl Fn(ScenarioProgress) + Sync,
) -> Result<SuiteReport, HarnessError>
where
    S: Scheme + Sync,
    P: OneWayPermutation + ?Sized,
{
    binaries.ensure_present()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs.max(1))
        .build()
        .map_err(|error| HarnessError::Internal(format!("failed to build thread pool: {error}")))?;

    info!(
        scheme = S::NAME,
        scenarios = scenarios.len(),
        jobs = options.jobs,
        seed = options.seed,
        "running suite"
    );

    let results = pool.install(|| {
        scenarios
            .par_iter()
            .enumerate()
            .map(|(index, scenario)| {
                let mut rng = scenario_rng(options.seed, S::NAME, index);
                let last_stage = std::sync::Mutex::new(Stage::Init);
                let track = |progress: ScenarioProgress| {
                    if let Ok(mut stage) = last_stage.lock() {
                        *stage = progress.stage;
                    }
                    on_progress(progress);
                };
                let started = Instant::now();
                let outcome = run_scenario(
                    scenario,
                    binaries,
                    permutation,
                    options.timeout,
                    &mut rng,
                    &track,
                );
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let last_stage = last_stage.into_inner().unwrap_or(Stage::Init);
                scenario_result(index, scenario, outcome, last_stage, elapsed_ms)
            })
            .collect::<Vec<_>>()
    });

    Ok(SuiteReport {
        scheme: S::NAME,
        seed: options.seed,
        results,
    })
}

fn scenario_result<S: Scheme>(
    index: usize,
    scenario: &Scenario<S>,
    outcome: Result<ScenarioOutcome, HarnessError>,
    last_stage: Stage,
    elapsed_ms: u64,
) -> ScenarioResult {
    let mut result = ScenarioResult {
        index,
        scenario: scenario.name,
        expectation: scenario.expectation,
        passed: false,
        last_stage,
        verifier_exit_code: None,
        proof_bytes: None,
        n_queries: None,
        error_kind: None,
        infrastructure_failure: false,
        error: None,
        elapsed_ms,
    };
    match outcome {
        Ok(outcome) => {
            info!(scheme = S::NAME, scenario = scenario.name, elapsed_ms, "scenario passed");
            result.passed = true;
            result.verifier_exit_code = outcome.verifier_exit_code;
            result.proof_bytes = Some(outcome.proof_bytes);
            result.n_queries = Some(outcome.n_queries);
        }
        Err(error) => {
            warn!(
                scheme = S::NAME,
                scenario = scenario.name,
                kind = error.kind(),
                stage = last_stage.name(),
                %error,
                "scenario failed"
            );
            result.error_kind = Some(error.kind());
            result.infrastructure_failure = error.is_infrastructure();
            result.error = Some(error.to_string());
        }
    }
    result
}
