//! Proving schemes under test
//!
//! A [`Scheme`] knows how to build the four prover input files for one
//! scenario and how to corrupt its own public claim. The harness ships two:
//!   - [`Rescue`]: proof of knowledge of a hash-chain witness
//!   - [`Ziggy`]: signature as proof of knowledge of a permutation preimage

use std::fmt::Debug;

use rand::Rng;
use serde::Serialize;
use serde_json::Value;

use crate::claim::{
    claim_from_value, claim_to_value, RescueClaim, RescueClaimCorruption, ZiggyClaim,
    ZiggyClaimCorruption,
};
use crate::error::HarnessError;
use crate::fixtures::{golden_rescue, golden_ziggy};
use crate::keys::derive_key_pair;
use crate::params::{schedule, schedule_for_trace_length, ProverConfig, ProverParameters};
use crate::permutation::OneWayPermutation;
use crate::witness::{generate_witness_and_output, row_to_hex, AIR_HEIGHT, HASHES_PER_INSTANCE};

/// Most FRI queries drawn for either scheme.
pub const MAX_NUMBER_QUERIES: u32 = 30;

/// Fewest FRI queries drawn for a signature proof.
pub const ZIGGY_MIN_QUERIES: u32 = 20;

/// Trace length of the signature AIR.
pub const ZIGGY_TRACE_LENGTH: u64 = 16;

/// Message signed in every signature scenario.
pub const SCENARIO_MESSAGE: &str = "test message";

/// Message written by the key-generation command when none is given.
pub const DEFAULT_MESSAGE: &str = "Hello World!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    Accept,
    Reject,
}

/// Where a scenario's witness or keys come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    Random,
    Golden,
}

/// The four structures handed to the prover.
#[derive(Debug, Clone, PartialEq)]
pub struct ProverInputs {
    pub parameters: ProverParameters,
    pub public_input: Value,
    pub private_input: Value,
    pub config: ProverConfig,
}

pub trait Scheme {
    const NAME: &'static str;
    const SUCCESS_MARKER: &'static str;
    const FAILURE_MARKER: &'static str;

    /// Scheme-specific knobs of a scenario.
    type Options: Copy + Debug + Send + Sync;
    /// Closed set of claim corruptions.
    type Corruption: Copy + Debug + Send + Sync;

    fn prover_exe() -> String {
        format!("{}_prover", Self::NAME)
    }

    fn verifier_exe() -> String {
        format!("{}_verifier", Self::NAME)
    }

    fn corruption_name(corruption: Self::Corruption) -> &'static str;

    fn prepare<P, R>(
        source: InputSource,
        options: Self::Options,
        permutation: &P,
        rng: &mut R,
    ) -> Result<ProverInputs, HarnessError>
    where
        P: OneWayPermutation + ?Sized,
        R: Rng + ?Sized;

    /// Corrupts exactly one field of the echoed `public_input` block.
    fn corrupt_claim<R: Rng + ?Sized>(
        corruption: Self::Corruption,
        public_input: &mut Value,
        rng: &mut R,
    ) -> Result<(), HarnessError>;
}

fn to_value<T: Serialize>(context: &str, value: &T) -> Result<Value, HarnessError> {
    serde_json::to_value(value).map_err(|error| HarnessError::json(context, error))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rescue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RescueOptions {
    pub zero_knowledge: bool,
}

impl Scheme for Rescue {
    const NAME: &'static str = "rescue";
    const SUCCESS_MARKER: &'static str = "Proof verified successfully.";
    const FAILURE_MARKER: &'static str = "Invalid proof.";

    type Options = RescueOptions;
    type Corruption = RescueClaimCorruption;

    fn corruption_name(corruption: RescueClaimCorruption) -> &'static str {
        corruption.name()
    }

    fn prepare<P, R>(
        source: InputSource,
        options: RescueOptions,
        permutation: &P,
        rng: &mut R,
    ) -> Result<ProverInputs, HarnessError>
    where
        P: OneWayPermutation + ?Sized,
        R: Rng + ?Sized,
    {
        let generated = match source {
            InputSource::Golden => golden_rescue()?,
            InputSource::Random => generate_witness_and_output(None, permutation, rng)?,
        };
        let chain_length = generated.witness.chain_length();
        let n_queries = rng.random_range(1..=MAX_NUMBER_QUERIES);
        let parameters = schedule(
            chain_length,
            AIR_HEIGHT,
            HASHES_PER_INSTANCE,
            n_queries,
            options.zero_knowledge,
        )?;
        let claim = RescueClaim {
            output: row_to_hex(&generated.output),
            chain_length: chain_length as i64,
            extra: Default::default(),
        };
        Ok(ProverInputs {
            parameters,
            public_input: claim_to_value(&claim)?,
            private_input: to_value("private_input", &generated.private_input())?,
            config: ProverConfig::default(),
        })
    }

    fn corrupt_claim<R: Rng + ?Sized>(
        corruption: RescueClaimCorruption,
        public_input: &mut Value,
        rng: &mut R,
    ) -> Result<(), HarnessError> {
        let mut claim: RescueClaim = claim_from_value(public_input)?;
        corruption.apply(&mut claim, rng)?;
        *public_input = claim_to_value(&claim)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ziggy;

impl Scheme for Ziggy {
    const NAME: &'static str = "ziggy";
    const SUCCESS_MARKER: &'static str = "Ziggy signature verified successfully.";
    const FAILURE_MARKER: &'static str = "Invalid Ziggy signature.";

    type Options = ();
    type Corruption = ZiggyClaimCorruption;

    fn corruption_name(corruption: ZiggyClaimCorruption) -> &'static str {
        corruption.name()
    }

    fn prepare<P, R>(
        source: InputSource,
        _options: (),
        permutation: &P,
        rng: &mut R,
    ) -> Result<ProverInputs, HarnessError>
    where
        P: OneWayPermutation + ?Sized,
        R: Rng + ?Sized,
    {
        let keys = match source {
            InputSource::Golden => golden_ziggy()?,
            InputSource::Random => derive_key_pair(None, permutation, rng)?,
        };
        let n_queries = rng.random_range(ZIGGY_MIN_QUERIES..=MAX_NUMBER_QUERIES);
        let parameters = schedule_for_trace_length(ZIGGY_TRACE_LENGTH, n_queries, true)?;
        let claim = ZiggyClaim {
            message: SCENARIO_MESSAGE.to_string(),
            public_key: keys.public_key_hex(),
            extra: Default::default(),
        };
        Ok(ProverInputs {
            parameters,
            public_input: claim_to_value(&claim)?,
            private_input: to_value("private_input", &keys.private_input())?,
            config: ProverConfig::default(),
        })
    }

    fn corrupt_claim<R: Rng + ?Sized>(
        corruption: ZiggyClaimCorruption,
        public_input: &mut Value,
        rng: &mut R,
    ) -> Result<(), HarnessError> {
        let mut claim: ZiggyClaim = claim_from_value(public_input)?;
        corruption.apply(&mut claim, rng)?;
        *public_input = claim_to_value(&claim)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{GOLDEN_RESCUE_OUTPUT, GOLDEN_ZIGGY_PRIVATE_KEY, GOLDEN_ZIGGY_PUBLIC_KEY};
    use crate::permutation::UnconfiguredPermutation;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_executable_names() {
        assert_eq!(Rescue::prover_exe(), "rescue_prover");
        assert_eq!(Ziggy::verifier_exe(), "ziggy_verifier");
    }

    #[test]
    fn test_golden_rescue_inputs() {
        let mut rng = StdRng::seed_from_u64(0);
        let inputs = Rescue::prepare(
            InputSource::Golden,
            RescueOptions { zero_knowledge: false },
            &UnconfiguredPermutation,
            &mut rng,
        )
        .expect("golden inputs need no permutation");
        assert_eq!(inputs.public_input["chain_length"], 3);
        assert_eq!(inputs.public_input["output"][0], GOLDEN_RESCUE_OUTPUT[0]);
        assert_eq!(inputs.private_input["witness"].as_array().map(Vec::len), Some(4));
        let n_queries = inputs.parameters.stark.fri.n_queries;
        assert!((1..=MAX_NUMBER_QUERIES).contains(&n_queries));
        // 3 hashes -> 32 rows, no padding -> five folds.
        assert_eq!(inputs.parameters.fri_rounds(), 5);
        assert_eq!(inputs.config.constraint_polynomial_task_size, 256);
    }

    #[test]
    fn test_golden_ziggy_inputs() {
        let mut rng = StdRng::seed_from_u64(1);
        let inputs = Ziggy::prepare(InputSource::Golden, (), &UnconfiguredPermutation, &mut rng)
            .expect("golden inputs need no permutation");
        assert_eq!(inputs.public_input["message"], SCENARIO_MESSAGE);
        assert_eq!(inputs.public_input["public_key"][3], GOLDEN_ZIGGY_PUBLIC_KEY[3]);
        assert_eq!(inputs.private_input["private_key"], GOLDEN_ZIGGY_PRIVATE_KEY);
        assert!(inputs.parameters.stark.enable_zero_knowledge);
        let n_queries = inputs.parameters.stark.fri.n_queries;
        assert!((ZIGGY_MIN_QUERIES..=MAX_NUMBER_QUERIES).contains(&n_queries));
        assert_eq!(inputs.parameters.fri_rounds(), 6);
    }

    #[test]
    fn test_random_inputs_need_permutation() {
        let mut rng = StdRng::seed_from_u64(2);
        let err = Ziggy::prepare(InputSource::Random, (), &UnconfiguredPermutation, &mut rng)
            .expect_err("no permutation");
        assert_eq!(err.kind(), "invalid_parameter");
    }

    #[test]
    fn test_corrupt_claim_touches_only_target_field() {
        let mut rng = StdRng::seed_from_u64(3);
        let inputs = Rescue::prepare(
            InputSource::Golden,
            RescueOptions::default(),
            &UnconfiguredPermutation,
            &mut rng,
        )
        .expect("inputs");
        let mut public_input = inputs.public_input.clone();
        Rescue::corrupt_claim(RescueClaimCorruption::ChainLength, &mut public_input, &mut rng)
            .expect("corrupt");
        assert_eq!(public_input["output"], inputs.public_input["output"]);
        assert_ne!(public_input["chain_length"], inputs.public_input["chain_length"]);
    }
}
