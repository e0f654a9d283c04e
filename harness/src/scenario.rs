//! Scenario tables
//!
//! Each scheme's suite is a fixed table of [`Scenario`] records driven by one
//! generic runner. A scenario applies at most one proof mutation and at most
//! one claim corruption; positive scenarios apply neither.

use serde::Serialize;

use crate::claim::{RescueClaimCorruption, ZiggyClaimCorruption};
use crate::mutate::ProofMutation;
use crate::scheme::{Expectation, InputSource, RescueOptions, Rescue, Scheme, Ziggy};

#[derive(Debug, Clone, Copy)]
pub struct Scenario<S: Scheme> {
    pub name: &'static str,
    pub expectation: Expectation,
    pub source: InputSource,
    pub options: S::Options,
    pub mutation: ProofMutation,
    pub corruption: Option<S::Corruption>,
}

impl<S: Scheme> Scenario<S> {
    /// Honest run that must verify.
    pub const fn accept(name: &'static str, source: InputSource, options: S::Options) -> Self {
        Scenario {
            name,
            expectation: Expectation::Accept,
            source,
            options,
            mutation: ProofMutation::Identity,
            corruption: None,
        }
    }

    /// Random inputs with corrupted proof bytes; must be rejected.
    pub const fn mutated(name: &'static str, options: S::Options, mutation: ProofMutation) -> Self {
        Scenario {
            name,
            expectation: Expectation::Reject,
            source: InputSource::Random,
            options,
            mutation,
            corruption: None,
        }
    }

    /// Random inputs with a corrupted public claim; must be rejected.
    pub const fn corrupted(name: &'static str, options: S::Options, corruption: S::Corruption) -> Self {
        Scenario {
            name,
            expectation: Expectation::Reject,
            source: InputSource::Random,
            options,
            mutation: ProofMutation::Identity,
            corruption: Some(corruption),
        }
    }

    pub fn corruption_name(&self) -> Option<&'static str> {
        self.corruption.map(S::corruption_name)
    }
}

const PLAIN: RescueOptions = RescueOptions {
    zero_knowledge: false,
};
const ZERO_KNOWLEDGE: RescueOptions = RescueOptions {
    zero_knowledge: true,
};

pub const RESCUE_SCENARIOS: &[Scenario<Rescue>] = &[
    Scenario::accept("random", InputSource::Random, PLAIN),
    Scenario::accept("random_zero_knowledge", InputSource::Random, ZERO_KNOWLEDGE),
    Scenario::accept("golden", InputSource::Golden, PLAIN),
    Scenario::accept("golden_zero_knowledge", InputSource::Golden, ZERO_KNOWLEDGE),
    Scenario::mutated("truncate_last_byte", PLAIN, ProofMutation::TruncateLastByte),
    Scenario::mutated("empty_proof", PLAIN, ProofMutation::Empty),
    Scenario::mutated("remove_random_byte", PLAIN, ProofMutation::RemoveRandomByte),
    Scenario::mutated("flip_random_bit", PLAIN, ProofMutation::FlipRandomBit),
    Scenario::corrupted("claim_chain_length", PLAIN, RescueClaimCorruption::ChainLength),
    Scenario::corrupted("claim_output", PLAIN, RescueClaimCorruption::Output),
];

pub const ZIGGY_SCENARIOS: &[Scenario<Ziggy>] = &[
    Scenario::accept("random_keys", InputSource::Random, ()),
    Scenario::accept("golden_keys", InputSource::Golden, ()),
    Scenario::mutated("truncate_last_byte", (), ProofMutation::TruncateLastByte),
    Scenario::mutated("empty_proof", (), ProofMutation::Empty),
    Scenario::mutated("remove_random_byte", (), ProofMutation::RemoveRandomByte),
    Scenario::mutated("flip_random_bit", (), ProofMutation::FlipRandomBit),
    Scenario::corrupted("claim_message", (), ZiggyClaimCorruption::Message),
    Scenario::corrupted("claim_public_key", (), ZiggyClaimCorruption::PublicKey),
];

/// Scenario lifecycle. Stages advance strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    InputsPrepared,
    Proved,
    Mutated,
    Verified,
    Asserted,
}

impl Stage {
    pub const fn name(self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::InputsPrepared => "inputs",
            Stage::Proved => "proved",
            Stage::Mutated => "mutated",
            Stage::Verified => "verified",
            Stage::Asserted => "asserted",
        }
    }

    pub const fn percent(self) -> u8 {
        match self {
            Stage::Init => 0,
            Stage::InputsPrepared => 10,
            Stage::Proved => 60,
            Stage::Mutated => 70,
            Stage::Verified => 95,
            Stage::Asserted => 100,
        }
    }
}

/// Progress report emitted at each stage transition.
#[derive(Debug, Clone)]
pub struct ScenarioProgress {
    pub scheme: &'static str,
    pub scenario: &'static str,
    pub stage: Stage,
    pub detail: String,
}
