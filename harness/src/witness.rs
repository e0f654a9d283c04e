//! Hash-chain witness generation
//!
//! A witness is `chain_length + 1` rows of four field elements. Row 0 seeds the
//! chain state and each later row is absorbed by the one-way permutation; the
//! final state is the public output the prover commits to.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;
use crate::field::Felt;
use crate::params::validate_chain_length;
use crate::permutation::{hash_chain, OneWayPermutation, PERMUTATION_OUTPUT_WIDTH};

/// Rows of the hash-chain AIR per hash invocation.
pub const AIR_HEIGHT: u64 = 32;

/// Hashes proven by one AIR instance; chain lengths are multiples of this.
pub const HASHES_PER_INSTANCE: u64 = 3;

/// Width of a witness row and of the public output.
pub const WORD_SIZE: usize = PERMUTATION_OUTPUT_WIDTH;

/// Upper bound (in AIR instances) for randomly drawn chain lengths.
pub const MAX_RANDOM_INSTANCES: u64 = 32;

pub type Row = [Felt; WORD_SIZE];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    rows: Vec<Row>,
}

impl Witness {
    /// Validates that the rows describe a chain of positive length divisible
    /// by [`HASHES_PER_INSTANCE`].
    pub fn from_rows(rows: Vec<Row>) -> Result<Self, HarnessError> {
        let chain_length = (rows.len() as u64).saturating_sub(1);
        validate_chain_length(chain_length, HASHES_PER_INSTANCE)?;
        Ok(Witness { rows })
    }

    pub fn random<R: Rng + ?Sized>(chain_length: u64, rng: &mut R) -> Result<Self, HarnessError> {
        validate_chain_length(chain_length, HASHES_PER_INSTANCE)?;
        let rows = (0..=chain_length)
            .map(|_| std::array::from_fn(|_| Felt::random(rng)))
            .collect();
        Ok(Witness { rows })
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn chain_length(&self) -> u64 {
        self.rows.len() as u64 - 1
    }

    pub fn to_hex_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|felt| felt.to_hex()).collect())
            .collect()
    }

    pub fn from_hex_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self, HarnessError> {
        let parsed = rows
            .iter()
            .map(|row| parse_row(row))
            .collect::<Result<Vec<_>, _>>()?;
        Witness::from_rows(parsed)
    }
}

/// Parses exactly [`WORD_SIZE`] hex elements.
pub fn parse_row<S: AsRef<str>>(words: &[S]) -> Result<Row, HarnessError> {
    if words.len() != WORD_SIZE {
        return Err(HarnessError::InvalidParameter(format!(
            "expected {WORD_SIZE} words per row, got {}",
            words.len()
        )));
    }
    let mut row = [Felt::ZERO; WORD_SIZE];
    for (slot, word) in row.iter_mut().zip(words) {
        *slot = Felt::from_hex(word.as_ref())?;
    }
    Ok(row)
}

pub fn row_to_hex(row: &Row) -> Vec<String> {
    row.iter().map(|felt| felt.to_hex()).collect()
}

/// A witness together with the output it hash-chains to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessAndOutput {
    pub witness: Witness,
    pub output: Row,
}

/// Contents of the hash-chain `--private_input_file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescuePrivateInput {
    pub witness: Vec<Vec<String>>,
}

impl WitnessAndOutput {
    pub fn private_input(&self) -> RescuePrivateInput {
        RescuePrivateInput {
            witness: self.witness.to_hex_rows(),
        }
    }
}

/// Random chain length: `HASHES_PER_INSTANCE * uniform(1..=MAX_RANDOM_INSTANCES)`.
pub fn random_chain_length<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    HASHES_PER_INSTANCE * rng.random_range(1..=MAX_RANDOM_INSTANCES)
}

/// Samples a random witness and computes its hash-chain output.
pub fn generate_witness_and_output<P, R>(
    chain_length: Option<u64>,
    permutation: &P,
    rng: &mut R,
) -> Result<WitnessAndOutput, HarnessError>
where
    P: OneWayPermutation + ?Sized,
    R: Rng + ?Sized,
{
    let chain_length = match chain_length {
        Some(length) => length,
        None => random_chain_length(rng),
    };
    let witness = Witness::random(chain_length, rng)?;
    let output = hash_chain(witness.rows(), permutation)?;
    Ok(WitnessAndOutput { witness, output })
}
