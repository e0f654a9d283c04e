//! Public claims and their corruptions
//!
//! The claim is the `public_input` block the prover echoes into its artifact.
//! Each scheme has a closed set of corruptions; exactly one field of the claim
//! is touched per call. A corruption may, with negligible probability, land on
//! a value the verifier also accepts; that case is not guarded against.

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::HarnessError;
use crate::field::parse_hex_u64;
use crate::witness::{HASHES_PER_INSTANCE, WORD_SIZE};

/// Distance a corrupted chain-length claim moves from the true length.
pub const CHAIN_LENGTH_SHIFT: i64 = HASHES_PER_INSTANCE as i64;

/// Replacement for a corrupted chain length that fell to zero or below. Kept a
/// multiple of [`HASHES_PER_INSTANCE`] so it stays a well-formed claim.
pub const FALLBACK_CHAIN_LENGTH: i64 = 2 * HASHES_PER_INSTANCE as i64;

/// Highest bit flipped inside a claimed 64-bit word.
pub const MAX_WORD_FLIP_BIT: u32 = 60;

/// Highest bit flipped inside a message character.
pub const MAX_CHAR_FLIP_BIT: u32 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescueClaim {
    pub output: Vec<String>,
    pub chain_length: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZiggyClaim {
    pub message: String,
    pub public_key: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RescueClaimCorruption {
    ChainLength,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZiggyClaimCorruption {
    Message,
    PublicKey,
}

impl RescueClaimCorruption {
    pub const ALL: [RescueClaimCorruption; 2] =
        [RescueClaimCorruption::ChainLength, RescueClaimCorruption::Output];

    pub const fn name(self) -> &'static str {
        match self {
            RescueClaimCorruption::ChainLength => "chain_length",
            RescueClaimCorruption::Output => "output",
        }
    }

    pub fn apply<R: Rng + ?Sized>(self, claim: &mut RescueClaim, rng: &mut R) -> Result<(), HarnessError> {
        match self {
            RescueClaimCorruption::ChainLength => {
                claim.chain_length = shift_chain_length(claim.chain_length, rng);
                Ok(())
            }
            RescueClaimCorruption::Output => flip_word_bit(&mut claim.output, rng),
        }
    }
}

impl ZiggyClaimCorruption {
    pub const ALL: [ZiggyClaimCorruption; 2] =
        [ZiggyClaimCorruption::Message, ZiggyClaimCorruption::PublicKey];

    pub const fn name(self) -> &'static str {
        match self {
            ZiggyClaimCorruption::Message => "message",
            ZiggyClaimCorruption::PublicKey => "public_key",
        }
    }

    pub fn apply<R: Rng + ?Sized>(self, claim: &mut ZiggyClaim, rng: &mut R) -> Result<(), HarnessError> {
        match self {
            ZiggyClaimCorruption::Message => {
                claim.message = flip_char_bit(&claim.message, rng)?;
                Ok(())
            }
            ZiggyClaimCorruption::PublicKey => flip_word_bit(&mut claim.public_key, rng),
        }
    }
}

/// `length ± 3` with a random sign, replaced by the fallback when not positive.
pub fn shift_chain_length<R: Rng + ?Sized>(chain_length: i64, rng: &mut R) -> i64 {
    let shifted = if rng.random_bool(0.5) {
        chain_length.saturating_add(CHAIN_LENGTH_SHIFT)
    } else {
        chain_length.saturating_sub(CHAIN_LENGTH_SHIFT)
    };
    if shifted > 0 {
        shifted
    } else {
        FALLBACK_CHAIN_LENGTH
    }
}

/// Flips one bit in `0..=60` of one randomly chosen word.
pub fn flip_word_bit<R: Rng + ?Sized>(words: &mut [String], rng: &mut R) -> Result<(), HarnessError> {
    if words.len() != WORD_SIZE {
        return Err(HarnessError::InvalidParameter(format!(
            "claim vector has {} words, expected {WORD_SIZE}",
            words.len()
        )));
    }
    let index = rng.random_range(0..WORD_SIZE);
    let value = parse_hex_u64(&words[index])?;
    let bit = rng.random_range(0..=MAX_WORD_FLIP_BIT);
    words[index] = format!("{:#x}", value ^ (1u64 << bit));
    Ok(())
}

/// Flips one bit in `0..=7` of one randomly chosen character.
pub fn flip_char_bit<R: Rng + ?Sized>(message: &str, rng: &mut R) -> Result<String, HarnessError> {
    let mut chars: Vec<char> = message.chars().collect();
    if chars.is_empty() {
        return Err(HarnessError::InvalidParameter("cannot corrupt an empty message".into()));
    }
    let index = rng.random_range(0..chars.len());
    let mask = 1u32 << rng.random_range(0..=MAX_CHAR_FLIP_BIT);
    let code = chars[index] as u32 ^ mask;
    chars[index] = char::from_u32(code).ok_or_else(|| {
        HarnessError::Internal(format!("bit flip produced invalid code point {code:#x}"))
    })?;
    Ok(chars.into_iter().collect())
}

/// Deserializes a claim out of an artifact's `public_input` block.
pub fn claim_from_value<T: DeserializeOwned>(value: &Value) -> Result<T, HarnessError> {
    serde_json::from_value(value.clone()).map_err(|error| HarnessError::json("public_input", error))
}

pub fn claim_to_value<T: Serialize>(claim: &T) -> Result<Value, HarnessError> {
    serde_json::to_value(claim).map_err(|error| HarnessError::json("public_input", error))
}
