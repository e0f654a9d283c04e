//! Golden Fixtures
//!
//! Fixed inputs with known answers, used by the golden scenarios:
//!   - Hash chain: a 4-row witness (chain length 3) and its chained output
//!   - Signature: the key pair derived from the seed 0x000102..1f
//!
//! Both are checked against the real permutation only when one is configured;
//! the scenarios themselves pass them straight to the external prover.

use crate::error::HarnessError;
use crate::keys::KeyPair;
use crate::witness::{parse_row, Row, Witness, WitnessAndOutput};

pub const GOLDEN_RESCUE_WITNESS: [[&str; 4]; 4] = [
    ["0x1", "0x2", "0x3", "0x4"],
    ["0x5", "0x6", "0x7", "0x8"],
    ["0x1", "0x2", "0x3", "0x4"],
    ["0x5", "0x6", "0x7", "0x8"],
];

pub const GOLDEN_RESCUE_OUTPUT: [&str; 4] = [
    "0x68956e24301f0d6",
    "0x1db6f48d1e36f2b4",
    "0x15ba54b9652e4c33",
    "0x199d7c05484a2ff8",
];

pub const GOLDEN_ZIGGY_PRIVATE_KEY: &str =
    "0x000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

pub const GOLDEN_ZIGGY_PUBLIC_KEY: [&str; 4] = [
    "0x9fe62e51380bdfc",
    "0x176df573b3bf5d69",
    "0xdac18e0d0724b33",
    "0x1dbba6f8ff63183a",
];

/// Golden hash-chain witness with its precomputed output.
pub fn golden_rescue() -> Result<WitnessAndOutput, HarnessError> {
    let rows = GOLDEN_RESCUE_WITNESS
        .iter()
        .map(|row| parse_row(row))
        .collect::<Result<Vec<Row>, _>>()?;
    Ok(WitnessAndOutput {
        witness: Witness::from_rows(rows)?,
        output: parse_row(&GOLDEN_RESCUE_OUTPUT)?,
    })
}

/// Golden signature key pair.
pub fn golden_ziggy() -> Result<KeyPair, HarnessError> {
    KeyPair::from_hex(GOLDEN_ZIGGY_PRIVATE_KEY, &GOLDEN_ZIGGY_PUBLIC_KEY)
}
