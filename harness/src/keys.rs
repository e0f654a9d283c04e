//! Signature key derivation
//!
//! The private key is a 32-byte seed. The public key is derived from it by
//! 1. hashing the seed under a fixed domain tag into a chain digest,
//! 2. pulling the first eight accepted elements of the hash-chain sampler
//!    seeded with that digest (the secret preimage),
//! 3. applying the one-way permutation to the preimage.
//!
//! Derivation is pure: the same seed always produces the same preimage and,
//! for a deterministic permutation, the same public key.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;
use crate::field::Felt;
use crate::hash::{blake2s_concat, DIGEST_LEN};
use crate::permutation::{OneWayPermutation, PERMUTATION_INPUT_WIDTH};
use crate::sampler::FieldSampler;
use crate::witness::{parse_row, row_to_hex, Row};

/// Domain separation prefix of the chain digest (NUL terminated).
pub const SECRET_PREIMAGE_DOMAIN_TAG: &[u8] = b"Ziggy secret preimage seed\0";

/// Elements in the secret preimage.
pub const SECRET_PREIMAGE_LEN: usize = PERMUTATION_INPUT_WIDTH;

/// Hashing rounds allowed before the sampler is declared stuck.
pub const MAX_SAMPLER_ROUNDS: u64 = 1024;

pub const SEED_LEN: usize = 32;

/// Private key material.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Seed([u8; SEED_LEN]);

impl Seed {
    pub const fn from_bytes(bytes: [u8; SEED_LEN]) -> Self {
        Seed(bytes)
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SEED_LEN];
        rng.fill(&mut bytes);
        Seed(bytes)
    }

    /// Parses a big-endian hex integer (optional `0x`) into 32 bytes,
    /// left-padding shorter values with zeros.
    pub fn from_hex(text: &str) -> Result<Self, HarnessError> {
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        if digits.is_empty() || digits.len() > 2 * SEED_LEN {
            return Err(HarnessError::InvalidParameter(format!(
                "private key must be 1 to {} hex digits, got {}",
                2 * SEED_LEN,
                digits.len()
            )));
        }
        let padded = format!("{digits:0>width$}", width = 2 * SEED_LEN);
        let mut bytes = [0u8; SEED_LEN];
        hex::decode_to_slice(&padded, &mut bytes).map_err(|error| {
            HarnessError::InvalidParameter(format!("private key {text:?} is not hex: {error}"))
        })?;
        Ok(Seed(bytes))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(..)")
    }
}

/// `BLAKE2s(domain_tag || seed)`.
pub fn chain_digest(seed: &Seed) -> [u8; DIGEST_LEN] {
    blake2s_concat(&[SECRET_PREIMAGE_DOMAIN_TAG, seed.as_bytes().as_slice()])
}

/// First eight accepted sampler elements for `seed`.
pub fn secret_preimage(seed: &Seed) -> Result<[Felt; SECRET_PREIMAGE_LEN], HarnessError> {
    let mut sampler = FieldSampler::new(chain_digest(seed));
    let felts = sampler.take(SECRET_PREIMAGE_LEN, MAX_SAMPLER_ROUNDS)?;
    let mut preimage = [Felt::ZERO; SECRET_PREIMAGE_LEN];
    preimage.copy_from_slice(&felts);
    Ok(preimage)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPair {
    pub private_key: Seed,
    pub public_key: Row,
}

/// Contents of the signature `--private_input_file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZiggyPrivateInput {
    pub private_key: String,
}

impl KeyPair {
    /// Parses a hex private key and a hex public key without re-deriving.
    pub fn from_hex<S: AsRef<str>>(private_key: &str, public_key: &[S]) -> Result<Self, HarnessError> {
        Ok(KeyPair {
            private_key: Seed::from_hex(private_key)?,
            public_key: parse_row(public_key)?,
        })
    }

    pub fn private_input(&self) -> ZiggyPrivateInput {
        ZiggyPrivateInput {
            private_key: self.private_key.to_hex(),
        }
    }

    pub fn public_key_hex(&self) -> Vec<String> {
        row_to_hex(&self.public_key)
    }
}

/// Derives a key pair from `seed`, or from a fresh random seed when `None`.
pub fn derive_key_pair<P, R>(
    seed: Option<Seed>,
    permutation: &P,
    rng: &mut R,
) -> Result<KeyPair, HarnessError>
where
    P: OneWayPermutation + ?Sized,
    R: Rng + ?Sized,
{
    let private_key = seed.unwrap_or_else(|| Seed::random(rng));
    let preimage = secret_preimage(&private_key)?;
    let public_key = permutation.permute(&preimage)?;
    Ok(KeyPair {
        private_key,
        public_key,
    })
}
