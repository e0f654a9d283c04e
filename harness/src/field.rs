//! Base Field Arithmetic (shared with the external prover and verifier)
//!
//! Canonical, non-Montgomery values modulo the 62-bit prime
//! 2^61 + 20 * 2^32 + 1. Only what the harness needs lives here: the
//! Montgomery denormalisation used by the hash-chain sampler and hex
//! conversions for the JSON file contract.

use rand::Rng;

use crate::error::HarnessError;

/// Field prime: 2^61 + 20 * 2^32 + 1.
pub const PRIME: u64 = 0x2000001400000001;

/// Number of significant bits in [`PRIME`].
pub const PRIME_BITS: u32 = u64::BITS - PRIME.leading_zeros();

/// Keeps exactly `PRIME_BITS` low bits of a sampled word.
pub const CANDIDATE_MASK: u64 = (1u64 << PRIME_BITS) - 1;

/// 2^64 mod PRIME, the Montgomery radix of the external field library.
pub const MONTGOMERY_R: u64 = 0x1fffff73fffffff9;

/// 2^-64 mod PRIME, computed as ((PRIME + 1) / 2)^64.
pub const MONTGOMERY_R_INV: u64 = BaseField::pow((PRIME + 1) / 2, 64);

pub struct BaseField;

impl BaseField {
    #[inline(always)]
    pub const fn mul(a: u64, b: u64) -> u64 {
        ((a as u128 * b as u128) % PRIME as u128) as u64
    }

    pub const fn pow(base: u64, exp: u64) -> u64 {
        let mut result = 1u64;
        let mut b = base % PRIME;
        let mut e = exp;
        while e > 0 {
            if e & 1 == 1 {
                result = Self::mul(result, b);
            }
            b = Self::mul(b, b);
            e >>= 1;
        }
        result
    }

    /// Converts a Montgomery residue `x * 2^64` back into canonical form.
    #[inline]
    pub const fn from_montgomery(residue: u64) -> u64 {
        Self::mul(residue, MONTGOMERY_R_INV)
    }
}

/// A field element, always strictly below [`PRIME`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Felt(u64);

impl Felt {
    pub const ZERO: Felt = Felt(0);

    /// Returns `None` when `value` is not a canonical representative.
    pub const fn new(value: u64) -> Option<Self> {
        if value < PRIME {
            Some(Felt(value))
        } else {
            None
        }
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Uniformly random element in `[0, PRIME)`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Felt(rng.random_range(0..PRIME))
    }

    /// Parses `0x`-prefixed hex and rejects values outside the field.
    pub fn from_hex(text: &str) -> Result<Self, HarnessError> {
        let value = parse_hex_u64(text)?;
        Felt::new(value).ok_or_else(|| {
            HarnessError::InvalidParameter(format!("{text} is not below the field prime"))
        })
    }

    /// Lowercase, `0x`-prefixed, no zero padding (`0x0` for zero).
    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }
}

/// Parses a `0x`-prefixed hex word without any range check.
pub fn parse_hex_u64(text: &str) -> Result<u64, HarnessError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .ok_or_else(|| HarnessError::InvalidParameter(format!("{text:?} lacks a 0x prefix")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|error| HarnessError::InvalidParameter(format!("{text:?} is not a hex word: {error}")))
}
