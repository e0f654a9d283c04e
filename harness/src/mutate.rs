//! Proof Byte Mutations
//!
//! A closed set of corruption operators over the prover's `proof_hex` field.
//! Every operator maps a well-formed proof hex string (`0x` followed by an even
//! number of hex digits, or the canonical empty value `0x0`) to another
//! well-formed string. Whether the verifier then fails to parse or rejects on
//! semantics is not predicted here.

use rand::Rng;

use crate::error::HarnessError;

/// The canonical empty proof.
pub const EMPTY_PROOF_HEX: &str = "0x0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProofMutation {
    Identity,
    /// Drops the last byte. A payload of one byte or less becomes `0x0`.
    TruncateLastByte,
    Empty,
    /// Drops one uniformly chosen byte. A payload of one byte or less becomes `0x0`.
    RemoveRandomByte,
    /// XORs one bit into one uniformly chosen digit.
    ///
    /// `0x0` has no digit to flip and is returned unchanged, so applied to the
    /// canonical empty proof this operator corrupts nothing.
    FlipRandomBit,
}

impl ProofMutation {
    pub const ALL: [ProofMutation; 5] = [
        ProofMutation::Identity,
        ProofMutation::TruncateLastByte,
        ProofMutation::Empty,
        ProofMutation::RemoveRandomByte,
        ProofMutation::FlipRandomBit,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ProofMutation::Identity => "identity",
            ProofMutation::TruncateLastByte => "truncate_last_byte",
            ProofMutation::Empty => "empty",
            ProofMutation::RemoveRandomByte => "remove_random_byte",
            ProofMutation::FlipRandomBit => "flip_random_bit",
        }
    }

    /// Raw transform over a payload of ASCII hex digits, as checked by
    /// [`ProofMutation::apply`]. Any other input is returned unchanged.
    pub fn transform<R: Rng + ?Sized>(self, proof_hex: &str, rng: &mut R) -> String {
        let payload = payload_of(proof_hex);
        // Byte offsets below assume one byte per digit.
        if !payload.is_ascii() {
            return proof_hex.to_string();
        }
        match self {
            ProofMutation::Identity => proof_hex.to_string(),
            ProofMutation::Empty => EMPTY_PROOF_HEX.to_string(),
            ProofMutation::TruncateLastByte => {
                let bytes = byte_aligned(payload);
                if bytes.len() <= 2 {
                    return EMPTY_PROOF_HEX.to_string();
                }
                format!("0x{}", &bytes[..bytes.len() - 2])
            }
            ProofMutation::RemoveRandomByte => {
                let bytes = byte_aligned(payload);
                if bytes.len() <= 2 {
                    return EMPTY_PROOF_HEX.to_string();
                }
                let index = rng.random_range(0..bytes.len() / 2);
                format!("0x{}{}", &bytes[..2 * index], &bytes[2 * index + 2..])
            }
            ProofMutation::FlipRandomBit => {
                if is_empty_payload(payload) {
                    return EMPTY_PROOF_HEX.to_string();
                }
                let index = rng.random_range(0..payload.len());
                let mask = 1u8 << rng.random_range(0..4u32);
                let mut digits = payload.as_bytes().to_vec();
                digits[index] = flip_nibble(digits[index], mask);
                // Only ASCII hex digits were touched.
                format!("0x{}", String::from_utf8_lossy(&digits))
            }
        }
    }

    /// Checked transform: rejects malformed input, and reports an operator
    /// that broke the encoding contract as an internal defect.
    pub fn apply<R: Rng + ?Sized>(self, proof_hex: &str, rng: &mut R) -> Result<String, HarnessError> {
        if !is_well_formed_hex(proof_hex) {
            return Err(HarnessError::InvalidParameter(format!(
                "proof hex is malformed (length {})",
                proof_hex.len()
            )));
        }
        let output = self.transform(proof_hex, rng);
        if !is_well_formed_hex(&output) {
            return Err(HarnessError::MutationInvariantViolation {
                operator: self.name(),
                output,
            });
        }
        Ok(output)
    }
}

/// `0x` followed by a non-empty even run of hex digits, or exactly `0x0`.
pub fn is_well_formed_hex(text: &str) -> bool {
    let Some(payload) = text.strip_prefix("0x") else {
        return false;
    };
    if text == EMPTY_PROOF_HEX {
        return true;
    }
    !payload.is_empty()
        && payload.len() % 2 == 0
        && payload.bytes().all(|b| b.is_ascii_hexdigit())
}

fn payload_of(proof_hex: &str) -> &str {
    proof_hex.strip_prefix("0x").unwrap_or(proof_hex)
}

fn is_empty_payload(payload: &str) -> bool {
    payload.is_empty() || payload == "0"
}

/// Left-pads an odd digit count with one zero so pairs line up with bytes.
fn byte_aligned(payload: &str) -> String {
    if is_empty_payload(payload) {
        return String::new();
    }
    if payload.len() % 2 == 1 {
        format!("0{payload}")
    } else {
        payload.to_string()
    }
}

fn flip_nibble(digit: u8, mask: u8) -> u8 {
    let value = (digit as char).to_digit(16).unwrap_or(0) as u8;
    let flipped = (value ^ mask) & 0xf;
    // Case of the flipped digit follows the input digit.
    let lower = b"0123456789abcdef"[flipped as usize];
    if digit.is_ascii_uppercase() {
        lower.to_ascii_uppercase()
    } else {
        lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn random_proof<R: Rng>(rng: &mut R, bytes: usize) -> String {
        let mut raw = vec![0u8; bytes];
        rng.fill(raw.as_mut_slice());
        format!("0x{}", hex::encode(raw))
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = ProofMutation::ALL.iter().map(|m| m.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ProofMutation::ALL.len());
    }

    #[test]
    fn test_identity_and_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(ProofMutation::Identity.transform("0xabcd", &mut rng), "0xabcd");
        assert_eq!(ProofMutation::Empty.transform("0xabcd", &mut rng), EMPTY_PROOF_HEX);
        assert_eq!(ProofMutation::Empty.transform("0x0", &mut rng), EMPTY_PROOF_HEX);
    }

    #[test]
    fn test_truncate_single_byte_yields_canonical_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(ProofMutation::TruncateLastByte.transform("0xab", &mut rng), "0x0");
        assert_eq!(ProofMutation::TruncateLastByte.transform("0x0", &mut rng), "0x0");
        assert_eq!(ProofMutation::TruncateLastByte.transform("0xabcd", &mut rng), "0xab");
        // Odd payloads are aligned first.
        assert_eq!(ProofMutation::TruncateLastByte.transform("0x123", &mut rng), "0x01");
    }

    #[test]
    fn test_remove_random_byte_reaches_every_position() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..500 {
            let out = ProofMutation::RemoveRandomByte.transform("0x112233", &mut rng);
            assert_eq!(out.len(), 6);
            seen.insert(out);
        }
        let expected: std::collections::BTreeSet<String> =
            ["0x2233", "0x1133", "0x1122"].iter().map(|s| s.to_string()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_remove_random_byte_small_payloads() {
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(ProofMutation::RemoveRandomByte.transform("0xff", &mut rng), "0x0");
        assert_eq!(ProofMutation::RemoveRandomByte.transform("0x0", &mut rng), "0x0");
        let out = ProofMutation::RemoveRandomByte.transform("0x123", &mut rng);
        assert!(out == "0x23" || out == "0x01", "{out}");
    }

    #[test]
    fn test_flip_random_bit_changes_one_nibble() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let proof = random_proof(&mut rng, 40);
            let out = ProofMutation::FlipRandomBit.transform(&proof, &mut rng);
            assert_eq!(out.len(), proof.len());
            let diffs: Vec<_> = proof
                .bytes()
                .zip(out.bytes())
                .enumerate()
                .filter(|(_, (a, b))| a != b)
                .collect();
            assert_eq!(diffs.len(), 1);
            let (position, (a, b)) = diffs[0];
            assert!(position >= 2);
            let xor = (a as char).to_digit(16).expect("hex") ^ (b as char).to_digit(16).expect("hex");
            assert_eq!(xor.count_ones(), 1);
        }
    }

    #[test]
    fn test_flip_preserves_uppercase() {
        assert_eq!(flip_nibble(b'A', 1), b'B');
        assert_eq!(flip_nibble(b'f', 8), b'7');
        assert_eq!(flip_nibble(b'0', 4), b'4');
    }

    #[test]
    fn test_every_operator_keeps_hex_contract() {
        let mut rng = StdRng::seed_from_u64(4);
        for bytes in [1usize, 2, 3, 17, 256] {
            for _ in 0..20 {
                let proof = random_proof(&mut rng, bytes);
                for mutation in ProofMutation::ALL {
                    let out = mutation.apply(&proof, &mut rng).expect("contract holds");
                    assert!(is_well_formed_hex(&out), "{} -> {out}", mutation.name());
                }
            }
        }
        for mutation in ProofMutation::ALL {
            assert_eq!(mutation.apply(EMPTY_PROOF_HEX, &mut rng).expect("empty"), EMPTY_PROOF_HEX);
        }
    }

    #[test]
    fn test_apply_rejects_malformed_input() {
        let mut rng = StdRng::seed_from_u64(5);
        for bad in ["", "0x", "abcd", "0xabc", "0xzz", "0xé1"] {
            let err = ProofMutation::Identity.apply(bad, &mut rng).expect_err(bad);
            assert_eq!(err.kind(), "invalid_parameter");
        }
    }

    #[test]
    fn test_transform_leaves_non_ascii_payload_alone() {
        let mut rng = StdRng::seed_from_u64(6);
        for mutation in ProofMutation::ALL {
            if mutation == ProofMutation::Empty {
                continue;
            }
            assert_eq!(mutation.transform("0xé1", &mut rng), "0xé1", "{}", mutation.name());
        }
    }

    #[test]
    fn test_flip_on_canonical_empty_is_unchanged() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(ProofMutation::FlipRandomBit.transform("0x0", &mut rng), EMPTY_PROOF_HEX);
        }
        let out = ProofMutation::FlipRandomBit.apply("0x00", &mut rng).expect("one byte");
        assert_ne!(out, "0x00");
    }

    #[test]
    fn test_well_formed_hex() {
        assert!(is_well_formed_hex("0x0"));
        assert!(is_well_formed_hex("0x00"));
        assert!(is_well_formed_hex("0xDEADbeef"));
        assert!(!is_well_formed_hex("0x"));
        assert!(!is_well_formed_hex("0x000"));
        assert!(!is_well_formed_hex("0X00"));
    }
}
