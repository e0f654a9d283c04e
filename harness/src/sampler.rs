//! Hash-chain field-element sampler
//!
//! Expands a 32-byte seed digest into a stream of field elements. Round `i`
//! hashes `seed_digest || be32(i)` and splits the digest into four big-endian
//! words. Each word is masked to the bit length of the prime and rejected if it
//! is not below the prime; accepted words are Montgomery residues and are
//! converted to canonical form before being emitted.
//!
//! The stream is infinite and restartable: the same seed digest always yields
//! the same elements from round 0. Callers pull through [`FieldSampler::take`]
//! with an explicit round bound.

use crate::error::HarnessError;
use crate::field::{BaseField, Felt, CANDIDATE_MASK, PRIME};
use crate::hash::{be_u64_padded, blake2s_concat, DIGEST_LEN};

/// Candidate words produced by one hashing round.
pub const WORDS_PER_ROUND: usize = DIGEST_LEN / 8;

pub struct FieldSampler {
    seed_digest: [u8; DIGEST_LEN],
    counter: u64,
    words: [u64; WORDS_PER_ROUND],
    cursor: usize,
}

impl FieldSampler {
    pub fn new(seed_digest: [u8; DIGEST_LEN]) -> Self {
        FieldSampler {
            seed_digest,
            counter: 0,
            words: [0; WORDS_PER_ROUND],
            cursor: WORDS_PER_ROUND,
        }
    }

    /// Number of hashing rounds performed so far.
    pub fn rounds(&self) -> u64 {
        self.counter
    }

    fn refill(&mut self) {
        let digest = blake2s_concat(&[
            self.seed_digest.as_slice(),
            be_u64_padded(self.counter).as_slice(),
        ]);
        for (word, chunk) in self.words.iter_mut().zip(digest.chunks_exact(8)) {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            *word = u64::from_be_bytes(bytes);
        }
        self.counter += 1;
        self.cursor = 0;
    }

    /// Consumes one candidate word. Returns the canonical element when the
    /// candidate is accepted, `None` when it is rejected.
    pub fn pull(&mut self) -> Option<Felt> {
        if self.cursor == WORDS_PER_ROUND {
            self.refill();
        }
        let candidate = self.words[self.cursor] & CANDIDATE_MASK;
        self.cursor += 1;
        if candidate >= PRIME {
            return None;
        }
        Felt::new(BaseField::from_montgomery(candidate))
    }

    /// Collects the next `count` accepted elements, giving up once more than
    /// `max_rounds` hashing rounds would be needed.
    pub fn take(&mut self, count: usize, max_rounds: u64) -> Result<Vec<Felt>, HarnessError> {
        let mut out = Vec::with_capacity(count);
        while out.len() < count {
            if self.cursor == WORDS_PER_ROUND && self.counter >= max_rounds {
                return Err(HarnessError::Internal(format!(
                    "sampler accepted {} of {count} elements within {max_rounds} rounds",
                    out.len()
                )));
            }
            if let Some(felt) = self.pull() {
                out.push(felt);
            }
        }
        Ok(out)
    }
}
