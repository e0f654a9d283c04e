#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use stark_harness::error::HarnessError;
use stark_harness::field::{Felt, PRIME};
use stark_harness::hash::blake2s;
use stark_harness::permutation::{
    OneWayPermutation, PERMUTATION_INPUT_WIDTH, PERMUTATION_OUTPUT_WIDTH,
};
use stark_harness::runner::SchemeBinaries;

/// Deterministic stand-in for the real permutation: BLAKE2s of the input
/// words, split into four words reduced below the prime.
pub struct ToyPermutation;

impl OneWayPermutation for ToyPermutation {
    fn permute(
        &self,
        input: &[Felt; PERMUTATION_INPUT_WIDTH],
    ) -> Result<[Felt; PERMUTATION_OUTPUT_WIDTH], HarnessError> {
        let bytes: Vec<u8> = input.iter().flat_map(|f| f.value().to_be_bytes()).collect();
        let digest = blake2s(&bytes);
        let mut out = [Felt::ZERO; PERMUTATION_OUTPUT_WIDTH];
        for (slot, chunk) in out.iter_mut().zip(digest.chunks_exact(8)) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            *slot = Felt::new(u64::from_be_bytes(word) % PRIME).expect("reduced");
        }
        Ok(out)
    }
}

pub fn mock_stark() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_mock-stark"))
}

pub fn mock_binaries() -> SchemeBinaries {
    SchemeBinaries {
        prover: mock_stark(),
        verifier: mock_stark(),
    }
}

/// Writes an executable shell script.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("script should be written");
    let mut permissions = fs::metadata(&path).expect("script metadata").permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).expect("script should be executable");
    path
}
