//! Proof Artifact and File Contract
//!
//! The prover writes `{proof_hex, annotations, public_input, ..}` to its
//! `--out_file`; the harness reads it, rewrites it after mutation and hands
//! the rewritten file to the verifier. Fields the harness does not know about
//! are carried through untouched.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::HarnessError;
use crate::mutate::{is_well_formed_hex, EMPTY_PROOF_HEX};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofArtifact {
    pub proof_hex: String,
    #[serde(default)]
    pub annotations: Vec<String>,
    pub public_input: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProofArtifact {
    /// Reads an artifact and checks that its payload is well-formed hex.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let artifact: ProofArtifact = read_json(path)?;
        if !is_well_formed_hex(&artifact.proof_hex) {
            return Err(HarnessError::InvalidParameter(format!(
                "{} holds a malformed proof_hex",
                path.display()
            )));
        }
        Ok(artifact)
    }

    pub fn save(&self, path: &Path) -> Result<(), HarnessError> {
        write_json(path, self)
    }

    /// Annotation lines joined the way the verifier writes its annotation file.
    pub fn annotation_log(&self) -> String {
        let mut log = self.annotations.join("\n");
        log.push('\n');
        log
    }

    /// Payload size in bytes (zero for the canonical empty proof).
    pub fn proof_len(&self) -> usize {
        if self.proof_hex == EMPTY_PROOF_HEX {
            return 0;
        }
        self.proof_hex.len().saturating_sub(2) / 2
    }

    pub fn summary(&self) -> String {
        format!(
            "Proof Artifact Summary:\n\
             - Proof: {} bytes ({:.1} KB)\n\
             - Annotations: {} lines\n\
             - Public input fields: {}\n\
             - Extra fields: {}",
            self.proof_len(),
            self.proof_len() as f64 / 1024.0,
            self.annotations.len(),
            self.public_input.as_object().map_or(0, Map::len),
            self.extra.len(),
        )
    }
}

/// Compares the prover's annotation log with the verifier's annotation file
/// contents byte for byte, reporting the first differing line (1-based).
pub fn compare_annotations(expected: &str, actual: &str) -> Result<(), HarnessError> {
    if expected == actual {
        return Ok(());
    }
    let mut expected_lines = expected.split('\n');
    let mut actual_lines = actual.split('\n');
    let mut line = 1;
    loop {
        match (expected_lines.next(), actual_lines.next()) {
            (Some(a), Some(b)) if a == b => line += 1,
            _ => return Err(HarnessError::AnnotationMismatch { line }),
        }
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, HarnessError> {
    let text = fs::read_to_string(path).map_err(|error| HarnessError::io(path, error))?;
    serde_json::from_str(&text).map_err(|error| HarnessError::json(path.display().to_string(), error))
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), HarnessError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|error| HarnessError::json(path.display().to_string(), error))?;
    fs::write(path, text).map_err(|error| HarnessError::io(path, error))
}
