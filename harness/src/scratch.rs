//! Per-scenario scratch directory, removed on drop.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::error::HarnessError;

pub const PARAMETER_FILE: &str = "parameters.json";
pub const PUBLIC_INPUT_FILE: &str = "public_input.json";
pub const PRIVATE_INPUT_FILE: &str = "private_input.json";
pub const PROVER_CONFIG_FILE: &str = "prover_config.json";
pub const PROOF_FILE: &str = "proof.json";
pub const MODIFIED_PROOF_FILE: &str = "modified_proof.json";
pub const VERIFIER_ANNOTATION_FILE: &str = "verifier_annotations.txt";

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Creates a fresh directory under the system temp dir. The name combines
    /// the process id, a process-wide counter and the clock, so concurrent
    /// scenarios and concurrent harness processes never share one.
    pub fn new(label: &str) -> Result<Self, HarnessError> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        let name = format!(
            "stark-harness-{label}-{}-{}-{nanos:08x}",
            std::process::id(),
            NEXT_ID.fetch_add(1, Ordering::Relaxed)
        );
        let path = std::env::temp_dir().join(name);
        fs::create_dir_all(&path).map_err(|error| HarnessError::io(&path, error))?;
        Ok(ScratchDir { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_dir_all(&self.path) {
            warn!(path = %self.path.display(), %error, "failed to remove scratch directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directories_are_unique_and_removed() {
        let a = ScratchDir::new("test").expect("scratch");
        let b = ScratchDir::new("test").expect("scratch");
        assert_ne!(a.path(), b.path());
        fs::write(a.file(PROOF_FILE), "{}").expect("write");
        let kept = a.path().to_path_buf();
        assert!(kept.join(PROOF_FILE).exists());
        drop(a);
        assert!(!kept.exists());
        assert!(b.path().exists());
    }

    #[test]
    fn test_removed_on_unwind() {
        let path = std::panic::catch_unwind(|| {
            let scratch = ScratchDir::new("unwind").expect("scratch");
            let path = scratch.path().to_path_buf();
            if path.exists() {
                panic!("{}", path.display());
            }
            path
        });
        let message = path.expect_err("panicked");
        let shown = message
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert!(!shown.is_empty());
        assert!(!Path::new(&shown).exists());
    }
}
