//! Harness configuration
//!
//! Loaded from an optional JSON file; every field has a default so a partial
//! file (or none at all) is valid. CLI flags override individual fields.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::artifact::read_json;
use crate::error::HarnessError;
use crate::permutation::{CommandPermutation, OneWayPermutation, UnconfiguredPermutation};
use crate::runner::SchemeBinaries;
use crate::scheme::Scheme;

/// Environment variable holding the permutation command line.
pub const PERMUTATION_CMD_ENV: &str = "STARK_HARNESS_PERMUTATION_CMD";

pub const DEFAULT_BUILD_DIR: &str = "build";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// CMake build flavor the binaries were built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Flavor {
    #[default]
    Release,
    RelWithDebInfo,
    Debug,
}

impl Flavor {
    pub const fn as_str(self) -> &'static str {
        match self {
            Flavor::Release => "Release",
            Flavor::RelWithDebInfo => "RelWithDebInfo",
            Flavor::Debug => "Debug",
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flavor {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Release" => Ok(Flavor::Release),
            "RelWithDebInfo" => Ok(Flavor::RelWithDebInfo),
            "Debug" => Ok(Flavor::Debug),
            other => Err(HarnessError::InvalidParameter(format!(
                "unknown flavor {other:?}; use Release, RelWithDebInfo or Debug"
            ))),
        }
    }
}

/// Explicit executable paths for one scheme; either may be left unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinaryOverride {
    pub prover: Option<PathBuf>,
    pub verifier: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub build_dir: PathBuf,
    pub flavor: Flavor,
    pub timeout_secs: u64,
    pub jobs: usize,
    /// Master seed; a random one is drawn (and reported) when unset.
    pub seed: Option<u64>,
    /// Program and arguments of the external permutation.
    pub permutation_command: Option<Vec<String>>,
    /// Keyed by scheme name.
    pub binaries: BTreeMap<String, BinaryOverride>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            flavor: Flavor::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            jobs: 1,
            seed: None,
            permutation_command: None,
            binaries: BTreeMap::new(),
        }
    }
}

impl HarnessConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, HarnessError> {
        read_json(path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `<build_dir>/<flavor>/src/starkware/main/<scheme>/<scheme>_{prover,verifier}`,
    /// with per-scheme overrides taking precedence.
    pub fn binaries<S: Scheme>(&self) -> SchemeBinaries {
        let dir = self
            .build_dir
            .join(self.flavor.as_str())
            .join("src/starkware/main")
            .join(S::NAME);
        let overrides = self.binaries.get(S::NAME).cloned().unwrap_or_default();
        SchemeBinaries {
            prover: overrides.prover.unwrap_or_else(|| dir.join(S::prover_exe())),
            verifier: overrides.verifier.unwrap_or_else(|| dir.join(S::verifier_exe())),
        }
    }

    /// Fills `permutation_command` from [`PERMUTATION_CMD_ENV`] when unset.
    pub fn with_env_permutation(mut self) -> Self {
        if self.permutation_command.is_none() {
            if let Ok(line) = std::env::var(PERMUTATION_CMD_ENV) {
                let command = split_command_line(&line);
                if !command.is_empty() {
                    self.permutation_command = Some(command);
                }
            }
        }
        self
    }

    pub fn permutation(&self) -> Result<Box<dyn OneWayPermutation>, HarnessError> {
        match &self.permutation_command {
            None => Ok(Box::new(UnconfiguredPermutation)),
            Some(command) => {
                let (program, args) = command.split_first().ok_or_else(|| {
                    HarnessError::InvalidParameter("permutation_command is empty".into())
                })?;
                Ok(Box::new(CommandPermutation::new(
                    program,
                    args.to_vec(),
                    self.timeout(),
                )))
            }
        }
    }
}

/// Whitespace-separated command line; no quoting.
pub fn split_command_line(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::{Rescue, Ziggy};

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.flavor, Flavor::Release);
        assert_eq!(config.timeout(), Duration::from_secs(600));
        assert_eq!(config.jobs, 1);
    }

    #[test]
    fn test_binary_layout() {
        let config = HarnessConfig {
            flavor: Flavor::Debug,
            ..HarnessConfig::default()
        };
        let binaries = config.binaries::<Rescue>();
        assert_eq!(
            binaries.prover,
            PathBuf::from("build/Debug/src/starkware/main/rescue/rescue_prover")
        );
        assert_eq!(
            binaries.verifier,
            PathBuf::from("build/Debug/src/starkware/main/rescue/rescue_verifier")
        );
    }

    #[test]
    fn test_overrides_apply_per_scheme() {
        let config: HarnessConfig = serde_json::from_str(
            r#"{"binaries": {"ziggy": {"prover": "/opt/zp"}}, "jobs": 4}"#,
        )
        .expect("partial config");
        assert_eq!(config.jobs, 4);
        assert_eq!(config.flavor, Flavor::Release);
        let ziggy = config.binaries::<Ziggy>();
        assert_eq!(ziggy.prover, PathBuf::from("/opt/zp"));
        assert!(ziggy.verifier.ends_with("ziggy/ziggy_verifier"));
        assert!(config.binaries::<Rescue>().prover.ends_with("rescue/rescue_prover"));
    }

    #[test]
    fn test_flavor_parsing() {
        for flavor in [Flavor::Release, Flavor::RelWithDebInfo, Flavor::Debug] {
            assert_eq!(flavor.to_string().parse::<Flavor>().expect("round"), flavor);
        }
        assert!("release".parse::<Flavor>().is_err());
    }

    #[test]
    fn test_permutation_selection() {
        let mut config = HarnessConfig::default();
        assert!(config.permutation().is_ok());
        config.permutation_command = Some(Vec::new());
        assert_eq!(config.permutation().err().map(|e| e.kind()), Some("invalid_parameter"));
        config.permutation_command = Some(split_command_line("python3  rescue.py --fast"));
        assert_eq!(
            config.permutation_command.as_deref(),
            Some(&["python3".to_string(), "rescue.py".to_string(), "--fast".to_string()][..])
        );
        assert!(config.permutation().is_ok());
    }
}
