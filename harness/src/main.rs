//! STARK Harness CLI
//!
//! Generates example prover inputs and runs the end-to-end scenario suites
//! against built prover/verifier binaries.
//!
//! Usage:
//!   stark-harness rescue-input --chain_length 9
//!   stark-harness ziggy-keys --private_key 0x01 --message "Hello World!"
//!   stark-harness run --scheme all --flavor Release --jobs 4 --report report.json

#[cfg(feature = "cli")]
mod cli {
    use std::path::{Path, PathBuf};

    use clap::{Parser, Subcommand};
    use serde::Serialize;
    use tracing::info;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;

    use stark_harness::artifact::write_json;
    use stark_harness::claim::{RescueClaim, ZiggyClaim};
    use stark_harness::config::{split_command_line, HarnessConfig};
    use stark_harness::error::HarnessError;
    use stark_harness::keys::{derive_key_pair, Seed};
    use stark_harness::runner::SuiteReport;
    use stark_harness::scenario::{ScenarioProgress, Stage, RESCUE_SCENARIOS, ZIGGY_SCENARIOS};
    use stark_harness::scheme::DEFAULT_MESSAGE;
    use stark_harness::witness::{generate_witness_and_output, row_to_hex};

    /// STARK Harness CLI
    #[derive(Parser, Debug)]
    #[command(name = "stark-harness")]
    #[command(about = "Key derivation and adversarial end-to-end tests for STARK provers")]
    struct Args {
        /// JSON configuration file; flags override its fields
        #[arg(long, global = true)]
        config: Option<PathBuf>,

        /// External permutation command line (program and arguments)
        #[arg(long, global = true)]
        permutation_cmd: Option<String>,

        /// Verbose output
        #[arg(short, long, global = true)]
        verbose: bool,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand, Debug)]
    enum Command {
        /// Write a random hash-chain witness and its public claim
        RescueInput {
            /// Hashes in the chain (multiple of 3); random when omitted
            #[arg(long = "chain_length")]
            chain_length: Option<u64>,

            #[arg(long, default_value = ".")]
            out_dir: PathBuf,
        },
        /// Derive a signature key pair and write private/public inputs
        ZiggyKeys {
            /// 32-byte hex private key; random when omitted
            #[arg(long = "private_key")]
            private_key: Option<String>,

            #[arg(long, default_value = DEFAULT_MESSAGE)]
            message: String,

            #[arg(long, default_value = ".")]
            out_dir: PathBuf,
        },
        /// Run scenario suites: rescue, ziggy or all
        Run {
            #[arg(long, default_value = "all")]
            scheme: String,

            /// Release, RelWithDebInfo or Debug
            #[arg(long)]
            flavor: Option<String>,

            #[arg(long)]
            build_dir: Option<PathBuf>,

            #[arg(long)]
            timeout_secs: Option<u64>,

            /// Scenarios run concurrently
            #[arg(long)]
            jobs: Option<usize>,

            /// Master seed for reproducible runs
            #[arg(long)]
            seed: Option<u64>,

            /// Write the JSON suite report here
            #[arg(long)]
            report: Option<PathBuf>,
        },
    }

    fn init_logging(verbose: bool) {
        let default = if verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    fn load_config(args: &Args) -> Result<HarnessConfig, HarnessError> {
        let mut config = match &args.config {
            Some(path) => HarnessConfig::from_json_file(path)?,
            None => HarnessConfig::default(),
        };
        if let Some(line) = &args.permutation_cmd {
            config.permutation_command = Some(split_command_line(line));
        }
        Ok(config.with_env_permutation())
    }

    fn write_pair<A: Serialize, B: Serialize>(
        out_dir: &Path,
        prefix: &str,
        private: &A,
        public: &B,
    ) -> Result<(), HarnessError> {
        std::fs::create_dir_all(out_dir).map_err(|error| HarnessError::Io {
            path: out_dir.to_path_buf(),
            source: error,
        })?;
        let private_path = out_dir.join(format!("{prefix}_private_input.json"));
        let public_path = out_dir.join(format!("{prefix}_public_input.json"));
        write_json(&private_path, private)?;
        write_json(&public_path, public)?;
        println!("Wrote {}", private_path.display());
        println!("Wrote {}", public_path.display());
        Ok(())
    }

    fn progress_cb(verbose: bool) -> Box<dyn Fn(ScenarioProgress) + Sync> {
        if verbose {
            Box::new(|p: ScenarioProgress| {
                println!(
                    "[{}/{}] {} - {} ({}%)",
                    p.scheme,
                    p.scenario,
                    p.stage.name(),
                    p.detail,
                    p.stage.percent()
                );
            })
        } else {
            Box::new(|p: ScenarioProgress| {
                if p.stage == Stage::Init || p.stage == Stage::Asserted {
                    println!("[{}/{}] {}", p.scheme, p.scenario, p.stage.name());
                }
            })
        }
    }

    /// Returns whether every scenario passed.
    pub fn run() -> Result<bool, HarnessError> {
        let args = Args::parse();
        init_logging(args.verbose);
        let mut config = load_config(&args)?;

        match args.command {
            Command::RescueInput {
                chain_length,
                ref out_dir,
            } => {
                let permutation = config.permutation()?;
                let generated =
                    generate_witness_and_output(chain_length, permutation.as_ref(), &mut rand::rng())?;
                let claim = RescueClaim {
                    output: row_to_hex(&generated.output),
                    chain_length: generated.witness.chain_length() as i64,
                    extra: Default::default(),
                };
                write_pair(out_dir, "rescue", &generated.private_input(), &claim)?;
                Ok(true)
            }
            Command::ZiggyKeys {
                ref private_key,
                ref message,
                ref out_dir,
            } => {
                let seed = private_key.as_deref().map(Seed::from_hex).transpose()?;
                let permutation = config.permutation()?;
                let keys = derive_key_pair(seed, permutation.as_ref(), &mut rand::rng())?;
                let claim = ZiggyClaim {
                    message: message.clone(),
                    public_key: keys.public_key_hex(),
                    extra: Default::default(),
                };
                write_pair(out_dir, "ziggy", &keys.private_input(), &claim)?;
                Ok(true)
            }
            Command::Run {
                ref scheme,
                ref flavor,
                ref build_dir,
                timeout_secs,
                jobs,
                seed,
                ref report,
            } => {
                if let Some(flavor) = flavor {
                    config.flavor = flavor.parse()?;
                }
                if let Some(dir) = build_dir {
                    config.build_dir = dir.clone();
                }
                if let Some(secs) = timeout_secs {
                    config.timeout_secs = secs;
                }
                if let Some(jobs) = jobs {
                    config.jobs = jobs;
                }
                if seed.is_some() {
                    config.seed = seed;
                }

                println!("=== STARK Harness ===");
                println!("Build: {} ({})", config.build_dir.display(), config.flavor);
                println!("Jobs: {}, timeout: {}s", config.jobs, config.timeout_secs);
                println!();

                let on_progress = progress_cb(args.verbose);
                let mut reports: Vec<SuiteReport> = Vec::new();
                match scheme.as_str() {
                    "rescue" => reports.push(stark_harness::run_configured_suite_with_progress(
                        &config,
                        RESCUE_SCENARIOS,
                        &on_progress,
                    )?),
                    "ziggy" => reports.push(stark_harness::run_configured_suite_with_progress(
                        &config,
                        ZIGGY_SCENARIOS,
                        &on_progress,
                    )?),
                    "all" => {
                        reports.push(stark_harness::run_configured_suite_with_progress(
                            &config,
                            RESCUE_SCENARIOS,
                            &on_progress,
                        )?);
                        reports.push(stark_harness::run_configured_suite_with_progress(
                            &config,
                            ZIGGY_SCENARIOS,
                            &on_progress,
                        )?);
                    }
                    other => {
                        return Err(HarnessError::InvalidParameter(format!(
                            "unknown scheme {other:?}; use rescue, ziggy or all"
                        )));
                    }
                }

                println!();
                for suite in &reports {
                    println!("{}", suite.summary());
                }
                if let Some(path) = report {
                    write_json(path, &reports)?;
                    info!(path = %path.display(), "suite report written");
                }
                Ok(reports.iter().all(SuiteReport::all_passed))
            }
        }
    }
}

fn main() {
    #[cfg(feature = "cli")]
    {
        match cli::run() {
            Ok(true) => {}
            Ok(false) => std::process::exit(1),
            Err(error) => {
                eprintln!("error: {error}");
                std::process::exit(2);
            }
        }
    }

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("CLI feature not enabled. Build with: cargo run --features cli");
    }
}
