//! Mock STARK prover/verifier
//!
//! Speaks the same file and flag contract as the real binaries so the
//! orchestration can be exercised without a C++ build:
//!   - Prover role (`--out_file` given): the "proof" is a BLAKE2s binding of
//!     the parameter file and the public input, stretched to one block per
//!     FRI query, plus a deterministic annotation log.
//!   - Verifier role (`--in_file` given): recomputes the binding from the
//!     artifact; on a match writes the same annotations and exits 0, otherwise
//!     exits 1. Markers follow the scheme implied by the public input.

#[cfg(feature = "cli")]
mod mock {
    use std::path::PathBuf;

    use clap::Parser;
    use serde_json::{json, Value};

    use stark_harness::artifact::{read_json, write_json};
    use stark_harness::error::HarnessError;
    use stark_harness::hash::{be_u64_padded, blake2s_concat};
    use stark_harness::params::ProverParameters;
    use stark_harness::scheme::{Rescue, Scheme, Ziggy};

    #[derive(Parser, Debug)]
    #[command(name = "mock-stark")]
    #[command(about = "Stand-in STARK prover and verifier for harness tests")]
    struct Args {
        #[arg(long = "parameter_file")]
        parameter_file: Option<PathBuf>,
        #[arg(long = "public_input_file")]
        public_input_file: Option<PathBuf>,
        #[arg(long = "private_input_file")]
        private_input_file: Option<PathBuf>,
        #[arg(long = "prover_config_file")]
        prover_config_file: Option<PathBuf>,
        #[arg(long = "out_file")]
        out_file: Option<PathBuf>,
        #[arg(long = "generate_annotations")]
        generate_annotations: bool,

        #[arg(long = "in_file")]
        in_file: Option<PathBuf>,
        #[arg(long = "annotation_file")]
        annotation_file: Option<PathBuf>,

        /// Accepted for compatibility; diagnostics always go to stderr.
        #[allow(dead_code)]
        #[arg(long = "logtostderr")]
        logtostderr: bool,
    }

    fn required(path: &Option<PathBuf>, flag: &str) -> Result<PathBuf, HarnessError> {
        path.clone()
            .ok_or_else(|| HarnessError::InvalidParameter(format!("--{flag} is required")))
    }

    fn canonical(value: &Value) -> Result<Vec<u8>, HarnessError> {
        serde_json::to_vec(value).map_err(|error| HarnessError::Json {
            context: "binding".into(),
            source: error,
        })
    }

    /// `"0x" || block_0 || .. || block_n` with `block_i = BLAKE2s(params || claim || i)`.
    fn expected_proof(parameters: &Value, public_input: &Value) -> Result<String, HarnessError> {
        let n_queries = parameters["stark"]["fri"]["n_queries"].as_u64().unwrap_or(1).max(1);
        let params = canonical(parameters)?;
        let claim = canonical(public_input)?;
        let mut proof = String::from("0x");
        for i in 0..n_queries {
            let block = blake2s_concat(&[params.as_slice(), claim.as_slice(), be_u64_padded(i).as_slice()]);
            proof.push_str(&hex::encode(block));
        }
        Ok(proof)
    }

    fn annotation_lines(parameters: &ProverParameters, proof_hex: &str) -> Vec<String> {
        let mut lines = vec![format!(
            "P->V[0:32]: /STARK/Original/Commit on Trace: Commitment: Hash(0x{})",
            &proof_hex[2..proof_hex.len().min(66)]
        )];
        for (layer, step) in parameters.stark.fri.fri_step_list.iter().enumerate() {
            lines.push(format!("V->P: /STARK/FRI/Commitment/Layer {layer}: step {step}"));
        }
        for query in 0..parameters.stark.fri.n_queries {
            lines.push(format!("P->V: /STARK/FRI/Decommitment/Query {query}"));
        }
        lines
    }

    fn markers(public_input: &Value) -> (&'static str, &'static str) {
        if public_input.get("public_key").is_some() {
            (Ziggy::SUCCESS_MARKER, Ziggy::FAILURE_MARKER)
        } else {
            (Rescue::SUCCESS_MARKER, Rescue::FAILURE_MARKER)
        }
    }

    fn prove(args: &Args) -> Result<i32, HarnessError> {
        let parameter_file = required(&args.parameter_file, "parameter_file")?;
        let public_input_file = required(&args.public_input_file, "public_input_file")?;
        let private_input_file = required(&args.private_input_file, "private_input_file")?;
        let out_file = required(&args.out_file, "out_file")?;

        let parameters: Value = read_json(&parameter_file)?;
        let typed: ProverParameters = serde_json::from_value(parameters.clone()).map_err(|error| {
            HarnessError::Json {
                context: parameter_file.display().to_string(),
                source: error,
            }
        })?;
        let public_input: Value = read_json(&public_input_file)?;
        let _private_input: Value = read_json(&private_input_file)?;
        if let Some(config) = &args.prover_config_file {
            let _config: Value = read_json(config)?;
        }

        let proof_hex = expected_proof(&parameters, &public_input)?;
        let annotations = if args.generate_annotations {
            annotation_lines(&typed, &proof_hex)
        } else {
            Vec::new()
        };
        let artifact = json!({
            "proof_hex": proof_hex,
            "annotations": annotations,
            "public_input": public_input,
            "proof_parameters": parameters,
        });
        write_json(&out_file, &artifact)?;
        eprintln!("Proof generated successfully.");
        Ok(0)
    }

    fn verify(args: &Args) -> Result<i32, HarnessError> {
        let in_file = required(&args.in_file, "in_file")?;
        let artifact: Value = read_json(&in_file)?;
        let public_input = &artifact["public_input"];
        let parameters = &artifact["proof_parameters"];
        let (success, failure) = markers(public_input);

        let proof_hex = artifact["proof_hex"].as_str().unwrap_or_default();
        let typed: Option<ProverParameters> = serde_json::from_value(parameters.clone()).ok();
        let expected = expected_proof(parameters, public_input)?;

        match typed {
            Some(typed) if proof_hex == expected => {
                if let Some(path) = &args.annotation_file {
                    let mut log = annotation_lines(&typed, proof_hex).join("\n");
                    log.push('\n');
                    std::fs::write(path, log).map_err(|error| HarnessError::Io {
                        path: path.clone(),
                        source: error,
                    })?;
                }
                eprintln!("{success}");
                Ok(0)
            }
            _ => {
                eprintln!("{failure}");
                Ok(1)
            }
        }
    }

    pub fn run() -> i32 {
        let args = Args::parse();
        let outcome = if args.out_file.is_some() {
            prove(&args)
        } else if args.in_file.is_some() {
            verify(&args)
        } else {
            Err(HarnessError::InvalidParameter(
                "pass --out_file to prove or --in_file to verify".into(),
            ))
        };
        outcome.unwrap_or_else(|error| {
            eprintln!("mock-stark: {error}");
            2
        })
    }
}

fn main() {
    #[cfg(feature = "cli")]
    {
        std::process::exit(mock::run());
    }

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("CLI feature not enabled. Build with: cargo run --features cli");
    }
}
