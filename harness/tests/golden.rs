//! Golden vectors against the real permutation.
//!
//! Needs `STARK_HARNESS_PERMUTATION_CMD` pointing at a permutation executable:
//!   STARK_HARNESS_PERMUTATION_CMD=/path/to/rescue_permutation cargo test -- --ignored

use rand::rngs::StdRng;
use rand::SeedableRng;

use stark_harness::config::HarnessConfig;
use stark_harness::fixtures::{golden_rescue, GOLDEN_ZIGGY_PRIVATE_KEY, GOLDEN_ZIGGY_PUBLIC_KEY};
use stark_harness::keys::{derive_key_pair, Seed};
use stark_harness::permutation::hash_chain;
use stark_harness::witness::parse_row;

#[test]
#[ignore = "requires STARK_HARNESS_PERMUTATION_CMD"]
fn golden_hash_chain_matches_recorded_output() {
    let permutation = HarnessConfig::default()
        .with_env_permutation()
        .permutation()
        .expect("permutation configured");
    let golden = golden_rescue().expect("golden witness parses");
    let output = hash_chain(golden.witness.rows(), permutation.as_ref()).expect("chain");
    assert_eq!(output, golden.output);
}

#[test]
#[ignore = "requires STARK_HARNESS_PERMUTATION_CMD"]
fn golden_private_key_derives_recorded_public_key() {
    let permutation = HarnessConfig::default()
        .with_env_permutation()
        .permutation()
        .expect("permutation configured");
    let seed = Seed::from_hex(GOLDEN_ZIGGY_PRIVATE_KEY).expect("golden seed");
    let keys = derive_key_pair(Some(seed), permutation.as_ref(), &mut StdRng::seed_from_u64(0))
        .expect("derivation");
    let expected = parse_row(&GOLDEN_ZIGGY_PUBLIC_KEY).expect("golden public key");
    assert_eq!(keys.public_key, expected);
}
