//! Replays the scripts under `demos/` through the CLI handlers.

use std::path::PathBuf;

use depledger_cli::replay::{open_ledger, replay};
use depledger_cli::run::{execute, RunArgs};
use depledger_cli::script::Script;
use depledger_cli::verify::{self, VerifyArgs};
use depledger_core::{AccountId, Amount, TokenRef};

const DEV1: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
const DEV2: &str = "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc";
const DEV3: &str = "0x90f79bf6eb2c4f870365e785982e1f101e93b906";

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

fn account(s: &str) -> AccountId {
    AccountId::parse(s).unwrap()
}

#[test]
fn test_license_chain_links_back_to_sellers_license() {
    let script = Script::load(&demo("license_chain.yaml")).unwrap();
    let mut ledger = open_ledger(Some(&demo("genesis.yaml"))).unwrap();
    let report = replay(&mut ledger, script.operations);
    assert_eq!(report.applied(), 6);
    assert_eq!(report.rejected(), 1);

    let repo2 = ledger.repository_of(&account(DEV2)).unwrap();
    let repo3 = ledger.repository_of(&account(DEV3)).unwrap();
    let base = TokenRef::new(repo3, 1);
    let middleware = TokenRef::new(repo2, 1);
    let dev2_license = TokenRef::new(repo3, 2);
    let dev1_license = TokenRef::new(repo2, 2);

    assert_eq!(ledger.referring_of(&middleware).unwrap(), &[base]);
    assert_eq!(
        ledger.referring_of(&dev1_license).unwrap(),
        &[middleware, dev2_license]
    );
    assert!(ledger.has_license(&account(DEV1), &middleware));
    assert!(ledger.has_license(&account(DEV2), &base));

    let whole = |n: u64| Amount::from_whole(n);
    assert_eq!(ledger.balance_of(&account(DEV1)), whole(8));
    assert_eq!(ledger.balance_of(&account(DEV2)), whole(11));
    assert_eq!(ledger.balance_of(&account(DEV3)), whole(11));
}

#[test]
fn test_run_summarizes_demo() {
    let output = execute(&RunArgs {
        script: demo("license_chain.yaml"),
        genesis: Some(demo("genesis.yaml")),
        json: false,
    })
    .unwrap();
    assert_eq!(output.state.developers.len(), 3);
    // Six genesis receipts plus six applied operations.
    assert_eq!(output.state.journal_length, 12);
    assert!(output.state.active_listings.is_empty());
}

#[test]
fn test_verify_accepts_demo_journal() {
    let verified = verify::execute(&VerifyArgs {
        script: demo("license_chain.yaml"),
        genesis: Some(demo("genesis.yaml")),
    })
    .unwrap();
    assert_eq!(verified.receipts, 12);
    assert_eq!(verified.rejected, 1);
}

#[test]
fn test_demo_without_genesis_rejects_unregistered_minter() {
    let script = Script::load(&demo("license_chain.yaml")).unwrap();
    let mut ledger = open_ledger(None).unwrap();
    let report = replay(&mut ledger, script.operations);
    assert_eq!(report.applied(), 0);
    assert!(ledger.journal().is_empty());
}
