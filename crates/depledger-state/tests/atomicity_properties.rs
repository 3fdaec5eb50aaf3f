//! # Atomicity and Graph Properties
//!
//! Drives the ledger with random operation sequences and checks, after
//! every step:
//!
//! - a rejected operation leaves no observable trace,
//! - the referring and referred views stay symmetric,
//! - every dependency edge points at a token minted strictly earlier,
//! - at most one listing per token is active,
//! - a successful purchase moves exactly the price.

use depledger_core::{AccountId, Amount, ContentDigest, RepositoryId, TokenRef};
use depledger_state::{
    DependencySpec, Ledger, Operation, Outcome, ReferenceGraph, TokenKind,
};
use proptest::prelude::*;

const ACCOUNTS: u8 = 4;

fn account(i: u8) -> AccountId {
    AccountId::from_bytes([i + 1; 20])
}

/// Everything a rejected operation must leave untouched.
#[derive(Debug, PartialEq)]
struct Snapshot {
    balances: Vec<(AccountId, Amount)>,
    developers: Vec<(AccountId, RepositoryId)>,
    tokens: Vec<(RepositoryId, usize, u64)>,
    edges: usize,
    active: Vec<TokenRef>,
    journal_len: usize,
    head: ContentDigest,
}

fn snapshot(ledger: &Ledger) -> Snapshot {
    Snapshot {
        balances: ledger.balances().accounts().map(|(a, b)| (*a, *b)).collect(),
        developers: ledger.developers(),
        tokens: ledger
            .registry()
            .repositories()
            .map(|r| (r.id(), r.token_count(), r.peek_next_id()))
            .collect(),
        edges: ledger.registry().graph().edge_count(),
        active: ledger.active_listings().iter().map(|l| l.token).collect(),
        journal_len: ledger.journal().len(),
        head: ledger.journal().head(),
    }
}

fn repository_or_placeholder(ledger: &Ledger, i: u8) -> RepositoryId {
    ledger
        .repository_of(&account(i))
        .unwrap_or(RepositoryId::from_bytes([0xee; 20]))
}

/// Turn a random tuple into an operation against the current state.
fn build(ledger: &Ledger, (kind, a, b, id, amount): (u8, u8, u8, u64, u64)) -> Operation {
    let amount = Amount::from_whole(amount);
    match kind % 6 {
        0 => Operation::RegisterDeveloper { account: account(a) },
        1 => Operation::Deposit {
            account: account(a),
            amount,
        },
        2 => Operation::MintSoftware {
            account: account(a),
            metadata: format!("pkg-{id}").into(),
            dependencies: if id % 2 == 0 {
                vec![]
            } else {
                vec![DependencySpec {
                    repository: repository_or_placeholder(ledger, b),
                    token_ids: vec![id / 2 + 1],
                }]
            },
        },
        3 => Operation::ListSoftware {
            seller: account(a),
            token_id: id,
            price: amount,
        },
        4 => Operation::DelistSoftware {
            seller: account(a),
            token_id: id,
        },
        _ => {
            let repository = repository_or_placeholder(ledger, b);
            let token = TokenRef::new(repository, id);
            let payment = ledger.listing(&token).map(|l| l.price).unwrap_or(amount);
            Operation::PurchaseLicense {
                buyer: account(a),
                repository,
                token_id: id,
                payment,
            }
        }
    }
}

fn check_graph(ledger: &Ledger) -> Result<(), TestCaseError> {
    let graph = ledger.registry().graph();
    for (source, target) in graph.edges() {
        prop_assert!(graph.referred_of(&target).unwrap().contains(&source));
        let source_minted = ledger.token(&source).unwrap().minted_at;
        let target_minted = ledger.token(&target).unwrap().minted_at;
        prop_assert!(target_minted < source_minted);
    }
    for repository in ledger.registry().repositories() {
        for token in repository.tokens() {
            let vertex = TokenRef::new(repository.id(), token.id);
            for source in graph.referred_of(&vertex).unwrap() {
                prop_assert!(graph.referring_of(source).unwrap().contains(&vertex));
            }
            prop_assert!(ledger.registry().graph().contains(&vertex));
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_random_operation_sequences_preserve_invariants(
        steps in prop::collection::vec(
            (0u8..6, 0u8..ACCOUNTS, 0u8..ACCOUNTS, 1u64..5, 0u64..4),
            1..60,
        )
    ) {
        let mut ledger = Ledger::new();
        for i in 0..ACCOUNTS {
            ledger.deposit(account(i), Amount::from_whole(5)).unwrap();
        }

        for step in steps {
            let op = build(&ledger, step);
            let before = snapshot(&ledger);
            let purchase = match &op {
                Operation::PurchaseLicense { buyer, repository, token_id, .. } => ledger
                    .listing(&TokenRef::new(*repository, *token_id))
                    .map(|l| (*buyer, l.seller, l.price)),
                _ => None,
            };
            let balances_before = purchase.map(|(buyer, seller, _)| {
                (ledger.balance_of(&buyer), ledger.balance_of(&seller))
            });

            match ledger.apply(op) {
                Err(_) => prop_assert_eq!(snapshot(&ledger), before),
                Ok(outcome) => {
                    prop_assert_eq!(ledger.journal().len(), before.journal_len + 1);
                    if let Outcome::Purchased { license } = outcome {
                        let (buyer, seller, price) = purchase.unwrap();
                        let (buyer_before, seller_before) = balances_before.unwrap();
                        prop_assert_eq!(ledger.balance_of(&buyer), buyer_before.checked_sub(price).unwrap());
                        prop_assert_eq!(ledger.balance_of(&seller), seller_before.checked_add(price).unwrap());
                        let licensed = match ledger.token(&license).unwrap().kind {
                            TokenKind::License { licensed } => licensed,
                            TokenKind::Software => return Err(TestCaseError::fail("license minted as software")),
                        };
                        prop_assert_eq!(ledger.referring_of(&license).unwrap()[0], licensed);
                    }
                }
            }

            check_graph(&ledger)?;
            let active = ledger.active_listings();
            let mut tokens: Vec<TokenRef> = active.iter().map(|l| l.token).collect();
            tokens.sort();
            tokens.dedup();
            prop_assert_eq!(tokens.len(), active.len());
        }

        prop_assert!(ledger.journal().verify().is_ok());
    }
}
