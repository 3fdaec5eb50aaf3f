//! # Operation Journal
//!
//! Append-only, hash-chained log of every committed ledger operation.
//!
//! ## Chain Structure
//!
//! Receipt `n` carries `prev_digest`, the digest of receipt `n-1` (64
//! zeros for the first receipt), and its own
//!
//! ```text
//! digest = SHA256(canonical({"event": .., "prev_digest": .., "sequence": n}))
//! ```
//!
//! The timestamp is informational and excluded from the digest, so a
//! replayed operation sequence produces the same chain shape regardless
//! of wall-clock time.
//!
//! ## Two-Phase Append
//!
//! [`Journal::prepare`] does all fallible work (canonicalization and
//! hashing) without touching the journal. [`Journal::commit`] only pushes.
//! The ledger prepares before its first mutation and commits after its
//! last, so a failed operation appends nothing.

use depledger_core::{
    sha256_digest, AccountId, Amount, CanonicalBytes, CanonicalizationError, ContentDigest,
    ListingId, RepositoryId, Timestamp, TokenId, TokenRef,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::Metadata;

/// Errors from journal hashing and verification.
#[derive(Error, Debug)]
pub enum JournalError {
    /// Event could not be canonicalized.
    #[error("receipt canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A receipt's links or digest do not match the recomputed chain.
    #[error("journal chain broken at sequence {sequence}")]
    BrokenLink {
        /// Sequence number of the first bad receipt.
        sequence: u64,
    },
}

/// An observable effect of a committed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A developer was onboarded.
    DeveloperRegistered {
        /// The new developer.
        account: AccountId,
        /// Their provisioned repository.
        repository: RepositoryId,
    },
    /// Native currency was credited.
    FundsDeposited {
        /// The credited account.
        account: AccountId,
        /// Base units credited.
        amount: Amount,
        /// Balance after the credit.
        balance: Amount,
    },
    /// A software token was minted.
    SoftwareMinted {
        /// Minting repository.
        repository: RepositoryId,
        /// The new token id.
        token_id: TokenId,
        /// Opaque metadata blob.
        metadata: Metadata,
        /// Outbound edges, in declaration order.
        dependencies: Vec<TokenRef>,
    },
    /// A software token was offered for licensing.
    SoftwareListed {
        /// The new listing.
        listing: ListingId,
        /// The listing developer.
        seller: AccountId,
        /// Repository of the listed token.
        repository: RepositoryId,
        /// The listed token.
        token_id: TokenId,
        /// Asking price in base units.
        price: Amount,
    },
    /// An active listing was withdrawn.
    SoftwareDelisted {
        /// The withdrawn listing.
        listing: ListingId,
        /// The delisting developer.
        seller: AccountId,
        /// Repository of the token.
        repository: RepositoryId,
        /// The token.
        token_id: TokenId,
    },
    /// A license was sold.
    LicensePurchased {
        /// The consumed listing.
        listing: ListingId,
        /// The paying account, now the license owner.
        buyer: AccountId,
        /// The developer who was paid.
        seller: AccountId,
        /// Repository of the licensed token.
        repository: RepositoryId,
        /// The licensed token.
        token_id: TokenId,
        /// Base units transferred.
        price: Amount,
        /// The minted license token.
        license: TokenRef,
    },
}

impl Event {
    /// Short event name, e.g. `"license_purchased"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeveloperRegistered { .. } => "developer_registered",
            Self::FundsDeposited { .. } => "funds_deposited",
            Self::SoftwareMinted { .. } => "software_minted",
            Self::SoftwareListed { .. } => "software_listed",
            Self::SoftwareDelisted { .. } => "software_delisted",
            Self::LicensePurchased { .. } => "license_purchased",
        }
    }
}

/// One committed journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Zero-based position in the journal.
    pub sequence: u64,
    /// Commit time.
    pub timestamp: Timestamp,
    /// What happened.
    pub event: Event,
    /// Digest of the previous receipt.
    pub prev_digest: ContentDigest,
    /// Digest of this receipt.
    pub digest: ContentDigest,
}

#[derive(Serialize)]
struct ReceiptPreimage<'a> {
    sequence: u64,
    event: &'a Event,
    prev_digest: &'a ContentDigest,
}

fn receipt_digest(
    sequence: u64,
    event: &Event,
    prev_digest: &ContentDigest,
) -> Result<ContentDigest, CanonicalizationError> {
    let canonical = CanonicalBytes::new(&ReceiptPreimage {
        sequence,
        event,
        prev_digest,
    })?;
    Ok(sha256_digest(&canonical))
}

/// A receipt hashed against the current head but not yet appended.
#[derive(Debug, Clone)]
#[must_use]
pub struct PendingReceipt(Receipt);

impl PendingReceipt {
    /// The sequence number the receipt will occupy.
    pub fn sequence(&self) -> u64 {
        self.0.sequence
    }
}

/// The hash-chained journal.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    receipts: Vec<Receipt>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number of the next receipt.
    pub fn next_sequence(&self) -> u64 {
        self.receipts.len() as u64
    }

    /// Digest of the latest receipt, or [`ContentDigest::ZERO`] when empty.
    pub fn head(&self) -> ContentDigest {
        self.receipts
            .last()
            .map(|r| r.digest)
            .unwrap_or(ContentDigest::ZERO)
    }

    /// All receipts, oldest first.
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// Number of receipts.
    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    /// Whether nothing has been committed.
    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    /// Hash `event` against the current head without appending it.
    pub fn prepare(&self, event: Event) -> Result<PendingReceipt, JournalError> {
        let sequence = self.next_sequence();
        let prev_digest = self.head();
        let digest = receipt_digest(sequence, &event, &prev_digest)?;
        Ok(PendingReceipt(Receipt {
            sequence,
            timestamp: Timestamp::now(),
            event,
            prev_digest,
            digest,
        }))
    }

    /// Append a prepared receipt.
    ///
    /// The receipt must have been prepared against the current head with
    /// no commit in between; the ledger's exclusive lock guarantees this.
    pub fn commit(&mut self, pending: PendingReceipt) -> &Receipt {
        debug_assert_eq!(pending.0.sequence, self.next_sequence());
        self.receipts.push(pending.0);
        &self.receipts[self.receipts.len() - 1]
    }

    /// Recompute every link and digest.
    pub fn verify(&self) -> Result<(), JournalError> {
        verify_receipts(&self.receipts)
    }
}

/// Verify a receipt sequence loaded from elsewhere.
pub fn verify_receipts(receipts: &[Receipt]) -> Result<(), JournalError> {
    let mut prev = ContentDigest::ZERO;
    for (index, receipt) in receipts.iter().enumerate() {
        let expected_sequence = index as u64;
        let broken = JournalError::BrokenLink {
            sequence: expected_sequence,
        };
        if receipt.sequence != expected_sequence || receipt.prev_digest != prev {
            tracing::warn!(sequence = expected_sequence, "journal link mismatch");
            return Err(broken);
        }
        let recomputed = receipt_digest(receipt.sequence, &receipt.event, &receipt.prev_digest)?;
        if recomputed != receipt.digest {
            tracing::warn!(sequence = expected_sequence, "journal digest mismatch");
            return Err(broken);
        }
        prev = receipt.digest;
    }
    Ok(())
}
