//! # Identity Newtypes
//!
//! Identifiers for everything the ledger tracks. Each is a distinct type:
//! an [`AccountId`] cannot be passed where a [`RepositoryId`] is expected,
//! even though both are 20-byte addresses with the same textual form.
//!
//! ## Textual Forms
//!
//! - Addresses: `0x` followed by 40 hex characters. Parsing accepts either
//!   case; rendering is always lowercase.
//! - Token references: `<repository address>#<token id>`.
//! - Listing identifiers: UUID v4.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::canonical::CanonicalBytes;
use crate::digest::sha256_digest;
use crate::error::{CanonicalizationError, ValidationError};

/// Numeric token identifier, unique within its repository.
///
/// Allocation starts at 1 and is strictly increasing; ids are never reused.
pub type TokenId = u64;

/// Decode exactly `N` bytes from a hex string (no prefix).
pub(crate) fn decode_hex<const N: usize>(s: &str) -> Option<[u8; N]> {
    if s.len() != N * 2 || !s.is_ascii() {
        return None;
    }
    let mut out = [0u8; N];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(out)
}

/// Defines a 20-byte address newtype with `0x`-hex parsing, rendering,
/// and validating serde.
macro_rules! address_newtype {
    ($(#[$meta:meta])* $ty:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $ty([u8; 20]);

        impl $ty {
            /// Wrap raw address bytes.
            pub const fn from_bytes(bytes: [u8; 20]) -> Self {
                Self(bytes)
            }

            /// Access the raw address bytes.
            pub fn as_bytes(&self) -> &[u8; 20] {
                &self.0
            }

            /// Parse a `0x`-prefixed 40-hex-character address.
            pub fn parse(s: &str) -> Result<Self, ValidationError> {
                s.strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .and_then(decode_hex::<20>)
                    .map(Self)
                    .ok_or_else(|| ValidationError::InvalidAddress(s.to_string()))
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("0x")?;
                for b in &self.0 {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::parse(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

address_newtype!(
    /// An externally owned account: holds a native-currency balance and,
    /// once registered, exactly one repository.
    AccountId
);

address_newtype!(
    /// The address of a developer's repository.
    ///
    /// Derived deterministically at registration time; stable for the
    /// lifetime of the repository.
    RepositoryId
);

impl RepositoryId {
    /// Derive the repository address for `developer` at registry `nonce`.
    ///
    /// The address is the first 20 bytes of
    /// `sha256(canonical({"developer": <address>, "nonce": <n>}))`.
    pub fn derive(developer: &AccountId, nonce: u64) -> Result<Self, CanonicalizationError> {
        let seed = serde_json::json!({
            "developer": developer.to_string(),
            "nonce": nonce,
        });
        let digest = sha256_digest(&CanonicalBytes::new(&seed)?);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest.as_bytes()[..20]);
        Ok(Self(bytes))
    }
}

/// A vertex of the reference graph: one token inside one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenRef {
    /// Repository that minted the token.
    pub repository: RepositoryId,
    /// Token id within that repository.
    pub token_id: TokenId,
}

impl TokenRef {
    /// Create a token reference.
    pub fn new(repository: RepositoryId, token_id: TokenId) -> Self {
        Self {
            repository,
            token_id,
        }
    }

    /// Parse `<repository address>#<token id>`.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidTokenRef(s.to_string());
        let (repo, id) = s.split_once('#').ok_or_else(invalid)?;
        let repository = RepositoryId::parse(repo).map_err(|_| invalid())?;
        let token_id = id.parse::<TokenId>().map_err(|_| invalid())?;
        Ok(Self::new(repository, token_id))
    }
}

impl std::fmt::Display for TokenRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.repository, self.token_id)
    }
}

impl std::str::FromStr for TokenRef {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Unique identifier for a marketplace listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(Uuid);

impl ListingId {
    /// Create a new random listing identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ListingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listing:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEV1: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    #[test]
    fn test_address_parse_and_display() {
        let account = AccountId::parse(DEV1).unwrap();
        assert_eq!(account.to_string(), DEV1);
    }

    #[test]
    fn test_address_parse_mixed_case_renders_lowercase() {
        let account = AccountId::parse("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").unwrap();
        assert_eq!(account.to_string(), DEV1);
    }

    #[test]
    fn test_address_rejects_malformed() {
        assert!(AccountId::parse("70997970c51812dc3a010c7d01b50e0d17dc79c8").is_err());
        assert!(AccountId::parse("0x1234").is_err());
        assert!(AccountId::parse("0xzz997970c51812dc3a010c7d01b50e0d17dc79c8").is_err());
        assert!(AccountId::parse("").is_err());
    }

    #[test]
    fn test_address_deserialize_validates() {
        let ok: Result<AccountId, _> = serde_json::from_str(&format!("\"{DEV1}\""));
        assert!(ok.is_ok());
        let bad: Result<AccountId, _> = serde_json::from_str("\"0xnope\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_repository_derivation_is_deterministic() {
        let dev = AccountId::parse(DEV1).unwrap();
        let a = RepositoryId::derive(&dev, 0).unwrap();
        let b = RepositoryId::derive(&dev, 0).unwrap();
        let c = RepositoryId::derive(&dev, 1).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a.as_bytes(), dev.as_bytes());
    }

    #[test]
    fn test_token_ref_parse_display() {
        let dev = AccountId::parse(DEV1).unwrap();
        let repo = RepositoryId::derive(&dev, 0).unwrap();
        let token = TokenRef::new(repo, 7);
        let rendered = token.to_string();
        assert!(rendered.ends_with("#7"));
        assert_eq!(TokenRef::parse(&rendered).unwrap(), token);
        assert!(TokenRef::parse("0x1234#1").is_err());
        assert!(TokenRef::parse(&format!("{repo}#x")).is_err());
        assert!(TokenRef::parse(&repo.to_string()).is_err());
    }

    #[test]
    fn test_listing_ids_unique() {
        assert_ne!(ListingId::new(), ListingId::new());
        assert!(ListingId::new().to_string().starts_with("listing:"));
    }
}
