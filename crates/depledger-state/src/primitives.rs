//! # Ledger Primitives
//!
//! Account balances and per-repository token counters. Everything above
//! this module moves value and allocates ids only through these two types.

use std::collections::BTreeMap;

use depledger_core::{AccountId, Amount, TokenId};

use crate::error::LedgerError;

/// Native-currency balances of every account the ledger has seen.
///
/// Accounts are created implicitly on first credit and never deleted. An
/// account that was never mentioned has a zero balance.
#[derive(Debug, Clone, Default)]
pub struct Balances {
    accounts: BTreeMap<AccountId, Amount>,
}

impl Balances {
    /// Create an empty balance sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance of `account`.
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.accounts.get(account).copied().unwrap_or(Amount::ZERO)
    }

    /// Every account with a recorded balance, in address order.
    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &Amount)> {
        self.accounts.iter()
    }

    /// Check that `transfer(from, to, amount)` would succeed, without
    /// mutating anything.
    pub fn check_transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(LedgerError::InsufficientFunds {
                account: *from,
                balance,
                required: amount,
            });
        }
        if from != to {
            self.check_deposit(to, amount)?;
        }
        Ok(())
    }

    /// Move `amount` from `from` to `to`.
    ///
    /// Both balances change together or neither does.
    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.check_transfer(from, to, amount)?;
        if from == to {
            return Ok(());
        }
        let balance = self.balance_of(from);
        let debited = balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds {
                account: *from,
                balance,
                required: amount,
            })?;
        let credited = self.check_deposit(to, amount)?;
        self.accounts.insert(*from, debited);
        self.accounts.insert(*to, credited);
        Ok(())
    }

    /// Check that crediting `amount` to `account` would not overflow.
    pub fn check_deposit(&self, account: &AccountId, amount: Amount) -> Result<Amount, LedgerError> {
        self.balance_of(account)
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { account: *account })
    }

    /// Credit `amount` to `account`, returning the new balance.
    pub fn deposit(&mut self, account: &AccountId, amount: Amount) -> Result<Amount, LedgerError> {
        let updated = self.check_deposit(account, amount)?;
        self.accounts.insert(*account, updated);
        Ok(updated)
    }
}

/// Monotonic token-id allocator scoped to one repository.
///
/// Ids start at 1 and are never reused.
#[derive(Debug, Clone)]
pub struct TokenCounter {
    next: TokenId,
}

impl TokenCounter {
    /// A counter whose first allocation is 1.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// The id the next allocation will return.
    pub fn peek(&self) -> TokenId {
        self.next
    }

    /// Allocate a fresh id and advance the counter.
    pub fn next_id(&mut self) -> TokenId {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(b: u8) -> AccountId {
        AccountId::from_bytes([b; 20])
    }

    #[test]
    fn test_unknown_account_has_zero_balance() {
        let balances = Balances::new();
        assert_eq!(balances.balance_of(&account(1)), Amount::ZERO);
    }

    #[test]
    fn test_transfer_moves_exact_amount() {
        let mut balances = Balances::new();
        balances.deposit(&account(1), Amount::from_whole(5)).unwrap();
        balances.transfer(&account(1), &account(2), Amount::from_whole(2)).unwrap();
        assert_eq!(balances.balance_of(&account(1)), Amount::from_whole(3));
        assert_eq!(balances.balance_of(&account(2)), Amount::from_whole(2));
    }

    #[test]
    fn test_insufficient_funds_changes_nothing() {
        let mut balances = Balances::new();
        balances.deposit(&account(1), Amount::from_whole(1)).unwrap();
        let err = balances
            .transfer(&account(1), &account(2), Amount::from_whole(2))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(balances.balance_of(&account(1)), Amount::from_whole(1));
        assert_eq!(balances.balance_of(&account(2)), Amount::ZERO);
    }

    #[test]
    fn test_overflowing_credit_rejected() {
        let mut balances = Balances::new();
        balances.deposit(&account(1), Amount::from_whole(1)).unwrap();
        balances
            .deposit(&account(2), Amount::from_base_units(u128::MAX))
            .unwrap();
        let err = balances
            .transfer(&account(1), &account(2), Amount::from_whole(1))
            .unwrap_err();
        assert!(matches!(err, LedgerError::BalanceOverflow { .. }));
        assert_eq!(balances.balance_of(&account(1)), Amount::from_whole(1));
    }

    #[test]
    fn test_self_transfer_is_noop() {
        let mut balances = Balances::new();
        balances.deposit(&account(1), Amount::from_whole(1)).unwrap();
        balances.transfer(&account(1), &account(1), Amount::from_whole(1)).unwrap();
        assert_eq!(balances.balance_of(&account(1)), Amount::from_whole(1));
    }

    #[test]
    fn test_counter_starts_at_one_and_never_repeats() {
        let mut counter = TokenCounter::new();
        assert_eq!(counter.peek(), 1);
        assert_eq!(counter.next_id(), 1);
        assert_eq!(counter.next_id(), 2);
        assert_eq!(counter.peek(), 3);
    }
}
