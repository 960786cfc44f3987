//! Fungible token balances.
//!
//! Stand-in for the external token contract: only `transfer`, `balance_of`
//! and genesis `mint` are exposed, with exact-amount, fail-closed semantics.

use std::collections::HashMap;

use crate::errors::CoordinatorError;
use crate::state::{Address, Amount};

#[derive(Debug, Clone, Default)]
pub struct TokenLedger {
    balances: HashMap<Address, Amount>,
    total_supply: Amount,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Credit fresh tokens to `account`.
    pub fn mint(&mut self, account: Address, amount: Amount) -> Result<(), CoordinatorError> {
        if account.is_zero() {
            return Err(CoordinatorError::ZeroAddressNotAllowed);
        }
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(CoordinatorError::BalanceOverflow(account))?;
        let balance = self
            .balance_of(&account)
            .checked_add(amount)
            .ok_or(CoordinatorError::BalanceOverflow(account))?;
        self.total_supply = supply;
        self.balances.insert(account, balance);
        Ok(())
    }

    /// Move exactly `amount` from `from` to `to`. Both new balances are
    /// computed before either is written, so a failure changes nothing.
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), CoordinatorError> {
        if to.is_zero() {
            return Err(CoordinatorError::ZeroAddressNotAllowed);
        }
        let available = self.balance_of(&from);
        let debited = available
            .checked_sub(amount)
            .ok_or(CoordinatorError::InsufficientBalance {
                account: from,
                needed: amount,
                available,
            })?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(CoordinatorError::BalanceOverflow(to))?;
        self.balances.insert(from, debited);
        self.balances.insert(to, credited);
        Ok(())
    }
}
