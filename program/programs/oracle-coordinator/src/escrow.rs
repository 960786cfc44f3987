//! Fee escrow: moves the per-request fee from the consumer to the authority
//! before the request record exists.

use tracing::debug;

use crate::errors::CoordinatorError;
use crate::events::{LedgerEvent, Transfer};
use crate::ledger::Ledger;
use crate::state::{Address, Amount};

/// Debit `amount` from `consumer` and credit it to `beneficiary`.
///
/// All or nothing: on `InsufficientBalance` no balance changes and nothing is
/// logged. A zero amount is a no-op (no transfer event), and so is a debit
/// whose beneficiary is the consumer itself once the balance is checked.
pub fn debit(
    ledger: &mut Ledger,
    consumer: Address,
    beneficiary: Address,
    amount: Amount,
) -> Result<(), CoordinatorError> {
    if amount == 0 {
        return Ok(());
    }

    ledger.tokens.transfer(consumer, beneficiary, amount)?;
    if consumer == beneficiary {
        return Ok(());
    }
    ledger.emit(LedgerEvent::Transfer(Transfer {
        from: consumer,
        to: beneficiary,
        amount,
    }));

    debug!(%consumer, %beneficiary, amount, "Escrowed request fee");
    Ok(())
}

/// Whether `consumer` can currently cover `amount`.
pub fn can_cover(ledger: &Ledger, consumer: &Address, amount: Amount) -> bool {
    ledger.balance_of(consumer) >= amount
}
