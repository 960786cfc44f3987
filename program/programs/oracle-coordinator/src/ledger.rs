use crate::errors::CoordinatorError;
use crate::events::{EventLog, LedgerEvent, Transfer};
use crate::state::{Address, Amount, RequestRegistry};
use crate::token::TokenLedger;

/// Entropy the registry starts from when none is supplied.
pub const DEFAULT_GENESIS_ENTROPY: [u8; 32] = [0x5a; 32];

/// The explicitly owned store every transition runs against.
///
/// Holds the token balances, the request registry and the event log. Each
/// entry point takes `&mut Ledger`, so transitions are serialized by the
/// borrow checker, and each one validates before it writes.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub(crate) tokens: TokenLedger,
    pub(crate) registry: RequestRegistry,
    pub(crate) events: EventLog,
    slot: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::with_genesis_entropy(DEFAULT_GENESIS_ENTROPY)
    }

    pub fn with_genesis_entropy(entropy: [u8; 32]) -> Self {
        Self {
            tokens: TokenLedger::new(),
            registry: RequestRegistry::new(entropy),
            events: EventLog::new(),
            slot: 0,
        }
    }

    /// Current slot; advanced once per committed transition.
    pub fn slot(&self) -> u64 {
        self.slot
    }

    pub(crate) fn advance_slot(&mut self) {
        self.slot = self.slot.saturating_add(1);
    }

    pub fn registry(&self) -> &RequestRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn tokens(&self) -> &TokenLedger {
        &self.tokens
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.tokens.balance_of(account)
    }

    /// Credit `amount` to `account` out of thin air (genesis / test funding).
    pub fn mint(&mut self, account: Address, amount: Amount) -> Result<(), CoordinatorError> {
        self.tokens.mint(account, amount)?;
        self.emit(LedgerEvent::Transfer(Transfer {
            from: Address::ZERO,
            to: account,
            amount,
        }));
        Ok(())
    }

    /// Plain token transfer between two accounts. Nothing is logged when
    /// `from` and `to` are the same account.
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), CoordinatorError> {
        self.tokens.transfer(from, to, amount)?;
        if from != to {
            self.emit(LedgerEvent::Transfer(Transfer { from, to, amount }));
        }
        self.advance_slot();
        Ok(())
    }

    pub(crate) fn emit(&mut self, event: LedgerEvent) {
        self.events.emit(self.slot, event);
    }
}
