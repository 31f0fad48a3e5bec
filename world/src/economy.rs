//! Player balance bookkeeping.

/// Money available to the player and money earned over the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Ledger {
    balance: u32,
    total_earned: u32,
}

impl Ledger {
    pub(crate) const fn new(initial_balance: u32) -> Self {
        Self {
            balance: initial_balance,
            total_earned: 0,
        }
    }

    pub(crate) const fn balance(&self) -> u32 {
        self.balance
    }

    pub(crate) const fn total_earned(&self) -> u32 {
        self.total_earned
    }

    /// Credits money and records it as earned.
    pub(crate) fn add(&mut self, amount: u32) {
        self.balance = self.balance.saturating_add(amount);
        self.total_earned = self.total_earned.saturating_add(amount);
    }

    /// Debits money when the balance covers it; otherwise leaves it untouched.
    pub(crate) fn spend(&mut self, amount: u32) -> bool {
        match self.balance.checked_sub(amount) {
            Some(remaining) => {
                self.balance = remaining;
                true
            }
            None => false,
        }
    }
}
