//! Coin drops flying from a dead enemy to the wallet.

use std::time::Duration;

use gate_defence_core::Vec2;

use crate::pool::Poolable;

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Coin {
    position: Vec2,
    remaining: Duration,
}

impl Poolable for Coin {
    type Args = (Vec2, Duration);

    fn reset(&mut self, (position, flight): (Vec2, Duration)) {
        self.position = position;
        self.remaining = flight;
    }
}

impl Coin {
    pub(crate) const fn position(&self) -> Vec2 {
        self.position
    }

    /// Counts down the flight; returns `true` once the coin landed.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        self.remaining = self.remaining.saturating_sub(dt);
        self.remaining.is_zero()
    }
}
