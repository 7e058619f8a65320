//! Discrete step clock.
//!
//! The engine advances in logical ticks, not wall-clock time. Tick 0 is the
//! initial state; the first executed tick is tick 1. The clock also owns
//! the step budget so the run loop and the tick driver agree on when it is
//! spent.

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Tick counter plus step budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepClock {
    /// Ticks executed so far.
    tick: u64,
    /// Maximum ticks the run may execute.
    budget: u64,
}

impl StepClock {
    /// A clock at tick 0 with the given budget.
    pub const fn new(budget: u64) -> Self {
        Self { tick: 0, budget }
    }

    /// Advance by one tick and return the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Ticks executed so far.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Configured step budget.
    pub const fn budget(&self) -> u64 {
        self.budget
    }

    /// Ticks left before the budget is spent.
    pub const fn remaining(&self) -> u64 {
        self.budget.saturating_sub(self.tick)
    }

    /// Whether the budget is spent.
    pub const fn is_exhausted(&self) -> bool {
        self.tick >= self.budget
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let clock = StepClock::new(3);
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.remaining(), 3);
        assert!(!clock.is_exhausted());
    }

    #[test]
    fn advance_counts_toward_budget() {
        let mut clock = StepClock::new(2);
        assert_eq!(clock.advance().unwrap(), 1);
        assert!(!clock.is_exhausted());
        assert_eq!(clock.advance().unwrap(), 2);
        assert!(clock.is_exhausted());
        assert_eq!(clock.remaining(), 0);
    }

    #[test]
    fn zero_budget_is_exhausted_immediately() {
        assert!(StepClock::new(0).is_exhausted());
    }

    #[test]
    fn overflow_is_an_error() {
        let mut clock = StepClock {
            tick: u64::MAX,
            budget: u64::MAX,
        };
        assert_eq!(clock.advance(), Err(ClockError::TickOverflow));
    }
}
