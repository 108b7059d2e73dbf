/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, time::Duration};

use crate::tune;

/// The time allotted to one move: a soft and a hard bound.
///
/// Iterative deepening stops starting new iterations once the soft bound is
/// exceeded; the hard bound cancels a search in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveBudget {
    pub soft: Duration,
    pub hard: Duration,
}

/// A chess clock: remaining time plus a per-move increment.
///
/// Owns the time-allocation policy for a move and the bookkeeping after one
/// has been played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameClock {
    remaining: Duration,
    increment: Duration,
}

impl GameClock {
    /// Creates a clock with `remaining` time and a per-move `increment`.
    #[inline(always)]
    pub const fn new(remaining: Duration, increment: Duration) -> Self {
        Self {
            remaining,
            increment,
        }
    }

    /// Time left on the clock.
    #[inline(always)]
    pub const fn remaining(&self) -> Duration {
        self.remaining
    }

    /// The per-move increment.
    #[inline(always)]
    pub const fn increment(&self) -> Duration {
        self.increment
    }

    /// Returns `true` while there is time left on the clock.
    #[inline(always)]
    pub fn has_time_left(&self) -> bool {
        !self.remaining.is_zero()
    }

    /// Resets the clock.
    #[inline(always)]
    pub fn set(&mut self, remaining: Duration, increment: Duration) {
        self.remaining = remaining;
        self.increment = increment;
    }

    /// Computes the time budget for the next move.
    ///
    /// A fixed fraction of the remaining time plus half the increment; the
    /// hard bound is a larger fraction of the remaining time.
    #[inline(always)]
    pub fn budget_for_move(&self) -> MoveBudget {
        let inc = self.increment / tune::time_inc_divisor!();

        MoveBudget {
            soft: self.remaining / tune::soft_timeout_divisor!() + inc,
            hard: self.remaining / tune::hard_timeout_divisor!() + inc,
        }
    }

    /// Records that a move took `elapsed`, deducting it and crediting the
    /// increment.
    #[inline(always)]
    pub fn move_finished(&mut self, elapsed: Duration) {
        self.remaining = self.remaining.saturating_sub(elapsed);
        if self.has_time_left() {
            self.remaining += self.increment;
        }
    }
}

impl Default for GameClock {
    /// An effectively-unlimited clock.
    #[inline(always)]
    fn default() -> Self {
        Self::new(Duration::MAX, Duration::ZERO)
    }
}

impl fmt::Display for GameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}s [+{:.1}s]",
            self.remaining.as_secs_f64(),
            self.increment.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_shrinks_with_remaining_time() {
        let long = GameClock::new(Duration::from_secs(300), Duration::ZERO);
        let short = GameClock::new(Duration::from_secs(10), Duration::ZERO);

        assert!(long.budget_for_move().soft > short.budget_for_move().soft);
        assert!(long.budget_for_move().hard > short.budget_for_move().hard);
    }

    #[test]
    fn test_hard_budget_exceeds_soft() {
        let clock = GameClock::new(Duration::from_secs(60), Duration::from_secs(1));
        let budget = clock.budget_for_move();
        assert!(budget.hard > budget.soft);
    }

    #[test]
    fn test_move_finished_bookkeeping() {
        let mut clock = GameClock::new(Duration::from_secs(60), Duration::from_secs(2));

        clock.move_finished(Duration::from_secs(5));
        assert_eq!(clock.remaining(), Duration::from_secs(57));

        // Overspending flags the clock instead of underflowing.
        clock.move_finished(Duration::from_secs(100));
        assert!(!clock.has_time_left());
    }
}
