/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Tunable constants, expressed as macros so a tuning build can swap them
//! out without touching the call sites.

/// Divisor for computing the soft timeout of a search.
macro_rules! soft_timeout_divisor {
    () => {
        20
    };
}
pub(crate) use soft_timeout_divisor;

/// Divisor for computing the hard timeout of a search.
macro_rules! hard_timeout_divisor {
    () => {
        5
    };
}
pub(crate) use hard_timeout_divisor;

/// Divisor for computing how much of the time increment to use.
macro_rules! time_inc_divisor {
    () => {
        2
    };
}
pub(crate) use time_inc_divisor;

/// Initial Aspiration Window size.
macro_rules! initial_aspiration_window_delta {
    () => {
        25
    };
}
pub(crate) use initial_aspiration_window_delta;

/// Minimum Aspiration Window size.
macro_rules! min_aspiration_window_delta {
    () => {
        10
    };
}
pub(crate) use min_aspiration_window_delta;

/// Minimum depth at which to use Aspiration Windows during iterative deepening.
macro_rules! min_aspiration_window_depth {
    () => {
        4
    };
}
pub(crate) use min_aspiration_window_depth;

/// Number of nodes to search between checks of the wall clock.
macro_rules! nodes_between_time_checks {
    () => {
        1024
    };
}
pub(crate) use nodes_between_time_checks;

/// Depth above which internal iterative reductions apply.
macro_rules! min_iir_depth {
    () => {
        3
    };
}
pub(crate) use min_iir_depth;

/// Maximum depth at which to apply reverse futility pruning.
macro_rules! max_rfp_depth {
    () => {
        6
    };
}
pub(crate) use max_rfp_depth;

/// Safety margin per depth when applying reverse futility pruning.
macro_rules! rfp_margin {
    () => {
        75
    };
}
pub(crate) use rfp_margin;

/// Maximum depth at which to apply futility pruning.
macro_rules! max_futility_depth {
    () => {
        7
    };
}
pub(crate) use max_futility_depth;

/// Base margin when applying futility pruning.
macro_rules! futility_offset {
    () => {
        100
    };
}
pub(crate) use futility_offset;

/// Margin per depth when applying futility pruning.
macro_rules! futility_multiplier {
    () => {
        75
    };
}
pub(crate) use futility_multiplier;

/// Maximum number of check extensions per search path.
macro_rules! max_check_extensions {
    () => {
        3
    };
}
pub(crate) use max_check_extensions;

/// Margin for delta pruning in quiescence search.
macro_rules! delta_pruning_margin {
    () => {
        250
    };
}
pub(crate) use delta_pruning_margin;

/// Maximum bonus the history heuristic may accumulate for one move.
macro_rules! max_history_bonus {
    () => {
        16_384
    };
}
pub(crate) use max_history_bonus;

/// Ordering score of the first killer move of a ply.
macro_rules! first_killer_score {
    () => {
        900_000
    };
}
pub(crate) use first_killer_score;

/// Ordering score of the second killer move of a ply.
macro_rules! second_killer_score {
    () => {
        800_000
    };
}
pub(crate) use second_killer_score;

/// Ordering score of the countermove to the opponent's last move.
macro_rules! countermove_score {
    () => {
        700_000
    };
}
pub(crate) use countermove_score;

/// Minimum number of recorded games before a book move is trusted.
macro_rules! book_confidence_threshold {
    () => {
        8
    };
}
pub(crate) use book_confidence_threshold;
