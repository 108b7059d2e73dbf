/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{tune, Game, Move, Piece, Square, MAX_PLY};

/// Accumulated bonuses for moves that caused beta cutoffs, indexed by the
/// moving piece and its destination square.
///
/// The index is the move's identity as far as ordering is concerned: what
/// moved, and where to. Scores are bounded by the "history gravity" formula,
/// which pulls large values back towards zero as new bonuses arrive.
#[derive(Debug)]
pub struct HistoryTable([[i32; Square::COUNT]; Piece::COUNT]);

impl HistoryTable {
    /// Clears all scores.
    #[inline(always)]
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The history score of moving `piece` to `to`.
    #[inline(always)]
    pub fn get(&self, piece: Piece, to: Square) -> i32 {
        self.0[piece][to]
    }

    /// Applies `bonus` (positive or negative) for the move of `mv` in `game`,
    /// using the [history gravity](https://www.chessprogramming.org/History_Heuristic#History_Bonuses)
    /// formula to keep scores within bounds.
    #[inline(always)]
    pub fn update(&mut self, game: &Game, mv: &Move, bonus: i32) {
        // This is a move, so there must be a piece at `from`.
        let piece = game.board().piece_at(mv.from()).unwrap();
        let to = mv.to();
        let current = self.0[piece][to];

        let max = tune::max_history_bonus!();
        let clamped = bonus.clamp(-max, max);

        self.0[piece][to] = current + clamped - current * clamped.abs() / max;
    }
}

impl Default for HistoryTable {
    #[inline(always)]
    fn default() -> Self {
        Self([[0; Square::COUNT]; Piece::COUNT])
    }
}

/// Quiet moves that caused a beta cutoff, stored per ply.
///
/// Keyed purely by the current search ply, independent of how the game
/// reached the node; a move that refuted one sibling often refutes the rest.
#[derive(Debug)]
pub struct KillerTable([[Option<Move>; 2]; MAX_PLY as usize]);

impl KillerTable {
    /// Clears all killer slots.
    #[inline(always)]
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The two killer moves stored for `ply`.
    #[inline(always)]
    pub fn get(&self, ply: i32) -> [Option<Move>; 2] {
        self.0[ply as usize]
    }

    /// Records `mv` as a killer at `ply`, shifting the previous killer into
    /// the second slot.
    #[inline(always)]
    pub fn insert(&mut self, ply: i32, mv: Move) {
        let slots = &mut self.0[ply as usize];

        // Keep both slots distinct.
        if slots[0] != Some(mv) {
            slots[1] = slots[0];
            slots[0] = Some(mv);
        }
    }
}

impl Default for KillerTable {
    #[inline(always)]
    fn default() -> Self {
        Self([[None; 2]; MAX_PLY as usize])
    }
}

/// The move that refuted each enemy move, indexed by the enemy piece and its
/// destination square.
///
/// The key depends only on the opponent's last move, not on the path through
/// the game tree that produced it.
#[derive(Debug)]
pub struct CounterMoveTable([[Option<Move>; Square::COUNT]; Piece::COUNT]);

impl CounterMoveTable {
    /// Clears all countermove slots.
    #[inline(always)]
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The stored response to `piece` having just landed on `to`.
    #[inline(always)]
    pub fn get(&self, piece: Piece, to: Square) -> Option<Move> {
        self.0[piece][to]
    }

    /// Records `response` as the refutation of `piece` landing on `to`.
    #[inline(always)]
    pub fn insert(&mut self, piece: Piece, to: Square, response: Move) {
        self.0[piece][to] = Some(response);
    }
}

impl Default for CounterMoveTable {
    #[inline(always)]
    fn default() -> Self {
        Self([[None; Square::COUNT]; Piece::COUNT])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MoveKind, Position};

    #[test]
    fn test_history_bonus_is_bounded() {
        let game = Game::default();
        let mut history = HistoryTable::default();
        let mv = Move::from_text(game.position(), "g1f3").unwrap();
        let piece = game.board().piece_at(mv.from()).unwrap();

        // Repeated maximal bonuses converge on the cap instead of overflowing.
        for _ in 0..1_000 {
            history.update(&game, &mv, tune::max_history_bonus!());
        }

        let score = history.get(piece, mv.to());
        assert!(score <= tune::max_history_bonus!());
        assert!(score > 0);
    }

    #[test]
    fn test_history_penalty_reduces_score() {
        let game = Game::default();
        let mut history = HistoryTable::default();
        let mv = Move::from_text(game.position(), "g1f3").unwrap();
        let piece = game.board().piece_at(mv.from()).unwrap();

        history.update(&game, &mv, 500);
        let before = history.get(piece, mv.to());

        history.update(&game, &mv, -300);
        assert!(history.get(piece, mv.to()) < before);
    }

    #[test]
    fn test_killers_shift() {
        let mut killers = KillerTable::default();
        let first = Move::new(Square::E2, Square::E4, MoveKind::Quiet);
        let second = Move::new(Square::D2, Square::D4, MoveKind::Quiet);

        killers.insert(3, first);
        killers.insert(3, second);

        assert_eq!(killers.get(3), [Some(second), Some(first)]);
        // Other plies are unaffected.
        assert_eq!(killers.get(4), [None, None]);

        // Re-inserting the current killer does not duplicate it.
        killers.insert(3, second);
        assert_eq!(killers.get(3), [Some(second), Some(first)]);
    }

    #[test]
    fn test_countermove_is_keyed_by_piece_and_square() {
        let pos = Position::default();
        let mut counters = CounterMoveTable::default();

        let piece = pos.board().piece_at(Square::G1).unwrap();
        let response = Move::new(Square::D7, Square::D5, MoveKind::Quiet);

        counters.insert(piece, Square::F3, response);
        assert_eq!(counters.get(piece, Square::F3), Some(response));
        assert_eq!(counters.get(piece, Square::H3), None);
    }
}
