/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{Board, Color, EvalWeights, Game, PieceKind, Score};

/// Non-pawn material at or above which a position counts as pure middle-game.
///
/// Equal to the non-pawn material of the starting position.
const MIDGAME_MATERIAL: i32 = PieceKind::Knight.value() * 4
    + PieceKind::Bishop.value() * 4
    + PieceKind::Rook.value() * 4
    + PieceKind::Queen.value() * 2;

/// Non-pawn material at or below which a position counts as pure end-game.
///
/// Roughly a Rook and a minor piece per side.
const ENDGAME_MATERIAL: i32 = PieceKind::Rook.value() * 2 + PieceKind::Bishop.value() * 2;

/// Scores a position from the side-to-move's perspective.
///
/// A pure function of the position and the supplied weights: per occupied
/// square, the middle-game and end-game table values accumulate (positive for
/// the mover's pieces, negative for the opponent's) and are blended by the
/// game phase. A position past the fifty-move horizon scores zero.
#[derive(Debug, Clone)]
pub struct Evaluator<'a> {
    /// The game whose position to evaluate.
    game: &'a Game,

    /// The weight tables to score with.
    weights: &'a EvalWeights,

    /// How far into the end-game this position is, in `[0, 100]`.
    endgame_weight: i32,
}

impl<'a> Evaluator<'a> {
    /// Constructs a new [`Evaluator`], computing the game phase.
    #[inline(always)]
    pub fn new(game: &'a Game, weights: &'a EvalWeights) -> Self {
        Self {
            game,
            weights,
            endgame_weight: endgame_weight(game.board()),
        }
    }

    /// How far into the end-game this position is, in `[0, 100]`.
    #[inline(always)]
    pub const fn endgame_weight(&self) -> i32 {
        self.endgame_weight
    }

    /// Evaluates the position for the side to move.
    ///
    /// Positive favors the mover, negative the opponent, zero is equal.
    #[inline(always)]
    pub fn eval(&self) -> Score {
        // Past the fifty-move horizon every line is a dead draw.
        if self.game.halfmove() > 99 {
            return Score::DRAW;
        }

        self.eval_for(self.game.side_to_move())
    }

    /// Evaluates the position from `color`'s perspective.
    fn eval_for(&self, color: Color) -> Score {
        let mut mg = Score::DRAW;
        let mut eg = Score::DRAW;

        for (square, piece) in self.game.board() {
            let (mg_value, eg_value) = self.weights.evals(piece, square);

            if piece.color() == color {
                mg += mg_value;
                eg += eg_value;
            } else {
                mg -= mg_value;
                eg -= eg_value;
            }
        }

        mg.lerp(eg, self.endgame_weight)
    }
}

/// Total non-pawn material of both sides, in centipawns.
#[inline(always)]
fn non_pawn_material(board: &Board) -> i32 {
    [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ]
    .into_iter()
    .fold(0, |sum, kind| {
        sum + board.kind(kind).population() as i32 * kind.value()
    })
}

/// Maps the remaining non-pawn material to an end-game weight in `[0, 100]`.
///
/// 0 at or above [`MIDGAME_MATERIAL`], 100 at or below [`ENDGAME_MATERIAL`],
/// linear in between.
#[inline(always)]
fn endgame_weight(board: &Board) -> i32 {
    let remaining = non_pawn_material(board);
    ((MIDGAME_MATERIAL - remaining) * 100 / (MIDGAME_MATERIAL - ENDGAME_MATERIAL)).clamp(0, 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FEN_STARTPOS;

    fn eval_fen(fen: &str) -> Score {
        let game = Game::from_fen(fen).unwrap();
        let weights = EvalWeights::default();
        Evaluator::new(&game, &weights).eval()
    }

    #[test]
    fn test_startpos_is_balanced() {
        assert_eq!(eval_fen(FEN_STARTPOS), Score::DRAW);
    }

    #[test]
    fn test_material_advantage_scores_positive() {
        // White is up a queen.
        let up_a_queen = "4k3/8/8/8/8/8/8/3QK3 w - - 0 1";
        assert!(eval_fen(up_a_queen) > Score::DRAW);

        // Same position from Black's perspective scores negative.
        let down_a_queen = "4k3/8/8/8/8/8/8/3QK3 b - - 0 1";
        assert!(eval_fen(down_a_queen) < Score::DRAW);
    }

    #[test]
    fn test_mirrored_positions_evaluate_equally() {
        let white = eval_fen("4k3/8/8/8/8/8/PPP5/4K3 w - - 0 1");
        let black = eval_fen("4k3/ppp5/8/8/8/8/8/4K3 b - - 0 1");
        assert_eq!(white, black);
    }

    #[test]
    fn test_fifty_move_horizon_is_a_draw() {
        let fen = "4k3/8/8/8/8/8/8/3QK3 w - - 100 80";
        assert_eq!(eval_fen(fen), Score::DRAW);

        // One ply before the horizon the advantage still counts.
        let fen = "4k3/8/8/8/8/8/8/3QK3 w - - 99 80";
        assert!(eval_fen(fen) > Score::DRAW);
    }

    #[test]
    fn test_endgame_weight_follows_material() {
        let startpos = Game::default();
        let weights = EvalWeights::default();
        assert_eq!(Evaluator::new(&startpos, &weights).endgame_weight(), 0);

        let bare_kings = Game::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(Evaluator::new(&bare_kings, &weights).endgame_weight(), 100);

        let middling =
            Game::from_fen("r3k3/8/8/8/8/8/8/R2QK3 w - - 0 1").unwrap();
        let weight = Evaluator::new(&middling, &weights).endgame_weight();
        assert!(weight > 0 && weight < 100, "got {weight}");
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let game = Game::from_fen(crate::FEN_KIWIPETE).unwrap();
        let weights = EvalWeights::default();
        let a = Evaluator::new(&game, &weights).eval();
        let b = Evaluator::new(&game, &weights).eval();
        assert_eq!(a, b);
    }
}
