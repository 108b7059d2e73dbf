/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use arrayvec::ArrayVec;

use crate::{Move, MoveList, Piece, PieceKind, MAX_NUM_MOVES};

/// Yields moves best-first without sorting the whole list.
///
/// Scores every move up front, then selection-picks the highest remaining
/// score on each call to `next`. Most nodes cut off after one or two moves,
/// so the full `O(n log n)` sort would mostly be wasted work.
pub struct MovePicker {
    moves: MoveList,
    scores: ArrayVec<i32, MAX_NUM_MOVES>,
    current: usize,
}

impl MovePicker {
    /// Creates a picker over `moves`, scoring each with `score_fn`
    /// (higher is better).
    pub fn new(moves: MoveList, score_fn: impl Fn(&Move) -> i32) -> Self {
        let mut scores = ArrayVec::default();

        for mv in moves.iter() {
            scores.push(score_fn(mv));
        }

        Self {
            moves,
            scores,
            current: 0,
        }
    }
}

impl Iterator for MovePicker {
    type Item = (Move, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.moves.len() {
            return None;
        }

        // Find the best remaining score.
        let mut best_index = self.current;
        let mut best_score = self.scores[best_index];

        for i in (self.current + 1)..self.moves.len() {
            if self.scores[i] > best_score {
                best_index = i;
                best_score = self.scores[i];
            }
        }

        if best_index != self.current {
            self.moves.swap(self.current, best_index);
            self.scores.swap(self.current, best_index);
        }

        let mv = self.moves[self.current];
        let score = self.scores[self.current];
        self.current += 1;

        Some((mv, score))
    }
}

/// Piece values used for capture ordering.
///
/// Values from <https://www.chessprogramming.org/Simplified_Evaluation_Function>;
/// the King scores 0 so king captures never look attractive.
const MVV_LVA_PIECE_VALUES: [i32; PieceKind::COUNT] = [100, 320, 330, 500, 900, 0];

/// [MVV-LVA](https://www.chessprogramming.org/MVV-LVA) capture-ordering table,
/// indexed by `[attacker][victim]`.
///
/// The score grows with the victim's value and shrinks with the attacker's,
/// so PxQ ranks far above QxP. All values are shifted left by 16 bits to keep
/// every capture ranked above every quiet-move heuristic score. Same-color
/// pairs and King victims score 0.
pub const MVV_LVA: [[i32; Piece::COUNT]; Piece::COUNT] = {
    let mut matrix = [[0; Piece::COUNT]; Piece::COUNT];
    let count = Piece::COUNT;

    let mut attacker = 0;
    while attacker < count {
        let mut victim = 0;

        while victim < count {
            let atk = attacker % PieceKind::COUNT;
            let vtm = victim % PieceKind::COUNT;

            let atk_is_white = attacker < PieceKind::COUNT;
            let vtm_is_white = victim < PieceKind::COUNT;

            // No scores for friendly "captures" or capturing the King.
            let can_capture =
                atk_is_white != vtm_is_white && vtm != PieceKind::King as usize;

            let score = 10 * MVV_LVA_PIECE_VALUES[vtm] - MVV_LVA_PIECE_VALUES[atk];

            matrix[attacker][victim] = (score * can_capture as i32) << 16;
            victim += 1;
        }
        attacker += 1;
    }

    matrix
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, MoveKind, Square};

    #[test]
    fn test_picker_yields_best_first() {
        let mut moves = MoveList::default();
        moves.push(Move::new(Square::A2, Square::A3, MoveKind::Quiet));
        moves.push(Move::new(Square::B2, Square::B3, MoveKind::Quiet));
        moves.push(Move::new(Square::C2, Square::C3, MoveKind::Quiet));

        // Score by file: c > b > a.
        let picker = MovePicker::new(moves, |mv| mv.from().file().index() as i32);

        let order = picker.map(|(mv, _)| mv.from()).collect::<Vec<_>>();
        assert_eq!(order, vec![Square::C2, Square::B2, Square::A2]);
    }

    #[test]
    fn test_mvv_lva_prefers_valuable_victims() {
        let wp = Piece::new(Color::White, PieceKind::Pawn).index();
        let bq = Piece::new(Color::Black, PieceKind::Queen).index();
        let bp = Piece::new(Color::Black, PieceKind::Pawn).index();
        let wq = Piece::new(Color::White, PieceKind::Queen).index();

        // PxQ is the best capture there is, QxP one of the worst.
        assert!(MVV_LVA[wp][bq] > MVV_LVA[wq][bp]);
        assert!(MVV_LVA[wq][bp] > 0);

        // Friendly pieces and Kings are not capturable.
        assert_eq!(MVV_LVA[wp][wq], 0);
        let bk = Piece::new(Color::Black, PieceKind::King).index();
        assert_eq!(MVV_LVA[wp][bk], 0);
    }

    #[test]
    fn test_mvv_lva_outranks_quiet_heuristics() {
        let wp = Piece::new(Color::White, PieceKind::Pawn).index();
        let bp = Piece::new(Color::Black, PieceKind::Pawn).index();

        // Even the worst capture score (QxP) clears the killer/countermove
        // and history ranges.
        let wq = Piece::new(Color::White, PieceKind::Queen).index();
        assert!(MVV_LVA[wq][bp] > crate::tune::first_killer_score!());
        assert!(MVV_LVA[wp][bp] > crate::tune::first_killer_score!());
    }
}
