/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use anyhow::{bail, Result};

use crate::{Color, Piece, PieceKind, Score, Square};

/// Middle-game and end-game piece-square tables, from
/// [PeSTO](https://www.chessprogramming.org/PeSTO%27s_Evaluation_Function#Source_Code).
///
/// Written from White's perspective with rank 8 at the top, like a diagram.
#[rustfmt::skip]
const PAWN_MG: [i32; Square::COUNT] = [
      0,   0,   0,   0,   0,   0,  0,   0,
     98, 134,  61,  95,  68, 126, 34, -11,
     -6,   7,  26,  31,  65,  56, 25, -20,
    -14,  13,   6,  21,  23,  12, 17, -23,
    -27,  -2,  -5,  12,  17,   6, 10, -25,
    -26,  -4,  -4, -10,   3,   3, 33, -12,
    -35,  -1, -20, -23, -15,  24, 38, -22,
      0,   0,   0,   0,   0,   0,  0,   0,
];

#[rustfmt::skip]
const PAWN_EG: [i32; Square::COUNT] = [
      0,   0,   0,   0,   0,   0,   0,   0,
    178, 173, 158, 134, 147, 132, 165, 187,
     94, 100,  85,  67,  56,  53,  82,  84,
     32,  24,  13,   5,  -2,   4,  17,  17,
     13,   9,  -3,  -7,  -7,  -8,   3,  -1,
      4,   7,  -6,   1,   0,  -5,  -1,  -8,
     13,   8,   8,  10,  13,   0,   2,  -7,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT_MG: [i32; Square::COUNT] = [
    -167, -89, -34, -49,  61, -97, -15, -107,
     -73, -41,  72,  36,  23,  62,   7,  -17,
     -47,  60,  37,  65,  84, 129,  73,   44,
      -9,  17,  19,  53,  37,  69,  18,   22,
     -13,   4,  16,  13,  28,  19,  21,   -8,
     -23,  -9,  12,  10,  19,  17,  25,  -16,
     -29, -53, -12,  -3,  -1,  18, -14,  -19,
    -105, -21, -58, -33, -17, -28, -19,  -23,
];

#[rustfmt::skip]
const KNIGHT_EG: [i32; Square::COUNT] = [
    -58, -38, -13, -28, -31, -27, -63, -99,
    -25,  -8, -25,  -2,  -9, -25, -24, -52,
    -24, -20,  10,   9,  -1,  -9, -19, -41,
    -17,   3,  22,  22,  22,  11,   8, -18,
    -18,  -6,  16,  25,  16,  17,   4, -18,
    -23,  -3,  -1,  15,  10,  -3, -20, -22,
    -42, -20, -10,  -5,  -2, -20, -23, -44,
    -29, -51, -23, -15, -22, -18, -50, -64,
];

#[rustfmt::skip]
const BISHOP_MG: [i32; Square::COUNT] = [
    -29,   4, -82, -37, -25, -42,   7,  -8,
    -26,  16, -18, -13,  30,  59,  18, -47,
    -16,  37,  43,  40,  35,  50,  37,  -2,
     -4,   5,  19,  50,  37,  37,   7,  -2,
     -6,  13,  13,  26,  34,  12,  10,   4,
      0,  15,  15,  15,  14,  27,  18,  10,
      4,  15,  16,   0,   7,  21,  33,   1,
    -33,  -3, -14, -21, -13, -12, -39, -21,
];

#[rustfmt::skip]
const BISHOP_EG: [i32; Square::COUNT] = [
    -14, -21, -11,  -8, -7,  -9, -17, -24,
     -8,  -4,   7, -12, -3, -13,  -4, -14,
      2,  -8,   0,  -1, -2,   6,   0,   4,
     -3,   9,  12,   9, 14,  10,   3,   2,
     -6,   3,  13,  19,  7,  10,  -3,  -9,
    -12,  -3,   8,  10, 13,   3,  -7, -15,
    -14, -18,  -7,  -1,  4,  -9, -15, -27,
    -23,  -9, -23,  -5, -9, -16,  -5, -17,
];

#[rustfmt::skip]
const ROOK_MG: [i32; Square::COUNT] = [
     32,  42,  32,  51, 63,  9,  31,  43,
     27,  32,  58,  62, 80, 67,  26,  44,
     -5,  19,  26,  36, 17, 45,  61,  16,
    -24, -11,   7,  26, 24, 35,  -8, -20,
    -36, -26, -12,  -1,  9, -7,   6, -23,
    -45, -25, -16, -17,  3,  0,  -5, -33,
    -44, -16, -20,  -9, -1, 11,  -6, -71,
    -19, -13,   1,  17, 16,  7, -37, -26,
];

#[rustfmt::skip]
const ROOK_EG: [i32; Square::COUNT] = [
    13, 10, 18, 15, 12,  12,   8,   5,
    11, 13, 13, 11, -3,   3,   8,   3,
     7,  7,  7,  5,  4,  -3,  -5,  -3,
     4,  3, 13,  1,  2,   1,  -1,   2,
     3,  5,  8,  4, -5,  -6,  -8, -11,
    -4,  0, -5, -1, -7, -12,  -8, -16,
    -6, -6,  0,  2, -9,  -9, -11,  -3,
    -9,  2,  3, -1, -5, -13,   4, -20,
];

#[rustfmt::skip]
const QUEEN_MG: [i32; Square::COUNT] = [
    -28,   0,  29,  12,  59,  44,  43,  45,
    -24, -39,  -5,   1, -16,  57,  28,  54,
    -13, -17,   7,   8,  29,  56,  47,  57,
    -27, -27, -16, -16,  -1,  17,  -2,   1,
     -9, -26,  -9, -10,  -2,  -4,   3,  -3,
    -14,   2, -11,  -2,  -5,   2,  14,   5,
    -35,  -8,  11,   2,   8,  15,  -3,   1,
     -1, -18,  -9,  10, -15, -25, -31, -50,
];

#[rustfmt::skip]
const QUEEN_EG: [i32; Square::COUNT] = [
     -9,  22,  22,  27,  27,  19,  10,  20,
    -17,  20,  32,  41,  58,  25,  30,   0,
    -20,   6,   9,  49,  47,  35,  19,   9,
      3,  22,  24,  45,  57,  40,  57,  36,
    -18,  28,  19,  47,  31,  34,  39,  23,
    -16, -27,  15,   6,   9,  17,  10,   5,
    -22, -23, -30, -16, -16, -23, -36, -32,
    -33, -28, -22, -43,  -5, -32, -20, -41,
];

#[rustfmt::skip]
const KING_MG: [i32; Square::COUNT] = [
    -65,  23,  16, -15, -56, -34,   2,  13,
     29,  -1, -20,  -7,  -8,  -4, -38, -29,
     -9,  24,   2, -16, -20,   6,  22, -22,
    -17, -20, -12, -27, -30, -25, -14, -36,
    -49,  -1, -27, -39, -46, -44, -33, -51,
    -14, -14, -22, -46, -44, -30, -15, -27,
      1,   7,  -8, -64, -43, -16,   9,   8,
    -15,  36,  12, -54,   8, -28,  24,  14,
];

#[rustfmt::skip]
const KING_EG: [i32; Square::COUNT] = [
    -74, -35, -18, -18, -11,  15,   4, -17,
    -12,  17,  14,  17,  17,  38,  23,  11,
     10,  17,  23,  15,  20,  45,  44,  13,
     -8,  22,  24,  27,  26,  33,  26,   3,
    -18,  -4,  21,  24,  27,  23,   9, -11,
    -19,  -3,  11,  21,  23,  16,   7,  -9,
    -27, -11,   4,  13,  14,   4,  -5, -17,
    -53, -34, -21, -11, -28, -14, -24, -43,
];

/// A single [Piece-Square Table](https://www.chessprogramming.org/Piece-Square_Tables).
///
/// Stored from White's perspective with A1 at index 0, and with the piece's
/// material value folded in, so one lookup yields the full contribution of a
/// piece on a square.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Psqt([i32; Square::COUNT]);

impl Psqt {
    /// Builds a [`Psqt`] from a diagram-ordered table (rank 8 first) and the
    /// piece's material value.
    const fn new(value: i32, table: [i32; Square::COUNT]) -> Self {
        let mut entries = [0; Square::COUNT];

        let mut i = 0;
        while i < Square::COUNT {
            // Flip the rank (not the file) so index 0 becomes A1.
            entries[i] = table[i ^ 56] + value;
            i += 1;
        }

        Self(entries)
    }

    /// The value of this table at `square` (White's perspective).
    #[inline(always)]
    pub const fn get(&self, square: Square) -> i32 {
        self.0[square.index()]
    }

    /// The value of this table at `square` from `color`'s perspective.
    #[inline(always)]
    pub const fn get_relative(&self, square: Square, color: Color) -> i32 {
        self.get(square.rank_relative_to(color))
    }
}

/// The complete set of evaluation weights: a material value and two
/// piece-square tables (middle-game and end-game) per piece kind.
///
/// Supplied at startup and never mutated by the engine. Defaults to the
/// PeSTO tables; [`EvalWeights::from_vector`] populates the tables from a
/// flat vector of tunable integers instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalWeights {
    mg: [Psqt; PieceKind::COUNT],
    eg: [Psqt; PieceKind::COUNT],
}

impl EvalWeights {
    /// Number of integers in the flat weight vector:
    /// 6 piece values, then 6×64 middle-game and 6×64 end-game entries.
    pub const VECTOR_LEN: usize = PieceKind::COUNT + 2 * PieceKind::COUNT * Square::COUNT;

    /// The built-in PeSTO weights.
    const PESTO: Self = Self {
        mg: [
            Psqt::new(PieceKind::Pawn.value(), PAWN_MG),
            Psqt::new(PieceKind::Knight.value(), KNIGHT_MG),
            Psqt::new(PieceKind::Bishop.value(), BISHOP_MG),
            Psqt::new(PieceKind::Rook.value(), ROOK_MG),
            Psqt::new(PieceKind::Queen.value(), QUEEN_MG),
            Psqt::new(PieceKind::King.value(), KING_MG),
        ],
        eg: [
            Psqt::new(PieceKind::Pawn.value(), PAWN_EG),
            Psqt::new(PieceKind::Knight.value(), KNIGHT_EG),
            Psqt::new(PieceKind::Bishop.value(), BISHOP_EG),
            Psqt::new(PieceKind::Rook.value(), ROOK_EG),
            Psqt::new(PieceKind::Queen.value(), QUEEN_EG),
            Psqt::new(PieceKind::King.value(), KING_EG),
        ],
    };

    /// Populates a weight set from a flat vector of
    /// [`EvalWeights::VECTOR_LEN`] integers.
    ///
    /// Layout: 6 piece values (pawn through king), then the 6 middle-game
    /// tables, then the 6 end-game tables, each diagram-ordered (rank 8
    /// first) exactly like the embedded defaults. The vector is only read.
    pub fn from_vector(values: &[i32]) -> Result<Self> {
        if values.len() != Self::VECTOR_LEN {
            bail!(
                "Weight vector must have {} entries. Got {}",
                Self::VECTOR_LEN,
                values.len()
            );
        }

        let mut weights = Self::PESTO;

        for kind in PieceKind::all() {
            let value = values[kind.index()];

            let mg_start = PieceKind::COUNT + kind.index() * Square::COUNT;
            let eg_start = mg_start + PieceKind::COUNT * Square::COUNT;

            let mut mg = [0; Square::COUNT];
            let mut eg = [0; Square::COUNT];
            mg.copy_from_slice(&values[mg_start..mg_start + Square::COUNT]);
            eg.copy_from_slice(&values[eg_start..eg_start + Square::COUNT]);

            weights.mg[kind.index()] = Psqt::new(value, mg);
            weights.eg[kind.index()] = Psqt::new(value, eg);
        }

        Ok(weights)
    }

    /// The middle-game and end-game contributions of `piece` on `square`,
    /// material value included.
    #[inline(always)]
    pub fn evals(&self, piece: Piece, square: Square) -> (Score, Score) {
        let kind = piece.kind();
        let square = square.rank_relative_to(piece.color());

        (
            Score::new(self.mg[kind.index()].get(square)),
            Score::new(self.eg[kind.index()].get(square)),
        )
    }
}

impl Default for EvalWeights {
    #[inline(always)]
    fn default() -> Self {
        Self::PESTO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_color_symmetric() {
        let weights = EvalWeights::default();

        for square in Square::iter() {
            for kind in PieceKind::all() {
                let white = weights.evals(Piece::new(Color::White, kind), square);
                let black = weights.evals(
                    Piece::new(Color::Black, kind),
                    square.rank_relative_to(Color::Black),
                );

                assert_eq!(
                    white, black,
                    "{} on {square} evaluates differently per color",
                    kind.name()
                );
            }
        }
    }

    #[test]
    fn test_tables_include_material() {
        let weights = EvalWeights::default();

        // A queen is always worth more than a pawn, wherever they stand.
        for square in Square::iter() {
            let (queen_mg, _) = weights.evals(
                Piece::new(Color::White, PieceKind::Queen),
                square,
            );
            let (pawn_mg, _) = weights.evals(Piece::new(Color::White, PieceKind::Pawn), square);
            assert!(queen_mg > pawn_mg);
        }
    }

    #[test]
    fn test_from_vector_layout() {
        let mut values = vec![0; EvalWeights::VECTOR_LEN];

        // A pawn worth 123 with an empty table evaluates to exactly 123.
        values[PieceKind::Pawn.index()] = 123;

        // Give the knight's middle-game table a distinctive bump on A1.
        // Diagram order puts A1 at index 56 of the knight's block.
        let knight_mg_start = PieceKind::COUNT + PieceKind::Knight.index() * Square::COUNT;
        values[knight_mg_start + 56] = 17;

        let weights = EvalWeights::from_vector(&values).unwrap();

        let pawn = Piece::new(Color::White, PieceKind::Pawn);
        assert_eq!(weights.evals(pawn, Square::E4).0, Score::new(123));

        let knight = Piece::new(Color::White, PieceKind::Knight);
        assert_eq!(weights.evals(knight, Square::A1).0, Score::new(17));
        assert_eq!(weights.evals(knight, Square::B1).0, Score::new(0));
    }

    #[test]
    fn test_from_vector_rejects_wrong_length() {
        assert!(EvalWeights::from_vector(&[1, 2, 3]).is_err());
        assert!(EvalWeights::from_vector(&vec![0; EvalWeights::VECTOR_LEN + 1]).is_err());
    }
}
