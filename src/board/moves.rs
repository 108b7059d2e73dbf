/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{anyhow, bail, Result};

use super::{Piece, PieceKind, Position, Rank, Square};

/// Maximum possible number of moves in a legal chess position.
///
/// Found [here](<https://www.chessprogramming.org/Chess_Position#cite_note-4>)
pub const MAX_NUM_MOVES: usize = 218;

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_NUM_MOVES>;

/// The different kinds of moves that can be made during a chess game.
///
/// Represented as bit flags in the upper nibble of a [`Move`], following the
/// [from-to based encoding](https://www.chessprogramming.org/Encoding_Moves#From-To_Based).
/// The tag exists so that applying a move dispatches only the incremental
/// update logic that kind requires.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum MoveKind {
    /// A single piece moves; no captures, no piece count changes.
    Quiet = 0 << Move::FLG_BITS,

    /// A pawn advances two squares from its starting rank.
    PawnDoublePush = 1 << Move::FLG_BITS,

    /// The King moves two files towards the kingside Rook.
    ShortCastle = 2 << Move::FLG_BITS,

    /// The King moves two files towards the queenside Rook.
    LongCastle = 3 << Move::FLG_BITS,

    /// A piece moves onto a square occupied by an enemy piece, removing it.
    Capture = 4 << Move::FLG_BITS,

    /// A pawn captures the pawn that just double-pushed past it.
    EnPassantCapture = 5 << Move::FLG_BITS,

    /// A pawn reaches the back rank and becomes a Knight.
    PromoteKnight = 8 << Move::FLG_BITS,

    /// A pawn reaches the back rank and becomes a Bishop.
    PromoteBishop = 9 << Move::FLG_BITS,

    /// A pawn reaches the back rank and becomes a Rook.
    PromoteRook = 10 << Move::FLG_BITS,

    /// A pawn reaches the back rank and becomes a Queen.
    PromoteQueen = 11 << Move::FLG_BITS,

    /// A capturing promotion to a Knight.
    CaptureAndPromoteKnight = 12 << Move::FLG_BITS,

    /// A capturing promotion to a Bishop.
    CaptureAndPromoteBishop = 13 << Move::FLG_BITS,

    /// A capturing promotion to a Rook.
    CaptureAndPromoteRook = 14 << Move::FLG_BITS,

    /// A capturing promotion to a Queen.
    CaptureAndPromoteQueen = 15 << Move::FLG_BITS,
}

impl MoveKind {
    /// The non-capturing promotion to `promotion`.
    ///
    /// # Panics
    /// If `promotion` is not a Knight, Bishop, Rook, or Queen.
    #[inline(always)]
    pub fn promotion(promotion: PieceKind) -> Self {
        match promotion {
            PieceKind::Knight => Self::PromoteKnight,
            PieceKind::Bishop => Self::PromoteBishop,
            PieceKind::Rook => Self::PromoteRook,
            PieceKind::Queen => Self::PromoteQueen,
            _ => unreachable!(),
        }
    }

    /// The capturing promotion to `promotion`.
    ///
    /// # Panics
    /// If `promotion` is not a Knight, Bishop, Rook, or Queen.
    #[inline(always)]
    pub fn promotion_capture(promotion: PieceKind) -> Self {
        match promotion {
            PieceKind::Knight => Self::CaptureAndPromoteKnight,
            PieceKind::Bishop => Self::CaptureAndPromoteBishop,
            PieceKind::Rook => Self::CaptureAndPromoteRook,
            PieceKind::Queen => Self::CaptureAndPromoteQueen,
            _ => unreachable!(),
        }
    }

    /// Determines the appropriate [`MoveKind`] for moving `piece` from `from`
    /// to `to` within `position`.
    ///
    /// Castling is recognized by the King moving two files; promotion by a
    /// Pawn reaching the back rank (defaulting to a Queen if `promotion` was
    /// not supplied).
    pub fn new(
        piece: Piece,
        from: Square,
        to: Square,
        position: &Position,
        promotion: Option<PieceKind>,
    ) -> Self {
        let mut kind = if position.board().has(to) {
            Self::Capture
        } else {
            Self::Quiet
        };

        match piece.kind() {
            PieceKind::Pawn => {
                if to.rank() == Rank::eighth(piece.color()) {
                    let promotion = promotion.unwrap_or(PieceKind::Queen);
                    kind = if kind == Self::Capture {
                        Self::promotion_capture(promotion)
                    } else {
                        Self::promotion(promotion)
                    };
                } else if Some(to) == position.ep_square() {
                    kind = Self::EnPassantCapture;
                } else if from.distance_ranks(to) == 2 {
                    kind = Self::PawnDoublePush;
                }
            }

            // A King moving two files can only be castling.
            PieceKind::King if from.distance_files(to) == 2 => {
                kind = if to.file() > from.file() {
                    Self::ShortCastle
                } else {
                    Self::LongCastle
                };
            }

            _ => {}
        }

        kind
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Quiet => "Quiet",
            Self::PawnDoublePush => "Pawn Double Push",
            Self::ShortCastle => "Short Castle",
            Self::LongCastle => "Long Castle",
            Self::Capture => "Capture",
            Self::EnPassantCapture => "En Passant Capture",
            Self::PromoteKnight => "Promotion (Knight)",
            Self::PromoteBishop => "Promotion (Bishop)",
            Self::PromoteRook => "Promotion (Rook)",
            Self::PromoteQueen => "Promotion (Queen)",
            Self::CaptureAndPromoteKnight => "Capture and Promotion (Knight)",
            Self::CaptureAndPromoteBishop => "Capture and Promotion (Bishop)",
            Self::CaptureAndPromoteRook => "Capture and Promotion (Rook)",
            Self::CaptureAndPromoteQueen => "Capture and Promotion (Queen)",
        };

        write!(f, "{s}")
    }
}

/// A move on a chess board, including any promotion.
///
/// Encoded in 16 bits:
/// ```text
///     0000 000000 000000
///      |     |      |
///      |     |      +- Source square of the move.
///      |     +- Target square of the move.
///      +- Flags for captures, promotions, castling, etc.
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Move(u16);

impl Move {
    /// Mask for the source ("from") bits.
    const SRC_MASK: u16 = 0b0000_0000_0011_1111;
    /// Mask for the destination ("to") bits.
    const DST_MASK: u16 = 0b0000_1111_1100_0000;
    /// Mask for the flag (promotions, captures, etc.) bits.
    const FLG_MASK: u16 = 0b1111_0000_0000_0000;
    /// Start index of destination bits.
    const DST_BITS: u16 = 6;
    /// Start index of flag bits.
    const FLG_BITS: u16 = 12;

    const FLAG_PAWN_DOUBLE: u16 = 1 << Self::FLG_BITS;
    const FLAG_CASTLE_SHORT: u16 = 2 << Self::FLG_BITS;
    const FLAG_CASTLE_LONG: u16 = 3 << Self::FLG_BITS;
    const FLAG_CAPTURE: u16 = 4 << Self::FLG_BITS;
    const FLAG_EP_CAPTURE: u16 = 5 << Self::FLG_BITS;
    const FLAG_PROMO_KNIGHT: u16 = 8 << Self::FLG_BITS;
    const FLAG_PROMO_BISHOP: u16 = 9 << Self::FLG_BITS;
    const FLAG_PROMO_ROOK: u16 = 10 << Self::FLG_BITS;
    const FLAG_PROMO_QUEEN: u16 = 11 << Self::FLG_BITS;
    const FLAG_CAPTURE_PROMO_KNIGHT: u16 = 12 << Self::FLG_BITS;
    const FLAG_CAPTURE_PROMO_BISHOP: u16 = 13 << Self::FLG_BITS;
    const FLAG_CAPTURE_PROMO_ROOK: u16 = 14 << Self::FLG_BITS;
    const FLAG_CAPTURE_PROMO_QUEEN: u16 = 15 << Self::FLG_BITS;

    /// Creates a new [`Move`] from two [`Square`]s and a [`MoveKind`].
    ///
    /// # Example
    /// ```
    /// # use eft::{Move, MoveKind, PieceKind, Square};
    /// let e2e4 = Move::new(Square::E2, Square::E4, MoveKind::PawnDoublePush);
    /// assert_eq!(e2e4.to_string(), "e2e4");
    ///
    /// let e7e8n = Move::new(Square::E7, Square::E8, MoveKind::promotion(PieceKind::Knight));
    /// assert_eq!(e7e8n.to_string(), "e7e8n");
    /// ```
    #[inline(always)]
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Self {
        Self(kind as u16 | (to.inner() as u16) << Self::DST_BITS | from.inner() as u16)
    }

    /// The reserved null move, moving a piece from A1 to A1.
    ///
    /// Never generated; passing it to `make_move` is a caller bug.
    #[inline(always)]
    pub const fn illegal() -> Self {
        Self(0)
    }

    /// The raw encoding of this move.
    ///
    /// Serves as the move-identity key for the opening book.
    #[inline(always)]
    pub const fn inner(&self) -> u16 {
        self.0
    }

    /// The source square.
    #[inline(always)]
    pub const fn from(&self) -> Square {
        Square::from_index_unchecked((self.0 & Self::SRC_MASK) as usize)
    }

    /// The destination square.
    #[inline(always)]
    pub const fn to(&self) -> Square {
        Square::from_index_unchecked(((self.0 & Self::DST_MASK) >> Self::DST_BITS) as usize)
    }

    /// The [`MoveKind`] of this move.
    #[inline(always)]
    pub fn kind(&self) -> MoveKind {
        // Safety: a Move can only be constructed through the public API, so
        // the flag bits always hold a valid MoveKind discriminant.
        unsafe { std::mem::transmute(self.0 & Self::FLG_MASK) }
    }

    /// Returns `true` for captures of any kind, en passant and capturing
    /// promotions included.
    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        self.0 & Self::FLAG_CAPTURE != 0
    }

    /// Returns `true` for non-capturing moves.
    #[inline(always)]
    pub const fn is_quiet(&self) -> bool {
        self.0 & Self::FLAG_CAPTURE == 0
    }

    #[inline(always)]
    pub const fn is_en_passant(&self) -> bool {
        (self.0 & Self::FLG_MASK) ^ Self::FLAG_EP_CAPTURE == 0
    }

    #[inline(always)]
    pub const fn is_short_castle(&self) -> bool {
        (self.0 & Self::FLG_MASK) ^ Self::FLAG_CASTLE_SHORT == 0
    }

    #[inline(always)]
    pub const fn is_long_castle(&self) -> bool {
        (self.0 & Self::FLG_MASK) ^ Self::FLAG_CASTLE_LONG == 0
    }

    #[inline(always)]
    pub const fn is_castle(&self) -> bool {
        self.is_short_castle() || self.is_long_castle()
    }

    #[inline(always)]
    pub const fn is_pawn_double_push(&self) -> bool {
        (self.0 & Self::FLG_MASK) ^ Self::FLAG_PAWN_DOUBLE == 0
    }

    /// The [`PieceKind`] this move promotes to, if it is a promotion.
    #[inline(always)]
    pub fn promotion(&self) -> Option<PieceKind> {
        match self.0 & Self::FLG_MASK {
            Self::FLAG_PROMO_QUEEN | Self::FLAG_CAPTURE_PROMO_QUEEN => Some(PieceKind::Queen),
            Self::FLAG_PROMO_KNIGHT | Self::FLAG_CAPTURE_PROMO_KNIGHT => Some(PieceKind::Knight),
            Self::FLAG_PROMO_ROOK | Self::FLAG_CAPTURE_PROMO_ROOK => Some(PieceKind::Rook),
            Self::FLAG_PROMO_BISHOP | Self::FLAG_CAPTURE_PROMO_BISHOP => Some(PieceKind::Bishop),
            _ => None,
        }
    }

    /// Parses a move against `position`, accepting either coordinate notation
    /// (`e2e4`, `e7e8q`) or comma-separated square indices (`12,28` or
    /// `52,60,q`).
    ///
    /// The kind of the move (capture, castle, en passant, ...) is derived
    /// from the position, so the result is directly usable by `make_move`.
    pub fn from_text(position: &Position, text: &str) -> Result<Self> {
        let text = text.trim();

        let (from, to, promotion) = if text.contains(',') {
            Self::parse_index_notation(text)?
        } else {
            Self::parse_coordinate_notation(text)?
        };

        let piece = position.board().piece_at(from).ok_or(anyhow!(
            "No piece at {from} when parsing {text:?} on {position}"
        ))?;

        let kind = MoveKind::new(piece, from, to, position, promotion);

        Ok(Self::new(from, to, kind))
    }

    /// Parses `"<fromIndex>,<toIndex>[,<promotionKind>]"`.
    fn parse_index_notation(text: &str) -> Result<(Square, Square, Option<PieceKind>)> {
        let mut parts = text.split(',');

        let from = parts
            .next()
            .ok_or(anyhow!("Move str must have a `from` index. Got {text:?}"))?;
        let to = parts
            .next()
            .ok_or(anyhow!("Move str must have a `to` index. Got {text:?}"))?;

        let from = Square::from_index(from.trim().parse()?)?;
        let to = Square::from_index(to.trim().parse()?)?;

        let promotion = parts
            .next()
            .map(|s| s.trim().parse::<PieceKind>())
            .transpose()?;

        if parts.next().is_some() {
            bail!("Move str has too many fields. Got {text:?}");
        }

        Ok((from, to, promotion))
    }

    /// Parses `"<from><to>[<promotionKind>]"` like `e2e4` or `a7a8q`.
    fn parse_coordinate_notation(text: &str) -> Result<(Square, Square, Option<PieceKind>)> {
        let from = text
            .get(0..2)
            .ok_or(anyhow!("Move str must have a `from` square. Got {text:?}"))?;
        let to = text
            .get(2..4)
            .ok_or(anyhow!("Move str must have a `to` square. Got {text:?}"))?;

        let from = Square::from_uci(from)?;
        let to = Square::from_uci(to)?;

        let promotion = text
            .get(4..5)
            .map(|s| s.parse::<PieceKind>())
            .transpose()?;

        Ok((from, to, promotion))
    }
}

impl fmt::Display for Move {
    /// Coordinate notation: `from`, `to`, and the promotion char, if any.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(promotion) = self.promotion() {
            write!(f, "{}{}{}", self.from(), self.to(), promotion.char())
        } else {
            write!(f, "{}{}", self.from(), self.to())
        }
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({})", self.kind())
    }
}

impl Default for Move {
    /// The "default" move is the illegal null move.
    #[inline(always)]
    fn default() -> Self {
        Self::illegal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Piece, Position};

    #[test]
    fn test_encoding_round_trip() {
        let mv = Move::new(Square::E2, Square::E4, MoveKind::PawnDoublePush);
        assert_eq!(mv.from(), Square::E2);
        assert_eq!(mv.to(), Square::E4);
        assert_eq!(mv.kind(), MoveKind::PawnDoublePush);
        assert!(mv.is_quiet());
        assert!(mv.is_pawn_double_push());

        let promo = Move::new(
            Square::E7,
            Square::D8,
            MoveKind::promotion_capture(PieceKind::Knight),
        );
        assert!(promo.is_capture());
        assert_eq!(promo.promotion(), Some(PieceKind::Knight));
        assert_eq!(promo.to_string(), "e7d8n");
    }

    #[test]
    fn test_coordinate_notation() {
        let pos = Position::default();
        let mv = Move::from_text(&pos, "e2e4").unwrap();
        assert_eq!(mv, Move::new(Square::E2, Square::E4, MoveKind::PawnDoublePush));

        let mv = Move::from_text(&pos, "g1f3").unwrap();
        assert_eq!(mv, Move::new(Square::G1, Square::F3, MoveKind::Quiet));
    }

    #[test]
    fn test_index_notation() {
        let pos = Position::default();
        // E2 is index 12, E4 is index 28.
        let mv = Move::from_text(&pos, "12,28").unwrap();
        assert_eq!(mv, Move::new(Square::E2, Square::E4, MoveKind::PawnDoublePush));

        let pos = Position::from_fen("k7/4P3/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let mv = Move::from_text(&pos, "52,60,r").unwrap();
        assert_eq!(
            mv,
            Move::new(Square::E7, Square::E8, MoveKind::promotion(PieceKind::Rook))
        );
    }

    #[test]
    fn test_castle_notation() {
        let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();

        let short = Move::from_text(&pos, "e1g1").unwrap();
        assert!(short.is_short_castle());

        let long = Move::from_text(&pos, "e1c1").unwrap();
        assert!(long.is_long_castle());
    }

    #[test]
    fn test_en_passant_notation() {
        let pos = Position::from_fen("k7/8/8/3pP3/8/8/8/K7 w - d6 0 2").unwrap();
        let mv = Move::from_text(&pos, "e5d6").unwrap();
        assert!(mv.is_en_passant());
        assert!(mv.is_capture());
    }

    #[test]
    fn test_default_promotion_is_queen() {
        let pos = Position::from_fen("k7/4P3/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let mv = Move::from_text(&pos, "e7e8").unwrap();
        assert_eq!(mv.promotion(), Some(PieceKind::Queen));
    }

    #[test]
    fn test_kind_derivation_uses_piece() {
        let pos = Position::default();
        let pawn = Piece::new(Color::White, PieceKind::Pawn);
        let kind = MoveKind::new(pawn, Square::E2, Square::E4, &pos, None);
        assert_eq!(kind, MoveKind::PawnDoublePush);
    }
}
