/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Result};

/// The two sides of a chess game.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum Color {
    #[default]
    White = 0,
    Black = 1,
}

impl Color {
    pub const COUNT: usize = 2;

    /// Index of this color, for addressing per-color tables.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// The other color.
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Yields [`Color::Black`] if `is_black` is `true`.
    #[inline(always)]
    pub const fn from_bool(is_black: bool) -> Self {
        if is_black {
            Self::Black
        } else {
            Self::White
        }
    }

    #[inline(always)]
    pub const fn is_white(&self) -> bool {
        matches!(self, Self::White)
    }

    /// `1` for White, `-1` for Black.
    ///
    /// Useful when scores must be negated for the second player.
    #[inline(always)]
    pub const fn negation_multiplier(&self) -> i32 {
        match self {
            Self::White => 1,
            Self::Black => -1,
        }
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }

    /// Both colors, White first.
    #[inline(always)]
    pub const fn all() -> [Self; 2] {
        [Self::White, Self::Black]
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "w" | "W" => Ok(Self::White),
            "b" | "B" => Ok(Self::Black),
            _ => bail!("Color str must be 'w' or 'b'. Got {s:?}"),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.is_white() { 'w' } else { 'b' })
    }
}

impl<T> std::ops::Index<Color> for [T; Color::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: Color) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> std::ops::IndexMut<Color> for [T; Color::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: Color) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

/// The six kinds of chess pieces.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[repr(u8)]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceKind {
    pub const COUNT: usize = 6;

    /// Index of this kind, for addressing per-kind tables.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Creates a [`PieceKind`] from its index without bounds checking.
    #[inline(always)]
    pub const fn from_bits_unchecked(bits: u8) -> Self {
        // Safety: the enum is repr(u8) with contiguous discriminants 0..6.
        unsafe { std::mem::transmute(bits) }
    }

    /// Material value of this kind, in centipawns.
    ///
    /// The King is valued at 0, as it can never leave the board.
    #[inline(always)]
    pub const fn value(&self) -> i32 {
        match self {
            Self::Pawn => 100,
            Self::Knight => 320,
            Self::Bishop => 330,
            Self::Rook => 500,
            Self::Queen => 900,
            Self::King => 0,
        }
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pawn => "pawn",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Rook => "rook",
            Self::Queen => "queen",
            Self::King => "king",
        }
    }

    /// Lowercase piece char, as used in FEN for Black pieces.
    #[inline(always)]
    pub const fn char(&self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }

    /// Parses a piece kind from a char of either case.
    pub fn from_uci(c: char) -> Result<Self> {
        match c.to_ascii_lowercase() {
            'p' => Ok(Self::Pawn),
            'n' => Ok(Self::Knight),
            'b' => Ok(Self::Bishop),
            'r' => Ok(Self::Rook),
            'q' => Ok(Self::Queen),
            'k' => Ok(Self::King),
            _ => bail!("PieceKind char must be one of pnbrqk. Got {c:?}"),
        }
    }

    /// All six kinds, Pawn first.
    #[inline(always)]
    pub const fn all() -> [Self; 6] {
        [
            Self::Pawn,
            Self::Knight,
            Self::Bishop,
            Self::Rook,
            Self::Queen,
            Self::King,
        ]
    }

    /// All kinds except the King, for material counting.
    #[inline(always)]
    pub const fn all_except_king() -> [Self; 5] {
        [
            Self::Pawn,
            Self::Knight,
            Self::Bishop,
            Self::Rook,
            Self::Queen,
        ]
    }
}

impl FromStr for PieceKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        let c = s
            .chars()
            .next()
            .ok_or_else(|| anyhow::anyhow!("PieceKind str cannot be empty"))?;
        Self::from_uci(c)
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl<T> std::ops::Index<PieceKind> for [T; PieceKind::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: PieceKind) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> std::ops::IndexMut<PieceKind> for [T; PieceKind::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: PieceKind) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

/// A colored piece: a [`PieceKind`] belonging to a [`Color`].
///
/// Encoded as `kind | color << 3` in a single byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Piece(u8);

impl Piece {
    /// Number of distinct colored pieces.
    pub const COUNT: usize = 12;

    const COLOR_BIT: u8 = 1 << 3;

    pub const WHITE_PAWN: Self = Self::new(Color::White, PieceKind::Pawn);
    pub const WHITE_ROOK: Self = Self::new(Color::White, PieceKind::Rook);
    pub const WHITE_KING: Self = Self::new(Color::White, PieceKind::King);
    pub const BLACK_PAWN: Self = Self::new(Color::Black, PieceKind::Pawn);
    pub const BLACK_ROOK: Self = Self::new(Color::Black, PieceKind::Rook);
    pub const BLACK_KING: Self = Self::new(Color::Black, PieceKind::King);

    /// Creates a new [`Piece`] of `kind` belonging to `color`.
    #[inline(always)]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self(kind as u8 | (color as u8) << 3)
    }

    /// The [`Color`] of this piece.
    #[inline(always)]
    pub const fn color(&self) -> Color {
        Color::from_bool(self.0 & Self::COLOR_BIT != 0)
    }

    /// The [`PieceKind`] of this piece.
    #[inline(always)]
    pub const fn kind(&self) -> PieceKind {
        PieceKind::from_bits_unchecked(self.0 & !Self::COLOR_BIT)
    }

    /// Index in `0..12` for addressing per-piece tables (White pieces first).
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.kind().index() + self.color().index() * PieceKind::COUNT
    }

    /// This piece after promoting to `kind`.
    #[inline(always)]
    pub const fn promoted(self, kind: PieceKind) -> Self {
        Self::new(self.color(), kind)
    }

    #[inline(always)]
    pub const fn is_pawn(&self) -> bool {
        matches!(self.kind(), PieceKind::Pawn)
    }

    #[inline(always)]
    pub const fn is_rook(&self) -> bool {
        matches!(self.kind(), PieceKind::Rook)
    }

    #[inline(always)]
    pub const fn is_king(&self) -> bool {
        matches!(self.kind(), PieceKind::King)
    }

    /// FEN char of this piece: uppercase for White, lowercase for Black.
    #[inline(always)]
    pub const fn char(&self) -> char {
        let c = self.kind().char();
        if self.color().is_white() {
            c.to_ascii_uppercase()
        } else {
            c
        }
    }

    /// Parses a piece from a FEN char, deriving its color from the case.
    pub fn from_uci(c: char) -> Result<Self> {
        let kind = PieceKind::from_uci(c)?;
        let color = Color::from_bool(c.is_ascii_lowercase());
        Ok(Self::new(color, kind))
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        self.kind().name()
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color().name(), self.name())
    }
}

impl<T> std::ops::Index<Piece> for [T; Piece::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: Piece) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> std::ops::IndexMut<Piece> for [T; Piece::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: Piece) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_encoding() {
        let wn = Piece::new(Color::White, PieceKind::Knight);
        assert_eq!(wn.color(), Color::White);
        assert_eq!(wn.kind(), PieceKind::Knight);
        assert_eq!(wn.char(), 'N');

        let bq = Piece::from_uci('q').unwrap();
        assert_eq!(bq.color(), Color::Black);
        assert_eq!(bq.kind(), PieceKind::Queen);
        assert_eq!(bq.index(), 10);
    }

    #[test]
    fn test_promotion_keeps_color() {
        let bp = Piece::BLACK_PAWN;
        let promoted = bp.promoted(PieceKind::Queen);
        assert_eq!(promoted.color(), Color::Black);
        assert_eq!(promoted.kind(), PieceKind::Queen);
    }
}
