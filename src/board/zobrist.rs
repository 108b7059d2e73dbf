/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{CastlingRights, Color, Piece, Position, Rank, Square, XoShiRo};

/// Zobrist hash keys for every hashable feature of a position.
///
/// Generated once, at compile time, so keys remain constant between builds.
const ZOBRIST_TABLE: ZobristHashTable = ZobristHashTable::new();

/// A 64-bit Zobrist key identifying a position.
///
/// Maintained incrementally: every feature change XORs its key in or out, so
/// applying the same change twice is a no-op and un-making a move restores
/// the original key.
#[derive(Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct ZobristKey(u64);

impl ZobristKey {
    /// Computes the key of `position` from scratch.
    ///
    /// The incrementally-maintained key of any reachable position must always
    /// equal this value.
    pub fn new(position: &Position) -> Self {
        let mut key = Self::default();

        for (square, piece) in position.board().iter() {
            key.hash_piece(square, piece);
        }

        key.hash_optional_ep_square(position.ep_square());
        key.hash_castling_rights(position.castling());
        key.hash_side_to_move(position.side_to_move());

        key
    }

    /// The inner `u64` of this key.
    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// XORs `hash_key` into this key. Calling twice un-hashes it.
    #[inline(always)]
    pub fn hash(&mut self, hash_key: u64) {
        self.0 ^= hash_key;
    }

    /// Adds/removes the key for `piece` on `square`.
    #[inline(always)]
    pub fn hash_piece(&mut self, square: Square, piece: Piece) {
        self.hash(ZOBRIST_TABLE.piece_keys[square.index()][piece.index()]);
    }

    /// Adds/removes the key for an en passant square.
    ///
    /// Only squares on ranks 3 and 6 have nonzero keys, since en passant can
    /// only ever occur there.
    #[inline(always)]
    pub fn hash_ep_square(&mut self, ep_square: Square) {
        self.hash(ZOBRIST_TABLE.ep_keys[ep_square.index()]);
    }

    /// Like [`ZobristKey::hash_ep_square`], but a `None` square hashes nothing.
    #[inline(always)]
    pub fn hash_optional_ep_square(&mut self, ep_square: Option<Square>) {
        // Square::default() is A1, whose en passant key is 0.
        self.hash_ep_square(ep_square.unwrap_or_default());
    }

    /// Adds/removes the key for a full set of castling rights.
    #[inline(always)]
    pub fn hash_castling_rights(&mut self, rights: CastlingRights) {
        self.hash(ZOBRIST_TABLE.castling_keys[rights.index()]);
    }

    /// Adds/removes the side-to-move key. White's key is 0 by convention.
    #[inline(always)]
    pub fn hash_side_to_move(&mut self, color: Color) {
        self.hash(ZOBRIST_TABLE.color_keys[color.index()]);
    }
}

impl fmt::Display for ZobristKey {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The raw key tables backing [`ZobristKey`].
struct ZobristHashTable {
    /// One key for every piece on every square.
    piece_keys: [[u64; Piece::COUNT]; Square::COUNT],

    /// One key for every square where en passant is possible; 0 elsewhere.
    ep_keys: [u64; Square::COUNT],

    /// One key for every combination of castling rights.
    castling_keys: [u64; CastlingRights::COUNT],

    /// One key per side to move; White's is 0.
    color_keys: [u64; Color::COUNT],
}

impl ZobristHashTable {
    /// Generates all keys from the library's [`XoShiRo`] seeds.
    const fn new() -> Self {
        let mut piece_keys = [[0; Piece::COUNT]; Square::COUNT];
        let mut ep_keys = [0; Square::COUNT];
        let mut castling_keys = [0; CastlingRights::COUNT];
        let mut color_keys = [0; Color::COUNT];

        let mut prng = XoShiRo::new();

        let mut i = 0;
        while i < Square::COUNT {
            let mut j = 0;
            while j < Piece::COUNT {
                let key;
                (key, prng) = prng.get_next_const();
                piece_keys[i][j] = key;
                j += 1;
            }

            // En passant squares only exist on ranks 3 and 6.
            let rank = Square::from_index_unchecked(i).rank();
            if rank.inner() == Rank::THREE.inner() || rank.inner() == Rank::SIX.inner() {
                let key;
                (key, prng) = prng.get_next_const();
                ep_keys[i] = key;
            }

            i += 1;
        }

        i = 0;
        while i < CastlingRights::COUNT {
            let key;
            (key, prng) = prng.get_next_const();
            castling_keys[i] = key;
            i += 1;
        }

        let (key, _) = prng.get_next_const();
        color_keys[Color::Black as usize] = key;

        Self {
            piece_keys,
            ep_keys,
            castling_keys,
            color_keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashing_is_reversible() {
        let mut key = ZobristKey::default();
        assert_eq!(key.inner(), 0);

        key.hash_piece(Square::D7, Piece::BLACK_PAWN);
        assert_ne!(key.inner(), 0);

        key.hash_piece(Square::D7, Piece::BLACK_PAWN);
        assert_eq!(key.inner(), 0);
    }

    #[test]
    fn test_features_have_distinct_keys() {
        let mut pawn_d7 = ZobristKey::default();
        pawn_d7.hash_piece(Square::D7, Piece::BLACK_PAWN);

        let mut pawn_d5 = ZobristKey::default();
        pawn_d5.hash_piece(Square::D5, Piece::BLACK_PAWN);
        assert_ne!(pawn_d7, pawn_d5);

        let mut white_pawn_d7 = ZobristKey::default();
        white_pawn_d7.hash_piece(Square::D7, Piece::WHITE_PAWN);
        assert_ne!(white_pawn_d7, pawn_d7);

        let mut rook_d7 = ZobristKey::default();
        rook_d7.hash_piece(Square::D7, Piece::BLACK_ROOK);
        assert_ne!(rook_d7, pawn_d7);
    }

    #[test]
    fn test_side_to_move_key() {
        let mut white = ZobristKey::default();
        white.hash_side_to_move(Color::White);
        assert_eq!(white.inner(), 0);

        let mut black = ZobristKey::default();
        black.hash_side_to_move(Color::Black);
        assert_ne!(black.inner(), 0);
    }

    #[test]
    fn test_ep_keys_only_on_ep_ranks() {
        let mut e3 = ZobristKey::default();
        e3.hash_ep_square(Square::E3);
        assert_ne!(e3.inner(), 0);

        let mut d6 = ZobristKey::default();
        d6.hash_ep_square(Square::D6);
        assert_ne!(d6.inner(), 0);
        assert_ne!(d6, e3);

        // Ranks where en passant cannot occur hash to nothing.
        let mut e2 = ZobristKey::default();
        e2.hash_ep_square(Square::E2);
        assert_eq!(e2.inner(), 0);
    }
}
