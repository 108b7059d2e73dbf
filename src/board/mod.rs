/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Precomputed attack and ray tables.
mod attacks;

/// The [`Bitboard`] type.
mod bitboard;

/// The playable [`Game`] type and legal move generation.
mod game;

/// Move representation and notation parsing.
mod moves;

/// Perft drivers for validating move generation.
mod perft;

/// Colors, piece kinds, and colored pieces.
mod piece;

/// The [`Position`] type: placement, rights, counters, and hashing.
mod position;

/// A `const`-capable pseudo-random number generator.
mod prng;

/// Squares, files, and ranks.
mod square;

/// Misc constants.
mod utils;

/// Zobrist hashing.
mod zobrist;

pub use attacks::*;
pub use bitboard::*;
pub use game::*;
pub use moves::*;
pub use perft::*;
pub use piece::*;
pub use position::*;
pub use prng::*;
pub use square::*;
pub use utils::*;
pub use zobrist::*;
