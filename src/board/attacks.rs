/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Precomputed attack and ray tables.
//!
//! Everything here is generated at compile time: leaper mobility (Knight,
//! King), pawn pushes/attacks per color, and per-direction rays. Sliding
//! attacks are resolved classically, by finding the first blocker along each
//! directional ray with a bit scan and truncating the ray there.

use super::{Bitboard, Color, Rank, Square};

/// A compass direction a sliding piece can travel in.
///
/// The first four directions point towards higher square indices, the last
/// four towards lower ones; [`Direction::opposite`] maps between the halves.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    East = 1,
    NorthEast = 2,
    NorthWest = 3,
    South = 4,
    West = 5,
    SouthWest = 6,
    SouthEast = 7,
}

impl Direction {
    pub const COUNT: usize = 8;

    /// `(file, rank)` deltas, index-aligned with the discriminants above.
    const DELTAS: [(i8, i8); Self::COUNT] = [
        (0, 1),
        (1, 0),
        (1, 1),
        (-1, 1),
        (0, -1),
        (-1, 0),
        (-1, -1),
        (1, -1),
    ];

    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Returns `true` if this direction points towards higher square indices.
    ///
    /// Determines whether a forward or reverse bit scan finds the *nearest*
    /// occupied square along the ray.
    #[inline(always)]
    pub const fn is_positive(&self) -> bool {
        (*self as u8) < 4
    }

    /// The reverse of this direction.
    #[inline(always)]
    pub const fn opposite(&self) -> Self {
        // Safety: the discriminants are 0..8, and XOR by 4 swaps the halves.
        unsafe { std::mem::transmute(*self as u8 ^ 4) }
    }

    /// All eight directions.
    #[inline(always)]
    pub const fn all() -> [Self; 8] {
        [
            Self::North,
            Self::East,
            Self::NorthEast,
            Self::NorthWest,
            Self::South,
            Self::West,
            Self::SouthWest,
            Self::SouthEast,
        ]
    }
}

/// Deltas for the movement of the Knight.
const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (1, -2),
    (2, 1),
    (2, -1),
    (-1, 2),
    (-1, -2),
    (-2, 1),
    (-2, -1),
];

/// Rays indexed by `[direction][square]`, excluding the origin square.
const RAYS: [[Bitboard; Square::COUNT]; Direction::COUNT] = {
    let mut rays = [[Bitboard::EMPTY_BOARD; Square::COUNT]; Direction::COUNT];

    let mut d = 0;
    while d < Direction::COUNT {
        let (df, dr) = Direction::DELTAS[d];
        let mut i = 0;
        while i < Square::COUNT {
            let mut ray = Bitboard::EMPTY_BOARD;
            let mut current = Square::from_index_unchecked(i);

            while let Some(next) = current.offset(df, dr) {
                ray = ray.or(next.bitboard());
                current = next;
            }

            rays[d][i] = ray;
            i += 1;
        }
        d += 1;
    }

    rays
};

/// Squares strictly between two aligned squares, indexed by both endpoints.
///
/// Empty if the squares do not share a rank, file, or diagonal.
const RAY_BETWEEN: [[Bitboard; Square::COUNT]; Square::COUNT] = {
    let mut between = [[Bitboard::EMPTY_BOARD; Square::COUNT]; Square::COUNT];

    let mut from = 0;
    while from < Square::COUNT {
        let mut d = 0;
        while d < Direction::COUNT {
            let ray = RAYS[d][from];
            let mut targets = ray.inner();

            // For every square on the ray, the segment between it and `from`
            // is the ray minus the target's own ray in the same direction.
            while targets != 0 {
                let to = targets.trailing_zeros() as usize;
                between[from][to] = ray.xor(RAYS[d][to]).xor(Bitboard::new(1u64 << to));
                targets &= targets - 1;
            }

            d += 1;
        }
        from += 1;
    }

    between
};

/// The full line through two aligned squares (both endpoints included),
/// indexed by both squares. Empty if the squares are not aligned.
const RAY_CONTAINING: [[Bitboard; Square::COUNT]; Square::COUNT] = {
    let mut containing = [[Bitboard::EMPTY_BOARD; Square::COUNT]; Square::COUNT];

    let mut from = 0;
    while from < Square::COUNT {
        containing[from][from] = Bitboard::new(1u64 << from);

        let mut d = 0;
        while d < Direction::COUNT {
            // The line through `from` in direction `d` extends both ways.
            let line = RAYS[d][from]
                .or(RAYS[d ^ 4][from])
                .or(Bitboard::new(1u64 << from));

            let mut targets = RAYS[d][from].inner();
            while targets != 0 {
                let to = targets.trailing_zeros() as usize;
                containing[from][to] = line;
                targets &= targets - 1;
            }

            d += 1;
        }
        from += 1;
    }

    containing
};

/// Generates the mobility of a "leaper" piece (Knight, King) for every origin.
const fn generate_leaper_mobility(deltas: &[(i8, i8)]) -> [Bitboard; Square::COUNT] {
    let mut mobility = [Bitboard::EMPTY_BOARD; Square::COUNT];

    let mut i = 0;
    while i < Square::COUNT {
        let square = Square::from_index_unchecked(i);
        let mut movement = Bitboard::EMPTY_BOARD;

        let mut j = 0;
        while j < deltas.len() {
            let (df, dr) = deltas[j];
            if let Some(shifted) = square.offset(df, dr) {
                movement = movement.or(shifted.bitboard());
            }
            j += 1;
        }

        mobility[i] = movement;
        i += 1;
    }

    mobility
}

/// Generates the push targets for `color` Pawns, including the double push
/// from the pawn rank. Blocker handling is the move generator's job.
const fn generate_pawn_pushes(color: Color) -> [Bitboard; Square::COUNT] {
    let mut boards = [Bitboard::EMPTY_BOARD; Square::COUNT];

    let mut i = 0;
    while i < Square::COUNT {
        let square = Square::from_index_unchecked(i);
        let bb = square.bitboard();

        boards[i] = bb.forward_by(color, 1);
        if square.rank().inner() == Rank::second(color).inner() {
            boards[i] = boards[i].or(bb.forward_by(color, 2));
        }

        i += 1;
    }

    boards
}

/// Generates the capture targets for `color` Pawns.
const fn generate_pawn_attacks(color: Color) -> [Bitboard; Square::COUNT] {
    let mut boards = [Bitboard::EMPTY_BOARD; Square::COUNT];

    let mut i = 0;
    while i < Square::COUNT {
        let bb = Square::from_index_unchecked(i).bitboard();
        let forward = bb.forward_by(color, 1);
        boards[i] = forward.east().or(forward.west());
        i += 1;
    }

    boards
}

const KNIGHT_ATTACKS: [Bitboard; Square::COUNT] = generate_leaper_mobility(&KNIGHT_DELTAS);
const KING_ATTACKS: [Bitboard; Square::COUNT] = generate_leaper_mobility(&Direction::DELTAS);
const WHITE_PAWN_PUSHES: [Bitboard; Square::COUNT] = generate_pawn_pushes(Color::White);
const BLACK_PAWN_PUSHES: [Bitboard; Square::COUNT] = generate_pawn_pushes(Color::Black);
const WHITE_PAWN_ATTACKS: [Bitboard; Square::COUNT] = generate_pawn_attacks(Color::White);
const BLACK_PAWN_ATTACKS: [Bitboard; Square::COUNT] = generate_pawn_attacks(Color::Black);

/// Unblocked Rook rays from every origin.
const ROOK_RAYS: [Bitboard; Square::COUNT] = {
    let mut rays = [Bitboard::EMPTY_BOARD; Square::COUNT];
    let mut i = 0;
    while i < Square::COUNT {
        rays[i] = RAYS[Direction::North.index()][i]
            .or(RAYS[Direction::East.index()][i])
            .or(RAYS[Direction::South.index()][i])
            .or(RAYS[Direction::West.index()][i]);
        i += 1;
    }
    rays
};

/// Unblocked Bishop rays from every origin.
const BISHOP_RAYS: [Bitboard; Square::COUNT] = {
    let mut rays = [Bitboard::EMPTY_BOARD; Square::COUNT];
    let mut i = 0;
    while i < Square::COUNT {
        rays[i] = RAYS[Direction::NorthEast.index()][i]
            .or(RAYS[Direction::NorthWest.index()][i])
            .or(RAYS[Direction::SouthWest.index()][i])
            .or(RAYS[Direction::SouthEast.index()][i]);
        i += 1;
    }
    rays
};

/// Attacked squares along one directional ray, up to and including the first
/// blocker.
#[inline(always)]
const fn ray_attacks(dir: usize, square: usize, blockers: u64) -> u64 {
    let ray = RAYS[dir][square].inner();
    let on_ray = ray & blockers;

    if on_ray == 0 {
        return ray;
    }

    // Nearest blocker is the lowest bit when scanning towards higher indices,
    // the highest bit otherwise.
    let first = if dir < 4 {
        on_ray.trailing_zeros() as usize
    } else {
        63 - on_ray.leading_zeros() as usize
    };

    // Everything beyond the first blocker is shadowed.
    ray ^ RAYS[dir][first].inner()
}

/// The nearest occupied square along a ray from `square` in `direction`, if
/// any square on the ray is occupied.
#[inline(always)]
pub const fn first_blocker(
    square: Square,
    direction: Direction,
    occupancy: Bitboard,
) -> Option<Square> {
    let on_ray = RAYS[direction.index()][square.index()].and(occupancy);
    if direction.is_positive() {
        on_ray.lsb()
    } else {
        on_ray.msb()
    }
}

/// Squares strictly between `from` and `to`, if they share a line.
#[inline(always)]
pub const fn ray_between(from: Square, to: Square) -> Bitboard {
    RAY_BETWEEN[from.index()][to.index()]
}

/// The full line through `from` and `to`, if they share one.
#[inline(always)]
pub const fn ray_containing(from: Square, to: Square) -> Bitboard {
    RAY_CONTAINING[from.index()][to.index()]
}

/// Rook moves from `square` given `blockers`, first blocker included.
#[inline(always)]
pub const fn rook_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    let (sq, b) = (square.index(), blockers.inner());
    Bitboard::new(
        ray_attacks(Direction::North.index(), sq, b)
            | ray_attacks(Direction::East.index(), sq, b)
            | ray_attacks(Direction::South.index(), sq, b)
            | ray_attacks(Direction::West.index(), sq, b),
    )
}

/// Bishop moves from `square` given `blockers`, first blocker included.
#[inline(always)]
pub const fn bishop_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    let (sq, b) = (square.index(), blockers.inner());
    Bitboard::new(
        ray_attacks(Direction::NorthEast.index(), sq, b)
            | ray_attacks(Direction::NorthWest.index(), sq, b)
            | ray_attacks(Direction::SouthWest.index(), sq, b)
            | ray_attacks(Direction::SouthEast.index(), sq, b),
    )
}

/// Queen moves from `square` given `blockers`.
#[inline(always)]
pub const fn queen_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    rook_attacks(square, blockers).or(bishop_attacks(square, blockers))
}

/// Unblocked Rook rays from `square`.
#[inline(always)]
pub const fn rook_rays(square: Square) -> Bitboard {
    ROOK_RAYS[square.index()]
}

/// Unblocked Bishop rays from `square`.
#[inline(always)]
pub const fn bishop_rays(square: Square) -> Bitboard {
    BISHOP_RAYS[square.index()]
}

/// Knight attacks from `square`.
#[inline(always)]
pub const fn knight_attacks(square: Square) -> Bitboard {
    KNIGHT_ATTACKS[square.index()]
}

/// King attacks from `square`.
#[inline(always)]
pub const fn king_attacks(square: Square) -> Bitboard {
    KING_ATTACKS[square.index()]
}

/// Push targets for a `color` Pawn on `square` (blockers not considered).
#[inline(always)]
pub const fn pawn_pushes(square: Square, color: Color) -> Bitboard {
    match color {
        Color::White => WHITE_PAWN_PUSHES[square.index()],
        Color::Black => BLACK_PAWN_PUSHES[square.index()],
    }
}

/// Capture targets for a `color` Pawn on `square`.
#[inline(always)]
pub const fn pawn_attacks(square: Square, color: Color) -> Bitboard {
    match color {
        Color::White => WHITE_PAWN_ATTACKS[square.index()],
        Color::Black => BLACK_PAWN_ATTACKS[square.index()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Checks that `moves` contains exactly the squares in `expected`.
    fn lists_match(moves: Bitboard, expected: &[Square]) {
        assert_eq!(
            moves.population() as usize,
            expected.len(),
            "\nMoves: {:?}\nExpected: {expected:?}",
            moves.into_iter().collect::<Vec<_>>(),
        );

        for square in expected {
            assert!(
                moves.intersects(*square),
                "{square} missing from {:?}",
                moves.into_iter().collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn test_rook_attacks_with_blockers() {
        let blockers = Bitboard::from_square(Square::D6) | Square::D2 | Square::G4 | Square::C2;

        let moves = rook_attacks(Square::D4, blockers);

        lists_match(
            moves,
            &[
                Square::D2,
                Square::D3,
                Square::D5,
                Square::D6,
                Square::A4,
                Square::B4,
                Square::C4,
                Square::E4,
                Square::F4,
                Square::G4,
            ],
        );
    }

    #[test]
    fn test_bishop_attacks_with_blockers() {
        let blockers = Bitboard::from_square(Square::F6) | Square::B2;

        let moves = bishop_attacks(Square::D4, blockers);

        lists_match(
            moves,
            &[
                Square::E5,
                Square::F6,
                Square::C5,
                Square::B6,
                Square::A7,
                Square::C3,
                Square::B2,
                Square::E3,
                Square::F2,
                Square::G1,
            ],
        );
    }

    #[test]
    fn test_first_blocker() {
        let occupancy = Bitboard::from_square(Square::D6) | Square::D7;

        assert_eq!(
            first_blocker(Square::D4, Direction::North, occupancy),
            Some(Square::D6)
        );
        assert_eq!(first_blocker(Square::D4, Direction::South, occupancy), None);
        assert_eq!(
            first_blocker(Square::D8, Direction::South, occupancy),
            Some(Square::D7)
        );
    }

    #[test]
    fn test_ray_between() {
        assert_eq!(
            ray_between(Square::A1, Square::A4),
            Bitboard::from_square(Square::A2) | Square::A3
        );
        assert_eq!(
            ray_between(Square::C3, Square::F6),
            Bitboard::from_square(Square::D4) | Square::E5
        );
        // Unaligned squares share no ray.
        assert!(ray_between(Square::A1, Square::B3).is_empty());
    }

    #[test]
    fn test_ray_containing() {
        assert_eq!(
            ray_containing(Square::A3, Square::A5),
            Bitboard::FILE_A
        );
        assert!(ray_containing(Square::A1, Square::H8).intersects(Square::D4));
        assert!(ray_containing(Square::A1, Square::B3).is_empty());
    }

    #[test]
    fn test_pawn_tables() {
        lists_match(
            pawn_pushes(Square::E2, Color::White),
            &[Square::E3, Square::E4],
        );
        lists_match(pawn_pushes(Square::E3, Color::White), &[Square::E4]);
        lists_match(
            pawn_attacks(Square::E4, Color::White),
            &[Square::D5, Square::F5],
        );
        lists_match(pawn_attacks(Square::A5, Color::Black), &[Square::B4]);
    }

    #[test]
    fn test_knight_attacks_on_rim() {
        lists_match(
            knight_attacks(Square::A1),
            &[Square::B3, Square::C2],
        );
    }
}
