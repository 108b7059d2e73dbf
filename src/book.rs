/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;

use crate::Move;

/// A candidate move returned by an opening book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookMove {
    /// The raw encoding of the recommended move (see [`Move::inner`]).
    pub mv: u16,

    /// How many recorded games continued with this move.
    ///
    /// The search only trusts the recommendation above a confidence
    /// threshold.
    pub samples: u32,
}

/// An opening book, consulted before any tree search.
///
/// Keyed by the ordered line of raw move encodings played so far. Building a
/// book from game databases is out of scope; this is the lookup seam.
pub trait OpeningBook: Send + Sync {
    /// The most popular continuation of `line`, if the book knows one.
    fn probe(&self, line: &[u16]) -> Option<BookMove>;
}

/// A book held entirely in memory, fed one game at a time.
#[derive(Debug, Default)]
pub struct InMemoryBook {
    /// Per line prefix, the continuations seen and their frequency.
    continuations: HashMap<Vec<u16>, HashMap<u16, u32>>,

    /// Longest prefix to index. Book knowledge beyond the opening is noise.
    max_plies: usize,
}

impl InMemoryBook {
    /// Default number of plies a line is followed for.
    pub const DEFAULT_MAX_PLIES: usize = 24;

    pub fn new() -> Self {
        Self {
            continuations: HashMap::new(),
            max_plies: Self::DEFAULT_MAX_PLIES,
        }
    }

    /// Records one game's moves, strengthening every prefix it passes
    /// through.
    pub fn add_game(&mut self, moves: &[Move]) {
        let encoded = moves.iter().map(|mv| mv.inner()).collect::<Vec<_>>();

        for i in 0..encoded.len().min(self.max_plies) {
            *self
                .continuations
                .entry(encoded[..i].to_vec())
                .or_default()
                .entry(encoded[i])
                .or_insert(0) += 1;
        }
    }
}

impl OpeningBook for InMemoryBook {
    fn probe(&self, line: &[u16]) -> Option<BookMove> {
        let seen = self.continuations.get(line)?;

        // Tie-break by encoding so probes are deterministic.
        let (&mv, &samples) = seen.iter().max_by_key(|&(&mv, &count)| (count, mv))?;

        Some(BookMove { mv, samples })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Game, Position};

    fn moves_of(texts: &[&str]) -> Vec<Move> {
        let mut game = Game::default();
        texts
            .iter()
            .map(|text| game.make_move_text(text).unwrap())
            .collect()
    }

    #[test]
    fn test_probe_follows_recorded_lines() {
        let mut book = InMemoryBook::new();

        let game1 = moves_of(&["e2e4", "e7e5", "g1f3"]);
        let game2 = moves_of(&["e2e4", "c7c5", "g1f3"]);

        for _ in 0..3 {
            book.add_game(&game1);
        }
        book.add_game(&game2);

        // From the empty line, e2e4 is known from all four games.
        let first = book.probe(&[]).unwrap();
        assert_eq!(first.mv, game1[0].inner());
        assert_eq!(first.samples, 4);

        // After 1. e4, the majority reply wins.
        let reply = book.probe(&[game1[0].inner()]).unwrap();
        assert_eq!(reply.mv, game1[1].inner());
        assert_eq!(reply.samples, 3);
    }

    #[test]
    fn test_probe_unknown_line_is_none() {
        let book = InMemoryBook::new();
        assert!(book.probe(&[]).is_none());

        let mut book = InMemoryBook::new();
        book.add_game(&moves_of(&["e2e4"]));

        let pos = Position::default();
        let unseen = Move::from_text(&pos, "d2d4").unwrap();
        assert!(book.probe(&[unseen.inner()]).is_none());
    }
}
