/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::mem::size_of;

use crate::{Move, Score, SearchBounds, ZobristKey};

/// Number of bytes in a megabyte.
const BYTES_IN_MB: usize = 1024 * 1024;

/// Type of node encountered during search.
///
/// See [CPW](https://www.chessprogramming.org/Node_Types) for more.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum NodeType {
    /// The score is exact.
    Pv,

    /// The score is at most alpha (an upper bound).
    All,

    /// The score is at least beta (a lower bound).
    Cut,
}

impl NodeType {
    /// Classifies `score` against the original window it was searched with.
    #[inline(always)]
    pub fn new(score: Score, bounds: SearchBounds) -> Self {
        if score <= bounds.alpha {
            Self::All
        } else if score >= bounds.beta {
            Self::Cut
        } else {
            Self::Pv
        }
    }
}

/// A cached search result for one position.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct TTableEntry {
    /// Full key of the position this entry was stored for.
    ///
    /// The table is far smaller than the key space, so indices collide;
    /// probes compare this key before trusting anything else in the entry.
    pub key: ZobristKey,

    /// Best move found at this position.
    pub bestmove: Move,

    /// Score found for this position, with mate scores stored relative to
    /// the root.
    pub score: Score,

    /// Depth the entry was searched to.
    pub depth: u8,

    /// How the score relates to the search window it came from.
    pub node_type: NodeType,

    /// Game ply at which this entry was stored, for age-based eviction.
    pub age: u16,
}

impl TTableEntry {
    /// Creates a new entry, classifying the node type and re-normalizing a
    /// mate score to be root-relative.
    #[inline(always)]
    pub fn new(
        key: ZobristKey,
        bestmove: Move,
        score: Score,
        bounds: SearchBounds,
        depth: u8,
        ply: i32,
        age: u16,
    ) -> Self {
        let node_type = NodeType::new(score, bounds);
        let score = score.absolute(ply);

        Self {
            key,
            bestmove,
            score,
            depth,
            node_type,
            age,
        }
    }

    /// Returns this entry's score if it may be used at `ply` against the
    /// window `bounds`, re-relativizing mate scores.
    ///
    /// An exact score is always usable; a bound is usable only when it
    /// already causes a cutoff against the current window:
    /// an upper bound at or below alpha, or a lower bound at or above beta.
    #[inline(always)]
    pub fn try_score(&self, bounds: SearchBounds, ply: i32) -> Option<Score> {
        let score = self.score.relative(ply);

        let usable = match self.node_type {
            NodeType::Pv => true,
            NodeType::All => score <= bounds.alpha,
            NodeType::Cut => score >= bounds.beta,
        };

        usable.then_some(score)
    }
}

/// A fixed-size transposition table.
///
/// Maps position keys to cached search results, shared by every search of one
/// engine instance. Entries survive across searches until overwritten.
#[derive(Debug)]
pub struct TTable {
    /// The entry slots. Capacity is always a power of two so the key maps to
    /// an index with a mask.
    cache: Vec<Option<TTableEntry>>,
}

impl TTable {
    /// Default size of the table, in megabytes.
    pub const DEFAULT_SIZE_MB: usize = 16;

    /// Creates a table occupying roughly `size` megabytes.
    #[inline(always)]
    pub fn new(size: usize) -> Self {
        Self::from_capacity((size * BYTES_IN_MB) / size_of::<Option<TTableEntry>>())
    }

    /// Creates a table holding at least `capacity` entries, rounded down to
    /// a power of two.
    pub fn from_capacity(capacity: usize) -> Self {
        let capacity = capacity.next_power_of_two() / 2;
        Self {
            cache: vec![None; capacity.max(2)],
        }
    }

    /// Removes all entries.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.cache.iter_mut().for_each(|entry| *entry = None);
    }

    /// Number of slots in the table.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.cache.len()
    }

    /// Number of occupied slots.
    #[inline(always)]
    pub fn num_entries(&self) -> usize {
        self.cache.iter().filter(|entry| entry.is_some()).count()
    }

    /// Maps a key to a slot index.
    #[inline(always)]
    fn index(&self, key: &ZobristKey) -> usize {
        key.inner() as usize & (self.capacity() - 1)
    }

    /// Fetches the entry for `key`, if one is stored *for that exact key*.
    ///
    /// An entry stored for a colliding key is never returned.
    #[inline(always)]
    pub fn get(&self, key: &ZobristKey) -> Option<&TTableEntry> {
        self.cache[self.index(key)]
            .as_ref()
            .filter(|entry| &entry.key == key)
    }

    /// Stores `entry`, respecting the replacement policy.
    ///
    /// An occupied slot is overwritten only when the incoming entry was
    /// searched at least as deep as the stored one, or the stored one is
    /// older than the incoming entry's game ply. A colliding key alone never
    /// forces a replacement.
    #[inline(always)]
    pub fn store(&mut self, entry: TTableEntry) {
        let index = self.index(&entry.key);

        let replace = match &self.cache[index] {
            Some(existing) => entry.depth >= existing.depth || existing.age < entry.age,
            None => true,
        };

        if replace {
            self.cache[index] = Some(entry);
        }
    }
}

impl Default for TTable {
    #[inline(always)]
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE_MB)
    }
}
