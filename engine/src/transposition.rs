/*
  Corvid, a UCI-compatible chess engine.
  Copyright (C) 2022 The Corvid Authors (see AUTHORS.md file)

  Corvid is free software: you can redistribute it and/or modify
  it under the terms of the GNU General Public License as published by
  the Free Software Foundation, either version 3 of the License, or
  (at your option) any later version.

  Corvid is distributed in the hope that it will be useful,
  but WITHOUT ANY WARRANTY; without even the implied warranty of
  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
  GNU General Public License for more details.

  You should have received a copy of the GNU General Public License
  along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/

//! The transposition table: a cache of previously searched positions, keyed
//! by their Zobrist hash.
//!
//! The table is owned by the search driver and is only ever touched by the
//! one search thread that drives the iterative-deepening loop (see the
//! concurrency model), so no locking is needed around probes or inserts.

use corvid_base::{Eval, Move};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// What kind of bound a stored score represents.
pub enum NodeType {
    /// The score is an exact principal-variation value.
    Pv,
    /// The score is a lower bound: a beta cutoff occurred (fail-high).
    Cut,
    /// The score is an upper bound: every move was searched and none beat
    /// alpha (fail-low).
    All,
    /// The slot is empty.
    Na,
}

#[derive(Clone, Copy, Debug)]
/// One transposition table slot. `depth_remaining_plus1 == 0` means empty;
/// this lets a freshly zeroed table act as all-empty without a separate
/// validity flag.
pub struct TTEntry {
    hash: u64,
    score: Eval,
    depth_remaining_plus1: u8,
    node_type: NodeType,
    best_move: Option<Move>,
}

impl TTEntry {
    const EMPTY: TTEntry = TTEntry {
        hash: 0,
        score: Eval::DRAW,
        depth_remaining_plus1: 0,
        node_type: NodeType::Na,
        best_move: None,
    };

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.depth_remaining_plus1 == 0
    }

    #[must_use]
    pub const fn hash(&self) -> u64 {
        self.hash
    }

    #[must_use]
    pub const fn score(&self) -> Eval {
        self.score
    }

    #[must_use]
    pub const fn depth_remaining(&self) -> u8 {
        self.depth_remaining_plus1 - 1
    }

    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        self.node_type
    }

    #[must_use]
    pub const fn best_move(&self) -> Option<Move> {
        self.best_move
    }
}

#[derive(Clone, Debug)]
/// A hash-addressed table of previously searched positions. A slot is
/// addressed by `hash mod capacity`; collisions simply overwrite, favoring
/// the newest information about a hash bucket (always-replace).
pub struct TTable {
    slots: Vec<TTEntry>,
}

/// `2^21` slots by default: large enough to matter, small enough to build
/// instantly without configuration.
const DEFAULT_BIT_SIZE: u8 = 21;

impl TTable {
    #[must_use]
    pub fn new() -> TTable {
        TTable::with_capacity(DEFAULT_BIT_SIZE)
    }

    /// Construct a table with `2^bit_size` slots.
    #[must_use]
    pub fn with_capacity(bit_size: u8) -> TTable {
        TTable {
            slots: vec![TTEntry::EMPTY; 1usize << bit_size],
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline(always)]
    fn index(&self, hash: u64) -> usize {
        (hash as usize) % self.slots.len()
    }

    /// Look up `hash`. Returns `None` on a miss (an empty slot or a
    /// different hash occupying the slot).
    #[must_use]
    pub fn get(&self, hash: u64) -> Option<&TTEntry> {
        let entry = &self.slots[self.index(hash)];
        if entry.is_empty() || entry.hash != hash {
            None
        } else {
            Some(entry)
        }
    }

    /// Store a result for `hash`, replacing whatever already occupies its
    /// slot, unless that slot holds a *different* hash at a depth at least
    /// as deep as `depth_remaining` -- a shallower result must never evict a
    /// deeper one (search step 9).
    pub fn store(
        &mut self,
        hash: u64,
        score: Eval,
        depth_remaining: u8,
        node_type: NodeType,
        best_move: Option<Move>,
    ) {
        let idx = self.index(hash);
        let occupant = &self.slots[idx];
        if !occupant.is_empty()
            && occupant.hash != hash
            && occupant.depth_remaining_plus1 > depth_remaining + 1
        {
            return;
        }
        self.slots[idx] = TTEntry {
            hash,
            score,
            depth_remaining_plus1: depth_remaining + 1,
            node_type,
            best_move,
        };
    }

    /// Discard every stored entry.
    pub fn clear(&mut self) {
        self.slots.fill(TTEntry::EMPTY);
    }

    /// Fraction of slots occupied, out of 1000, per the UCI `hashfull`
    /// report. Samples the first 1000 slots as an estimate on large tables.
    #[must_use]
    pub fn fill_rate_permill(&self) -> u16 {
        let sample_size = self.slots.len().min(1000);
        let filled = self.slots[..sample_size].iter().filter(|e| !e.is_empty()).count();
        ((filled * 1000) / sample_size.max(1)) as u16
    }
}

impl Default for TTable {
    fn default() -> Self {
        TTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvid_base::Square;

    #[test]
    fn fresh_table_misses_everything() {
        let t = TTable::with_capacity(4);
        assert!(t.get(12345).is_none());
    }

    #[test]
    fn store_then_get_round_trips() {
        let mut t = TTable::with_capacity(4);
        let m = Move::normal(Square::E2, Square::E4);
        t.store(7, Eval::pawns(1.0), 3, NodeType::Pv, Some(m));
        let entry = t.get(7).unwrap();
        assert_eq!(entry.score(), Eval::pawns(1.0));
        assert_eq!(entry.depth_remaining(), 3);
        assert_eq!(entry.best_move(), Some(m));
        assert_eq!(entry.node_type(), NodeType::Pv);
    }

    #[test]
    fn hash_collision_on_same_slot_overwrites() {
        let mut t = TTable::with_capacity(1); // 2 slots
        t.store(0, Eval::DRAW, 1, NodeType::Pv, None);
        // hash 2 maps to the same slot as hash 0 with only 2 slots.
        t.store(2, Eval::pawns(1.0), 1, NodeType::Pv, None);
        assert!(t.get(0).is_none());
        assert_eq!(t.get(2).unwrap().score(), Eval::pawns(1.0));
    }

    #[test]
    fn clear_empties_every_slot() {
        let mut t = TTable::with_capacity(2);
        t.store(1, Eval::DRAW, 2, NodeType::Cut, Some(Move::normal(Square::A2, Square::A3)));
        t.clear();
        assert!(t.get(1).is_none());
    }
}
