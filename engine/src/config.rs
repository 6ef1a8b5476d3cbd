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

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Configuration options for a search. There is exactly one search thread
/// (see the concurrency model), so unlike a Lazy-SMP engine there is no
/// per-helper tuning here.
pub struct SearchConfig {
    /// The maximum depth the iterative deepening driver will reach before
    /// stopping on its own.
    pub depth: u8,
    /// The maximum ply distance from the root at which the search will add
    /// or edit transposition table entries; nodes deeper than this are
    /// revisited too rarely to be worth a slot.
    pub max_transposition_depth: u8,
    /// The number of nodes which have to be searched before it is worthwhile
    /// to update the search limit with this information.
    pub limit_update_increment: u64,
}

impl SearchConfig {
    #[must_use]
    pub fn new() -> SearchConfig {
        SearchConfig {
            depth: 10,
            max_transposition_depth: 7,
            limit_update_increment: 100,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> SearchConfig {
        SearchConfig::new()
    }
}
