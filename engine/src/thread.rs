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

//! The search driver: iterative deepening over the single search thread.
//!
//! There is exactly one search thread and one I/O thread in this engine (see
//! the concurrency model): no Lazy-SMP fan-out, no split points. The I/O
//! thread only ever touches a `MainSearch` through `stop`, which is safe to
//! call while a search is in progress on the other thread.

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use corvid_base::Board;

use crate::uci::{EngineInfo, UciMessage};

use super::{config::SearchConfig, limit::SearchLimit, search::search, transposition::TTable};

pub use super::search::SearchResult;

/// The primary search driver for an engine.
///
/// `ttable` is owned directly, not shared behind an `Arc`: only the one
/// search thread this struct drives ever touches it (see the concurrency
/// model). `limit`, by contrast, is shared with the I/O thread so it can
/// call `stop` while a search is running.
pub struct MainSearch {
    /// The configuration of the search, controlling the search parameters.
    pub config: SearchConfig,
    /// The transposition table.
    pub ttable: TTable,
    /// The limit to the search.
    pub limit: Arc<SearchLimit>,
    /// Held for the duration of the depth-1 iteration of `evaluate`, so that
    /// `stop` cannot take effect until at least one full ply has been
    /// searched (see the concurrency model's depth-1 guarantee).
    depth_one_guard: Mutex<()>,
}

impl MainSearch {
    /// Construct a new main search.
    #[must_use]
    pub fn new() -> MainSearch {
        MainSearch {
            config: SearchConfig::new(),
            ttable: TTable::default(),
            limit: Arc::new(SearchLimit::new()),
            depth_one_guard: Mutex::new(()),
        }
    }

    /// Force any search in progress to stop as soon as possible.
    ///
    /// Blocks until the depth-1 iteration of `evaluate` (if one is
    /// currently running) has completed, so that a `stop` issued the
    /// instant a search starts can never prevent the depth-1 guarantee.
    pub fn stop(&self) {
        let _guard = self.depth_one_guard.lock().unwrap_or_else(|e| e.into_inner());
        self.limit.stop();
    }

    /// Evaluate a position with iterative deepening: search depth 1, then 2,
    /// and so on, until either `config.depth` is reached or `limit` marks
    /// itself over. The result of the deepest completed iteration is kept;
    /// an iteration that times out mid-search is discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if depth 1 itself fails (most likely because the
    /// limit was already over before the search could start); every deeper
    /// iteration's failure is silently absorbed by falling back to the
    /// previous iteration's result.
    pub fn evaluate(&mut self, board: &Board) -> SearchResult {
        let tic = Instant::now();
        self.limit.start()?;

        let mut working_board = *board;
        let mut best_result: SearchResult = {
            let _guard = self
                .depth_one_guard
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            search(
                &mut working_board,
                1,
                &mut self.ttable,
                &self.config,
                &self.limit,
            )
        };

        self.report(&best_result, tic);

        for depth in 2..=self.config.depth {
            if self.limit.is_over() {
                break;
            }
            let attempt = search(
                &mut working_board,
                depth,
                &mut self.ttable,
                &self.config,
                &self.limit,
            );
            match attempt {
                Ok(info) => {
                    self.report(&Ok(info.clone()), tic);
                    best_result = Ok(info);
                }
                Err(_) => break,
            }
        }

        // `search` already returns `eval` from the root side-to-move's
        // perspective (as does each `report` call above); no further
        // conversion is needed here.
        best_result
    }

    /// Emit a UCI `info` line describing the result of a completed
    /// iteration.
    fn report(&self, result: &SearchResult, tic: Instant) {
        let Ok(info) = result else { return };
        let elapsed = Instant::now() - tic;
        println!(
            "{}",
            UciMessage::Info(&[
                EngineInfo::Depth(info.depth),
                EngineInfo::Time(elapsed),
                EngineInfo::Nodes(info.num_nodes_evaluated),
                EngineInfo::NodeSpeed(
                    info.num_nodes_evaluated * 1000 / (elapsed.as_millis() as u64 + 1)
                ),
                EngineInfo::HashFull(self.ttable.fill_rate_permill()),
                EngineInfo::Pv(&info.pv),
                EngineInfo::Score {
                    eval: info.eval,
                    is_lower_bound: false,
                    is_upper_bound: false,
                },
            ])
        );
    }
}

impl Default for MainSearch {
    fn default() -> Self {
        MainSearch::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvid_base::Board;

    #[test]
    fn depth_one_always_completes() {
        let board = Board::new();
        let mut main = MainSearch::new();
        main.config.depth = 1;
        // Simulate a GUI that stops the instant it sends `go`.
        main.stop();
        let info = main.evaluate(&board).unwrap();
        assert_eq!(info.depth, 1);
        assert!(!info.pv.is_empty());
    }

    #[test]
    fn iterative_deepening_reaches_configured_depth() {
        let board = Board::new();
        let mut main = MainSearch::new();
        main.config.depth = 3;
        let info = main.evaluate(&board).unwrap();
        assert_eq!(info.depth, 3);
    }
}
