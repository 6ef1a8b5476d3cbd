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

//! The primary search algorithm: depth-limited negamax with alpha-beta
//! pruning, a quiescence tail, and a transposition table.
//!
//! Unlike a Lazy-SMP engine, there is exactly one search thread (see the
//! concurrency model), so this is a single, un-parallelised recursion: no
//! helper threads, no split points, no atomics beyond the ones `SearchLimit`
//! already exposes for the I/O thread to cancel it.

use corvid_base::{
    material,
    movegen::{get_all_moves, get_loud_moves, has_legal_move, is_attacked, MoveBuffer},
    Board, Eval, FatMove, Move,
};

use crate::{
    config::SearchConfig,
    limit::SearchLimit,
    pick::sort_moves,
    transposition::{NodeType, TTable},
};

use std::sync::PoisonError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// The types of errors which can occur during a search.
pub enum SearchError {
    /// This search failed due to timeout.
    Timeout,
    /// This search failed because a lock was poisoned.
    Poison,
    /// This search failed because a thread failed to join.
    Join,
}

impl<T> From<PoisonError<T>> for SearchError {
    #[inline(always)]
    fn from(_: PoisonError<T>) -> Self {
        SearchError::Poison
    }
}

/// The result of performing a search. The `Ok` version contains data on the
/// search, while the `Err` version contains a reason why the search failed.
pub type SearchResult = Result<SearchInfo, SearchError>;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Information about the search which will be returned at the end of a search.
pub struct SearchInfo {
    /// The principal variation, root move first.
    pub pv: Vec<Move>,
    /// The evaluation of the position, from the perspective of the player to
    /// move at the root.
    pub eval: Eval,
    /// The number of times a transposition table get was successful.
    pub num_transpositions: u64,
    /// The number of nodes evaluated in this search.
    pub num_nodes_evaluated: u64,
    /// The depth to which this search was conducted.
    pub depth: u8,
}

/// Search `board` (the side to move at `board.player` is the root player) to
/// `depth`, using `ttable` for transposition lookups/stores and `limit` to
/// decide when to give up. `board` is restored to its original state before
/// returning, win or timeout.
pub fn search(
    board: &mut Board,
    depth: u8,
    ttable: &mut TTable,
    config: &SearchConfig,
    limit: &SearchLimit,
) -> SearchResult {
    let mut searcher = Negamax {
        ttable,
        config,
        limit,
        num_nodes_evaluated: 0,
        nodes_since_limit_update: 0,
        num_transpositions: 0,
    };
    let mut pv = Vec::new();
    let eval = searcher.negamax(board, depth as i8, 0, Eval::MIN, Eval::MAX, &mut pv)?;

    Ok(SearchInfo {
        pv,
        eval,
        num_transpositions: searcher.num_transpositions,
        num_nodes_evaluated: searcher.num_nodes_evaluated,
        depth,
    })
}

/// Shared, per-search-call state for the negamax recursion.
struct Negamax<'a> {
    ttable: &'a mut TTable,
    config: &'a SearchConfig,
    limit: &'a SearchLimit,
    num_nodes_evaluated: u64,
    nodes_since_limit_update: u16,
    num_transpositions: u64,
}

impl<'a> Negamax<'a> {
    /// Step 7's child recursion, shared by both the normal and quiescence
    /// loops: make `fmove`, recurse with negated and swapped bounds, unmake,
    /// and return the negated, mate-distance-adjusted child score. Returns
    /// `None` if `fmove` turned out to be illegal (the mover's king is left
    /// in check).
    fn try_child<F>(
        &mut self,
        board: &mut Board,
        fmove: FatMove,
        mut recurse: F,
    ) -> Result<Option<Eval>, SearchError>
    where
        F: FnMut(&mut Self, &mut Board) -> Result<Eval, SearchError>,
    {
        let (legal, info) = board.make_move(fmove);
        if !legal {
            board.unmake_move(fmove, info);
            return Ok(None);
        }
        let result = recurse(self, board);
        board.unmake_move(fmove, info);
        Ok(Some((-result?).step_back()))
    }

    /// Depth-limited negamax with alpha-beta pruning (§4.7.1, normal search).
    fn negamax(
        &mut self,
        board: &mut Board,
        depth_to_go: i8,
        depth_so_far: u8,
        mut alpha: Eval,
        beta: Eval,
        parent_line: &mut Vec<Move>,
    ) -> Result<Eval, SearchError> {
        self.limit.update_time()?;
        if self.limit.is_over() {
            return Err(SearchError::Timeout);
        }

        if depth_to_go <= 0 {
            return self.quiesce(board, depth_so_far, alpha, beta, parent_line);
        }

        self.increment_nodes()?;

        if board.halfmove_clock >= 100 {
            parent_line.clear();
            return Ok(Eval::DRAW);
        }

        let hash = board.hash;
        let mut hash_move = None;
        if let Some(entry) = self.ttable.get(hash) {
            self.num_transpositions += 1;
            hash_move = entry.best_move();
            if i8::try_from(entry.depth_remaining()).unwrap_or(i8::MAX) >= depth_to_go {
                match entry.node_type() {
                    NodeType::Pv => {
                        parent_line.clear();
                        if let Some(m) = entry.best_move() {
                            parent_line.push(m);
                        }
                        return Ok(entry.score());
                    }
                    NodeType::Cut if entry.score() >= beta => return Ok(entry.score()),
                    NodeType::All if entry.score() <= alpha => return Ok(entry.score()),
                    _ => {}
                }
            }
        }

        let mut buf = MoveBuffer::new();
        get_all_moves(board, &mut buf, false);
        let mut moves: Vec<_> = buf.iter().copied().collect();
        sort_moves(board, &mut moves, hash_move);

        let mut best_move = None;
        let mut best_score = Eval::MIN;
        let mut move_count = 0u32;
        let mut line = Vec::new();

        for fmove in moves {
            line.clear();
            let child = self.try_child(board, fmove, |this, b| {
                this.negamax(b, depth_to_go - 1, depth_so_far + 1, -beta, -alpha, &mut line)
            })?;
            let Some(score) = child else { continue };
            move_count += 1;

            if score > best_score {
                best_score = score;
                best_move = Some(fmove.mv());

                if score > alpha {
                    parent_line.clear();
                    parent_line.push(fmove.mv());
                    parent_line.extend(line.iter().copied());
                    alpha = score;
                }
                if score >= beta {
                    break;
                }
            }
        }

        if move_count == 0 {
            best_score = if is_attacked(board, board.king_square(board.player), !board.player) {
                -Eval::mate_in(0)
            } else {
                Eval::DRAW
            };
            parent_line.clear();
        }

        if !self.limit.is_over() && depth_so_far <= self.config.max_transposition_depth {
            let node_type = if move_count == 0 {
                NodeType::Pv
            } else if best_score >= beta {
                NodeType::Cut
            } else if best_score <= alpha && best_move.is_some() {
                NodeType::All
            } else {
                NodeType::Pv
            };
            self.ttable
                .store(hash, best_score, depth_to_go as u8, node_type, best_move);
        }

        Ok(best_score)
    }

    /// Quiescence search (§4.7.1 step 3 and the "quiescence only" branches):
    /// a depth-unlimited tail considering only loud moves, seeded with a
    /// stand-pat score unless the side to move is in check.
    fn quiesce(
        &mut self,
        board: &mut Board,
        depth_so_far: u8,
        mut alpha: Eval,
        beta: Eval,
        parent_line: &mut Vec<Move>,
    ) -> Result<Eval, SearchError> {
        self.limit.update_time()?;
        if self.limit.is_over() {
            return Err(SearchError::Timeout);
        }
        self.increment_nodes()?;

        let player = board.player;
        let in_check = is_attacked(board, board.king_square(player), !player);

        if in_check {
            // Captures-only move generation would miss non-capturing flight
            // squares, so treat this ply like one level of normal search to
            // let the mover escape check by any legal move.
            let mut buf = MoveBuffer::new();
            get_all_moves(board, &mut buf, false);
            let mut moves: Vec<_> = buf.iter().copied().collect();
            sort_moves(board, &mut moves, None);

            let mut move_count = 0u32;
            let mut line = Vec::new();
            for fmove in moves {
                line.clear();
                let child = self.try_child(board, fmove, |this, b| {
                    this.quiesce(b, depth_so_far + 1, -beta, -alpha, &mut line)
                })?;
                let Some(score) = child else { continue };
                move_count += 1;
                if score > alpha {
                    alpha = score;
                    parent_line.clear();
                    parent_line.push(fmove.mv());
                    parent_line.extend(line.iter().copied());
                    if alpha >= beta {
                        return Ok(alpha);
                    }
                }
            }
            if move_count == 0 {
                parent_line.clear();
                return Ok(-Eval::mate_in(0));
            }
            return Ok(alpha);
        }

        let stand_pat = material(board).in_perspective(player);
        if stand_pat > alpha {
            alpha = stand_pat;
            parent_line.clear();
            if alpha >= beta {
                return Ok(alpha);
            }
        }

        let mut buf = MoveBuffer::new();
        get_loud_moves(board, &mut buf);
        let mut moves: Vec<_> = buf.iter().copied().collect();
        sort_moves(board, &mut moves, None);

        if moves.is_empty() {
            // No captures to consider: if some legal quiet move exists, the
            // position is merely quiet, so the stand-pat/eval leaf stands.
            // Otherwise fall through to mate/stalemate detection.
            if !has_legal_move(board) {
                parent_line.clear();
                return Ok(Eval::DRAW);
            }
            return Ok(alpha);
        }

        let mut line = Vec::new();
        for fmove in moves {
            line.clear();
            let child = self.try_child(board, fmove, |this, b| {
                this.quiesce(b, depth_so_far + 1, -beta, -alpha, &mut line)
            })?;
            let Some(score) = child else { continue };
            if score > alpha {
                alpha = score;
                parent_line.clear();
                parent_line.push(fmove.mv());
                parent_line.extend(line.iter().copied());
                if alpha >= beta {
                    break;
                }
            }
        }

        Ok(alpha)
    }

    #[inline(always)]
    /// Increment the number of nodes searched, copying over the value into
    /// the search limit if it is too high.
    fn increment_nodes(&mut self) -> Result<(), SearchError> {
        self.num_nodes_evaluated += 1;
        self.nodes_since_limit_update += 1;
        if self.nodes_since_limit_update as u64 > self.config.limit_update_increment {
            self.limit.add_nodes(self.nodes_since_limit_update as u64)?;
            self.nodes_since_limit_update = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvid_base::{Board, Square};

    fn search_helper(fen: &str, depth: u8) -> SearchInfo {
        let mut board = Board::from_fen(fen).unwrap();
        let config = SearchConfig {
            depth,
            ..Default::default()
        };
        let mut ttable = TTable::with_capacity(16);
        let limit = SearchLimit::new();
        limit.start().unwrap();
        search(&mut board, depth, &mut ttable, &config, &limit).unwrap()
    }

    #[test]
    fn eval_start() {
        let info = search_helper(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            4,
        );
        assert!(!info.pv.is_empty());
    }

    #[test]
    /// White has mate in one with Rb6-b8#.
    fn mate_in_1() {
        let info = search_helper("3k4/R7/1R6/5K2/8/8/8/8 w - - 0 1", 2);
        assert_eq!(info.pv[0], Move::normal(Square::B6, Square::B8));
        assert!(info.eval.is_mate());
    }

    #[test]
    /// A single-depth negamax from the lone-rook mate position finds the
    /// mating move (the perft/mate suite's example 5).
    fn single_ply_checkmate_is_found() {
        let info = search_helper("8/8/8/8/8/8/R7/4K2k w - - 0 1", 1);
        assert_eq!(info.pv[0], Move::normal(Square::A2, Square::H2));
        assert!(info.eval.is_mate());
    }

    #[test]
    fn fried_liver_finds_queen_check() {
        let info = search_helper(
            "r1bq1b1r/ppp2kpp/2n5/3np3/2B5/8/PPPP1PPP/RNBQK2R w KQ - 0 7",
            6,
        );
        assert_eq!(info.pv[0], Move::normal(Square::D1, Square::F3));
    }

    #[test]
    fn quiescence_avoids_hanging_piece_blunder() {
        // White to move, a pawn hangs on e5 to a knight but the knight is
        // itself defended; a depth-0 static eval would miss the recapture.
        let info = search_helper("4k3/8/8/4p3/8/3N4/8/4K3 w - - 0 1", 1);
        assert!(info.eval >= Eval::DRAW);
    }
}
