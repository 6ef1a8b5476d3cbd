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

//! Full chess games, including history and draw-by-repetition/50-move-rule
//! bookkeeping.

use nohash_hasher::IntMap;

use std::fmt::{Display, Formatter};

use super::{
    algebraic::algebraic_from_move,
    movegen::{has_legal_move, is_attacked, legal_moves},
    Board, Color, Eval, Evaluator, Position,
};
use crate::moves::FatMove;

#[derive(Clone, Debug, PartialEq, Eq)]
/// A game in progress: unlike a bare `Position`, a `Game` knows its move
/// history and can answer questions that require it, like repetition draws.
pub struct Game {
    /// The last element is the current position. The first is the starting
    /// position. `history.len() == moves.len() + 1` always.
    history: Vec<Position>,
    /// Every move made in the game, in order. All are legal.
    moves: Vec<FatMove>,
    /// How many times each position (keyed by its Zobrist hash) has been
    /// reached, for the threefold-repetition rule.
    repetitions: IntMap<u64, u64>,
}

impl Game {
    /// A new `Game` in the conventional starting position, unevaluated.
    #[must_use]
    pub fn new() -> Game {
        Game::from_position(Position::default())
    }

    /// Parse a `Game` from a FEN string, scoring the start position with
    /// `evaluator`. The 50-move clock is seeded from the FEN's own
    /// halfmove counter.
    pub fn from_fen(fen: &str, evaluator: Evaluator) -> Result<Game, String> {
        let pos = Position::from_fen(fen, evaluator)?;
        Ok(Game::from_position(pos))
    }

    fn from_position(pos: Position) -> Game {
        let mut repetitions = IntMap::default();
        repetitions.insert(pos.board.hash, 1);
        Game {
            history: vec![pos],
            moves: Vec::new(),
            repetitions,
        }
    }

    /// Truncate the history back to the starting position, discarding every
    /// move played since.
    pub fn clear(&mut self) {
        self.history.truncate(1);
        self.moves.clear();
        self.repetitions.clear();
        self.repetitions
            .entry(self.history[0].board.hash)
            .or_insert(1);
    }

    /// Play `fmove`, which must already be known-legal (e.g. from
    /// [`Game::get_moves`]). `delta` is the expected evaluation swing from
    /// the mover's perspective.
    ///
    /// # Panics
    /// In debug builds, if `fmove` turns out to be illegal.
    pub fn make_move(&mut self, fmove: FatMove, delta: Eval) {
        let mut new_pos = self.history.last().unwrap().clone();
        let (legal, _info) = new_pos.make_move(fmove, delta);
        debug_assert!(legal, "Game::make_move called with an illegal move");

        *self.repetitions.entry(new_pos.board.hash).or_insert(0) += 1;
        self.history.push(new_pos);
        self.moves.push(fmove);
    }

    /// Attempt to play `fmove`. If it is not a legal move in the current
    /// position, no state changes and an `Err` is returned.
    pub fn try_move(&mut self, fmove: FatMove, delta: Eval) -> Result<(), &'static str> {
        if legal_moves(self.board()).contains(&fmove) {
            self.make_move(fmove, delta);
            Ok(())
        } else {
            Err("illegal move given!")
        }
    }

    /// Undo the most recent move, returning it.
    pub fn undo(&mut self) -> Result<FatMove, &'static str> {
        let fmove = self.moves.pop().ok_or("no moves to remove")?;
        let pos_removed = self.history.pop().ok_or("no boards in history")?;

        let count = self.repetitions.entry(pos_removed.board.hash).or_insert(1);
        *count -= 1;
        if *count == 0 {
            self.repetitions.remove(&pos_removed.board.hash);
        }

        Ok(fmove)
    }

    /// Undo the last `nmoves` moves. If there are fewer than `nmoves`
    /// moves in the history, nothing is undone and an `Err` is returned.
    pub fn undo_n(&mut self, nmoves: usize) -> Result<(), &'static str> {
        if nmoves > self.moves.len() {
            return Err("attempted to remove more moves than are in history");
        }
        for _ in 0..nmoves {
            self.undo()?;
        }
        Ok(())
    }

    #[inline(always)]
    #[must_use]
    /// The board of the current position.
    pub fn board(&self) -> &Board {
        &self.position().board
    }

    #[inline(always)]
    #[must_use]
    /// The current position, including its cached king squares and eval.
    pub fn position(&self) -> &Position {
        self.history.last().unwrap()
    }

    #[must_use]
    /// Is the game over, and if so, who won? `None` for a draw.
    pub fn is_over(&self) -> (bool, Option<Color>) {
        if self.is_drawn_historically() {
            return (true, None);
        }
        let board = self.board();
        if has_legal_move(board) {
            return (false, None);
        }
        let king_sq = board.king_square(board.player);
        if is_attacked(board, king_sq, !board.player) {
            (true, Some(!board.player))
        } else {
            (true, None) // stalemate
        }
    }

    #[must_use]
    /// Has the game been drawn by the 50-move rule or threefold repetition?
    pub fn is_drawn_historically(&self) -> bool {
        let num_reps = *self.repetitions.get(&self.board().hash).unwrap_or(&0);
        if num_reps >= 3 {
            return true;
        }
        self.board().halfmove_clock >= 100
    }

    #[must_use]
    /// The legal moves in the current position. Empty if the game is drawn
    /// or otherwise over.
    pub fn get_moves(&self) -> Vec<FatMove> {
        if self.is_drawn_historically() {
            return Vec::new();
        }
        legal_moves(self.board())
    }

    #[allow(clippy::len_without_is_empty)]
    #[must_use]
    /// The number of positions (including the start) in this game's history.
    pub fn len(&self) -> usize {
        self.history.len()
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

impl Display for Game {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, fmove) in self.moves.iter().enumerate() {
            let board = &self.history[i].board;
            write!(f, "{} ", algebraic_from_move(fmove.mv(), board))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Board, Piece, Square};

    fn fmove_on(board: &Board, from: Square, to: Square) -> FatMove {
        let piece = board.type_at(from).expect("no piece on from-square");
        FatMove::new(crate::Move::normal(from, to), piece)
    }

    #[test]
    fn test_play_e4() {
        let mut g = Game::new();
        let m = FatMove::new(crate::Move::double_push(Square::E2, Square::E4), Piece::Pawn);
        g.make_move(m, Eval::DRAW);
        assert_eq!(g.board().type_at(Square::E4), Some(Piece::Pawn));
        assert_eq!(g.board().type_at(Square::E2), None);
    }

    #[test]
    fn test_undo_move() {
        let mut g = Game::new();
        let m = FatMove::new(crate::Move::double_push(Square::E2, Square::E4), Piece::Pawn);
        g.make_move(m, Eval::DRAW);
        assert_eq!(g.undo(), Ok(m));
        assert_eq!(*g.board(), Board::default());
    }

    #[test]
    fn test_illegal_undo() {
        let mut g = Game::new();
        assert!(g.undo().is_err());
        assert_eq!(*g.board(), Board::default());
    }

    #[test]
    fn test_undo_multiple_moves() {
        let mut g = Game::new();
        let m0 = FatMove::new(crate::Move::double_push(Square::E2, Square::E4), Piece::Pawn);
        let m1 = FatMove::new(crate::Move::double_push(Square::E7, Square::E5), Piece::Pawn);
        g.make_move(m0, Eval::DRAW);
        g.make_move(m1, Eval::DRAW);
        assert_eq!(g.undo_n(2), Ok(()));
        assert_eq!(*g.board(), Board::default());
    }

    #[test]
    fn test_undo_equality() {
        let mut g = Game::new();
        let m = FatMove::new(crate::Move::double_push(Square::E2, Square::E4), Piece::Pawn);
        g.make_move(m, Eval::DRAW);
        assert!(g.undo().is_ok());
        assert_eq!(g, Game::new());
    }

    #[test]
    fn test_undo_fried_liver() {
        let fen = "r1bq1b1r/ppp2kpp/2n5/3np3/2B5/8/PPPP1PPP/RNBQK2R w KQ - 0 7";
        let mut g = Game::from_fen(fen, Position::no_eval).unwrap();
        let m = fmove_on(g.board(), Square::D1, Square::F3);
        g.make_move(m, Eval::DRAW);
        assert_eq!(g.undo(), Ok(m));
        assert_eq!(g, Game::from_fen(fen, Position::no_eval).unwrap());
        assert_eq!(g.board(), &Board::from_fen(fen).unwrap());
    }

    #[test]
    fn test_is_mate_over() {
        // the position from the end of Scholar's mate
        let g = Game::from_fen(
            "rnbqk2r/pppp1Qpp/5n2/2b1p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4",
            Position::no_eval,
        )
        .unwrap();
        assert!(g.get_moves().is_empty());
        assert!(!has_legal_move(g.board()));
        assert_eq!(g.is_over(), (true, Some(Color::White)));
    }

    #[test]
    fn test_is_mate_over_2() {
        let g = Game::from_fen(
            "r1b2b1r/ppp2kpp/8/4p3/3n4/2Q5/PP1PqPPP/RNB1K2R w KQ - 4 11",
            Position::no_eval,
        )
        .unwrap();
        assert!(g.get_moves().is_empty());
        assert!(!has_legal_move(g.board()));
        assert_eq!(g.is_over(), (true, Some(Color::Black)));
    }

    #[test]
    fn test_mate_in_1() {
        // Rb6-b8# is the winning move
        let mut g =
            Game::from_fen("3k4/R7/1R6/5K2/8/8/8/8 w - - 0 1", Position::no_eval).unwrap();
        let m = fmove_on(g.board(), Square::B6, Square::B8);
        assert!(g.get_moves().contains(&m));
        g.make_move(m, Eval::DRAW);
        assert_eq!(g.is_over(), (true, Some(Color::White)));
    }

    #[test]
    fn test_clear_board() {
        let mut g = Game::new();
        let m = FatMove::new(crate::Move::double_push(Square::E2, Square::E4), Piece::Pawn);
        g.make_move(m, Eval::DRAW);
        g.clear();
        assert_eq!(g, Game::new());
    }

    #[test]
    fn test_king_escape_without_capture() {
        let g = Game::from_fen(
            "r2q1b1r/ppp3pp/2n1kn2/4p3/8/2N4Q/PPPP1PPP/R1B1K2R b KQ - 1 10",
            Position::no_eval,
        )
        .unwrap();
        let moves = g.get_moves();
        let expected_moves = [
            crate::Move::normal(Square::E6, Square::D6),
            crate::Move::normal(Square::E6, Square::F7),
            crate::Move::normal(Square::E6, Square::E7),
            crate::Move::normal(Square::F6, Square::G4),
        ];
        for fm in &moves {
            assert!(expected_moves.contains(&fm.mv()));
        }
        for em in &expected_moves {
            assert!(moves.iter().any(|fm| fm.mv() == *em));
        }
    }
}
