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

//! `Position`: a `Board` plus the king-square cache and incrementally
//! maintained evaluation a search node needs on every node, without paying
//! for a fresh material scan at each ply.

use super::{board::IrreversibleInfo, Board, Color, Eval, Square};
use crate::moves::FatMove;

/// A function that scores a `Board` from White's perspective.
pub type Evaluator = fn(&Board) -> Eval;

#[derive(Clone, Debug, PartialEq, Eq)]
/// A complete position: the `Board`, plus each side's king square (to avoid
/// repeatedly scanning for it) and an incrementally maintained evaluation.
pub struct Position {
    pub board: Board,
    king_sqs: [Square; Color::NUM],
    pub eval: Eval,
}

impl Position {
    /// The evaluation delta of a move that does not change the material or
    /// positional score at all.
    pub const NO_DELTA: Eval = Eval::DRAW;

    /// Parse a `Position` from a FEN string, scoring it with `evaluator`.
    pub fn from_fen(fen: &str, evaluator: Evaluator) -> Result<Position, String> {
        let board = Board::from_fen(fen)?;
        Ok(Position::from_board(board, evaluator))
    }

    fn from_board(board: Board, evaluator: Evaluator) -> Position {
        let mut king_sqs = [Square::A1; Color::NUM];
        king_sqs[Color::White as usize] = board.king_square(Color::White);
        king_sqs[Color::Black as usize] = board.king_square(Color::Black);
        let eval = evaluator(&board);
        Position {
            board,
            king_sqs,
            eval,
        }
    }

    /// The cached square of the king of `color`.
    #[inline(always)]
    pub fn king_sq(&self, color: Color) -> Square {
        self.king_sqs[color as usize]
    }

    /// An evaluator that never looks at the board: always a draw. Useful
    /// when a `Position` is only needed for its move-generation behavior.
    pub const fn no_eval(_: &Board) -> Eval {
        Eval::DRAW
    }

    /// Tentatively apply `fmove`, adjusting the cached evaluation by `delta`
    /// and refreshing the mover's king-square cache. Returns whether the
    /// result is legal, and the undo information `unmake_move` needs.
    /// Illegal moves still mutate the position and MUST be undone.
    pub fn make_move(&mut self, fmove: FatMove, delta: Eval) -> (bool, IrreversibleInfo) {
        let mover = self.board.player;
        let (legal, info) = self.board.make_move(fmove);
        self.king_sqs[mover as usize] = self.board.king_square(mover);
        self.eval += delta;
        (legal, info)
    }

    /// Undo `fmove`, which must be the most recently applied move.
    pub fn unmake_move(&mut self, fmove: FatMove, info: IrreversibleInfo, delta: Eval) {
        self.board.unmake_move(fmove, info);
        let mover = self.board.player;
        self.king_sqs[mover as usize] = self.board.king_square(mover);
        self.eval -= delta;
    }

    /// Apply `fmove` if it is legal, undoing it automatically if not.
    ///
    /// # Errors
    ///
    /// Returns an error if the move would leave the mover's king in check,
    /// or leaves a castle's king path attacked.
    pub fn try_move(&mut self, fmove: FatMove, delta: Eval) -> Result<(), &'static str> {
        let (legal, info) = self.make_move(fmove, delta);
        if legal {
            Ok(())
        } else {
            self.unmake_move(fmove, info, delta);
            Err("illegal move: mover's king would be left in or moved into check")
        }
    }
}

impl Default for Position {
    fn default() -> Position {
        Position::from_board(Board::new(), Position::no_eval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{eval, Move, Piece};

    #[test]
    fn default_position_has_correct_king_squares() {
        let pos = Position::default();
        assert_eq!(pos.king_sq(Color::White), Square::E1);
        assert_eq!(pos.king_sq(Color::Black), Square::E8);
        assert_eq!(pos.eval, Eval::DRAW);
    }

    #[test]
    fn king_move_updates_cached_square() {
        let mut pos = Position::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1", eval::material).unwrap();
        let fmove = FatMove::new(Move::normal(Square::E1, Square::E2), Piece::King);
        let (legal, _info) = pos.make_move(fmove, Position::NO_DELTA);
        assert!(legal);
        assert_eq!(pos.king_sq(Color::White), Square::E2);
    }

    #[test]
    fn try_move_undoes_illegal_moves() {
        // White king on e1, black rook on e8 pins nothing, but moving the
        // king to e-anything stays in the rook's file and is illegal.
        let mut pos = Position::from_fen("4r3/8/8/8/8/8/8/4K3 w - - 0 1", eval::material).unwrap();
        let before = pos.clone();
        let fmove = FatMove::new(Move::normal(Square::E1, Square::D1), Piece::King);
        assert!(pos.try_move(fmove, Position::NO_DELTA).is_ok());
        pos = before.clone();
        let into_check = FatMove::new(Move::normal(Square::E1, Square::E2), Piece::King);
        assert!(pos.try_move(into_check, Position::NO_DELTA).is_err());
        assert_eq!(pos, before);
    }
}
