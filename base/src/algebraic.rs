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

//! Conversion functions between moves and their long-algebraic or
//! short-algebraic (SAN) notation.

use super::{
    movegen::{has_legal_move, is_attacked, legal_moves},
    Board, Move, Piece,
};
use crate::moves::FatMove;

/// Given a legal `Move` and the `Board` it was played on, construct its
/// short-algebraic (SAN) notation.
/// # Panics
/// if `m` is not a legal move in `board`.
pub fn algebraic_from_move(m: Move, board: &Board) -> String {
    // longest possible algebraic string is something like Qe4xd4# (7 chars)
    let mut s = String::with_capacity(7);

    let piece = if m.is_castle() {
        // per `gen_castling`'s convention: king's code kingside, queen's
        // code queenside.
        if m.to_square().file() > m.from_square().file() {
            Piece::King
        } else {
            Piece::Queen
        }
    } else {
        board.type_at(m.from_square()).unwrap()
    };

    if m.is_castle() {
        if m.to_square().file() > m.from_square().file() {
            s += "O-O";
        } else {
            s += "O-O-O";
        }
    } else {
        let mover_type = piece;
        let is_move_capture = m.is_capture();
        let other_moves = legal_moves(board).into_iter().map(FatMove::mv);
        let from_sq = m.from_square();

        let mut is_unclear = false;
        let mut is_unclear_rank = false;
        let mut is_unclear_file = false;

        if mover_type != Piece::Pawn {
            s += mover_type.code();
        } else if is_move_capture {
            is_unclear = true;
            is_unclear_file = true;
        }

        for other_move in other_moves {
            if other_move != m
                && other_move.to_square() == m.to_square()
                && other_move.from_square() != m.from_square()
                && board.type_at(other_move.from_square()) == Some(mover_type)
            {
                is_unclear = true;
                if other_move.from_square().rank() == from_sq.rank() {
                    is_unclear_file = true;
                }
                if other_move.from_square().file() == from_sq.file() {
                    is_unclear_rank = true;
                }
            }
        }

        if is_unclear {
            if !is_unclear_rank {
                // mover's file alone disambiguates
                s += from_sq.file_name();
            } else if !is_unclear_file {
                // mover's rank alone disambiguates
                s = format!("{}{}", s, from_sq.rank() + 1);
            } else {
                s += &from_sq.to_string();
            }
        }

        if is_move_capture {
            s += "x";
        }

        s += &m.to_square().to_string();

        if let Some(p) = m.promoted_piece() {
            s += "=";
            s += p.code();
        }
    }

    // Determine if the move delivers check or mate.
    let mut after = *board;
    let (legal, _info) = after.make_move(FatMove::new(m, piece));
    assert!(legal, "algebraic_from_move called on an illegal move");
    let player_color = board.player;
    let enemy_king_sq = after.king_square(!player_color);
    if is_attacked(&after, enemy_king_sq, player_color) {
        if has_legal_move(&after) {
            s += "+";
        } else {
            s += "#";
        }
    }

    s
}

/// Given a string in short-algebraic notation, find the legal `Move` on
/// `board` it names.
pub fn move_from_algebraic(s: &str, board: &Board) -> Result<Move, &'static str> {
    legal_moves(board)
        .into_iter()
        .map(FatMove::mv)
        .find(|m| algebraic_from_move(*m, board) == s)
        .ok_or("not a legal algebraic move")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Board, Square};

    #[test]
    fn test_e4_to_algebraic() {
        let board = Board::new();
        let m = Move::normal(Square::E2, Square::E4);
        assert_eq!("e4", algebraic_from_move(m, &board));
    }

    #[test]
    fn test_mate() {
        // Rb6-b8 is the winning move
        let board = Board::from_fen("3k4/R7/1R6/5K2/8/8/8/8 w - - 0 1").unwrap();
        let m = Move::normal(Square::B6, Square::B8);
        assert_eq!("Rb8#", algebraic_from_move(m, &board));
    }

    #[test]
    fn test_algebraic_from_pawn_capture() {
        let board =
            Board::from_fen("rnbqkbnr/ppppp1pp/8/5p2/4P3/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 2")
                .unwrap();
        let m = Move::capture(Square::E4, Square::F5);
        assert_eq!(algebraic_from_move(m, &board), "exf5");
    }

    #[test]
    fn test_move_from_e4() {
        let board = Board::new();
        let m = Move::normal(Square::E2, Square::E4);
        assert_eq!(move_from_algebraic("e4", &board), Ok(m));
    }

    #[test]
    fn test_move_from_pawn_capture() {
        let board =
            Board::from_fen("rnbqkbnr/ppppp1pp/8/5p2/4P3/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 2")
                .unwrap();
        let m = Move::capture(Square::E4, Square::F5);
        assert_eq!(move_from_algebraic("exf5", &board), Ok(m));
    }

    #[test]
    fn test_promotion() {
        let board = Board::from_fen("8/5P2/2k5/4K3/8/8/8/8 w - - 0 1").unwrap();
        let m = Move::promoting(Square::F7, Square::F8, Piece::Queen, false);
        assert_eq!(algebraic_from_move(m, &board), "f8=Q");
    }

    #[test]
    fn test_bad_algebraic() {
        let board = Board::new();
        assert!(move_from_algebraic("garbage", &board).is_err());
    }

    #[test]
    fn test_rank_identifier() {
        let board =
            Board::from_fen("rnbqkbnr/pppppppp/8/8/3P4/1N6/PPP1PPPP/RNBQKB1R w KQkq - 1 5")
                .unwrap();
        let m = Move::normal(Square::B3, Square::D2);
        let s = "N3d2";
        assert_eq!(algebraic_from_move(m, &board), s);
        assert_eq!(move_from_algebraic(s, &board).unwrap(), m);
    }
}
