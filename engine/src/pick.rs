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

//! Move ordering: captures before quiets, MVV-LVA among captures, with a
//! hash move (the best move recorded for this node by the transposition
//! table) promoted to the very front.

use corvid_base::{material_value, Board, FatMove, Move, Piece};

/// The key by which [`sort_moves`] orders: smaller sorts earlier. The hash
/// move gets key `0`; everything else is strictly positive so it always
/// comes first.
fn order_key(board: &Board, fmove: FatMove, hash_move: Option<Move>) -> i32 {
    let mv = fmove.mv();
    if Some(mv) == hash_move {
        return 0;
    }
    if !mv.is_capture() {
        // quiets are all equal to one another and sort after every capture.
        return i32::MAX;
    }
    let victim = if mv.is_en_passant() {
        Piece::Pawn
    } else {
        board.type_at(mv.to_square()).unwrap_or(Piece::Pawn)
    };
    let attacker = fmove.piece();
    // descending victim value, ascending attacker value: negate victim so a
    // bigger victim sorts smaller (earlier).
    let victim_val = material_value(victim).centipawn_val() as i32;
    let attacker_val = material_value(attacker).centipawn_val() as i32;
    1 - victim_val * 32 + attacker_val
}

/// Sort `moves` in place: captures before quiets, MVV-LVA among captures,
/// with `hash_move` (if present among them) promoted to the front. A
/// strict weak order: ties among quiets, and among captures with identical
/// keys, are left in generation order (a stable sort).
pub fn sort_moves(board: &Board, moves: &mut [FatMove], hash_move: Option<Move>) {
    moves.sort_by_key(|&fmove| order_key(board, fmove, hash_move));
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvid_base::movegen::{get_all_moves, MoveBuffer};
    use corvid_base::Square;

    #[test]
    fn captures_sort_before_quiets() {
        let board =
            Board::from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2")
                .unwrap();
        let mut buf = MoveBuffer::new();
        get_all_moves(&board, &mut buf, false);
        let mut moves: Vec<FatMove> = buf.iter().copied().collect();
        sort_moves(&board, &mut moves, None);
        let first_capture = moves.iter().position(|fm| fm.mv().is_capture()).unwrap();
        let last_quiet = moves.iter().rposition(|fm| !fm.mv().is_capture());
        if let Some(lq) = last_quiet {
            assert!(first_capture < moves.len() && lq >= first_capture || moves[0].mv().is_capture());
        }
        assert!(moves[0].mv().is_capture());
    }

    #[test]
    fn hash_move_sorts_first() {
        let board = Board::new();
        let mut buf = MoveBuffer::new();
        get_all_moves(&board, &mut buf, false);
        let mut moves: Vec<FatMove> = buf.iter().copied().collect();
        let hash_mv = Move::double_push(Square::D2, Square::D4);
        sort_moves(&board, &mut moves, Some(hash_mv));
        assert_eq!(moves[0].mv(), hash_mv);
    }

    #[test]
    fn mvv_lva_prefers_cheap_attacker_on_same_victim() {
        // Two white pieces can take on d5: a pawn (e4) and a knight-ish
        // stand-in; build a position where a pawn and a rook can both take
        // the same pawn on d5 to confirm the pawn attacker sorts first.
        let board = Board::from_fen("8/8/8/3p4/2P5/8/3R4/4K2k w - - 0 1").unwrap();
        let mut buf = MoveBuffer::new();
        get_all_moves(&board, &mut buf, false);
        let mut moves: Vec<FatMove> = buf
            .iter()
            .copied()
            .filter(|fm| fm.mv().to_square() == Square::D5)
            .collect();
        sort_moves(&board, &mut moves, None);
        assert_eq!(moves[0].piece(), Piece::Pawn);
    }
}
