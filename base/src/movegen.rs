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

//! Pseudo-legal move generation and attack detection. The generator never
//! filters for check: the caller (`Board::make_move`) applies a move and
//! probes the mover's king square with [`is_attacked`] to decide legality.

use std::convert::TryFrom;

use once_cell::sync::Lazy;

use crate::magic::MAGIC;

use super::{Bitboard, Board, CastleRights, Color, Direction, Move, Piece, Square};
use crate::moves::FatMove;

/// The largest number of pseudo-legal moves a single position can produce.
/// `MoveBuffer::push` panics rather than silently dropping moves past this.
pub const MOVE_BUFFER_CAPACITY: usize = 256;

#[derive(Clone, Debug, Default)]
/// A bounded sequence of [`FatMove`]s, reused per ply to avoid allocating a
/// fresh `Vec` at every node.
pub struct MoveBuffer {
    moves: Vec<FatMove>,
}

impl MoveBuffer {
    #[must_use]
    pub fn new() -> MoveBuffer {
        MoveBuffer {
            moves: Vec::with_capacity(MOVE_BUFFER_CAPACITY),
        }
    }

    pub fn clear(&mut self) {
        self.moves.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[FatMove] {
        &self.moves
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FatMove> {
        self.moves.iter()
    }

    fn push(&mut self, fmove: FatMove) {
        assert!(
            self.moves.len() < MOVE_BUFFER_CAPACITY,
            "move buffer exceeded its {MOVE_BUFFER_CAPACITY}-move capacity"
        );
        self.moves.push(fmove);
    }
}

impl<'a> IntoIterator for &'a MoveBuffer {
    type Item = &'a FatMove;
    type IntoIter = std::slice::Iter<'a, FatMove>;
    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
/// Which half of the quiet/loud split a per-piece generator should emit.
/// `All` emits both, interleaved piece by piece, which is the better choice
/// for cache locality when ordering does not matter.
enum Stage {
    Quiet,
    Loud,
    All,
}

impl Stage {
    const fn wants_quiet(self) -> bool {
        matches!(self, Stage::Quiet | Stage::All)
    }
    const fn wants_loud(self) -> bool {
        matches!(self, Stage::Loud | Stage::All)
    }
}

static KING_ATTACKS: Lazy<[Bitboard; 64]> = Lazy::new(|| jumping_attack_table(&Direction::KING_STEPS));
static KNIGHT_ATTACKS: Lazy<[Bitboard; 64]> = Lazy::new(|| jumping_attack_table(&Direction::KNIGHT_STEPS));

static PAWN_ATTACKS: Lazy<[[Bitboard; 64]; Color::NUM]> = Lazy::new(|| {
    [
        jumping_attack_table(&[Direction::SOUTHEAST, Direction::SOUTHWEST]),
        jumping_attack_table(&[Direction::NORTHEAST, Direction::NORTHWEST]),
    ]
});

/// Build a per-square jump table by OR-ing together the wrap-suppressed
/// shifts of every direction in `steps`.
fn jumping_attack_table(steps: &[Direction]) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    for sq in Bitboard::ALL {
        let mut reachable = Bitboard::EMPTY;
        for &step in steps {
            reachable |= Bitboard::from(sq).shift_checked(step);
        }
        table[sq as usize] = reachable;
    }
    table
}

#[inline(always)]
/// The squares a king on `sq` attacks.
pub fn king_attacks(sq: Square) -> Bitboard {
    KING_ATTACKS[sq as usize]
}

#[inline(always)]
/// The squares a knight on `sq` attacks.
pub fn knight_attacks(sq: Square) -> Bitboard {
    KNIGHT_ATTACKS[sq as usize]
}

#[inline(always)]
/// The squares a pawn of `color` standing on `sq` would capture on.
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    PAWN_ATTACKS[color as usize][sq as usize]
}

/// Whether `sq` is attacked by any piece belonging to `by_color`, per §4.5's
/// attack detector. The pawn test mirrors the attack direction: a pawn of
/// the opposite color standing on `sq` would capture exactly the squares
/// from which a `by_color` pawn could capture `sq`.
pub fn is_attacked(board: &Board, sq: Square, by_color: Color) -> bool {
    let occ = board.occupancy();

    if !(pawn_attacks(!by_color, sq) & board.piece_occupancy(Piece::Pawn, by_color)).is_empty() {
        return true;
    }
    if !(knight_attacks(sq) & board.piece_occupancy(Piece::Knight, by_color)).is_empty() {
        return true;
    }
    let bishop_like =
        board.piece_occupancy(Piece::Bishop, by_color) | board.piece_occupancy(Piece::Queen, by_color);
    if !(MAGIC.bishop_attacks(occ, sq) & bishop_like).is_empty() {
        return true;
    }
    let rook_like =
        board.piece_occupancy(Piece::Rook, by_color) | board.piece_occupancy(Piece::Queen, by_color);
    if !(MAGIC.rook_attacks(occ, sq) & rook_like).is_empty() {
        return true;
    }
    !(king_attacks(sq) & board.piece_occupancy(Piece::King, by_color)).is_empty()
}

/// Append every pseudo-legal non-capturing move (including quiet
/// promotions and castling) to `buf`.
pub fn get_quiet_moves(board: &Board, buf: &mut MoveBuffer) {
    let mover = board.player;
    gen_king(board, mover, Stage::Quiet, buf);
    gen_knight(board, mover, Stage::Quiet, buf);
    gen_sliding(board, mover, Piece::Bishop, Stage::Quiet, buf);
    gen_sliding(board, mover, Piece::Rook, Stage::Quiet, buf);
    gen_sliding(board, mover, Piece::Queen, Stage::Quiet, buf);
    gen_pawns(board, mover, Stage::Quiet, buf);
    gen_castling(board, mover, buf);
}

/// Append every pseudo-legal capture (including en passant and
/// capture-promotions) to `buf`. Castling is never loud.
pub fn get_loud_moves(board: &Board, buf: &mut MoveBuffer) {
    let mover = board.player;
    gen_king(board, mover, Stage::Loud, buf);
    gen_knight(board, mover, Stage::Loud, buf);
    gen_sliding(board, mover, Piece::Bishop, Stage::Loud, buf);
    gen_sliding(board, mover, Piece::Rook, Stage::Loud, buf);
    gen_sliding(board, mover, Piece::Queen, Stage::Loud, buf);
    gen_pawns(board, mover, Stage::Loud, buf);
}

/// Append every pseudo-legal move to `buf`. When `in_order` is set, every
/// loud move precedes every quiet move; otherwise moves come out
/// interleaved piece by piece, which keeps the per-piece attack-table
/// lookups adjacent in time.
pub fn get_all_moves(board: &Board, buf: &mut MoveBuffer, in_order: bool) {
    if in_order {
        get_loud_moves(board, buf);
        get_quiet_moves(board, buf);
        return;
    }
    let mover = board.player;
    gen_king(board, mover, Stage::All, buf);
    gen_knight(board, mover, Stage::All, buf);
    gen_sliding(board, mover, Piece::Bishop, Stage::All, buf);
    gen_sliding(board, mover, Piece::Rook, Stage::All, buf);
    gen_sliding(board, mover, Piece::Queen, Stage::All, buf);
    gen_pawns(board, mover, Stage::All, buf);
    gen_castling(board, mover, buf);
}

fn gen_king(board: &Board, mover: Color, stage: Stage, buf: &mut MoveBuffer) {
    let from = board.king_square(mover);
    let attacks = king_attacks(from) & !board.side_occupancy(mover);
    if stage.wants_quiet() {
        for to in attacks & !board.occupancy() {
            buf.push(FatMove::new(Move::normal(from, to), Piece::King));
        }
    }
    if stage.wants_loud() {
        for to in attacks & board.side_occupancy(!mover) {
            buf.push(FatMove::new(Move::capture(from, to), Piece::King));
        }
    }
}

fn gen_knight(board: &Board, mover: Color, stage: Stage, buf: &mut MoveBuffer) {
    for from in board.piece_occupancy(Piece::Knight, mover) {
        let attacks = knight_attacks(from) & !board.side_occupancy(mover);
        if stage.wants_quiet() {
            for to in attacks & !board.occupancy() {
                buf.push(FatMove::new(Move::normal(from, to), Piece::Knight));
            }
        }
        if stage.wants_loud() {
            for to in attacks & board.side_occupancy(!mover) {
                buf.push(FatMove::new(Move::capture(from, to), Piece::Knight));
            }
        }
    }
}

/// Shared generator for bishops, rooks, and queens: queen emissions are the
/// union of the bishop and rook ray sets at the same square, which never
/// double-counts a destination since the two ray sets are disjoint.
fn gen_sliding(board: &Board, mover: Color, piece: Piece, stage: Stage, buf: &mut MoveBuffer) {
    let occ = board.occupancy();
    for from in board.piece_occupancy(piece, mover) {
        let attacks = match piece {
            Piece::Bishop => MAGIC.bishop_attacks(occ, from),
            Piece::Rook => MAGIC.rook_attacks(occ, from),
            Piece::Queen => MAGIC.queen_attacks(occ, from),
            _ => unreachable!("gen_sliding only called for bishop/rook/queen"),
        } & !board.side_occupancy(mover);

        if stage.wants_quiet() {
            for to in attacks & !occ {
                buf.push(FatMove::new(Move::normal(from, to), piece));
            }
        }
        if stage.wants_loud() {
            for to in attacks & board.side_occupancy(!mover) {
                buf.push(FatMove::new(Move::capture(from, to), piece));
            }
        }
    }
}

/// Emit a single (non-double) pawn push to `to`, expanding into the four
/// promotion variants if `to` is on the promotion rank.
fn push_pawn_advance(buf: &mut MoveBuffer, from: Square, to: Square, promote_rank: Bitboard) {
    if promote_rank.contains(to) {
        for &promote_type in &Piece::PROMOTE_TYPES {
            buf.push(FatMove::new(
                Move::promoting(from, to, promote_type, false),
                Piece::Pawn,
            ));
        }
    } else {
        buf.push(FatMove::new(Move::single_push(from, to), Piece::Pawn));
    }
}

fn gen_pawns(board: &Board, mover: Color, stage: Stage, buf: &mut MoveBuffer) {
    let dir = mover.pawn_direction();
    let start_rank = mover.pawn_start_rank();
    let promote_rank = mover.pawn_promote_rank();
    let occ = board.occupancy();
    let enemy = board.side_occupancy(!mover);

    for from in board.piece_occupancy(Piece::Pawn, mover) {
        if stage.wants_quiet() {
            let single_bb = Bitboard::from(from).shift(dir);
            if (single_bb & occ).is_empty() {
                let to = Square::try_from(single_bb).expect("pawn push stays on the board");
                push_pawn_advance(buf, from, to, promote_rank);

                if start_rank.contains(from) {
                    let double_bb = single_bb.shift(dir);
                    if (double_bb & occ).is_empty() {
                        let to2 = Square::try_from(double_bb).expect("pawn double push stays on the board");
                        buf.push(FatMove::new(Move::double_push(from, to2), Piece::Pawn));
                    }
                }
            }
        }

        if stage.wants_loud() {
            for to in pawn_attacks(mover, from) & enemy {
                if promote_rank.contains(to) {
                    for &promote_type in &Piece::PROMOTE_TYPES {
                        buf.push(FatMove::new(
                            Move::promoting(from, to, promote_type, true),
                            Piece::Pawn,
                        ));
                    }
                } else {
                    buf.push(FatMove::new(Move::capture(from, to), Piece::Pawn));
                }
            }
            if let Some(ep) = board.en_passant_square {
                if pawn_attacks(mover, from).contains(ep) {
                    buf.push(FatMove::new(Move::en_passant(from, ep), Piece::Pawn));
                }
            }
        }
    }
}

/// Castling is always quiet, and its king-path-attacked check is
/// deliberately left to `Board::make_move` (§4.5); only the rights and
/// empty-path conditions are checked here.
fn gen_castling(board: &Board, mover: Color, buf: &mut MoveBuffer) {
    for kingside in [true, false] {
        let right = if kingside {
            CastleRights::king_castle(mover)
        } else {
            CastleRights::queen_castle(mover)
        };
        if board.castle_rights & right == CastleRights::NO_RIGHTS {
            continue;
        }
        let king_home = Board::king_home(mover);
        let rook_home = Board::rook_home(mover, kingside);
        if !(Bitboard::between(king_home, rook_home) & board.occupancy()).is_empty() {
            continue;
        }
        let side_piece = if kingside { Piece::King } else { Piece::Queen };
        buf.push(FatMove::new(Move::castling(rook_home, king_home), side_piece));
    }
}

/// Whether the side to move in `board` has any legal move at all. Stops at
/// the first pseudo-legal move that survives the make/unmake legality check,
/// so it is cheaper than collecting the full legal list just to check
/// emptiness.
pub fn has_legal_move(board: &Board) -> bool {
    let mut buf = MoveBuffer::new();
    get_all_moves(board, &mut buf, false);
    buf.iter().any(|&fmove| {
        let mut copy = *board;
        copy.make_move(fmove).0
    })
}

/// Every legal move available to the side to move in `board`, found by
/// filtering the pseudo-legal list through `Board::make_move`'s own
/// legality check on a scratch copy.
pub fn legal_moves(board: &Board) -> Vec<FatMove> {
    let mut buf = MoveBuffer::new();
    get_all_moves(board, &mut buf, false);
    buf.iter()
        .copied()
        .filter(|&fmove| {
            let mut copy = *board;
            copy.make_move(fmove).0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn king_attacks_from_corner_are_three_squares() {
        assert_eq!(king_attacks(Square::A1).len(), 3);
        assert_eq!(king_attacks(Square::E4).len(), 8);
    }

    #[test]
    fn knight_attacks_from_corner_are_two_squares() {
        assert_eq!(knight_attacks(Square::A1).len(), 2);
        assert_eq!(knight_attacks(Square::D4).len(), 8);
    }

    #[test]
    fn pawn_attacks_never_wrap_the_board() {
        assert!(!pawn_attacks(Color::White, Square::A4).contains(Square::H5));
        assert!(!pawn_attacks(Color::White, Square::H4).contains(Square::A5));
    }

    #[test]
    fn starting_position_has_twenty_legal_moves() {
        let board = Board::new();
        let mut buf = MoveBuffer::new();
        get_all_moves(&board, &mut buf, true);
        assert_eq!(buf.len(), 20);
    }

    #[test]
    fn king_in_check_is_attacked_by_the_checking_side() {
        // White king on e1, black rook on e8: e1 is attacked by Black.
        let board = Board::from_fen("4r3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(is_attacked(&board, Square::E1, Color::Black));
        assert!(!is_attacked(&board, Square::E1, Color::White));
    }

    #[test]
    fn en_passant_capture_is_generated_only_at_the_ep_square() {
        let board = Board::from_fen("8/8/8/3pP3/8/8/8/8 w - d6 0 1").unwrap();
        let mut buf = MoveBuffer::new();
        get_loud_moves(&board, &mut buf);
        assert!(buf
            .as_slice()
            .iter()
            .any(|fm| fm.mv().is_en_passant() && fm.mv().to_square() == Square::D6));
    }

    #[test]
    fn castling_requires_empty_path_and_rights() {
        let board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mut buf = MoveBuffer::new();
        gen_castling(&board, Color::White, &mut buf);
        assert_eq!(buf.len(), 2);

        let blocked = Board::from_fen("r3k2r/8/8/8/8/8/8/RN2K2R w KQkq - 0 1").unwrap();
        let mut buf2 = MoveBuffer::new();
        gen_castling(&blocked, Color::White, &mut buf2);
        assert_eq!(buf2.len(), 1);
    }

    #[test]
    fn legal_moves_excludes_moves_that_leave_the_king_in_check() {
        // White king on e1 pinned to nothing, but e2 is not: a rook on e8
        // means e1 can't step to e2 and stay legal, though e2 is reachable
        // pseudo-legally.
        let board = Board::from_fen("4r3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(legal_moves(&board)
            .iter()
            .all(|fm| fm.mv().to_square() != Square::E2));
        assert!(has_legal_move(&board));
    }

    #[test]
    fn checkmate_position_has_no_legal_moves() {
        // the position just after Rb6-b8# from the mate-in-1 tests elsewhere
        let board = Board::from_fen("1R1k4/R7/8/5K2/8/8/8/8 b - - 0 1").unwrap();
        assert!(!has_legal_move(&board));
        assert!(legal_moves(&board).is_empty());
    }
}
