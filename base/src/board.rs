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

//! The `Board`: a minimal `Position` (twelve piece bitboards plus metadata)
//! augmented with cached per-side and total occupancy, kept in step through
//! the incremental mutator interface of §4.3. `Board` also carries its own
//! incrementally-updated Zobrist hash, another such cached component.

use std::{
    convert::TryFrom,
    fmt::{Display, Formatter},
    ops::Index,
};

use super::{moves::FatMove, zobrist, Bitboard, CastleRights, Color, Move, Piece, Square};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// The information needed to undo a move: everything that `make_move`
/// cannot recompute from the post-move position alone.
pub struct IrreversibleInfo {
    /// The piece captured by the move, if any.
    pub captured: Option<Piece>,
    /// The halfmove clock immediately before the move was made.
    pub halfmove_clock: u16,
    /// The castling rights immediately before the move was made.
    pub castle_rights: CastleRights,
    /// The en passant file before the move was made; negative means none.
    pub ep_file: i8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// A complete chess position: the minimal `Position` data (§3) plus the
/// `AugmentedPosition` occupancy caches, plus an incrementally-maintained
/// Zobrist hash.
pub struct Board {
    /// One bitboard per piece type, the union of both colors.
    pieces: [Bitboard; Piece::NUM_TYPES],
    /// One bitboard per color: that color's total occupancy.
    sides: [Bitboard; Color::NUM],
    /// `sides[WHITE] | sides[BLACK]`, maintained incrementally.
    occupancy: Bitboard,
    /// The side to move.
    pub player: Color,
    /// Castling rights remaining for both sides.
    pub castle_rights: CastleRights,
    /// The en passant target square, if the previous move was a double
    /// pawn push.
    pub en_passant_square: Option<Square>,
    /// Halfmove clock since the last pawn move or capture.
    pub halfmove_clock: u16,
    /// The full move number, starting at 1, incremented after Black moves.
    pub fullmove_number: u32,
    /// The incremental Zobrist hash of this position.
    pub hash: u64,
}

impl Board {
    /// The home square of the king for a given color.
    #[inline(always)]
    pub const fn king_home(color: Color) -> Square {
        match color {
            Color::White => Square::E1,
            Color::Black => Square::E8,
        }
    }

    /// The home square of the kingside or queenside rook for a given color.
    #[inline(always)]
    pub const fn rook_home(color: Color, kingside: bool) -> Square {
        match (color, kingside) {
            (Color::White, true) => Square::H1,
            (Color::White, false) => Square::A1,
            (Color::Black, true) => Square::H8,
            (Color::Black, false) => Square::A8,
        }
    }

    /// Whether a castling move's rook-home `from` square is the kingside
    /// rook for the moving color.
    #[inline(always)]
    fn is_kingside_rook(color: Color, rook_from: Square) -> bool {
        rook_from == Board::rook_home(color, true)
    }

    /// The king's and rook's destination squares for a castle, given which
    /// side is castling.
    #[inline(always)]
    fn castle_destinations(color: Color, kingside: bool) -> (Square, Square) {
        let rank = Board::king_home(color).rank();
        if kingside {
            (Square::new(rank, 6).unwrap(), Square::new(rank, 5).unwrap())
        } else {
            (Square::new(rank, 2).unwrap(), Square::new(rank, 3).unwrap())
        }
    }

    /// The three squares the king passes through (inclusive) while castling,
    /// which must all be unattacked for the castle to be legal.
    fn castle_king_path(color: Color, kingside: bool) -> [Square; 3] {
        let rank = Board::king_home(color).rank();
        if kingside {
            [
                Square::new(rank, 4).unwrap(),
                Square::new(rank, 5).unwrap(),
                Square::new(rank, 6).unwrap(),
            ]
        } else {
            [
                Square::new(rank, 4).unwrap(),
                Square::new(rank, 3).unwrap(),
                Square::new(rank, 2).unwrap(),
            ]
        }
    }

    /// The starting position.
    pub fn new() -> Board {
        Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .expect("starting FEN is well-formed")
    }

    /// Get the occupancy of one piece type, across both colors.
    #[inline(always)]
    pub const fn piece_occupancy_both(&self, piece: Piece) -> Bitboard {
        self.pieces[piece as usize]
    }

    /// Get the occupancy of one piece type for one color.
    #[inline(always)]
    pub fn piece_occupancy(&self, piece: Piece, color: Color) -> Bitboard {
        self.pieces[piece as usize] & self.sides[color as usize]
    }

    /// Get the total occupancy of one color.
    #[inline(always)]
    pub const fn side_occupancy(&self, color: Color) -> Bitboard {
        self.sides[color as usize]
    }

    /// Get the total occupancy of the board.
    #[inline(always)]
    pub const fn occupancy(&self) -> Bitboard {
        self.occupancy
    }

    /// Get the piece type occupying a square, if any.
    pub fn type_at(&self, sq: Square) -> Option<Piece> {
        Piece::ALL_TYPES
            .into_iter()
            .find(|&p| self.pieces[p as usize].contains(sq))
    }

    /// Get the color of the piece occupying a square, if any.
    pub fn color_at(&self, sq: Square) -> Option<Color> {
        if self.sides[Color::White as usize].contains(sq) {
            Some(Color::White)
        } else if self.sides[Color::Black as usize].contains(sq) {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// The square of the king of the given color.
    pub fn king_square(&self, color: Color) -> Square {
        Square::try_from(self.piece_occupancy(Piece::King, color))
            .expect("every legal position has exactly one king per side")
    }

    /* Incremental mutators, §4.3. Each keeps `pieces`, `sides`, `occupancy`,
    and `hash` bit-identical to a from-scratch recompute. */

    fn add(&mut self, sq: Square, piece: Piece, color: Color) {
        debug_assert!(
            !self.pieces[piece as usize].contains(sq) || !self.sides[color as usize].contains(sq)
        );
        self.pieces[piece as usize].insert(sq);
        self.sides[color as usize].insert(sq);
        self.occupancy.insert(sq);
        self.hash ^= zobrist::square_key(sq, piece, color);
    }

    fn remove(&mut self, sq: Square, piece: Piece, color: Color) {
        debug_assert!(self.pieces[piece as usize].contains(sq));
        debug_assert!(self.sides[color as usize].contains(sq));
        self.pieces[piece as usize].remove(sq);
        self.sides[color as usize].remove(sq);
        self.occupancy.remove(sq);
        self.hash ^= zobrist::square_key(sq, piece, color);
    }

    fn move_piece(&mut self, from: Square, to: Square, piece: Piece, color: Color) {
        self.pieces[piece as usize].toggle(from);
        self.pieces[piece as usize].toggle(to);
        self.sides[color as usize].toggle(from);
        self.sides[color as usize].toggle(to);
        self.occupancy.toggle(from);
        self.occupancy.toggle(to);
        self.hash ^= zobrist::square_key(from, piece, color);
        self.hash ^= zobrist::square_key(to, piece, color);
    }

    /// Swap the piece occupying `loc` from `from_piece` to `to_piece`,
    /// same color (a promotion, or its undo).
    fn swap_sameside(&mut self, loc: Square, from_piece: Piece, to_piece: Piece, color: Color) {
        self.pieces[from_piece as usize].remove(loc);
        self.pieces[to_piece as usize].insert(loc);
        self.hash ^= zobrist::square_key(loc, from_piece, color);
        self.hash ^= zobrist::square_key(loc, to_piece, color);
    }

    fn toggle_castling_rights(&mut self, rights: CastleRights) {
        self.castle_rights.toggle(rights);
        self.hash ^= zobrist::castle_key(rights);
    }

    fn add_ep_sq(&mut self, sq: Square) {
        self.en_passant_square = Some(sq);
        self.hash ^= zobrist::ep_key(Some(sq));
    }

    fn remove_ep_sq(&mut self, sq: Square) {
        self.en_passant_square = None;
        self.hash ^= zobrist::ep_key(Some(sq));
    }

    fn set_to_move(&mut self, color: Color) {
        if self.player != color {
            self.hash ^= zobrist::player_key(Color::Black);
        }
        self.player = color;
    }

    /// Clear a color's castling rights for the rook that used to sit on
    /// `sq`, if `sq` is that color's kingside or queenside rook home and
    /// the corresponding right is still held.
    fn clear_rights_for_rook_square(&mut self, sq: Square, color: Color) {
        let right = if sq == Board::rook_home(color, true) {
            Some(CastleRights::king_castle(color))
        } else if sq == Board::rook_home(color, false) {
            Some(CastleRights::queen_castle(color))
        } else {
            None
        };
        if let Some(right) = right {
            if self.castle_rights & right != CastleRights::NO_RIGHTS {
                self.toggle_castling_rights(right);
            }
        }
    }

    /// Apply `fmove`, per §4.6. Returns whether the resulting position is
    /// legal (the mover's king is not left in check, and a castle's king
    /// path was not attacked). Illegal moves still mutate the board and
    /// MUST be undone with `unmake_move` by the caller regardless of the
    /// returned legality.
    pub fn make_move(&mut self, fmove: FatMove) -> (bool, IrreversibleInfo) {
        let m = fmove.mv();
        let mover = self.player;
        let from = m.from_square();
        let to = m.to_square();

        let info = IrreversibleInfo {
            captured: None,
            halfmove_clock: self.halfmove_clock,
            castle_rights: self.castle_rights,
            ep_file: self.en_passant_square.map_or(-1, |sq| sq.file() as i8),
        };

        if mover == Color::Black {
            self.fullmove_number += 1;
        }
        self.halfmove_clock += 1;

        if let Some(ep) = self.en_passant_square {
            self.remove_ep_sq(ep);
        }

        if m.is_castle() {
            let kingside = Board::is_kingside_rook(mover, from);
            let king_from = to;
            let rook_from = from;
            self.set_to_move(!mover);

            let path = Board::castle_king_path(mover, kingside);
            let legal = !path
                .into_iter()
                .any(|sq| crate::movegen::is_attacked(self, sq, !mover));

            let (king_to, rook_to) = Board::castle_destinations(mover, kingside);
            self.move_piece(king_from, king_to, Piece::King, mover);
            self.move_piece(rook_from, rook_to, Piece::Rook, mover);

            let both_rights = CastleRights::color_rights(mover) & self.castle_rights;
            if both_rights != CastleRights::NO_RIGHTS {
                self.toggle_castling_rights(both_rights);
            }

            return (legal, info);
        }

        let moved = self
            .type_at(from)
            .expect("make_move called with no piece on the from-square");

        let mut info = info;
        if m.is_capture() {
            let captured_sq = if m.is_en_passant() {
                Square::new(from.rank(), to.file()).unwrap()
            } else {
                to
            };
            let captured = self
                .type_at(captured_sq)
                .expect("capture move with no piece on the captured square");
            if captured == Piece::Rook {
                self.clear_rights_for_rook_square(captured_sq, !mover);
            }
            // remove the victim while `to` still holds only it -- `move_piece`
            // below toggles `to`, which would corrupt `occupancy` if the
            // victim's bit were still set when the mover's bit goes in.
            self.remove(captured_sq, captured, !mover);
            info.captured = Some(captured);
        }

        self.move_piece(from, to, moved, mover);

        if moved == Piece::Pawn || m.is_capture() {
            self.halfmove_clock = 0;
        }

        if m.move_type() == Move::DOUBLE_PUSH {
            let ep_rank = (from.rank() + to.rank()) / 2;
            self.add_ep_sq(Square::new(ep_rank, from.file()).unwrap());
        }

        if let Some(promoted) = m.promoted_piece() {
            self.swap_sameside(to, Piece::Pawn, promoted, mover);
        }

        if moved == Piece::Rook {
            self.clear_rights_for_rook_square(from, mover);
        }
        if moved == Piece::King {
            let both_rights = CastleRights::color_rights(mover) & self.castle_rights;
            if both_rights != CastleRights::NO_RIGHTS {
                self.toggle_castling_rights(both_rights);
            }
        }

        let legal = !crate::movegen::is_attacked(self, self.king_square(mover), !mover);

        self.set_to_move(!mover);

        (legal, info)
    }

    /// Undo `fmove`, which must be the most recently applied move, using
    /// the `IrreversibleInfo` returned alongside it by `make_move`.
    pub fn unmake_move(&mut self, fmove: FatMove, info: IrreversibleInfo) {
        let m = fmove.mv();
        let from = m.from_square();
        let to = m.to_square();

        // The side that made the move is the opposite of the current
        // side to move, since `make_move` already toggled it.
        let mover = !self.player;
        self.set_to_move(mover);

        if mover == Color::Black {
            self.fullmove_number -= 1;
        }

        if m.is_castle() {
            let kingside = Board::is_kingside_rook(mover, from);
            let king_from = to;
            let rook_from = from;
            let (king_to, rook_to) = Board::castle_destinations(mover, kingside);
            self.move_piece(king_to, king_from, Piece::King, mover);
            self.move_piece(rook_to, rook_from, Piece::Rook, mover);
        } else {
            if let Some(promoted) = m.promoted_piece() {
                self.swap_sameside(to, promoted, Piece::Pawn, mover);
            }

            let moved = self
                .type_at(to)
                .expect("unmake_move: no piece on the post-move to-square");
            self.move_piece(to, from, moved, mover);

            if let Some(captured) = info.captured {
                let captured_sq = if m.is_en_passant() {
                    Square::new(from.rank(), to.file()).unwrap()
                } else {
                    to
                };
                self.add(captured_sq, captured, !mover);
            }
        }

        let current_rights = self.castle_rights;
        let delta = current_rights ^ info.castle_rights;
        if delta != CastleRights::NO_RIGHTS {
            self.toggle_castling_rights(delta);
        }

        if let Some(ep) = self.en_passant_square {
            self.remove_ep_sq(ep);
        }
        if info.ep_file >= 0 {
            let ep_rank = if mover == Color::White { 2 } else { 5 };
            self.add_ep_sq(Square::new(ep_rank, info.ep_file as usize).unwrap());
        }

        self.halfmove_clock = info.halfmove_clock;
    }

    /// Parse a FEN string (six whitespace-delimited fields).
    pub fn from_fen(fen: &str) -> Result<Board, String> {
        let mut fields = fen.split_whitespace();

        let placement = fields.next().ok_or("missing piece placement field")?;
        let to_move = fields.next().ok_or("missing side-to-move field")?;
        let castling = fields.next().ok_or("missing castling rights field")?;
        let ep = fields.next().ok_or("missing en passant field")?;
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        let mut board = Board {
            pieces: [Bitboard::EMPTY; Piece::NUM_TYPES],
            sides: [Bitboard::EMPTY; Color::NUM],
            occupancy: Bitboard::EMPTY,
            player: Color::White,
            castle_rights: CastleRights::NO_RIGHTS,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
        };

        let mut rank = 7i32;
        let mut file = 0usize;
        for c in placement.chars() {
            match c {
                '/' => {
                    if file != 8 {
                        return Err(format!("rank had {file} files, expected 8"));
                    }
                    rank -= 1;
                    file = 0;
                }
                '1'..='8' => {
                    file += c.to_digit(10).unwrap() as usize;
                }
                _ => {
                    if rank < 0 || file >= 8 {
                        return Err("piece placement overruns the board".to_string());
                    }
                    let color = if c.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    let piece = Piece::from_code(c.to_ascii_uppercase())
                        .ok_or_else(|| format!("invalid piece letter '{c}'"))?;
                    let sq = Square::new(rank as usize, file).unwrap();
                    board.add(sq, piece, color);
                    file += 1;
                }
            }
        }

        board.player = match to_move {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(format!("invalid side to move '{other}'")),
        };
        if board.player == Color::Black {
            board.hash ^= zobrist::player_key(Color::Black);
        }

        if castling != "-" {
            let mut rights = CastleRights::NO_RIGHTS;
            for c in castling.chars() {
                rights |= match c {
                    'K' => CastleRights::king_castle(Color::White),
                    'Q' => CastleRights::queen_castle(Color::White),
                    'k' => CastleRights::king_castle(Color::Black),
                    'q' => CastleRights::queen_castle(Color::Black),
                    other => return Err(format!("invalid castling right '{other}'")),
                };
            }
            board.castle_rights = rights;
            board.hash ^= zobrist::castle_key(rights);
        }

        if ep != "-" {
            let sq = Square::from_algebraic(ep)?;
            board.en_passant_square = Some(sq);
            board.hash ^= zobrist::ep_key(Some(sq));
        }

        board.halfmove_clock = halfmove
            .parse()
            .map_err(|_| "invalid halfmove clock".to_string())?;
        board.fullmove_number = fullmove
            .parse()
            .map_err(|_| "invalid fullmove number".to_string())?;

        Ok(board)
    }

    /// Emit this board as a FEN string.
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank in (0..8).rev() {
            let mut empties = 0;
            for file in 0..8 {
                let sq = Square::new(rank, file).unwrap();
                match (self.type_at(sq), self.color_at(sq)) {
                    (Some(piece), Some(color)) => {
                        if empties > 0 {
                            placement.push_str(&empties.to_string());
                            empties = 0;
                        }
                        let letter = piece.code();
                        placement.push_str(&match color {
                            Color::White => letter.to_string(),
                            Color::Black => letter.to_lowercase(),
                        });
                    }
                    _ => empties += 1,
                }
            }
            if empties > 0 {
                placement.push_str(&empties.to_string());
            }
            if rank != 0 {
                placement.push('/');
            }
        }

        let to_move = match self.player {
            Color::White => "w",
            Color::Black => "b",
        };

        let mut castling = String::new();
        if self.castle_rights.is_kingside_castle_legal(Color::White) {
            castling.push('K');
        }
        if self.castle_rights.is_queenside_castle_legal(Color::White) {
            castling.push('Q');
        }
        if self.castle_rights.is_kingside_castle_legal(Color::Black) {
            castling.push('k');
        }
        if self.castle_rights.is_queenside_castle_legal(Color::Black) {
            castling.push('q');
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let ep = self
            .en_passant_square
            .map_or("-".to_string(), |sq| sq.to_string());

        format!(
            "{placement} {to_move} {castling} {ep} {} {}",
            self.halfmove_clock, self.fullmove_number
        )
    }
}

impl Default for Board {
    fn default() -> Board {
        Board::new()
    }
}

impl Index<Piece> for Board {
    type Output = Bitboard;
    fn index(&self, piece: Piece) -> &Bitboard {
        &self.pieces[piece as usize]
    }
}

impl Index<Color> for Board {
    type Output = Bitboard;
    fn index(&self, color: Color) -> &Bitboard {
        &self.sides[color as usize]
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_round_trips_through_fen() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let board = Board::from_fen(fen).unwrap();
        assert_eq!(board.to_fen(), fen);
        assert_eq!(
            board.occupancy(),
            board.side_occupancy(Color::White) | board.side_occupancy(Color::Black)
        );
        assert!((board.side_occupancy(Color::White) & board.side_occupancy(Color::Black)).is_empty());
    }

    #[test]
    fn hash_matches_fresh_recompute() {
        let board = Board::new();
        let mut fresh = Board {
            pieces: [Bitboard::EMPTY; Piece::NUM_TYPES],
            sides: [Bitboard::EMPTY; Color::NUM],
            occupancy: Bitboard::EMPTY,
            player: Color::White,
            castle_rights: CastleRights::NO_RIGHTS,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
        };
        for &piece in &Piece::ALL_TYPES {
            for color in [Color::White, Color::Black] {
                for sq in board.piece_occupancy(piece, color) {
                    fresh.add(sq, piece, color);
                }
            }
        }
        if board.player == Color::Black {
            fresh.hash ^= zobrist::player_key(Color::Black);
        }
        fresh.hash ^= zobrist::castle_key(board.castle_rights);
        assert_eq!(fresh.hash, board.hash);
    }

    #[test]
    fn make_unmake_is_identity() {
        let mut board = Board::new();
        let before = board;
        let m = Move::double_push(Square::E2, Square::E4);
        let fm = FatMove::new(m, Piece::Pawn);
        let (legal, info) = board.make_move(fm);
        assert!(legal);
        assert_ne!(board, before);
        board.unmake_move(fm, info);
        assert_eq!(board, before);
    }

    #[test]
    fn captured_rook_clears_rights_in_the_same_make_move() {
        // White rook on a1 captures Black's queenside rook sitting on its
        // home square a8; Black's queenside right must be cleared as part
        // of this same make_move (§9's documented ordering issue).
        let mut board = Board::from_fen("r3k3/8/8/8/8/8/8/R3K2R w KQq - 0 1").unwrap();
        let m = Move::capture(Square::A1, Square::A8);
        let fm = FatMove::new(m, Piece::Rook);
        let (_legal, _info) = board.make_move(fm);
        assert!(!board.castle_rights.is_queenside_castle_legal(Color::Black));
    }
}
