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

//! Zobrist hash key generation. All keys are process-wide, read-only after
//! one-time initialisation, and seeded deterministically so that hashes are
//! reproducible across runs.

use once_cell::sync::Lazy;

use super::{CastleRights, Color, Piece, Square};

struct Keys {
    /// One key per (square, piece, color).
    square: [[[u64; Color::NUM]; Piece::NUM_TYPES]; 64],
    /// One key per single castling-rights bit (white king/queen, black
    /// king/queen). Subset keys are derived by XORing the relevant bits.
    castle_bit: [u64; 4],
    /// One key per en-passant file.
    ep_file: [u64; 8],
    /// The key XORed in whenever it is Black's turn to move.
    black_to_move: u64,
}

static KEYS: Lazy<Keys> = Lazy::new(|| {
    // A fixed seed keeps hashes reproducible run to run, which matters for
    // reasoning about TT collisions while debugging.
    fastrand::seed(0x636f_7276_6964);

    let mut square = [[[0u64; Color::NUM]; Piece::NUM_TYPES]; 64];
    for sq_keys in &mut square {
        for piece_keys in sq_keys.iter_mut() {
            for color_key in piece_keys.iter_mut() {
                *color_key = fastrand::u64(..);
            }
        }
    }

    let mut castle_bit = [0u64; 4];
    for key in &mut castle_bit {
        *key = fastrand::u64(..);
    }

    let mut ep_file = [0u64; 8];
    for key in &mut ep_file {
        *key = fastrand::u64(..);
    }

    Keys {
        square,
        castle_bit,
        ep_file,
        black_to_move: fastrand::u64(..),
    }
});

#[inline(always)]
/// The key for a single (square, piece, color) triple.
pub fn square_key(sq: Square, piece: Piece, color: Color) -> u64 {
    KEYS.square[sq as usize][piece as usize][color as usize]
}

#[inline(always)]
/// The key for the full set of castling rights currently held, derived by
/// XORing together the keys of each set bit.
pub fn castle_key(rights: CastleRights) -> u64 {
    let mut key = 0;
    for i in 0..4 {
        if rights.0 & (1 << i) != 0 {
            key ^= KEYS.castle_bit[i];
        }
    }
    key
}

#[inline(always)]
/// The key for an en passant target square, or 0 if there is none.
pub fn ep_key(sq: Option<Square>) -> u64 {
    match sq {
        Some(sq) => KEYS.ep_file[sq.file()],
        None => 0,
    }
}

#[inline(always)]
/// The key XORed in while it is Black's turn to move. White XORs nothing.
pub fn player_key(color: Color) -> u64 {
    match color {
        Color::Black => KEYS.black_to_move,
        Color::White => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn castle_key_is_subset_xor() {
        let all = castle_key(CastleRights::ALL_RIGHTS);
        let none = castle_key(CastleRights::NO_RIGHTS);
        assert_eq!(none, 0);
        let white_king = castle_key(CastleRights::king_castle(Color::White));
        let white_queen = castle_key(CastleRights::queen_castle(Color::White));
        let black_king = castle_key(CastleRights::king_castle(Color::Black));
        let black_queen = castle_key(CastleRights::queen_castle(Color::Black));
        assert_eq!(all, white_king ^ white_queen ^ black_king ^ black_queen);
    }

    #[test]
    fn ep_key_is_zero_for_none() {
        assert_eq!(ep_key(None), 0);
    }

    #[test]
    fn white_xors_nothing() {
        assert_eq!(player_key(Color::White), 0);
        assert_ne!(player_key(Color::Black), 0);
    }

    #[test]
    fn distinct_squares_and_pieces_have_distinct_keys() {
        assert_ne!(
            square_key(Square::A1, Piece::Pawn, Color::White),
            square_key(Square::A2, Piece::Pawn, Color::White)
        );
        assert_ne!(
            square_key(Square::A1, Piece::Pawn, Color::White),
            square_key(Square::A1, Piece::Knight, Color::White)
        );
    }
}
