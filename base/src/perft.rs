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

//! Performance testing, or "perft." Perft is used for verifying the
//! correctness of move generation and benchmarking the speed of both move
//! generation and the make/unmake processes.

use std::time::Instant;

use crate::movegen::{get_all_moves, MoveBuffer};

use super::Board;

#[allow(dead_code)]
/// Run a perft on `fen` to `depth`, printing the divide and overall timing.
///
/// # Panics
/// If `fen` is not a legal board.
pub fn perft(fen: &str, depth: u8) -> u64 {
    let board = Board::from_fen(fen).unwrap();
    let tic = Instant::now();
    let num_nodes = perft_search(&board, depth, true);
    let toc = Instant::now();
    let time = toc - tic;
    let speed = (num_nodes as f64) / time.as_secs_f64();
    println!(
        "time {:.2} secs, num nodes {num_nodes}: {speed:.0} nodes/sec",
        time.as_secs_f64()
    );

    num_nodes
}

/// The core search algorithm for perft: pseudo-legal moves are generated
/// once per node, and each candidate is filtered for legality by the same
/// make/unmake probe the search uses.
fn perft_search(board: &Board, depth: u8, divide: bool) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut buf = MoveBuffer::new();
    get_all_moves(board, &mut buf, false);

    let mut total = 0;
    for &fmove in buf.iter() {
        let mut copy = *board;
        let (legal, _info) = copy.make_move(fmove);
        if !legal {
            continue;
        }
        let perft_count = perft_search(&copy, depth - 1, false);
        if divide {
            println!("{}, {perft_count}", fmove.mv());
        }
        total += perft_count;
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// Test the perft values for the board starting position.
    fn perft_start_position() {
        perft_assistant(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            &[1, 20, 400, 8_902, 197_281],
        );
    }

    #[test]
    /// Test the perft values for the
    /// [Kiwipete](https://www.chessprogramming.org/Perft_Results#Position_2)
    /// position.
    fn perft_kiwipete() {
        perft_assistant(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -",
            &[1, 48, 2039, 97_862],
        );
    }

    #[test]
    fn perft_endgame() {
        // https://www.chessprogramming.org/Perft_Results#Position_3
        perft_assistant(
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -",
            &[1, 14, 191, 2_812, 43_238],
        );
    }

    #[test]
    /// Test the perft values for an unbalanced position. Uses results from
    /// [the CPW wiki](https://www.chessprogramming.org/Perft_Results#Position_4).
    fn perft_unbalanced() {
        perft_assistant(
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            &[1, 6, 264, 9_467],
        );
    }

    fn perft_assistant(fen: &str, node_counts: &[u64]) {
        for (i, num) in node_counts.iter().enumerate() {
            assert_eq!(*num, perft(fen, i as u8));
        }
    }
}
