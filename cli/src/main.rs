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

use std::env;

use corvid_base::{perft::perft, Board};
use corvid_engine::thread::MainSearch;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "perft" => {
                if args.len() >= 3 {
                    // args[2] is the depth, args[3..] is the FEN
                    let depth = args[2].parse::<u8>().unwrap();
                    let fen = args[3..].join(" ");
                    perft(&fen, depth);
                } else {
                    println!("please specify a depth and a FEN");
                }
            }
            "bench" => {
                // run a fixed-depth search on the fried liver position
                let board =
                    Board::from_fen("r1bq1b1r/ppp2kpp/2n5/3np3/2B5/8/PPPP1PPP/RNBQK2R w KQ - 0 7")
                        .unwrap();

                let mut e = MainSearch::new();
                e.config.depth = 10;

                let r = e.evaluate(&board);
                let info = r.unwrap();
                println!("depth {}: {} gives {}", info.depth, info.pv[0], info.eval);
            }
            _ => {
                println!("unrecognized mode of operation {:?}", args[1]);
            }
        };
    } else {
        println!("modes: perft, bench");
    }
}
