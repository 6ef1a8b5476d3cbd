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

//! The main UCI procedure.
//!
//! This is the I/O thread: it listens for UCI commands on stdin and, on
//! `go`, hands the position off to the one search thread. The two threads
//! communicate only through `MainSearch::stop` and the join handle of the
//! search thread (see the concurrency model) -- there is no Lazy-SMP helper
//! fan-out to manage here.

use std::{
    io::stdin,
    sync::{Arc, RwLock},
    thread::JoinHandle,
    time::Duration,
};

use corvid_base::{Board, FatMove};
use corvid_engine::{
    thread::MainSearch,
    time::get_search_time,
    transposition::TTable,
    uci::{parse_line, EngineInfo, GoOption, OptionType, UciCommand, UciMessage},
};

/// Apply a bare UCI `Move` to `board`, looking up the moving piece to build
/// the `FatMove` that `Board::make_move` requires.
fn apply_uci_move(board: &mut Board, m: corvid_base::Move) {
    let piece = board
        .type_at(m.from_square())
        .expect("UCI move must originate from an occupied square");
    let (legal, _info) = board.make_move(FatMove::new(m, piece));
    debug_assert!(legal, "GUI sent an illegal move in a `position` command");
}

/// Run a UCI engine.
fn main() {
    let mut debug = false;
    let searcher = Arc::new(RwLock::new(MainSearch::new()));
    let mut board = Board::new();
    let mut search_handle = None;

    loop {
        let mut buf = String::new();
        if stdin().read_line(&mut buf).is_err() {
            debug_info("failed to read line", debug);
        };
        let command = match parse_line(&buf, &board) {
            Ok(cmd) => cmd,
            Err(e) => {
                debug_info(&format!("failed to parse line: {e}"), debug);
                continue;
            }
        };
        match command {
            UciCommand::Uci => {
                println!(
                    "{}",
                    UciMessage::Id {
                        name: Some("Corvid 0.1.0"),
                        author: Some("Clayton Ramsey"),
                    }
                );

                add_option(
                    "Hash",
                    OptionType::Spin {
                        default: 21,
                        min: 1,
                        max: 32,
                    },
                );

                println!("{}", UciMessage::UciOk)
            }
            UciCommand::Debug(new_debug) => {
                debug = new_debug;
            }
            UciCommand::IsReady => {
                println!("{}", UciMessage::ReadyOk);
            }
            UciCommand::SetOption { name, value } => match name.as_str() {
                "Hash" => match value {
                    None => debug_info("error: no value given for `Hash`", debug),
                    Some(bits_str) => match bits_str.parse() {
                        Ok(bits) => {
                            searcher.write().unwrap().ttable = TTable::with_capacity(bits)
                        }
                        _ => debug_info("error: illegal parameter for `Hash`", debug),
                    },
                },
                _ => debug_info(&format!("error: unknown option key `{}`", name), debug),
            },
            UciCommand::NewGame => {
                board = Board::new();
                stop(&searcher, search_handle, debug);
                search_handle = None;
                searcher.write().unwrap().ttable.clear();
            }
            UciCommand::Position { fen, moves } => {
                board = match fen {
                    None => Board::new(),
                    Some(fen) => Board::from_fen(&fen).unwrap(),
                };
                for m in moves {
                    apply_uci_move(&mut board, m);
                }
            }
            UciCommand::Go(opts) => {
                debug_info("go command received", debug);
                search_handle = go(&opts, &searcher, &board, debug);
            }
            UciCommand::Stop => {
                stop(&searcher, search_handle, debug);
                search_handle = None;
            }
            UciCommand::PonderHit => todo!(),
            UciCommand::Quit => {
                stop(&searcher, search_handle, debug);
                break;
            }
        }
    }
}

/// Execute a UCI `go` command. This function has been broken out for
/// readability. Will spawn a new thread to search and return its handle.
fn go(
    opts: &[GoOption],
    searcher: &Arc<RwLock<MainSearch>>,
    board: &Board,
    debug: bool,
) -> Option<JoinHandle<()>> {
    let mut _ponder = false;
    let (mut wtime, mut btime) = (None, None);
    let (mut winc, mut binc) = (0, 0);
    let mut movestogo = None;
    let mut infinite = false;
    let mut movetime = None;

    *searcher.read().unwrap().limit.nodes_cap.lock().unwrap() = None;

    // by default, set the depth to search to be 99, so that the timer is the
    // sole limiting factor
    searcher.write().unwrap().config.depth = 99;
    for opt in opts {
        match opt {
            GoOption::SearchMoves(_) => {
                unimplemented!("no implementation of searching move subsets")
            }
            GoOption::Ponder => {
                infinite = true;
            }
            &GoOption::WhiteTime(time) => {
                wtime = Some(time);
            }
            &GoOption::BlackTime(time) => {
                btime = Some(time);
            }
            &GoOption::WhiteInc(inc) => {
                winc = inc;
            }
            &GoOption::BlackInc(inc) => {
                binc = inc;
            }
            GoOption::MovesToGo(n) => {
                movestogo = Some(*n);
            }
            &GoOption::Depth(d) => {
                searcher.write().unwrap().config.depth = d;
            }
            &GoOption::Nodes(num) => {
                *searcher.read().unwrap().limit.nodes_cap.lock().unwrap() = Some(num);
            }
            GoOption::Mate(_) => unimplemented!(),
            &GoOption::MoveTime(msecs) => {
                movetime = Some(Duration::from_millis(msecs as u64));
            }
            GoOption::Infinite => {
                searcher.write().unwrap().config.depth = 99;
                infinite = true;
            }
        }
    }

    let searcher_guard = searcher.read().unwrap();
    let mut search_duration_guard = searcher_guard.limit.search_duration.lock().unwrap();
    if infinite {
        *search_duration_guard = None;
    } else if let Some(mt) = movetime {
        *search_duration_guard = Some(mt)
    } else {
        *search_duration_guard = Some(Duration::from_millis(get_search_time(
            movestogo,
            (winc, binc),
            (wtime.unwrap(), btime.unwrap()),
            board.player,
        ) as u64));
    }
    debug_info(&format!("search time: {:?}", *search_duration_guard), debug);
    drop(search_duration_guard); // prevent deadlock when starting the limit
    drop(searcher_guard);

    let board: Board = *board;
    let searcher_arc = searcher.clone();

    debug_info("spawning main search thread", debug);
    Some(std::thread::spawn(move || {
        debug_info("starting evaluation", debug);
        let search_result = searcher_arc.write().unwrap().evaluate(&board);
        debug_info("finished evaluation", debug);

        match search_result {
            Ok(info) => {
                println!(
                    "{}",
                    UciMessage::BestMove {
                        m: info.pv[0],
                        ponder: info.pv.get(1).copied(),
                    }
                );
            }
            Err(e) => {
                debug_info(&format!("search failed: {:?}", e), debug);
            }
        }
    }))
}

/// Notify any active searches to stop, and then block until they are all
/// stopped.
fn stop(searcher: &Arc<RwLock<MainSearch>>, search_handle: Option<JoinHandle<()>>, debug: bool) {
    debug_info("now stopping search", debug);
    searcher.read().unwrap().stop();
    if let Some(handle) = search_handle {
        handle.join().unwrap();
    }
    debug_info("search stopped", debug);
}

/// Print out a debug info message to the console. Will have no effect if
/// `debug` is `false`.
fn debug_info(s: &str, debug: bool) {
    if debug {
        println!("{}", UciMessage::Info(&[EngineInfo::String(s)]));
    }
}

/// Send out a message to add an option for the frontend.
fn add_option(name: &str, opt: OptionType) {
    println!("{}", UciMessage::Option { name, opt })
}
