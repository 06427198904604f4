//! Line-oriented driver speaking a small UCI-style dialect. The protocol
//! layer stays thin: it parses commands, feeds the game driver and the
//! engine, and prints results.

use std::io::{self, BufRead};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use skewer::board::Position;
use skewer::game::GameState;
use skewer::logger::init_logging;
use skewer::moves::execute::applied;
use skewer::moves::movegen::{MoveType, generate_legal_moves};
use skewer::moves::perft::perft;
use skewer::moves::types::{FLAG_NONE, FLAG_PROMOTION, Move, PROMO_BISHOP, PROMO_KNIGHT, PROMO_QUEEN, PROMO_ROOK};
use skewer::search::engine::{Engine, EngineConfig};
use skewer::square::Square;

fn main() {
    init_logging("logs/skewer.log", "skewer=info");

    let mut game = GameState::new(None);
    let mut engine = Engine::new(EngineConfig {
        use_book: true,
        ..EngineConfig::default()
    });

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line.trim().to_string(),
            Err(_) => break,
        };
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "uci" => {
                println!("id name Skewer");
                println!("id author Skewer developers");
                println!("uciok");
            }
            "isready" => println!("readyok"),
            "ucinewgame" => game = GameState::new(None),
            "position" => {
                if let Some(new_game) = handle_position(&parts) {
                    game = new_game;
                } else {
                    eprintln!("could not parse position command");
                }
            }
            "go" => handle_go(&parts, &mut game, &mut engine),
            "perft" => handle_perft(&parts, &game),
            "d" | "display" | "fen" => println!("{}", game.boards()),
            "quit" => break,
            _ => {}
        }
    }
}

fn handle_position(parts: &[&str]) -> Option<GameState> {
    let mut game = match parts.get(1) {
        Some(&"startpos") => GameState::new(None),
        Some(&"fen") => {
            let end = parts
                .iter()
                .position(|&part| part == "moves")
                .unwrap_or(parts.len());
            let fen = parts.get(2..end)?.join(" ");
            GameState::new(Some(&fen))
        }
        _ => return None,
    };

    if let Some(moves_index) = parts.iter().position(|&part| part == "moves") {
        for token in &parts[moves_index + 1..] {
            let Some(mv) = parse_uci_move(token) else {
                eprintln!("unparseable move: {token}");
                return None;
            };
            let before = game.moves_history().len();
            game.update_board_state(mv);
            if game.moves_history().len() == before {
                eprintln!("illegal move: {token}");
                return None;
            }
        }
    }
    Some(game)
}

/// "e2e4" or "e7e8q" → a bare move the driver can enrich with flags.
fn parse_uci_move(token: &str) -> Option<Move> {
    if token.len() != 4 && token.len() != 5 {
        return None;
    }
    let origin = Square::from_algebraic(&token[..2]).ok()?;
    let destination = Square::from_algebraic(&token[2..4]).ok()?;

    if token.len() == 5 {
        let promotion = match token.as_bytes()[4] {
            b'n' => PROMO_KNIGHT,
            b'b' => PROMO_BISHOP,
            b'r' => PROMO_ROOK,
            b'q' => PROMO_QUEEN,
            _ => return None,
        };
        return Some(Move::new(origin, destination, promotion, FLAG_PROMOTION));
    }
    Some(Move::new(origin, destination, 0, FLAG_NONE))
}

fn handle_go(parts: &[&str], game: &mut GameState, engine: &mut Engine) {
    let mut index = 1;
    while index < parts.len() {
        match parts[index] {
            "depth" => {
                if let Some(depth) = parts.get(index + 1).and_then(|v| v.parse().ok()) {
                    engine.set_depth_limit(depth);
                }
                index += 2;
            }
            "movetime" => {
                if let Some(millis) = parts.get(index + 1).and_then(|v| v.parse().ok()) {
                    engine.set_time_limit(Duration::from_millis(millis));
                }
                index += 2;
            }
            _ => index += 1,
        }
    }

    let started = Instant::now();
    let (best, depth) = engine.find_best_move(
        game.boards(),
        &game.zobrist_key_history(),
        game.moves_history(),
    );

    match best {
        Some(mv) => {
            println!(
                "info depth {} time {}",
                depth,
                started.elapsed().as_millis()
            );
            println!("bestmove {mv}");
        }
        None => println!("bestmove 0000"),
    }
}

fn handle_perft(parts: &[&str], game: &GameState) {
    let depth: u32 = match parts.get(1).and_then(|v| v.parse().ok()) {
        Some(depth) => depth,
        None => {
            eprintln!("usage: perft <depth>");
            return;
        }
    };

    let board: &Position = game.boards();
    let root_moves = generate_legal_moves(board, MoveType::Normal);

    let bar = ProgressBar::new(root_moves.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}") {
        bar.set_style(style);
    }

    let started = Instant::now();
    let mut total = 0u64;
    for mv in root_moves {
        let nodes = if depth <= 1 {
            1
        } else {
            perft(&applied(board, mv), depth - 1)
        };
        bar.inc(1);
        bar.set_message(mv.to_string());
        println!("{mv}: {nodes}");
        total += nodes;
    }
    bar.finish_and_clear();

    let seconds = started.elapsed().as_secs_f64();
    println!("Nodes: {total}");
    println!("Time: {seconds:.3}s");
}
