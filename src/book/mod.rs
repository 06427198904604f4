//! Opening book: a CSV file with one game per line, moves written as bare
//! square pairs ("e2e4"). The games are folded into a trie; probing walks
//! the moves played so far and picks a uniformly random continuation.
//! Promotions are not representable in the square-pair notation and are
//! simply never matched.

use std::fs;
use std::io;
use std::path::Path;

use rand::Rng;
use tracing::{error, info};

use crate::moves::types::{FLAG_NONE, Move};
use crate::square::Square;

#[derive(Debug)]
struct BookEntry {
    mv: Move,
    continuations: Vec<BookEntry>,
}

impl BookEntry {
    fn new(mv: Move) -> Self {
        BookEntry {
            mv,
            continuations: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct OpeningBook {
    root: BookEntry,
    games: usize,
}

impl OpeningBook {
    /// Read a book file. Any malformed token disables the whole book: the
    /// caller logs the error and plays without one.
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let contents = fs::read_to_string(&path)?;

        let mut book = OpeningBook {
            root: BookEntry::new(Move::NULL),
            games: 0,
        };

        for (line_number, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut game = Vec::new();
            for token in line.split(',') {
                let mv = parse_square_pair(token.trim()).map_err(|reason| {
                    error!(line = line_number + 1, token, %reason, "unparseable book move");
                    io::Error::new(io::ErrorKind::InvalidData, reason)
                })?;
                game.push(mv);
            }
            book.insert_game(&game);
            book.games += 1;
        }

        info!(games = book.games, "opening book loaded");
        Ok(book)
    }

    fn insert_game(&mut self, moves: &[Move]) {
        let mut node = &mut self.root;
        for &mv in moves {
            let index = match node
                .continuations
                .iter()
                .position(|entry| entry.mv.loose_eq(mv))
            {
                Some(index) => index,
                None => {
                    node.continuations.push(BookEntry::new(mv));
                    node.continuations.len() - 1
                }
            };
            node = &mut node.continuations[index];
        }
    }

    /// Follow the played moves through the trie and return a random known
    /// continuation, if the line is still in book.
    pub fn get_book_move(&self, moves_history: &[Move]) -> Option<Move> {
        let mut node = &self.root;
        for &played in moves_history {
            node = node
                .continuations
                .iter()
                .find(|entry| entry.mv.loose_eq(played))?;
        }

        if node.continuations.is_empty() {
            return None;
        }
        let pick = rand::rng().random_range(0..node.continuations.len());
        Some(node.continuations[pick].mv)
    }

    /// Number of games folded into the trie.
    pub fn game_count(&self) -> usize {
        self.games
    }
}

/// "e2e4" → a bare move with no flags; flags are recovered later by
/// matching against generated legal moves.
fn parse_square_pair(token: &str) -> Result<Move, String> {
    if token.len() != 4 {
        return Err(format!("book move '{token}' is not four characters"));
    }
    let origin = Square::from_algebraic(&token[..2])?;
    let destination = Square::from_algebraic(&token[2..])?;
    Ok(Move::new(origin, destination, 0, FLAG_NONE))
}
