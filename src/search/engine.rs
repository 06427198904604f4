//! Iterative-deepening negamax with alpha-beta pruning, a transposition
//! table, quiescence search and check extensions, cancelled cooperatively
//! by a timer thread through a shared atomic flag.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::board::Position;
use crate::book::OpeningBook;
use crate::moves::execute::applied;
use crate::moves::movegen::{MoveType, generate_legal_moves};
use crate::moves::square_control::is_king_in_check;
use crate::moves::types::Move;
use crate::search::eval::{INFINITY, MATE_SCORE, NEGATIVE_MATE_SCORE, evaluate};
use crate::search::ordering::order_moves;
use crate::search::tt::{NodeType, TranspositionTable};

/// Captures explored past the horizon before quiescence settles for the
/// stand-pat score.
const QUIESCENCE_DEPTH: u32 = 20;

/// Extending every check forever could run away in perpetual-check lines.
const MAX_CHECK_EXTENSIONS: u32 = 10;

/// How often the timer thread looks at the clock.
const TIMER_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Probe the opening book before searching.
    pub use_book: bool,
    pub book_path: PathBuf,
    /// Wall-clock budget per move.
    pub time_limit: Duration,
    /// Hard cap on iterative-deepening depth; time is the practical limit.
    pub depth_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            use_book: false,
            book_path: PathBuf::from("book/book.csv"),
            time_limit: Duration::from_millis(3000),
            depth_limit: 100,
        }
    }
}

pub struct Engine {
    book: Option<OpeningBook>,
    table: TranspositionTable,
    time_limit: Duration,
    depth_limit: u32,
    current_iterative_depth: u32,
    depth_searched: u32,
    count_transpositions: u64,
    count_max_check_extensions: u32,
    run_search: Arc<AtomicBool>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let book = if config.use_book {
            match OpeningBook::load(&config.book_path) {
                Ok(book) => Some(book),
                Err(reason) => {
                    error!(path = %config.book_path.display(), %reason,
                        "failed to load the opening book, continuing without it");
                    None
                }
            }
        } else {
            None
        };

        Engine {
            book,
            table: TranspositionTable::new(),
            time_limit: config.time_limit,
            depth_limit: config.depth_limit,
            current_iterative_depth: 0,
            depth_searched: 0,
            count_transpositions: 0,
            count_max_check_extensions: 0,
            run_search: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_time_limit(&mut self, limit: Duration) {
        self.time_limit = limit;
    }

    pub fn set_depth_limit(&mut self, limit: u32) {
        self.depth_limit = limit;
    }

    /// Pick a move for the side to move. `zobrist_history` are the keys of
    /// the ancestor positions (repetition avoidance), `moves_history` the
    /// moves played so far (book lookup). Returns the move and the depth it
    /// was searched to; `None` means the game is already over. A book move
    /// reports depth 0.
    pub fn find_best_move(
        &mut self,
        boards: &Position,
        zobrist_history: &[u64],
        moves_history: &[Move],
    ) -> (Option<Move>, u32) {
        info!(half_move_count = boards.half_move_count, "searching for the best move");

        if self.book.is_some() {
            if let Some(book_move) = self.legal_book_move(boards, moves_history) {
                info!(%book_move, "playing from the opening book");
                return (Some(book_move), 0);
            }
        }

        self.run_search.store(true, Ordering::SeqCst);
        let timer = self.spawn_timer();

        let mut best_move = Move::NULL;
        self.depth_searched = 0;

        for depth in 1..=self.depth_limit {
            if !self.searching() {
                break;
            }
            self.current_iterative_depth = depth;
            let (iteration_best, found_shortest_mate) =
                self.iterative_deepening(boards, depth, zobrist_history);

            self.depth_searched = depth;
            // Even a cancelled iteration may be adopted: ordering guarantees
            // the previous best was searched first, so a new best move here
            // was searched to its leaves. A null move only appears when the
            // very first iteration was cancelled before any score landed.
            if iteration_best.is_null() {
                continue;
            }
            best_move = iteration_best;
            if found_shortest_mate {
                break;
            }
        }

        info!(
            transpositions = self.count_transpositions,
            max_check_extensions = self.count_max_check_extensions,
            depth = self.depth_searched,
            "search finished"
        );

        self.run_search.store(false, Ordering::SeqCst);
        if let Err(reason) = timer.join() {
            error!(?reason, "timer thread panicked");
        }

        let best = if best_move.is_null() { None } else { Some(best_move) };
        (best, self.depth_searched)
    }

    /// One full-width pass over the root moves at `depth`. Returns the best
    /// move and whether it is a shortest mate (in which case deeper
    /// iterations cannot improve on it).
    fn iterative_deepening(
        &mut self,
        boards: &Position,
        depth: u32,
        zobrist_history: &[u64],
    ) -> (Move, bool) {
        let moves = generate_legal_moves(boards, MoveType::Normal);

        let mut best_evaluation = NEGATIVE_MATE_SCORE;
        let mut best_move = Move::NULL;
        let mut found_shortest_mate = false;

        for mv in self.order(moves, boards) {
            let next = applied(boards, mv);
            let mut evaluation = 0;

            // Any recurrence of an ancestor key scores as a dead draw.
            if !zobrist_history.contains(&next.zobrist) {
                let extension = u32::from(is_king_in_check(&next, next.side_to_move));
                evaluation = -self.negamax(
                    &next,
                    depth as i32 - 1 + extension as i32,
                    -INFINITY,
                    -best_evaluation,
                    extension,
                    zobrist_history,
                );
            }

            // A cancelled recursion never reached the leaves; its score is
            // garbage and the iteration stops here.
            if !self.searching() {
                break;
            }

            if evaluation > best_evaluation {
                best_evaluation = evaluation;
                best_move = mv;
            }

            if best_evaluation >= MATE_SCORE - self.current_iterative_depth as i32 {
                found_shortest_mate = true;
                break;
            }
        }

        // Store only completed iterations; the entry seeds move ordering for
        // the next depth.
        if self.searching() && !best_move.is_null() {
            self.table
                .store(boards.zobrist, best_evaluation, depth, NodeType::Exact, best_move);
            info!(depth, evaluation = best_evaluation, "iteration complete");
        }

        (best_move, found_shortest_mate)
    }

    fn negamax(
        &mut self,
        boards: &Position,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
        num_check_extensions: u32,
        zobrist_history: &[u64],
    ) -> i32 {
        if !self.searching() {
            return -INFINITY;
        }

        let previous_alpha = alpha;

        if let Some(entry) = self.table.get_entry(boards.zobrist).copied() {
            if entry.depth >= depth as u32 {
                self.count_transpositions += 1;
                match entry.node_type {
                    NodeType::Exact => return entry.evaluation,
                    NodeType::Lower => alpha = alpha.max(entry.evaluation),
                    NodeType::Upper => beta = beta.min(entry.evaluation),
                    // Never stored; a hit here means the slot is corrupt.
                    NodeType::None => error!("transposition entry with node type none"),
                }
                if alpha >= beta {
                    return entry.evaluation;
                }
            }
        }

        if depth == 0 {
            // Still our move, so the window is passed through unnegated.
            return self.quiescence(boards, alpha, beta, QUIESCENCE_DEPTH);
        }

        let moves = generate_legal_moves(boards, MoveType::Normal);
        if moves.is_empty() {
            return self.evaluate_end_game(boards, depth, num_check_extensions);
        }

        let mut best_evaluation = -INFINITY;
        let mut best_move = Move::NULL;

        for mv in self.order(moves, boards) {
            let next = applied(boards, mv);
            let mut evaluation = 0;

            if !zobrist_history.contains(&next.zobrist) {
                let mut extension = 0u32;
                if num_check_extensions < MAX_CHECK_EXTENSIONS {
                    extension = u32::from(is_king_in_check(&next, next.side_to_move));
                }
                self.count_max_check_extensions =
                    self.count_max_check_extensions.max(num_check_extensions);

                evaluation = -self.negamax(
                    &next,
                    depth - 1 + extension as i32,
                    -beta,
                    -alpha,
                    num_check_extensions + extension,
                    zobrist_history,
                );
            }

            if evaluation > best_evaluation {
                best_evaluation = evaluation;
                best_move = mv;
                alpha = alpha.max(evaluation);
            }

            if alpha >= beta {
                break;
            }
        }

        // Store only when the subtree was fully scored; a cancelled search
        // must not poison the table.
        if self.searching() && !best_move.is_null() {
            let node_type = if best_evaluation <= previous_alpha {
                NodeType::Upper
            } else if best_evaluation >= beta {
                NodeType::Lower
            } else {
                NodeType::Exact
            };
            self.table
                .store(boards.zobrist, best_evaluation, depth as u32, node_type, best_move);
        }

        best_evaluation
    }

    /// Resolve captures past the horizon. Stand-pat embodies the option to
    /// decline every capture and accept the static score.
    fn quiescence(&mut self, boards: &Position, mut alpha: i32, beta: i32, depth: u32) -> i32 {
        if !self.searching() {
            return -INFINITY;
        }

        let stand_pat = evaluate(boards);
        if stand_pat >= beta {
            return beta;
        }
        alpha = alpha.max(stand_pat);

        if depth == 0 {
            return stand_pat;
        }

        let captures = generate_legal_moves(boards, MoveType::Capture);
        for mv in self.order(captures, boards) {
            let next = applied(boards, mv);
            let evaluation = -self.quiescence(&next, -beta, -alpha, depth - 1);

            if evaluation >= beta {
                return beta;
            }
            alpha = alpha.max(evaluation);
        }

        alpha
    }

    /// Value of a position with no legal moves: mated or stalemated. The
    /// depth terms make nearer mates score higher, so the search prefers
    /// the shortest mate it knows about.
    fn evaluate_end_game(
        &self,
        boards: &Position,
        depth: i32,
        num_check_extensions: u32,
    ) -> i32 {
        if is_king_in_check(boards, boards.side_to_move) {
            return NEGATIVE_MATE_SCORE
                + (self.current_iterative_depth + num_check_extensions) as i32
                - depth;
        }
        0
    }

    fn order(&self, moves: Vec<Move>, boards: &Position) -> Vec<Move> {
        let hash_move = self
            .table
            .get_entry(boards.zobrist)
            .map(|entry| entry.best_move)
            .unwrap_or(Move::NULL);
        order_moves(moves, boards, hash_move)
    }

    fn legal_book_move(&self, boards: &Position, moves_history: &[Move]) -> Option<Move> {
        let candidate = self.book.as_ref()?.get_book_move(moves_history)?;

        // The book stores bare square pairs; return the generated move so
        // castling and en passant flags are set.
        for generated in generate_legal_moves(boards, MoveType::Normal) {
            if candidate.loose_eq(generated) {
                return Some(generated);
            }
        }
        warn!(%candidate, "book move is not legal in the current position");
        None
    }

    #[inline(always)]
    fn searching(&self) -> bool {
        self.run_search.load(Ordering::Acquire)
    }

    /// The timer polls the clock until the budget runs out, then clears the
    /// shared flag; the search notices at its next recursion entry.
    fn spawn_timer(&self) -> thread::JoinHandle<()> {
        let run_search = Arc::clone(&self.run_search);
        let time_limit = self.time_limit;
        thread::spawn(move || {
            let start = Instant::now();
            while run_search.load(Ordering::Acquire) {
                if start.elapsed() >= time_limit {
                    run_search.store(false, Ordering::SeqCst);
                    return;
                }
                thread::sleep(TIMER_POLL_INTERVAL);
            }
        })
    }
}
