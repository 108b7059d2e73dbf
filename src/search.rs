/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::Neg,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use arrayvec::ArrayVec;
use uci_parser::{UciInfo, UciResponse, UciSearchOptions};

use crate::{
    tune, CounterMoveTable, EvalWeights, Evaluator, Game, GameClock, HistoryTable, KillerTable,
    Move, MovePicker, OpeningBook, PieceKind, Score, TTable, TTableEntry, MAX_NUM_MOVES, MVV_LVA,
};

/// Maximum depth that can be searched.
pub const MAX_DEPTH: u8 = 127;

/// Maximum ply a search path may reach, check extensions and quiescence
/// included.
pub const MAX_PLY: i32 = 255;

/// A marker trait for the types of nodes encountered during search.
trait NodeType {
    /// Is this node the first searched?
    const ROOT: bool;

    /// Is this node on the principal variation?
    const PV: bool;
}

/// The first node searched.
struct RootNode;
impl NodeType for RootNode {
    const ROOT: bool = true;
    const PV: bool = true;
}

/// A node on the principal variation, searched with a full window.
struct PvNode;
impl NodeType for PvNode {
    const ROOT: bool = false;
    const PV: bool = true;
}

/// A node off the principal variation, searched with a null window.
struct NonPvNode;
impl NodeType for NonPvNode {
    const ROOT: bool = false;
    const PV: bool = false;
}

/// Bounds within an alpha-beta search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBounds {
    /// Lower bound: we are guaranteed a score of at least `alpha`.
    pub alpha: Score,

    /// Upper bound: our opponent can hold us to at most `beta`.
    pub beta: Score,
}

impl SearchBounds {
    /// Creates new [`SearchBounds`] from the provided `alpha` and `beta`.
    #[inline(always)]
    pub const fn new(alpha: Score, beta: Score) -> Self {
        Self { alpha, beta }
    }

    /// Creates a null window just above `alpha`.
    #[inline(always)]
    fn null_alpha(self) -> Self {
        Self::new(self.alpha, self.alpha + 1)
    }
}

impl Neg for SearchBounds {
    type Output = Self;
    /// Negating bounds swaps and negates both, for the opponent's view.
    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self {
            alpha: -self.beta,
            beta: -self.alpha,
        }
    }
}

impl Default for SearchBounds {
    /// Default bounds are `(-infinity, infinity)`.
    #[inline(always)]
    fn default() -> Self {
        Self::new(Score::ALPHA, Score::BETA)
    }
}

/// A window around an expected score, used as the alpha-beta bounds of the
/// next iteration.
///
/// See [Aspiration Windows](https://www.chessprogramming.org/Aspiration_Windows).
#[derive(Debug)]
struct AspirationWindow {
    /// Bounds of this search window.
    bounds: SearchBounds,

    /// Number of times a score came back at or above beta.
    beta_fails: i32,

    /// Number of times a score came back at or below alpha.
    alpha_fails: i32,
}

impl AspirationWindow {
    /// The window half-width for a search at `depth`; narrower when deeper.
    #[inline(always)]
    fn delta(depth: u8) -> Score {
        let initial = tune::initial_aspiration_window_delta!();
        let min = tune::min_aspiration_window_delta!();

        Score::new(((initial << 3) / depth as i32).max(min))
    }

    /// Creates a window centered on `score`.
    #[inline(always)]
    fn new(score: Score, depth: u8) -> Self {
        // Mate scores fluctuate between iterations, and shallow searches are
        // too cheap to be worth re-searching; both get a full-width window.
        let bounds = if depth < tune::min_aspiration_window_depth!() || score.is_mate() {
            SearchBounds::default()
        } else {
            let delta = Self::delta(depth);
            SearchBounds::new(
                (score - delta).max(Score::ALPHA),
                (score + delta).min(Score::BETA),
            )
        };

        Self {
            bounds,
            alpha_fails: 0,
            beta_fails: 0,
        }
    }

    /// Expands the window downwards after a fail low.
    #[inline(always)]
    fn widen_down(&mut self, score: Score, depth: u8) {
        let delta = Self::delta(depth) * (1 << (self.alpha_fails + 1));

        // By convention, a fail low also pulls beta towards the center.
        self.bounds.beta = ((self.bounds.alpha + self.bounds.beta) / 2).min(Score::BETA);
        self.bounds.alpha = (score - delta).max(Score::ALPHA);

        self.alpha_fails += 1;
    }

    /// Expands the window upwards after a fail high.
    #[inline(always)]
    fn widen_up(&mut self, score: Score, depth: u8) {
        let delta = Self::delta(depth) * (1 << (self.beta_fails + 1));

        self.bounds.beta = (score + delta).min(Score::BETA);

        self.beta_fails += 1;
    }

    /// Returns `true` if `score` fell at or below this window's alpha.
    #[inline(always)]
    fn fails_low(&self, score: Score) -> bool {
        self.bounds.alpha != Score::ALPHA && score <= self.bounds.alpha
    }

    /// Returns `true` if `score` fell at or above this window's beta.
    #[inline(always)]
    fn fails_high(&self, score: Score) -> bool {
        self.bounds.beta != Score::BETA && score >= self.bounds.beta
    }
}

/// The result of a search: the best move found, its score, and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    /// Number of nodes searched.
    pub nodes: u64,

    /// Best move found.
    ///
    /// `None` only if the root position has no legal moves.
    pub bestmove: Option<Move>,

    /// Score of `bestmove`, from the root player's perspective.
    pub score: Score,

    /// Depth of the deepest fully-completed iteration.
    pub depth: u8,
}

impl Default for SearchResult {
    /// Defaults to the worst possible score and no move.
    #[inline(always)]
    fn default() -> Self {
        Self {
            nodes: 0,
            bestmove: None,
            score: Score::ALPHA,
            depth: 1,
        }
    }
}

/// Configuration variables for executing a [`Search`].
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Maximum depth to search to.
    pub max_depth: u8,

    /// Node allowance; the search exits once this many nodes were visited.
    pub max_nodes: u64,

    /// Start time of the search.
    pub starttime: Instant,

    /// Soft time limit: no new iteration starts after this has elapsed.
    pub soft_timeout: Duration,

    /// Hard time limit: the search cancels once this has elapsed.
    pub hard_timeout: Duration,
}

impl SearchConfig {
    /// Builds a config from UCI `go` options, using the [`GameClock`] policy
    /// to allocate time when playing on a clock.
    pub fn new(options: UciSearchOptions, game: &Game) -> Self {
        let mut config = Self::default();

        if let Some(depth) = options.depth {
            config.max_depth = depth as u8;
        }

        if let Some(nodes) = options.nodes {
            config.max_nodes = nodes as u64;
        }

        if let Some(movetime) = options.movetime {
            config.soft_timeout = movetime;
            config.hard_timeout = movetime;
        } else {
            let (time, inc) = if game.side_to_move().is_white() {
                (options.wtime, options.winc)
            } else {
                (options.btime, options.binc)
            };

            if let Some(time) = time {
                let clock = GameClock::new(time, inc.unwrap_or(Duration::ZERO));
                let budget = clock.budget_for_move();

                config.soft_timeout = budget.soft;
                config.hard_timeout = budget.hard;
            }
        }

        config
    }
}

impl Default for SearchConfig {
    /// A default config permits an effectively infinite search.
    #[inline(always)]
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_nodes: u64::MAX,
            starttime: Instant::now(),
            soft_timeout: Duration::MAX,
            hard_timeout: Duration::MAX,
        }
    }
}

/// Executes one search over a game of chess.
///
/// Owns all per-search state: node counters and the move-ordering heuristics,
/// which start empty on every root call. The transposition table is borrowed
/// from the engine and persists across searches. Nothing here is shared, so
/// any number of searches may run on separate games in parallel.
pub struct Search<'a> {
    /// Number of nodes searched so far.
    nodes: u64,

    /// Set once the search has run out of time or been stopped; after this,
    /// every non-root node returns immediately.
    stopped: bool,

    /// Best root move of the current iteration.
    bestmove: Option<Move>,

    /// An external cancellation flag (the UCI `stop` command).
    is_searching: Arc<AtomicBool>,

    /// Configuration variables for this search.
    config: SearchConfig,

    /// Keys of every position reached on the path here, including the game
    /// history before the root. Bounds repetition detection.
    prev_keys: Vec<crate::ZobristKey>,

    /// Transposition table, shared across searches of one engine.
    ttable: &'a mut TTable,

    /// Evaluation weights to score leaves with.
    weights: EvalWeights,

    /// History heuristic scores, cleared per root call.
    history: HistoryTable,

    /// Killer moves per ply, cleared per root call.
    killers: KillerTable,

    /// Countermove table, cleared per root call.
    countermoves: CounterMoveTable,

    /// Opening book and the move line to probe it with.
    book: Option<Arc<dyn OpeningBook>>,
    book_line: Vec<u16>,

    /// Game ply of the root position, used as the age of stored TT entries.
    age: u16,
}

impl<'a> Search<'a> {
    /// Constructs a new [`Search`] to execute.
    pub fn new(
        is_searching: Arc<AtomicBool>,
        config: SearchConfig,
        prev_keys: Vec<crate::ZobristKey>,
        ttable: &'a mut TTable,
    ) -> Self {
        Self {
            nodes: 0,
            stopped: false,
            bestmove: None,
            is_searching,
            config,
            prev_keys,
            ttable,
            weights: EvalWeights::default(),
            history: HistoryTable::default(),
            killers: KillerTable::default(),
            countermoves: CounterMoveTable::default(),
            book: None,
            book_line: Vec::new(),
            age: 0,
        }
    }

    /// Replaces the default evaluation weights.
    #[inline(always)]
    pub fn with_weights(mut self, weights: EvalWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Attaches an opening book, to be probed with `line` before searching.
    #[inline(always)]
    pub fn with_book(mut self, book: Arc<dyn OpeningBook>, line: Vec<u16>) -> Self {
        self.book = Some(book);
        self.book_line = line;
        self
    }

    /// Starts the search, returning the best result found.
    ///
    /// Consults the opening book first; above the confidence threshold a book
    /// move is returned without any tree search. Sends UCI `info` lines while
    /// deepening and a `bestmove` when finished.
    pub fn start(mut self, game: &Game) -> SearchResult {
        self.age = game.ply() as u16;

        let result = if let Some(result) = self.probe_book(game) {
            result
        } else {
            self.iterative_deepening(game)
        };

        self.send_response(UciResponse::BestMove {
            bestmove: result.bestmove,
            ponder: None,
        });

        // Alert other threads that the search has concluded.
        self.is_searching.store(false, Ordering::Relaxed);

        result
    }

    /// Looks the current line up in the opening book.
    ///
    /// A recommendation is followed only if its sample count meets the
    /// confidence threshold and it matches a legal move.
    fn probe_book(&self, game: &Game) -> Option<SearchResult> {
        let book = self.book.as_deref()?;
        let candidate = book.probe(&self.book_line)?;

        if candidate.samples < tune::book_confidence_threshold!() {
            return None;
        }

        let mv = game
            .get_legal_moves()
            .into_iter()
            .find(|mv| mv.inner() == candidate.mv)?;

        Some(SearchResult {
            bestmove: Some(mv),
            score: Score::DRAW,
            nodes: 0,
            depth: 0,
        })
    }

    /// Performs [iterative deepening](https://www.chessprogramming.org/Iterative_Deepening),
    /// re-searching at increasing depth until time, the depth limit, or a
    /// mate score stops it.
    ///
    /// Returns the result of the deepest *completed* iteration; a cancelled
    /// iteration is discarded. While any legal move exists, a move is
    /// returned.
    fn iterative_deepening(&mut self, game: &Game) -> SearchResult {
        // The search descends with make/unmake on its own copy.
        let mut game = *game;

        let mut result = SearchResult {
            bestmove: game.get_legal_moves().first().copied(),
            ..Default::default()
        };

        'deepening: while self.config.starttime.elapsed() < self.config.soft_timeout
            && self.is_searching.load(Ordering::Relaxed)
            && result.depth <= self.config.max_depth
            && (result.depth == 1 || !result.score.is_mate())
        {
            let mut window = AspirationWindow::new(result.score, result.depth);

            let score = 'aspiration: loop {
                let score = self.negamax::<RootNode>(
                    &mut game,
                    result.depth,
                    0,
                    window.bounds,
                    0,
                    None,
                );

                // Widen the window until the score fits inside it.
                if window.fails_low(score) {
                    window.widen_down(score, result.depth);
                } else if window.fails_high(score) {
                    window.widen_up(score, result.depth);
                } else {
                    break 'aspiration score;
                }

                if self.stopped {
                    break 'deepening;
                }
            };

            // A cancelled iteration did not finish; fall back to the last
            // completed one.
            if self.stopped {
                break 'deepening;
            }

            result.score = score;
            result.bestmove = self.bestmove.or(result.bestmove);
            result.nodes = self.nodes;

            self.send_search_info(&result);

            result.depth += 1;
        }

        result.nodes = self.nodes;
        result
    }

    /// The recursive alpha-beta search, in the
    /// [negamax](https://www.chessprogramming.org/Negamax) formulation with a
    /// fail-soft framework and principal variation search.
    fn negamax<Node: NodeType>(
        &mut self,
        game: &mut Game,
        mut depth: u8,
        ply: i32,
        mut bounds: SearchBounds,
        ext: u8,
        last_move: Option<Move>,
    ) -> Score {
        self.nodes += 1;

        // Cooperative time-boxing: consult the clock at a fixed node cadence.
        if self.nodes % tune::nodes_between_time_checks!() == 0 {
            self.check_limits();
        }

        // Once out of time, every node below the root bails out immediately;
        // the root discards the unfinished iteration.
        if self.stopped && !Node::ROOT {
            return Score::DRAW;
        }

        // Draw detection. Not at the root: the root must produce a move.
        if !Node::ROOT && (self.is_repetition(game) || game.can_draw_by_fifty()) {
            return Score::DRAW;
        }

        // The frontier hands off to quiescence search.
        if depth == 0 || ply >= MAX_PLY {
            return self.quiescence(game, ply, bounds);
        }

        /*
         * Transposition table: a previously-stored result from at least this
         * depth may cut off immediately (outside the PV). Failing even to
         * find an entry means this node was never visited before, so a deep
         * search here is probably mis-ordered: reduce it by one ply
         * (internal iterative reductions).
         */
        let tt_entry = self.ttable.get(&game.key()).copied();
        if !Node::PV {
            if let Some(entry) = &tt_entry {
                if entry.depth >= depth {
                    if let Some(score) = entry.try_score(bounds, ply) {
                        return score;
                    }
                }
            }
        }

        if tt_entry.is_none() && depth > tune::min_iir_depth!() {
            depth -= 1;
        }

        let in_check = game.is_in_check();
        let static_eval = Evaluator::new(game, &self.weights).eval();

        /*
         * Reverse futility pruning: if the static eval beats beta by a
         * depth-scaled margin, the opponent would never allow this position;
         * return without generating a single move.
         */
        if !Node::PV && !in_check && depth <= tune::max_rfp_depth!() {
            let margin = Score::new(tune::rfp_margin!() * depth as i32);
            if static_eval - margin >= bounds.beta {
                return static_eval;
            }
        }

        let moves = game.get_legal_moves();

        // No legal moves is either mate or stalemate. Offsetting mate by ply
        // makes shorter mates score better.
        if moves.is_empty() {
            return if in_check {
                -Score::MATE + ply
            } else {
                Score::DRAW
            };
        }

        /*
         * Move ordering: hash move first, then captures by MVV-LVA, then the
         * killers of this ply, then the countermove to the opponent's last
         * move, then quiets by history score.
         */
        let num_moves = moves.len();
        let tt_move = tt_entry.map(|entry| entry.bestmove);
        let killers = self.killers.get(ply);
        let countermove = last_move.and_then(|lm| {
            game.board()
                .piece_at(lm.to())
                .and_then(|piece| self.countermoves.get(piece, lm.to()))
        });

        let picker = MovePicker::new(moves, |mv| {
            self.score_move(game, mv, tt_move, killers, countermove)
        });

        /*
         * Futility pruning: close to the frontier, with a static eval so far
         * below alpha that no quiet move can recover, only captures,
         * promotions, and checking moves are worth searching.
         */
        let futility_applies = !Node::ROOT
            && !in_check
            && num_moves > 1
            && depth <= tune::max_futility_depth!()
            && static_eval + futility_margin(depth) <= bounds.alpha;

        let mut best = Score::ALPHA;
        let mut bestmove = Move::illegal();
        let original_alpha = bounds.alpha;
        let mut searched_quiets: ArrayVec<Move, MAX_NUM_MOVES> = ArrayVec::new();

        // This node's key joins the line for everything searched below it,
        // keeping the line's entries strictly *before* whichever node is
        // asking about repetitions.
        self.prev_keys.push(game.key());

        for (i, (mv, _)) in picker.enumerate() {
            if i == 0 {
                bestmove = mv;
            }

            let undo = game.make_move(mv);
            let gives_check = game.is_in_check();

            if futility_applies
                && i > 0
                && mv.is_quiet()
                && mv.promotion().is_none()
                && !gives_check
            {
                game.unmake_move(mv, undo);
                continue;
            }

            /*
             * Check extensions: at the last ply before quiescence, a move
             * that delivers or escapes check is searched one ply deeper,
             * within a per-path budget.
             */
            let new_depth = if depth == 1
                && ext < tune::max_check_extensions!()
                && (in_check || gives_check)
            {
                depth
            } else {
                depth - 1
            };
            let new_ext = ext + (new_depth == depth) as u8;

            /*
             * Principal variation search: the first move gets the full
             * window. Every later move gets a null window first, and is only
             * re-searched at full width when its score lands strictly inside
             * (alpha, beta).
             */
            let mut score;
            if Node::PV && i == 0 {
                score =
                    -self.negamax::<PvNode>(game, new_depth, ply + 1, -bounds, new_ext, Some(mv));
            } else {
                score = -self.negamax::<NonPvNode>(
                    game,
                    new_depth,
                    ply + 1,
                    -bounds.null_alpha(),
                    new_ext,
                    Some(mv),
                );

                if Node::PV && score > bounds.alpha && score < bounds.beta {
                    score = -self.negamax::<PvNode>(
                        game,
                        new_depth,
                        ply + 1,
                        -bounds,
                        new_ext,
                        Some(mv),
                    );
                }
            }

            game.unmake_move(mv, undo);

            // A score propagated through a cancelled subtree is garbage.
            if self.stopped {
                break;
            }

            if score > best {
                best = score;

                if score > bounds.alpha {
                    bounds.alpha = score;
                    bestmove = mv;

                    if Node::ROOT {
                        self.bestmove = Some(mv);
                    }
                }

                if score >= bounds.beta {
                    /*
                     * A quiet move that fails high gets remembered three
                     * ways: as a killer of this ply, as the countermove to
                     * the opponent's last move, and with a depth-scaled
                     * history bonus. The quiets searched before it clearly
                     * did less, and are penalized.
                     */
                    if mv.is_quiet() {
                        self.killers.insert(ply, mv);

                        if let Some(lm) = last_move {
                            if let Some(piece) = game.board().piece_at(lm.to()) {
                                self.countermoves.insert(piece, lm.to(), mv);
                            }
                        }

                        let bonus = depth as i32 * depth as i32;
                        self.history.update(game, &mv, bonus);
                        for quiet in &searched_quiets {
                            self.history.update(game, quiet, -bonus);
                        }
                    }
                    break;
                }
            }

            if mv.is_quiet() {
                searched_quiets.push(mv);
            }
        }

        self.prev_keys.pop();

        // Store the result, except when a time-abort corrupted everything
        // deeper than the shallowest searches.
        if !(self.stopped && depth != 1) {
            self.ttable.store(TTableEntry::new(
                game.key(),
                bestmove,
                best,
                SearchBounds::new(original_alpha, bounds.beta),
                depth,
                ply,
                self.age,
            ));
        }

        best
    }

    /// [Quiescence search](https://www.chessprogramming.org/Quiescence_Search):
    /// resolves captures (and check evasions) at the frontier so the static
    /// evaluation is never taken in the middle of a tactic.
    fn quiescence(&mut self, game: &mut Game, ply: i32, mut bounds: SearchBounds) -> Score {
        self.nodes += 1;

        if self.nodes % tune::nodes_between_time_checks!() == 0 {
            self.check_limits();
        }
        if self.stopped {
            return Score::DRAW;
        }

        let in_check = game.is_in_check();
        let stand_pat = Evaluator::new(game, &self.weights).eval();

        // The hard cap on total search path length.
        if ply >= MAX_PLY {
            return stand_pat;
        }

        // Standing pat is not an option while in check.
        if !in_check {
            if stand_pat >= bounds.beta {
                return bounds.beta;
            }
            if stand_pat > bounds.alpha {
                bounds.alpha = stand_pat;
            }
        }

        // In check, every evasion matters; otherwise only captures do.
        let moves = if in_check {
            game.get_legal_moves()
        } else {
            game.get_legal_captures()
        };

        if moves.is_empty() {
            // No evasions to a check is mate. No captures is simply quiet.
            return if in_check {
                -Score::MATE + ply
            } else {
                stand_pat
            };
        }

        let picker = MovePicker::new(moves, |mv| self.capture_score(game, mv));

        let mut best = if in_check { Score::ALPHA } else { stand_pat };

        for (mv, _) in picker {
            /*
             * Delta pruning: if even winning the victim outright (plus a
             * safety margin) cannot lift the stand-pat score to alpha, the
             * capture is not worth searching. Disabled while in check.
             */
            if !in_check && mv.is_capture() {
                let victim = game
                    .board()
                    .kind_at(mv.to())
                    .unwrap_or(PieceKind::Pawn)
                    .value();

                if stand_pat + victim + tune::delta_pruning_margin!() <= bounds.alpha {
                    continue;
                }
            }

            // Captures are irreversible, so repetitions cannot occur here;
            // no need to maintain the key line.
            let undo = game.make_move(mv);
            let score = -self.quiescence(game, ply + 1, -bounds);
            game.unmake_move(mv, undo);

            if self.stopped {
                break;
            }

            if score > best {
                best = score;

                if score > bounds.alpha {
                    bounds.alpha = score;
                }

                if score >= bounds.beta {
                    return bounds.beta;
                }
            }
        }

        best
    }

    /// Orders `mv` for the main search. Higher scores are searched first.
    #[inline(always)]
    fn score_move(
        &self,
        game: &Game,
        mv: &Move,
        tt_move: Option<Move>,
        killers: [Option<Move>; 2],
        countermove: Option<Move>,
    ) -> i32 {
        // The hash move is searched before everything else.
        if tt_move == Some(*mv) {
            return i32::MAX;
        }

        if mv.is_capture() {
            return self.capture_score(game, mv);
        }

        if killers[0] == Some(*mv) {
            return tune::first_killer_score!();
        }
        if killers[1] == Some(*mv) {
            return tune::second_killer_score!();
        }
        if countermove == Some(*mv) {
            return tune::countermove_score!();
        }

        // This is a move, so there must be a piece at `from`.
        let piece = game.board().piece_at(mv.from()).unwrap();
        self.history.get(piece, mv.to())
    }

    /// The MVV-LVA score of a capture; zero for quiet moves.
    #[inline(always)]
    fn capture_score(&self, game: &Game, mv: &Move) -> i32 {
        let attacker = game.board().piece_at(mv.from()).unwrap();

        // The en passant victim is not on the destination square.
        if mv.is_en_passant() {
            let victim = crate::Piece::new(attacker.color().opponent(), PieceKind::Pawn);
            return MVV_LVA[attacker.index()][victim.index()];
        }

        match game.board().piece_at(mv.to()) {
            Some(victim) => MVV_LVA[attacker.index()][victim.index()],
            None => 0,
        }
    }

    /// Returns `true` if this position already occurred twice in the key
    /// line since the last irreversible move.
    ///
    /// The line holds every position strictly before this one, so the first
    /// entry back is one ply ago. The walk-back window is the halfmove
    /// clock, so a capture or pawn move always fences it off; within it,
    /// only every second entry can match, since the other player moves in
    /// between.
    fn is_repetition(&self, game: &Game) -> bool {
        let key = game.key();
        let mut repetitions = 0;

        for prev in self
            .prev_keys
            .iter()
            .rev()
            .take(game.halfmove())
            .skip(1)
            .step_by(2)
        {
            if *prev == key {
                repetitions += 1;
                if repetitions == 2 {
                    return true;
                }
            }
        }

        false
    }

    /// Flags the search as stopped once any limit is exceeded.
    #[inline(always)]
    fn check_limits(&mut self) {
        if self.config.starttime.elapsed() >= self.config.hard_timeout
            || !self.is_searching.load(Ordering::Relaxed)
            || self.nodes >= self.config.max_nodes
        {
            self.stopped = true;
        }
    }

    /// Sends a [`UciResponse`] to `stdout`.
    #[inline(always)]
    fn send_response<T: fmt::Display>(&self, response: UciResponse<T>) {
        println!("{response}");
    }

    /// Sends the end-of-iteration `info` line.
    #[inline(always)]
    fn send_search_info(&self, result: &SearchResult) {
        let elapsed = self.config.starttime.elapsed();

        let info = UciInfo::new()
            .depth(result.depth)
            .nodes(result.nodes)
            .score(result.score.into_uci())
            .nps((result.nodes as f32 / elapsed.as_secs_f32()).trunc())
            .time(elapsed.as_millis());

        self.send_response(UciResponse::<String>::Info(Box::new(info)));
    }
}

/// The margin a static eval must close to make quiet moves worth searching
/// at `depth`. Grows with depth.
#[inline(always)]
fn futility_margin(depth: u8) -> Score {
    Score::new(tune::futility_offset!() + tune::futility_multiplier!() * depth as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryBook, FEN_STARTPOS};

    fn run_search(fen: &str, config: SearchConfig) -> SearchResult {
        let is_searching = Arc::new(AtomicBool::new(true));
        let game = fen.parse().unwrap();
        let mut ttable = TTable::default();

        Search::new(is_searching, config, Vec::new(), &mut ttable).start(&game)
    }

    fn ensure_is_mate_in(fen: &str, config: SearchConfig, moves: i32) -> SearchResult {
        let res = run_search(fen, config);
        assert!(
            res.score.is_mate(),
            "Search on {fen:?} produced a result that is not mate.\nResult: {res:#?}"
        );
        assert_eq!(
            res.score.moves_to_mate(),
            moves,
            "Search on {fen:?} produced a result that is not mate in {moves}.\nResult: {res:#?}"
        );
        res
    }

    #[test]
    fn test_white_mate_in_1() {
        let fen = "k7/8/KQ6/8/8/8/8/8 w - - 0 1";
        let config = SearchConfig {
            max_depth: 2,
            ..Default::default()
        };

        let res = ensure_is_mate_in(fen, config, 1);
        assert_eq!(res.bestmove.unwrap().to_string(), "b6a7");
    }

    #[test]
    fn test_black_mated_in_1() {
        let fen = "1k6/8/KQ6/2Q5/8/8/8/8 b - - 0 1";
        let config = SearchConfig {
            max_depth: 3,
            ..Default::default()
        };

        let res = ensure_is_mate_in(fen, config, -1);
        assert_eq!(res.bestmove.unwrap().to_string(), "b8a8");
    }

    #[test]
    fn test_stalemate_scores_draw() {
        let fen = "k7/8/KQ6/8/8/8/8/8 b - - 0 1";
        let config = SearchConfig {
            max_depth: 3,
            ..Default::default()
        };

        let res = run_search(fen, config);
        assert!(res.bestmove.is_none());
        assert_eq!(res.score, Score::DRAW);
    }

    #[test]
    fn test_obvious_capture_promote() {
        // The pawn should capture the queen and promote to a queen itself.
        let fen = "3q1n2/4P3/8/8/8/8/k7/7K w - - 0 1";
        let config = SearchConfig {
            max_depth: 1,
            ..Default::default()
        };

        let res = run_search(fen, config);
        assert_eq!(res.bestmove.unwrap().to_string(), "e7d8q");
    }

    #[test]
    fn test_zero_budget_still_finds_a_move() {
        // With legal moves available, one is always returned, regardless of
        // how little time was given.
        let config = SearchConfig {
            soft_timeout: Duration::ZERO,
            hard_timeout: Duration::ZERO,
            ..Default::default()
        };

        let res = run_search(FEN_STARTPOS, config);
        assert!(res.bestmove.is_some());
    }

    #[test]
    fn test_single_legal_move_is_returned() {
        // Black's king on a8 has exactly one safe square. Any depth must
        // return that move.
        let fen = "k7/8/1R6/8/8/8/8/1R2K3 b - - 0 1";
        let game: Game = fen.parse().unwrap();
        let legal = game.get_legal_moves();
        assert_eq!(legal.len(), 1);

        for max_depth in [1, 3, 6] {
            let config = SearchConfig {
                max_depth,
                ..Default::default()
            };
            let res = run_search(fen, config);
            assert_eq!(res.bestmove, Some(legal[0]));
        }
    }

    #[test]
    fn test_search_is_deterministic() {
        let config = SearchConfig {
            max_depth: 4,
            ..Default::default()
        };

        let first = run_search(crate::FEN_KIWIPETE, config);

        let config = SearchConfig {
            max_depth: 4,
            ..Default::default()
        };
        let second = run_search(crate::FEN_KIWIPETE, config);

        assert_eq!(first.bestmove, second.bestmove);
        assert_eq!(first.score, second.score);
    }

    #[test]
    fn test_threefold_repetition_scores_draw() {
        // Both kings shuffle back and forth twice: the final position has
        // now occurred twice before within the unbroken-by-irreversible-move
        // history, and must be recognized as a repetition draw.
        let mut game = Game::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 0 1").unwrap();
        let mut prev_keys = Vec::new();

        for mv_str in ["e1d1", "e8d8", "d1e1", "d8e8", "e1d1", "e8d8", "d1e1", "d8e8"] {
            prev_keys.push(game.key());
            game.make_move_text(mv_str).unwrap();
        }

        let is_searching = Arc::new(AtomicBool::new(true));
        let mut ttable = TTable::default();
        let config = SearchConfig {
            max_depth: 1,
            ..Default::default()
        };

        let search = Search::new(is_searching, config, prev_keys, &mut ttable);
        assert!(search.is_repetition(&game));

        // A position that never occurred before is not a repetition, no
        // matter what else is in the line.
        let mut fresh = Game::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 0 1").unwrap();
        let keys = vec![fresh.key(), fresh.key(), fresh.key()];
        fresh.make_move_text("h1h8").unwrap();
        fresh.make_move_text("e8d8").unwrap();

        let is_searching = Arc::new(AtomicBool::new(true));
        let mut ttable = TTable::default();
        let search = Search::new(is_searching, SearchConfig::default(), keys, &mut ttable);
        assert!(!search.is_repetition(&fresh));
    }

    #[test]
    fn test_book_move_is_played_without_search() {
        let mut book = InMemoryBook::new();

        // Record the same opening enough times to clear the threshold.
        let mut game = Game::default();
        let e4 = game.make_move_text("e2e4").unwrap();
        for _ in 0..tune::book_confidence_threshold!() {
            book.add_game(&[e4]);
        }

        let is_searching = Arc::new(AtomicBool::new(true));
        let mut ttable = TTable::default();
        let config = SearchConfig::default();

        let res = Search::new(is_searching, config, Vec::new(), &mut ttable)
            .with_book(Arc::new(book), Vec::new())
            .start(&Game::default());

        assert_eq!(res.bestmove, Some(e4));
        assert_eq!(res.nodes, 0);
    }

    #[test]
    fn test_low_confidence_book_move_is_ignored() {
        let mut book = InMemoryBook::new();

        let mut game = Game::default();
        let e4 = game.make_move_text("e2e4").unwrap();
        book.add_game(&[e4]);

        let is_searching = Arc::new(AtomicBool::new(true));
        let mut ttable = TTable::default();
        let config = SearchConfig {
            max_depth: 1,
            ..Default::default()
        };

        let res = Search::new(is_searching, config, Vec::new(), &mut ttable)
            .with_book(Arc::new(book), Vec::new())
            .start(&Game::default());

        // A single recorded game is below the threshold: a real search ran.
        assert!(res.nodes > 0);
    }
}
