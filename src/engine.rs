/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, Sender},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use anyhow::{bail, Context, Result};
use uci_parser::{UciCommand, UciOption, UciParseError, UciResponse};

use crate::{
    splitperft, EngineCommand, EvalWeights, Evaluator, Game, GameClock, Move, OpeningBook, Search,
    SearchConfig, SearchResult, TTable, ZobristKey,
};

/// Default depth at which to run the benchmark searches.
const BENCH_DEPTH: u8 = 5;

/// Positions searched by the `bench` command: the starting position plus a
/// spread of middle-game, tactical, and endgame structures.
const BENCH_FENS: [&str; 6] = [
    crate::FEN_STARTPOS,
    crate::FEN_KIWIPETE,
    "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "8/8/1p1k4/p1p2p2/P1P2P2/1P1K4/8/8 w - - 0 1",
];

/// The engine: an event loop around one [`Game`], a persistent transposition
/// table, and a search thread.
///
/// Commands arrive over a channel, either from `stdin` (UCI or the custom
/// commands in [`EngineCommand`]) or programmatically. Searches run on their
/// own thread and hold the transposition table for their duration, so
/// multiple [`Engine`] instances are fully independent of one another.
pub struct Engine {
    /// The current state of the game, as known to the engine.
    game: Game,

    /// Sending half of the command channel.
    sender: Sender<EngineCommand>,

    /// Receiving half of the command channel.
    receiver: Receiver<EngineCommand>,

    /// Whether a search is currently running.
    is_searching: Arc<AtomicBool>,

    /// Handle to the currently-running search thread, if one exists.
    search_thread: Option<JoinHandle<SearchResult>>,

    /// Transposition table, persistent across searches.
    ttable: Arc<Mutex<TTable>>,

    /// Evaluation weights, supplied at startup.
    weights: EvalWeights,

    /// The engine's clock, updated from `go` commands and after each search.
    clock: GameClock,

    /// When the current search started, for clock bookkeeping.
    search_start: Option<Instant>,

    /// Opening book, if one was attached.
    book: Option<Arc<dyn OpeningBook>>,

    /// Keys of every position played before the current one, for repetition
    /// detection inside the search.
    prev_keys: Vec<ZobristKey>,

    /// Raw encodings of every move played, for probing the opening book.
    move_line: Vec<u16>,
}

impl Engine {
    /// Constructs a new [`Engine`], to be executed with [`Engine::run`].
    pub fn new() -> Self {
        let (sender, receiver) = channel();

        Self {
            game: Game::default(),
            sender,
            receiver,
            is_searching: Arc::default(),
            search_thread: None,
            ttable: Arc::new(Mutex::new(TTable::default())),
            weights: EvalWeights::default(),
            clock: GameClock::default(),
            search_start: None,
            book: None,
            prev_keys: Vec::new(),
            move_line: Vec::new(),
        }
    }

    /// The engine's name and version.
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// Replaces the evaluation weights.
    ///
    /// The weights populate the evaluator's tables once; the engine never
    /// mutates them.
    pub fn set_weights(&mut self, weights: EvalWeights) {
        self.weights = weights;
    }

    /// Attaches an opening book, consulted before every search.
    pub fn set_book(&mut self, book: Arc<dyn OpeningBook>) {
        self.book = Some(book);
    }

    /// Sends an [`EngineCommand`] to be executed.
    pub fn send_command(&self, command: EngineCommand) {
        // The receiver lives as long as the engine, so this cannot fail.
        self.sender.send(command).unwrap();
    }

    /// The engine's main event loop.
    ///
    /// Spawns a thread that forwards `stdin` input over the command channel,
    /// then executes commands until told to exit.
    pub fn run(&mut self) -> Result<()> {
        let sender = self.sender.clone();
        thread::spawn(|| {
            if let Err(err) = input_handler(sender) {
                eprintln!("Input handler thread stopping after fatal error: {err}");
            }
        });

        while let Ok(cmd) = self.receiver.recv() {
            match cmd {
                EngineCommand::Bench { depth } => self.bench(depth)?,

                EngineCommand::Display => println!("{}", self.game),

                EngineCommand::Eval => {
                    println!("{}", Evaluator::new(&self.game, &self.weights).eval())
                }

                EngineCommand::Fen => println!("{}", self.game.position()),

                EngineCommand::Flip => self.game.toggle_side_to_move(),

                EngineCommand::Moves { square } => {
                    let moves = self
                        .game
                        .get_legal_moves()
                        .into_iter()
                        .filter(|mv| square.map_or(true, |sq| mv.from() == sq))
                        .map(|mv| mv.to_string())
                        .collect::<Vec<_>>();

                    if moves.is_empty() {
                        println!("(none)");
                    } else {
                        println!("{}", moves.join(", "));
                    }
                }

                EngineCommand::Perft { depth } => {
                    let mut game = self.game;
                    println!("{}", crate::perft(&mut game, depth));
                }

                EngineCommand::Splitperft { depth } => {
                    let mut game = self.game;
                    splitperft(&mut game, depth);
                }

                EngineCommand::Exit { cleanup } => {
                    // If requested, await any ongoing search before exiting.
                    if cleanup {
                        self.stop_search();
                    }
                    break;
                }

                EngineCommand::Uci { cmd } => {
                    // Keep running, even on error.
                    if let Err(e) = self.handle_uci_command(cmd) {
                        eprintln!("Error: {e}");
                    }
                }
            }
        }

        Ok(())
    }

    /// Executes a single [`UciCommand`].
    fn handle_uci_command(&mut self, uci: UciCommand) -> Result<()> {
        use UciCommand::*;
        match uci {
            Uci => self.uci(),

            IsReady => println!("{}", UciResponse::<&str>::ReadyOk),

            SetOption { name, value } => self.set_option(&name, value)?,

            UciNewGame => self.new_game(),

            Position { fen, moves } => self.position(fen, moves)?,

            Go(options) => {
                if let Some(depth) = options.perft {
                    let mut game = self.game;
                    splitperft(&mut game, depth as usize);
                    return Ok(());
                }

                // Keep the engine's clock in sync with the GUI's view of it.
                let (time, inc) = if self.game.side_to_move().is_white() {
                    (options.wtime, options.winc)
                } else {
                    (options.btime, options.binc)
                };
                if let Some(time) = time {
                    self.clock.set(time, inc.unwrap_or_default());
                }

                let config = SearchConfig::new(options, &self.game);
                self.search_thread = self.start_search(config);
            }

            Stop => self.set_is_searching(false),

            Quit => self.send_command(EngineCommand::Exit { cleanup: false }),

            _ => bail!(
                "{} does not support UCI command {uci:?}",
                env!("CARGO_PKG_NAME")
            ),
        }

        Ok(())
    }

    /// Runs a fixed-depth search over the benchmark positions, printing the
    /// total node count and speed.
    fn bench(&mut self, depth: Option<u8>) -> Result<()> {
        let config = SearchConfig {
            max_depth: depth.unwrap_or(BENCH_DEPTH),
            ..Default::default()
        };

        let mut nodes = 0;

        for (i, fen) in BENCH_FENS.iter().enumerate() {
            println!("Benchmark position {}/{}: {fen}", i + 1, BENCH_FENS.len());

            self.set_position(Game::from_fen(fen)?);
            self.search_thread = self.start_search(config);

            let res = self
                .stop_search()
                .context("Benchmark search returned no result")?;
            nodes += res.nodes;
        }

        let elapsed = config.starttime.elapsed();
        let nps = (nodes as f64 / elapsed.as_secs_f64()) as u64;
        println!("{nodes} nodes {nps} nps");

        self.new_game();

        Ok(())
    }

    /// Sets the position to the supplied FEN (the standard start position if
    /// not supplied) and applies `moves` one-by-one.
    fn position<T: AsRef<str>>(
        &mut self,
        fen: Option<T>,
        moves: impl IntoIterator<Item = T>,
    ) -> Result<()> {
        let game = if let Some(fen) = fen {
            Game::from_fen(fen.as_ref())?
        } else {
            Game::default()
        };
        self.set_position(game);

        for mv_str in moves {
            let mv = Move::from_text(self.game.position(), mv_str.as_ref())?;
            self.make_move(mv);
        }

        Ok(())
    }

    /// Replaces the current position, resetting the game history.
    fn set_position(&mut self, game: Game) {
        self.game = game;
        self.prev_keys.clear();
        self.move_line.clear();
    }

    /// Applies a move to the engine's game, recording it in the history.
    fn make_move(&mut self, mv: Move) {
        self.prev_keys.push(self.game.key());
        self.move_line.push(mv.inner());
        self.game.make_move(mv);
    }

    /// Resets the engine's internal state: position, history, and caches.
    fn new_game(&mut self) {
        self.set_is_searching(false);
        self.set_position(Game::default());
        self.ttable
            .lock()
            .expect("Failed to acquire Transposition Table to clear it")
            .clear();
    }

    /// Sets the flag that signals whether a search is running.
    fn set_is_searching(&mut self, status: bool) {
        self.is_searching.store(status, Ordering::Relaxed);
    }

    /// Returns `true` if a search is currently running.
    fn is_searching(&self) -> bool {
        self.is_searching.load(Ordering::Relaxed)
    }

    /// Starts a search over the current position on its own thread.
    ///
    /// The thread locks the transposition table for the duration of the
    /// search, so only one search may run at a time.
    fn start_search(&mut self, config: SearchConfig) -> Option<JoinHandle<SearchResult>> {
        if self.is_searching() {
            eprintln!("A search is already running");
            return None;
        }
        self.set_is_searching(true);
        self.search_start = Some(config.starttime);

        let game = self.game;
        let is_searching = Arc::clone(&self.is_searching);
        let ttable = Arc::clone(&self.ttable);
        let prev_keys = self.prev_keys.clone();
        let weights = self.weights.clone();
        let book = self.book.clone();
        let line = self.move_line.clone();

        let handle = thread::spawn(move || {
            let mut ttable = ttable
                .lock()
                .expect("Failed to acquire Transposition Table at the start of search");

            let mut search = Search::new(is_searching, config, prev_keys, &mut ttable)
                .with_weights(weights);

            if let Some(book) = book {
                search = search.with_book(book, line);
            }

            search.start(&game)
        });

        Some(handle)
    }

    /// Awaits the current search thread, blocking until it finishes, and
    /// reports the elapsed time back to the clock.
    fn stop_search(&mut self) -> Option<SearchResult> {
        let handle = self.search_thread.take()?;

        let id = handle.thread().id();
        let Ok(res) = handle.join() else {
            eprintln!("Failed to join on thread {id:?}");
            return None;
        };

        self.set_is_searching(false);

        if let Some(start) = self.search_start.take() {
            self.clock.move_finished(start.elapsed());
        }

        Some(res)
    }

    /// Handles the `uci` command: identity, options, `uciok`.
    fn uci(&self) {
        println!("id name {}\n", self.name());

        for option in self.options() {
            println!("{}", UciResponse::Option(option));
        }

        println!("{}", UciResponse::<&str>::UciOk)
    }

    /// All UCI options this engine supports.
    fn options(&self) -> impl Iterator<Item = UciOption<&str>> {
        [
            UciOption::spin("Threads", 1, 1, 1),
            UciOption::spin("Hash", 16, 1, 1024),
        ]
        .into_iter()
    }

    /// Handles the `setoption` command.
    fn set_option(&mut self, name: &str, value: Option<String>) -> Result<()> {
        match name {
            "Hash" => {
                let mb: usize = value
                    .context("setoption Hash requires a value")?
                    .parse()
                    .context("setoption Hash requires a numeric value")?;

                let mut ttable = self
                    .ttable
                    .lock()
                    .expect("Failed to acquire Transposition Table to resize it");
                *ttable = TTable::new(mb.clamp(1, 1024));
            }

            "Threads" => bail!("{} currently supports only 1 thread", self.name()),

            _ => bail!("{} has no option named {name:?}", self.name()),
        }

        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Loops forever reading `stdin`, forwarding parsed commands through
/// `sender`.
///
/// Input is tried as a UCI command first (the primary use case), then as an
/// [`EngineCommand`].
fn input_handler(sender: Sender<EngineCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(2048);

    loop {
        buffer.clear();
        let bytes = io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read line when parsing commands")?;

        // An empty read means ctrl+d: shut down.
        if bytes == 0 {
            sender
                .send(EngineCommand::Exit { cleanup: false })
                .context("Failed to send 'exit' after receiving empty input")?;

            bail!("Engine received input of 0 bytes and is quitting");
        }

        let buf = buffer.trim();
        if buf.is_empty() {
            continue;
        }

        match UciCommand::new(buf) {
            Ok(cmd) => sender
                .send(EngineCommand::Uci { cmd })
                .context("Failed to send UCI command to engine")?,

            // Not a UCI command; try the engine-specific ones.
            Err(UciParseError::UnrecognizedCommand { cmd: _ }) => {
                match buf.parse::<EngineCommand>() {
                    Ok(cmd) => sender
                        .send(cmd)
                        .context("Failed to send command to engine")?,

                    Err(err) => eprintln!("{err}"),
                }
            }

            // A malformed UCI command gets a usage message.
            Err(uci_err) => eprintln!("{uci_err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_command_applies_moves() {
        let mut engine = Engine::new();
        engine
            .position(Some("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"), [
                "e2e4", "c7c5",
            ])
            .unwrap();

        assert_eq!(
            engine.game.position().to_fen(),
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2"
        );
        assert_eq!(engine.prev_keys.len(), 2);
        assert_eq!(engine.move_line.len(), 2);
    }

    #[test]
    fn test_position_rejects_bad_input() {
        let mut engine = Engine::new();
        assert!(engine.position(Some("not a fen"), Vec::<&str>::new()).is_err());
        assert!(engine
            .position(None::<&str>, vec!["e2e5"]) // no pawn can do this
            .is_ok()); // parsing succeeds; legality is the GUI's concern

        assert!(engine.position(None::<&str>, vec!["xyzzy"]).is_err());
    }

    #[test]
    fn test_new_game_resets_history() {
        let mut engine = Engine::new();
        engine.position(None::<&str>, vec!["e2e4"]).unwrap();
        assert_eq!(engine.move_line.len(), 1);

        engine.new_game();
        assert!(engine.move_line.is_empty());
        assert!(engine.prev_keys.is_empty());
        assert_eq!(engine.game, Game::default());
    }
}
