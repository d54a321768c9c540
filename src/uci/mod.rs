//! Universal Chess Interface (UCI) protocol implementation.
//!
//! [`UciSession`] owns the session state (position history, options, engine
//! controller, output sinks) and dispatches one command at a time. Searches
//! run on their own thread; everything else runs on the caller's thread.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::time::Instant;

use crate::bench::setup_bench;
use crate::engine::{EngineController, SearchRequest};
use crate::error::UciError;
use crate::eval;
use crate::perft::perft_divide;
use crate::position::{display, StateHistory, START_FEN};
use crate::search::{IterationInfo, SearchResult, Searcher};

pub mod command;
pub mod limits;
pub mod options;
pub mod print;
pub mod report;

pub use command::{parse_uci_command, PositionSpec, UciCommand};
pub use limits::parse_limits;
pub use options::{OptionAction, UciOptions};
pub use print::{OutputSink, SharedBuffer};

const ENGINE_AUTHOR: &str = "the chess_uci developers";

const HELP_TEXT: &[&str] = &[
    "chess_uci is a chess engine speaking the Universal Chess Interface (UCI).",
    "It is meant to be driven by a chess GUI, but can also be used interactively.",
    "",
    "Besides the standard UCI commands it understands:",
    "  d                 show the current position",
    "  eval              show the static evaluation of the current position",
    "  flip              mirror the current position",
    "  bench [hash] [threads] [limit] [fenFile] [limitType]",
    "                    search a fixed set of positions and report speed",
    "  go perft <depth>  count leaf nodes of the legal move tree",
    "  compiler          show build information",
    "",
    "Commands can also be given as program arguments, e.g. `chess_uci bench`.",
    "chess_uci is free software distributed under the MIT license.",
];

/// Whether the input loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct UciSession {
    history: Arc<StateHistory>,
    options: UciOptions,
    engine: EngineController,
    out: OutputSink,
    /// Diagnostics (bench progress and totals).
    diag: OutputSink,
    /// The last `go` holds its result until `stop`/`ponderhit`.
    open_ended: bool,
}

impl UciSession {
    #[must_use]
    pub fn new(out: OutputSink, diag: OutputSink) -> Self {
        let options = UciOptions::default();
        let engine = EngineController::new(options.hash_mb, options.threads);
        Self::from_parts(options, engine, out, diag)
    }

    /// Session driving a custom search implementation.
    #[must_use]
    pub fn with_searcher(out: OutputSink, diag: OutputSink, searcher: Arc<dyn Searcher>) -> Self {
        let options = UciOptions::default();
        let engine = EngineController::with_searcher(options.hash_mb, options.threads, searcher);
        Self::from_parts(options, engine, out, diag)
    }

    fn from_parts(
        options: UciOptions,
        engine: EngineController,
        out: OutputSink,
        diag: OutputSink,
    ) -> Self {
        UciSession {
            history: Arc::new(StateHistory::default()),
            options,
            engine,
            out,
            diag,
            open_ended: false,
        }
    }

    #[must_use]
    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    #[must_use]
    pub fn options(&self) -> &UciOptions {
        &self.options
    }

    #[must_use]
    pub fn engine(&self) -> &EngineController {
        &self.engine
    }

    pub fn wait_for_search_finished(&mut self) {
        self.engine.wait_for_search_finished();
    }

    /// Reads commands until `quit` or end of input, then stops and joins
    /// any running search.
    pub fn run<R: BufRead>(&mut self, input: R) -> io::Result<()> {
        let mut result = Ok(());
        for line in input.lines() {
            match line {
                Ok(line) => {
                    if self.execute(&line) == Flow::Quit {
                        break;
                    }
                }
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }
        self.engine.stop();
        self.engine.wait_for_search_finished();
        result
    }

    /// Runs the program arguments as one command and waits for it to finish.
    pub fn run_one_shot(&mut self, args: &[String]) {
        let line = args.join(" ");
        self.execute(&line);
        if self.open_ended {
            // Nothing could send `stop` later.
            self.engine.stop();
        }
        self.engine.wait_for_search_finished();
    }

    /// Dispatches one input line.
    pub fn execute(&mut self, line: &str) -> Flow {
        let Some(command) = parse_uci_command(line) else {
            return Flow::Continue;
        };
        log::debug!("<< {}", line.trim());

        match command {
            UciCommand::Quit => {
                self.engine.stop();
                return Flow::Quit;
            }
            UciCommand::Stop => self.engine.stop(),
            UciCommand::PonderHit => self.engine.ponderhit(),
            UciCommand::Uci => self.uci(),
            UciCommand::IsReady => self.out.line("readyok"),
            UciCommand::SetOption { name, value } => self.set_option(&name, value.as_deref()),
            UciCommand::UciNewGame => self.engine.clear(),
            UciCommand::Position { root, moves } => self.position(root, &moves),
            UciCommand::Go(tokens) => {
                self.go(&tokens);
            }
            UciCommand::Flip => self.flip(),
            UciCommand::Bench(args) => self.bench(&args),
            UciCommand::Display => self.out.lines(display::render(&self.history)),
            UciCommand::Eval => self.out.lines(eval::trace(self.history.position())),
            UciCommand::Compiler => self.out.lines(compiler_info()),
            UciCommand::Help => self.out.lines(HELP_TEXT),
            UciCommand::Ignored => {}
            UciCommand::Unknown(line) => {
                log::warn!("unknown command {line}");
                self.out.line(format!(
                    "Unknown command: '{line}'. Type help for more information."
                ));
            }
        }
        Flow::Continue
    }

    fn uci(&self) {
        let mut lines = vec![
            format!(
                "id name {} {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ),
            format!("id author {ENGINE_AUTHOR}"),
            String::new(),
        ];
        lines.extend(UciOptions::option_lines());
        lines.push("uciok".to_string());
        self.out.lines(lines);
    }

    fn set_option(&mut self, name: &str, value: Option<&str>) {
        self.engine.wait_for_search_finished();

        match self.options.apply(name, value) {
            Ok(Some(OptionAction::ResizeHash(mb))) => self.engine.resize_hash(mb),
            Ok(Some(OptionAction::SetThreads(n))) => self.engine.set_threads(n),
            Ok(Some(OptionAction::ClearHash)) => self.engine.clear(),
            Ok(None) => {}
            Err(err @ UciError::UnknownOption(_)) => self.out.line(err.to_string()),
            Err(err) => log::warn!("{err}"),
        }
    }

    fn position(&mut self, root: PositionSpec, moves: &[String]) {
        let fen = match &root {
            PositionSpec::StartPos => START_FEN,
            PositionSpec::Fen(fen) => fen.as_str(),
        };

        // A running search keeps its own copy alive.
        let history = Arc::make_mut(&mut self.history);
        match history.set_root(fen, self.options.chess960) {
            Ok(()) => {
                let applied = history.apply_moves(moves.iter().map(String::as_str));
                if applied < moves.len() {
                    log::debug!("applied {applied} of {} moves", moves.len());
                }
            }
            Err(err) => self.out.line(format!("info string {err}")),
        }
    }

    /// Starts a search, or runs `perft` synchronously. Returns the perft
    /// node count (zero for a search).
    fn go(&mut self, tokens: &[String]) -> u64 {
        let root = *self.history.position();
        let chess960 = self.options.chess960;
        let limits = parse_limits(&root, chess960, tokens.iter().map(String::as_str));

        if limits.perft > 0 {
            return self.perft(limits.perft as usize);
        }

        self.open_ended = limits.open_ended();

        let show_wdl = self.options.show_wdl;
        let info_out = self.out.clone();
        let on_info = Arc::new(move |info: &IterationInfo| {
            info_out.line(report::format_info(&root, info, chess960, show_wdl));
        });
        let bestmove_out = self.out.clone();
        let on_complete = move |result: SearchResult| {
            bestmove_out.line(report::format_bestmove(&root, &result, chess960));
        };

        let request = SearchRequest {
            history: Arc::clone(&self.history),
            limits,
            config: self.options.search_config(),
            on_info: Some(on_info),
        };
        self.engine.start_search(request, on_complete);
        0
    }

    fn perft(&self, depth: usize) -> u64 {
        let (counts, total) = perft_divide(self.history.position(), depth, self.options.chess960);
        let mut lines: Vec<String> = counts
            .into_iter()
            .map(|(mv, count)| format!("{mv}: {count}"))
            .collect();
        lines.push(String::new());
        lines.push(format!("Nodes searched: {total}"));
        lines.push(String::new());
        self.out.lines(lines);
        total
    }

    fn flip(&mut self) {
        if let Err(err) = Arc::make_mut(&mut self.history).flip() {
            self.out.line(format!("info string {err}"));
        }
    }

    fn bench(&mut self, args: &[String]) {
        let commands = match setup_bench(args, &self.history.fen()) {
            Ok(commands) => commands,
            Err(err) => {
                self.diag.line(err.to_string());
                return;
            }
        };

        let total = commands
            .iter()
            .filter(|c| c.starts_with("go ") || c.as_str() == "eval")
            .count();
        let mut index = 0;
        let mut nodes = 0u64;
        let mut start = Instant::now();

        for command in &commands {
            match parse_uci_command(command) {
                Some(UciCommand::Go(tokens)) => {
                    index += 1;
                    self.diag.lines([
                        String::new(),
                        format!("Position: {index}/{total} ({})", self.history.fen()),
                    ]);
                    let perft_nodes = self.go(&tokens);
                    self.engine.wait_for_search_finished();
                    nodes += if perft_nodes > 0 {
                        perft_nodes
                    } else {
                        self.engine.nodes_searched()
                    };
                }
                Some(UciCommand::Eval) => {
                    index += 1;
                    self.diag.lines([
                        String::new(),
                        format!("Position: {index}/{total} ({})", self.history.fen()),
                    ]);
                    self.out.lines(eval::trace(self.history.position()));
                }
                Some(UciCommand::UciNewGame) => {
                    self.engine.clear();
                    // Clearing the hash is not part of the measurement.
                    start = Instant::now();
                }
                _ => {
                    self.execute(command);
                }
            }
        }

        let elapsed = start.elapsed().as_millis() as u64 + 1;
        self.diag.lines([
            String::new(),
            "===========================".to_string(),
            format!("Total time (ms) : {elapsed}"),
            format!("Nodes searched  : {nodes}"),
            format!("Nodes/second    : {}", nodes.saturating_mul(1000) / elapsed),
        ]);
    }
}

fn compiler_info() -> Vec<String> {
    let profile = if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    };
    vec![
        format!(
            "Compiled by                : rustc ({} {})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ),
        format!(
            "Compilation architecture   : {}-{}",
            std::env::consts::ARCH,
            std::env::consts::OS
        ),
        format!("Compilation settings       : {profile}"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (UciSession, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let session = UciSession::new(
            OutputSink::from_writer(buffer.clone()),
            OutputSink::from_writer(io::sink()),
        );
        (session, buffer)
    }

    #[test]
    fn uci_lists_options_and_ends_with_uciok() {
        let (mut session, buffer) = session();
        session.execute("uci");
        let lines = buffer.lines();
        assert!(lines[0].starts_with("id name chess_uci"));
        assert!(lines.iter().any(|l| l == "option name MultiPV type spin default 1 min 1 max 256"));
        assert_eq!(lines.last().map(String::as_str), Some("uciok"));
    }

    #[test]
    fn quit_ends_the_loop() {
        let (mut session, _) = session();
        assert_eq!(session.execute("quit"), Flow::Quit);
        assert_eq!(session.execute("isready"), Flow::Continue);
    }

    #[test]
    fn invalid_fen_keeps_previous_position() {
        let (mut session, buffer) = session();
        session.execute("position startpos moves e2e4");
        session.execute("position fen nonsense w - -");
        assert_eq!(session.history().len(), 2);
        assert_eq!(buffer.lines(), vec!["info string Invalid FEN: nonsense w - -"]);
    }

    #[test]
    fn unknown_option_is_reported() {
        let (mut session, buffer) = session();
        session.execute("setoption name Foo value 1");
        assert_eq!(buffer.lines(), vec!["No such option: Foo"]);
    }

    #[test]
    fn perft_prints_divide_and_total() {
        let (mut session, buffer) = session();
        session.execute("position fen 8/8/8/8/8/8/8/K6k w - - 0 1");
        session.execute("go perft 1");
        let lines = buffer.lines();
        assert_eq!(lines.len(), 6);
        assert!(lines.contains(&"a1a2: 1".to_string()));
        assert_eq!(lines[4], "Nodes searched: 3");
    }

    #[test]
    fn flip_mirrors_current_position() {
        let (mut session, _) = session();
        session.execute("position startpos moves e2e4");
        session.execute("flip");
        assert_eq!(
            session.history().fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }
}
