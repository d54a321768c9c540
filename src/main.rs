use std::io;

use chess_uci::uci::{OutputSink, UciSession};
use clap::Parser;

/// UCI chess engine. With arguments, runs them as a single command and exits.
#[derive(Parser, Debug)]
#[command(name = "chess_uci", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Command to run instead of reading standard input, e.g. `bench 16 1 8`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    // stdout carries the protocol; logs go to stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .write_style(env_logger::WriteStyle::Never)
        .init();

    let mut session = UciSession::new(OutputSink::stdout(), OutputSink::stderr());
    if cli.command.is_empty() {
        session.run(io::stdin().lock())
    } else {
        session.run_one_shot(&cli.command);
        Ok(())
    }
}
