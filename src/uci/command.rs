//! Tokenizing parse of one input line into a [`UciCommand`].

/// Root of a `position` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionSpec {
    StartPos,
    Fen(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    SetOption { name: String, value: Option<String> },
    UciNewGame,
    Position { root: PositionSpec, moves: Vec<String> },
    /// Tokens following `go`.
    Go(Vec<String>),
    Stop,
    PonderHit,
    Quit,
    Flip,
    /// Tokens following `bench`.
    Bench(Vec<String>),
    Display,
    Eval,
    Compiler,
    Help,
    /// Comments and commands that are accepted but have no effect.
    Ignored,
    Unknown(String),
}

/// Parses one line. Returns `None` for blank lines.
#[must_use]
pub fn parse_uci_command(line: &str) -> Option<UciCommand> {
    let trimmed = line.trim();
    let mut tokens = trimmed.split_whitespace();
    let head = tokens.next()?;
    let rest = || tokens.clone().map(str::to_string).collect::<Vec<String>>();

    let cmd = match head {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "setoption" => parse_setoption(&rest()),
        "ucinewgame" => UciCommand::UciNewGame,
        "position" => parse_position(&rest()),
        "go" => UciCommand::Go(rest()),
        "stop" => UciCommand::Stop,
        "ponderhit" => UciCommand::PonderHit,
        "quit" => UciCommand::Quit,
        "flip" => UciCommand::Flip,
        "bench" => UciCommand::Bench(rest()),
        "d" => UciCommand::Display,
        "eval" => UciCommand::Eval,
        "compiler" => UciCommand::Compiler,
        "help" | "--help" | "license" | "--license" => UciCommand::Help,
        _ if head.starts_with('#') => UciCommand::Ignored,
        _ => UciCommand::Unknown(trimmed.to_string()),
    };

    Some(cmd)
}

/// `setoption name <words...> [value <words...>]`
fn parse_setoption(tokens: &[String]) -> UciCommand {
    let mut name_parts: Vec<&str> = Vec::new();
    let mut value_parts: Vec<&str> = Vec::new();
    let mut in_value = false;

    let tokens = match tokens.split_first() {
        Some((first, rest)) if first == "name" => rest,
        _ => tokens,
    };
    for token in tokens.iter().map(String::as_str) {
        if token == "value" && !in_value {
            in_value = true;
        } else if in_value {
            value_parts.push(token);
        } else {
            name_parts.push(token);
        }
    }

    UciCommand::SetOption {
        name: name_parts.join(" "),
        value: (!value_parts.is_empty()).then(|| value_parts.join(" ")),
    }
}

/// `position (startpos | fen <fields...>) [moves <move>...]`
///
/// After `startpos` the next token is consumed whatever it is, as if it were
/// `moves`.
fn parse_position(tokens: &[String]) -> UciCommand {
    match tokens.first().map(String::as_str) {
        Some("startpos") => UciCommand::Position {
            root: PositionSpec::StartPos,
            moves: tokens.iter().skip(2).cloned().collect(),
        },
        Some("fen") => {
            let fen: Vec<&str> = tokens[1..]
                .iter()
                .map(String::as_str)
                .take_while(|t| *t != "moves")
                .collect();
            let moves = tokens[1 + fen.len()..].iter().skip(1).cloned().collect();
            UciCommand::Position {
                root: PositionSpec::Fen(fen.join(" ")),
                moves,
            }
        }
        _ => UciCommand::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(s: &[&str]) -> Vec<String> {
        s.iter().map(|t| (*t).to_string()).collect()
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_uci_command(""), None);
        assert_eq!(parse_uci_command("   \t"), None);
    }

    #[test]
    fn simple_commands() {
        assert_eq!(parse_uci_command("uci"), Some(UciCommand::Uci));
        assert_eq!(parse_uci_command("  isready  "), Some(UciCommand::IsReady));
        assert_eq!(parse_uci_command("d"), Some(UciCommand::Display));
        assert_eq!(parse_uci_command("--license"), Some(UciCommand::Help));
        assert_eq!(parse_uci_command("# comment"), Some(UciCommand::Ignored));
        assert_eq!(
            parse_uci_command("xyzzy 1 2"),
            Some(UciCommand::Unknown("xyzzy 1 2".to_string()))
        );
    }

    #[test]
    fn position_startpos_with_moves() {
        assert_eq!(
            parse_uci_command("position startpos moves e2e4 e7e5"),
            Some(UciCommand::Position {
                root: PositionSpec::StartPos,
                moves: strings(&["e2e4", "e7e5"]),
            })
        );
    }

    #[test]
    fn position_fen_collects_until_moves() {
        assert_eq!(
            parse_uci_command("position fen 8/8/8/8/8/8/8/K6k w - - 0 1 moves a1a2"),
            Some(UciCommand::Position {
                root: PositionSpec::Fen("8/8/8/8/8/8/8/K6k w - - 0 1".to_string()),
                moves: strings(&["a1a2"]),
            })
        );
        assert_eq!(
            parse_uci_command("position fen 8/8/8/8/8/8/8/K6k w - -"),
            Some(UciCommand::Position {
                root: PositionSpec::Fen("8/8/8/8/8/8/8/K6k w - -".to_string()),
                moves: Vec::new(),
            })
        );
    }

    #[test]
    fn position_without_root_is_ignored() {
        assert_eq!(parse_uci_command("position"), Some(UciCommand::Ignored));
        assert_eq!(parse_uci_command("position moves e2e4"), Some(UciCommand::Ignored));
    }

    #[test]
    fn setoption_multi_word_name_and_value() {
        assert_eq!(
            parse_uci_command("setoption name Move Overhead value 30"),
            Some(UciCommand::SetOption {
                name: "Move Overhead".to_string(),
                value: Some("30".to_string()),
            })
        );
        assert_eq!(
            parse_uci_command("setoption name Clear Hash"),
            Some(UciCommand::SetOption {
                name: "Clear Hash".to_string(),
                value: None,
            })
        );
    }

    #[test]
    fn go_keeps_tokens() {
        assert_eq!(
            parse_uci_command("go wtime 1000 btime 900"),
            Some(UciCommand::Go(strings(&["wtime", "1000", "btime", "900"])))
        );
    }
}
