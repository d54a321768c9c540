//! Parsing of `go` arguments into [`SearchLimits`].

use std::str::FromStr;
use std::time::Instant;

use chess::{Board, Color};

use crate::position::text_to_move;
use crate::search::SearchLimits;

/// Reads the next token as a number. The token is consumed even when it
/// does not parse, in which case `field` keeps its value.
fn read_into<'a, T, I>(tokens: &mut I, field: &mut T, keyword: &str)
where
    T: FromStr,
    I: Iterator<Item = &'a str>,
{
    match tokens.next().map(str::parse::<T>) {
        Some(Ok(v)) => *field = v,
        Some(Err(_)) => log::warn!("ignoring malformed value for {keyword}"),
        None => log::warn!("missing value for {keyword}"),
    }
}

/// Parses the tokens following `go`. The search clock starts here.
///
/// `searchmoves` consumes the rest of the line; tokens that are not legal
/// moves in `board` are dropped.
pub fn parse_limits<'a, I>(board: &Board, chess960: bool, tokens: I) -> SearchLimits
where
    I: IntoIterator<Item = &'a str>,
{
    let mut limits = SearchLimits {
        start_time: Instant::now(),
        ..SearchLimits::default()
    };
    let white = Color::White.to_index();
    let black = Color::Black.to_index();

    let mut tokens = tokens.into_iter();
    while let Some(token) = tokens.next() {
        match token {
            "searchmoves" => {
                limits.searchmoves = tokens
                    .by_ref()
                    .filter_map(|t| text_to_move(board, t, chess960))
                    .collect();
            }
            "wtime" => read_into(&mut tokens, &mut limits.time[white], token),
            "btime" => read_into(&mut tokens, &mut limits.time[black], token),
            "winc" => read_into(&mut tokens, &mut limits.inc[white], token),
            "binc" => read_into(&mut tokens, &mut limits.inc[black], token),
            "movestogo" => read_into(&mut tokens, &mut limits.movestogo, token),
            "depth" => read_into(&mut tokens, &mut limits.depth, token),
            "nodes" => read_into(&mut tokens, &mut limits.nodes, token),
            "movetime" => read_into(&mut tokens, &mut limits.movetime, token),
            "mate" => read_into(&mut tokens, &mut limits.mate, token),
            "perft" => read_into(&mut tokens, &mut limits.perft, token),
            "infinite" => limits.infinite = true,
            "ponder" => limits.ponder = true,
            other => log::debug!("ignoring go token {other}"),
        }
    }

    limits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> SearchLimits {
        parse_limits(&Board::default(), false, line.split_whitespace())
    }

    #[test]
    fn clock_fields_by_color() {
        let limits = parse("wtime 1000 btime 900 winc 10 binc 20 movestogo 5");
        assert_eq!(limits.time, [1000, 900]);
        assert_eq!(limits.inc, [10, 20]);
        assert_eq!(limits.movestogo, 5);
        assert!(limits.use_time_management());
    }

    #[test]
    fn single_value_limits() {
        let limits = parse("depth 7 nodes 5000 movetime 250 mate 3");
        assert_eq!(limits.depth, 7);
        assert_eq!(limits.nodes, 5000);
        assert_eq!(limits.movetime, 250);
        assert_eq!(limits.mate, 3);
        assert!(!limits.infinite);
    }

    #[test]
    fn flags_and_unknown_tokens() {
        let limits = parse("infinite bogus ponder");
        assert!(limits.infinite);
        assert!(limits.ponder);
        assert!(limits.open_ended());
    }

    #[test]
    fn malformed_value_is_consumed_and_ignored() {
        let limits = parse("depth x nodes 10");
        assert_eq!(limits.depth, 0);
        assert_eq!(limits.nodes, 10);

        let limits = parse("depth");
        assert_eq!(limits.depth, 0);
    }

    #[test]
    fn searchmoves_keeps_legal_moves_only() {
        let limits = parse("depth 3 searchmoves e2e4 e2e5 g1f3 depth 9");
        assert_eq!(limits.depth, 3);
        let moves: Vec<String> = limits.searchmoves.iter().map(ToString::to_string).collect();
        assert_eq!(moves, vec!["e2e4", "g1f3"]);
    }

    #[test]
    fn perft_is_parsed() {
        assert_eq!(parse("perft 3").perft, 3);
    }
}
