//! Command list for the `bench` command.
//!
//! `bench [hash] [threads] [limit] [fenFile] [limitType]` expands into plain
//! UCI commands that the session runs through its normal dispatcher.

use std::fs;

use crate::error::{UciError, UciResult};

const DEFAULT_HASH: &str = "16";
const DEFAULT_THREADS: &str = "1";
const DEFAULT_LIMIT: &str = "6";
const DEFAULT_FEN_FILE: &str = "default";
const DEFAULT_LIMIT_TYPE: &str = "depth";

const DEFAULT_FENS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 10",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 11",
    "4rrk1/pp1n3p/3q2pQ/2p1pb2/2PP4/2P3N1/P2B2PP/4RRK1 b - - 7 19",
    "rq3rk1/ppp2ppp/1bnpb3/3N2B1/3NP3/7P/PPPQ1PP1/2KR3R w - - 7 14",
    "r1bq1r1k/1pp1n1pp/1p1p4/4p2Q/4Pp2/1BNP4/PPP2PPP/3R1RK1 w - - 2 14",
    "r3r1k1/2p2ppp/p1p1bn2/8/1q2P3/2NPQN2/PPP3PP/R4RK1 b - - 2 15",
    "r1bbk1nr/pp3p1p/2n5/1N4p1/2Np1B2/8/PPP2PPP/2KR1B1R w kq - 0 13",
    "r1bq1rk1/ppp1nppp/4n3/3p3Q/3P4/1BP1B3/PP1N2PP/R4RK1 w - - 1 16",
    "4r1k1/r1q2ppp/ppp2n2/4P3/5Rb1/1N1BQ3/PPP3PP/R5K1 w - - 1 17",
    "2rqkb1r/ppp2p2/2npb1p1/1N1Nn2p/2P1PP2/8/PP2B1PP/R1BQK2R b KQ - 0 11",
    "r1bq1r1k/b1p1npp1/p2p3p/1p6/3PP3/1B2NN2/PP3PPP/R2Q1RK1 w - - 1 16",
    "3r1rk1/p5pp/bpp1pp2/8/q1PP1P2/b3P3/P2NQRPP/1R2B1K1 b - - 6 22",
    "r1q2rk1/2p1bppp/2Pp4/p6b/Q1PNp3/4B3/PP1R1PPP/2K4R w - - 2 18",
    "4k2r/1pb2ppp/1p2p3/1R1p4/3P4/2r1PN2/P4PPP/1R4K1 b - - 3 22",
    "3q2k1/pb3p1p/4pbp1/2r5/PpN2N2/1P2P2P/5PP1/Q2R2K1 b - - 4 26",
    "6k1/6p1/6Pp/ppp5/3pn2P/1P3K2/1PP2P2/8 b - - 3 54",
    "8/8/8/8/5kp1/P7/8/1K1N4 w - - 0 80",
    "8/8/1P6/5pr1/8/4R3/7k/2K5 w - - 0 1",
    "5k2/7R/4P2p/5K2/p1r2P1p/8/8/8 b - - 0 1",
];

/// Expands `bench` arguments into the commands to run.
///
/// `fenFile` may be `default`, `current` (the session's position) or a path
/// to a file with one FEN per line. Lines of the file that contain
/// `setoption` are passed through as commands.
pub fn setup_bench(args: &[String], current_fen: &str) -> UciResult<Vec<String>> {
    let arg = |i: usize, default: &'static str| args.get(i).map_or(default, String::as_str);
    let hash = arg(0, DEFAULT_HASH);
    let threads = arg(1, DEFAULT_THREADS);
    let limit = arg(2, DEFAULT_LIMIT);
    let fen_file = arg(3, DEFAULT_FEN_FILE);
    let limit_type = arg(4, DEFAULT_LIMIT_TYPE);

    let go = if limit_type == "eval" {
        "eval".to_string()
    } else {
        format!("go {limit_type} {limit}")
    };

    let fens: Vec<String> = match fen_file {
        "default" => DEFAULT_FENS.iter().map(|f| (*f).to_string()).collect(),
        "current" => vec![current_fen.to_string()],
        path => fs::read_to_string(path)
            .map_err(|err| UciError::BenchFile {
                path: path.to_string(),
                reason: err.to_string(),
            })?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    };

    let mut commands = vec![
        format!("setoption name Threads value {threads}"),
        format!("setoption name Hash value {hash}"),
        "ucinewgame".to_string(),
    ];
    for fen in fens {
        if fen.contains("setoption") {
            commands.push(fen);
        } else {
            commands.push(format!("position fen {fen}"));
            commands.push(go.clone());
        }
    }
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn defaults() {
        let commands = setup_bench(&[], "unused").expect("default corpus");
        assert_eq!(commands[0], "setoption name Threads value 1");
        assert_eq!(commands[1], "setoption name Hash value 16");
        assert_eq!(commands[2], "ucinewgame");
        assert_eq!(commands[3], format!("position fen {}", DEFAULT_FENS[0]));
        assert_eq!(commands[4], "go depth 6");
        assert_eq!(commands.len(), 3 + 2 * DEFAULT_FENS.len());
    }

    #[test]
    fn current_position_with_eval() {
        let fen = "8/8/8/8/8/8/8/K6k w - - 0 1";
        let commands = setup_bench(&args("32 2 1 current eval"), fen).expect("current");
        assert_eq!(
            commands,
            vec![
                "setoption name Threads value 2".to_string(),
                "setoption name Hash value 32".to_string(),
                "ucinewgame".to_string(),
                format!("position fen {fen}"),
                "eval".to_string(),
            ]
        );
    }

    #[test]
    fn fen_file_is_read() {
        let path = std::env::temp_dir().join(format!("chess_uci_bench_{}.fen", std::process::id()));
        {
            let mut file = fs::File::create(&path).expect("temp file");
            writeln!(file, "8/8/8/8/8/8/8/K6k w - - 0 1").expect("write");
            writeln!(file).expect("write");
            writeln!(file, "setoption name MultiPV value 2").expect("write");
        }
        let mut bench_args = args("16 1 1000");
        bench_args.push(path.to_string_lossy().to_string());
        bench_args.push("nodes".to_string());
        let commands = setup_bench(&bench_args, "").expect("file corpus");
        let _ = fs::remove_file(&path);

        assert_eq!(
            &commands[3..],
            &[
                "position fen 8/8/8/8/8/8/8/K6k w - - 0 1".to_string(),
                "go nodes 1000".to_string(),
                "setoption name MultiPV value 2".to_string(),
            ]
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = setup_bench(&args("16 1 1 /definitely/not/here.fen"), "").unwrap_err();
        assert!(matches!(err, UciError::BenchFile { .. }));
    }
}
