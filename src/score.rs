//! Score translation between internal search values and UCI output.
//!
//! Internal values are scaled so that the win-rate model below maps them to
//! game outcomes. Centipawns are derived from that model: a score of `a`
//! (see [`WinRateParams`]) is one pawn, which is the evaluation at which the
//! side to move wins half of its games.

use std::fmt;

use chess::{Board, Piece};

/// Internal evaluation unit.
pub type Value = i32;

pub const MAX_PLY: i32 = 246;

pub const VALUE_ZERO: Value = 0;
pub const VALUE_DRAW: Value = 0;
pub const VALUE_MATE: Value = 32000;
pub const VALUE_INFINITE: Value = 32001;

pub const VALUE_MATE_IN_MAX_PLY: Value = VALUE_MATE - MAX_PLY;
pub const VALUE_MATED_IN_MAX_PLY: Value = -VALUE_MATE_IN_MAX_PLY;

pub const VALUE_TB: Value = VALUE_MATE_IN_MAX_PLY - 1;
pub const VALUE_TB_WIN_IN_MAX_PLY: Value = VALUE_TB - MAX_PLY;
pub const VALUE_TB_LOSS_IN_MAX_PLY: Value = -VALUE_TB_WIN_IN_MAX_PLY;

/// Centipawn value reported for a known tablebase outcome at distance zero.
const TB_CP: i32 = 20000;

/// The fitted model only covers material counts in this window.
const MATERIAL_MIN: i32 = 10;
const MATERIAL_MAX: i32 = 78;
const MATERIAL_ANCHOR: f64 = 58.0;

const AS: [f64; 4] = [-185.719_654_83, 504.850_143_85, -438.582_957_43, 474.046_046_27];
const BS: [f64; 4] = [89.235_427_28, -137.021_412_96, 73.286_690_21, 47.533_761_90];

#[inline]
#[must_use]
pub const fn mate_in(ply: i32) -> Value {
    VALUE_MATE - ply
}

#[inline]
#[must_use]
pub const fn mated_in(ply: i32) -> Value {
    -VALUE_MATE + ply
}

/// Weighted material of both sides: P=1, N=B=3, R=5, Q=9.
#[must_use]
pub fn material_count(board: &Board) -> i32 {
    let count = |piece: Piece| board.pieces(piece).popcnt() as i32;
    count(Piece::Pawn)
        + 3 * count(Piece::Knight)
        + 3 * count(Piece::Bishop)
        + 5 * count(Piece::Rook)
        + 9 * count(Piece::Queen)
}

/// Parameters of the logistic win-rate curve for a given amount of material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WinRateParams {
    pub a: f64,
    pub b: f64,
}

impl WinRateParams {
    #[must_use]
    pub fn from_material(material: i32) -> Self {
        let m = f64::from(material.clamp(MATERIAL_MIN, MATERIAL_MAX)) / MATERIAL_ANCHOR;
        let poly = |c: &[f64; 4]| ((c[0] * m + c[1]) * m + c[2]) * m + c[3];
        WinRateParams {
            a: poly(&AS),
            b: poly(&BS),
        }
    }

    #[must_use]
    pub fn for_board(board: &Board) -> Self {
        Self::from_material(material_count(board))
    }
}

/// Converts a value to centipawns, without special treatment of mate scores.
#[must_use]
pub fn to_cp(v: Value, material: i32) -> i32 {
    let params = WinRateParams::from_material(material);
    (100.0 * f64::from(v) / params.a).round() as i32
}

/// Win probability of the side with value `v`, in per mille.
#[must_use]
pub fn win_rate_model(v: Value, material: i32) -> i32 {
    let WinRateParams { a, b } = WinRateParams::from_material(material);
    (0.5 + 1000.0 / (1.0 + ((a - f64::from(v)) / b).exp())) as i32
}

/// Win/draw/loss expectation in per mille. The three fields sum to 1000.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Wdl {
    pub win: i32,
    pub draw: i32,
    pub loss: i32,
}

impl fmt::Display for Wdl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wdl {} {} {}", self.win, self.draw, self.loss)
    }
}

#[must_use]
pub fn wdl(v: Value, material: i32) -> Wdl {
    let win = win_rate_model(v, material);
    let loss = win_rate_model(-v, material);
    Wdl {
        win,
        draw: 1000 - win - loss,
        loss,
    }
}

/// Score as reported in an `info ... score` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Score {
    Centipawns(i32),
    /// Moves (not plies) to mate; negative when the side to move is mated.
    Mate(i32),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Centipawns(cp) => write!(f, "cp {cp}"),
            Score::Mate(moves) => write!(f, "mate {moves}"),
        }
    }
}

#[must_use]
pub fn to_score(v: Value, material: i32) -> Score {
    debug_assert!(-VALUE_INFINITE < v && v < VALUE_INFINITE);

    if v.abs() < VALUE_TB_WIN_IN_MAX_PLY {
        Score::Centipawns(to_cp(v, material))
    } else if v.abs() <= VALUE_TB {
        let ply = VALUE_TB - v.abs();
        Score::Centipawns(if v > 0 { TB_CP - ply } else { -TB_CP + ply })
    } else {
        Score::Mate(if v > 0 { VALUE_MATE - v + 1 } else { -VALUE_MATE - v } / 2)
    }
}

/// Board-based conveniences, counting material on `board`.
pub mod on_board {
    use super::{material_count, Score, Value, Wdl};
    use chess::Board;

    #[must_use]
    pub fn to_cp(v: Value, board: &Board) -> i32 {
        super::to_cp(v, material_count(board))
    }

    #[must_use]
    pub fn to_score(v: Value, board: &Board) -> Score {
        super::to_score(v, material_count(board))
    }

    #[must_use]
    pub fn win_rate_model(v: Value, board: &Board) -> i32 {
        super::win_rate_model(v, material_count(board))
    }

    #[must_use]
    pub fn wdl(v: Value, board: &Board) -> Wdl {
        super::wdl(v, material_count(board))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_material_is_78() {
        assert_eq!(material_count(&Board::default()), 78);
    }

    #[test]
    fn params_are_clamped_to_fitted_window() {
        assert_eq!(WinRateParams::from_material(0), WinRateParams::from_material(10));
        assert_eq!(WinRateParams::from_material(100), WinRateParams::from_material(78));
    }

    #[test]
    fn anchor_params_match_fitted_polynomial() {
        let params = WinRateParams::from_material(58);
        assert!((params.a - 354.593_577_86).abs() < 1e-6);
        assert!((params.b - 73.034_466_43).abs() < 1e-6);
    }

    #[test]
    fn centipawns_scale_by_a() {
        assert_eq!(to_cp(0, 58), 0);
        assert_eq!(to_cp(355, 58), 100);
        assert_eq!(to_cp(-355, 58), -100);
        assert_eq!(to_cp(355, 78), 103);
        assert_eq!(to_cp(1000, 78), 289);
    }

    #[test]
    fn win_rate_is_half_at_a() {
        assert_eq!(win_rate_model(355, 58), 501);
        assert_eq!(win_rate_model(0, 78), 48);
        assert_eq!(win_rate_model(1000, 58), 1000);
    }

    #[test]
    fn wdl_sums_to_one_thousand() {
        for material in [0, 10, 24, 58, 78, 120] {
            for v in (-4000..=4000).step_by(37) {
                let w = wdl(v, material);
                assert_eq!(w.win + w.draw + w.loss, 1000, "v={v} material={material}");
                assert!(w.draw >= 0);
            }
        }
    }

    #[test]
    fn wdl_is_symmetric() {
        let w = wdl(300, 40);
        let l = wdl(-300, 40);
        assert_eq!(w.win, l.loss);
        assert_eq!(w.loss, l.win);
        assert_eq!(w.to_string(), format!("wdl {} {} {}", w.win, w.draw, w.loss));
    }

    #[test]
    fn mate_scores_count_moves() {
        assert_eq!(to_score(mate_in(1), 78), Score::Mate(1));
        assert_eq!(to_score(mate_in(3), 78), Score::Mate(2));
        assert_eq!(to_score(mated_in(0), 78), Score::Mate(0));
        assert_eq!(to_score(mated_in(2), 78), Score::Mate(-1));
        assert_eq!(to_score(mated_in(4), 78).to_string(), "mate -2");
    }

    #[test]
    fn tablebase_band_reports_large_centipawns() {
        assert_eq!(to_score(VALUE_TB, 78), Score::Centipawns(20000));
        assert_eq!(to_score(VALUE_TB - 7, 78), Score::Centipawns(19993));
        assert_eq!(to_score(-(VALUE_TB - 7), 78), Score::Centipawns(-19993));
        assert_eq!(to_score(VALUE_TB_WIN_IN_MAX_PLY, 78), Score::Centipawns(20000 - MAX_PLY));
    }

    #[test]
    fn ordinary_values_report_centipawns() {
        assert_eq!(to_score(355, 58).to_string(), "cp 100");
        let v = VALUE_TB_WIN_IN_MAX_PLY - 1;
        assert_eq!(to_score(v, 58), Score::Centipawns(to_cp(v, 58)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn score_and_wdl_serialize() {
        assert_eq!(serde_json::to_string(&Score::Mate(3)).unwrap(), r#"{"Mate":3}"#);
        let w = Wdl { win: 500, draw: 400, loss: 100 };
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(serde_json::from_str::<Wdl>(&json).unwrap(), w);
    }
}
