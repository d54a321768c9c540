//! Time management for clock-based searches.
//!
//! Turns the `go` clock fields into an optimum time (checked between
//! iterations) and a maximum time (checked inside the tree).

use std::time::Instant;

use chess::Color;

use crate::search::SearchLimits;

/// Moves-to-go estimate when the GUI does not send `movestogo`.
const LONG_TIME_CONTROL_MS: u64 = 300_000;
const MEDIUM_TIME_CONTROL_MS: u64 = 60_000;
const LONG_MOVES_ESTIMATE: u64 = 40;
const MEDIUM_MOVES_ESTIMATE: u64 = 30;
const SHORT_MOVES_ESTIMATE: u64 = 25;
const MIN_MOVES_TO_GO: u64 = 10;

/// Below this much usable time the budget shrinks sharply.
const PANIC_THRESHOLD_MS: u64 = 5000;
const PANIC_TIME_FRACTION: f64 = 0.05;
const PANIC_MIN_FRACTION: u64 = 5;
const PANIC_HARD_FRACTION: u64 = 3;

const CRITICAL_TIME_MARGIN_MS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeConfig {
    /// Time reserved for communication latency.
    pub move_overhead_ms: u64,
    /// Cap on the optimum time, as a percentage of the usable clock.
    pub soft_time_percent: u64,
    /// Cap on the maximum time, as a percentage of the usable clock.
    pub hard_time_percent: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            move_overhead_ms: 10,
            soft_time_percent: 70,
            hard_time_percent: 90,
        }
    }
}

/// How the current search is timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeControl {
    /// No clock: depth, nodes, mate or `infinite`.
    #[default]
    Unlimited,
    MoveTime { time_ms: u64 },
    Incremental {
        time_left_ms: u64,
        inc_ms: u64,
        movestogo: Option<u64>,
    },
}

impl TimeControl {
    #[must_use]
    pub fn from_limits(limits: &SearchLimits, us: Color) -> Self {
        if limits.infinite {
            TimeControl::Unlimited
        } else if limits.movetime > 0 {
            TimeControl::MoveTime {
                time_ms: limits.movetime as u64,
            }
        } else if limits.use_time_management() {
            TimeControl::Incremental {
                time_left_ms: limits.time_left(us).max(0) as u64,
                inc_ms: limits.increment(us).max(0) as u64,
                movestogo: u64::try_from(limits.movestogo).ok().filter(|&m| m > 0),
            }
        } else {
            TimeControl::Unlimited
        }
    }

    /// `(optimum_ms, maximum_ms)`, or `None` when unlimited.
    #[must_use]
    pub fn compute_limits(&self, config: &TimeConfig) -> Option<(u64, u64)> {
        match *self {
            TimeControl::Unlimited => None,
            // An explicit movetime is used as given.
            TimeControl::MoveTime { time_ms } => Some((time_ms.max(1), time_ms.max(1))),
            TimeControl::Incremental {
                time_left_ms,
                inc_ms,
                movestogo,
            } => Some(compute_incremental_limits(time_left_ms, inc_ms, movestogo, config)),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn compute_incremental_limits(
    time_left_ms: u64,
    inc_ms: u64,
    movestogo: Option<u64>,
    config: &TimeConfig,
) -> (u64, u64) {
    let safe_ms = time_left_ms.saturating_sub(config.move_overhead_ms);

    if time_left_ms <= config.move_overhead_ms.saturating_add(CRITICAL_TIME_MARGIN_MS) {
        let fallback = (time_left_ms / 2).max(1);
        return (fallback, fallback);
    }

    if safe_ms < PANIC_THRESHOLD_MS {
        let panic_factor = safe_ms as f64 / PANIC_THRESHOLD_MS as f64;
        let target =
            ((safe_ms as f64 * PANIC_TIME_FRACTION * panic_factor) as u64).saturating_add(inc_ms);
        let target = target.min(safe_ms / PANIC_MIN_FRACTION).max(1);
        let hard = (safe_ms / PANIC_HARD_FRACTION).max(target).max(1);
        return (target, hard);
    }

    let moves_to_go = movestogo
        .unwrap_or(if safe_ms > LONG_TIME_CONTROL_MS {
            LONG_MOVES_ESTIMATE
        } else if safe_ms > MEDIUM_TIME_CONTROL_MS {
            MEDIUM_MOVES_ESTIMATE
        } else {
            SHORT_MOVES_ESTIMATE
        })
        .max(MIN_MOVES_TO_GO);

    let base_time = (safe_ms / moves_to_go).saturating_add(inc_ms);
    let soft_cap = percent_of(safe_ms, config.soft_time_percent);
    let hard_cap = percent_of(safe_ms, config.hard_time_percent);

    let soft_ms = base_time.min(soft_cap).max(1);
    let hard_ms = hard_cap.min(soft_ms.saturating_mul(5)).max(soft_ms).max(1);

    (soft_ms, hard_ms)
}

fn percent_of(ms: u64, percent: u64) -> u64 {
    u64::try_from(u128::from(ms) * u128::from(percent) / 100).unwrap_or(u64::MAX)
}

/// Deadlines of one search, measured from `SearchLimits::start_time`.
#[derive(Debug, Clone, Copy)]
pub struct TimeManager {
    start: Instant,
    limits: Option<(u64, u64)>,
}

impl TimeManager {
    #[must_use]
    pub fn new(limits: &SearchLimits, us: Color, config: &TimeConfig) -> Self {
        TimeManager {
            start: limits.start_time,
            limits: TimeControl::from_limits(limits, us).compute_limits(config),
        }
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    #[must_use]
    pub fn optimum_ms(&self) -> Option<u64> {
        self.limits.map(|(optimum, _)| optimum)
    }

    #[must_use]
    pub fn maximum_ms(&self) -> Option<u64> {
        self.limits.map(|(_, maximum)| maximum)
    }

    /// Whether starting another iteration is no longer worthwhile.
    #[must_use]
    pub fn optimum_reached(&self) -> bool {
        self.optimum_ms().is_some_and(|t| self.elapsed_ms() >= t)
    }

    #[must_use]
    pub fn maximum_reached(&self) -> bool {
        self.maximum_ms().is_some_and(|t| self.elapsed_ms() >= t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits_with_clock(wtime: i64, winc: i64, movestogo: i32) -> SearchLimits {
        SearchLimits {
            time: [wtime, wtime],
            inc: [winc, winc],
            movestogo,
            ..SearchLimits::default()
        }
    }

    #[test]
    fn no_clock_is_unlimited() {
        let limits = SearchLimits {
            depth: 5,
            ..SearchLimits::default()
        };
        assert_eq!(TimeControl::from_limits(&limits, Color::White), TimeControl::Unlimited);
        let tm = TimeManager::new(&limits, Color::White, &TimeConfig::default());
        assert!(!tm.maximum_reached());
        assert_eq!(tm.optimum_ms(), None);
    }

    #[test]
    fn infinite_overrides_clock() {
        let mut limits = limits_with_clock(60_000, 0, 0);
        limits.infinite = true;
        assert_eq!(TimeControl::from_limits(&limits, Color::Black), TimeControl::Unlimited);
    }

    #[test]
    fn movetime_is_used_directly() {
        let limits = SearchLimits {
            movetime: 250,
            time: [60_000, 60_000],
            ..SearchLimits::default()
        };
        let tc = TimeControl::from_limits(&limits, Color::White);
        assert_eq!(tc.compute_limits(&TimeConfig::default()), Some((250, 250)));
    }

    #[test]
    fn clock_uses_side_to_move() {
        let limits = SearchLimits {
            time: [100_000, 2_000],
            ..SearchLimits::default()
        };
        let white = TimeControl::from_limits(&limits, Color::White);
        let black = TimeControl::from_limits(&limits, Color::Black);
        let config = TimeConfig::default();
        let (w_opt, _) = white.compute_limits(&config).expect("timed");
        let (b_opt, _) = black.compute_limits(&config).expect("timed");
        assert!(w_opt > b_opt);
    }

    #[test]
    fn incremental_limits_stay_within_clock() {
        let config = TimeConfig::default();
        for (wtime, winc, mtg) in [(300_000, 2_000, 0), (60_000, 0, 20), (3_000, 100, 0), (40, 0, 0)] {
            let limits = limits_with_clock(wtime, winc, mtg);
            let (optimum, maximum) = TimeControl::from_limits(&limits, Color::White)
                .compute_limits(&config)
                .expect("timed");
            assert!(optimum >= 1);
            assert!(optimum <= maximum, "{wtime} {winc} {mtg}");
            assert!(maximum <= wtime as u64, "{wtime} {winc} {mtg}");
        }
    }

    #[test]
    fn movestogo_splits_clock() {
        let config = TimeConfig {
            move_overhead_ms: 0,
            ..TimeConfig::default()
        };
        let limits = limits_with_clock(100_000, 0, 20);
        let (optimum, _) = TimeControl::from_limits(&limits, Color::White)
            .compute_limits(&config)
            .expect("timed");
        assert_eq!(optimum, 5_000);
    }

    #[test]
    fn extreme_clock_values_do_not_overflow() {
        let config = TimeConfig::default();
        let limits = limits_with_clock(i64::MAX, i64::MAX, 0);
        let (optimum, maximum) = TimeControl::from_limits(&limits, Color::White)
            .compute_limits(&config)
            .expect("timed");
        assert!(optimum >= 1);
        assert!(optimum <= maximum);

        let limits = limits_with_clock(500, i64::MAX, 0);
        let (optimum, maximum) = TimeControl::from_limits(&limits, Color::Black)
            .compute_limits(&config)
            .expect("timed");
        assert!(optimum <= maximum);
    }
}
