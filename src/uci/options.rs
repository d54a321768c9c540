//! UCI options: printable descriptors and typed values.

use crate::engine::time::TimeConfig;
use crate::error::{UciError, UciResult};
use crate::search::SearchConfig;

pub const DEFAULT_HASH_MB: usize = 16;
pub const MAX_HASH_MB: i64 = 33_554_432;
pub const MAX_THREADS: i64 = 1024;

/// Side effect the session must apply to the engine after an option change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionAction {
    ResizeHash(usize),
    SetThreads(usize),
    ClearHash,
}

#[derive(Debug, Clone, Copy)]
enum OptionKind {
    Spin { default: i64, min: i64, max: i64 },
    Check { default: bool },
    Button,
}

#[derive(Debug, Clone, Copy)]
struct OptionDescriptor {
    name: &'static str,
    kind: OptionKind,
}

const DESCRIPTORS: [OptionDescriptor; 8] = [
    OptionDescriptor {
        name: "Threads",
        kind: OptionKind::Spin { default: 1, min: 1, max: MAX_THREADS },
    },
    OptionDescriptor {
        name: "Hash",
        kind: OptionKind::Spin { default: DEFAULT_HASH_MB as i64, min: 1, max: MAX_HASH_MB },
    },
    OptionDescriptor {
        name: "Clear Hash",
        kind: OptionKind::Button,
    },
    OptionDescriptor {
        name: "Ponder",
        kind: OptionKind::Check { default: false },
    },
    OptionDescriptor {
        name: "MultiPV",
        kind: OptionKind::Spin { default: 1, min: 1, max: 256 },
    },
    OptionDescriptor {
        name: "Move Overhead",
        kind: OptionKind::Spin { default: 10, min: 0, max: 5000 },
    },
    OptionDescriptor {
        name: "UCI_Chess960",
        kind: OptionKind::Check { default: false },
    },
    OptionDescriptor {
        name: "UCI_ShowWDL",
        kind: OptionKind::Check { default: false },
    },
];

enum Parsed {
    Spin(i64),
    Check(bool),
    Button,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UciOptions {
    pub threads: usize,
    pub hash_mb: usize,
    pub ponder: bool,
    pub multi_pv: usize,
    pub move_overhead_ms: u64,
    pub chess960: bool,
    pub show_wdl: bool,
}

impl Default for UciOptions {
    fn default() -> Self {
        UciOptions {
            threads: 1,
            hash_mb: DEFAULT_HASH_MB,
            ponder: false,
            multi_pv: 1,
            move_overhead_ms: 10,
            chess960: false,
            show_wdl: false,
        }
    }
}

impl UciOptions {
    /// `option name ...` lines in registration order.
    #[must_use]
    pub fn option_lines() -> Vec<String> {
        DESCRIPTORS
            .iter()
            .map(|d| match d.kind {
                OptionKind::Spin { default, min, max } => format!(
                    "option name {} type spin default {default} min {min} max {max}",
                    d.name
                ),
                OptionKind::Check { default } => {
                    format!("option name {} type check default {default}", d.name)
                }
                OptionKind::Button => format!("option name {} type button", d.name),
            })
            .collect()
    }

    /// Applies `setoption`. Names are matched case-insensitively.
    pub fn apply(&mut self, name: &str, value: Option<&str>) -> UciResult<Option<OptionAction>> {
        let descriptor = DESCRIPTORS
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| UciError::UnknownOption(name.to_string()))?;

        let invalid = || UciError::InvalidOptionValue {
            name: descriptor.name.to_string(),
            value: value.unwrap_or_default().to_string(),
        };

        let parsed = match descriptor.kind {
            OptionKind::Spin { min, max, .. } => {
                let v = value
                    .and_then(|v| v.trim().parse::<i64>().ok())
                    .filter(|v| (min..=max).contains(v))
                    .ok_or_else(invalid)?;
                Parsed::Spin(v)
            }
            OptionKind::Check { .. } => match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
                Some("true") => Parsed::Check(true),
                Some("false") => Parsed::Check(false),
                _ => return Err(invalid()),
            },
            OptionKind::Button => Parsed::Button,
        };

        let action = match (descriptor.name, parsed) {
            ("Threads", Parsed::Spin(v)) => {
                self.threads = v as usize;
                Some(OptionAction::SetThreads(self.threads))
            }
            ("Hash", Parsed::Spin(v)) => {
                self.hash_mb = v as usize;
                Some(OptionAction::ResizeHash(self.hash_mb))
            }
            ("Clear Hash", Parsed::Button) => Some(OptionAction::ClearHash),
            ("Ponder", Parsed::Check(v)) => {
                self.ponder = v;
                None
            }
            ("MultiPV", Parsed::Spin(v)) => {
                self.multi_pv = v as usize;
                None
            }
            ("Move Overhead", Parsed::Spin(v)) => {
                self.move_overhead_ms = v as u64;
                None
            }
            ("UCI_Chess960", Parsed::Check(v)) => {
                self.chess960 = v;
                None
            }
            ("UCI_ShowWDL", Parsed::Check(v)) => {
                self.show_wdl = v;
                None
            }
            _ => None,
        };

        log::info!(
            "option {} set to {}",
            descriptor.name,
            value.unwrap_or("<button>")
        );
        Ok(action)
    }

    #[must_use]
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            threads: self.threads,
            multi_pv: self.multi_pv,
            time: TimeConfig {
                move_overhead_ms: self.move_overhead_ms,
                ..TimeConfig::default()
            },
        }
    }
}
