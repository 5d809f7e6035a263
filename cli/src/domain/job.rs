//! Benchmark output parsing.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Execution time reported by the benchmark, or `Undefined` when the marker
/// line never appeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionTime {
    Measured { line: String, millis: Option<u64> },
    Undefined,
}

impl ExecutionTime {
    #[must_use]
    pub fn millis(&self) -> Option<u64> {
        match self {
            Self::Measured { millis, .. } => *millis,
            Self::Undefined => None,
        }
    }
}

impl fmt::Display for ExecutionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Measured { line, .. } => f.write_str(line),
            Self::Undefined => f.write_str("Undefined"),
        }
    }
}

static TRAILING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(\d+)\s*$").expect("static pattern")
});

/// Scan `stdout` for lines starting with `marker`; the last one wins.
#[must_use]
pub fn parse_execution_time(stdout: &str, marker: &str) -> ExecutionTime {
    stdout
        .lines()
        .rev()
        .find(|l| l.starts_with(marker))
        .map_or(ExecutionTime::Undefined, |line| {
            let millis = TRAILING_NUMBER
                .captures(line)
                .and_then(|c| c[1].parse().ok());
            ExecutionTime::Measured {
                line: line.trim_end().to_string(),
                millis,
            }
        })
}
