//! Error taxonomy for the reasoning kernel.
//!
//! Most failure modes in NARS are not exceptional: a stamp overlap or a
//! depth-limited derivation is routine and is counted, not raised. Only
//! parse failures, ill-formed terms, and internal contract violations
//! propagate as [`NarsError`]. Everything else is a [`DropReason`], folded
//! into `MemoryStats`/`SchedulerStats` and announced through the event bus.

use std::fmt;

use thiserror::Error;

/// Errors that propagate to a caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NarsError {
    /// Narsese surface syntax could not be parsed.
    #[error("parse error at line {line}, col {col}: {reason}")]
    Parse {
        line: usize,
        col: usize,
        reason: String,
    },

    /// A term was structurally invalid (bad arity, empty compound).
    #[error("bad term: {0}")]
    BadTerm(String),

    /// A contract the kernel relies on was violated (e.g. negative truth).
    /// Fatal to the current derivation step only; the step count still
    /// advances.
    #[error("internal contract violation: {0}")]
    Internal(String),
}

/// Reasons a derivation or insertion was silently dropped.
///
/// These never unwind. They are recorded in stats counters and, where the
/// spec calls for it, emitted as an event (`depth_limited`,
/// `capacity_evicted` is informational only, `backpressure_stall` retries).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// Two premises shared evidence; revision or a binary rule was skipped.
    StampOverlap,
    /// The derivation would exceed `max_derivation_depth`.
    DepthLimited,
    /// Memory overflow evicted a concept or task to make room.
    CapacityEvicted,
    /// Downstream buffer was full; the scheduler is retrying.
    BackpressureStall,
    /// A truth function produced NaN or an otherwise undefined value.
    UndefinedTruth,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DropReason::StampOverlap => "stamp overlap",
            DropReason::DepthLimited => "depth limited",
            DropReason::CapacityEvicted => "capacity evicted",
            DropReason::BackpressureStall => "backpressure stall",
            DropReason::UndefinedTruth => "undefined truth",
        };
        write!(f, "{s}")
    }
}

pub type Result<T> = std::result::Result<T, NarsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let e = NarsError::Parse {
            line: 1,
            col: 4,
            reason: "unexpected end of input".into(),
        };
        assert_eq!(
            format!("{e}"),
            "parse error at line 1, col 4: unexpected end of input"
        );
    }

    #[test]
    fn drop_reason_display() {
        assert_eq!(format!("{}", DropReason::StampOverlap), "stamp overlap");
        assert_eq!(format!("{}", DropReason::DepthLimited), "depth limited");
    }
}
