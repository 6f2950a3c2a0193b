use std::error::Error as StdError;
use std::fmt;

mod guard;
mod page;
#[cfg(feature = "server")]
pub mod server;

pub use guard::{CapGuard, LOCK_SWEEP_EVENT, LOCK_SWEEP_TAGS};
pub use page::{Event, Listener, ListenerOptions, Page, TargetId, TargetKind};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOp {
    Add,
    Remove,
    Lock,
}

impl fmt::Display for GuardOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add listeners"),
            Self::Remove => write!(f, "remove listeners"),
            Self::Lock => write!(f, "lock again"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    InvalidTarget {
        target: TargetId,
        kind: String,
    },
    Locked {
        op: GuardOp,
    },
    CapacityExceeded {
        target: TargetId,
        cap: usize,
    },
    TargetNotFound(TargetId),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTarget { target, kind } => {
                write!(f, "invalid listener target {target}: {kind} targets cannot be guarded")
            }
            Self::Locked { op } => write!(f, "guard is locked: cannot {op}"),
            Self::CapacityExceeded { target, cap } => {
                write!(f, "max listeners exceeded on {target}: cap is {cap}")
            }
            Self::TargetNotFound(target) => write!(f, "target not found: {target}"),
        }
    }
}

impl StdError for Error {}
