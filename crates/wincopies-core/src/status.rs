//! Process lifecycle status.

use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr};

/// Lifecycle status of a process.
///
/// `NotStarted → Running ⇄ Paused → Completed`, with `Cancelled` and `Erred`
/// reachable from `Running`. Pause is a status of its own, entered only once
/// the worker has stopped at an item boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, FromRepr,
)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum ProcessStatus {
    #[default]
    #[strum(to_string = "not started")]
    NotStarted = 0,
    Running = 1,
    Paused = 2,
    Completed = 3,
    Cancelled = 4,
    Erred = 5,
}

impl ProcessStatus {
    /// Whether the process can never run again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether `start` is accepted in this status.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::NotStarted | Self::Paused)
    }

    /// Whether error items may be retried or ignored in this status.
    pub fn can_resolve(&self) -> bool {
        matches!(self, Self::Paused | Self::Erred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repr_round_trip() {
        let status = ProcessStatus::Erred;
        assert_eq!(ProcessStatus::from_repr(status as u8), Some(status));
        assert_eq!(ProcessStatus::from_repr(42), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ProcessStatus::NotStarted.to_string(), "not started");
        assert_eq!(ProcessStatus::Paused.to_string(), "paused");
    }
}
