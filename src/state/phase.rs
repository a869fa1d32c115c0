/// Scheduler loop phases
///
/// Each round walks `SelectingFrontier → Dispatching → AwaitingWorkers →
/// Summarizing` and then either backs off, moves to the next round, or stops.
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerPhase {
    Idle,
    SelectingFrontier,
    Dispatching,
    AwaitingWorkers,
    Summarizing,
    BackingOff,
    NextRound,
    Done,
}

impl SchedulerPhase {
    /// Returns true if the loop may move from `self` to `next`
    pub fn can_transition_to(&self, next: SchedulerPhase) -> bool {
        use SchedulerPhase::*;
        matches!(
            (self, next),
            (Idle, SelectingFrontier)
                | (Idle, Done)
                | (SelectingFrontier, Dispatching)
                | (SelectingFrontier, Summarizing)
                | (Dispatching, AwaitingWorkers)
                | (AwaitingWorkers, Summarizing)
                | (Summarizing, BackingOff)
                | (Summarizing, NextRound)
                | (Summarizing, Done)
                | (BackingOff, NextRound)
                | (BackingOff, Done)
                | (NextRound, SelectingFrontier)
                | (NextRound, Done)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SelectingFrontier => "selecting_frontier",
            Self::Dispatching => "dispatching",
            Self::AwaitingWorkers => "awaiting_workers",
            Self::Summarizing => "summarizing",
            Self::BackingOff => "backing_off",
            Self::NextRound => "next_round",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for SchedulerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
