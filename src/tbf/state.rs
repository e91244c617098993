//! TBF lifecycle state machine and the orthogonal poll sub-state (spec §4.E).
//!
//! Transcribed from the transition table in spec §4.E; no single source file
//! in `original_source/` carries this as a flat table (`gprs_rlcmac.h`/`.cpp`
//! spread it across `TBF::state`, `rlcmac_ts_set`, and scattered `switch`
//! statements), so the table itself is the grounding source.

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TbfState {
    Null,
    Assign,
    Flow,
    Finished,
    WaitRelease,
    Releasing,
}

/// Events that drive `TbfState` transitions. Each names the trigger column
/// of the spec §4.E table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TbfEvent {
    AllocSuccess,
    AssignmentAcked,
    AssignmentPollTimedOut,
    LastBlockAcked,
    WindowStalledMaxResend,
    FinalAckAcked,
    WaitReleaseTimerExpired,
}

impl TbfState {
    /// Applies one transition, returning the new state or `Malformed` if
    /// the event does not apply from the current state (a caller bug, not
    /// a wire error, but the core must not panic per spec §9).
    pub fn apply(self, event: TbfEvent) -> CoreResult<TbfState> {
        use TbfEvent::*;
        use TbfState::*;
        match (self, event) {
            (Null, AllocSuccess) => Ok(Assign),
            (Assign, AssignmentAcked) => Ok(Flow),
            (Assign, AssignmentPollTimedOut) => Ok(Releasing),
            (Flow, LastBlockAcked) => Ok(Finished),
            (Flow, WindowStalledMaxResend) => Ok(Releasing),
            (Finished, FinalAckAcked) => Ok(WaitRelease),
            (WaitRelease, WaitReleaseTimerExpired) => Ok(Releasing),
            _ => Err(CoreError::Malformed("invalid TBF state transition")),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TbfState::Releasing)
    }
}

/// The orthogonal poll / assignment-acknowledgement sub-state (spec §4.E):
/// `NONE -> SCHED` when a block is sent with a valid RRBP, back to `NONE` on
/// either the expected ack or the poll timing out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    None,
    Sched { poll_fn: u32 },
}

impl PollState {
    pub fn schedule(&mut self, poll_fn: u32) {
        *self = PollState::Sched { poll_fn };
    }

    pub fn clear(&mut self) {
        *self = PollState::None;
    }

    pub fn is_scheduled(self) -> bool {
        matches!(self, PollState::Sched { .. })
    }

    /// `true` iff a poll is outstanding and `fn` has passed its deadline
    /// without having been cleared by an ack.
    pub fn is_timed_out(self, fn_: u32) -> bool {
        matches!(self, PollState::Sched { poll_fn } if fn_ >= poll_fn)
    }
}

impl Default for PollState {
    fn default() -> Self {
        PollState::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_follows_the_happy_path() {
        let s = TbfState::Null;
        let s = s.apply(TbfEvent::AllocSuccess).unwrap();
        assert_eq!(s, TbfState::Assign);
        let s = s.apply(TbfEvent::AssignmentAcked).unwrap();
        assert_eq!(s, TbfState::Flow);
        let s = s.apply(TbfEvent::LastBlockAcked).unwrap();
        assert_eq!(s, TbfState::Finished);
        let s = s.apply(TbfEvent::FinalAckAcked).unwrap();
        assert_eq!(s, TbfState::WaitRelease);
        let s = s.apply(TbfEvent::WaitReleaseTimerExpired).unwrap();
        assert_eq!(s, TbfState::Releasing);
        assert!(s.is_terminal());
    }

    #[test]
    fn out_of_order_event_is_rejected() {
        assert!(TbfState::Null.apply(TbfEvent::LastBlockAcked).is_err());
    }

    #[test]
    fn poll_state_times_out_only_past_its_deadline() {
        let mut p = PollState::default();
        p.schedule(100);
        assert!(!p.is_timed_out(99));
        assert!(p.is_timed_out(100));
        p.clear();
        assert!(!p.is_scheduled());
    }
}
