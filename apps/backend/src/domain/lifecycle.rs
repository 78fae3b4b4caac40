//! Session state machine.
//!
//! ```text
//! lobby ──startRound──▶ in_round ──reveal(not last)──▶ revealing ──startRound──▶ in_round
//!                          │
//!                          └──reveal(last)──▶ finished
//! any non-terminal ──end──▶ finished
//! any ──reap──▶ expired
//! ```

use crate::domain::model::SessionStatus;
use crate::errors::domain::{ConflictKind, DomainError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    StartRound,
    Reveal { last_round: bool },
    End,
    Reap,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Finished | SessionStatus::Expired)
    }

    pub fn accepts_players(self) -> bool {
        !self.is_terminal()
    }

    pub fn accepts_captions(self) -> bool {
        self == SessionStatus::InRound
    }

    /// Compute the status after `event`, or a `Conflict` when the event is
    /// not legal from this status.
    pub fn apply(self, event: SessionEvent) -> Result<SessionStatus, DomainError> {
        use SessionStatus::*;

        let next = match (self, event) {
            (Lobby | Revealing, SessionEvent::StartRound) => Some(InRound),
            (InRound, SessionEvent::Reveal { last_round: true }) => Some(Finished),
            (InRound, SessionEvent::Reveal { last_round: false }) => Some(Revealing),
            (status, SessionEvent::End) if !status.is_terminal() => Some(Finished),
            (_, SessionEvent::Reap) => Some(Expired),
            _ => None,
        };

        next.ok_or_else(|| {
            DomainError::conflict(
                ConflictKind::IllegalTransition,
                format!("cannot {event:?} while session is {}", self.as_str()),
            )
        })
    }
}
