use std::collections::HashMap;

use thiserror::Error;

use crate::model::OptionItem;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("unknown list '{0}'")]
    UnknownList(String),
    #[error("lookup failed: {0}")]
    Failed(String),
}

/// Which resolver phase issued a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupPhase {
    Choosing,
    Capturing { action: String },
}

/// Identifies one lookup so late answers can be matched against the resolver
/// state that is current when they arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    pub group: String,
    pub seq: u64,
    pub token: String,
    pub phase: LookupPhase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub ticket: LookupTicket,
    pub list: String,
    pub ignore_case: bool,
}

impl LookupRequest {
    pub fn token(&self) -> &str {
        &self.ticket.token
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListLookup {
    Ready(Vec<OptionItem>),
    /// The provider answers later through `Resolver::complete_lookup`.
    Pending,
}

/// Monotonic per-group request counter.
#[derive(Debug, Default)]
pub struct LookupSequencer {
    next_seq: u64,
    latest: HashMap<String, u64>,
}

impl LookupSequencer {
    pub fn issue(&mut self, group: &str, token: &str, phase: LookupPhase) -> LookupTicket {
        self.next_seq += 1;
        self.latest.insert(group.to_string(), self.next_seq);
        LookupTicket {
            group: group.to_string(),
            seq: self.next_seq,
            token: token.to_string(),
            phase,
        }
    }

    pub fn is_latest(&self, ticket: &LookupTicket) -> bool {
        self.latest.get(&ticket.group) == Some(&ticket.seq)
    }

    /// Invalidates every outstanding ticket.
    pub fn reset(&mut self) {
        self.latest.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{LookupPhase, LookupSequencer};

    #[test]
    fn only_the_latest_ticket_per_group_is_current() {
        let mut sequencer = LookupSequencer::default();
        let first = sequencer.issue("quote", "V", LookupPhase::Choosing);
        let other = sequencer.issue("news", "V", LookupPhase::Choosing);
        let second = sequencer.issue("quote", "VO", LookupPhase::Choosing);

        assert!(!sequencer.is_latest(&first));
        assert!(sequencer.is_latest(&second));
        assert!(sequencer.is_latest(&other));
        assert!(second.seq > first.seq);
    }

    #[test]
    fn reset_invalidates_outstanding_tickets() {
        let mut sequencer = LookupSequencer::default();
        let ticket = sequencer.issue("quote", "V", LookupPhase::Choosing);
        sequencer.reset();
        assert!(!sequencer.is_latest(&ticket));
        let fresh = sequencer.issue("quote", "V", LookupPhase::Choosing);
        assert_ne!(fresh.seq, ticket.seq);
    }
}
