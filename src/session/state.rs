//! Session state
//!
//! Plain data owned by a [`ScanSession`](crate::session::ScanSession) behind a
//! mutex. Nothing here talks to the ledger; the classifier decides when state
//! may change.

use crate::ledger::types::{LedgerId, SessionId};
use crate::session::profile::SessionMode;
use chrono::{DateTime, Local};
use std::collections::{BTreeSet, HashSet};

/// One accepted scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub raw: String,
    pub canonical_id: String,
    pub ledger_id: LedgerId,
    pub accepted_at: DateTime<Local>,
}

impl ScanEntry {
    /// `HH:MM | D.M.YYYY`
    pub fn display_time(&self) -> String {
        self.accepted_at.format("%H:%M | %-d.%-m.%Y").to_string()
    }
}

/// Where an identifier stands within the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierState {
    Unseen,
    Accepted,
    Validated,
}

#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) session_id: SessionId,
    pub(crate) mode: SessionMode,
    pub(crate) expected: BTreeSet<String>,
    pub(crate) entries: Vec<ScanEntry>,
    pub(crate) validated: HashSet<String>,
    pub(crate) total: u64,
    pub(crate) validated_count: u64,
    pub(crate) in_flight: HashSet<String>,
    pub(crate) ended: bool,
}

impl SessionState {
    pub(crate) fn new(session_id: SessionId, mode: SessionMode, expected: BTreeSet<String>) -> Self {
        Self {
            session_id,
            mode,
            expected,
            entries: Vec::new(),
            validated: HashSet::new(),
            total: 0,
            validated_count: 0,
            in_flight: HashSet::new(),
            ended: false,
        }
    }

    pub(crate) fn identifier_state(&self, canonical_id: &str) -> IdentifierState {
        match self.mode {
            SessionMode::Collect if self.is_accepted(canonical_id) => IdentifierState::Accepted,
            SessionMode::Validate if self.validated.contains(canonical_id) => {
                IdentifierState::Validated
            }
            _ => IdentifierState::Unseen,
        }
    }

    pub(crate) fn is_accepted(&self, canonical_id: &str) -> bool {
        self.entries.iter().any(|e| e.canonical_id == canonical_id)
    }

    pub(crate) fn find_entry(&self, ledger_id: &LedgerId) -> Option<&ScanEntry> {
        self.entries.iter().find(|e| &e.ledger_id == ledger_id)
    }

    /// Append an accepted scan and adopt the server total when given
    pub(crate) fn append(&mut self, entry: ScanEntry, server_total: Option<u64>) {
        self.entries.push(entry);
        self.total = server_total.unwrap_or(self.total + 1);
    }

    /// Remove exactly one entry; the total drops by one only if something was removed
    pub(crate) fn remove(&mut self, ledger_id: &LedgerId) -> Option<ScanEntry> {
        let position = self.entries.iter().position(|e| &e.ledger_id == ledger_id)?;
        let entry = self.entries.remove(position);
        self.total = self.total.saturating_sub(1);
        Some(entry)
    }

    pub(crate) fn mark_validated(&mut self, canonical_id: &str, server_count: Option<u64>) {
        if self.validated.insert(canonical_id.to_string()) {
            self.validated_count = server_count.unwrap_or(self.validated_count + 1);
        } else if let Some(count) = server_count {
            self.validated_count = count;
        }
    }

    pub(crate) fn unmark_validated(&mut self, canonical_id: &str, server_count: Option<u64>) {
        if self.validated.remove(canonical_id) {
            self.validated_count =
                server_count.unwrap_or_else(|| self.validated_count.saturating_sub(1));
        }
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        let mut validated: Vec<String> = self.validated.iter().cloned().collect();
        validated.sort();
        SessionSnapshot {
            session_id: self.session_id.clone(),
            mode: self.mode,
            total: self.total,
            validated_count: self.validated_count,
            expected: self.expected.iter().cloned().collect(),
            entries: self.entries.clone(),
            validated,
            in_flight: self.in_flight.len(),
            ended: self.ended,
        }
    }
}

/// Point-in-time copy of a session for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub mode: SessionMode,
    pub total: u64,
    pub validated_count: u64,
    pub expected: Vec<String>,
    /// Acceptance order
    pub entries: Vec<ScanEntry>,
    pub validated: Vec<String>,
    pub in_flight: usize,
    pub ended: bool,
}

impl SessionSnapshot {
    /// Expected identifiers not yet validated
    pub fn remaining(&self) -> u64 {
        (self.expected.len() as u64).saturating_sub(self.validated_count)
    }

    pub fn is_validated(&self, canonical_id: &str) -> bool {
        self.validated.iter().any(|id| id == canonical_id)
    }
}
