//! Operator feedback and session tables

use crate::core::styles::StyleRole;
use crate::decoder::traits::{DecodedEvent, ScanSource};
use crate::session::classifier::SessionSummary;
use crate::session::outcome::{DeleteOutcome, FeedbackTone, ScanOutcome, UnvalidateOutcome};
use crate::session::profile::SessionMode;
use crate::session::state::SessionSnapshot;
use prettytable::{format, Cell, Row, Table};

/// One feedback line for a scan outcome
///
/// Throttled drops are silent and produce no line.
pub fn outcome_line(event: &DecodedEvent, outcome: &ScanOutcome, use_color: bool) -> Option<String> {
    let tone = outcome.tone();
    if tone == FeedbackTone::Silent {
        return None;
    }
    let marker = match event.source {
        ScanSource::Camera => "",
        ScanSource::Manual => " (manual)",
    };
    // Terminal bell stands in for the success beep
    let bell = if tone.beeps() && use_color { "\x07" } else { "" };
    Some(format!(
        "{}{}{}",
        tone.style().paint(&outcome.message(), use_color),
        StyleRole::Dim.paint(marker, use_color),
        bell
    ))
}

pub fn delete_line(outcome: &DeleteOutcome, use_color: bool) -> String {
    match outcome {
        DeleteOutcome::Deleted {
            canonical_id,
            total,
            ..
        } => StyleRole::Success.paint(
            &format!("ID {} deleted ({} total)", canonical_id, total),
            use_color,
        ),
        DeleteOutcome::Failed { ledger_id, message } => StyleRole::Error.paint(
            &format!("Could not delete {}, still listed: {}", ledger_id, message),
            use_color,
        ),
    }
}

pub fn unvalidate_line(outcome: &UnvalidateOutcome, use_color: bool) -> String {
    match outcome {
        UnvalidateOutcome::Unvalidated {
            canonical_id,
            validated,
        } => StyleRole::Success.paint(
            &format!("ID {} unvalidated ({} validated)", canonical_id, validated),
            use_color,
        ),
        UnvalidateOutcome::Cancelled => StyleRole::Dim.paint("Unvalidate cancelled", use_color),
        UnvalidateOutcome::Failed {
            canonical_id,
            message,
        } => StyleRole::Error.paint(
            &format!("Could not unvalidate {}: {}", canonical_id, message),
            use_color,
        ),
    }
}

fn styled_cell(text: &str, role: StyleRole, use_color: bool) -> Cell {
    let cell = Cell::new(text);
    match role.to_prettytable_spec() {
        Some(spec) if use_color => cell.style_spec(&spec),
        _ => cell,
    }
}

/// Table of the session contents for `:list`
pub fn session_table(snapshot: &SessionSnapshot, use_color: bool) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);

    match snapshot.mode {
        SessionMode::Collect => {
            table.set_titles(Row::new(vec![
                styled_cell("Time", StyleRole::Header, use_color),
                styled_cell("ID", StyleRole::Header, use_color),
                styled_cell("Ledger id", StyleRole::Header, use_color),
            ]));
            for entry in &snapshot.entries {
                table.add_row(Row::new(vec![
                    styled_cell(&entry.display_time(), StyleRole::Dim, use_color),
                    Cell::new(&entry.canonical_id),
                    styled_cell(entry.ledger_id.as_str(), StyleRole::Literal, use_color),
                ]));
            }
        }
        SessionMode::Validate => {
            table.set_titles(Row::new(vec![
                styled_cell("ID", StyleRole::Header, use_color),
                styled_cell("Status", StyleRole::Header, use_color),
            ]));
            for id in &snapshot.expected {
                let (status, role) = if snapshot.is_validated(id) {
                    ("validated", StyleRole::Success)
                } else {
                    ("pending", StyleRole::Warning)
                };
                table.add_row(Row::new(vec![
                    Cell::new(id),
                    styled_cell(status, role, use_color),
                ]));
            }
        }
    }
    table
}

pub fn snapshot_footer(snapshot: &SessionSnapshot) -> String {
    match snapshot.mode {
        SessionMode::Collect => format!("{} scans in {}", snapshot.total, snapshot.session_id),
        SessionMode::Validate => format!(
            "{}/{} validated, {} remaining in {}",
            snapshot.validated_count,
            snapshot.expected.len(),
            snapshot.remaining(),
            snapshot.session_id
        ),
    }
}

pub fn summary_line(summary: &SessionSummary) -> String {
    match summary.mode {
        SessionMode::Collect => format!(
            "Session {} finished at {}: {} scans",
            summary.session_id,
            summary.ended_at.format("%H:%M"),
            summary.total
        ),
        SessionMode::Validate => format!(
            "Session {} finished at {}: {}/{} validated",
            summary.session_id,
            summary.ended_at.format("%H:%M"),
            summary.validated,
            summary.expected
        ),
    }
}
