//! Revision label computation for create and edit events

use serde_json::Value;

use super::label::RevisionLabel;

/// Label for a record about to be created.
///
/// `existing_record_count` is the number of records of the same form type
/// persisted before this one.
pub fn next_label_for_create(existing_record_count: u64) -> RevisionLabel {
    RevisionLabel::new(existing_record_count.saturating_add(1), 0)
}

/// Label for an edit of a record whose stored label is `current`.
///
/// Total over every input:
/// - missing, empty or whitespace-only -> `1.1`
/// - major not a positive integer -> `1.1`
/// - minor missing or not a non-negative integer -> `{major}.1`
/// - otherwise -> `{major}.{minor + 1}`
///
/// Segments after the second are ignored.
pub fn next_label_for_update(current: Option<&str>) -> RevisionLabel {
    let current = match current.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return RevisionLabel::RESET,
    };

    let mut segments = current.split('.');

    let major = match segments.next().and_then(parse_component) {
        Some(major) if major >= 1 => major,
        _ => return RevisionLabel::RESET,
    };

    // Corrupt minor restarts the edit counter but keeps the major.
    let next_minor = match segments.next().and_then(parse_component) {
        Some(minor) => minor.saturating_add(1),
        None => 1,
    };

    RevisionLabel::new(major, next_minor)
}

/// [`next_label_for_update`] over a stored JSON value. Non-string values
/// count as missing.
pub fn next_label_for_update_value(current: Option<&Value>) -> RevisionLabel {
    next_label_for_update(current.and_then(Value::as_str))
}

fn parse_component(segment: &str) -> Option<u64> {
    segment.trim().parse::<u64>().ok()
}
