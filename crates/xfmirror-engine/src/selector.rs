//! Snapshot and delta selection over a package listing

use crate::timestamp::{extract_timestamp, DigitWindow};
use tracing::debug;

/// Select the parts of the latest full snapshot
///
/// Candidates are sorted by name and the last one with a timestamp `T`
/// picks the snapshot. Every candidate whose name contains `T` belongs to
/// it, which keeps multi-volume snapshots together. Candidates without a
/// timestamp never take part. The result is in name order.
pub fn select_snapshot<S: AsRef<str>>(candidates: &[S]) -> Vec<String> {
    let mut sorted: Vec<&str> = candidates
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| extract_timestamp(name).is_some())
        .collect();
    sorted.sort_unstable();

    let Some(timestamp) = sorted.last().and_then(|last| extract_timestamp(last)) else {
        return Vec::new();
    };

    let selected: Vec<String> = sorted
        .iter()
        .filter(|name| name.contains(timestamp))
        .map(|name| (*name).to_string())
        .collect();
    debug!(
        "Snapshot {} selected {} of {} full files",
        timestamp,
        selected.len(),
        candidates.len()
    );
    selected
}

/// Select change files at or after the reference snapshot file
///
/// The reference's timestamp `T` pins the width of the digit window read
/// from each candidate. A candidate is kept when its window is
/// lexicographically `>= T`. Candidates without such a window are dropped.
/// Kept candidates stay in input order.
pub fn select_changes<S: AsRef<str>>(reference: &str, candidates: &[S]) -> Vec<String> {
    let Some(timestamp) = extract_timestamp(reference) else {
        return Vec::new();
    };
    let Some(window) = DigitWindow::for_reference(timestamp) else {
        return Vec::new();
    };

    candidates
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| window.find(name).is_some_and(|token| token >= timestamp))
        .map(str::to_string)
        .collect()
}

/// Select change files relative to a snapshot selection
///
/// With no snapshot there is no base to apply changes to, so nothing is selected.
pub fn select_changes_since<S: AsRef<str>>(snapshot: &[String], candidates: &[S]) -> Vec<String> {
    match snapshot.last() {
        Some(reference) => select_changes(reference, candidates),
        None => Vec::new(),
    }
}
