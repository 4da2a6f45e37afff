//! Sequential property identifiers: `MV00001`, `WEG00042`, ...

use std::cmp::Ordering;

/// Minimum width of the zero-padded numeric suffix
pub const SEQUENCE_WIDTH: usize = 5;

/// Derive the identifier that follows `last` for `prefix`.
///
/// `last` is the greatest identifier already allocated for the prefix. A
/// missing or unparsable suffix starts the sequence at 1.
pub fn next_unique_number(prefix: &str, last: Option<&str>) -> String {
    let next = last
        .and_then(|n| n.strip_prefix(prefix))
        .and_then(|digits| digits.parse::<u64>().ok())
        .map_or(1, |n| n.saturating_add(1));

    format!("{prefix}{next:0width$}", width = SEQUENCE_WIDTH)
}

/// Ordering used to find the greatest identifier of a prefix.
///
/// Longer identifiers sort after shorter ones so `MV100000` follows `MV99999`.
pub fn compare_unique_numbers(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
