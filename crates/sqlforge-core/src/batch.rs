//! Row chunking for batch inserts bounded by a bound-parameter limit.

use std::ops::Range;

/// Splits `rows` rows of `columns` values into consecutive row ranges so
/// that no range carries more than `max_params` values.
///
/// Each chunk holds `max(1, max_params / columns)` rows, so a single row
/// wider than the limit still gets a chunk of its own. Ranges are returned
/// in row order and together cover `0..rows` exactly once.
#[must_use]
pub fn plan_chunks(rows: usize, columns: usize, max_params: usize) -> Vec<Range<usize>> {
    if rows == 0 {
        return Vec::new();
    }
    let per_chunk = if columns == 0 {
        rows
    } else {
        (max_params / columns).max(1)
    };
    (0..rows)
        .step_by(per_chunk)
        .map(|start| start..(start + per_chunk).min(rows))
        .collect()
}
