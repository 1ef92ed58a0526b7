//! Range utilities.
//!
//! Public APIs accept `impl RangeBounds<Offset>` for ergonomic range syntax
//! (`..`, `5..`, `..10`, `5..10`). Internal code works with concrete
//! `Range<Offset>` values produced by [`normalize_offset`].

use std::ops::{Bound, Range, RangeBounds};

use crate::model::Offset;

/// Converts any `RangeBounds<Offset>` to a normalized `Range<Offset>`.
pub(crate) fn normalize_offset<R: RangeBounds<Offset>>(range: &R) -> Range<Offset> {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e.saturating_add(1),
        Bound::Excluded(&e) => e,
        Bound::Unbounded => Offset::MAX,
    };
    start..end
}

/// Clamps `range` to the committed prefix `[0, head)`.
///
/// Returns an empty range starting at `head` when nothing in `range` has been
/// committed yet.
pub(crate) fn clamp_to_head(range: Range<Offset>, head: Offset) -> Range<Offset> {
    let end = range.end.min(head);
    let start = range.start.min(end);
    start..end
}
