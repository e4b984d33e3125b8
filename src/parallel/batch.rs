//! Chunking for the recompute job's CPU phase.
//!
//! Combination units are split into contiguous chunks so each rayon task
//! checks for cancellation between chunks instead of between single units.

use std::ops::Range;

/// Splits `total` units into at most `chunks` contiguous index ranges. The
/// first `total % chunks` ranges hold one extra unit.
///
/// ```
/// # use npcgen::parallel::batch_ranges;
/// assert_eq!(batch_ranges(10, 3), vec![0..4, 4..7, 7..10]);
/// ```
pub fn batch_ranges(total: usize, chunks: usize) -> Vec<Range<usize>> {
    if total == 0 || chunks == 0 {
        return Vec::new();
    }
    let chunks = chunks.min(total);
    let (base, remainder) = (total / chunks, total % chunks);
    (0..chunks)
        .scan(0, |start, index| {
            let len = base + usize::from(index < remainder);
            let range = *start..*start + len;
            *start = range.end;
            Some(range)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_every_unit_once() {
        let ranges = batch_ranges(20 * 7, 16);
        assert_eq!(ranges.len(), 16);
        assert_eq!(ranges.first().map(|r| r.start), Some(0));
        assert_eq!(ranges.last().map(|r| r.end), Some(140));
        assert!(ranges.windows(2).all(|pair| pair[0].end == pair[1].start));
    }

    #[test]
    fn never_more_chunks_than_units() {
        assert_eq!(batch_ranges(3, 10), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn nothing_to_split() {
        assert!(batch_ranges(0, 4).is_empty());
        assert!(batch_ranges(20, 0).is_empty());
    }
}
