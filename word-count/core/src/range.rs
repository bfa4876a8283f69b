// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use serde::{Deserialize, Serialize};

/// Inclusive interval `[start, end]` over the frequency key space.
/// An empty key set has no range; callers carry that as `Option<Range>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: u64,
    pub end: u64,
}

impl Range {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "range start {} past end {}", start, end);
        Self { start, end }
    }

    pub fn contains(&self, key: u64) -> bool {
        self.start <= key && key <= self.end
    }

    /// Exact extent of a key set
    pub fn from_keys(keys: impl IntoIterator<Item = u64>) -> Option<Range> {
        keys.into_iter().fold(None, |range, key| match range {
            None => Some(Range::new(key, key)),
            Some(r) => Some(Range::new(r.start.min(key), r.end.max(key))),
        })
    }

    /// Smallest range covering all inputs; `merge([r]) == r`
    pub fn merge(ranges: impl IntoIterator<Item = Range>) -> Option<Range> {
        ranges.into_iter().reduce(|acc, r| {
            Range::new(acc.start.min(r.start), acc.end.max(r.end))
        })
    }

    fn bucket_width(&self, n: usize) -> u64 {
        (self.end - self.start) / n as u64
    }

    /// Index of the worker owning `key` when this range is cut into `n`
    /// equal-width buckets. The first `i` with
    /// `key <= start + (i + 1) * floor((end - start) / n)` wins; the last
    /// worker takes everything beyond, including the division remainder.
    pub fn attribute_to(&self, key: u64, n: usize) -> usize {
        let last = n.saturating_sub(1);
        if n == 0 || key <= self.start {
            return 0;
        }
        let width = self.bucket_width(n);
        if width == 0 {
            return last;
        }
        // first i with (key - start) <= (i + 1) * width
        let index = (key - self.start - 1) / width;
        usize::try_from(index).map_or(last, |i| i.min(last))
    }

    /// Sub-range owned by worker `id` out of `n`, the inverse of
    /// [`Range::attribute_to`]. Returns `None` when truncation leaves the
    /// worker with nothing, which happens when the range is narrower than `n`,
    /// and when `id` is not one of the `n` workers.
    pub fn machine_range(&self, id: usize, n: usize) -> Option<Range> {
        if id >= n {
            return None;
        }
        let width = self.bucket_width(n);
        let id_offset = id as u64 * width;
        let (start, end) = if id == 0 {
            (self.start, self.start + width)
        } else if id + 1 == n {
            (self.start + id_offset + 1, self.end)
        } else {
            (self.start + id_offset + 1, self.start + id_offset + width)
        };
        (start <= end).then(|| Range::new(start, end))
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Linear scan straight from the routing rule
    fn attribute_by_scan(range: &Range, key: u64, n: usize) -> usize {
        let width = (range.end - range.start) / n as u64;
        (0..n)
            .find(|&i| key <= range.start + (i as u64 + 1) * width)
            .unwrap_or(n - 1)
    }

    #[test]
    fn test_from_keys() {
        assert_eq!(Range::from_keys([4, 9, 1, 7]), Some(Range::new(1, 9)));
        assert_eq!(Range::from_keys([5]), Some(Range::new(5, 5)));
        assert_eq!(Range::from_keys(Vec::<u64>::new()), None);
    }

    #[test]
    fn test_merge_single_is_identity() {
        let r = Range::new(3, 33);
        assert_eq!(Range::merge([r]), Some(r));
    }

    #[test]
    fn test_merge_takes_min_start_and_max_end() {
        let merged = Range::merge([Range::new(5, 10), Range::new(2, 6), Range::new(7, 40)]);
        assert_eq!(merged, Some(Range::new(2, 40)));
        assert_eq!(Range::merge(Vec::new()), None);
    }

    #[test]
    fn test_attribute_matches_scan() {
        for (start, end) in [(0, 0), (3, 33), (2, 3), (1, 100), (10, 17), (0, 1000)] {
            let range = Range::new(start, end);
            for n in 1..=12 {
                for key in start..=end {
                    assert_eq!(
                        range.attribute_to(key, n),
                        attribute_by_scan(&range, key, n),
                        "range {} key {} n {}",
                        range,
                        key,
                        n
                    );
                }
            }
        }
    }

    #[test]
    fn test_inverse_consistency() {
        for (start, end) in [(0, 0), (3, 33), (2, 3), (1, 100), (10, 17), (5, 6)] {
            let range = Range::new(start, end);
            for n in 1..=12 {
                for key in start..=end {
                    let id = range.attribute_to(key, n);
                    assert!(id < n);
                    let owned = range
                        .machine_range(id, n)
                        .unwrap_or_else(|| panic!("worker {} of {} owns nothing", id, n));
                    assert!(
                        owned.contains(key),
                        "key {} routed to {} which owns {}",
                        key,
                        id,
                        owned
                    );
                }
            }
        }
    }

    #[test]
    fn test_machine_ranges_tile_the_range() {
        let range = Range::new(3, 33);
        let n = 10;
        let owned: Vec<Range> = (0..n).filter_map(|id| range.machine_range(id, n)).collect();
        assert_eq!(owned.first().unwrap().start, 3);
        assert_eq!(owned.last().unwrap().end, 33);
        for pair in owned.windows(2) {
            assert_eq!(pair[0].end + 1, pair[1].start);
        }
    }

    #[test]
    fn test_last_worker_absorbs_remainder() {
        // width floor(30 / 4) = 7, so the last bucket is [25, 33]
        let range = Range::new(3, 33);
        assert_eq!(range.machine_range(0, 4), Some(Range::new(3, 10)));
        assert_eq!(range.machine_range(3, 4), Some(Range::new(25, 33)));
    }

    #[test]
    fn test_narrow_range_leaves_middle_workers_empty() {
        let range = Range::new(2, 3);
        assert_eq!(range.attribute_to(2, 3), 0);
        assert_eq!(range.attribute_to(3, 3), 2);
        assert_eq!(range.machine_range(1, 3), None);
    }

    #[test]
    fn test_zero_workers_own_nothing() {
        let range = Range::new(3, 33);
        assert_eq!(range.machine_range(0, 0), None);
        assert_eq!(range.machine_range(4, 4), None);
        assert_eq!(range.attribute_to(5, 0), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Range::new(3, 33).to_string(), "[3, 33]");
    }
}
