//! Deterministic overlap resolution over labeled byte ranges.
//!
//! Reported ranges routinely overlap (inlined symbols, linker padding,
//! compile units spanning sections). Attribution must hand every byte to
//! exactly one owner: the narrowest covering range wins, ties go to the
//! lexicographically smallest label, and scope bytes covered by no range
//! surface as an explicit gap rather than vanishing.

/// A labeled `[start, start + size)` extent at one hierarchy level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeRange {
    pub start: u64,
    pub size: u64,
    pub label: String,
}

impl SizeRange {
    pub fn new(start: u64, size: u64, label: impl Into<String>) -> Self {
        SizeRange {
            start,
            size,
            label: label.into(),
        }
    }

    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size)
    }
}

/// One disjoint stretch of a resolved coverage map. `label` is None over
/// gaps inside the scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start: u64,
    pub end: u64,
    pub label: Option<String>,
}

impl Segment {
    pub fn size(&self) -> u64 {
        self.end - self.start
    }
}

/// Sort, clip, and merge scope intervals into disjoint ascending form.
pub fn normalize_scope(scope: &[(u64, u64)]) -> Vec<(u64, u64)> {
    let mut scope: Vec<(u64, u64)> = scope.iter().copied().filter(|(s, e)| e > s).collect();
    scope.sort_unstable();
    let mut merged: Vec<(u64, u64)> = Vec::with_capacity(scope.len());
    for (start, end) in scope {
        match merged.last_mut() {
            Some((_, prev_end)) if start <= *prev_end => *prev_end = (*prev_end).max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Resolve overlapping `ranges` into a disjoint coverage of `scope`.
///
/// The result covers every scope byte exactly once: segments are emitted
/// in ascending order, adjacent segments with the same owner are merged,
/// and uncovered stretches carry a `None` label. Bytes outside the scope
/// are ignored entirely, so the sum of segment sizes always equals the
/// scope size.
pub fn resolve(ranges: &[SizeRange], scope: &[(u64, u64)]) -> Vec<Segment> {
    let scope = normalize_scope(scope);
    if scope.is_empty() {
        return Vec::new();
    }

    // Elementary interval boundaries: every range edge and scope edge.
    let mut bounds: Vec<u64> = Vec::with_capacity(ranges.len() * 2 + scope.len() * 2);
    // (position, is_start, range index)
    let mut events: Vec<(u64, bool, usize)> = Vec::with_capacity(ranges.len() * 2);
    for &(start, end) in &scope {
        bounds.push(start);
        bounds.push(end);
    }
    for (idx, range) in ranges.iter().enumerate() {
        if range.size == 0 {
            continue;
        }
        bounds.push(range.start);
        bounds.push(range.end());
        events.push((range.start, true, idx));
        events.push((range.end(), false, idx));
    }
    bounds.sort_unstable();
    bounds.dedup();
    // Closes sort before opens at the same position.
    events.sort_unstable_by_key(|&(pos, is_start, _)| (pos, is_start));

    let mut active: Vec<usize> = Vec::new();
    let mut next_event = 0usize;
    let mut out: Vec<Segment> = Vec::new();
    for window in bounds.windows(2) {
        let (lo, hi) = (window[0], window[1]);
        while next_event < events.len() && events[next_event].0 <= lo {
            let (_, is_start, idx) = events[next_event];
            if is_start {
                active.push(idx);
            } else {
                active.retain(|&j| j != idx);
            }
            next_event += 1;
        }
        if !scope.iter().any(|&(s, e)| s <= lo && hi <= e) {
            continue;
        }
        let owner = active
            .iter()
            .min_by(|&&a, &&b| {
                ranges[a]
                    .size
                    .cmp(&ranges[b].size)
                    .then_with(|| ranges[a].label.cmp(&ranges[b].label))
            })
            .map(|&idx| ranges[idx].label.clone());
        match out.last_mut() {
            Some(prev) if prev.end == lo && prev.label == owner => prev.end = hi,
            _ => out.push(Segment {
                start: lo,
                end: hi,
                label: owner,
            }),
        }
    }
    out
}

/// Find the segment covering `pos` in a resolved coverage map.
pub fn segment_at(segments: &[Segment], pos: u64) -> Option<&Segment> {
    let idx = segments.partition_point(|seg| seg.end <= pos);
    segments
        .get(idx)
        .filter(|seg| seg.start <= pos && pos < seg.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(segments: &[Segment]) -> Vec<(u64, u64, Option<&str>)> {
        segments
            .iter()
            .map(|s| (s.start, s.end, s.label.as_deref()))
            .collect()
    }

    #[test]
    fn narrower_range_wins() {
        let ranges = vec![
            SizeRange::new(0, 100, "outer"),
            SizeRange::new(10, 20, "inner"),
        ];
        let segments = resolve(&ranges, &[(0, 100)]);
        assert_eq!(
            labels(&segments),
            vec![
                (0, 10, Some("outer")),
                (10, 30, Some("inner")),
                (30, 100, Some("outer")),
            ]
        );
    }

    #[test]
    fn equal_size_tie_breaks_on_label() {
        let ranges = vec![SizeRange::new(0, 10, "beta"), SizeRange::new(0, 10, "alfa")];
        let segments = resolve(&ranges, &[(0, 10)]);
        assert_eq!(labels(&segments), vec![(0, 10, Some("alfa"))]);
    }

    #[test]
    fn gaps_stay_visible() {
        let ranges = vec![SizeRange::new(10, 20, "x")];
        let segments = resolve(&ranges, &[(0, 50)]);
        assert_eq!(
            labels(&segments),
            vec![(0, 10, None), (10, 30, Some("x")), (30, 50, None)]
        );
    }

    #[test]
    fn no_byte_counted_twice() {
        let ranges = vec![
            SizeRange::new(0, 60, "a"),
            SizeRange::new(40, 60, "b"),
            SizeRange::new(20, 50, "c"),
        ];
        let segments = resolve(&ranges, &[(0, 100)]);
        let total: u64 = segments.iter().map(Segment::size).sum();
        assert_eq!(total, 100);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn bytes_outside_scope_are_ignored() {
        let ranges = vec![SizeRange::new(0, 100, "x")];
        let segments = resolve(&ranges, &[(20, 40)]);
        assert_eq!(labels(&segments), vec![(20, 40, Some("x"))]);
    }

    #[test]
    fn zero_size_ranges_are_skipped() {
        let ranges = vec![SizeRange::new(5, 0, "ghost"), SizeRange::new(0, 10, "real")];
        let segments = resolve(&ranges, &[(0, 10)]);
        assert_eq!(labels(&segments), vec![(0, 10, Some("real"))]);
    }

    #[test]
    fn disjoint_scope_pieces() {
        let ranges = vec![SizeRange::new(0, 100, "x")];
        let segments = resolve(&ranges, &[(0, 10), (20, 30)]);
        assert_eq!(
            labels(&segments),
            vec![(0, 10, Some("x")), (20, 30, Some("x"))]
        );
        let total: u64 = segments.iter().map(Segment::size).sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn segment_lookup() {
        let ranges = vec![SizeRange::new(10, 20, "x")];
        let segments = resolve(&ranges, &[(0, 50)]);
        assert_eq!(segment_at(&segments, 15).unwrap().label.as_deref(), Some("x"));
        assert_eq!(segment_at(&segments, 45).unwrap().label, None);
        assert!(segment_at(&segments, 50).is_none());
    }

    #[test]
    fn resolution_is_deterministic() {
        let ranges = vec![
            SizeRange::new(0, 30, "b"),
            SizeRange::new(0, 30, "a"),
            SizeRange::new(10, 5, "z"),
        ];
        let first = resolve(&ranges, &[(0, 40)]);
        let second = resolve(&ranges, &[(0, 40)]);
        assert_eq!(first, second);
    }
}
