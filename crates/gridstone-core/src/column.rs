//! Column metadata and interval management
//!
//! Column properties (width, format, hidden, outline) apply to contiguous
//! 1-based `[first_col, last_col]` intervals. The stored set of records
//! must always partition the touched column space: no overlaps, no property
//! applied outside its requested range. The split step is a pure function
//! over the interval map so the invariant can be verified in isolation.

use std::collections::BTreeMap;

/// Metadata for a contiguous run of columns
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnInfo {
    /// First column of the span (1-based, inclusive)
    pub first_col: u16,
    /// Last column of the span (1-based, inclusive)
    pub last_col: u16,
    /// Custom width in character units (None = sheet default)
    pub width: Option<f64>,
    /// Column-level format index (None = no column format)
    pub format: Option<u32>,
    /// Columns are hidden
    pub hidden: bool,
    /// Outline/grouping level (0-7)
    pub outline_level: u8,
    /// Columns are collapsed (in outline)
    pub collapsed: bool,
}

impl ColumnInfo {
    /// Create a record for a span with default settings
    pub fn new(first_col: u16, last_col: u16) -> Self {
        Self {
            first_col,
            last_col,
            width: None,
            format: None,
            hidden: false,
            outline_level: 0,
            collapsed: false,
        }
    }

    /// Check if this record carries any custom settings
    pub fn has_custom_settings(&self) -> bool {
        self.width.is_some()
            || self.format.is_some()
            || self.hidden
            || self.outline_level > 0
            || self.collapsed
    }
}

/// Split any record straddling `boundary` so that no record spans it
///
/// A record covering `[a, b]` with `a < boundary <= b` becomes `[a,
/// boundary-1]` and `[boundary, b]`; both halves inherit the original
/// properties. Pure: consumes and returns the map.
pub(crate) fn split_at(
    mut map: BTreeMap<u16, ColumnInfo>,
    boundary: u16,
) -> BTreeMap<u16, ColumnInfo> {
    // The only candidate is the record starting at or before the boundary.
    let candidate = map
        .range(..=boundary)
        .next_back()
        .map(|(&start, info)| (start, info.clone()));

    if let Some((start, info)) = candidate {
        if start < boundary && info.last_col >= boundary {
            let mut left = info.clone();
            left.last_col = boundary - 1;
            let mut right = info;
            right.first_col = boundary;
            map.insert(start, left);
            map.insert(boundary, right);
        }
    }

    map
}

/// Apply `apply` to every column in `[first, last]`, preserving the partition
///
/// Records straddling either boundary are split first; records then fully
/// inside the range are updated in place, and gap sub-ranges get freshly
/// created records.
pub(crate) fn apply_to_interval<F>(
    map: BTreeMap<u16, ColumnInfo>,
    first: u16,
    last: u16,
    mut apply: F,
) -> BTreeMap<u16, ColumnInfo>
where
    F: FnMut(&mut ColumnInfo),
{
    let mut map = split_at(split_at(map, first), last + 1);

    // Widen to u32 so the cursor can step past the last column.
    let mut cursor = first as u32;
    let mut gaps: Vec<(u16, u16)> = Vec::new();

    for (&start, info) in map.range_mut(first..=last) {
        if start as u32 > cursor {
            gaps.push((cursor as u16, start - 1));
        }
        apply(info);
        cursor = info.last_col as u32 + 1;
    }
    if cursor <= last as u32 {
        gaps.push((cursor as u16, last));
    }

    for (a, b) in gaps {
        let mut info = ColumnInfo::new(a, b);
        apply(&mut info);
        map.insert(a, info);
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(map: &BTreeMap<u16, ColumnInfo>) -> Vec<(u16, u16)> {
        map.values().map(|c| (c.first_col, c.last_col)).collect()
    }

    /// The partition invariant: keys match spans, spans are ordered and
    /// non-overlapping.
    fn assert_partition(map: &BTreeMap<u16, ColumnInfo>) {
        let mut prev_end = 0u16;
        for (&start, info) in map {
            assert_eq!(start, info.first_col);
            assert!(info.first_col <= info.last_col);
            assert!(info.first_col > prev_end, "overlapping records");
            prev_end = info.last_col;
        }
    }

    #[test]
    fn test_split_straddling_record() {
        let mut map = BTreeMap::new();
        map.insert(1, {
            let mut c = ColumnInfo::new(1, 10);
            c.width = Some(20.0);
            c
        });

        let map = split_at(map, 5);
        assert_eq!(spans(&map), vec![(1, 4), (5, 10)]);
        // Both halves inherit the original properties
        assert_eq!(map[&1].width, Some(20.0));
        assert_eq!(map[&5].width, Some(20.0));
        assert_partition(&map);
    }

    #[test]
    fn test_split_is_noop_on_boundary_edge() {
        let mut map = BTreeMap::new();
        map.insert(3, ColumnInfo::new(3, 6));

        // Splitting at a record's start or past its end changes nothing.
        let map = split_at(map, 3);
        assert_eq!(spans(&map), vec![(3, 6)]);
        let map = split_at(map, 7);
        assert_eq!(spans(&map), vec![(3, 6)]);
    }

    #[test]
    fn test_apply_fills_gaps() {
        let map = apply_to_interval(BTreeMap::new(), 2, 5, |c| c.width = Some(12.0));
        assert_eq!(spans(&map), vec![(2, 5)]);
        assert_eq!(map[&2].width, Some(12.0));
        assert_partition(&map);
    }

    #[test]
    fn test_apply_over_overlapping_request() {
        // [1,10] wide, then hide [4,6]: the wide record splits around the
        // hidden middle and every piece keeps its width.
        let map = apply_to_interval(BTreeMap::new(), 1, 10, |c| c.width = Some(20.0));
        let map = apply_to_interval(map, 4, 6, |c| c.hidden = true);

        assert_eq!(spans(&map), vec![(1, 3), (4, 6), (7, 10)]);
        assert!(map[&4].hidden);
        assert!(!map[&1].hidden && !map[&7].hidden);
        for info in map.values() {
            assert_eq!(info.width, Some(20.0));
        }
        assert_partition(&map);
    }

    #[test]
    fn test_apply_partial_overlap_both_sides() {
        let map = apply_to_interval(BTreeMap::new(), 3, 6, |c| c.width = Some(8.0));
        let map = apply_to_interval(map, 5, 9, |c| c.width = Some(30.0));

        assert_eq!(spans(&map), vec![(3, 4), (5, 6), (7, 9)]);
        assert_eq!(map[&3].width, Some(8.0));
        assert_eq!(map[&5].width, Some(30.0));
        assert_eq!(map[&7].width, Some(30.0));
        assert_partition(&map);
    }

    #[test]
    fn test_partition_survives_arbitrary_sequences() {
        let requests = [(1u16, 4u16), (3, 8), (2, 2), (6, 12), (1, 12), (10, 11)];
        let mut map = BTreeMap::new();
        for (i, &(a, b)) in requests.iter().enumerate() {
            map = apply_to_interval(map, a, b, |c| c.width = Some(i as f64));
            assert_partition(&map);
        }
        // Coverage is exactly the union of requested ranges: [1,12]
        assert_eq!(map.values().next().unwrap().first_col, 1);
        assert_eq!(map.values().next_back().unwrap().last_col, 12);
        let covered: u32 = map.values().map(|c| (c.last_col - c.first_col + 1) as u32).sum();
        assert_eq!(covered, 12);
    }
}
