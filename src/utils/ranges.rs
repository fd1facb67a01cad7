use crate::core::shared::align4;

/// Byte range one attribute occupies in its source buffer. Ranges without a
/// buffer have no source data and are never merged with anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SourceRange {
    pub attribute: usize,
    pub buffer: Option<u32>,
    pub begin: usize,
    pub end: usize,
}

/// A merged range to be copied into the arena, or zero-filled if it has no
/// buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placement {
    pub buffer: Option<u32>,
    pub begin: usize,
    pub end: usize,
    pub arena_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    pub size: usize,
    pub placements: Vec<Placement>,
    /// Arena offset of the first byte of every attribute, indexed by
    /// `SourceRange::attribute`.
    pub offsets: Vec<usize>,
}

/// Merges touching and overlapping ranges of the same buffer and places the
/// result into one arena, each merged range aligned to four bytes.
///
/// Ranges are ordered by buffer, begin and attribute, so the layout doesn't
/// depend on the order the ranges are passed in. Ranges without a buffer end
/// up last in attribute order.
pub(crate) fn layout(mut ranges: Vec<SourceRange>) -> Layout {
    ranges.sort_by_key(|r| (r.buffer.is_none(), r.buffer, r.begin, r.attribute));

    let mut placements: Vec<Placement> = Vec::new();
    let mut offsets = vec![0; ranges.len()];
    let mut size = 0;
    for range in &ranges {
        let merge = match (placements.last_mut(), range.buffer) {
            (Some(last), Some(buffer)) => last.buffer == Some(buffer) && range.begin <= last.end,
            _ => false,
        };
        if merge {
            if let Some(last) = placements.last_mut() {
                if range.end > last.end {
                    size += align4(range.end - last.begin) - align4(last.end - last.begin);
                    last.end = range.end;
                }
            }
        } else {
            placements.push(Placement {
                buffer: range.buffer,
                begin: range.begin,
                end: range.end,
                arena_offset: size,
            });
            size += align4(range.end - range.begin);
        }
        if let Some(last) = placements.last() {
            offsets[range.attribute] = last.arena_offset + (range.begin - last.begin);
        }
    }
    Layout { size, placements, offsets }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(attribute: usize, buffer: Option<u32>, begin: usize, end: usize) -> SourceRange {
        SourceRange { attribute, buffer, begin, end }
    }

    #[test]
    fn test_disjoint_ranges() {
        let layout = layout(vec![range(0, Some(0), 0, 6), range(1, Some(0), 8, 13), range(2, None, 0, 3)]);
        assert_eq!(layout.size, 8 + 8 + 4, "each range is padded to four bytes");
        assert_eq!(layout.offsets, vec![0, 8, 16]);
    }

    #[test]
    fn test_interleaved_ranges_are_copied_once() {
        // Position at 0 and normal at 12 in a 24-byte stride, 3 vertices
        let layout = layout(vec![range(0, Some(0), 0, 60), range(1, Some(0), 12, 72)]);
        assert_eq!(layout.size, 72);
        assert_eq!(layout.placements.len(), 1);
        assert_eq!(layout.offsets, vec![0, 12]);
    }

    #[test]
    fn test_touching_and_contained_ranges() {
        let layout = layout(vec![
            range(0, Some(1), 10, 20),
            range(1, Some(1), 20, 22),
            range(2, Some(1), 0, 30),
        ]);
        assert_eq!(layout.placements, vec![Placement { buffer: Some(1), begin: 0, end: 30, arena_offset: 0 }]);
        assert_eq!(layout.size, 32);
        assert_eq!(layout.offsets, vec![10, 20, 0]);
    }

    #[test]
    fn test_order_independence() {
        let a = vec![
            range(0, Some(2), 0, 8),
            range(1, Some(0), 4, 12),
            range(2, None, 0, 4),
            range(3, Some(0), 0, 4),
        ];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(layout(a), layout(b));
    }

    #[test]
    fn test_same_range_in_different_buffers() {
        let layout = layout(vec![range(0, Some(1), 0, 4), range(1, Some(0), 0, 4)]);
        assert_eq!(layout.offsets, vec![4, 0], "buffer 0 goes first");
    }
}
