use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::capacity::error::{SizingError, SizingResult};

/// One worker's slice of the ordered site table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shard {
    pub id: usize,
    pub count: usize,
}

impl Shard {
    /// Fails with [`SizingError::PartitionBounds`] unless `id < count`
    pub fn new(id: usize, count: usize) -> SizingResult<Self> {
        if id >= count {
            return Err(SizingError::PartitionBounds {
                shard_id: id,
                shard_count: count,
            });
        }
        Ok(Self { id, count })
    }

    pub fn is_last(&self) -> bool {
        self.id + 1 == self.count
    }

    /// Sites per shard: `ceil(total / count)`
    pub fn stride(&self, total: usize) -> usize {
        total.div_ceil(self.count)
    }

    /// Contiguous index range of this shard in a table of `total` sites.
    ///
    /// Every shard but the last covers `stride` sites; the last one takes
    /// whatever remains. Ranges are clamped to `total`, so trailing shards of a
    /// small table can be empty.
    pub fn site_range(&self, total: usize) -> Range<usize> {
        let stride = self.stride(total);
        let start = (self.id * stride).min(total);
        let end = if self.is_last() {
            total
        } else {
            ((self.id + 1) * stride).min(total)
        };
        start..end
    }
}

/// Ranges of all shards of a run, in shard order
pub fn partition(total: usize, shard_count: usize) -> SizingResult<Vec<Range<usize>>> {
    (0..shard_count.max(1))
        .map(|id| Shard::new(id, shard_count).map(|shard| shard.site_range(total)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_shard_takes_remainder() {
        let ranges = partition(97, 10).unwrap();
        assert_eq!(ranges.len(), 10);
        for range in &ranges[..9] {
            assert_eq!(range.len(), 10);
        }
        assert_eq!(ranges[9], 90..97);
        assert_eq!(ranges[9].len(), 97 - 9 * 97usize.div_ceil(10));
    }

    #[test]
    fn test_partition_is_exact_for_any_size() {
        for shard_count in 1..=12 {
            for total in 0..=40 {
                let ranges = partition(total, shard_count).unwrap();
                let joined: Vec<usize> = ranges.iter().flat_map(|r| r.clone()).collect();
                let expected: Vec<usize> = (0..total).collect();
                assert_eq!(
                    joined, expected,
                    "total={total} shard_count={shard_count}"
                );

                let stride = total.div_ceil(shard_count);
                for range in &ranges {
                    assert!(range.len() <= stride);
                }
            }
        }
    }

    #[test]
    fn test_shard_out_of_bounds() {
        assert!(matches!(
            Shard::new(10, 10),
            Err(SizingError::PartitionBounds {
                shard_id: 10,
                shard_count: 10
            })
        ));
        assert!(Shard::new(0, 0).is_err());
        assert!(partition(5, 0).is_err());
    }

    #[test]
    fn test_single_shard_covers_everything() {
        let shard = Shard::new(0, 1).unwrap();
        assert!(shard.is_last());
        assert_eq!(shard.site_range(13), 0..13);
        assert_eq!(shard.site_range(0), 0..0);
    }

    #[test]
    fn test_small_table_leaves_trailing_shards_empty() {
        // stride 2: shards 0..=4 get two sites, shard 5 gets one, the rest nothing
        let ranges = partition(11, 10).unwrap();
        assert_eq!(ranges[4], 8..10);
        assert_eq!(ranges[5], 10..11);
        assert!(ranges[6..].iter().all(|r| r.is_empty()));
    }
}
