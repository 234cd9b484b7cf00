/// The result of partitioning an `H`-row image across `P` ranks (§3, §4.2).
/// Pure data: the function that computes it lives in `core-partition`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    /// `local_height(i)` for each rank `i`.
    pub local_heights: Vec<usize>,
    /// Global row offset (image-row index of the first row) owned by each
    /// rank, in rank order.
    pub row_offsets: Vec<usize>,
    /// `byte_counts[i] = local_height(i) * width * 3`.
    pub byte_counts: Vec<usize>,
    /// Cumulative byte offset of each rank's slice in a whole-image buffer.
    pub byte_offsets: Vec<usize>,
}

impl PartitionPlan {
    pub fn rank_count(&self) -> usize {
        self.local_heights.len()
    }

    pub fn local_height(&self, rank: usize) -> usize {
        self.local_heights[rank]
    }

    pub fn row_offset(&self, rank: usize) -> usize {
        self.row_offsets[rank]
    }
}
