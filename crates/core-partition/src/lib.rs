//! The row-strip decomposition (§3 Partition, §4.2). A pure function of
//! `(height, rank_count)`; every other component builds on the plan it
//! returns.

use core_model::{PartitionPlan, Result, StencilError};

/// Computes `local_height(i) = q + (1 if i < r else 0)` for `q = H/P`,
/// `r = H mod P`, and the cumulative row/byte offsets that follow from it.
///
/// This is the *only* partition rule (§3); rank 0 owns the topmost rows and
/// rank `P-1` the bottommost.
pub fn partition(height: usize, rank_count: usize, width: usize) -> PartitionPlan {
    assert!(rank_count > 0, "rank_count must be positive");

    let q = height / rank_count;
    let r = height % rank_count;

    let mut local_heights = Vec::with_capacity(rank_count);
    let mut row_offsets = Vec::with_capacity(rank_count);
    let mut byte_counts = Vec::with_capacity(rank_count);
    let mut byte_offsets = Vec::with_capacity(rank_count);

    let mut row = 0usize;
    let mut byte_offset = 0usize;
    for i in 0..rank_count {
        let local_height = q + if i < r { 1 } else { 0 };
        let byte_count = local_height * width * 3;

        local_heights.push(local_height);
        row_offsets.push(row);
        byte_counts.push(byte_count);
        byte_offsets.push(byte_offset);

        row += local_height;
        byte_offset += byte_count;
    }

    tracing::debug!(
        target: "partition",
        height,
        rank_count,
        width,
        ?local_heights,
        "computed partition plan"
    );

    PartitionPlan {
        local_heights,
        row_offsets,
        byte_counts,
        byte_offsets,
    }
}

/// Rejects a plan where any rank owns fewer than `padding + 1` rows, per
/// §3's invariant "padding ≤ local_height − 1" (`PartitionInfeasible` in
/// §7). The halo exchange's top-real and bottom-real row ranges may
/// overlap below `2*padding` local rows, but that only means the same row
/// is sent to both neighbors — still a valid halo row for each, so it does
/// not need its own, stricter bound.
pub fn check_feasible(plan: &PartitionPlan, padding: usize) -> Result<()> {
    let minimum = padding + 1;
    for (rank, &local_height) in plan.local_heights.iter().enumerate() {
        if local_height < minimum {
            return Err(StencilError::PartitionInfeasible {
                rank,
                local_height,
                padding,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_is_complete() {
        for height in 1..=20usize {
            for ranks in 1..=8usize {
                let plan = partition(height, ranks, 10);
                let total: usize = plan.local_heights.iter().sum();
                assert_eq!(total, height);
                let q = height / ranks;
                for &lh in &plan.local_heights {
                    assert!(lh == q || lh == q + 1);
                }
            }
        }
    }

    #[test]
    fn row_offsets_are_cumulative_and_contiguous() {
        let plan = partition(10, 3, 4);
        assert_eq!(plan.local_heights, vec![4, 3, 3]);
        assert_eq!(plan.row_offsets, vec![0, 4, 7]);
    }

    #[test]
    fn byte_counts_match_width_times_three() {
        let plan = partition(9, 3, 5);
        assert_eq!(plan.byte_counts, vec![45, 45, 45]);
        assert_eq!(plan.byte_offsets, vec![0, 45, 90]);
    }

    #[test]
    fn rank0_owns_topmost_rows() {
        // Rank 0's row_offset is always 0, matching "rank 0 owns the
        // topmost rows" (§3).
        let plan = partition(7, 4, 1);
        assert_eq!(plan.row_offset(0), 0);
    }

    #[test]
    fn detects_infeasible_partition() {
        // height=2, ranks=2 -> local_height=1 each; padding=1 needs at
        // least 2 local rows (padding+1) and this plan has only 1.
        let plan = partition(2, 2, 1);
        assert!(check_feasible(&plan, 1).is_err());

        // height=4, ranks=2 -> local_height=2 each; exactly padding+1 for
        // padding=1.
        let plan = partition(4, 2, 1);
        assert!(check_feasible(&plan, 1).is_ok());
    }

    #[test]
    fn accepts_strips_thinner_than_twice_the_padding() {
        // height=3, ranks=1 -> local_height=3, padding=2 (K=5): below
        // 2*padding=4, but still >= padding+1=3, so §3's invariant holds
        // and the halo exchange's overlapping top/bottom real-row reads
        // (§4.6) are still well-defined.
        let plan = partition(3, 1, 4);
        assert!(check_feasible(&plan, 2).is_ok());

        // One row short of that is still infeasible.
        let plan = partition(2, 1, 4);
        assert!(check_feasible(&plan, 2).is_err());
    }
}
