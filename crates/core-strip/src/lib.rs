//! Strip buffer manager (§4.3): allocates the zero-initialized padded input
//! strip and output strip each rank needs for a single convolution pass.

use core_model::{OutputStrip, PaddedStrip};

/// Allocates a `(local_height + 2*padding) x (width + 2*padding)` padded
/// input strip and a `local_height x width` output strip, both
/// zero-initialized. Allocated once per run and reused across the single
/// convolution pass (§3 lifecycle).
pub fn allocate_strip(local_height: usize, width: usize, padding: usize) -> (PaddedStrip, OutputStrip) {
    tracing::debug!(
        target: "strip",
        local_height,
        width,
        padding,
        "allocating strip buffers"
    );
    let input = PaddedStrip::zeroed(local_height, width, padding);
    let output = OutputStrip::zeroed(local_height, width);
    (input, output)
}
