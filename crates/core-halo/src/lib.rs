//! Halo exchange (§4.6, C6): each rank trades its topmost and bottommost
//! `padding` real rows with its vertical neighbors, filling in the halo
//! rows of a [`PaddedStrip`] before convolution can touch them.
//!
//! Grounded on the original's `exchange_frontiers`: a rank with a
//! predecessor exchanges with `rank - 1`, a rank with a successor exchanges
//! with `rank + 1`, using paired non-blocking transfers so that no two
//! ranks are both waiting on a blocking send at the same time. A rank's
//! `local_height` is only required (by `core_partition::check_feasible`) to
//! be at least `padding + 1`, so the top-real and bottom-real row ranges
//! this function reads from may overlap when `local_height < 2*padding`;
//! that is harmless because both are read-only send sources, never write
//! targets.

use mpi::request::{scope, WaitGuard};
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use core_model::{PaddedStrip, Pixel};

/// Reinterprets a pixel slice as a flat byte buffer. Sound because
/// [`Pixel`] is `repr(C)` with no padding: three contiguous `u8` fields.
fn pixel_bytes(pixels: &[Pixel]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(pixels.as_ptr() as *const u8, std::mem::size_of_val(pixels)) }
}

fn pixel_bytes_mut(pixels: &mut [Pixel]) -> &mut [u8] {
    unsafe { std::slice::from_raw_parts_mut(pixels.as_mut_ptr() as *mut u8, std::mem::size_of_val(pixels)) }
}

/// Exchanges halo rows with this rank's vertical neighbors in the
/// communicator's row-partition order (§4.6). Rank 0 has no predecessor;
/// the last rank has no successor.
pub fn exchange_halos(world: &SimpleCommunicator, strip: &mut PaddedStrip) {
    let rank = world.rank();
    let size = world.size();
    let padding = strip.padding();

    if padding == 0 {
        return;
    }

    let has_predecessor = rank > 0;
    let has_successor = rank < size - 1;
    if !has_predecessor && !has_successor {
        return;
    }

    tracing::debug!(target: "halo", rank, size, padding, "exchanging halo rows");

    let stride = strip.stride();
    let halo_len = padding * stride;

    let pixels = strip.pixels_mut();
    let (top_halo, rest) = pixels.split_at_mut(halo_len);
    let split_point = rest.len() - halo_len;
    let (real_rows, bottom_halo) = rest.split_at_mut(split_point);

    // Real rows are only ever read here (to build the send buffers), so
    // two overlapping shared sub-slices are sound even when
    // `local_height < 2*padding` makes the top and bottom `padding`-row
    // windows overlap.
    let real_rows: &[Pixel] = real_rows;
    let top_real = &real_rows[..halo_len];
    let bottom_real = &real_rows[real_rows.len() - halo_len..];

    scope(|scope| {
        let mut guards = Vec::new();

        if has_predecessor {
            let predecessor = world.process_at_rank(rank - 1);
            guards.push(predecessor.immediate_send(scope, pixel_bytes(top_real)));
            guards.push(predecessor.immediate_receive_into(scope, pixel_bytes_mut(top_halo)));
        }

        if has_successor {
            let successor = world.process_at_rank(rank + 1);
            guards.push(successor.immediate_send(scope, pixel_bytes(bottom_real)));
            guards.push(successor.immediate_receive_into(scope, pixel_bytes_mut(bottom_halo)));
        }

        for guard in guards {
            WaitGuard::from(guard);
        }
    });
}
