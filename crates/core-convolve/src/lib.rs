//! Thread-parallel convolution kernel (§4.7, C7), the serial oracle that
//! defines its correctness contract (§4.8, C8), and the equality check
//! used to compare them (§4.9, C9).

use core_model::{Image, Kernel, OutputStrip, PaddedStrip, Pixel};

/// Computes one real output row `real_y` of `output_row` (exactly `width`
/// pixels) from the padded input strip, per the accumulation order fixed by
/// §4.7 and §9: row-major over `i` then `j`, saturate, then truncate. This
/// is the single place both the threaded path and the serial oracle read
/// their per-pixel formula from, which is what makes thread-count and
/// rank-count invariance (§8.3) hold by construction.
fn compute_row(input: &PaddedStrip, kernel: &Kernel, real_y: usize, output_row: &mut [Pixel]) {
    let padding = kernel.padding();
    let size = kernel.size();
    let padded_y = real_y + padding;

    for x in 0..output_row.len() {
        let padded_x = x + padding;
        let mut acc_r = 0.0f64;
        let mut acc_g = 0.0f64;
        let mut acc_b = 0.0f64;

        for i in 0..size {
            let in_y = padded_y + i - padding;
            for j in 0..size {
                let in_x = padded_x + j - padding;
                let pixel = input.get(in_y, in_x);
                let weight = kernel.at(i, j);
                acc_r += pixel.r as f64 * weight;
                acc_g += pixel.g as f64 * weight;
                acc_b += pixel.b as f64 * weight;
            }
        }

        output_row[x] = Pixel::new(
            saturate_to_u8(acc_r),
            saturate_to_u8(acc_g),
            saturate_to_u8(acc_b),
        );
    }
}

/// Clamp to `[0.0, 255.0]` *before* truncating toward zero (§4.7): order
/// matters for inputs outside the clamp range.
fn saturate_to_u8(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

/// Runs the convolution over a rank's padded input strip into its output
/// strip, splitting output rows into `number_of_threads` static, contiguous
/// chunks (§4.7, §5). Each chunk is handed a disjoint `&mut [Pixel]` slice,
/// so no cross-thread synchronization is needed: the borrow checker is the
/// proof that no two threads can write the same row.
pub fn convolve(input: &PaddedStrip, output: &mut OutputStrip, kernel: &Kernel, number_of_threads: usize) {
    let width = output.width();
    tracing::debug!(
        target: "convolve",
        local_height = output.local_height(),
        width,
        kernel_size = kernel.size(),
        number_of_threads,
        "starting convolution pass"
    );

    std::thread::scope(|scope| {
        for (row_start, chunk) in output.row_chunks_mut(number_of_threads) {
            scope.spawn(move || {
                for (offset, row) in chunk.chunks_mut(width).enumerate() {
                    compute_row(input, kernel, row_start + offset, row);
                }
            });
        }
    });
}

/// The single-process reference convolution (§4.8, C8): builds a
/// full-image zero-padded strip and runs [`compute_row`] once per row with
/// no worker threads, defining the bit-for-bit correctness oracle that the
/// parallel path is measured against.
pub fn serial_convolve(image: &Image, kernel: &Kernel) -> Image {
    let width = image.width();
    let height = image.height();
    let padding = kernel.padding();

    let mut strip = PaddedStrip::zeroed(height, width, padding);
    for y in 0..height {
        strip.write_real_row(y, image.row(y));
    }

    let mut output = OutputStrip::zeroed(height, width);
    for y in 0..height {
        let row = &mut output.pixels_mut()[y * width..(y + 1) * width];
        compute_row(&strip, kernel, y, row);
    }

    Image::new(width, height, output.pixels().to_vec())
}

/// `equal_results` (§4.9): true iff every channel of every pixel agrees.
pub fn equal_results(a: &Image, b: &Image) -> bool {
    a.width() == b.width() && a.height() == b.height() && a.pixels() == b.pixels()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::Kernel;

    fn identity_kernel(size: usize) -> Kernel {
        let padding = size / 2;
        let mut coeffs = vec![0.0; size * size];
        coeffs[padding * size + padding] = 1.0;
        Kernel::new(size, coeffs).unwrap()
    }

    fn gradient_image(w: usize, h: usize) -> Image {
        let mut pixels = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                pixels.push(Pixel::new(y as u8, x as u8, (x + y) as u8));
            }
        }
        Image::new(w, h, pixels)
    }

    #[test]
    fn identity_kernel_1x1_is_a_no_op() {
        let image = gradient_image(4, 4);
        let out = serial_convolve(&image, &identity_kernel(1));
        assert_eq!(out.pixels(), image.pixels());
    }

    #[test]
    fn identity_kernel_3x3_is_a_no_op() {
        let image = gradient_image(4, 4);
        let out = serial_convolve(&image, &identity_kernel(3));
        assert_eq!(out.pixels(), image.pixels());
    }

    #[test]
    fn sharpen_matches_the_documented_scenario() {
        // S2: 2x2 image, SHARPEN kernel. See SPEC_FULL.md §8.
        let image = Image::new(
            2,
            2,
            vec![
                Pixel::new(10, 10, 10),
                Pixel::new(20, 20, 20),
                Pixel::new(30, 30, 30),
                Pixel::new(40, 40, 40),
            ],
        );
        let kernel = core_ops::lookup("SHARPEN").unwrap();
        let out = serial_convolve(&image, &kernel);
        assert_eq!(out.get(0, 0), Pixel::new(0, 0, 0));
    }

    #[test]
    fn box_blur_of_white_square_stays_white() {
        // S3.
        let image = Image::filled(3, 3, Pixel::new(255, 255, 255));
        let kernel = core_ops::lookup("BOXBLUR").unwrap();
        let out = serial_convolve(&image, &kernel);
        assert!(out.pixels().iter().all(|p| *p == Pixel::new(255, 255, 255)));
    }

    #[test]
    fn saturates_above_255() {
        // S4: 1x1 image, kernel [2.0].
        let image = Image::filled(1, 1, Pixel::new(200, 200, 200));
        let kernel = Kernel::new(1, vec![2.0]).unwrap();
        let out = serial_convolve(&image, &kernel);
        assert_eq!(out.get(0, 0), Pixel::new(255, 255, 255));
    }

    #[test]
    fn saturates_below_zero() {
        let image = Image::filled(3, 3, Pixel::new(10, 10, 10));
        // Coefficients sum well below zero everywhere.
        let kernel = Kernel::new(3, vec![-1.0; 9]).unwrap();
        let out = serial_convolve(&image, &kernel);
        assert!(out.pixels().iter().all(|p| p.r == 0 && p.g == 0 && p.b == 0));
    }

    #[test]
    fn equal_results_detects_any_difference() {
        let a = gradient_image(3, 3);
        let mut b = a.clone();
        b.set(1, 1, Pixel::new(1, 2, 3));
        assert!(equal_results(&a, &a));
        assert!(equal_results(&a, &a.clone()));
        assert!(!equal_results(&a, &b));
    }

    #[test]
    fn threaded_convolution_matches_serial_oracle() {
        let image = gradient_image(17, 13);
        let kernel = core_ops::lookup("GAUSSIANBLUR5").unwrap();
        let oracle = serial_convolve(&image, &kernel);

        for threads in [1, 2, 4, 8] {
            let padding = kernel.padding();
            let mut strip = PaddedStrip::zeroed(image.height(), image.width(), padding);
            for y in 0..image.height() {
                strip.write_real_row(y, image.row(y));
            }
            let mut output = OutputStrip::zeroed(image.height(), image.width());
            convolve(&strip, &mut output, &kernel, threads);
            assert_eq!(output.pixels(), oracle.pixels(), "threads={threads}");
        }
    }
}
