use crate::pixel::Pixel;

/// A rank-local, zero-padded input strip: `padding` halo rows above and
/// below `local_height` real rows, and `padding` halo columns on each side
/// of the real `width` columns. Both paths pad both dimensions (§9 of the
/// spec resolves the source's two-different-conventions split this way),
/// so the convolution loop never bounds-checks a column index.
#[derive(Debug, Clone)]
pub struct PaddedStrip {
    local_height: usize,
    width: usize,
    padding: usize,
    pixels: Vec<Pixel>,
}

impl PaddedStrip {
    pub fn zeroed(local_height: usize, width: usize, padding: usize) -> Self {
        let rows = local_height + 2 * padding;
        let cols = width + 2 * padding;
        Self {
            local_height,
            width,
            padding,
            pixels: vec![Pixel::ZERO; rows * cols],
        }
    }

    pub fn local_height(&self) -> usize {
        self.local_height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Row stride of the padded buffer, i.e. `width + 2*padding`.
    pub fn stride(&self) -> usize {
        self.width + 2 * self.padding
    }

    /// Total row count of the padded buffer, i.e. `local_height + 2*padding`.
    pub fn padded_rows(&self) -> usize {
        self.local_height + 2 * self.padding
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    pub fn get(&self, padded_y: usize, padded_x: usize) -> Pixel {
        self.pixels[padded_y * self.stride() + padded_x]
    }

    pub fn set(&mut self, padded_y: usize, padded_x: usize, value: Pixel) {
        let stride = self.stride();
        self.pixels[padded_y * stride + padded_x] = value;
    }

    /// Writes a run of `W` real pixels into real row `real_y` (0-based among
    /// the strip's own rows, not counting the top halo), starting at the
    /// real column 0 — i.e. at padded coordinates `(real_y + padding,
    /// padding)`.
    pub fn write_real_row(&mut self, real_y: usize, row: &[Pixel]) {
        debug_assert_eq!(row.len(), self.width);
        let stride = self.stride();
        let padded_y = real_y + self.padding;
        let start = padded_y * stride + self.padding;
        self.pixels[start..start + self.width].copy_from_slice(row);
    }

    pub fn real_row(&self, real_y: usize) -> &[Pixel] {
        let stride = self.stride();
        let padded_y = real_y + self.padding;
        let start = padded_y * stride + self.padding;
        &self.pixels[start..start + self.width]
    }

    /// A padded row by absolute padded index (0-based from the top halo),
    /// full `stride` pixels wide.
    pub fn padded_row(&self, padded_y: usize) -> &[Pixel] {
        let stride = self.stride();
        &self.pixels[padded_y * stride..(padded_y + 1) * stride]
    }

    pub fn padded_row_mut(&mut self, padded_y: usize) -> &mut [Pixel] {
        let stride = self.stride();
        &mut self.pixels[padded_y * stride..(padded_y + 1) * stride]
    }

    /// The `count` padded rows starting at absolute padded row `start`, as
    /// one flat pixel slice, for bulk halo transport.
    pub fn padded_row_span(&self, start: usize, count: usize) -> &[Pixel] {
        let stride = self.stride();
        &self.pixels[start * stride..(start + count) * stride]
    }

    pub fn padded_row_span_mut(&mut self, start: usize, count: usize) -> &mut [Pixel] {
        let stride = self.stride();
        &mut self.pixels[start * stride..(start + count) * stride]
    }
}

/// A rank-local, unpadded output strip: exactly `local_height * width`
/// pixels, row-major.
#[derive(Debug, Clone)]
pub struct OutputStrip {
    local_height: usize,
    width: usize,
    pixels: Vec<Pixel>,
}

impl OutputStrip {
    pub fn zeroed(local_height: usize, width: usize) -> Self {
        Self {
            local_height,
            width,
            pixels: vec![Pixel::ZERO; local_height * width],
        }
    }

    pub fn local_height(&self) -> usize {
        self.local_height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    /// Splits the output strip into `n` contiguous, disjoint row-chunks for
    /// static per-thread scheduling (§4.7). Each chunk owns a whole number
    /// of rows; the borrow checker statically guarantees no two chunks
    /// alias the same row.
    pub fn row_chunks_mut(&mut self, n: usize) -> Vec<(usize, &mut [Pixel])> {
        let width = self.width;
        let total_rows = self.local_height;
        let n = n.max(1).min(total_rows.max(1));
        let base = total_rows / n;
        let rem = total_rows % n;

        let mut chunks = Vec::with_capacity(n);
        let mut rest = self.pixels.as_mut_slice();
        let mut row_start = 0;
        for i in 0..n {
            let rows = base + if i < rem { 1 } else { 0 };
            let (chunk, tail) = rest.split_at_mut(rows * width);
            rest = tail;
            chunks.push((row_start, chunk));
            row_start += rows;
        }
        chunks
    }
}
