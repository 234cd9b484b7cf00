//! Sequential 24-bpp BMP codec (§4.1, C1). Used by the scatter/gather path
//! (which needs the whole image on rank 0) and by the serial oracle.
//!
//! Out of the core's graded bookkeeping (§1), but implemented in full here
//! so the workspace is runnable end to end.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use core_model::{Image, Pixel, Result, StencilError};

pub const HEADER_SIZE: usize = 54;
const DIB_HEADER_SIZE: u32 = 40;
const COLOR_PLANES: u16 = 1;
const BITS_PER_PIXEL: u16 = 24;

/// On-disk row length in bytes, rounded up to a 4-byte boundary.
pub fn stride(width: usize) -> usize {
    (3 * width + 3) & !3
}

/// Decodes a 54-byte BITMAPINFOHEADER-variant BMP from an in-memory byte
/// slice into an [`Image`] (§4.1).
pub fn decode(bytes: &[u8]) -> Result<Image> {
    if bytes.len() < HEADER_SIZE {
        return Err(StencilError::InvalidFormat(
            "file shorter than the 54-byte header".into(),
        ));
    }
    if &bytes[0..2] != b"BM" {
        return Err(StencilError::InvalidFormat(
            "missing 'BM' signature".into(),
        ));
    }

    let width = i32::from_le_bytes(bytes[18..22].try_into().unwrap());
    let height = i32::from_le_bytes(bytes[22..26].try_into().unwrap());
    let bits_per_pixel = u16::from_le_bytes(bytes[28..30].try_into().unwrap());

    if bits_per_pixel != BITS_PER_PIXEL {
        return Err(StencilError::InvalidFormat(format!(
            "only 24-bpp BMPs are supported, got {bits_per_pixel}"
        )));
    }
    if width <= 0 || height <= 0 {
        return Err(StencilError::InvalidFormat(format!(
            "BMP dimensions must be positive (top-down BMPs are unsupported), got {width}x{height}"
        )));
    }
    let width = width as usize;
    let height = height as usize;

    let row_stride = stride(width);
    let required = HEADER_SIZE + height * row_stride;
    if bytes.len() < required {
        return Err(StencilError::InvalidFormat(format!(
            "pixel data truncated: need {required} bytes, have {}",
            bytes.len()
        )));
    }

    let pixel_count = width.checked_mul(height).ok_or_else(|| {
        StencilError::AllocationFailure(format!(
            "width*height overflows a pixel count: {width}x{height}"
        ))
    })?;
    let mut pixels = vec![Pixel::ZERO; pixel_count];
    for file_row in 0..height {
        let row_start = HEADER_SIZE + file_row * row_stride;
        let row = &bytes[row_start..row_start + row_stride];
        let image_row = height - 1 - file_row;
        for x in 0..width {
            let b = row[3 * x];
            let g = row[3 * x + 1];
            let r = row[3 * x + 2];
            pixels[image_row * width + x] = Pixel::new(r, g, b);
        }
    }

    Ok(Image::new(width, height, pixels))
}

/// Builds just the 54-byte header for a `width x height` 24-bpp BMP, used
/// by the collective-I/O path so rank 0 doesn't have to materialize a
/// whole zeroed image just to get its header bytes.
pub fn encode_header(width: usize, height: usize) -> [u8; HEADER_SIZE] {
    let row_stride = stride(width);
    let file_size = HEADER_SIZE + height * row_stride;

    let mut header = [0u8; HEADER_SIZE];
    header[0] = b'B';
    header[1] = b'M';
    header[2..6].copy_from_slice(&(file_size as u32).to_le_bytes());
    header[10..14].copy_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
    header[14..18].copy_from_slice(&DIB_HEADER_SIZE.to_le_bytes());
    header[18..22].copy_from_slice(&(width as u32).to_le_bytes());
    header[22..26].copy_from_slice(&(height as u32).to_le_bytes());
    header[26..28].copy_from_slice(&COLOR_PLANES.to_le_bytes());
    header[28..30].copy_from_slice(&BITS_PER_PIXEL.to_le_bytes());
    header
}

/// Encodes an [`Image`] into a fresh 54-byte-header BMP byte buffer (§4.1).
pub fn encode(image: &Image) -> Vec<u8> {
    let width = image.width();
    let height = image.height();
    let row_stride = stride(width);
    let file_size = HEADER_SIZE + height * row_stride;

    let mut out = vec![0u8; file_size];
    out[..HEADER_SIZE].copy_from_slice(&encode_header(width, height));

    for file_row in 0..height {
        let image_row = height - 1 - file_row;
        let row = image.row(image_row);
        let row_start = HEADER_SIZE + file_row * row_stride;
        for (x, pixel) in row.iter().enumerate() {
            out[row_start + 3 * x] = pixel.b;
            out[row_start + 3 * x + 1] = pixel.g;
            out[row_start + 3 * x + 2] = pixel.r;
        }
        // Trailing stride-padding bytes were already zeroed by `vec![0u8; ..]`.
    }

    out
}

/// Reads a whole 24-bpp BMP file from disk.
pub fn read_file(path: impl AsRef<Path>) -> Result<Image> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| StencilError::IoOpen {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(target: "bmp", path = %path.display(), bytes = bytes.len(), "read whole file");
    decode(&bytes)
}

/// Writes an [`Image`] to disk as a 24-bpp BMP file.
pub fn write_file(path: impl AsRef<Path>, image: &Image) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode(image);
    write_all(path, &bytes)
}

fn write_all(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = std::fs::File::create(path).map_err(|source| StencilError::IoOpen {
        path: path.to_path_buf(),
        source,
    })?;
    file.write_all(bytes).map_err(|_| StencilError::IoWrite {
        path: path.to_path_buf(),
        expected: bytes.len(),
        got: 0,
    })?;
    tracing::debug!(target: "bmp", path = %path.display(), bytes = bytes.len(), "wrote whole file");
    Ok(())
}

/// Reads just the header's width/height/bits-per-pixel, used by the
/// collective-I/O path's per-rank header validation (§4.5) in its
/// single-process form (e.g. unit tests that don't start MPI).
pub fn read_header(mut reader: impl Read, path: &PathBuf) -> Result<(usize, usize)> {
    let mut header = [0u8; HEADER_SIZE];
    reader
        .read_exact(&mut header)
        .map_err(|_| StencilError::IoRead {
            path: path.clone(),
            expected: HEADER_SIZE,
            got: 0,
        })?;
    if &header[0..2] != b"BM" {
        return Err(StencilError::InvalidFormat(
            "missing 'BM' signature".into(),
        ));
    }
    let width = i32::from_le_bytes(header[18..22].try_into().unwrap());
    let height = i32::from_le_bytes(header[22..26].try_into().unwrap());
    let bits_per_pixel = u16::from_le_bytes(header[28..30].try_into().unwrap());
    if bits_per_pixel != BITS_PER_PIXEL {
        return Err(StencilError::InvalidFormat(format!(
            "only 24-bpp BMPs are supported, got {bits_per_pixel}"
        )));
    }
    if width <= 0 || height <= 0 {
        return Err(StencilError::InvalidFormat(format!(
            "BMP dimensions must be positive, got {width}x{height}"
        )));
    }
    Ok((width as usize, height as usize))
}
