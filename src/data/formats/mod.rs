// ============================================================
// Layer 4 — Feature File Formats
// ============================================================
// Byte-level decoders for the three supported storage formats:
//
//   container.rs — safetensors file, one named array
//   npy.rs       — NumPy .npy array
//   htk.rs       — HTK parameter file (.mfc)
//
// Each decoder returns a raw FeatureMatrix; normalisation is the
// loader's job.
//
// Reference: NumPy NEP 1 (.npy format)
//            The HTK Book §5.10 (Parameter File Format)

pub mod container;
pub mod htk;
pub mod npy;

use crate::domain::error::FormatError;
use crate::domain::features::FeatureMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endian {
    Little,
    Big,
}

/// Number of elements in an array of `shape`. Header-declared
/// shapes are untrusted, so an overflowing product is an error.
pub(crate) fn element_count(shape: &[usize]) -> Result<usize, FormatError> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| FormatError::Header(format!("shape {shape:?} is too large")))
}

fn byte_len(count: usize, width: usize) -> Result<usize, FormatError> {
    count
        .checked_mul(width)
        .ok_or_else(|| FormatError::Header(format!("{count} elements overflow the byte length")))
}

/// Read `count` float32 values from the front of `data`
pub(crate) fn read_f32(data: &[u8], count: usize, endian: Endian) -> Result<Vec<f32>, FormatError> {
    let needed = byte_len(count, 4)?;
    if data.len() < needed {
        return Err(FormatError::Truncated { needed, available: data.len() });
    }
    Ok(data[..needed]
        .chunks_exact(4)
        .map(|b| {
            let b = [b[0], b[1], b[2], b[3]];
            match endian {
                Endian::Little => f32::from_le_bytes(b),
                Endian::Big    => f32::from_be_bytes(b),
            }
        })
        .collect())
}

/// Read `count` float64 values, narrowed to f32
pub(crate) fn read_f64(data: &[u8], count: usize, endian: Endian) -> Result<Vec<f32>, FormatError> {
    let needed = byte_len(count, 8)?;
    if data.len() < needed {
        return Err(FormatError::Truncated { needed, available: data.len() });
    }
    Ok(data[..needed]
        .chunks_exact(8)
        .map(|b| {
            let b = [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]];
            match endian {
                Endian::Little => f64::from_le_bytes(b) as f32,
                Endian::Big    => f64::from_be_bytes(b) as f32,
            }
        })
        .collect())
}

/// Interpret an n-d array shape as (frames, bins).
/// Axis 0 is time; every remaining axis folds into bins, so
/// (1000, 180, 1) reads as 1000 × 180 and a 1-D array is one frame.
pub(crate) fn matrix_from_shape(shape: &[usize], values: Vec<f32>) -> Result<FeatureMatrix, FormatError> {
    let (frames, bins) = match shape {
        [] => return Err(FormatError::Header("scalar array has no frames".into())),
        [n] => (1, *n),
        [frames, rest @ ..] => (*frames, element_count(rest)?),
    };
    Ok(FeatureMatrix::new(frames, bins, values)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_f32_endianness() {
        let le = 1.5f32.to_le_bytes();
        let be = 1.5f32.to_be_bytes();
        assert_eq!(read_f32(&le, 1, Endian::Little).unwrap(), vec![1.5]);
        assert_eq!(read_f32(&be, 1, Endian::Big).unwrap(), vec![1.5]);
    }

    #[test]
    fn test_read_f64_narrows_both_endians() {
        let le = (-2.25f64).to_le_bytes();
        let be = 0.5f64.to_be_bytes();
        assert_eq!(read_f64(&le, 1, Endian::Little).unwrap(), vec![-2.25]);
        assert_eq!(read_f64(&be, 1, Endian::Big).unwrap(), vec![0.5]);
    }

    #[test]
    fn test_read_f64_truncated() {
        assert!(matches!(
            read_f64(&[0u8; 12], 2, Endian::Little),
            Err(FormatError::Truncated { needed: 16, available: 12 })
        ));
    }

    #[test]
    fn test_element_count_overflow() {
        assert_eq!(element_count(&[1000, 180, 1]).unwrap(), 180_000);
        assert_eq!(element_count(&[]).unwrap(), 1);
        assert!(matches!(element_count(&[usize::MAX, 2]), Err(FormatError::Header(_))));
    }

    #[test]
    fn test_byte_length_overflow() {
        assert!(matches!(read_f32(&[], usize::MAX / 2, Endian::Little), Err(FormatError::Header(_))));
        assert!(matches!(read_f64(&[], usize::MAX / 4, Endian::Big), Err(FormatError::Header(_))));
    }

    #[test]
    fn test_matrix_from_shape_1d() {
        let m = matrix_from_shape(&[4], vec![0.0; 4]).unwrap();
        assert_eq!((m.frames(), m.bins()), (1, 4));
    }

    #[test]
    fn test_matrix_from_shape_zero_frames() {
        assert!(matrix_from_shape(&[0, 180], vec![]).is_err());
    }
}
