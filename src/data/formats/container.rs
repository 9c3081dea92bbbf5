//! Container feature format: a safetensors file holding one named array.

use safetensors::{Dtype, SafeTensors};

use crate::domain::error::FormatError;
use crate::domain::features::FeatureMatrix;

use super::{element_count, matrix_from_shape, read_f32, read_f64, Endian};

/// Array name used when the configuration does not override it
pub const DEFAULT_KEY: &str = "features";

/// Decode the array stored under `key`.
pub fn decode(bytes: &[u8], key: &str) -> Result<FeatureMatrix, FormatError> {
    let tensors = SafeTensors::deserialize(bytes)
        .map_err(|e| FormatError::Container(format!("{e:?}")))?;
    let view = tensors
        .tensor(key)
        .map_err(|e| FormatError::Container(format!("no array '{key}': {e:?}")))?;

    let shape: Vec<usize> = view.shape().to_vec();
    let count = element_count(&shape)?;
    let values = match view.dtype() {
        Dtype::F32 => read_f32(view.data(), count, Endian::Little)?,
        Dtype::F64 => read_f64(view.data(), count, Endian::Little)?,
        other => return Err(FormatError::UnsupportedDtype(format!("{other:?}"))),
    };

    matrix_from_shape(&shape, values)
}

#[cfg(test)]
pub(crate) fn encode_f32(key: &str, shape: &[usize], values: &[f32]) -> Vec<u8> {
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    encode(key, Dtype::F32, shape, &data)
}

#[cfg(test)]
fn encode(key: &str, dtype: Dtype, shape: &[usize], data: &[u8]) -> Vec<u8> {
    use safetensors::tensor::TensorView;

    let view = TensorView::new(dtype, shape.to_vec(), data).unwrap();
    safetensors::serialize(vec![(key.to_string(), view)], &None).unwrap()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_named_array() {
        let bytes = encode_f32(DEFAULT_KEY, &[2, 3], &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let m = decode(&bytes, DEFAULT_KEY).unwrap();
        assert_eq!((m.frames(), m.bins()), (2, 3));
        assert_eq!(m.frame(1), &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_decode_f64_array() {
        let data: Vec<u8> = [1.5f64, -0.25, 2.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        let bytes = encode(DEFAULT_KEY, Dtype::F64, &[3, 1, 1], &data);
        let m = decode(&bytes, DEFAULT_KEY).unwrap();
        assert_eq!((m.frames(), m.bins()), (3, 1));
        assert_eq!(m.values(), &[1.5, -0.25, 2.0]);
    }

    #[test]
    fn test_integer_array_is_unsupported() {
        let bytes = encode(DEFAULT_KEY, Dtype::I32, &[2], &[0u8; 8]);
        assert!(matches!(decode(&bytes, DEFAULT_KEY), Err(FormatError::UnsupportedDtype(_))));
    }

    #[test]
    fn test_missing_array_is_an_error() {
        let bytes = encode_f32("other", &[1, 1], &[0.0]);
        assert!(matches!(decode(&bytes, DEFAULT_KEY), Err(FormatError::Container(_))));
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(decode(b"definitely not a container", DEFAULT_KEY).is_err());
    }
}
