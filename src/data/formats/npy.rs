//! NumPy `.npy` decoding for the raw-binary feature format.
//!
//! Layout: `\x93NUMPY`, two version bytes, a header length (u16 for v1,
//! u32 for v2/v3), a Python-dict header, then the array data.

use crate::domain::error::FormatError;
use crate::domain::features::FeatureMatrix;

use super::{element_count, matrix_from_shape, read_f32, read_f64, Endian};

const MAGIC: &[u8] = b"\x93NUMPY";

/// Decode an `.npy` file holding a float32 or float64 array.
pub fn decode(bytes: &[u8]) -> Result<FeatureMatrix, FormatError> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err(FormatError::Header("invalid NPY magic number".into()));
    }

    let major = bytes[6];
    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            let len = bytes.get(8..12).ok_or(FormatError::Truncated {
                needed:    12,
                available: bytes.len(),
            })?;
            (u32::from_le_bytes([len[0], len[1], len[2], len[3]]) as usize, 12)
        }
        v => return Err(FormatError::Header(format!("unsupported NPY version {v}"))),
    };

    let data_start = header_start + header_len;
    let header_bytes = bytes.get(header_start..data_start).ok_or(FormatError::Truncated {
        needed:    data_start,
        available: bytes.len(),
    })?;
    let header = String::from_utf8_lossy(header_bytes);

    if parse_fortran_order(&header)? {
        return Err(FormatError::Header("Fortran-ordered arrays are not supported".into()));
    }
    let dtype = parse_dtype(&header)?;
    let shape = parse_shape(&header)?;

    let (endian, width) = match dtype.as_str() {
        "<f4" | "=f4" => (Endian::Little, 4),
        ">f4"         => (Endian::Big, 4),
        "<f8" | "=f8" => (Endian::Little, 8),
        ">f8"         => (Endian::Big, 8),
        other => return Err(FormatError::UnsupportedDtype(other.to_string())),
    };

    let count = element_count(&shape)?;
    let data = &bytes[data_start..];
    let values = if width == 4 {
        read_f32(data, count, endian)?
    } else {
        read_f64(data, count, endian)?
    };

    matrix_from_shape(&shape, values)
}

/// Find the quoted value following `key` in the header dict
fn value_after<'a>(header: &'a str, key: &str) -> Result<&'a str, FormatError> {
    let start = header
        .find(&format!("'{key}'"))
        .or_else(|| header.find(&format!("\"{key}\"")))
        .ok_or_else(|| FormatError::Header(format!("no {key} in header")))?;
    let rest  = &header[start + key.len() + 2..];
    let colon = rest
        .find(':')
        .ok_or_else(|| FormatError::Header(format!("no colon after {key}")))?;
    Ok(rest[colon + 1..].trim_start())
}

fn parse_dtype(header: &str) -> Result<String, FormatError> {
    let rest  = value_after(header, "descr")?;
    let quote = rest
        .chars()
        .next()
        .filter(|c| *c == '\'' || *c == '"')
        .ok_or_else(|| FormatError::Header("descr is not a string".into()))?;
    let end = rest[1..]
        .find(quote)
        .ok_or_else(|| FormatError::Header("unclosed descr string".into()))?;
    Ok(rest[1..1 + end].to_string())
}

fn parse_fortran_order(header: &str) -> Result<bool, FormatError> {
    let rest = value_after(header, "fortran_order")?;
    Ok(rest.starts_with("True"))
}

fn parse_shape(header: &str) -> Result<Vec<usize>, FormatError> {
    let rest  = value_after(header, "shape")?;
    let open  = rest
        .find('(')
        .ok_or_else(|| FormatError::Header("no shape tuple".into()))?;
    let close = rest
        .find(')')
        .ok_or_else(|| FormatError::Header("unclosed shape tuple".into()))?;

    rest[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|e| FormatError::Header(format!("invalid shape element '{s}': {e}")))
        })
        .collect()
}

/// Serialise a little-endian float32 array as a v1 `.npy` file
#[cfg(test)]
pub(crate) fn encode_f32(shape: &[usize], values: &[f32]) -> Vec<u8> {
    let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    encode("<f4", shape, &payload)
}

/// Serialise a v1 `.npy` file with `descr` and an already encoded payload
#[cfg(test)]
pub(crate) fn encode(descr: &str, shape: &[usize], payload: &[u8]) -> Vec<u8> {
    let dims = match shape {
        [n] => format!("({n},)"),
        _ => format!(
            "({})",
            shape.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
        ),
    };
    let mut header = format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {dims}, }}");
    // total preamble is padded to a multiple of 64 bytes, newline-terminated
    while (10 + header.len() + 1) % 64 != 0 {
        header.push(' ');
    }
    header.push('\n');

    let mut out = MAGIC.to_vec();
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(payload);
    out
}
