//! HTK parameter file decoding for the parametric (`.mfc`) format.
//!
//! Header (12 bytes, big-endian):
//!   nSamples  i32  number of frames
//!   sampPeriod i32 frame period in 100ns units
//!   sampSize  i16  bytes per frame
//!   parmKind  i16  base kind in the low 6 bits, qualifier flags above
//!
//! Compressed files (`_C`) store one f32 scale and one f32 bias per
//! column ahead of i16 payload; those two vectors account for four
//! "frames" of the declared sample count.

use crate::domain::error::FormatError;
use crate::domain::features::FeatureMatrix;

use super::{read_f32, Endian};

const HEADER_LEN: usize = 12;
const BASE_KIND_MASK: u16 = 0o77;
const WAVEFORM: u16 = 0;
const COMPRESSED: u16 = 0o2000;

/// Parsed 12-byte HTK header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtkHeader {
    pub samples:     usize,
    pub period:      i32,
    pub sample_size: usize,
    pub kind:        u16,
}

impl HtkHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < HEADER_LEN {
            return Err(FormatError::Truncated { needed: HEADER_LEN, available: bytes.len() });
        }
        let samples     = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let period      = i32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let sample_size = i16::from_be_bytes([bytes[8], bytes[9]]);
        let kind        = u16::from_be_bytes([bytes[10], bytes[11]]);

        if samples < 0 || sample_size <= 0 {
            return Err(FormatError::Header(format!(
                "nSamples={samples}, sampSize={sample_size}"
            )));
        }
        Ok(Self {
            samples: samples as usize,
            period,
            sample_size: sample_size as usize,
            kind,
        })
    }

    pub fn is_compressed(&self) -> bool {
        self.kind & COMPRESSED != 0
    }
}

/// Decode an HTK feature file into a (frames × coefficients) matrix.
pub fn decode(bytes: &[u8]) -> Result<FeatureMatrix, FormatError> {
    let header = HtkHeader::parse(bytes)?;
    if header.kind & BASE_KIND_MASK == WAVEFORM {
        return Err(FormatError::UnsupportedDtype("HTK WAVEFORM".into()));
    }
    let body = &bytes[HEADER_LEN..];

    if header.is_compressed() {
        decode_compressed(&header, body)
    } else {
        if header.sample_size % 4 != 0 {
            return Err(FormatError::Header(format!(
                "sampSize {} is not a multiple of 4",
                header.sample_size
            )));
        }
        let columns = header.sample_size / 4;
        let values  = read_f32(body, header.samples * columns, Endian::Big)?;
        Ok(FeatureMatrix::new(header.samples, columns, values)?)
    }
}

fn decode_compressed(header: &HtkHeader, body: &[u8]) -> Result<FeatureMatrix, FormatError> {
    let columns = header.sample_size / 2;
    let frames  = header.samples.checked_sub(4).ok_or_else(|| {
        FormatError::Header(format!("compressed file declares {} samples", header.samples))
    })?;

    let scale = read_f32(body, columns, Endian::Big)?;
    let bias  = read_f32(&body[columns * 4..], columns, Endian::Big)?;

    let payload = &body[columns * 8..];
    let needed  = frames * columns * 2;
    if payload.len() < needed {
        return Err(FormatError::Truncated {
            needed:    HEADER_LEN + columns * 8 + needed,
            available: HEADER_LEN + body.len(),
        });
    }

    let values = payload[..needed]
        .chunks_exact(2)
        .enumerate()
        .map(|(i, b)| {
            let c = i % columns;
            (i16::from_be_bytes([b[0], b[1]]) as f32 + bias[c]) / scale[c]
        })
        .collect();

    Ok(FeatureMatrix::new(frames, columns, values)?)
}
