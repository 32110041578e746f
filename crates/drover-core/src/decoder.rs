/*!
Turns one raw queue entry into a shape-validated tensor.

Decoding happens in two steps because they fail differently: if the
JSON envelope itself is unreadable there is no request id to report
against, while a bad payload still leaves us an id to publish an error
record under. The assembler in [`crate::batch`] keeps the two apart.
 */

use crate::entry::{Dtype, QueueEntry, TensorShape};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Why one entry could not be turned into a tensor.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("entry is not a valid request envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("payload is not valid base64: {0}")]
    Payload(#[from] base64::DecodeError),

    #[error("declared element type {declared} does not match the configured {expected}")]
    DtypeMismatch { declared: String, expected: String },

    #[error("declared shape {declared:?} does not match the configured target {expected:?}")]
    ShapeMismatch {
        declared: [usize; 3],
        expected: [usize; 3],
    },

    #[error("payload is {got} bytes, expected {expected} for {count} {dtype} elements")]
    PayloadLength {
        got: usize,
        expected: usize,
        count: usize,
        dtype: &'static str,
    },
}

/// Decodes queue entries against one configured target shape and
/// element type.
pub struct RequestDecoder {
    shape: TensorShape,
    dtype: Dtype,
}

impl RequestDecoder {
    pub fn new(shape: TensorShape, dtype: Dtype) -> Self {
        Self { shape, dtype }
    }

    /// The per-unit shape every decoded tensor will have.
    pub fn shape(&self) -> TensorShape {
        self.shape
    }

    /// Parse the JSON envelope of one raw entry. If this fails the
    /// entry carries no recoverable id.
    pub fn parse_envelope(&self, raw: &[u8]) -> Result<QueueEntry, DecodeError> {
        Ok(serde_json::from_slice(raw)?)
    }

    /// Decode and validate the payload of a parsed envelope, producing
    /// the dense element vector for one unit.
    pub fn decode(&self, entry: &QueueEntry) -> Result<Vec<f32>, DecodeError> {
        if entry.dtype != self.dtype {
            return Err(DecodeError::DtypeMismatch {
                declared: entry.dtype.name().to_owned(),
                expected: self.dtype.name().to_owned(),
            });
        }

        if entry.shape != self.shape.dims() {
            return Err(DecodeError::ShapeMismatch {
                declared: entry.shape,
                expected: self.shape.dims(),
            });
        }

        let bytes = STANDARD.decode(&entry.payload)?;

        let count = self.shape.element_count();
        let expected = count * self.dtype.byte_width();
        if bytes.len() != expected {
            return Err(DecodeError::PayloadLength {
                got: bytes.len(),
                expected,
                count,
                dtype: self.dtype.name(),
            });
        }

        let data = match self.dtype {
            Dtype::F32 => bytes
                .chunks_exact(4)
                .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect(),
            // Widened unscaled; normalization is the producer's business.
            Dtype::U8 => bytes.iter().map(|b| *b as f32).collect(),
        };

        Ok(data)
    }
}
