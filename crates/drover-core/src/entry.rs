/*!
The wire format for one queued request: a JSON envelope carrying an
opaque base64 payload plus the shape and element type the producer
declared for it.
 */

use serde::Deserialize;
use std::str::FromStr;

/// Spatial dimensions of one decoded unit. Batches stack units along a
/// new leading axis, giving `[count, height, width, channels]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TensorShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl TensorShape {
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Number of elements in one unit of this shape.
    pub fn element_count(&self) -> usize {
        self.height * self.width * self.channels
    }

    pub fn dims(&self) -> [usize; 3] {
        [self.height, self.width, self.channels]
    }
}

/// Element type of an encoded payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum Dtype {
    #[serde(rename = "float32")]
    F32,
    #[serde(rename = "uint8")]
    U8,
}

impl Dtype {
    /// Width in bytes of one encoded element.
    pub fn byte_width(&self) -> usize {
        match self {
            Dtype::F32 => 4,
            Dtype::U8 => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dtype::F32 => "float32",
            Dtype::U8 => "uint8",
        }
    }
}

impl FromStr for Dtype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "float32" => Ok(Dtype::F32),
            "uint8" => Ok(Dtype::U8),
            _ => Err(format!("unknown element type: {}", s)),
        }
    }
}

/// One unit of pending work as appended by the producer. Never mutated
/// in place; consumed and removed by the dispatch loop.
#[derive(Debug, Deserialize)]
pub struct QueueEntry {
    /// Opaque request identifier; also the result-store key.
    pub id: String,

    /// Base64 of the little-endian byte dump of the tensor.
    pub payload: String,

    /// Shape the producer claims the payload decodes to.
    pub shape: [usize; 3],

    /// Element type of the encoded payload.
    pub dtype: Dtype,
}
