/*!
Assembles one read's worth of raw queue entries into a contiguous
batch, tracking original request identity per slot.

Assembly never aborts on a bad entry: every entry read contributes one
[`Slot`] in original order, whether its payload decoded or not, so the
loop can always trim exactly what it read and publish a terminal
outcome per known id.
 */

use crate::decoder::{DecodeError, RequestDecoder};
use crate::entry::TensorShape;
use crate::store::RawEntry;

/// Decoded units stacked along a new leading axis, laid out as one
/// contiguous `[count, height, width, channels]` buffer.
pub struct Batch {
    data: Vec<f32>,
    count: usize,
    shape: TensorShape,
}

impl Batch {
    pub fn new(shape: TensorShape) -> Self {
        Self {
            data: vec![],
            count: 0,
            shape,
        }
    }

    fn push(&mut self, unit: Vec<f32>) -> usize {
        debug_assert_eq!(unit.len(), self.shape.element_count());
        self.data.extend_from_slice(&unit);
        self.count += 1;
        self.count - 1
    }

    /// Number of units stacked so far.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The per-unit shape.
    pub fn shape(&self) -> TensorShape {
        self.shape
    }

    /// The full stacked buffer, unit-major.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The elements of the unit at `index`.
    pub fn unit(&self, index: usize) -> &[f32] {
        let count = self.shape.element_count();
        &self.data[index * count..(index + 1) * count]
    }
}

/// Where one read entry ended up during assembly.
#[derive(Debug)]
pub enum Slot {
    /// Decoded cleanly; its tensor sits at `index` in the batch.
    Decoded { id: String, index: usize },

    /// The envelope parsed but the payload did not; the id gets an
    /// error record and the entry is consumed, never retried.
    Rejected { id: String, reason: DecodeError },

    /// The envelope itself was unreadable. No id is recoverable, so
    /// there is nothing to publish under; the entry is still consumed.
    Unreadable { reason: DecodeError },
}

impl Slot {
    pub fn id(&self) -> Option<&str> {
        match self {
            Slot::Decoded { id, .. } | Slot::Rejected { id, .. } => Some(id),
            Slot::Unreadable { .. } => None,
        }
    }
}

/// The outcome of assembling one read.
pub struct Assembly {
    pub batch: Batch,
    pub slots: Vec<Slot>,
}

impl Assembly {
    /// Entries consumed by this read, successes and failures alike.
    /// This is the count the loop trims, regardless of what later
    /// stages do with the batch.
    pub fn consumed(&self) -> usize {
        self.slots.len()
    }
}

/// Pulls raw entries through the decoder and stacks the successes.
pub struct BatchAssembler {
    decoder: RequestDecoder,
}

impl BatchAssembler {
    pub fn new(decoder: RequestDecoder) -> Self {
        Self { decoder }
    }

    pub fn decoder(&self) -> &RequestDecoder {
        &self.decoder
    }

    /// Decode `entries` in the order received, which is queue FIFO
    /// order. One slot per entry, in that same order.
    pub fn assemble(&self, entries: &[RawEntry]) -> Assembly {
        let mut batch = Batch::new(self.decoder.shape());
        let mut slots = Vec::with_capacity(entries.len());

        for raw in entries {
            let slot = match self.decoder.parse_envelope(raw) {
                Ok(entry) => match self.decoder.decode(&entry) {
                    Ok(unit) => {
                        let index = batch.push(unit);
                        Slot::Decoded {
                            id: entry.id,
                            index,
                        }
                    }
                    Err(reason) => Slot::Rejected {
                        id: entry.id,
                        reason,
                    },
                },
                Err(reason) => Slot::Unreadable { reason },
            };

            slots.push(slot);
        }

        Assembly { batch, slots }
    }
}
