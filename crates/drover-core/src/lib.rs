/*!

# Drover Core

The data model and contracts shared by the drover dispatch loop: the
wire envelope for queued requests, the payload decoder, the batch
assembler, and the traits the outer loop uses to talk to the queue
backend, the result store, and the prediction engine.

Everything here is synchronous and allocation-light; the dispatch loop
in `drover-runtime` owns the control flow.

 */

#![warn(rust_2018_idioms)]

pub mod batch;
pub mod decoder;
pub mod engine;
pub mod entry;
pub mod store;

/// Most core types are re-exported here.
pub mod prelude {
    pub use super::batch::{Assembly, Batch, BatchAssembler, Slot};
    pub use super::decoder::{DecodeError, RequestDecoder};
    pub use super::engine::{Engine, Prediction};
    pub use super::entry::{Dtype, QueueEntry, TensorShape};
    pub use super::store::{RawEntry, ResultRecord, ResultStore, TransportError, WorkQueue};
}
