/*!
Contracts for the two storage backends the loop talks to: the FIFO
work queue and the per-request result store. Backends live in their
own crates (`drover-redis` for the Redis pair); the loop only sees
these traits.
 */

use crate::engine::Prediction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One entry as read off the queue, before any decoding.
pub type RawEntry = Vec<u8>;

/// The backend could not be reached. Never fatal to the dispatch loop;
/// reconnection policy belongs to the backend implementation.
#[derive(Debug, Error)]
#[error("storage backend unreachable: {0}")]
pub struct TransportError(#[from] pub anyhow::Error);

/// Ordered append-only work queue.
///
/// Implementations must guarantee that `trim_head(k)` removes exactly
/// the first `k` entries by the order `read_range` returned them, even
/// when producers append between the read and the trim.
pub trait WorkQueue {
    /// Read up to `max` entries from the head, FIFO order, removing
    /// nothing.
    fn read_range(&mut self, max: usize) -> Result<Vec<RawEntry>, TransportError>;

    /// Remove exactly the first `count` entries.
    fn trim_head(&mut self, count: usize) -> Result<(), TransportError>;
}

/// Per-request result store, keyed by request id, last-write-wins.
pub trait ResultStore {
    fn put(&mut self, id: &str, record: &ResultRecord) -> Result<(), TransportError>;
}

/// The terminal outcome persisted for one request id: a best-first
/// prediction list on success, or an error marker so pollers of that
/// id never hang on a request that cannot complete.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultRecord {
    Predictions(Vec<Prediction>),
    Error { error: String },
}

impl ResultRecord {
    pub fn error(message: impl Into<String>) -> Self {
        ResultRecord::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResultRecord::Error { .. })
    }
}
