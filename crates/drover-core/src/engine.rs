/*!
The prediction engine contract: one batch in, one ranked result list
per slot out, same order as the input. The dispatch loop treats the
engine as synchronous and opaque.
 */

use crate::batch::Batch;
use crate::entry::TensorShape;
use serde::{Deserialize, Serialize};

/// One ranked classification outcome.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub probability: f32,
}

/// The engine the dispatch loop feeds batches to.
///
/// Implementations must return exactly one non-empty, best-first list
/// of predictions per unit in the batch, in batch order.
pub trait Engine {
    /// Execute the model on one assembled batch.
    fn infer(&mut self, batch: &Batch) -> anyhow::Result<Vec<Vec<Prediction>>>;

    /// The per-unit input shape this engine was built for.
    fn input_shape(&self) -> TensorShape;
}
