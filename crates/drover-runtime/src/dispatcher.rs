/*!
The poll scheduler: one state machine iteration is read → assemble →
infer → publish → trim, followed by an idle wait. The scheduler owns
the engine and both storage handles for the life of the process.
 */

use crate::error::DispatchError;
use drover_core::prelude::{
    Batch, BatchAssembler, Dtype, Engine, Prediction, RequestDecoder, ResultRecord, ResultStore,
    Slot, WorkQueue,
};
use std::{thread, time::Duration};

/// Tunables for the dispatch loop.
#[derive(Clone, Copy, Debug)]
pub struct DispatcherConfig {
    /// Upper bound on entries read, and therefore units inferred, per
    /// iteration. Values below 1 are treated as 1.
    pub max_batch_size: usize,

    /// Sleep between iterations. The sole backpressure mechanism:
    /// fixed cadence, no queue-depth signal.
    pub idle_interval: Duration,

    /// Element type the decoder validates payloads against.
    pub dtype: Dtype,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 32,
            idle_interval: Duration::from_millis(250),
            dtype: Dtype::F32,
        }
    }
}

/// Summary of one dispatch iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tick {
    /// Entries read off the queue this iteration.
    pub read: usize,
    /// Entries that decoded into the batch.
    pub decoded: usize,
    /// Result records written, error records included.
    pub published: usize,
    /// Entries removed from the queue head.
    pub trimmed: usize,
}

/// The single consumer driving the queue. One instance per queue;
/// running two against the same key duplicates work (see the crate
/// docs).
pub struct Dispatcher<Q, S> {
    queue: Q,
    store: S,
    engine: Box<dyn Engine>,
    assembler: BatchAssembler,
    config: DispatcherConfig,
}

impl<Q, S> Dispatcher<Q, S>
where
    Q: WorkQueue,
    S: ResultStore,
{
    /// Build a dispatcher around the given backends and engine. The
    /// decoder target shape is taken from the engine so the two can
    /// never disagree.
    pub fn new(queue: Q, store: S, engine: impl Engine + 'static, config: DispatcherConfig) -> Self {
        let decoder = RequestDecoder::new(engine.input_shape(), config.dtype);

        Self {
            queue,
            store,
            engine: Box::new(engine),
            assembler: BatchAssembler::new(decoder),
            config,
        }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run forever. Processing errors are logged and absorbed; only
    /// external shutdown ends the loop.
    pub fn run(&mut self) {
        loop {
            match self.poll_once() {
                Ok(tick) if tick.read > 0 => {
                    log::info!(
                        "processed batch: read {}, decoded {}, published {}, trimmed {}",
                        tick.read,
                        tick.decoded,
                        tick.published,
                        tick.trimmed
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    log::warn!("dispatch iteration failed, backing off: {}", err);
                }
            }

            thread::sleep(self.config.idle_interval);
        }
    }

    /// Run one iteration: read a prefix, assemble, infer, publish one
    /// record per known id in read order, then trim exactly the count
    /// read. An empty read returns a zero [`Tick`] without touching
    /// the engine.
    ///
    /// A transport failure aborts the iteration where it struck;
    /// nothing is trimmed, so the same prefix is re-read next time.
    pub fn poll_once(&mut self) -> Result<Tick, DispatchError> {
        let entries = self.queue.read_range(self.config.max_batch_size.max(1))?;
        if entries.is_empty() {
            return Ok(Tick::default());
        }

        let read = entries.len();
        let assembly = self.assembler.assemble(&entries);
        let decoded = assembly.batch.len();

        let mut predictions = self.run_engine(&assembly.batch);

        let mut published = 0;
        for slot in &assembly.slots {
            let (id, record) = match slot {
                Slot::Decoded { id, index } => {
                    let record = match predictions.as_mut().and_then(|all| all.get_mut(*index)) {
                        Some(list) if !list.is_empty() => {
                            ResultRecord::Predictions(std::mem::take(list))
                        }
                        _ => ResultRecord::error("inference_failed"),
                    };
                    (id, record)
                }
                Slot::Rejected { id, reason } => {
                    (id, ResultRecord::error(format!("decode_failed: {}", reason)))
                }
                Slot::Unreadable { reason } => {
                    // No key to publish under; consume it and move on.
                    log::warn!("dropping unreadable queue entry: {}", reason);
                    continue;
                }
            };

            self.store.put(id, &record)?;
            published += 1;
        }

        self.queue.trim_head(read)?;

        Ok(Tick {
            read,
            decoded,
            published,
            trimmed: read,
        })
    }

    /// Invoke the engine for a non-empty batch. `None` means no
    /// predictions are available: either nothing decoded, or the
    /// engine failed or broke its length contract. Decoded slots then
    /// get inference-error records.
    fn run_engine(&mut self, batch: &Batch) -> Option<Vec<Vec<Prediction>>> {
        if batch.is_empty() {
            return None;
        }

        match self.engine.infer(batch) {
            Ok(results) if results.len() == batch.len() => Some(results),
            Ok(results) => {
                log::error!(
                    "engine returned {} result lists for a batch of {}",
                    results.len(),
                    batch.len()
                );
                None
            }
            Err(err) => {
                log::error!("inference failed for batch of {}: {:#}", batch.len(), err);
                None
            }
        }
    }
}
