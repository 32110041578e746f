/*!
The drover runtime drives a single-consumer batch-inference loop over
a FIFO work queue: read a bounded prefix, assemble it into one batch,
run the prediction engine, publish one result per request id, then
trim exactly what was read.

```no_run
use drover_core::prelude::TensorShape;
use drover_onnx::OnnxClassifier;
use drover_redis::{RedisResultStore, RedisWorkQueue};
use drover_runtime::{Dispatcher, DispatcherConfig};

let engine = OnnxClassifier::from_paths(
    "classifier.onnx",
    "labels.txt",
    TensorShape::new(160, 160, 3),
    5,
)?;

let queue = RedisWorkQueue::open("redis://localhost:6379", "image_queue")?;
let store = RedisResultStore::open("redis://localhost:6379")?;

let mut dispatcher = Dispatcher::new(queue, store, engine, DispatcherConfig::default());
dispatcher.run();
# Ok::<(), Box<dyn std::error::Error>>(())
```

## Consistency discipline

One iteration runs to completion before the next begins; there is no
pipelining of read/trim windows across batches. Publishing always
precedes trimming, which bounds loss to the crash window between the
last publish and the trim — entries still in the queue at restart are
simply re-read and re-published (last-write-wins records make the
re-publish idempotent).

Exactly one live consumer is assumed. Two consumers can read the same
prefix before either trims; the overwrites stay harmless but the
duplicate engine work is wasted. Scaling out needs a leader lease or a
backend with consumer groups, neither of which this runtime provides.

## Failure policy

No processing error is fatal. Transport failures pause the loop for
one idle interval and retry the read indefinitely. Malformed entries
are consumed, never retried, and leave an error record under their id
so pollers observe a terminal outcome. An engine failure marks the
whole batch's decoded slots with inference-error records and the batch
is still trimmed — retrying the same batch against a down engine would
wedge the queue behind it.
 */

#![warn(rust_2018_idioms)]

mod dispatcher;
mod error;

#[doc(inline)]
pub use dispatcher::{Dispatcher, DispatcherConfig, Tick};
#[doc(inline)]
pub use error::DispatchError;
