use anyhow::Result;
use clap::Parser;
use drover_core::prelude::{Dtype, TensorShape};
use drover_onnx::OnnxClassifier;
use drover_redis::{RedisResultStore, RedisWorkQueue};
use drover_runtime::{Dispatcher, DispatcherConfig};
use std::{path::PathBuf, time::Duration};

/// Run the dispatch loop against a Redis queue until shutdown.
#[derive(Parser, Debug)]
#[clap()]
pub(crate) struct Args {
    /// The ONNX classifier model to serve.
    model: PathBuf,

    /// Labels file, one class label per line.
    #[clap(short, long)]
    labels: PathBuf,

    /// Redis instance holding both the queue and the result keys.
    #[clap(long, default_value = "redis://localhost:6379")]
    redis_url: String,

    /// The list key holding pending requests.
    #[clap(long, default_value = "image_queue")]
    queue: String,

    /// Upper bound on entries per inference call.
    #[clap(short, long, default_value = "32")]
    batch_size: usize,

    /// Seconds to sleep between loop iterations.
    #[clap(long, default_value = "0.25")]
    idle_interval: f32,

    #[clap(long, default_value = "160")]
    height: usize,

    #[clap(long, default_value = "160")]
    width: usize,

    #[clap(long, default_value = "3")]
    channels: usize,

    /// Element type of queued payloads.
    #[clap(long, default_value = "float32")]
    dtype: Dtype,

    /// Ranked predictions to keep per request, best-first.
    #[clap(long, default_value = "5")]
    top_k: usize,
}

pub(super) fn serve(config: Args) -> Result<()> {
    let shape = TensorShape::new(config.height, config.width, config.channels);

    log::info!("loading model {:?}", config.model);
    let engine = OnnxClassifier::from_paths(&config.model, &config.labels, shape, config.top_k)?;
    log::info!("model loaded");

    let queue = RedisWorkQueue::open(&config.redis_url, config.queue.clone())?;
    let store = RedisResultStore::open(&config.redis_url)?;

    let dispatcher_config = DispatcherConfig {
        max_batch_size: config.batch_size.max(1),
        idle_interval: Duration::from_secs_f32(config.idle_interval),
        dtype: config.dtype,
    };

    log::info!(
        "serving queue {:?} with batch size {}",
        config.queue,
        dispatcher_config.max_batch_size
    );

    let mut dispatcher = Dispatcher::new(queue, store, engine, dispatcher_config);
    dispatcher.run();

    Ok(())
}
