use drover_core::prelude::TransportError;
use thiserror::Error;

/// Errors that can be returned by one dispatch iteration. None of
/// them terminate the loop; `Dispatcher::run` logs and backs off.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("storage transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("internal error occurred: {0}")]
    Internal(anyhow::Error),
}
