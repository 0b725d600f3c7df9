use hyper::http;
use std::{io, sync};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IoError: {0}")]
    IoError(#[from] io::Error),
    #[error("Hyper error: {0}")]
    HyperError(#[from] hyper::Error),
    #[error("Http Error: {0}")]
    HttpError(#[from] http::Error),
    #[error("Invalid route pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid body: {0}")]
    InvalidBody(String),
    #[error("The lock was poisoned")]
    PoisonedLock,
    #[error("The mock server hasn't been started")]
    NotStarted,
    #[error("The mock server is already running")]
    AlreadyStarted,
    #[error("The mock server thread panicked")]
    ServerThreadPanicked,
}

impl<T> From<sync::PoisonError<T>> for Error {
    fn from(_: sync::PoisonError<T>) -> Self {
        Error::PoisonedLock
    }
}
