//! Internal driver failures: the handful of things that are not language
//! diagnostics, because they happen before or after the pipeline has a
//! chance to collect any.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("could not read source from stdin: {0}")]
    StdinReadFailed(#[source] std::io::Error),

    #[error("could not open output file {0}: {1}")]
    OutputOpenFailed(PathBuf, #[source] std::io::Error),

    #[error("could not write bitcode to {0}")]
    OutputWriteFailed(PathBuf),
}
