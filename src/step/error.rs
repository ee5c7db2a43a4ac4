//! Build step error types.
//!
//! [`BuildError`] aborts the step that raised it. [`StyleError`] and
//! [`AssetError`] concern a single input file: they are logged, counted in
//! the step report, and the batch moves on.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal step errors
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to remove `{}`", path.display())]
    Clean {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{category} source directory `{}` does not exist", path.display())]
    MissingSource {
        category: &'static str,
        path: PathBuf,
    },

    #[error("failed to copy `{}` to `{}`", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to list `{}`", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A stylesheet that could not be compiled
#[derive(Debug, Error)]
pub enum StyleError {
    #[error("{}: {message}", path.display())]
    Compile { path: PathBuf, message: String },

    #[error("{}: {message}", path.display())]
    Transform { path: PathBuf, message: String },
}

/// An image that could not be optimized
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("{}: failed to read: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: failed to decode: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("{}: failed to encode: {message}", path.display())]
    Encode { path: PathBuf, message: String },
}
