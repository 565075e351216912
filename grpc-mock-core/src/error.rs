use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::MethodKey;

/// Fatal errors raised while building the service catalog.
///
/// Any of these aborts startup: the server must never begin serving with a
/// partial or ambiguous catalog.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("cannot read proto directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid protocol description {}: {source}", file.display())]
    Parse {
        file: PathBuf,
        #[source]
        source: Box<protox::Error>,
    },

    #[error("protocol description {} was compiled but is missing from the descriptor pool", file.display())]
    MissingFile { file: PathBuf },

    #[error(
        "method {} is defined by both {} and {}",
        key.path(),
        first.display(),
        second.display()
    )]
    DuplicateMethod {
        key: MethodKey,
        first: PathBuf,
        second: PathBuf,
    },
}

/// A mock artifact exists but cannot be used.
///
/// Never fatal: the dispatcher folds these into a not-found outcome.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
