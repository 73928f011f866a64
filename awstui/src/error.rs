use std::{io, path::PathBuf};

use thiserror::Error;

use crate::ini;

#[derive(Debug, Error)]
pub enum Error {
  /// The home directory needed to locate the default profile sources is unavailable
  #[error("cannot determine configuration location: home directory not found")]
  Configuration,

  /// A profile source exists on disk but could not be read or parsed
  #[error("could not read profile source {}", path.display())]
  SourceRead {
    path: PathBuf,
    #[source]
    source: SourceError,
  },

  #[error("profile not found: {0}")]
  ProfileNotFound(String),
}

#[derive(Debug, Error)]
pub enum SourceError {
  #[error(transparent)]
  Io(#[from] io::Error),

  #[error(transparent)]
  Parse(#[from] ini::ParseError),
}
