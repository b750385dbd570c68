use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Custom(String),

    #[error("cannot find archiver: {0}")]
    ToolNotFound(String),

    #[error("no packaging rule for top-level entry '{0}' (add it to the policy, mapped or excluded)")]
    UnmappedEntry(String),

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid version label '{0}'")]
    InvalidVersion(String),

    #[error("error creating archive ({0})")]
    ArchiveFailed(String),

    #[error("archiver did not finish within {0} seconds")]
    ArchiveTimeout(u64),

    #[error("source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub fn custom<T: Into<String>>(msg: T) -> Self {
        Error::Custom(msg.into())
    }
}
