use crate::error::Error;
use crate::result::Result;
use std::path::PathBuf;

/// Release descriptor for a single export run
#[derive(Debug, Clone)]
pub struct Context {
    /// Enable verbose output (echo archiver output)
    pub verbose: bool,

    /// Directory holding the mod sources
    pub source_dir: PathBuf,

    /// Directory receiving the finished archive
    pub output_dir: PathBuf,

    /// Release label, used verbatim in file names
    pub version: String,
}

impl Context {
    /// Build a context; the output directory defaults to the source directory
    pub fn new(
        source_dir: PathBuf,
        output_dir: Option<PathBuf>,
        version: impl Into<String>,
        verbose: bool,
    ) -> Result<Self> {
        let version = version.into();
        validate_version(&version)?;

        if !source_dir.is_dir() {
            return Err(Error::SourceNotFound(source_dir));
        }

        let output_dir = output_dir.unwrap_or_else(|| source_dir.clone());

        Ok(Self {
            verbose,
            source_dir,
            output_dir,
            version,
        })
    }
}

/// The label ends up as a single path component, so it may not be empty,
/// contain separators, or be a relative directory reference
fn validate_version(version: &str) -> Result<()> {
    if version.is_empty()
        || version == "."
        || version == ".."
        || version.contains(['/', '\\'])
    {
        return Err(Error::InvalidVersion(version.to_string()));
    }
    Ok(())
}
