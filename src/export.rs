use crate::archiver::{Archiver, ArchiverConfig};
use crate::context::Context;
use crate::policy::Policy;
use crate::result::Result;
use crate::utils;
use std::fs;
use std::path::{Path, PathBuf};

/// One planned move from the source tree into the staging tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedEntry {
    /// Top-level name in the source directory
    pub source: String,

    /// Path relative to the staging root
    pub destination: String,

    pub is_dir: bool,
}

/// Builds release archives from a mod source tree
#[derive(Debug, Clone)]
pub struct Exporter {
    policy: Policy,
    archiver: ArchiverConfig,
    temp_root: Option<PathBuf>,
}

impl Exporter {
    pub fn new(policy: Policy, archiver: ArchiverConfig) -> Self {
        Self {
            policy,
            archiver,
            temp_root: None,
        }
    }

    /// Create the scoped working directory under `dir` instead of the
    /// system temp location
    pub fn with_temp_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(dir.into());
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Resolve every top-level source entry against the policy.
    ///
    /// Entries come back sorted by source name so the layout and the
    /// archiver arguments do not depend on directory enumeration order.
    pub fn plan(&self, source_dir: &Path) -> Result<Vec<StagedEntry>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(source_dir)? {
            names.push(entry?.file_name());
        }
        names.sort();

        // excluded entries are never stat'ed, so broken hidden links are harmless
        let mut plan = Vec::new();
        for name in names {
            let name = name.to_string_lossy();
            if let Some(destination) = self.policy.resolve(&name)? {
                let is_dir = fs::metadata(source_dir.join(name.as_ref()))?.is_dir();
                plan.push(StagedEntry {
                    source: name.into_owned(),
                    destination: destination.to_string(),
                    is_dir,
                });
            }
        }

        Ok(plan)
    }

    /// Stage the release, archive it and move the archive into the output
    /// directory. Returns the final archive path.
    ///
    /// The working directory is removed on every exit path.
    pub fn export(&self, ctx: &Context) -> Result<PathBuf> {
        let archiver = Archiver::locate(&self.archiver)?;

        let temp = match &self.temp_root {
            Some(root) => tempfile::Builder::new()
                .prefix("slanim-export-")
                .tempdir_in(root)?,
            None => tempfile::Builder::new().prefix("slanim-export-").tempdir()?,
        };
        log::debug!("Working directory {}", temp.path().display());

        let release_name = self.policy.release_name(&ctx.version);
        let stage_dir = temp.path().join(&release_name);
        fs::create_dir(&stage_dir)?;

        let staged = self.stage(ctx, &stage_dir)?;

        let archive_name = self.policy.archive_file_name(&ctx.version);
        let relative_archive = Path::new("..").join(&archive_name);
        let destinations: Vec<&str> = staged.iter().map(|e| e.destination.as_str()).collect();

        log::info!(
            "Archiving {} entries with {}",
            destinations.len(),
            archiver.path().display()
        );
        archiver.add(&stage_dir, &relative_archive, &destinations, ctx.verbose)?;

        let built = temp.path().join(&archive_name);
        let archive_path = ctx.output_dir.join(&archive_name);
        utils::ensure_dir(&ctx.output_dir)?;
        utils::move_file(&built, &archive_path)?;
        log::info!("Moved archive to {}", archive_path.display());

        temp.close()?;
        Ok(archive_path)
    }

    fn stage(&self, ctx: &Context, stage_dir: &Path) -> Result<Vec<StagedEntry>> {
        let plan = self.plan(&ctx.source_dir)?;

        for entry in &plan {
            let src = ctx.source_dir.join(&entry.source);
            let dst = stage_dir.join(&entry.destination);
            if let Some(parent) = dst.parent() {
                utils::ensure_dir(parent)?;
            }

            log::debug!("Staging {} as {}", entry.source, entry.destination);
            if entry.is_dir {
                utils::copy_tree(&src, &dst)?;
            } else {
                utils::copy_file(&src, &dst)?;
            }
        }

        Ok(plan)
    }
}
