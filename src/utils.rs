use crate::result::Result;
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Names starting with a dot are never packaged
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && is_hidden_name(&entry.file_name().to_string_lossy())
}

fn is_hidden_path(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| is_hidden_name(&name.to_string_lossy()))
}

/// Copy a directory tree into `destination`, which must not exist yet.
///
/// Hidden entries are skipped at every depth; hidden directories are not
/// descended into.
pub fn copy_tree(source: &Path, destination: &Path) -> Result<()> {
    fs::create_dir(destination)?;

    let walker = WalkDir::new(source)
        .follow_links(true)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        // filter_entry only sees entries that could be read, so a broken
        // hidden link surfaces here as an error
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.path().is_some_and(is_hidden_path) => continue,
            Err(err) => return Err(err.into()),
        };
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir(&target)?;
        } else {
            log::trace!("Copying {} to {}", entry.path().display(), target.display());
            copy_file(entry.path(), &target)?;
        }
    }

    Ok(())
}

/// Copy a single file, keeping permissions and access/modification times
pub fn copy_file(source: &Path, destination: &Path) -> Result<()> {
    fs::copy(source, destination)?;

    let metadata = fs::metadata(source)?;
    let mut times = FileTimes::new().set_modified(metadata.modified()?);
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }

    // a read-only copy cannot be opened for writing
    match File::options().write(true).open(destination) {
        Ok(file) => file.set_times(times)?,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            File::open(destination)?.set_times(times)?
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Move a file, falling back to copy and remove when a rename is not possible
/// (for example across filesystems). An existing destination is replaced.
pub fn move_file(source: &Path, destination: &Path) -> Result<()> {
    if let Err(e) = fs::rename(source, destination) {
        log::debug!(
            "Rename {} -> {} failed ({}), copying instead",
            source.display(),
            destination.display(),
            e
        );
        copy_file(source, destination)?;
        fs::remove_file(source)?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
