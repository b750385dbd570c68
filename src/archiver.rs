use crate::error::Error;
use crate::platform::{ARCHIVER_NAMES, Platform};
use crate::result::Result;
use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Command verb that adds files to (or creates) an archive
const ADD_VERB: &str = "a";

/// Where to look for the archiver and how long to let it run
#[derive(Debug, Clone, Default)]
pub struct ArchiverConfig {
    /// Explicit executable; disables every other lookup
    pub path: Option<PathBuf>,

    /// Kill the archiver if it runs longer than this
    pub timeout: Option<Duration>,
}

/// A located, executable 7-Zip compatible archiver
#[derive(Debug, Clone)]
pub struct Archiver {
    path: PathBuf,
    timeout: Option<Duration>,
}

impl Archiver {
    /// Resolve the archiver executable.
    ///
    /// An explicit path must point at an executable file. Otherwise the
    /// platform install locations are probed, then `PATH`.
    pub fn locate(config: &ArchiverConfig) -> Result<Self> {
        let path = match &config.path {
            Some(path) => {
                if !is_executable(path) {
                    return Err(Error::ToolNotFound(format!(
                        "{} is missing or not executable",
                        path.display()
                    )));
                }
                path.clone()
            }
            None => find_default().ok_or_else(|| {
                Error::ToolNotFound(format!(
                    "no 7-Zip executable in the default {} locations or on PATH ({}); \
                     use --archiver or SLANIM_ARCHIVER",
                    Platform::current(),
                    ARCHIVER_NAMES.join(", ")
                ))
            })?,
        };

        log::debug!("Using archiver {}", path.display());

        Ok(Self {
            path,
            timeout: config.timeout,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `<archiver> a <archive> <entries...>` inside `working_dir` and
    /// wait for it to exit.
    ///
    /// `archive` is passed through as given, so a relative path is resolved
    /// by the archiver against `working_dir`.
    pub fn add<S: AsRef<OsStr>>(
        &self,
        working_dir: &Path,
        archive: &Path,
        entries: &[S],
        verbose: bool,
    ) -> Result<()> {
        if verbose {
            let listed: Vec<_> = entries
                .iter()
                .map(|e| e.as_ref().to_string_lossy().into_owned())
                .collect();
            println!(
                "Executing: {} {} {} {}",
                self.path.display(),
                ADD_VERB,
                archive.display(),
                listed.join(" ")
            );
        }

        let mut child = Command::new(&self.path)
            .arg(ADD_VERB)
            .arg(archive)
            .args(entries)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // both pipes are drained concurrently so a chatty archiver never
        // blocks on a full pipe while we wait on it
        let stdout = child.stdout.take().map(|out| drain(out, verbose, false));
        let stderr = child.stderr.take().map(|err| drain(err, verbose, true));

        let status = match self.timeout {
            None => child.wait()?,
            Some(timeout) => match child.wait_timeout(timeout)? {
                Some(status) => status,
                None => {
                    log::warn!(
                        "Archiver exceeded {}s, killing pid {}",
                        timeout.as_secs(),
                        child.id()
                    );
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::ArchiveTimeout(timeout.as_secs()));
                }
            },
        };

        for handle in [stdout, stderr].into_iter().flatten() {
            let _ = handle.join();
        }

        check_status(status)
    }
}

/// Read a child pipe to the end, echoing lines only in verbose mode
fn drain<R: Read + Send + 'static>(pipe: R, verbose: bool, is_stderr: bool) -> JoinHandle<()> {
    thread::spawn(move || {
        for line in BufReader::new(pipe).lines().map_while(|l| l.ok()) {
            if !verbose {
                continue;
            }
            if is_stderr {
                eprintln!("{}", line);
            } else {
                println!("{}", line);
            }
        }
    })
}

fn check_status(status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }

    let reason = match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    };
    Err(Error::ArchiveFailed(reason))
}

fn find_default() -> Option<PathBuf> {
    Platform::current()
        .archiver_candidates()
        .into_iter()
        .find(|p| is_executable(p))
        .or_else(|| ARCHIVER_NAMES.iter().find_map(|name| which::which(name).ok()))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}


#[cfg(all(test, unix))]
mod tests {
    use super::testing::fake_archiver;
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn config(path: PathBuf) -> ArchiverConfig {
        ArchiverConfig {
            path: Some(path),
            timeout: None,
        }
    }

    #[test]
    fn test_explicit_missing_path() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Archiver::locate(&config(tmp.path().join("7z.exe"))).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(_)));
    }

    #[test]
    fn test_explicit_path_must_be_executable() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("7z");
        fs::write(&path, "").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let err = Archiver::locate(&config(path)).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(_)));
    }

    #[test]
    fn test_directory_is_not_an_archiver() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Archiver::locate(&config(tmp.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(_)));
    }

    #[test]
    fn test_add_passes_verb_archive_and_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let tool = fake_archiver(tmp.path(), r#"printf '%s\n' "$@" > args.txt"#);
        let work = tmp.path().join("work");
        fs::create_dir(&work).unwrap();

        let archiver = Archiver::locate(&config(tool.clone())).unwrap();
        assert_eq!(archiver.path(), tool);
        archiver
            .add(&work, Path::new("../out.7z"), &["Scripts", "Readme - X.txt"], false)
            .unwrap();

        let args = fs::read_to_string(work.join("args.txt")).unwrap();
        assert_eq!(args, "a\n../out.7z\nScripts\nReadme - X.txt\n");
    }

    #[test]
    fn test_nonzero_exit_is_archive_error() {
        let tmp = tempfile::tempdir().unwrap();
        let tool = fake_archiver(tmp.path(), "exit 2");

        let archiver = Archiver::locate(&config(tool)).unwrap();
        let err = archiver
            .add(tmp.path(), Path::new("x.7z"), &["a"], false)
            .unwrap_err();

        assert!(matches!(err, Error::ArchiveFailed(ref reason) if reason == "exit code 2"));
    }

    #[test]
    fn test_large_output_is_drained() {
        let tmp = tempfile::tempdir().unwrap();
        // well past a pipe buffer on both streams
        let tool = fake_archiver(
            tmp.path(),
            "i=0; while [ $i -lt 4000 ]; do \
             echo \"compressing entry number $i\"; echo \"warning $i\" >&2; \
             i=$((i+1)); done",
        );

        let archiver = Archiver::locate(&ArchiverConfig {
            path: Some(tool),
            timeout: Some(Duration::from_secs(20)),
        })
        .unwrap();

        archiver
            .add(tmp.path(), Path::new("x.7z"), &["a"], false)
            .unwrap();
    }

    #[test]
    fn test_timeout_kills_archiver() {
        let tmp = tempfile::tempdir().unwrap();
        let tool = fake_archiver(tmp.path(), "exec sleep 30");

        let archiver = Archiver::locate(&ArchiverConfig {
            path: Some(tool),
            timeout: Some(Duration::from_secs(1)),
        })
        .unwrap();
        let err = archiver
            .add(tmp.path(), Path::new("x.7z"), &["a"], false)
            .unwrap_err();

        assert!(matches!(err, Error::ArchiveTimeout(1)));
    }
}
