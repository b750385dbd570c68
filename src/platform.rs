use std::path::PathBuf;

/// Executable names searched on `PATH` when no install location matches
pub const ARCHIVER_NAMES: &[&str] = &["7z", "7za", "7zz"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    MacOS,
    Other,
}

impl Platform {
    /// Get the current platform
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOS
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    /// Get platform identifier as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::MacOS => "macos",
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::Other => "unknown",
        }
    }

    /// Conventional 7-Zip install locations, probed in order
    pub fn archiver_candidates(&self) -> Vec<PathBuf> {
        match self {
            Platform::Windows => {
                let mut candidates = Vec::new();
                for var in ["ProgramFiles", "ProgramFiles(x86)", "ProgramW6432"] {
                    if let Some(dir) = std::env::var_os(var) {
                        candidates.push(PathBuf::from(dir).join("7-Zip").join("7z.exe"));
                    }
                }
                candidates.push(PathBuf::from(r"C:\Program Files\7-Zip\7z.exe"));
                candidates.dedup();
                candidates
            }
            Platform::MacOS => vec![
                PathBuf::from("/opt/homebrew/bin/7zz"),
                PathBuf::from("/opt/homebrew/bin/7z"),
                PathBuf::from("/usr/local/bin/7zz"),
                PathBuf::from("/usr/local/bin/7z"),
            ],
            Platform::Linux | Platform::Other => vec![
                PathBuf::from("/usr/bin/7z"),
                PathBuf::from("/usr/local/bin/7z"),
                PathBuf::from("/usr/bin/7za"),
                PathBuf::from("/usr/bin/7zz"),
            ],
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
