use crate::error::Error;
use crate::result::Result;
use crate::tpl::Tpl;
use crate::utils::is_hidden_name;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_NAME: &str = "SLAnimLoader";
pub const DEFAULT_EXTENSION: &str = "7z";
pub const DEFAULT_ARCHIVE_NAME: &str = "$NAME-$VERSION";

/// Top-level entries of the mod source tree and where each one goes in a release.
const DEFAULT_ENTRIES: &[(&str, Option<&str>)] = &[
    ("export.py", None),
    ("meta.ini", None),
    ("Interface", Some("Interface")),
    ("Scripts", Some("Scripts")),
    ("SLAnimLoader.esp", Some("SLAnimLoader.esp")),
    ("SLAnims", Some("SLAnims")),
    ("README.md", Some("Readme - SLAnimLoader.txt")),
];

/// One row of the packaging policy
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PolicyEntry {
    /// Name of a top-level entry in the source directory
    pub source: String,

    /// Path relative to the staging root, or `None` to leave the entry out
    #[serde(default)]
    pub destination: Option<String>,
}

/// On-disk form of a policy file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyFile {
    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    extension: Option<String>,

    #[serde(rename = "archive-name", default)]
    archive_name: Option<String>,

    #[serde(rename = "entry", default)]
    entries: Vec<PolicyEntry>,
}

/// Packaging policy: release naming plus the entry mapping table.
///
/// Every top-level name found in the source directory must be listed,
/// either with a destination or explicitly excluded.
#[derive(Debug, Clone)]
pub struct Policy {
    name: String,
    extension: String,
    archive_name: String,
    entries: Vec<PolicyEntry>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
            entries: DEFAULT_ENTRIES
                .iter()
                .map(|(source, destination)| PolicyEntry {
                    source: source.to_string(),
                    destination: destination.map(str::to_string),
                })
                .collect(),
        }
    }
}

impl Policy {
    /// Load a policy from a TOML file, falling back to the built-in
    /// naming for anything the file leaves out
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: PolicyFile = toml::from_str(content)?;

        let policy = Self {
            name: file.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
            extension: file.extension.unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
            archive_name: file
                .archive_name
                .unwrap_or_else(|| DEFAULT_ARCHIVE_NAME.to_string()),
            entries: file.entries,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn entries(&self) -> &[PolicyEntry] {
        &self.entries
    }

    /// Name of the versioned root directory inside the archive
    pub fn release_name(&self, version: &str) -> String {
        let mut tpl = Tpl::new();
        tpl.register("NAME", self.name.as_str());
        tpl.register("VERSION", version);
        tpl.parse(&self.archive_name)
    }

    /// File name of the archive produced for `version`
    pub fn archive_file_name(&self, version: &str) -> String {
        format!("{}.{}", self.release_name(version), self.extension)
    }

    /// Decide where a top-level source entry lands in the staging tree.
    ///
    /// `Ok(None)` means the entry is left out of the release.
    pub fn resolve(&self, entry: &str) -> Result<Option<&str>> {
        if is_hidden_name(entry) {
            log::debug!("Excluding hidden entry {}", entry);
            return Ok(None);
        }

        if self.is_release_archive(entry) {
            log::debug!("Excluding previous release archive {}", entry);
            return Ok(None);
        }

        let rule = self
            .entries
            .iter()
            .find(|e| e.source == entry)
            .ok_or_else(|| Error::UnmappedEntry(entry.to_string()))?;

        if rule.destination.is_none() {
            log::debug!("Excluding {} by policy", entry);
        }

        Ok(rule.destination.as_deref())
    }

    /// Matches names that start with `<name>-` and carry `.<extension>`
    /// anywhere after that prefix
    fn is_release_archive(&self, entry: &str) -> bool {
        let prefix = format!("{}-", self.name);
        let suffix = format!(".{}", self.extension);

        entry
            .strip_prefix(&prefix)
            .is_some_and(|rest| rest.contains(&suffix))
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.contains(['/', '\\']) {
            return Err(Error::InvalidPolicy(format!(
                "bad release name '{}'",
                self.name
            )));
        }
        if self.extension.is_empty() || self.extension.contains(['/', '\\', '.']) {
            return Err(Error::InvalidPolicy(format!(
                "bad archive extension '{}'",
                self.extension
            )));
        }
        if !self.archive_name.contains("$VERSION") {
            return Err(Error::InvalidPolicy(format!(
                "archive name '{}' must reference $VERSION",
                self.archive_name
            )));
        }

        let mut sources = HashSet::new();
        let mut destinations: Vec<(PathBuf, &str)> = Vec::new();

        for entry in &self.entries {
            if entry.source.is_empty()
                || entry.source.contains(['/', '\\'])
                || entry.source == "."
                || entry.source == ".."
            {
                return Err(Error::InvalidPolicy(format!(
                    "source '{}' must be a plain top-level name",
                    entry.source
                )));
            }
            if !sources.insert(entry.source.as_str()) {
                return Err(Error::InvalidPolicy(format!(
                    "source '{}' is listed twice",
                    entry.source
                )));
            }

            let Some(destination) = entry.destination.as_deref() else {
                continue;
            };

            let path = Path::new(destination);
            let relative = path.components().any(|c| matches!(c, Component::Normal(_)))
                && path
                    .components()
                    .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
            if !relative {
                return Err(Error::InvalidPolicy(format!(
                    "destination '{}' of '{}' must be a relative path inside the release",
                    destination, entry.source
                )));
            }

            // staged paths must be disjoint: no duplicates, no entry inside another
            let normalized: PathBuf = path
                .components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .collect();
            for (other, other_raw) in &destinations {
                if *other == normalized {
                    return Err(Error::InvalidPolicy(format!(
                        "destination '{}' is used more than once",
                        destination
                    )));
                }
                if other.starts_with(&normalized) || normalized.starts_with(other) {
                    return Err(Error::InvalidPolicy(format!(
                        "destinations '{}' and '{}' overlap",
                        other_raw, destination
                    )));
                }
            }
            destinations.push((normalized, destination));
        }

        Ok(())
    }
}
