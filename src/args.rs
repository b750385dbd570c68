use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the release exporter
#[derive(Debug)]
pub struct Args {
    /// Enable verbose output
    pub verbose: bool,

    /// Print the planned layout without building an archive
    pub dry_run: bool,

    /// Directory containing the mod sources
    pub source_dir: Option<PathBuf>,

    /// Directory receiving the archive
    pub output_dir: Option<PathBuf>,

    /// Release label
    pub version: String,

    /// Explicit archiver executable
    pub archiver: Option<PathBuf>,

    /// Upper bound on the archiver run
    pub timeout: Option<Duration>,

    /// Packaging policy file replacing the built-in table
    pub policy: Option<PathBuf>,

    /// Parent directory for the scratch area
    pub temp_dir: Option<PathBuf>,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            verbose: matches.get_flag("verbose"),
            dry_run: matches.get_flag("dry-run"),
            source_dir: matches.get_one::<PathBuf>("source-dir").cloned(),
            output_dir: matches.get_one::<PathBuf>("output-dir").cloned(),
            version: matches
                .get_one::<String>("version")
                .cloned()
                .unwrap_or_default(),
            archiver: matches.get_one::<PathBuf>("archiver").cloned(),
            timeout: matches
                .get_one::<u64>("timeout")
                .map(|secs| Duration::from_secs(*secs)),
            policy: matches.get_one::<PathBuf>("policy").cloned(),
            temp_dir: matches.get_one::<PathBuf>("temp-dir").cloned(),
        }
    }
}

fn command() -> Command {
    Command::new("slanim-export")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate the SLAnimLoader release archive")
        // -V/--version name the release being built, not this tool
        .disable_version_flag(true)
        .arg(
            Arg::new("source-dir")
                .short('s')
                .long("source-dir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("The directory containing the mod sources (defaults to the executable's directory)")
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("The output directory (defaults to the source directory)")
        )
        .arg(
            Arg::new("version")
                .short('V')
                .long("version")
                .value_name("VERSION")
                .required(true)
                .help("The version number to release")
        )
        .arg(
            Arg::new("archiver")
                .long("archiver")
                .value_name("PATH")
                .env("SLANIM_ARCHIVER")
                .value_parser(value_parser!(PathBuf))
                .help("Path to the 7-Zip executable (searched in default locations and PATH otherwise)")
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .env("SLANIM_ARCHIVER_TIMEOUT")
                .value_parser(value_parser!(u64).range(1..))
                .help("Abort if the archiver runs longer than this")
        )
        .arg(
            Arg::new("policy")
                .short('p')
                .long("policy")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("TOML packaging policy replacing the built-in entry table")
        )
        .arg(
            Arg::new("temp-dir")
                .long("temp-dir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Directory in which the temporary staging area is created")
        )
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Show which entries would be packaged and where, then exit")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output")
        )
}
