mod archiver;
mod args;
mod context;
mod error;
mod export;
mod platform;
mod policy;
mod result;
mod tpl;
mod utils;

use archiver::ArchiverConfig;
use args::Args;
use context::Context;
use error::Error;
use export::Exporter;
use policy::Policy;
use std::path::PathBuf;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> result::Result<()> {
    let Args {
        verbose,
        dry_run,
        source_dir,
        output_dir,
        version,
        archiver,
        timeout,
        policy,
        temp_dir,
    } = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if verbose { "debug" } else { "warn" }),
    )
    .init();

    let source_dir = match source_dir {
        Some(dir) => dir,
        None => executable_dir()?,
    };
    let ctx = Context::new(source_dir, output_dir, version, verbose)?;

    let policy = match policy {
        Some(path) => Policy::load(&path)?,
        None => Policy::default(),
    };

    let mut exporter = Exporter::new(policy, ArchiverConfig { path: archiver, timeout });
    if let Some(dir) = temp_dir {
        exporter = exporter.with_temp_root(dir);
    }

    cliclack::intro("slanim-export")?;

    if dry_run {
        return show_plan(&ctx, &exporter);
    }

    cliclack::log::info(format!(
        "Generating release archive for version {}",
        ctx.version
    ))?;

    let spinner = cliclack::spinner();
    spinner.start("Building archive...");
    let archive_path = match exporter.export(&ctx) {
        Ok(path) => {
            spinner.stop("Archive created");
            path
        }
        Err(e) => {
            spinner.error("Failed to create archive");
            return Err(e);
        }
    };

    cliclack::outro(format!("Successfully generated {}", archive_path.display()))?;
    Ok(())
}

fn show_plan(ctx: &Context, exporter: &Exporter) -> result::Result<()> {
    let plan = exporter.plan(&ctx.source_dir)?;
    let policy = exporter.policy();

    let mut lines = Vec::new();
    for entry in &plan {
        let suffix = if entry.is_dir { "/" } else { "" };
        lines.push(format!("{}{} -> {}{}", entry.source, suffix, entry.destination, suffix));
    }

    let missing: Vec<&str> = policy
        .entries()
        .iter()
        .filter(|e| e.destination.is_some() && !ctx.source_dir.join(&e.source).exists())
        .map(|e| e.source.as_str())
        .collect();

    cliclack::note(
        format!(
            "{} in {}",
            policy.release_name(&ctx.version),
            ctx.output_dir.join(policy.archive_file_name(&ctx.version)).display()
        ),
        lines.join("\n"),
    )?;

    if !missing.is_empty() {
        cliclack::log::warning(format!(
            "Not present in the source tree: {}",
            missing.join(", ")
        ))?;
    }

    cliclack::outro("Dry run, nothing written")?;
    Ok(())
}

/// Directory of the running executable, the default source location
fn executable_dir() -> result::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(|p| p.to_path_buf())
        .ok_or_else(|| Error::custom(format!("cannot determine directory of {}", exe.display())))
}
