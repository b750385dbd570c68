use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn mod_tree(root: &Path) {
    write(root, "README.md", "# SLAnimLoader");
    write(root, "SLAnimLoader.esp", "TES4");
    write(root, "Scripts/loader.pex", "pex");
    write(root, "SLAnims/json/pack.json", "{}");
    write(root, "Interface/translations/en.txt", "hello");
    write(root, "meta.ini", "[General]");
    write(root, ".gitignore", "*.7z");
}

fn exporter() -> Command {
    let mut cmd = Command::cargo_bin("slanim-export").unwrap();
    cmd.env_remove("SLANIM_ARCHIVER")
        .env_remove("SLANIM_ARCHIVER_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn version_is_required() {
    exporter()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--version"));
}

#[test]
fn rejects_path_like_version() {
    let src = tempfile::tempdir().unwrap();
    mod_tree(src.path());

    exporter()
        .arg("-s")
        .arg(src.path())
        .args(["-V", "../1.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: invalid version label"));
}

#[test]
fn dry_run_writes_nothing() {
    let src = tempfile::tempdir().unwrap();
    mod_tree(src.path());
    let before: Vec<_> = fs::read_dir(src.path()).unwrap().collect();

    exporter()
        .arg("-s")
        .arg(src.path())
        .args(["-V", "2.3", "--dry-run"])
        .assert()
        .success();

    let after: Vec<_> = fs::read_dir(src.path()).unwrap().collect();
    assert_eq!(before.len(), after.len());
    assert!(!src.path().join("SLAnimLoader-2.3.7z").exists());
}

#[test]
fn unmapped_entry_fails() {
    let src = tempfile::tempdir().unwrap();
    mod_tree(src.path());
    write(src.path(), "notes.txt", "todo");

    exporter()
        .arg("-s")
        .arg(src.path())
        .args(["-V", "2.3", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("notes.txt"));
}

#[test]
fn missing_archiver_fails() {
    let src = tempfile::tempdir().unwrap();
    mod_tree(src.path());

    exporter()
        .arg("-s")
        .arg(src.path())
        .args(["-V", "2.3", "--archiver"])
        .arg(src.path().join("no-such-7z"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: cannot find archiver"));

    assert!(!src.path().join("SLAnimLoader-2.3.7z").exists());
}

#[test]
fn custom_policy_file_is_used() {
    let src = tempfile::tempdir().unwrap();
    write(src.path(), "docs.md", "docs");
    let policy = tempfile::tempdir().unwrap();
    write(
        policy.path(),
        "release.toml",
        "name = \"MyMod\"\n[[entry]]\nsource = \"docs.md\"\ndestination = \"Readme.txt\"\n",
    );

    exporter()
        .arg("-s")
        .arg(src.path())
        .args(["-V", "1", "--dry-run", "--policy"])
        .arg(policy.path().join("release.toml"))
        .assert()
        .success();
}

#[cfg(unix)]
mod with_archiver {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn fake_archiver(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("7z");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn export_writes_archive_to_output_dir() {
        let src = tempfile::tempdir().unwrap();
        mod_tree(src.path());
        let out = tempfile::tempdir().unwrap();
        let tools = tempfile::tempdir().unwrap();
        let tool = fake_archiver(tools.path(), r#"shift; out="$1"; shift; printf '%s\n' "$@" > "$out""#);

        let assert = exporter()
            .arg("-s")
            .arg(src.path())
            .arg("-o")
            .arg(out.path())
            .args(["-V", "2.3"])
            .env("SLANIM_ARCHIVER", &tool)
            .assert()
            .success();

        let archive = out.path().join("SLAnimLoader-2.3.7z");

        // the terminal UI may write to either stream
        let output = assert.get_output();
        let printed = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        assert!(
            printed.contains("Generating release archive for version 2.3"),
            "{}",
            printed
        );
        assert!(
            printed.contains(&format!("Successfully generated {}", archive.display())),
            "{}",
            printed
        );

        assert_eq!(
            fs::read_to_string(archive).unwrap(),
            "Interface\nReadme - SLAnimLoader.txt\nSLAnimLoader.esp\nSLAnims\nScripts\n"
        );
    }

    #[test]
    fn failing_archiver_reports_error() {
        let src = tempfile::tempdir().unwrap();
        mod_tree(src.path());
        let tools = tempfile::tempdir().unwrap();
        let tool = fake_archiver(tools.path(), "exit 1");

        exporter()
            .arg("-s")
            .arg(src.path())
            .args(["-V", "2.3", "--archiver"])
            .arg(&tool)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error: error creating archive"));

        assert!(!src.path().join("SLAnimLoader-2.3.7z").exists());
    }
}
