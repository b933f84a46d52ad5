use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

use embedfs::{Assets, Mode};

#[test]
fn test_cli_list_cat_export_cycle() -> Result<(), Box<dyn std::error::Error>> {
    // 1. List the registry
    let mut cmd = Command::cargo_bin("embedfs")?;
    cmd.arg("list");
    cmd.assert().success().stdout(
        predicate::str::contains("/edit.html")
            .and(predicate::str::contains("983 bytes"))
            .and(predicate::str::contains("/ (dir)")),
    );

    // 2. Cat the template to stdout
    let mut cmd = Command::cargo_bin("embedfs")?;
    cmd.arg("cat").arg("/edit.html");
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("<!DOCTYPE html"));

    // 3. Export everything to a directory
    let export_dir = tempdir()?;
    let mut cmd = Command::cargo_bin("embedfs")?;
    cmd.arg("export").arg("-o").arg(export_dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 assets"));

    let exported = fs::read(export_dir.path().join("edit.html"))?;
    let embedded = Assets::builtin().bytes(Mode::Embedded, "/edit.html")?;
    assert_eq!(exported, embedded);
    assert_eq!(
        fs::read(export_dir.path().join(".edit.html.swp"))?.len(),
        12288
    );

    // 4. Serve the exported copy back in local mode
    let mut cmd = Command::cargo_bin("embedfs")?;
    cmd.arg("cat")
        .arg("/edit.html")
        .arg("--local")
        .arg("--local-root")
        .arg(export_dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("<!DOCTYPE html"));

    Ok(())
}

#[test]
fn test_cli_cat_missing_asset_fails() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("embedfs")?;
    cmd.arg("cat").arg("/no-such-asset.html");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
    Ok(())
}

#[test]
fn test_cli_cat_reports_mime_type() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("embedfs")?;
    cmd.arg("cat").arg("/edit.html").arg("--mime");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("text/html"));
    Ok(())
}
