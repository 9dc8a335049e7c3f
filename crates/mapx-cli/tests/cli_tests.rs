//! Integration tests for mapx-cli.
//!
//! Note: Tests use `unwrap`/`expect` which is acceptable in test code.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use mapx_core::test_utils::RsmFixture;
use mapx_core::test_utils::RswFixture;
use mapx_core::test_utils::create_test_zip;
use mapx_core::test_utils::encode_gnd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn mapx_cmd() -> Command {
    cargo_bin_cmd!("mapx")
}

/// A map archive with a ground file, a world file placing one model, and
/// their textures, plus a loose directory overriding one texture.
struct Fixture {
    temp: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let gnd = encode_gnd(&["a.bmp", "b.bmp"]);
        let rsw = RswFixture::new(2, 1).model("m.rsm").encode();
        let rsm = RsmFixture::v1(4).texture("m.bmp").encode();
        let zip = create_test_zip(vec![
            ("data/town.gnd", &gnd[..]),
            ("data/town.rsw", &rsw[..]),
            ("data/model/m.rsm", &rsm[..]),
            ("data/texture/a.bmp", &b"base-a"[..]),
            ("data/texture/b.bmp", &b"base-b"[..]),
            ("data/texture/m.bmp", &b"base-m"[..]),
        ]);
        fs::write(temp.path().join("data.zip"), zip).unwrap();

        let patch = temp.path().join("patch").join("data").join("texture");
        fs::create_dir_all(&patch).unwrap();
        fs::write(patch.join("a.bmp"), b"patched-a").unwrap();

        Self { temp }
    }

    fn archive(&self) -> PathBuf {
        self.temp.path().join("data.zip")
    }

    fn patch(&self) -> PathBuf {
        self.temp.path().join("patch")
    }

    fn out(&self) -> PathBuf {
        self.temp.path().join("out")
    }
}

#[test]
fn test_version_flag() {
    mapx_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mapx"));
}

#[test]
fn test_help_flag() {
    mapx_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Command-line utility"));
}

#[test]
fn test_export_help() {
    mapx_cmd()
        .arg("export")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--root-files-only"));
}

#[test]
fn test_tree_lists_dependencies() {
    let fixture = Fixture::new();

    mapx_cmd()
        .arg("tree")
        .arg("data\\town.rsw")
        .arg("--archive")
        .arg(fixture.archive())
        .assert()
        .success()
        .stdout(predicate::str::contains("[x] town.rsw"))
        .stdout(predicate::str::contains("  [x] m.rsm"))
        .stdout(predicate::str::contains("    [x] m.bmp"))
        .stdout(predicate::str::contains("[ ] town.gnd"))
        .stdout(predicate::str::contains(
            "Total: 6 resources, 3 selected, 0 missing",
        ));
}

#[test]
fn test_tree_json_output() {
    let fixture = Fixture::new();

    mapx_cmd()
        .arg("tree")
        .arg("data\\town.gnd")
        .arg("-a")
        .arg(fixture.archive())
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"operation\": \"tree\""))
        .stdout(predicate::str::contains("\"resources\": 6"))
        .stdout(predicate::str::contains("\"state\": \"checked\""));
}

#[test]
fn test_tree_marks_missing_resources() {
    let fixture = Fixture::new();

    mapx_cmd()
        .arg("tree")
        .arg("data\\nowhere.gnd")
        .arg("-a")
        .arg(fixture.archive())
        .assert()
        .success()
        .stdout(predicate::str::contains("[-] nowhere.gnd (missing)"))
        .stdout(predicate::str::contains("2 missing"));
}

#[test]
fn test_export_layers_sources() {
    let fixture = Fixture::new();

    mapx_cmd()
        .arg("export")
        .arg("data\\town.gnd")
        .arg(fixture.out())
        .arg("-a")
        .arg(fixture.archive())
        .arg("-s")
        .arg(fixture.patch())
        .assert()
        .success()
        .stdout(predicate::str::contains("Export complete"))
        .stdout(predicate::str::contains("Files written: 3"));

    let out = fixture.out().join("data");
    assert!(out.join("town.gnd").is_file());
    assert!(!out.join("town.rsw").exists());
    assert_eq!(fs::read(out.join("texture").join("a.bmp")).unwrap(), b"patched-a");
    assert_eq!(fs::read(out.join("texture").join("b.bmp")).unwrap(), b"base-b");
}

#[test]
fn test_export_defaults_to_archive_directory() {
    let fixture = Fixture::new();

    mapx_cmd()
        .arg("export")
        .arg("data\\town.rsw")
        .arg("-a")
        .arg(fixture.archive())
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let data = fixture.temp.path().join("data");
    assert!(data.join("town.rsw").is_file());
    assert!(data.join("model").join("m.rsm").is_file());
    assert!(data.join("texture").join("m.bmp").is_file());
}

#[test]
fn test_export_exclude() {
    let fixture = Fixture::new();

    mapx_cmd()
        .arg("export")
        .arg("data\\town.gnd")
        .arg(fixture.out())
        .arg("-a")
        .arg(fixture.archive())
        .arg("-x")
        .arg("data/texture/B.BMP")
        .arg("-x")
        .arg("data\\texture\\nope.bmp")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "WARNING: --exclude data\\texture\\nope.bmp matched no selected resource",
        ));

    let texture = fixture.out().join("data").join("texture");
    assert!(texture.join("a.bmp").is_file());
    assert!(!texture.join("b.bmp").exists());
}

#[test]
fn test_export_json_output() {
    let fixture = Fixture::new();

    mapx_cmd()
        .arg("export")
        .arg("data\\town.gnd")
        .arg(fixture.out())
        .arg("-a")
        .arg(fixture.archive())
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"operation\": \"export\""))
        .stdout(predicate::str::contains("\"status\": \"success\""))
        .stdout(predicate::str::contains("\"files_written\": 3"));
}

#[test]
fn test_persisted_source_list() {
    let fixture = Fixture::new();
    let list = format!(
        "{},<primary>:{}",
        fixture.patch().display(),
        fixture.archive().display()
    );

    mapx_cmd()
        .arg("export")
        .arg("data\\town.gnd")
        .arg(fixture.out())
        .arg("-a")
        .arg(fixture.archive())
        .arg("--sources")
        .arg(list)
        .assert()
        .success();

    let a = fixture.out().join("data").join("texture").join("a.bmp");
    assert_eq!(fs::read(a).unwrap(), b"patched-a");
}

#[test]
fn test_unsupported_archive_shows_hint() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("data.rar");
    fs::write(&archive, b"not an archive").unwrap();

    mapx_cmd()
        .arg("tree")
        .arg("data\\town.gnd")
        .arg("-a")
        .arg(&archive)
        .assert()
        .failure()
        .stderr(predicate::str::contains("HINT"));
}

#[test]
fn test_missing_archive_argument() {
    mapx_cmd()
        .arg("tree")
        .arg("data\\town.gnd")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--archive"));
}

#[test]
fn test_completion_bash() {
    mapx_cmd()
        .arg("completion")
        .arg("bash")
        .assert()
        .success()
        .stdout(predicate::str::contains("mapx"));
}
