extern crate assert_cmd;
extern crate mandelzoom;
extern crate predicates;
extern crate tempfile;

use assert_cmd::prelude::*;
use mandelzoom::frame::frame_path;
use mandelzoom::Frame;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn bin(name: &str) -> Command {
    let mut cmd = Command::cargo_bin(name).unwrap();
    cmd.env("RUST_LOG", "info");
    cmd
}

#[test]
fn mandelzoom_writes_every_frame_of_the_plan() {
    let dir = tempdir().unwrap();
    bin("mandelzoom")
        .args(&["-s", "16x9", "-f", "2", "-d", "50", "-t", "1", "-o"])
        .arg(dir.path())
        .assert()
        .success();

    for index in 0..4 {
        let frame = Frame::load(&frame_path(dir.path(), index)).unwrap();
        assert_eq!((frame.width(), frame.height()), (16, 9));
    }
    assert!(!frame_path(dir.path(), 4).exists());
}

#[test]
fn mandelzoom_dives_toward_every_point() {
    let dir = tempdir().unwrap();
    bin("mandelzoom")
        .args(&["-s", "8x8", "-f", "1", "-d", "20", "-t", "1"])
        .args(&["-p", "-0.75,0.1", "-p", "0.3,0.5", "-o"])
        .arg(dir.path())
        .assert()
        .success();

    // Two points, two legs, one frame a leg.
    assert!(frame_path(dir.path(), 3).is_file());
    assert!(!frame_path(dir.path(), 4).exists());
}

#[test]
fn mandelzoom_clears_old_frames_unless_asked_not_to() {
    let dir = tempdir().unwrap();
    let stale = frame_path(dir.path(), 10);
    Frame::new(1, 1).unwrap().save_bmp(&stale).unwrap();

    bin("mandelzoom")
        .args(&["-s", "8x8", "-f", "1", "-d", "20", "-t", "1", "--keep", "-o"])
        .arg(dir.path())
        .assert()
        .success();
    assert!(stale.exists());

    bin("mandelzoom")
        .args(&["-s", "8x8", "-f", "1", "-d", "20", "-t", "1", "-o"])
        .arg(dir.path())
        .assert()
        .success();
    assert!(!stale.exists());
    assert!(frame_path(dir.path(), 0).exists());
}

#[test]
fn mandelzoom_rejects_an_empty_image() {
    bin("mandelzoom")
        .args(&["-s", "0x9"])
        .assert()
        .failure();
}

#[test]
fn snapshot_renders_one_image() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("still.png");
    bin("snapshot")
        .args(&["-s", "32x18", "-d", "100", "-l", "-2.5,-1", "-r", "1,1", "-o"])
        .arg(&output)
        .assert()
        .success();

    let frame = Frame::load(&output).unwrap();
    assert_eq!((frame.width(), frame.height()), (32, 18));
}

#[test]
fn snapshot_refuses_inverted_corners() {
    let dir = tempdir().unwrap();
    bin("snapshot")
        .args(&["-s", "8x8", "-l", "1,1", "-r", "-1,-1", "-o"])
        .arg(dir.path().join("never.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("left lower corner"));
}

#[cfg(not(feature = "opencl"))]
#[test]
fn snapshot_explains_a_missing_gpu_backend() {
    let dir = tempdir().unwrap();
    bin("snapshot")
        .args(&["-s", "8x8", "-b", "gpu", "-o"])
        .arg(dir.path().join("never.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--features opencl"));
}

#[test]
fn stitch_needs_at_least_one_frame() {
    let dir = tempdir().unwrap();
    bin("stitch")
        .arg("-i")
        .arg(dir.path())
        .arg("-o")
        .arg(dir.path().join("out.mp4"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing frame"));
    assert!(!dir.path().join("out.mp4").exists());
}

#[test]
fn stitch_refuses_an_empty_range() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path()).unwrap();
    bin("stitch")
        .args(&["--first", "5", "--last", "5", "-i"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be greater"));
}
