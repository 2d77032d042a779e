use std::{path::Path, process::Command};

fn arena() -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../levels/arena.hag")
        .display()
        .to_string()
}

#[test]
fn autoplay_reports_an_outcome() {
    let output = Command::new(env!("CARGO_BIN_EXE_haggis-hunt"))
        .args([arena().as_str(), "--autoplay", "--seed", "5", "--max-frames", "3000"])
        .output()
        .expect("failed to run haggis-hunt");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("lost after") || stdout.contains("no winner after"));
}

#[test]
fn missing_level_files_fail() {
    let output = Command::new(env!("CARGO_BIN_EXE_haggis-hunt"))
        .arg("does/not/exist.hag")
        .output()
        .expect("failed to run haggis-hunt");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load level"));
}
