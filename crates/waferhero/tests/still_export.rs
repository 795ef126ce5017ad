use std::process::Command;

#[test]
fn still_export_writes_a_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("wafer.png");
    let status = Command::new(env!("CARGO_BIN_EXE_waferhero"))
        .args(["--size", "320x240", "--quality", "mobile"])
        .arg("--still-export")
        .arg(&out)
        .status()
        .expect("run waferhero");
    assert!(status.success());
    let bytes = std::fs::read(&out).expect("read exported still");
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn invalid_config_file_fails_loudly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("waferhero.toml");
    std::fs::write(&config, "version = 99\n").expect("write config");
    let out = dir.path().join("wafer.png");
    let status = Command::new(env!("CARGO_BIN_EXE_waferhero"))
        .arg("--config")
        .arg(&config)
        .arg("--still-export")
        .arg(&out)
        .status()
        .expect("run waferhero");
    assert!(!status.success());
    assert!(!out.exists());
}

#[test]
fn config_file_tunes_the_scene() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("waferhero.toml");
    std::fs::write(
        &config,
        "version = 1\n\n[quality]\ntier = \"mobile\"\n\n[rim]\nstyle = \"linear\"\n",
    )
    .expect("write config");
    let out = dir.path().join("wafer.png");
    let status = Command::new(env!("CARGO_BIN_EXE_waferhero"))
        .args(["--size", "320x240"])
        .arg("--config")
        .arg(&config)
        .arg("--still-export")
        .arg(&out)
        .status()
        .expect("run waferhero");
    assert!(status.success());
    assert!(out.exists());
}
