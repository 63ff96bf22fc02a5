use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

fn write_png(path: &Path, width: u32, height: u32, colour: [u8; 4]) {
    RgbaImage::from_pixel(width, height, Rgba(colour))
        .save(path)
        .unwrap();
}

fn write_small_setup(root: &Path) {
    write_png(&root.join("front.png"), 200, 100, [255, 0, 0, 255]);
    write_png(&root.join("back.png"), 200, 100, [0, 0, 255, 255]);
    fs::write(
        root.join("flipgrid.toml"),
        r#"
version = 1

[grid]
width = 200
height = 100
columns = 2
rows = 1
gap = 0
position = "center"
front = "front.png"
back = "back.png"
"#,
    )
    .unwrap();
}

fn flipgrid(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flipgrid"))
        .env("FLIPGRID_CONFIG_DIR", config_dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run flipgrid")
}

#[test]
fn layout_json_reports_tile_centres() {
    let root = TempDir::new().unwrap();
    write_small_setup(root.path());
    let config = root.path().join("flipgrid.toml");

    let output = flipgrid(
        root.path(),
        &["--config", config.to_str().unwrap(), "layout", "--json"],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let tiles = report["tiles"].as_array().unwrap();
    assert_eq!(tiles.len(), 2);
    assert_eq!(report["tile_width"].as_f64(), Some(100.0));
    assert_eq!(tiles[0]["centre_x"].as_f64(), Some(-50.0));
    assert_eq!(tiles[1]["centre_x"].as_f64(), Some(50.0));
    assert_eq!(tiles[1]["centre_y"].as_f64(), Some(0.0));
    assert_eq!(tiles[1]["seed_delay_ms"].as_u64(), Some(50));
}

#[test]
fn check_uses_discovered_config_and_relative_images() {
    let root = TempDir::new().unwrap();
    write_small_setup(root.path());
    let elsewhere = TempDir::new().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_flipgrid"))
        .current_dir(elsewhere.path())
        .env("FLIPGRID_CONFIG_DIR", root.path())
        .arg("check")
        .output()
        .expect("failed to run flipgrid check");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("configuration ok: 2 tiles"), "{stdout}");
}

#[test]
fn command_line_overrides_change_the_layout() {
    let root = TempDir::new().unwrap();
    write_small_setup(root.path());

    let output = flipgrid(root.path(), &["layout", "--json", "--columns", "4"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["columns"].as_u64(), Some(4));
    assert_eq!(report["tiles"].as_array().unwrap().len(), 4);
}

#[test]
fn check_fails_without_images() {
    let root = TempDir::new().unwrap();

    let output = flipgrid(root.path(), &["check"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no front image configured"), "{stderr}");
}

#[test]
fn check_rejects_images_smaller_than_the_grid() {
    let root = TempDir::new().unwrap();
    write_small_setup(root.path());
    write_png(&root.path().join("back.png"), 50, 50, [0, 0, 255, 255]);

    let output = flipgrid(root.path(), &["check"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to build image grid"), "{stderr}");
}

#[test]
fn check_rejects_unsupported_config_version() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("flipgrid.toml"), "version = 2\n").unwrap();

    let output = flipgrid(root.path(), &["check"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported config version"), "{stderr}");
}
