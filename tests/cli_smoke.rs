use std::io::Cursor;
use std::path::Path;
use std::process::{Command, Output};

fn plategen(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_plategen"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn ok(config: &Path, args: &[&str]) -> String {
    let out = plategen(config, args);
    assert!(
        out.status.success(),
        "plategen {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn write_motif(path: &Path) {
    let img = image::RgbaImage::from_pixel(40, 20, image::Rgba([220, 30, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, buf).unwrap();
}

#[test]
fn cli_configures_and_exports_png() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("design.json");
    let motif = dir.path().join("motif.png");
    let out = dir.path().join("out").join("design.png");
    write_motif(&motif);

    let shown = ok(&config, &["show"]);
    assert!(shown.contains("100 x 60 cm"), "{shown}");
    assert!(shown.contains("(1 plates)"), "{shown}");

    ok(&config, &["add"]);
    ok(&config, &["set", "#2", "--width", "50", "--height", "90"]);
    ok(&config, &["motif", motif.to_str().unwrap(), "--embed"]);
    ok(
        &config,
        &["export", "--out", out.to_str().unwrap(), "--border", "0"],
    );

    let img = image::open(&out).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (150, 90));
    assert_eq!(img.get_pixel(50, 5).0, [255, 255, 255, 255]);
    assert_eq!(img.get_pixel(50, 45).0, [220, 30, 30, 255]);
    assert_eq!(img.get_pixel(120, 2).0, [220, 30, 30, 255]);
}

#[test]
fn cli_unit_and_reorder() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("design.json");

    ok(&config, &["add", "--count", "2"]);
    ok(&config, &["unit", "in"]);
    ok(&config, &["set", "#3", "--width", "20"]);

    let shown = ok(&config, &["move", "3", "1"]);
    let first = shown.lines().next().unwrap();
    assert!(first.contains("20.00 x 23.62 in"), "{shown}");

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config).unwrap()).unwrap();
    assert_eq!(stored["unit"], "in");
    let width = stored["plates"][0]["width"].as_f64().unwrap();
    assert!((width - 50.8).abs() < 1e-9);
}

#[test]
fn cli_rejects_out_of_range_and_keeps_last_plate() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("design.json");

    let out = plategen(&config, &["set", "#1", "--height", "200"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Must be between 30.0 and 128.0 cm."));

    let out = plategen(&config, &["remove", "#1"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("cannot remove the last plate"));
}

#[test]
fn cli_preview_fits_max_width() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("design.json");
    let motif = dir.path().join("motif.png");
    let out = dir.path().join("preview.png");
    write_motif(&motif);

    ok(&config, &["add"]);
    ok(&config, &["set", "#2", "--width", "50", "--height", "90"]);
    ok(&config, &["motif", motif.to_str().unwrap()]);
    ok(
        &config,
        &["preview", "--out", out.to_str().unwrap(), "--max-width", "75"],
    );

    let img = image::open(&out).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (75, 45));
}

#[test]
fn cli_reset_and_motif_reset_restore_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("design.json");
    let motif = dir.path().join("motif.png");
    write_motif(&motif);

    ok(&config, &["add", "--count", "2"]);
    ok(&config, &["motif", motif.to_str().unwrap()]);
    let shown = ok(&config, &["show"]);
    assert!(shown.contains("motif: file "), "{shown}");

    ok(&config, &["motif", "--reset"]);
    let shown = ok(&config, &["show"]);
    assert!(shown.contains("motif: default motif"), "{shown}");
    assert!(shown.contains("(3 plates)"), "{shown}");

    ok(&config, &["reset"]);
    assert!(!config.exists());
    let shown = ok(&config, &["show"]);
    assert!(shown.contains("(1 plates)"), "{shown}");
    assert!(shown.contains("100 x 60 cm"), "{shown}");
}

#[test]
fn cli_removes_plate_by_id() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("design.json");

    ok(&config, &["add"]);
    ok(&config, &["set", "#2", "--width", "40"]);
    let shown = ok(&config, &["show"]);
    let id = shown
        .lines()
        .find(|l| l.starts_with("#2"))
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap()
        .to_string();

    let out = plategen(&config, &["remove", &id]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains(&format!("removed plate {id}")));

    let shown = ok(&config, &["show"]);
    assert!(shown.contains("(1 plates)"), "{shown}");
    assert!(!shown.contains(&id), "{shown}");
    assert!(shown.contains("100 x 60 cm"), "{shown}");
}

#[test]
fn cli_exports_jpeg_and_names_the_file_after_the_format() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("design.json");
    let motif = dir.path().join("motif.png");
    write_motif(&motif);
    ok(&config, &["motif", motif.to_str().unwrap(), "--embed"]);

    let stem = dir.path().join("design");
    ok(
        &config,
        &["export", "--format", "jpeg", "--out", stem.to_str().unwrap()],
    );
    let written = dir.path().join("design.jpg");
    let bytes = std::fs::read(&written).unwrap();
    assert_eq!(
        image::guess_format(&bytes).unwrap(),
        image::ImageFormat::Jpeg
    );
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (100, 60));

    let clash = dir.path().join("clash.png");
    let out = plategen(
        &config,
        &["export", "--format", "jpeg", "--out", clash.to_str().unwrap()],
    );
    assert!(!out.status.success());
    assert!(!clash.exists());

    let webp = dir.path().join("design.webp");
    let out = plategen(&config, &["export", "--out", webp.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unsupported output extension"));
    assert!(!webp.exists());
}

#[test]
fn cli_resolves_relative_motif_next_to_the_design_file() {
    let dir = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    let config = dir.path().join("design.json");
    write_motif(&dir.path().join("motif.png"));
    std::fs::write(
        &config,
        r#"{"plates":[{"id":"1","width":30,"height":40}],"unit":"cm","motifUrl":"motif.png"}"#,
    )
    .unwrap();

    let out_path = elsewhere.path().join("design.png");
    let out = Command::new(env!("CARGO_BIN_EXE_plategen"))
        .current_dir(elsewhere.path())
        .arg("--config")
        .arg(&config)
        .args(["export", "--border", "0", "--out", "design.png"])
        .env_remove("RUST_LOG")
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "{}",
        String::from_utf8_lossy(&out.stderr)
    );

    let img = image::open(&out_path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (30, 40));
    assert_eq!(img.get_pixel(15, 20).0, [220, 30, 30, 255]);
}
