use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn glyphlight() -> Command {
    Command::cargo_bin("glyphlight").expect("binary exists")
}

fn scene_file(xml: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp scene");
    tmp.write_all(xml.as_bytes()).expect("write scene");
    tmp
}

#[test]
fn summary_reports_default_scene() {
    glyphlight()
        .arg("--summary-only")
        .assert()
        .success()
        .stdout(contains("Loaded metallic scene with 2 glyph(s) using font builtin"))
        .stdout(contains("Frames rendered: 1"))
        .stdout(contains("Light position: (0.00, 1.00, 0.00)"))
        .stdout(contains(" - 'n' at"))
        .stdout(contains(" - '1' at (1.00, 0.00, 0.00)"))
        .stdout(contains("advance 1.20, front color"))
        .stdout(contains("Light marker: size 0.50 at (0.00, 1.00, 0.00)"));
}

#[test]
fn scripted_keys_move_light_and_camera() {
    glyphlight()
        .args(["--summary-only", "--keys", "wwwsa", "--frames", "3"])
        .assert()
        .success()
        .stdout(contains("Frames rendered: 3"))
        .stdout(contains("Light position: (0.00, 1.20, 0.00)"))
        .stdout(contains("Camera position: (-0.10, 0.00, 5.00)"));
}

#[test]
fn unbound_keys_are_ignored() {
    glyphlight()
        .args(["--summary-only", "--keys", "qzx"])
        .assert()
        .success()
        .stdout(contains("Light position: (0.00, 1.00, 0.00)"))
        .stdout(contains("Camera position: (0.00, 0.00, 5.00)"));
}

#[test]
fn flat_preset_has_no_marker() {
    glyphlight()
        .args(["--summary-only", "--preset", "flat"])
        .assert()
        .success()
        .stdout(contains("Loaded flat scene"))
        .stdout(contains(" - 'n' at (-3.00, 0.00, 0.00)"))
        .stdout(contains("advance 0.70"))
        .stdout(contains("Light marker: none"));
}

#[test]
fn scene_file_overrides_preset_values() {
    let scene = scene_file(
        r##"<scene preset="diffuse">
  <light><position>0 2 0</position></light>
  <controls><step>0.5</step><light-up>Up</light-up></controls>
  <glyph><char>0</char><color>#ff8000</color><position>0 0 0</position></glyph>
</scene>
"##,
    );
    glyphlight()
        .arg("--scene")
        .arg(scene.path())
        .args(["--summary-only", "--keys", "Up,w"])
        .assert()
        .success()
        .stdout(contains("Loaded diffuse scene with 1 glyph(s)"))
        .stdout(contains("Light position: (0.00, 2.50, 0.00)"))
        .stdout(contains(" - '0' at (0.00, 0.00, 0.00)"));
}

#[test]
fn missing_font_is_reported() {
    glyphlight()
        .args(["--summary-only", "--font", "/nonexistent/font.ttf"])
        .assert()
        .failure()
        .stderr(contains("failed to load font /nonexistent/font.ttf"));
}

#[test]
fn invalid_scene_is_reported() {
    let scene = scene_file("<scene><text><size>-1</size></text></scene>");
    glyphlight()
        .arg("--scene")
        .arg(scene.path())
        .arg("--summary-only")
        .assert()
        .failure()
        .stderr(contains("text size must be positive"));
}

#[test]
fn unknown_arguments_are_rejected() {
    glyphlight()
        .arg("--bogus")
        .assert()
        .failure()
        .stderr(contains("Unknown argument: --bogus"));
}
