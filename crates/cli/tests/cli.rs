//! Integration tests for the alac2flac binary.
//!
//! These tests execute the compiled binary against a temporary music
//! directory. `ffprobe` and `ffmpeg` are replaced by small shell scripts:
//! - the fake ffprobe reports ALAC for files containing `ALAC`, fails for
//!   files containing `BROKEN`, and reports AAC otherwise
//! - the fake ffmpeg writes a stub FLAC listing its `RATING=` argument,
//!   or leaves a partial file and fails for inputs containing `FAILME`.
//!   For inputs containing `SLOW` it touches `$FAKE_FFMPEG_STARTED` and
//!   sleeps before writing, leaving time to deliver a signal
//!
//! Ratings are read by the binary itself from real MP4 boxes.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const FAKE_FFPROBE: &str = r#"#!/bin/sh
if [ "$1" = "-version" ]; then echo "ffprobe version fake"; exit 0; fi
for last; do :; done
if grep -a -q BROKEN "$last"; then exit 1; fi
if grep -a -q ALAC "$last"; then
  echo '{"streams":[{"index":0,"codec_name":"alac","codec_type":"audio"}],"format":{"format_name":"mov,mp4,m4a"}}'
else
  echo '{"streams":[{"index":0,"codec_name":"aac","codec_type":"audio"}],"format":{"format_name":"mov,mp4,m4a"}}'
fi
"#;

const FAKE_FFMPEG: &str = r#"#!/bin/sh
if [ "$1" = "-version" ]; then echo "ffmpeg version fake"; exit 0; fi
for last; do :; done
input=""
prev=""
for a; do
  if [ "$prev" = "-i" ]; then input="$a"; fi
  prev="$a"
done
if grep -a -q SLOW "$input"; then
  : > "$FAKE_FFMPEG_STARTED"
  sleep 2
fi
if grep -a -q FAILME "$input"; then
  printf 'fLaC partial' > "$last"
  echo "Error while encoding" >&2
  exit 1
fi
printf 'fLaC\n' > "$last"
for a; do
  case "$a" in RATING=*) echo "$a" >> "$last";; esac
done
echo "progress=continue"
echo "progress=end"
exit 0
"#;

/// A music directory plus fake media tools.
struct Fixture {
    tools: TempDir,
    music: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let tools = TempDir::new().expect("Failed to create tools dir");
        write_script(&tools.path().join("ffprobe"), FAKE_FFPROBE);
        write_script(&tools.path().join("ffmpeg"), FAKE_FFMPEG);
        Self {
            tools,
            music: TempDir::new().expect("Failed to create music dir"),
        }
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.music.path().join(relative)
    }

    /// Writes a minimal M4A whose contents steer the fake tools.
    fn add_m4a(&self, relative: &str, marker: &str, rating: Option<u8>) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, m4a_bytes(marker, rating)).expect("Failed to write m4a");
        path
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_alac2flac"));
        cmd.arg("--ffprobe")
            .arg(self.tools.path().join("ffprobe"))
            .arg("--ffmpeg")
            .arg(self.tools.path().join("ffmpeg"))
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, extra: &[&str]) -> Output {
        self.command()
            .arg("-f")
            .arg(self.music.path())
            .args(extra)
            .output()
            .expect("Failed to execute alac2flac")
    }
}

fn write_script(path: &Path, contents: &str) {
    fs::write(path, contents).expect("Failed to write script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn atom(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out
}

fn m4a_bytes(marker: &str, rating: Option<u8>) -> Vec<u8> {
    let mut file = atom(b"ftyp", b"M4A \0\0\0\0M4A mp42isom");
    file.extend(atom(b"free", marker.as_bytes()));

    if let Some(rating) = rating {
        let mut data = 21u32.to_be_bytes().to_vec();
        data.extend_from_slice(&[0, 0, 0, 0, rating]);
        let rate = atom(b"rate", &atom(b"data", &data));
        let ilst = atom(b"ilst", &rate);
        let mut meta_body = vec![0, 0, 0, 0];
        meta_body.extend(atom(b"hdlr", &[0u8; 25]));
        meta_body.extend(ilst);
        let udta = atom(b"udta", &atom(b"meta", &meta_body));
        file.extend(atom(b"moov", &udta));
    }

    file
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_converts_mixed_library() {
    let fx = Fixture::new();
    let a = fx.add_m4a("a.m4a", "ALAC", Some(80));
    let b = fx.add_m4a("b.m4a", "AAC", None);
    let c = fx.add_m4a("Album/c.m4a", "ALAC", None);

    let output = fx.run(&[]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));

    assert!(!a.exists());
    let a_flac = fs::read_to_string(fx.path("a.flac")).unwrap();
    assert!(a_flac.contains("RATING=80"), "a.flac: {}", a_flac);

    assert!(b.exists());
    assert!(!fx.path("b.flac").exists());

    assert!(!c.exists());
    let c_flac = fs::read_to_string(fx.path("Album/c.flac")).unwrap();
    assert!(!c_flac.contains("RATING"));

    assert!(stderr(&output).contains("converted"));
}

#[test]
fn test_failed_conversion_keeps_source() {
    let fx = Fixture::new();
    let src = fx.add_m4a("bad.m4a", "ALAC FAILME", Some(40));

    let output = fx.run(&[]);

    assert!(output.status.success());
    assert!(src.exists());
    assert!(!fx.path("bad.flac").exists());
    assert!(stderr(&output).contains("failed"));
}

#[test]
fn test_probe_failure_is_silent_skip() {
    let fx = Fixture::new();
    let src = fx.add_m4a("weird.m4a", "BROKEN", None);

    let output = fx.run(&[]);

    assert!(output.status.success());
    assert!(src.exists());
    assert!(!fx.path("weird.flac").exists());
    assert!(!stderr(&output).contains("weird.m4a"));
}

#[test]
fn test_dry_run_lists_without_touching() {
    let fx = Fixture::new();
    let a = fx.add_m4a("a.m4a", "ALAC", Some(80));
    let b = fx.add_m4a("b.m4a", "AAC", None);

    let output = fx.run(&["--dry-run"]);

    assert!(output.status.success());
    let listed = stdout(&output);
    assert!(listed.contains(&format!("f: {}", a.display())));
    assert!(!listed.contains("b.m4a"));
    assert!(a.exists());
    assert!(b.exists());
    assert!(!fx.path("a.flac").exists());
}

#[test]
fn test_missing_scan_path_is_usage_error() {
    let fx = Fixture::new();
    let output = fx.command().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--find"));
}

#[test]
fn test_nonexistent_scan_path() {
    let fx = Fixture::new();
    let output = fx
        .command()
        .arg("-f")
        .arg(fx.path("does-not-exist"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(66));
}

#[test]
fn test_missing_config_file() {
    let fx = Fixture::new();
    let output = fx.run(&["--config", "/nonexistent/alac2flac.toml"]);
    assert_eq!(output.status.code(), Some(78));
}

#[test]
fn test_version_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_alac2flac"))
        .arg("-v")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_alac2flac"))
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());
    let help = stdout(&output);
    assert!(help.contains("--dry-run"));
    assert!(help.contains("--find"));
}

#[test]
fn test_logs_have_no_colour_codes_when_piped() {
    let fx = Fixture::new();
    fx.add_m4a("a.m4a", "ALAC", Some(80));

    let output = fx.run(&[]);

    assert!(output.status.success());
    let logs = stderr(&output);
    assert!(logs.contains("converted"));
    assert!(!logs.contains('\x1b'), "stderr: {:?}", logs);
}

#[test]
fn test_ctrl_c_finishes_current_file_then_stops() {
    let fx = Fixture::new();
    let a = fx.add_m4a("a.m4a", "ALAC SLOW", Some(80));
    let b = fx.add_m4a("b.m4a", "ALAC", None);
    let c = fx.add_m4a("c.m4a", "ALAC", None);
    let started = fx.tools.path().join("started");

    // Own process group, so signalling the group below reaches everything
    // a terminal Ctrl+C would.
    let child = fx
        .command()
        .arg("-f")
        .arg(fx.music.path())
        .env("FAKE_FFMPEG_STARTED", &started)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .spawn()
        .expect("Failed to start alac2flac");

    let deadline = Instant::now() + Duration::from_secs(20);
    while !started.exists() {
        assert!(Instant::now() < deadline, "ffmpeg never started on a.m4a");
        thread::sleep(Duration::from_millis(20));
    }

    let status = Command::new("kill")
        .args(["-INT", "--", &format!("-{}", child.id())])
        .status()
        .expect("Failed to run kill");
    assert!(status.success());

    let output = child.wait_with_output().expect("Failed to wait for alac2flac");
    let logs = stderr(&output);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", logs);
    assert!(logs.contains("CTRL+C caught, will exit after cleanup..."));
    assert!(logs.contains("Exiting..."));

    // a finished despite the signal
    assert!(!a.exists());
    let a_flac = fs::read_to_string(fx.path("a.flac")).unwrap();
    assert!(a_flac.contains("RATING=80"));

    // b and c were never started
    assert!(b.exists());
    assert!(c.exists());
    assert!(!fx.path("b.flac").exists());
    assert!(!fx.path("c.flac").exists());
}
