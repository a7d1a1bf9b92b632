#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub const REPORT_HEADER: &str = "File Name,Last Modified,Resolution,Video Bitrate (bps),Audio Bitrate (bps),Video Codec,Audio Channels,Source Tag,Resolution Score,Video Bitrate Score,Video Codec Score,Audio Channels Score,Audio Bitrate Score,Source Score,Total Score";

/// Probe document for a UHD HEVC Blu-ray remux (scores 14).
pub const UHD_BLURAY_JSON: &str = r#"{
  "streams": [
    {"index": 0, "codec_type": "video", "codec_name": "hevc", "width": 3840, "height": 2160, "bit_rate": "10000000"},
    {"index": 1, "codec_type": "audio", "codec_name": "eac3", "channels": 6, "channel_layout": "5.1(side)", "bit_rate": "256000"}
  ],
  "format": {"format_name": "matroska,webm", "tags": {"title": "Feature BluRay Remux"}}
}"#;

/// Probe document for a 1080p AVC web copy (scores 6).
pub const HD_WEB_JSON: &str = r#"{
  "streams": [
    {"index": 0, "codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080, "bit_rate": "3000000"},
    {"index": 1, "codec_type": "audio", "codec_name": "aac", "channels": 2, "bit_rate": "128000"}
  ],
  "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2", "tags": {"comment": "WEB-DL"}}
}"#;

pub fn ensure_ffmpeg_present() {
    let out = Command::new("ffmpeg").arg("-version").output();
    match out {
        Ok(o) if o.status.success() => {}
        _ => panic!("ffmpeg CLI not found. Install ffmpeg and ensure it is on PATH."),
    }
}

pub fn touch(path: &Path) {
    File::create(path).expect("create placeholder video");
}

/// Command for the built binary with config discovery pinned inside `tmp`.
pub fn isolated_cli(tmp: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("video_ranking"));
    cmd.env_remove("VIDEO_RANKING_CONFIG");
    cmd.env_remove("XDG_CONFIG_HOME");
    cmd.env_remove("RUST_LOG");
    cmd.env("HOME", tmp.path());
    cmd.current_dir(tmp.path());
    cmd
}

/// Writes a shell script that mimics `ffprobe -print_format json`.
///
/// The last argument is the probed path; its file name selects the canned
/// document. `broken.*` files make the script fail like ffprobe does on
/// garbage input, unknown names print `{}`.
#[cfg(unix)]
pub fn write_fake_ffprobe(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        r#"#!/bin/sh
for last; do :; done
case "$(basename "$last")" in
  uhd_bluray.*)
    cat <<'JSON'
{uhd}
JSON
    ;;
  hd_web.*)
    cat <<'JSON'
{hd}
JSON
    ;;
  broken.*)
    echo "$last: Invalid data found when processing input" >&2
    exit 1
    ;;
  *)
    echo '{{}}'
    ;;
esac
"#,
        uhd = UHD_BLURAY_JSON,
        hd = HD_WEB_JSON
    );

    let path = dir.join("fake-ffprobe.sh");
    fs::write(&path, script).expect("write fake ffprobe");
    let mut perms = fs::metadata(&path).expect("stat fake ffprobe").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod fake ffprobe");
    path
}

pub fn read_report(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("read report")
        .lines()
        .map(str::to_string)
        .collect()
}

/// Encodes a short clip with the ffmpeg CLI.
pub fn gen_clip(dir: &Path, name: &str, size: &str, video_codec: &str, channels: u32) -> PathBuf {
    let output = dir.join(name);
    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=size={size}:rate=24:duration=1"),
            "-f",
            "lavfi",
            "-i",
            "sine=frequency=1000:sample_rate=48000:duration=1",
            "-c:v",
            video_codec,
            "-preset",
            "ultrafast",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-ac",
            &channels.to_string(),
            "-shortest",
            &output.to_string_lossy(),
        ])
        .status()
        .expect("run ffmpeg clip generator");
    assert!(status.success(), "ffmpeg clip generation failed for {}", name);
    output
}
