//! Metadata extraction backends.
//!
//! Every backend returns the ffprobe JSON document shape so the normalizer
//! has a single input format to tolerate.

use crate::metadata::RawMetadata;
use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use log::{debug, trace};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DEFAULT_FFPROBE: &str = "ffprobe";

/// Something that can read technical metadata from a media file.
pub trait MetadataProbe {
    /// Short backend name for log lines.
    fn name(&self) -> &'static str;

    fn probe(&self, path: &Path) -> Result<RawMetadata>;
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeBackend {
    /// Run the ffprobe CLI once per file.
    #[default]
    Ffprobe,
    /// Open containers in-process through the FFmpeg libraries.
    #[value(alias = "ffmpeg")]
    #[serde(alias = "ffmpeg")]
    Native,
}

impl std::fmt::Display for ProbeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ProbeBackend::Ffprobe => "ffprobe",
            ProbeBackend::Native => "native",
        };
        write!(f, "{}", label)
    }
}

/// Builds the configured backend.
pub fn build_probe(backend: ProbeBackend, ffprobe_path: &Path) -> Result<Box<dyn MetadataProbe>> {
    match backend {
        ProbeBackend::Ffprobe => Ok(Box::new(FfprobeProbe::new(ffprobe_path))),
        #[cfg(feature = "ffmpeg")]
        ProbeBackend::Native => Ok(Box::new(native::NativeProbe)),
        #[cfg(not(feature = "ffmpeg"))]
        ProbeBackend::Native => bail!(
            "The native probe backend is not available in this build; rebuild with `--features ffmpeg` or use --probe ffprobe"
        ),
    }
}

#[derive(Clone, Debug)]
pub struct FfprobeProbe {
    program: PathBuf,
}

impl FfprobeProbe {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new(DEFAULT_FFPROBE)
    }
}

impl MetadataProbe for FfprobeProbe {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    fn probe(&self, path: &Path) -> Result<RawMetadata> {
        trace!("Running {} on '{}'", self.program.display(), path.display());
        let output = Command::new(&self.program)
            .arg("-v")
            .arg("error")
            .arg("-print_format")
            .arg("json")
            .arg("-show_format")
            .arg("-show_streams")
            .arg(path)
            .output()
            .with_context(|| format!("Failed to run '{}'", self.program.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr.trim();
            return Err(anyhow!(
                "{} exited with {}{}",
                self.program.display(),
                output.status,
                if reason.is_empty() {
                    String::new()
                } else {
                    format!(": {}", reason)
                }
            ));
        }

        parse_ffprobe_json(&output.stdout)
    }
}

/// Parses ffprobe's `-print_format json` output.
pub fn parse_ffprobe_json(bytes: &[u8]) -> Result<RawMetadata> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).context("ffprobe produced invalid JSON")?;
    if !value.is_object() {
        bail!("ffprobe output is not a JSON object");
    }
    let raw = RawMetadata(value);
    debug!(
        "ffprobe reported {} stream(s){}",
        raw.streams().len(),
        if raw.format().is_some() { " and container info" } else { "" }
    );
    Ok(raw)
}

#[cfg(feature = "ffmpeg")]
mod native {
    use super::MetadataProbe;
    use crate::metadata::RawMetadata;
    use anyhow::{Context, Result};
    use rsmpeg::avformat::AVFormatContextInput;
    use rsmpeg::ffi;
    use serde_json::{json, Map, Value};
    use std::ffi::{CStr, CString};
    use std::path::Path;

    /// In-process prober built on the FFmpeg demuxers.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct NativeProbe;

    impl MetadataProbe for NativeProbe {
        fn name(&self) -> &'static str {
            "native"
        }

        fn probe(&self, path: &Path) -> Result<RawMetadata> {
            let input = CString::new(path.to_string_lossy().to_string())
                .context("Path contains an interior NUL byte")?;
            let ictx = AVFormatContextInput::open(input.as_c_str())
                .with_context(|| format!("Failed to open '{}'", path.display()))?;

            let mut streams = Vec::new();
            for st in ictx.streams() {
                let cp = st.codecpar();
                let kind = match cp.codec_type {
                    ffi::AVMEDIA_TYPE_VIDEO => "video",
                    ffi::AVMEDIA_TYPE_AUDIO => "audio",
                    ffi::AVMEDIA_TYPE_SUBTITLE => "subtitle",
                    ffi::AVMEDIA_TYPE_ATTACHMENT => "attachment",
                    ffi::AVMEDIA_TYPE_DATA => "data",
                    _ => "unknown",
                };
                let codec_name = unsafe { CStr::from_ptr(ffi::avcodec_get_name(cp.codec_id)) }
                    .to_string_lossy()
                    .into_owned();
                let (disposition, tags) = unsafe {
                    let s_ptr = st.as_ptr();
                    (
                        (*s_ptr).disposition as i32,
                        dictionary_to_json((*s_ptr).metadata),
                    )
                };
                let attached_pic = (disposition & ffi::AV_DISPOSITION_ATTACHED_PIC as i32) != 0;

                let mut entry = json!({
                    "index": st.index,
                    "codec_type": kind,
                    "codec_name": codec_name,
                    "disposition": { "attached_pic": u8::from(attached_pic) },
                    "tags": tags,
                });
                if cp.bit_rate > 0 {
                    entry["bit_rate"] = json!(cp.bit_rate.to_string());
                }
                match cp.codec_type {
                    ffi::AVMEDIA_TYPE_VIDEO => {
                        entry["width"] = json!(cp.width);
                        entry["height"] = json!(cp.height);
                    }
                    ffi::AVMEDIA_TYPE_AUDIO => {
                        entry["channels"] = json!(cp.ch_layout.nb_channels);
                    }
                    _ => {}
                }
                streams.push(entry);
            }

            let format_tags = unsafe { dictionary_to_json((*ictx.as_ptr()).metadata) };
            Ok(RawMetadata(json!({
                "streams": streams,
                "format": {
                    "filename": path.to_string_lossy(),
                    "duration": ictx.duration,
                    "tags": format_tags,
                },
            })))
        }
    }

    /// Copies an `AVDictionary` into a JSON object; null dictionaries give `{}`.
    unsafe fn dictionary_to_json(dict: *const ffi::AVDictionary) -> Value {
        let mut map = Map::new();
        if dict.is_null() {
            return Value::Object(map);
        }
        let empty = c"";
        let mut entry: *const ffi::AVDictionaryEntry = std::ptr::null();
        loop {
            entry = ffi::av_dict_get(dict, empty.as_ptr(), entry, ffi::AV_DICT_IGNORE_SUFFIX as i32);
            if entry.is_null() {
                break;
            }
            let key = CStr::from_ptr((*entry).key).to_string_lossy().into_owned();
            let value = CStr::from_ptr((*entry).value).to_string_lossy().into_owned();
            map.insert(key, Value::String(value));
        }
        Value::Object(map)
    }
}
