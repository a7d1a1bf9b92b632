//! Turns loosely-typed probe output into a [`NormalizedMetadata`] record.
//!
//! Every accessor here is total: anything absent, negative, non-numeric or of
//! the wrong JSON type collapses to the field's sentinel instead of failing.

use crate::metadata::{NormalizedMetadata, RawMetadata, VideoCodecFamily};
use chrono::NaiveDate;
use log::trace;
use serde_json::{Map, Value};
use std::cmp::Reverse;

/// Container/stream tag keys that commonly carry a release or source label.
pub const SOURCE_TAG_KEYS: &[&str] = &[
    "title",
    "comment",
    "description",
    "synopsis",
    "source",
    "original_source_form",
    "original_media_type",
];

const SOURCE_TAG_SEPARATOR: &str = " | ";

/// Matroska muxers store per-stream statistics here when `bit_rate` is absent.
const BITRATE_STAT_TAGS: &[&str] = &["BPS", "BPS-eng"];

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct NormalizeOptions {
    /// Offer the file name itself as a last source-tag candidate.
    pub source_from_file_name: bool,
}

pub fn normalize(raw: &RawMetadata, file_name: &str, last_modified: NaiveDate) -> NormalizedMetadata {
    normalize_with(raw, file_name, last_modified, &NormalizeOptions::default())
}

pub fn normalize_with(
    raw: &RawMetadata,
    file_name: &str,
    last_modified: NaiveDate,
    options: &NormalizeOptions,
) -> NormalizedMetadata {
    let mut meta = NormalizedMetadata::unknown(file_name, last_modified);
    let streams = raw.streams();

    if let Some(video) = select_primary_video_stream(streams) {
        meta.resolution_width = to_u32(non_negative_int(video.get("width")));
        meta.resolution_height = to_u32(non_negative_int(video.get("height")));
        meta.video_bitrate_bps = stream_bitrate(video);
        meta.video_codec = VideoCodecFamily::classify(codec_text(video));
    } else {
        trace!("No usable video stream in probe output for '{}'", file_name);
    }

    if let Some(audio) = select_primary_audio_stream(streams) {
        meta.audio_channels = stream_channels(audio);
        meta.audio_bitrate_bps = stream_bitrate(audio);
    } else {
        trace!("No audio stream in probe output for '{}'", file_name);
    }

    let mut candidates = collect_source_candidates(raw);
    if options.source_from_file_name && !file_name.is_empty() {
        push_unique(&mut candidates, file_name);
    }
    meta.source_tag = candidates.join(SOURCE_TAG_SEPARATOR);

    meta
}

fn codec_type(stream: &Value) -> Option<&str> {
    stream.get("codec_type").and_then(Value::as_str)
}

fn is_attached_picture(stream: &Value) -> bool {
    stream
        .get("disposition")
        .map(|d| non_negative_int(d.get("attached_pic")) == 1)
        .unwrap_or(false)
}

/// Largest picture wins, then highest bitrate; earlier streams win ties.
/// Cover art (attached pictures) never counts as the video stream.
fn select_primary_video_stream(streams: &[Value]) -> Option<&Value> {
    streams
        .iter()
        .enumerate()
        .filter(|(_, st)| codec_type(st) == Some("video") && !is_attached_picture(st))
        .max_by_key(|(idx, st)| {
            let w = non_negative_int(st.get("width"));
            let h = non_negative_int(st.get("height"));
            (w.saturating_mul(h), stream_bitrate(st), Reverse(*idx))
        })
        .map(|(_, st)| st)
}

fn select_primary_audio_stream(streams: &[Value]) -> Option<&Value> {
    streams
        .iter()
        .enumerate()
        .filter(|(_, st)| codec_type(st) == Some("audio"))
        .max_by_key(|(idx, st)| (stream_channels(st), stream_bitrate(st), Reverse(*idx)))
        .map(|(_, st)| st)
}

fn codec_text(stream: &Value) -> &str {
    ["codec_name", "codec_long_name", "codec_tag_string"]
        .iter()
        .filter_map(|key| stream.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .unwrap_or("")
}

fn stream_bitrate(stream: &Value) -> u64 {
    let direct = non_negative_int(stream.get("bit_rate"));
    if direct > 0 {
        return direct;
    }
    let Some(tags) = stream.get("tags").and_then(Value::as_object) else {
        return 0;
    };
    BITRATE_STAT_TAGS
        .iter()
        .filter_map(|key| tag_value(tags, key))
        .map(|value| non_negative_int(Some(value)))
        .find(|bps| *bps > 0)
        .unwrap_or(0)
}

fn stream_channels(stream: &Value) -> u32 {
    let direct = to_u32(non_negative_int(stream.get("channels")));
    if direct > 0 {
        return direct;
    }
    stream
        .get("channel_layout")
        .and_then(Value::as_str)
        .map(channels_from_layout)
        .unwrap_or(0)
}

/// Converts a channel-layout label to a channel count.
///
/// `5.1` → 6, `7.1(wide)` → 8, `5.1.2` → 8, `stereo` → 2, `mono` → 1,
/// `6 channels` → 6. Anything else is `0`.
pub fn channels_from_layout(label: &str) -> u32 {
    let lower = label.trim().to_ascii_lowercase();
    let base = lower.split('(').next().unwrap_or("").trim();
    match base {
        "" => 0,
        "mono" => 1,
        "stereo" | "downmix" => 2,
        "quad" => 4,
        "hexagonal" => 6,
        "octagonal" => 8,
        _ => {
            if let Some(count) = base.strip_suffix("channels") {
                return count.trim().parse().unwrap_or(0);
            }
            let parts: Option<Vec<u32>> = base.split('.').map(|p| p.trim().parse().ok()).collect();
            match parts {
                Some(parts) if parts.len() >= 2 => parts
                    .iter()
                    .try_fold(0u32, |acc, p| acc.checked_add(*p))
                    .unwrap_or(0),
                _ => 0,
            }
        }
    }
}

fn collect_source_candidates(raw: &RawMetadata) -> Vec<String> {
    let mut out = Vec::new();
    let tag_sources = raw
        .format()
        .into_iter()
        .chain(raw.streams().iter())
        .filter_map(|section| section.get("tags").and_then(Value::as_object));
    for tags in tag_sources {
        for key in SOURCE_TAG_KEYS {
            if let Some(text) = tag_value(tags, key).and_then(Value::as_str) {
                push_unique(&mut out, text);
            }
        }
    }
    out
}

fn push_unique(out: &mut Vec<String>, candidate: &str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() && !out.iter().any(|existing| existing == trimmed) {
        out.push(trimmed.to_string());
    }
}

fn tag_value<'a>(tags: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    tags.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// Reads a JSON number or numeric string as a non-negative integer.
fn non_negative_int(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(float_to_u64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let t = s.trim();
            t.parse::<u64>()
                .ok()
                .or_else(|| t.parse::<f64>().ok().and_then(float_to_u64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn float_to_u64(f: f64) -> Option<u64> {
    if f.is_finite() && f >= 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

fn to_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(0)
}
