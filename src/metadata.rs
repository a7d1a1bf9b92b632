//! Typed per-file metadata consumed by the scorer.

use chrono::NaiveDate;
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};

/// Codec family of the primary video stream.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum VideoCodecFamily {
    Hevc,
    Avc,
    Other,
    Unknown,
}

impl VideoCodecFamily {
    /// Classifies free-form codec text (`hevc`, `H.264 / AVC`, `x265`, ...).
    ///
    /// Matching is case-insensitive and substring based. HEVC is tested
    /// first so "H.265" never falls through to the AVC bucket. The bare
    /// "265"/"264" markers catch release-style labels like "HEVC265" or
    /// "AVC-264"; any other text containing those digits matches too.
    pub fn classify(raw: &str) -> Self {
        let lower = raw.trim().to_ascii_lowercase();
        if lower.is_empty() {
            return VideoCodecFamily::Unknown;
        }
        const HEVC_MARKERS: [&str; 5] = ["hevc", "h.265", "h265", "x265", "265"];
        const AVC_MARKERS: [&str; 5] = ["avc", "h.264", "h264", "x264", "264"];
        if HEVC_MARKERS.iter().any(|m| lower.contains(m)) {
            VideoCodecFamily::Hevc
        } else if AVC_MARKERS.iter().any(|m| lower.contains(m)) {
            VideoCodecFamily::Avc
        } else {
            VideoCodecFamily::Other
        }
    }
}

/// Fully populated technical record for one file.
///
/// Unknown values are the sentinels `0`, [`VideoCodecFamily::Unknown`] and
/// the empty string; nothing is ever optional.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NormalizedMetadata {
    pub file_name: String,
    pub last_modified: NaiveDate,
    pub resolution_width: u32,
    pub resolution_height: u32,
    pub video_bitrate_bps: u64,
    pub audio_bitrate_bps: u64,
    pub video_codec: VideoCodecFamily,
    pub audio_channels: u32,
    pub source_tag: String,
}

impl NormalizedMetadata {
    /// A record where every technical field sits at its sentinel.
    pub fn unknown(file_name: impl Into<String>, last_modified: NaiveDate) -> Self {
        Self {
            file_name: file_name.into(),
            last_modified,
            resolution_width: 0,
            resolution_height: 0,
            video_bitrate_bps: 0,
            audio_bitrate_bps: 0,
            video_codec: VideoCodecFamily::Unknown,
            audio_channels: 0,
            source_tag: String::new(),
        }
    }

    /// `WxH`, or `0x0` when the dimensions are unknown.
    pub fn resolution_label(&self) -> String {
        format!("{}x{}", self.resolution_width, self.resolution_height)
    }
}

/// Raw probe output in ffprobe's JSON shape
/// (`{"streams": [...], "format": {...}}`).
///
/// Nothing about the shape is trusted; the normalizer reads it defensively.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawMetadata(pub Value);

impl RawMetadata {
    pub fn streams(&self) -> &[Value] {
        self.0
            .get("streams")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn format(&self) -> Option<&Value> {
        self.0.get("format").filter(|v| v.is_object())
    }
}

impl From<Value> for RawMetadata {
    fn from(value: Value) -> Self {
        RawMetadata(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn classify_codec_names() {
        for raw in ["HEVC", "hevc", "H.265", "x265", "h265"] {
            assert_eq!(VideoCodecFamily::classify(raw), VideoCodecFamily::Hevc, "{raw}");
        }
        for raw in ["H264", "AVC", "h264", "avc1", "H.264 / AVC / MPEG-4 AVC"] {
            assert_eq!(VideoCodecFamily::classify(raw), VideoCodecFamily::Avc, "{raw}");
        }
        assert_eq!(VideoCodecFamily::classify("vp9"), VideoCodecFamily::Other);
        assert_eq!(VideoCodecFamily::classify(""), VideoCodecFamily::Unknown);
        assert_eq!(VideoCodecFamily::classify("   "), VideoCodecFamily::Unknown);
    }

    #[test]
    fn codec_family_displays_lowercase() {
        assert_eq!(VideoCodecFamily::Hevc.to_string(), "hevc");
        assert_eq!(VideoCodecFamily::Unknown.as_ref(), "unknown");
        assert_eq!(
            VideoCodecFamily::from_str("AVC").unwrap(),
            VideoCodecFamily::Avc
        );
    }

    #[test]
    fn raw_metadata_tolerates_missing_sections() {
        let raw = RawMetadata(json!({"streams": "nope"}));
        assert!(raw.streams().is_empty());
        assert!(raw.format().is_none());
        assert!(RawMetadata::default().streams().is_empty());
    }

    #[test]
    fn unknown_record_has_zero_resolution_label() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let meta = NormalizedMetadata::unknown("a.mkv", date);
        assert_eq!(meta.resolution_label(), "0x0");
        assert_eq!(meta.video_codec, VideoCodecFamily::Unknown);
    }
}
