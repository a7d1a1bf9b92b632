//! Deterministic technical-quality scoring.
//!
//! Each metric is a table of `(inclusive lower bound, score)` pairs ordered
//! highest bound first; the first bound the value reaches decides the score.

use crate::metadata::{NormalizedMetadata, VideoCodecFamily};

pub const RESOLUTION_THRESHOLDS: &[(u64, u8)] = &[(2160, 4), (1080, 3), (720, 2), (1, 1)];
pub const VIDEO_BITRATE_THRESHOLDS: &[(u64, u8)] = &[(8_000_000, 3), (4_000_000, 2), (1, 1)];
pub const AUDIO_CHANNEL_THRESHOLDS: &[(u64, u8)] = &[(6, 2), (2, 1)];
/// Strictly above 192 kbps.
pub const AUDIO_BITRATE_THRESHOLDS: &[(u64, u8)] = &[(192_001, 1)];

/// Lowercase spellings that mark a Blu-ray source.
pub const BLURAY_MARKERS: &[&str] = &["bluray", "blu-ray", "blu ray", "bdrip", "brrip", "bdremux"];
pub const SOURCE_BLURAY_SCORE: u8 = 2;

pub const MAX_TOTAL_SCORE: u8 = 14;

/// Per-metric scores for one file.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct ScoreBreakdown {
    pub resolution_score: u8,
    pub video_bitrate_score: u8,
    pub video_codec_score: u8,
    pub audio_channels_score: u8,
    pub audio_bitrate_score: u8,
    pub source_score: u8,
}

impl ScoreBreakdown {
    pub fn total_score(&self) -> u8 {
        self.components().iter().sum()
    }

    /// Component scores in report column order.
    pub fn components(&self) -> [u8; 6] {
        [
            self.resolution_score,
            self.video_bitrate_score,
            self.video_codec_score,
            self.audio_channels_score,
            self.audio_bitrate_score,
            self.source_score,
        ]
    }
}

/// Evaluates a threshold table; values below every bound score `0`.
pub fn threshold_score(value: u64, table: &[(u64, u8)]) -> u8 {
    table
        .iter()
        .find(|(lower_bound, _)| value >= *lower_bound)
        .map(|(_, score)| *score)
        .unwrap_or(0)
}

pub fn codec_score(codec: VideoCodecFamily) -> u8 {
    match codec {
        VideoCodecFamily::Hevc => 2,
        VideoCodecFamily::Avc => 1,
        VideoCodecFamily::Other | VideoCodecFamily::Unknown => 0,
    }
}

pub fn source_score(source_tag: &str) -> u8 {
    let lower = source_tag.to_lowercase();
    if BLURAY_MARKERS.iter().any(|marker| lower.contains(marker)) {
        SOURCE_BLURAY_SCORE
    } else {
        0
    }
}

pub fn score(meta: &NormalizedMetadata) -> ScoreBreakdown {
    ScoreBreakdown {
        resolution_score: threshold_score(meta.resolution_height.into(), RESOLUTION_THRESHOLDS),
        video_bitrate_score: threshold_score(meta.video_bitrate_bps, VIDEO_BITRATE_THRESHOLDS),
        video_codec_score: codec_score(meta.video_codec),
        audio_channels_score: threshold_score(meta.audio_channels.into(), AUDIO_CHANNEL_THRESHOLDS),
        audio_bitrate_score: threshold_score(meta.audio_bitrate_bps, AUDIO_BITRATE_THRESHOLDS),
        source_score: source_score(&meta.source_tag),
    }
}
