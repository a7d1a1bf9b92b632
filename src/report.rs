//! Ranking and CSV serialization of scored files.

use crate::metadata::NormalizedMetadata;
use crate::scoring::{score, ScoreBreakdown};
use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const LAST_MODIFIED_FORMAT: &str = "%Y-%m-%d";

pub const REPORT_HEADERS: [&str; 15] = [
    "File Name",
    "Last Modified",
    "Resolution",
    "Video Bitrate (bps)",
    "Audio Bitrate (bps)",
    "Video Codec",
    "Audio Channels",
    "Source Tag",
    "Resolution Score",
    "Video Bitrate Score",
    "Video Codec Score",
    "Audio Channels Score",
    "Audio Bitrate Score",
    "Source Score",
    "Total Score",
];

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReportRow {
    pub metadata: NormalizedMetadata,
    pub scores: ScoreBreakdown,
}

impl ReportRow {
    pub fn new(metadata: NormalizedMetadata, scores: ScoreBreakdown) -> Self {
        Self { metadata, scores }
    }

    /// Scores `metadata` and pairs it with the result.
    pub fn scored(metadata: NormalizedMetadata) -> Self {
        let scores = score(&metadata);
        Self { metadata, scores }
    }

    pub fn total_score(&self) -> u8 {
        self.scores.total_score()
    }

    fn record(&self) -> Vec<String> {
        let meta = &self.metadata;
        let mut fields = vec![
            meta.file_name.clone(),
            meta.last_modified.format(LAST_MODIFIED_FORMAT).to_string(),
            meta.resolution_label(),
            meta.video_bitrate_bps.to_string(),
            meta.audio_bitrate_bps.to_string(),
            meta.video_codec.to_string(),
            meta.audio_channels.to_string(),
            meta.source_tag.clone(),
        ];
        fields.extend(self.scores.components().iter().map(u8::to_string));
        fields.push(self.total_score().to_string());
        fields
    }
}

/// Report order: total score descending, then file name, then modification
/// date. Independent of the order rows were discovered in.
pub fn report_order(a: &ReportRow, b: &ReportRow) -> Ordering {
    b.total_score()
        .cmp(&a.total_score())
        .then_with(|| a.metadata.file_name.cmp(&b.metadata.file_name))
        .then_with(|| a.metadata.last_modified.cmp(&b.metadata.last_modified))
}

pub fn rank(mut rows: Vec<ReportRow>) -> Vec<ReportRow> {
    rows.sort_by(report_order);
    rows
}

/// Writes one header row and one row per entry, in the given order.
pub fn write_csv<W: Write>(rows: &[ReportRow], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(REPORT_HEADERS)
        .context("Failed to write report header")?;
    for row in rows {
        csv_writer
            .write_record(row.record())
            .with_context(|| format!("Failed to write report row for '{}'", row.metadata.file_name))?;
    }
    csv_writer.flush().context("Failed to flush report")?;
    Ok(())
}

pub fn write_csv_file(rows: &[ReportRow], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file at {}", path.display()))?;
    write_csv(rows, file)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
