//! Per-folder pipeline: discover → probe → normalize → score → rank → write.

use crate::discovery::{discover, DiscoveredFile, DiscoveryOptions};
use crate::normalize::{normalize_with, NormalizeOptions};
use crate::probe::MetadataProbe;
use crate::report::{rank, write_csv_file, ReportRow, LAST_MODIFIED_FORMAT};
use anyhow::Result;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

pub const DEFAULT_REPORT_NAME: &str = "video_quality_report.csv";

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AnalysisOptions {
    pub normalize: NormalizeOptions,
}

/// A file that could not be probed, with the reason.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Analysis {
    /// Already in report order.
    pub rows: Vec<ReportRow>,
    pub skipped: Vec<SkippedFile>,
}

/// Probes and scores each file in turn. A probe failure skips that file only.
pub fn analyze(
    files: &[DiscoveredFile],
    probe: &dyn MetadataProbe,
    options: &AnalysisOptions,
) -> Analysis {
    let total = files.len();
    let mut rows = Vec::with_capacity(total);
    let mut skipped = Vec::new();

    for (idx, file) in files.iter().enumerate() {
        info!("[{}/{}] Analyzing '{}'", idx + 1, total, file.path.display());
        let raw = match probe.probe(&file.path) {
            Ok(raw) => raw,
            Err(err) => {
                let reason = format!("{:#}", err);
                warn!(
                    "Skipping '{}': {} probe failed: {}",
                    file.path.display(),
                    probe.name(),
                    reason
                );
                skipped.push(SkippedFile {
                    path: file.path.clone(),
                    reason,
                });
                continue;
            }
        };

        let metadata = normalize_with(&raw, &file.file_name, file.last_modified, &options.normalize);
        debug!("Normalized '{}': {:?}", file.file_name, metadata);
        let row = ReportRow::scored(metadata);
        debug!(
            "Scored '{}': {:?} (total {})",
            file.file_name,
            row.scores,
            row.total_score()
        );
        rows.push(row);
    }

    Analysis {
        rows: rank(rows),
        skipped,
    }
}

#[derive(Clone, Debug)]
pub struct RunSettings {
    pub folder: PathBuf,
    /// Defaults to [`DEFAULT_REPORT_NAME`] inside `folder`.
    pub output: Option<PathBuf>,
    pub discovery: DiscoveryOptions,
    pub analysis: AnalysisOptions,
}

impl RunSettings {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            output: None,
            discovery: DiscoveryOptions::default(),
            analysis: AnalysisOptions::default(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.folder.join(DEFAULT_REPORT_NAME))
    }
}

#[derive(Clone, Debug)]
pub struct RunSummary {
    pub report_path: PathBuf,
    pub analysis: Analysis,
}

pub fn run(settings: &RunSettings, probe: &dyn MetadataProbe) -> Result<RunSummary> {
    let files = discover(&settings.folder, &settings.discovery)?;
    if files.is_empty() {
        info!(
            "No video files found in '{}'; writing an empty report.",
            settings.folder.display()
        );
    } else {
        info!(
            "Found {} video file(s); probing with {}.",
            files.len(),
            probe.name()
        );
    }

    let analysis = analyze(&files, probe, &settings.analysis);
    let report_path = settings.output_path();
    write_csv_file(&analysis.rows, &report_path)?;

    log_ranking(&analysis, &report_path);
    Ok(RunSummary {
        report_path,
        analysis,
    })
}

fn log_ranking(analysis: &Analysis, report_path: &Path) {
    info!("Report saved as: {}", report_path.display());
    if !analysis.rows.is_empty() {
        info!("Quality ranking:");
    }
    for (rank, row) in analysis.rows.iter().enumerate() {
        info!(
            "{}. {} - Total Score: {} - Last Modified: {}",
            rank + 1,
            row.metadata.file_name,
            row.total_score(),
            row.metadata.last_modified.format(LAST_MODIFIED_FORMAT)
        );
    }
    if !analysis.skipped.is_empty() {
        warn!(
            "{} file(s) were skipped because their metadata could not be read.",
            analysis.skipped.len()
        );
    }
}
