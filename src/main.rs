use anyhow::{Context, Result};
use clap::parser::ValueSource;
use clap::{value_parser, ArgMatches, CommandFactory, FromArgMatches, Parser};
use log::{debug, info, warn};
use std::path::PathBuf;

use video_ranking::analysis::{self, AnalysisOptions, RunSettings};
use video_ranking::config::{self, ConfigSource};
use video_ranking::discovery::{normalize_extensions, DiscoveryOptions, DEFAULT_VIDEO_EXTENSIONS};
use video_ranking::logging;
use video_ranking::normalize::NormalizeOptions;
use video_ranking::probe::{build_probe, ProbeBackend, DEFAULT_FFPROBE};

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Folder containing the video files to rank
    #[arg(value_parser = value_parser!(PathBuf))]
    folder: PathBuf,

    /// Where to write the CSV report (default: <FOLDER>/video_quality_report.csv)
    #[arg(short, long, value_parser = value_parser!(PathBuf), id = "output")]
    output: Option<PathBuf>,

    /// Path to the configuration file
    #[arg(short, long, value_parser = value_parser!(PathBuf))]
    config_file: Option<PathBuf>,

    /// Comma-separated list of video file extensions to include
    #[arg(
        short,
        long,
        value_delimiter = ',',
        value_name = "EXT",
        default_values_t = DEFAULT_VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        id = "extensions"
    )]
    extensions: Vec<String>,

    /// Also scan subfolders
    #[arg(short, long, default_value_t = false, id = "recursive")]
    recursive: bool,

    /// Treat the file name as a source label (e.g. "Movie.2020.BluRay.mkv")
    #[arg(long, default_value_t = false, id = "source_from_file_name")]
    source_from_file_name: bool,

    /// Metadata extraction backend
    #[arg(long, value_enum, default_value_t = ProbeBackend::Ffprobe, id = "probe")]
    probe: ProbeBackend,

    /// ffprobe executable used by the ffprobe backend
    #[arg(long, value_parser = value_parser!(PathBuf), default_value = DEFAULT_FFPROBE, id = "ffprobe_path")]
    ffprobe_path: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn run_settings(&self) -> RunSettings {
        RunSettings {
            folder: self.folder.clone(),
            output: self.output.clone(),
            discovery: DiscoveryOptions {
                recursive: self.recursive,
                ..DiscoveryOptions::default()
            }
            .with_extensions(&self.extensions),
            analysis: AnalysisOptions {
                normalize: NormalizeOptions {
                    source_from_file_name: self.source_from_file_name,
                },
            },
        }
    }
}

fn cli_value_provided(matches: &ArgMatches, id: &str) -> bool {
    let direct = matches
        .value_source(id)
        .is_some_and(|src| matches!(src, ValueSource::CommandLine));
    if direct {
        return true;
    }
    let alt_id = id.replace('_', "-");
    if !matches.ids().any(|known| known.as_str() == alt_id) {
        return false;
    }
    matches
        .value_source(alt_id.as_str())
        .is_some_and(|src| matches!(src, ValueSource::CommandLine))
}

fn apply_config_overrides(args: &mut Args, cfg: &config::Config, matches: &ArgMatches) {
    if !cli_value_provided(matches, "extensions") {
        if let Some(setting) = cfg.extensions.as_ref() {
            let values = normalize_extensions(setting.values());
            if values.is_empty() {
                warn!("Config 'extensions' is empty; keeping the default list");
            } else {
                args.extensions = values;
            }
        }
    }

    if !cli_value_provided(matches, "output") {
        if let Some(output) = cfg.output.as_ref() {
            args.output = Some(output.clone());
        }
    }

    if !cli_value_provided(matches, "recursive") {
        if let Some(recursive) = cfg.recursive {
            args.recursive = recursive;
        }
    }

    if !cli_value_provided(matches, "source_from_file_name") {
        if let Some(flag) = cfg.source_from_file_name {
            args.source_from_file_name = flag;
        }
    }

    if !cli_value_provided(matches, "probe") {
        if let Some(probe) = cfg.probe {
            args.probe = probe;
        }
    }

    if !cli_value_provided(matches, "ffprobe_path") {
        if let Some(path) = cfg.ffprobe_path.as_ref() {
            args.ffprobe_path = path.clone();
        }
    }
}

fn main() -> Result<()> {
    let mut matches = Args::command().get_matches();
    let mut args = Args::from_arg_matches_mut(&mut matches).context("Failed to parse CLI arguments")?;

    logging::init(args.verbose);
    logging::log_relevant_env();

    let loaded_config = config::load(args.config_file.as_deref())?;
    if let Some((cfg, source)) = &loaded_config {
        match source {
            ConfigSource::Env(path) => {
                info!(
                    "Loaded configuration from '{}' (via {}).",
                    path.display(),
                    config::CONFIG_ENV_VAR
                );
            }
            ConfigSource::Cli(path) | ConfigSource::Default(path) => {
                info!("Loaded configuration from '{}'.", path.display());
            }
        }
        apply_config_overrides(&mut args, cfg, &matches);
    }
    debug!("Effective arguments: {:?}", args);

    let probe = build_probe(args.probe, &args.ffprobe_path)?;
    let settings = args.run_settings();
    let summary = analysis::run(&settings, probe.as_ref())
        .with_context(|| format!("Failed to rank videos in '{}'", settings.folder.display()))?;

    info!(
        "Ranked {} file(s), skipped {}.",
        summary.analysis.rows.len(),
        summary.analysis.skipped.len()
    );
    Ok(())
}
