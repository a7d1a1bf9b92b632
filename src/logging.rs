use log::{debug, LevelFilter};
use std::env;

const ENV_PREFIX: &str = "video_ranking_";

/// Maps `-v` occurrences to a level; `RUST_LOG` takes precedence when set.
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init(verbose: u8) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level_for_verbosity(verbose))
        .format_timestamp(None)
        .target(env_logger::Target::Stderr);
    if let Ok(spec) = env::var("RUST_LOG") {
        if !spec.is_empty() {
            builder.parse_filters(&spec);
        }
    }
    // A logger may already be installed when called from a test harness.
    if let Err(err) = builder.try_init() {
        debug!("Logger already initialized: {err}");
    }
}

fn relevant_env() -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = env::vars()
        .filter(|(key, _)| key.to_ascii_lowercase().starts_with(ENV_PREFIX))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

pub fn log_relevant_env() {
    let entries = relevant_env();
    if entries.is_empty() {
        return;
    }
    debug!("Environment snapshot ({} entries):", entries.len());
    for (key, value) in entries {
        debug!("  {} = {}", key, value);
    }
}
