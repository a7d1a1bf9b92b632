use crate::probe::ProbeBackend;
use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "VIDEO_RANKING_CONFIG";
const APP_DIR: &str = "video-ranking";
const APP_FILE: &str = "video-ranking.toml";

/// Optional settings read from a TOML file. Unset keys fall back to CLI
/// defaults.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub extensions: Option<ExtensionsSetting>,
    pub recursive: Option<bool>,
    pub output: Option<PathBuf>,
    pub source_from_file_name: Option<bool>,
    pub probe: Option<ProbeBackend>,
    pub ffprobe_path: Option<PathBuf>,
}

/// `extensions = "mkv,mp4"` or `extensions = ["mkv", "mp4"]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExtensionsSetting {
    Single(String),
    List(Vec<String>),
}

impl ExtensionsSetting {
    pub fn values(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            ExtensionsSetting::Single(value) => value.split(',').collect(),
            ExtensionsSetting::List(values) => {
                values.iter().flat_map(|value| value.split(',')).collect()
            }
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Cli(PathBuf),
    Env(PathBuf),
    Default(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::Cli(path) | ConfigSource::Env(path) | ConfigSource::Default(path) => path,
        }
    }
}

pub fn parse(contents: &str, path: &Path) -> Result<Config> {
    toml::from_str(contents)
        .with_context(|| format!("Invalid configuration file {}", path.display()))
}

/// Loads the first configuration file found.
///
/// An explicit path must exist; the environment variable and the default
/// locations are only used when present.
pub fn load(path_override: Option<&Path>) -> Result<Option<(Config, ConfigSource)>> {
    if let Some(path) = path_override {
        let cfg = read(path)?;
        return Ok(Some((cfg, ConfigSource::Cli(path.to_path_buf()))));
    }

    if let Some(env_path) = env::var_os(CONFIG_ENV_VAR).filter(|value| !value.is_empty()) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            let cfg = read(&path)?;
            return Ok(Some((cfg, ConfigSource::Env(path))));
        }
        debug!(
            "{} points at '{}', which does not exist; ignoring",
            CONFIG_ENV_VAR,
            path.display()
        );
    }

    for candidate in default_config_candidates() {
        if candidate.is_file() {
            let cfg = read(&candidate)?;
            return Ok(Some((cfg, ConfigSource::Default(candidate))));
        }
    }

    Ok(None)
}

fn read(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file at {}", path.display()))?;
    parse(&contents, path)
}

fn default_config_candidates() -> Vec<PathBuf> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();

    let mut push_unique = |path: PathBuf, out: &mut Vec<PathBuf>| {
        if !path.as_os_str().is_empty() && seen.insert(path.clone()) {
            out.push(path);
        }
    };

    if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME").filter(|val| !val.is_empty()) {
        let mut path = PathBuf::from(xdg_config);
        path.push(APP_DIR);
        path.push("config.toml");
        push_unique(path, &mut out);
    }

    if let Some(home) = detect_home_dir() {
        let mut path = home.join(".config");
        path.push(APP_DIR);
        path.push("config.toml");
        push_unique(path, &mut out);

        push_unique(home.join(APP_FILE), &mut out);
    }

    if let Ok(current_dir) = env::current_dir() {
        push_unique(current_dir.join(APP_FILE), &mut out);
    }

    if let Ok(exe_path) = env::current_exe() {
        if let Some(parent) = exe_path.parent() {
            push_unique(parent.join(APP_FILE), &mut out);
        }
    }

    push_unique(PathBuf::from("/etc/video-ranking/config.toml"), &mut out);

    out
}

fn detect_home_dir() -> Option<PathBuf> {
    if let Some(home) = env::var_os("HOME").filter(|val| !val.is_empty()) {
        return Some(PathBuf::from(home));
    }

    #[cfg(unix)]
    {
        use std::ffi::CStr;

        unsafe {
            let uid = libc::getuid();
            let pwd = libc::getpwuid(uid);
            if pwd.is_null() {
                return None;
            }
            let dir_ptr = (*pwd).pw_dir;
            if dir_ptr.is_null() {
                return None;
            }
            if let Ok(path_str) = CStr::from_ptr(dir_ptr).to_str() {
                if !path_str.is_empty() {
                    return Some(PathBuf::from(path_str));
                }
            }
        }
    }

    None
}
