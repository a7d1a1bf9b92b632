//! Finds candidate video files in a folder.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "flv", "webm"];

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiscoveryOptions {
    /// Lowercase extensions without the leading dot.
    pub extensions: Vec<String>,
    pub recursive: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            recursive: false,
        }
    }
}

impl DiscoveryOptions {
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = normalize_extensions(extensions);
        self
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// Trims, strips leading dots, lowercases and de-duplicates extensions.
pub fn normalize_extensions<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for ext in extensions {
        let cleaned = ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase();
        if !cleaned.is_empty() && !out.contains(&cleaned) {
            out.push(cleaned);
        }
    }
    out
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub file_name: String,
    pub last_modified: NaiveDate,
}

impl DiscoveredFile {
    pub fn from_path(path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let last_modified = modified_date(&path);
        Self {
            path,
            file_name,
            last_modified,
        }
    }
}

fn modified_date(path: &Path) -> NaiveDate {
    match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(time) => date_of(time),
        Err(err) => {
            warn!(
                "Could not read modification time of '{}': {}; using 1970-01-01",
                path.display(),
                err
            );
            NaiveDate::default()
        }
    }
}

fn date_of(time: SystemTime) -> NaiveDate {
    DateTime::<Local>::from(time).date_naive()
}

/// Lists matching files under `dir`, sorted by path.
pub fn discover(dir: &Path, options: &DiscoveryOptions) -> Result<Vec<DiscoveredFile>> {
    if !dir.is_dir() {
        bail!("'{}' is not a valid folder", dir.display());
    }

    let mut paths = Vec::new();
    collect(dir, options, &mut paths)?;
    paths.sort();
    debug!(
        "Discovered {} video file(s) in '{}' (extensions: {})",
        paths.len(),
        dir.display(),
        options.extensions.join(", ")
    );
    Ok(paths.into_iter().map(DiscoveredFile::from_path).collect())
}

fn collect(dir: &Path, options: &DiscoveryOptions, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read folder '{}'", dir.display()))?;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry in '{}': {}", dir.display(), err);
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            if options.recursive {
                if let Err(err) = collect(&path, options, out) {
                    warn!("Skipping folder '{}': {:#}", path.display(), err);
                }
            }
            continue;
        }
        if path.is_file() && options.matches(&path) {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    #[test]
    fn extension_normalization() {
        let exts = normalize_extensions([".MKV", "mp4", " .mp4 ", "", "."]);
        assert_eq!(exts, ["mkv", "mp4"]);
    }

    #[test]
    fn matches_case_insensitively() {
        let options = DiscoveryOptions::default();
        assert!(options.matches(Path::new("Movie.MKV")));
        assert!(options.matches(Path::new("clip.webm")));
        assert!(!options.matches(Path::new("notes.txt")));
        assert!(!options.matches(Path::new("no_extension")));
    }

    #[test]
    fn discovers_top_level_only_by_default() {
        let tmp = tempdir().unwrap();
        touch(&tmp.path().join("b.mkv"));
        touch(&tmp.path().join("a.MP4"));
        touch(&tmp.path().join("report.csv"));
        fs::create_dir(tmp.path().join("nested")).unwrap();
        touch(&tmp.path().join("nested").join("c.mov"));

        let files = discover(tmp.path(), &DiscoveryOptions::default()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, ["a.MP4", "b.mkv"]);
        let today = Local::now().date_naive();
        assert!(files.iter().all(|f| f.last_modified <= today));
    }

    #[test]
    fn recursive_discovery_walks_subfolders() {
        let tmp = tempdir().unwrap();
        touch(&tmp.path().join("a.mkv"));
        fs::create_dir_all(tmp.path().join("x").join("y")).unwrap();
        touch(&tmp.path().join("x").join("y").join("deep.avi"));

        let options = DiscoveryOptions {
            recursive: true,
            ..DiscoveryOptions::default()
        };
        let files = discover(tmp.path(), &options).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, ["a.mkv", "deep.avi"]);
    }

    #[test]
    fn custom_allow_list_replaces_defaults() {
        let tmp = tempdir().unwrap();
        touch(&tmp.path().join("a.mkv"));
        touch(&tmp.path().join("b.ts"));
        let options = DiscoveryOptions::default().with_extensions([".ts"]);
        let files = discover(tmp.path(), &options).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "b.ts");
    }

    #[test]
    fn empty_folder_is_not_an_error() {
        let tmp = tempdir().unwrap();
        assert!(discover(tmp.path(), &DiscoveryOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn missing_folder_is_an_error() {
        let tmp = tempdir().unwrap();
        let err = discover(&tmp.path().join("missing"), &DiscoveryOptions::default()).unwrap_err();
        assert!(err.to_string().contains("not a valid folder"));
    }
}
