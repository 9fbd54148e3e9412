use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::config::{should_include_file, ParserConfig};
use crate::errors::{BratError, Result};

/// A document basename with whichever of its two files were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    /// Path relative to the corpus root, without extension, `/`-separated.
    pub key: String,
    pub text: Option<PathBuf>,
    pub annotation: Option<PathBuf>,
}

impl FilePair {
    fn new(key: String) -> Self {
        Self {
            key,
            text: None,
            annotation: None,
        }
    }
}

/// Collects text/annotation file pairs under `path`, sorted by key.
///
/// `path` may be a directory (scanned recursively, hidden entries skipped),
/// a single text or annotation file, or a basename without extension.
pub fn collect_pairs(path: &Path, config: &ParserConfig) -> Result<Vec<FilePair>> {
    let text_ext = config.text_extension.trim_start_matches('.');
    let ann_ext = config.annotation_extension.trim_start_matches('.');

    if path.is_dir() {
        return scan_directory(path, config, text_ext, ann_ext);
    }

    let extension = path.extension().and_then(|e| e.to_str());
    let base = if extension == Some(text_ext) || extension == Some(ann_ext) {
        path.with_extension("")
    } else {
        path.to_path_buf()
    };

    let text = with_appended_extension(&base, text_ext);
    let annotation = with_appended_extension(&base, ann_ext);
    if !text.is_file() && !annotation.is_file() {
        return Err(BratError::File {
            message: "no document text or annotation file found".to_string(),
            path: path.display().to_string(),
        });
    }

    let key = base
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| base.display().to_string());
    let mut pair = FilePair::new(key);
    pair.text = text.is_file().then_some(text);
    pair.annotation = annotation.is_file().then_some(annotation);
    Ok(vec![pair])
}

fn scan_directory(
    root: &Path,
    config: &ParserConfig,
    text_ext: &str,
    ann_ext: &str,
) -> Result<Vec<FilePair>> {
    let mut pairs: BTreeMap<String, FilePair> = BTreeMap::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let extension = path.extension().and_then(|e| e.to_str());
        let is_text = extension == Some(text_ext);
        if !is_text && extension != Some(ann_ext) {
            continue;
        }

        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let relative_str = to_key(relative);
        if !should_include_file(&relative_str, config) {
            continue;
        }

        let key = to_key(&relative.with_extension(""));
        let pair = pairs
            .entry(key.clone())
            .or_insert_with(|| FilePair::new(key));
        if is_text {
            pair.text = Some(path.to_path_buf());
        } else {
            pair.annotation = Some(path.to_path_buf());
        }
    }

    Ok(pairs.into_values().collect())
}

fn to_key(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// `doc.v2` + `txt` is `doc.v2.txt`, unlike `Path::with_extension`.
fn with_appended_extension(base: &Path, extension: &str) -> PathBuf {
    let mut name: OsString = base.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}
