use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::errors::{BratError, Result};
use crate::policy::ErrorPolicy;
use crate::types::AnnotationKind;

/// Name of the configuration file looked up in the corpus root.
pub const CONFIG_FILENAME: &str = ".bratparse.json";

/// Configuration for a parse invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// How malformed records, dangling references and unpaired files are handled.
    pub error_policy: ErrorPolicy,
    /// Annotation prefixes whose lines are skipped (`T`, `R`, `*`, `E`, `A`, `M`, `N`, `#`).
    pub ignore_types: Vec<String>,
    /// Extension of document text files, without the leading dot.
    pub text_extension: String,
    /// Extension of annotation files, without the leading dot.
    pub annotation_extension: String,
    /// Glob patterns (relative to the corpus root) for files to skip.
    pub exclude: Vec<String>,
    /// String placed between fragments of a discontinuous entity's literal text.
    pub fragment_separator: String,
    /// Reject entities whose span list repeats an earlier entity's.
    pub reject_duplicate_spans: bool,
    /// Parse documents on the rayon thread pool.
    pub parallel: bool,
    /// Maximum file size in bytes; larger files are treated as unreadable.
    pub max_file_size: u64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            version: 1,
            error_policy: ErrorPolicy::Raise,
            ignore_types: Vec::new(),
            text_extension: "txt".to_string(),
            annotation_extension: "ann".to_string(),
            exclude: vec![".git/**".to_string()],
            fragment_separator: " ".to_string(),
            reject_duplicate_spans: false,
            parallel: true,
            max_file_size: 64 * 1_048_576,
        }
    }
}

impl ParserConfig {
    /// Returns a default configuration with the given error policy.
    pub fn with_policy(error_policy: ErrorPolicy) -> Self {
        Self {
            error_policy,
            ..Self::default()
        }
    }

    /// Checks the configuration for values the parser cannot work with.
    pub fn validate(&self) -> Result<()> {
        let unknown: Vec<&str> = self
            .ignore_types
            .iter()
            .map(String::as_str)
            .filter(|t| AnnotationKind::from_str(t).is_none())
            .collect();
        if !unknown.is_empty() {
            let known: Vec<&str> = AnnotationKind::all().iter().map(|k| k.prefix()).collect();
            return Err(BratError::Config {
                message: format!(
                    "unknown ignore types: {} (expected one of {})",
                    unknown.join(", "),
                    known.join(" ")
                ),
            });
        }

        let text_ext = self.text_extension.trim_start_matches('.');
        let ann_ext = self.annotation_extension.trim_start_matches('.');
        if text_ext.is_empty() || ann_ext.is_empty() {
            return Err(BratError::Config {
                message: "file extensions must not be empty".to_string(),
            });
        }
        if text_ext == ann_ext {
            return Err(BratError::Config {
                message: format!("text and annotation extensions are both '{}'", text_ext),
            });
        }

        for pattern in &self.exclude {
            Pattern::new(pattern).map_err(|e| BratError::Config {
                message: format!("invalid exclude pattern '{}': {}", pattern, e),
            })?;
        }

        Ok(())
    }

    /// Annotation kinds whose lines the line parser should skip.
    ///
    /// Unknown entries are dropped; `validate` reports them.
    pub fn ignored_kinds(&self) -> HashSet<AnnotationKind> {
        self.ignore_types
            .iter()
            .filter_map(|t| AnnotationKind::from_str(t))
            .collect()
    }
}

/// Returns the path to the configuration file within the given corpus root.
pub fn get_config_path(corpus_root: &Path) -> PathBuf {
    corpus_root.join(CONFIG_FILENAME)
}

/// Loads the configuration from `path`.
///
/// If the file does not exist, returns a default configuration.
pub fn load_config(path: &Path) -> Result<ParserConfig> {
    if !path.exists() {
        return Ok(ParserConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(|e| BratError::Config {
        message: format!("failed to read config file '{}': {}", path.display(), e),
    })?;

    let config: ParserConfig = serde_json::from_str(&contents).map_err(|e| BratError::Config {
        message: format!("failed to parse config file '{}': {}", path.display(), e),
    })?;

    config.validate()?;
    Ok(config)
}

/// Saves the configuration to `path` using an atomic write.
///
/// Writes to a temporary file first and then renames it to the final location,
/// so a partial write never corrupts the configuration.
pub fn save_config(path: &Path, config: &ParserConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| BratError::Config {
            message: format!("failed to create directory '{}': {}", parent.display(), e),
        })?;
    }

    let tmp_path = path.with_extension("tmp");

    let json = serde_json::to_string_pretty(config).map_err(|e| BratError::Config {
        message: format!("failed to serialize config: {}", e),
    })?;

    fs::write(&tmp_path, &json).map_err(|e| BratError::Config {
        message: format!(
            "failed to write temporary config file '{}': {}",
            tmp_path.display(),
            e
        ),
    })?;

    fs::rename(&tmp_path, path).map_err(|e| BratError::Config {
        message: format!(
            "failed to rename temporary config file '{}' to '{}': {}",
            tmp_path.display(),
            path.display(),
            e
        ),
    })?;

    Ok(())
}

/// Determines whether a corpus file should be considered, based on the
/// configuration's exclude patterns.
pub fn should_include_file(file_path: &str, config: &ParserConfig) -> bool {
    let match_opts = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    !config.exclude.iter().any(|pattern_str| {
        Pattern::new(pattern_str)
            .map(|pattern| pattern.matches_with(file_path, match_opts))
            .unwrap_or(false)
    })
}
