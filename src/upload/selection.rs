use super::types::SelectedFile;
use crate::error::ConfigError;
use glob::Pattern;
use ignore::Walk;
use std::fs;
use std::path::{Path, PathBuf};

/// Turns picked paths or whole folders into an upload selection.
#[derive(Debug, Clone, Default)]
pub struct FileSelector {
    exclude: Vec<Pattern>,
}

impl FileSelector {
    /// Patterns without a leading `**/` match at any depth.
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let exclude = patterns
            .iter()
            .map(|pattern| {
                let processed = if pattern.starts_with("**/") {
                    pattern.to_string()
                } else {
                    format!("**/{}", pattern)
                };
                Pattern::new(&processed).map_err(|e| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { exclude })
    }

    pub fn from_paths(&self, paths: impl IntoIterator<Item = PathBuf>) -> Vec<SelectedFile> {
        paths
            .into_iter()
            .filter_map(|path| Self::selected_file(&path))
            .collect()
    }

    /// Walks `folder` recursively, honouring `.gitignore` files and the
    /// configured exclude patterns.
    pub fn from_folder(&self, folder: &Path) -> Vec<SelectedFile> {
        let mut files = Vec::new();
        for entry in Walk::new(folder) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {:?}: {}", folder, e);
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(folder).unwrap_or(path);
            if self.is_excluded(relative) {
                tracing::debug!("Excluded {:?}", relative);
                continue;
            }
            if let Some(file) = Self::selected_file(path) {
                files.push(file);
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::info!("Selected {} file(s) from {:?}", files.len(), folder);
        files
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        self.exclude
            .iter()
            .any(|pattern| pattern.matches_path(relative))
    }

    fn selected_file(path: &Path) -> Option<SelectedFile> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => {
                tracing::warn!("Not a regular file: {:?}", path);
                return None;
            }
            Err(e) => {
                tracing::warn!("Cannot read {:?}: {}", path, e);
                return None;
            }
        };
        let name = path.file_name()?.to_string_lossy().to_string();
        Some(SelectedFile {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
        })
    }
}
