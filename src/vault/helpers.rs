//! Helper types and utilities for the vault module.

use std::ops::Deref;
use std::path::Path;

use pathdiff::diff_paths;

/// A raw link split into the parts the link grammar distinguishes.
///
/// `![[photo.heic#page=2|300x200]]` has target `photo.heic`, subpath
/// `#page=2` and suffix `300x200`.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct LinkTarget {
    pub full_link: String,
    pub target: String,
    pub subpath: Option<String>,
    pub suffix: Option<String>,
}

impl LinkTarget {
    pub fn parse(raw_link: &str) -> LinkTarget {
        let (before_suffix, suffix) = match raw_link.split_once('|') {
            Some((before, suffix)) => (before, Some(suffix.to_string())),
            None => (raw_link, None),
        };

        let (target, subpath) = match before_suffix.find('#') {
            Some(idx) => (
                &before_suffix[..idx],
                Some(before_suffix[idx..].to_string()),
            ),
            None => (before_suffix, None),
        };

        LinkTarget {
            full_link: raw_link.to_string(),
            target: target.trim().to_string(),
            subpath,
            suffix,
        }
    }

    /// Rebuild the raw link around a new target, keeping subpath and suffix verbatim.
    pub fn with_target(&self, new_target: &str) -> String {
        let mut link = new_target.to_string();
        if let Some(subpath) = &self.subpath {
            link.push_str(subpath);
        }
        if let Some(suffix) = &self.suffix {
            link.push('|');
            link.push_str(suffix);
        }
        link
    }

    /// Whether the target points outside the vault (a URL or inline data).
    pub fn is_external(&self) -> bool {
        let lower = self.target.to_lowercase();
        lower.contains("://") || lower.starts_with("mailto:") || lower.starts_with("data:")
    }
}

impl Deref for LinkTarget {
    type Target = String;
    fn deref(&self) -> &Self::Target {
        &self.target
    }
}

impl From<&str> for LinkTarget {
    fn from(value: &str) -> Self {
        LinkTarget::parse(value)
    }
}

/// Obsidian-style reference path of a file: root relative, without the `.md` extension.
pub fn get_obsidian_ref_path(root_dir: &Path, path: &Path) -> Option<String> {
    diff_paths(path, root_dir).and_then(|diff| {
        let diff = match diff.extension().and_then(|ext| ext.to_str()) {
            Some("md") => diff.with_extension(""),
            _ => diff,
        };
        diff.to_str().map(|s| s.replace('\\', "/"))
    })
}

/// Path of `path` relative to the folder containing `from`, with `/` separators.
pub fn relative_ref_path(from: &Path, path: &Path) -> Option<String> {
    let from_dir = from.parent()?;
    diff_paths(path, from_dir).and_then(|diff| diff.to_str().map(|s| s.replace('\\', "/")))
}
