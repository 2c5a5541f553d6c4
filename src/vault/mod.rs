mod helpers;
mod metadata;
pub mod parsing;
mod types;

#[cfg(test)]
mod tests;

pub use helpers::{get_obsidian_ref_path, relative_ref_path, LinkTarget};
pub use metadata::MDMetadata;
pub use types::{Occurrence, Span, Spanned, SyntaxKind};

use std::{
    collections::{BTreeSet, HashMap},
    path::{Component, Path, PathBuf},
};

use itertools::Itertools;
use rayon::prelude::*;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::annotate::{CorpusEntry, EntityIndex};
use crate::config::{LinkFormat, Settings};
use crate::rewrite::{rewrite_links, DisplayResolver, LinkResolver, ReplacementMap};

use self::parsing::parse_occurrences;

impl Vault {
    pub fn construct_vault(context: &Settings, root_dir: &Path) -> Result<Vault, std::io::Error> {
        let file_paths = WalkDir::new(root_dir)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e
                        .file_name()
                        .to_str()
                        .map(|s| s.starts_with('.'))
                        .unwrap_or(false)
            })
            .flatten()
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| normalize(entry.path()))
            .collect_vec();

        let md_files: HashMap<PathBuf, MDFile> = file_paths
            .par_iter()
            .filter(|path| is_markdown(path))
            .flat_map(|path| {
                let text = std::fs::read_to_string(path)?;
                let md_file = MDFile::new(context, &text, path.clone());

                Ok::<(PathBuf, MDFile), std::io::Error>((path.clone(), md_file))
            })
            .collect();

        let mut vault = Vault {
            md_files,
            resources: BTreeSet::new(),
            by_name: HashMap::new(),
            root_dir: normalize(root_dir),
            link_format: context.link_format,
        };
        for path in file_paths {
            vault.add_resource(path);
        }

        info!(
            root = %root_dir.display(),
            documents = vault.md_files.len(),
            resources = vault.resources.len(),
            "constructed vault"
        );

        Ok(vault)
    }

    /// Register a file that exists in the vault, e.g. the output of a conversion.
    pub fn add_resource(&mut self, path: PathBuf) {
        if let Some(name) = file_name_key(&path) {
            let same_name = self.by_name.entry(name).or_default();
            if !same_name.contains(&path) {
                same_name.push(path.clone());
            }
        }
        self.resources.insert(path);
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("md")
}

fn file_name_key(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_lowercase)
}

/// Resolve `.` and `..` components without touching the file system.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[derive(Debug, PartialEq, Eq, Clone)]
/// The in memory representation of the vault. Documents are parsed once at construction;
/// every other file is only recorded as a resource that links may point at.
pub struct Vault {
    pub md_files: HashMap<PathBuf, MDFile>,
    resources: BTreeSet<PathBuf>,
    /// lowercase file name to every path carrying it
    by_name: HashMap<String, Vec<PathBuf>>,
    root_dir: PathBuf,
    link_format: LinkFormat,
}

/// Methods using vaults data
impl Vault {
    pub fn root_dir(&self) -> &PathBuf {
        &self.root_dir
    }

    pub fn document_count(&self) -> usize {
        self.md_files.len()
    }

    pub fn contains_resource(&self, path: &Path) -> bool {
        self.resources.contains(path)
    }

    /// Select all occurrences in a file if path is Some, else all in vault.
    pub fn select_occurrences<'a>(
        &'a self,
        path: Option<&'a Path>,
    ) -> Vec<(&'a Path, &'a Occurrence)> {
        match path {
            Some(path) => self
                .md_files
                .get(path)
                .map(|md| md.occurrences.iter().map(|item| (path, item)).collect())
                .unwrap_or_default(),
            None => self
                .md_files
                .iter()
                .flat_map(|(path, md)| md.occurrences.iter().map(|item| (path.as_path(), item)))
                .collect(),
        }
    }

    /// Documents with at least one occurrence resolving to one of `resources`, sorted by path.
    pub fn select_referencing_documents<'a>(
        &'a self,
        resources: &'a ReplacementMap,
    ) -> Vec<&'a Path> {
        self.select_occurrences(None)
            .into_par_iter()
            .filter(|(path, occurrence)| {
                let link = LinkTarget::parse(&occurrence.raw_link);
                self.resolve(&link.target, path)
                    .is_some_and(|resolved| resources.contains_key(&resolved))
            })
            .map(|(path, _)| path)
            .collect::<Vec<_>>()
            .into_iter()
            .sorted()
            .dedup()
            .collect()
    }

    /// Rewrite the links of one document; `None` if the document is unknown or unchanged.
    pub fn rewrite_document(&self, path: &Path, replacements: &ReplacementMap) -> Option<String> {
        let md_file = self.md_files.get(path)?;
        rewrite_links(
            &md_file.text,
            path,
            &md_file.occurrences,
            replacements,
            self,
            self,
        )
    }

    /// Every document as a corpus entry, ordered by path.
    pub fn corpus(&self) -> Vec<CorpusEntry> {
        self.md_files
            .values()
            .sorted_by(|a, b| a.path.cmp(&b.path))
            .flat_map(|md| {
                Some(CorpusEntry {
                    path: md.path.clone(),
                    name: md.file_name()?.to_string(),
                    aliases: md
                        .metadata
                        .as_ref()
                        .map(|metadata| metadata.aliases().to_vec())
                        .unwrap_or_default(),
                })
            })
            .collect()
    }

    /// The entity index for annotating text destined for `current`.
    pub fn entity_index(&self, current: Option<&Path>) -> EntityIndex {
        EntityIndex::build(self.corpus(), current)
    }

    fn lookup(&self, candidate: &Path) -> Option<PathBuf> {
        let candidate = normalize(candidate);
        if self.resources.contains(&candidate) {
            return Some(candidate);
        }
        if !is_markdown(&candidate) {
            let mut with_md = candidate.into_os_string();
            with_md.push(".md");
            let with_md = PathBuf::from(with_md);
            if self.resources.contains(&with_md) {
                return Some(with_md);
            }
        }
        None
    }

    /// Match by file name anywhere in the vault; a target with folders must match the path tail.
    fn lookup_by_name(&self, target: &str) -> Option<PathBuf> {
        let name = file_name_key(Path::new(target))?;
        let target = target.to_lowercase();
        let tails = [format!("/{target}"), format!("/{target}.md")];

        let mut keys = vec![name.clone()];
        if !name.ends_with(".md") {
            keys.push(format!("{name}.md"));
        }

        keys.iter()
            .flat_map(|key| self.by_name.get(key))
            .flatten()
            .filter(|path| {
                path.to_str().is_some_and(|path| {
                    let path = path.to_lowercase().replace('\\', "/");
                    tails.iter().any(|tail| path.ends_with(tail))
                })
            })
            .min_by(|a, b| {
                a.components()
                    .count()
                    .cmp(&b.components().count())
                    .then_with(|| a.cmp(b))
            })
            .cloned()
    }
}

impl LinkResolver for Vault {
    fn resolve(&self, target: &str, from: &Path) -> Option<PathBuf> {
        let decoded = urlencoding::decode(target)
            .map_or_else(|_| target.to_string(), |d| d.to_string())
            .replace(r"\ ", " ");
        let decoded = decoded.trim();
        if decoded.is_empty() || LinkTarget::parse(decoded).is_external() {
            return None;
        }

        let from_dir = from.parent().unwrap_or(&self.root_dir);

        let candidates = if decoded.starts_with("./") || decoded.starts_with("../") {
            vec![from_dir.join(decoded)]
        } else if let Some(rooted) = decoded.strip_prefix('/') {
            vec![self.root_dir.join(rooted)]
        } else {
            vec![self.root_dir.join(decoded), from_dir.join(decoded)]
        };

        let resolved = candidates
            .iter()
            .find_map(|candidate| self.lookup(candidate))
            .filter(|resolved| resolved.starts_with(&self.root_dir))
            .or_else(|| self.lookup_by_name(decoded.trim_start_matches("./")));

        if resolved.is_none() {
            debug!(link = decoded, from = %from.display(), "unresolved link target");
        }
        resolved
    }
}

impl DisplayResolver for Vault {
    fn display_target(&self, resource: &Path, from: &Path) -> String {
        let strip_md = |s: String| {
            if is_markdown(resource) {
                s.strip_suffix(".md").map(String::from).unwrap_or(s)
            } else {
                s
            }
        };

        let absolute = || get_obsidian_ref_path(&self.root_dir, resource);

        let target = match self.link_format {
            LinkFormat::Absolute => absolute(),
            LinkFormat::Relative => relative_ref_path(from, resource).map(strip_md),
            LinkFormat::Shortest => {
                let unique = file_name_key(resource).is_some_and(|name| {
                    self.by_name
                        .get(&name)
                        .map_or(true, |paths| paths.iter().all(|path| path == resource))
                });
                if unique {
                    resource
                        .file_name()
                        .and_then(|name| name.to_str())
                        .map(String::from)
                        .map(strip_md)
                } else {
                    absolute()
                }
            }
        };

        target.unwrap_or_else(|| resource.to_string_lossy().into_owned())
    }
}

/// One parsed Markdown document.
#[derive(Debug, PartialEq, Eq, Default, Hash, Clone)]
pub struct MDFile {
    pub path: PathBuf,
    pub text: String,
    pub occurrences: Vec<Occurrence>,
    pub metadata: Option<MDMetadata>,
}

impl MDFile {
    pub fn new(context: &Settings, text: &str, path: PathBuf) -> MDFile {
        MDFile {
            occurrences: parse_occurrences(text, context.references_in_codeblocks),
            metadata: MDMetadata::new(text),
            text: text.to_string(),
            path,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_stem()?.to_str()
    }
}
