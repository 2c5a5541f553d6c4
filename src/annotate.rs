//! Entity annotation: link the first mention of each known note in new prose.
//!
//! Names are matched case-insensitively on word boundaries, longest first, and
//! never inside link syntax that is already present. That includes the links
//! inserted earlier in the same call, because the protected ranges are
//! recomputed after every insertion.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::Settings;
use crate::splice::{splice, Edit};
use crate::vault::parsing::{wiki_link_targets, LinkRanges};
use crate::vault::Span;

/// One document of the corpus as the annotator sees it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub path: PathBuf,
    /// Canonical name, the file name without extension.
    pub name: String,
    pub aliases: Vec<String>,
}

/// Lowercase alias (or lowercase canonical name) to canonical name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityIndex {
    entries: BTreeMap<String, String>,
}

impl EntityIndex {
    /// Build the index from a corpus, leaving out the document at `current`.
    ///
    /// Each document registers its own name and then its aliases. The first
    /// registration of a lowercase key wins.
    pub fn build(corpus: impl IntoIterator<Item = CorpusEntry>, current: Option<&Path>) -> EntityIndex {
        let mut index = EntityIndex::default();

        for entry in corpus {
            if current.is_some_and(|current| current == entry.path) {
                continue;
            }

            index.register(&entry.name, &entry.name);
            for alias in &entry.aliases {
                index.register(alias, &entry.name);
            }
        }

        index
    }

    /// Returns false when the key was already taken.
    pub fn register(&mut self, alias: &str, canonical: &str) -> bool {
        let key = alias.trim().to_lowercase();
        if key.is_empty() || self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, canonical.to_string());
        true
    }

    pub fn canonical(&self, alias: &str) -> Option<&str> {
        self.entries.get(&alias.trim().to_lowercase()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct Candidate<'a> {
    canonical: &'a str,
    pattern: Regex,
}

/// Annotates prose against one `EntityIndex`.
pub struct Annotator<'a> {
    index: &'a EntityIndex,
    candidates: Vec<Candidate<'a>>,
    annotate_in_codeblocks: bool,
}

fn breaks_link_syntax(s: &str) -> bool {
    s.contains(['[', ']', '|', '\n'])
}

impl<'a> Annotator<'a> {
    pub fn new(index: &'a EntityIndex, settings: &Settings) -> Annotator<'a> {
        let candidates = index
            .entries
            .iter()
            .filter(|(key, _)| key.chars().count() > 1)
            .filter(|(key, canonical)| !breaks_link_syntax(key) && !breaks_link_syntax(canonical))
            // longest first, so "rob" can never take characters from "robert smith"
            .sorted_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)))
            .filter_map(|(key, canonical)| {
                let pattern = RegexBuilder::new(&regex::escape(key))
                    .case_insensitive(true)
                    .build()
                    .map_err(|err| debug!(key = %key, "skipping entity key: {err}"))
                    .ok()?;

                Some(Candidate {
                    canonical: canonical.as_str(),
                    pattern,
                })
            })
            .collect();

        Annotator {
            index,
            candidates,
            annotate_in_codeblocks: settings.annotate_in_codeblocks,
        }
    }

    /// Link the first valid mention of every entity in `text`.
    pub fn annotate(&self, text: &str) -> String {
        self.annotate_after("", text)
    }

    /// Annotate `text` that is about to be added to `existing`.
    ///
    /// Entities `existing` already links with wiki syntax are left alone, so
    /// repeated appends to one document link each entity once.
    pub fn annotate_after(&self, existing: &str, text: &str) -> String {
        let mut annotated = self.already_linked(existing);
        annotated.extend(self.already_linked(text));
        let mut text = text.to_string();
        let mut ranges = LinkRanges::new(&text, self.annotate_in_codeblocks);

        for candidate in &self.candidates {
            if annotated.contains(candidate.canonical) {
                continue;
            }

            let Some(span) = first_valid_match(&text, &candidate.pattern, &ranges) else {
                continue;
            };
            let Some(matched) = span.slice(&text) else {
                continue;
            };

            let link = if matched == candidate.canonical {
                format!("[[{}]]", candidate.canonical)
            } else {
                format!("[[{}|{}]]", candidate.canonical, matched)
            };
            trace!(entity = candidate.canonical, at = span.start, "annotating");

            text = splice(&text, [Edit::replace(span, link)]).into_owned();
            annotated.insert(candidate.canonical);
            ranges = LinkRanges::new(&text, self.annotate_in_codeblocks);
        }

        text
    }

    /// Like `annotate`, but `None` when no link was inserted.
    pub fn annotate_changed(&self, text: &str) -> Option<String> {
        let annotated = self.annotate(text);
        (annotated != text).then_some(annotated)
    }

    /// Canonical names that `text` already links to with wiki syntax.
    fn already_linked(&self, text: &str) -> HashSet<&'a str> {
        let index = self.index;
        wiki_link_targets(text)
            .into_iter()
            .filter_map(|target| {
                let name = target.rsplit('/').next().unwrap_or(&target);
                let name = name.strip_suffix(".md").unwrap_or(name);
                index.canonical(&target).or_else(|| index.canonical(name))
            })
            .collect()
    }
}

/// Annotate `text` with default settings.
pub fn annotate(index: &EntityIndex, text: &str) -> String {
    Annotator::new(index, &Settings::default()).annotate(text)
}

fn is_word_bounded(text: &str, span: &Span) -> bool {
    let before = text[..span.start].chars().next_back();
    let after = text[span.end..].chars().next();

    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

fn first_valid_match(text: &str, pattern: &Regex, ranges: &LinkRanges) -> Option<Span> {
    let mut from = 0;
    while from <= text.len() {
        let found = pattern.find_at(text, from)?;
        let span = Span::from(found.range());

        if !span.is_empty() && is_word_bounded(text, &span) && !ranges.overlaps(&span) {
            return Some(span);
        }

        from = found.start()
            + text[found.start()..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
    }
    None
}
