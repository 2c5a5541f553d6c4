//! Link rewriting after a resource has been replaced by another.
//!
//! Only the target portion of each affected occurrence is rewritten. Display
//! text, subpaths and `|` suffixes (sizes, styles) are carried over verbatim,
//! and occurrences that do not resolve to a replaced resource are never
//! touched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use tracing::{debug, trace};

use crate::splice::{splice, Edit};
use crate::vault::{LinkTarget, Occurrence, Span, SyntaxKind};

/// Old resource identity to new resource identity.
pub type ReplacementMap = HashMap<PathBuf, PathBuf>;

/// Resolves a bare link target, as written in `from`, to the resource it points at.
pub trait LinkResolver {
    fn resolve(&self, target: &str, from: &Path) -> Option<PathBuf>;
}

impl<F> LinkResolver for F
where
    F: Fn(&str, &Path) -> Option<PathBuf>,
{
    fn resolve(&self, target: &str, from: &Path) -> Option<PathBuf> {
        self(target, from)
    }
}

/// Expresses a resource as link target text relative to the document `from`.
pub trait DisplayResolver {
    fn display_target(&self, resource: &Path, from: &Path) -> String;
}

impl<F> DisplayResolver for F
where
    F: Fn(&Path, &Path) -> String,
{
    fn display_target(&self, resource: &Path, from: &Path) -> String {
        self(resource, from)
    }
}

/// Rewrite every occurrence in `text` whose target resolves to a key of `replacements`.
///
/// `occurrences` must have been parsed from this exact `text`. Returns `None`
/// when nothing changed, so the caller can skip writing the document.
pub fn rewrite_links(
    text: &str,
    document: &Path,
    occurrences: &[Occurrence],
    replacements: &ReplacementMap,
    resolver: &impl LinkResolver,
    display: &impl DisplayResolver,
) -> Option<String> {
    if replacements.is_empty() {
        return None;
    }

    let edits = occurrences
        .iter()
        .filter_map(|occurrence| {
            link_edit(text, document, occurrence, replacements, resolver, display)
        })
        .collect_vec();

    debug!(
        document = %document.display(),
        edits = edits.len(),
        "rewriting links"
    );

    let new_text = splice(text, edits);
    if new_text.as_ref() == text {
        None
    } else {
        Some(new_text.into_owned())
    }
}

fn link_edit(
    text: &str,
    document: &Path,
    occurrence: &Occurrence,
    replacements: &ReplacementMap,
    resolver: &impl LinkResolver,
    display: &impl DisplayResolver,
) -> Option<Edit> {
    let link = LinkTarget::parse(&occurrence.raw_link);
    if link.target.is_empty() || link.is_external() {
        return None;
    }

    let Some(resolved) = resolver.resolve(&link.target, document) else {
        debug!(link = %link.target, "link target did not resolve");
        return None;
    };
    let new_resource = replacements.get(&resolved)?;

    let new_target = match occurrence.kind {
        SyntaxKind::InlineReference => display
            .display_target(new_resource, document)
            .replace(' ', "%20"),
        SyntaxKind::EmbeddedResource | SyntaxKind::WikiLink => {
            display.display_target(new_resource, document)
        }
    };

    let Some(span) = target_span(text, occurrence) else {
        debug!(raw_link = %occurrence.raw_link, "could not locate link target in occurrence");
        return None;
    };

    trace!(from = %link.target, to = %new_target, "replacing link target");
    Some(Edit::replace(span, link.with_target(&new_target)))
}

/// The replaceable sub-span of an occurrence: its raw link without decoration.
///
/// Wiki grammars strip their fixed-width markers. Markdown links use the text
/// between the last `(` and the last `)` when that is the raw link (angle
/// brackets excluded), and otherwise search for the raw link verbatim, taking
/// the last match since the target follows the display text.
pub fn target_span(text: &str, occurrence: &Occurrence) -> Option<Span> {
    let full = occurrence.span.slice(text)?;
    let base = occurrence.span.start;

    match occurrence.kind.decoration() {
        Some((lead, trail)) => {
            if full.len() < lead + trail {
                return None;
            }
            let span = Span::new(base + lead, occurrence.span.end - trail);
            span.slice(text).map(|_| span)
        }
        None => {
            let parenthesized = match (full.rfind('('), full.rfind(')')) {
                (Some(open), Some(close)) if open < close => {
                    let inner = &full[open + 1..close];
                    match inner.strip_prefix('<').and_then(|i| i.strip_suffix('>')) {
                        Some(unbracketed) => Some((open + 2, unbracketed)),
                        None => Some((open + 1, inner)),
                    }
                }
                _ => None,
            };

            match parenthesized {
                Some((offset, inner)) if inner.trim() == occurrence.raw_link => {
                    Some(Span::new(base + offset, base + offset + inner.len()))
                }
                _ => full
                    .rfind(occurrence.raw_link.as_str())
                    .filter(|_| !occurrence.raw_link.is_empty())
                    .map(|idx| Span::new(base + idx, base + idx + occurrence.raw_link.len())),
            }
        }
    }
}
