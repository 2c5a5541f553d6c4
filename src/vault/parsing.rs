//! Regex based extraction of link syntax from Markdown text.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{LinkTarget, Occurrence, Span, Spanned, SyntaxKind};

static WIKI_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?<embed>!)?\[\[(?<link>[^\[\]\n]+?)\]\]").expect("Wiki Link Not Constructing")
}); // [[link]] or ![[embed]] without any [ or ] inside

static MD_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?<embed>!)?\[(?<display>[^\[\]\n]*)\]\((?<link><[^<>\n]*>|(?:[^()\n]|\([^()\n]*\))*)\)")
        .expect("MD Link Not Constructing")
}); // [display](target), allowing one level of balanced parentheses in the target

/// A fenced or inline code region; link syntax inside it is literal text.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct MDCodeBlock {
    pub span: Span,
}

impl MDCodeBlock {
    pub fn new(text: &str) -> impl Iterator<Item = MDCodeBlock> + '_ {
        static FENCED_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"(?ms)^[ \t]*(```|~~~).*?(?:^[ \t]*(```|~~~)[^\n]*$|\z)").unwrap());
        static INLINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`\n]+`").unwrap());

        let fenced = FENCED_RE
            .find_iter(text)
            .map(|m| Span::from(m.range()))
            .collect_vec();

        let inline = INLINE_RE
            .find_iter(text)
            .map(|m| Span::from(m.range()))
            .filter(|span| !fenced.iter().any(|block| block.includes(span)))
            .collect_vec();

        fenced
            .into_iter()
            .chain(inline)
            .map(|span| MDCodeBlock { span })
    }
}

impl Spanned for MDCodeBlock {
    fn span(&self) -> &Span {
        &self.span
    }
}

fn occurrence_from_captures(captures: Captures, markdown: bool) -> Option<Occurrence> {
    let full = captures.get(0)?;
    let link = captures.name("link")?.as_str();
    let link = if markdown {
        link.strip_prefix('<')
            .and_then(|inner| inner.strip_suffix('>'))
            .unwrap_or(link)
            .trim()
    } else {
        link
    };

    if link.is_empty() || LinkTarget::parse(link).is_external() {
        return None;
    }

    let kind = match (markdown, captures.name("embed").is_some()) {
        (true, _) => SyntaxKind::InlineReference,
        (false, true) => SyntaxKind::EmbeddedResource,
        (false, false) => SyntaxKind::WikiLink,
    };

    Some(Occurrence::new(link, full.range(), kind))
}

/// Extract every link and embed occurrence in `text`, ordered by position.
///
/// External targets (URLs, `mailto:`, `data:`) are not occurrences. Unless
/// `include_codeblocks` is set, syntax inside code is ignored.
pub fn parse_occurrences(text: &str, include_codeblocks: bool) -> Vec<Occurrence> {
    let code_blocks = if include_codeblocks {
        vec![]
    } else {
        MDCodeBlock::new(text).collect_vec()
    };

    let wiki_links = WIKI_LINK_RE
        .captures_iter(text)
        .flat_map(|captures| occurrence_from_captures(captures, false))
        .collect_vec();

    let md_links = MD_LINK_RE
        .captures_iter(text)
        .flat_map(|captures| occurrence_from_captures(captures, true))
        .filter(|md| !wiki_links.iter().any(|wiki| wiki.span.overlaps(&md.span)))
        .collect_vec();

    wiki_links
        .into_iter()
        .chain(md_links)
        .filter(|it| !code_blocks.iter().any(|codeblock| codeblock.includes(it)))
        .sorted_by_key(|it| it.span)
        .collect()
}

/// Sorted, merged set of spans that are already covered by syntax.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkRanges(Vec<Span>);

impl LinkRanges {
    /// Spans of every link annotation in `text`, including external ones,
    /// plus code regions unless `include_codeblocks` is set.
    pub fn new(text: &str, include_codeblocks: bool) -> LinkRanges {
        static ANY_WIKI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!?\[\[[^\n]*?\]\]").unwrap());

        let code = if include_codeblocks {
            vec![]
        } else {
            MDCodeBlock::new(text).map(|block| block.span).collect_vec()
        };

        // same grammar as occurrence parsing, so parenthesized targets are covered whole
        let spans = ANY_WIKI_RE
            .find_iter(text)
            .chain(MD_LINK_RE.find_iter(text))
            .map(|m| Span::from(m.range()))
            .chain(code);

        LinkRanges::from_spans(spans)
    }

    pub fn from_spans(spans: impl IntoIterator<Item = Span>) -> LinkRanges {
        let mut merged: Vec<Span> = Vec::new();
        for span in spans.into_iter().sorted() {
            match merged.last_mut() {
                Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
                _ => merged.push(span),
            }
        }
        LinkRanges(merged)
    }

    /// Whether `span` shares at least one byte with a covered range.
    pub fn overlaps(&self, span: &Span) -> bool {
        let idx = self.0.partition_point(|range| range.end <= span.start);
        self.0
            .get(idx)
            .is_some_and(|range| range.start < span.end.max(span.start + 1))
    }

    pub fn spans(&self) -> &[Span] {
        &self.0
    }
}

/// Targets of all wiki links in `text`, without subpath or display suffix.
pub fn wiki_link_targets(text: &str) -> Vec<String> {
    WIKI_LINK_RE
        .captures_iter(text)
        .flat_map(|captures| captures.name("link"))
        .map(|link| LinkTarget::parse(link.as_str()).target)
        .filter(|target| !target.is_empty())
        .collect()
}
