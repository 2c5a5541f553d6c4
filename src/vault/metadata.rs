use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// A frontmatter value that may be written as a single string or a list.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// Raw frontmatter structure for parsing.
/// Captures both the `aliases` key and the legacy singular `alias` key.
#[derive(Deserialize, Debug, Clone)]
struct RawFrontmatter {
    #[serde(default)]
    aliases: Option<OneOrMany>,
    #[serde(default)]
    alias: Option<OneOrMany>,
}

/// Parsed metadata from Markdown frontmatter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MDMetadata {
    aliases: Vec<String>,
}

impl MDMetadata {
    pub fn new(text: &str) -> Option<MDMetadata> {
        // find text between --- at the beginning of the file

        static RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^---\r?\n(?<metadata>(\n|.)*?)\r?\n---").unwrap());

        let metadata_match = RE.captures_iter(text).next()?.name("metadata")?;

        let raw: RawFrontmatter = serde_yaml::from_str(metadata_match.as_str()).ok()?;

        let aliases = raw
            .aliases
            .into_iter()
            .chain(raw.alias)
            .flat_map(OneOrMany::into_vec)
            .map(|alias| alias.trim().to_string())
            .filter(|alias| !alias.is_empty())
            .collect();

        Some(MDMetadata { aliases })
    }

    /// Declared aliases, in the order they were written (`aliases` before `alias`).
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }
}
