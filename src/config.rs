use std::path::Path;

use anyhow::anyhow;
use config::{Config, File};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// How a rewritten link expresses its new target
    pub link_format: LinkFormat,
    pub references_in_codeblocks: bool,
    pub annotate_in_codeblocks: bool,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub enum LinkFormat {
    /// File name when it is unique in the vault, otherwise the root relative path
    Shortest,
    /// Path relative to the linking document's folder
    Relative,
    /// Path relative to the vault root
    Absolute,
}

impl Settings {
    pub fn new(root_dir: &Path) -> anyhow::Result<Settings> {
        let expanded = shellexpand::tilde("~/.config/marginalia/settings");
        let settings = Config::builder()
            .add_source(File::with_name(&expanded).required(false))
            .add_source(
                File::with_name(&format!(
                    "{}/.marginalia",
                    root_dir
                        .to_str()
                        .ok_or(anyhow!("Can't convert root_dir to str"))?
                ))
                .required(false),
            )
            .set_default("link_format", "Shortest")?
            .set_default("references_in_codeblocks", false)?
            .set_default("annotate_in_codeblocks", false)?
            .build()
            .map_err(|err| anyhow!("Build err: {err}"))?;

        let settings = settings.try_deserialize::<Settings>()?;

        anyhow::Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            link_format: LinkFormat::Shortest,
            references_in_codeblocks: false,
            annotate_in_codeblocks: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_without_files() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::new(temp_dir.path()).unwrap();
        assert_eq!(settings.link_format, LinkFormat::Shortest);
        assert!(!settings.references_in_codeblocks);
        assert!(!settings.annotate_in_codeblocks);
    }

    #[test]
    fn test_vault_file_overrides() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(".marginalia.toml"),
            "link_format = \"Relative\"\nannotate_in_codeblocks = true\n",
        )
        .unwrap();

        let settings = Settings::new(temp_dir.path()).unwrap();
        assert_eq!(settings.link_format, LinkFormat::Relative);
        assert!(settings.annotate_in_codeblocks);
        assert!(!settings.references_in_codeblocks);
    }
}
