use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use marginalia::annotate::Annotator;
use marginalia::config::Settings;
use marginalia::rewrite::ReplacementMap;
use marginalia::transcript::{append_block, read_document};
use marginalia::vault::Vault;

#[derive(Parser, Debug)]
#[command(name = "marginalia", version, about = "Keep vault links intact around generated content")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Point links at converted resources
    Rewrite {
        /// Vault root
        root: PathBuf,
        /// OLD=NEW resource paths, relative to the root or absolute
        #[arg(long = "map", value_name = "OLD=NEW", required = true)]
        mappings: Vec<String>,
        /// Only rewrite this document; defaults to every document linking an OLD path
        #[arg(long)]
        document: Option<PathBuf>,
        /// Write the result back instead of printing it
        #[arg(long)]
        write: bool,
    },
    /// Link known notes in generated prose
    Annotate {
        /// Vault root
        root: PathBuf,
        /// Document the prose is destined for; never linked to itself
        document: PathBuf,
        /// Read the prose from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
        /// Append the annotated prose to the document
        #[arg(long)]
        append: bool,
    },
    /// Print the entity index of a vault
    Entities {
        root: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn vault_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn parse_mappings(root: &Path, mappings: &[String]) -> anyhow::Result<ReplacementMap> {
    mappings
        .iter()
        .map(|mapping| -> anyhow::Result<(PathBuf, PathBuf)> {
            let (old, new) = mapping
                .split_once('=')
                .ok_or(anyhow!("Mapping {mapping:?} is not OLD=NEW"))?;
            Ok((
                vault_path(root, Path::new(old.trim())),
                vault_path(root, Path::new(new.trim())),
            ))
        })
        .collect()
}

fn canonical_root(root: &Path) -> anyhow::Result<PathBuf> {
    std::fs::canonicalize(root).with_context(|| format!("No vault at {}", root.display()))
}

fn load(root: &Path) -> anyhow::Result<(Settings, Vault)> {
    let settings = Settings::new(root)?;
    let vault = Vault::construct_vault(&settings, root)
        .with_context(|| format!("Failed to read vault at {}", root.display()))?;
    Ok((settings, vault))
}

fn rewrite(
    root: &Path,
    mappings: &[String],
    document: Option<&Path>,
    write: bool,
) -> anyhow::Result<()> {
    let (_settings, mut vault) = load(root)?;
    let replacements = parse_mappings(root, mappings)?;
    for new in replacements.values() {
        vault.add_resource(new.clone());
    }

    let documents = match document {
        Some(document) => {
            let document = vault_path(root, document);
            if !vault.md_files.contains_key(&document) {
                bail!("{} is not a document of the vault", document.display());
            }
            vec![document]
        }
        None => vault
            .select_referencing_documents(&replacements)
            .into_iter()
            .map(Path::to_path_buf)
            .collect(),
    };

    for document in documents {
        match vault.rewrite_document(&document, &replacements) {
            None => info!(document = %document.display(), "unchanged"),
            Some(text) if write => {
                std::fs::write(&document, text)
                    .with_context(|| format!("Failed to write {}", document.display()))?;
                info!(document = %document.display(), "rewrote links");
            }
            Some(text) => {
                println!("==> {} <==", document.display());
                print!("{text}");
            }
        }
    }

    Ok(())
}

fn annotate(root: &Path, document: &Path, input: Option<&Path>, append: bool) -> anyhow::Result<()> {
    let (settings, vault) = load(root)?;
    let document = vault_path(root, document);

    let prose = match input {
        Some(input) => std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?,
        None => {
            let mut prose = String::new();
            std::io::stdin().read_to_string(&mut prose)?;
            prose
        }
    };

    let current = read_document(&document)?;

    let index = vault.entity_index(Some(&document));
    let annotated = Annotator::new(&index, &settings).annotate_after(&current, &prose);

    if !append {
        print!("{annotated}");
        return Ok(());
    }

    std::fs::write(&document, append_block(&current, &annotated))
        .with_context(|| format!("Failed to write {}", document.display()))?;
    info!(document = %document.display(), "appended annotated prose");

    Ok(())
}

fn entities(root: &Path, json: bool) -> anyhow::Result<()> {
    let (_settings, vault) = load(root)?;
    let index = vault.entity_index(None);

    if json {
        println!("{}", serde_json::to_string_pretty(&index)?);
    } else {
        for (alias, canonical) in index.iter() {
            println!("{alias}\t{canonical}");
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Rewrite {
            root,
            mappings,
            document,
            write,
        } => rewrite(&canonical_root(&root)?, &mappings, document.as_deref(), write),
        Command::Annotate {
            root,
            document,
            input,
            append,
        } => annotate(&canonical_root(&root)?, &document, input.as_deref(), append),
        Command::Entities { root, json } => entities(&canonical_root(&root)?, json),
    }
}
