use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::config::{LinkFormat, Settings};
use crate::rewrite::{DisplayResolver, LinkResolver, ReplacementMap};
use crate::test_utils::{create_test_vault, create_test_vault_dir};
use crate::vault::{SyntaxKind, Vault};

fn write(dir: &Path, rel: &str, text: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

fn vault_with(settings: &Settings, dir: &PathBuf) -> Vault {
    Vault::construct_vault(settings, dir).expect("Failed to construct vault")
}

#[test]
fn construct_vault_records_documents_and_resources() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
        write(dir, "note.md", "![[photo.heic]]");
        write(dir, "img/photo.heic", "binary");
        write(dir, ".obsidian/workspace.md", "hidden");
    });

    assert_eq!(vault.document_count(), 1);
    assert!(vault.contains_resource(&vault_dir.join("img/photo.heic")));
    assert!(vault.contains_resource(&vault_dir.join("note.md")));
    assert!(!vault.contains_resource(&vault_dir.join(".obsidian/workspace.md")));

    let note = vault_dir.join("note.md");
    let occurrences = vault.select_occurrences(Some(&note));
    assert_eq!(occurrences.len(), 1);
    assert_eq!(occurrences[0].1.kind, SyntaxKind::EmbeddedResource);
}

#[test]
fn resolve_by_unique_file_name() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
        write(dir, "daily/today.md", "");
        write(dir, "attachments/photo.heic", "");
    });

    let from = vault_dir.join("daily/today.md");
    assert_eq!(
        vault.resolve("photo.heic", &from),
        Some(vault_dir.join("attachments/photo.heic"))
    );
    assert_eq!(
        vault.resolve("PHOTO.heic", &from),
        Some(vault_dir.join("attachments/photo.heic"))
    );
    assert_eq!(vault.resolve("nothing.png", &from), None);
}

#[test]
fn resolve_relative_rooted_and_encoded() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
        write(dir, "notes/day.md", "");
        write(dir, "notes/img/my photo.heic", "");
        write(dir, "img/my photo.heic", "");
    });

    let from = vault_dir.join("notes/day.md");
    assert_eq!(
        vault.resolve("./img/my%20photo.heic", &from),
        Some(vault_dir.join("notes/img/my photo.heic"))
    );
    assert_eq!(
        vault.resolve("../img/my photo.heic", &from),
        Some(vault_dir.join("img/my photo.heic"))
    );
    assert_eq!(
        vault.resolve("/img/my photo.heic", &from),
        Some(vault_dir.join("img/my photo.heic"))
    );
    // root relative wins over document relative
    assert_eq!(
        vault.resolve("img/my photo.heic", &from),
        Some(vault_dir.join("img/my photo.heic"))
    );
}

#[test]
fn resolve_notes_without_extension() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
        write(dir, "people/Robert Smith.md", "");
        write(dir, "index.md", "");
    });

    let from = vault_dir.join("index.md");
    assert_eq!(
        vault.resolve("Robert Smith", &from),
        Some(vault_dir.join("people/Robert Smith.md"))
    );
    assert_eq!(
        vault.resolve("people/Robert Smith", &from),
        Some(vault_dir.join("people/Robert Smith.md"))
    );
    assert_eq!(vault.resolve("https://example.com/a.png", &from), None);
}

#[test]
fn resolve_ambiguous_name_prefers_shallowest() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
        write(dir, "index.md", "");
        write(dir, "a/b/photo.png", "");
        write(dir, "z/photo.png", "");
    });

    assert_eq!(
        vault.resolve("photo.png", &vault_dir.join("index.md")),
        Some(vault_dir.join("z/photo.png"))
    );
}

#[test]
fn display_target_formats() {
    let (_temp_dir, vault_dir) = create_test_vault_dir();
    write(&vault_dir, "notes/day.md", "");
    write(&vault_dir, "img/photo.jpg", "");
    write(&vault_dir, "a/dup.jpg", "");
    write(&vault_dir, "b/dup.jpg", "");
    write(&vault_dir, "people/Alice.md", "");

    let from = vault_dir.join("notes/day.md");

    let shortest = vault_with(&Settings::default(), &vault_dir);
    assert_eq!(shortest.display_target(&vault_dir.join("img/photo.jpg"), &from), "photo.jpg");
    assert_eq!(shortest.display_target(&vault_dir.join("a/dup.jpg"), &from), "a/dup.jpg");
    assert_eq!(shortest.display_target(&vault_dir.join("people/Alice.md"), &from), "Alice");
    // not yet in the vault, so trivially unique
    assert_eq!(shortest.display_target(&vault_dir.join("img/new.jpg"), &from), "new.jpg");

    let relative = vault_with(
        &Settings {
            link_format: LinkFormat::Relative,
            ..Settings::default()
        },
        &vault_dir,
    );
    assert_eq!(
        relative.display_target(&vault_dir.join("img/photo.jpg"), &from),
        "../img/photo.jpg"
    );
    assert_eq!(
        relative.display_target(&vault_dir.join("people/Alice.md"), &from),
        "../people/Alice"
    );

    let absolute = vault_with(
        &Settings {
            link_format: LinkFormat::Absolute,
            ..Settings::default()
        },
        &vault_dir,
    );
    assert_eq!(
        absolute.display_target(&vault_dir.join("img/photo.jpg"), &from),
        "img/photo.jpg"
    );
}

#[test]
fn rewrite_document_end_to_end() {
    let text = "# Day\n\n![[photo.heic|300x200]]\n\n![alt](../img/photo.heic)\n\n![[other.heic]] [[Alice]]\n";
    let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
        write(dir, "notes/day.md", text);
        write(dir, "img/photo.heic", "");
        write(dir, "img/other.heic", "");
        write(dir, "Alice.md", "");
    });

    let mut replacements = ReplacementMap::new();
    replacements.insert(vault_dir.join("img/photo.heic"), vault_dir.join("img/photo.jpg"));

    let day = vault_dir.join("notes/day.md");
    let rewritten = vault.rewrite_document(&day, &replacements).unwrap();
    assert_eq!(
        rewritten,
        "# Day\n\n![[photo.jpg|300x200]]\n\n![alt](photo.jpg)\n\n![[other.heic]] [[Alice]]\n"
    );

    assert_eq!(vault.select_referencing_documents(&replacements), vec![day.as_path()]);
    assert_eq!(vault.rewrite_document(&day, &ReplacementMap::new()), None);
}

#[test]
fn codeblock_occurrences_follow_settings() {
    let text = "```\n![[a.png]]\n```\n";
    let (_temp_dir, vault_dir) = create_test_vault_dir();
    write(&vault_dir, "note.md", text);
    let path = vault_dir.join("note.md");

    let default = vault_with(&Settings::default(), &vault_dir);
    assert!(default.select_occurrences(Some(&path)).is_empty());

    let including = vault_with(
        &Settings {
            references_in_codeblocks: true,
            ..Settings::default()
        },
        &vault_dir,
    );
    assert_eq!(including.select_occurrences(Some(&path)).len(), 1);
}

#[test]
fn corpus_and_entity_index() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
        write(dir, "a/Alice.md", "---\naliases: [Al, Ally]\n---\nAlice's note");
        write(dir, "b/Bob.md", "---\naliases: alice\n---\n");
        write(dir, "journal.md", "");
        write(dir, "img/photo.png", "");
    });

    let corpus = vault.corpus();
    let names = corpus.iter().map(|entry| entry.name.as_str()).collect_vec();
    assert_eq!(names, vec!["Alice", "Bob", "journal"]);
    assert_eq!(corpus[0].aliases, vec!["Al", "Ally"]);

    let index = vault.entity_index(Some(&vault_dir.join("journal.md")));
    assert_eq!(index.canonical("alice"), Some("Alice"));
    assert_eq!(index.canonical("ally"), Some("Alice"));
    assert_eq!(index.canonical("bob"), Some("Bob"));
    assert_eq!(index.canonical("journal"), None);
    assert_eq!(index.len(), 4);
}
