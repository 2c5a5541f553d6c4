//! marginalia: link maintenance for Markdown vaults that receive machine-generated content
//!
//! This crate provides the engine behind two edits a vault needs after
//! external tools (OCR, vision transcription, format converters) have run:
//!
//! - **Link rewriting**: after a resource has been converted (for example
//!   `photo.heic` to `photo.jpg`), rewrite every link or embed pointing at it
//!   while keeping display text and `|` suffixes such as `300x200` intact.
//! - **Entity annotation**: link the first mention of every known note in
//!   newly generated prose, case-insensitively, longest name first, never
//!   inside existing link syntax.
//!
//! # Architecture
//!
//! - [`splice`]: apply a batch of non-overlapping range edits to one text snapshot
//! - [`rewrite`]: the link rewriter and its resolver seams
//! - [`annotate`]: the entity index and annotator
//! - [`vault`]: occurrence parsing, frontmatter aliases, and a file system
//!   backed vault implementing link resolution and display
//! - [`transcript`]: merging generated blocks into a document
//! - [`config`]: configuration management and settings
//!
//! Everything except vault construction and configuration loading is pure:
//! text in, text out.
//!
//! # Usage
//!
//! ```ignore
//! use marginalia::config::Settings;
//! use marginalia::rewrite::ReplacementMap;
//! use marginalia::vault::Vault;
//!
//! let settings = Settings::default();
//! let vault = Vault::construct_vault(&settings, &vault_path)?;
//!
//! let mut replacements = ReplacementMap::new();
//! replacements.insert(vault_path.join("photo.heic"), vault_path.join("photo.jpg"));
//! if let Some(new_text) = vault.rewrite_document(&note_path, &replacements) {
//!     std::fs::write(&note_path, new_text)?;
//! }
//! ```

// Core engine
pub mod annotate;
pub mod rewrite;
pub mod splice;
pub mod transcript;

// Vault, configuration and parsing
pub mod config;
pub mod vault;

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;
