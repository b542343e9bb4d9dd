use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::language_utils;

// @module: File and directory utilities

/// Extensions treated as Markdown/MDX documents
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "mdx"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Whether the path has a Markdown/MDX extension
    pub fn is_markdown_file<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext.as_str()))
    }

    // @generates: Output path for a translated document
    // @params: input_file, target_language
    // `chapter.mdx` translated to `ar` becomes `chapter.ar.mdx` next to it
    pub fn generate_output_path<P: AsRef<Path>>(input_file: P, target_language: &str) -> PathBuf {
        let input_file = input_file.as_ref();

        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
        let extension = input_file
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_else(|| "md".to_string());

        input_file.with_file_name(format!("{}.{}.{}", stem, target_language, extension))
    }

    /// Whether the file is itself the output of a translation into some language
    pub fn is_translated_output<P: AsRef<Path>>(path: P) -> bool {
        let stem = path.as_ref().file_stem().unwrap_or_default().to_string_lossy();
        match stem.rsplit_once('.') {
            Some((_, suffix)) => {
                suffix.len() >= 2
                    && suffix.len() <= 3
                    && language_utils::validate_language_code(suffix).is_ok()
            }
            None => false,
        }
    }

    /// Find source Markdown/MDX documents under a directory, sorted.
    ///
    /// Files that are themselves translations (`name.ar.mdx`) are skipped.
    pub fn find_markdown_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && Self::is_markdown_file(path) && !Self::is_translated_output(path) {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    // @reads: Whole file as UTF-8
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        let path = path.as_ref();
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
    }

    // @writes: File content, creating parent directories
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Self::ensure_dir(parent)?;
        }
        fs::write(path, content).with_context(|| format!("Failed to write file: {}", path.display()))
    }
}
