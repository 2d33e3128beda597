//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Following CLI recommendations,
//! errors should tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use theme_overlay::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Configuration file not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::config_not_found(path));
//! ```

use std::path::Path;

use crate::defaults::{CONFIG_ENV, CONFIG_FILE};

/// Generate an error for when the configuration file is not found.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Create a {CONFIG_FILE} file in your site root with at least `core_src: <dir>`\n\
         hint: Use --config to specify a different path\n\
         hint: Set the {CONFIG_ENV} environment variable",
        path = path.display()
    )
}

/// Generate an error for when the core tree is missing.
pub fn core_missing(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Core source directory not found: {path}\n\n\
         hint: Check `core_src` in {CONFIG_FILE}; relative paths are resolved against the config file\n\
         hint: Install the shared theme package if it lives under node_modules",
        path = path.display()
    )
}

/// Generate an error for a pass that finished with failed file operations.
pub fn sync_failures(count: usize) -> anyhow::Error {
    let noun = if count == 1 { "operation" } else { "operations" };
    anyhow::anyhow!(
        "{count} file {noun} failed during sync\n\n\
         hint: Re-run with --log-level debug to see every copy and delete\n\
         hint: Check permissions on the site's _includes and _layouts directories"
    )
}

/// Generate an error for an unknown template key.
///
/// Suggests a close match from the keys core and site provide.
pub fn template_not_found(key: &str, known: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(key, known)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Template not found: {key}{did_you_mean}\n\n\
         hint: Keys are paths below _includes or _layouts without the extension, e.g. 'blog/post'\n\
         hint: Use --kind include to look in _includes"
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[a_len][b_len]
}
