//! Search paths for engines with multi-root lookup
//!
//! Engines that stop at the first match must see every site directory before
//! any core directory, so the order produced here is part of the override
//! contract. These functions are pure: they only join paths.

use std::path::{Path, PathBuf};

use crate::resolver::{INCLUDES_DIR, LAYOUTS_DIR};

/// Site includes, site layouts, core includes, core layouts.
pub fn compose_search_paths(site_root: &Path, core_root: &Path) -> Vec<PathBuf> {
    compose_layered_search_paths(&[site_root, core_root])
}

/// Includes then layouts for each root, roots in precedence order.
pub fn compose_layered_search_paths<P: AsRef<Path>>(roots: &[P]) -> Vec<PathBuf> {
    roots
        .iter()
        .flat_map(|root| {
            let root = root.as_ref();
            [root.join(INCLUDES_DIR), root.join(LAYOUTS_DIR)]
        })
        .collect()
}
