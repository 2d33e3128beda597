//! Logical template keys and path normalization
//!
//! A [`LogicalKey`] is a relative template path with its template extension
//! removed and separators normalized to `/`, so `blog\post.njk` and
//! `blog/post.liquid` both map to `blog/post`. Files that share a key are the
//! same overridable unit regardless of extension.
//!
//! Extensions are recognized from [`TEMPLATE_EXTENSIONS`], an explicit table
//! checked longest suffix first so the compound `.11ty.js` always wins over
//! anything shorter.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

/// A recognized template file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateExtension {
    /// Suffix including the leading dot, e.g. `.njk`.
    pub suffix: &'static str,
    /// Probe order when testing candidates; lower goes first.
    pub priority: u8,
    /// Whether the suffix matches regardless of ASCII case.
    pub case_insensitive: bool,
}

/// Recognized template extensions in probe order.
///
/// The compound script-template suffix comes first; single suffixes follow in
/// a fixed order.
pub const TEMPLATE_EXTENSIONS: &[TemplateExtension] = &[
    TemplateExtension {
        suffix: ".11ty.js",
        priority: 0,
        case_insensitive: false,
    },
    TemplateExtension {
        suffix: ".njk",
        priority: 1,
        case_insensitive: true,
    },
    TemplateExtension {
        suffix: ".liquid",
        priority: 2,
        case_insensitive: true,
    },
    TemplateExtension {
        suffix: ".html",
        priority: 3,
        case_insensitive: true,
    },
    TemplateExtension {
        suffix: ".md",
        priority: 4,
        case_insensitive: true,
    },
];

impl TemplateExtension {
    fn matches(&self, name: &str) -> bool {
        if name.len() <= self.suffix.len() {
            return false;
        }
        let split = name.len() - self.suffix.len();
        if !name.is_char_boundary(split) {
            return false;
        }
        let tail = &name[split..];
        if self.case_insensitive {
            tail.eq_ignore_ascii_case(self.suffix)
        } else {
            tail == self.suffix
        }
    }
}

/// Extensions sorted for stripping: longest suffix first, ties by priority.
fn stripping_order() -> Vec<&'static TemplateExtension> {
    let mut order: Vec<_> = TEMPLATE_EXTENSIONS.iter().collect();
    order.sort_by(|a, b| {
        b.suffix
            .len()
            .cmp(&a.suffix.len())
            .then(a.priority.cmp(&b.priority))
    });
    order
}

/// Extensions sorted for existence probing: by priority.
pub fn probe_order() -> Vec<&'static TemplateExtension> {
    let mut order: Vec<_> = TEMPLATE_EXTENSIONS.iter().collect();
    order.sort_by_key(|ext| ext.priority);
    order
}

/// Return the recognized extension of a file name, if any.
pub fn template_extension(name: &str) -> Option<&'static TemplateExtension> {
    stripping_order().into_iter().find(|ext| ext.matches(name))
}

/// Strip a recognized template extension from a `/`-separated path.
///
/// Returns `None` when the path has no recognized extension.
pub fn strip_known_extension(path: &str) -> Option<&str> {
    let ext = template_extension(path)?;
    Some(&path[..path.len() - ext.suffix.len()])
}

/// Render a relative path with `/` separators on every platform.
pub fn to_posix(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Check that a path is relative and never escapes its root.
pub fn ensure_contained(path: &Path) -> Result<()> {
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => {
                return Err(Error::Path {
                    message: format!(
                        "Path '{}' must be relative and must not contain '..'",
                        path.display()
                    ),
                })
            }
        }
    }
    Ok(())
}

/// An extension-independent identifier for an overridable template unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LogicalKey(String);

impl LogicalKey {
    /// Build a key from a template path relative to a tier root.
    ///
    /// Returns `None` when the path has no recognized template extension or
    /// reduces to an empty key.
    pub fn from_relative(path: &Path) -> Option<Self> {
        let posix = to_posix(path);
        let stripped = strip_known_extension(&posix)?;
        if stripped.is_empty() || stripped.ends_with('/') {
            return None;
        }
        Some(Self(stripped.to_string()))
    }

    /// Build a key from a user-supplied name such as `blog/post`.
    ///
    /// A trailing template extension is stripped if present.
    pub fn parse(name: &str) -> Result<Self> {
        ensure_contained(Path::new(name))?;
        let posix = to_posix(Path::new(name));
        let stripped = strip_known_extension(&posix).unwrap_or(&posix);
        if stripped.is_empty() {
            return Err(Error::Path {
                message: format!("'{}' is not a valid template key", name),
            });
        }
        Ok(Self(stripped.to_string()))
    }

    /// The key as a `/`-separated string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Candidate file paths for this key, in probe order.
    pub fn candidates(&self) -> impl Iterator<Item = PathBuf> + '_ {
        probe_order()
            .into_iter()
            .map(move |ext| PathBuf::from(format!("{}{}", self.0, ext.suffix)))
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LogicalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_compound_before_simple() {
        assert_eq!(strip_known_extension("feed.11ty.js"), Some("feed"));
        assert_eq!(strip_known_extension("post.njk"), Some("post"));
        assert_eq!(strip_known_extension("page.liquid"), Some("page"));
        assert_eq!(strip_known_extension("index.html"), Some("index"));
        assert_eq!(strip_known_extension("about.md"), Some("about"));
    }

    #[test]
    fn test_strip_unknown_extension() {
        assert_eq!(strip_known_extension("script.js"), None);
        assert_eq!(strip_known_extension("style.css"), None);
        assert_eq!(strip_known_extension("README"), None);
    }

    #[test]
    fn test_strip_is_case_insensitive_for_simple_suffixes() {
        assert_eq!(strip_known_extension("Post.NJK"), Some("Post"));
        assert_eq!(strip_known_extension("feed.11TY.JS"), None);
    }

    #[test]
    fn test_key_from_nested_path() {
        let key = LogicalKey::from_relative(Path::new("blog/post.njk")).unwrap();
        assert_eq!(key.as_str(), "blog/post");
    }

    #[test]
    fn test_same_key_for_different_extensions() {
        let a = LogicalKey::from_relative(Path::new("post.njk")).unwrap();
        let b = LogicalKey::from_relative(Path::new("post.11ty.js")).unwrap();
        let c = LogicalKey::from_relative(Path::new("post.md")).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_key_rejects_bare_extension() {
        assert!(LogicalKey::from_relative(Path::new(".njk")).is_none());
        assert!(LogicalKey::from_relative(Path::new("partials/.njk")).is_none());
    }

    #[test]
    fn test_candidates_compound_first() {
        let key = LogicalKey::parse("base").unwrap();
        let candidates: Vec<_> = key.candidates().collect();
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("base.11ty.js"),
                PathBuf::from("base.njk"),
                PathBuf::from("base.liquid"),
                PathBuf::from("base.html"),
                PathBuf::from("base.md"),
            ]
        );
    }

    #[test]
    fn test_parse_strips_extension_and_rejects_escape() {
        assert_eq!(LogicalKey::parse("blog/post.njk").unwrap().as_str(), "blog/post");
        assert!(LogicalKey::parse("../secret").is_err());
        assert!(LogicalKey::parse("").is_err());
    }

    #[test]
    fn test_to_posix() {
        let path: PathBuf = ["a", "b", "c.njk"].iter().collect();
        assert_eq!(to_posix(&path), "a/b/c.njk");
    }

    #[test]
    fn test_ensure_contained() {
        assert!(ensure_contained(Path::new("core")).is_ok());
        assert!(ensure_contained(Path::new("a/./b")).is_ok());
        assert!(ensure_contained(Path::new("../core")).is_err());
        assert!(ensure_contained(Path::new("/core")).is_err());
    }
}
