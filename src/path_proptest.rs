//! Property-based tests for logical key derivation.
//!
//! These tests use proptest to generate random template paths and verify that
//! the key invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{strip_known_extension, to_posix, LogicalKey, TEMPLATE_EXTENSIONS};
    use proptest::prelude::*;
    use std::path::{Path, PathBuf};

    fn segment() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_-]{1,12}"
    }

    fn stem() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(segment(), 1..4)
    }

    fn extension() -> impl Strategy<Value = &'static str> {
        prop::sample::select(TEMPLATE_EXTENSIONS.iter().map(|e| e.suffix).collect::<Vec<_>>())
    }

    // ============================================================================
    // Key derivation
    // ============================================================================

    proptest! {
        /// Property: every recognized extension strips back to the same key
        #[test]
        fn key_is_extension_independent(parts in stem(), a in extension(), b in extension()) {
            let base = parts.join("/");
            let key_a = LogicalKey::from_relative(Path::new(&format!("{}{}", base, a)));
            let key_b = LogicalKey::from_relative(Path::new(&format!("{}{}", base, b)));
            prop_assert_eq!(key_a.clone(), key_b);
            let key_a = key_a.unwrap();
            prop_assert_eq!(key_a.as_str(), base.as_str());
        }

        /// Property: keys never contain a backslash, whatever the separator
        #[test]
        fn key_uses_forward_slashes(parts in stem(), ext in extension()) {
            let mut path = PathBuf::new();
            for part in &parts {
                path.push(part);
            }
            path.set_file_name(format!("{}{}", parts[parts.len() - 1], ext));
            let key = LogicalKey::from_relative(&path).unwrap();
            prop_assert!(!key.as_str().contains('\\'));
            prop_assert_eq!(key.as_str().split('/').count(), parts.len());
        }

        /// Property: parsing a key is idempotent
        #[test]
        fn parse_is_idempotent(parts in stem(), ext in extension()) {
            let first = LogicalKey::parse(&format!("{}{}", parts.join("/"), ext)).unwrap();
            let second = LogicalKey::parse(first.as_str()).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Property: the first candidate is the compound script-template suffix
        #[test]
        fn candidates_cover_every_extension(parts in stem()) {
            let key = LogicalKey::parse(&parts.join("/")).unwrap();
            let candidates: Vec<String> = key.candidates().map(|p| to_posix(&p)).collect();
            prop_assert_eq!(candidates.len(), TEMPLATE_EXTENSIONS.len());
            prop_assert!(candidates[0].ends_with(".11ty.js"));
            for candidate in &candidates {
                prop_assert_eq!(strip_known_extension(candidate), Some(key.as_str()));
            }
        }
    }

    // ============================================================================
    // Rejection
    // ============================================================================

    proptest! {
        /// Property: names with unrecognized extensions never produce a key
        #[test]
        fn unknown_extension_has_no_key(parts in stem(), ext in "\\.(css|js|txt|json|svg)") {
            let path = format!("{}{}", parts.join("/"), ext);
            prop_assert!(LogicalKey::from_relative(Path::new(&path)).is_none());
        }

        /// Property: parent traversal is always rejected
        #[test]
        fn parse_rejects_parent_components(parts in stem(), depth in 1usize..3) {
            let name = format!("{}{}", "../".repeat(depth), parts.join("/"));
            prop_assert!(LogicalKey::parse(&name).is_err());
        }
    }
}
