// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! Deterministic, non-reversible slug-codes derived from human-entered names.

/// Lowercases `name`, trims leading/trailing whitespace, and collapses every
/// run of internal whitespace to a single hyphen.
///
/// Codes exist solely so that a compound `(parent_id, code)` unique index can
/// detect sibling-name collisions; they are never parsed back into a name.
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(slugify("  Zeiss   Lens   Mount "), "zeiss-lens-mount");
    }

    #[test]
    fn tabs_and_newlines_collapse_too() {
        assert_eq!(slugify("Lens\tMount\nAdapter"), "lens-mount-adapter");
    }

    #[test]
    fn empty_and_blank_names() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("   "), "");
    }

    proptest! {
        #[test]
        fn idempotent(name in ".*") {
            let once = slugify(&name);
            let twice = slugify(&once);
            prop_assert_eq!(once, twice);
        }
    }
}
