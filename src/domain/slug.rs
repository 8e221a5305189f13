//! Utilities for generating deterministic, URL-safe slugs.
//!
//! The helpers here bridge ASCII slugification (`slug` crate) with Chinese
//! transliteration (`pinyin` crate) so a tag like “Type Coercion” becomes
//! `type-coercion` and “基线对齐” becomes `ji-xian-dui-qi`. Tag routes and
//! heading anchors both go through [`tag_slug`], which makes the output of a
//! slug a fixed point: slugging a slug returns it unchanged.

use std::collections::HashMap;

use pinyin::{Pinyin, ToPinyin};
use slug::slugify;

/// Anchor used when a heading has no representable characters at all.
const FALLBACK_ANCHOR: &str = "section";

/// Normalise a human-readable label into its URL slug.
///
/// Empty or unrepresentable input yields an empty string rather than an
/// error; callers decide whether an empty slug is meaningful.
pub fn tag_slug(input: &str) -> String {
    if input.trim().is_empty() {
        return String::new();
    }

    slugify(transliterate_to_ascii(input))
}

/// Deterministically generate unique anchor slugs within a single document.
///
/// Headings processed in order will receive monotonic suffixes when duplicates
/// occur (e.g. `section`, `section-2`, `section-3`).
#[derive(Default, Debug)]
pub struct AnchorSlugger {
    occurrences: HashMap<String, usize>,
}

impl AnchorSlugger {
    /// Create a new slugger instance.
    pub fn new() -> Self {
        Self {
            occurrences: HashMap::new(),
        }
    }

    /// Generate a slug for the provided heading text, unique within this
    /// slugger.
    pub fn anchor_for(&mut self, heading: &str) -> String {
        let mut base = tag_slug(heading);
        if base.is_empty() {
            base = FALLBACK_ANCHOR.to_string();
        }

        let count = self.occurrences.entry(base.clone()).or_insert(0);
        *count += 1;

        if *count == 1 {
            base
        } else {
            format!("{base}-{}", *count)
        }
    }
}

fn transliterate_to_ascii(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        if ch.is_ascii() {
            output.push(ch);
            continue;
        }

        match ch.to_pinyin() {
            Some(py) => append_pinyin(&mut output, py),
            None if ch.is_whitespace() => output.push(' '),
            None => {
                // slugify decides what to do with the rest.
                output.push(ch);
            }
        }
    }

    output
}

fn append_pinyin(buffer: &mut String, pinyin: Pinyin) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(pinyin.plain());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_slug_lowercases_and_hyphenates() {
        assert_eq!(tag_slug("Type Coercion"), "type-coercion");
        assert_eq!(tag_slug("JavaScript"), "javascript");
        assert_eq!(tag_slug("  React   Hooks  "), "react-hooks");
    }

    #[test]
    fn tag_slug_strips_punctuation() {
        assert_eq!(tag_slug("C++ & Rust!"), "c-rust");
        assert_eq!(tag_slug("node.js"), "node-js");
    }

    #[test]
    fn tag_slug_transliterates_chinese() {
        assert_eq!(tag_slug("Rust 基础教程"), "rust-ji-chu-jiao-cheng");
    }

    #[test]
    fn tag_slug_of_empty_input_is_empty() {
        assert_eq!(tag_slug(""), "");
        assert_eq!(tag_slug("   "), "");
    }

    #[test]
    fn tag_slug_is_a_fixed_point() {
        let inputs = [
            "Type Coercion",
            "JavaScript",
            "Event Loop & Microtasks",
            "  spaced   out  ",
            "ES2015+",
            "深入理解",
            "already-a-slug",
        ];

        for input in inputs {
            let once = tag_slug(input);
            assert_eq!(tag_slug(&once), once, "slug of {input:?} is not stable");
        }
    }

    #[test]
    fn anchor_slugger_produces_unique_slugs() {
        let mut slugger = AnchorSlugger::new();

        let first = slugger.anchor_for("Overview");
        let second = slugger.anchor_for("Overview");
        let third = slugger.anchor_for("深入理解");

        assert_eq!(first, "overview");
        assert_eq!(second, "overview-2");
        assert_eq!(third, "shen-ru-li-jie");
    }

    #[test]
    fn anchor_slugger_falls_back_for_symbol_only_headings() {
        let mut slugger = AnchorSlugger::new();

        assert_eq!(slugger.anchor_for("!!!"), "section");
        assert_eq!(slugger.anchor_for("???"), "section-2");
    }
}
