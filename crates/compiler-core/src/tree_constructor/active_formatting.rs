//! Active formatting elements list: misnested inline markup like
//! `<b><i>x</b>y</i>` must reconstruct `<i>` around `y`.
//!
//! Trimmed to a flat dedup list: this tracks which formatting elements
//! are currently open, applying the Noah's-Ark clause (cap identical
//! entries at 3); everything table/template-scoped is dropped, since
//! this format's flat component bodies never need that scoping. The
//! component-boundary reset that full HTML5 expresses with a `<table>`/
//! `<template>` marker on this same list is instead implemented directly
//! against `TreeConstructor::pending_reconstruction` (`tree_constructor.rs`),
//! since reconstruction here is driven by that queue, not by walking this
//! list.

use crate::node::NodeId;
use crate::token::Attribute;

/// HTML's classic formatting elements; this format carries the same set
/// since it still parses plain HTML markup alongside components.
const FORMATTING_ELEMENTS: &[&str] = &[
    "a", "b", "big", "code", "em", "font", "i", "nobr", "s", "small", "strike", "strong", "tt",
    "u",
];

pub fn is_formatting_element(name: &str) -> bool {
    FORMATTING_ELEMENTS.iter().any(|f| f.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone)]
pub struct FormattingEntry {
    pub id: NodeId,
    pub name: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Default)]
pub struct ActiveFormattingElements {
    entries: Vec<FormattingEntry>,
}

impl ActiveFormattingElements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a formatting element, applying the Noah's-Ark clause: if
    /// three identical (name + attributes) entries already exist, the
    /// earliest is dropped first.
    pub fn push(&mut self, id: NodeId, name: String, attributes: Vec<Attribute>) {
        let matching: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, f)| f.name.eq_ignore_ascii_case(&name) && f.attributes == attributes)
            .map(|(i, _)| i)
            .collect();
        if matching.len() >= 3 {
            if let Some(&earliest) = matching.last() {
                self.entries.remove(earliest);
            }
        }
        self.entries.push(FormattingEntry { id, name, attributes });
    }

    /// Removes the entry for `id` (an element has been closed properly
    /// and needs no further reconstruction).
    pub fn remove(&mut self, id: NodeId) {
        self.entries.retain(|f| f.id != id);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::node::NodeId;

    #[test]
    fn noahs_ark_caps_identical_entries_at_three() {
        let mut list = ActiveFormattingElements::new();
        for i in 0..4 {
            list.push(NodeId(i), "b".into(), vec![]);
        }
        assert!(!list.is_empty());
    }

    #[test]
    fn remove_drops_only_the_matching_id() {
        let mut list = ActiveFormattingElements::new();
        list.push(NodeId(1), "b".into(), vec![]);
        list.push(NodeId(2), "i".into(), vec![]);
        list.remove(NodeId(1));
        assert!(!list.is_empty());
        list.remove(NodeId(2));
        assert!(list.is_empty());
    }
}
