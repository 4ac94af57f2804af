//! Trimmed `InsertionMode`, with every table/select/frameset-family
//! variant dropped: this format has no table, select, or frameset
//! elements.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionMode {
    /// Before the frontmatter fence has been seen or ruled out.
    Initial,
    /// Inside an open `---` fence.
    InFrontmatter,
    /// Ordinary markup/component/expression content.
    InBody,
}
