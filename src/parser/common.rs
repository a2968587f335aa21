use crate::diagnostics::Diagnostic;
use std::path::Path;

/// Trait for per-unit parsers.
///
/// Parsing is a pure function of one unit's text, so implementations must be
/// shareable across rayon workers. A malformed unit yields a parse-error
/// diagnostic instead of output.
pub trait Parser: Sync {
    type Output;

    fn parse(&self, path: &Path, contents: &str) -> Result<Self::Output, Diagnostic>;
}

/// Extract text from a node
pub fn node_text<'a>(node: tree_sitter::Node<'_>, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// 1-indexed line of a node's first byte
pub fn line_of(node: tree_sitter::Node) -> usize {
    node.start_position().row + 1
}

/// Find all children of a specific kind
pub fn children_of_kind<'a>(
    node: tree_sitter::Node<'a>,
    kind: &str,
) -> Vec<tree_sitter::Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| child.kind() == kind)
        .collect()
}

/// First node of a tree that is an error or a missing token
pub fn first_error(root: tree_sitter::Node) -> Option<tree_sitter::Node> {
    descendants(root).find(|n| n.is_error() || n.is_missing())
}

/// Iterator over all descendant nodes, pre-order, including `node` itself
pub fn descendants(node: tree_sitter::Node) -> impl Iterator<Item = tree_sitter::Node> {
    DescendantIterator::new(node)
}

struct DescendantIterator<'a> {
    cursor: tree_sitter::TreeCursor<'a>,
    done: bool,
}

impl<'a> DescendantIterator<'a> {
    fn new(node: tree_sitter::Node<'a>) -> Self {
        Self {
            cursor: node.walk(),
            done: false,
        }
    }
}

impl<'a> Iterator for DescendantIterator<'a> {
    type Item = tree_sitter::Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let node = self.cursor.node();

        // Try to go to first child
        if self.cursor.goto_first_child() {
            return Some(node);
        }

        // Try to go to next sibling
        loop {
            if self.cursor.goto_next_sibling() {
                return Some(node);
            }

            // Go up to parent
            if !self.cursor.goto_parent() {
                self.done = true;
                return Some(node);
            }
        }
    }
}

/// Build the 1-indexed line lookup for byte offsets of a text
pub fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// 1-indexed line containing `offset`
pub fn line_at(starts: &[usize], offset: usize) -> usize {
    match starts.binary_search(&offset) {
        Ok(i) => i + 1,
        Err(i) => i,
    }
}
