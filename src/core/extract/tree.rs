//! Depth-first walks over tree-sitter syntax trees.
//!
//! A dialect describes itself as a table from node kind to handler; the walk
//! calls the handler for each matching node and descends unless told not to.

use tree_sitter::{Language, Node, Parser, Tree};

use super::{ExtractError, SourceUnit};
use crate::utils::LineIndex;

/// What the walk does after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Descend {
    Children,
    Skip,
}

pub(super) type Handler<C> = for<'t> fn(&mut C, Node<'t>) -> Result<Descend, ExtractError>;

/// Node kind to handler.
pub(super) type DispatchTable<C> = [(&'static str, Handler<C>)];

pub(super) fn walk<C>(
    node: Node<'_>,
    table: &DispatchTable<C>,
    ctx: &mut C,
) -> Result<(), ExtractError> {
    let descend = match table.iter().find(|(kind, _)| *kind == node.kind()) {
        Some((_, handler)) => handler(ctx, node)?,
        None => Descend::Children,
    };

    if descend == Descend::Children {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            walk(child, table, ctx)?;
        }
    }
    Ok(())
}

pub(super) fn parse(
    language: &Language,
    unit: &SourceUnit<'_>,
) -> Result<Tree, ExtractError> {
    let mut parser = Parser::new();
    parser.set_language(language)?;
    parser
        .parse(unit.text, None)
        .ok_or_else(|| ExtractError::Parse {
            file: unit.filename.to_string(),
            line: unit.start_line,
            message: "parser produced no tree".to_string(),
        })
}

/// The first error or missing node, in document order.
pub(super) fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error).or(Some(node))
}

/// Reject a tree containing syntax errors, pointing at the first one.
pub(super) fn ensure_valid(
    tree: &Tree,
    unit: &SourceUnit<'_>,
    lines: &LineIndex,
) -> Result<(), ExtractError> {
    match first_error(tree.root_node()) {
        None => Ok(()),
        Some(node) => Err(ExtractError::Parse {
            file: unit.filename.to_string(),
            line: lines.line_of(node.start_byte()),
            message: if node.is_missing() {
                format!("missing {}", node.kind())
            } else {
                "unexpected syntax".to_string()
            },
        }),
    }
}

pub(super) fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or_default()
}
