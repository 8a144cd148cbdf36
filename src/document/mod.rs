//! Markdown documents and their parse trees.
//!
//! This module handles:
//! - The rope-backed text buffer, addressed by character offsets
//! - The closed set of node kinds the preview builders read
//! - Parsing markdown with comrak into that tree

mod parser;
mod text;
mod tree;

pub use parser::{ComrakParser, MarkdownParser, parse};
pub use text::{Document, Line};
pub use tree::{Node, NodeId, NodeKind, ParseTree, PreOrder};
