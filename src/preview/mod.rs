//! Overlay builders, one per element family.
//!
//! Every builder is a pure function of a [`BuildContext`]: walk the tree,
//! extract each element's payload, drop malformed ones silently, ask the
//! visibility policy, then emit a replace (rendered) or marks and line
//! classes (source). Sets come back sorted by start offset.

mod code_block;
mod image;
mod link;
mod marks;
mod math;
mod style;
mod table;

pub use code_block::{CodeBlockBuilder, CodeBlockOptions, RESERVED_LANGUAGES};
pub use image::{ImageBuilder, parse_image_syntax};
pub use link::{LinkBuilder, parse_link_syntax, parse_wiki_link};
pub use marks::MarkBuilder;
pub use math::{BlockMathBuilder, InlineMathBuilder, inline_math_source};
pub use style::StyleBuilder;
pub use table::{SourceModeRange, SourceModeRanges, TableBuilder};

use crate::changes::EditOperation;
use crate::classify::{Sensitivity, UpdateAction, classify_for};
use crate::document::{Document, NodeId, NodeKind, ParseTree};
use crate::interaction::{InteractionState, Transition};
use crate::overlay::OverlaySet;
use crate::selection::Selection;
use crate::view::{ImageOptions, LinkOptions};
use crate::visibility::Visibility;

/// CSS classes emitted by the builders.
pub mod classes {
    pub const FORMATTING_INLINE: &str = "lm-formatting-inline";
    pub const FORMATTING_INLINE_VISIBLE: &str = "lm-formatting-inline lm-formatting-inline-visible";
    pub const FORMATTING_BLOCK: &str = "lm-formatting-block";
    pub const FORMATTING_BLOCK_VISIBLE: &str = "lm-formatting-block lm-formatting-block-visible";
    pub const MATH_SOURCE: &str = "lm-math-source";
    pub const MATH_SOURCE_BLOCK: &str = "lm-math-source-block";
    pub const TABLE_SOURCE: &str = "lm-table-source";
    pub const IMAGE_SOURCE: &str = "lm-image-source";
    pub const LINK_SOURCE: &str = "lm-link-source";
    pub const WIKILINK_SOURCE: &str = "lm-link-source lm-wikilink-source";
    pub const CODEBLOCK_SOURCE: &str = "lm-codeblock-source";
    pub const HEADING_LINE: &str = "lm-heading-line";
    pub const STRONG: &str = "lm-strong";
    pub const EMPHASIS: &str = "lm-emphasis";
    pub const STRIKETHROUGH: &str = "lm-strikethrough";
    pub const CODE: &str = "lm-code";
    pub const LINK: &str = "lm-link";
}

/// Everything a build reads.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub doc: &'a Document,
    pub tree: &'a ParseTree,
    pub selection: &'a Selection,
    pub state: InteractionState,
    pub table_ranges: &'a SourceModeRanges,
}

impl BuildContext<'_> {
    pub const fn visibility(&self) -> Visibility {
        Visibility::for_state(self.state)
    }

    /// Source-or-rendered answer for one span under the current policy.
    pub fn shows_source(&self, from: usize, to: usize) -> bool {
        self.visibility().shows_source(self.selection, from, to)
    }

    pub fn text(&self, id: NodeId) -> String {
        let node = self.tree.node(id);
        self.doc.slice(node.from, node.to)
    }

    /// Line start offsets of every line in `[from, to]`.
    pub fn line_starts(&self, from: usize, to: usize) -> Vec<usize> {
        self.doc.lines_in(from, to).iter().map(|l| l.from).collect()
    }

    /// True if the node sits inside a fenced or indented code block.
    pub fn in_code_block(&self, id: NodeId) -> bool {
        self.tree.has_ancestor(id, NodeKind::is_code_block)
    }
}

/// One element family.
pub trait OverlayBuilder: Send {
    fn name(&self) -> &'static str;

    fn sensitivity(&self) -> Sensitivity {
        Sensitivity::Cursor
    }

    /// Durable builders own whole-document state and may emit block
    /// replaces; the others are limited to inline decoration.
    fn durable(&self) -> bool {
        false
    }

    fn classify(&self, op: &EditOperation, transition: Transition) -> UpdateAction {
        classify_for(self.sensitivity(), op, transition)
    }

    fn build(&self, ctx: &BuildContext<'_>) -> OverlaySet;
}

/// Options for every builder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreviewOptions {
    pub code_block: CodeBlockOptions,
    pub image: ImageOptions,
    pub link: LinkOptions,
}

/// The standard builder list, in emission order.
pub fn default_builders(options: &PreviewOptions) -> Vec<Box<dyn OverlayBuilder>> {
    vec![
        Box::new(StyleBuilder),
        Box::new(MarkBuilder),
        Box::new(InlineMathBuilder),
        Box::new(BlockMathBuilder),
        Box::new(TableBuilder),
        Box::new(ImageBuilder::new(options.image.clone())),
        Box::new(LinkBuilder::new(options.link)),
        Box::new(CodeBlockBuilder::new(options.code_block.clone())),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::document::parse;

    /// Parsed document plus the inputs a build needs.
    pub struct Fixture {
        pub doc: Document,
        pub tree: ParseTree,
        pub selection: Selection,
        pub state: InteractionState,
        pub ranges: SourceModeRanges,
    }

    impl Fixture {
        pub fn new(text: &str, cursor: usize) -> Self {
            let doc = Document::from_text(text);
            let tree = parse(&doc);
            Self {
                doc,
                tree,
                selection: Selection::cursor(cursor),
                state: InteractionState::default(),
                ranges: SourceModeRanges::default(),
            }
        }

        pub fn dragging(mut self) -> Self {
            self.state.drag_active = true;
            self
        }

        pub fn preview_off(mut self) -> Self {
            self.state.live_preview = false;
            self
        }

        pub fn ctx(&self) -> BuildContext<'_> {
            BuildContext {
                doc: &self.doc,
                tree: &self.tree,
                selection: &self.selection,
                state: self.state,
                table_ranges: &self.ranges,
            }
        }
    }
}
