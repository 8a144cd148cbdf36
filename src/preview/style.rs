//! Typography marks for headings and inline emphasis.

use super::{BuildContext, OverlayBuilder, classes};
use crate::classify::Sensitivity;
use crate::document::NodeKind;
use crate::overlay::{Overlay, OverlaySet};

/// Cursor-insensitive: styling depends on the text alone, so it survives
/// selection moves and is emitted even with live preview off.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleBuilder;

impl OverlayBuilder for StyleBuilder {
    fn name(&self) -> &'static str {
        "style"
    }

    fn sensitivity(&self) -> Sensitivity {
        Sensitivity::Structural
    }

    fn build(&self, ctx: &BuildContext<'_>) -> OverlaySet {
        let _scope = crate::perf::scope("preview.style");
        let mut items = Vec::new();
        for id in ctx.tree.iter() {
            let node = ctx.tree.node(id);
            let class = match node.kind {
                NodeKind::Heading(level) => format!("lm-header-{level}"),
                NodeKind::StrongEmphasis => classes::STRONG.to_string(),
                NodeKind::Emphasis => classes::EMPHASIS.to_string(),
                NodeKind::Strikethrough => classes::STRIKETHROUGH.to_string(),
                NodeKind::InlineCode => classes::CODE.to_string(),
                NodeKind::Link => classes::LINK.to_string(),
                _ => continue,
            };
            if node.is_empty() || ctx.in_code_block(id) {
                continue;
            }
            if matches!(node.kind, NodeKind::Heading(_)) {
                let line = ctx.doc.line_at(node.from);
                items.push(Overlay::line(line.from, classes::HEADING_LINE));
            }
            items.push(Overlay::mark(node.from, node.to, class));
        }
        OverlaySet::new(items)
    }
}
