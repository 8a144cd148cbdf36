//! Inline `` `$...$` `` and fenced ```` ```math ```` blocks.

use super::{BuildContext, OverlayBuilder, classes};
use crate::document::NodeKind;
use crate::overlay::{Overlay, OverlaySet};
use crate::view::{MathView, View};

/// Source between `` `$ `` and `` $` ``, or `None` if `text` is not inline
/// math. Anything of four characters or fewer is not math.
pub fn inline_math_source(text: &str) -> Option<&str> {
    if text.chars().count() <= 4 {
        return None;
    }
    text.strip_prefix("`$")?.strip_suffix("$`")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InlineMathBuilder;

impl OverlayBuilder for InlineMathBuilder {
    fn name(&self) -> &'static str {
        "inline-math"
    }

    fn build(&self, ctx: &BuildContext<'_>) -> OverlaySet {
        let _scope = crate::perf::scope("preview.inline_math");
        let visibility = ctx.visibility();
        if visibility.is_disabled() {
            return OverlaySet::empty();
        }

        let mut items = Vec::new();
        for id in ctx.tree.nodes_of_kind(NodeKind::InlineCode) {
            let text = ctx.text(id);
            let Some(source) = inline_math_source(&text) else {
                continue;
            };
            let node = ctx.tree.node(id);
            if visibility.shows_source(ctx.selection, node.from, node.to) {
                items.push(Overlay::mark(node.from, node.to, classes::MATH_SOURCE));
            } else {
                let view = View::Math(MathView::new(source, false));
                items.push(Overlay::inline(node.from, node.to, view));
            }
        }
        OverlaySet::new(items)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BlockMathBuilder;

impl OverlayBuilder for BlockMathBuilder {
    fn name(&self) -> &'static str {
        "block-math"
    }

    fn durable(&self) -> bool {
        true
    }

    fn build(&self, ctx: &BuildContext<'_>) -> OverlaySet {
        let _scope = crate::perf::scope("preview.block_math");
        let visibility = ctx.visibility();
        if visibility.is_disabled() {
            return OverlaySet::empty();
        }

        let mut items = Vec::new();
        for id in ctx.tree.nodes_of_kind(NodeKind::FencedCode) {
            let is_math = ctx
                .tree
                .child_of_kind(id, NodeKind::CodeInfo)
                .is_some_and(|info| ctx.text(info) == "math");
            if !is_math {
                continue;
            }
            let source = ctx
                .tree
                .child_of_kind(id, NodeKind::CodeText)
                .map(|text| ctx.text(text).trim().to_string())
                .unwrap_or_default();
            let node = ctx.tree.node(id);
            if visibility.shows_source(ctx.selection, node.from, node.to) {
                for at in ctx.line_starts(node.from, node.to) {
                    items.push(Overlay::line(at, classes::MATH_SOURCE_BLOCK));
                }
            } else {
                let view = View::Math(MathView::new(source, true));
                items.push(Overlay::block(node.from, node.to, view));
            }
        }
        OverlaySet::new(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::test_support::Fixture;

    #[test]
    fn test_inline_math_source_detection() {
        assert_eq!(inline_math_source("`$x^2$`"), Some("x^2"));
        assert_eq!(inline_math_source("`$$`"), None);
        assert_eq!(inline_math_source("`$ $`"), Some(" "));
        assert_eq!(inline_math_source("`code`"), None);
        assert_eq!(inline_math_source("`$x`"), None);
    }

    #[test]
    fn test_inline_math_renders_away_from_cursor() {
        let fixture = Fixture::new("Area `$\\pi r^2$` here", 0);
        let set = InlineMathBuilder.build(&fixture.ctx());
        assert_eq!(set.len(), 1);
        let overlay = &set.as_slice()[0];
        assert_eq!((overlay.from(), overlay.to()), (5, 16));
        assert!(!overlay.is_block_replace());
        assert_eq!(
            overlay.view(),
            Some(&View::Math(MathView::new("\\pi r^2", false)))
        );
    }

    #[test]
    fn test_inline_math_source_at_cursor() {
        let fixture = Fixture::new("Area `$\\pi r^2$` here", 16);
        let set = InlineMathBuilder.build(&fixture.ctx());
        assert_eq!(set.as_slice(), &[Overlay::mark(5, 16, classes::MATH_SOURCE)]);
    }

    #[test]
    fn test_inline_math_ignores_plain_code() {
        let fixture = Fixture::new("run `cargo` now", 0);
        assert!(InlineMathBuilder.build(&fixture.ctx()).is_empty());
    }

    #[test]
    fn test_block_math_renders_trimmed_source() {
        let text = "intro\n\n```math\n  E = mc^2\n```\n";
        let fixture = Fixture::new(text, 0);
        let set = BlockMathBuilder.build(&fixture.ctx());
        assert_eq!(set.len(), 1);
        let overlay = &set.as_slice()[0];
        assert!(overlay.is_block_replace());
        assert_eq!(overlay.from(), 7);
        assert_eq!(
            overlay.view(),
            Some(&View::Math(MathView::new("E = mc^2", true)))
        );
    }

    #[test]
    fn test_block_math_source_lines_at_cursor() {
        let text = "intro\n\n```math\nE = mc^2\n```\n";
        let fixture = Fixture::new(text, 16);
        let set = BlockMathBuilder.build(&fixture.ctx());
        let lines: Vec<usize> = set.iter().map(Overlay::from).collect();
        assert_eq!(lines, vec![7, 15, 24]);
        assert!(set.iter().all(|o| o.class() == Some(classes::MATH_SOURCE_BLOCK)));
    }

    #[test]
    fn test_other_fences_are_not_math() {
        let fixture = Fixture::new("```rust\nlet x = 1;\n```\n", 30);
        assert!(BlockMathBuilder.build(&fixture.ctx()).is_empty());
    }

    #[test]
    fn test_drag_renders_everything() {
        let text = "`$a$` x\n\n```math\nb\n```\n";
        let fixture = Fixture::new(text, 1).dragging();
        assert!(InlineMathBuilder.build(&fixture.ctx()).iter().all(Overlay::is_replace));
        assert!(BlockMathBuilder.build(&fixture.ctx()).iter().all(Overlay::is_replace));
    }
}
