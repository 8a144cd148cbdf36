//! Syntax marker reveal: `**`, `_`, `` ` ``, `#`, `-`, `>`.

use std::collections::BTreeSet;

use super::{BuildContext, OverlayBuilder, classes};
use crate::document::{NodeId, NodeKind};
use crate::overlay::{Overlay, OverlaySet};
use crate::visibility::Visibility;

/// Emits one mark per syntax marker. Hidden markers get the base class,
/// revealed ones the `-visible` variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkBuilder;

impl OverlayBuilder for MarkBuilder {
    fn name(&self) -> &'static str {
        "marks"
    }

    fn build(&self, ctx: &BuildContext<'_>) -> OverlaySet {
        let _scope = crate::perf::scope("preview.marks");
        let visibility = ctx.visibility();
        if visibility.is_disabled() {
            return OverlaySet::empty();
        }

        let active = active_lines(ctx);
        let mut items = Vec::new();
        for id in ctx.tree.iter() {
            let node = ctx.tree.node(id);
            if !(node.kind.is_block_mark() || node.kind.is_inline_mark()) {
                continue;
            }
            if ctx.in_code_block(id) {
                continue;
            }
            if node.kind.is_block_mark() {
                let line = ctx.doc.line_at(node.from).number;
                let visible = visibility == Visibility::FollowCursor && active.contains(&line);
                let class = if visible {
                    classes::FORMATTING_BLOCK_VISIBLE
                } else {
                    classes::FORMATTING_BLOCK
                };
                items.push(Overlay::mark(node.from, node.to, class));
                continue;
            }

            if node.is_empty() || is_math_delimiter(ctx, id) {
                continue;
            }
            let (from, to) = element_span(ctx, id);
            let class = if visibility.shows_source(ctx.selection, from, to) {
                classes::FORMATTING_INLINE_VISIBLE
            } else {
                classes::FORMATTING_INLINE
            };
            items.push(Overlay::mark(node.from, node.to, class));
        }
        tracing::trace!(count = items.len(), "built mark overlays");
        OverlaySet::new(items)
    }
}

/// One-based numbers of every line a selection range spans.
fn active_lines(ctx: &BuildContext<'_>) -> BTreeSet<usize> {
    let mut lines = BTreeSet::new();
    for range in ctx.selection.ranges() {
        let first = ctx.doc.line_at(range.from()).number;
        let last = ctx.doc.line_at(range.to()).number;
        lines.extend(first..=last);
    }
    lines
}

/// Span of the formatted element a marker delimits. Both markers of
/// `**bold**` reveal together while the cursor is anywhere inside it.
fn element_span(ctx: &BuildContext<'_>, id: NodeId) -> (usize, usize) {
    let node = ctx.tree.node(id);
    match ctx.tree.parent(id).map(|parent| ctx.tree.node(parent)) {
        Some(parent)
            if matches!(
                parent.kind,
                NodeKind::Emphasis
                    | NodeKind::StrongEmphasis
                    | NodeKind::Strikethrough
                    | NodeKind::InlineCode
            ) =>
        {
            (parent.from, parent.to)
        }
        _ => (node.from, node.to),
    }
}

/// Backticks of `` `$...$` `` belong to the math builder.
fn is_math_delimiter(ctx: &BuildContext<'_>, id: NodeId) -> bool {
    if ctx.tree.node(id).kind != NodeKind::CodeMark {
        return false;
    }
    match ctx.tree.parent(id) {
        Some(parent) if ctx.tree.node(parent).kind == NodeKind::InlineCode => {
            super::inline_math_source(&ctx.text(parent)).is_some()
        }
        _ => false,
    }
}
