//! Fenced code blocks rendered with highlighting.

use serde::{Deserialize, Serialize};

use super::{BuildContext, OverlayBuilder, classes};
use crate::document::NodeKind;
use crate::overlay::{Overlay, OverlaySet};
use crate::view::{CodeBlockView, View};

/// Info strings owned by other builders.
pub const RESERVED_LANGUAGES: &[&str] = &["math"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlockOptions {
    pub line_numbers: bool,
    pub copy_button: bool,
    /// Used when the fence has no info string.
    pub default_language: String,
}

impl Default for CodeBlockOptions {
    fn default() -> Self {
        Self {
            line_numbers: false,
            copy_button: true,
            default_language: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CodeBlockBuilder {
    options: CodeBlockOptions,
}

impl CodeBlockBuilder {
    pub const fn new(options: CodeBlockOptions) -> Self {
        Self { options }
    }
}

impl OverlayBuilder for CodeBlockBuilder {
    fn name(&self) -> &'static str {
        "code-block"
    }

    fn durable(&self) -> bool {
        true
    }

    fn build(&self, ctx: &BuildContext<'_>) -> OverlaySet {
        let _scope = crate::perf::scope("preview.code_block");
        let visibility = ctx.visibility();
        if visibility.is_disabled() {
            return OverlaySet::empty();
        }

        let mut items = Vec::new();
        for id in ctx.tree.nodes_of_kind(NodeKind::FencedCode) {
            let language = match ctx.tree.child_of_kind(id, NodeKind::CodeInfo) {
                Some(info) => ctx.text(info).trim().to_string(),
                None => self.options.default_language.clone(),
            };
            if RESERVED_LANGUAGES.contains(&language.as_str()) {
                continue;
            }

            let node = ctx.tree.node(id);
            if visibility.shows_source(ctx.selection, node.from, node.to) {
                for at in ctx.line_starts(node.from, node.to) {
                    items.push(Overlay::line(at, classes::CODEBLOCK_SOURCE));
                }
                continue;
            }

            let body = ctx.tree.child_of_kind(id, NodeKind::CodeText);
            let code = body.map(|text| ctx.text(text)).unwrap_or_default();
            let code_from = body.map_or(node.from, |text| ctx.tree.node(text).from);
            let line_starts = match body {
                Some(_) => std::iter::once(code_from)
                    .chain(
                        code.chars()
                            .enumerate()
                            .filter(|&(_, c)| c == '\n')
                            .map(|(i, _)| code_from + i + 1),
                    )
                    .collect(),
                None => Vec::new(),
            };
            let view = CodeBlockView {
                code,
                language,
                show_line_numbers: self.options.line_numbers,
                show_copy_button: self.options.copy_button,
                from: node.from,
                to: node.to,
                code_from,
                line_starts,
            };
            items.push(Overlay::block(node.from, node.to, View::CodeBlock(view)));
        }
        OverlaySet::new(items)
    }
}
