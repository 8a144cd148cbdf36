//! Inline links and `[[wiki]]` links.

use std::sync::LazyLock;

use regex::Regex;

use super::{BuildContext, OverlayBuilder, classes};
use crate::document::NodeKind;
use crate::overlay::{Overlay, OverlaySet};
use crate::view::{LinkData, LinkOptions, LinkView, View};

static LINK_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\[([^\]]*)\]\((.+?)(?:\s+["']([^"']+)["'])?\)$"#).expect("valid link regex")
});

static WIKI_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").expect("valid wiki link regex"));

/// `[text](url "title")`. Image syntax is rejected.
pub fn parse_link_syntax(text: &str) -> Option<LinkData> {
    if text.starts_with('!') {
        return None;
    }
    let captures = LINK_SYNTAX.captures(text)?;
    Some(LinkData {
        text: captures.get(1).map_or_else(String::new, |m| m.as_str().to_string()),
        url: captures.get(2)?.as_str().to_string(),
        title: captures.get(3).map(|m| m.as_str().to_string()),
        is_wiki_link: false,
    })
}

/// `[[target]]` or `[[target|display]]`.
pub fn parse_wiki_link(text: &str) -> Option<LinkData> {
    let captures = WIKI_LINK.captures(text)?;
    let whole = captures.get(0)?;
    if whole.start() != 0 || whole.end() != text.len() {
        return None;
    }
    Some(wiki_data(&captures))
}

fn wiki_data(captures: &regex::Captures<'_>) -> LinkData {
    let target = captures.get(1).map_or("", |m| m.as_str());
    let display = captures.get(2).map_or(target, |m| m.as_str());
    LinkData {
        text: display.to_string(),
        url: target.to_string(),
        title: None,
        is_wiki_link: true,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LinkBuilder {
    options: LinkOptions,
}

impl LinkBuilder {
    pub const fn new(options: LinkOptions) -> Self {
        Self { options }
    }
}

impl OverlayBuilder for LinkBuilder {
    fn name(&self) -> &'static str {
        "link"
    }

    fn build(&self, ctx: &BuildContext<'_>) -> OverlaySet {
        let _scope = crate::perf::scope("preview.link");
        let visibility = ctx.visibility();
        if visibility.is_disabled() {
            return OverlaySet::empty();
        }

        let skip: Vec<(usize, usize)> = ctx
            .tree
            .iter()
            .map(|id| ctx.tree.node(id))
            .filter(|node| node.kind.is_code_block() || node.kind == NodeKind::InlineCode)
            .map(|node| (node.from, node.to))
            .collect();
        let skipped = |from: usize, to: usize| skip.iter().any(|&(f, t)| from >= f && to <= t);

        let mut items = Vec::new();
        let mut emit = |from: usize, to: usize, data: LinkData, source_class: &'static str| {
            if visibility.shows_source(ctx.selection, from, to) {
                items.push(Overlay::mark(from, to, source_class));
            } else {
                let view = View::Link(LinkView::new(data, self.options));
                items.push(Overlay::inline(from, to, view));
            }
        };

        for id in ctx.tree.nodes_of_kind(NodeKind::Link) {
            let node = ctx.tree.node(id);
            if skipped(node.from, node.to) {
                continue;
            }
            if let Some(data) = parse_link_syntax(&ctx.text(id)) {
                emit(node.from, node.to, data, classes::LINK_SOURCE);
            }
        }

        let text = ctx.doc.text();
        for captures in WIKI_LINK.captures_iter(&text) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let from = ctx.doc.byte_to_char(whole.start());
            let to = ctx.doc.byte_to_char(whole.end());
            if skipped(from, to) {
                continue;
            }
            emit(from, to, wiki_data(&captures), classes::WIKILINK_SOURCE);
        }
        OverlaySet::new(items)
    }
}
