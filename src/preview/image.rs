//! `![alt](src "title")` images.

use std::sync::LazyLock;

use regex::Regex;

use super::{BuildContext, OverlayBuilder, classes};
use crate::document::NodeKind;
use crate::overlay::{Overlay, OverlaySet};
use crate::view::{ImageData, ImageOptions, ImageView, View};

static IMAGE_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^!\[([^\]]*)\]\((.+?)(?:\s+["']([^"']+)["'])?\)$"#).expect("valid image regex")
});

/// Split raw image syntax into its parts, or `None` if it is malformed.
pub fn parse_image_syntax(text: &str) -> Option<ImageData> {
    let captures = IMAGE_SYNTAX.captures(text)?;
    let src = captures.get(2)?.as_str().to_string();
    Some(ImageData {
        is_local: crate::image::is_local(&src),
        alt: captures.get(1).map_or_else(String::new, |m| m.as_str().to_string()),
        title: captures.get(3).map(|m| m.as_str().to_string()),
        src,
    })
}

#[derive(Debug, Clone, Default)]
pub struct ImageBuilder {
    options: ImageOptions,
}

impl ImageBuilder {
    pub const fn new(options: ImageOptions) -> Self {
        Self { options }
    }

    pub const fn options(&self) -> &ImageOptions {
        &self.options
    }
}

impl OverlayBuilder for ImageBuilder {
    fn name(&self) -> &'static str {
        "image"
    }

    fn durable(&self) -> bool {
        true
    }

    fn build(&self, ctx: &BuildContext<'_>) -> OverlaySet {
        let _scope = crate::perf::scope("preview.image");
        let visibility = ctx.visibility();
        if visibility.is_disabled() {
            return OverlaySet::empty();
        }

        let mut items = Vec::new();
        for id in ctx.tree.nodes_of_kind(NodeKind::Image) {
            let node = ctx.tree.node(id);
            let Some(data) = parse_image_syntax(&ctx.text(id)) else {
                continue;
            };
            if visibility.shows_source(ctx.selection, node.from, node.to) {
                let line = ctx.doc.line_at(node.from);
                items.push(Overlay::line(line.from, classes::IMAGE_SOURCE));
            } else {
                let view = View::Image(ImageView::new(data, self.options.clone()));
                items.push(Overlay::block(node.from, node.to, view));
            }
        }
        OverlaySet::new(items)
    }
}
