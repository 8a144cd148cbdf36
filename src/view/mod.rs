//! Embedded views that replace raw syntax when an element renders.
//!
//! Views are plain data. Each one knows how to render itself to HTML given
//! the collaborators it needs; [`ViewRenderer`] bundles those.

mod code_block;
mod image;
mod link;
mod math;
mod table;

pub use code_block::{ClickLine, CodeBlockView, MonospaceMeasure, TextMeasure};
pub use image::{ImageData, ImageOptions, ImageView, LoadState};
pub use link::{LinkData, LinkOptions, LinkView, sanitize_url};
pub use math::MathView;
pub use table::{TableSourceToggle, TableView};

use serde::Serialize;

use crate::highlight::{Highlighter, SyntectHighlighter};
use crate::render::MathCache;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
    Table(TableView),
    TableSourceToggle(TableSourceToggle),
    Math(MathView),
    Image(ImageView),
    Link(LinkView),
    CodeBlock(CodeBlockView),
}

impl View {
    /// Short human-readable summary, used by the CLI listing.
    pub fn describe(&self) -> String {
        match self {
            Self::Table(view) => format!(
                "table {}x{}",
                view.data.column_count(),
                view.data.rows.len()
            ),
            Self::TableSourceToggle(_) => "table-source-toggle".to_string(),
            Self::Math(view) => {
                let mode = if view.block { "block" } else { "inline" };
                format!("math[{mode}] {}", view.source)
            }
            Self::Image(view) => format!("image {} ({})", view.data.src, view.data.alt),
            Self::Link(view) => {
                let kind = if view.data.is_wiki_link { "wikilink" } else { "link" };
                format!("{kind} {} -> {}", view.data.text, view.data.url)
            }
            Self::CodeBlock(view) => format!(
                "code[{}] {} lines",
                view.language,
                view.line_starts.len()
            ),
        }
    }
}

/// Renders views to HTML with the shared math cache and a highlighter.
pub struct ViewRenderer {
    math: MathCache,
    highlighter: Box<dyn Highlighter + Send + Sync>,
}

impl ViewRenderer {
    pub fn new(math: MathCache, highlighter: impl Highlighter + Send + Sync + 'static) -> Self {
        Self {
            math,
            highlighter: Box::new(highlighter),
        }
    }

    pub fn render(&mut self, view: &View) -> String {
        match view {
            View::Table(table) => table.to_html(),
            View::TableSourceToggle(toggle) => toggle.to_html(),
            View::Math(math) => math.to_html(&mut self.math),
            View::Image(image) => image.to_html(),
            View::Link(link) => link.to_html(),
            View::CodeBlock(code) => code.to_html(self.highlighter.as_ref()),
        }
    }

    pub const fn math_cache(&self) -> &MathCache {
        &self.math
    }

    pub const fn math_cache_mut(&mut self) -> &mut MathCache {
        &mut self.math
    }
}

impl Default for ViewRenderer {
    fn default() -> Self {
        Self::new(MathCache::default(), SyntectHighlighter)
    }
}

impl std::fmt::Debug for ViewRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewRenderer")
            .field("math", &self.math)
            .finish_non_exhaustive()
    }
}
