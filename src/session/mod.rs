//! Host-facing session state.
//!
//! This module follows The Elm Architecture (TEA):
//! - [`Session`]: everything the preview engine knows about one document
//! - [`Message`]: every event a host can feed in
//! - [`Session::update`]: the single state transition
//!
//! After every message [`Session::overlays`] is the complete, sorted set of
//! instructions to draw.

mod update;

pub use update::Message;

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

use crate::document::{ComrakParser, Document, MarkdownParser, ParseTree};
use crate::image::ImageLoader;
use crate::interaction::{DragGesture, InteractionState, InteractionTracker};
use crate::overlay::OverlaySet;
use crate::preview::{
    BuildContext, OverlayBuilder, PreviewOptions, SourceModeRanges, default_builders,
};
use crate::selection::Selection;
use crate::view::{MonospaceMeasure, TextMeasure, View, ViewRenderer};

/// One open document and its live preview.
pub struct Session {
    document: Document,
    tree: ParseTree,
    parser: Box<dyn MarkdownParser + Send>,
    selection: Selection,
    tracker: InteractionTracker,
    gesture: DragGesture,
    table_ranges: SourceModeRanges,
    renderer: ViewRenderer,
    images: ImageLoader,
    measure: Box<dyn TextMeasure + Send>,
    options: PreviewOptions,
    builders: Vec<Box<dyn OverlayBuilder>>,
    /// Last set built by each builder, index-aligned with `builders`.
    sets: Vec<OverlaySet>,
}

impl Session {
    /// Create a session over `text` with the cursor at the start.
    pub fn new(text: &str, options: PreviewOptions) -> Self {
        let document = Document::from_text(text);
        let parser = ComrakParser;
        let tree = parser.parse(&document);
        let builders = default_builders(&options);
        let mut session = Self {
            document,
            tree,
            parser: Box::new(parser),
            selection: Selection::default(),
            tracker: InteractionTracker::default(),
            gesture: DragGesture::new(),
            table_ranges: SourceModeRanges::new(),
            renderer: ViewRenderer::default(),
            images: ImageLoader::default(),
            measure: Box::new(MonospaceMeasure::default()),
            options,
            sets: Vec::new(),
            builders,
        };
        session.rebuild_all();
        session
    }

    /// Open a markdown file. Relative images resolve against the file's
    /// directory unless the options name a base path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read as UTF-8 text.
    pub fn open(path: &Path, mut options: PreviewOptions) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if options.image.base_path.is_none() {
            options.image.base_path = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(|dir| dir.to_string_lossy().into_owned());
        }
        tracing::debug!(path = %path.display(), chars = text.chars().count(), "opened document");
        Ok(Self::new(&text, options))
    }

    /// Swap the parser and rebuild everything.
    pub fn with_parser(mut self, parser: impl MarkdownParser + Send + 'static) -> Self {
        self.parser = Box::new(parser);
        self.tree = self.parser.parse(&self.document);
        self.rebuild_all();
        self
    }

    pub fn with_image_loader(mut self, loader: ImageLoader) -> Self {
        self.images = loader;
        self
    }

    pub fn with_renderer(mut self, renderer: ViewRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_measure(mut self, measure: impl TextMeasure + Send + 'static) -> Self {
        self.measure = Box::new(measure);
        self
    }

    pub const fn document(&self) -> &Document {
        &self.document
    }

    pub const fn tree(&self) -> &ParseTree {
        &self.tree
    }

    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    pub const fn state(&self) -> InteractionState {
        self.tracker.state()
    }

    pub const fn table_ranges(&self) -> &SourceModeRanges {
        &self.table_ranges
    }

    pub const fn options(&self) -> &PreviewOptions {
        &self.options
    }

    pub const fn image_loader(&self) -> &ImageLoader {
        &self.images
    }

    pub const fn renderer(&self) -> &ViewRenderer {
        &self.renderer
    }

    /// Every builder's current set, merged and sorted.
    pub fn overlays(&self) -> OverlaySet {
        OverlaySet::merge(&self.sets)
    }

    /// The current set of one builder, by name.
    pub fn overlays_of(&self, name: &str) -> Option<&OverlaySet> {
        self.builders
            .iter()
            .position(|builder| builder.name() == name)
            .map(|index| &self.sets[index])
    }

    /// Render an embedded view to HTML with the session's caches.
    pub fn render_view(&mut self, view: &View) -> String {
        self.renderer.render(view)
    }

    fn context(&self) -> BuildContext<'_> {
        BuildContext {
            doc: &self.document,
            tree: &self.tree,
            selection: &self.selection,
            state: self.tracker.state(),
            table_ranges: &self.table_ranges,
        }
    }

    fn rebuild_all(&mut self) {
        let ctx = self.context();
        let sets = self
            .builders
            .iter()
            .map(|builder| build_set(builder.as_ref(), &ctx))
            .collect();
        self.sets = sets;
        self.start_image_loads();
    }

    /// Kick off background loads for freshly emitted image views.
    fn start_image_loads(&self) {
        if !self.options.image.autoload {
            return;
        }
        for set in &self.sets {
            for overlay in set.replaces() {
                if let Some(View::Image(view)) = overlay.view() {
                    view.start_loading(&self.images);
                }
            }
        }
    }
}

/// Build one set. Inline-only builders never get to place block views.
fn build_set(builder: &dyn OverlayBuilder, ctx: &BuildContext<'_>) -> OverlaySet {
    let set = builder.build(ctx);
    if builder.durable() {
        return set;
    }
    let filtered = set.without_block_replaces();
    if filtered.len() != set.len() {
        tracing::warn!(builder = builder.name(), "dropped block replaces from inline builder");
    }
    filtered
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("chars", &self.document.len())
            .field("selection", &self.selection)
            .field("state", &self.tracker.state())
            .field("table_ranges", &self.table_ranges)
            .field("builders", &self.builders.iter().map(|b| b.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
