use crate::changes::{ChangeSet, EditOperation, Effect};
use crate::classify::UpdateAction;
use crate::document::NodeKind;
use crate::preview::BuildContext;
use crate::selection::Selection;
use crate::table::parse_table;
use crate::overlay::OverlaySet;
use crate::view::{ClickLine, CodeBlockView, TableView, View};

use super::{Session, build_set};

/// Every event a host can feed into a [`Session`].
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A host transaction: text changes, selection, effects.
    Edit(EditOperation),
    /// Pointer pressed inside the editor.
    PointerDown,
    /// Pointer released; the drag ends on the next frame.
    PointerUp,
    /// Next animation frame.
    AnimationFrame,
    SetLivePreview(bool),
    /// Pin the table at `[from, to)` to source mode.
    ShowTableSource { from: usize, to: usize },
    /// Return the table at `[from, to)` to its rendered view.
    HideTableSource { from: usize, to: usize },
    /// Commit a cell edit in the table starting at `table_from`. Row 0 is
    /// the header.
    EditTableCell {
        table_from: usize,
        row: usize,
        col: usize,
        value: String,
    },
    /// Click inside the rendered code block starting at `from`; `x` is in
    /// the session's text measure units.
    ClickCodeBlock { from: usize, line: ClickLine, x: f32 },
}

impl Session {
    /// Apply one message. Returns the names of the builders whose sets were
    /// rebuilt.
    pub fn update(&mut self, msg: Message) -> Vec<&'static str> {
        match msg {
            Message::Edit(op) => self.dispatch(&op),
            Message::PointerDown => {
                let op = self.gesture.pointer_down();
                self.dispatch(&op)
            }
            Message::PointerUp => {
                self.gesture.pointer_up();
                Vec::new()
            }
            Message::AnimationFrame => match self.gesture.next_frame() {
                Some(op) => self.dispatch(&op),
                None => Vec::new(),
            },
            Message::SetLivePreview(enabled) => {
                let op = EditOperation::new()
                    .with_effect(Effect::SetLivePreview(enabled))
                    .with_reconfigured();
                self.dispatch(&op)
            }
            Message::ShowTableSource { from, to } => self.toggle_table(from, to, true),
            Message::HideTableSource { from, to } => self.toggle_table(from, to, false),
            Message::EditTableCell {
                table_from,
                row,
                col,
                value,
            } => {
                let change = self
                    .table_at(table_from)
                    .and_then(|table| table.edit_cell(row, col, &value));
                match change {
                    Some(change) => {
                        let op = EditOperation::new().with_changes(ChangeSet::single(change));
                        self.dispatch(&op)
                    }
                    None => {
                        tracing::debug!(table_from, row, col, "table cell edit ignored");
                        Vec::new()
                    }
                }
            }
            Message::ClickCodeBlock { from, line, x } => {
                let offset = self
                    .code_block_at(from)
                    .map(|view| view.offset_at(line, x, self.measure.as_ref()));
                match offset {
                    Some(offset) => {
                        let op = EditOperation::new().with_selection(Selection::cursor(offset));
                        self.dispatch(&op)
                    }
                    None => {
                        tracing::debug!(from, "click outside any rendered code block");
                        Vec::new()
                    }
                }
            }
        }
    }

    fn toggle_table(&mut self, from: usize, to: usize, show_source: bool) -> Vec<&'static str> {
        let op = EditOperation::new().with_effect(Effect::TableSourceMode {
            from,
            to,
            show_source,
        });
        self.dispatch(&op)
    }

    /// The valid table whose source starts at `from`.
    fn table_at(&self, from: usize) -> Option<TableView> {
        let id = self
            .tree
            .nodes_of_kind(NodeKind::Table)
            .find(|&id| self.tree.node(id).from == from)?;
        let node = self.tree.node(id);
        let data = parse_table(&self.document.slice(node.from, node.to))?;
        Some(TableView::new(data, node.from, node.to))
    }

    fn code_block_at(&self, from: usize) -> Option<&CodeBlockView> {
        self.sets
            .iter()
            .flat_map(OverlaySet::replaces)
            .find_map(|overlay| match overlay.view() {
                Some(View::CodeBlock(view)) if view.from == from => Some(view),
                _ => None,
            })
    }

    fn dispatch(&mut self, op: &EditOperation) -> Vec<&'static str> {
        let _scope = crate::perf::scope("session.update");
        let transition = self.tracker.apply(op);

        if op.doc_changed() {
            self.document = self.document.apply(&op.changes);
            self.tree = self.parser.parse(&self.document);
        }
        let len = self.document.len();
        self.selection = match &op.selection {
            Some(selection) => selection.clamp(len),
            None => self.selection.map(&op.changes).clamp(len),
        };
        self.table_ranges.apply(op);

        let ctx = BuildContext {
            doc: &self.document,
            tree: &self.tree,
            selection: &self.selection,
            state: self.tracker.state(),
            table_ranges: &self.table_ranges,
        };
        let mut rebuilt = Vec::new();
        let mut images_rebuilt = false;
        for (builder, set) in self.builders.iter().zip(self.sets.iter_mut()) {
            match builder.classify(op, transition) {
                UpdateAction::Rebuild => {
                    *set = build_set(builder.as_ref(), &ctx);
                    images_rebuilt |= set
                        .replaces()
                        .any(|overlay| matches!(overlay.view(), Some(View::Image(_))));
                    rebuilt.push(builder.name());
                }
                UpdateAction::Skip | UpdateAction::None => {}
            }
        }
        tracing::debug!(?rebuilt, ?transition, "dispatched operation");
        if crate::perf::is_debug_log_enabled() {
            crate::perf::log_event("session.update", format!("rebuilt {rebuilt:?}"));
        }
        if images_rebuilt {
            self.start_image_loads();
        }
        rebuilt
    }
}
