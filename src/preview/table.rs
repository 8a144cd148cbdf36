//! Pipe tables: editable table view, or raw source pinned by a toggle.

use serde::Serialize;

use super::{BuildContext, OverlayBuilder, classes};
use crate::changes::{Assoc, ChangeSet, EditOperation};
use crate::classify::{UpdateAction, classify};
use crate::document::NodeKind;
use crate::interaction::Transition;
use crate::overlay::{Overlay, OverlaySet};
use crate::table::parse_table;
use crate::view::{TableSourceToggle, TableView, View};

/// A span the user pinned to source mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceModeRange {
    pub from: usize,
    pub to: usize,
}

impl SourceModeRange {
    /// Closed overlap: touching ends count.
    pub const fn overlaps(&self, from: usize, to: usize) -> bool {
        self.from <= to && self.to >= from
    }
}

/// Tables the user switched to source mode, kept in step with edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SourceModeRanges {
    ranges: Vec<SourceModeRange>,
}

impl SourceModeRanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin `[from, to)`. Ignored if it overlaps a range already pinned.
    pub fn show(&mut self, from: usize, to: usize) -> bool {
        if to <= from || self.covers(from, to) {
            return false;
        }
        self.ranges.push(SourceModeRange { from, to });
        true
    }

    /// Unpin every range overlapping `[from, to)`, returning how many went.
    pub fn hide(&mut self, from: usize, to: usize) -> usize {
        let before = self.ranges.len();
        self.ranges.retain(|range| !range.overlaps(from, to));
        before - self.ranges.len()
    }

    pub fn covers(&self, from: usize, to: usize) -> bool {
        self.ranges.iter().any(|range| range.overlaps(from, to))
    }

    /// Map every range through `changes`. Starts stick to text after an
    /// insertion, ends to text before it, so a range never grows to swallow
    /// inserted neighbours. Collapsed ranges and later duplicates go.
    pub fn remap(&mut self, changes: &ChangeSet) {
        if changes.is_empty() {
            return;
        }
        let mapped: Vec<SourceModeRange> = self
            .ranges
            .iter()
            .map(|range| map_range(changes, range.from, range.to))
            .collect();
        self.ranges.clear();
        for range in mapped {
            if range.to <= range.from {
                tracing::debug!(from = range.from, to = range.to, "dropping collapsed source-mode range");
                continue;
            }
            if self.covers(range.from, range.to) {
                tracing::debug!(from = range.from, to = range.to, "dropping overlapping source-mode range");
                continue;
            }
            self.ranges.push(range);
        }
    }

    /// Fold one operation: remap through its changes, then apply its
    /// toggles. Toggle spans are in pre-edit coordinates and are mapped
    /// the same way first.
    pub fn apply(&mut self, op: &EditOperation) {
        self.remap(&op.changes);
        for (from, to, show_source) in op.table_toggles() {
            let range = map_range(&op.changes, from, to);
            if show_source {
                self.show(range.from, range.to);
            } else {
                self.hide(range.from, range.to);
            }
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceModeRange> {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

fn map_range(changes: &ChangeSet, from: usize, to: usize) -> SourceModeRange {
    SourceModeRange {
        from: changes.map_pos(from, Assoc::After),
        to: changes.map_pos(to, Assoc::Before),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableBuilder;

impl OverlayBuilder for TableBuilder {
    fn name(&self) -> &'static str {
        "table"
    }

    fn durable(&self) -> bool {
        true
    }

    fn classify(&self, op: &EditOperation, transition: Transition) -> UpdateAction {
        if op.table_toggles().next().is_some() {
            return UpdateAction::Rebuild;
        }
        classify(op, transition)
    }

    fn build(&self, ctx: &BuildContext<'_>) -> OverlaySet {
        let _scope = crate::perf::scope("preview.table");
        let visibility = ctx.visibility();
        if visibility.is_disabled() {
            return OverlaySet::empty();
        }

        let mut items = Vec::new();
        for id in ctx.tree.nodes_of_kind(NodeKind::Table) {
            let node = ctx.tree.node(id);
            let Some(data) = parse_table(&ctx.text(id)) else {
                tracing::trace!(from = node.from, "skipping malformed table");
                continue;
            };
            let pinned = ctx.table_ranges.covers(node.from, node.to);
            if !pinned && !visibility.shows_source(ctx.selection, node.from, node.to) {
                let view = View::Table(TableView::new(data, node.from, node.to));
                items.push(Overlay::block(node.from, node.to, view));
                continue;
            }
            if pinned {
                let toggle = View::TableSourceToggle(TableSourceToggle::new(node.from, node.to));
                items.push(Overlay::block(node.from, node.from, toggle));
            }
            for at in ctx.line_starts(node.from, node.to) {
                items.push(Overlay::line(at, classes::TABLE_SOURCE));
            }
        }
        OverlaySet::new(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::{Change, Effect};
    use crate::preview::test_support::Fixture;
    use crate::selection::Selection;

    const DOC: &str = "intro\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\nafter\n";
    // Table spans [7, 36).

    #[test]
    fn test_show_ignores_overlapping_range() {
        let mut ranges = SourceModeRanges::new();
        assert!(ranges.show(10, 20));
        assert!(!ranges.show(20, 30));
        assert!(ranges.show(21, 30));
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn test_hide_removes_every_overlap() {
        let mut ranges = SourceModeRanges::new();
        ranges.show(0, 5);
        ranges.show(10, 15);
        ranges.show(30, 40);
        assert_eq!(ranges.hide(4, 12), 2);
        assert_eq!(ranges.iter().copied().collect::<Vec<_>>(), vec![SourceModeRange {
            from: 30,
            to: 40
        }]);
    }

    #[test]
    fn test_range_survives_insertion_before() {
        let mut ranges = SourceModeRanges::new();
        ranges.show(7, 36);
        ranges.remap(&ChangeSet::single(Change::insert(0, "# Title\n")));
        assert_eq!(ranges.iter().next(), Some(&SourceModeRange { from: 15, to: 44 }));
    }

    #[test]
    fn test_insertion_at_edges_does_not_grow_range() {
        let mut ranges = SourceModeRanges::new();
        ranges.show(10, 20);
        ranges.remap(&ChangeSet::new(vec![
            Change::insert(10, "ab"),
            Change::insert(20, "cd"),
        ]));
        assert_eq!(ranges.iter().next(), Some(&SourceModeRange { from: 12, to: 22 }));
    }

    #[test]
    fn test_deleted_range_is_dropped() {
        let mut ranges = SourceModeRanges::new();
        ranges.show(10, 20);
        ranges.remap(&ChangeSet::single(Change::delete(5, 25)));
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_apply_maps_toggle_through_same_operation() {
        let mut ranges = SourceModeRanges::new();
        let op = EditOperation::new()
            .with_changes(ChangeSet::single(Change::insert(0, "xx")))
            .with_effect(Effect::TableSourceMode {
                from: 7,
                to: 36,
                show_source: true,
            });
        ranges.apply(&op);
        assert_eq!(ranges.iter().next(), Some(&SourceModeRange { from: 9, to: 38 }));
    }

    #[test]
    fn test_table_renders_away_from_cursor() {
        let fixture = Fixture::new(DOC, 0);
        let set = TableBuilder.build(&fixture.ctx());
        assert_eq!(set.len(), 1);
        let overlay = &set.as_slice()[0];
        assert!(overlay.is_block_replace());
        assert_eq!((overlay.from(), overlay.to()), (7, 36));
        assert!(matches!(overlay.view(), Some(View::Table(_))));
    }

    #[test]
    fn test_table_source_at_cursor() {
        let fixture = Fixture::new(DOC, 10);
        let set = TableBuilder.build(&fixture.ctx());
        let lines: Vec<usize> = set.iter().map(Overlay::from).collect();
        assert_eq!(lines, vec![7, 17, 27]);
        assert!(set.iter().all(|o| o.class() == Some(classes::TABLE_SOURCE)));
    }

    #[test]
    fn test_pinned_table_shows_toggle_even_while_dragging() {
        let mut fixture = Fixture::new(DOC, 0).dragging();
        fixture.ranges.show(7, 36);
        let set = TableBuilder.build(&fixture.ctx());
        let first = &set.as_slice()[0];
        assert_eq!((first.from(), first.to()), (7, 7));
        assert!(matches!(first.view(), Some(View::TableSourceToggle(_))));
        assert_eq!(set.with_class(classes::TABLE_SOURCE).count(), 3);
    }

    #[test]
    fn test_invalid_table_never_replaced() {
        let text = "| a | b |\n| nope | x |\n| 1 | 2 |\n";
        for cursor in [0, 40] {
            let fixture = Fixture::new(text, cursor);
            assert!(!TableBuilder.build(&fixture.ctx()).iter().any(Overlay::is_replace));
        }
    }

    #[test]
    fn test_toggle_forces_rebuild_even_mid_drag() {
        let op = EditOperation::new().with_effect(Effect::TableSourceMode {
            from: 1,
            to: 2,
            show_source: false,
        });
        assert_eq!(
            TableBuilder.classify(&op, Transition::steady(true)),
            UpdateAction::Rebuild
        );
        let select = EditOperation::new().with_selection(Selection::cursor(1));
        assert_eq!(
            TableBuilder.classify(&select, Transition::steady(true)),
            UpdateAction::Skip
        );
    }
}
