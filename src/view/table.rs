use std::fmt::Write as _;

use serde::Serialize;

use crate::changes::{Change, Effect};
use crate::table::{TableData, render_inline_markdown, serialize_table};

/// A rendered, editable table for the source span `[from, to)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub data: TableData,
    pub from: usize,
    pub to: usize,
}

impl TableView {
    pub const fn new(data: TableData, from: usize, to: usize) -> Self {
        Self { data, from, to }
    }

    /// The change that commits a new cell value, or `None` if the value is
    /// unchanged or the cell does not exist. Row 0 is the header.
    pub fn edit_cell(&self, row: usize, col: usize, value: &str) -> Option<Change> {
        if self.data.cell(row, col)? == value {
            return None;
        }
        let mut updated = self.data.clone();
        updated.set_cell(row, col, value);
        Some(Change::replace(self.from, self.to, serialize_table(&updated)))
    }

    /// Effect pinning this table in source mode.
    pub const fn show_source(&self) -> Effect {
        Effect::TableSourceMode {
            from: self.from,
            to: self.to,
            show_source: true,
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from(r#"<div class="lm-table-editor">"#);
        let _ = write!(
            html,
            r#"<div class="lm-table-toolbar"><button type="button" class="lm-table-toggle" data-from="{}" data-to="{}">MD</button></div>"#,
            self.from, self.to
        );
        html.push_str("<table><thead><tr>");
        for (col, header) in self.data.headers.iter().enumerate() {
            self.push_cell(&mut html, "th", 0, col, header);
        }
        html.push_str("</tr></thead><tbody>");
        for (row, cells) in self.data.rows.iter().enumerate() {
            html.push_str("<tr>");
            for (col, cell) in cells.iter().enumerate() {
                self.push_cell(&mut html, "td", row + 1, col, cell);
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table></div>");
        html
    }

    fn push_cell(&self, html: &mut String, tag: &str, row: usize, col: usize, value: &str) {
        let style = self
            .data
            .alignments
            .get(col)
            .copied()
            .flatten()
            .map(|a| format!(r#" style="text-align: {}""#, a.as_css()))
            .unwrap_or_default();
        let _ = write!(
            html,
            r#"<{tag} class="lm-table-cell" data-row="{row}" data-col="{col}"{style}>{}</{tag}>"#,
            render_inline_markdown(value)
        );
    }
}

/// Button shown above a table pinned in source mode; switches it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableSourceToggle {
    pub from: usize,
    pub to: usize,
}

impl TableSourceToggle {
    pub const fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    /// Effect unpinning the table.
    pub const fn hide_source(&self) -> Effect {
        Effect::TableSourceMode {
            from: self.from,
            to: self.to,
            show_source: false,
        }
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<div class="lm-table-source-toggle"><button type="button" class="lm-table-toggle" data-from="{}" data-to="{}">Table</button></div>"#,
            self.from, self.to
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_table;

    fn view() -> TableView {
        let data = parse_table("| a | b |\n|:--|--:|\n| **x** | 2 |").unwrap();
        TableView::new(data, 10, 40)
    }

    #[test]
    fn test_edit_cell_replaces_whole_table() {
        let change = view().edit_cell(1, 1, "3").unwrap();
        assert_eq!((change.from, change.to), (10, 40));
        assert_eq!(change.insert, "| a | b |\n| :--- | ---: |\n| **x** | 3 |");
    }

    #[test]
    fn test_edit_cell_unchanged_is_none() {
        assert!(view().edit_cell(1, 1, "2").is_none());
        assert!(view().edit_cell(5, 0, "z").is_none());
    }

    #[test]
    fn test_to_html_aligns_and_renders_inline() {
        let html = view().to_html();
        assert!(html.contains(r#"<th class="lm-table-cell" data-row="0" data-col="0" style="text-align: left">a</th>"#));
        assert!(html.contains(r#"style="text-align: right""#));
        assert!(html.contains(r#"<strong class="lm-strong">x</strong>"#));
    }

    #[test]
    fn test_toggle_effects() {
        assert_eq!(
            view().show_source(),
            Effect::TableSourceMode {
                from: 10,
                to: 40,
                show_source: true
            }
        );
        assert_eq!(
            TableSourceToggle::new(10, 40).hide_source(),
            Effect::TableSourceMode {
                from: 10,
                to: 40,
                show_source: false
            }
        );
    }
}
