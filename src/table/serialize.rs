use super::{Alignment, TableData};

/// Render table data back to pipe-table markdown.
///
/// Output of this function parses back to the same data, and serializing
/// that again yields identical text.
pub fn serialize_table(table: &TableData) -> String {
    let mut lines = Vec::with_capacity(table.rows.len() + 2);
    lines.push(row_line(table.headers.iter().map(|c| escape_cell(c))));
    lines.push(row_line(
        table.alignments.iter().map(|a| separator_cell(*a).to_string()),
    ));
    for row in &table.rows {
        lines.push(row_line(row.iter().map(|c| escape_cell(c))));
    }
    lines.join("\n")
}

fn row_line(cells: impl Iterator<Item = String>) -> String {
    format!("| {} |", cells.collect::<Vec<_>>().join(" | "))
}

fn escape_cell(value: &str) -> String {
    value
        .replace('|', "\\|")
        .replace("\r\n", " ")
        .replace('\n', " ")
        .trim()
        .to_string()
}

const fn separator_cell(alignment: Option<Alignment>) -> &'static str {
    match alignment {
        Some(Alignment::Left) => ":---",
        Some(Alignment::Right) => "---:",
        Some(Alignment::Center) => ":---:",
        None => "---",
    }
}
