use std::sync::LazyLock;

use regex::Regex;

use super::{Alignment, TableData};

static SEPARATOR_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:?-+:?$").expect("valid separator regex"));

const PIPE_PLACEHOLDER: char = '\u{0}';

/// Parse the raw text of a pipe table.
///
/// Blank lines are ignored. Returns `None` unless there is a header row and
/// a separator row with the same number of cells. Data rows are padded or
/// truncated to the header width; `\|` stays a literal `|` inside a cell.
pub fn parse_table(source: &str) -> Option<TableData> {
    let lines: Vec<&str> = source.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return None;
    }

    let headers = split_row(lines[0]);
    if headers.is_empty() {
        return None;
    }

    let separator = split_row(lines[1]);
    if separator.is_empty() || !separator.iter().all(|c| SEPARATOR_CELL.is_match(c)) {
        return None;
    }
    if separator.len() != headers.len() {
        return None;
    }

    let alignments = separator.iter().map(|c| alignment(c)).collect();
    let rows = lines[2..]
        .iter()
        .map(|line| {
            let mut cells = split_row(line);
            cells.resize(headers.len(), String::new());
            cells
        })
        .collect();

    Some(TableData {
        headers,
        alignments,
        rows,
    })
}

fn split_row(line: &str) -> Vec<String> {
    let protected = line.replace("\\|", &PIPE_PLACEHOLDER.to_string());
    let mut cells: Vec<&str> = protected.split('|').collect();
    if cells.first().is_some_and(|c| c.trim().is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.trim().is_empty()) {
        cells.pop();
    }
    cells
        .into_iter()
        .map(|c| c.replace(PIPE_PLACEHOLDER, "|").trim().to_string())
        .collect()
}

fn alignment(cell: &str) -> Option<Alignment> {
    match (cell.starts_with(':'), cell.ends_with(':')) {
        (true, true) => Some(Alignment::Center),
        (true, false) => Some(Alignment::Left),
        (false, true) => Some(Alignment::Right),
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_table() {
        let table = parse_table("| a | b |\n|---|---|\n| 1 | 2 |").unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.alignments, vec![None, None]);
        assert_eq!(table.rows, vec![vec!["1", "2"]]);
    }

    #[test]
    fn test_parse_alignments() {
        let table = parse_table("| a | b | c | d |\n|:--|:-:|--:|---|").unwrap();
        assert_eq!(
            table.alignments,
            vec![
                Some(Alignment::Left),
                Some(Alignment::Center),
                Some(Alignment::Right),
                None
            ]
        );
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_parse_escaped_pipe() {
        let table = parse_table("| a \\| b | flag |\n|---|---|\n| x \\| y | true |").unwrap();
        assert_eq!(table.headers, vec!["a | b", "flag"]);
        assert_eq!(table.rows[0], vec!["x | y", "true"]);
    }

    #[test]
    fn test_parse_pads_and_truncates_rows() {
        let table = parse_table("| a | b |\n|---|---|\n| 1 |\n| 1 | 2 | 3 |").unwrap();
        assert_eq!(table.rows[0], vec!["1", ""]);
        assert_eq!(table.rows[1], vec!["1", "2"]);
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let table = parse_table("\n| a |\n\n|---|\n\n| 1 |\n").unwrap();
        assert_eq!(table.rows, vec![vec!["1"]]);
    }

    #[test]
    fn test_parse_without_outer_pipes() {
        let table = parse_table("a | b\n--- | ---\n1 | 2").unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows[0], vec!["1", "2"]);
    }

    #[test]
    fn test_reject_single_line() {
        assert!(parse_table("| a | b |").is_none());
    }

    #[test]
    fn test_reject_bad_separator() {
        assert!(parse_table("| a | b |\n| x | y |").is_none());
        assert!(parse_table("| a | b |\n|-:-|---|").is_none());
    }

    #[test]
    fn test_reject_column_mismatch() {
        assert!(parse_table("| a | b |\n|---|").is_none());
    }

    #[test]
    fn test_reject_empty_header() {
        assert!(parse_table("||\n|---|").is_none());
    }
}
