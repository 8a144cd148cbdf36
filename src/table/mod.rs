//! Markdown pipe tables: parsing, serialization and cell rendering.

mod inline;
mod parse;
mod serialize;

use serde::Serialize;

pub use inline::render_inline_markdown;
pub use parse::parse_table;
pub use serialize::serialize_table;

/// Column alignment from the separator row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// A parsed table. Every data row has exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableData {
    pub headers: Vec<String>,
    pub alignments: Vec<Option<Alignment>>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Cell value. Row 0 is the header, data rows start at 1.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        if row == 0 {
            self.headers.get(col).map(String::as_str)
        } else {
            self.rows.get(row - 1)?.get(col).map(String::as_str)
        }
    }

    /// Replace one cell. Returns `false` when the position is out of range.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) -> bool {
        let slot = if row == 0 {
            self.headers.get_mut(col)
        } else {
            self.rows.get_mut(row - 1).and_then(|r| r.get_mut(col))
        };
        match slot {
            Some(cell) => {
                *cell = value.into();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TableData {
        parse_table("| Name | Age |\n|:---|---:|\n| Ann | 31 |\n| Bob | 42 |").unwrap()
    }

    #[test]
    fn test_cell_addresses_header_as_row_zero() {
        let table = sample();
        assert_eq!(table.cell(0, 1), Some("Age"));
        assert_eq!(table.cell(2, 0), Some("Bob"));
        assert_eq!(table.cell(3, 0), None);
    }

    #[test]
    fn test_set_cell_then_serialize() {
        let mut table = sample();
        assert!(table.set_cell(1, 1, "32"));
        assert!(table.set_cell(0, 0, "Who"));
        assert_eq!(
            serialize_table(&table),
            "| Who | Age |\n| :--- | ---: |\n| Ann | 32 |\n| Bob | 42 |"
        );
    }

    #[test]
    fn test_set_cell_out_of_range() {
        let mut table = sample();
        assert!(!table.set_cell(9, 0, "x"));
        assert!(!table.set_cell(1, 5, "x"));
        assert_eq!(table, sample());
    }
}
