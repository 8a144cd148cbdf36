use std::fmt::Write as _;

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::highlight::Highlighter;

/// Measures rendered text width, in the same unit as click coordinates.
pub trait TextMeasure {
    fn width(&self, text: &str) -> f32;
}

/// Fixed-pitch measurement: display columns times a cell width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasure {
    pub char_width: f32,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self { char_width: 1.0 }
    }
}

impl TextMeasure for MonospaceMeasure {
    #[allow(clippy::cast_precision_loss)]
    fn width(&self, text: &str) -> f32 {
        text.width() as f32 * self.char_width
    }
}

/// Which rendered line of a code block was clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickLine {
    OpeningFence,
    ClosingFence,
    /// Zero-based line of the code body.
    Code(usize),
}

/// A highlighted fenced code block for the source span `[from, to)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlockView {
    pub code: String,
    pub language: String,
    pub show_line_numbers: bool,
    pub show_copy_button: bool,
    pub from: usize,
    pub to: usize,
    /// Offset of the first code character.
    pub code_from: usize,
    /// Absolute offset of each code line.
    pub line_starts: Vec<usize>,
}

impl CodeBlockView {
    /// Map a click to a document offset.
    ///
    /// Fence lines map to the block edges. On a code line the column is the
    /// character boundary nearest to `x`, clamped to the line length.
    pub fn offset_at(&self, line: ClickLine, x: f32, measure: &dyn TextMeasure) -> usize {
        match line {
            ClickLine::OpeningFence => self.from,
            ClickLine::ClosingFence => self.to,
            ClickLine::Code(index) => match self.line_starts.get(index) {
                Some(start) => {
                    let text = self.code.split('\n').nth(index).unwrap_or_default();
                    let text = text.strip_suffix('\r').unwrap_or(text);
                    start + column_at(text, x, measure)
                }
                None => self.from,
            },
        }
    }

    pub fn to_html(&self, highlighter: &dyn Highlighter) -> String {
        let mut classes = String::from("lm-codeblock-widget");
        if self.show_line_numbers {
            classes.push_str(" lm-codeblock-line-numbers");
        }
        let mut html = String::new();
        let _ = write!(
            html,
            r#"<div class="{classes}" data-from="{}" data-to="{}" data-language="{}">"#,
            self.from,
            self.to,
            html_escape::encode_double_quoted_attribute(&self.language)
        );
        if self.show_copy_button {
            html.push_str(
                r#"<button type="button" class="lm-codeblock-copy" aria-label="Copy code">Copy</button>"#,
            );
        }
        html.push_str("<pre><code>");
        let _ = write!(
            html,
            r#"<span class="lm-codeblock-line lm-codeblock-fence" data-line-index="-1">```{}</span>"#,
            html_escape::encode_text(&self.language)
        );
        let language = Some(self.language.as_str()).filter(|l| !l.is_empty());
        for (index, line) in self.code.split('\n').enumerate() {
            let highlighted = highlighter.highlight(line, language).html;
            let body = if highlighted.is_empty() { " " } else { highlighted.trim_end_matches('\n') };
            let _ = write!(
                html,
                r#"<span class="lm-codeblock-line" data-line-index="{index}">{body}</span>"#
            );
        }
        html.push_str(
            r#"<span class="lm-codeblock-line lm-codeblock-fence" data-line-index="-2">```</span>"#,
        );
        html.push_str("</code></pre></div>");
        html
    }
}

fn column_at(text: &str, x: f32, measure: &dyn TextMeasure) -> usize {
    if x <= 0.0 {
        return 0;
    }
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let chars = boundaries.len() - 1;
    let prefix_width = |n: usize| measure.width(&text[..boundaries[n]]);

    let (mut low, mut high) = (0, chars);
    while low < high {
        let mid = (low + high).div_ceil(2);
        if prefix_width(mid) <= x {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    if low < chars {
        let midpoint = (prefix_width(low) + prefix_width(low + 1)) / 2.0;
        if x > midpoint {
            low += 1;
        }
    }
    low.min(chars)
}
