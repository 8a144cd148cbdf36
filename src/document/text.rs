use ropey::Rope;

use crate::changes::ChangeSet;

/// One line of a [`Document`], in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// One-based line number.
    pub number: usize,
    /// Offset of the first character of the line.
    pub from: usize,
    /// Offset just past the last character, excluding the line break.
    pub to: usize,
}

impl Line {
    /// Line length in characters (without the line break).
    pub const fn len(&self) -> usize {
        self.to - self.from
    }

    pub const fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

/// A text buffer backed by a rope, addressed by character offsets.
///
/// Each version is immutable: [`Document::apply`] produces the next version
/// and leaves `self` untouched. Cloning is cheap because rope nodes are shared.
#[derive(Debug, Clone, Default)]
pub struct Document {
    rope: Rope,
}

impl Document {
    /// Create a document from a string.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Create an empty document.
    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// The full text content.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Text between two character offsets. Out-of-range bounds are clamped.
    pub fn slice(&self, from: usize, to: usize) -> String {
        let len = self.len();
        let to = to.min(len);
        let from = from.min(to);
        self.rope.slice(from..to).to_string()
    }

    /// Character at `offset`, if any.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        if offset < self.len() {
            Some(self.rope.char(offset))
        } else {
            None
        }
    }

    /// Total number of lines. An empty document has one (empty) line.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// The line containing `offset` (clamped to the document length).
    pub fn line_at(&self, offset: usize) -> Line {
        let offset = offset.min(self.len());
        let idx = self.rope.char_to_line(offset);
        self.line_by_index(idx)
    }

    /// Line by one-based number.
    pub fn line(&self, number: usize) -> Option<Line> {
        if number == 0 || number > self.rope.len_lines() {
            return None;
        }
        Some(self.line_by_index(number - 1))
    }

    /// Every line touched by the span `[from, to]`, in order.
    pub fn lines_in(&self, from: usize, to: usize) -> Vec<Line> {
        let mut lines = Vec::new();
        let to = to.min(self.len());
        let mut pos = from.min(to);
        loop {
            let line = self.line_at(pos);
            lines.push(line);
            if line.to >= to || line.number >= self.line_count() {
                break;
            }
            pos = line.to + 1;
        }
        lines
    }

    /// Convert a byte offset into a character offset (clamped).
    pub fn byte_to_char(&self, byte: usize) -> usize {
        self.rope.byte_to_char(byte.min(self.rope.len_bytes()))
    }

    /// Byte offset of the start of a zero-based line (clamped).
    pub(crate) fn line_to_byte(&self, line_idx: usize) -> usize {
        if line_idx >= self.rope.len_lines() {
            return self.rope.len_bytes();
        }
        self.rope.line_to_byte(line_idx)
    }

    /// Produce the next document version by applying `changes`.
    ///
    /// Changes are expressed in this document's coordinates; they are applied
    /// back to front so earlier offsets stay valid.
    pub fn apply(&self, changes: &ChangeSet) -> Self {
        let mut rope = self.rope.clone();
        let len = rope.len_chars();
        for change in changes.iter().rev() {
            let to = change.to.min(len);
            let from = change.from.min(to);
            if from < to {
                rope.remove(from..to);
            }
            if !change.insert.is_empty() {
                rope.insert(from, &change.insert);
            }
        }
        Self { rope }
    }

    fn line_by_index(&self, idx: usize) -> Line {
        let from = self.rope.line_to_char(idx);
        let slice = self.rope.line(idx);
        let mut len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len -= 1;
        }
        if len > 0 && slice.char(len - 1) == '\r' {
            len -= 1;
        }
        Line {
            number: idx + 1,
            from,
            to: from + len,
        }
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}
