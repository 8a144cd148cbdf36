//! Markdown parsing with comrak.
//!
//! comrak reports block and inline positions but not the delimiter runs
//! inside them, so marks (`#`, `>`, `-`, `**`, backticks, ...) are recovered
//! from the text and checked against the characters actually present.

use comrak::nodes::{AstNode, LineColumn, NodeValue};
use comrak::{Arena, Options, parse_document};

use super::text::Document;
use super::tree::{NodeId, NodeKind, ParseTree};

/// Produces a [`ParseTree`] for a document version.
pub trait MarkdownParser {
    fn parse(&self, doc: &Document) -> ParseTree;
}

/// Default parser: `CommonMark` plus GFM tables and strikethrough.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComrakParser;

impl MarkdownParser for ComrakParser {
    fn parse(&self, doc: &Document) -> ParseTree {
        let _scope = crate::perf::scope("parser.comrak");
        let source = doc.text();
        let arena = Arena::new();
        let mut options = Options::default();
        options.extension.strikethrough = true;
        options.extension.table = true;
        let root = parse_document(&arena, &source, &options);

        let mut builder = TreeBuilder {
            doc,
            tree: ParseTree::new(doc.len()),
        };
        let tree_root = builder.tree.root();
        for child in root.children() {
            builder.convert(child, tree_root);
        }
        tracing::trace!(nodes = builder.tree.len(), "parsed document");
        builder.tree
    }
}

/// Parse with the default parser.
pub fn parse(doc: &Document) -> ParseTree {
    ComrakParser.parse(doc)
}

#[derive(Debug, Clone, Copy)]
struct Shape {
    kind: NodeKind,
    setext: bool,
    fence_char: Option<char>,
}

fn shape_of(value: &NodeValue) -> Shape {
    let mut setext = false;
    let mut fence_char = None;
    let kind = match value {
        NodeValue::Document => NodeKind::Document,
        NodeValue::Paragraph => NodeKind::Paragraph,
        NodeValue::Heading(heading) => {
            setext = heading.setext;
            NodeKind::Heading(heading.level)
        }
        NodeValue::BlockQuote => NodeKind::Blockquote,
        NodeValue::List(_) => NodeKind::List,
        NodeValue::Item(_) => NodeKind::ListItem,
        NodeValue::CodeBlock(code) if code.fenced => {
            fence_char = Some(char::from(code.fence_char));
            NodeKind::FencedCode
        }
        NodeValue::CodeBlock(_) => NodeKind::CodeBlock,
        NodeValue::HtmlBlock(_) => NodeKind::HtmlBlock,
        NodeValue::ThematicBreak => NodeKind::ThematicBreak,
        NodeValue::Table(_) => NodeKind::Table,
        NodeValue::TableRow(_) => NodeKind::TableRow,
        NodeValue::TableCell => NodeKind::TableCell,
        NodeValue::Text(_) => NodeKind::Text,
        NodeValue::Emph => NodeKind::Emphasis,
        NodeValue::Strong => NodeKind::StrongEmphasis,
        NodeValue::Strikethrough => NodeKind::Strikethrough,
        NodeValue::Code(_) => NodeKind::InlineCode,
        NodeValue::Link(_) => NodeKind::Link,
        NodeValue::Image(_) => NodeKind::Image,
        _ => NodeKind::Other,
    };
    Shape {
        kind,
        setext,
        fence_char,
    }
}

struct TreeBuilder<'d> {
    doc: &'d Document,
    tree: ParseTree,
}

impl TreeBuilder<'_> {
    fn convert<'a>(&mut self, node: &'a AstNode<'a>, parent: NodeId) {
        let (shape, start, end) = {
            let ast = node.data.borrow();
            (shape_of(&ast.value), ast.sourcepos.start, ast.sourcepos.end)
        };
        let (from, to) = self.span(shape.kind, start, end);
        let id = self.tree.push(parent, shape.kind, from, to);

        match shape.kind {
            NodeKind::Heading(_) if !shape.setext => self.atx_mark(id, from, to),
            NodeKind::Blockquote => self.quote_marks(id, from, to),
            NodeKind::ListItem => self.list_mark(id, from, to),
            NodeKind::FencedCode => {
                self.fenced_parts(id, from, to, shape.fence_char.unwrap_or('`'));
                return;
            }
            NodeKind::CodeBlock | NodeKind::HtmlBlock => return,
            _ => {}
        }

        let delimiters = self.inline_delimiters(shape.kind, from, to);
        if let Some((open, _)) = delimiters {
            self.tree.push(id, mark_kind(shape.kind), from, from + open);
        }
        for child in node.children() {
            self.convert(child, id);
        }
        if let Some((_, close)) = delimiters {
            self.tree.push(id, mark_kind(shape.kind), to - close, to);
        }

        if shape.setext {
            self.setext_mark(id, from, to);
        }
    }

    /// Character span for a comrak source position (1-based, end inclusive).
    fn span(&self, kind: NodeKind, start: LineColumn, end: LineColumn) -> (usize, usize) {
        let from = self.start_offset(start);
        let mut to = self.end_offset(end).max(from);
        if kind == NodeKind::Table {
            to = self.table_end(from);
        }
        while to > from && matches!(self.doc.char_at(to - 1), Some('\n' | '\r')) {
            to -= 1;
        }
        (from, to)
    }

    fn start_offset(&self, pos: LineColumn) -> usize {
        if pos.line == 0 {
            return 0;
        }
        let line_byte = self.doc.line_to_byte(pos.line - 1);
        self.doc
            .byte_to_char(line_byte + pos.column.saturating_sub(1))
    }

    fn end_offset(&self, pos: LineColumn) -> usize {
        if pos.line == 0 {
            return 0;
        }
        let line_byte = self.doc.line_to_byte(pos.line - 1);
        if pos.column == 0 {
            return self.doc.byte_to_char(line_byte);
        }
        (self.doc.byte_to_char(line_byte + pos.column - 1) + 1).min(self.doc.len())
    }

    /// Tables end at the last consecutive piped line after their start.
    fn table_end(&self, from: usize) -> usize {
        let first = self.doc.line_at(from);
        let mut end = first.to;
        let mut number = first.number + 1;
        while let Some(line) = self.doc.line(number) {
            let text = self.doc.slice(line.from, line.to);
            if text.trim().is_empty() || !text.contains('|') {
                break;
            }
            end = line.to;
            number += 1;
        }
        end
    }

    fn atx_mark(&mut self, id: NodeId, from: usize, to: usize) {
        let hashes = self.count_run(from, to, '#');
        if (1..=6).contains(&hashes) {
            self.tree.push(id, NodeKind::HeaderMark, from, from + hashes);
        }
    }

    /// Setext underline (`===` or `---`) on the heading's last line.
    fn setext_mark(&mut self, id: NodeId, from: usize, to: usize) {
        let line = self.doc.line_at(to);
        if line.from <= from {
            return;
        }
        let text = self.doc.slice(line.from, line.to);
        let trimmed = text.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c == '=' || c == '-') {
            return;
        }
        let lead = text.chars().take_while(|c| c.is_whitespace()).count();
        let start = line.from + lead;
        self.tree
            .push(id, NodeKind::HeaderMark, start, start + trimmed.chars().count());
    }

    fn quote_marks(&mut self, id: NodeId, from: usize, to: usize) {
        let column = from - self.doc.line_at(from).from;
        for line in self.doc.lines_in(from, to) {
            let at = line.from + column;
            if at < line.to && self.doc.char_at(at) == Some('>') {
                self.tree.push(id, NodeKind::QuoteMark, at, at + 1);
            }
        }
    }

    fn list_mark(&mut self, id: NodeId, from: usize, to: usize) {
        let line_end = self.doc.line_at(from).to.min(to);
        let text = self.doc.slice(from, line_end);
        let lead = text.chars().take_while(|c| *c == ' ').count();
        let rest: Vec<char> = text.chars().skip(lead).collect();
        let len = match rest.first() {
            Some('-' | '*' | '+') => 1,
            Some(c) if c.is_ascii_digit() => {
                let digits = rest.iter().take_while(|c| c.is_ascii_digit()).count();
                match rest.get(digits) {
                    Some('.' | ')') => digits + 1,
                    _ => 0,
                }
            }
            _ => 0,
        };
        if len > 0 {
            let start = from + lead;
            self.tree.push(id, NodeKind::ListMark, start, start + len);
        }
    }

    fn fenced_parts(&mut self, id: NodeId, from: usize, to: usize, fence: char) {
        let lines = self.doc.lines_in(from, to);
        let Some(opening) = lines.first().copied() else {
            return;
        };
        let open_text = self.doc.slice(from, opening.to);
        let lead = open_text.chars().take_while(|c| *c == ' ').count();
        let fence_len = open_text.chars().skip(lead).take_while(|c| *c == fence).count();
        let info_start = from + lead + fence_len;
        let info = self.doc.slice(info_start, opening.to);
        let info_lead = info.chars().take_while(|c| c.is_whitespace()).count();
        let info_trimmed = info.trim();
        if !info_trimmed.is_empty() {
            let start = info_start + info_lead;
            self.tree
                .push(id, NodeKind::CodeInfo, start, start + info_trimmed.chars().count());
        }

        let mut body = &lines[1..];
        if let Some(last) = body.last() {
            let closing = self.doc.slice(last.from, last.to);
            let closing = closing.trim();
            if closing.chars().count() >= fence_len && closing.chars().all(|c| c == fence) {
                body = &body[..body.len() - 1];
            }
        }
        match (body.first(), body.last()) {
            (Some(first), Some(last)) => {
                self.tree.push(id, NodeKind::CodeText, first.from, last.to);
            }
            _ => {
                let at = (opening.to + 1).min(to);
                self.tree.push(id, NodeKind::CodeText, at, at);
            }
        }
    }

    /// Opening and closing delimiter lengths for inline containers, when the
    /// text at both ends really holds the expected delimiter runs.
    fn inline_delimiters(&self, kind: NodeKind, from: usize, to: usize) -> Option<(usize, usize)> {
        let first = self.doc.char_at(from)?;
        let (open, close) = match kind {
            NodeKind::Emphasis if matches!(first, '*' | '_') => (1, 1),
            NodeKind::StrongEmphasis if matches!(first, '*' | '_') => (2, 2),
            NodeKind::Strikethrough if first == '~' => {
                let run = self.count_run(from, to, '~').min(2);
                (run, run)
            }
            NodeKind::InlineCode if first == '`' => {
                let run = self.count_run(from, to, '`');
                (run, run)
            }
            _ => return None,
        };
        if open + close > to - from {
            return None;
        }
        let closes = (to - close..to).all(|at| self.doc.char_at(at) == Some(first));
        let opens = (from..from + open).all(|at| self.doc.char_at(at) == Some(first));
        (opens && closes).then_some((open, close))
    }

    fn count_run(&self, from: usize, to: usize, c: char) -> usize {
        (from..to)
            .take_while(|at| self.doc.char_at(*at) == Some(c))
            .count()
    }
}

const fn mark_kind(container: NodeKind) -> NodeKind {
    match container {
        NodeKind::Strikethrough => NodeKind::StrikethroughMark,
        NodeKind::InlineCode => NodeKind::CodeMark,
        _ => NodeKind::EmphasisMark,
    }
}
