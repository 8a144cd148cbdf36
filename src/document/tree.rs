//! Typed syntax tree over a [`Document`](super::Document).

/// Every node kind the preview builders understand.
///
/// Parsers map their own node types onto this closed set; anything the
/// builders do not care about becomes [`NodeKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Paragraph,
    /// ATX or setext heading with its level (1-6).
    Heading(u8),
    HeaderMark,
    Blockquote,
    QuoteMark,
    List,
    ListItem,
    ListMark,
    FencedCode,
    /// Indented code block.
    CodeBlock,
    /// Info string after an opening fence.
    CodeInfo,
    /// Body of a fenced code block, excluding the fences.
    CodeText,
    Table,
    TableRow,
    TableCell,
    Emphasis,
    StrongEmphasis,
    Strikethrough,
    /// `*`/`_` delimiters of emphasis and strong emphasis.
    EmphasisMark,
    StrikethroughMark,
    InlineCode,
    /// Backtick run delimiting inline code.
    CodeMark,
    Link,
    Image,
    HtmlBlock,
    ThematicBreak,
    Text,
    Other,
}

impl NodeKind {
    /// Block-level syntax markers, revealed per line.
    pub const fn is_block_mark(self) -> bool {
        matches!(self, Self::HeaderMark | Self::ListMark | Self::QuoteMark)
    }

    /// Inline syntax markers, revealed per span.
    pub const fn is_inline_mark(self) -> bool {
        matches!(
            self,
            Self::EmphasisMark | Self::StrikethroughMark | Self::CodeMark
        )
    }

    /// Code containers whose contents are never decorated.
    pub const fn is_code_block(self) -> bool {
        matches!(self, Self::FencedCode | Self::CodeBlock)
    }
}

/// Index of a node inside its [`ParseTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A typed span `[from, to)` in character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub from: usize,
    pub to: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub const fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    pub const fn is_empty(&self) -> bool {
        self.to <= self.from
    }
}

/// Arena-backed parse tree. Node 0 is always the [`NodeKind::Document`] root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTree {
    nodes: Vec<Node>,
}

impl ParseTree {
    /// Create a tree holding only a root spanning `[0, len)`.
    pub fn new(len: usize) -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                from: 0,
                to: len,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a child under `parent`. Children must be pushed in document order.
    pub fn push(&mut self, parent: NodeId, kind: NodeKind, from: usize, to: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            from,
            to: to.max(from),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// First direct child of the given kind.
    pub fn child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.node(*child).kind == kind)
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |current| self.parent(*current))
    }

    /// True if any ancestor matches `pred`.
    pub fn has_ancestor(&self, id: NodeId, pred: impl Fn(NodeKind) -> bool) -> bool {
        self.ancestors(id).any(|a| pred(self.node(a).kind))
    }

    /// All nodes in pre-order (document order), root first.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: vec![self.root()],
        }
    }

    /// Nodes of one kind, in document order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().filter(move |id| self.node(*id).kind == kind)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds its root, so this is never true.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Pre-order traversal over a [`ParseTree`].
pub struct PreOrder<'a> {
    tree: &'a ParseTree,
    stack: Vec<NodeId>,
}

impl Iterator for PreOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
