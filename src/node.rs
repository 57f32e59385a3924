//! Document tree representation shared by every codec and operator.
//!
//! A decoded document lives in a [`Tree`], an arena that owns every node.
//! Nodes refer to their children (and aliases to their targets) through
//! [`NodeId`] handles, so sharing introduced by YAML aliases never turns into
//! ownership and cycles can only be followed through [`Tree::resolve_alias`],
//! which guards against them.
//!
//! # Examples
//!
//! ```
//! use treeq::node::{Node, Tag, Tree};
//!
//! let mut tree = Tree::new();
//! let root = tree.add(Node::mapping());
//! let key = tree.add(Node::string("name"));
//! let value = tree.add(Node::string("treeq"));
//! tree.add_key_value(root, key, value);
//!
//! assert_eq!(tree.map_value(root, "name"), Some(value));
//! assert_eq!(tree.get(value).guess_tag(), Tag::Str);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Handle to a node stored in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Semantic type label of a node.
///
/// Core tags print as `!!str`, `!!int`, ... Anything else is kept verbatim as
/// a custom tag (for example `!secret`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Str,
    Int,
    Float,
    Bool,
    Null,
    Map,
    Seq,
    Custom(String),
}

impl Tag {
    /// Parses a tag as written in a document (`!!str`, `tag:yaml.org,2002:int`, `!custom`).
    pub fn parse(raw: &str) -> Tag {
        let short = raw.strip_prefix("tag:yaml.org,2002:").map(|s| format!("!!{s}"));
        match short.as_deref().unwrap_or(raw) {
            "!!str" => Tag::Str,
            "!!int" => Tag::Int,
            "!!float" => Tag::Float,
            "!!bool" => Tag::Bool,
            "!!null" => Tag::Null,
            "!!map" => Tag::Map,
            "!!seq" => Tag::Seq,
            other => Tag::Custom(other.to_string()),
        }
    }

    /// Infers the tag a plain scalar with this content would resolve to.
    ///
    /// Precedence: null, bool, int, float, then string. The empty string is a
    /// string, not a null.
    pub fn infer(value: &str) -> Tag {
        if value.is_empty() {
            return Tag::Str;
        }
        if NULL_RE.is_match(value) {
            Tag::Null
        } else if BOOL_RE.is_match(value) {
            Tag::Bool
        } else if INT_RE.is_match(value) {
            Tag::Int
        } else if FLOAT_RE.is_match(value) {
            Tag::Float
        } else {
            Tag::Str
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Tag::Custom(_))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Str => write!(f, "!!str"),
            Tag::Int => write!(f, "!!int"),
            Tag::Float => write!(f, "!!float"),
            Tag::Bool => write!(f, "!!bool"),
            Tag::Null => write!(f, "!!null"),
            Tag::Map => write!(f, "!!map"),
            Tag::Seq => write!(f, "!!seq"),
            Tag::Custom(name) => write!(f, "{}", name),
        }
    }
}

static NULL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(~|null|Null|NULL)$").expect("static regex"));
static BOOL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(true|True|TRUE|false|False|FALSE)$").expect("static regex")
});
static INT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([-+]?[0-9]+|0o[0-7]+|0x[0-9a-fA-F]+)$").expect("static regex")
});
static FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?|[-+]?\.(inf|Inf|INF)|\.(nan|NaN|NAN))$")
        .expect("static regex")
});

/// Presentation style of a node. Only affects encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    Plain,
    DoubleQuoted,
    SingleQuoted,
    Literal,
    Folded,
    Flow,
}

/// The kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar(String),
    /// Alternating key and value handles.
    Mapping(Vec<NodeId>),
    Sequence(Vec<NodeId>),
    /// Non-owning reference to the anchored node.
    Alias(NodeId),
    Document(Vec<NodeId>),
}

/// A single node of a document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub tag: Tag,
    pub style: Style,
    pub anchor: Option<String>,
    pub head_comment: String,
    pub line_comment: String,
    pub foot_comment: String,
}

impl Node {
    fn with_kind(kind: NodeKind, tag: Tag) -> Self {
        Node {
            kind,
            tag,
            style: Style::Plain,
            anchor: None,
            head_comment: String::new(),
            line_comment: String::new(),
            foot_comment: String::new(),
        }
    }

    pub fn scalar(tag: Tag, value: impl Into<String>) -> Self {
        Node::with_kind(NodeKind::Scalar(value.into()), tag)
    }

    /// A scalar whose tag is inferred from its content.
    pub fn inferred(value: impl Into<String>) -> Self {
        let value = value.into();
        let tag = Tag::infer(&value);
        Node::scalar(tag, value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Node::scalar(Tag::Str, value)
    }

    pub fn null() -> Self {
        Node::scalar(Tag::Null, "null")
    }

    pub fn boolean(value: bool) -> Self {
        Node::scalar(Tag::Bool, value.to_string())
    }

    pub fn integer(value: i64) -> Self {
        Node::scalar(Tag::Int, value.to_string())
    }

    pub fn mapping() -> Self {
        Node::with_kind(NodeKind::Mapping(Vec::new()), Tag::Map)
    }

    pub fn sequence() -> Self {
        Node::with_kind(NodeKind::Sequence(Vec::new()), Tag::Seq)
    }

    pub fn sequence_of(items: Vec<NodeId>) -> Self {
        Node::with_kind(NodeKind::Sequence(items), Tag::Seq)
    }

    pub fn alias(target: NodeId) -> Self {
        Node::with_kind(NodeKind::Alias(target), Tag::Custom(String::new()))
    }

    pub fn document(root: NodeId) -> Self {
        Node::with_kind(NodeKind::Document(vec![root]), Tag::Custom(String::new()))
    }

    /// Short name of the node kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Scalar(_) => "scalar",
            NodeKind::Mapping(_) => "mapping",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Alias(_) => "alias",
            NodeKind::Document(_) => "document",
        }
    }

    /// Tag as shown in error messages; untagged aliases and documents show their kind.
    pub fn describe(&self) -> String {
        match &self.tag {
            Tag::Custom(name) if name.is_empty() => self.kind_name().to_string(),
            tag => tag.to_string(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, NodeKind::Scalar(_))
    }

    pub fn is_null(&self) -> bool {
        self.is_scalar() && self.guess_tag() == Tag::Null
    }

    /// The scalar payload, or `None` for every other kind.
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Child handles; empty for scalars and aliases.
    pub fn content(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Mapping(content)
            | NodeKind::Sequence(content)
            | NodeKind::Document(content) => content,
            NodeKind::Scalar(_) | NodeKind::Alias(_) => &[],
        }
    }

    pub fn content_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match &mut self.kind {
            NodeKind::Mapping(content)
            | NodeKind::Sequence(content)
            | NodeKind::Document(content) => Some(content),
            NodeKind::Scalar(_) | NodeKind::Alias(_) => None,
        }
    }

    /// Resolves the semantic tag of this node.
    ///
    /// Core tags win. Custom (or empty) tags on scalars fall back to
    /// [`Tag::infer`] on the content; containers resolve by kind.
    pub fn guess_tag(&self) -> Tag {
        if !self.tag.is_custom() {
            return self.tag.clone();
        }
        match &self.kind {
            NodeKind::Scalar(value) => Tag::infer(value),
            NodeKind::Mapping(_) => Tag::Map,
            NodeKind::Sequence(_) => Tag::Seq,
            NodeKind::Alias(_) | NodeKind::Document(_) => self.tag.clone(),
        }
    }

    /// Copies comments and style from `other`, leaving kind and tag alone.
    pub fn with_formatting_of(mut self, other: &Node) -> Self {
        self.style = other.style;
        self.head_comment = other.head_comment.clone();
        self.line_comment = other.line_comment.clone();
        self.foot_comment = other.foot_comment.clone();
        self
    }
}

/// Arena owning all nodes of one or more documents.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node behind `id`.
    ///
    /// Handles are only minted by [`Tree::add`], so a handle from this tree is
    /// always valid.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Overwrites the slot behind `id` with a replacement node.
    pub fn replace(&mut self, id: NodeId, node: Node) {
        self.nodes[id.0] = node;
    }

    /// Appends a child to a sequence or document. Other kinds are left untouched.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if let NodeKind::Sequence(items) | NodeKind::Document(items) = &mut self.get_mut(parent).kind {
            items.push(child);
        }
    }

    /// Appends a key/value pair to a mapping. Other kinds are left untouched.
    pub fn add_key_value(&mut self, map: NodeId, key: NodeId, value: NodeId) {
        if let NodeKind::Mapping(content) = &mut self.get_mut(map).kind {
            content.push(key);
            content.push(value);
        }
    }

    /// Finds the position of `key` in a mapping's content (the key slot, even index).
    pub fn map_key_position(&self, map: NodeId, key: &str) -> Option<usize> {
        let NodeKind::Mapping(content) = &self.get(map).kind else {
            return None;
        };
        content
            .chunks(2)
            .position(|pair| self.get(pair[0]).value() == Some(key))
            .map(|pair_index| pair_index * 2)
    }

    pub fn map_value(&self, map: NodeId, key: &str) -> Option<NodeId> {
        let position = self.map_key_position(map, key)?;
        self.get(map).content().get(position + 1).copied()
    }

    /// Iterates the (key, value) pairs of a mapping.
    pub fn map_entries(&self, map: NodeId) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        let content: &[NodeId] = match &self.get(map).kind {
            NodeKind::Mapping(content) => content,
            _ => &[],
        };
        content
            .chunks(2)
            .filter(|pair| pair.len() == 2)
            .map(|pair| (pair[0], pair[1]))
    }

    /// Follows alias links until a non-alias node is reached.
    ///
    /// Returns `None` when the chain loops back on itself.
    pub fn resolve_alias(&self, id: NodeId) -> Option<NodeId> {
        let mut visited = HashSet::new();
        let mut current = id;
        while let NodeKind::Alias(target) = self.get(current).kind {
            if !visited.insert(current) {
                return None;
            }
            current = target;
        }
        Some(current)
    }

    /// Copies the subtree rooted at `id` into fresh slots.
    ///
    /// Alias nodes are copied as aliases pointing at the original target.
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let node = self.get(id).clone();
        let kind = match node.kind {
            NodeKind::Mapping(content) => NodeKind::Mapping(self.copy_all(&content)),
            NodeKind::Sequence(content) => NodeKind::Sequence(self.copy_all(&content)),
            NodeKind::Document(content) => NodeKind::Document(self.copy_all(&content)),
            kind @ (NodeKind::Scalar(_) | NodeKind::Alias(_)) => kind,
        };
        self.add(Node { kind, ..node })
    }

    fn copy_all(&mut self, content: &[NodeId]) -> Vec<NodeId> {
        content.iter().map(|child| self.deep_copy(*child)).collect()
    }
}
