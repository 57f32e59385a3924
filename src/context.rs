//! Evaluation context threaded through every operator.
//!
//! A [`Context`] is the ordered list of nodes an expression currently operates
//! on. Each entry is a [`Candidate`]: the node handle plus the [`Origin`] it
//! was reached through, which is what assignment uses to write a new value
//! back into the owning mapping or sequence.

use std::fmt;

use crate::node::NodeId;

/// One step of a path through a document.
///
/// # Examples
///
/// - `a.b` → `[Key("a"), Key("b")]`
/// - `items.0.name` → `[Key("items"), Index(0), Key("name")]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Mapping key
    Key(String),

    /// Sequence position
    Index(usize),
}

impl PathSegment {
    /// Classifies a raw segment: all-digit text that fits a 32-bit signed
    /// integer addresses a sequence position, anything else is a key.
    pub fn parse(raw: &str) -> PathSegment {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = raw.parse::<i32>() {
                return PathSegment::Index(index as usize);
            }
        }
        PathSegment::Key(raw.to_string())
    }

    /// Text of the segment when used as a mapping key.
    pub fn as_key(&self) -> String {
        match self {
            PathSegment::Key(key) => key.clone(),
            PathSegment::Index(index) => index.to_string(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Splits a flattened key such as `a.b.0.c` into path segments.
pub fn split_path(key: &str, separator: char) -> Vec<PathSegment> {
    key.split(separator).map(PathSegment::parse).collect()
}

/// Where a candidate node was reached from.
#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    /// A document root handed to the navigator
    Root,

    /// The value stored under `segment` in `parent`
    Slot { parent: NodeId, segment: PathSegment },

    /// A placeholder for an absent entry; assignment attaches it (and, in
    /// turn, any absent ancestors) under `segment` of `parent`
    Missing { parent: Box<Candidate>, segment: PathSegment },

    /// Created by an operator; not attached to any container
    Derived,
}

/// A matching node together with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub node: NodeId,
    pub origin: Origin,
}

impl Candidate {
    pub fn root(node: NodeId) -> Self {
        Candidate { node, origin: Origin::Root }
    }

    pub fn derived(node: NodeId) -> Self {
        Candidate { node, origin: Origin::Derived }
    }

    pub fn slot(node: NodeId, parent: NodeId, segment: PathSegment) -> Self {
        Candidate { node, origin: Origin::Slot { parent, segment } }
    }

    pub fn missing(node: NodeId, parent: Candidate, segment: PathSegment) -> Self {
        Candidate { node, origin: Origin::Missing { parent: Box::new(parent), segment } }
    }

    /// A replacement for this candidate that takes over its slot.
    pub fn replaced_by(&self, node: NodeId) -> Self {
        Candidate { node, origin: self.origin.clone() }
    }
}

/// Ordered collection of the nodes currently matched by an expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    matches: Vec<Candidate>,
    read_only: bool,
}

impl Context {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context matching a single document root.
    pub fn root(node: NodeId) -> Self {
        Context { matches: vec![Candidate::root(node)], read_only: false }
    }

    /// A context whose only match is `candidate`, inheriting this context's mode.
    pub fn single_child_context(&self, candidate: Candidate) -> Self {
        Context { matches: vec![candidate], read_only: self.read_only }
    }

    /// A context over `matches`, inheriting this context's mode.
    pub fn child_context(&self, matches: Vec<Candidate>) -> Self {
        Context { matches, read_only: self.read_only }
    }

    /// The same matches, but forbidding any write-back.
    pub fn read_only_clone(&self) -> Self {
        Context { matches: self.matches.clone(), read_only: true }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn matches(&self) -> &[Candidate] {
        &self.matches
    }

    pub fn into_matches(self) -> Vec<Candidate> {
        self.matches
    }

    pub fn first(&self) -> Option<&Candidate> {
        self.matches.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.matches.iter()
    }

    /// Handles of the matching nodes, in order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.matches.iter().map(|candidate| candidate.node).collect()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
