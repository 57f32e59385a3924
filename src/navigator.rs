use thiserror::Error;
use tracing::trace;

use crate::{
    ast::ExpressionNode,
    config::EvalConfig,
    context::{Candidate, Context, Origin, PathSegment},
    encoder::EncodeError,
    node::{Node, NodeId, NodeKind, Tree},
    operators::{self, OperatorFn},
    parser::ParseError,
};

/// Errors that can occur during expression evaluation.
#[derive(Debug, Error)]
pub enum EvalError {
    /// An operator received a node whose tag or kind it cannot handle
    #[error("{0}")]
    TypeError(String),

    /// A supplied regular expression failed to compile
    #[error("invalid regex: {0}")]
    RegexError(#[from] regex::Error),

    /// Malformed interpolation, unrecognised parameters or a misplaced block
    #[error("{0}")]
    SyntaxError(String),

    /// Deep assignment hit a container of the wrong kind
    #[error("cannot assign path: {0}")]
    PathError(String),

    /// Write-back attempted through a read-only context
    #[error("cannot assign through a read-only context")]
    ReadOnly,

    /// An alias chain loops back on itself
    #[error("alias cycle detected")]
    AliasCycle,

    /// A sub-expression (e.g. inside an interpolation) failed to parse
    #[error(transparent)]
    ParseError(#[from] ParseError),

    /// A node could not be rendered while stringifying it
    #[error(transparent)]
    EncodeError(#[from] EncodeError),
}

/// Evaluates expression trees against a document tree.
///
/// The navigator holds no per-evaluation state: every call receives the tree
/// and the context to operate on, so one navigator may serve many documents.
///
/// # Examples
///
/// ```
/// use treeq::{Context, Navigator, Node, Tree, parse_expression};
///
/// let mut tree = Tree::new();
/// let root = tree.add(Node::string("  padded  "));
///
/// let navigator = Navigator::default();
/// let expr = parse_expression("trim | upcase").unwrap();
/// let result = navigator.evaluate(&mut tree, &Context::root(root), &expr).unwrap();
///
/// let first = result.first().unwrap().node;
/// assert_eq!(tree.get(first).value(), Some("PADDED"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    config: EvalConfig,
}

impl Navigator {
    pub fn new(config: EvalConfig) -> Self {
        Navigator { config }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluates `expr` against every node of `context`.
    pub fn evaluate(
        &self,
        tree: &mut Tree,
        context: &Context,
        expr: &ExpressionNode,
    ) -> Result<Context, EvalError> {
        trace!(operation = expr.operation.name(), matches = context.len(), "evaluate");
        let operator: OperatorFn = operators::operator_for(&expr.operation);
        operator(self, tree, context, expr)
    }

    /// Evaluates `expr` against a read-only view of `context` and returns the
    /// scalar text of its first result, if any.
    pub(crate) fn first_value(
        &self,
        tree: &mut Tree,
        context: &Context,
        expr: &ExpressionNode,
    ) -> Result<Option<String>, EvalError> {
        let result = self.evaluate(tree, &context.read_only_clone(), expr)?;
        let Some(first) = result.first() else {
            return Ok(None);
        };
        let node = tree.resolve_alias(first.node).ok_or(EvalError::AliasCycle)?;
        Ok(tree.get(node).value().map(str::to_string))
    }

    /// Sets `value` at `path` below the first node of `context`, creating
    /// intermediate mappings and sequences as needed.
    ///
    /// Used by decoders of flattened formats such as properties.
    pub fn deeply_assign(
        &self,
        tree: &mut Tree,
        context: &Context,
        path: &[PathSegment],
        value: NodeId,
    ) -> Result<(), EvalError> {
        let (parent, last) = self.walk_to_parent(tree, context, path)?;
        set_child(tree, parent, last, value)
    }

    /// Walks `path` like [`Navigator::deeply_assign`] but replaces the key node
    /// of the terminal entry with `key_node`, keeping (or creating) its value.
    ///
    /// Carries per-entry comments of flattened formats onto the key.
    pub fn deeply_assign_key(
        &self,
        tree: &mut Tree,
        context: &Context,
        path: &[PathSegment],
        key_node: NodeId,
    ) -> Result<(), EvalError> {
        let (parent, last) = self.walk_to_parent(tree, context, path)?;

        if matches!(tree.get(parent).kind, NodeKind::Sequence(_)) {
            // Sequence entries have no key node; the comment moves onto the element
            let PathSegment::Index(index) = last else {
                return Err(sequence_key_error(last));
            };
            let element = match tree.get(parent).content().get(*index).copied() {
                Some(element) => element,
                None => {
                    let placeholder = tree.add(Node::null());
                    set_child(tree, parent, last, placeholder)?;
                    placeholder
                }
            };
            let comment = tree.get(key_node).head_comment.clone();
            tree.get_mut(element).head_comment = comment;
            return Ok(());
        }

        let key = last.as_key();
        match tree.map_key_position(parent, &key) {
            Some(position) => {
                if let Some(content) = tree.get_mut(parent).content_mut() {
                    content[position] = key_node;
                }
            }
            None => {
                let value = tree.add(Node::null());
                tree.add_key_value(parent, key_node, value);
            }
        }
        Ok(())
    }

    fn walk_to_parent<'p>(
        &self,
        tree: &mut Tree,
        context: &Context,
        path: &'p [PathSegment],
    ) -> Result<(NodeId, &'p PathSegment), EvalError> {
        if context.is_read_only() {
            return Err(EvalError::ReadOnly);
        }
        let root = context
            .first()
            .ok_or_else(|| EvalError::PathError("no root node to assign into".to_string()))?
            .node;
        let (last, init) = path
            .split_last()
            .ok_or_else(|| EvalError::PathError("empty path".to_string()))?;

        let mut current = unwrap_document(tree, root);
        for segment in init {
            prepare_container(tree, current, segment)?;
            current = match child_at(tree, current, segment) {
                Some(child) => child,
                None => {
                    let placeholder = tree.add(Node::null());
                    set_child(tree, current, segment, placeholder)?;
                    placeholder
                }
            };
        }
        prepare_container(tree, current, last)?;
        Ok((current, last))
    }

    /// Writes `value` into the slot `candidate` was reached through.
    ///
    /// Placeholders for absent entries are attached first, outermost ancestor
    /// first. Candidates without a parent slot have their arena slot replaced.
    pub(crate) fn write_back(
        &self,
        tree: &mut Tree,
        context: &Context,
        candidate: &Candidate,
        value: NodeId,
    ) -> Result<(), EvalError> {
        if context.is_read_only() {
            return Err(EvalError::ReadOnly);
        }
        match &candidate.origin {
            Origin::Slot { parent, segment } => {
                prepare_container(tree, *parent, segment)?;
                set_child(tree, *parent, segment, value)
            }
            Origin::Missing { parent, segment } => {
                let parent = attach(tree, parent)?;
                let container = unwrap_document(tree, parent);
                prepare_container(tree, container, segment)?;
                set_child(tree, container, segment, value)
            }
            Origin::Root | Origin::Derived => {
                let replacement = tree.get(value).clone();
                tree.replace(candidate.node, replacement);
                Ok(())
            }
        }
    }
}

/// The node standing for `candidate` once it is part of the tree.
///
/// A placeholder is attached under its parent unless an earlier write already
/// created that entry, in which case the existing entry is used.
fn attach(tree: &mut Tree, candidate: &Candidate) -> Result<NodeId, EvalError> {
    let Origin::Missing { parent, segment } = &candidate.origin else {
        return Ok(candidate.node);
    };
    let parent = attach(tree, parent)?;
    let container = unwrap_document(tree, parent);
    prepare_container(tree, container, segment)?;
    if let Some(existing) = child_at(tree, container, segment) {
        return Ok(existing);
    }
    set_child(tree, container, segment, candidate.node)?;
    Ok(candidate.node)
}

/// Documents are transparent to path assignment.
fn unwrap_document(tree: &mut Tree, node: NodeId) -> NodeId {
    let first = match &tree.get(node).kind {
        NodeKind::Document(content) => content.first().copied(),
        _ => return node,
    };
    match first {
        Some(root) => root,
        None => {
            let root = tree.add(Node::mapping());
            tree.add_child(node, root);
            root
        }
    }
}

/// Largest number of null entries a single assignment may pad a sequence with.
pub const MAX_PADDING: usize = 1 << 16;

fn sequence_key_error(segment: &PathSegment) -> EvalError {
    EvalError::PathError(format!(
        "cannot index a sequence with key '{}'; use an integer index instead",
        segment
    ))
}

/// Makes sure `node` can hold a child addressed by `segment`.
///
/// A null scalar becomes an empty container of the required kind, keeping its
/// comments.
fn prepare_container(tree: &mut Tree, node: NodeId, segment: &PathSegment) -> Result<(), EvalError> {
    let current = tree.get(node);
    let container = match (&current.kind, segment) {
        (NodeKind::Mapping(_), _) | (NodeKind::Sequence(_), PathSegment::Index(_)) => return Ok(()),
        (NodeKind::Sequence(_), PathSegment::Key(_)) => return Err(sequence_key_error(segment)),
        (NodeKind::Scalar(_), _) if current.is_null() => {
            let empty = match segment {
                PathSegment::Key(_) => Node::mapping(),
                PathSegment::Index(_) => Node::sequence(),
            };
            empty.with_formatting_of(current)
        }
        _ => {
            return Err(EvalError::PathError(format!(
                "cannot set '{}' inside a {} ({})",
                segment,
                current.kind_name(),
                current.describe()
            )));
        }
    };
    tree.replace(node, container);
    Ok(())
}

fn child_at(tree: &Tree, parent: NodeId, segment: &PathSegment) -> Option<NodeId> {
    match (&tree.get(parent).kind, segment) {
        (NodeKind::Sequence(items), PathSegment::Index(index)) => items.get(*index).copied(),
        (NodeKind::Mapping(_), segment) => tree.map_value(parent, &segment.as_key()),
        _ => None,
    }
}

/// Stores `value` under `segment` of a prepared container.
///
/// Existing mapping keys keep their position; new keys are appended. Sequences
/// are padded with nulls up to `index`, at most [`MAX_PADDING`] at a time.
fn set_child(
    tree: &mut Tree,
    parent: NodeId,
    segment: &PathSegment,
    value: NodeId,
) -> Result<(), EvalError> {
    match &tree.get(parent).kind {
        NodeKind::Mapping(_) => {
            let key = segment.as_key();
            match tree.map_key_position(parent, &key) {
                Some(position) => {
                    if let Some(content) = tree.get_mut(parent).content_mut() {
                        content[position + 1] = value;
                    }
                }
                None => {
                    let key_node = tree.add(Node::string(key));
                    tree.add_key_value(parent, key_node, value);
                }
            }
            Ok(())
        }
        NodeKind::Sequence(items) => {
            let PathSegment::Index(index) = segment else {
                return Err(sequence_key_error(segment));
            };
            let missing = index
                .checked_add(1)
                .map(|len| len.saturating_sub(items.len()))
                .filter(|missing| *missing <= MAX_PADDING)
                .ok_or_else(|| {
                    EvalError::PathError(format!(
                        "index {} is too far past the end of a sequence of {} items",
                        index,
                        items.len()
                    ))
                })?;
            let padding: Vec<NodeId> = (0..missing).map(|_| tree.add(Node::null())).collect();
            if let Some(items) = tree.get_mut(parent).content_mut() {
                items.extend(padding);
                items[*index] = value;
            }
            Ok(())
        }
        _ => Err(EvalError::PathError(format!(
            "cannot set '{}' inside a {}",
            segment,
            tree.get(parent).kind_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Tag;

    fn path(raw: &str) -> Vec<PathSegment> {
        crate::context::split_path(raw, '.')
    }

    fn assign(tree: &mut Tree, root: NodeId, raw: &str, value: &str) -> Result<(), EvalError> {
        let value = tree.add(Node::inferred(value));
        Navigator::default().deeply_assign(tree, &Context::root(root), &path(raw), value)
    }

    fn keys(tree: &Tree, map: NodeId) -> Vec<String> {
        tree.map_entries(map)
            .filter_map(|(key, _)| tree.get(key).value().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_deeply_assign_creates_nested_mappings() {
        let mut tree = Tree::new();
        let root = tree.add(Node::mapping());
        assign(&mut tree, root, "server.http.port", "8080").unwrap();

        let server = tree.map_value(root, "server").unwrap();
        let http = tree.map_value(server, "http").unwrap();
        let port = tree.map_value(http, "port").unwrap();
        assert_eq!(tree.get(port).value(), Some("8080"));
        assert_eq!(tree.get(port).tag, Tag::Int);
    }

    #[test]
    fn test_deeply_assign_pads_sequences() {
        let mut tree = Tree::new();
        let root = tree.add(Node::mapping());
        assign(&mut tree, root, "hosts.2", "c").unwrap();

        let hosts = tree.map_value(root, "hosts").unwrap();
        let items = tree.get(hosts).content().to_vec();
        assert_eq!(items.len(), 3);
        assert!(tree.get(items[0]).is_null());
        assert!(tree.get(items[1]).is_null());
        assert_eq!(tree.get(items[2]).value(), Some("c"));

        assign(&mut tree, root, "hosts.0", "a").unwrap();
        let items = tree.get(hosts).content().to_vec();
        assert_eq!(items.len(), 3);
        assert_eq!(tree.get(items[0]).value(), Some("a"));
    }

    #[test]
    fn test_deeply_assign_keeps_first_seen_order() {
        let mut tree = Tree::new();
        let root = tree.add(Node::mapping());
        assign(&mut tree, root, "b", "1").unwrap();
        assign(&mut tree, root, "a", "2").unwrap();
        assign(&mut tree, root, "b", "3").unwrap();

        assert_eq!(keys(&tree, root), vec!["b", "a"]);
        let b = tree.map_value(root, "b").unwrap();
        assert_eq!(tree.get(b).value(), Some("3"));
    }

    #[test]
    fn test_deeply_assign_sequence_of_mappings() {
        let mut tree = Tree::new();
        let root = tree.add(Node::mapping());
        assign(&mut tree, root, "users.0.name", "ann").unwrap();
        assign(&mut tree, root, "users.1.name", "bob").unwrap();

        let users = tree.map_value(root, "users").unwrap();
        let second = tree.get(users).content()[1];
        let name = tree.map_value(second, "name").unwrap();
        assert_eq!(tree.get(name).value(), Some("bob"));
    }

    #[test]
    fn test_deeply_assign_rejects_runaway_padding() {
        let mut tree = Tree::new();
        let root = tree.add(Node::mapping());
        let err = assign(&mut tree, root, "list.2147483647", "x").unwrap_err();
        assert!(matches!(err, EvalError::PathError(_)));
        assert!(err.to_string().contains("too far past the end"));

        let list = tree.add(Node::sequence());
        let value = tree.add(Node::string("x"));
        let err = set_child(&mut tree, list, &PathSegment::Index(usize::MAX), value).unwrap_err();
        assert!(matches!(err, EvalError::PathError(_)));
    }

    #[test]
    fn test_deeply_assign_oversized_index_is_a_key() {
        let mut tree = Tree::new();
        let root = tree.add(Node::mapping());
        assign(&mut tree, root, "a.18446744073709551615", "x").unwrap();
        let a = tree.map_value(root, "a").unwrap();
        assert_eq!(keys(&tree, a), vec!["18446744073709551615"]);
    }

    #[test]
    fn test_deeply_assign_through_document() {
        let mut tree = Tree::new();
        let map = tree.add(Node::mapping());
        let doc = tree.add(Node::document(map));
        assign(&mut tree, doc, "a", "1").unwrap();
        assert!(tree.map_value(map, "a").is_some());
    }

    #[test]
    fn test_deeply_assign_sequence_with_key_fails() {
        let mut tree = Tree::new();
        let root = tree.add(Node::mapping());
        assign(&mut tree, root, "list.0", "x").unwrap();
        let err = assign(&mut tree, root, "list.name", "y").unwrap_err();
        assert!(matches!(err, EvalError::PathError(_)));
    }

    #[test]
    fn test_deeply_assign_through_scalar_fails() {
        let mut tree = Tree::new();
        let root = tree.add(Node::mapping());
        assign(&mut tree, root, "a", "text").unwrap();
        let err = assign(&mut tree, root, "a.b", "y").unwrap_err();
        assert!(err.to_string().contains("!!str"));
    }

    #[test]
    fn test_deeply_assign_read_only_fails() {
        let mut tree = Tree::new();
        let root = tree.add(Node::mapping());
        let value = tree.add(Node::null());
        let context = Context::root(root).read_only_clone();
        let err = Navigator::default()
            .deeply_assign(&mut tree, &context, &path("a"), value)
            .unwrap_err();
        assert!(matches!(err, EvalError::ReadOnly));
    }

    #[test]
    fn test_deeply_assign_key_carries_comment() {
        let mut tree = Tree::new();
        let root = tree.add(Node::mapping());
        let mut key = Node::string("port");
        key.head_comment = "# listen port".to_string();
        let key = tree.add(key);

        let navigator = Navigator::default();
        let context = Context::root(root);
        navigator.deeply_assign_key(&mut tree, &context, &path("server.port"), key).unwrap();
        assign(&mut tree, root, "server.port", "80").unwrap();

        let server = tree.map_value(root, "server").unwrap();
        let (key_id, value_id) = tree.map_entries(server).next().unwrap();
        assert_eq!(key_id, key);
        assert_eq!(tree.get(key_id).head_comment, "# listen port");
        assert_eq!(tree.get(value_id).value(), Some("80"));
        assert_eq!(tree.get(server).content().len(), 2);
    }

    #[test]
    fn test_deeply_assign_key_on_sequence_element() {
        let mut tree = Tree::new();
        let root = tree.add(Node::mapping());
        let mut key = Node::string("0");
        key.head_comment = "# first".to_string();
        let key = tree.add(key);

        Navigator::default()
            .deeply_assign_key(&mut tree, &Context::root(root), &path("list.0"), key)
            .unwrap();

        let list = tree.map_value(root, "list").unwrap();
        let first = tree.get(list).content()[0];
        assert_eq!(tree.get(first).head_comment, "# first");
    }
}
