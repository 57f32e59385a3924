//! Navigation, composition, literals and assignment.

use tracing::debug;

use super::resolve;
use crate::{
    ast::{ExpressionNode, Operation},
    context::{Candidate, Context, PathSegment},
    navigator::{EvalError, Navigator},
    node::{Node, NodeId, NodeKind, Tag, Tree},
};

pub(super) fn self_reference(
    _navigator: &Navigator,
    _tree: &mut Tree,
    context: &Context,
    _expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    Ok(context.clone())
}

/// The container a candidate stands for: aliases resolved, documents entered.
///
/// The returned candidate keeps the original provenance.
fn container(tree: &Tree, candidate: &Candidate) -> Result<Candidate, EvalError> {
    Ok(candidate.replaced_by(resolve(tree, candidate.node)?))
}

/// A null standing in for an absent entry.
fn placeholder(tree: &mut Tree, context: &Context, parent: &Candidate, segment: PathSegment) -> Candidate {
    let node = tree.add(Node::null());
    if context.is_read_only() {
        Candidate::derived(node)
    } else {
        Candidate::missing(node, parent.clone(), segment)
    }
}

fn lookup_key(
    tree: &mut Tree,
    context: &Context,
    parent: &Candidate,
    key: &str,
) -> Result<Option<Candidate>, EvalError> {
    let node = tree.get(parent.node);
    match &node.kind {
        NodeKind::Mapping(_) => Ok(Some(match tree.map_value(parent.node, key) {
            Some(value) => Candidate::slot(value, parent.node, PathSegment::Key(key.to_string())),
            None => placeholder(tree, context, parent, PathSegment::Key(key.to_string())),
        })),
        NodeKind::Sequence(_) => Err(EvalError::TypeError(format!(
            "cannot index {} with '{}'",
            node.describe(),
            key
        ))),
        NodeKind::Scalar(_) if node.is_null() => Ok(Some(placeholder(
            tree,
            context,
            parent,
            PathSegment::Key(key.to_string()),
        ))),
        _ => Ok(None),
    }
}

/// `.key`: the value stored under `key` in every matching mapping.
pub(super) fn traverse(
    _navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    let Operation::Traverse(key) = &expr.operation else {
        return Err(EvalError::SyntaxError("traverse without a key".to_string()));
    };
    let mut results = Vec::new();
    for candidate in context.iter() {
        let parent = container(tree, candidate)?;
        results.extend(lookup_key(tree, context, &parent, key)?);
    }
    Ok(context.child_context(results))
}

/// `.[n]`: a sequence position, counting from the end when negative.
pub(super) fn index(
    _navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    let Operation::Index(position) = expr.operation else {
        return Err(EvalError::SyntaxError("index without a position".to_string()));
    };
    let mut results = Vec::new();
    for candidate in context.iter() {
        let parent = container(tree, candidate)?;
        let node = tree.get(parent.node);
        match &node.kind {
            NodeKind::Sequence(items) => {
                let len = items.len() as i64;
                let absolute = if position < 0 { len + position } else { position };
                if absolute < 0 {
                    continue;
                }
                let absolute = absolute as usize;
                let found = items.get(absolute).copied();
                results.push(match found {
                    Some(item) => Candidate::slot(item, parent.node, PathSegment::Index(absolute)),
                    None => placeholder(tree, context, &parent, PathSegment::Index(absolute)),
                });
            }
            NodeKind::Mapping(_) => {
                results.extend(lookup_key(tree, context, &parent, &position.to_string())?);
            }
            NodeKind::Scalar(_) if node.is_null() && position >= 0 => {
                results.push(placeholder(tree, context, &parent, PathSegment::Index(position as usize)));
            }
            _ => {}
        }
    }
    Ok(context.child_context(results))
}

/// `.[]`: every value of a mapping or item of a sequence.
pub(super) fn iterate(
    _navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    _expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    let mut results = Vec::new();
    for candidate in context.iter() {
        let parent = container(tree, candidate)?;
        let node = tree.get(parent.node);
        match &node.kind {
            NodeKind::Sequence(items) => {
                results.extend(items.iter().enumerate().map(|(position, item)| {
                    Candidate::slot(*item, parent.node, PathSegment::Index(position))
                }));
            }
            NodeKind::Mapping(_) => {
                for (key, value) in tree.map_entries(parent.node) {
                    let key = tree.get(key).value().unwrap_or_default().to_string();
                    results.push(Candidate::slot(value, parent.node, PathSegment::Key(key)));
                }
            }
            NodeKind::Scalar(_) if node.is_null() => {}
            _ => {
                return Err(EvalError::TypeError(format!(
                    "cannot iterate over {}",
                    node.describe()
                )));
            }
        }
    }
    Ok(context.child_context(results))
}

/// Number, boolean and null literals: one fresh node whatever the input.
pub(super) fn literal(
    _navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    let node = match &expr.operation {
        Operation::Integer(value) => Node::integer(*value),
        Operation::Float(value) => Node::scalar(Tag::Float, format!("{:?}", value)),
        Operation::Boolean(value) => Node::boolean(*value),
        Operation::Null => Node::null(),
        other => {
            return Err(EvalError::SyntaxError(format!("{} is not a literal", other.name())));
        }
    };
    let id = tree.add(node);
    Ok(context.single_child_context(Candidate::derived(id)))
}

fn operands(expr: &ExpressionNode) -> Result<(&ExpressionNode, &ExpressionNode), EvalError> {
    match (expr.lhs.as_deref(), expr.rhs.as_deref()) {
        (Some(lhs), Some(rhs)) => Ok((lhs, rhs)),
        _ => Err(EvalError::SyntaxError(format!(
            "{} requires two operands",
            expr.operation.name()
        ))),
    }
}

/// `a | b`
pub(super) fn pipe(
    navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    let (lhs, rhs) = operands(expr)?;
    let intermediate = navigator.evaluate(tree, context, lhs)?;
    navigator.evaluate(tree, &intermediate, rhs)
}

/// `a, b`
pub(super) fn union(
    navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    let (lhs, rhs) = operands(expr)?;
    let mut results = navigator.evaluate(tree, context, lhs)?.into_matches();
    results.extend(navigator.evaluate(tree, context, rhs)?.into_matches());
    Ok(context.child_context(results))
}

/// `a; b` only exists as packed call arguments.
pub(super) fn misplaced_block(
    _navigator: &Navigator,
    _tree: &mut Tree,
    _context: &Context,
    _expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    Err(EvalError::SyntaxError(
        "';' can only separate the arguments of a call such as sub(a; b)".to_string(),
    ))
}

fn write_value(
    navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    target: &Candidate,
    value: NodeId,
) -> Result<(), EvalError> {
    let copy = tree.deep_copy(value);
    navigator.write_back(tree, context, target, copy)
}

/// `lhs = rhs`: the first result of `rhs`, evaluated once, copied into every
/// match of `lhs`.
pub(super) fn assign(
    navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    if context.is_read_only() {
        return Err(EvalError::ReadOnly);
    }
    let (lhs, rhs) = operands(expr)?;
    let value = navigator.evaluate(tree, &context.read_only_clone(), rhs)?;
    let Some(value) = value.first().map(|candidate| candidate.node) else {
        debug!("assignment value is empty, nothing to write");
        return Ok(context.clone());
    };

    let targets = navigator.evaluate(tree, context, lhs)?;
    debug!(targets = targets.len(), "assign");
    for target in targets.iter() {
        write_value(navigator, tree, context, target, value)?;
    }
    Ok(context.clone())
}

/// `lhs |= rhs`: every match of `lhs` replaced by the first result of `rhs`
/// evaluated against that match.
pub(super) fn update(
    navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    if context.is_read_only() {
        return Err(EvalError::ReadOnly);
    }
    let (lhs, rhs) = operands(expr)?;
    let targets = navigator.evaluate(tree, context, lhs)?;
    debug!(targets = targets.len(), "update");
    for target in targets.iter() {
        let result = navigator.evaluate(tree, &context.single_child_context(target.clone()), rhs)?;
        match result.first() {
            Some(first) if first.node == target.node => {}
            Some(first) => {
                let value = first.node;
                write_value(navigator, tree, context, target, value)?;
            }
            None => {}
        }
    }
    Ok(context.clone())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{mapping, run, string_sequence, values};
    use crate::{
        ast::{ExpressionNode, Operation},
        navigator::{EvalError, Navigator},
        node::{Node, Tag, Tree},
        Context,
    };

    #[test]
    fn test_traverse_nested() {
        let mut tree = Tree::new();
        let inner = mapping(&mut tree, &[("name", "treeq")]);
        let root = tree.add(Node::mapping());
        let key = tree.add(Node::string("tool"));
        tree.add_key_value(root, key, inner);

        let result = run(&mut tree, root, ".tool.name").unwrap();
        assert_eq!(values(&tree, &result), vec!["treeq"]);
    }

    #[test]
    fn test_traverse_missing_yields_null() {
        let mut tree = Tree::new();
        let root = mapping(&mut tree, &[("a", "1")]);
        let result = run(&mut tree, root, ".b.c").unwrap();
        assert_eq!(result.len(), 1);
        assert!(tree.get(result.first().unwrap().node).is_null());
    }

    #[test]
    fn test_traverse_sequence_by_key_is_type_error() {
        let mut tree = Tree::new();
        let root = string_sequence(&mut tree, &["a"]);
        let err = run(&mut tree, root, ".name").unwrap_err();
        assert!(err.to_string().contains("!!seq"));
    }

    #[test]
    fn test_index_and_negative_index() {
        let mut tree = Tree::new();
        let root = string_sequence(&mut tree, &["a", "b", "c"]);
        let result = run(&mut tree, root, ".[0], .[-1]").unwrap();
        assert_eq!(values(&tree, &result), vec!["a", "c"]);

        let result = run(&mut tree, root, ".[-5]").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_iterate_mapping_and_sequence() {
        let mut tree = Tree::new();
        let root = mapping(&mut tree, &[("a", "1"), ("b", "2")]);
        let result = run(&mut tree, root, ".[]").unwrap();
        assert_eq!(values(&tree, &result), vec!["1", "2"]);

        let scalar = tree.add(Node::string("x"));
        let err = run(&mut tree, scalar, ".[]").unwrap_err();
        assert!(err.to_string().contains("cannot iterate over !!str"));
    }

    #[test]
    fn test_literals() {
        let mut tree = Tree::new();
        let root = string_sequence(&mut tree, &["a", "b"]);
        let result = run(&mut tree, root, ".[] | 42").unwrap();
        assert_eq!(values(&tree, &result), vec!["42"]);

        let result = run(&mut tree, root, "1.5, true, null").unwrap();
        assert_eq!(values(&tree, &result), vec!["1.5", "true", "null"]);
        let float = result.first().unwrap().node;
        assert_eq!(tree.get(float).tag, Tag::Float);
    }

    #[test]
    fn test_assign_creates_nested_entries() {
        let mut tree = Tree::new();
        let root = mapping(&mut tree, &[("a", "1")]);
        run(&mut tree, root, ".b.c = \"x\"").unwrap();

        let b = tree.map_value(root, "b").unwrap();
        let c = tree.map_value(b, "c").unwrap();
        assert_eq!(tree.get(c).value(), Some("x"));
        assert_eq!(tree.get(root).content().len(), 4);
    }

    #[test]
    fn test_assign_copies_value() {
        let mut tree = Tree::new();
        let root = mapping(&mut tree, &[("a", "old"), ("b", "new")]);
        run(&mut tree, root, ".a = .b").unwrap();
        let a = tree.map_value(root, "a").unwrap();
        let b = tree.map_value(root, "b").unwrap();
        assert_ne!(a, b);
        assert_eq!(tree.get(a).value(), Some("new"));
    }

    #[test]
    fn test_assign_into_sequence_positions() {
        let mut tree = Tree::new();
        let root = tree.add(Node::mapping());
        run(&mut tree, root, ".list[1] = \"b\"").unwrap();
        let list = tree.map_value(root, "list").unwrap();
        let items = tree.get(list).content().to_vec();
        assert_eq!(items.len(), 2);
        assert!(tree.get(items[0]).is_null());
        assert_eq!(tree.get(items[1]).value(), Some("b"));
    }

    #[test]
    fn test_assign_siblings_under_missing_parent() {
        let mut tree = Tree::new();
        let root = tree.add(Node::mapping());
        run(&mut tree, root, r#"(.x.y, .x.z) = "v""#).unwrap();

        let x = tree.map_value(root, "x").unwrap();
        let keys: Vec<_> = tree
            .map_entries(x)
            .filter_map(|(key, _)| tree.get(key).value().map(str::to_string))
            .collect();
        assert_eq!(keys, vec!["y", "z"]);
        assert_eq!(tree.get(root).content().len(), 2);

        run(&mut tree, root, r#"(.p[1].q, .p[1].r, .p[0]) = "w""#).unwrap();
        let p = tree.map_value(root, "p").unwrap();
        let items = tree.get(p).content().to_vec();
        assert_eq!(items.len(), 2);
        assert_eq!(tree.get(items[0]).value(), Some("w"));
        assert!(tree.map_value(items[1], "q").is_some());
        assert!(tree.map_value(items[1], "r").is_some());
    }

    #[test]
    fn test_assign_far_past_sequence_end_fails() {
        let mut tree = Tree::new();
        let root = tree.add(Node::mapping());
        let err = run(&mut tree, root, ".a[9223372036854775807] = 1").unwrap_err();
        assert!(matches!(err, EvalError::PathError(_)));
    }

    #[test]
    fn test_update_every_element() {
        let mut tree = Tree::new();
        let root = string_sequence(&mut tree, &["a", "b"]);
        let result = run(&mut tree, root, ".[] |= upcase").unwrap();
        assert_eq!(result.first().unwrap().node, root);

        let items = tree.get(root).content().to_vec();
        assert_eq!(tree.get(items[0]).value(), Some("A"));
        assert_eq!(tree.get(items[1]).value(), Some("B"));
    }

    #[test]
    fn test_update_root() {
        let mut tree = Tree::new();
        let root = tree.add(Node::string("  x "));
        run(&mut tree, root, ". |= trim").unwrap();
        assert_eq!(tree.get(root).value(), Some("x"));
    }

    #[test]
    fn test_block_outside_call_is_error() {
        let mut tree = Tree::new();
        let root = tree.add(Node::null());
        let expr = ExpressionNode::block(
            ExpressionNode::leaf(Operation::SelfRef),
            ExpressionNode::leaf(Operation::SelfRef),
        );
        let err = Navigator::default()
            .evaluate(&mut tree, &Context::root(root), &expr)
            .unwrap_err();
        assert!(matches!(err, EvalError::SyntaxError(_)));
    }
}
