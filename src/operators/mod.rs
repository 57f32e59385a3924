//! Operator implementations.
//!
//! Every operator has the same shape, [`OperatorFn`]: it receives the
//! navigator (for nested evaluation), the tree, the current context and its
//! own expression node, and returns a new context. Operators iterate the
//! input matches in order and stop at the first error.

mod path;
mod pattern;
mod strings;

use crate::{
    ast::{ExpressionNode, Operation},
    context::Context,
    config::EncoderPreferences,
    encoder::{self, YamlEncoder},
    navigator::{EvalError, Navigator},
    node::{Node, NodeId, NodeKind, Tag, Tree},
};

pub use pattern::{MatchPreferences, parse_match_params};

pub type OperatorFn =
    fn(&Navigator, &mut Tree, &Context, &ExpressionNode) -> Result<Context, EvalError>;

/// Looks up the handler for an operation.
pub fn operator_for(operation: &Operation) -> OperatorFn {
    match operation {
        Operation::SelfRef => path::self_reference,
        Operation::Traverse(_) => path::traverse,
        Operation::Index(_) => path::index,
        Operation::Iterate => path::iterate,
        Operation::Integer(_) | Operation::Float(_) | Operation::Boolean(_) | Operation::Null => {
            path::literal
        }
        Operation::Pipe => path::pipe,
        Operation::Union => path::union,
        Operation::Block => path::misplaced_block,
        Operation::Assign => path::assign,
        Operation::Update => path::update,
        Operation::Interpolate(_) => strings::interpolate,
        Operation::Trim => strings::trim,
        Operation::ChangeCase(_) => strings::change_case,
        Operation::ToString => strings::to_string,
        Operation::Join => strings::join,
        Operation::Split => strings::split,
        Operation::Substitute => pattern::substitute,
        Operation::Match => pattern::match_regex,
        Operation::Capture => pattern::capture,
        Operation::Test => pattern::test,
    }
}

/// Follows aliases and enters documents, giving the node an operator acts on.
fn resolve(tree: &Tree, id: NodeId) -> Result<NodeId, EvalError> {
    let id = tree.resolve_alias(id).ok_or(EvalError::AliasCycle)?;
    match &tree.get(id).kind {
        NodeKind::Document(content) => match content.first() {
            Some(root) => resolve(tree, *root),
            None => Ok(id),
        },
        _ => Ok(id),
    }
}

/// The argument of a call such as `join(", ")`.
fn argument<'e>(expr: &'e ExpressionNode) -> Result<&'e ExpressionNode, EvalError> {
    expr.rhs.as_deref().ok_or_else(|| {
        EvalError::SyntaxError(format!("{} requires an argument", expr.operation.name()))
    })
}

/// Resolves `id` and returns its scalar text if it guesses to `!!str`.
///
/// Otherwise produces a type error built by `message` from the node's tag.
fn string_value(
    tree: &Tree,
    id: NodeId,
    message: impl FnOnce(&str) -> String,
) -> Result<(NodeId, String), EvalError> {
    let id = resolve(tree, id)?;
    let node = tree.get(id);
    match node.value() {
        Some(value) if node.guess_tag() == Tag::Str => Ok((id, value.to_string())),
        _ => Err(EvalError::TypeError(message(&node.describe()))),
    }
}

/// A copy of the scalar `source` carrying new text.
///
/// Tag, style and comments are kept; the anchor is not, since the copy is a
/// distinct node.
fn rewrite_scalar(tree: &mut Tree, source: NodeId, value: String) -> NodeId {
    let mut node = tree.get(source).clone();
    node.kind = NodeKind::Scalar(value);
    node.anchor = None;
    tree.add(node)
}

/// Text of a node as used by interpolation and `to_string`.
///
/// Scalars give their raw value; anything else is rendered as YAML with the
/// trailing newlines removed.
fn stringify(tree: &Tree, id: NodeId) -> Result<String, EvalError> {
    let id = resolve(tree, id)?;
    if let Some(value) = tree.get(id).value() {
        return Ok(value.to_string());
    }
    let mut encoder = YamlEncoder::new(EncoderPreferences::default());
    let rendered = encoder::encode_to_string(&mut encoder, tree, id)?;
    Ok(rendered.trim_end_matches('\n').to_string())
}

/// Adds a plain string scalar to the tree.
fn string_node(tree: &mut Tree, value: impl Into<String>) -> NodeId {
    tree.add(Node::string(value))
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Helpers for operator unit tests.

    use crate::{
        context::Context,
        navigator::{EvalError, Navigator},
        node::{Node, NodeId, Tree},
        parser::parse_expression,
    };

    /// Evaluates `source` against a single root node.
    pub fn run(tree: &mut Tree, root: NodeId, source: &str) -> Result<Context, EvalError> {
        let expr = parse_expression(source).expect("expression parses");
        Navigator::default().evaluate(tree, &Context::root(root), &expr)
    }

    /// Scalar texts of every result.
    pub fn values(tree: &Tree, context: &Context) -> Vec<String> {
        context
            .iter()
            .map(|candidate| tree.get(candidate.node).value().unwrap_or("<non-scalar>").to_string())
            .collect()
    }

    /// Builds a string sequence.
    pub fn string_sequence(tree: &mut Tree, items: &[&str]) -> NodeId {
        let ids = items.iter().map(|item| tree.add(Node::string(*item))).collect();
        tree.add(Node::sequence_of(ids))
    }

    /// Builds a mapping from key/value pairs with inferred value tags.
    pub fn mapping(tree: &mut Tree, entries: &[(&str, &str)]) -> NodeId {
        let map = tree.add(Node::mapping());
        for (key, value) in entries {
            let key = tree.add(Node::string(*key));
            let value = tree.add(Node::inferred(*value));
            tree.add_key_value(map, key, value);
        }
        map
    }
}
