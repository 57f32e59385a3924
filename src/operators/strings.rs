//! String literal interpolation and the simple string operators.

use tracing::debug;

use super::{argument, resolve, rewrite_scalar, string_node, string_value, stringify};
use crate::{
    ast::{CaseDirection, ExpressionNode, Operation},
    context::{Candidate, Context},
    navigator::{EvalError, Navigator},
    node::{Node, NodeKind, Style, Tag, Tree},
    parser::parse_expression,
};

/// Where the interpolation scanner currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Copying literal text
    Text,

    /// Collecting the source of a `\( ... )` sub-expression; `depth` counts
    /// unbalanced opening parentheses inside it
    Expression { depth: usize },
}

/// Evaluates `source` against `context` and returns the text of its first
/// result, or an empty string when there is none.
fn evaluate_fragment(
    navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    source: &str,
) -> Result<String, EvalError> {
    debug!(source, "interpolating sub-expression");
    let expr = parse_expression(source)?;
    let result = navigator.evaluate(tree, &context.read_only_clone(), &expr)?;
    match result.first() {
        Some(first) => stringify(tree, first.node),
        None => Ok(String::new()),
    }
}

/// Expands every `\( ... )` in `text`.
fn interpolate_text(
    navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    text: &str,
) -> Result<String, EvalError> {
    let mut output = String::with_capacity(text.len());
    let mut expression = String::new();
    let mut state = ScanState::Text;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match state {
            ScanState::Text => {
                if ch == '\\' && chars.peek() == Some(&'(') {
                    chars.next();
                    expression.clear();
                    state = ScanState::Expression { depth: 0 };
                } else {
                    output.push(ch);
                }
            }
            ScanState::Expression { depth } => match ch {
                '\\' if chars.peek() == Some(&')') => {
                    chars.next();
                    expression.push_str("\\)");
                }
                '(' => {
                    expression.push(ch);
                    state = ScanState::Expression { depth: depth + 1 };
                }
                ')' if depth == 0 => {
                    output.push_str(&evaluate_fragment(navigator, tree, context, &expression)?);
                    state = ScanState::Text;
                }
                ')' => {
                    expression.push(ch);
                    state = ScanState::Expression { depth: depth - 1 };
                }
                _ => expression.push(ch),
            },
        }
    }

    if state != ScanState::Text {
        return Err(EvalError::SyntaxError("unclosed interpolation string \\(".to_string()));
    }
    Ok(output)
}

/// String literals.
///
/// Evaluated once against the empty context, or once per matching node. With
/// interpolation switched off the literal is a single verbatim scalar.
pub(super) fn interpolate(
    navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    let Operation::Interpolate(text) = &expr.operation else {
        return Err(EvalError::SyntaxError("expected a string literal".to_string()));
    };

    if !navigator.config().interpolation {
        let id = string_node(tree, text.clone());
        return Ok(context.single_child_context(Candidate::derived(id)));
    }

    let expand = text.contains("\\(");
    let render = |tree: &mut Tree, context: &Context| -> Result<String, EvalError> {
        if expand {
            interpolate_text(navigator, tree, context, text)
        } else {
            Ok(text.clone())
        }
    };

    if context.is_empty() {
        let value = render(tree, context)?;
        let id = string_node(tree, value);
        return Ok(context.single_child_context(Candidate::derived(id)));
    }

    let mut results = Vec::with_capacity(context.len());
    for candidate in context.iter() {
        let single = context.single_child_context(candidate.clone());
        let value = render(tree, &single)?;
        results.push(Candidate::derived(string_node(tree, value)));
    }
    Ok(context.child_context(results))
}

pub(super) fn trim(
    _navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    _expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    let mut results = Vec::with_capacity(context.len());
    for candidate in context.iter() {
        let (id, value) = string_value(tree, candidate.node, |tag| {
            format!("cannot trim {}, can only operate on strings", tag)
        })?;
        let trimmed = rewrite_scalar(tree, id, value.trim().to_string());
        results.push(candidate.replaced_by(trimmed));
    }
    Ok(context.child_context(results))
}

pub(super) fn change_case(
    _navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    let Operation::ChangeCase(direction) = expr.operation else {
        return Err(EvalError::SyntaxError("expected a case direction".to_string()));
    };
    let mut results = Vec::with_capacity(context.len());
    for candidate in context.iter() {
        let (id, value) = string_value(tree, candidate.node, |tag| {
            format!("cannot change case with {}, can only operate on strings", tag)
        })?;
        let changed = match direction {
            CaseDirection::Upper => value.to_uppercase(),
            CaseDirection::Lower => value.to_lowercase(),
            CaseDirection::AsciiUpper => value.to_ascii_uppercase(),
            CaseDirection::AsciiLower => value.to_ascii_lowercase(),
        };
        let changed = rewrite_scalar(tree, id, changed);
        results.push(candidate.replaced_by(changed));
    }
    Ok(context.child_context(results))
}

/// Renders any node as a double-quoted string scalar.
pub(super) fn to_string(
    _navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    _expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    let mut results = Vec::with_capacity(context.len());
    for candidate in context.iter() {
        let text = stringify(tree, candidate.node)?;
        let mut node = Node::string(text);
        node.style = Style::DoubleQuoted;
        let id = tree.add(node);
        results.push(candidate.replaced_by(id));
    }
    Ok(context.child_context(results))
}

pub(super) fn join(
    navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    let separator = navigator
        .first_value(tree, context, argument(expr)?)?
        .unwrap_or_default();
    debug!(%separator, "join");

    let mut results = Vec::with_capacity(context.len());
    for candidate in context.iter() {
        let id = resolve(tree, candidate.node)?;
        let node = tree.get(id);
        let NodeKind::Sequence(items) = &node.kind else {
            return Err(EvalError::TypeError(format!(
                "cannot join with {}, can only join arrays of scalars",
                node.describe()
            )));
        };
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            let item = tree.get(resolve(tree, *item)?);
            parts.push(if item.is_null() { "" } else { item.value().unwrap_or_default() });
        }
        let joined = parts.join(separator.as_str());
        results.push(candidate.replaced_by(string_node(tree, joined)));
    }
    Ok(context.child_context(results))
}

pub(super) fn split(
    navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    let separator = navigator
        .first_value(tree, context, argument(expr)?)?
        .unwrap_or_default();
    debug!(%separator, "split");

    let mut results = Vec::with_capacity(context.len());
    for candidate in context.iter() {
        let id = resolve(tree, candidate.node)?;
        if tree.get(id).guess_tag() == Tag::Null {
            continue;
        }
        let (_, value) = string_value(tree, id, |tag| {
            format!("cannot split {}, can only split strings", tag)
        })?;

        let parts: Vec<String> = if value.is_empty() {
            Vec::new()
        } else if separator.is_empty() {
            value.chars().map(String::from).collect()
        } else {
            value.split(separator.as_str()).map(str::to_string).collect()
        };
        let items = parts.into_iter().map(|part| string_node(tree, part)).collect();
        let sequence = tree.add(Node::sequence_of(items));
        results.push(candidate.replaced_by(sequence));
    }
    Ok(context.child_context(results))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{mapping, run, string_sequence, values};
    use crate::{
        config::EvalConfig,
        context::Context,
        navigator::{EvalError, Navigator},
        node::{Node, Style, Tag, Tree},
        parser::parse_expression,
    };

    #[test]
    fn test_plain_literal() {
        let mut tree = Tree::new();
        let root = tree.add(Node::null());
        let result = run(&mut tree, root, "\"hello world\"").unwrap();
        assert_eq!(values(&tree, &result), vec!["hello world"]);
    }

    #[test]
    fn test_interpolation() {
        let mut tree = Tree::new();
        let root = mapping(&mut tree, &[("name", "ann"), ("count", "3")]);
        let result = run(&mut tree, root, r#""Hi \(.name), \(.count) new""#).unwrap();
        assert_eq!(values(&tree, &result), vec!["Hi ann, 3 new"]);
    }

    #[test]
    fn test_literal_once_per_match() {
        let mut tree = Tree::new();
        let root = string_sequence(&mut tree, &["a", "b", "c"]);
        let result = run(&mut tree, root, r#".[] | "x""#).unwrap();
        assert_eq!(values(&tree, &result), vec!["x", "x", "x"]);
    }

    #[test]
    fn test_interpolation_per_match() {
        let mut tree = Tree::new();
        let root = string_sequence(&mut tree, &["a", "b"]);
        let result = run(&mut tree, root, r#".[] | "<\(.)>""#).unwrap();
        assert_eq!(values(&tree, &result), vec!["<a>", "<b>"]);
    }

    #[test]
    fn test_interpolation_nested_and_parenthesised() {
        let mut tree = Tree::new();
        let root = mapping(&mut tree, &[("x", "in")]);
        let result = run(&mut tree, root, r#""a \(\"b \(.x)\" | upcase) c""#).unwrap();
        assert_eq!(values(&tree, &result), vec!["a B IN c"]);

        let result = run(&mut tree, root, r#""[\((.x | upcase))]""#).unwrap();
        assert_eq!(values(&tree, &result), vec!["[IN]"]);
    }

    #[test]
    fn test_interpolation_missing_and_non_scalar() {
        let mut tree = Tree::new();
        let root = mapping(&mut tree, &[("a", "1")]);
        let result = run(&mut tree, root, r#""[\(.nothing)]""#).unwrap();
        assert_eq!(values(&tree, &result), vec!["[null]"]);

        let result = run(&mut tree, root, r#""\(.)""#).unwrap();
        assert_eq!(values(&tree, &result), vec!["a: 1"]);
    }

    #[test]
    fn test_unclosed_interpolation() {
        let mut tree = Tree::new();
        let root = tree.add(Node::null());
        let err = run(&mut tree, root, r#""oops \(.a""#).unwrap_err();
        assert!(matches!(err, EvalError::SyntaxError(_)));
        assert!(err.to_string().contains("unclosed interpolation"));
    }

    #[test]
    fn test_escaped_paren_inside_expression() {
        let mut tree = Tree::new();
        let root = tree.add(Node::string("a)b"));
        let result = run(&mut tree, root, r#""<\(sub(\"\)\"; \"!\"))>""#).unwrap();
        assert_eq!(values(&tree, &result), vec!["<a!b>"]);
    }

    #[test]
    fn test_unclosed_nested_interpolation() {
        let mut tree = Tree::new();
        let root = mapping(&mut tree, &[("a", "1")]);
        for text in [r#""x \((.a""#, r#""x \(((.a) | upcase""#, r#""x \(\"\(.a)\"""#] {
            let err = run(&mut tree, root, text).unwrap_err();
            assert!(matches!(err, EvalError::SyntaxError(_)), "{text}");
            assert!(err.to_string().contains("unclosed interpolation"), "{text}");
        }
    }

    #[test]
    fn test_interpolation_disabled_yields_one_literal() {
        let mut tree = Tree::new();
        let root = string_sequence(&mut tree, &["a", "b", "c"]);
        let navigator = Navigator::new(EvalConfig { interpolation: false });
        let expr = parse_expression(r#".[] | "lit \(.)""#).unwrap();
        let result = navigator.evaluate(&mut tree, &Context::root(root), &expr).unwrap();
        assert_eq!(values(&tree, &result), vec![r"lit \(.)"]);
    }

    #[test]
    fn test_interpolation_disabled() {
        let mut tree = Tree::new();
        let root = mapping(&mut tree, &[("a", "1")]);
        let navigator = Navigator::new(EvalConfig { interpolation: false });
        let expr = parse_expression(r#""\(.a)""#).unwrap();
        let result = navigator.evaluate(&mut tree, &Context::root(root), &expr).unwrap();
        assert_eq!(values(&tree, &result), vec![r"\(.a)"]);
    }

    #[test]
    fn test_trim_keeps_tag_and_is_idempotent() {
        let mut tree = Tree::new();
        let mut node = Node::scalar(Tag::Custom("!name".into()), "  pad  ");
        node.style = Style::SingleQuoted;
        let root = tree.add(node);

        let once = run(&mut tree, root, "trim").unwrap();
        let first = once.first().unwrap().node;
        assert_eq!(tree.get(first).value(), Some("pad"));
        assert_eq!(tree.get(first).tag, Tag::Custom("!name".into()));
        assert_eq!(tree.get(first).style, Style::SingleQuoted);

        let twice = run(&mut tree, first, "trim").unwrap();
        assert_eq!(values(&tree, &twice), vec!["pad"]);
    }

    #[test]
    fn test_trim_rejects_numbers() {
        let mut tree = Tree::new();
        let root = tree.add(Node::integer(3));
        let err = run(&mut tree, root, "trim").unwrap_err();
        assert_eq!(err.to_string(), "cannot trim !!int, can only operate on strings");
    }

    #[test]
    fn test_change_case() {
        let mut tree = Tree::new();
        let root = tree.add(Node::string("MiXed Straße"));
        let result = run(&mut tree, root, "upcase, downcase, ascii_upcase, ascii_downcase").unwrap();
        assert_eq!(
            values(&tree, &result),
            vec!["MIXED STRASSE", "mixed straße", "MIXED STRAßE", "mixed straße"]
        );

        let root = tree.add(Node::string("Ünïcode"));
        let result = run(&mut tree, root, "ascii_upcase, ascii_downcase").unwrap();
        assert_eq!(values(&tree, &result), vec!["ÜNïCODE", "Ünïcode"]);

        let root = tree.add(Node::string("Hello World"));
        let round = run(&mut tree, root, "upcase | downcase").unwrap();
        let direct = run(&mut tree, root, "downcase").unwrap();
        assert_eq!(values(&tree, &round), values(&tree, &direct));

        let map = tree.add(Node::mapping());
        let err = run(&mut tree, map, "upcase").unwrap_err();
        assert!(err.to_string().contains("!!map"));
    }

    #[test]
    fn test_to_string() {
        let mut tree = Tree::new();
        let root = mapping(&mut tree, &[("n", "42")]);
        let result = run(&mut tree, root, ".n | to_string").unwrap();
        let id = result.first().unwrap().node;
        assert_eq!(tree.get(id).value(), Some("42"));
        assert_eq!(tree.get(id).tag, Tag::Str);
        assert_eq!(tree.get(id).style, Style::DoubleQuoted);

        let result = run(&mut tree, root, "to_string").unwrap();
        assert_eq!(values(&tree, &result), vec!["n: 42"]);
    }

    #[test]
    fn test_join() {
        let mut tree = Tree::new();
        let a = tree.add(Node::string("a"));
        let null = tree.add(Node::null());
        let one = tree.add(Node::integer(1));
        let root = tree.add(Node::sequence_of(vec![a, null, one]));
        let result = run(&mut tree, root, r#"join("-")"#).unwrap();
        assert_eq!(values(&tree, &result), vec!["a--1"]);

        let scalar = tree.add(Node::string("x"));
        let err = run(&mut tree, scalar, r#"join(",")"#).unwrap_err();
        assert_eq!(err.to_string(), "cannot join with !!str, can only join arrays of scalars");
    }

    #[test]
    fn test_split() {
        let mut tree = Tree::new();
        let root = tree.add(Node::string("a,b,,c"));
        let result = run(&mut tree, root, r#"split(",") | .[]"#).unwrap();
        assert_eq!(values(&tree, &result), vec!["a", "b", "", "c"]);

        let root = tree.add(Node::string("héj"));
        let result = run(&mut tree, root, r#"split("") | .[]"#).unwrap();
        assert_eq!(values(&tree, &result), vec!["h", "é", "j"]);

        let root = tree.add(Node::string(""));
        let result = run(&mut tree, root, r#"split(",")"#).unwrap();
        assert!(tree.get(result.first().unwrap().node).content().is_empty());
    }

    #[test]
    fn test_split_skips_null_and_rejects_numbers() {
        let mut tree = Tree::new();
        let root = tree.add(Node::null());
        let result = run(&mut tree, root, r#"split(",")"#).unwrap();
        assert!(result.is_empty());

        let root = tree.add(Node::integer(5));
        let err = run(&mut tree, root, r#"split(",")"#).unwrap_err();
        assert_eq!(err.to_string(), "cannot split !!int, can only split strings");
    }

    #[test]
    fn test_split_join_round_trip() {
        let mut tree = Tree::new();
        let root = string_sequence(&mut tree, &["x", "y", "z"]);
        let result = run(&mut tree, root, r#"join(";") | split(";") | .[]"#).unwrap();
        assert_eq!(values(&tree, &result), vec!["x", "y", "z"]);
    }
}
