//! Regular-expression operators: `sub`, `match`, `capture` and `test`.

use regex::{Captures, Regex};
use tracing::debug;

use super::{argument, string_node, string_value};
use crate::{
    ast::ExpressionNode,
    context::Context,
    navigator::{EvalError, Navigator},
    node::{Node, NodeId, Tree},
};

const MATCH_HINT: &str = "Hint: Most often you'll want to use '|=' over '=' for this operation";

/// Options accepted by `match` and `capture`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchPreferences {
    /// Report every non-overlapping match instead of the first
    pub global: bool,
}

/// Parses the flags argument of `match(pattern; flags)`.
///
/// Only `g` is accepted. Case-insensitivity belongs in the pattern itself.
pub fn parse_match_params(flags: &str) -> Result<MatchPreferences, EvalError> {
    if flags.contains('i') {
        return Err(EvalError::SyntaxError(
            r#"'i' is not a valid option for match. To ignore case, use an expression like match("(?i)cat")"#
                .to_string(),
        ));
    }
    let mut preferences = MatchPreferences::default();
    for flag in flags.chars() {
        match flag {
            'g' => preferences.global = true,
            _ => {
                return Err(EvalError::SyntaxError(format!("unrecognised match params '{}'", flags)));
            }
        }
    }
    Ok(preferences)
}

/// Compiles the pattern argument and reads the optional flags argument.
fn match_arguments(
    navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    expr: &ExpressionNode,
) -> Result<(Regex, MatchPreferences), EvalError> {
    let argument = argument(expr)?;
    let (pattern, flags) = match (argument.is_block(), &argument.lhs, &argument.rhs) {
        (true, Some(pattern), Some(flags)) => (&**pattern, Some(&**flags)),
        _ => (argument, None),
    };

    let pattern = navigator.first_value(tree, context, pattern)?.unwrap_or_default();
    let preferences = match flags {
        Some(flags) => {
            let flags = navigator.first_value(tree, context, flags)?.unwrap_or_default();
            parse_match_params(&flags)?
        }
        None => MatchPreferences::default(),
    };
    debug!(%pattern, global = preferences.global, "compiling match pattern");
    Ok((Regex::new(&pattern)?, preferences))
}

fn match_input(tree: &Tree, id: NodeId) -> Result<String, EvalError> {
    string_value(tree, id, |tag| {
        format!("cannot match with {}, can only match strings. {}", tag, MATCH_HINT)
    })
    .map(|(_, value)| value)
}

fn all_captures<'t>(regex: &Regex, value: &'t str, preferences: MatchPreferences) -> Vec<Captures<'t>> {
    if preferences.global {
        regex.captures_iter(value).collect()
    } else {
        regex.captures(value).into_iter().collect()
    }
}

/// `{string, offset, length}` entries describing one matched span.
///
/// An unmatched group reports `string: null`, `offset: -1`, `length: 0`.
fn add_span(tree: &mut Tree, map: NodeId, span: Option<regex::Match<'_>>) {
    let (text, offset, length) = match span {
        Some(span) => (
            Node::string(span.as_str()),
            span.start() as i64,
            (span.end() - span.start()) as i64,
        ),
        None => (Node::null(), -1, 0),
    };
    let entries = [
        ("string", text),
        ("offset", Node::integer(offset)),
        ("length", Node::integer(length)),
    ];
    for (key, value) in entries {
        let key = string_node(tree, key);
        let value = tree.add(value);
        tree.add_key_value(map, key, value);
    }
}

fn match_node(tree: &mut Tree, regex: &Regex, captures: &Captures<'_>) -> NodeId {
    let map = tree.add(Node::mapping());
    add_span(tree, map, captures.get(0));

    let mut groups = Vec::with_capacity(captures.len().saturating_sub(1));
    for (index, name) in regex.capture_names().enumerate().skip(1) {
        let group = tree.add(Node::mapping());
        add_span(tree, group, captures.get(index));
        if let Some(name) = name {
            let key = string_node(tree, "name");
            let value = string_node(tree, name);
            tree.add_key_value(group, key, value);
        }
        groups.push(group);
    }

    let key = string_node(tree, "captures");
    let value = tree.add(Node::sequence_of(groups));
    tree.add_key_value(map, key, value);
    map
}

/// `sub(pattern; replacement)`: replaces every match. `$1` and `${name}`
/// refer to capture groups. Results are plain `!!str` scalars.
pub(super) fn substitute(
    navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    let argument = argument(expr)?;
    let (Some(pattern), Some(replacement)) = (argument.lhs.as_deref(), argument.rhs.as_deref())
    else {
        return Err(EvalError::SyntaxError(
            "sub requires a pattern and a replacement: sub(pattern; replacement)".to_string(),
        ));
    };
    let pattern = navigator.first_value(tree, context, pattern)?.unwrap_or_default();
    let replacement = navigator.first_value(tree, context, replacement)?.unwrap_or_default();
    debug!(%pattern, %replacement, "substitute");
    let regex = Regex::new(&pattern)?;

    let mut results = Vec::with_capacity(context.len());
    for candidate in context.iter() {
        let (_, value) = string_value(tree, candidate.node, |tag| {
            format!("cannot substitute with {}, can only substitute strings. {}", tag, MATCH_HINT)
        })?;
        let replaced = regex.replace_all(&value, replacement.as_str()).into_owned();
        results.push(candidate.replaced_by(string_node(tree, replaced)));
    }
    Ok(context.child_context(results))
}

/// `match(pattern)` / `match(pattern; "g")`: one mapping per match.
pub(super) fn match_regex(
    navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    let (regex, preferences) = match_arguments(navigator, tree, context, expr)?;

    let mut results = Vec::new();
    for candidate in context.iter() {
        let value = match_input(tree, candidate.node)?;
        for captures in all_captures(&regex, &value, preferences) {
            let node = match_node(tree, &regex, &captures);
            results.push(candidate.replaced_by(node));
        }
    }
    Ok(context.child_context(results))
}

/// `capture(pattern)`: one mapping of named groups per match.
pub(super) fn capture(
    navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    let (regex, preferences) = match_arguments(navigator, tree, context, expr)?;

    let mut results = Vec::new();
    for candidate in context.iter() {
        let value = match_input(tree, candidate.node)?;
        for captures in all_captures(&regex, &value, preferences) {
            let map = tree.add(Node::mapping());
            for (index, name) in regex.capture_names().enumerate() {
                let Some(name) = name else { continue };
                let value = match captures.get(index) {
                    Some(group) => Node::string(group.as_str()),
                    None => Node::null(),
                };
                let key = string_node(tree, name);
                let value = tree.add(value);
                tree.add_key_value(map, key, value);
            }
            results.push(candidate.replaced_by(map));
        }
    }
    Ok(context.child_context(results))
}

/// `test(pattern)`: whether the pattern matches anywhere.
pub(super) fn test(
    navigator: &Navigator,
    tree: &mut Tree,
    context: &Context,
    expr: &ExpressionNode,
) -> Result<Context, EvalError> {
    let (regex, _) = match_arguments(navigator, tree, context, expr)?;

    let mut results = Vec::with_capacity(context.len());
    for candidate in context.iter() {
        let value = match_input(tree, candidate.node)?;
        let id = tree.add(Node::boolean(regex.is_match(&value)));
        results.push(candidate.replaced_by(id));
    }
    Ok(context.child_context(results))
}
