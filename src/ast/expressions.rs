use crate::ast::Operation;

/// Abstract Syntax Tree node representing a parsed expression.
///
/// Every node is an [`Operation`] with up to two operands. Binary operators
/// (`|`, `,`, `=`, `|=`, `;`) use both; operators with a single argument
/// (`join(", ")`, `match("a")`) keep it in `rhs`.
///
/// # Examples
///
/// ```
/// use treeq::ast::{ExpressionNode, Operation};
///
/// // .name | trim
/// let expr = ExpressionNode::binary(
///     Operation::Pipe,
///     ExpressionNode::leaf(Operation::Traverse("name".into())),
///     ExpressionNode::leaf(Operation::Trim),
/// );
/// assert_eq!(expr.operation, Operation::Pipe);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionNode {
    pub operation: Operation,
    pub lhs: Option<Box<ExpressionNode>>,
    pub rhs: Option<Box<ExpressionNode>>,
}

impl ExpressionNode {
    /// A node without operands.
    pub fn leaf(operation: Operation) -> Self {
        ExpressionNode { operation, lhs: None, rhs: None }
    }

    /// A node whose single argument lives in `rhs`.
    pub fn with_argument(operation: Operation, argument: ExpressionNode) -> Self {
        ExpressionNode { operation, lhs: None, rhs: Some(Box::new(argument)) }
    }

    pub fn binary(operation: Operation, lhs: ExpressionNode, rhs: ExpressionNode) -> Self {
        ExpressionNode {
            operation,
            lhs: Some(Box::new(lhs)),
            rhs: Some(Box::new(rhs)),
        }
    }

    /// Two call arguments packed into a block (`a; b`).
    pub fn block(first: ExpressionNode, second: ExpressionNode) -> Self {
        ExpressionNode::binary(Operation::Block, first, second)
    }

    pub fn is_block(&self) -> bool {
        self.operation == Operation::Block
    }
}
