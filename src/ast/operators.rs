/// Direction of a change-case operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseDirection {
    /// `upcase`
    Upper,
    /// `downcase`
    Lower,
    /// `ascii_upcase`: only `a`-`z` change
    AsciiUpper,
    /// `ascii_downcase`: only `A`-`Z` change
    AsciiLower,
}

/// Operation performed by an expression node.
///
/// Operators that take arguments receive them through the node's `rhs`; two
/// arguments are packed into a [`Operation::Block`] (`lhs; rhs`).
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    // Paths
    /// Identity (`.`)
    SelfRef,
    /// Mapping key lookup (`.name`, `."name"`, `.["name"]`)
    Traverse(String),
    /// Sequence position (`.[0]`, `.[-1]`)
    Index(i64),
    /// Every child value (`.[]`)
    Iterate,

    // Literals
    /// String literal, evaluated through interpolation
    Interpolate(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,

    // Composition
    /// `lhs | rhs`
    Pipe,
    /// `lhs, rhs`
    Union,
    /// Two call arguments, `lhs; rhs`
    Block,
    /// `lhs = rhs`
    Assign,
    /// `lhs |= rhs`
    Update,

    // String operators
    Trim,
    ChangeCase(CaseDirection),
    ToString,
    /// `join(separator)`
    Join,
    /// `split(separator)`
    Split,

    // Regex operators
    /// `sub(pattern; replacement)`
    Substitute,
    /// `match(pattern)` or `match(pattern; flags)`
    Match,
    /// `capture(pattern)` or `capture(pattern; flags)`
    Capture,
    /// `test(pattern)` or `test(pattern; flags)`
    Test,
}

impl Operation {
    /// Name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::SelfRef => "self",
            Operation::Traverse(_) => "traverse",
            Operation::Index(_) => "index",
            Operation::Iterate => "iterate",
            Operation::Interpolate(_) => "string",
            Operation::Integer(_) | Operation::Float(_) | Operation::Boolean(_) | Operation::Null => {
                "literal"
            }
            Operation::Pipe => "pipe",
            Operation::Union => "union",
            Operation::Block => "block",
            Operation::Assign => "assign",
            Operation::Update => "update",
            Operation::Trim => "trim",
            Operation::ChangeCase(CaseDirection::Upper) => "upcase",
            Operation::ChangeCase(CaseDirection::Lower) => "downcase",
            Operation::ChangeCase(CaseDirection::AsciiUpper) => "ascii_upcase",
            Operation::ChangeCase(CaseDirection::AsciiLower) => "ascii_downcase",
            Operation::ToString => "to_string",
            Operation::Join => "join",
            Operation::Split => "split",
            Operation::Substitute => "sub",
            Operation::Match => "match",
            Operation::Capture => "capture",
            Operation::Test => "test",
        }
    }
}
