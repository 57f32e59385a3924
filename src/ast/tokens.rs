#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Floating-point number
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// -0.5
    /// ```
    Float(f64),

    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -1
    /// ```
    Integer(i64),

    /// String literal enclosed in double quotes.
    ///
    /// Only `\"` is unescaped by the lexer; every other backslash sequence is
    /// kept as written so that `\d` reaches the regex engine and `\(` reaches
    /// string interpolation.
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// "Hello \(.name)"
    /// ```
    String(String),

    /// Boolean values
    Boolean(bool),

    /// Null value
    Null,

    // Identifiers
    /// Field name or function name
    ///
    /// # Examples
    /// ```text
    /// name
    /// ascii_downcase
    /// ```
    Identifier(String),

    // Punctuation
    /// Path separator and the identity expression
    ///
    /// # Examples
    /// ```text
    /// .
    /// .a.b
    /// ```
    Dot,

    /// Pipe: feeds every result on the left into the right
    Pipe,

    /// Union of the results of both sides
    Comma,

    /// Separates the two arguments of a call
    ///
    /// # Examples
    /// ```text
    /// sub("a"; "b")
    /// match("a"; "g")
    /// ```
    Semicolon,

    /// Plain assignment (`=`)
    Assign,

    /// Update assignment (`|=`)
    UpdateAssign,

    /// Left parenthesis
    LParen,

    /// Right parenthesis
    RParen,

    /// Left bracket
    LBracket,

    /// Right bracket
    RBracket,

    /// End of input
    Eof,
}
