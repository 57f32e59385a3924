//! Documentation content for the treeq CLI

use super::CliError;

/// Available documentation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocCategory {
    Paths,
    Assignment,
    Strings,
    Regex,
    Interpolation,
    Formats,
}

impl DocCategory {
    /// Parse category name from string
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "paths" | "path" | "navigation" => Some(Self::Paths),
            "assignment" | "assign" | "update" => Some(Self::Assignment),
            "strings" | "string" | "string_operators" => Some(Self::Strings),
            "regex" | "regexes" | "patterns" => Some(Self::Regex),
            "interpolation" | "interpolate" => Some(Self::Interpolation),
            "formats" | "format" | "io" => Some(Self::Formats),
            _ => None,
        }
    }
}

/// Get the docs overview (category listing)
pub fn get_docs_overview() -> &'static str {
    r#"TREEQ DOCUMENTATION

treeq queries and rewrites YAML, JSON and properties documents, and reads
CSV/TSV tables. An expression
is evaluated once per input document; every result is printed in the output
format.

DOCUMENTATION CATEGORIES

  paths             Self, key lookup, indexing, iteration, pipes and unions
  assignment        '=' and '|=' and how missing entries are created
  strings           trim, upcase, downcase, to_string, join, split
  regex             sub, match, capture, test and match flags
  interpolation     Embedding expressions in string literals with \( ... )
  formats           Input and output formats and their options

QUICK REFERENCE

  .                 Current node
  .a.b              Nested key lookup
  .items[0]         Sequence position
  .items[]          Every element
  a | b             Feed results of a into b
  .a |= upcase      Rewrite a in place

Run 'treeq doc <category>' for detailed documentation.
"#
}

/// Get documentation for a specific category
pub fn get_doc_category(name: &str) -> Result<&'static str, CliError> {
    match DocCategory::from_name(name) {
        Some(DocCategory::Paths) => Ok(PATHS_DOC),
        Some(DocCategory::Assignment) => Ok(ASSIGNMENT_DOC),
        Some(DocCategory::Strings) => Ok(STRINGS_DOC),
        Some(DocCategory::Regex) => Ok(REGEX_DOC),
        Some(DocCategory::Interpolation) => Ok(INTERPOLATION_DOC),
        Some(DocCategory::Formats) => Ok(FORMATS_DOC),
        None => Err(CliError::UnknownCategory(name.to_string())),
    }
}

const PATHS_DOC: &str = r#"PATHS - Navigating Documents

SELF
  .
    The current node. At the top level this is the whole document.

KEY LOOKUP
  .name  ."name"  .["name"]
    Look up a mapping key. Quote keys that are not identifiers.

    Example:
      Input:  {user: {name: ann}}
      Expr:   .user.name
      Output: ann

    A missing key yields null, which assignment can fill in.
    Looking up a key in a sequence is an error.

INDEXING
  .items[0]  .items[-1]
    Zero-based position; negative positions count from the end.

ITERATION
  .items[]
    Every element of a sequence or every value of a mapping.
    Iterating null yields nothing; iterating any other scalar is an error.

COMPOSITION
  a | b     Evaluate b against every result of a
  a, b      Results of a followed by results of b

LITERALS
  123  1.5  true  false  null  "text"
"#;

const ASSIGNMENT_DOC: &str = r#"ASSIGNMENT - Changing Documents

PLAIN ASSIGNMENT
  .path = expr
    Evaluates expr once against the input and copies its first result into
    every match of .path. The whole document is returned.

    Example:
      Input:  {a: 1}
      Expr:   .b.c = "x"
      Output: {a: 1, b: {c: x}}

UPDATE ASSIGNMENT
  .path |= expr
    Evaluates expr against each match of .path separately and writes its
    first result back in place.

    Example:
      Input:  {names: [" ann ", "bob "]}
      Expr:   .names[] |= trim
      Output: {names: [ann, bob]}

MISSING ENTRIES
  Assigning to a key or position that does not exist creates it, together
  with any missing parents. Sequences are padded with nulls.
"#;

const STRINGS_DOC: &str = r#"STRINGS - String Operators

All string operators reject non-string input with an error naming its tag.

  trim              Remove leading and trailing whitespace
  upcase            Convert to upper case
  downcase          Convert to lower case
  ascii_upcase      Convert a-z only
  ascii_downcase    Convert A-Z only
  to_string         Render any node as a string; containers become YAML
  join(sep)         Join a sequence of scalars; nulls become ""
  split(sep)        Split a string into a sequence; null input is skipped

  Example:
    Input:  {tags: "a,b,c"}
    Expr:   .tags | split(",") | join(" / ")
    Output: a / b / c

  Tag and style of the input are kept by trim and case changes.
  sub always produces a plain !!str.
"#;

const REGEX_DOC: &str = r#"REGEX - Pattern Operators

  sub(pattern; replacement)
    Replace every match. Replacements may reference groups as $1 or ${name}.

  match(pattern)  match(pattern; "g")
    One result per match with string, offset, length and captures.
    Without "g" only the first match is returned.

  capture(pattern)  capture(pattern; "g")
    A mapping of named groups to the text they matched.

  test(pattern)
    true when the pattern matches, false otherwise.

FLAGS
  g     Return every match
  For case-insensitive matching write (?i) in the pattern:
    match("(?i)cat")

  Example:
    Input:  "banana"
    Expr:   match("a"; "g") | .offset
    Output: 1, 3, 5
"#;

const INTERPOLATION_DOC: &str = r#"INTERPOLATION - Expressions Inside Strings

  "\( expr )"
    Evaluates expr against the current node and inserts its first result.

    Example:
      Input:  {name: ann, count: 3}
      Expr:   "\(.name) has \(.count) messages"
      Output: ann has 3 messages

  A missing value is inserted as null. Containers are inserted as YAML.
  Parentheses inside the expression may nest.
  An unclosed '\(' is an error.

  Disable with --no-interpolation to keep literals verbatim.
"#;

const FORMATS_DOC: &str = r#"FORMATS - Input and Output

  -p, --input-format <yaml|json|properties|csv|tsv>
  -o, --output-format <yaml|json|properties>

YAML
  Multiple documents separated by '---' are evaluated one at a time.

JSON
  A stream of values is read as one document per value.
  -I 0 prints compact JSON.

PROPERTIES
  key.path = value lines. Numeric segments address sequence positions.
  Comments above a key are kept.
  --array-brackets writes positions as key[0] instead of key.0.

CSV / TSV (input only)
  The first row names the columns; each later row becomes one mapping in a
  sequence. Cells that read as YAML keep their type, others stay strings.

    Example:
      Input:  name,age
              ann,31
      Expr:   .[0].age
      Output: 31

OPTIONS
  -I, --indent <n>      Indentation for YAML and JSON output
  --no-interpolation    Keep string literals verbatim
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_aliases() {
        assert_eq!(DocCategory::from_name("Paths"), Some(DocCategory::Paths));
        assert_eq!(DocCategory::from_name("string-operators"), Some(DocCategory::Strings));
        assert_eq!(DocCategory::from_name("nope"), None);
    }

    #[test]
    fn test_unknown_category() {
        let err = get_doc_category("nope").unwrap_err();
        assert!(err.to_string().contains("Unknown category: 'nope'"));
    }
}
