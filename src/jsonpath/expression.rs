//! Path expression grammar.
//!
//! ```text
//! expression := ["$"] step*
//! step       := "." name | ".*" | ".." (name | "*" | bracket) | bracket
//! bracket    := "[*]" | "[" digits "]" | "['" text "']" | "[\"" text "\"]"
//! ```
//!
//! An expression that does not start with `$` is evaluated relative to the
//! node it is applied to; a leading bare name is accepted as a first step.

use super::PathError;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;
use std::str::FromStr;

/// Segment is one step of a path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// `$`: the document root.
    Root,
    /// `.name` or `['name']`: a mapping entry.
    Field(String),
    /// `..`: the current nodes and all of their descendants.
    RecursiveDescent,
    /// `[*]`: every item of a sequence. Never matches inside a mapping.
    Wildcard,
    /// `.*`: every value of a mapping.
    AnyField,
    /// `[n]`: one item of a sequence.
    Index(usize),
}

/// PathExpression is a compiled path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathExpression {
    source: String,
    segments: Vec<Segment>,
}

impl PathExpression {
    /// Compiles `expression`.
    pub fn parse(expression: &str) -> Result<PathExpression, PathError> {
        let segments = Parser::new(expression).parse()?;
        Ok(PathExpression {
            source: expression.to_string(),
            segments,
        })
    }

    /// Creates an expression from already built segments.
    pub fn from_segments(segments: Vec<Segment>) -> PathExpression {
        let mut expr = PathExpression {
            source: String::new(),
            segments,
        };
        expr.source = expr.to_string();
        expr
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the text the expression was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if the expression starts at the document root.
    pub fn is_absolute(&self) -> bool {
        self.segments.first() == Some(&Segment::Root)
    }
}

impl FromStr for PathExpression {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathExpression::parse(s)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn write_name(f: &mut fmt::Formatter<'_>, name: &str, after_descent: bool) -> fmt::Result {
    if !name.is_empty() && name.chars().all(is_name_char) {
        if after_descent {
            write!(f, "{}", name)
        } else {
            write!(f, ".{}", name)
        }
    } else {
        write!(f, "['{}']", name.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut after_descent = false;
        for segment in &self.segments {
            match segment {
                Segment::Root => write!(f, "$")?,
                Segment::Field(name) => write_name(f, name, after_descent)?,
                Segment::RecursiveDescent => write!(f, "..")?,
                Segment::Wildcard => write!(f, "[*]")?,
                Segment::AnyField if after_descent => write!(f, "*")?,
                Segment::AnyField => write!(f, ".*")?,
                Segment::Index(i) => write!(f, "[{}]", i)?,
            }
            after_descent = *segment == Segment::RecursiveDescent;
        }
        Ok(())
    }
}

struct Parser<'a> {
    expression: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(expression: &'a str) -> Self {
        Parser {
            expression,
            chars: expression.char_indices().peekable(),
        }
    }

    fn error(&self, position: usize, reason: impl Into<String>) -> PathError {
        PathError::malformed(self.expression, position, reason)
    }

    fn position(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(i, _)| *i)
            .unwrap_or(self.expression.len())
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn parse(mut self) -> Result<Vec<Segment>, PathError> {
        let mut segments = Vec::new();
        if self.expression.trim().is_empty() {
            return Err(self.error(0, "empty expression"));
        }

        if self.eat('$') {
            segments.push(Segment::Root);
        } else if self.peek().is_some_and(is_name_char) {
            segments.push(Segment::Field(self.name()));
        }

        while let Some(c) = self.peek() {
            let at = self.position();
            match c {
                '.' => {
                    self.chars.next();
                    if self.eat('.') {
                        segments.push(Segment::RecursiveDescent);
                        segments.push(self.after_descent(at)?);
                    } else if self.eat('*') {
                        segments.push(Segment::AnyField);
                    } else {
                        let name = self.name();
                        if name.is_empty() {
                            return Err(self.error(at, "expected a field name after '.'"));
                        }
                        segments.push(Segment::Field(name));
                    }
                }
                '[' => segments.push(self.bracket()?),
                other => {
                    return Err(self.error(at, format!("unexpected character {:?}", other)));
                }
            }
        }

        Ok(segments)
    }

    fn after_descent(&mut self, at: usize) -> Result<Segment, PathError> {
        match self.peek() {
            Some('*') => {
                self.chars.next();
                Ok(Segment::AnyField)
            }
            Some('[') => self.bracket(),
            Some(c) if is_name_char(c) => Ok(Segment::Field(self.name())),
            _ => Err(self.error(at, "'..' must be followed by a field name, '*' or '['")),
        }
    }

    fn name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek().filter(|c| is_name_char(*c)) {
            name.push(c);
            self.chars.next();
        }
        name
    }

    fn bracket(&mut self) -> Result<Segment, PathError> {
        let open = self.position();
        self.chars.next();

        let segment = match self.peek() {
            Some('*') => {
                self.chars.next();
                Segment::Wildcard
            }
            Some(q @ ('\'' | '"')) => {
                self.chars.next();
                Segment::Field(self.quoted(q, open)?)
            }
            Some(c) if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(d) = self.peek().filter(char::is_ascii_digit) {
                    digits.push(d);
                    self.chars.next();
                }
                let index = digits
                    .parse()
                    .map_err(|_| self.error(open, "index out of range"))?;
                Segment::Index(index)
            }
            _ => return Err(self.error(open, "expected '*', an index or a quoted name")),
        };

        if !self.eat(']') {
            let at = self.position();
            return Err(self.error(at, "expected ']'"));
        }
        Ok(segment)
    }

    fn quoted(&mut self, quote: char, open: usize) -> Result<String, PathError> {
        let mut text = String::new();
        loop {
            match self.chars.next() {
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, c)) => text.push(c),
                    None => break,
                },
                Some((_, c)) if c == quote => return Ok(text),
                Some((_, c)) => text.push(c),
                None => break,
            }
        }
        Err(self.error(open, "unterminated quoted name"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn field(name: &str) -> Segment {
        Segment::Field(name.to_string())
    }

    #[test]
    fn test_parse_segments() {
        let cases = vec![
            ("$", vec![Segment::Root]),
            ("$.spec", vec![Segment::Root, field("spec")]),
            (
                "$.spec.containers[*].image",
                vec![
                    Segment::Root,
                    field("spec"),
                    field("containers"),
                    Segment::Wildcard,
                    field("image"),
                ],
            ),
            (
                "..spec.containers[0]",
                vec![
                    Segment::RecursiveDescent,
                    field("spec"),
                    field("containers"),
                    Segment::Index(0),
                ],
            ),
            ("spec.replicas", vec![field("spec"), field("replicas")]),
            (".requests.cpu", vec![field("requests"), field("cpu")]),
            (
                "$.metadata.annotations['kubernetes.io/ingress.allow-http']",
                vec![
                    Segment::Root,
                    field("metadata"),
                    field("annotations"),
                    field("kubernetes.io/ingress.allow-http"),
                ],
            ),
            (
                "$.metadata.labels.*",
                vec![Segment::Root, field("metadata"), field("labels"), Segment::AnyField],
            ),
            ("$..*", vec![Segment::Root, Segment::RecursiveDescent, Segment::AnyField]),
            ("$..[*]", vec![Segment::Root, Segment::RecursiveDescent, Segment::Wildcard]),
            ("$[\"a b\"]", vec![Segment::Root, field("a b")]),
        ];
        for (input, expected) in cases {
            let expr = PathExpression::parse(input).unwrap();
            assert_eq!(expr.segments(), expected.as_slice(), "{}", input);
            assert_eq!(expr.as_str(), input);
        }
    }

    #[test]
    fn test_parse_errors() {
        let cases = vec![
            ("", 0),
            ("$.", 1),
            ("$..", 1),
            ("$.spec[", 6),
            ("$.spec[x]", 6),
            ("$.spec[1", 8),
            ("$['open", 1),
            ("$ spec", 1),
            ("$$", 1),
        ];
        for (input, position) in cases {
            match PathExpression::parse(input) {
                Err(PathError::Malformed {
                    expression,
                    position: at,
                    ..
                }) => {
                    assert_eq!(expression, input);
                    assert_eq!(at, position, "{}", input);
                }
                Ok(expr) => panic!("{:?} parsed as {:?}", input, expr),
            }
        }
    }

    #[test]
    fn test_display_is_canonical() {
        let cases = vec![
            ("$.spec.containers[*].image", "$.spec.containers[*].image"),
            ("spec.containers", ".spec.containers"),
            ("$['spec']['replicas']", "$.spec.replicas"),
            ("$..spec..*", "$..spec..*"),
            ("$.metadata.annotations[\"a/b\"]", "$.metadata.annotations['a/b']"),
            ("$.items[3]", "$.items[3]"),
        ];
        for (input, canonical) in cases {
            let expr = PathExpression::parse(input).unwrap();
            assert_eq!(expr.to_string(), canonical);
            assert_eq!(
                PathExpression::parse(canonical).unwrap().segments(),
                expr.segments()
            );
        }
    }

    #[test]
    fn test_is_absolute() {
        assert!(PathExpression::parse("$.spec").unwrap().is_absolute());
        assert!(!PathExpression::parse("..spec").unwrap().is_absolute());
        assert!(!PathExpression::parse("spec").unwrap().is_absolute());
    }

    #[test]
    fn test_from_segments() {
        let expr = PathExpression::from_segments(vec![Segment::Root, field("kind")]);
        assert_eq!(expr.as_str(), "$.kind");
    }
}
