//! Parser for the subset of GraphQL documents the gateway serves.
//!
//! Supports a single `query` or `mutation` (or an anonymous `{ ... }`
//! shorthand), root field arguments, aliases, nested selections, fragment
//! spreads and inline fragments. Variable definitions are read for their
//! default values, fragment definitions are parsed and discarded since the
//! gateway never expands them. Lists, input objects and directives are
//! rejected, as are selection sets nested deeper than [`MAX_SELECTION_DEPTH`].

use thiserror::Error;

use crate::model::{InputValue, Operation, OperationKind, SelectedField, Selection};

/// Deepest selection-set nesting accepted in a document
pub const MAX_SELECTION_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("syntax error at offset {position}: {message}")]
pub struct ParseError {
    pub position: usize,
    pub message: String,
}

impl ParseError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Str(String),
    Int(i64),
    Float(f64),
    Punct(char),
    Spread,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Name(n) => format!("name '{}'", n),
            Token::Str(_) => "string".to_string(),
            Token::Int(i) => format!("integer {}", i),
            Token::Float(x) => format!("float {}", x),
            Token::Punct(c) => format!("'{}'", c),
            Token::Spread => "'...'".to_string(),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() || c == ',' || c == '\u{feff}' => {
                chars.next();
            }
            '#' => {
                while let Some(&(_, c)) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '{' | '}' | '(' | ')' | ':' | '$' | '!' | '=' | '@' | '[' | ']' => {
                chars.next();
                tokens.push((pos, Token::Punct(c)));
            }
            '.' => {
                for _ in 0..3 {
                    match chars.next() {
                        Some((_, '.')) => {}
                        _ => return Err(ParseError::new(pos, "expected '...'")),
                    }
                }
                tokens.push((pos, Token::Spread));
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((esc, '\\')) => match chars.next() {
                            Some((_, '"')) => value.push('"'),
                            Some((_, '\\')) => value.push('\\'),
                            Some((_, '/')) => value.push('/'),
                            Some((_, 'n')) => value.push('\n'),
                            Some((_, 't')) => value.push('\t'),
                            Some((_, 'r')) => value.push('\r'),
                            Some((_, 'u')) => {
                                let hex: String = (0..4).filter_map(|_| chars.next()).map(|(_, c)| c).collect();
                                let ch = u32::from_str_radix(&hex, 16)
                                    .ok()
                                    .and_then(char::from_u32)
                                    .ok_or_else(|| ParseError::new(esc, "invalid unicode escape"))?;
                                value.push(ch);
                            }
                            _ => return Err(ParseError::new(esc, "invalid escape sequence")),
                        },
                        Some((_, '\n')) | None => {
                            return Err(ParseError::new(pos, "unterminated string"))
                        }
                        Some((_, c)) => value.push(c),
                    }
                }
                tokens.push((pos, Token::Str(value)));
            }
            c if c == '-' || c.is_ascii_digit() => {
                let mut literal = String::new();
                let mut is_float = false;
                while let Some(&(_, c)) = chars.peek() {
                    let accept = match c {
                        '0'..='9' => true,
                        '-' | '+' => literal.is_empty() || literal.ends_with(['e', 'E']),
                        '.' | 'e' | 'E' => {
                            is_float = true;
                            true
                        }
                        _ => false,
                    };
                    if !accept {
                        break;
                    }
                    literal.push(c);
                    chars.next();
                }
                let token = if is_float {
                    literal.parse().map(Token::Float).ok()
                } else {
                    literal.parse().map(Token::Int).ok()
                };
                let token = token
                    .ok_or_else(|| ParseError::new(pos, format!("invalid number '{}'", literal)))?;
                tokens.push((pos, token));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                tokens.push((pos, Token::Name(name)));
            }
            other => {
                return Err(ParseError::new(
                    pos,
                    format!("unexpected character '{}'", other),
                ))
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.end)
    }

    fn next(&mut self) -> Result<Token, ParseError> {
        let offset = self.offset();
        let token = self
            .tokens
            .get(self.pos)
            .map(|(_, t)| t.clone())
            .ok_or_else(|| ParseError::new(offset, "unexpected end of document"))?;
        self.pos += 1;
        Ok(token)
    }

    fn is_punct(&self, c: char) -> bool {
        self.peek() == Some(&Token::Punct(c))
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.is_punct(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<(), ParseError> {
        let offset = self.offset();
        match self.next()? {
            Token::Punct(p) if p == c => Ok(()),
            other => Err(ParseError::new(
                offset,
                format!("expected '{}', found {}", c, other.describe()),
            )),
        }
    }

    fn expect_name(&mut self) -> Result<String, ParseError> {
        let offset = self.offset();
        match self.next()? {
            Token::Name(name) => Ok(name),
            other => Err(ParseError::new(
                offset,
                format!("expected a name, found {}", other.describe()),
            )),
        }
    }

    fn document(&mut self) -> Result<Operation, ParseError> {
        let mut operation = None;

        while let Some(token) = self.peek() {
            let offset = self.offset();
            match token {
                Token::Name(n) if n == "fragment" => {
                    self.fragment_definition()?;
                }
                Token::Name(_) | Token::Punct('{') => {
                    if operation.is_some() {
                        return Err(ParseError::new(
                            offset,
                            "only one operation per document is supported",
                        ));
                    }
                    operation = Some(self.operation()?);
                }
                other => {
                    return Err(ParseError::new(
                        offset,
                        format!("unexpected {}", other.describe()),
                    ))
                }
            }
        }

        operation.ok_or_else(|| ParseError::new(self.end, "document contains no operation"))
    }

    fn operation(&mut self) -> Result<Operation, ParseError> {
        if self.is_punct('{') {
            return Ok(Operation {
                kind: OperationKind::Query,
                name: None,
                variable_defaults: Vec::new(),
                root_fields: self.root_selection_set()?,
            });
        }

        let offset = self.offset();
        let kind = match self.expect_name()?.as_str() {
            "query" => OperationKind::Query,
            "mutation" => OperationKind::Mutation,
            other => {
                return Err(ParseError::new(
                    offset,
                    format!("unsupported operation type '{}'", other),
                ))
            }
        };

        let name = match self.peek() {
            Some(Token::Name(_)) => Some(self.expect_name()?),
            _ => None,
        };

        let variable_defaults = if self.is_punct('(') {
            self.variable_definitions()?
        } else {
            Vec::new()
        };

        Ok(Operation {
            kind,
            name,
            variable_defaults,
            root_fields: self.root_selection_set()?,
        })
    }

    /// `($name: Type = default, ...)`; only the defaults are kept
    fn variable_definitions(&mut self) -> Result<Vec<(String, InputValue)>, ParseError> {
        self.expect_punct('(')?;
        let mut defaults = Vec::new();
        while !self.eat_punct(')') {
            self.expect_punct('$')?;
            let name = self.expect_name()?;
            self.expect_punct(':')?;
            self.skip_type()?;

            if self.eat_punct('=') {
                let offset = self.offset();
                let value = self.value()?;
                if matches!(value, InputValue::Variable(_)) {
                    return Err(ParseError::new(
                        offset,
                        format!("default value of '${}' must be a constant", name),
                    ));
                }
                defaults.push((name, value));
            }
            if self.is_punct('@') {
                return Err(ParseError::new(self.offset(), "directives are not supported"));
            }
        }
        Ok(defaults)
    }

    /// Type references are not checked, only their brackets must balance
    fn skip_type(&mut self) -> Result<(), ParseError> {
        let start = self.offset();
        let mut open = 0usize;
        let mut named = false;
        loop {
            match self.peek() {
                Some(Token::Punct('[')) => open += 1,
                Some(Token::Punct(']')) if open > 0 => open -= 1,
                Some(Token::Punct('!')) if named => {}
                Some(Token::Name(_)) if !named => named = true,
                _ if named && open == 0 => return Ok(()),
                _ => return Err(ParseError::new(start, "invalid variable type")),
            }
            self.pos += 1;
        }
    }

    fn fragment_definition(&mut self) -> Result<(), ParseError> {
        self.expect_name()?;
        self.expect_name()?;
        let offset = self.offset();
        if self.expect_name()? != "on" {
            return Err(ParseError::new(offset, "expected 'on' in fragment definition"));
        }
        self.expect_name()?;
        self.selection_set()?;
        Ok(())
    }

    fn root_selection_set(&mut self) -> Result<Vec<SelectedField>, ParseError> {
        let offset = self.offset();
        self.selection_set()?
            .into_iter()
            .map(|selection| match selection {
                Selection::Field(field) => Ok(field),
                _ => Err(ParseError::new(
                    offset,
                    "fragments are not supported on the root type",
                )),
            })
            .collect()
    }

    fn selection_set(&mut self) -> Result<Vec<Selection>, ParseError> {
        let offset = self.offset();
        self.expect_punct('{')?;
        if self.depth >= MAX_SELECTION_DEPTH {
            return Err(ParseError::new(offset, "selection set nested too deeply"));
        }

        self.depth += 1;
        let mut selections = Vec::new();
        let result = loop {
            if self.eat_punct('}') {
                break Ok(selections);
            }
            match self.selection() {
                Ok(selection) => selections.push(selection),
                Err(err) => break Err(err),
            }
        };
        self.depth -= 1;
        result
    }

    fn selection(&mut self) -> Result<Selection, ParseError> {
        if self.peek() == Some(&Token::Spread) {
            self.pos += 1;
            return match self.peek() {
                Some(Token::Name(n)) if n == "on" => {
                    self.pos += 1;
                    let type_condition = Some(self.expect_name()?);
                    Ok(Selection::InlineFragment {
                        type_condition,
                        selections: self.selection_set()?,
                    })
                }
                Some(Token::Punct('{')) => Ok(Selection::InlineFragment {
                    type_condition: None,
                    selections: self.selection_set()?,
                }),
                _ => Ok(Selection::FragmentSpread(self.expect_name()?)),
            };
        }

        let first = self.expect_name()?;
        let (alias, name) = if self.eat_punct(':') {
            (Some(first), self.expect_name()?)
        } else {
            (None, first)
        };

        let arguments = if self.is_punct('(') {
            self.arguments()?
        } else {
            Vec::new()
        };

        if self.is_punct('@') {
            return Err(ParseError::new(self.offset(), "directives are not supported"));
        }

        let selections = if self.is_punct('{') {
            self.selection_set()?
        } else {
            Vec::new()
        };

        Ok(Selection::Field(SelectedField {
            alias,
            name,
            arguments,
            selections,
        }))
    }

    fn arguments(&mut self) -> Result<Vec<(String, InputValue)>, ParseError> {
        self.expect_punct('(')?;
        let mut arguments = Vec::new();
        while !self.eat_punct(')') {
            let name = self.expect_name()?;
            self.expect_punct(':')?;
            arguments.push((name, self.value()?));
        }
        Ok(arguments)
    }

    fn value(&mut self) -> Result<InputValue, ParseError> {
        let offset = self.offset();
        match self.next()? {
            Token::Punct('$') => Ok(InputValue::Variable(self.expect_name()?)),
            Token::Str(s) => Ok(InputValue::String(s)),
            Token::Int(i) => Ok(InputValue::Int(i)),
            Token::Float(x) => Ok(InputValue::Float(x)),
            Token::Name(n) => Ok(match n.as_str() {
                "true" => InputValue::Bool(true),
                "false" => InputValue::Bool(false),
                "null" => InputValue::Null,
                _ => InputValue::Enum(n),
            }),
            Token::Punct('[') | Token::Punct('{') => Err(ParseError::new(
                offset,
                "list and object arguments are not supported",
            )),
            other => Err(ParseError::new(
                offset,
                format!("expected a value, found {}", other.describe()),
            )),
        }
    }
}

/// Parse a gateway query document into its single operation
pub fn parse_operation(source: &str) -> Result<Operation, ParseError> {
    let mut parser = Parser {
        tokens: tokenize(source)?,
        pos: 0,
        end: source.len(),
        depth: 0,
    };
    parser.document()
}
