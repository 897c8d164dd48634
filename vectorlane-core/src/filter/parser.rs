//! Recursive-descent parser for filter expressions.
//!
//! ```text
//! expr       := or
//! or         := and (("or" | "||") and)*
//! and        := unary (("and" | "&&") unary)*
//! unary      := ("not" | "!") unary | "(" expr ")" | comparison
//! literal    := integer | float | string | "true" | "false" | "null"
//! comparison := ident op literal
//!             | ident ["not"] "in" "[" [literal ("," literal)*] "]"
//!             | ident "like" string
//! op         := "==" | "!=" | "<" | "<=" | ">" | ">="
//! ```
//!
//! Keywords are case-insensitive. Nesting through `(`, `not` and `!` is
//! limited to [`MAX_DEPTH`] levels.

use serde_json::Value;

use super::FilterCondition;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    In,
    Like,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier '{}'", s),
            Token::Str(s) => format!("string {:?}", s),
            Token::Int(i) => format!("number {}", i),
            Token::Float(f) => format!("number {}", f),
            Token::Bool(b) => format!("'{}'", b),
            Token::Null => "'null'".to_string(),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Comma => ",",
            Token::Eq => "==",
            Token::Ne => "!=",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
            Token::In => "in",
            Token::Like => "like",
            _ => "literal",
        }
    }
}

/// Deepest accepted nesting of parentheses and negations.
pub(crate) const MAX_DEPTH: usize = 256;

fn syntax(msg: impl Into<String>) -> Error {
    Error::FilterSyntax(msg.into())
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '=' | '!' | '<' | '>' | '&' | '|' => {
                let next = chars.get(i + 1).copied();
                let (token, width) = match (c, next) {
                    ('=', Some('=')) => (Token::Eq, 2),
                    ('!', Some('=')) => (Token::Ne, 2),
                    ('!', _) => (Token::Not, 1),
                    ('<', Some('=')) => (Token::Le, 2),
                    ('<', _) => (Token::Lt, 1),
                    ('>', Some('=')) => (Token::Ge, 2),
                    ('>', _) => (Token::Gt, 1),
                    ('&', Some('&')) => (Token::And, 2),
                    ('|', Some('|')) => (Token::Or, 2),
                    _ => return Err(syntax(format!("unexpected '{}' at offset {}", c, i))),
                };
                tokens.push(token);
                i += width;
            }
            '"' | '\'' => {
                let (s, end) = read_string(&chars, i)?;
                tokens.push(Token::Str(s));
                i = end;
            }
            c if c.is_ascii_digit() || c == '-' || c == '.' => {
                let start = i;
                i += 1;
                while i < chars.len()
                    && (chars[i].is_ascii_digit() || matches!(chars[i], '.' | 'e' | 'E' | '+' | '-'))
                {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(parse_number(&text)?);
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let token = match word.to_ascii_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "in" => Token::In,
                    "like" => Token::Like,
                    "true" => Token::Bool(true),
                    "false" => Token::Bool(false),
                    "null" => Token::Null,
                    _ => Token::Ident(word),
                };
                tokens.push(token);
            }
            other => {
                return Err(syntax(format!(
                    "unexpected character '{}' at offset {}",
                    other, i
                )))
            }
        }
    }

    Ok(tokens)
}

fn read_string(chars: &[char], start: usize) -> Result<(String, usize)> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or_else(|| syntax("unterminated escape sequence"))?;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => *other,
                });
                i += 2;
            }
            c if c == quote => return Ok((out, i + 1)),
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    Err(syntax(format!("unterminated string starting at offset {}", start)))
}

fn parse_number(text: &str) -> Result<Token> {
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Token::Int(i));
    }
    text.parse::<f64>()
        .map(Token::Float)
        .map_err(|_| syntax(format!("invalid number '{}'", text)))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(ref t) if *t == expected => Ok(()),
            Some(t) => Err(syntax(format!(
                "expected '{}', found {}",
                expected.symbol(),
                t.describe()
            ))),
            None => Err(syntax(format!(
                "expected '{}', found end of expression",
                expected.symbol()
            ))),
        }
    }

    fn or(&mut self) -> Result<FilterCondition> {
        let mut left = self.and()?;
        while self.eat(&Token::Or) {
            let right = self.and()?;
            left = FilterCondition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<FilterCondition> {
        let mut left = self.unary()?;
        while self.eat(&Token::And) {
            let right = self.unary()?;
            left = FilterCondition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<FilterCondition> {
        if self.eat(&Token::Not) {
            self.descend()?;
            let inner = self.unary();
            self.depth -= 1;
            return Ok(FilterCondition::Not(Box::new(inner?)));
        }
        if self.eat(&Token::LParen) {
            self.descend()?;
            let inner = self.or();
            self.depth -= 1;
            let inner = inner?;
            self.expect(Token::RParen)?;
            return Ok(inner);
        }
        self.comparison()
    }

    fn descend(&mut self) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(syntax("filter nested too deeply"));
        }
        self.depth += 1;
        Ok(())
    }

    fn comparison(&mut self) -> Result<FilterCondition> {
        let field = match self.next() {
            Some(Token::Ident(name)) => name,
            Some(t) => return Err(syntax(format!("expected field name, found {}", t.describe()))),
            None => return Err(syntax("expected field name, found end of expression")),
        };

        match self.next() {
            Some(Token::Eq) => Ok(FilterCondition::Eq(field, self.literal()?)),
            Some(Token::Ne) => Ok(FilterCondition::Ne(field, self.literal()?)),
            Some(Token::Lt) => Ok(FilterCondition::Lt(field, self.literal()?)),
            Some(Token::Le) => Ok(FilterCondition::Lte(field, self.literal()?)),
            Some(Token::Gt) => Ok(FilterCondition::Gt(field, self.literal()?)),
            Some(Token::Ge) => Ok(FilterCondition::Gte(field, self.literal()?)),
            Some(Token::In) => Ok(FilterCondition::In(field, self.list()?)),
            Some(Token::Not) => {
                self.expect(Token::In)?;
                let values = self.list()?;
                Ok(FilterCondition::Not(Box::new(FilterCondition::In(field, values))))
            }
            Some(Token::Like) => match self.next() {
                Some(Token::Str(pattern)) => Ok(FilterCondition::Like(field, pattern)),
                Some(t) => Err(syntax(format!(
                    "like expects a string pattern, found {}",
                    t.describe()
                ))),
                None => Err(syntax("like expects a string pattern")),
            },
            Some(t) => Err(syntax(format!(
                "expected comparison after '{}', found {}",
                field,
                t.describe()
            ))),
            None => Err(syntax(format!(
                "expected comparison after '{}', found end of expression",
                field
            ))),
        }
    }

    fn literal(&mut self) -> Result<Value> {
        match self.next() {
            Some(Token::Int(i)) => Ok(Value::from(i)),
            Some(Token::Float(f)) => Ok(Value::from(f)),
            Some(Token::Str(s)) => Ok(Value::from(s)),
            Some(Token::Bool(b)) => Ok(Value::from(b)),
            Some(Token::Null) => Ok(Value::Null),
            Some(t) => Err(syntax(format!("expected literal, found {}", t.describe()))),
            None => Err(syntax("expected literal, found end of expression")),
        }
    }

    fn list(&mut self) -> Result<Vec<Value>> {
        self.expect(Token::LBracket)?;
        let mut values = Vec::new();
        if self.eat(&Token::RBracket) {
            return Ok(values);
        }
        loop {
            values.push(self.literal()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(Token::RBracket)?;
            return Ok(values);
        }
    }
}

/// Parses a complete expression.
pub(super) fn parse(input: &str) -> Result<FilterCondition> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(syntax("empty expression"));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let condition = parser.or()?;

    if let Some(t) = parser.peek() {
        return Err(syntax(format!("unexpected trailing {}", t.describe())));
    }
    Ok(condition)
}
