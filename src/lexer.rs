use std::fmt;

use crate::token::{Operator, Span, Token, TokenKind};

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// A `${` reference ran to the end of input without its `}`.
    UnclosedBrace,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnclosedBrace => write!(f, "closing brace expected"),
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

/// Tokenize a whole template into a vector of tokens.
///
/// The terminal `EndOfInput` token is not included.
///
/// # Errors
///
/// Returns `LexError` when a braced reference is never closed.
pub fn tokenize(input: &str, no_digit: bool) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(input, no_digit);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        match token.kind {
            TokenKind::EndOfInput => return Ok(tokens),
            TokenKind::Error(kind) => {
                return Err(LexError {
                    kind,
                    span: token.span,
                });
            }
            _ => tokens.push(token),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Outside any reference.
    Text,
    /// Just after `${`.
    Reference,
    /// After the variable name of a braced reference.
    Operator,
    /// Inside the default expression, up to `}`.
    Default,
}

/// Pull-based scanner producing one token per call.
///
/// Once `EndOfInput` or `Error` has been produced, every later call
/// returns that same token.
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    no_digit: bool,
    state: State,
    terminal: Option<Token>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `input`. With `no_digit` set, references
    /// whose name starts with a digit are treated as plain text.
    #[must_use]
    pub const fn new(input: &'a str, no_digit: bool) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
            no_digit,
            state: State::Text,
            terminal: None,
        }
    }

    /// Produce the next token.
    pub fn next_token(&mut self) -> Token {
        if let Some(token) = &self.terminal {
            return token.clone();
        }

        let token = match self.state {
            State::Text => self.lex_text(),
            State::Reference => self.lex_reference(),
            State::Operator => self.lex_operator(),
            State::Default => self.lex_default(),
        };

        if token.is_terminal() {
            self.terminal = Some(token.clone());
        }
        token
    }

    const fn span(&self) -> Span {
        Span {
            offset: self.pos,
            line: self.line,
            column: self.col,
        }
    }

    fn token(&self, kind: TokenKind, start: Span) -> Token {
        Token {
            kind,
            text: self.input[start.offset..self.pos].to_string(),
            span: start,
        }
    }

    fn error(&self, kind: LexErrorKind) -> Token {
        Token {
            text: kind.to_string(),
            kind: TokenKind::Error(kind),
            span: self.span(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek() {
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// Whether the `$` under the cursor introduces an escape or a
    /// reference rather than standing for itself.
    fn starts_reference(&self) -> bool {
        matches!(self.peek_at(1), Some('$' | '{')) || self.peek_at(1).is_some_and(is_ident_char)
    }

    fn lex_text(&mut self) -> Token {
        let start = self.span();

        while let Some(ch) = self.peek() {
            if ch == '$' && self.starts_reference() {
                if self.pos > start.offset {
                    return self.token(TokenKind::Text, start);
                }
                return self.lex_sigil();
            }
            self.advance();
        }

        if self.pos > start.offset {
            self.token(TokenKind::Text, start)
        } else {
            self.token(TokenKind::EndOfInput, start)
        }
    }

    /// `$$` is emitted as a single literal `$`.
    fn lex_escape(&mut self) -> Token {
        let start = self.span();
        self.advance_n(2);
        Token {
            kind: TokenKind::Text,
            text: "$".to_string(),
            span: start,
        }
    }

    fn lex_sigil(&mut self) -> Token {
        let start = self.span();

        match self.peek_at(1) {
            Some('$') => self.lex_escape(),
            Some('{') => {
                let name = ident_at(self.input, self.pos + 2);
                if self.no_digit && starts_with_digit(name) {
                    // `${2` is kept as text along with whatever follows
                    self.advance_n(3);
                    return self.token(TokenKind::Text, start);
                }
                self.advance_n(2);
                self.state = State::Reference;
                self.token(TokenKind::LeftDelim, start)
            }
            _ => {
                let name = ident_at(self.input, self.pos + 1);
                if self.no_digit && starts_with_digit(name) {
                    self.advance_n(2);
                    return self.token(TokenKind::Text, start);
                }
                self.advance_n(1 + name.len());
                if is_valid_name(name) {
                    self.token(
                        TokenKind::Variable {
                            name: name.to_string(),
                        },
                        start,
                    )
                } else {
                    self.token(TokenKind::Text, start)
                }
            }
        }
    }

    fn lex_reference(&mut self) -> Token {
        let start = self.span();
        let name = ident_at(self.input, self.pos);

        if is_valid_name(name) {
            self.advance_n(name.len());
            self.state = State::Operator;
            return self.token(
                TokenKind::Variable {
                    name: name.to_string(),
                },
                start,
            );
        }

        if self.peek().is_none() {
            return self.error(LexErrorKind::UnclosedBrace);
        }

        // Not a reference after all; scan plain text up to the next one.
        self.state = State::Text;
        self.advance_n(name.len().max(1));
        while let Some(ch) = self.peek() {
            if ch == '$' && self.starts_reference() {
                break;
            }
            self.advance();
        }
        self.token(TokenKind::Text, start)
    }

    fn lex_operator(&mut self) -> Token {
        let start = self.span();

        let operator = match (self.peek(), self.peek_at(1)) {
            (None, _) => return self.error(LexErrorKind::UnclosedBrace),
            (Some('}'), _) => {
                self.advance();
                self.state = State::Text;
                return self.token(TokenKind::RightDelim, start);
            }
            (Some(':'), Some('-')) => Some((Operator::ColonDash, 2)),
            (Some(':'), Some('=')) => Some((Operator::ColonEquals, 2)),
            (Some(':'), Some('+')) => Some((Operator::ColonPlus, 2)),
            (Some('-'), _) => Some((Operator::Dash, 1)),
            (Some('='), _) => Some((Operator::Equals, 1)),
            (Some('+'), _) => Some((Operator::Plus, 1)),
            _ => None,
        };

        self.state = State::Default;
        match operator {
            Some((operator, width)) => {
                self.advance_n(width);
                self.token(TokenKind::Operator(operator), start)
            }
            None => self.lex_default(),
        }
    }

    fn lex_default(&mut self) -> Token {
        let start = self.span();

        match self.peek() {
            None => return self.error(LexErrorKind::UnclosedBrace),
            Some('}') => {
                self.advance();
                self.state = State::Text;
                return self.token(TokenKind::RightDelim, start);
            }
            Some('$') => {
                if self.peek_at(1) == Some('$') {
                    return self.lex_escape();
                }
                if let Some((name, width)) = self.nested_variable() {
                    self.advance_n(width);
                    return self.token(
                        TokenKind::Variable {
                            name: name.to_string(),
                        },
                        start,
                    );
                }
                // lone sigil
                self.advance();
            }
            Some(_) => {}
        }

        while let Some(ch) = self.peek() {
            if ch == '}'
                || (ch == '$'
                    && (self.peek_at(1) == Some('$') || self.nested_variable().is_some()))
            {
                break;
            }
            self.advance();
        }
        self.token(TokenKind::Text, start)
    }

    /// `$NAME` or `${NAME}` under the cursor, inside a default
    /// expression. Returns the name and the width of the reference.
    fn nested_variable(&self) -> Option<(&'a str, usize)> {
        let braced = self.peek_at(1) == Some('{');
        let name_start = self.pos + if braced { 2 } else { 1 };
        let name = ident_at(self.input, name_start);

        if !is_valid_name(name) || (self.no_digit && starts_with_digit(name)) {
            return None;
        }
        if !braced {
            return Some((name, name.len() + 1));
        }
        if self.input.as_bytes().get(name_start + name.len()) == Some(&b'}') {
            Some((name, name.len() + 3))
        } else {
            None
        }
    }
}

const fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != "_"
}

fn starts_with_digit(name: &str) -> bool {
    name.starts_with(|ch: char| ch.is_ascii_digit())
}

/// The maximal identifier run starting at byte `offset`.
fn ident_at(input: &str, offset: usize) -> &str {
    let rest = input.get(offset..).unwrap_or("");
    let end = rest.find(|ch: char| !is_ident_char(ch)).unwrap_or(rest.len());
    &rest[..end]
}
