use std::collections::BTreeSet;
use std::fmt;

use crate::Error;
use crate::env::Env;
use crate::lexer::{LexError, LexErrorKind, Lexer};
use crate::node::{Fallback, Node, Substitution, Variable};
use crate::token::{Span, Token, TokenKind};

/// How evaluation reacts to validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Stop at the first error.
    #[default]
    Quick,
    /// Evaluate every node and report all errors together.
    AllErrors,
}

/// Validation rules applied to resolved variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Restrictions {
    /// Fail when a variable is not set.
    pub no_unset: bool,
    /// Fail when a variable is set but empty.
    pub no_empty: bool,
}

impl Restrictions {
    pub const RELAXED: Self = Self::new(false, false);
    pub const NO_EMPTY: Self = Self::new(false, true);
    pub const NO_UNSET: Self = Self::new(true, false);
    pub const STRICT: Self = Self::new(true, true);

    #[must_use]
    pub const fn new(no_unset: bool, no_empty: bool) -> Self {
        Self { no_unset, no_empty }
    }
}

/// Substitute every reference in `text` in one call.
///
/// An empty `selected` list substitutes every variable; otherwise only
/// the listed names are replaced and all other references are kept as
/// written.
///
/// # Errors
///
/// Returns `Error::Lex` on malformed input, or the validation error(s)
/// according to `mode`.
pub fn parse<I, S>(
    text: &str,
    env: &dyn Env,
    restrictions: Restrictions,
    mode: Mode,
    selected: I,
) -> Result<String, Error>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Parser::new("parse", env)
        .restrictions(restrictions)
        .mode(mode)
        .select(selected)
        .parse(text)
}

/// Substitution configuration. Reusable across inputs; every call to
/// [`Parser::parse`] starts from a fresh lexer and node list.
pub struct Parser<'e> {
    pub(crate) name: String,
    pub(crate) env: &'e dyn Env,
    pub(crate) restrictions: Restrictions,
    pub(crate) mode: Mode,
    pub(crate) selected: BTreeSet<String>,
    pub(crate) no_digit: bool,
}

impl fmt::Debug for Parser<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("name", &self.name)
            .field("restrictions", &self.restrictions)
            .field("mode", &self.mode)
            .field("selected", &self.selected)
            .field("no_digit", &self.no_digit)
            .finish_non_exhaustive()
    }
}

impl Parser<'_> {
    /// Parse and evaluate `text`.
    ///
    /// # Errors
    ///
    /// Lexical errors are returned immediately whatever the mode. In
    /// `Quick` mode the first validation error is returned; in
    /// `AllErrors` mode every validation error is collected. No output
    /// is produced on error.
    pub fn parse(&self, text: &str) -> Result<String, Error> {
        tracing::debug!(parser = %self.name, mode = ?self.mode, len = text.len(), "substituting");
        let nodes = self.parse_nodes(text)?;
        self.evaluate(&nodes)
    }

    /// Build the node sequence for `text` without evaluating it.
    ///
    /// # Errors
    ///
    /// Returns `LexError` on malformed input.
    pub fn parse_nodes(&self, text: &str) -> Result<Vec<Node>, LexError> {
        let mut cursor = Cursor::new(text, self.no_digit);
        let mut nodes = Vec::new();

        loop {
            let token = cursor.next();
            match token.kind {
                TokenKind::EndOfInput => break,
                TokenKind::Error(kind) => {
                    return Err(LexError {
                        kind,
                        span: token.span,
                    });
                }
                TokenKind::Variable { name } => {
                    if self.is_selected(&name) {
                        nodes.push(Node::Variable(Variable::new(name, token.span)));
                    } else {
                        nodes.push(Node::Text(token.text));
                    }
                }
                TokenKind::LeftDelim => {
                    let next = cursor.next();
                    if let TokenKind::Variable { name } = next.kind {
                        let variable = Variable::new(name, next.span);
                        nodes.push(self.substitution(&mut cursor, text, token.span, variable)?);
                    } else {
                        // `${` without a name is plain text
                        cursor.backup(next);
                        nodes.push(Node::Text(token.text));
                    }
                }
                _ => nodes.push(Node::Text(token.text)),
            }
        }

        tracing::debug!(parser = %self.name, nodes = nodes.len(), "parsed");
        Ok(nodes)
    }

    /// Evaluate a node sequence and concatenate the results.
    ///
    /// # Errors
    ///
    /// See [`Parser::parse`].
    pub fn evaluate(&self, nodes: &[Node]) -> Result<String, Error> {
        let mut out = String::new();
        let mut errors = Vec::new();

        for node in nodes {
            match node.evaluate(self.env, self.restrictions) {
                Ok(value) => out.push_str(&value),
                Err(err) => match self.mode {
                    Mode::Quick => {
                        tracing::debug!(parser = %self.name, error = %err, "validation failed");
                        return Err(Error::Validation(err));
                    }
                    Mode::AllErrors => errors.push(err),
                },
            }
        }

        if errors.is_empty() {
            Ok(out)
        } else {
            tracing::debug!(parser = %self.name, errors = errors.len(), "validation failed");
            Err(Error::Collected(errors))
        }
    }

    fn is_selected(&self, name: &str) -> bool {
        self.selected.is_empty() || self.selected.contains(name)
    }

    /// Everything after `${NAME` up to and including the closing `}`.
    fn substitution(
        &self,
        cursor: &mut Cursor<'_>,
        input: &str,
        open: Span,
        variable: Variable,
    ) -> Result<Node, LexError> {
        let mut operator = None;
        let mut default = None;

        let end = loop {
            let token = cursor.next();
            match token.kind {
                TokenKind::RightDelim => break token.span.offset + token.text.len(),
                TokenKind::Error(kind) => {
                    return Err(LexError {
                        kind,
                        span: token.span,
                    });
                }
                TokenKind::EndOfInput => {
                    return Err(LexError {
                        kind: LexErrorKind::UnclosedBrace,
                        span: token.span,
                    });
                }
                // a later operator replaces an earlier one
                TokenKind::Operator(op) => operator = Some(op),
                TokenKind::Variable { name } => {
                    default = Some(if self.is_selected(&name) {
                        Fallback::Variable(Variable::new(name, token.span))
                    } else {
                        Fallback::Text(token.text)
                    });
                }
                TokenKind::Text | TokenKind::LeftDelim => {
                    // once text starts, the rest of the default is literal
                    let mut text = token.text;
                    while !matches!(
                        cursor.peek().kind,
                        TokenKind::RightDelim | TokenKind::Error(_) | TokenKind::EndOfInput
                    ) {
                        text.push_str(&cursor.next().text);
                    }
                    default = Some(Fallback::Text(text));
                }
            }
        };

        if !self.is_selected(&variable.name) {
            let source = input.get(open.offset..end).unwrap_or_default();
            return Ok(Node::Text(source.to_string()));
        }

        Ok(match operator {
            Some(operator) => Node::Substitution(Substitution {
                operator,
                variable,
                default,
            }),
            None => Node::Variable(variable),
        })
    }
}

/// The grammar never needs more than this many tokens pushed back.
const LOOKAHEAD: usize = 3;

/// Token source with bounded pushback over a [`Lexer`].
struct Cursor<'a> {
    lexer: Lexer<'a>,
    pending: Vec<Token>,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str, no_digit: bool) -> Self {
        Self {
            lexer: Lexer::new(input, no_digit),
            pending: Vec::with_capacity(LOOKAHEAD),
        }
    }

    fn next(&mut self) -> Token {
        let token = self
            .pending
            .pop()
            .unwrap_or_else(|| self.lexer.next_token());
        tracing::trace!(token = %token, "next token");
        token
    }

    fn backup(&mut self, token: Token) {
        debug_assert!(self.pending.len() < LOOKAHEAD, "lookahead exceeded");
        self.pending.push(token);
    }

    fn peek(&mut self) -> &Token {
        if self.pending.is_empty() {
            let token = self.lexer.next_token();
            self.pending.push(token);
        }
        &self.pending[self.pending.len() - 1]
    }
}
