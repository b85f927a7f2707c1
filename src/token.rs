use std::fmt;

/// Source location for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset into the input.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// Operator between a braced variable name and its default expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `-`: default when the variable is unset.
    Dash,
    /// `:-`: default when the variable is unset or empty.
    ColonDash,
    /// `=`: default when the variable is unset.
    Equals,
    /// `:=`: default when the variable is unset or empty.
    ColonEquals,
    /// `+`: default when the variable is set, empty string otherwise.
    Plus,
    /// `:+`: same as `+`.
    ColonPlus,
}

impl Operator {
    /// Source spelling of the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dash => "-",
            Self::ColonDash => ":-",
            Self::Equals => "=",
            Self::ColonEquals => ":=",
            Self::Plus => "+",
            Self::ColonPlus => ":+",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Run of literal text.
    Text,
    /// Variable reference. `text` keeps the sigil for unbraced and
    /// nested references; `name` is the bare identifier.
    Variable { name: String },
    /// Opening `${`.
    LeftDelim,
    /// Closing `}` of a braced reference.
    RightDelim,
    /// One of `-`, `:-`, `=`, `:=`, `+`, `:+`.
    Operator(Operator),
    /// Lexical error; terminal.
    Error(crate::lexer::LexErrorKind),
    /// End of input; terminal.
    EndOfInput,
}

/// A single token with its kind, literal text, and source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    /// Whether no further tokens follow this one.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.kind, TokenKind::Error(_) | TokenKind::EndOfInput)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::EndOfInput => write!(f, "EOF"),
            TokenKind::Error(kind) => write!(f, "ERROR: {:?}", kind.to_string()),
            TokenKind::Operator(op) => write!(f, "OP: {:?}", op.as_str()),
            _ => write!(f, "{:?}", self.text),
        }
    }
}
