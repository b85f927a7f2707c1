//! Shell-style variable substitution for text templates.
//!
//! Expands `$NAME`, `${NAME}` and the POSIX default/alternate forms
//! (`${NAME-x}`, `${NAME:-x}`, `${NAME=x}`, `${NAME:=x}`, `${NAME+x}`,
//! `${NAME:+x}`) against a pluggable variable source, without a shell.
//!
//! # Quick start
//!
//! ```
//! use envsubst_rs::{ListEnv, substitute};
//!
//! let env = ListEnv::new(["BAR=bar"]);
//! let out = substitute("foo $BAR, ${NOTSET:-fallback}", &env).unwrap();
//! assert_eq!(out, "foo bar, fallback");
//! ```
//!
//! ## Restrictions and error collection
//!
//! ```
//! use envsubst_rs::{ListEnv, Mode, Parser, Restrictions};
//!
//! let env = ListEnv::new(["EMPTY="]);
//! let err = Parser::new("config", &env)
//!     .restrictions(Restrictions::STRICT)
//!     .mode(Mode::AllErrors)
//!     .parse("${EMPTY} $MISSING")
//!     .unwrap_err();
//! assert_eq!(err.validation_errors().len(), 2);
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod builder;
pub mod env;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod token;

pub use env::{Env, FnEnv, ListEnv};
pub use lexer::{LexError, LexErrorKind, Lexer, tokenize};
pub use node::{Fallback, Node, Substitution, ValidationError, ValidationErrorKind, Variable};
pub use parser::{Mode, Parser, Restrictions, parse};
pub use token::{Operator, Span, Token, TokenKind};

/// Unified error type covering lexing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed input; always fatal.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// First validation error, in `Quick` mode.
    #[error("{0}")]
    Validation(#[from] ValidationError),
    /// Every validation error, in `AllErrors` mode, one per line.
    #[error("{}", join_lines(.0))]
    Collected(Vec<ValidationError>),
}

impl Error {
    /// The validation errors carried by this error, in encounter order.
    #[must_use]
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::Lex(_) => &[],
            Self::Validation(err) => std::slice::from_ref(err),
            Self::Collected(errors) => errors,
        }
    }
}

fn join_lines(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Substitute every reference in `text` with no restrictions.
pub fn substitute(text: &str, env: &dyn Env) -> Result<String, Error> {
    Parser::new("string", env).parse(text)
}

/// Substitute every reference in `text`, enforcing the given
/// restrictions and stopping at the first violation.
pub fn substitute_restricted(
    text: &str,
    env: &dyn Env,
    no_unset: bool,
    no_empty: bool,
) -> Result<String, Error> {
    substitute_restricted_no_digit(text, env, no_unset, no_empty, false)
}

/// Like [`substitute_restricted`], optionally leaving digit-leading
/// references such as `$1` untouched.
pub fn substitute_restricted_no_digit(
    text: &str,
    env: &dyn Env,
    no_unset: bool,
    no_empty: bool,
    no_digit: bool,
) -> Result<String, Error> {
    Parser::new("string", env)
        .restrictions(Restrictions::new(no_unset, no_empty))
        .no_digit(no_digit)
        .parse(text)
}

/// Substitute only the listed names; other references are kept as
/// written.
pub fn substitute_selected<I, S>(text: &str, env: &dyn Env, names: I) -> Result<String, Error>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Parser::new("string", env).select(names).parse(text)
}
