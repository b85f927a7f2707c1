#![allow(dead_code)]

use envsubst_rs::{Lexer, ListEnv, Operator, TokenKind, substitute};

/// Environment shared by the integration tests.
pub fn env() -> ListEnv {
    ListEnv::new(["BAR=bar", "FOO=foo", "EMPTY="])
}

/// Substitute `input` against [`env`], panicking on error.
pub fn subst(input: &str) -> String {
    substitute(input, &env()).unwrap_or_else(|e| panic!("substitute({input:?}) failed: {e}"))
}

/// Every token up to and including the terminal one, as
/// `(kind, literal text)` pairs.
pub fn lex(input: &str, no_digit: bool) -> Vec<(TokenKind, String)> {
    let mut lexer = Lexer::new(input, no_digit);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.is_terminal();
        tokens.push((token.kind, token.text));
        if done {
            return tokens;
        }
    }
}

pub fn text(s: &str) -> (TokenKind, String) {
    (TokenKind::Text, s.to_string())
}

pub fn var(name: &str, raw: &str) -> (TokenKind, String) {
    (
        TokenKind::Variable {
            name: name.to_string(),
        },
        raw.to_string(),
    )
}

pub fn op(operator: Operator) -> (TokenKind, String) {
    (TokenKind::Operator(operator), operator.as_str().to_string())
}

pub fn left() -> (TokenKind, String) {
    (TokenKind::LeftDelim, "${".to_string())
}

pub fn right() -> (TokenKind, String) {
    (TokenKind::RightDelim, "}".to_string())
}

pub fn eof() -> (TokenKind, String) {
    (TokenKind::EndOfInput, String::new())
}

pub fn unclosed() -> (TokenKind, String) {
    (
        TokenKind::Error(envsubst_rs::LexErrorKind::UnclosedBrace),
        "closing brace expected".to_string(),
    )
}
