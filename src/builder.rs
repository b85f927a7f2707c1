use std::collections::BTreeSet;

use crate::env::Env;
use crate::parser::{Mode, Parser, Restrictions};

impl<'e> Parser<'e> {
    /// Create a parser reading variables from `env`. Relaxed, `Quick`
    /// mode, every name eligible, digit-leading names allowed.
    #[must_use]
    pub fn new(name: impl Into<String>, env: &'e dyn Env) -> Self {
        Self {
            name: name.into(),
            env,
            restrictions: Restrictions::RELAXED,
            mode: Mode::Quick,
            selected: BTreeSet::new(),
            no_digit: false,
        }
    }

    /// Set the validation restrictions.
    #[must_use]
    pub fn restrictions(mut self, restrictions: Restrictions) -> Self {
        self.restrictions = restrictions;
        self
    }

    /// Fail on unset variables.
    #[must_use]
    pub fn no_unset(mut self, enabled: bool) -> Self {
        self.restrictions.no_unset = enabled;
        self
    }

    /// Fail on variables that are set but empty.
    #[must_use]
    pub fn no_empty(mut self, enabled: bool) -> Self {
        self.restrictions.no_empty = enabled;
        self
    }

    /// Set the error-collection mode.
    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Restrict substitution to the given names. May be called more
    /// than once; names accumulate.
    #[must_use]
    pub fn select<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected.extend(names.into_iter().map(Into::into));
        self
    }

    /// Treat `$1`, `${2}` and other digit-leading names as plain text.
    #[must_use]
    pub fn no_digit(mut self, enabled: bool) -> Self {
        self.no_digit = enabled;
        self
    }

    /// Name used in log output.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn current_restrictions(&self) -> Restrictions {
        self.restrictions
    }

    #[must_use]
    pub const fn current_mode(&self) -> Mode {
        self.mode
    }

    /// Selected names, empty when every name is eligible.
    #[must_use]
    pub const fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::ListEnv;

    #[test]
    fn defaults() {
        let env = ListEnv::default();
        let parser = Parser::new("defaults", &env);
        assert_eq!(parser.name(), "defaults");
        assert_eq!(parser.current_restrictions(), Restrictions::RELAXED);
        assert_eq!(parser.current_mode(), Mode::Quick);
        assert!(parser.selected().is_empty());
    }

    #[test]
    fn restriction_flags_combine() {
        let env = ListEnv::default();
        let parser = Parser::new("flags", &env).no_unset(true).no_empty(true);
        assert_eq!(parser.current_restrictions(), Restrictions::STRICT);
    }

    #[test]
    fn select_accumulates() {
        let env = ListEnv::default();
        let parser = Parser::new("select", &env)
            .select(["A"])
            .select(vec!["B".to_string()]);
        let names: Vec<_> = parser.selected().iter().map(String::as_str).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn builder_drives_parse() {
        let env = ListEnv::new(["A=1", "B=2"]);
        let out = Parser::new("drive", &env)
            .select(["A"])
            .no_digit(true)
            .parse("$A $B $1")
            .expect("parse failed");
        assert_eq!(out, "1 $B $1");
    }
}
