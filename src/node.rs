use std::fmt;

use crate::env::Env;
use crate::parser::Restrictions;
use crate::token::{Operator, Span};

/// Classifies a validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The variable is absent while `no_unset` is active.
    NotSet { name: String },
    /// The variable is present but resolved to `""` while `no_empty`
    /// is active.
    Empty { name: String },
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSet { name } => write!(f, "variable ${{{name}}} not set"),
            Self::Empty { name } => write!(f, "variable ${{{name}}} set but empty"),
        }
    }
}

/// Error produced while evaluating a node against its restrictions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub span: Span,
}

/// One fragment of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal text, emitted as is.
    Text(String),
    /// `$NAME` or `${NAME}`.
    Variable(Variable),
    /// `${NAME<op>default}`.
    Substitution(Substitution),
}

/// Reference to a variable by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub span: Span,
}

/// Variable with an operator and a single-level default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub operator: Operator,
    pub variable: Variable,
    /// `None` when nothing follows the operator; treated as `""`.
    pub default: Option<Fallback>,
}

/// Default expression of a substitution. Never another substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    Text(String),
    Variable(Variable),
}

impl Node {
    /// Resolve this node to its output string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the node that supplies the output
    /// violates `restrictions`.
    pub fn evaluate(
        &self,
        env: &dyn Env,
        restrictions: Restrictions,
    ) -> Result<String, ValidationError> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::Variable(variable) => variable.evaluate(env, restrictions),
            Self::Substitution(substitution) => substitution.evaluate(env, restrictions),
        }
    }
}

impl Variable {
    #[must_use]
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    /// Look the variable up, enforcing `restrictions`.
    ///
    /// # Errors
    ///
    /// `NotSet` if absent under `no_unset`; `Empty` if present and empty
    /// under `no_empty`. An absent variable is never reported as empty.
    pub fn evaluate(
        &self,
        env: &dyn Env,
        restrictions: Restrictions,
    ) -> Result<String, ValidationError> {
        let value = env.lookup(&self.name);
        if restrictions.no_unset && value.is_none() {
            return Err(self.error(ValidationErrorKind::NotSet {
                name: self.name.clone(),
            }));
        }
        match value {
            Some(value) if value.is_empty() && restrictions.no_empty => {
                Err(self.error(ValidationErrorKind::Empty {
                    name: self.name.clone(),
                }))
            }
            value => Ok(value.unwrap_or_default()),
        }
    }

    fn is_set(&self, env: &dyn Env) -> bool {
        env.has(&self.name)
    }

    const fn error(&self, kind: ValidationErrorKind) -> ValidationError {
        ValidationError {
            kind,
            span: self.span,
        }
    }
}

impl Substitution {
    /// Apply the operator.
    ///
    /// | op        | test          | true      | false   |
    /// |-----------|---------------|-----------|---------|
    /// | `-` `=`   | unset         | default   | value   |
    /// | `:-` `:=` | value is `""` | default   | value   |
    /// | `+` `:+`  | set           | default   | `""`    |
    ///
    /// `=` and `:=` never assign to the environment.
    ///
    /// # Errors
    ///
    /// Restrictions apply to whichever node supplies the output.
    pub fn evaluate(
        &self,
        env: &dyn Env,
        restrictions: Restrictions,
    ) -> Result<String, ValidationError> {
        match self.operator {
            Operator::Dash | Operator::Equals => {
                if self.variable.is_set(env) {
                    self.variable.evaluate(env, restrictions)
                } else {
                    self.evaluate_default(env, restrictions)
                }
            }
            Operator::ColonDash | Operator::ColonEquals => {
                let value = env.get(&self.variable.name);
                if value.is_empty() {
                    self.evaluate_default(env, restrictions)
                } else {
                    Ok(value)
                }
            }
            Operator::Plus | Operator::ColonPlus => {
                if self.variable.is_set(env) {
                    self.evaluate_default(env, restrictions)
                } else {
                    Ok(String::new())
                }
            }
        }
    }

    fn evaluate_default(
        &self,
        env: &dyn Env,
        restrictions: Restrictions,
    ) -> Result<String, ValidationError> {
        match &self.default {
            None => Ok(String::new()),
            Some(Fallback::Text(text)) => Ok(text.clone()),
            Some(Fallback::Variable(variable)) => variable.evaluate(env, restrictions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::ListEnv;

    fn env() -> ListEnv {
        ListEnv::new(["SET=value", "EMPTY="])
    }

    fn var(name: &str) -> Variable {
        Variable::new(name, Span::default())
    }

    fn subst(operator: Operator, name: &str, default: &str) -> Node {
        Node::Substitution(Substitution {
            operator,
            variable: var(name),
            default: Some(Fallback::Text(default.to_string())),
        })
    }

    fn eval(node: &Node) -> String {
        node.evaluate(&env(), Restrictions::RELAXED)
            .expect("should evaluate")
    }

    #[test]
    fn text_is_verbatim() {
        assert_eq!(eval(&Node::Text("a $B".to_string())), "a $B");
    }

    #[test]
    fn variable_lookup() {
        assert_eq!(eval(&Node::Variable(var("SET"))), "value");
        assert_eq!(eval(&Node::Variable(var("MISSING"))), "");
    }

    #[test]
    fn operator_table() {
        let cases = [
            (Operator::Dash, "SET", "value"),
            (Operator::Dash, "EMPTY", ""),
            (Operator::Dash, "UNSET", "d"),
            (Operator::ColonDash, "SET", "value"),
            (Operator::ColonDash, "EMPTY", "d"),
            (Operator::ColonDash, "UNSET", "d"),
            (Operator::Equals, "SET", "value"),
            (Operator::Equals, "EMPTY", ""),
            (Operator::Equals, "UNSET", "d"),
            (Operator::ColonEquals, "SET", "value"),
            (Operator::ColonEquals, "EMPTY", "d"),
            (Operator::ColonEquals, "UNSET", "d"),
            (Operator::Plus, "SET", "d"),
            (Operator::Plus, "EMPTY", "d"),
            (Operator::Plus, "UNSET", ""),
            (Operator::ColonPlus, "SET", "d"),
            (Operator::ColonPlus, "EMPTY", "d"),
            (Operator::ColonPlus, "UNSET", ""),
        ];
        for (operator, name, expected) in cases {
            assert_eq!(
                eval(&subst(operator, name, "d")),
                expected,
                "${{{name}{operator}d}}"
            );
        }
    }

    #[test]
    fn missing_default_is_empty() {
        let node = Node::Substitution(Substitution {
            operator: Operator::ColonDash,
            variable: var("UNSET"),
            default: None,
        });
        assert_eq!(eval(&node), "");
    }

    #[test]
    fn no_unset_reports_name() {
        let err = Node::Variable(var("UNSET"))
            .evaluate(&env(), Restrictions::NO_UNSET)
            .unwrap_err();
        assert_eq!(
            err.kind,
            ValidationErrorKind::NotSet {
                name: "UNSET".to_string()
            }
        );
        assert!(err.to_string().starts_with("variable ${UNSET} not set"));
    }

    #[test]
    fn no_empty_ignores_unset() {
        let result = Node::Variable(var("UNSET")).evaluate(&env(), Restrictions::NO_EMPTY);
        assert_eq!(result, Ok(String::new()));
        let err = Node::Variable(var("EMPTY"))
            .evaluate(&env(), Restrictions::NO_EMPTY)
            .unwrap_err();
        assert!(err.to_string().starts_with("variable ${EMPTY} set but empty"));
    }

    #[test]
    fn default_shields_unset_variable() {
        let result =
            subst(Operator::ColonDash, "UNSET", "d").evaluate(&env(), Restrictions::STRICT);
        assert_eq!(result, Ok("d".to_string()));
    }

    #[test]
    fn variable_default_is_checked() {
        let node = Node::Substitution(Substitution {
            operator: Operator::Dash,
            variable: var("UNSET"),
            default: Some(Fallback::Variable(var("ALSO_UNSET"))),
        });
        let err = node.evaluate(&env(), Restrictions::NO_UNSET).unwrap_err();
        assert_eq!(
            err.kind,
            ValidationErrorKind::NotSet {
                name: "ALSO_UNSET".to_string()
            }
        );
    }
}
