//! End-to-end behaviour of the convenience entry points.

mod common;

use std::collections::HashMap;

use envsubst_rs::{
    Error, FnEnv, ListEnv, substitute, substitute_restricted, substitute_restricted_no_digit,
    substitute_selected,
};

#[test]
fn config_template() {
    let env = ListEnv::new(["BAR=bar"]);
    let out = substitute("foo $BAR, ${NOTSET:-fallback}", &env).unwrap();
    assert_eq!(out, "foo bar, fallback");
}

#[test]
fn escaped_sigil() {
    assert_eq!(common::subst("a $$HOME b"), "a $HOME b");
}

#[test]
fn no_sigil_round_trip() {
    let input = "server {\n\tlisten 80;\n}\n";
    assert_eq!(common::subst(input), input);
}

#[test]
fn empty_variable_rejected() {
    let env = ListEnv::new(["EMPTY="]);
    let err = substitute_restricted("${EMPTY}", &env, false, true).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(err.to_string().contains("EMPTY"));
}

#[test]
fn unset_variable_rejected() {
    let env = ListEnv::default();
    let err = substitute_restricted("port: ${PORT}", &env, true, false).unwrap_err();
    assert!(err.to_string().contains("variable ${PORT} not set"));
}

#[test]
fn unterminated_reference() {
    let err = substitute("hello ${world", &ListEnv::default()).unwrap_err();
    assert!(matches!(err, Error::Lex(_)));
    assert!(err.to_string().starts_with("closing brace expected"));
}

#[test]
fn positional_parameters_survive_no_digit() {
    let env = ListEnv::new(["NAME=app", "1=one"]);
    let out =
        substitute_restricted_no_digit("$NAME: $1 ${2}", &env, false, false, true).unwrap();
    assert_eq!(out, "app: $1 ${2}");
    let out = substitute_restricted_no_digit("$1", &env, false, false, false).unwrap();
    assert_eq!(out, "one");
}

#[test]
fn selected_only() {
    let env = ListEnv::new(["BAR=bar", "FOO=foo"]);
    let out = substitute_selected("$BAR $FOO ${FOO}", &env, ["BAR"]).unwrap();
    assert_eq!(out, "bar $FOO ${FOO}");
}

#[test]
fn list_env_first_definition_wins() {
    let env = ListEnv::new(["HOST=first", "HOST=second"]);
    assert_eq!(substitute("$HOST", &env).unwrap(), "first");
}

#[test]
fn hash_map_env() {
    let env = HashMap::from([("HOST".to_string(), "localhost".to_string())]);
    assert_eq!(
        substitute("http://${HOST}:${PORT:-8080}/", &env).unwrap(),
        "http://localhost:8080/"
    );
}

#[test]
fn fn_env() {
    let env = FnEnv::new(|name: &str| name.to_lowercase());
    assert_eq!(substitute("$A-$B_C", &env).unwrap(), "a-b_c");
}

#[test]
fn yaml_document() {
    let env = ListEnv::new(["ENV=dev", "HOST=localhost"]);
    let input = "env: $ENV\nhost: ${HOST}\nregion: ${REGION:-us-east-1}\n";
    assert_eq!(
        substitute(input, &env).unwrap(),
        "env: dev\nhost: localhost\nregion: us-east-1\n"
    );
}

#[test]
fn independent_parses_in_parallel() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let env = ListEnv::new([format!("N={i}")]);
                substitute("n=$N", &env).unwrap()
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("n={i}"));
    }
}
