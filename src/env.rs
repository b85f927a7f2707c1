//! Variable sources consulted during substitution.
//!
//! The parser never reads the process environment on its own; callers
//! pick a source explicitly, e.g. [`ListEnv::os`] or [`FnEnv::os`].

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

/// Read-only lookup of variables by name.
pub trait Env {
    /// Value associated with `name`, or `None` when absent.
    fn lookup(&self, name: &str) -> Option<String>;

    /// Value associated with `name`, or the empty string.
    fn get(&self, name: &str) -> String {
        self.lookup(name).unwrap_or_default()
    }

    /// Whether `name` is present in the source.
    fn has(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

impl<E: Env + ?Sized> Env for &E {
    fn lookup(&self, name: &str) -> Option<String> {
        (**self).lookup(name)
    }
}

/// Source backed by a name-to-value function.
///
/// An empty result counts as "not found", so a variable set to the
/// empty string cannot be told apart from an unset one.
#[derive(Clone)]
pub struct FnEnv<F> {
    mapping: F,
}

impl<F> FnEnv<F>
where
    F: Fn(&str) -> String,
{
    #[must_use]
    pub const fn new(mapping: F) -> Self {
        Self { mapping }
    }
}

impl FnEnv<fn(&str) -> String> {
    /// Source reading the live process environment.
    #[must_use]
    pub fn os() -> Self {
        Self::new(os_var)
    }
}

fn os_var(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

impl<F> Env for FnEnv<F>
where
    F: Fn(&str) -> String,
{
    fn lookup(&self, name: &str) -> Option<String> {
        let value = (self.mapping)(name);
        if value.is_empty() { None } else { Some(value) }
    }
}

/// Source backed by an ordered list of `NAME=VALUE` entries.
///
/// Lookup scans from the front; the first matching entry wins and later
/// duplicates are never seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEnv {
    pairs: Vec<String>,
}

impl ListEnv {
    #[must_use]
    pub fn new<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pairs: pairs.into_iter().map(Into::into).collect(),
        }
    }

    /// Snapshot of the process environment. Entries that are not valid
    /// UTF-8 are skipped.
    #[must_use]
    pub fn os() -> Self {
        Self::new(std::env::vars_os().filter_map(|(name, value)| {
            let name = name.into_string().ok()?;
            let value = value.into_string().ok()?;
            Some(format!("{name}={value}"))
        }))
    }

    /// The raw entries, in lookup order.
    #[must_use]
    pub fn pairs(&self) -> &[String] {
        &self.pairs
    }
}

impl Env for ListEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        self.pairs.iter().find_map(|pair| {
            pair.strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
                .map(str::to_string)
        })
    }
}

impl<K, V, S> Env for HashMap<K, V, S>
where
    K: Borrow<str> + Eq + Hash,
    V: AsRef<str>,
    S: BuildHasher,
{
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).map(|value| value.as_ref().to_string())
    }
}
