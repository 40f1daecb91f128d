use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Insertion-ordered environment of a single launch request.
///
/// Setting a key that is already present replaces the value in place, so the
/// key keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVars {
    entries: Vec<(String, String)>,
}

impl EnvVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment of the current process.
    pub fn from_process() -> Self {
        std::env::vars().collect()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `KEY=VALUE` tokens in sorted order, for command lines that must be
    /// stable across runs.
    pub fn to_sorted_tokens(&self) -> BTreeSet<String> {
        self.iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect()
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.entries
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvVars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = EnvVars::new();
        for (key, value) in iter {
            env.set(key, value);
        }
        env
    }
}

/// Host environment captured once when a phase starts. Read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaselineEnvironment(BTreeMap<String, String>);

impl BaselineEnvironment {
    pub fn capture() -> Self {
        Self(std::env::vars().collect())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BaselineEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Entries of `candidate` that are missing from `baseline` or carry a
/// different value there, in `candidate` order.
pub fn diff(candidate: &EnvVars, baseline: &BaselineEnvironment) -> EnvVars {
    candidate
        .iter()
        .filter(|(key, value)| baseline.get(key) != Some(*value))
        .collect()
}
