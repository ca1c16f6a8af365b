//! Insertion-ordered set of selected result keys

use crate::providers::ProviderKind;
use crate::results::ResultKey;
use serde::Serialize;

/// Result keys a user has marked, in the order they were marked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectionSet {
    keys: Vec<ResultKey>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the key if absent, remove it if present. Returns the new state.
    pub fn toggle(&mut self, key: ResultKey) -> bool {
        match self.keys.iter().position(|k| *k == key) {
            Some(idx) => {
                self.keys.remove(idx);
                false
            }
            None => {
                self.keys.push(key);
                true
            }
        }
    }

    pub fn contains(&self, key: &ResultKey) -> bool {
        self.keys.contains(key)
    }

    /// Selected keys in insertion order
    pub fn keys(&self) -> &[ResultKey] {
        &self.keys
    }

    /// Selected keys of one provider, in insertion order
    pub fn for_provider(&self, provider: ProviderKind) -> impl Iterator<Item = &ResultKey> {
        self.keys.iter().filter(move |k| k.provider == provider)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}
