// ProfileCollection - named whistle profiles keyed case-insensitively
//
// The persisted form is a JSON array of `{ "name", "profile" }` objects, the
// same layout the browser version keeps, so exported lists load unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calibration::WhistleProfile;

/// A profile saved under a user-chosen name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedProfile {
    /// Display name, spelled as last saved
    pub name: String,
    pub profile: WhistleProfile,
}

/// Whether a put created a new entry or replaced an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Created,
    Updated,
}

/// Immutable-by-convention collection of named profiles
///
/// Names are unique under case-insensitive comparison. Iteration order is the
/// lowercased name, so listings are stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileCollection {
    entries: BTreeMap<String, NamedProfile>,
}

impl ProfileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from a persisted list
    ///
    /// Later entries win when two names differ only by case.
    pub fn from_entries(entries: Vec<NamedProfile>) -> Self {
        let mut collection = Self::new();
        for entry in entries {
            collection.entries.insert(key(&entry.name), entry);
        }
        collection
    }

    /// Entries in listing order, for persisting
    pub fn to_entries(&self) -> Vec<NamedProfile> {
        self.entries.values().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&NamedProfile> {
        self.entries.get(&key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&key(name))
    }

    /// Insert or replace; a replaced entry adopts the new spelling of `name`
    pub fn insert(&mut self, name: &str, profile: WhistleProfile) -> SaveOutcome {
        let previous = self.entries.insert(
            key(name),
            NamedProfile {
                name: name.to_string(),
                profile,
            },
        );
        match previous {
            Some(_) => SaveOutcome::Updated,
            None => SaveOutcome::Created,
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<NamedProfile> {
        self.entries.remove(&key(name))
    }

    /// Display names in listing order
    pub fn names(&self) -> Vec<String> {
        self.entries.values().map(|e| e.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedProfile> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}
