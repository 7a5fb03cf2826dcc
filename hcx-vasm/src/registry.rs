//! Symbol registry: the ordered list of jump-target labels
//!
//! One registry per workspace. Every label-referencing block draws its
//! option list from here, so the registry is the single source of truth for
//! which jump targets exist. Labels are normalized (trimmed, upper-cased) on
//! entry and never deleted within a session; the list only grows until the
//! workspace is reset.

use log::debug;

/// Labels every fresh workspace starts with.
pub const DEFAULT_LABELS: [&str; 3] = ["START", "LOOP", "END"];

/// Outcome of a [`Registry::register`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The label was new; carries the normalized name that was appended.
    Added(String),
    /// The label was already present; carries the stored name.
    Existing(String),
    /// Input was empty or whitespace-only; nothing was changed.
    Empty,
}

impl Registration {
    /// The normalized name, if the input survived normalization.
    pub fn name(&self) -> Option<&str> {
        match self {
            Registration::Added(name) | Registration::Existing(name) => Some(name),
            Registration::Empty => None,
        }
    }
}

/// Ordered set of label names, in creation order.
#[derive(Debug, Clone)]
pub struct Registry {
    labels: Vec<String>,
    generation: u64,
}

impl Registry {
    /// A registry seeded with [`DEFAULT_LABELS`].
    pub fn new() -> Self {
        Registry {
            labels: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect(),
            generation: 0,
        }
    }

    /// Trim and upper-case a candidate label.
    pub fn normalize(name: &str) -> String {
        name.trim().to_uppercase()
    }

    /// Register a label. Duplicates (case- and whitespace-insensitive) are a
    /// no-op that reports the existing entry; empty input mutates nothing.
    pub fn register(&mut self, name: &str) -> Registration {
        let normalized = Self::normalize(name);
        if normalized.is_empty() {
            return Registration::Empty;
        }
        if let Some(existing) = self.labels.iter().find(|l| **l == normalized) {
            return Registration::Existing(existing.clone());
        }
        debug!("registering label {normalized}");
        self.labels.push(normalized.clone());
        self.generation += 1;
        Registration::Added(normalized)
    }

    /// All labels in creation order. Never empty.
    pub fn list(&self) -> &[String] {
        &self.labels
    }

    /// The oldest label; the revert target when label input is cancelled.
    pub fn first(&self) -> &str {
        &self.labels[0]
    }

    /// Whether `name` (after normalization) is registered.
    pub fn contains(&self, name: &str) -> bool {
        let normalized = Self::normalize(name);
        self.labels.iter().any(|l| *l == normalized)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Bumped on every successful append. Option lists cache against this
    /// instead of being pushed fresh contents on each change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop all session labels and re-seed the defaults.
    pub fn reset(&mut self) {
        self.labels = DEFAULT_LABELS.iter().map(|s| s.to_string()).collect();
        self.generation += 1;
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazily refreshed snapshot of the registry's labels.
///
/// A label dropdown keeps one of these and calls [`LabelOptions::refresh`]
/// before rendering; the snapshot is rebuilt only when the registry's
/// generation has moved since the last fetch.
#[derive(Debug, Default)]
pub struct LabelOptions {
    cached: Vec<String>,
    seen_generation: Option<u64>,
}

impl LabelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current option list, re-fetched only if the registry has changed.
    pub fn refresh<'a>(&'a mut self, registry: &Registry) -> &'a [String] {
        if self.seen_generation != Some(registry.generation()) {
            self.cached = registry.list().to_vec();
            self.seen_generation = Some(registry.generation());
        }
        &self.cached
    }
}
