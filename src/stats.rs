//! The stat store: current value of every tag in a session.
//!
//! A slot in the [`StatStore`] exists as soon as the engine or a provider has
//! declared that it will produce the tag, even before a value is known. An
//! empty slot reads as "absent", exactly like a tag nobody produces, which is
//! what routes dependants onto their invalidated path.
//!
//! Providers and extensions never touch the store. They receive [`Params`], a
//! read-only snapshot of their declared requirements, in declaration order.

use std::{collections::BTreeMap, collections::HashMap, time::Duration};

use compact_str::CompactString;

use crate::tag::Tag;

/// A tagged value held by the store.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Plain number (value, bounds, percentage, rate, counters).
    Number(f64),
    /// Free-form text.
    Text(CompactString),
    /// A span of time, or a wall-clock timestamp since the Unix epoch.
    Duration(Duration),
}

impl Value {
    /// Numeric view of the value. Durations convert to seconds.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Duration(d) => Some(d.as_secs_f64()),
            Self::Text(_) => None,
        }
    }

    /// Duration view of the value. Non-negative finite numbers are read as
    /// seconds.
    #[must_use]
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(d) => Some(*d),
            Self::Number(n) => Duration::try_from_secs_f64(*n).ok(),
            Self::Text(_) => None,
        }
    }

    /// Text view of the value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.into())
    }
}

/// The content of one slot: `None` means "absent".
pub type Stat = Option<Value>;

/// Mapping from tag to its current [`Stat`].
#[derive(Clone, Debug, Default)]
pub struct StatStore {
    slots: HashMap<Tag, Stat>,
}

impl StatStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure a slot exists for `tag` without touching an existing value.
    pub fn declare(&mut self, tag: Tag) {
        self.slots.entry(tag).or_insert(None);
    }

    /// Overwrites the slot for `tag`.
    pub fn set(&mut self, tag: Tag, stat: Stat) {
        self.slots.insert(tag, stat);
    }

    /// Stores a present value for `tag`.
    pub fn set_value(&mut self, tag: Tag, value: impl Into<Value>) {
        self.slots.insert(tag, Some(value.into()));
    }

    /// Returns the current value, or `None` when absent or undeclared.
    #[must_use]
    pub fn get(&self, tag: &Tag) -> Option<&Value> {
        self.slots.get(tag).and_then(Option::as_ref)
    }

    /// Numeric shortcut for [`get`](Self::get).
    #[must_use]
    pub fn number(&self, tag: &Tag) -> Option<f64> {
        self.get(tag).and_then(Value::as_f64)
    }

    /// Duration shortcut for [`get`](Self::get).
    #[must_use]
    pub fn duration(&self, tag: &Tag) -> Option<Duration> {
        self.get(tag).and_then(Value::as_duration)
    }

    /// Whether a slot was declared for `tag`, whatever its content.
    #[must_use]
    pub fn contains(&self, tag: &Tag) -> bool {
        self.slots.contains_key(tag)
    }

    /// Number of declared slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drops every slot.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Copies the current content into an owned, ordered snapshot.
    #[must_use]
    pub fn snapshot(&self) -> StatSnapshot {
        StatSnapshot(
            self.slots
                .iter()
                .map(|(tag, stat)| (tag.clone(), stat.clone()))
                .collect(),
        )
    }
}

/// A plain-data copy of the store, sorted by tag name.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatSnapshot(pub BTreeMap<Tag, Stat>);

impl StatSnapshot {
    /// Returns the value for `tag`, if present.
    #[must_use]
    pub fn get(&self, tag: &Tag) -> Option<&Value> {
        self.0.get(tag).and_then(Option::as_ref)
    }
}

/// Read-only view over the requirement values handed to a provider or an
/// extension, in the order the requirements were declared.
#[derive(Clone, Copy, Debug)]
pub struct Params<'a> {
    values: &'a [Stat],
}

impl<'a> Params<'a> {
    /// Wraps a slice of requirement values.
    #[must_use]
    pub const fn new(values: &'a [Stat]) -> Self {
        Self { values }
    }

    /// `true` when every requirement currently has a value.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    /// Value of the `index`-th requirement.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Numeric value of the `index`-th requirement.
    #[must_use]
    pub fn number(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(Value::as_f64)
    }

    /// Duration value of the `index`-th requirement.
    #[must_use]
    pub fn duration(&self, index: usize) -> Option<Duration> {
        self.get(index).and_then(Value::as_duration)
    }

    /// Number of requirements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no requirements at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates the raw requirement slots.
    pub fn iter(&self) -> impl Iterator<Item = &'a Stat> + 'a {
        self.values.iter()
    }
}
