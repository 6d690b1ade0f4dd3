//! Tag names: the keys of the [`StatStore`](crate::StatStore).
//!
//! A [`Tag`] wraps a [`CompactString`], so the short names used in practice
//! live inline and clone without allocating. The tags the engine writes on
//! every pass are exposed as associated constants.

use std::{borrow::Borrow, fmt};

use compact_str::CompactString;

/// A unique name identifying one piece of session-wide state.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tag(CompactString);

impl Tag {
    /// Value passed to the latest non-throttled `publish`.
    pub const VALUE: Self = Self::from_static("value");
    /// Lower bound of the session.
    pub const MIN_VALUE: Self = Self::from_static("min_value");
    /// Upper bound of the session.
    pub const MAX_VALUE: Self = Self::from_static("max_value");
    /// Wall-clock time at which the session began.
    pub const BEGIN_TIME: Self = Self::from_static("begin_time");
    /// Wall-clock time at which the session ended.
    pub const END_TIME: Self = Self::from_static("end_time");
    /// Number of calls made to `publish`.
    pub const ITERATIONS: Self = Self::from_static("iterations");
    /// Completion in percent, absent while progress is indeterminate.
    pub const PERCENTAGE: Self = Self::from_static("percentage");
    /// Time elapsed since `begin`.
    pub const TIME_SINCE_BEGIN: Self = Self::from_static("time_since_begin");
    /// Time elapsed between the two latest recomputations.
    pub const DELTATIME: Self = Self::from_static("deltatime");
    /// Wall-clock time of the latest redraw.
    pub const LAST_UPDATED_AT: Self = Self::from_static("last_updated_at");
    /// Time elapsed since the previous redraw.
    pub const TIME_SINCE_UPDATE: Self = Self::from_static("time_since_update");

    /// Tag of [`RateProvider`](crate::providers::RateProvider).
    pub const RATE: Self = Self::from_static("rate");
    /// Tag of [`EtaProvider`](crate::providers::EtaProvider).
    pub const ETA: Self = Self::from_static("eta");
    /// Tag of [`EtaNewProvider`](crate::providers::EtaNewProvider).
    pub const ETA_NEW: Self = Self::from_static("eta_new");

    /// Tags seeded and written by the session engine itself. Providers may
    /// not claim them.
    pub const ENGINE: [Self; 11] = [
        Self::VALUE,
        Self::MIN_VALUE,
        Self::MAX_VALUE,
        Self::BEGIN_TIME,
        Self::END_TIME,
        Self::ITERATIONS,
        Self::PERCENTAGE,
        Self::TIME_SINCE_BEGIN,
        Self::DELTATIME,
        Self::LAST_UPDATED_AT,
        Self::TIME_SINCE_UPDATE,
    ];

    /// Creates a tag from any string.
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self(name.into())
    }

    /// Creates a tag from a static string in const context.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(CompactString::const_new(name))
    }

    /// Returns the tag name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the engine writes this tag itself.
    #[must_use]
    pub fn is_engine_tag(&self) -> bool {
        Self::ENGINE.iter().any(|tag| tag == self)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Tag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Tag {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<CompactString> for Tag {
    fn from(name: CompactString) -> Self {
        Self(name)
    }
}
