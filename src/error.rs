//! Error types shared by every fallible operation in the crate.
//!
//! Only configuration mistakes and out-of-range input surface here. Numeric
//! degeneracies inside providers (a zero denominator, a zero time step) are
//! absorbed by the provider itself and never become an [`Error`].

use std::{fmt, io};

use crate::tag::Tag;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while configuring or driving a
/// [`Session`](crate::Session).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `min_value` is greater than `max_value`, or one of them is NaN.
    #[error("min_value ({min}) must not be greater than max_value ({max})")]
    InvalidBounds {
        /// Requested lower bound.
        min: f64,
        /// Requested upper bound.
        max: f64,
    },

    /// A provider was registered for a tag that already has one.
    #[error("another provider exists for the tag `{tag}`")]
    DuplicateProvider {
        /// The contested tag.
        tag: Tag,
    },

    /// A provider tried to claim one of the tags the engine writes itself.
    #[error("the tag `{tag}` is reserved by the session engine")]
    ReservedTag {
        /// The reserved tag.
        tag: Tag,
    },

    /// Deregistration of a tag nobody provides.
    #[error("no provider exists for the tag `{tag}`")]
    UnknownProvider {
        /// The unknown tag.
        tag: Tag,
    },

    /// The providers demanded by the session require each other in a loop.
    #[error("cyclic dependency detected: {}", Unresolved::display_all(.remainder))]
    CyclicDependency {
        /// Providers that could not be ordered, with the requirements still
        /// waiting on another member of the remainder.
        remainder: Vec<Unresolved>,
    },

    /// A published value fell outside `[min_value, max_value]`.
    #[error("value {value} must be between {min} and {max}")]
    OutOfRange {
        /// The rejected value.
        value: f64,
        /// Session lower bound.
        min: f64,
        /// Session upper bound.
        max: f64,
    },

    /// The operation is only valid before [`Session::begin`](crate::Session::begin).
    #[error("the session has already begun")]
    AlreadyBegun,

    /// The session was ended and accepts no further updates.
    #[error("the session has ended")]
    Ended,

    /// Writing the progress line to the output stream failed.
    #[error("unable to write progress line: {0}")]
    Io(#[from] io::Error),
}

/// One provider left over when topological ordering stalls.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Unresolved {
    /// Tag of the stalled provider.
    pub tag: Tag,
    /// Requirement tags that never became available.
    pub waiting_on: Vec<Tag>,
}

impl Unresolved {
    fn display_all(remainder: &[Self]) -> String {
        remainder
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- [", self.tag)?;
        for (i, tag) in self.waiting_on.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{tag}")?;
        }
        f.write_str("]")
    }
}
