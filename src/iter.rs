//! Iterator adapters for automatic progress tracking.
//!
//! [`ProgressIteratorExt`] attaches a [`Session`] to any [`Iterator`]. The
//! first item pulled begins the session, every item publishes the number of
//! items pulled so far, and exhaustion ends it.
//!
//! # Bounds
//!
//! The adapters read [`Iterator::size_hint`]:
//! * an exact hint `(n, Some(n))` gives the bounds `[0, n]`;
//! * anything else gives `[0, +inf]`, so the percentage stays absent.
//!
//! # Example
//!
//! ```no_run
//! use tagged_progress::ProgressIteratorExt;
//!
//! for item in vec![1, 2, 3].into_iter().progress() {
//!     // ...
//! #   let _ = item;
//! }
//! ```

use tracing::warn;

use crate::{
    builder::SessionBuilder,
    clock::SystemClock,
    extension::Component,
    extensions::{Bar, Percentage},
    io::LineWriter,
    provider::ProviderRegistry,
    session::{DEFAULT_MAX_UPDATE_INTERVAL, Session},
};

/// An iterator adapter that publishes to a [`Session`] on every `next()`.
///
/// Session errors never interrupt the iteration; they are logged instead.
pub struct ProgressIter<I> {
    iter: I,
    session: Session,
    count: u64,
    finished: bool,
}

impl<I> ProgressIter<I> {
    /// Creates a new `ProgressIter`.
    ///
    /// Note: This is usually constructed via [`ProgressIteratorExt`] methods.
    pub const fn new(iter: I, session: Session) -> Self {
        Self {
            iter,
            session,
            count: 0,
            finished: false,
        }
    }

    /// The session being driven.
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Stops iterating and hands the session back.
    pub fn into_session(self) -> Session {
        self.session
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Err(err) = self.session.end() {
            warn!(%err, "failed to end progress session");
        }
    }
}

impl<I: Iterator> Iterator for ProgressIter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let Some(item) = self.iter.next() else {
            self.finish();
            return None;
        };

        self.count += 1;
        if let Err(err) = self.session.publish(self.count as f64) {
            warn!(%err, count = self.count, "failed to publish progress");
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            self.iter.size_hint()
        }
    }
}

/// Extension trait to easily attach progress tracking to any Iterator.
pub trait ProgressIteratorExt: Sized {
    /// Wraps the iterator in a `Percentage Bar` session printing to stderr.
    fn progress(self) -> ProgressIter<Self>;

    /// Wraps the iterator using an existing [`Session`].
    ///
    /// The session bounds are replaced from `size_hint` if it has not begun.
    fn progress_with(self, session: Session) -> ProgressIter<Self>;
}

impl<I: Iterator> ProgressIteratorExt for I {
    fn progress(self) -> ProgressIter<Self> {
        let (min, max) = bounds_from_size_hint(&self);
        let session = Session::assemble(
            vec![
                Component::extension(Percentage::new()),
                Component::extension(Bar::new()),
            ],
            ProviderRegistry::with_defaults(),
            LineWriter::new(std::io::stderr()),
            Box::new(SystemClock),
            (min, max),
            DEFAULT_MAX_UPDATE_INTERVAL,
            " ".into(),
            true,
        );
        ProgressIter::new(self, session)
    }

    fn progress_with(self, mut session: Session) -> ProgressIter<Self> {
        if !session.has_begun() {
            let (min, max) = bounds_from_size_hint(&self);
            if let Err(err) = session.set_bounds(min, max) {
                warn!(%err, "keeping the session bounds");
            }
        }
        ProgressIter::new(self, session)
    }
}

fn bounds_from_size_hint(iter: &impl Iterator) -> (f64, f64) {
    match iter.size_hint() {
        (lower, Some(upper)) if lower == upper => (0.0, upper as f64),
        _ => (0.0, f64::INFINITY),
    }
}

impl SessionBuilder {
    /// Builds a session bounded by the length of `iter` and wraps it.
    ///
    /// # Errors
    ///
    /// See [`SessionBuilder::build`].
    pub fn wrap<I: Iterator>(self, iter: I) -> crate::Result<ProgressIter<I>> {
        let (min, max) = bounds_from_size_hint(&iter);
        let session = self.bounds(min, max).build()?;
        Ok(ProgressIter::new(iter, session))
    }
}
