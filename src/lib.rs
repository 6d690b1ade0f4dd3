//! # `tagged_progress`
//!
//! Live, in-place console progress lines assembled from pluggable pieces.
//!
//! A [`Session`] keeps a pool of named statistics, the [`StatStore`]. The
//! engine fills the basic tags itself (value, bounds, percentage, timers) and
//! [`Provider`]s derive new tags from existing ones. [`Extension`]s turn tags
//! into text, and the session joins their output into one line that is
//! redrawn in place with a carriage return.
//!
//! Only the providers some extension actually needs are evaluated. They run in
//! dependency order, computed once per session by the [`resolver`].
//!
//! ## Modules
//!
//! * [`builder`]: Fluent interface and presets for constructing [`Session`]s.
//! * [`session`]: The begin / publish / end engine, throttling and rendering.
//! * [`stats`]: Tagged values and the store holding them.
//! * [`provider`] and [`providers`]: Derived statistics and the built-in ones.
//! * [`extension`] and [`extensions`]: Line components and the built-in ones.
//! * [`resolver`]: Provider discovery and ordering.
//! * [`iter`]: Extension traits for tracking progress on Iterators.
//! * [`io`] and [`clock`]: Output and time sources.
//!
//! ## Example
//!
//! ```no_run
//! use tagged_progress::SessionBuilder;
//!
//! # fn main() -> tagged_progress::Result<()> {
//! let mut session = SessionBuilder::advanced().bounds(0.0, 1000.0).build()?;
//! session.run(|session| {
//!     for i in 0..=1000 {
//!         session.publish(f64::from(i))?;
//!     }
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod builder;
pub mod clock;
pub mod error;
pub mod extension;
pub mod extensions;
pub mod io;
pub mod iter;
pub mod provider;
pub mod providers;
pub mod resolver;
pub mod session;
pub mod stats;
pub mod tag;

pub use builder::SessionBuilder;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result, Unresolved};
pub use extension::{Component, Extension};
pub use io::{LineWriter, SharedBuffer};
pub use iter::{ProgressIter, ProgressIteratorExt};
pub use provider::{Provider, ProviderRegistry};
pub use resolver::{Resolution, resolve};
pub use session::Session;
pub use stats::{Params, Stat, StatSnapshot, StatStore, Value};
pub use tag::Tag;
