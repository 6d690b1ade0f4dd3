//! Extensions: display units rendering one fragment of the progress line.
//!
//! An [`Extension`] has the same begin/update/end dispatch shape as a
//! [`Provider`](crate::Provider), but its output is terminal: the session
//! keeps one rendered string per extension and joins them into the line.
//! Nothing ever reads an extension's output back into the stat store.

use std::{fmt, time::Duration};

use compact_str::CompactString;

use crate::{stats::Params, tag::Tag};

/// Placeholder written by the default [`Extension::on_invalidated`].
pub const UNKNOWN: &str = "UNKNOWN";

/// A display unit producing a short string from its requirement values.
///
/// Implementations write into `output`, the fragment kept by the session on
/// their behalf. Leaving it untouched redisplays the previous fragment.
pub trait Extension: Send {
    /// Tags read by this extension, in the order they appear in [`Params`].
    fn requirements(&self) -> &[Tag];

    /// Minimum refresh interval wanted by the extension.
    ///
    /// The session redraws at least this often while `publish` is being
    /// called. `None` defers to the session's `max_update_interval`.
    fn update_interval(&self) -> Option<Duration> {
        None
    }

    /// Initial look. Defaults to [`on_update`](Self::on_update).
    fn on_begin(&mut self, params: &Params<'_>, output: &mut CompactString) {
        self.on_update(params, output);
    }

    /// Look at every non-throttled update.
    fn on_update(&mut self, params: &Params<'_>, output: &mut CompactString) {
        if params.is_valid() {
            self.on_validated(params, output);
        } else {
            self.on_invalidated(params, output);
        }
    }

    /// Final look. Defaults to [`on_update`](Self::on_update).
    fn on_end(&mut self, params: &Params<'_>, output: &mut CompactString) {
        self.on_update(params, output);
    }

    /// Called when every requirement has a value.
    fn on_validated(&mut self, params: &Params<'_>, output: &mut CompactString);

    /// Called when at least one requirement is absent. Writes [`UNKNOWN`].
    fn on_invalidated(&mut self, _params: &Params<'_>, output: &mut CompactString) {
        *output = CompactString::const_new(UNKNOWN);
    }
}

/// One item of the progress line: an extension or a literal piece of text.
pub enum Component {
    /// Static text, rendered unchanged.
    Text(CompactString),
    /// A live extension.
    Extension(Box<dyn Extension>),
}

impl Component {
    /// Wraps an extension.
    pub fn extension(extension: impl Extension + 'static) -> Self {
        Self::Extension(Box::new(extension))
    }

    /// Wraps literal text.
    pub fn text(text: impl Into<CompactString>) -> Self {
        Self::Text(text.into())
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Extension(ext) => f
                .debug_struct("Extension")
                .field("requirements", &ext.requirements())
                .finish_non_exhaustive(),
        }
    }
}

impl From<&str> for Component {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Component {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<Box<dyn Extension>> for Component {
    fn from(extension: Box<dyn Extension>) -> Self {
        Self::Extension(extension)
    }
}
