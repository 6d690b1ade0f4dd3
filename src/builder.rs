//! Fluent interface for constructing [`Session`] instances.
//!
//! The presets cover the common cases:
//!
//! * [`SessionBuilder::simple`]: `Percentage Bar`.
//! * [`SessionBuilder::advanced`]: percentage, bar, rate, elapsed time and ETA.
//!
//! Everything else is assembled component by component. The default
//! providers (`rate`, `eta`, `eta_new`) are registered unless disabled with
//! [`with_default_providers(false)`](SessionBuilder::with_default_providers);
//! they only run when an extension actually needs them.

use std::{
    io::{self, Write},
    time::Duration,
};

use compact_str::CompactString;

use crate::{
    clock::{Clock, SystemClock},
    error::Result,
    extension::{Component, Extension},
    extensions::{Bar, Eta, Percentage, Rate, Timer},
    io::LineWriter,
    provider::{Provider, ProviderRegistry},
    session::{self, DEFAULT_MAX_UPDATE_INTERVAL, Session},
};

/// A builder pattern for constructing [`Session`]s.
///
/// Defaults: bounds `[0, 100]`, output on stderr, a 500 ms redraw ceiling, a
/// single space between components, the line cleared on completion.
pub struct SessionBuilder {
    components: Vec<Component>,
    providers: Vec<Box<dyn Provider>>,
    default_providers: bool,
    stream: Option<Box<dyn Write + Send>>,
    clock: Option<Box<dyn Clock>>,
    min_value: f64,
    max_value: f64,
    max_update_interval: Duration,
    separator: CompactString,
    clear_on_completion: bool,
    print: bool,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            components: Vec::new(),
            providers: Vec::new(),
            default_providers: true,
            stream: None,
            clock: None,
            min_value: 0.0,
            max_value: 100.0,
            max_update_interval: DEFAULT_MAX_UPDATE_INTERVAL,
            separator: CompactString::const_new(" "),
            clear_on_completion: true,
            print: true,
        }
    }
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("components", &self.components)
            .field("min_value", &self.min_value)
            .field("max_value", &self.max_value)
            .field("max_update_interval", &self.max_update_interval)
            .finish_non_exhaustive()
    }
}

impl SessionBuilder {
    /// Starts from an empty line.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `Percentage Bar`.
    #[must_use]
    pub fn simple() -> Self {
        Self::new().component(Percentage::new()).component(Bar::new())
    }

    /// `Percentage Bar Rate Time: Timer ETA: Eta`.
    #[must_use]
    pub fn advanced() -> Self {
        Self::simple()
            .component(Rate::new())
            .text("Time:")
            .component(Timer::new())
            .text("ETA:")
            .component(Eta::new())
    }

    /// Replaces the component list.
    #[must_use]
    pub fn with_components(mut self, components: impl IntoIterator<Item = Component>) -> Self {
        self.components = components.into_iter().collect();
        self
    }

    /// Appends an extension.
    #[must_use]
    pub fn component(mut self, extension: impl Extension + 'static) -> Self {
        self.components.push(Component::extension(extension));
        self
    }

    /// Appends literal text.
    #[must_use]
    pub fn text(mut self, text: impl Into<CompactString>) -> Self {
        self.components.push(Component::text(text));
        self
    }

    /// Sets both bounds. Validated by [`build`](Self::build).
    #[must_use]
    pub const fn bounds(mut self, min: f64, max: f64) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }

    /// Sets the lower bound.
    #[must_use]
    pub const fn min_value(mut self, min: f64) -> Self {
        self.min_value = min;
        self
    }

    /// Sets the upper bound.
    #[must_use]
    pub const fn max_value(mut self, max: f64) -> Self {
        self.max_value = max;
        self
    }

    /// Writes the line to `stream` instead of stderr.
    #[must_use]
    pub fn stream(mut self, stream: impl Write + Send + 'static) -> Self {
        self.stream = Some(Box::new(stream));
        self
    }

    /// Ceiling on the time between two redraws.
    #[must_use]
    pub const fn max_update_interval(mut self, interval: Duration) -> Self {
        self.max_update_interval = interval;
        self
    }

    /// Text placed between consecutive components.
    #[must_use]
    pub fn separator(mut self, separator: impl Into<CompactString>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Whether [`Session::end`] blanks the line once the final state is drawn.
    #[must_use]
    pub const fn clear_on_completion(mut self, clear: bool) -> Self {
        self.clear_on_completion = clear;
        self
    }

    /// Whether anything is printed at all.
    #[must_use]
    pub const fn print(mut self, print: bool) -> Self {
        self.print = print;
        self
    }

    /// Time source, [`SystemClock`] by default.
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Registers an additional provider.
    #[must_use]
    pub fn provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Whether the built-in `rate`, `eta` and `eta_new` providers are
    /// registered.
    #[must_use]
    pub const fn with_default_providers(mut self, enabled: bool) -> Self {
        self.default_providers = enabled;
        self
    }

    /// Consumes the builder and returns the constructed [`Session`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidBounds`](crate::Error::InvalidBounds) for bounds with
    /// `min > max`, and any registration error of the added providers.
    pub fn build(self) -> Result<Session> {
        session::validate_bounds(self.min_value, self.max_value)?;

        let mut registry = if self.default_providers {
            ProviderRegistry::with_defaults()
        } else {
            ProviderRegistry::new()
        };
        for provider in self.providers {
            registry.register_boxed(provider)?;
        }

        let mut writer = LineWriter::from_boxed(
            self.stream
                .unwrap_or_else(|| Box::new(io::stderr())),
        );
        writer.set_enabled(self.print);

        Ok(Session::assemble(
            self.components,
            registry,
            writer,
            self.clock.unwrap_or_else(|| Box::new(SystemClock)),
            (self.min_value, self.max_value),
            self.max_update_interval,
            self.separator,
            self.clear_on_completion,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::SessionBuilder;
    use crate::{
        error::Error, extensions::Ellipses, io::SharedBuffer, provider::tests::Sum, tag::Tag,
    };

    #[test]
    fn test_defaults() {
        let session = SessionBuilder::new().build().unwrap();

        assert_eq!(session.min_value(), 0.0);
        assert_eq!(session.max_value(), 100.0);
        assert_eq!(
            session.providers().tags().cloned().collect::<Vec<_>>(),
            [Tag::RATE, Tag::ETA, Tag::ETA_NEW]
        );
        assert!(!session.has_begun());
    }

    /// Bounds Validation
    /// `min > max` and NaN bounds are rejected at build time.
    #[test]
    fn test_invalid_bounds() {
        let err = SessionBuilder::new().bounds(10.0, 1.0).build().unwrap_err();
        assert!(matches!(err, Error::InvalidBounds { .. }));

        let err = SessionBuilder::new().min_value(f64::NAN).build().unwrap_err();
        assert!(matches!(err, Error::InvalidBounds { .. }));

        assert!(SessionBuilder::new().bounds(3.0, 3.0).build().is_ok());
    }

    #[test]
    fn test_provider_registration() {
        let err = SessionBuilder::new()
            .provider(Sum::new("eta", &[]))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateProvider { .. }));

        let session = SessionBuilder::new()
            .with_default_providers(false)
            .provider(Sum::new("eta", &[]))
            .build()
            .unwrap();
        assert_eq!(session.providers().len(), 1);
    }

    /// Presets
    /// `simple` and `advanced` lay out their components left to right.
    #[test]
    fn test_presets_render() {
        let buffer = SharedBuffer::new();
        let mut session = SessionBuilder::advanced()
            .stream(buffer.clone())
            .build()
            .unwrap();

        session.begin().unwrap();

        let line = buffer.last_frame();
        assert!(line.starts_with("00% ["), "got {line:?}");
        assert!(line.ends_with("0 iters/s Time: 0:00:00 ETA: UNKNOWN"), "got {line:?}");
    }

    #[test]
    fn test_separator_and_text() {
        let buffer = SharedBuffer::new();
        let mut session = SessionBuilder::new()
            .text("Working")
            .component(Ellipses::new())
            .separator("")
            .max_update_interval(Duration::from_secs(1))
            .stream(buffer.clone())
            .build()
            .unwrap();

        session.begin().unwrap();

        assert_eq!(buffer.last_frame(), "Working.");
        assert_eq!(session.update_interval(), Duration::from_millis(300));
    }
}
