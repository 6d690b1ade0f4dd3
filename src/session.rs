//! The session engine: begin, publish, end.
//!
//! A [`Session`] owns the [`StatStore`], the provider registry and the
//! components of the line, and is the only thing that mutates the store or
//! calls providers and extensions. Every pass runs in the same fixed order:
//!
//! 1. engine tags (value, bounds, iterations, timers, percentage),
//! 2. providers, in the [`Resolution`] computed during `begin`,
//! 3. extensions, in component order,
//! 4. the redraw.
//!
//! # Throttling
//!
//! Redrawing is the expensive part, so `publish` skips the whole pass when
//! the last redraw is more recent than the effective update interval *and*
//! the value moved by less than [`REDRAW_FRACTION`] of the range. The
//! effective interval is the smallest of `max_update_interval` and every
//! extension's own [`update_interval`](Extension::update_interval).
//! [`end`](Session::end) is never throttled.

use std::time::Duration;

use compact_str::CompactString;
use tracing::{debug, trace};
use web_time::Instant;

use crate::{
    clock::{self, Clock},
    error::{Error, Result},
    extension::{Component, Extension},
    io::LineWriter,
    provider::{Provider, ProviderRegistry},
    resolver::{self, Resolution},
    stats::{Params, Stat, StatStore, Value},
    tag::Tag,
};

/// Fraction of `max_value - min_value` a value has to move to force a redraw
/// inside the update interval.
pub const REDRAW_FRACTION: f64 = 0.1;

/// Default ceiling on the time between two redraws.
pub const DEFAULT_MAX_UPDATE_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    Idle,
    Publishing,
    Ended,
}

#[derive(Clone, Copy, Debug)]
enum Event {
    Begin,
    Publish,
    End,
}

/// A live progress line.
///
/// Build one with [`SessionBuilder`](crate::SessionBuilder).
pub struct Session {
    pub(crate) components: Vec<Component>,
    pub(crate) outputs: Vec<CompactString>,
    pub(crate) registry: ProviderRegistry,
    pub(crate) writer: LineWriter,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) min_value: f64,
    pub(crate) max_value: f64,
    pub(crate) max_update_interval: Duration,
    pub(crate) separator: CompactString,
    pub(crate) clear_on_completion: bool,

    resolution: Resolution,
    stats: StatStore,
    scratch: Vec<Stat>,
    phase: Phase,
    update_interval: Duration,
    iterations: u64,
    began_at: Option<Instant>,
    last_redraw: Option<Instant>,
    last_redraw_value: Option<f64>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.phase)
            .field("min_value", &self.min_value)
            .field("max_value", &self.max_value)
            .field("components", &self.components)
            .field("providers", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        components: Vec<Component>,
        registry: ProviderRegistry,
        writer: LineWriter,
        clock: Box<dyn Clock>,
        (min_value, max_value): (f64, f64),
        max_update_interval: Duration,
        separator: CompactString,
        clear_on_completion: bool,
    ) -> Self {
        let outputs = vec![CompactString::default(); components.len()];
        Self {
            components,
            outputs,
            registry,
            writer,
            clock,
            min_value,
            max_value,
            max_update_interval,
            separator,
            clear_on_completion,
            resolution: Resolution::default(),
            stats: StatStore::new(),
            scratch: Vec::new(),
            phase: Phase::Idle,
            update_interval: max_update_interval,
            iterations: 0,
            began_at: None,
            last_redraw: None,
            last_redraw_value: None,
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Lower bound of the session.
    #[must_use]
    pub const fn min_value(&self) -> f64 {
        self.min_value
    }

    /// Upper bound of the session.
    #[must_use]
    pub const fn max_value(&self) -> f64 {
        self.max_value
    }

    /// Replaces the bounds.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidBounds`] if `min > max` or either is NaN, and
    /// [`Error::AlreadyBegun`] once the session has begun.
    pub fn set_bounds(&mut self, min: f64, max: f64) -> Result<()> {
        self.ensure_idle()?;
        validate_bounds(min, max)?;
        self.min_value = min;
        self.max_value = max;
        Ok(())
    }

    /// Registers a provider for this session.
    ///
    /// # Errors
    ///
    /// See [`ProviderRegistry::register`]; [`Error::AlreadyBegun`] once the
    /// session has begun.
    pub fn register_provider(&mut self, provider: impl Provider + 'static) -> Result<()> {
        self.ensure_idle()?;
        self.registry.register(provider)
    }

    /// Removes the provider for `tag`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownProvider`] if nothing provides `tag`;
    /// [`Error::AlreadyBegun`] once the session has begun.
    pub fn deregister_provider(&mut self, tag: &Tag) -> Result<Box<dyn Provider>> {
        self.ensure_idle()?;
        self.registry.deregister(tag)
    }

    /// The registered providers.
    #[must_use]
    pub const fn providers(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Enables or disables printing. Computation continues either way.
    pub fn allow_to_print(&mut self, allowed: bool) {
        self.writer.set_enabled(allowed);
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Current content of the stat store.
    #[must_use]
    pub const fn stats(&self) -> &StatStore {
        &self.stats
    }

    /// Provider evaluation order computed by [`begin`](Self::begin).
    #[must_use]
    pub const fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// The redraw interval in effect for this session.
    #[must_use]
    pub const fn update_interval(&self) -> Duration {
        self.update_interval
    }

    /// Whether [`begin`](Self::begin) has completed.
    #[must_use]
    pub fn has_begun(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Whether [`end`](Self::end) has been called.
    #[must_use]
    pub fn has_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    /// The line as it would be printed right now.
    #[must_use]
    pub fn line(&self) -> String {
        let mut line = String::new();
        for (i, (component, output)) in self.components.iter().zip(&self.outputs).enumerate() {
            if i > 0 {
                line.push_str(&self.separator);
            }
            match component {
                Component::Text(text) => line.push_str(text),
                Component::Extension(_) => line.push_str(output),
            }
        }
        line
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Resolves providers, seeds the engine tags and draws the first line.
    ///
    /// Does nothing if the session has already begun.
    ///
    /// # Errors
    ///
    /// [`Error::CyclicDependency`] if the demanded providers form a loop (no
    /// provider or extension has run in that case), or [`Error::Io`] if the
    /// first draw fails.
    pub fn begin(&mut self) -> Result<()> {
        if self.phase != Phase::Idle {
            return Ok(());
        }

        let demanded: Vec<&Tag> = self
            .extensions()
            .flat_map(|ext| ext.requirements())
            .collect();
        let resolution = resolver::resolve(&self.registry, demanded)?;

        self.update_interval = self
            .extensions()
            .filter_map(|ext| ext.update_interval())
            .fold(self.max_update_interval, Duration::min);

        let now = self.clock.now();
        self.stats.clear();
        self.seed_stats();
        for tag in resolution.tags(&self.registry) {
            self.stats.declare(tag);
        }
        self.resolution = resolution;
        self.iterations = 0;
        self.began_at = Some(now);

        debug!(
            providers = ?self.resolution.tags(&self.registry),
            update_interval = ?self.update_interval,
            "progress session began"
        );

        self.fire(Event::Begin);
        self.redraw(now, None)?;
        self.phase = Phase::Publishing;
        Ok(())
    }

    /// Reports progress and redraws when the throttle allows it.
    ///
    /// `None` means indeterminate progress: the percentage becomes absent.
    /// Calls [`begin`](Self::begin) first if needed.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] for a value outside `[min_value, max_value]`,
    /// [`Error::Ended`] after [`end`](Self::end), and any error of `begin`
    /// or of the redraw.
    pub fn publish(&mut self, value: impl Into<Option<f64>>) -> Result<()> {
        let value = value.into();
        match self.phase {
            Phase::Ended => return Err(Error::Ended),
            Phase::Idle => self.begin()?,
            Phase::Publishing => {}
        }
        if let Some(v) = value {
            if !(self.min_value..=self.max_value).contains(&v) {
                return Err(Error::OutOfRange {
                    value: v,
                    min: self.min_value,
                    max: self.max_value,
                });
            }
        }

        self.iterations += 1;
        let now = self.clock.now();
        let since_redraw = self
            .last_redraw
            .map_or(Duration::MAX, |at| clock::elapsed_since(now, at));
        if self.is_throttled(since_redraw, value) {
            trace!(?value, ?since_redraw, "publish throttled");
            return Ok(());
        }

        let since_update = since_redraw.min(self.elapsed(now));
        let percentage = value.and_then(|v| self.percentage(v));
        self.stats.set_value(Tag::TIME_SINCE_UPDATE, since_update);
        self.update_timers(now);
        self.stats.set_value(Tag::ITERATIONS, self.iterations as f64);
        self.stats.set(Tag::VALUE, value.map(Value::Number));
        self.stats.set_value(Tag::MIN_VALUE, self.min_value);
        self.stats.set_value(Tag::MAX_VALUE, self.max_value);
        self.stats.set(Tag::PERCENTAGE, percentage.map(Value::Number));

        self.fire(Event::Publish);
        self.redraw(now, value)
    }

    /// Forces a final pass at 100% and releases the providers.
    ///
    /// Begins the session first if needed; calling it again is a no-op.
    /// With `clear_on_completion` the line is blanked afterwards.
    ///
    /// # Errors
    ///
    /// Any error of `begin` or of the final draw.
    pub fn end(&mut self) -> Result<()> {
        match self.phase {
            Phase::Ended => return Ok(()),
            Phase::Idle => self.begin()?,
            Phase::Publishing => {}
        }

        let now = self.clock.now();
        self.update_timers(now);
        self.stats.set_value(Tag::ITERATIONS, self.iterations as f64);
        self.stats.set_value(Tag::VALUE, self.max_value);
        self.stats.set_value(Tag::MIN_VALUE, self.min_value);
        self.stats.set_value(Tag::MAX_VALUE, self.max_value);
        self.stats.set_value(Tag::END_TIME, clock::wall_time());
        self.stats.set_value(Tag::PERCENTAGE, 100.0);

        self.fire(Event::End);
        self.phase = Phase::Ended;
        let max_value = self.max_value;
        let drawn = self.redraw(now, Some(max_value));

        self.resolution = Resolution::default();
        self.scratch = Vec::new();
        debug!(iterations = self.iterations, "progress session ended");

        drawn?;
        if self.clear_on_completion {
            self.writer.clear()?;
        }
        Ok(())
    }

    /// Runs `f` between [`begin`](Self::begin) and [`end`](Self::end).
    ///
    /// # Errors
    ///
    /// Errors of `begin`, of `f` and of `end`, in that order. The session is
    /// ended even if `f` fails, as long as it began.
    pub fn run<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.begin()?;
        let result = f(self);
        let ended = self.end();
        let value = result?;
        ended?;
        Ok(value)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn ensure_idle(&self) -> Result<()> {
        if self.phase == Phase::Idle {
            Ok(())
        } else {
            Err(Error::AlreadyBegun)
        }
    }

    fn extensions(&self) -> impl Iterator<Item = &dyn Extension> {
        self.components.iter().filter_map(|component| match component {
            Component::Extension(ext) => Some(&**ext),
            Component::Text(_) => None,
        })
    }

    fn seed_stats(&mut self) {
        let stats = &mut self.stats;
        stats.set(Tag::VALUE, None);
        stats.set_value(Tag::MIN_VALUE, self.min_value);
        stats.set_value(Tag::MAX_VALUE, self.max_value);
        stats.set_value(Tag::BEGIN_TIME, clock::wall_time());
        stats.set(Tag::END_TIME, None);
        stats.set_value(Tag::ITERATIONS, 0.0);
        stats.set_value(Tag::PERCENTAGE, 0.0);
        stats.set_value(Tag::TIME_SINCE_BEGIN, Duration::ZERO);
        stats.set_value(Tag::DELTATIME, Duration::ZERO);
        stats.set(Tag::LAST_UPDATED_AT, None);
        stats.set(Tag::TIME_SINCE_UPDATE, None);
    }

    fn elapsed(&self, now: Instant) -> Duration {
        self.began_at
            .map_or(Duration::ZERO, |began| clock::elapsed_since(now, began))
    }

    fn update_timers(&mut self, now: Instant) {
        let previous = self
            .stats
            .duration(&Tag::TIME_SINCE_BEGIN)
            .unwrap_or_default();
        let elapsed = self.elapsed(now);
        self.stats.set_value(Tag::TIME_SINCE_BEGIN, elapsed);
        self.stats
            .set_value(Tag::DELTATIME, elapsed.saturating_sub(previous));
    }

    fn percentage(&self, value: f64) -> Option<f64> {
        let range = self.max_value - self.min_value;
        (range.is_finite() && range > 0.0).then(|| 100.0 * (value - self.min_value) / range)
    }

    fn is_throttled(&self, since_redraw: Duration, value: Option<f64>) -> bool {
        if since_redraw >= self.update_interval {
            return false;
        }
        match (value, self.last_redraw_value) {
            (Some(value), Some(previous)) => {
                let range = self.max_value - self.min_value;
                (value - previous).abs() < REDRAW_FRACTION * range
            }
            _ => true,
        }
    }

    fn fire(&mut self, event: Event) {
        let Self {
            components,
            outputs,
            registry,
            resolution,
            stats,
            scratch,
            ..
        } = self;

        for &index in resolution.order() {
            let Some(provider) = registry.get_mut(index) else {
                continue;
            };
            scratch.clear();
            scratch.extend(provider.requirements().iter().map(|tag| stats.get(tag).cloned()));
            let params = Params::new(scratch.as_slice());

            let tag = provider.tag().clone();
            let mut value = stats.get(&tag).cloned();
            match event {
                Event::Begin => provider.on_begin(&params, &mut value),
                Event::Publish => provider.on_publish(&params, &mut value),
                Event::End => provider.on_end(&params, &mut value),
            }
            stats.set(tag, value);
        }

        for (component, output) in components.iter_mut().zip(outputs.iter_mut()) {
            let Component::Extension(ext) = component else {
                continue;
            };
            scratch.clear();
            scratch.extend(ext.requirements().iter().map(|tag| stats.get(tag).cloned()));
            let params = Params::new(scratch.as_slice());
            match event {
                Event::Begin => ext.on_begin(&params, output),
                Event::Publish => ext.on_update(&params, output),
                Event::End => ext.on_end(&params, output),
            }
        }
    }

    fn redraw(&mut self, now: Instant, value: Option<f64>) -> Result<()> {
        let line = self.line();
        self.stats.set_value(Tag::LAST_UPDATED_AT, clock::wall_time());
        self.last_redraw = Some(now);
        self.last_redraw_value = value;
        trace!(%line, "redraw");
        self.writer.draw(&line)?;
        Ok(())
    }
}

pub(crate) fn validate_bounds(min: f64, max: f64) -> Result<()> {
    if min <= max {
        Ok(())
    } else {
        Err(Error::InvalidBounds { min, max })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use compact_str::CompactString;

    use crate::{
        builder::SessionBuilder,
        clock::ManualClock,
        error::Error,
        extension::{Extension, UNKNOWN},
        extensions::{Bar, Percentage},
        io::SharedBuffer,
        provider::tests::Sum,
        session::Session,
        stats::{Params, Value},
        tag::Tag,
    };

    const T: Duration = Duration::from_millis(500);

    fn session(builder: SessionBuilder) -> (Session, SharedBuffer, ManualClock) {
        let buffer = SharedBuffer::new();
        let clock = ManualClock::new();
        let session = builder
            .stream(buffer.clone())
            .clock(clock.clone())
            .build()
            .unwrap();
        (session, buffer, clock)
    }

    fn percentage_bar() -> SessionBuilder {
        SessionBuilder::new()
            .component(Percentage::new())
            .component(Bar::new())
            .clear_on_completion(false)
    }

    /// Percentage Formula
    /// percentage = 100 * (value - min) / (max - min).
    #[allow(clippy::float_cmp)]
    #[test]
    fn test_percentage_formula() {
        let (mut s, _, clock) = session(percentage_bar().bounds(20.0, 70.0));
        s.begin().unwrap();

        for value in [20.0, 32.5, 45.0, 70.0] {
            clock.advance(T);
            s.publish(value).unwrap();
            let expected = 100.0 * (value - 20.0) / 50.0;
            assert_eq!(s.stats().number(&Tag::PERCENTAGE), Some(expected));
        }
    }

    #[test]
    fn test_degenerate_range_has_no_percentage() {
        let (mut s, buffer, clock) = session(percentage_bar().bounds(5.0, 5.0));
        s.begin().unwrap();
        clock.advance(T);
        s.publish(5.0).unwrap();

        assert!(s.stats().get(&Tag::PERCENTAGE).is_none());
        assert!(buffer.last_frame().starts_with(UNKNOWN));
    }

    /// End To End
    /// begin, publish(50), out-of-range publish, end.
    #[test]
    fn test_percentage_bar_end_to_end() {
        let (mut s, buffer, clock) = session(percentage_bar().clear_on_completion(true));
        s.begin().unwrap();
        assert!(buffer.last_frame().starts_with("00% ["));

        clock.advance(T);
        s.publish(50.0).unwrap();
        let frame = buffer.last_frame();
        assert!(frame.contains("50%"), "got {frame:?}");
        assert_eq!(frame.matches('#').count(), 30);

        let err = s.publish(150.0).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { value, .. } if value == 150.0));

        s.end().unwrap();
        assert_eq!(s.stats().number(&Tag::PERCENTAGE), Some(100.0));
        assert_eq!(s.stats().number(&Tag::VALUE), Some(100.0));
        assert!(buffer.contents().contains(&format!("100% [{}]", "#".repeat(60))));
        assert_eq!(buffer.last_frame().trim(), "", "line is cleared on completion");
    }

    /// End Pins Value
    /// end() reports 100% whatever was published before.
    #[test]
    fn test_end_pins_value_to_max() {
        let (mut s, buffer, clock) = session(percentage_bar().bounds(0.0, 10.0));
        s.begin().unwrap();
        clock.advance(T);
        s.publish(3.0).unwrap();

        s.end().unwrap();

        assert_eq!(s.stats().number(&Tag::VALUE), Some(10.0));
        assert_eq!(s.stats().number(&Tag::PERCENTAGE), Some(100.0));
        assert!(buffer.last_frame().starts_with("100%"));
        assert!(s.resolution().is_empty(), "providers are released");
    }

    /// Throttling Window
    /// Small moves inside the interval are dropped; a gap of T always redraws.
    #[test]
    fn test_throttle() {
        let (mut s, buffer, clock) = session(percentage_bar());
        s.begin().unwrap();
        clock.advance(T);
        s.publish(10.0).unwrap();
        let after_first = buffer.contents();

        clock.advance(T / 4);
        s.publish(15.0).unwrap();
        assert_eq!(buffer.contents(), after_first, "small move inside T is throttled");
        assert_eq!(s.stats().number(&Tag::VALUE), Some(10.0));

        clock.advance(T);
        s.publish(16.0).unwrap();
        assert_ne!(buffer.contents(), after_first);
        assert!(buffer.last_frame().starts_with("16%"));
    }

    #[test]
    fn test_large_move_bypasses_interval() {
        let (mut s, buffer, clock) = session(percentage_bar());
        s.begin().unwrap();
        clock.advance(T);
        s.publish(10.0).unwrap();

        s.publish(40.0).unwrap();
        assert!(buffer.last_frame().starts_with("40%"));
    }

    /// First Publish After Begin
    /// Inside the interval, a move away from an absent value is throttled.
    #[test]
    fn test_publish_right_after_begin_is_throttled() {
        let (mut s, buffer, _clock) = session(percentage_bar());
        s.begin().unwrap();
        let after_begin = buffer.contents();

        s.publish(90.0).unwrap();

        assert_eq!(buffer.contents(), after_begin);
        assert_eq!(s.stats().number(&Tag::ITERATIONS), Some(0.0));
    }

    #[test]
    fn test_iterations_count_every_publish() {
        let (mut s, _, clock) = session(percentage_bar());
        s.begin().unwrap();
        for value in 1..=4 {
            s.publish(f64::from(value)).unwrap();
        }
        clock.advance(T);
        s.publish(5.0).unwrap();

        assert_eq!(s.stats().number(&Tag::ITERATIONS), Some(5.0));
    }

    static NO_REQUIREMENTS: [Tag; 0] = [];

    struct Fast;

    impl Extension for Fast {
        fn requirements(&self) -> &[Tag] {
            &NO_REQUIREMENTS
        }

        fn update_interval(&self) -> Option<Duration> {
            Some(Duration::from_millis(50))
        }

        fn on_validated(&mut self, _params: &Params<'_>, output: &mut CompactString) {
            *output = "fast".into();
        }
    }

    /// Extension Intervals
    /// The fastest extension lowers the effective update interval.
    #[test]
    fn test_extension_interval_lowers_ceiling() {
        let (mut s, buffer, clock) = session(percentage_bar().component(Fast));
        s.begin().unwrap();
        assert_eq!(s.update_interval(), Duration::from_millis(50));

        clock.advance(Duration::from_millis(60));
        s.publish(1.0).unwrap();
        assert!(buffer.last_frame().starts_with("01%"));
    }

    /// Missing Providers
    /// An extension reading a tag nobody produces renders its placeholder.
    #[test]
    fn test_unprovided_tag_renders_placeholder() {
        struct Reads(Vec<Tag>);

        impl Extension for Reads {
            fn requirements(&self) -> &[Tag] {
                &self.0
            }

            fn on_validated(&mut self, _params: &Params<'_>, output: &mut CompactString) {
                *output = "ok".into();
            }
        }

        let builder = SessionBuilder::new()
            .provider(Sum::new("derived", &["nobody"]))
            .component(Reads(vec![Tag::new("derived")]))
            .component(Reads(vec![Tag::new("nobody")]));
        let (mut s, buffer, clock) = session(builder);

        s.begin().unwrap();
        clock.advance(T);
        s.publish(50.0).unwrap();

        assert!(s.stats().contains(&Tag::new("derived")));
        assert!(s.stats().get(&Tag::new("derived")).is_none());
        assert_eq!(buffer.last_frame().trim_end(), "UNKNOWN UNKNOWN");
    }

    /// Provider Chains
    /// Providers see values produced earlier in the same pass.
    #[test]
    fn test_providers_run_in_dependency_order() {
        let builder = SessionBuilder::new()
            .provider(Sum::new("twice", &["once", "once"]))
            .provider(Sum::new("once", &["percentage"]))
            .component(crate::extensions::Timer::new())
            .component(Show(Tag::new("twice")));
        let (mut s, buffer, clock) = session(builder);

        s.begin().unwrap();
        clock.advance(T);
        s.publish(25.0).unwrap();

        assert_eq!(s.stats().number(&Tag::new("once")), Some(25.0));
        assert_eq!(s.stats().number(&Tag::new("twice")), Some(50.0));
        assert_eq!(buffer.last_frame().trim_end(), "0:00:00 50");
    }

    struct Show(Tag);

    impl Extension for Show {
        fn requirements(&self) -> &[Tag] {
            std::slice::from_ref(&self.0)
        }

        fn on_validated(&mut self, params: &Params<'_>, output: &mut CompactString) {
            if let Some(n) = params.number(0) {
                *output = compact_str::format_compact!("{n}");
            }
        }
    }

    /// Cyclic Configuration
    /// begin fails and nothing is evaluated or printed.
    #[test]
    fn test_cycle_aborts_begin_without_output() {
        let builder = SessionBuilder::new()
            .provider(Sum::new("a", &["b"]))
            .provider(Sum::new("b", &["a"]))
            .component(Show(Tag::new("a")));
        let (mut s, buffer, _) = session(builder);

        let err = s.begin().unwrap_err();

        assert!(matches!(err, Error::CyclicDependency { .. }));
        assert!(buffer.is_empty());
        assert!(!s.has_begun());
        assert!(s.stats().is_empty());
    }

    #[test]
    fn test_lifecycle_rules() {
        let (mut s, _, _) = session(percentage_bar());

        s.publish(None).unwrap();
        assert!(s.has_begun(), "publish begins implicitly");
        assert!(matches!(s.set_bounds(0.0, 1.0), Err(Error::AlreadyBegun)));
        assert!(matches!(
            s.register_provider(Sum::new("late", &[])),
            Err(Error::AlreadyBegun)
        ));

        s.end().unwrap();
        s.end().unwrap();
        assert!(matches!(s.publish(1.0), Err(Error::Ended)));
    }

    #[test]
    fn test_indeterminate_publish() {
        let (mut s, buffer, clock) = session(percentage_bar());
        s.begin().unwrap();
        clock.advance(T);
        s.publish(None).unwrap();

        assert!(s.stats().get(&Tag::VALUE).is_none());
        assert!(s.stats().get(&Tag::PERCENTAGE).is_none());
        assert!(buffer.last_frame().starts_with(UNKNOWN));
    }

    #[test]
    fn test_timers_follow_the_clock() {
        let (mut s, _, clock) = session(percentage_bar());
        s.begin().unwrap();

        clock.advance(Duration::from_secs(2));
        s.publish(50.0).unwrap();
        clock.advance(Duration::from_secs(3));
        s.publish(60.0).unwrap();

        let stats = s.stats();
        assert_eq!(stats.duration(&Tag::TIME_SINCE_BEGIN), Some(Duration::from_secs(5)));
        assert_eq!(stats.duration(&Tag::DELTATIME), Some(Duration::from_secs(3)));
        assert_eq!(stats.duration(&Tag::TIME_SINCE_UPDATE), Some(Duration::from_secs(3)));
    }

    /// Run Scope
    /// run() ends the session even when the body fails.
    #[test]
    fn test_run_ends_on_error() {
        let (mut s, _, _) = session(percentage_bar());

        let result: Result<(), Error> = s.run(|s| s.publish(500.0));

        assert!(matches!(result, Err(Error::OutOfRange { .. })));
        assert!(s.has_ended());
    }

    /// Default Providers
    /// The advanced preset wires rate and ETA through the default providers.
    #[test]
    fn test_advanced_preset_renders_rate_and_eta() {
        let (mut s, buffer, clock) = session(SessionBuilder::advanced().clear_on_completion(false));
        s.begin().unwrap();

        for step in 1..=4 {
            clock.advance(Duration::from_secs(1));
            s.publish(f64::from(step) * 10.0).unwrap();
        }

        // Four publishes over four seconds reaching 40%.
        let stats = s.stats();
        assert_eq!(stats.number(&Tag::RATE), Some(1.0));
        assert_eq!(stats.duration(&Tag::ETA), Some(Duration::from_secs(6)));
        let frame = buffer.last_frame();
        assert!(frame.contains("1 iters/s"), "got {frame:?}");
        assert!(frame.contains("Time: 0:00:04"), "got {frame:?}");
        assert!(frame.contains("ETA: 0:00:06"), "got {frame:?}");
        assert_eq!(
            s.resolution().tags(s.providers()),
            [Tag::RATE, Tag::ETA],
            "eta_new is registered but not demanded"
        );
    }

    #[test]
    fn test_print_disabled() {
        let (mut s, buffer, clock) = session(percentage_bar().print(false));
        s.begin().unwrap();
        clock.advance(T);
        s.publish(50.0).unwrap();

        assert!(buffer.is_empty());
        assert!(s.line().starts_with("50%"));
        assert_eq!(
            s.stats().get(&Tag::PERCENTAGE),
            Some(&Value::Number(50.0))
        );
    }
}
