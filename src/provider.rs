//! Providers: computation units that derive one tag from other tags.
//!
//! A [`Provider`] declares the tag it produces and the tags it reads. The
//! session hands it a [`Params`] snapshot of those requirements together with
//! a mutable reference to its own current value, and writes that value back
//! into the store once the callback returns. Leaving the slot untouched keeps
//! the previous value, which is how numeric degeneracies are absorbed.
//!
//! Registered providers live in a [`ProviderRegistry`], an insertion-ordered
//! arena. The resolved evaluation order of a session is a list of indices into
//! that arena.

use std::fmt;

use crate::{
    error::{Error, Result},
    providers::{EtaNewProvider, EtaProvider, RateProvider},
    stats::{Params, Stat},
    tag::Tag,
};

/// A named computation unit producing the value of [`tag`](Self::tag).
///
/// Only [`on_validated`](Self::on_validated) is mandatory. The default
/// dispatch runs it when every requirement has a value and falls back to
/// [`on_invalidated`](Self::on_invalidated), which resets the own value to
/// absent, otherwise.
pub trait Provider: Send {
    /// The tag this provider produces.
    fn tag(&self) -> &Tag;

    /// Tags read by this provider, in the order they appear in [`Params`].
    fn requirements(&self) -> &[Tag];

    /// Sets the initial value. Defaults to [`on_publish`](Self::on_publish).
    fn on_begin(&mut self, params: &Params<'_>, value: &mut Stat) {
        self.on_publish(params, value);
    }

    /// Recomputes the value on every non-throttled update.
    fn on_publish(&mut self, params: &Params<'_>, value: &mut Stat) {
        if params.is_valid() {
            self.on_validated(params, value);
        } else {
            self.on_invalidated(params, value);
        }
    }

    /// Computes the final value. Defaults to [`on_publish`](Self::on_publish).
    fn on_end(&mut self, params: &Params<'_>, value: &mut Stat) {
        self.on_publish(params, value);
    }

    /// Called when every requirement has a value.
    fn on_validated(&mut self, params: &Params<'_>, value: &mut Stat);

    /// Called when at least one requirement is absent.
    fn on_invalidated(&mut self, _params: &Params<'_>, value: &mut Stat) {
        *value = None;
    }
}

/// Insertion-ordered set of providers, at most one per tag.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Box<dyn Provider>>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.tag()))
            .finish()
    }
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in `rate`, `eta` and `eta_new`
    /// providers.
    #[must_use]
    pub fn with_defaults() -> Self {
        let providers: Vec<Box<dyn Provider>> = vec![
            Box::new(RateProvider::new()),
            Box::new(EtaProvider::new()),
            Box::new(EtaNewProvider::new()),
        ];
        Self { providers }
    }

    /// Adds a provider.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateProvider`] if the tag is already provided and
    /// [`Error::ReservedTag`] if the engine writes that tag itself.
    pub fn register(&mut self, provider: impl Provider + 'static) -> Result<()> {
        self.register_boxed(Box::new(provider))
    }

    /// Boxed variant of [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn register_boxed(&mut self, provider: Box<dyn Provider>) -> Result<()> {
        let tag = provider.tag();
        if tag.is_engine_tag() {
            return Err(Error::ReservedTag { tag: tag.clone() });
        }
        if self.position(tag).is_some() {
            return Err(Error::DuplicateProvider { tag: tag.clone() });
        }
        self.providers.push(provider);
        Ok(())
    }

    /// Removes and returns the provider for `tag`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownProvider`] if nothing provides `tag`.
    pub fn deregister(&mut self, tag: &Tag) -> Result<Box<dyn Provider>> {
        let index = self
            .position(tag)
            .ok_or_else(|| Error::UnknownProvider { tag: tag.clone() })?;
        Ok(self.providers.remove(index))
    }

    /// Arena index of the provider for `tag`.
    #[must_use]
    pub fn position(&self, tag: &Tag) -> Option<usize> {
        self.providers.iter().position(|p| p.tag() == tag)
    }

    /// Whether some provider produces `tag`.
    #[must_use]
    pub fn contains(&self, tag: &Tag) -> bool {
        self.position(tag).is_some()
    }

    /// Provider at arena `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&dyn Provider> {
        self.providers.get(index).map(|provider| &**provider)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut (dyn Provider + 'static)> {
        self.providers.get_mut(index).map(|provider| &mut **provider)
    }

    /// Tags of all registered providers, in registration order.
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.providers.iter().map(|p| p.tag())
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no provider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
