//! Dependency resolution over the provider registry.
//!
//! Resolution runs once per session, during `begin`, in two steps:
//!
//! 1. **Discovery** walks the requirements of the active extensions and pulls
//!    in, transitively, the registered provider for every tag it meets. Tags
//!    nobody provides (engine tags, or simply unknown ones) end the walk
//!    without error.
//! 2. **Ordering** runs Kahn's algorithm over the discovered providers. Each
//!    round emits every provider whose requirements are already ordered, in
//!    discovery order, so the result is deterministic for a given registry
//!    and extension list.
//!
//! If a round finds nothing ready while providers remain, those providers
//! depend on each other in a loop and resolution fails with
//! [`Error::CyclicDependency`].

use std::collections::HashSet;

use crate::{
    error::{Error, Result, Unresolved},
    provider::ProviderRegistry,
    tag::Tag,
};

/// The evaluation order of one session: arena indices into the
/// [`ProviderRegistry`], each provider after everything it depends on.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Resolution {
    order: Vec<usize>,
}

impl Resolution {
    /// Registry indices in evaluation order.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Tags in evaluation order.
    #[must_use]
    pub fn tags(&self, registry: &ProviderRegistry) -> Vec<Tag> {
        self.order
            .iter()
            .filter_map(|&index| registry.get(index))
            .map(|provider| provider.tag().clone())
            .collect()
    }

    /// Number of providers that will run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no provider is needed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Computes which providers the `demanded` tags need, and in what order.
///
/// # Errors
///
/// [`Error::CyclicDependency`] naming the providers that could not be ordered.
pub fn resolve<'a, I>(registry: &ProviderRegistry, demanded: I) -> Result<Resolution>
where
    I: IntoIterator<Item = &'a Tag>,
{
    let mut discovered = Vec::new();
    let mut seen = HashSet::new();
    for tag in demanded {
        discover(registry, tag, &mut discovered, &mut seen);
    }

    // Edges only between discovered providers; everything else is a leaf.
    let mut pending: Vec<(usize, Vec<usize>)> = discovered
        .iter()
        .filter_map(|&index| {
            let provider = registry.get(index)?;
            let deps = provider
                .requirements()
                .iter()
                .filter_map(|tag| registry.position(tag))
                .filter(|dep| seen.contains(dep))
                .collect();
            Some((index, deps))
        })
        .collect();

    let mut order = Vec::with_capacity(pending.len());
    let mut done = HashSet::with_capacity(pending.len());
    loop {
        let ready: Vec<usize> = pending
            .iter()
            .filter(|(_, deps)| deps.iter().all(|dep| done.contains(dep)))
            .map(|&(index, _)| index)
            .collect();
        if ready.is_empty() {
            break;
        }
        done.extend(ready.iter().copied());
        order.extend(ready);
        pending.retain(|(index, _)| !done.contains(index));
    }

    if pending.is_empty() {
        Ok(Resolution { order })
    } else {
        Err(Error::CyclicDependency {
            remainder: remainder(registry, &pending, &done),
        })
    }
}

// Post-order: a provider is recorded after the providers it requires.
fn discover(
    registry: &ProviderRegistry,
    tag: &Tag,
    discovered: &mut Vec<usize>,
    seen: &mut HashSet<usize>,
) {
    let Some(index) = registry.position(tag) else {
        return;
    };
    if !seen.insert(index) {
        return;
    }
    if let Some(provider) = registry.get(index) {
        for requirement in provider.requirements() {
            discover(registry, requirement, discovered, seen);
        }
    }
    discovered.push(index);
}

fn remainder(
    registry: &ProviderRegistry,
    pending: &[(usize, Vec<usize>)],
    done: &HashSet<usize>,
) -> Vec<Unresolved> {
    let tag_of = |index: usize| registry.get(index).map(|p| p.tag().clone());
    pending
        .iter()
        .filter_map(|(index, deps)| {
            Some(Unresolved {
                tag: tag_of(*index)?,
                waiting_on: deps
                    .iter()
                    .filter(|dep| !done.contains(*dep))
                    .filter_map(|&dep| tag_of(dep))
                    .collect(),
            })
        })
        .collect()
}
