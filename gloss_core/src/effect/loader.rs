// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named effect factories.
//!
//! An [`EffectLoader`] maps names to [`EffectFactory`] constructors. Loading
//! hands the result, an effect or a [`LoadError`], to an [`EffectSink`]
//! passed in by the caller. The compositor is the usual sink; it runs the
//! effect's own [`load`](super::Effect::load) step, inserts it into the
//! chain, and publishes a [`LoadResult`].

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use super::{EffectId, EffectKind};
use crate::error::LoadError;

/// Receives what the loader built.
pub trait EffectSink {
    /// An effect was constructed and should join the chain. Returns whether
    /// it did.
    fn effect_created(&mut self, name: &str, effect: EffectKind) -> bool;

    /// Construction failed.
    fn effect_failed(&mut self, name: &str, error: LoadError);
}

/// The published outcome of one load attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadResult {
    /// Factory name.
    pub name: String,
    /// The loaded effect's id, or why it was excluded.
    pub outcome: Result<EffectId, LoadError>,
}

impl LoadResult {
    /// Whether the effect joined the chain.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.outcome.is_ok()
    }
}

type Constructor = Box<dyn Fn() -> Result<EffectKind, LoadError>>;

/// A named effect constructor.
pub struct EffectFactory {
    name: String,
    enabled_by_default: bool,
    build: Constructor,
}

impl fmt::Debug for EffectFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectFactory")
            .field("name", &self.name)
            .field("enabled_by_default", &self.enabled_by_default)
            .finish_non_exhaustive()
    }
}

impl EffectFactory {
    /// Creates a factory that is loaded by [`EffectLoader::load_all`].
    pub fn new(
        name: impl Into<String>,
        build: impl Fn() -> Result<EffectKind, LoadError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            enabled_by_default: true,
            build: Box::new(build),
        }
    }

    /// Sets whether [`EffectLoader::load_all`] picks this factory.
    #[must_use]
    pub fn enabled_by_default(mut self, enabled: bool) -> Self {
        self.enabled_by_default = enabled;
        self
    }

    /// The factory's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds a fresh effect.
    pub fn build(&self) -> Result<EffectKind, LoadError> {
        (self.build)()
    }
}

/// A registry of effect factories, in registration order.
#[derive(Debug, Default)]
pub struct EffectLoader {
    factories: Vec<EffectFactory>,
}

impl EffectLoader {
    /// Creates an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory. A factory with the same name is replaced.
    pub fn register(&mut self, factory: EffectFactory) {
        match self.factories.iter_mut().find(|f| f.name == factory.name) {
            Some(slot) => *slot = factory,
            None => self.factories.push(factory),
        }
    }

    /// Whether a factory is registered under `name`.
    #[must_use]
    pub fn is_known(&self, name: &str) -> bool {
        self.factories.iter().any(|f| f.name == name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.factories.iter().map(EffectFactory::name)
    }

    /// Builds the effect named `name` and hands it to `sink`. Returns
    /// whether the sink accepted it.
    pub fn load(&self, name: &str, sink: &mut dyn EffectSink) -> bool {
        let Some(factory) = self.factories.iter().find(|f| f.name == name) else {
            sink.effect_failed(name, LoadError::Unknown(name.to_string()));
            return false;
        };
        match factory.build() {
            Ok(effect) => sink.effect_created(name, effect),
            Err(error) => {
                sink.effect_failed(name, error);
                false
            }
        }
    }

    /// Loads every factory enabled by default. Returns how many effects the
    /// sink accepted.
    pub fn load_all(&self, sink: &mut dyn EffectSink) -> usize {
        self.factories
            .iter()
            .filter(|f| f.enabled_by_default)
            .filter(|f| self.load(&f.name, sink))
            .count()
    }
}
