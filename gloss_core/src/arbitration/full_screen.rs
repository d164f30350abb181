// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The full-screen slot.

use crate::effect::EffectId;
use crate::signal::{Signal, SubscriptionId};

/// A change of the slot's holder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FullScreenChange {
    /// Holder before the change.
    pub previous: Option<EffectId>,
    /// Holder after the change.
    pub current: Option<EffectId>,
}

/// The single effect entitled to paint the whole desktop.
///
/// Acquiring while another effect holds the slot fails; there is no forcing.
/// Only the holder may release it.
#[derive(Debug, Default)]
pub struct FullScreenSlot {
    holder: Option<EffectId>,
    changed: Signal<FullScreenChange>,
}

impl FullScreenSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current holder.
    #[must_use]
    pub fn holder(&self) -> Option<EffectId> {
        self.holder
    }

    /// Takes the slot for `effect`. Succeeds if the slot is empty or
    /// already held by `effect`.
    pub fn acquire(&mut self, effect: EffectId) -> bool {
        match self.holder {
            Some(h) => h == effect,
            None => {
                self.set(Some(effect));
                true
            }
        }
    }

    /// Gives the slot up. Succeeds if `effect` held it or it was empty.
    pub fn release(&mut self, effect: EffectId) -> bool {
        match self.holder {
            Some(h) if h == effect => {
                self.set(None);
                true
            }
            Some(_) => false,
            None => true,
        }
    }

    /// Empties the slot regardless of the holder, returning who held it.
    pub fn clear(&mut self) -> Option<EffectId> {
        let previous = self.holder;
        if previous.is_some() {
            self.set(None);
        }
        previous
    }

    /// Subscribes to holder changes.
    pub fn on_change(
        &mut self,
        callback: impl FnMut(&FullScreenChange) + 'static,
    ) -> SubscriptionId {
        self.changed.subscribe(callback)
    }

    /// Revokes an [`on_change`](Self::on_change) subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.changed.unsubscribe(id)
    }

    fn set(&mut self, current: Option<EffectId>) {
        let change = FullScreenChange {
            previous: self.holder,
            current,
        };
        self.holder = current;
        self.changed.emit(&change);
    }
}
