// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference-counted deferral of window destruction.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::effect::EffectId;
use crate::window::WindowId;

/// Counts, per window, the references effects hold to keep it alive.
///
/// Counts are kept per contributing effect so unloading an effect can drop
/// exactly its own references.
#[derive(Clone, Debug, Default)]
pub struct KeepAliveRegistry {
    refs: BTreeMap<WindowId, BTreeMap<EffectId, u32>>,
}

impl KeepAliveRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total references on `window`.
    #[must_use]
    pub fn count(&self, window: WindowId) -> u32 {
        self.refs
            .get(&window)
            .map_or(0, |by_effect| by_effect.values().sum())
    }

    /// Adds one reference from `effect`; returns the new total.
    pub fn acquire(&mut self, window: WindowId, effect: EffectId) -> u32 {
        *self
            .refs
            .entry(window)
            .or_default()
            .entry(effect)
            .or_default() += 1;
        self.count(window)
    }

    /// Drops one reference from `effect`; returns the new total, or `None`
    /// if `effect` held none.
    pub fn release(&mut self, window: WindowId, effect: EffectId) -> Option<u32> {
        let by_effect = self.refs.get_mut(&window)?;
        let n = by_effect.get_mut(&effect)?;
        *n -= 1;
        if *n == 0 {
            by_effect.remove(&effect);
        }
        if by_effect.is_empty() {
            self.refs.remove(&window);
        }
        Some(self.count(window))
    }

    /// Drops every reference from `effect`, returning the windows whose
    /// total fell to zero.
    pub fn release_all(&mut self, effect: EffectId) -> Vec<WindowId> {
        let mut freed = Vec::new();
        self.refs.retain(|&window, by_effect| {
            if by_effect.remove(&effect).is_none() {
                return true;
            }
            if by_effect.is_empty() {
                freed.push(window);
                false
            } else {
                true
            }
        });
        freed
    }

    /// Forgets a window entirely.
    pub fn forget(&mut self, window: WindowId) {
        self.refs.remove(&window);
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use crate::window::WindowStore;

    fn window() -> WindowId {
        WindowStore::new().create_window(Rect::new(0.0, 0.0, 1.0, 1.0))
    }

    #[test]
    fn uninterested_windows_count_zero() {
        let reg = KeepAliveRegistry::new();
        assert_eq!(reg.count(window()), 0);
    }

    #[test]
    fn destruction_waits_for_every_holder() {
        let w = window();
        let mut reg = KeepAliveRegistry::new();
        for n in 1..=3 {
            assert_eq!(reg.acquire(w, EffectId(n)), n);
        }
        assert_eq!(reg.release(w, EffectId(1)), Some(2));
        assert_eq!(reg.release(w, EffectId(2)), Some(1));
        assert_eq!(reg.release(w, EffectId(3)), Some(0), "last holder frees it");
        assert_eq!(reg.release(w, EffectId(3)), None, "nothing left to release");
    }

    #[test]
    fn release_all_returns_freed_windows() {
        let mut store = WindowStore::new();
        let a = store.create_window(Rect::new(0.0, 0.0, 1.0, 1.0));
        let b = store.create_window(Rect::new(0.0, 0.0, 1.0, 1.0));
        let mut reg = KeepAliveRegistry::new();
        reg.acquire(a, EffectId(1));
        reg.acquire(a, EffectId(1));
        reg.acquire(b, EffectId(1));
        reg.acquire(b, EffectId(2));

        assert_eq!(reg.release_all(EffectId(1)), [a]);
        assert_eq!(reg.count(a), 0);
        assert_eq!(reg.count(b), 1, "other effect still holds it");
    }
}
