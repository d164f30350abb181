// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-window, per-role ownership tokens.
//!
//! The grab table lives in window side data: the owner of `role` on a window
//! is the [`DataValue::Effect`] stored under that role. [`GrabTable`] only
//! remembers which roles were ever used as grab tokens, so unloading an
//! effect can find and clear every grab it holds.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use crate::effect::EffectId;
use crate::window::{DataRole, DataValue, WindowId, WindowStore};

/// Result of a grab request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrabOutcome {
    /// The requester owns the role now (or already did).
    Acquired,
    /// Another effect holds the role; nothing changed.
    Refused {
        /// The current owner.
        holder: EffectId,
    },
    /// A forced grab displaced the previous owner. The previous owner is not
    /// told; it sees the change when it next reads the role.
    Stolen {
        /// The displaced owner.
        previous: EffectId,
    },
    /// The window is gone.
    NoWindow,
}

impl GrabOutcome {
    /// Whether the requester owns the role afterwards.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Acquired | Self::Stolen { .. })
    }
}

/// Result of an ungrab request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UngrabOutcome {
    /// The requester's grab was cleared.
    Released,
    /// Nobody held the role.
    NotHeld,
    /// Another effect holds the role; it was left alone.
    HeldByOther(EffectId),
}

impl UngrabOutcome {
    /// Whether the role is free of the requester afterwards without having
    /// touched anyone else's grab.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Released | Self::NotHeld)
    }
}

/// Check-and-set access to grab roles.
#[derive(Clone, Debug, Default)]
pub struct GrabTable {
    roles: BTreeSet<DataRole>,
}

impl GrabTable {
    /// Creates a table that knows no roles yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the owner of `role` on `window`.
    #[must_use]
    pub fn holder(windows: &WindowStore, window: WindowId, role: DataRole) -> Option<EffectId> {
        windows.data(window, role).and_then(DataValue::as_effect)
    }

    /// Makes `effect` the owner of `role` on `window` if the role is free,
    /// already owned by `effect`, or `force` is set.
    pub fn grab(
        &mut self,
        windows: &mut WindowStore,
        window: WindowId,
        role: DataRole,
        effect: EffectId,
        force: bool,
    ) -> GrabOutcome {
        if !windows.is_alive(window) {
            return GrabOutcome::NoWindow;
        }
        let outcome = match Self::holder(windows, window, role) {
            Some(holder) if holder == effect => return GrabOutcome::Acquired,
            Some(holder) if !force => return GrabOutcome::Refused { holder },
            Some(previous) => GrabOutcome::Stolen { previous },
            None => GrabOutcome::Acquired,
        };
        self.roles.insert(role);
        windows.set_data(window, role, Some(DataValue::Effect(effect)));
        outcome
    }

    /// Clears `role` on `window` if `effect` owns it.
    pub fn ungrab(
        &mut self,
        windows: &mut WindowStore,
        window: WindowId,
        role: DataRole,
        effect: EffectId,
    ) -> UngrabOutcome {
        match Self::holder(windows, window, role) {
            None => UngrabOutcome::NotHeld,
            Some(holder) if holder != effect => UngrabOutcome::HeldByOther(holder),
            Some(_) => {
                windows.set_data(window, role, None);
                UngrabOutcome::Released
            }
        }
    }

    /// Clears every grab `effect` holds, returning what was cleared.
    pub fn release_all(
        &mut self,
        windows: &mut WindowStore,
        effect: EffectId,
    ) -> Vec<(WindowId, DataRole)> {
        let token = DataValue::Effect(effect);
        let mut cleared = Vec::new();
        for &role in &self.roles {
            for window in windows.windows_with_data(role, &token) {
                windows.set_data(window, role, None);
                cleared.push((window, role));
            }
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;

    const A: EffectId = EffectId(1);
    const B: EffectId = EffectId(2);
    const ROLE: DataRole = DataRole::WINDOW_CLOSED_GRAB;

    fn setup() -> (WindowStore, WindowId, GrabTable) {
        let mut windows = WindowStore::new();
        let w = windows.create_window(Rect::new(0.0, 0.0, 10.0, 10.0));
        (windows, w, GrabTable::new())
    }

    #[test]
    fn first_grab_wins() {
        let (mut windows, w, mut table) = setup();
        assert_eq!(table.grab(&mut windows, w, ROLE, A, false), GrabOutcome::Acquired);
        assert_eq!(
            table.grab(&mut windows, w, ROLE, B, false),
            GrabOutcome::Refused { holder: A }
        );
        assert_eq!(
            table.grab(&mut windows, w, ROLE, A, false),
            GrabOutcome::Acquired,
            "owner may grab again"
        );
        assert_eq!(GrabTable::holder(&windows, w, ROLE), Some(A));
    }

    #[test]
    fn forced_grab_displaces_silently() {
        let (mut windows, w, mut table) = setup();
        table.grab(&mut windows, w, ROLE, A, false);
        let outcome = table.grab(&mut windows, w, ROLE, B, true);
        assert_eq!(outcome, GrabOutcome::Stolen { previous: A });
        assert!(outcome.is_granted());
        assert_eq!(
            windows.data(w, ROLE),
            Some(&DataValue::Effect(B)),
            "the role reads the new owner, never the old"
        );
    }

    #[test]
    fn only_the_owner_releases() {
        let (mut windows, w, mut table) = setup();
        table.grab(&mut windows, w, ROLE, A, false);
        assert_eq!(
            table.ungrab(&mut windows, w, ROLE, B),
            UngrabOutcome::HeldByOther(A)
        );
        assert_eq!(GrabTable::holder(&windows, w, ROLE), Some(A), "untouched");
        assert_eq!(table.ungrab(&mut windows, w, ROLE, A), UngrabOutcome::Released);
        assert_eq!(table.ungrab(&mut windows, w, ROLE, A), UngrabOutcome::NotHeld);
    }

    #[test]
    fn release_all_clears_one_effect() {
        let (mut windows, w, mut table) = setup();
        let v = windows.create_window(Rect::new(0.0, 0.0, 10.0, 10.0));
        table.grab(&mut windows, w, ROLE, A, false);
        table.grab(&mut windows, v, ROLE, B, false);
        table.grab(&mut windows, v, DataRole::WINDOW_FORCE_GRAB, A, false);

        let cleared = table.release_all(&mut windows, A);
        assert_eq!(cleared.len(), 2);
        assert_eq!(GrabTable::holder(&windows, w, ROLE), None);
        assert_eq!(GrabTable::holder(&windows, v, ROLE), Some(B), "other effect kept");
    }

    #[test]
    fn dead_windows_cannot_be_grabbed() {
        let (mut windows, w, mut table) = setup();
        windows.mark_destroyed(w);
        assert_eq!(table.grab(&mut windows, w, ROLE, A, false), GrabOutcome::NoWindow);
    }
}
