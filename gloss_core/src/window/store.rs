// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays window storage with allocation, stacking, and damage.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::mem;

use kurbo::{Insets, Rect, Vec2};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::data::{DataRole, DataValue};
use super::id::{WindowId, WindowState};
use crate::dirty;
use crate::region::Region;

const INVALID: u32 = u32::MAX;

/// Per-window boolean flags maintained by the window manager.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WindowFlags {
    /// Iconified.
    pub minimized: bool,
    /// Unmapped without being closed.
    pub hidden: bool,
}

/// Struct-of-arrays storage for all windows the compositor knows about.
///
/// Windows are addressed by [`WindowId`] handles. Stale handles never panic:
/// getters return `None` and mutators return `false`, because effects may
/// legitimately hold on to a handle past its window's destruction.
#[derive(Debug)]
pub struct WindowStore {
    // -- Properties (set by the window manager) --
    pub(crate) frame: Vec<Rect>,
    pub(crate) paint_margins: Vec<Insets>,
    pub(crate) opacity: Vec<f64>,
    pub(crate) desktop: Vec<Option<u32>>,
    pub(crate) flags: Vec<WindowFlags>,
    pub(crate) state: Vec<WindowState>,
    pub(crate) transient_for: Vec<u32>,

    // -- Side data --
    pub(crate) data: Vec<BTreeMap<DataRole, DataValue>>,

    // -- Damage (window-local coordinates) --
    pub(crate) damage: Vec<Region>,
    /// Screen area uncovered by moves, closes and restacks.
    pub(crate) exposed: Region,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Stacking, bottom to top --
    pub(crate) stacking: Vec<u32>,
    pub(crate) current_desktop: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Lifecycle tracking --
    pub(crate) pending_destroy: Vec<u32>,
}

impl Default for WindowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame: Vec::new(),
            paint_margins: Vec::new(),
            opacity: Vec::new(),
            desktop: Vec::new(),
            flags: Vec::new(),
            state: Vec::new(),
            transient_for: Vec::new(),
            data: Vec::new(),
            damage: Vec::new(),
            exposed: Region::Empty,
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            stacking: Vec::new(),
            current_desktop: 1,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending_destroy: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a window with the given frame geometry, stacked on top.
    ///
    /// The window starts live, fully opaque, on all desktops, with no side
    /// data, and fully damaged.
    pub fn create_window(&mut self, frame: Rect) -> WindowId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.frame[i] = frame;
            self.paint_margins[i] = Insets::ZERO;
            self.opacity[i] = 1.0;
            self.desktop[i] = None;
            self.flags[i] = WindowFlags::default();
            self.state[i] = WindowState::Live;
            self.transient_for[i] = INVALID;
            self.data[i].clear();
            self.damage[i] = Region::Empty;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.frame.push(frame);
            self.paint_margins.push(Insets::ZERO);
            self.opacity.push(1.0);
            self.desktop.push(None);
            self.flags.push(WindowFlags::default());
            self.state.push(WindowState::Live);
            self.transient_for.push(INVALID);
            self.data.push(BTreeMap::new());
            self.damage.push(Region::Empty);
            self.generation.push(0);
            idx
        };

        self.stacking.push(idx);
        self.dirty.mark_with(idx, dirty::REPAINT, &EagerPolicy);

        WindowId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Marks a closed window as released. It stays resolvable until the
    /// next [`reap`](Self::reap) so in-flight stage dispatch never sees a
    /// dangling handle.
    pub(crate) fn mark_destroyed(&mut self, id: WindowId) -> bool {
        let Some(i) = self.slot(id) else {
            return false;
        };
        if self.state[i] == WindowState::Destroyed {
            return false;
        }
        self.state[i] = WindowState::Destroyed;
        self.pending_destroy.push(id.idx);
        true
    }

    /// Frees every window released since the last call, returning their
    /// (now stale) handles in release order.
    pub(crate) fn reap(&mut self) -> Vec<WindowId> {
        let pending = mem::take(&mut self.pending_destroy);
        let mut reaped = Vec::with_capacity(pending.len());
        for idx in pending {
            let i = idx as usize;
            reaped.push(WindowId {
                idx,
                generation: self.generation[i],
            });
            self.exposed.add_rect(self.expanded_rect(i));
            self.stacking.retain(|&s| s != idx);
            for t in &mut self.transient_for {
                if *t == idx {
                    *t = INVALID;
                }
            }
            self.dirty.remove_key(idx);
            self.data[i].clear();
            self.damage[i] = Region::Empty;
            // Bump generation so old handles immediately fail validation.
            self.generation[i] += 1;
            self.free_list.push(idx);
        }
        reaped
    }

    /// Returns whether the handle refers to a window that has not been
    /// released. Closed remnants are alive.
    #[must_use]
    pub fn is_alive(&self, id: WindowId) -> bool {
        self.slot(id)
            .is_some_and(|i| self.state[i] != WindowState::Destroyed)
    }

    /// Returns the number of windows that have not been freed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stacking.len()
    }

    /// Returns `true` if the store holds no windows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacking.is_empty()
    }

    // -- Stacking API --

    /// Returns the non-released windows from bottom to top.
    pub fn stacking_order(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.stacking.iter().filter_map(move |&idx| {
            let i = idx as usize;
            (self.state[i] != WindowState::Destroyed).then(|| WindowId {
                idx,
                generation: self.generation[i],
            })
        })
    }

    /// Moves a window to the top of the stack.
    pub fn raise(&mut self, id: WindowId) -> bool {
        self.restack(id, true)
    }

    /// Moves a window to the bottom of the stack.
    pub fn lower(&mut self, id: WindowId) -> bool {
        self.restack(id, false)
    }

    fn restack(&mut self, id: WindowId, top: bool) -> bool {
        if self.slot(id).is_none() {
            return false;
        }
        self.stacking.retain(|&s| s != id.idx);
        if top {
            self.stacking.push(id.idx);
        } else {
            self.stacking.insert(0, id.idx);
        }
        self.dirty.mark(id.idx, dirty::STACKING);
        true
    }

    // -- Property getters --

    /// Returns the frame geometry in screen coordinates.
    #[must_use]
    pub fn frame_geometry(&self, id: WindowId) -> Option<Rect> {
        self.slot(id).map(|i| self.frame[i])
    }

    /// Returns the frame geometry grown by the paint margins (shadows and
    /// other decorations painted outside the frame).
    #[must_use]
    pub fn expanded_geometry(&self, id: WindowId) -> Option<Rect> {
        self.slot(id).map(|i| self.expanded_rect(i))
    }

    /// Returns the window's own opacity.
    #[must_use]
    pub fn opacity(&self, id: WindowId) -> Option<f64> {
        self.slot(id).map(|i| self.opacity[i])
    }

    /// Returns the desktop the window is on, or `None` for all desktops.
    #[must_use]
    pub fn desktop(&self, id: WindowId) -> Option<u32> {
        self.slot(id).and_then(|i| self.desktop[i])
    }

    /// Returns whether the window is visible on `desktop`.
    #[must_use]
    pub fn is_on_desktop(&self, id: WindowId, desktop: u32) -> bool {
        self.slot(id)
            .is_some_and(|i| self.desktop[i].is_none_or(|d| d == desktop))
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self, id: WindowId) -> Option<WindowState> {
        self.slot(id).map(|i| self.state[i])
    }

    /// Returns whether the window is a closed remnant.
    #[must_use]
    pub fn is_closed(&self, id: WindowId) -> bool {
        self.state(id) == Some(WindowState::Closed)
    }

    /// Returns the window manager flags.
    #[must_use]
    pub fn flags(&self, id: WindowId) -> Option<WindowFlags> {
        self.slot(id).map(|i| self.flags[i])
    }

    /// Returns the window this one is transient for.
    #[must_use]
    pub fn transient_for(&self, id: WindowId) -> Option<WindowId> {
        let p = self.transient_for[self.slot(id)?];
        (p != INVALID).then(|| WindowId {
            idx: p,
            generation: self.generation[p as usize],
        })
    }

    /// Returns the desktop currently shown.
    #[must_use]
    pub fn current_desktop(&self) -> u32 {
        self.current_desktop
    }

    // -- Side data (window proxy) --

    /// Reads a side-data slot.
    #[must_use]
    pub fn data(&self, id: WindowId, role: DataRole) -> Option<&DataValue> {
        self.data[self.slot(id)?].get(&role)
    }

    /// Writes a side-data slot; `None` clears it.
    pub fn set_data(&mut self, id: WindowId, role: DataRole, value: Option<DataValue>) -> bool {
        let Some(i) = self.slot(id) else {
            return false;
        };
        match value {
            Some(v) => {
                self.data[i].insert(role, v);
            }
            None => {
                self.data[i].remove(&role);
            }
        }
        true
    }

    /// Returns the windows whose `role` slot holds `value`.
    pub(crate) fn windows_with_data(&self, role: DataRole, value: &DataValue) -> Vec<WindowId> {
        self.stacking_order()
            .filter(|w| self.data[w.idx as usize].get(&role) == Some(value))
            .collect()
    }

    // -- Mutation API (auto-marks dirty) --

    /// Moves or resizes a window. Both the old and the new area repaint.
    pub fn set_frame_geometry(&mut self, id: WindowId, frame: Rect) -> bool {
        let Some(i) = self.slot(id) else {
            return false;
        };
        self.exposed.add_rect(self.expanded_rect(i));
        self.frame[i] = frame;
        self.dirty.mark_with(id.idx, dirty::REPAINT, &EagerPolicy);
        true
    }

    /// Sets the extra area an effect paints outside the frame.
    pub fn set_paint_margins(&mut self, id: WindowId, margins: Insets) -> bool {
        let Some(i) = self.slot(id) else {
            return false;
        };
        self.exposed.add_rect(self.expanded_rect(i));
        self.paint_margins[i] = margins;
        self.dirty.mark_with(id.idx, dirty::REPAINT, &EagerPolicy);
        true
    }

    /// Sets the window's own opacity.
    pub fn set_opacity(&mut self, id: WindowId, opacity: f64) -> bool {
        let Some(i) = self.slot(id) else {
            return false;
        };
        self.opacity[i] = opacity.clamp(0.0, 1.0);
        self.dirty.mark(id.idx, dirty::REPAINT);
        true
    }

    /// Places the window on a desktop (`None` for all desktops).
    pub fn set_desktop(&mut self, id: WindowId, desktop: Option<u32>) -> bool {
        let Some(i) = self.slot(id) else {
            return false;
        };
        self.desktop[i] = desktop;
        self.dirty.mark_with(id.idx, dirty::REPAINT, &EagerPolicy);
        true
    }

    /// Switches the desktop currently shown. Everything repaints.
    pub fn set_current_desktop(&mut self, desktop: u32) {
        self.current_desktop = desktop;
        self.exposed = Region::Full;
    }

    /// Sets the window manager flags.
    pub fn set_flags(&mut self, id: WindowId, flags: WindowFlags) -> bool {
        let Some(i) = self.slot(id) else {
            return false;
        };
        self.flags[i] = flags;
        self.dirty.mark_with(id.idx, dirty::REPAINT, &EagerPolicy);
        true
    }

    /// Turns a live window into a closed remnant.
    pub(crate) fn mark_closed(&mut self, id: WindowId) -> bool {
        let Some(i) = self.slot(id) else {
            return false;
        };
        if self.state[i] != WindowState::Live {
            return false;
        }
        self.state[i] = WindowState::Closed;
        self.dirty.mark_with(id.idx, dirty::REPAINT, &EagerPolicy);
        true
    }

    /// Links `child` to `parent` so parent repaints reach it, or unlinks it.
    pub fn set_transient_for(&mut self, child: WindowId, parent: Option<WindowId>) -> bool {
        let Some(c) = self.slot(child) else {
            return false;
        };
        let old = self.transient_for[c];
        if old != INVALID {
            self.dirty.remove_dependency(child.idx, old, dirty::REPAINT);
            self.transient_for[c] = INVALID;
        }
        if let Some(parent) = parent {
            if self.slot(parent).is_none() || self.is_transient_ancestor(child.idx, parent.idx) {
                return false;
            }
            let _ = self
                .dirty
                .add_dependency(child.idx, parent.idx, dirty::REPAINT);
            self.transient_for[c] = parent.idx;
        }
        true
    }

    /// Records changed content inside `rect` (window-local coordinates).
    pub fn add_damage(&mut self, id: WindowId, rect: Rect) -> bool {
        let Some(i) = self.slot(id) else {
            return false;
        };
        self.damage[i].add_rect(rect);
        self.dirty.mark(id.idx, dirty::DAMAGE);
        true
    }

    /// Requests a repaint of `rect` (window-local coordinates).
    pub fn add_repaint(&mut self, id: WindowId, rect: Rect) -> bool {
        self.add_damage(id, rect)
    }

    /// Requests a repaint of the whole window, its paint margins, and its
    /// transients.
    pub fn add_repaint_full(&mut self, id: WindowId) -> bool {
        if self.slot(id).is_none() {
            return false;
        }
        self.dirty.mark_with(id.idx, dirty::REPAINT, &EagerPolicy);
        true
    }

    /// Drains all pending damage into one screen-space region.
    pub fn collect_damage(&mut self) -> Region {
        let mut region = mem::take(&mut self.exposed);

        let damaged: Vec<u32> = self
            .dirty
            .drain(dirty::DAMAGE)
            .deterministic()
            .run()
            .collect();
        for idx in damaged {
            let i = idx as usize;
            if idx >= self.len || self.free_list.contains(&idx) {
                continue;
            }
            let origin = self.frame[i].origin().to_vec2();
            let local = mem::take(&mut self.damage[i]);
            match local {
                Region::Full => region.add_rect(self.expanded_rect(i)),
                other => region.merge(&other.translated(origin)),
            }
        }

        let mut repainted: Vec<u32> = self
            .dirty
            .drain(dirty::REPAINT)
            .affected()
            .deterministic()
            .run()
            .collect();
        repainted.extend(self.dirty.drain(dirty::STACKING).deterministic().run());
        for idx in repainted {
            if idx >= self.len || self.free_list.contains(&idx) {
                continue;
            }
            region.add_rect(self.expanded_rect(idx as usize));
        }

        region
    }

    // -- Internal helpers --

    /// Whether `ancestor` is reachable from `idx` (inclusive) through
    /// transient-for links.
    fn is_transient_ancestor(&self, ancestor: u32, mut idx: u32) -> bool {
        while idx != INVALID {
            if idx == ancestor {
                return true;
            }
            idx = self.transient_for[idx as usize];
        }
        false
    }

    fn expanded_rect(&self, i: usize) -> Rect {
        self.frame[i] + self.paint_margins[i]
    }

    /// Resolves a handle to a slot index if it is current.
    #[inline]
    pub(crate) fn slot(&self, id: WindowId) -> Option<usize> {
        let i = id.idx as usize;
        let current = id.idx < self.len
            && self.generation[i] == id.generation
            && !self.free_list.contains(&id.idx);
        current.then_some(i)
    }

    /// Returns the offset from screen to window-local coordinates.
    #[must_use]
    pub fn origin(&self, id: WindowId) -> Option<Vec2> {
        self.slot(id).map(|i| self.frame[i].origin().to_vec2())
    }
}
