// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: an ordered sequence of draw items for one frame.

use alloc::vec::Vec;

use gloss_core::backend::Renderer;
use gloss_core::error::RenderError;
use gloss_core::paint::{ScreenPaintData, WindowPaintData};
use gloss_core::quad::QuadList;
use gloss_core::region::Region;
use gloss_core::scheduler::FramePlan;
use gloss_core::timing::OutputId;
use gloss_core::window::WindowId;

/// A single draw command in the render plan.
///
/// Items are produced in back-to-front order, matching the stacking order.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderItem {
    /// The window drawn.
    pub window: WindowId,
    /// Quads in window-local coordinates.
    pub quads: QuadList,
    /// Screen area the draw is limited to.
    pub region: Region,
    /// Final paint data after every effect.
    pub data: WindowPaintData,
}

/// Everything drawn for a single frame on a single output.
///
/// Backends translate this into native compositor operations or GPU draw
/// calls depending on their rendering strategy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPlan {
    /// Frame this plan belongs to.
    pub frame_index: u64,
    /// Target output for this plan.
    pub output: OutputId,
    /// Background area and screen transform, if the screen was painted.
    pub background: Option<(Region, ScreenPaintData)>,
    /// Draw items in back-to-front order.
    pub items: Vec<RenderItem>,
}

impl RenderPlan {
    /// Creates an empty render plan for the given frame.
    #[must_use]
    pub fn new(frame_index: u64, output: OutputId) -> Self {
        Self {
            frame_index,
            output,
            background: None,
            items: Vec::new(),
        }
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.background = None;
        self.items.clear();
    }

    /// Windows drawn, bottom to top.
    pub fn windows(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.items.iter().map(|i| i.window)
    }

    /// The item for `window`, if it was drawn.
    #[must_use]
    pub fn item(&self, window: WindowId) -> Option<&RenderItem> {
        self.items.iter().find(|i| i.window == window)
    }

    /// Whether the frame's windows were suppressed.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.background.is_none()
    }
}

/// A [`Renderer`] that records each frame as a [`RenderPlan`].
///
/// Useful for headless sessions and tests; a GPU backend can also build on
/// it and replay the plan.
#[derive(Debug, Default)]
pub struct PlanRecorder {
    current: Option<RenderPlan>,
    last: Option<RenderPlan>,
    presented: u64,
    fail_next: Option<RenderError>,
}

impl PlanRecorder {
    /// Creates a recorder with no frames.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last presented plan.
    #[must_use]
    pub fn last(&self) -> Option<&RenderPlan> {
        self.last.as_ref()
    }

    /// Takes the last presented plan.
    pub fn take_last(&mut self) -> Option<RenderPlan> {
        self.last.take()
    }

    /// Number of frames presented so far.
    #[must_use]
    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Makes the next `end_frame` fail with `error`.
    pub fn fail_next_frame(&mut self, error: RenderError) {
        self.fail_next = Some(error);
    }
}

impl Renderer for PlanRecorder {
    fn begin_frame(&mut self, plan: &FramePlan) -> Result<(), RenderError> {
        let mut current = self.current.take().unwrap_or_default();
        current.clear();
        current.frame_index = plan.frame_index;
        current.output = plan.output;
        self.current = Some(current);
        Ok(())
    }

    fn paint_background(&mut self, region: &Region, screen: &ScreenPaintData) {
        if let Some(plan) = self.current.as_mut() {
            plan.background = Some((region.clone(), *screen));
        }
    }

    fn draw_window(
        &mut self,
        window: WindowId,
        quads: &QuadList,
        region: &Region,
        data: &WindowPaintData,
    ) {
        if let Some(plan) = self.current.as_mut() {
            plan.items.push(RenderItem {
                window,
                quads: quads.clone(),
                region: region.clone(),
                data: *data,
            });
        }
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        if let Some(error) = self.fail_next.take() {
            self.current = None;
            return Err(error);
        }
        let Some(plan) = self.current.take() else {
            return Err(RenderError::Backend("end_frame without begin_frame".into()));
        };
        self.last = Some(plan);
        self.presented += 1;
        Ok(())
    }
}
