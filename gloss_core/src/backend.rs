// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer contract for rasterizing backends.
//!
//! Gloss does not rasterize anything itself. A backend provides the
//! following pieces:
//!
//! - **Tick source**: produces [`FrameTick`] values from the platform's
//!   display clock (vblank, presentation feedback, a timer in headless
//!   tests). Not abstracted by a trait because setup differs fundamentally
//!   across platforms.
//!
//! - **Renderer**: implements the [`Renderer`] trait to draw the quads that
//!   survive the effect chain.
//!
//! # Crate boundaries
//!
//! `gloss_core` owns the window list, scheduling, the effect chain, and
//! this contract module. `gloss_render` provides a recording renderer and
//! shadow tiling; real GPU backends live outside the workspace and depend
//! on `gloss_core` only.
//!
//! [`FrameTick`]: crate::timing::FrameTick

use crate::error::RenderError;
use crate::paint::{ScreenPaintData, WindowPaintData};
use crate::quad::QuadList;
use crate::region::Region;
use crate::scheduler::FramePlan;
use crate::window::WindowId;

/// Draws one frame's worth of window quads.
///
/// The compositor calls the methods in this order for a frame that gets
/// past the screen paint stage:
///
/// ```rust,ignore
/// renderer.begin_frame(&plan)?;
/// renderer.paint_background(&region, &screen);
/// for window in painted_windows_bottom_to_top {
///     renderer.draw_window(window, &quads, &region, &data);
/// }
/// renderer.end_frame()?;
/// ```
///
/// A frame whose screen paint was suppressed only sees `begin_frame` and
/// `end_frame`. An error from either ends the frame as
/// [`FrameOutcome::Failed`](crate::timing::FrameOutcome::Failed), which
/// keeps its damage pending.
pub trait Renderer {
    /// Starts a frame.
    fn begin_frame(&mut self, plan: &FramePlan) -> Result<(), RenderError>;

    /// Clears or paints the desktop background inside `region`.
    fn paint_background(&mut self, region: &Region, screen: &ScreenPaintData);

    /// Draws one window's quads with its final paint data.
    fn draw_window(
        &mut self,
        window: WindowId,
        quads: &QuadList,
        region: &Region,
        data: &WindowPaintData,
    );

    /// Finishes the frame and hands it to the display.
    fn end_frame(&mut self) -> Result<(), RenderError>;
}
