// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data passed through the paint stages.
//!
//! Each stage hands a mutable data record down the effect chain. Effects
//! compose their contribution onto what earlier effects set (multiplying
//! opacity, adding translation, ...) and forward the call. Whatever reaches
//! the end of the chain is what gets drawn.

use bitflags::bitflags;
use kurbo::{Affine, Point, Rect, Vec2};

use crate::region::Region;

bitflags! {
    /// Flags describing how a screen or window pass is painted.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PaintMask: u32 {
        /// The window is opaque; nothing below it needs painting.
        const WINDOW_OPAQUE = 1 << 0;
        /// The window is (partly) translucent.
        const WINDOW_TRANSLUCENT = 1 << 1;
        /// The window is scaled, moved or rotated.
        const WINDOW_TRANSFORMED = 1 << 2;
        /// Only the frame's region is painted, not the whole screen.
        const SCREEN_REGION = 1 << 3;
        /// The whole screen is transformed.
        const SCREEN_TRANSFORMED = 1 << 4;
        /// At least one window is transformed; the whole screen repaints.
        const SCREEN_WITH_TRANSFORMED_WINDOWS = 1 << 5;
        /// Clear the background before painting windows.
        const SCREEN_BACKGROUND_FIRST = 1 << 6;
    }
}

bitflags! {
    /// Reasons a window is not painted this frame.
    ///
    /// The compositor sets these before window pre-paint. An effect that
    /// animates a disappearing window lifts the matching reason so the
    /// window stays visible until the animation ends.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PaintDisabled: u32 {
        /// The window is a closed remnant.
        const DELETED = 1 << 0;
        /// The window is minimized.
        const MINIMIZED = 1 << 1;
        /// The window is hidden.
        const HIDDEN = 1 << 2;
        /// The window is on another desktop.
        const DESKTOP = 1 << 3;
    }
}

/// Screen pre-paint record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScreenPrePaintData {
    /// Paint mode; effects add flags such as `SCREEN_TRANSFORMED`.
    pub mask: PaintMask,
    /// Area to paint. Effects may grow it.
    pub paint: Region,
}

/// Screen paint record: a transform applied to everything drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPaintData {
    /// Scale about the screen origin.
    pub scale: Vec2,
    /// Translation applied after scaling.
    pub translation: Vec2,
}

impl Default for ScreenPaintData {
    fn default() -> Self {
        Self {
            scale: Vec2::new(1.0, 1.0),
            translation: Vec2::ZERO,
        }
    }
}

impl ScreenPaintData {
    /// Returns the screen transform.
    #[must_use]
    pub fn transform(&self) -> Affine {
        Affine::translate(self.translation) * Affine::scale_non_uniform(self.scale.x, self.scale.y)
    }
}

/// Window pre-paint record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WindowPrePaintData {
    /// Paint mode.
    pub mask: PaintMask,
    /// Area of the window to paint, in screen coordinates.
    pub paint: Region,
    /// Area covered by the window's opaque parts.
    pub clip: Region,
    /// Reasons the window is skipped. Empty means it is painted.
    pub disabled: PaintDisabled,
}

impl WindowPrePaintData {
    /// Marks the window translucent: it no longer hides what is below it.
    pub fn set_translucent(&mut self) {
        self.mask.remove(PaintMask::WINDOW_OPAQUE);
        self.mask.insert(PaintMask::WINDOW_TRANSLUCENT);
        self.clip = Region::Empty;
    }

    /// Marks the window transformed.
    pub fn set_transformed(&mut self) {
        self.mask.insert(PaintMask::WINDOW_TRANSFORMED);
        self.clip = Region::Empty;
    }

    /// Lifts a paint-disabled reason.
    pub fn enable_painting(&mut self, reason: PaintDisabled) {
        self.disabled.remove(reason);
    }

    /// Returns whether the window will be painted.
    #[must_use]
    pub fn is_painted(&self) -> bool {
        self.disabled.is_empty()
    }
}

/// Window paint record: the accumulated look of one window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowPaintData {
    /// Opacity multiplier.
    pub opacity: f64,
    /// Brightness multiplier.
    pub brightness: f64,
    /// Saturation multiplier.
    pub saturation: f64,
    /// Scale about the window's top-left corner.
    pub scale: Vec2,
    /// Translation in screen pixels.
    pub translation: Vec2,
    /// Rotation in radians.
    pub rotation: f64,
    /// Rotation center, relative to the window's top-left corner.
    pub rotation_origin: Point,
    /// Progress of a cross-fade to a previous window image, `0.0` to `1.0`.
    pub cross_fade: f64,
}

impl Default for WindowPaintData {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            brightness: 1.0,
            saturation: 1.0,
            scale: Vec2::new(1.0, 1.0),
            translation: Vec2::ZERO,
            rotation: 0.0,
            rotation_origin: Point::ORIGIN,
            cross_fade: 0.0,
        }
    }
}

impl WindowPaintData {
    /// Creates paint data starting from a window's own opacity.
    #[must_use]
    pub fn with_opacity(opacity: f64) -> Self {
        Self {
            opacity,
            ..Self::default()
        }
    }

    /// Multiplies the opacity; returns the new value.
    pub fn multiply_opacity(&mut self, factor: f64) -> f64 {
        self.opacity *= factor;
        self.opacity
    }

    /// Multiplies the brightness; returns the new value.
    pub fn multiply_brightness(&mut self, factor: f64) -> f64 {
        self.brightness *= factor;
        self.brightness
    }

    /// Multiplies the saturation; returns the new value.
    pub fn multiply_saturation(&mut self, factor: f64) -> f64 {
        self.saturation *= factor;
        self.saturation
    }

    /// Multiplies the scale per axis.
    pub fn multiply_scale(&mut self, factor: Vec2) {
        self.scale = Vec2::new(self.scale.x * factor.x, self.scale.y * factor.y);
    }

    /// Adds a translation.
    pub fn translate(&mut self, offset: Vec2) {
        self.translation += offset;
    }

    /// Returns whether any geometric change is applied.
    #[must_use]
    pub fn is_transformed(&self) -> bool {
        self.scale != Vec2::new(1.0, 1.0) || self.translation != Vec2::ZERO || self.rotation != 0.0
    }

    /// Returns the transform mapping window-local coordinates to the
    /// screen, for a window whose frame is `frame`.
    #[must_use]
    pub fn transform(&self, frame: Rect) -> Affine {
        let origin = frame.origin().to_vec2();
        Affine::translate(origin + self.translation)
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
            * Affine::rotate_about(self.rotation, self.rotation_origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipliers_compose() {
        let mut data = WindowPaintData::with_opacity(0.8);
        assert_eq!(data.multiply_opacity(0.5), 0.4);
        data.multiply_brightness(0.5);
        data.multiply_brightness(0.5);
        assert_eq!(data.brightness, 0.25, "second effect composes on the first");
        assert_eq!(data.saturation, 1.0, "untouched");
    }

    #[test]
    fn translucency_drops_the_clip() {
        let mut data = WindowPrePaintData {
            mask: PaintMask::WINDOW_OPAQUE,
            clip: Region::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
            ..WindowPrePaintData::default()
        };
        data.set_translucent();
        assert!(data.mask.contains(PaintMask::WINDOW_TRANSLUCENT));
        assert!(!data.mask.contains(PaintMask::WINDOW_OPAQUE));
        assert!(data.clip.is_empty(), "translucent windows hide nothing");
    }

    #[test]
    fn lifting_a_disable_reason() {
        let mut data = WindowPrePaintData {
            disabled: PaintDisabled::DELETED | PaintDisabled::DESKTOP,
            ..WindowPrePaintData::default()
        };
        data.enable_painting(PaintDisabled::DELETED);
        assert!(!data.is_painted(), "still on another desktop");
        data.enable_painting(PaintDisabled::DESKTOP);
        assert!(data.is_painted());
    }

    #[test]
    fn window_transform_places_the_frame() {
        let mut data = WindowPaintData::default();
        data.multiply_scale(Vec2::new(2.0, 2.0));
        data.translate(Vec2::new(5.0, 0.0));
        assert!(data.is_transformed());

        let frame = Rect::new(100.0, 100.0, 150.0, 150.0);
        let p = data.transform(frame) * Point::new(10.0, 10.0);
        assert_eq!(p, Point::new(125.0, 120.0), "scaled, moved, then placed");
    }
}
