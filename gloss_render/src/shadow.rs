// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shadow tiling.
//!
//! A shadow is eight tiles packed into one texture: four corners, four
//! edges. For a given window size, [`Shadow::build_quads`] places the
//! corners at the outer corners of the shadow area (window frame grown by
//! the shadow offsets) and stretches the edges between them.
//!
//! When the window is too small for the corners to fit side by side, each
//! overlapping pair is split at the middle of the overlap so the two tiles
//! meet exactly. An edge squeezed to nothing between its corners is
//! dropped.
//!
//! ```text
//!   ┌────┬──────────┬────┐
//!   │ TL │   top    │ TR │   texture layout: corners at the texture
//!   ├────┼──────────┼────┤   corners, edges in between, inner rect
//!   │left│  (inner) │rght│   unused
//!   ├────┼──────────┼────┤
//!   │ BL │  bottom  │ BR │
//!   └────┴──────────┴────┘
//! ```

use alloc::vec::Vec;

use gloss_core::quad::{QuadKind, QuadList, WindowQuad};
use kurbo::{Insets, Rect, Size};

/// Windows narrower or shorter than this get no shadow.
pub const MIN_WINDOW_SIZE: f64 = 5.0;

/// The pixel sizes of the eight shadow tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShadowTiles {
    /// Top-left corner.
    pub top_left: Size,
    /// Top edge.
    pub top: Size,
    /// Top-right corner.
    pub top_right: Size,
    /// Right edge.
    pub right: Size,
    /// Bottom-right corner.
    pub bottom_right: Size,
    /// Bottom edge.
    pub bottom: Size,
    /// Bottom-left corner.
    pub bottom_left: Size,
    /// Left edge.
    pub left: Size,
}

impl ShadowTiles {
    /// Tiles cut from a square shadow of radius `size` around a one-pixel
    /// inner rectangle.
    #[must_use]
    pub const fn uniform(size: f64) -> Self {
        let corner = Size::new(size, size);
        Self {
            top_left: corner,
            top: Size::new(1.0, size),
            top_right: corner,
            right: Size::new(size, 1.0),
            bottom_right: corner,
            bottom: Size::new(1.0, size),
            bottom_left: corner,
            left: Size::new(size, 1.0),
        }
    }

    /// Width of the widest tile on each side.
    #[must_use]
    pub fn margins(&self) -> Insets {
        Insets::new(
            self.top_left.width.max(self.left.width).max(self.bottom_left.width),
            self.top_left.height.max(self.top.height).max(self.top_right.height),
            self.top_right.width.max(self.right.width).max(self.bottom_right.width),
            self.bottom_right
                .height
                .max(self.bottom.height)
                .max(self.bottom_left.height),
        )
    }

    /// Size of the packed texture.
    #[must_use]
    pub fn texture_size(&self) -> Size {
        let m = self.margins();
        Size::new(
            m.x0 + self.top.width.max(self.bottom.width) + m.x1,
            m.y0 + self.left.height.max(self.right.height) + m.y1,
        )
    }

    /// Whether every tile is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let ts = self.texture_size();
        ts.width <= 0.0 || ts.height <= 0.0
    }
}

/// A window shadow: tile sizes plus how far the shadow reaches past each
/// side of the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Shadow {
    /// Tile sizes.
    pub tiles: ShadowTiles,
    /// Extent outside the frame on each side.
    pub offsets: Insets,
}

impl Shadow {
    /// Creates a shadow.
    #[must_use]
    pub const fn new(tiles: ShadowTiles, offsets: Insets) -> Self {
        Self { tiles, offsets }
    }

    /// Area covered by the shadow for a window of `size`, window-local.
    #[must_use]
    pub fn outer_rect(&self, size: Size) -> Rect {
        Rect::new(
            -self.offsets.x0,
            -self.offsets.y0,
            size.width + self.offsets.x1,
            size.height + self.offsets.y1,
        )
    }

    /// Appends the shadow quads for a window of `size` to `quads`. Returns
    /// how many were added.
    pub fn build_quads(&self, size: Size, quads: &mut QuadList) -> usize {
        let tiled = self.tile(size);
        let n = tiled.len();
        for quad in tiled {
            quads.push(quad);
        }
        n
    }

    /// The shadow quads for a window of `size`: corners first (top-left,
    /// top-right, bottom-right, bottom-left), then edges (top, right,
    /// bottom, left).
    #[must_use]
    pub fn tile(&self, size: Size) -> Vec<WindowQuad> {
        let mut out = Vec::new();
        if size.width < MIN_WINDOW_SIZE || size.height < MIN_WINDOW_SIZE {
            return out;
        }
        let t = &self.tiles;
        let margins = t.margins();
        let outer = self.outer_rect(size);
        let tex = t.texture_size();

        // Missing corners collapse to the inner corner of the margins.
        let corner = |tile: Size, x: f64, y: f64, inner_x: f64, inner_y: f64| {
            if is_empty(tile) {
                Rect::new(inner_x, inner_y, inner_x, inner_y)
            } else {
                Rect::new(x, y, x + tile.width, y + tile.height)
            }
        };
        let mut tl = corner(
            t.top_left,
            outer.x0,
            outer.y0,
            outer.x0 + margins.x0,
            outer.y0 + margins.y0,
        );
        let mut tr = corner(
            t.top_right,
            outer.x1 - t.top_right.width,
            outer.y0,
            outer.x1 - margins.x1,
            outer.y0 + margins.y0,
        );
        let mut br = corner(
            t.bottom_right,
            outer.x1 - t.bottom_right.width,
            outer.y1 - t.bottom_right.height,
            outer.x1 - margins.x1,
            outer.y1 - margins.y1,
        );
        let mut bl = corner(
            t.bottom_left,
            outer.x0,
            outer.y1 - t.bottom_left.height,
            outer.x0 + margins.x0,
            outer.y1 - margins.y1,
        );

        distribute_horizontally(&mut tl, &mut tr);
        distribute_horizontally(&mut bl, &mut br);
        distribute_vertically(&mut tl, &mut bl);
        distribute_vertically(&mut tr, &mut br);

        let mut push = |rect: Rect, tx0: f64, ty0: f64, tx1: f64, ty1: f64| {
            if is_valid(rect) {
                out.push(WindowQuad::new(
                    QuadKind::Shadow,
                    rect,
                    Rect::new(tx0, ty0, tx1, ty1),
                ));
            }
        };

        push(tl, 0.0, 0.0, tl.width() / tex.width, tl.height() / tex.height);
        push(
            tr,
            1.0 - tr.width() / tex.width,
            0.0,
            1.0,
            tr.height() / tex.height,
        );
        push(
            br,
            1.0 - br.width() / tex.width,
            1.0 - br.height() / tex.height,
            1.0,
            1.0,
        );
        push(
            bl,
            0.0,
            1.0 - bl.height() / tex.height,
            bl.width() / tex.width,
            1.0,
        );

        let mut top = Rect::new(tl.x1, outer.y0, tr.x0, outer.y0 + t.top.height);
        let mut right = Rect::new(outer.x1 - t.right.width, tr.y1, outer.x1, br.y0);
        let mut bottom = Rect::new(bl.x1, outer.y1 - t.bottom.height, br.x0, outer.y1);
        let mut left = Rect::new(outer.x0, tl.y1, outer.x0 + t.left.width, bl.y0);

        // Opposite edges can still meet on a tiny window.
        distribute_horizontally(&mut left, &mut right);
        distribute_vertically(&mut top, &mut bottom);

        let tx = margins.x0 / tex.width;
        let ty = margins.y0 / tex.height;
        push(
            top,
            tx,
            0.0,
            tx + t.top.width / tex.width,
            top.height() / tex.height,
        );
        push(
            right,
            1.0 - right.width() / tex.width,
            ty,
            1.0,
            ty + t.right.height / tex.height,
        );
        push(
            bottom,
            tx,
            1.0 - bottom.height() / tex.height,
            tx + t.bottom.width / tex.width,
            1.0,
        );
        push(
            left,
            0.0,
            ty,
            left.width() / tex.width,
            ty + t.left.height / tex.height,
        );
        out
    }
}

fn is_empty(size: Size) -> bool {
    size.width <= 0.0 || size.height <= 0.0
}

// Unlike `Rect::is_zero_area`, an inverted rectangle is also invalid.
fn is_valid(rect: Rect) -> bool {
    rect.x1 > rect.x0 && rect.y1 > rect.y0
}

/// Splits the horizontal overlap of two tiles at its middle.
fn distribute_horizontally(left: &mut Rect, right: &mut Rect) {
    if left.x1 > right.x0 {
        let bounded_right = left.x1.min(right.x1);
        let bounded_left = left.x0.max(right.x0);
        let half = (bounded_right - bounded_left) / 2.0;
        left.x1 = bounded_right - half;
        right.x0 = bounded_left + half;
    }
}

/// Splits the vertical overlap of two tiles at its middle.
fn distribute_vertically(top: &mut Rect, bottom: &mut Rect) {
    if top.y1 > bottom.y0 {
        let bounded_bottom = top.y1.min(bottom.y1);
        let bounded_top = top.y0.max(bottom.y0);
        let half = (bounded_bottom - bounded_top) / 2.0;
        top.y1 = bounded_bottom - half;
        bottom.y0 = bounded_top + half;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        let d = a - b;
        d < 1e-9 && d > -1e-9
    }

    fn same_rect(a: Rect, b: Rect) -> bool {
        close(a.x0, b.x0) && close(a.y0, b.y0) && close(a.x1, b.x1) && close(a.y1, b.y1)
    }

    fn has(quads: &[WindowQuad], rect: Rect, tex: Rect) -> bool {
        quads
            .iter()
            .any(|q| same_rect(q.bounds(), rect) && same_rect(q.tex_rect(), tex))
    }

    fn square(size: f64, offset: f64) -> Shadow {
        Shadow::new(
            ShadowTiles::uniform(size),
            Insets::uniform(offset),
        )
    }

    #[test]
    fn margins_and_texture_size() {
        let tiles = ShadowTiles::uniform(128.0);
        assert_eq!(tiles.margins(), Insets::uniform(128.0));
        assert_eq!(tiles.texture_size(), Size::new(257.0, 257.0));
        assert!(ShadowTiles::default().is_empty(), "no tiles, no texture");
    }

    #[test]
    fn tiny_windows_get_no_shadow() {
        let s = square(64.0, 32.0);
        assert!(s.tile(Size::new(4.0, 100.0)).is_empty());
        assert!(s.tile(Size::new(100.0, 4.9)).is_empty());
        assert_eq!(s.tile(Size::new(5.0, 5.0)).len(), 4, "corners only");
    }

    #[test]
    fn roomy_window_gets_eight_tiles() {
        let s = square(128.0, 64.0);
        let quads = s.tile(Size::new(400.0, 300.0));
        assert_eq!(quads.len(), 8);
        assert!(quads.iter().all(|q| q.kind == QuadKind::Shadow));
        let tw = 1.0 / 257.0;
        let t = 128.0 / 257.0;
        assert!(
            has(
                &quads,
                Rect::new(-64.0, -64.0, 64.0, 64.0),
                Rect::new(0.0, 0.0, t, t)
            ),
            "top-left corner"
        );
        assert!(
            has(
                &quads,
                Rect::new(64.0, -64.0, 336.0, 64.0),
                Rect::new(t, 0.0, t + tw, t)
            ),
            "top edge stretched between the corners"
        );
        assert!(
            has(
                &quads,
                Rect::new(336.0, 236.0, 464.0, 364.0),
                Rect::new(1.0 - t, 1.0 - t, 1.0, 1.0)
            ),
            "bottom-right corner"
        );
    }

    #[test]
    fn overlapping_corners_meet_without_gap() {
        // Corners fit exactly at width 128; one pixel less and they overlap.
        let s = square(128.0, 64.0);
        let at = s.tile(Size::new(128.0, 300.0));
        assert_eq!(at.len(), 6, "top and bottom edges have no room");

        let under = s.tile(Size::new(127.0, 300.0));
        assert_eq!(under.len(), 6);
        let t = 128.0 / 257.0;
        let clipped = 127.5 / 257.0;
        assert!(
            has(
                &under,
                Rect::new(-64.0, -64.0, 63.5, 64.0),
                Rect::new(0.0, 0.0, clipped, t)
            ),
            "top-left clipped at the middle of the overlap"
        );
        assert!(
            has(
                &under,
                Rect::new(63.5, -64.0, 191.0, 64.0),
                Rect::new(1.0 - clipped, 0.0, 1.0, t)
            ),
            "top-right starts where top-left ends"
        );
        let outer = s.outer_rect(Size::new(127.0, 300.0));
        let spans: f64 = under
            .iter()
            .filter(|q| close(q.bounds().y0, -64.0))
            .map(|q| q.bounds().width())
            .sum();
        assert!(close(spans, outer.width()), "no gap, no overlap");
    }

    #[test]
    fn edges_without_corners() {
        let tiles = ShadowTiles {
            top: Size::new(1.0, 128.0),
            right: Size::new(128.0, 1.0),
            bottom: Size::new(1.0, 128.0),
            left: Size::new(128.0, 1.0),
            ..ShadowTiles::default()
        };
        let s = Shadow::new(tiles, Insets::uniform(128.0));
        let quads = s.tile(Size::new(512.0, 512.0));
        assert_eq!(quads.len(), 4);
        let a = 128.0 / 257.0;
        let b = 129.0 / 257.0;
        assert!(has(&quads, Rect::new(0.0, -128.0, 512.0, 0.0), Rect::new(a, 0.0, b, a)));
        assert!(has(&quads, Rect::new(512.0, 0.0, 640.0, 512.0), Rect::new(b, a, 1.0, b)));
        assert!(has(&quads, Rect::new(0.0, 512.0, 512.0, 640.0), Rect::new(a, b, b, 1.0)));
        assert!(has(&quads, Rect::new(-128.0, 0.0, 0.0, 512.0), Rect::new(0.0, a, a, b)));
    }

    #[test]
    fn huge_corners_are_distributed() {
        let big = Size::new(512.0, 512.0);
        let tiles = ShadowTiles {
            top_left: big,
            top_right: big,
            ..ShadowTiles::default()
        };
        let s = Shadow::new(tiles, Insets::new(256.0, 256.0, 256.0, 0.0));
        let quads = s.tile(Size::new(64.0, 64.0));
        assert_eq!(quads.len(), 2);
        assert!(has(
            &quads,
            Rect::new(-256.0, -256.0, 32.0, 64.0),
            Rect::new(0.0, 0.0, 288.0 / 1024.0, 320.0 / 512.0)
        ));
        assert!(has(
            &quads,
            Rect::new(32.0, -256.0, 320.0, 64.0),
            Rect::new(1.0 - 288.0 / 1024.0, 0.0, 1.0, 320.0 / 512.0)
        ));
    }

    #[test]
    fn build_quads_appends() {
        let s = square(16.0, 8.0);
        let mut list = QuadList::for_contents(100.0, 100.0);
        assert_eq!(s.build_quads(Size::new(100.0, 100.0), &mut list), 8);
        assert_eq!(list.len(), 9);
        assert_eq!(list.of_kind(QuadKind::Shadow).count(), 8);
    }
}
