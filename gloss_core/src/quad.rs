// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawable window quads.
//!
//! Before a window is handed to the renderer, the quad stage builds a
//! [`QuadList`]: textured rectangles in window-local coordinates. The base
//! list holds a single [`QuadKind::Contents`] quad over the frame; effects
//! add more (shadow tiles, decorations) or drop some.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Vec2};

/// What a quad samples from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuadKind {
    /// The client's surface.
    Contents,
    /// Server-side decoration.
    Decoration,
    /// A shadow texture tile.
    Shadow,
    /// An effect-private texture.
    Effect,
}

/// One corner of a quad.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowVertex {
    /// Position, window-local.
    pub pos: Point,
    /// Texture coordinate.
    pub tex: Point,
}

/// A textured rectangle.
///
/// Vertices run clockwise from the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowQuad {
    /// Texture source.
    pub kind: QuadKind,
    /// Corners: top-left, top-right, bottom-right, bottom-left.
    pub vertices: [WindowVertex; 4],
}

impl WindowQuad {
    /// Creates a quad covering `rect`, sampling `tex`.
    #[must_use]
    pub fn new(kind: QuadKind, rect: Rect, tex: Rect) -> Self {
        let v = |x: f64, y: f64, u: f64, t: f64| WindowVertex {
            pos: Point::new(x, y),
            tex: Point::new(u, t),
        };
        Self {
            kind,
            vertices: [
                v(rect.x0, rect.y0, tex.x0, tex.y0),
                v(rect.x1, rect.y0, tex.x1, tex.y0),
                v(rect.x1, rect.y1, tex.x1, tex.y1),
                v(rect.x0, rect.y1, tex.x0, tex.y1),
            ],
        }
    }

    /// Returns the bounding rectangle of the vertex positions.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        let mut r = Rect::from_points(self.vertices[0].pos, self.vertices[2].pos);
        for v in &self.vertices {
            r = r.union_pt(v.pos);
        }
        r
    }

    /// Returns the texture rectangle (top-left to bottom-right vertex).
    #[must_use]
    pub fn tex_rect(&self) -> Rect {
        Rect::from_points(self.vertices[0].tex, self.vertices[2].tex)
    }

    /// Moves every vertex by `offset`.
    pub fn translate(&mut self, offset: Vec2) {
        for v in &mut self.vertices {
            v.pos += offset;
        }
    }
}

/// The quads making up one window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuadList {
    quads: Vec<WindowQuad>,
}

impl QuadList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The base list for a window of the given size: one contents quad.
    #[must_use]
    pub fn for_contents(width: f64, height: f64) -> Self {
        let mut list = Self::new();
        list.push(WindowQuad::new(
            QuadKind::Contents,
            Rect::new(0.0, 0.0, width, height),
            Rect::new(0.0, 0.0, 1.0, 1.0),
        ));
        list
    }

    /// Appends a quad.
    pub fn push(&mut self, quad: WindowQuad) {
        self.quads.push(quad);
    }

    /// Returns the quads in draw order.
    #[must_use]
    pub fn as_slice(&self) -> &[WindowQuad] {
        &self.quads
    }

    /// Returns the number of quads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    /// Returns `true` if there are no quads.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Returns the quads of one kind.
    pub fn of_kind(&self, kind: QuadKind) -> impl Iterator<Item = &WindowQuad> + '_ {
        self.quads.iter().filter(move |q| q.kind == kind)
    }

    /// Drops every quad of one kind.
    pub fn remove_kind(&mut self, kind: QuadKind) {
        self.quads.retain(|q| q.kind != kind);
    }

    /// Moves every quad by `offset`.
    pub fn translate(&mut self, offset: Vec2) {
        for q in &mut self.quads {
            q.translate(offset);
        }
    }

    /// Returns the union of all quad bounds.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        self.quads
            .iter()
            .map(WindowQuad::bounds)
            .reduce(|a, b| a.union(b))
    }
}

impl Extend<WindowQuad> for QuadList {
    fn extend<I: IntoIterator<Item = WindowQuad>>(&mut self, iter: I) {
        self.quads.extend(iter);
    }
}
