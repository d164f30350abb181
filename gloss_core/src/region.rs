// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Screen regions for damage and repaint tracking.
//!
//! A [`Region`] is a union of axis-aligned rectangles in screen space. It is
//! deliberately simple: rectangles are kept as a list and only coalesced
//! when one fully contains another. Backends that need a canonical band
//! decomposition can derive it from [`Region::rects`].

use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Rect, Vec2};

/// A set of screen pixels that need (re)painting.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Region {
    /// Nothing needs painting.
    #[default]
    Empty,
    /// A union of non-empty rectangles.
    Rects(Vec<Rect>),
    /// The whole output.
    Full,
}

impl Region {
    /// Creates a region covering a single rectangle.
    ///
    /// Rectangles with zero area produce an empty region.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        if has_area(rect) {
            Self::Rects(vec![rect.abs()])
        } else {
            Self::Empty
        }
    }

    /// Returns `true` if no pixels are covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns `true` if this region covers the whole output.
    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }

    /// Returns the rectangles making up the region.
    ///
    /// [`Region::Full`] has no explicit rectangles; resolve it against the
    /// output bounds first with [`resolve`](Self::resolve).
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        match self {
            Self::Rects(rects) => rects,
            Self::Empty | Self::Full => &[],
        }
    }

    /// Adds a rectangle to the region.
    pub fn add_rect(&mut self, rect: Rect) {
        if !has_area(rect) {
            return;
        }
        let rect = rect.abs();
        match self {
            Self::Full => {}
            Self::Empty => *self = Self::Rects(vec![rect]),
            Self::Rects(rects) => {
                if rects.iter().any(|r| contains(*r, rect)) {
                    return;
                }
                rects.retain(|r| !contains(rect, *r));
                rects.push(rect);
            }
        }
    }

    /// Merges another region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&*self, other) {
            (Self::Full, _) | (_, Self::Full) => *self = Self::Full,
            (Self::Empty, _) => *self = other.clone(),
            (_, Self::Empty) => {}
            (Self::Rects(_), Self::Rects(b)) => {
                for rect in b {
                    self.add_rect(*rect);
                }
            }
        }
    }

    /// Returns whether any part of `rect` is covered.
    #[must_use]
    pub fn intersects(&self, rect: Rect) -> bool {
        if !has_area(rect) {
            return false;
        }
        match self {
            Self::Empty => false,
            Self::Full => true,
            Self::Rects(rects) => rects.iter().any(|r| has_area(r.intersect(rect))),
        }
    }

    /// Returns the part of this region that lies inside `bounds`.
    #[must_use]
    pub fn clipped_to(&self, bounds: Rect) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Full => Self::from_rect(bounds),
            Self::Rects(rects) => {
                let mut out = Self::Empty;
                for r in rects {
                    out.add_rect(r.intersect(bounds));
                }
                out
            }
        }
    }

    /// Replaces [`Region::Full`] with the explicit output bounds.
    #[must_use]
    pub fn resolve(&self, output: Rect) -> Self {
        match self {
            Self::Full => Self::from_rect(output),
            _ => self.clone(),
        }
    }

    /// Returns the region moved by `offset`.
    ///
    /// [`Region::Full`] is unaffected.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        match self {
            Self::Rects(rects) => Self::Rects(rects.iter().map(|r| *r + offset).collect()),
            other => other.clone(),
        }
    }

    /// Returns the smallest rectangle covering the region, using `output`
    /// for [`Region::Full`]. Empty regions yield `None`.
    #[must_use]
    pub fn bounding_box(&self, output: Rect) -> Option<Rect> {
        match self {
            Self::Empty => None,
            Self::Full => Some(output),
            Self::Rects(rects) => rects.iter().copied().reduce(|a, b| a.union(b)),
        }
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Self::from_rect(rect)
    }
}

fn has_area(rect: Rect) -> bool {
    rect.width() != 0.0 && rect.height() != 0.0
}

/// Whether `outer` fully covers `inner`. Both must be normalized.
fn contains(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}
