// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-effect animation sets.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;
use kurbo::{Size, Vec2};

use crate::animation::{Direction, Easing, Timeline};
use crate::context::EffectContext;
use crate::paint::{PaintDisabled, PaintMask, ScreenPrePaintData, WindowPaintData, WindowPrePaintData};
use crate::region::Region;
use crate::time::Duration;
use crate::window::WindowId;

/// Identifies one animation, unique for the compositor session.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnimationId(pub(crate) u64);

impl AnimationId {
    /// Returns the raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnimationId({})", self.0)
    }
}

bitflags! {
    /// When a finished animation is dropped from its set.
    ///
    /// With neither flag the animation rests at its end until it is
    /// cancelled.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TerminationFlags: u8 {
        /// Drop once it comes to rest at its source value.
        const AT_SOURCE = 1 << 0;
        /// Drop once it comes to rest at its target value.
        const AT_TARGET = 1 << 1;
    }
}

/// A two-component animated value.
///
/// Single-valued attributes (opacity, rotation, ...) use `x` and mirror it
/// into `y`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FPx2 {
    /// First component.
    pub x: f64,
    /// Second component.
    pub y: f64,
}

impl FPx2 {
    /// Creates a value from both components.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Creates a value with both components equal.
    #[must_use]
    pub const fn splat(v: f64) -> Self {
        Self { x: v, y: v }
    }

    /// Linear interpolation, `t = 0` giving `a`.
    #[must_use]
    pub fn lerp(a: Self, b: Self, t: f64) -> Self {
        Self {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        }
    }

    fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl From<f64> for FPx2 {
    fn from(v: f64) -> Self {
        Self::splat(v)
    }
}

impl From<Vec2> for FPx2 {
    fn from(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Size> for FPx2 {
    fn from(s: Size) -> Self {
        Self::new(s.width, s.height)
    }
}

/// What an animation changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Opacity multiplier.
    Opacity,
    /// Brightness multiplier.
    Brightness,
    /// Saturation multiplier.
    Saturation,
    /// Scale about the window center.
    Scale,
    /// Offset in pixels.
    Translation,
    /// Screen position of the top-left corner.
    Position,
    /// On-screen size; the window is scaled to fit it.
    Size,
    /// Rotation about the window center, in degrees.
    Rotation,
    /// A value with no built-in meaning, read back by the owning effect.
    Generic(u32),
}

impl Attribute {
    /// Returns whether the attribute moves pixels around.
    #[must_use]
    pub const fn is_geometric(self) -> bool {
        matches!(
            self,
            Self::Scale | Self::Translation | Self::Position | Self::Size | Self::Rotation
        )
    }

    /// The value that leaves a window unchanged.
    #[must_use]
    pub const fn neutral(self) -> FPx2 {
        match self {
            Self::Opacity | Self::Brightness | Self::Saturation | Self::Scale => FPx2::splat(1.0),
            Self::Translation | Self::Rotation | Self::Generic(_) => FPx2::splat(0.0),
            // Window-dependent; resolved at start.
            Self::Position | Self::Size => FPx2::splat(0.0),
        }
    }
}

/// Parameters for starting an animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationRequest {
    /// What to animate.
    pub attribute: Attribute,
    /// Target value.
    pub to: FPx2,
    /// Source value; `None` starts from the window's current value.
    pub from: Option<FPx2>,
    /// Run time before speed scaling.
    pub duration: Duration,
    /// Easing; `None` uses the configured default curve.
    pub easing: Option<Easing>,
    /// Wait before starting.
    pub delay: Duration,
    /// Hold the full-screen slot while the animation lives.
    pub full_screen: bool,
    /// Keep a closed window alive while the animation lives.
    pub keep_alive: bool,
}

impl AnimationRequest {
    /// A request with no delay, default easing, and keep-alive on.
    #[must_use]
    pub const fn new(attribute: Attribute, to: FPx2, duration: Duration) -> Self {
        Self {
            attribute,
            to,
            from: None,
            duration,
            easing: None,
            delay: Duration::ZERO,
            full_screen: false,
            keep_alive: true,
        }
    }

    /// Sets the source value.
    #[must_use]
    pub const fn starting_at(mut self, from: FPx2) -> Self {
        self.from = Some(from);
        self
    }

    /// Sets the easing.
    #[must_use]
    pub const fn easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    /// Sets the start delay.
    #[must_use]
    pub const fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Requests the full-screen slot.
    #[must_use]
    pub const fn full_screen(mut self, full_screen: bool) -> Self {
        self.full_screen = full_screen;
        self
    }

    /// Sets whether closed windows are kept alive.
    #[must_use]
    pub const fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}

/// One live animation.
#[derive(Clone, Debug, PartialEq)]
pub struct AniData {
    id: AnimationId,
    /// What is animated.
    pub attribute: Attribute,
    /// Value at timeline position 0.
    pub from: FPx2,
    /// Value at timeline position 1.
    pub to: FPx2,
    /// Progress.
    pub timeline: Timeline,
    /// When to drop the animation.
    pub terminate: TerminationFlags,
    /// Remaining start delay.
    pub delay: Duration,
    full_screen: bool,
    keep_alive: bool,
    holds_keep_alive: bool,
}

impl AniData {
    /// The animation's id.
    #[must_use]
    pub fn id(&self) -> AnimationId {
        self.id
    }

    /// The current value.
    #[must_use]
    pub fn value(&self) -> FPx2 {
        FPx2::lerp(self.from, self.to, self.timeline.value())
    }

    /// Whether the start delay has run out.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.delay.is_zero()
    }

    /// Whether the animation holds the full-screen slot.
    #[must_use]
    pub fn is_full_screen(&self) -> bool {
        self.full_screen
    }

    /// Whether the animation should be dropped now.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        if !self.timeline.done() {
            return false;
        }
        let pos = self.timeline.position();
        (pos >= 1.0 && self.terminate.contains(TerminationFlags::AT_TARGET))
            || (pos <= 0.0 && self.terminate.contains(TerminationFlags::AT_SOURCE))
    }

    fn advance(&mut self, mut delta: Duration) {
        if !self.delay.is_zero() {
            if delta <= self.delay {
                self.delay = self.delay - delta;
                return;
            }
            delta = delta - self.delay;
            self.delay = Duration::ZERO;
        }
        self.timeline.advance(delta);
    }

    fn retarget(&mut self, to: FPx2, duration: Duration) {
        let current = self.value();
        if self.timeline.done() {
            self.restart(current, to, duration);
            return;
        }
        self.timeline.set_direction(Direction::Forward);
        self.timeline.set_duration(duration);
        let v = self.timeline.value();
        if v >= 1.0 || self.timeline.done() {
            self.restart(current, to, duration);
            return;
        }
        // Rebase the source so `from + (to - from) * v` stays at `current`.
        let rebase = |cur: f64, target: f64| (cur - target * v) / (1.0 - v);
        self.from = FPx2::new(rebase(current.x, to.x), rebase(current.y, to.y));
        self.to = to;
    }

    fn restart(&mut self, from: FPx2, to: FPx2, duration: Duration) {
        self.from = from;
        self.to = to;
        self.timeline.set_direction(Direction::Forward);
        self.timeline.set_duration(duration);
        self.timeline.reset();
    }
}

/// The animations one effect runs, keyed by window.
///
/// Bookkeeping is sparse: a window appears only while it has at least one
/// animation. Within a window, animations keep insertion order, which is
/// also the order they are applied in when painting.
///
/// The engine does not schedule frames by itself. The owning effect calls
/// the `*_paint_*` helpers from its stage hooks, which advance timelines,
/// apply values, drop finished animations, and request the repaints that
/// keep frames coming while anything is running.
#[derive(Clone, Debug, Default)]
pub struct AnimationEngine {
    sets: BTreeMap<WindowId, Vec<AniData>>,
}

impl AnimationEngine {
    /// Creates an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any window is animated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.sets.is_empty()
    }

    /// Whether `window` has animations.
    #[must_use]
    pub fn is_animating(&self, window: WindowId) -> bool {
        self.sets.contains_key(&window)
    }

    /// The animations on `window`, in insertion order.
    #[must_use]
    pub fn animations(&self, window: WindowId) -> &[AniData] {
        self.sets.get(&window).map_or(&[], Vec::as_slice)
    }

    /// The animated windows.
    pub fn windows(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.sets.keys().copied()
    }

    /// Looks up an animation.
    #[must_use]
    pub fn get(&self, id: AnimationId) -> Option<&AniData> {
        self.sets.values().flatten().find(|a| a.id == id)
    }

    /// Current value of an animation.
    #[must_use]
    pub fn value(&self, id: AnimationId) -> Option<FPx2> {
        self.get(id).map(AniData::value)
    }

    // -- Starting --

    /// Starts an animation that is dropped once it finishes at either end.
    ///
    /// Returns `None` if the window is gone or the full-screen slot was
    /// requested and is held by another effect.
    pub fn animate(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        request: AnimationRequest,
    ) -> Option<AnimationId> {
        self.start(cx, window, request, TerminationFlags::all())
    }

    /// Starts an animation that stays at its target until cancelled.
    pub fn set(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        request: AnimationRequest,
    ) -> Option<AnimationId> {
        self.start(cx, window, request, TerminationFlags::empty())
    }

    fn start(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        request: AnimationRequest,
        terminate: TerminationFlags,
    ) -> Option<AnimationId> {
        if !cx.windows().is_alive(window) {
            return None;
        }
        if request.full_screen {
            let owner = cx.current_effect()?;
            if !cx.set_active_full_screen_effect(Some(owner)) {
                return None;
            }
        }

        let from = request
            .from
            .unwrap_or_else(|| current_value(cx, window, request.attribute));
        let easing = request
            .easing
            .unwrap_or_else(|| Easing::from(cx.config().animation_curve));

        let mut anim = AniData {
            id: cx.next_animation_id(),
            attribute: request.attribute,
            from,
            to: request.to,
            timeline: Timeline::new(request.duration, easing),
            terminate,
            delay: request.delay,
            full_screen: request.full_screen,
            keep_alive: request.keep_alive,
            holds_keep_alive: false,
        };
        if anim.keep_alive && cx.windows().is_closed(window) {
            anim.holds_keep_alive = cx.acquire_keep_alive(window);
        }

        let id = anim.id;
        self.sets.entry(window).or_default().push(anim);
        repaint(cx, window, request.full_screen);
        Some(id)
    }

    // -- Steering by id --

    /// Moves an animation toward a new target over `duration`, without
    /// jumping: the elapsed ratio is kept and the source is rebased so the
    /// displayed value stays put. A finished animation restarts from its
    /// current value.
    pub fn retarget(
        &mut self,
        cx: &mut EffectContext,
        id: AnimationId,
        to: FPx2,
        duration: Duration,
    ) -> bool {
        self.with_animation(cx, id, |a| a.retarget(to, duration))
    }

    /// Runs an animation in `direction`, with new termination flags.
    pub fn redirect(
        &mut self,
        cx: &mut EffectContext,
        id: AnimationId,
        direction: Direction,
        terminate: TerminationFlags,
    ) -> bool {
        self.with_animation(cx, id, |a| {
            a.timeline.set_direction(direction);
            a.terminate = terminate;
        })
    }

    /// Finishes an animation now.
    pub fn complete(&mut self, cx: &mut EffectContext, id: AnimationId) -> bool {
        self.with_animation(cx, id, |a| {
            a.delay = Duration::ZERO;
            a.timeline.complete();
        })
    }

    /// Removes an animation, releasing whatever it holds.
    pub fn cancel(&mut self, cx: &mut EffectContext, id: AnimationId) -> bool {
        let Some((window, index)) = self.locate(id) else {
            return false;
        };
        let Some(removed) = self.remove_at(window, index) else {
            return false;
        };
        self.release(cx, window, &removed);
        self.release_full_screen_if_unused(cx);
        repaint(cx, window, removed.full_screen);
        true
    }

    // -- Steering by window and attribute --

    /// [`retarget`](Self::retarget) for every animation of `attribute` on
    /// `window`.
    pub fn retarget_attribute(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        attribute: Attribute,
        to: FPx2,
        duration: Duration,
    ) -> bool {
        self.with_attribute(cx, window, attribute, |a| a.retarget(to, duration))
    }

    /// [`redirect`](Self::redirect) for every animation of `attribute` on
    /// `window`.
    pub fn redirect_attribute(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        attribute: Attribute,
        direction: Direction,
        terminate: TerminationFlags,
    ) -> bool {
        self.with_attribute(cx, window, attribute, |a| {
            a.timeline.set_direction(direction);
            a.terminate = terminate;
        })
    }

    /// [`complete`](Self::complete) for every animation of `attribute` on
    /// `window`.
    pub fn complete_attribute(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        attribute: Attribute,
    ) -> bool {
        self.with_attribute(cx, window, attribute, |a| {
            a.delay = Duration::ZERO;
            a.timeline.complete();
        })
    }

    /// Cancels every animation on `window`.
    pub fn cancel_window(&mut self, cx: &mut EffectContext, window: WindowId) -> bool {
        let Some(anims) = self.sets.remove(&window) else {
            return false;
        };
        let full_screen = anims.iter().any(|a| a.full_screen);
        for a in &anims {
            self.release(cx, window, a);
        }
        self.release_full_screen_if_unused(cx);
        repaint(cx, window, full_screen);
        true
    }

    // -- Stage helpers --

    /// Advances every timeline by the frame time scaled by the animation
    /// speed, and widens the screen pass for geometric animations.
    pub fn pre_paint_screen(
        &mut self,
        cx: &mut EffectContext,
        data: &mut ScreenPrePaintData,
        elapsed: Duration,
    ) {
        let delta = elapsed.mul_f64(cx.animation_speed());
        let mut transformed = false;
        for a in self.sets.values_mut().flatten() {
            a.advance(delta);
            transformed |= a.is_started() && a.attribute.is_geometric();
        }
        if transformed {
            data.mask.insert(PaintMask::SCREEN_WITH_TRANSFORMED_WINDOWS);
            data.paint = Region::Full;
        }
    }

    /// Sets the pass flags for an animated window and keeps closed or
    /// minimized windows visible while they animate.
    pub fn pre_paint_window(
        &self,
        cx: &EffectContext,
        window: WindowId,
        data: &mut WindowPrePaintData,
    ) {
        let Some(anims) = self.sets.get(&window) else {
            return;
        };
        let mut any_started = false;
        for a in anims.iter().filter(|a| a.is_started()) {
            any_started = true;
            match a.attribute {
                Attribute::Opacity if a.value().x < 1.0 => data.set_translucent(),
                attr if attr.is_geometric() => data.set_transformed(),
                _ => {}
            }
        }
        if !any_started {
            return;
        }
        if cx.windows().is_closed(window) {
            data.enable_painting(PaintDisabled::DELETED);
        }
        if cx.windows().flags(window).is_some_and(|f| f.minimized) {
            data.enable_painting(PaintDisabled::MINIMIZED);
        }
    }

    /// Applies the window's started animations to its paint data.
    pub fn paint_window(&self, cx: &EffectContext, window: WindowId, data: &mut WindowPaintData) {
        let Some(anims) = self.sets.get(&window) else {
            return;
        };
        let Some(frame) = cx.windows().frame_geometry(window) else {
            return;
        };
        let size = frame.size();
        let half = Vec2::new(size.width / 2.0, size.height / 2.0);

        for a in anims.iter().filter(|a| a.is_started()) {
            let v = a.value();
            match a.attribute {
                Attribute::Opacity => {
                    data.multiply_opacity(v.x);
                }
                Attribute::Brightness => {
                    data.multiply_brightness(v.x);
                }
                Attribute::Saturation => {
                    data.multiply_saturation(v.x);
                }
                Attribute::Scale => {
                    data.multiply_scale(v.to_vec2());
                    data.translate(Vec2::new(half.x * (1.0 - v.x), half.y * (1.0 - v.y)));
                }
                Attribute::Translation => data.translate(v.to_vec2()),
                Attribute::Position => data.translate(v.to_vec2() - frame.origin().to_vec2()),
                Attribute::Size => {
                    if size.width > 0.0 && size.height > 0.0 {
                        data.multiply_scale(Vec2::new(v.x / size.width, v.y / size.height));
                    }
                }
                Attribute::Rotation => {
                    data.rotation += v.x.to_radians();
                    data.rotation_origin = half.to_point();
                }
                Attribute::Generic(_) => {}
            }
        }
    }

    /// Drops finished animations and requests the next frame for windows
    /// still animating.
    pub fn post_paint_screen(&mut self, cx: &mut EffectContext) {
        let mut finished = Vec::new();
        let mut running = Vec::new();
        for (&window, anims) in &mut self.sets {
            let mut i = 0;
            while i < anims.len() {
                if anims[i].is_terminated() {
                    finished.push((window, anims.remove(i)));
                } else {
                    i += 1;
                }
            }
            if anims.iter().any(|a| !a.timeline.done()) {
                let full_screen = anims.iter().any(|a| a.full_screen && !a.timeline.done());
                running.push((window, full_screen));
            }
        }
        self.sets.retain(|_, anims| !anims.is_empty());

        for (window, anim) in &finished {
            self.release(cx, *window, anim);
            repaint(cx, *window, anim.full_screen);
        }
        if !finished.is_empty() {
            self.release_full_screen_if_unused(cx);
        }
        for (window, full_screen) in running {
            repaint(cx, window, full_screen);
        }
    }

    // -- Window lifecycle --

    /// Takes keep-alive references for a window that was just closed.
    pub fn window_closed(&mut self, cx: &mut EffectContext, window: WindowId) {
        let Some(anims) = self.sets.get_mut(&window) else {
            return;
        };
        for a in anims.iter_mut().filter(|a| a.keep_alive && !a.holds_keep_alive) {
            a.holds_keep_alive = cx.acquire_keep_alive(window);
        }
    }

    /// Forgets a destroyed window. Keep-alive references are gone with it.
    pub fn window_deleted(&mut self, cx: &mut EffectContext, window: WindowId) {
        if self.sets.remove(&window).is_some() {
            self.release_full_screen_if_unused(cx);
        }
    }

    // -- Internal helpers --

    fn locate(&self, id: AnimationId) -> Option<(WindowId, usize)> {
        self.sets.iter().find_map(|(&w, anims)| {
            anims.iter().position(|a| a.id == id).map(|i| (w, i))
        })
    }

    fn remove_at(&mut self, window: WindowId, index: usize) -> Option<AniData> {
        let anims = self.sets.get_mut(&window)?;
        let removed = (index < anims.len()).then(|| anims.remove(index));
        if anims.is_empty() {
            self.sets.remove(&window);
        }
        removed
    }

    fn with_animation(
        &mut self,
        cx: &mut EffectContext,
        id: AnimationId,
        f: impl FnOnce(&mut AniData),
    ) -> bool {
        let Some((window, index)) = self.locate(id) else {
            return false;
        };
        let Some(a) = self.sets.get_mut(&window).and_then(|v| v.get_mut(index)) else {
            return false;
        };
        f(a);
        let full_screen = a.full_screen;
        repaint(cx, window, full_screen);
        true
    }

    fn with_attribute(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        attribute: Attribute,
        mut f: impl FnMut(&mut AniData),
    ) -> bool {
        let Some(anims) = self.sets.get_mut(&window) else {
            return false;
        };
        let mut hit = false;
        let mut full_screen = false;
        for a in anims.iter_mut().filter(|a| a.attribute == attribute) {
            f(a);
            hit = true;
            full_screen |= a.full_screen;
        }
        if hit {
            repaint(cx, window, full_screen);
        }
        hit
    }

    fn release(&self, cx: &mut EffectContext, window: WindowId, anim: &AniData) {
        if anim.holds_keep_alive {
            cx.release_keep_alive(window);
        }
    }

    fn release_full_screen_if_unused(&self, cx: &mut EffectContext) {
        let Some(owner) = cx.current_effect() else {
            return;
        };
        let still_used = self.sets.values().flatten().any(|a| a.full_screen);
        if !still_used && cx.active_full_screen_effect() == Some(owner) {
            cx.set_active_full_screen_effect(None);
        }
    }
}

/// The window's on-screen value for `attribute` when nothing animates it.
fn current_value(cx: &EffectContext, window: WindowId, attribute: Attribute) -> FPx2 {
    let windows = cx.windows();
    match attribute {
        Attribute::Opacity => FPx2::splat(windows.opacity(window).unwrap_or(1.0)),
        Attribute::Position => windows
            .frame_geometry(window)
            .map_or(FPx2::default(), |r| r.origin().to_vec2().into()),
        Attribute::Size => windows
            .frame_geometry(window)
            .map_or(FPx2::default(), |r| r.size().into()),
        other => other.neutral(),
    }
}

fn repaint(cx: &mut EffectContext, window: WindowId, full_screen: bool) {
    if full_screen {
        cx.add_repaint_full();
    } else {
        cx.repaint_window(window);
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use crate::config::CompositorConfig;
    use crate::effect::EffectId;

    fn close(a: f64, b: f64) -> bool {
        let d = a - b;
        d < 1e-9 && d > -1e-9
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn setup() -> (EffectContext, WindowId) {
        let mut cx = EffectContext::new(CompositorConfig::desktop());
        let w = cx
            .windows_mut()
            .create_window(Rect::new(100.0, 100.0, 300.0, 200.0));
        (cx, w)
    }

    fn frame(engine: &mut AnimationEngine, cx: &mut EffectContext, effect: EffectId, dt: u64) {
        cx.with_current(effect, |cx| {
            engine.pre_paint_screen(cx, &mut ScreenPrePaintData::default(), ms(dt));
            engine.post_paint_screen(cx);
        });
    }

    #[test]
    fn animate_terminates_and_set_persists() {
        let (mut cx, w) = setup();
        let e = EffectId(1);
        let mut engine = AnimationEngine::new();
        let fade = AnimationRequest::new(Attribute::Opacity, 0.0.into(), ms(100));
        let (a, b) = cx.with_current(e, |cx| {
            (
                engine.animate(cx, w, fade).unwrap(),
                engine.set(cx, w, AnimationRequest::new(Attribute::Brightness, 0.5.into(), ms(100))),
            )
        });
        let b = b.unwrap();
        assert_ne!(a, b, "ids are unique");

        frame(&mut engine, &mut cx, e, 100);
        assert!(engine.get(a).is_none(), "finished animate is dropped");
        assert!(engine.get(b).is_some(), "set holds the target");
        assert!(close(engine.value(b).unwrap().x, 0.5));
    }

    #[test]
    fn from_defaults_to_the_current_value() {
        let (mut cx, w) = setup();
        cx.windows_mut().set_opacity(w, 0.8);
        let mut engine = AnimationEngine::new();
        let id = cx
            .with_current(EffectId(1), |cx| {
                engine.animate(cx, w, AnimationRequest::new(Attribute::Opacity, 0.0.into(), ms(10)))
            })
            .unwrap();
        assert_eq!(engine.get(id).unwrap().from, FPx2::splat(0.8));
    }

    #[test]
    fn retarget_keeps_progress_and_value() {
        let (mut cx, w) = setup();
        let e = EffectId(1);
        let mut engine = AnimationEngine::new();
        let scale = AnimationRequest::new(Attribute::Scale, 1.4.into(), ms(100))
            .starting_at(1.0.into())
            .easing(Easing::Linear);
        let id = cx.with_current(e, |cx| engine.animate(cx, w, scale)).unwrap();

        frame(&mut engine, &mut cx, e, 50);
        assert!(close(engine.value(id).unwrap().x, 1.2));

        cx.with_current(e, |cx| {
            assert!(engine.retarget_attribute(cx, w, Attribute::Scale, 1.5.into(), ms(200)));
        });
        let a = engine.get(id).unwrap();
        assert_eq!(a.timeline.elapsed(), ms(100), "elapsed kept, not reset");
        assert!(close(a.value().x, 1.2), "no jump");

        frame(&mut engine, &mut cx, e, 99);
        assert!(engine.is_animating(w));
        frame(&mut engine, &mut cx, e, 1);
        assert!(!engine.is_animating(w), "set empties once the new target is reached");
    }

    #[test]
    fn redirect_by_id_flips_direction() {
        let (mut cx, w) = setup();
        let e = EffectId(1);
        let mut engine = AnimationEngine::new();
        let id = cx
            .with_current(e, |cx| {
                engine.animate(cx, w, AnimationRequest::new(Attribute::Opacity, 0.0.into(), ms(1000)))
            })
            .unwrap();
        frame(&mut engine, &mut cx, e, 250);
        cx.with_current(e, |cx| {
            assert!(engine.redirect(cx, id, Direction::Backward, TerminationFlags::AT_SOURCE));
        });
        let tl = engine.get(id).unwrap().timeline;
        assert_eq!(tl.direction(), Direction::Backward);
        assert_eq!(tl.elapsed(), ms(750));
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let (mut cx, _) = setup();
        let mut engine = AnimationEngine::new();
        let ghost = AnimationId(99);
        assert!(!engine.complete(&mut cx, ghost));
        assert!(!engine.cancel(&mut cx, ghost));
        assert!(!engine.retarget(&mut cx, ghost, 1.0.into(), ms(10)));
    }

    #[test]
    fn delay_holds_the_animation_back() {
        let (mut cx, w) = setup();
        let e = EffectId(1);
        let mut engine = AnimationEngine::new();
        let req = AnimationRequest::new(Attribute::Opacity, 0.0.into(), ms(100)).delay(ms(50));
        let id = cx.with_current(e, |cx| engine.animate(cx, w, req)).unwrap();

        frame(&mut engine, &mut cx, e, 40);
        assert!(!engine.get(id).unwrap().is_started());
        frame(&mut engine, &mut cx, e, 60);
        let a = engine.get(id).unwrap();
        assert!(a.is_started());
        assert_eq!(a.timeline.elapsed(), ms(50), "leftover frame time counts");
    }

    #[test]
    fn paint_applies_values_in_order() {
        let (mut cx, w) = setup();
        let e = EffectId(1);
        let mut engine = AnimationEngine::new();
        cx.with_current(e, |cx| {
            let half = AnimationRequest::new(Attribute::Opacity, 0.5.into(), Duration::ZERO);
            engine.set(cx, w, half).unwrap();
            engine.set(cx, w, half).unwrap();
            let big = AnimationRequest::new(Attribute::Scale, 2.0.into(), Duration::ZERO);
            engine.set(cx, w, big).unwrap();
        });

        let mut data = WindowPaintData::default();
        engine.paint_window(&cx, w, &mut data);
        assert!(close(data.opacity, 0.25), "multipliers compose");
        assert_eq!(data.scale, Vec2::new(2.0, 2.0));
        assert_eq!(
            data.translation,
            Vec2::new(-100.0, -50.0),
            "scaled about the center of a 200x100 window"
        );
    }

    #[test]
    fn closed_windows_stay_painted_while_animating() {
        let (mut cx, w) = setup();
        let mut engine = AnimationEngine::new();
        cx.windows_mut().mark_closed(w);
        cx.with_current(EffectId(1), |cx| {
            engine.animate(cx, w, AnimationRequest::new(Attribute::Opacity, 0.0.into(), ms(100)))
        });
        assert_eq!(cx.keep_alive_count(w), 1, "closed window kept alive");

        let mut data = WindowPrePaintData {
            disabled: PaintDisabled::DELETED,
            ..WindowPrePaintData::default()
        };
        engine.pre_paint_window(&cx, w, &mut data);
        assert!(data.is_painted());

        frame(&mut engine, &mut cx, EffectId(1), 100);
        assert_eq!(cx.keep_alive_count(w), 0, "released when finished");
    }

    #[test]
    fn full_screen_slot_follows_animations() {
        let (mut cx, w) = setup();
        let (a, b) = (EffectId(1), EffectId(2));
        let mut first = AnimationEngine::new();
        let mut second = AnimationEngine::new();
        let slide = AnimationRequest::new(Attribute::Translation, FPx2::new(100.0, 0.0), ms(100))
            .full_screen(true);

        assert!(cx.with_current(a, |cx| first.animate(cx, w, slide)).is_some());
        assert_eq!(cx.active_full_screen_effect(), Some(a));
        assert!(
            cx.with_current(b, |cx| second.animate(cx, w, slide)).is_none(),
            "slot held by another effect"
        );
        assert!(
            cx.with_current(a, |cx| first.animate(cx, w, slide)).is_some(),
            "holder may add more"
        );

        frame(&mut first, &mut cx, a, 100);
        assert!(!first.is_active());
        assert_eq!(cx.active_full_screen_effect(), None, "released with the last one");
    }
}
