// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative effects.
//!
//! A [`Script`] is data: animation lists plus handlers that map a window
//! event to an ordered list of actions. [`ScriptedEffect`] runs it on top of
//! an [`AnimationEngine`], so a scripted fade behaves exactly like a native
//! one: same grabs, same keep-alive, same paint hooks.
//!
//! Animation lists are validated when the effect loads. Each list has a
//! *global* settings object whose fields fill in whatever an entry leaves
//! unset. Index 0 in errors refers to the global object, entries count from
//! 1.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use super::stage::{self, Next};
use super::Effect;
use crate::animation::{
    AnimationEngine, AnimationId, AnimationRequest, Attribute, Direction, Easing, FPx2,
    TerminationFlags,
};
use crate::context::EffectContext;
use crate::error::{LoadError, ScriptError};
use crate::paint::{PaintMask, ScreenPrePaintData, WindowPaintData, WindowPrePaintData};
use crate::region::Region;
use crate::time::Duration;
use crate::window::{DataRole, WindowId};

/// Window events a handler can react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptEvent {
    /// A window was added.
    WindowAdded,
    /// A hidden window was shown.
    WindowShown,
    /// A window was hidden.
    WindowHidden,
    /// A window was closed.
    WindowClosed,
    /// A window was minimized.
    WindowMinimized,
    /// A window was restored.
    WindowUnminimized,
    /// The desktop changed; runs once per window whose visibility differs
    /// between the two desktops.
    DesktopChanged,
}

/// One step of a handler, applied to the event's window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScriptAction {
    /// Grab a role. A refused grab stops the handler.
    Grab {
        /// The role.
        role: DataRole,
        /// Displace the current holder.
        force: bool,
    },
    /// Release a role.
    Ungrab {
        /// The role.
        role: DataRole,
    },
    /// Start every animation of a list; each is dropped when it finishes.
    Animate {
        /// Index into [`Script::animation_sets`].
        set: usize,
    },
    /// Start every animation of a list; each holds its target.
    Set {
        /// Index into [`Script::animation_sets`].
        set: usize,
    },
    /// Retarget running animations of an attribute.
    Retarget {
        /// The attribute.
        attribute: Attribute,
        /// New target.
        to: FPx2,
        /// New duration.
        duration: Duration,
    },
    /// Redirect running animations of an attribute.
    Redirect {
        /// The attribute.
        attribute: Attribute,
        /// New direction.
        direction: Direction,
        /// New termination flags.
        terminate: TerminationFlags,
    },
    /// Finish running animations of an attribute now.
    Complete {
        /// The attribute.
        attribute: Attribute,
    },
    /// Cancel every animation this handler set started on the window.
    Cancel,
}

/// An event and what to do about it.
#[derive(Clone, Debug, PartialEq)]
pub struct Handler {
    /// The trigger.
    pub event: ScriptEvent,
    /// Steps, in order.
    pub actions: Vec<ScriptAction>,
}

impl Handler {
    /// Creates a handler.
    #[must_use]
    pub fn new(event: ScriptEvent, actions: Vec<ScriptAction>) -> Self {
        Self { event, actions }
    }
}

/// Partial animation parameters. Unset fields come from the list's global
/// object, then from defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimationSettings {
    /// What to animate. Required.
    pub attribute: Option<Attribute>,
    /// Target; defaults to the attribute's neutral value.
    pub to: Option<FPx2>,
    /// Source; defaults to the window's current value.
    pub from: Option<FPx2>,
    /// Run time. Required.
    pub duration: Option<Duration>,
    /// Easing; defaults to the configured curve.
    pub easing: Option<Easing>,
    /// Start delay; defaults to none.
    pub delay: Option<Duration>,
    /// Hold the full-screen slot; defaults to `false`.
    pub full_screen: Option<bool>,
    /// Keep closed windows alive; defaults to `true`.
    pub keep_alive: Option<bool>,
}

impl AnimationSettings {
    /// Settings for `attribute` over `duration`.
    #[must_use]
    pub fn new(attribute: Attribute, duration: Duration) -> Self {
        Self {
            attribute: Some(attribute),
            duration: Some(duration),
            ..Self::default()
        }
    }

    /// Fills unset fields from `global`.
    #[must_use]
    pub fn merged_over(&self, global: &Self) -> Self {
        Self {
            attribute: self.attribute.or(global.attribute),
            to: self.to.or(global.to),
            from: self.from.or(global.from),
            duration: self.duration.or(global.duration),
            easing: self.easing.or(global.easing),
            delay: self.delay.or(global.delay),
            full_screen: self.full_screen.or(global.full_screen),
            keep_alive: self.keep_alive.or(global.keep_alive),
        }
    }

    fn to_request(self, index: usize) -> Result<AnimationRequest, ScriptError> {
        let attribute = self.attribute.ok_or(ScriptError::MissingType { index })?;
        let duration = self.duration.ok_or(ScriptError::MissingDuration { index })?;
        Ok(AnimationRequest {
            attribute,
            to: self.to.unwrap_or(attribute.neutral()),
            from: self.from,
            duration,
            easing: self.easing,
            delay: self.delay.unwrap_or(Duration::ZERO),
            full_screen: self.full_screen.unwrap_or(false),
            keep_alive: self.keep_alive.unwrap_or(true),
        })
    }
}

/// A global settings object and the animations it completes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationList {
    /// Shared settings. If it names an attribute, it is an animation too.
    pub global: AnimationSettings,
    /// Per-animation settings.
    pub animations: Vec<AnimationSettings>,
}

impl AnimationList {
    /// A list consisting of the global object alone.
    #[must_use]
    pub fn single(settings: AnimationSettings) -> Self {
        Self {
            global: settings,
            animations: Vec::new(),
        }
    }

    /// Validates the list and produces one request per animation.
    pub fn resolve(&self) -> Result<Vec<AnimationRequest>, ScriptError> {
        let mut entries = Vec::with_capacity(self.animations.len() + 1);
        if self.global.attribute.is_some() {
            entries.push((0, self.global));
        }
        entries.extend(
            self.animations
                .iter()
                .enumerate()
                .map(|(i, a)| (i + 1, a.merged_over(&self.global))),
        );
        if entries.is_empty() {
            return Err(ScriptError::NoAnimations);
        }
        entries
            .into_iter()
            .map(|(index, settings)| settings.to_request(index))
            .collect()
    }
}

/// A declarative effect description.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Script {
    /// Effect name.
    pub name: String,
    /// Chain position.
    pub ordering: i32,
    /// Animation lists referenced by handlers.
    pub animation_sets: Vec<AnimationList>,
    /// Event handlers, run in order.
    pub handlers: Vec<Handler>,
}

/// Runs a [`Script`].
#[derive(Debug)]
pub struct ScriptedEffect {
    script: Script,
    resolved: Vec<Vec<AnimationRequest>>,
    engine: AnimationEngine,
    started: BTreeMap<WindowId, Vec<AnimationId>>,
}

impl ScriptedEffect {
    /// Wraps a script. Validation happens in [`Effect::load`].
    #[must_use]
    pub fn new(script: Script) -> Self {
        Self {
            script,
            resolved: Vec::new(),
            engine: AnimationEngine::new(),
            started: BTreeMap::new(),
        }
    }

    /// The animations this effect runs.
    #[must_use]
    pub fn engine(&self) -> &AnimationEngine {
        &self.engine
    }

    fn validate(&self) -> Result<Vec<Vec<AnimationRequest>>, ScriptError> {
        let sets = self
            .script
            .animation_sets
            .iter()
            .map(AnimationList::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        for action in self.script.handlers.iter().flat_map(|h| &h.actions) {
            if let ScriptAction::Animate { set } | ScriptAction::Set { set } = *action
                && set >= sets.len()
            {
                return Err(ScriptError::UnknownAnimationSet(set));
            }
        }
        Ok(sets)
    }

    fn run(&mut self, cx: &mut EffectContext, event: ScriptEvent, window: WindowId) {
        let Self {
            script,
            resolved,
            engine,
            started,
        } = self;
        for handler in script.handlers.iter().filter(|h| h.event == event) {
            for action in &handler.actions {
                match *action {
                    ScriptAction::Grab { role, force } => {
                        if !cx.grab_window(window, role, force) {
                            break;
                        }
                    }
                    ScriptAction::Ungrab { role } => {
                        cx.ungrab_window(window, role);
                    }
                    ScriptAction::Animate { set } | ScriptAction::Set { set } => {
                        let hold = matches!(action, ScriptAction::Set { .. });
                        for &request in resolved.get(set).into_iter().flatten() {
                            let id = if hold {
                                engine.set(cx, window, request)
                            } else {
                                engine.animate(cx, window, request)
                            };
                            if let Some(id) = id {
                                started.entry(window).or_default().push(id);
                            }
                        }
                    }
                    ScriptAction::Retarget {
                        attribute,
                        to,
                        duration,
                    } => {
                        engine.retarget_attribute(cx, window, attribute, to, duration);
                    }
                    ScriptAction::Redirect {
                        attribute,
                        direction,
                        terminate,
                    } => {
                        engine.redirect_attribute(cx, window, attribute, direction, terminate);
                    }
                    ScriptAction::Complete { attribute } => {
                        engine.complete_attribute(cx, window, attribute);
                    }
                    ScriptAction::Cancel => {
                        for id in started.remove(&window).unwrap_or_default() {
                            engine.cancel(cx, id);
                        }
                    }
                }
            }
        }
    }
}

impl Effect for ScriptedEffect {
    fn name(&self) -> &str {
        &self.script.name
    }

    fn load(&mut self, cx: &mut EffectContext) -> Result<(), LoadError> {
        _ = cx;
        self.resolved = self.validate()?;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.engine.is_active()
    }

    fn ordering(&self) -> i32 {
        self.script.ordering
    }

    fn pre_paint_screen(
        &mut self,
        cx: &mut EffectContext,
        data: &mut ScreenPrePaintData,
        elapsed: Duration,
        next: Next<'_, stage::PrePaintScreen>,
    ) {
        self.engine.pre_paint_screen(cx, data, elapsed);
        next.pre_paint_screen(cx, data, elapsed);
    }

    fn post_paint_screen(&mut self, cx: &mut EffectContext, next: Next<'_, stage::PostPaintScreen>) {
        self.engine.post_paint_screen(cx);
        let engine = &self.engine;
        self.started.retain(|_, ids| {
            ids.retain(|&id| engine.get(id).is_some());
            !ids.is_empty()
        });
        next.post_paint_screen(cx);
    }

    fn pre_paint_window(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        data: &mut WindowPrePaintData,
        elapsed: Duration,
        next: Next<'_, stage::PrePaintWindow>,
    ) {
        self.engine.pre_paint_window(cx, window, data);
        next.pre_paint_window(cx, window, data, elapsed);
    }

    fn paint_window(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        mask: PaintMask,
        region: &Region,
        data: &mut WindowPaintData,
        next: Next<'_, stage::PaintWindow>,
    ) {
        self.engine.paint_window(cx, window, data);
        next.paint_window(cx, window, mask, region, data);
    }

    fn window_added(&mut self, cx: &mut EffectContext, window: WindowId) {
        self.run(cx, ScriptEvent::WindowAdded, window);
    }

    fn window_shown(&mut self, cx: &mut EffectContext, window: WindowId) {
        self.run(cx, ScriptEvent::WindowShown, window);
    }

    fn window_hidden(&mut self, cx: &mut EffectContext, window: WindowId) {
        self.run(cx, ScriptEvent::WindowHidden, window);
    }

    fn window_closed(&mut self, cx: &mut EffectContext, window: WindowId) {
        self.run(cx, ScriptEvent::WindowClosed, window);
        self.engine.window_closed(cx, window);
    }

    fn window_deleted(&mut self, cx: &mut EffectContext, window: WindowId) {
        self.engine.window_deleted(cx, window);
        self.started.remove(&window);
    }

    fn window_minimized(&mut self, cx: &mut EffectContext, window: WindowId) {
        self.run(cx, ScriptEvent::WindowMinimized, window);
    }

    fn window_unminimized(&mut self, cx: &mut EffectContext, window: WindowId) {
        self.run(cx, ScriptEvent::WindowUnminimized, window);
    }

    fn desktop_changed(&mut self, cx: &mut EffectContext, from: u32, to: u32) {
        let windows = cx.windows();
        let affected: Vec<WindowId> = windows
            .stacking_order()
            .filter(|&w| windows.is_on_desktop(w, from) != windows.is_on_desktop(w, to))
            .collect();
        for window in affected {
            self.run(cx, ScriptEvent::DesktopChanged, window);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use kurbo::Rect;

    use super::*;
    use crate::config::CompositorConfig;
    use crate::effect::{EffectChain, EffectId, EffectKind};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn fade_out() -> AnimationList {
        AnimationList::single(AnimationSettings {
            to: Some(0.0.into()),
            ..AnimationSettings::new(Attribute::Opacity, ms(100))
        })
    }

    fn close_script() -> Script {
        Script {
            name: "close".to_string(),
            ordering: 0,
            animation_sets: vec![fade_out()],
            handlers: vec![Handler::new(
                ScriptEvent::WindowClosed,
                vec![
                    ScriptAction::Grab {
                        role: DataRole::WINDOW_CLOSED_GRAB,
                        force: false,
                    },
                    ScriptAction::Animate { set: 0 },
                ],
            )],
        }
    }

    fn setup(script: Script) -> (EffectContext, EffectChain, EffectId, WindowId) {
        let mut cx = EffectContext::new(CompositorConfig::desktop());
        let w = cx
            .windows_mut()
            .create_window(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut chain = EffectChain::new();
        let id = chain.allocate_id();
        let mut effect = EffectKind::Scripted(ScriptedEffect::new(script));
        cx.with_current(id, |cx| effect.as_effect_mut().load(cx))
            .expect("valid script");
        chain.insert(id, effect);
        (cx, chain, id, w)
    }

    fn frame(chain: &mut EffectChain, cx: &mut EffectContext, dt: u64) {
        chain.refresh_active();
        chain.pre_paint_screen(cx, &mut ScreenPrePaintData::default(), ms(dt));
        chain.post_paint_screen(cx);
    }

    fn engine(chain: &EffectChain, id: EffectId) -> &AnimationEngine {
        match chain.get(id) {
            Some(EffectKind::Scripted(s)) => s.engine(),
            _ => panic!("scripted effect expected"),
        }
    }

    #[test]
    fn global_settings_complete_entries() {
        let list = AnimationList {
            global: AnimationSettings {
                duration: Some(ms(250)),
                ..AnimationSettings::default()
            },
            animations: vec![
                AnimationSettings {
                    attribute: Some(Attribute::Opacity),
                    ..AnimationSettings::default()
                },
                AnimationSettings::new(Attribute::Scale, ms(50)),
            ],
        };
        let requests = list.resolve().expect("valid");
        assert_eq!(requests.len(), 2, "untyped global is not an animation");
        assert_eq!(requests[0].duration, ms(250), "inherited");
        assert_eq!(requests[0].to, FPx2::splat(1.0), "missing target is neutral");
        assert!(requests[0].keep_alive, "keep-alive defaults on");
        assert_eq!(requests[1].duration, ms(50), "own value wins");
    }

    #[test]
    fn typed_global_counts_as_an_animation() {
        let list = AnimationList {
            global: AnimationSettings::new(Attribute::Opacity, ms(10)),
            animations: vec![AnimationSettings {
                attribute: Some(Attribute::Brightness),
                ..AnimationSettings::default()
            }],
        };
        let requests = list.resolve().expect("valid");
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].attribute, Attribute::Brightness);
    }

    #[test]
    fn invalid_lists_are_rejected() {
        assert_eq!(
            AnimationList::default().resolve(),
            Err(ScriptError::NoAnimations)
        );
        let untyped = AnimationList {
            global: AnimationSettings::default(),
            animations: vec![AnimationSettings {
                duration: Some(ms(10)),
                ..AnimationSettings::default()
            }],
        };
        assert_eq!(untyped.resolve(), Err(ScriptError::MissingType { index: 1 }));
        let timeless = AnimationList::single(AnimationSettings {
            attribute: Some(Attribute::Opacity),
            ..AnimationSettings::default()
        });
        assert_eq!(
            timeless.resolve(),
            Err(ScriptError::MissingDuration { index: 0 })
        );
    }

    #[test]
    fn handlers_must_reference_existing_sets() {
        let mut script = close_script();
        script.handlers[0].actions.push(ScriptAction::Set { set: 3 });
        let mut effect = ScriptedEffect::new(script);
        let mut cx = EffectContext::new(CompositorConfig::desktop());
        assert_eq!(
            effect.load(&mut cx),
            Err(LoadError::Script(ScriptError::UnknownAnimationSet(3)))
        );
    }

    #[test]
    fn close_handler_keeps_the_window_alive_until_faded() {
        let (mut cx, mut chain, id, w) = setup(close_script());
        cx.windows_mut().mark_closed(w);
        chain.broadcast(&mut cx, |e, cx| e.window_closed(cx, w));

        assert_eq!(cx.is_grabbed(w, DataRole::WINDOW_CLOSED_GRAB), Some(id));
        assert_eq!(cx.keep_alive_count(w), 1);
        assert!(engine(&chain, id).is_animating(w));

        frame(&mut chain, &mut cx, 60);
        assert_eq!(cx.keep_alive_count(w), 1, "still fading");
        frame(&mut chain, &mut cx, 40);
        assert_eq!(cx.keep_alive_count(w), 0);
        assert_eq!(cx.pending_release, [w], "released once the fade finished");
    }

    #[test]
    fn refused_grab_stops_the_handler() {
        let (mut cx, mut chain, id, w) = setup(close_script());
        let other = EffectId(id.get() + 100);
        assert!(cx.with_current(other, |cx| {
            cx.grab_window(w, DataRole::WINDOW_CLOSED_GRAB, false)
        }));
        cx.windows_mut().mark_closed(w);
        chain.broadcast(&mut cx, |e, cx| e.window_closed(cx, w));

        assert!(!engine(&chain, id).is_active(), "no animation after the refusal");
        assert_eq!(cx.keep_alive_count(w), 0);
    }

    #[test]
    fn cancel_drops_what_the_handlers_started() {
        let mut script = close_script();
        script.handlers.push(Handler::new(
            ScriptEvent::WindowShown,
            vec![ScriptAction::Cancel],
        ));
        script.handlers[0].event = ScriptEvent::WindowHidden;
        let (mut cx, mut chain, id, w) = setup(script);

        chain.broadcast(&mut cx, |e, cx| e.window_hidden(cx, w));
        assert!(engine(&chain, id).is_animating(w));
        chain.broadcast(&mut cx, |e, cx| e.window_shown(cx, w));
        assert!(!engine(&chain, id).is_animating(w));
    }

    #[test]
    fn desktop_change_runs_per_affected_window() {
        let script = Script {
            name: "switch".to_string(),
            animation_sets: vec![fade_out()],
            handlers: vec![Handler::new(
                ScriptEvent::DesktopChanged,
                vec![ScriptAction::Animate { set: 0 }],
            )],
            ..Script::default()
        };
        let (mut cx, mut chain, id, sticky) = setup(script);
        let on_one = cx
            .windows_mut()
            .create_window(Rect::new(0.0, 0.0, 10.0, 10.0));
        let on_two = cx
            .windows_mut()
            .create_window(Rect::new(0.0, 0.0, 10.0, 10.0));
        cx.windows_mut().set_desktop(on_one, Some(1));
        cx.windows_mut().set_desktop(on_two, Some(2));

        chain.broadcast(&mut cx, |e, cx| e.desktop_changed(cx, 1, 2));
        let engine = engine(&chain, id);
        assert!(!engine.is_animating(sticky), "visible on both desktops");
        assert!(engine.is_animating(on_one));
        assert!(engine.is_animating(on_two));
    }

    #[test]
    fn minimize_retargets_without_restarting() {
        let grow = AnimationList::single(AnimationSettings {
            to: Some(1.4.into()),
            ..AnimationSettings::new(Attribute::Scale, ms(100))
        });
        let script = Script {
            name: "grow".to_string(),
            animation_sets: vec![grow],
            handlers: vec![
                Handler::new(ScriptEvent::WindowAdded, vec![ScriptAction::Animate { set: 0 }]),
                Handler::new(
                    ScriptEvent::WindowMinimized,
                    vec![ScriptAction::Retarget {
                        attribute: Attribute::Scale,
                        to: 1.5.into(),
                        duration: ms(200),
                    }],
                ),
                Handler::new(
                    ScriptEvent::WindowUnminimized,
                    vec![ScriptAction::Complete {
                        attribute: Attribute::Scale,
                    }],
                ),
            ],
            ..Script::default()
        };
        let (mut cx, mut chain, id, w) = setup(script);
        chain.broadcast(&mut cx, |e, cx| e.window_added(cx, w));
        let a = &engine(&chain, id).animations(w)[0];
        assert_eq!(a.to, FPx2::splat(1.4));
        assert_eq!(a.timeline.duration(), ms(100));

        frame(&mut chain, &mut cx, 40);
        chain.broadcast(&mut cx, |e, cx| e.window_minimized(cx, w));
        let anims = engine(&chain, id).animations(w);
        assert_eq!(anims.len(), 1, "retargeted in place");
        assert_eq!(anims[0].to, FPx2::splat(1.5));
        assert_eq!(anims[0].timeline.duration(), ms(200));
        assert_eq!(anims[0].timeline.elapsed(), ms(80), "progress ratio kept");

        chain.broadcast(&mut cx, |e, cx| e.window_unminimized(cx, w));
        frame(&mut chain, &mut cx, 0);
        assert!(
            !engine(&chain, id).is_animating(w),
            "set is empty once the retargeted animation finished"
        );
    }
}
