// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Role-keyed side data attached to windows.
//!
//! Every window carries an open-ended map from [`DataRole`] to
//! [`DataValue`]. Effects use it for grab tokens (see
//! [`arbitration::grab`](crate::arbitration::grab)), to signal each other
//! ("blur behind this window"), and to cache per-window values without
//! owning per-window state themselves.

use alloc::rc::Rc;
use alloc::string::String;
use core::any::Any;
use core::fmt;

use crate::effect::EffectId;
use crate::window::WindowId;

/// An opaque key naming a side-data slot.
///
/// The well-known roles are associated constants; effects that need private
/// slots pick values at or above [`DataRole::FIRST_CUSTOM`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataRole(pub u32);

impl DataRole {
    /// Who animates the window's appearance.
    pub const WINDOW_ADDED_GRAB: Self = Self(1);
    /// Who animates the window's disappearance.
    pub const WINDOW_CLOSED_GRAB: Self = Self(2);
    /// Who animates minimizing.
    pub const WINDOW_MINIMIZED_GRAB: Self = Self(3);
    /// Who animates unminimizing.
    pub const WINDOW_UNMINIMIZED_GRAB: Self = Self(4);
    /// Generic keyboard/pointer grab held by an effect.
    pub const WINDOW_FORCE_GRAB: Self = Self(5);
    /// Request blur behind the window from whichever effect provides it.
    pub const FORCE_BLUR: Self = Self(6);
    /// Request background contrast behind the window.
    pub const FORCE_BACKGROUND_CONTRAST: Self = Self(7);

    /// First value free for effect-private roles.
    pub const FIRST_CUSTOM: u32 = 0x1000;

    /// Returns an effect-private role `FIRST_CUSTOM + offset`.
    #[must_use]
    pub const fn custom(offset: u32) -> Self {
        Self(Self::FIRST_CUSTOM + offset)
    }

    /// Returns `true` for the roles used as grab tokens.
    #[must_use]
    pub const fn is_grab(self) -> bool {
        matches!(self.0, 1..=5)
    }
}

impl fmt::Debug for DataRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::WINDOW_ADDED_GRAB => "WindowAddedGrab",
            Self::WINDOW_CLOSED_GRAB => "WindowClosedGrab",
            Self::WINDOW_MINIMIZED_GRAB => "WindowMinimizedGrab",
            Self::WINDOW_UNMINIMIZED_GRAB => "WindowUnminimizedGrab",
            Self::WINDOW_FORCE_GRAB => "WindowForceGrab",
            Self::FORCE_BLUR => "ForceBlur",
            Self::FORCE_BACKGROUND_CONTRAST => "ForceBackgroundContrast",
            Self(n) => return write!(f, "DataRole({n})"),
        };
        f.write_str(name)
    }
}

/// A side-data value.
#[derive(Clone)]
pub enum DataValue {
    /// An effect, e.g. the owner of a grab role.
    Effect(EffectId),
    /// Another window.
    Window(WindowId),
    /// A flag.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A string.
    Text(String),
    /// Anything else, shared by reference.
    Shared(Rc<dyn Any>),
}

impl DataValue {
    /// Returns the effect if this is [`DataValue::Effect`].
    #[must_use]
    pub fn as_effect(&self) -> Option<EffectId> {
        match self {
            Self::Effect(e) => Some(*e),
            _ => None,
        }
    }

    /// Returns the flag if this is [`DataValue::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the number if this is [`DataValue::Float`] or
    /// [`DataValue::Int`].
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Downcasts a [`DataValue::Shared`] payload.
    #[must_use]
    pub fn downcast<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Shared(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for DataValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Effect(a), Self::Effect(b)) => a == b,
            (Self::Window(a), Self::Window(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Shared(a), Self::Shared(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Effect(e) => write!(f, "Effect({e:?})"),
            Self::Window(w) => write!(f, "Window({w:?})"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::Float(v) => write!(f, "Float({v})"),
            Self::Text(s) => write!(f, "Text({s:?})"),
            Self::Shared(_) => f.write_str("Shared(..)"),
        }
    }
}

impl From<EffectId> for DataValue {
    fn from(e: EffectId) -> Self {
        Self::Effect(e)
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grab_roles_are_recognized() {
        assert!(DataRole::WINDOW_CLOSED_GRAB.is_grab());
        assert!(!DataRole::FORCE_BLUR.is_grab(), "signalling role");
        assert!(!DataRole::custom(3).is_grab(), "private role");
        assert_eq!(DataRole::custom(3), DataRole(0x1003));
    }

    #[test]
    fn shared_values_compare_by_identity() {
        let payload: Rc<dyn Any> = Rc::new(5_u32);
        let a = DataValue::Shared(Rc::clone(&payload));
        let b = DataValue::Shared(payload);
        let c = DataValue::Shared(Rc::new(5_u32));
        assert_eq!(a, b, "same allocation");
        assert_ne!(a, c, "equal contents, different allocation");
        assert_eq!(a.downcast::<u32>(), Some(&5));
        assert_eq!(a.downcast::<i64>(), None, "wrong type");
    }

    #[test]
    fn accessors() {
        assert_eq!(DataValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(DataValue::Bool(true).as_bool(), Some(true));
        assert_eq!(DataValue::Text("x".into()).as_effect(), None);
    }
}
