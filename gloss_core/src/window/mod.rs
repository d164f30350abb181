// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window proxies and the window list.
//!
//! A *window* here is the compositor's view of a client surface. Each
//! window has:
//!
//! - An identity ([`WindowId`]), a generational handle effects hold instead
//!   of the window manager's own objects.
//! - Properties pushed by the window manager: frame geometry, opacity,
//!   desktop, minimized/hidden [`flags`](WindowFlags), transient-for link.
//! - A lifecycle [`state`](WindowState): live, closed (a remnant kept alive
//!   by effects), destroyed.
//! - Role-keyed [side data](DataRole) effects read and write.
//! - Pending damage, folded into the frame's working region by
//!   [`WindowStore::collect_damage`].
//!
//! The [`WindowStore`] also owns the stacking order (bottom to top).

mod data;
mod event;
mod id;
mod store;

pub use data::{DataRole, DataValue};
pub use event::{WindowEvent, WindowEventKind};
pub use id::{WindowId, WindowState};
pub use store::{WindowFlags, WindowStore};
