// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opaque resource keys and the shared shadow texture cache.

use alloc::vec::Vec;
use core::fmt;

use crate::shadow::ShadowTiles;

/// An opaque handle to a backend-managed resource (texture, buffer, etc.).
///
/// Keys are handed out by [`ShadowTextureCache`] and passed through the
/// render plan without interpretation; the backend decides what they name.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey(pub u64);

impl fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceKey({})", self.0)
    }
}

#[derive(Debug)]
struct Entry {
    tiles: ShadowTiles,
    key: ResourceKey,
    users: u32,
}

/// Shares one packed texture among all windows with identical shadow
/// tiles.
///
/// Windows of the same decoration theme usually share tile sizes; the
/// backend uploads the texture once per key.
#[derive(Debug, Default)]
pub struct ShadowTextureCache {
    entries: Vec<Entry>,
    next_key: u64,
}

impl ShadowTextureCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the key for `tiles`, adding a user. Empty tiles have no
    /// texture.
    pub fn acquire(&mut self, tiles: &ShadowTiles) -> Option<ResourceKey> {
        if tiles.is_empty() {
            return None;
        }
        if let Some(entry) = self.entries.iter_mut().find(|e| e.tiles == *tiles) {
            entry.users += 1;
            return Some(entry.key);
        }
        let key = ResourceKey(self.next_key);
        self.next_key += 1;
        self.entries.push(Entry {
            tiles: *tiles,
            key,
            users: 1,
        });
        Some(key)
    }

    /// Drops a user of `key`. Returns `true` when it was the last one and
    /// the backend may free the texture.
    pub fn release(&mut self, key: ResourceKey) -> bool {
        let Some(i) = self.entries.iter().position(|e| e.key == key) else {
            return false;
        };
        self.entries[i].users -= 1;
        if self.entries[i].users > 0 {
            return false;
        }
        self.entries.swap_remove(i);
        true
    }

    /// Number of distinct textures alive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no texture is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
