// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lock arbiter: which component owns which touch.
//!
//! ## Overview
//!
//! Each touch is either unlocked or locked by exactly one component:
//! `UNLOCKED → LOCKED(owner) → UNLOCKED`. A touch also belongs to a group (a logical
//! interaction spanning several raw touches). The first claim in a group fixes the
//! group's owner; later touches of the group can only be claimed by that same owner.
//! The group lock goes away with its last member.
//!
//! ## Admission and retirement
//!
//! Only admitted components may claim. The registry admits a component when it is
//! registered; [`LockArbiter::retire`] releases everything the component owns and
//! removes its admission under one critical section. A dispatch lane that decided to
//! claim for a component just before it was unregistered therefore cannot resurrect a
//! lock for it. Component ids are never reused, so the admitted set only ever holds
//! live components.
//!
//! The table is the only mutable state shared across lanes; every operation holds its
//! mutex for a few map operations only.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tactus_gesture::types::{GroupId, TouchId};
use thiserror::Error;
use tracing::debug;

use crate::types::ComponentId;

/// One held lock.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct LockEntry {
    /// Locked touch.
    pub touch: TouchId,
    /// Group the touch was claimed under.
    pub group: GroupId,
    /// Owning component.
    pub owner: ComponentId,
}

/// Why a claim was refused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum ClaimError {
    /// The touch is already locked.
    #[error("touch {touch} is already owned by {owner}")]
    AlreadyClaimed {
        /// Contested touch.
        touch: TouchId,
        /// Current owner.
        owner: ComponentId,
    },
    /// The touch's group is owned by another component.
    #[error("group {group} is owned by {owner}")]
    GroupConflict {
        /// Contested group.
        group: GroupId,
        /// Current group owner.
        owner: ComponentId,
    },
    /// The claimant is not a registered component.
    #[error("component {0} is not registered")]
    Unregistered(ComponentId),
}

#[derive(Copy, Clone, Debug)]
struct GroupLock {
    owner: ComponentId,
    members: usize,
}

#[derive(Debug, Default)]
struct LockTable {
    touches: HashMap<TouchId, LockEntry>,
    groups: HashMap<GroupId, GroupLock>,
    live: HashSet<ComponentId>,
}

impl LockTable {
    fn release(&mut self, touch: TouchId) -> Option<LockEntry> {
        let entry = self.touches.remove(&touch)?;
        if let Some(g) = self.groups.get_mut(&entry.group) {
            g.members = g.members.saturating_sub(1);
            if g.members == 0 {
                self.groups.remove(&entry.group);
            }
        }
        Some(entry)
    }

    fn release_owner(&mut self, owner: ComponentId) -> Vec<TouchId> {
        let mut touches: Vec<TouchId> = self
            .touches
            .values()
            .filter(|e| e.owner == owner)
            .map(|e| e.touch)
            .collect();
        touches.sort_unstable();
        for t in &touches {
            self.release(*t);
        }
        touches
    }
}

/// Touch-to-owner table shared by every dispatch lane.
#[derive(Debug, Default)]
pub struct LockArbiter {
    table: Mutex<LockTable>,
}

impl LockArbiter {
    /// Create an empty arbiter.
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, LockTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock `touch` for `owner`.
    ///
    /// Succeeds only if the touch is unlocked, its group is unowned or already owned
    /// by `owner`, and `owner` is admitted.
    pub fn try_claim(
        &self,
        touch: TouchId,
        group: GroupId,
        owner: ComponentId,
    ) -> Result<(), ClaimError> {
        let mut table = self.table();
        if !table.live.contains(&owner) {
            return Err(ClaimError::Unregistered(owner));
        }
        if let Some(e) = table.touches.get(&touch) {
            return Err(ClaimError::AlreadyClaimed {
                touch,
                owner: e.owner,
            });
        }
        match table.groups.get_mut(&group) {
            Some(g) if g.owner != owner => {
                return Err(ClaimError::GroupConflict {
                    group,
                    owner: g.owner,
                });
            }
            Some(g) => g.members += 1,
            None => {
                table.groups.insert(group, GroupLock { owner, members: 1 });
            }
        }
        table
            .touches
            .insert(touch, LockEntry { touch, group, owner });
        Ok(())
    }

    /// Current owner of `touch`.
    pub fn owner(&self, touch: TouchId) -> Option<ComponentId> {
        self.table().touches.get(&touch).map(|e| e.owner)
    }

    /// Current owner of `group`.
    pub fn group_owner(&self, group: GroupId) -> Option<ComponentId> {
        self.table().groups.get(&group).map(|g| g.owner)
    }

    /// Lock held on `touch`, if any.
    pub fn entry(&self, touch: TouchId) -> Option<LockEntry> {
        self.table().touches.get(&touch).copied()
    }

    /// Unlock `touch`. Idempotent. Returns the previous owner.
    pub fn release(&self, touch: TouchId) -> Option<ComponentId> {
        self.table().release(touch).map(|e| e.owner)
    }

    /// Unlock every touch of `group`. Returns them in ascending order.
    pub fn release_group(&self, group: GroupId) -> Vec<TouchId> {
        let mut table = self.table();
        let mut touches: Vec<TouchId> = table
            .touches
            .values()
            .filter(|e| e.group == group)
            .map(|e| e.touch)
            .collect();
        touches.sort_unstable();
        for t in &touches {
            table.release(*t);
        }
        touches
    }

    /// Unlock every touch owned by `owner`. Returns them in ascending order.
    pub fn force_release(&self, owner: ComponentId) -> Vec<TouchId> {
        let released = self.table().release_owner(owner);
        if !released.is_empty() {
            debug!(component = %owner, count = released.len(), "force-released touches");
        }
        released
    }

    /// Allow `owner` to claim touches.
    pub fn admit(&self, owner: ComponentId) {
        self.table().live.insert(owner);
    }

    /// Force-release `owner` and refuse all of its later claims.
    pub fn retire(&self, owner: ComponentId) -> Vec<TouchId> {
        let released = {
            let mut table = self.table();
            table.live.remove(&owner);
            table.release_owner(owner)
        };
        debug!(component = %owner, released = released.len(), "retired component");
        released
    }

    /// Whether `owner` is admitted and may claim.
    pub fn is_live(&self, owner: ComponentId) -> bool {
        self.table().live.contains(&owner)
    }

    /// Number of admitted components.
    pub fn live_count(&self) -> usize {
        self.table().live.len()
    }

    /// Touches currently owned by `owner`, ascending.
    pub fn locks_of(&self, owner: ComponentId) -> Vec<TouchId> {
        let table = self.table();
        let mut touches: Vec<TouchId> = table
            .touches
            .values()
            .filter(|e| e.owner == owner)
            .map(|e| e.touch)
            .collect();
        touches.sort_unstable();
        touches
    }

    /// Number of locked touches.
    pub fn len(&self) -> usize {
        self.table().touches.len()
    }

    /// Whether no touch is locked.
    pub fn is_empty(&self) -> bool {
        self.table().touches.is_empty()
    }
}
