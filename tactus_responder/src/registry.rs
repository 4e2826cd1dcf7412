// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component registry: the set of live components and their stacking order.
//!
//! ## Ordering
//!
//! Components are ranked by [`Stacking`]: higher `priority` first, then the most
//! recently registered or raised first. At dispatch time, components flagged
//! [`ALWAYS_ON_TOP`](crate::component::ComponentFlags::ALWAYS_ON_TOP) are offered
//! before everything else, keeping their relative order
//! (see [`Snapshot::in_dispatch_order`]).
//!
//! ## Snapshots
//!
//! The registry publishes an immutable [`Snapshot`] that is replaced, never mutated,
//! on every change. A dispatch pass holds its snapshot for the whole pass, so a
//! concurrent register or unregister cannot disturb the iteration.
//!
//! ## Removal
//!
//! [`Registry::unregister`] retires the component in the
//! [`LockArbiter`](crate::lock::LockArbiter) while still holding the registry's
//! write lock. Its touches are released and it can never claim again.

use core::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use kurbo::{Point, Size};
use tracing::{debug, warn};

use crate::component::{Component, ComponentFlags};
use crate::lock::LockArbiter;
use crate::task::TaskQueue;
use crate::types::{ComponentId, Localizer};

/// Stacking key; greater is nearer to the user.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Stacking {
    /// Priority band; higher bands are always above lower ones.
    pub priority: i32,
    /// Registration or raise sequence within the process; later is nearer.
    pub seq: u64,
}

/// How callbacks reach a component.
#[derive(Clone, Debug, Default)]
pub enum Delivery {
    /// Called directly on the dispatch lane.
    #[default]
    Inline,
    /// Posted to the queue of the thread that owns the component's state.
    Queue(TaskQueue),
}

/// Options for [`Registry::register_with`].
#[derive(Clone, Debug, Default)]
pub struct RegisterOptions {
    /// Callback delivery.
    pub delivery: Delivery,
    /// Priority band.
    pub priority: i32,
}

/// A registered component as seen by the dispatcher.
#[derive(Clone)]
pub struct ComponentHandle {
    id: ComponentId,
    component: Arc<dyn Component>,
    flags: ComponentFlags,
    stacking: Stacking,
    delivery: Delivery,
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("id", &self.id)
            .field("flags", &self.flags)
            .field("stacking", &self.stacking)
            .field("delivery", &self.delivery)
            .finish_non_exhaustive()
    }
}

enum HitOutcome {
    Hit(Point),
    Miss,
    BadSize(Size),
}

impl ComponentHandle {
    /// Identifier.
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// The component.
    pub fn component(&self) -> &Arc<dyn Component> {
        &self.component
    }

    /// Flags, read once at registration.
    pub fn flags(&self) -> ComponentFlags {
        self.flags
    }

    /// Stacking key.
    pub fn stacking(&self) -> Stacking {
        self.stacking
    }

    /// Callback delivery.
    pub fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    /// Localizer for the component's current display size.
    pub fn localizer(&self) -> Option<Localizer> {
        Localizer::new(self.component.display_size())
    }

    /// Hit-test a normalized position. Returns it in display space on a hit.
    ///
    /// An unusable display size or a panicking component counts as a miss.
    pub fn hit_test(&self, position: Point) -> Option<Point> {
        self.guarded_hit(|c, l| {
            let local = l.point(position);
            c.bounds_contains(local).then_some(local)
        })
    }

    /// Whether every normalized position lies inside the component.
    pub fn contains_all(&self, positions: &[Point]) -> bool {
        self.guarded_hit(|c, l| {
            positions
                .iter()
                .all(|p| c.bounds_contains(l.point(*p)))
                .then_some(Point::ORIGIN)
        })
        .is_some()
    }

    /// Whether any normalized position lies inside the component.
    pub fn contains_any(&self, positions: impl IntoIterator<Item = Point>) -> bool {
        self.guarded_hit(|c, l| {
            positions
                .into_iter()
                .map(|p| l.point(p))
                .find(|p| c.bounds_contains(*p))
        })
        .is_some()
    }

    fn guarded_hit(
        &self,
        f: impl FnOnce(&dyn Component, Localizer) -> Option<Point>,
    ) -> Option<Point> {
        let c = &*self.component;
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let size = c.display_size();
            match Localizer::new(size) {
                Some(l) => f(c, l).map_or(HitOutcome::Miss, HitOutcome::Hit),
                None => HitOutcome::BadSize(size),
            }
        }));
        match outcome {
            Ok(HitOutcome::Hit(p)) => Some(p),
            Ok(HitOutcome::Miss) => None,
            Ok(HitOutcome::BadSize(size)) => {
                warn!(component = %self.id, ?size, "unusable display size; treating as a miss");
                None
            }
            Err(_) => {
                warn!(component = %self.id, "hit test panicked; treating as a miss");
                None
            }
        }
    }

    /// Invoke `f` on the component, inline or through its queue.
    pub fn deliver(&self, f: impl FnOnce(&dyn Component) + Send + 'static) {
        match &self.delivery {
            Delivery::Inline => f(&*self.component),
            Delivery::Queue(queue) => {
                let component = Arc::clone(&self.component);
                if !queue.post(move || f(&*component)) {
                    debug!(component = %self.id, "task queue closed; callback dropped");
                }
            }
        }
    }
}

/// Immutable, ordered view of the registry.
#[derive(Clone, Debug)]
pub struct Snapshot {
    items: Arc<[ComponentHandle]>,
}

impl Snapshot {
    /// Components in stacking order, nearest first.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentHandle> {
        self.items.iter()
    }

    /// Components in the order events are offered: always-on-top ones first.
    pub fn in_dispatch_order(&self) -> impl Iterator<Item = &ComponentHandle> {
        let on_top = |h: &&ComponentHandle| h.flags.contains(ComponentFlags::ALWAYS_ON_TOP);
        self.items
            .iter()
            .filter(on_top)
            .chain(self.items.iter().filter(move |h| !on_top(h)))
    }

    /// Look up a component.
    pub fn get(&self, id: ComponentId) -> Option<&ComponentHandle> {
        self.items.iter().find(|h| h.id == id)
    }

    /// Identifiers in stacking order.
    pub fn ids(&self) -> Vec<ComponentId> {
        self.items.iter().map(|h| h.id).collect()
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug)]
struct Inner {
    items: Arc<[ComponentHandle]>,
    next_id: u64,
    next_seq: u64,
}

impl Inner {
    fn publish(&mut self, mut items: Vec<ComponentHandle>) {
        items.sort_by(|a, b| b.stacking.cmp(&a.stacking));
        self.items = items.into();
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// Thread-safe set of live components.
pub struct Registry {
    arbiter: Arc<LockArbiter>,
    inner: RwLock<Inner>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("components", &self.snapshot().ids())
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Create an empty registry that retires removed components in `arbiter`.
    pub fn new(arbiter: Arc<LockArbiter>) -> Self {
        Self {
            arbiter,
            inner: RwLock::new(Inner {
                items: Arc::from(Vec::new()),
                next_id: 0,
                next_seq: 0,
            }),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register with default options.
    pub fn register(&self, component: Arc<dyn Component>) -> ComponentId {
        self.register_with(component, RegisterOptions::default())
    }

    /// Register on top of its priority band.
    ///
    /// Registering the same `Arc` again returns the existing id and changes nothing.
    pub fn register_with(
        &self,
        component: Arc<dyn Component>,
        options: RegisterOptions,
    ) -> ComponentId {
        let mut inner = self.write();
        if let Some(h) = inner
            .items
            .iter()
            .find(|h| Arc::ptr_eq(&h.component, &component))
        {
            return h.id;
        }
        inner.next_id += 1;
        let id = ComponentId::from_raw(inner.next_id);
        let seq = inner.bump_seq();
        let handle = ComponentHandle {
            id,
            flags: component.flags(),
            component,
            stacking: Stacking {
                priority: options.priority,
                seq,
            },
            delivery: options.delivery,
        };
        let mut items = inner.items.to_vec();
        items.push(handle);
        self.arbiter.admit(id);
        inner.publish(items);
        debug!(component = %id, priority = options.priority, "registered");
        id
    }

    /// Remove a component and retire it in the arbiter.
    pub fn unregister(&self, id: ComponentId) -> Option<ComponentHandle> {
        let mut inner = self.write();
        let pos = inner.items.iter().position(|h| h.id == id)?;
        let mut items = inner.items.to_vec();
        let removed = items.remove(pos);
        inner.publish(items);
        let released = self.arbiter.retire(id);
        drop(inner);
        debug!(component = %id, released = released.len(), "unregistered");
        Some(removed)
    }

    /// Move a component to the front of its priority band.
    pub fn raise(&self, id: ComponentId) -> bool {
        let mut inner = self.write();
        if inner.items.first().is_some_and(|h| h.id == id) {
            return true;
        }
        let Some(pos) = inner.items.iter().position(|h| h.id == id) else {
            return false;
        };
        let seq = inner.bump_seq();
        let mut items = inner.items.to_vec();
        items[pos].stacking.seq = seq;
        inner.publish(items);
        true
    }

    /// Current ordered view.
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Snapshot {
            items: Arc::clone(&inner.items),
        }
    }

    /// Look up a component.
    pub fn get(&self, id: ComponentId) -> Option<ComponentHandle> {
        self.snapshot().get(id).cloned()
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: ComponentId) -> bool {
        self.snapshot().get(id).is_some()
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether no component is registered.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// The arbiter removed components are retired in.
    pub fn arbiter(&self) -> &Arc<LockArbiter> {
        &self.arbiter
    }
}
