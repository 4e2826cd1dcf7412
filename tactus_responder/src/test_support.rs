// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A component that records every callback, for tests.

use std::sync::{Arc, Mutex};

use kurbo::{Point, Rect, Size, Vec2};
use tactus_gesture::escalate::{SustainedGesture, Tier};
use tactus_gesture::types::{PanEvent, RotateEvent, ShapeResult, TouchId, ZoomEvent};

use crate::component::{Component, ComponentFlags};

#[derive(Debug)]
pub(crate) struct Recorder {
    name: &'static str,
    size: Size,
    bounds: Rect,
    flags: ComponentFlags,
    accept: bool,
    panics: bool,
    events: Mutex<Vec<String>>,
}

impl Recorder {
    pub(crate) fn new(name: &'static str, size: Size, bounds: Rect) -> Arc<Self> {
        Arc::new(Self {
            name,
            size,
            bounds,
            flags: ComponentFlags::TOUCHABLE,
            accept: true,
            panics: false,
            events: Mutex::new(Vec::new()),
        })
    }

    /// 100×100 display space, bounds cover all of it.
    pub(crate) fn full(name: &'static str) -> Arc<Self> {
        Self::new(name, Size::new(100.0, 100.0), Rect::new(0.0, 0.0, 100.0, 100.0))
    }

    pub(crate) fn with_flags(mut self: Arc<Self>, flags: ComponentFlags) -> Arc<Self> {
        if let Some(r) = Arc::get_mut(&mut self) {
            r.flags = flags;
        }
        self
    }

    pub(crate) fn refusing(mut self: Arc<Self>) -> Arc<Self> {
        if let Some(r) = Arc::get_mut(&mut self) {
            r.accept = false;
        }
        self
    }

    pub(crate) fn panicking(mut self: Arc<Self>) -> Arc<Self> {
        if let Some(r) = Arc::get_mut(&mut self) {
            r.panics = true;
        }
        self
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    fn log(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

fn pt(p: Point) -> String {
    format!("({}, {})", p.x, p.y)
}

fn vc(v: Vec2) -> String {
    format!("[{}, {}]", v.x, v.y)
}

impl Component for Recorder {
    fn bounds_contains(&self, point: Point) -> bool {
        assert!(!self.panics, "{} has broken bounds", self.name);
        self.bounds.contains(point)
    }

    fn display_size(&self) -> Size {
        self.size
    }

    fn flags(&self) -> ComponentFlags {
        self.flags
    }

    fn accepts_touch(&self, _touch: TouchId, _point: Point) -> bool {
        self.accept
    }

    fn touch_birth(&self, touch: TouchId, point: Point) {
        self.log(format!("birth {touch} {}", pt(point)));
    }

    fn touch_alive(&self, touch: TouchId, point: Point) {
        self.log(format!("alive {touch} {}", pt(point)));
    }

    fn touch_dead(&self, touch: TouchId, point: Point) {
        self.log(format!("dead {touch} {}", pt(point)));
    }

    fn drag(&self, touch: TouchId, origin: Point, delta: Vec2) {
        self.log(format!("drag {touch} {} {}", pt(origin), vc(delta)));
    }

    fn drag_end(&self, touch: TouchId, origin: Point, delta: Vec2) {
        self.log(format!("drag_end {touch} {} {}", pt(origin), vc(delta)));
    }

    fn pan(&self, event: &PanEvent) {
        self.log(format!("pan {}", vc(event.translation)));
    }

    fn zoom(&self, event: &ZoomEvent) {
        self.log(format!("zoom {} {}", event.distance, event.ratio));
    }

    fn rotate(&self, event: &RotateEvent) {
        self.log(format!("rotate {}", event.angle));
    }

    fn handwriting(&self, text: &str) {
        self.log(format!("hwr {text}"));
    }

    fn shape(&self, result: &ShapeResult) {
        let names: Vec<&str> = result.shapes.iter().map(|s| s.name.as_str()).collect();
        let first = result.points().next().map_or_else(String::new, pt);
        self.log(format!("shape {} {first}", names.join(",")));
    }

    fn draw(&self, point: Point) {
        self.log(format!("draw {}", pt(point)));
    }

    fn draw_end(&self, point: Point) {
        self.log(format!("draw_end {}", pt(point)));
    }

    fn escalation_tier(&self, touch: TouchId, tier: Tier) {
        self.log(format!("tier {touch} {}", tier.get()));
    }

    fn escalation_abandoned(&self, touch: TouchId) {
        self.log(format!("abandoned {touch}"));
    }

    fn sustained_gesture(&self, touch: TouchId, gesture: &SustainedGesture) {
        self.log(format!("sustained {touch} {}", gesture.samples));
    }
}
