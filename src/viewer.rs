//! Zoom, pan, and momentum for the single-artwork detail view.
//!
//! ## State machine
//!
//! ```text
//!            drag_start (zoom > 1)
//!   Idle ───────────────────────────► Dragging
//!    ▲  ▲                               │
//!    │  └──── drag_end, slow ───────────┤
//!    │                                  │ drag_end, speed > momentum_threshold
//!    │        speed < rest_epsilon      ▼
//!    └──────────────────────────────  Momentum ◄─ tick()
//! ```
//!
//! The engine owns a single animation handle: momentum or an eased reset.
//! Starting any motion source (a drag, a reset, a new image) replaces the
//! handle, so two animations never run at once. The host calls
//! [`ViewerEngine::tick`] once per animation frame while
//! [`ViewerEngine::is_animating`] is true.
//!
//! ## Bounds
//!
//! The image is first fitted inside the viewport (`base` size). At zoom `z`
//! the pan offset is limited per axis to
//! `max_offset = max(0, (base * z - viewport) / 2)`, and at `z <= 1` the
//! offset and velocity are always zero. Every operation re-establishes these
//! bounds; out-of-range input is clamped, never rejected.

use crate::config::ViewerConfig;
use crate::probe::ImageDimension;
use std::ops::{Add, Div, Mul, Sub};

/// A 2D vector in viewport units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Clamp each axis to `[-bound, bound]`.
    pub fn clamp_symmetric(self, bound: Vec2) -> Self {
        Self {
            x: self.x.max(-bound.x).min(bound.x),
            y: self.y.max(-bound.y).min(bound.y),
        }
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vec2 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Idle,
    Dragging,
    Momentum,
}

/// Observable state of a detail-view session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerState {
    pub zoom: f64,
    pub pan: Vec2,
    /// Pan units per frame.
    pub velocity: Vec2,
    pub mode: Mode,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            velocity: Vec2::ZERO,
            mode: Mode::Idle,
        }
    }
}

/// Size of `image` scaled to fit entirely inside `viewport`.
pub fn fit_within(image: ImageDimension, viewport: Vec2) -> Vec2 {
    let (width, height) = (f64::from(image.width), f64::from(image.height));
    if width <= 0.0 || height <= 0.0 {
        return Vec2::ZERO;
    }
    let scale = (viewport.x / width).min(viewport.y / height).max(0.0);
    Vec2::new(width * scale, height * scale)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragAnchor {
    pointer: Vec2,
    pan: Vec2,
    last_pointer: Vec2,
    last_time_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ResetTransition {
    from_zoom: f64,
    from_pan: Vec2,
    frame: u32,
    frames: u32,
}

/// The single owner of ongoing motion.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Animation {
    None,
    Momentum,
    Reset(ResetTransition),
}

/// Interaction engine for one detail-view session.
#[derive(Debug, Clone)]
pub struct ViewerEngine {
    config: ViewerConfig,
    state: ViewerState,
    viewport: Vec2,
    image: Option<(String, ImageDimension)>,
    animation: Animation,
    drag: Option<DragAnchor>,
}

impl ViewerEngine {
    pub fn new(config: ViewerConfig, viewport: Vec2) -> Self {
        Self {
            config,
            state: ViewerState::default(),
            viewport,
            image: None,
            animation: Animation::None,
            drag: None,
        }
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn current_image(&self) -> Option<&str> {
        self.image.as_ref().map(|(reference, _)| reference.as_str())
    }

    /// Whether the host should keep calling [`tick`](Self::tick).
    pub fn is_animating(&self) -> bool {
        self.animation != Animation::None
    }

    /// Displayed image size at zoom 1.
    pub fn base_size(&self) -> Vec2 {
        self.image
            .as_ref()
            .map_or(Vec2::ZERO, |(_, dimension)| fit_within(*dimension, self.viewport))
    }

    /// Pan bound at the current zoom.
    pub fn max_offset(&self) -> Vec2 {
        self.max_offset_at(self.state.zoom)
    }

    pub fn max_offset_at(&self, zoom: f64) -> Vec2 {
        let scaled = self.base_size() * zoom;
        Vec2::new(
            ((scaled.x - self.viewport.x) / 2.0).max(0.0),
            ((scaled.y - self.viewport.y) / 2.0).max(0.0),
        )
    }

    // ---- session ----

    /// Show a different image: cancels any motion and snaps back to defaults.
    pub fn switch_image(&mut self, reference: &str, dimension: ImageDimension) {
        self.reset();
        self.image = Some((reference.to_string(), dimension));
    }

    /// Tear down the session.
    pub fn end_session(&mut self) {
        self.reset();
        self.image = None;
    }

    /// Change the viewport size and re-clamp the pan offset.
    pub fn resize_viewport(&mut self, viewport: Vec2) {
        self.viewport = Vec2::new(viewport.x.max(0.0), viewport.y.max(0.0));
        self.enforce_bounds();
    }

    // ---- zoom ----

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.state.zoom * self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.state.zoom / self.config.zoom_step);
    }

    /// Apply one wheel event. Negative `delta_y` (scrolling up) zooms in.
    pub fn wheel(&mut self, delta_y: f64) {
        if delta_y < 0.0 {
            self.set_zoom(self.state.zoom * self.config.wheel_zoom_in);
        } else if delta_y > 0.0 {
            self.set_zoom(self.state.zoom * self.config.wheel_zoom_out);
        }
    }

    /// Set the zoom level, clamped to the configured range. A user zoom
    /// interrupts an eased reset.
    pub fn set_zoom(&mut self, zoom: f64) {
        if !zoom.is_finite() {
            return;
        }
        if matches!(self.animation, Animation::Reset(_)) {
            self.animation = Animation::None;
        }
        self.state.zoom = zoom.max(self.config.min_zoom).min(self.config.max_zoom);
        self.enforce_bounds();
    }

    // ---- drag ----

    /// Begin a drag at `pointer`. Ignored unless zoomed in. Cancels any
    /// running animation.
    pub fn drag_start(&mut self, pointer: Vec2, time_ms: f64) -> bool {
        if self.state.zoom <= 1.0 {
            return false;
        }
        self.animation = Animation::None;
        self.drag = Some(DragAnchor {
            pointer,
            pan: self.state.pan,
            last_pointer: pointer,
            last_time_ms: time_ms,
        });
        self.state.velocity = Vec2::ZERO;
        self.state.mode = Mode::Dragging;
        true
    }

    /// Follow the pointer and estimate velocity per frame interval.
    pub fn drag_move(&mut self, pointer: Vec2, time_ms: f64) {
        let Some(anchor) = self.drag.as_mut() else {
            return;
        };
        let frames = (time_ms - anchor.last_time_ms).max(1.0) / self.config.frame_interval_ms;
        let velocity = (pointer - anchor.last_pointer) / frames;
        let target = anchor.pan + (pointer - anchor.pointer);
        anchor.last_pointer = pointer;
        anchor.last_time_ms = time_ms;

        self.state.velocity = velocity;
        self.state.pan = target.clamp_symmetric(self.max_offset());
    }

    /// Release the drag, entering momentum when moving fast enough.
    pub fn drag_end(&mut self) {
        if self.drag.take().is_none() {
            return;
        }
        if self.state.velocity.length() > self.config.momentum_threshold {
            self.state.mode = Mode::Momentum;
            self.animation = Animation::Momentum;
        } else {
            self.settle();
        }
    }

    // ---- animation ----

    /// Advance the running animation by one frame. Returns whether another
    /// frame is needed.
    pub fn tick(&mut self) -> bool {
        match self.animation {
            Animation::None => false,
            Animation::Momentum => self.tick_momentum(),
            Animation::Reset(transition) => self.tick_reset(transition),
        }
    }

    fn tick_momentum(&mut self) -> bool {
        let velocity = self.state.velocity * self.config.friction;
        if velocity.length() < self.config.rest_epsilon {
            self.settle();
            return false;
        }

        let bound = self.max_offset();
        let moved = self.state.pan + velocity;
        let pan = moved.clamp_symmetric(bound);
        // Stop the axis that ran into an edge
        self.state.velocity = Vec2::new(
            if pan.x == moved.x { velocity.x } else { 0.0 },
            if pan.y == moved.y { velocity.y } else { 0.0 },
        );
        self.state.pan = pan;

        if self.state.velocity.length() < self.config.rest_epsilon {
            self.settle();
            return false;
        }
        true
    }

    fn tick_reset(&mut self, mut transition: ResetTransition) -> bool {
        transition.frame += 1;
        if transition.frame >= transition.frames {
            self.animation = Animation::None;
            self.state = ViewerState::default();
            return false;
        }

        let t = f64::from(transition.frame) / f64::from(transition.frames);
        let eased = 1.0 - (1.0 - t).powi(3);
        self.state.zoom = transition.from_zoom + (1.0 - transition.from_zoom) * eased;
        self.state.pan = transition.from_pan * (1.0 - eased);
        self.enforce_bounds();
        self.animation = Animation::Reset(transition);
        true
    }

    /// Stop all motion and return to idle.
    fn settle(&mut self) {
        self.animation = Animation::None;
        self.drag = None;
        self.state.velocity = Vec2::ZERO;
        self.state.mode = Mode::Idle;
    }

    /// Re-establish the pan bound and the zoom <= 1 rule.
    fn enforce_bounds(&mut self) {
        if self.state.zoom <= 1.0 {
            self.state.pan = Vec2::ZERO;
            if self.state.mode != Mode::Idle || self.animation == Animation::Momentum {
                self.settle();
            }
            self.state.velocity = Vec2::ZERO;
        } else {
            self.state.pan = self.state.pan.clamp_symmetric(self.max_offset());
        }
    }

    // ---- reset ----

    /// Snap zoom and pan back to defaults, cancelling any motion.
    pub fn reset(&mut self) {
        self.settle();
        self.state = ViewerState::default();
    }

    /// Ease back to defaults over `reset_frames` ticks.
    pub fn reset_animated(&mut self) {
        let from_zoom = self.state.zoom;
        let from_pan = self.state.pan;
        self.settle();
        if self.config.reset_frames == 0 || (from_zoom == 1.0 && from_pan == Vec2::ZERO) {
            self.state = ViewerState::default();
            return;
        }
        self.animation = Animation::Reset(ResetTransition {
            from_zoom,
            from_pan,
            frame: 0,
            frames: self.config.reset_frames,
        });
    }
}
