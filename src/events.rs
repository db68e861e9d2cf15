//! Widget event stream.
//!
//! Callers can subscribe to pointer and selection events of a
//! [`ClickablePlot`](crate::widget::ClickablePlot) via [`EventController`].
//! Each event carries a set of [`EventKind`] flags so that a single occurrence
//! can match multiple categories (a press that published a coordinate is both
//! `PRESS` and `SELECTION`).
//!
//! The caller specifies an [`EventFilter`] to receive only the events they
//! care about. The filter is a simple OR mask: an event is delivered when
//! `(event.kinds & filter) != 0`.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::geometry::{AxisLimits, Fraction, PlotGeometry, PlotPos, ScreenPos};

// ─────────────────────────────────────────────────────────────────────────────
// EventKind – bitflags
// ─────────────────────────────────────────────────────────────────────────────

/// Bitflags describing the categories an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKind(pub u32);

impl EventKind {
    /// Pointer went down over the image.
    pub const PRESS: Self = Self(1 << 0);
    /// Pointer moved while pressed in draggable mode.
    pub const DRAG: Self = Self(1 << 1);
    /// Pointer was released; move tracking detached.
    pub const RELEASE: Self = Self(1 << 2);
    /// Pointer left the window while pressed; move tracking detached.
    pub const LEAVE: Self = Self(1 << 3);
    /// A new coordinate was published to the selection binding.
    pub const SELECTION: Self = Self(1 << 4);
    /// A press was ignored by the one-shot guard.
    pub const SUPPRESSED: Self = Self(1 << 5);
    /// The raster, geometry or limits were replaced and the transform rebuilt.
    pub const RERENDER: Self = Self(1 << 6);

    /// Wildcard: matches every event kind.
    pub const ALL: Self = Self(u32::MAX);

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check whether `self` contains all bits in `other`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check whether `self` intersects with `other`.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventKind {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for EventKind {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for EventKind {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "EMPTY");
        }
        if *self == EventKind::ALL {
            return write!(f, "ALL");
        }

        let pairs: &[(EventKind, &str)] = &[
            (EventKind::PRESS, "PRESS"),
            (EventKind::DRAG, "DRAG"),
            (EventKind::RELEASE, "RELEASE"),
            (EventKind::LEAVE, "LEAVE"),
            (EventKind::SELECTION, "SELECTION"),
            (EventKind::SUPPRESSED, "SUPPRESSED"),
            (EventKind::RERENDER, "RERENDER"),
        ];

        let mut names = Vec::new();
        let mut known_bits = 0u32;
        for (kind, name) in pairs {
            known_bits |= kind.0;
            if self.contains(*kind) {
                names.push((*name).to_string());
            }
        }
        let extra = self.0 & !known_bits;
        if extra != 0 {
            names.push(format!("0x{:x}", extra));
        }
        write!(f, "{}", names.join("|"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Metadata
// ─────────────────────────────────────────────────────────────────────────────

/// Pointer details of a press/drag event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerMeta {
    /// Pointer position in screen pixels.
    pub screen_pos: ScreenPos,
    /// Position relative to the rendered image.
    pub fraction: Fraction,
    /// Clamped data-space coordinate.
    pub plot_pos: PlotPos,
}

/// Geometry snapshot attached to re-render events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderMeta {
    pub geometry: PlotGeometry,
    pub limits: AxisLimits,
    /// Widget generation after the re-render.
    pub generation: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// WidgetEvent
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WidgetEvent {
    pub kinds: EventKind,
    /// Seconds since the controller was created; set on emit.
    pub timestamp: f64,
    pub pointer: Option<PointerMeta>,
    pub render: Option<RenderMeta>,
}

impl WidgetEvent {
    pub fn new(kinds: EventKind) -> Self {
        Self {
            kinds,
            timestamp: 0.0,
            pointer: None,
            render: None,
        }
    }

    pub fn with_pointer(mut self, meta: PointerMeta) -> Self {
        self.pointer = Some(meta);
        self
    }

    pub fn with_render(mut self, meta: RenderMeta) -> Self {
        self.render = Some(meta);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventFilter
// ─────────────────────────────────────────────────────────────────────────────

/// OR-mask selecting which event categories a subscriber receives.
#[derive(Debug, Clone, Copy)]
pub struct EventFilter {
    pub mask: EventKind,
}

impl EventFilter {
    pub const fn all() -> Self {
        Self {
            mask: EventKind::ALL,
        }
    }

    pub const fn only(mask: EventKind) -> Self {
        Self { mask }
    }

    #[inline]
    pub fn matches(&self, event: &WidgetEvent) -> bool {
        event.kinds.intersects(self.mask)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventController
// ─────────────────────────────────────────────────────────────────────────────

struct Subscriber {
    filter: EventFilter,
    sender: Sender<WidgetEvent>,
}

/// Collects widget events and distributes them to subscribers.
///
/// Attach it to a widget through
/// [`ClickablePlotConfig::events`](crate::config::ClickablePlotConfig) and call
/// [`subscribe`](Self::subscribe) to receive events on an `mpsc` channel.
#[derive(Clone)]
pub struct EventController {
    inner: Arc<Mutex<EventCtrlInner>>,
}

struct EventCtrlInner {
    subscribers: Vec<Subscriber>,
    start_instant: std::time::Instant,
}

impl EventController {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventCtrlInner {
                subscribers: Vec::new(),
                start_instant: std::time::Instant::now(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EventCtrlInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to events matching the given filter.
    pub fn subscribe(&self, filter: EventFilter) -> Receiver<WidgetEvent> {
        let (tx, rx) = std::sync::mpsc::channel();
        self.lock().subscribers.push(Subscriber { filter, sender: tx });
        rx
    }

    pub fn subscribe_all(&self) -> Receiver<WidgetEvent> {
        self.subscribe(EventFilter::all())
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Emit an event to all matching subscribers, pruning closed channels.
    pub fn emit(&self, mut event: WidgetEvent) {
        let mut inner = self.lock();
        event.timestamp = inner.start_instant.elapsed().as_secs_f64();
        inner.subscribers.retain(|sub| {
            if sub.filter.matches(&event) {
                sub.sender.send(event.clone()).is_ok()
            } else {
                true
            }
        });
        log::trace!("widget event {} emitted", event.kinds);
    }
}

impl Default for EventController {
    fn default() -> Self {
        Self::new()
    }
}
