//! Current Selection: the data-space coordinate published by a clickable plot.
//!
//! [`SelectionBinding`] is a cheap, clonable handle. The widget is its only
//! writer; any number of readers may poll [`SelectionBinding::get`] or
//! [`subscribe`](SelectionBinding::subscribe) to be told about every update so
//! they can redraw dependent plots.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::SetupError;
use crate::geometry::PlotPos;

/// Notification sent to subscribers on every publish.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionUpdate {
    pub pos: PlotPos,
    /// Number of publishes so far, including this one.
    pub version: u64,
}

#[derive(Clone)]
pub struct SelectionBinding {
    inner: Arc<Mutex<SelectionInner>>,
}

struct SelectionInner {
    value: Option<PlotPos>,
    /// Incremented on every publish; a seeded default does not count.
    version: u64,
    listeners: Vec<Sender<SelectionUpdate>>,
}

impl SelectionBinding {
    /// An unset binding; [`get`](Self::get) returns `None` until the first
    /// interaction.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SelectionInner {
                value: None,
                version: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// A binding seeded with `default`, so readers see a value before the first
    /// interaction.
    pub fn with_default(default: PlotPos) -> Result<Self, SetupError> {
        let binding = Self::new();
        binding.seed(default)?;
        Ok(binding)
    }

    fn lock(&self) -> MutexGuard<'_, SelectionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the initial value. Only valid before anything was published.
    ///
    /// Subscribers are not notified: the default is the state they start from.
    pub fn seed(&self, default: PlotPos) -> Result<(), SetupError> {
        if !default.is_finite() {
            return Err(SetupError::Binding(format!(
                "default selection ({}, {}) is not finite",
                default.x, default.y
            )));
        }
        let mut inner = self.lock();
        if inner.version > 0 {
            return Err(SetupError::Binding(format!(
                "cannot seed a default after {} interactive update(s) were published",
                inner.version
            )));
        }
        inner.value = Some(default);
        Ok(())
    }

    /// Current value, or `None` before any interaction on an unseeded binding.
    pub fn get(&self) -> Option<PlotPos> {
        self.lock().value
    }

    /// Number of publishes so far.
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    /// Receive a [`SelectionUpdate`] for every future publish.
    pub fn subscribe(&self) -> Receiver<SelectionUpdate> {
        let (tx, rx) = std::sync::mpsc::channel();
        self.lock().listeners.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Offer a possibly-missing update. `None` is ignored and leaves the
    /// current value in place. Returns whether anything was published.
    ///
    /// Only the owning widget writes; clones held by readers can `get` and
    /// `subscribe` but not publish.
    pub(crate) fn offer(&self, pos: Option<PlotPos>) -> bool {
        match pos {
            Some(pos) => {
                self.publish(pos);
                true
            }
            None => {
                log::trace!("ignoring missing selection update");
                false
            }
        }
    }

    /// Store `pos` and notify subscribers. Closed channels are pruned.
    pub(crate) fn publish(&self, pos: PlotPos) -> u64 {
        let mut inner = self.lock();
        inner.value = Some(pos);
        inner.version += 1;
        let update = SelectionUpdate {
            pos,
            version: inner.version,
        };
        inner.listeners.retain(|tx| tx.send(update).is_ok());
        log::debug!(
            "selection v{} -> ({:.3}, {:.3})",
            update.version,
            pos.x,
            pos.y
        );
        update.version
    }
}

impl Default for SelectionBinding {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SelectionBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SelectionBinding")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}
