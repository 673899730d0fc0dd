//! Scroll progress computation and the listener that keeps it current.

use std::cell::Cell;
use std::rc::Rc;

use crate::events::{EventBus, EventKind, Subscription, UiEvent};

/// Snapshot of the host's scroll geometry, in host units (pixels or rows).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_y: f64,
    pub document_height: f64,
    pub viewport_height: f64,
}

/// Percentage of the scrollable distance travelled, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct ScrollProgress(f64);

impl ScrollProgress {
    pub const ZERO: ScrollProgress = ScrollProgress(0.0);

    /// Compute progress from a metrics snapshot.
    ///
    /// A page with no scrollable range reports 0. Rounding at the very top or
    /// bottom of the page can push the raw ratio outside the valid range, so
    /// the result is clamped.
    pub fn from_metrics(m: ScrollMetrics) -> Self {
        let range = m.document_height - m.viewport_height;
        if !(range > 0.0) || !m.scroll_y.is_finite() || !range.is_finite() {
            return Self::ZERO;
        }
        Self((m.scroll_y / range * 100.0).clamp(0.0, 100.0))
    }

    pub fn percent(self) -> f64 {
        self.0
    }

    /// Progress as a fraction in `[0, 1]`, the unit gauge widgets expect.
    pub fn ratio(self) -> f64 {
        self.0 / 100.0
    }
}

/// Keeps a [`ScrollProgress`] up to date by listening to scroll and resize
/// events on an [`EventBus`].
///
/// The listeners live exactly as long as the tracker is mounted: call
/// [`ProgressTracker::unmount`] on teardown.
pub struct ProgressTracker {
    value: Rc<Cell<ScrollProgress>>,
    subscriptions: Vec<Subscription>,
}

impl ProgressTracker {
    pub fn mount(bus: &mut EventBus) -> Self {
        let value = Rc::new(Cell::new(ScrollProgress::ZERO));
        let subscriptions = [EventKind::Scroll, EventKind::Resize]
            .into_iter()
            .map(|kind| {
                let value = Rc::clone(&value);
                bus.subscribe(kind, move |event: &UiEvent| {
                    value.set(ScrollProgress::from_metrics(event.metrics()));
                })
            })
            .collect();
        Self {
            value,
            subscriptions,
        }
    }

    /// Latest computed progress.
    pub fn current(&self) -> ScrollProgress {
        self.value.get()
    }

    /// Deregister every listener this tracker installed.
    pub fn unmount(self, bus: &mut EventBus) {
        for sub in self.subscriptions {
            let kind = sub.kind();
            if !bus.unsubscribe(sub) {
                tracing::debug!(?kind, "progress: listener already removed");
            }
        }
    }
}
