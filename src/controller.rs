//! Scroll/navigation controller.
//!
//! Owns the menu state and the progress tracker, and performs anchor
//! navigation against whatever [`Host`] is rendering the page.

use crate::events::EventBus;
use crate::menu::MenuState;
use crate::progress::{ProgressTracker, ScrollMetrics, ScrollProgress};

/// How the host should move the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// Geometry and scrolling primitives of the rendering environment.
pub trait Host {
    /// Document-relative top of the section with anchor `id`, if it exists.
    fn section_top(&self, id: &str) -> Option<f64>;

    /// Current rendered height of the fixed header, if it is mounted.
    fn header_height(&self) -> Option<f64>;

    fn metrics(&self) -> ScrollMetrics;

    /// Request a scroll to `top`. Fire-and-forget: a later request
    /// supersedes this one.
    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior);
}

/// What a navigation request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavigationOutcome {
    Scrolled { top: f64 },
    MissingSection,
    HeaderUnmeasured,
}

pub struct PageController {
    menu: MenuState,
    progress: ProgressTracker,
}

impl PageController {
    /// Mount the controller, registering its listeners on `bus`.
    pub fn mount(bus: &mut EventBus) -> Self {
        Self {
            menu: MenuState::default(),
            progress: ProgressTracker::mount(bus),
        }
    }

    pub fn unmount(self, bus: &mut EventBus) {
        self.progress.unmount(bus);
    }

    pub fn menu(&self) -> MenuState {
        self.menu
    }

    pub fn toggle_menu(&mut self) {
        self.menu.toggle();
    }

    /// Backdrop activation: closes the menu.
    pub fn dismiss_menu(&mut self) {
        self.menu.close();
    }

    pub fn progress(&self) -> ScrollProgress {
        self.progress.current()
    }

    /// Scroll so the section `target` (`"actions"` or `"#actions"`) sits
    /// directly below the fixed header.
    ///
    /// The menu is closed whatever the outcome. Missing sections and an
    /// unmeasured header leave the viewport untouched.
    pub fn navigate_to<H: Host + ?Sized>(&mut self, host: &mut H, target: &str) -> NavigationOutcome {
        self.menu.close();

        let id = target.strip_prefix('#').unwrap_or(target);
        let Some(section_top) = host.section_top(id) else {
            tracing::debug!(section = id, "nav: section not found");
            return NavigationOutcome::MissingSection;
        };
        let Some(header_height) = host.header_height() else {
            tracing::debug!(section = id, "nav: header not measured");
            return NavigationOutcome::HeaderUnmeasured;
        };

        let top = section_top - header_height;
        tracing::debug!(section = id, section_top, header_height, top, "nav: scrolling");
        host.scroll_to(top, ScrollBehavior::Smooth);
        NavigationOutcome::Scrolled { top }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::events::UiEvent;

    #[derive(Default)]
    struct FakeHost {
        sections: HashMap<&'static str, f64>,
        header: Option<f64>,
        metrics: ScrollMetrics,
        requests: Vec<(f64, ScrollBehavior)>,
    }

    impl Host for FakeHost {
        fn section_top(&self, id: &str) -> Option<f64> {
            self.sections.get(id).copied()
        }

        fn header_height(&self) -> Option<f64> {
            self.header
        }

        fn metrics(&self) -> ScrollMetrics {
            self.metrics
        }

        fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior) {
            self.requests.push((top, behavior));
        }
    }

    fn host_with(section: &'static str, top: f64, header: Option<f64>) -> FakeHost {
        FakeHost {
            sections: HashMap::from([(section, top)]),
            header,
            ..FakeHost::default()
        }
    }

    #[test]
    fn target_sits_below_header() {
        let mut bus = EventBus::new();
        let mut ctl = PageController::mount(&mut bus);
        let mut host = host_with("actions", 1200.0, Some(64.0));

        let outcome = ctl.navigate_to(&mut host, "#actions");

        assert_eq!(outcome, NavigationOutcome::Scrolled { top: 1136.0 });
        assert_eq!(host.requests, vec![(1136.0, ScrollBehavior::Smooth)]);
    }

    #[test]
    fn bare_and_hashed_ids_are_equivalent() {
        let mut bus = EventBus::new();
        let mut ctl = PageController::mount(&mut bus);
        let mut host = host_with("actions", 500.0, Some(40.0));

        let a = ctl.navigate_to(&mut host, "actions");
        let b = ctl.navigate_to(&mut host, "#actions");
        assert_eq!(a, b);
    }

    #[test]
    fn navigation_closes_open_menu() {
        let mut bus = EventBus::new();
        let mut ctl = PageController::mount(&mut bus);
        let mut host = host_with("hero", 0.0, Some(64.0));

        ctl.toggle_menu();
        assert!(ctl.menu().is_open());
        ctl.navigate_to(&mut host, "#hero");
        assert!(!ctl.menu().is_open());
    }

    #[test]
    fn missing_section_does_not_scroll() {
        let mut bus = EventBus::new();
        let mut ctl = PageController::mount(&mut bus);
        let mut host = host_with("actions", 1200.0, Some(64.0));
        ctl.toggle_menu();

        let outcome = ctl.navigate_to(&mut host, "#missing");

        assert_eq!(outcome, NavigationOutcome::MissingSection);
        assert!(host.requests.is_empty());
        assert!(!ctl.menu().is_open());
    }

    #[test]
    fn unmeasured_header_does_not_scroll() {
        let mut bus = EventBus::new();
        let mut ctl = PageController::mount(&mut bus);
        let mut host = host_with("actions", 1200.0, None);

        let outcome = ctl.navigate_to(&mut host, "#actions");

        assert_eq!(outcome, NavigationOutcome::HeaderUnmeasured);
        assert!(host.requests.is_empty());
    }

    #[test]
    fn backdrop_dismisses_menu() {
        let mut bus = EventBus::new();
        let mut ctl = PageController::mount(&mut bus);
        ctl.toggle_menu();
        ctl.dismiss_menu();
        assert!(!ctl.menu().overlay_visible());
    }

    #[test]
    fn progress_reflects_dispatched_scroll() {
        let mut bus = EventBus::new();
        let ctl = PageController::mount(&mut bus);
        bus.dispatch(&UiEvent::Scroll(ScrollMetrics {
            scroll_y: 2000.0,
            document_height: 4800.0,
            viewport_height: 800.0,
        }));
        assert_eq!(ctl.progress().percent(), 50.0);

        ctl.unmount(&mut bus);
        assert_eq!(bus.listener_count(crate::events::EventKind::Scroll), 0);
    }
}
