//! Mobile navigation menu state.

/// Whether the overlay navigation panel is open.
///
/// The panel and its dimmed backdrop are drawn only while open; renderers ask
/// [`MenuState::overlay_visible`] instead of tracking visibility themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuState {
    open: bool,
}

impl MenuState {
    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// Force the menu closed. Used by nav-link activation and the backdrop.
    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn overlay_visible(&self) -> bool {
        self.open
    }

    /// Glyph shown on the menu button for the current state.
    pub fn button_glyph(&self) -> &'static str {
        if self.open {
            "✖"
        } else {
            "☰"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores_state() {
        for start_open in [false, true] {
            let mut menu = MenuState::default();
            if start_open {
                menu.toggle();
            }
            let before = menu;
            menu.toggle();
            menu.toggle();
            assert_eq!(menu, before);
        }
    }

    #[test]
    fn close_is_idempotent() {
        let mut menu = MenuState::default();
        menu.toggle();
        menu.close();
        menu.close();
        assert!(!menu.is_open());
    }

    #[test]
    fn overlay_tracks_state() {
        let mut menu = MenuState::default();
        assert!(!menu.overlay_visible());
        assert_eq!(menu.button_glyph(), "☰");
        menu.toggle();
        assert!(menu.overlay_visible());
        assert_eq!(menu.button_glyph(), "✖");
    }
}
