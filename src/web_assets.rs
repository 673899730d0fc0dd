//! Embedded static web assets for serve mode.
//!
//! Both files are compiled into the binary via `include_str!` so the binary
//! is fully self-contained; only the page images live on disk.

/// URL path the stylesheet is served from.
pub const CSS_PATH: &str = "/assets/site.css";

/// URL path the script is served from.
pub const JS_PATH: &str = "/assets/site.js";

/// Stylesheet for the page.
///
/// Loaded from `src/assets/site.css` at compile time.
pub const CSS: &str = include_str!("assets/site.css");

/// Browser-side scroll/navigation controller.
///
/// Tracks scroll progress, toggles the mobile menu, performs header-offset
/// anchor navigation and wires the call button. Reads its settings from the
/// `#site-config` JSON element emitted by the page.
/// Loaded from `src/assets/site.js` at compile time.
pub const JS: &str = include_str!("assets/site.js");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_binds_navigation_from_client_config() {
        assert!(JS.contains("config.navTargets"));
        assert!(JS.contains("a[data-nav=\"' + target + '\"]"));
        assert!(!JS.contains("querySelectorAll('a[data-nav]')"));
    }

    #[test]
    fn script_dials_configured_number() {
        assert!(JS.contains("'tel:' + config.emergencyNumber"));
    }
}
