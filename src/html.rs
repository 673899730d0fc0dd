//! HTML rendering for serve mode.
//!
//! Builds the single public page from [`crate::content`]: fixed progress bar,
//! fixed header with the mobile menu, every content section, and the footer.
//! Behavior lives in the embedded `site.js`; this module only emits markup and
//! the JSON config blob the script reads on load.

use serde::Serialize;

use crate::config::SiteConfig;
use crate::content::{
    self, ActionGroup, NavLink, SectionId, StaticImage, TransmissionRoute, ACTION_GROUPS,
    NAV_LINKS, PREVENTION_TIPS, TRANSMISSION_ROUTES,
};
use crate::web_assets;

/// Values handed to `site.js` through `<script type="application/json">`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig<'a> {
    pub emergency_number: &'a str,
    pub nav_targets: Vec<&'static str>,
}

impl<'a> ClientConfig<'a> {
    pub fn new(site: &'a SiteConfig) -> Self {
        Self {
            emergency_number: &site.emergency_number,
            nav_targets: NAV_LINKS.iter().map(|l| l.target.anchor()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Minimal HTML entity escaping for text content and attribute values.
fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize the client config for embedding inside a `<script>` element.
///
/// `<` is escaped so no value can close the element early.
fn client_config_json(config: &ClientConfig) -> String {
    serde_json::to_string(config)
        .unwrap_or_else(|_| "{}".to_owned())
        .replace('<', "\\u003c")
}

fn nav_link_html(link: &NavLink) -> String {
    let anchor = link.target.anchor();
    format!(
        "<a href=\"#{anchor}\" data-nav=\"{anchor}\" title=\"{}\">{}</a>\n",
        html_escape(link.title),
        html_escape(link.label),
    )
}

fn image_html(image: &StaticImage, class: &str) -> String {
    format!(
        "<img class=\"{class}\" src=\"{}\" alt=\"{}\">",
        html_escape(image.path),
        html_escape(image.alt),
    )
}

fn section_heading(text: &str, accent: &str) -> String {
    format!(
        "<h2 class=\"section-heading accent-{accent}\">{}</h2>\n",
        html_escape(text)
    )
}

fn build_header(menu_label: &str) -> String {
    let links: String = NAV_LINKS.iter().map(nav_link_html).collect();
    format!(
        "<header id=\"site-header\" class=\"site-header\">\n\
<div class=\"header-bar\">\n\
<button id=\"menu-toggle\" class=\"menu-toggle\" type=\"button\" aria-expanded=\"false\">{menu_label}</button>\n\
<nav id=\"site-nav\" class=\"site-nav\">\n\
{links}</nav>\n\
</div>\n\
<div id=\"menu-backdrop\" class=\"menu-backdrop\" hidden></div>\n\
</header>\n"
    )
}

fn build_hero() -> String {
    format!(
        "<section id=\"{}\" class=\"hero\">\n\
<div class=\"hero-inner\">\n\
<h1>{}</h1>\n\
<p>{}</p>\n\
</div>\n\
</section>\n",
        SectionId::Hero.anchor(),
        html_escape(content::TITLE),
        html_escape(content::HERO_SUBTITLE),
    )
}

fn build_understanding() -> String {
    format!(
        "<section id=\"{}\" class=\"section\">\n\
<div class=\"container\">\n\
{}\
<p class=\"lead\">{}</p>\n\
<div class=\"figure\">{}</div>\n\
</div>\n\
</section>\n",
        SectionId::Understanding.anchor(),
        section_heading(content::UNDERSTANDING_HEADING, "teal"),
        html_escape(content::UNDERSTANDING_TEXT),
        image_html(&content::TRANSMISSION_IMAGE, "figure-image"),
    )
}

fn table_row_html(row: &TransmissionRoute) -> String {
    format!(
        "<tr><td>{}</td><td class=\"route\">{}</td><td>{}</td></tr>\n",
        row.id,
        html_escape(row.path),
        html_escape(row.diseases),
    )
}

fn build_information() -> String {
    let headers: String = content::TABLE_HEADERS
        .iter()
        .map(|h| format!("<th>{}</th>", html_escape(h)))
        .collect();
    let rows: String = TRANSMISSION_ROUTES.iter().map(table_row_html).collect();
    format!(
        "<section id=\"{}\" class=\"section tinted\">\n\
<div class=\"container\">\n\
{}\
<div class=\"table-scroll\">\n\
<table class=\"routes\">\n\
<thead><tr>{headers}</tr></thead>\n\
<tbody>\n\
{rows}</tbody>\n\
</table>\n\
</div>\n\
</div>\n\
</section>\n",
        SectionId::Information.anchor(),
        section_heading(content::INFORMATION_HEADING, "orange"),
    )
}

fn build_prevention(more_info_url: &str) -> String {
    let tips: String = PREVENTION_TIPS
        .iter()
        .enumerate()
        .map(|(i, tip)| {
            format!(
                "<li style=\"--delay:{}ms\"><span class=\"marker\">{}</span><span>{}</span></li>\n",
                i * 100,
                content::TIP_MARKER,
                html_escape(tip),
            )
        })
        .collect();
    format!(
        "<section id=\"{}\" class=\"section\">\n\
<div class=\"container\">\n\
{}\
<ul class=\"tips\">\n\
{tips}</ul>\n\
<a class=\"button button-orange\" href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>\n\
</div>\n\
</section>\n",
        SectionId::Prevention.anchor(),
        section_heading(content::PREVENTION_HEADING, "orange"),
        html_escape(more_info_url),
        html_escape(content::MORE_INFO_LABEL),
    )
}

fn build_video(video_url: &str) -> String {
    format!(
        "<section id=\"{}\" class=\"section\">\n\
<div class=\"container\">\n\
{}\
<div class=\"video-frame\">\n\
<iframe src=\"{}\" title=\"{}\" allow=\"accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture\" allowfullscreen></iframe>\n\
</div>\n\
</div>\n\
</section>\n",
        SectionId::Video.anchor(),
        section_heading(content::VIDEO_HEADING, "teal"),
        html_escape(video_url),
        html_escape(content::VIDEO_TITLE),
    )
}

fn action_group_html(index: usize, group: &ActionGroup) -> String {
    let items: String = group
        .items
        .iter()
        .map(|item| {
            format!(
                "<li><span class=\"marker\">{}</span>{}</li>\n",
                content::ACTION_MARKER,
                html_escape(item)
            )
        })
        .collect();
    format!(
        "<div class=\"action-group\" style=\"--delay:{}ms\">\n\
<h3>{}</h3>\n\
<ul>\n\
{items}</ul>\n\
</div>\n",
        index * 200,
        html_escape(group.title),
    )
}

fn build_actions() -> String {
    let groups: String = ACTION_GROUPS
        .iter()
        .enumerate()
        .map(|(i, g)| action_group_html(i, g))
        .collect();
    format!(
        "<section id=\"{}\" class=\"section\">\n\
<div class=\"container\">\n\
{}\
<div class=\"action-grid\">\n\
{groups}</div>\n\
</div>\n\
</section>\n",
        SectionId::Actions.anchor(),
        section_heading(content::ACTIONS_HEADING, "teal"),
    )
}

fn build_call(number: &str) -> String {
    format!(
        "<section id=\"{}\" class=\"section call\">\n\
<div class=\"container centered\">\n\
<h2 class=\"section-heading accent-red inline\">{}</h2>\n\
<a id=\"call-button\" class=\"call-button\" href=\"tel:{}\"><span class=\"call-icon\">{}</span> {}</a>\n\
</div>\n\
</section>\n",
        SectionId::Call.anchor(),
        html_escape(content::CALL_HEADING),
        html_escape(number),
        content::CALL_ICON,
        html_escape(&content::call_label(number)),
    )
}

fn build_quote() -> String {
    format!(
        "<section id=\"{}\" class=\"section tinted\">\n\
<div class=\"container quote\">\n\
<div class=\"quote-logo\">{}</div>\n\
<div>\n\
<blockquote>{}</blockquote>\n\
<p class=\"attribution\">{}</p>\n\
</div>\n\
</div>\n\
</section>\n",
        SectionId::Quote.anchor(),
        image_html(&content::LOGO_IMAGE, "logo"),
        html_escape(content::QUOTE_TEXT),
        html_escape(content::QUOTE_ATTRIBUTION),
    )
}

fn build_footer(footer_text: &str) -> String {
    format!(
        "<footer id=\"{}\" class=\"site-footer\">\n<p>{}</p>\n</footer>\n",
        SectionId::Footer.anchor(),
        html_escape(footer_text),
    )
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the complete HTML document for the page.
///
/// `footer_text` is passed in so callers decide which year it shows.
pub fn build_page(config: &SiteConfig, footer_text: &str) -> String {
    let client_json = client_config_json(&ClientConfig::new(config));
    let header = build_header(crate::menu::MenuState::default().button_glyph());
    let sections = [
        build_hero(),
        build_understanding(),
        build_information(),
        build_prevention(&config.more_info_url),
        build_video(&config.video_url),
        build_actions(),
        build_call(&config.emergency_number),
        build_quote(),
        build_footer(footer_text),
    ]
    .concat();

    format!(
        "<!DOCTYPE html>\n\
<html lang=\"mn\">\n\
<head>\n\
<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>{title}</title>\n\
<meta name=\"description\" content=\"{description}\">\n\
<link rel=\"stylesheet\" href=\"{css}\">\n\
</head>\n\
<body>\n\
<div class=\"progress-track\"><div id=\"scroll-progress\" class=\"progress-fill\" style=\"width:0%\"></div></div>\n\
{header}\
<main>\n\
{sections}</main>\n\
<script id=\"site-config\" type=\"application/json\">{client_json}</script>\n\
<script src=\"{js}\"></script>\n\
</body>\n\
</html>\n",
        title = html_escape(content::TITLE),
        description = html_escape(content::DESCRIPTION),
        css = web_assets::CSS_PATH,
        js = web_assets::JS_PATH,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> String {
        build_page(&SiteConfig::default(), &content::footer_text(2025))
    }

    #[test]
    fn escape_special_characters() {
        assert_eq!(
            html_escape("<a href=\"x\">'&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn every_section_has_its_anchor() {
        let html = page();
        for section in SectionId::ALL {
            assert!(
                html.contains(&format!("id=\"{}\"", section.anchor())),
                "missing section {}",
                section.anchor()
            );
        }
    }

    #[test]
    fn nav_links_target_sections_in_order() {
        let html = page();
        let positions: Vec<usize> = NAV_LINKS
            .iter()
            .map(|l| {
                html.find(&format!("data-nav=\"{}\"", l.target.anchor()))
                    .expect("nav link present")
            })
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(html.contains("href=\"#actions\""));
    }

    #[test]
    fn header_has_menu_button_and_hidden_backdrop() {
        let html = page();
        assert!(html.contains("id=\"menu-toggle\""));
        assert!(html.contains("☰"));
        assert!(html.contains("id=\"menu-backdrop\" class=\"menu-backdrop\" hidden"));
    }

    #[test]
    fn table_lists_every_route() {
        let html = page();
        assert_eq!(html.matches("<td class=\"route\">").count(), 4);
        assert!(html.contains("Амьсгалын замаар"));
    }

    #[test]
    fn tips_and_actions_rendered() {
        let html = page();
        assert_eq!(html.matches(content::TIP_MARKER).count(), PREVENTION_TIPS.len());
        assert!(html.contains("Дэгдэлтийн Үед"));
        assert!(html.contains("Тархалтыг хянах."));
    }

    #[test]
    fn call_button_uses_configured_number() {
        let config = SiteConfig {
            emergency_number: "103".to_owned(),
            ..SiteConfig::default()
        };
        let html = build_page(&config, "footer");
        assert!(html.contains("href=\"tel:103\""));
        assert!(html.contains("103 Залгах"));
        assert!(html.contains("\"emergencyNumber\":\"103\""));
    }

    #[test]
    fn video_and_more_info_links_present() {
        let html = page();
        assert!(html.contains("src=\"https://www.youtube.com/embed/iqyubMcvK-w\""));
        assert!(html.contains("href=\"https://nema.gov.mn/uridchilan-sergiileh\""));
    }

    #[test]
    fn images_and_footer_present() {
        let html = page();
        assert!(html.contains("src=\"/images/image.png\""));
        assert!(html.contains("src=\"/images/MUST-logo.png\""));
        assert!(html.contains("© 2025 он."));
    }

    #[test]
    fn client_config_lists_nav_targets() {
        let config = SiteConfig::default();
        let json = client_config_json(&ClientConfig::new(&config));
        assert_eq!(
            json,
            "{\"emergencyNumber\":\"105\",\"navTargets\":[\"hero\",\"understanding\",\"prevention\",\"actions\"]}"
        );
    }

    #[test]
    fn every_nav_link_is_a_client_nav_target() {
        let html = page();
        let targets = ClientConfig::new(&SiteConfig::default()).nav_targets;
        let linked: Vec<&str> = html
            .split("data-nav=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .collect();
        assert_eq!(linked, targets);
    }

    #[test]
    fn client_config_cannot_close_script_element() {
        let nasty = SiteConfig {
            emergency_number: "</script>".to_owned(),
            ..SiteConfig::default()
        };
        let json = client_config_json(&ClientConfig::new(&nasty));
        assert!(!json.contains("</script>"));
    }

    #[test]
    fn page_links_embedded_assets() {
        let html = page();
        assert!(html.contains("href=\"/assets/site.css\""));
        assert!(html.contains("<script src=\"/assets/site.js\">"));
        assert!(html.contains("id=\"scroll-progress\""));
    }
}
