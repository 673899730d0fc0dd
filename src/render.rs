//! Terminal page layout.
//!
//! Lays the page content out as styled ratatui [`Text`] for a given width and
//! records the row each section starts on, which is what the terminal host
//! reports as a section's document-relative top.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
};

use crate::config::SiteConfig;
use crate::content::{self, SectionId, ACTION_GROUPS, PREVENTION_TIPS, TRANSMISSION_ROUTES};

/// Row at which a section begins in the rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionPosition {
    pub id: SectionId,
    /// 0-based line index in the rendered output.
    pub rendered_line: usize,
}

pub struct RenderedPage {
    pub text: Text<'static>,
    pub sections: Vec<SectionPosition>,
}

impl RenderedPage {
    pub fn total_lines(&self) -> usize {
        self.text.lines.len()
    }

    pub fn section_line(&self, anchor: &str) -> Option<usize> {
        let id = SectionId::from_anchor(anchor)?;
        self.sections
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.rendered_line)
    }

    /// The most recent section starting at or before `line`.
    pub fn section_at(&self, line: usize) -> Option<SectionId> {
        self.sections
            .iter()
            .rev()
            .find(|s| s.rendered_line <= line)
            .map(|s| s.id)
    }
}

/// Everything the layout needs besides the static content.
pub struct PageOptions<'a> {
    pub width: u16,
    /// Blank rows above the hero so the fixed header does not cover it.
    pub hero_padding: u16,
    pub config: &'a SiteConfig,
    pub footer_text: &'a str,
}

pub fn heading_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn marker_style() -> Style {
    Style::default().fg(Color::LightRed)
}

fn link_style() -> Style {
    Style::default()
        .fg(Color::Blue)
        .add_modifier(Modifier::UNDERLINED)
}

fn key_style() -> Style {
    Style::default()
        .fg(Color::Green)
        .add_modifier(Modifier::BOLD)
}

/// Columns `text` occupies in a terminal cell grid.
pub fn display_width(text: &str) -> usize {
    Span::raw(text).width()
}

/// Split `word` after the longest prefix that fits in `width` columns.
/// At least one character always goes to the head.
fn split_at_width(word: &str, width: usize) -> (&str, &str) {
    let mut used = 0;
    let mut buf = [0u8; 4];
    for (i, c) in word.char_indices() {
        let w = display_width(c.encode_utf8(&mut buf));
        if used + w > width && i > 0 {
            return word.split_at(i);
        }
        used += w;
    }
    (word, "")
}

/// Greedy word wrap on display width. Words wider than `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for word in text.split_whitespace() {
        let mut word = word;
        let mut word_width = display_width(word);
        while word_width > width {
            if current_width > 0 {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            let (head, rest) = split_at_width(word, width);
            lines.push(head.to_owned());
            word = rest;
            word_width = display_width(word);
        }
        if word.is_empty() {
            continue;
        }
        let needed = if current_width == 0 {
            word_width
        } else {
            current_width + 1 + word_width
        };
        if needed > width && current_width > 0 {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        if current_width > 0 {
            current.push(' ');
            current_width += 1;
        }
        current.push_str(word);
        current_width += word_width;
    }
    if current_width > 0 {
        lines.push(current);
    }
    lines
}

struct PageBuilder {
    lines: Vec<Line<'static>>,
    sections: Vec<SectionPosition>,
    width: usize,
}

impl PageBuilder {
    fn begin_section(&mut self, id: SectionId) {
        if !self.lines.is_empty() {
            self.blank();
        }
        self.sections.push(SectionPosition {
            id,
            rendered_line: self.lines.len(),
        });
    }

    fn blank(&mut self) {
        self.lines.push(Line::default());
    }

    fn heading(&mut self, text: &str) {
        self.wrapped(Span::styled("▍ ", heading_style()), text, heading_style());
        self.blank();
    }

    /// Wrapped text with `prefix` on the first line and matching indent after.
    fn wrapped(&mut self, prefix: Span<'static>, text: &str, style: Style) {
        let indent = prefix.width();
        let wrapped = wrap(text, self.width.saturating_sub(indent));
        for (i, part) in wrapped.into_iter().enumerate() {
            let lead = if i == 0 {
                prefix.clone()
            } else {
                Span::raw(" ".repeat(indent))
            };
            self.lines
                .push(Line::from(vec![lead, Span::styled(part, style)]));
        }
    }

    /// Bracketed `[alt: path]` stand-in for an image.
    fn image(&mut self, alt: &str, path: &str) {
        self.wrapped(
            Span::raw(""),
            &format!("[{alt}: {path}]"),
            Style::default().fg(Color::DarkGray),
        );
    }

    /// `[key] label` followed by the URL on its own indented lines.
    fn keyed_link(&mut self, key: char, label: &str, url: &str) {
        self.wrapped(
            Span::styled(format!("[{key}] "), key_style()),
            label,
            Style::default().add_modifier(Modifier::BOLD),
        );
        self.wrapped(Span::raw("    "), url, link_style());
    }
}

/// Lay the page out for `opts.width` columns.
pub fn render_page(opts: &PageOptions) -> RenderedPage {
    let mut b = PageBuilder {
        lines: Vec::new(),
        sections: Vec::new(),
        width: usize::from(opts.width).saturating_sub(2).max(10),
    };

    // Hero
    b.begin_section(SectionId::Hero);
    for _ in 0..opts.hero_padding {
        b.blank();
    }
    b.blank();
    b.wrapped(
        Span::raw("  "),
        content::TITLE,
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
    );
    b.blank();
    b.wrapped(
        Span::raw("  "),
        content::HERO_SUBTITLE,
        Style::default().add_modifier(Modifier::ITALIC),
    );
    b.blank();

    // Understanding
    b.begin_section(SectionId::Understanding);
    b.heading(content::UNDERSTANDING_HEADING);
    b.wrapped(Span::raw(""), content::UNDERSTANDING_TEXT, Style::default());
    b.blank();
    b.image(
        content::TRANSMISSION_IMAGE.alt,
        content::TRANSMISSION_IMAGE.path,
    );

    // Information
    b.begin_section(SectionId::Information);
    b.heading(content::INFORMATION_HEADING);
    let [_, path_header, disease_header] = content::TABLE_HEADERS;
    let table_header = Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    b.wrapped(
        Span::styled("#  ", table_header),
        &format!("{path_header} / {disease_header}"),
        table_header,
    );
    for row in &TRANSMISSION_ROUTES {
        b.blank();
        b.wrapped(
            Span::styled(format!("{}. ", row.id), marker_style()),
            row.path,
            Style::default().add_modifier(Modifier::BOLD),
        );
        b.wrapped(Span::raw("   "), row.diseases, Style::default());
    }

    // Prevention
    b.begin_section(SectionId::Prevention);
    b.heading(content::PREVENTION_HEADING);
    for tip in &PREVENTION_TIPS {
        b.wrapped(
            Span::styled(format!("{} ", content::TIP_MARKER), marker_style()),
            tip,
            Style::default(),
        );
    }
    b.blank();
    b.keyed_link('i', content::MORE_INFO_LABEL, &opts.config.more_info_url);

    // Video
    b.begin_section(SectionId::Video);
    b.heading(content::VIDEO_HEADING);
    b.keyed_link('v', content::VIDEO_TITLE, &opts.config.video_url);

    // Actions
    b.begin_section(SectionId::Actions);
    b.heading(content::ACTIONS_HEADING);
    for (i, group) in ACTION_GROUPS.iter().enumerate() {
        if i > 0 {
            b.blank();
        }
        b.wrapped(
            Span::raw(""),
            group.title,
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        );
        for item in &group.items {
            b.wrapped(
                Span::styled(format!("{} ", content::ACTION_MARKER), marker_style()),
                item,
                Style::default(),
            );
        }
    }

    // Call
    b.begin_section(SectionId::Call);
    b.heading(content::CALL_HEADING);
    b.wrapped(
        Span::styled("[c] ", key_style()),
        &format!(
            "{} {}",
            content::CALL_ICON,
            content::call_label(&opts.config.emergency_number)
        ),
        Style::default()
            .fg(Color::White)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD),
    );

    // Quote
    b.begin_section(SectionId::Quote);
    b.image(content::LOGO_IMAGE.alt, content::LOGO_IMAGE.path);
    b.wrapped(
        Span::styled("  ▌ ", Style::default().fg(Color::DarkGray)),
        content::QUOTE_TEXT,
        Style::default().add_modifier(Modifier::ITALIC).fg(Color::Gray),
    );
    b.wrapped(Span::raw("    "), content::QUOTE_ATTRIBUTION, Style::default());

    // Footer
    b.begin_section(SectionId::Footer);
    b.lines.push(Line::from(Span::styled(
        "─".repeat(b.width.min(60)),
        Style::default().fg(Color::DarkGray),
    )));
    b.wrapped(
        Span::raw(""),
        opts.footer_text,
        Style::default().fg(Color::Gray),
    );

    RenderedPage {
        text: Text::from(b.lines),
        sections: b.sections,
    }
}
