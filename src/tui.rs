//! Terminal viewer.
//!
//! Rows are the unit of geometry. The header is drawn over the top rows of the
//! content viewport, the same way the web page's fixed header overlays the
//! document, so anchor navigation has to land sections below it.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, LineGauge, Paragraph},
    DefaultTerminal, Frame,
};

use crate::config::SiteConfig;
use crate::content::{self, SectionId, NAV_LINKS};
use crate::controller::{Host, NavigationOutcome, PageController, ScrollBehavior};
use crate::events::{EventBus, EventKind, UiEvent};
use crate::launch::{self, EmergencyCall, SystemDialer};
use crate::menu::MenuState;
use crate::progress::ScrollMetrics;
use crate::render::{self, PageOptions, RenderedPage};

/// Terminals at least this wide get the inline navigation bar.
pub const WIDE_MIN_WIDTH: u16 = 80;

/// Frame interval while a smooth scroll is in flight.
const FRAME: Duration = Duration::from_millis(16);

const MIN_WIDTH: u16 = 20;
const MIN_HEIGHT: u16 = 8;

pub fn is_wide(width: u16) -> bool {
    width >= WIDE_MIN_WIDTH
}

/// Height of the fixed header for a terminal `width` columns wide.
///
/// Narrow: title row with the menu button, then the border.
/// Wide: title row, navigation row, then the border.
pub fn header_rows(width: u16) -> u16 {
    if is_wide(width) {
        3
    } else {
        2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScrollAnimation {
    target: usize,
}

/// Scrollable viewport over the rendered page.
pub struct PageView {
    page: RenderedPage,
    width: u16,
    viewport_rows: usize,
    /// `None` until the first layout. Every layout measures it, so a laid
    /// out page always has a header.
    header_rows: Option<u16>,
    scroll: usize,
    animation: Option<ScrollAnimation>,
}

impl Default for PageView {
    fn default() -> Self {
        Self {
            page: RenderedPage {
                text: Text::default(),
                sections: Vec::new(),
            },
            width: 0,
            viewport_rows: 0,
            header_rows: None,
            scroll: 0,
            animation: None,
        }
    }
}

impl PageView {
    /// Lay the page out for a `width` x `viewport_rows` content area.
    ///
    /// The page is only re-rendered when the width changes. Returns whether
    /// the geometry changed at all.
    pub fn layout(
        &mut self,
        width: u16,
        viewport_rows: usize,
        config: &SiteConfig,
        footer_text: &str,
    ) -> bool {
        let measured = self.header_rows.is_some();
        if measured && width == self.width && viewport_rows == self.viewport_rows {
            return false;
        }
        if !measured || width != self.width {
            let header = header_rows(width);
            self.page = render::render_page(&PageOptions {
                width,
                hero_padding: header,
                config,
                footer_text,
            });
            self.header_rows = Some(header);
            self.width = width;
            self.animation = None;
            tracing::debug!(width, lines = self.page.total_lines(), "layout: rendered");
        }
        self.viewport_rows = viewport_rows;
        self.scroll = self.scroll.min(self.max_scroll());
        true
    }

    pub fn page(&self) -> &RenderedPage {
        &self.page
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn viewport_rows(&self) -> usize {
        self.viewport_rows
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn max_scroll(&self) -> usize {
        self.page.total_lines().saturating_sub(self.viewport_rows)
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Manual scrolling cancels any smooth scroll in flight.
    pub fn scroll_by(&mut self, delta: isize) {
        self.animation = None;
        self.scroll = self
            .scroll
            .saturating_add_signed(delta)
            .min(self.max_scroll());
    }

    /// Advance a smooth scroll by one frame, easing out toward the target.
    /// Returns whether an animation was running.
    pub fn step_animation(&mut self) -> bool {
        let Some(anim) = self.animation else {
            return false;
        };
        let distance = anim.target.abs_diff(self.scroll);
        let step = (distance / 4).max(1).min(distance);
        if anim.target > self.scroll {
            self.scroll += step;
        } else {
            self.scroll -= step;
        }
        if self.scroll == anim.target {
            self.animation = None;
        }
        true
    }

    /// Section whose content is showing directly below the header.
    pub fn current_section(&self) -> Option<SectionId> {
        let header = usize::from(self.header_rows.unwrap_or(0));
        self.page.section_at(self.scroll + header)
    }

    fn clamp_row(&self, top: f64) -> usize {
        // Float to integer `as` saturates; negative tops land on row 0.
        (top.max(0.0).round() as usize).min(self.max_scroll())
    }
}

impl Host for PageView {
    fn section_top(&self, id: &str) -> Option<f64> {
        self.page.section_line(id).map(|line| line as f64)
    }

    fn header_height(&self) -> Option<f64> {
        self.header_rows.map(f64::from)
    }

    fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_y: self.scroll as f64,
            document_height: self.page.total_lines() as f64,
            viewport_height: self.viewport_rows as f64,
        }
    }

    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior) {
        if !top.is_finite() {
            return;
        }
        let target = self.clamp_row(top);
        match behavior {
            ScrollBehavior::Instant => {
                self.animation = None;
                self.scroll = target;
            }
            ScrollBehavior::Smooth => {
                self.animation = (target != self.scroll).then_some(ScrollAnimation { target });
            }
        }
    }
}

/// What the run loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
    Call,
    Open(String),
}

pub struct Viewer {
    config: SiteConfig,
    footer_text: String,
    view: PageView,
    bus: EventBus,
    controller: PageController,
    call: EmergencyCall,
    /// Highlighted entry of the open menu panel.
    menu_selected: usize,
    notice: Option<String>,
    last_published: Option<ScrollMetrics>,
}

impl Viewer {
    pub fn new(config: SiteConfig, footer_text: String) -> Self {
        let mut bus = EventBus::new();
        let controller = PageController::mount(&mut bus);
        let call = EmergencyCall::new(config.emergency_number.clone());
        Self {
            config,
            footer_text,
            view: PageView::default(),
            bus,
            controller,
            call,
            menu_selected: 0,
            notice: None,
            last_published: None,
        }
    }

    /// Tear down: drops the controller's listeners.
    pub fn close(self) {
        let Viewer {
            mut bus,
            controller,
            ..
        } = self;
        controller.unmount(&mut bus);
        tracing::debug!(
            scroll_listeners = bus.listener_count(EventKind::Scroll),
            "viewer: closed"
        );
    }

    pub fn view(&self) -> &PageView {
        &self.view
    }

    pub fn controller(&self) -> &PageController {
        &self.controller
    }

    pub fn menu_visible(&self) -> bool {
        self.controller.menu().overlay_visible()
    }

    /// Apply a new terminal size. The progress row and status bar take one
    /// row each; the rest is the content viewport.
    pub fn resize(&mut self, width: u16, height: u16) {
        let rows = usize::from(height.saturating_sub(2));
        if !self
            .view
            .layout(width, rows, &self.config, &self.footer_text)
        {
            return;
        }
        // The panel only exists in the narrow layout.
        if is_wide(width) && self.menu_visible() {
            self.controller.dismiss_menu();
        }
        self.publish(EventKind::Resize);
    }

    /// Advance any smooth scroll and publish the resulting position.
    pub fn tick(&mut self) {
        self.view.step_animation();
        self.publish(EventKind::Scroll);
    }

    fn publish(&mut self, kind: EventKind) {
        let metrics = self.view.metrics();
        if kind == EventKind::Scroll && self.last_published == Some(metrics) {
            return;
        }
        self.last_published = Some(metrics);
        let event = match kind {
            EventKind::Scroll => UiEvent::Scroll(metrics),
            EventKind::Resize => UiEvent::Resize(metrics),
        };
        self.bus.dispatch(&event);
    }

    fn navigate(&mut self, target: &str) {
        match self.controller.navigate_to(&mut self.view, target) {
            NavigationOutcome::Scrolled { .. } => self.notice = None,
            NavigationOutcome::MissingSection => {
                self.notice = Some(format!("No section #{target}"));
            }
            NavigationOutcome::HeaderUnmeasured => {}
        }
    }

    fn navigate_to_link(&mut self, index: usize) {
        if let Some(link) = NAV_LINKS.get(index) {
            self.navigate(link.target.anchor());
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return KeyOutcome::Quit;
        }
        if self.controller.menu().is_open() {
            self.handle_menu_key(key);
            return KeyOutcome::Continue;
        }

        let half = (self.view.viewport_rows() / 2).max(1) as isize;
        match key.code {
            KeyCode::Char('q') => return KeyOutcome::Quit,

            KeyCode::Char('j') | KeyCode::Down => self.view.scroll_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.view.scroll_by(-1),

            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.view.scroll_by(half)
            }
            KeyCode::PageDown => self.view.scroll_by(half),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.view.scroll_by(-half)
            }
            KeyCode::PageUp => self.view.scroll_by(-half),

            KeyCode::Char('g') | KeyCode::Home => {
                self.view.scroll_to(0.0, ScrollBehavior::Instant)
            }
            KeyCode::Char('G') | KeyCode::End => {
                let bottom = self.view.max_scroll() as f64;
                self.view.scroll_to(bottom, ScrollBehavior::Instant)
            }

            KeyCode::Char('m') if !is_wide(self.view.width()) => {
                self.controller.toggle_menu();
                self.menu_selected = self.selected_for_current_section();
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                self.navigate_to_link(index);
            }

            KeyCode::Char('c') => return KeyOutcome::Call,
            KeyCode::Char('i') => return KeyOutcome::Open(self.config.more_info_url.clone()),
            KeyCode::Char('v') => return KeyOutcome::Open(self.config.video_url.clone()),

            KeyCode::Esc => self.notice = None,
            _ => {}
        }
        KeyOutcome::Continue
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.menu_selected = (self.menu_selected + 1).min(NAV_LINKS.len() - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.menu_selected = self.menu_selected.saturating_sub(1);
            }
            KeyCode::Enter => self.navigate_to_link(self.menu_selected),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                self.navigate_to_link(index);
            }
            KeyCode::Char('m') => self.controller.toggle_menu(),
            // Esc plays the backdrop's role.
            KeyCode::Esc | KeyCode::Char('q') => self.controller.dismiss_menu(),
            _ => {}
        }
    }

    fn selected_for_current_section(&self) -> usize {
        let Some(current) = self.view.current_section() else {
            return 0;
        };
        let position = |id: SectionId| SectionId::ALL.iter().position(|s| *s == id);
        let current_pos = position(current);
        NAV_LINKS
            .iter()
            .rposition(|l| position(l.target) <= current_pos)
            .unwrap_or(0)
    }

    fn perform(&mut self, outcome: KeyOutcome) {
        match outcome {
            KeyOutcome::Call => {
                self.call.trigger(&mut SystemDialer);
                self.notice = Some(format!("Dialing {}", self.call.tel_uri()));
            }
            KeyOutcome::Open(url) => {
                launch::open_uri(&url);
                self.notice = Some(format!("Opening {url}"));
            }
            KeyOutcome::Continue | KeyOutcome::Quit => {}
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        loop {
            let size = terminal.size()?;
            self.resize(size.width, size.height);
            terminal.draw(|frame| self.draw(frame))?;

            let event = if self.view.is_animating() {
                if event::poll(FRAME)? {
                    Some(event::read()?)
                } else {
                    None
                }
            } else {
                Some(event::read()?)
            };

            if let Some(Event::Key(key)) = event {
                if key.kind == KeyEventKind::Press {
                    match self.handle_key(key) {
                        KeyOutcome::Quit => return Ok(()),
                        outcome => self.perform(outcome),
                    }
                }
            }
            self.tick();
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();

        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            let msg = "Terminal too small";
            let msg_len = msg.len() as u16;
            let x = area.x + area.width.saturating_sub(msg_len) / 2;
            let y = area.y + area.height / 2;
            let w = msg_len.min(area.width);
            if w > 0 && area.height > 0 {
                frame.render_widget(
                    Paragraph::new(Span::styled(
                        msg,
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )),
                    Rect::new(x, y, w, 1),
                );
            }
            return;
        }

        let [progress_area, content_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let progress = self.controller.progress();
        let gauge = LineGauge::default()
            .filled_style(Style::default().fg(Color::Cyan))
            .unfilled_style(Style::default().fg(Color::DarkGray))
            .label(format!("{:>3.0}%", progress.percent()))
            .ratio(progress.ratio());
        frame.render_widget(gauge, progress_area);

        let body = Paragraph::new(self.view.page().text.clone())
            .scroll((self.view.scroll() as u16, 0));
        frame.render_widget(body, content_area);

        render_header(
            frame,
            content_area,
            self.controller.menu(),
            self.view.current_section(),
        );

        if self.menu_visible() {
            render_menu(frame, content_area, self.controller.menu(), self.menu_selected);
        }

        self.render_status(frame, status_area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let total = self.view.page().total_lines();
        let section = self
            .view
            .current_section()
            .map(|s| format!("  \u{00A7} {}", s.anchor()))
            .unwrap_or_default();
        let number = self.call.number();
        let hints = if self.menu_visible() {
            "j/k select  Enter go  Esc close".to_owned()
        } else if is_wide(self.view.width()) {
            format!("1-4 jump  c call {number}  i info  v video  q quit")
        } else {
            format!("m menu  1-4 jump  c call {number}  q quit")
        };
        let left = match &self.notice {
            Some(notice) => format!(" {notice}"),
            None => format!(" Line {}/{}{section}", self.view.scroll() + 1, total),
        };
        let status = Line::from(vec![
            Span::raw(left),
            Span::raw("  |  "),
            Span::raw(hints),
        ]);
        let bar = Paragraph::new(status)
            .style(Style::default().fg(Color::Black).bg(Color::White));
        frame.render_widget(bar, area);
    }
}

fn header_style() -> Style {
    Style::default().fg(Color::White).bg(Color::Blue)
}

/// Fixed header drawn over the top rows of the content viewport.
fn render_header(frame: &mut Frame, area: Rect, menu: MenuState, current: Option<SectionId>) {
    let rows = header_rows(area.width).min(area.height);
    let rect = Rect::new(area.x, area.y, area.width, rows);
    frame.render_widget(Clear, rect);

    let bold = header_style().add_modifier(Modifier::BOLD);
    let lines: Vec<Line<'static>> = if is_wide(area.width) {
        let mut spans = Vec::new();
        for (i, link) in NAV_LINKS.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("   "));
            }
            let style = if Some(link.target) == current {
                bold.fg(Color::Yellow)
            } else {
                header_style()
            };
            spans.push(Span::styled(format!("{} {}", i + 1, link.label), style));
        }
        vec![
            Line::from(Span::styled(content::TITLE, bold)).centered(),
            Line::from(spans).centered(),
        ]
    } else {
        vec![Line::from(vec![
            Span::styled(format!(" {} ", menu.button_glyph()), bold),
            Span::styled(content::TITLE, bold),
        ])]
    };

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::Cyan).bg(Color::Blue))
        .style(header_style());
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

/// Dimmed backdrop over the page plus the navigation panel on the left.
fn render_menu(frame: &mut Frame, area: Rect, menu: MenuState, selected: usize) {
    let dim = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::DIM);
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            if let Some(cell) = frame.buffer_mut().cell_mut(Position::new(x, y)) {
                cell.set_style(dim);
            }
        }
    }

    let panel = Rect::new(area.x, area.y, area.width.min(34), area.height);
    frame.render_widget(Clear, panel);

    let lines: Vec<Line<'static>> = NAV_LINKS
        .iter()
        .enumerate()
        .flat_map(|(i, link)| {
            let style = if i == selected {
                Style::default()
                    .fg(Color::White)
                    .bg(Color::Blue)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            [
                Line::from(Span::styled(format!(" {} {}", i + 1, link.label), style)),
                Line::default(),
            ]
        })
        .collect();

    let block = Block::bordered()
        .title(format!(" {} ", menu.button_glyph()))
        .style(Style::default().fg(Color::White).bg(Color::Blue));
    frame.render_widget(Paragraph::new(lines).block(block), panel);
}

/// Run the viewer until the user quits.
pub fn run(config: &SiteConfig) -> io::Result<()> {
    let mut viewer = Viewer::new(config.clone(), content::current_footer_text());
    let result = ratatui::run(|terminal| viewer.run(terminal));
    viewer.close();
    result
}
