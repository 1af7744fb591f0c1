//! Render functions for the TUI.

use crate::app::App;
use crate::feed::NormalizedItem;
use crate::util::{strip_control_chars, truncate_to_width};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::status;

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 8;

/// Column budget for the description line.
const DESCRIPTION_WIDTH: usize = 150;

/// Main render function.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_filter_bar(f, app, chunks[0]);
    render_items(f, app, chunks[1]);
    status::render(f, app, chunks[2]);
}

/// Source tabs across the top. The active one is highlighted.
fn render_filter_bar(f: &mut Frame, app: &App, area: Rect) {
    let active = app.active_filter();
    let mut spans = vec![Span::styled(
        " News Feed ",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for source in app.source_filters() {
        let style = if source == active {
            Style::default()
                .fg(Color::Black)
                .bg(source_color(source))
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!(" {} ", strip_control_chars(source)), style));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_items(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", app.api_url));

    if app.feed.is_loading() {
        let loading = Paragraph::new("Loading news...")
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(loading, area);
        return;
    }

    let visible = app.visible_items();
    if visible.is_empty() {
        let empty = Paragraph::new("No news available for this source.")
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = visible
        .iter()
        .map(|item| ListItem::new(item_lines(item, inner_width)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(list, area, &mut state);
}

/// Three lines per item: marker and title, description, date and source.
pub(super) fn item_lines(item: &NormalizedItem, width: usize) -> Vec<Line<'static>> {
    let color = source_color(&item.source);
    let source = strip_control_chars(&item.source).into_owned();

    let marker = if item.image.is_some() {
        Span::styled("[img] ", Style::default().fg(Color::Magenta))
    } else {
        Span::styled(format!("[{source}] "), Style::default().fg(color))
    };
    let title = strip_control_chars(&item.title);
    let title_line = Line::from(vec![
        marker,
        Span::styled(
            truncate_to_width(&title, width.saturating_sub(8)).into_owned(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]);

    let description = strip_control_chars(item.display_description()).replace(['\n', '\r', '\t'], " ");
    let description = truncate_to_width(description.trim(), DESCRIPTION_WIDTH.min(width.max(4)));
    let description_line = Line::from(Span::styled(
        format!("  {description}"),
        Style::default().fg(Color::Gray),
    ));

    let date = item
        .published
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "no date".to_string());
    let meta_line = Line::from(vec![
        Span::raw("  "),
        Span::styled(
            format!(" {date} - {source} "),
            Style::default().fg(Color::Black).bg(color),
        ),
    ]);

    vec![title_line, description_line, meta_line]
}

/// Fixed colour per known source. Anything else is grey.
pub fn source_color(source: &str) -> Color {
    match source {
        "Punch" => Color::LightRed,
        "Vanguard" => Color::LightGreen,
        "The Nation" => Color::LightBlue,
        "Guardian" => Color::Rgb(255, 165, 0),
        "This Day" => Color::LightMagenta,
        _ => Color::Gray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::PollUpdate;
    use crate::feed::ImageRef;
    use chrono::{TimeZone, Utc};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn item(link: &str, source: &str) -> NormalizedItem {
        NormalizedItem {
            title: format!("Title {link}"),
            link: link.to_string(),
            description: "x".repeat(300),
            snippet: None,
            published: Some(Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()),
            image: None,
            source: source.to_string(),
        }
    }

    fn screen(app: &App, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buf = terminal.backend().buffer().clone();
        buf.content()
            .iter()
            .map(|c| c.symbol().chars().next().unwrap_or(' '))
            .collect()
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn shows_loading_before_first_poll() {
        let app = App::new(0, "http://localhost:3000/api/feed");
        assert!(screen(&app, 80, 24).contains("Loading news..."));
    }

    #[test]
    fn draws_items_and_filters() {
        let mut app = App::new(0, "http://localhost:3000/api/feed");
        app.apply(PollUpdate::Fetched(vec![item("a", "Punch"), item("b", "Vanguard")]));
        let text = screen(&app, 100, 24);
        assert!(text.contains("Title a"));
        assert!(text.contains("2024-03-04 - Punch"));
        assert!(text.contains("All"));
        assert!(text.contains("Vanguard"));
    }

    #[test]
    fn empty_filter_result_has_message() {
        let mut app = App::new(0, "x");
        app.apply(PollUpdate::Fetched(vec![]));
        assert!(screen(&app, 80, 24).contains("No news available"));
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let app = App::new(0, "x");
        assert!(screen(&app, 10, 2).contains("Too small"));
    }

    #[test]
    fn row_marks_images_and_truncates_description() {
        let mut with_image = item("a", "Punch");
        with_image.image = Some(ImageRef {
            url: "https://a.test/i.jpg".to_string(),
            length: None,
            mime_type: "image/jpeg".to_string(),
        });
        let lines = item_lines(&with_image, 200);
        assert!(line_text(&lines[0]).starts_with("[img] "));
        let description = line_text(&lines[1]);
        assert!(description.trim().ends_with("..."));
        assert_eq!(description.trim().len(), 150);

        let plain = item_lines(&item("b", "Guardian"), 200);
        assert!(line_text(&plain[0]).starts_with("[Guardian] "));
    }

    #[test]
    fn row_without_date_says_so_and_strips_escapes() {
        let mut it = item("a", "Punch");
        it.published = None;
        it.title = "evil\x1b[31mred".to_string();
        let lines = item_lines(&it, 100);
        assert!(line_text(&lines[2]).contains("no date - Punch"));
        assert!(!line_text(&lines[0]).contains('\x1b'));
    }

    #[test]
    fn unknown_sources_are_grey() {
        assert_eq!(source_color("Punch"), Color::LightRed);
        assert_eq!(source_color("Unknown"), Color::Gray);
        assert_eq!(source_color("Somewhere Else"), Color::Gray);
    }
}
