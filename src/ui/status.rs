use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

const KEY_HINTS: &str = "[j/k]move [g/G]top/bottom [Tab]source [r]efresh [o]pen [q]uit";

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // Guard against zero-width/height areas
    if area.width < 1 || area.height < 1 {
        return;
    }

    let (text, style): (Cow<'_, str>, Style) = if app.fetching {
        (
            Cow::Borrowed("Refreshing..."),
            Style::default().bg(Color::DarkGray).fg(Color::White),
        )
    } else if let Some((msg, _)) = &app.status_message {
        (
            Cow::Borrowed(msg.as_ref()),
            Style::default().bg(Color::DarkGray).fg(Color::White),
        )
    } else if let Some(error) = app.feed.error() {
        // The list stays on screen; only the bar turns red.
        (
            Cow::Owned(format!("Failed to fetch news feed: {error}")),
            Style::default().bg(Color::Red).fg(Color::White),
        )
    } else {
        let updated = app
            .feed
            .last_updated()
            .map(|t| {
                t.with_timezone(&chrono::Local)
                    .format("updated %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_default();
        (
            Cow::Owned(format!(
                "{} items {} | {}",
                app.visible_items().len(),
                updated,
                KEY_HINTS
            )),
            Style::default().bg(Color::DarkGray).fg(Color::White),
        )
    };

    let text = crate::util::strip_control_chars(&text).into_owned();
    f.render_widget(Paragraph::new(text).style(style), area);
}
