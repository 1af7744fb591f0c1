//! Keyboard input handling.

use crate::app::App;
use crate::util::validate_url_for_open;
use crossterm::event::{KeyCode, KeyModifiers};

use super::loop_runner::Action;

/// Maps one key press to a state change and tells the loop what to do next.
///
/// Side effects that leave the process (polling, launching a browser) are
/// returned as [`Action`]s for the loop to perform.
pub(super) fn handle_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Action {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Action::Quit;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Char('g') | KeyCode::Home => app.nav_first(),
        KeyCode::Char('G') | KeyCode::End => app.nav_last(),
        KeyCode::Tab | KeyCode::Char('s') => app.cycle_filter(true),
        KeyCode::BackTab | KeyCode::Char('S') => app.cycle_filter(false),
        KeyCode::Char('r') => return Action::Refresh,
        KeyCode::Char('o') | KeyCode::Enter => return open_selected(app),
        _ => {}
    }
    Action::Continue
}

fn open_selected(app: &mut App) -> Action {
    let Some(item) = app.selected_item() else {
        return Action::Continue;
    };
    if item.link.is_empty() {
        app.set_status("This item has no link");
        return Action::Continue;
    }

    // Validate URL before open::that() to prevent command injection
    match validate_url_for_open(&item.link) {
        Ok(url) => Action::Open(url.to_string()),
        Err(e) => {
            app.set_status(e);
            Action::Continue
        }
    }
}
