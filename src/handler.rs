use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, Overlay};
use crate::tui::AppEvent;

const PAGE: u16 = 10;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any mode
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        app.should_quit = true;
        return;
    }

    match app.overlay {
        Overlay::Notice(_) => app.overlay = Overlay::None,
        Overlay::ModelPicker => handle_model_picker(app, key),
        Overlay::FilePrompt => handle_file_prompt(app, key).await,
        Overlay::None => handle_compose(app, key),
    }
}

fn handle_compose(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Enter => app.send(),
        KeyCode::Esc => {
            if app.session.busy() {
                app.cancel_query();
            }
        }
        KeyCode::Char('o') if ctrl => app.open_file_prompt(),
        KeyCode::Char('x') if ctrl => app.session.composer_mut().detach_file(),
        KeyCode::Char('p') if ctrl => app.open_model_picker(),
        KeyCode::Char('u') if ctrl => app.session.composer_mut().set_text(""),

        KeyCode::PageUp => app.scroll_up(PAGE),
        KeyCode::PageDown => app.scroll_down(PAGE),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),

        KeyCode::Backspace => app.session.composer_mut().backspace(),
        KeyCode::Delete => app.session.composer_mut().delete(),
        KeyCode::Left => app.session.composer_mut().move_left(),
        KeyCode::Right => app.session.composer_mut().move_right(),
        KeyCode::Home => app.session.composer_mut().move_home(),
        KeyCode::End => app.session.composer_mut().move_end(),
        KeyCode::Char(c) if !ctrl => app.session.composer_mut().insert_char(c),
        _ => {}
    }
}

fn handle_model_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.overlay = Overlay::None,
        KeyCode::Char('j') | KeyCode::Down => app.model_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.model_picker_nav_up(),
        KeyCode::Enter => app.select_model(),
        _ => {}
    }
}

async fn handle_file_prompt(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.overlay = Overlay::None,
        KeyCode::Enter => app.attach_from_prompt().await,
        KeyCode::Backspace => {
            app.file_prompt.pop();
        }
        KeyCode::Char(c) => app.file_prompt.push(c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat || app.overlay != Overlay::None {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}
