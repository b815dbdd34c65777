mod actions;
mod anim;
mod app;
mod game;
mod input;
mod logger;
mod render;
mod widgets;

use std::{cell::RefCell, io, rc::Rc};

use app::App;
use game::catalog::Catalog;
use game::clock::Clock;
use game::storage::{MemoryStorage, Storage};
use game::{GameSession, SessionConfig};
use input::{pixel_x_to_col, pixel_y_to_row, ClickState, InputEvent};
use log::info;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use ratzilla::event::{KeyCode, MouseButton, MouseEventKind};
use ratzilla::ratatui::Terminal;
use ratzilla::{DomBackend, WebRenderer};

/// Query the grid container's bounding rect and convert pixel coordinates to a cell.
fn dom_pixel_to_cell(mouse_x: u32, mouse_y: u32, cs: &ClickState) -> Option<(u16, u16)> {
    let window = web_sys::window()?;
    let document = window.document()?;

    // DomBackend creates a <div> as the grid container inside <body>.
    let grid = document.query_selector("body > div").ok()??;
    let rect = grid.get_bounding_client_rect();

    let click_x = mouse_x as f64 - rect.left();
    let click_y = mouse_y as f64 - rect.top();

    let col = pixel_x_to_col(click_x, rect.width(), cs.terminal_cols)?;
    let row = pixel_y_to_row(click_y, rect.height(), cs.terminal_rows)?;
    Some((col, row))
}

#[cfg(target_arch = "wasm32")]
fn open_storage() -> Box<dyn Storage> {
    match game::storage::LocalStorage::open() {
        Some(s) => Box::new(s),
        None => {
            log::warn!("localStorage unavailable, progress will not be saved");
            Box::new(MemoryStorage::new())
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn open_storage() -> Box<dyn Storage> {
    Box::new(MemoryStorage::new())
}

#[cfg(target_arch = "wasm32")]
fn clock() -> Box<dyn Clock> {
    Box::new(game::clock::BrowserClock)
}

#[cfg(not(target_arch = "wasm32"))]
fn clock() -> Box<dyn Clock> {
    Box::new(game::clock::SystemClock)
}

fn seed() -> u64 {
    let noise = (js_sys::Math::random() * u32::MAX as f64) as u64;
    (noise << 32) ^ js_sys::Date::now() as u64
}

fn main() -> io::Result<()> {
    console_error_panic_hook::set_once();
    logger::init();

    let session = GameSession::start(
        Catalog::bundled(),
        open_storage(),
        clock(),
        SmallRng::seed_from_u64(seed()),
        SessionConfig::default(),
    );
    info!("catalog loaded: {} cases", session.snapshot().catalog.cases().len());

    let app = Rc::new(RefCell::new(App::new(session)));
    let click_state = Rc::new(RefCell::new(ClickState::new()));
    let backend = DomBackend::new()?;
    let terminal = Terminal::new(backend)?;

    // Mouse/touch click handler
    terminal.on_mouse_event({
        let app = app.clone();
        let click_state = click_state.clone();
        move |mouse_event| {
            if mouse_event.event != MouseEventKind::Pressed
                || mouse_event.button != MouseButton::Left
            {
                return;
            }

            let cs = click_state.borrow();
            if cs.terminal_rows == 0 || cs.terminal_cols == 0 {
                return;
            }
            let Some((col, row)) = dom_pixel_to_cell(mouse_event.x, mouse_event.y, &cs) else {
                return;
            };
            let matched = cs.hit_test(col, row);
            drop(cs);

            if let Some(action_id) = matched {
                app.borrow_mut().handle_input(&InputEvent::Click(action_id));
            }
        }
    });

    // Keyboard handler
    terminal.on_key_event({
        let app = app.clone();
        move |key_event| {
            let key = match key_event.code {
                KeyCode::Char(c) => c.to_ascii_lowercase(),
                KeyCode::Esc => 'b',
                KeyCode::Enter => 'o',
                KeyCode::Up => 'k',
                KeyCode::Down => 'j',
                _ => return,
            };
            app.borrow_mut().handle_input(&InputEvent::Key(key));
        }
    });

    terminal.draw_web({
        let click_state = click_state.clone();
        move |f| {
            let mut app = app.borrow_mut();
            app.tick(js_sys::Date::now());
            let size = f.area();

            {
                let mut cs = click_state.borrow_mut();
                cs.terminal_cols = size.width;
                cs.terminal_rows = size.height;
                cs.clear_targets();
            }

            render::render(&app, f, size, &click_state);
        }
    });

    Ok(())
}
