//! Main chat event loop and UI rendering
//!
//! This module contains the main event loop that handles user input, renders the UI,
//! and hands chat turns to the engine in the background.

mod event_loop;
mod keybindings;
mod lifecycle;

pub use event_loop::{handle_key, ChatOutcome, KeyOutcome, UiEvent};
pub use keybindings::{resolve, KeyAction, KeyContext};

use self::event_loop::{apply_chat_outcome, handle_paste, spawn_chat_turn, spawn_event_reader};
use self::lifecycle::{restore_terminal, setup_terminal, ChatTerminal};
use crate::core::app::App;
use crate::core::tool_chat::ChatEngine;
use crate::ui::renderer::ui;
use crate::ui::theme::Theme;
use ratatui::crossterm::event::{Event, KeyEventKind};
use std::{
    error::Error,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use tracing::info;

const MAX_FPS: u64 = 30;

pub async fn run_chat(mut app: App, engine: Arc<dyn ChatEngine>) -> Result<(), Box<dyn Error>> {
    let theme = Theme::default();
    let mut terminal = setup_terminal()?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<ChatOutcome>();

    let result = main_loop(
        &mut app,
        &engine,
        &theme,
        &mut terminal,
        &mut event_rx,
        &outcome_tx,
        &mut outcome_rx,
    )
    .await;

    event_reader_handle.abort();
    restore_terminal(&mut terminal)?;
    info!("Chat closed");
    result
}

async fn main_loop(
    app: &mut App,
    engine: &Arc<dyn ChatEngine>,
    theme: &Theme,
    terminal: &mut ChatTerminal,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    outcome_tx: &mpsc::UnboundedSender<ChatOutcome>,
    outcome_rx: &mut mpsc::UnboundedReceiver<ChatOutcome>,
) -> Result<(), Box<dyn Error>> {
    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;
    let mut page = 10;

    loop {
        if request_redraw && last_draw.elapsed() >= frame_duration {
            let mut max_scroll = 0;
            let completed = terminal.draw(|f| {
                max_scroll = ui(f, app, theme);
            })?;
            page = (completed.area.height / 2).max(1);
            app.ui.scroll_offset = app.ui.scroll_offset.min(max_scroll);
            last_draw = Instant::now();
            request_redraw = false;
        }

        let mut events_processed = false;
        while let Ok(UiEvent::Crossterm(ev)) = event_rx.try_recv() {
            events_processed = true;
            match ev {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match handle_key(app, key, page) {
                        KeyOutcome::Quit => return Ok(()),
                        KeyOutcome::Send(turn) => {
                            spawn_chat_turn(engine.clone(), turn, outcome_tx.clone())
                        }
                        KeyOutcome::Continue => {}
                    }
                }
                Event::Paste(text) => handle_paste(app, &text),
                _ => {}
            }
        }

        let mut received_any = false;
        while let Ok(outcome) = outcome_rx.try_recv() {
            received_any = true;
            apply_chat_outcome(app, outcome);
        }

        if events_processed || received_any {
            request_redraw = true;
        } else {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    }
}
