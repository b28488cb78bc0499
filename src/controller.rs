use std::time::Duration;
use tokio::sync::oneshot;
use tracing::trace;

use crate::domain::{JVConfig, JVError, Message};
use crate::model::Model;
use crate::source::LoadState;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};

pub struct Controller {
    event_poll_time: u64,
    pending_load: Option<oneshot::Receiver<LoadState>>,
}

impl Controller {
    pub fn new(cfg: &JVConfig, pending_load: oneshot::Receiver<LoadState>) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
            pending_load: Some(pending_load),
        }
    }

    pub fn handle_event(&mut self, model: &Model) -> Result<Option<Message>, JVError> {
        if let Some(message) = self.poll_load() {
            return Ok(Some(message));
        }

        if event::poll(Duration::from_millis(self.event_poll_time))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if model.raw_keyevents() {
                        return Ok(Some(Message::RawKey(key)));
                    }
                    return Ok(Self::handle_key(key));
                }
                Event::Resize(width, height) => {
                    return Ok(Some(Message::Resize(width as usize, height as usize)));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    /// Hands over the result of the fetch once it arrived.
    fn poll_load(&mut self) -> Option<Message> {
        let receiver = self.pending_load.as_mut()?;
        let state = match receiver.try_recv() {
            Ok(state) => state,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => {
                LoadState::Failed("Loading was aborted".to_string())
            }
        };
        self.pending_load = None;
        Some(Message::Loaded(state))
    }

    fn handle_key(key: KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Left | KeyCode::Char('h') => Some(Message::SelectLeft),
            KeyCode::Right | KeyCode::Char('l') => Some(Message::SelectRight),
            KeyCode::Enter | KeyCode::Char('s') => Some(Message::Sort),
            KeyCode::Char('f') => Some(Message::EditFilter),
            KeyCode::Char('/') => Some(Message::EditQuery),
            KeyCode::Char('o') => Some(Message::CycleOperator),
            KeyCode::Char('m') => Some(Message::ToggleFilterMode),
            KeyCode::Char('x') => Some(Message::ClearFilters),
            KeyCode::Char('n') | KeyCode::PageDown => Some(Message::NextPage),
            KeyCode::Char('p') | KeyCode::PageUp => Some(Message::PreviousPage),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Esc => Some(Message::Exit),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
