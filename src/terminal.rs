//! Terminal setup and crossterm event translation.

use crate::effects::{Direction, InputEvent};
use crate::surface::FrameBuffer;
use crossterm::{
    cursor::{Hide, Show},
    event::{
        DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
        KeyCode, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags, MouseButton,
        MouseEventKind, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, stdout};
use tracing::{debug, warn};

/// Raw mode, alternate screen and mouse capture for as long as it lives.
pub struct TerminalGuard {
    keyboard_enhanced: bool,
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        // From here on, dropping the guard restores the terminal.
        let mut guard = Self {
            keyboard_enhanced: false,
        };
        let mut out = stdout();
        execute!(
            out,
            EnterAlternateScreen,
            Hide,
            Clear(ClearType::All),
            EnableMouseCapture,
            EnableFocusChange
        )?;

        // Key release events need the kitty protocol; without it key holds time out.
        if matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
            execute!(
                out,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            guard.keyboard_enhanced = true;
        }
        debug!(keyboard_enhanced = guard.keyboard_enhanced, "terminal ready");
        Ok(guard)
    }

    pub fn keyboard_enhanced(&self) -> bool {
        self.keyboard_enhanced
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut out = stdout();
        if self.keyboard_enhanced {
            let _ = execute!(out, PopKeyboardEnhancementFlags);
        }
        let result = execute!(
            out,
            DisableFocusChange,
            DisableMouseCapture,
            Show,
            LeaveAlternateScreen
        )
        .and_then(|_| terminal::disable_raw_mode());
        if let Err(err) = result {
            warn!(%err, "terminal restore failed");
        }
    }
}

/// q, Esc or Ctrl+C.
pub fn is_exit(event: &Event) -> bool {
    let Event::Key(key) = event else {
        return false;
    };
    if key.kind == KeyEventKind::Release {
        return false;
    }
    key.code == KeyCode::Char('q')
        || key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

fn arrow(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up => Some(Direction::Up),
        KeyCode::Down => Some(Direction::Down),
        KeyCode::Left => Some(Direction::Left),
        KeyCode::Right => Some(Direction::Right),
        _ => None,
    }
}

/// Map a terminal event onto canvas-space input for the effect.
pub fn translate_event(event: &Event, frame: &FrameBuffer) -> Option<InputEvent> {
    match event {
        Event::Mouse(mouse) => {
            let at = frame.cell_to_canvas(mouse.column, mouse.row);
            match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::PointerDown(at)),
                MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                    Some(InputEvent::PointerMove(at))
                }
                MouseEventKind::Up(MouseButton::Left) => Some(InputEvent::PointerUp(at)),
                _ => None,
            }
        }
        Event::FocusLost => Some(InputEvent::PointerLeave),
        Event::Key(key) => {
            let direction = arrow(key.code)?;
            match key.kind {
                KeyEventKind::Press | KeyEventKind::Repeat => Some(InputEvent::KeyDown(direction)),
                KeyEventKind::Release => Some(InputEvent::KeyUp(direction)),
            }
        }
        _ => None,
    }
}
