//! Raw-mode terminal implementation of [`Prompt`].

use crate::menu::{ChecklistState, Prompt};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    terminal::{self, disable_raw_mode, enable_raw_mode, ClearType},
};
use eegfmri_clean::{CleanError, Result};
use std::io::{self, BufRead, IsTerminal, Write};

const HINT: &str = "(up/down: move, space: toggle, enter: confirm, esc: cancel)";

/// Menus drawn on stderr, answered from the keyboard.
pub struct TerminalPrompt;

fn ensure_terminal() -> Result<()> {
    if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
        return Err(CleanError::Menu(
            "--interactive requires a terminal".to_string(),
        ));
    }
    Ok(())
}

/// Leaves raw mode when dropped, including on early returns.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

enum Action {
    Up,
    Down,
    Toggle,
    Confirm,
    Cancel,
    None,
}

fn action_for(key: KeyEvent) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => Action::Down,
        KeyCode::Char(' ') => Action::Toggle,
        KeyCode::Enter => Action::Confirm,
        KeyCode::Esc | KeyCode::Char('q') => Action::Cancel,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Cancel,
        _ => Action::None,
    }
}

/// Draw the title, the entries that fit the terminal and the hint. Returns
/// the number of lines to move up before the next redraw.
fn render(
    out: &mut impl Write,
    title: &str,
    entries: &[String],
    state: &ChecklistState,
    previous_lines: u16,
) -> io::Result<u16> {
    let (_, rows) = terminal::size()?;
    // Title and hint take one row each
    let height = (rows as usize).saturating_sub(2).max(1);
    let window = state.window(height);

    if previous_lines > 0 {
        queue!(out, cursor::MoveUp(previous_lines))?;
    }
    queue!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::FromCursorDown)
    )?;
    if window.len() < entries.len() {
        write!(
            out,
            "{} [{}-{} of {}]\r\n",
            title,
            window.start + 1,
            window.end,
            entries.len()
        )?;
    } else {
        write!(out, "{}\r\n", title)?;
    }
    for i in window.clone() {
        let pointer = if i == state.cursor() { ">" } else { " " };
        let mark = if state.is_checked(i) { "[x]" } else { "[ ]" };
        write!(out, "{} {} {}\r\n", pointer, mark, entries[i])?;
    }
    write!(out, "{}", HINT)?;
    out.flush()?;
    Ok(window.len() as u16 + 1)
}

impl Prompt for TerminalPrompt {
    fn multi_select(
        &mut self,
        title: &str,
        entries: &[String],
        preselected: &[usize],
    ) -> Result<Vec<usize>> {
        ensure_terminal()?;
        let mut state = ChecklistState::new(entries.len(), preselected);
        let mut stderr = io::stderr();

        let guard = RawModeGuard::enable()?;
        let mut drawn = render(&mut stderr, title, entries, &state, 0)?;

        loop {
            let key = match event::read()? {
                Event::Key(key) => key,
                _ => continue,
            };
            match action_for(key) {
                Action::Up => state.move_up(),
                Action::Down => state.move_down(),
                Action::Toggle => state.toggle(),
                Action::Confirm => break,
                Action::Cancel => {
                    drop(guard);
                    eprintln!();
                    return Err(CleanError::Menu("selection cancelled".to_string()));
                }
                Action::None => continue,
            }
            drawn = render(&mut stderr, title, entries, &state, drawn)?;
        }

        drop(guard);
        eprintln!();
        Ok(state.selected())
    }

    fn read_integer(&mut self, message: &str) -> Result<u64> {
        ensure_terminal()?;
        let mut stderr = io::stderr();
        write!(stderr, "{}", message)?;
        stderr.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        line.trim()
            .parse::<u64>()
            .map_err(|_| CleanError::Menu(format!("'{}' is not a valid integer", line.trim())))
    }
}
