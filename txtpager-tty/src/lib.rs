use std::io::{self, Write};

use anyhow::Result;
use crossterm::{
    cursor,
    event::{Event, KeyCode, KeyEvent, KeyModifiers},
    style::Print,
    terminal::{Clear, ClearType},
};
use tracing::trace;
use txtpager_core::{Command, PAGE_SIZE_STEP};

/// Draws pages of text onto a terminal, one line per row.
pub struct PageRenderer<W: Write> {
    writer: W,
}

#[derive(Debug, Clone, Copy)]
pub struct DrawParams {
    pub columns: u16,
    pub rows: u16,
}

impl DrawParams {
    pub fn clamped(columns: u16, rows: u16) -> Self {
        Self {
            columns: columns.max(1),
            rows: rows.max(1),
        }
    }
}

impl<W: Write> PageRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn writer(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Clears the entire screen.
    pub fn clear_all(&mut self) -> Result<()> {
        crossterm::execute!(
            &mut self.writer,
            Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        Ok(())
    }

    /// Prints `lines` starting at the top-left corner, truncating each line
    /// to the viewport width and stopping at the viewport height. Rows left
    /// over after a short page are cleared.
    pub fn draw(&mut self, lines: &[String], params: DrawParams) -> Result<()> {
        let visible = lines.len().min(params.rows as usize);
        for (row, line) in lines.iter().take(visible).enumerate() {
            crossterm::queue!(
                &mut self.writer,
                cursor::MoveTo(0, row as u16),
                Clear(ClearType::CurrentLine),
                Print(truncate_to_width(line, params.columns as usize)),
            )?;
        }
        for row in visible..params.rows as usize {
            crossterm::queue!(
                &mut self.writer,
                cursor::MoveTo(0, row as u16),
                Clear(ClearType::CurrentLine),
            )?;
        }
        self.writer.flush()?;
        trace!(visible, total = lines.len(), "drew page");
        Ok(())
    }
}

fn truncate_to_width(line: &str, width: usize) -> String {
    line.chars().take(width).collect()
}

pub fn write_status_line<W: Write>(writer: &mut W, label: &str) -> io::Result<()> {
    write!(writer, "{}", label)?;
    writer.flush()
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    Command(Command),
    OpenBookmarks,
    CloseOverlay,
    BookmarkMoveSelection { delta: isize },
    BookmarkActivateSelection,
    Quit,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Bookmarks,
}

/// Maps raw key events to pager events, vim style: numeric prefixes repeat
/// page motions (`12j`), `m<char>` drops a bookmark on the current page and
/// `'<char>` jumps back to it.
#[derive(Debug, Default)]
pub struct EventMapper {
    pending_count: Option<usize>,
    pending_digits: String,
    char_stack: String,
    mode: InputMode,
}

impl EventMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        if self.mode != mode {
            self.reset_count();
            self.reset_char_stack();
            self.mode = mode;
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn map_event(&mut self, event: Event) -> UiEvent {
        match self.mode {
            InputMode::Normal => self.map_event_normal(event),
            InputMode::Bookmarks => self.map_event_bookmarks(event),
        }
    }

    fn map_event_normal(&mut self, event: Event) -> UiEvent {
        match event {
            Event::Key(KeyEvent {
                code, modifiers, ..
            }) => match (code, modifiers) {
                (KeyCode::Char(c), KeyModifiers::NONE)
                    if c.is_ascii_digit() && self.char_stack.is_empty() =>
                {
                    if let Some(digit) = c.to_digit(10) {
                        self.push_digit(digit as usize);
                    }
                    UiEvent::None
                }
                (KeyCode::Char(c), _) if self.char_stack.as_str() == "m" => {
                    self.reset_char_stack();
                    UiEvent::Command(Command::AddBookmark {
                        label: c.to_string(),
                    })
                }
                (KeyCode::Char(c), _) if self.char_stack.as_str() == "\'" => {
                    self.reset_char_stack();
                    UiEvent::Command(Command::GotoBookmark {
                        label: c.to_string(),
                    })
                }
                (KeyCode::Char('m'), _) => {
                    if self.char_stack.is_empty() {
                        self.push_char('m');
                    }
                    UiEvent::None
                }
                (KeyCode::Char('\''), _) => {
                    if self.char_stack.is_empty() {
                        self.push_char('\'');
                    }
                    UiEvent::None
                }
                (KeyCode::Char('j'), KeyModifiers::NONE)
                | (KeyCode::Down, KeyModifiers::NONE)
                | (KeyCode::PageDown, _)
                | (KeyCode::Char(' '), KeyModifiers::NONE) => {
                    let count = self.take_count();
                    UiEvent::Command(Command::NextPage { count })
                }
                (KeyCode::Char('k'), KeyModifiers::NONE)
                | (KeyCode::Up, KeyModifiers::NONE)
                | (KeyCode::PageUp, _) => {
                    let count = self.take_count();
                    UiEvent::Command(Command::PrevPage { count })
                }
                (KeyCode::Char('g'), KeyModifiers::NONE) | (KeyCode::Home, _) => {
                    self.reset_count();
                    UiEvent::Command(Command::GotoPage { page: 1 })
                }
                (KeyCode::Char('G'), modifiers)
                    if modifiers.is_empty() || modifiers == KeyModifiers::SHIFT =>
                {
                    let page = match self.pending_count.take() {
                        Some(count) if count > 0 => count,
                        _ => usize::MAX,
                    };
                    self.pending_digits.clear();
                    UiEvent::Command(Command::GotoPage { page })
                }
                (KeyCode::End, _) => {
                    self.reset_count();
                    UiEvent::Command(Command::GotoPage { page: usize::MAX })
                }
                (KeyCode::Char('+'), _) => {
                    self.reset_count();
                    UiEvent::Command(Command::AdjustPageSize {
                        delta: PAGE_SIZE_STEP,
                    })
                }
                (KeyCode::Char('-'), _) => {
                    self.reset_count();
                    UiEvent::Command(Command::AdjustPageSize {
                        delta: -PAGE_SIZE_STEP,
                    })
                }
                (KeyCode::Char('b'), _) => {
                    self.reset_count();
                    self.reset_char_stack();
                    UiEvent::OpenBookmarks
                }
                (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => {
                    self.reset_count();
                    UiEvent::Quit
                }
                _ => {
                    self.reset_count();
                    self.reset_char_stack();
                    UiEvent::None
                }
            },
            _ => UiEvent::None,
        }
    }

    fn map_event_bookmarks(&mut self, event: Event) -> UiEvent {
        match event {
            Event::Key(KeyEvent { code, .. }) => match code {
                KeyCode::Esc | KeyCode::Char('b') => UiEvent::CloseOverlay,
                KeyCode::Enter => UiEvent::BookmarkActivateSelection,
                KeyCode::Char('j') | KeyCode::Down => UiEvent::BookmarkMoveSelection { delta: 1 },
                KeyCode::Char('k') | KeyCode::Up => UiEvent::BookmarkMoveSelection { delta: -1 },
                KeyCode::Char('q') => UiEvent::Quit,
                _ => UiEvent::None,
            },
            _ => UiEvent::None,
        }
    }

    fn push_digit(&mut self, digit: usize) {
        let current = self.pending_count.unwrap_or(0);
        let next = current.saturating_mul(10).saturating_add(digit);
        self.pending_count = Some(next);
        if let Some(c) = char::from_digit(digit as u32, 10) {
            self.pending_digits.push(c);
        }
    }

    fn take_count(&mut self) -> usize {
        let count = self
            .pending_count
            .take()
            .filter(|&count| count > 0)
            .unwrap_or(1);
        self.pending_digits.clear();
        count
    }

    fn reset_count(&mut self) {
        self.pending_count = None;
        self.pending_digits.clear();
    }

    fn push_char(&mut self, char: char) {
        self.char_stack.push(char);
    }

    fn reset_char_stack(&mut self) {
        self.char_stack.clear();
    }

    pub fn pending_input(&self) -> Option<String> {
        let mut pending = String::new();
        if !self.pending_digits.is_empty() {
            pending.push_str(&self.pending_digits);
        }
        if !self.char_stack.is_empty() {
            pending.push_str(&self.char_stack);
        }
        if pending.is_empty() {
            None
        } else {
            Some(pending)
        }
    }
}
