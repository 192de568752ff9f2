use std::fs;
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossterm::cursor;
use crossterm::event;
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{self, Clear, ClearType};
use directories::ProjectDirs;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, EnvFilter};
use txtpager_core::{Command, Config, DocumentView, PagerSession};
use txtpager_tty::{
    write_status_line, DrawParams, EventMapper, InputMode, PageRenderer, UiEvent,
};

#[derive(Debug, Parser)]
#[command(
    name = "txtpager",
    version,
    about = "terminal pager for very large plain-text files"
)]
struct Args {
    /// Page to open the document on (1-based)
    #[arg(short = 'p', long = "page")]
    page: Option<usize>,

    /// Lines per page, overriding the configured value
    #[arg(short = 'l', long = "page-size")]
    page_size: Option<NonZeroUsize>,

    /// Path to the text file to open
    file: PathBuf,
}

struct RawModeGuard;

impl RawModeGuard {
    fn new() -> anyhow::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = crossterm::execute!(stdout, cursor::Show);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let project_dirs = ProjectDirs::from("io", "txtpager", "txtpager")
        .ok_or_else(|| anyhow!("unable to resolve platform data directories"))?;
    let _log_guard = init_logging(&project_dirs)?;

    let config = Config::load(&project_dirs.config_dir().join("config.toml"))?;
    let page_size = args.page_size.unwrap_or(config.page_size);

    let mut session = PagerSession::new(page_size);
    session
        .open(args.file.clone())
        .with_context(|| format!("failed to open {:?}", args.file))?;
    if let Some(page) = args.page {
        session.apply(Command::GotoPage { page })?;
    }

    let _raw = RawModeGuard::new()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, cursor::Hide)?;
    let mut renderer = PageRenderer::new(stdout);
    let mut event_mapper = EventMapper::new();
    let mut overlay = OverlayState::None;
    let mut notice: Option<String> = None;
    let mut dirty = true;

    loop {
        if overlay.is_active() {
            if event_mapper.mode() != InputMode::Bookmarks {
                event_mapper.set_mode(InputMode::Bookmarks);
            }
        } else if matches!(event_mapper.mode(), InputMode::Bookmarks) {
            event_mapper.set_mode(InputMode::Normal);
        }

        if dirty {
            let pending = event_mapper.pending_input();
            redraw(
                &mut renderer,
                &session,
                pending.as_deref(),
                notice.as_deref(),
                &mut overlay,
            )?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;
            let ui_event = event_mapper.map_event(ev);
            let pending = event_mapper.pending_input();
            if !overlay.is_active() {
                if let Some(status) = combine_status(
                    document_status(&session),
                    pending.as_deref(),
                    notice.as_deref(),
                ) {
                    draw_status_line(&mut renderer, &status)?;
                }
            }
            let overlay_was_active = overlay.is_active();
            match handle_event(
                ui_event,
                &mut session,
                &mut overlay,
                &mut event_mapper,
                &mut notice,
            ) {
                LoopAction::ContinueRedraw => dirty = true,
                LoopAction::Continue => {}
                LoopAction::Quit => break,
            }
            if overlay.is_active() != overlay_was_active {
                dirty = true;
            }
        }
    }

    renderer.clear_all()?;
    Ok(())
}

enum LoopAction {
    Continue,
    ContinueRedraw,
    Quit,
}

enum OverlayState {
    None,
    Bookmarks(BookmarkWindow),
}

impl OverlayState {
    fn deactivate(&mut self) {
        *self = OverlayState::None;
    }

    fn is_active(&self) -> bool {
        !matches!(self, OverlayState::None)
    }
}

/// Scrollable bookmark list, shown as a centered inverted-video window.
struct BookmarkWindow {
    entries: Vec<(String, usize)>,
    selected: usize,
    scroll_offset: usize,
}

impl BookmarkWindow {
    fn from_document(doc: &DocumentView) -> Self {
        let entries: Vec<(String, usize)> = doc
            .bookmarks
            .iter()
            .map(|(label, &page)| (label.clone(), page))
            .collect();
        let selected = entries
            .iter()
            .position(|&(_, page)| page == doc.current_page)
            .unwrap_or(0);
        Self {
            entries,
            selected,
            scroll_offset: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn selected_entry(&self) -> Option<&(String, usize)> {
        self.entries.get(self.selected)
    }

    fn move_selection(&mut self, delta: isize) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let len = self.entries.len() as isize;
        let next = (self.selected as isize + delta).clamp(0, len - 1) as usize;
        if next != self.selected {
            self.selected = next;
            true
        } else {
            false
        }
    }

    fn ensure_visible(&mut self, viewport_height: usize) {
        if viewport_height == 0 || self.entries.is_empty() {
            self.scroll_offset = 0;
            return;
        }
        let max_offset = self.entries.len().saturating_sub(viewport_height.max(1));
        if self.scroll_offset > max_offset {
            self.scroll_offset = max_offset;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
            return;
        }
        let bottom = self.scroll_offset + viewport_height;
        if self.selected >= bottom {
            self.scroll_offset = self
                .selected
                .saturating_sub(viewport_height.saturating_sub(1));
        }
    }
}

fn handle_event(
    event: UiEvent,
    session: &mut PagerSession,
    overlay: &mut OverlayState,
    mapper: &mut EventMapper,
    notice: &mut Option<String>,
) -> LoopAction {
    match event {
        UiEvent::Command(cmd) => {
            match session.apply(cmd) {
                Ok(()) => {
                    *notice = None;
                }
                Err(err) => {
                    // Session state is untouched on failure; show the
                    // message and keep the current page on screen.
                    warn!(?err, "command failed");
                    *notice = Some(format!("{:#}", err));
                }
            }
            LoopAction::ContinueRedraw
        }
        UiEvent::OpenBookmarks => {
            if let Some(doc) = session.active() {
                *overlay = OverlayState::Bookmarks(BookmarkWindow::from_document(doc));
                mapper.set_mode(InputMode::Bookmarks);
                LoopAction::ContinueRedraw
            } else {
                LoopAction::Continue
            }
        }
        UiEvent::CloseOverlay => {
            if overlay.is_active() {
                overlay.deactivate();
                mapper.set_mode(InputMode::Normal);
                LoopAction::ContinueRedraw
            } else {
                LoopAction::Continue
            }
        }
        UiEvent::BookmarkMoveSelection { delta } => {
            if let OverlayState::Bookmarks(window) = overlay {
                if window.move_selection(delta) {
                    return LoopAction::ContinueRedraw;
                }
            }
            LoopAction::Continue
        }
        UiEvent::BookmarkActivateSelection => {
            if let OverlayState::Bookmarks(window) = overlay {
                if let Some(&(_, page)) = window.selected_entry() {
                    if let Err(err) = session.apply(Command::GotoPage { page }) {
                        warn!(?err, "bookmark jump failed");
                        *notice = Some(format!("{:#}", err));
                    }
                    overlay.deactivate();
                    mapper.set_mode(InputMode::Normal);
                    return LoopAction::ContinueRedraw;
                }
            }
            LoopAction::Continue
        }
        UiEvent::Quit => LoopAction::Quit,
        UiEvent::None => LoopAction::Continue,
    }
}

fn redraw(
    renderer: &mut PageRenderer<io::Stdout>,
    session: &PagerSession,
    pending_input: Option<&str>,
    notice: Option<&str>,
    overlay: &mut OverlayState,
) -> Result<()> {
    let (total_cols, total_rows) = terminal::size()?;
    let total_cols = total_cols.max(1);
    let total_rows = total_rows.max(1);
    let page_rows = total_rows.saturating_sub(1).max(1);

    if let OverlayState::Bookmarks(window) = overlay {
        renderer.clear_all()?;
        draw_bookmark_overlay(renderer, window, total_cols, page_rows)?;
        return Ok(());
    }

    // Fetch before touching the screen so a read failure leaves the
    // previously drawn page visible.
    let lines = match session.page_text() {
        Ok(lines) => lines,
        Err(err) => {
            warn!(?err, "failed to read current page");
            let message = format!("{:#}", err);
            if let Some(status) =
                combine_status(document_status(session), pending_input, Some(&message))
            {
                draw_status_line(renderer, &status)?;
            }
            return Ok(());
        }
    };

    renderer.draw(&lines, DrawParams::clamped(total_cols, page_rows))?;
    if let Some(status) = combine_status(document_status(session), pending_input, notice) {
        draw_status_line(renderer, &status)?;
    }
    Ok(())
}

fn document_status(session: &PagerSession) -> Option<String> {
    session
        .active()
        .map(|doc| format_document_status(doc, session.page_size()))
}

fn format_document_status(doc: &DocumentView, page_size: NonZeroUsize) -> String {
    format!(
        "{} — page {}/{} — {} lines/page — {} lines",
        doc.info
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("<unknown>"),
        doc.current_page,
        doc.info.page_count,
        page_size,
        doc.info.line_count
    )
}

fn combine_status(
    base: Option<String>,
    pending_input: Option<&str>,
    notice: Option<&str>,
) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    let base = base.unwrap_or_default();
    if !base.is_empty() {
        parts.push(&base);
    }
    if let Some(pending) = pending_input.filter(|s| !s.is_empty()) {
        parts.push(pending);
    }
    if let Some(notice) = notice.filter(|s| !s.is_empty()) {
        parts.push(notice);
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

fn draw_status_line(renderer: &mut PageRenderer<io::Stdout>, status: &str) -> Result<()> {
    let (_, total_rows) = terminal::size()?;
    let status_row = total_rows.saturating_sub(1);
    let mut writer = renderer.writer();
    crossterm::execute!(
        &mut writer,
        cursor::MoveTo(0, status_row),
        Clear(ClearType::CurrentLine)
    )?;
    write_status_line(&mut writer, status)?;
    Ok(())
}

fn draw_bookmark_overlay(
    renderer: &mut PageRenderer<io::Stdout>,
    window: &mut BookmarkWindow,
    total_cols: u16,
    page_rows: u16,
) -> Result<()> {
    const TITLE: &str = "Bookmarks";
    const EMPTY_MESSAGE: &str = "No bookmarks yet";

    let total_cols = total_cols as usize;
    let page_rows = page_rows as usize;
    if total_cols < 20 || page_rows < 6 {
        return Ok(());
    }

    let max_inner_width = total_cols.saturating_sub(6);
    if max_inner_width < 10 {
        return Ok(());
    }

    let base_width = if window.is_empty() {
        EMPTY_MESSAGE.len() + 2
    } else {
        window
            .entries
            .iter()
            .map(|entry| bookmark_line_length(entry))
            .max()
            .unwrap_or(0)
            .max(TITLE.len())
    };

    let mut inner_width = base_width.min(max_inner_width);
    let min_inner_width = 20.min(max_inner_width);
    if inner_width < min_inner_width {
        inner_width = min_inner_width;
    }

    let max_window_height = page_rows.saturating_sub(2);
    if max_window_height < 6 {
        return Ok(());
    }
    let max_content_height = max_window_height.saturating_sub(4);
    if max_content_height == 0 {
        return Ok(());
    }

    let total_entries = if window.is_empty() {
        1
    } else {
        window.entries.len()
    };
    let content_height = total_entries.min(max_content_height).max(1);
    window.ensure_visible(content_height);
    let max_scroll = total_entries.saturating_sub(content_height);
    if window.scroll_offset > max_scroll {
        window.scroll_offset = max_scroll;
    }

    let window_height = content_height + 4;
    if window_height > max_window_height {
        return Ok(());
    }
    let window_width = inner_width + 2;
    if window_width > total_cols {
        return Ok(());
    }

    let start_col = ((total_cols - window_width) / 2) as u16;
    let start_row = ((page_rows - window_height) / 2) as u16;

    let mut writer = renderer.writer();
    let mut current_row = start_row;
    let horizontal_border = "-".repeat(inner_width);

    print_inverted(
        &mut writer,
        start_col,
        current_row,
        &format!("+{}+", horizontal_border),
    )?;
    current_row = current_row.saturating_add(1);

    let title_line = format!("|{: ^inner_width$}|", TITLE, inner_width = inner_width);
    print_inverted(&mut writer, start_col, current_row, &title_line)?;
    current_row = current_row.saturating_add(1);

    let divider = format!("|{}|", "-".repeat(inner_width));
    print_inverted(&mut writer, start_col, current_row, &divider)?;
    current_row = current_row.saturating_add(1);

    if window.is_empty() {
        let content = truncate_with_ellipsis(format!("  {}", EMPTY_MESSAGE), inner_width);
        let line = format!("|{}|", content);
        print_inverted(&mut writer, start_col, current_row, &line)?;
        current_row = current_row.saturating_add(1);
    } else {
        let start_index = window.scroll_offset;
        let end_index = (start_index + content_height).min(window.entries.len());
        for idx in start_index..end_index {
            let entry = &window.entries[idx];
            let selected = idx == window.selected;
            let content = format_bookmark_line(entry, selected, inner_width);
            let line = format!("|{}|", content);
            print_inverted(&mut writer, start_col, current_row, &line)?;
            current_row = current_row.saturating_add(1);
        }

        let rendered = end_index - start_index;
        for _ in rendered..content_height {
            let line = format!("|{}|", " ".repeat(inner_width));
            print_inverted(&mut writer, start_col, current_row, &line)?;
            current_row = current_row.saturating_add(1);
        }
    }

    print_inverted(
        &mut writer,
        start_col,
        current_row,
        &format!("+{}+", horizontal_border),
    )?;

    Ok(())
}

fn print_inverted(writer: &mut impl Write, col: u16, row: u16, content: &str) -> Result<()> {
    crossterm::execute!(
        writer,
        cursor::MoveTo(col, row),
        SetAttribute(Attribute::Reverse),
        Print(content),
        SetAttribute(Attribute::Reset)
    )?;
    Ok(())
}

fn bookmark_line_length(entry: &(String, usize)) -> usize {
    let page_suffix = format!(" (p{})", entry.1);
    2 + entry.0.len() + page_suffix.len()
}

fn format_bookmark_line(entry: &(String, usize), selected: bool, inner_width: usize) -> String {
    let marker = if selected { '>' } else { ' ' };
    let mut text = String::new();
    text.push(marker);
    text.push(' ');
    text.push_str(&entry.0);
    text.push_str(&format!(" (p{})", entry.1));
    truncate_with_ellipsis(text, inner_width)
}

fn truncate_with_ellipsis(mut text: String, width: usize) -> String {
    if text.len() > width {
        if width <= 3 {
            text.truncate(width);
        } else {
            let mut truncated = text.chars().take(width - 3).collect::<String>();
            truncated.push_str("...");
            text = truncated;
        }
    }
    if text.len() < width {
        text.push_str(&" ".repeat(width - text.len()));
    }
    text
}

fn init_logging(project_dirs: &ProjectDirs) -> Result<WorkerGuard> {
    let log_dir = project_dirs.data_local_dir().join("logs");
    fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, "txtpager.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    Ok(guard)
}
