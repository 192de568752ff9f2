use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

pub type DocumentId = Uuid;

static DOCUMENT_NAMESPACE: Lazy<Uuid> = Lazy::new(|| {
    Uuid::parse_str("4f8a1d6e-2b07-5c33-9d41-8be2a0c4f7d9").expect("valid namespace UUID")
});

pub fn document_id_for_path(path: &Path) -> DocumentId {
    let resolved = path
        .canonicalize()
        .or_else(|_| {
            if path.is_absolute() {
                Ok(path.to_path_buf())
            } else {
                std::env::current_dir().map(|cwd| cwd.join(path))
            }
        })
        .unwrap_or_else(|_| path.to_path_buf());
    let rendered = resolved.to_string_lossy();
    Uuid::new_v5(&*DOCUMENT_NAMESPACE, rendered.as_bytes())
}

/// Default lines per page, matching the classic desktop TXT readers.
pub const DEFAULT_PAGE_SIZE: usize = 100;
/// Interactive page-size adjustments stay within this range.
pub const PAGE_SIZE_MIN: usize = 50;
pub const PAGE_SIZE_MAX: usize = 500;
/// Step applied by a single interactive page-size adjustment.
pub const PAGE_SIZE_STEP: isize = 10;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Streams pages of lines out of arbitrarily large plain-text files.
///
/// The reader holds nothing but the caller-supplied page size. Every call
/// opens its own file handle, scans forward from the start of the file and
/// releases the handle on return, so multi-gigabyte files are never loaded
/// or indexed. Files are treated as UTF-8; malformed byte sequences are
/// replaced with U+FFFD on both the counting and the reading path.
#[derive(Debug, Clone, Copy)]
pub struct PagedLineReader {
    page_size: NonZeroUsize,
}

impl PagedLineReader {
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self { page_size }
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: NonZeroUsize) {
        self.page_size = page_size;
    }

    /// Counts newline-delimited lines with a single sequential pass,
    /// holding at most one line in memory. A final line without a trailing
    /// terminator still counts.
    pub fn count_lines(&self, path: &Path) -> Result<u64, ReaderError> {
        let mut reader = self.open(path)?;
        let mut buf = Vec::new();
        let mut lines = 0u64;
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| ReaderError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            lines += 1;
        }
        Ok(lines)
    }

    /// Total page count for the file's current content. 0 for an empty file.
    pub fn count_pages(&self, path: &Path) -> Result<usize, ReaderError> {
        let lines = self.count_lines(path)?;
        Ok(self.pages_for(lines))
    }

    /// `ceil(line_count / page_size)` without touching the file.
    pub fn pages_for(&self, line_count: u64) -> usize {
        let pages = line_count.div_ceil(self.page_size.get() as u64);
        usize::try_from(pages).unwrap_or(usize::MAX)
    }

    /// Returns the lines of `page` (1-indexed), with terminators stripped.
    ///
    /// The scan skips `(page - 1) * page_size` lines without retaining them,
    /// then collects up to `page_size` lines, stopping early at EOF. A page
    /// past the end of the file's current content yields an empty vec rather
    /// than an error, which also tolerates the file having been truncated
    /// since the last count.
    pub fn read_page(&self, path: &Path, page: NonZeroUsize) -> Result<Vec<String>, ReaderError> {
        let mut reader = self.open(path)?;
        let mut buf = Vec::new();
        let skip = (page.get() - 1).saturating_mul(self.page_size.get());

        for _ in 0..skip {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| ReaderError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
            if read == 0 {
                return Ok(Vec::new());
            }
        }

        let mut lines = Vec::new();
        for _ in 0..self.page_size.get() {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| ReaderError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            lines.push(decode_line(&buf));
        }
        Ok(lines)
    }

    fn open(&self, path: &Path) -> Result<BufReader<File>, ReaderError> {
        let file = File::open(path).map_err(|source| ReaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(BufReader::new(file))
    }
}

fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && raw[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub id: DocumentId,
    pub path: PathBuf,
    pub line_count: u64,
    pub page_count: usize,
}

/// Per-document session state owned by the UI layer.
///
/// `current_page` is 1-based and satisfies `1 <= current_page <= page_count`
/// whenever `page_count > 0`; an empty document pins it at 1. Bookmarks map
/// a label to a page number, are validated against the page count at
/// creation time only, and live for the session.
#[derive(Debug, Clone)]
pub struct DocumentView {
    pub info: DocumentInfo,
    pub current_page: usize,
    pub bookmarks: BTreeMap<String, usize>,
}

#[derive(Debug, Clone)]
pub enum Command {
    NextPage { count: usize },
    PrevPage { count: usize },
    GotoPage { page: usize },
    AddBookmark { label: String },
    GotoBookmark { label: String },
    SetPageSize { lines: NonZeroUsize },
    AdjustPageSize { delta: isize },
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    DocumentOpened(DocumentId),
    RedrawNeeded(DocumentId),
    PageSizeChanged { lines: NonZeroUsize },
}

pub struct PagerSession {
    reader: PagedLineReader,
    document: Option<DocumentView>,
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl PagerSession {
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self {
            reader: PagedLineReader::new(page_size),
            document: None,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn events(&self) -> Arc<Mutex<Vec<SessionEvent>>> {
        Arc::clone(&self.events)
    }

    pub fn reader(&self) -> &PagedLineReader {
        &self.reader
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.reader.page_size()
    }

    pub fn active(&self) -> Option<&DocumentView> {
        self.document.as_ref()
    }

    /// Opens `path`, replacing any previously open document. The full
    /// forward pass over the file happens here, on the calling thread.
    #[instrument(skip(self))]
    pub fn open(&mut self, path: PathBuf) -> Result<()> {
        let line_count = self
            .reader
            .count_lines(&path)
            .with_context(|| format!("failed to open {:?}", path))?;
        let page_count = self.reader.pages_for(line_count);
        debug!(line_count, page_count, "scanned document");

        let info = DocumentInfo {
            id: document_id_for_path(&path),
            path,
            line_count,
            page_count,
        };
        let id = info.id;
        self.document = Some(DocumentView {
            info,
            current_page: 1,
            bookmarks: BTreeMap::new(),
        });
        self.events.lock().push(SessionEvent::DocumentOpened(id));
        self.events.lock().push(SessionEvent::RedrawNeeded(id));
        Ok(())
    }

    /// Lines of the current page. An empty document yields an empty vec.
    /// On error the session state is untouched, so callers can surface the
    /// message and keep showing the previous page.
    pub fn page_text(&self) -> Result<Vec<String>> {
        let Some(doc) = self.document.as_ref() else {
            return Ok(Vec::new());
        };
        match NonZeroUsize::new(doc.current_page) {
            Some(page) if doc.info.page_count > 0 => {
                let lines = self.reader.read_page(&doc.info.path, page)?;
                Ok(lines)
            }
            _ => Ok(Vec::new()),
        }
    }

    pub fn apply(&mut self, command: Command) -> Result<()> {
        match command {
            Command::NextPage { count } => {
                if let Some(doc) = self.document.as_mut() {
                    let last = doc.info.page_count.max(1);
                    let next = doc.current_page.saturating_add(count).min(last);
                    if next != doc.current_page {
                        doc.current_page = next;
                        self.events
                            .lock()
                            .push(SessionEvent::RedrawNeeded(doc.info.id));
                    }
                }
            }
            Command::PrevPage { count } => {
                if let Some(doc) = self.document.as_mut() {
                    let next = doc.current_page.saturating_sub(count).max(1);
                    if next != doc.current_page {
                        doc.current_page = next;
                        self.events
                            .lock()
                            .push(SessionEvent::RedrawNeeded(doc.info.id));
                    }
                }
            }
            Command::GotoPage { page } => {
                if let Some(doc) = self.document.as_mut() {
                    let next = page.clamp(1, doc.info.page_count.max(1));
                    if next != doc.current_page {
                        doc.current_page = next;
                        self.events
                            .lock()
                            .push(SessionEvent::RedrawNeeded(doc.info.id));
                    }
                }
            }
            Command::AddBookmark { label } => {
                let Some(doc) = self.document.as_mut() else {
                    bail!("no document open");
                };
                let page = doc.current_page;
                if doc.info.page_count == 0 || page > doc.info.page_count {
                    bail!("cannot bookmark page {} of an empty document", page);
                }
                let label = if label.is_empty() {
                    format!("bookmark {} (page {})", doc.bookmarks.len() + 1, page)
                } else {
                    label
                };
                doc.bookmarks.insert(label, page);
                self.events
                    .lock()
                    .push(SessionEvent::RedrawNeeded(doc.info.id));
            }
            Command::GotoBookmark { label } => {
                let Some(doc) = self.document.as_mut() else {
                    bail!("no document open");
                };
                let Some(&page) = doc.bookmarks.get(&label) else {
                    bail!("no bookmark named {:?}", label);
                };
                // The page count may have shrunk since the bookmark was made.
                let next = page.clamp(1, doc.info.page_count.max(1));
                if next != doc.current_page {
                    doc.current_page = next;
                    self.events
                        .lock()
                        .push(SessionEvent::RedrawNeeded(doc.info.id));
                }
            }
            Command::SetPageSize { lines } => {
                self.change_page_size(lines)?;
            }
            Command::AdjustPageSize { delta } => {
                let current = self.reader.page_size().get() as isize;
                let target = current
                    .saturating_add(delta)
                    .clamp(PAGE_SIZE_MIN as isize, PAGE_SIZE_MAX as isize);
                if let Some(lines) = NonZeroUsize::new(target as usize) {
                    self.change_page_size(lines)?;
                }
            }
        }
        Ok(())
    }

    /// Recomputes the derived counts under the new page size and clamps the
    /// current page back into range. The recount runs before anything is
    /// committed, so a failed scan leaves the session unchanged.
    fn change_page_size(&mut self, lines: NonZeroUsize) -> Result<()> {
        if lines == self.reader.page_size() {
            return Ok(());
        }

        let recount = match self.document.as_ref() {
            Some(doc) => {
                let line_count = self
                    .reader
                    .count_lines(&doc.info.path)
                    .with_context(|| format!("failed to re-scan {:?}", doc.info.path))?;
                Some(line_count)
            }
            None => None,
        };

        self.reader.set_page_size(lines);
        self.events
            .lock()
            .push(SessionEvent::PageSizeChanged { lines });

        if let (Some(doc), Some(line_count)) = (self.document.as_mut(), recount) {
            doc.info.line_count = line_count;
            doc.info.page_count = self.reader.pages_for(line_count);
            doc.current_page = doc.current_page.clamp(1, doc.info.page_count.max(1));
            self.events
                .lock()
                .push(SessionEvent::RedrawNeeded(doc.info.id));
        }
        Ok(())
    }
}

fn default_page_size() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN)
}

/// On-disk configuration, a small TOML file in the platform config dir.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_page_size")]
    pub page_size: NonZeroUsize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl Config {
    /// Loads the configuration, falling back to defaults when the file does
    /// not exist. A page size outside the interactive range is clamped.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        let mut config: Config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {:?}", path))?;
        let clamped = config.page_size.get().clamp(PAGE_SIZE_MIN, PAGE_SIZE_MAX);
        if let Some(page_size) = NonZeroUsize::new(clamped) {
            config.page_size = page_size;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    use tempfile::tempdir;

    fn page_size(lines: usize) -> NonZeroUsize {
        NonZeroUsize::new(lines).unwrap()
    }

    fn write_numbered_lines(path: &Path, count: usize) {
        let mut file = fs::File::create(path).unwrap();
        for i in 1..=count {
            writeln!(file, "line {}", i).unwrap();
        }
    }

    #[test]
    fn count_pages_matches_line_count_ceiling() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        write_numbered_lines(&path, 250);

        let reader = PagedLineReader::new(page_size(100));
        assert_eq!(reader.count_lines(&path).unwrap(), 250);
        assert_eq!(reader.count_pages(&path).unwrap(), 3);
    }

    #[test]
    fn exact_multiple_produces_no_partial_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        write_numbered_lines(&path, 100);

        let reader = PagedLineReader::new(page_size(100));
        assert_eq!(reader.count_pages(&path).unwrap(), 1);
        assert_eq!(reader.read_page(&path, page_size(1)).unwrap().len(), 100);
        assert!(reader.read_page(&path, page_size(2)).unwrap().is_empty());
    }

    #[test]
    fn read_page_returns_the_requested_slice() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        write_numbered_lines(&path, 250);

        let reader = PagedLineReader::new(page_size(100));
        let first = reader.read_page(&path, page_size(1)).unwrap();
        assert_eq!(first.len(), 100);
        assert_eq!(first[0], "line 1");
        assert_eq!(first[99], "line 100");

        let last = reader.read_page(&path, page_size(3)).unwrap();
        assert_eq!(last.len(), 50);
        assert_eq!(last[0], "line 201");
        assert_eq!(last[49], "line 250");

        assert!(reader.read_page(&path, page_size(4)).unwrap().is_empty());
    }

    #[test]
    fn pages_partition_the_file_exactly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        write_numbered_lines(&path, 37);

        let reader = PagedLineReader::new(page_size(5));
        let total = reader.count_pages(&path).unwrap();
        assert_eq!(total, 8);

        let mut collected = Vec::new();
        for page in 1..=total {
            collected.extend(reader.read_page(&path, page_size(page)).unwrap());
        }
        let expected: Vec<String> = (1..=37).map(|i| format!("line {}", i)).collect();
        assert_eq!(collected, expected);
    }

    #[test]
    fn empty_file_has_zero_pages_and_empty_reads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, b"").unwrap();

        let reader = PagedLineReader::new(page_size(100));
        assert_eq!(reader.count_pages(&path).unwrap(), 0);
        assert!(reader.read_page(&path, page_size(1)).unwrap().is_empty());
        assert!(reader.read_page(&path, page_size(7)).unwrap().is_empty());
    }

    #[test]
    fn trailing_partial_line_counts_as_a_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        fs::write(&path, b"alpha\nbeta\ngamma").unwrap();

        let reader = PagedLineReader::new(page_size(2));
        assert_eq!(reader.count_lines(&path).unwrap(), 3);
        assert_eq!(reader.count_pages(&path).unwrap(), 2);
        assert_eq!(
            reader.read_page(&path, page_size(2)).unwrap(),
            vec!["gamma".to_string()]
        );
    }

    #[test]
    fn crlf_terminators_are_stripped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        fs::write(&path, b"one\r\ntwo\r\n").unwrap();

        let reader = PagedLineReader::new(page_size(10));
        assert_eq!(
            reader.read_page(&path, page_size(1)).unwrap(),
            vec!["one".to_string(), "two".to_string()]
        );
    }

    #[test]
    fn malformed_utf8_is_replaced_not_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        fs::write(&path, b"ok\n\xff\xfe\n").unwrap();

        let reader = PagedLineReader::new(page_size(10));
        assert_eq!(reader.count_lines(&path).unwrap(), 2);
        let lines = reader.read_page(&path, page_size(1)).unwrap();
        assert_eq!(lines[0], "ok");
        assert_eq!(lines[1], "\u{fffd}\u{fffd}");
    }

    #[test]
    fn repeated_reads_are_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        write_numbered_lines(&path, 12);

        let reader = PagedLineReader::new(page_size(5));
        let first = reader.read_page(&path, page_size(2)).unwrap();
        let second = reader.read_page(&path, page_size(2)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_file_reports_open_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.txt");

        let reader = PagedLineReader::new(page_size(100));
        match reader.count_pages(&path) {
            Err(ReaderError::Open { .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        match reader.read_page(&path, page_size(1)) {
            Err(ReaderError::Open { .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn truncated_file_yields_empty_pages_instead_of_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        write_numbered_lines(&path, 20);

        let reader = PagedLineReader::new(page_size(5));
        assert_eq!(reader.count_pages(&path).unwrap(), 4);

        // Shrink the file behind the reader's back.
        fs::write(&path, b"line 1\nline 2\n").unwrap();
        assert!(reader.read_page(&path, page_size(3)).unwrap().is_empty());
        assert_eq!(reader.read_page(&path, page_size(1)).unwrap().len(), 2);
    }

    #[test]
    fn session_navigation_clamps_to_document_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        write_numbered_lines(&path, 10);

        let mut session = PagerSession::new(page_size(2));
        session.open(path).unwrap();
        assert_eq!(session.active().unwrap().info.page_count, 5);
        assert_eq!(session.active().unwrap().current_page, 1);

        session.apply(Command::NextPage { count: 3 }).unwrap();
        assert_eq!(session.active().unwrap().current_page, 4);
        session.apply(Command::NextPage { count: 10 }).unwrap();
        assert_eq!(session.active().unwrap().current_page, 5);
        session.apply(Command::PrevPage { count: 100 }).unwrap();
        assert_eq!(session.active().unwrap().current_page, 1);
        session.apply(Command::GotoPage { page: 3 }).unwrap();
        assert_eq!(session.active().unwrap().current_page, 3);
        session.apply(Command::GotoPage { page: 999 }).unwrap();
        assert_eq!(session.active().unwrap().current_page, 5);
    }

    #[test]
    fn session_page_text_matches_reader_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        write_numbered_lines(&path, 7);

        let mut session = PagerSession::new(page_size(3));
        session.open(path.clone()).unwrap();
        session.apply(Command::GotoPage { page: 3 }).unwrap();

        let expected = PagedLineReader::new(page_size(3))
            .read_page(&path, page_size(3))
            .unwrap();
        assert_eq!(session.page_text().unwrap(), expected);
        assert_eq!(session.page_text().unwrap(), vec!["line 7".to_string()]);
    }

    #[test]
    fn bookmarks_record_and_restore_pages() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        write_numbered_lines(&path, 30);

        let mut session = PagerSession::new(page_size(10));
        session.open(path).unwrap();
        session.apply(Command::GotoPage { page: 2 }).unwrap();
        session
            .apply(Command::AddBookmark {
                label: "chapter two".to_string(),
            })
            .unwrap();
        session.apply(Command::GotoPage { page: 3 }).unwrap();
        session
            .apply(Command::GotoBookmark {
                label: "chapter two".to_string(),
            })
            .unwrap();
        assert_eq!(session.active().unwrap().current_page, 2);
    }

    #[test]
    fn empty_bookmark_label_is_autogenerated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        write_numbered_lines(&path, 5);

        let mut session = PagerSession::new(page_size(2));
        session.open(path).unwrap();
        session.apply(Command::NextPage { count: 1 }).unwrap();
        session
            .apply(Command::AddBookmark {
                label: String::new(),
            })
            .unwrap();

        let doc = session.active().unwrap();
        assert_eq!(doc.bookmarks.get("bookmark 1 (page 2)"), Some(&2));
    }

    #[test]
    fn bookmarking_an_empty_document_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, b"").unwrap();

        let mut session = PagerSession::new(page_size(100));
        session.open(path).unwrap();
        assert!(session
            .apply(Command::AddBookmark {
                label: "nope".to_string(),
            })
            .is_err());
    }

    #[test]
    fn unknown_bookmark_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        write_numbered_lines(&path, 5);

        let mut session = PagerSession::new(page_size(2));
        session.open(path).unwrap();
        assert!(session
            .apply(Command::GotoBookmark {
                label: "missing".to_string(),
            })
            .is_err());
    }

    #[test]
    fn changing_page_size_recounts_and_clamps_current_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        write_numbered_lines(&path, 100);

        let mut session = PagerSession::new(page_size(50));
        session.open(path).unwrap();
        session.apply(Command::GotoPage { page: 2 }).unwrap();

        session
            .apply(Command::SetPageSize {
                lines: page_size(100),
            })
            .unwrap();
        let doc = session.active().unwrap();
        assert_eq!(doc.info.page_count, 1);
        assert_eq!(doc.current_page, 1);
        assert_eq!(session.page_size().get(), 100);
    }

    #[test]
    fn interactive_page_size_steps_stay_in_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        write_numbered_lines(&path, 10);

        let mut session = PagerSession::new(page_size(PAGE_SIZE_MIN));
        session.open(path).unwrap();

        session
            .apply(Command::AdjustPageSize {
                delta: -PAGE_SIZE_STEP,
            })
            .unwrap();
        assert_eq!(session.page_size().get(), PAGE_SIZE_MIN);

        session
            .apply(Command::AdjustPageSize {
                delta: PAGE_SIZE_STEP,
            })
            .unwrap();
        assert_eq!(session.page_size().get(), PAGE_SIZE_MIN + 10);

        session
            .apply(Command::AdjustPageSize { delta: isize::MAX })
            .unwrap();
        assert_eq!(session.page_size().get(), PAGE_SIZE_MAX);
    }

    #[test]
    fn document_id_is_stable_for_same_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        fs::write(&path, b"dummy\n").unwrap();

        assert_eq!(document_id_for_path(&path), document_id_for_path(&path));
    }

    #[test]
    fn config_defaults_when_file_is_absent() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.page_size.get(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn config_clamps_out_of_range_page_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "page_size = 5000\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.page_size.get(), PAGE_SIZE_MAX);

        fs::write(&path, "page_size = 3\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.page_size.get(), PAGE_SIZE_MIN);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "page_size = \"lots\"\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
