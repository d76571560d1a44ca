//! Composable views over a log file.
//!
//! A [`FileView`] is either the root view (all lines, in order) or a derived
//! view holding an explicit ordered subsequence of absolute line positions
//! that satisfied a filter when it was applied. Derived views form an owned
//! chain back to the root; popping with [`FileView::up`] or [`FileView::top`]
//! repositions the parent to the absolute line equivalent of the current
//! cursor.
//!
//! Filters are point-in-time materializations: the matching positions are
//! computed once against the parent's current contents and never reapplied.

use crate::error::{JlvError, Result};
use crate::file::{value_to_string, Record, SharedFile};
use memchr::memmem;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
    NotEqual,
    GreaterOrEqual,
    LessOrEqual,
    Regexp,
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilterOp::Equal => "eq",
            FilterOp::NotEqual => "ne",
            FilterOp::GreaterOrEqual => "ge",
            FilterOp::LessOrEqual => "le",
            FilterOp::Regexp => "regexp",
        };
        f.write_str(s)
    }
}

/// One filter application: field name, comparison value and operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub tag: String,
    pub mask: String,
    pub op: FilterOp,
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.tag, self.op, self.mask)
    }
}

/// Direction for search traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

impl SearchDirection {
    pub fn reversed(self) -> Self {
        match self {
            SearchDirection::Forward => SearchDirection::Backward,
            SearchDirection::Backward => SearchDirection::Forward,
        }
    }
}

/// Parameters of the last search, reused by repeat-search (`n`/`N`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub mask: String,
    pub idx: i64,
    pub dir: SearchDirection,
    pub tag: Option<String>,
    pub is_regexp: bool,
}

/// A successful search: view-relative line index plus, for raw-line
/// searches, the matched byte span used for highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub index: usize,
    pub span: Option<(usize, usize)>,
}

enum ViewKind {
    Root,
    Derived {
        parent: Box<FileView>,
        index: Vec<usize>,
        name: String,
    },
}

/// A view over a [`File`](crate::file::File): the whole line sequence or a
/// filtered subsequence, with its own scroll cursor.
///
/// The cursor is deliberately unclamped by [`FileView::move_by`]; callers are
/// responsible for clamping against [`FileView::line_count`].
pub struct FileView {
    file: SharedFile,
    kind: ViewKind,
    pos: i64,
}

impl FileView {
    /// The root view over every line of the file, in file order.
    pub fn root(file: SharedFile) -> Self {
        Self {
            file,
            kind: ViewKind::Root,
            pos: 0,
        }
    }

    /// Shared handle to the underlying file.
    pub fn file(&self) -> &SharedFile {
        &self.file
    }

    /// Number of lines visible in this view.
    pub fn line_count(&self) -> usize {
        match &self.kind {
            ViewKind::Root => self.file.lock().line_count(),
            ViewKind::Derived { index, .. } => index.len(),
        }
    }

    /// Display name of the filter that produced this view, empty for the root.
    pub fn name(&self) -> &str {
        match &self.kind {
            ViewKind::Root => "",
            ViewKind::Derived { name, .. } => name,
        }
    }

    pub fn has_parent(&self) -> bool {
        matches!(self.kind, ViewKind::Derived { .. })
    }

    /// Current cursor position (view-relative line scrolled to the top).
    pub fn position(&self) -> i64 {
        self.pos
    }

    pub fn set_position(&mut self, pos: i64) {
        self.pos = pos;
    }

    /// Shift the cursor by `delta` lines without clamping.
    pub fn move_by(&mut self, delta: i64) {
        self.pos += delta;
    }

    /// Absolute file position of view-relative line `i`.
    pub fn absolute(&self, i: usize) -> Option<usize> {
        match &self.kind {
            ViewKind::Root => (i < self.file.lock().line_count()).then_some(i),
            ViewKind::Derived { index, .. } => index.get(i).copied(),
        }
    }

    /// Decoded record of view-relative line `i`.
    pub fn record(&self, i: usize) -> Option<Arc<Record>> {
        let abs = self.absolute(i)?;
        self.file.lock().record(abs)
    }

    /// Record at offset `n` from the cursor, as rendered on screen row `n`.
    pub fn line(&self, n: i64) -> Option<Arc<Record>> {
        let idx = self.pos + n;
        if idx < 0 {
            return None;
        }
        self.record(idx as usize)
    }

    /// Level names recognized by filters, in rank order.
    pub fn levels(&self) -> &'static [&'static str] {
        &crate::file::LEVEL_NAMES
    }

    /// Field names observed so far, role fields first.
    pub fn known_tags(&self) -> Vec<String> {
        self.file.lock().known_tags().to_vec()
    }

    /// Apply a filter to every line visible in this view, producing a
    /// derived child view of the matching absolute positions.
    pub fn filter(self, filter: Filter) -> FileView {
        let name = filter.to_string();
        let mut matched = Vec::new();
        {
            let file = Arc::clone(&self.file);
            let mut guard = file.lock();
            let count = match &self.kind {
                ViewKind::Root => guard.line_count(),
                ViewKind::Derived { index, .. } => index.len(),
            };
            for i in 0..count {
                let abs = match &self.kind {
                    ViewKind::Root => i,
                    ViewKind::Derived { index, .. } => index[i],
                };
                if let Some(record) = guard.record(abs) {
                    if guard.fit(&record, &filter) {
                        matched.push(abs);
                    }
                }
            }
        }
        FileView {
            file: Arc::clone(&self.file),
            kind: ViewKind::Derived {
                parent: Box::new(self),
                index: matched,
                name,
            },
            pos: 0,
        }
    }

    /// Pop to the parent view, repositioned to the absolute line equivalent
    /// of the current cursor. The root view returns itself unchanged.
    pub fn up(self) -> FileView {
        let target = self.absolute_position();
        match self.kind {
            ViewKind::Root => FileView {
                file: self.file,
                kind: ViewKind::Root,
                pos: self.pos,
            },
            ViewKind::Derived { parent, .. } => {
                let mut parent = *parent;
                if let Some(abs) = target {
                    parent.rewind_to(abs);
                }
                parent
            }
        }
    }

    /// Pop the whole chain back to the root view, repositioned to the
    /// absolute line equivalent of the current cursor.
    pub fn top(self) -> FileView {
        if !self.has_parent() {
            return self;
        }
        let target = self.absolute_position();
        let mut view = self;
        while let ViewKind::Derived { parent, .. } = view.kind {
            view = *parent;
        }
        if let Some(abs) = target {
            view.rewind_to(abs);
        }
        view
    }

    /// Absolute file position equivalent to the current cursor, clamped into
    /// the view's line range. `None` for an empty view.
    fn absolute_position(&self) -> Option<usize> {
        let count = self.line_count();
        if count == 0 {
            return None;
        }
        let clamped = self.pos.clamp(0, count as i64 - 1) as usize;
        self.absolute(clamped)
    }

    /// Reposition to the first view line at or after the absolute position;
    /// a derived view with no such line keeps its previous cursor.
    fn rewind_to(&mut self, abs: usize) {
        match &self.kind {
            ViewKind::Root => self.pos = abs as i64,
            ViewKind::Derived { index, .. } => {
                if let Some(i) = index.iter().position(|p| *p >= abs) {
                    self.pos = i as i64;
                }
            }
        }
    }

    /// Search the raw undecoded line bytes of this view for a substring,
    /// circularly from `from` (view-relative), wrapping at the boundaries.
    ///
    /// `Ok(None)` after visiting every line once is the not-found outcome,
    /// distinct from a read error.
    pub fn search(
        &self,
        mask: &str,
        from: i64,
        direction: SearchDirection,
    ) -> Result<Option<SearchHit>> {
        let count = self.line_count();
        if count == 0 {
            return Ok(None);
        }
        let finder = memmem::Finder::new(mask.as_bytes());
        let mut guard = self.file.lock();
        let start = wrap_index(from, count);
        let mut cur = start;
        loop {
            let abs = match &self.kind {
                ViewKind::Root => cur,
                ViewKind::Derived { index, .. } => index[cur],
            };
            let bytes = guard
                .raw_bytes(abs)
                .map_err(|_| JlvError::other("file read error"))?;
            if let Some(at) = finder.find(bytes) {
                return Ok(Some(SearchHit {
                    index: cur,
                    span: Some((at, at + mask.len())),
                }));
            }
            cur = step(cur, direction, count);
            if cur == start {
                return Ok(None);
            }
        }
    }

    /// Search one field's string encoding across this view, circularly from
    /// `from`. Without `is_regexp` the match is substring containment; with
    /// it the mask is compiled and matched as a regular expression.
    ///
    /// Lines missing the field never match.
    pub fn search_tag(
        &self,
        tag: &str,
        mask: &str,
        from: i64,
        direction: SearchDirection,
        is_regexp: bool,
    ) -> Result<Option<SearchHit>> {
        let count = self.line_count();
        if count == 0 {
            return Ok(None);
        }
        let pattern = if is_regexp {
            Some(Regex::new(mask)?)
        } else {
            None
        };
        let mut guard = self.file.lock();
        let start = wrap_index(from, count);
        let mut cur = start;
        loop {
            let abs = match &self.kind {
                ViewKind::Root => cur,
                ViewKind::Derived { index, .. } => index[cur],
            };
            let record = guard
                .record(abs)
                .ok_or_else(|| JlvError::other("file read error"))?;
            if let Some(value) = record.get(tag) {
                let val = value_to_string(value);
                let matched = match &pattern {
                    Some(re) => re.is_match(&val),
                    None => val.contains(mask),
                };
                if matched {
                    return Ok(Some(SearchHit {
                        index: cur,
                        span: None,
                    }));
                }
            }
            cur = step(cur, direction, count);
            if cur == start {
                return Ok(None);
            }
        }
    }
}

impl fmt::Debug for FileView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileView")
            .field("name", &self.name())
            .field("pos", &self.pos)
            .field("derived", &self.has_parent())
            .finish()
    }
}

/// Clamp a possibly out-of-range starting index into `[0, count)` the way
/// circular traversal expects: past the end wraps to the first line, before
/// the start wraps to the last.
fn wrap_index(from: i64, count: usize) -> usize {
    if from >= count as i64 {
        0
    } else if from < 0 {
        count - 1
    } else {
        from as usize
    }
}

fn step(cur: usize, direction: SearchDirection, count: usize) -> usize {
    match direction {
        SearchDirection::Forward => {
            if cur + 1 >= count {
                0
            } else {
                cur + 1
            }
        }
        SearchDirection::Backward => {
            if cur == 0 {
                count - 1
            } else {
                cur - 1
            }
        }
    }
}
