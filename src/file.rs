//! Log file access: span index, record decoding and the record cache.
//!
//! A [`File`] owns the seekable byte source, the line-span index built once at
//! open, the LRU record cache, the set of field names observed so far and the
//! role→field-name mapping. Decoding is lazy: a record is only parsed when a
//! line is rendered, filtered or searched, and repeated access is served from
//! the cache.
//!
//! Read and decode problems are recorded on the `File` rather than propagated:
//! the affected line renders empty and the session surfaces the message on the
//! status row.

pub mod cache;
pub mod index;
pub mod tags;

use crate::error::{JlvError, Result};
use bstr::ByteSlice;
use parking_lot::Mutex;
use regex::Regex;
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

pub use cache::RecordCache;
pub use index::LineSpan;
pub use tags::{level_rank, sort_known_tags, Role, RoleTags, LEVEL_NAMES};

use crate::view::{Filter, FilterOp};

/// A decoded log record: field name to JSON value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Shared handle to a [`File`]; the session loop is the only writer, the
/// lock is uncontended by design.
pub type SharedFile = Arc<Mutex<File>>;

/// Initial scratch buffer size for line reads.
const SCRATCH_SIZE: usize = 1024;

/// How many leading records are decoded at open to seed the known-tags set.
const KNOWN_TAGS_DEPTH: usize = 500;

/// Seam over the underlying byte source so tests can run against in-memory
/// buffers and the binary against `std::fs::File`.
pub trait ByteSource: Read + Seek + Send {}
impl<T: Read + Seek + Send> ByteSource for T {}

/// String encoding of a JSON value as used by filters, tag search and
/// rendering: strings verbatim, everything else in its JSON form.
pub fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// An opened log file.
pub struct File {
    source: Box<dyn ByteSource>,
    index: Vec<LineSpan>,
    cache: RecordCache,
    known_tags: Vec<String>,
    roles: RoleTags,
    /// Shared scratch for line reads, grown to the largest line so far.
    scratch: Vec<u8>,
    /// Last recorded non-fatal error, shown on the status row.
    error: Option<JlvError>,
}

impl File {
    /// Open a source: scan the span index, then decode the first records to
    /// seed the known-tags set.
    ///
    /// A read failure mid-scan keeps the partial index and is recorded on the
    /// returned file, so callers still get a best-effort view.
    pub fn open<S: ByteSource + 'static>(source: S, roles: RoleTags) -> Self {
        Self::open_with_cache(source, roles, cache::DEFAULT_CAPACITY)
    }

    /// Like [`File::open`] with an explicit record cache capacity.
    pub fn open_with_cache<S: ByteSource + 'static>(
        source: S,
        roles: RoleTags,
        cache_capacity: usize,
    ) -> Self {
        let mut source: Box<dyn ByteSource> = Box::new(source);
        let (index, scan_err) = index::scan_index(&mut *source);
        log::debug!("indexed {} lines", index.len());

        let mut file = Self {
            source,
            index,
            cache: RecordCache::new(cache_capacity),
            known_tags: Vec::new(),
            roles,
            scratch: vec![0; SCRATCH_SIZE],
            error: scan_err.map(|e| JlvError::io("indexing interrupted", e)),
        };
        file.prime_known_tags();
        file
    }

    fn prime_known_tags(&mut self) {
        for n in 0..KNOWN_TAGS_DEPTH.min(self.index.len()) {
            if let Some(record) = self.record(n) {
                for tag in record.keys() {
                    self.add_known_tag(tag);
                }
            }
        }
        sort_known_tags(&mut self.known_tags, &self.roles);
    }

    /// Wrap this file in the shared handle views hold.
    pub fn into_shared(self) -> SharedFile {
        Arc::new(Mutex::new(self))
    }

    /// Number of indexed lines.
    pub fn line_count(&self) -> usize {
        self.index.len()
    }

    /// Raw undecoded bytes of line `n` (no trailing newline).
    ///
    /// Seeks to the line's offset and reads exactly its length through the
    /// scratch buffer; a short read is an I/O error, recorded and returned.
    pub fn raw_bytes(&mut self, n: usize) -> Result<&[u8]> {
        let span = *self
            .index
            .get(n)
            .ok_or_else(|| JlvError::other(format!("line {} out of range", n)))?;
        if self.scratch.len() < span.len {
            self.scratch.resize(span.len, 0);
        }
        let read = self
            .source
            .seek(SeekFrom::Start(span.start))
            .and_then(|_| self.source.read_exact(&mut self.scratch[..span.len]));
        if let Err(e) = read {
            self.error = Some(JlvError::io(format!("reading line {}", n), e));
            return Err(JlvError::other(format!("reading line {} failed", n)));
        }
        Ok(&self.scratch[..span.len])
    }

    /// Line `n` as lossy text, empty on read failure. Used by the
    /// non-interactive fallback dump.
    pub fn raw_text(&mut self, n: usize) -> String {
        match self.raw_bytes(n) {
            Ok(bytes) => bytes.to_str_lossy().into_owned(),
            Err(_) => String::new(),
        }
    }

    /// Decoded record of line `n`, from the cache when possible.
    ///
    /// Returns `None` when `n` is out of range or the line cannot be read.
    /// Malformed JSON records a decode error and yields an empty record, so
    /// the line renders empty while the session keeps going.
    pub fn record(&mut self, n: usize) -> Option<Arc<Record>> {
        if n >= self.index.len() {
            return None;
        }
        if let Some(record) = self.cache.get(n) {
            return Some(record);
        }

        let decoded = match self.raw_bytes(n) {
            Ok(bytes) => serde_json::from_slice::<Record>(bytes),
            Err(_) => return None,
        };
        let record = match decoded {
            Ok(map) => map,
            Err(e) => {
                self.error = Some(JlvError::decode(n, e));
                Record::new()
            }
        };

        let record = Arc::new(record);
        self.cache.put(n, Arc::clone(&record));
        Some(record)
    }

    /// All field names observed so far, role fields first.
    pub fn known_tags(&self) -> &[String] {
        &self.known_tags
    }

    /// Add a field name to the known set; the set only grows.
    pub fn add_known_tag(&mut self, tag: &str) {
        if !self.known_tags.iter().any(|t| t == tag) {
            self.known_tags.push(tag.to_string());
        }
    }

    /// Add every field name of `record` to the known set.
    pub fn add_known_tags(&mut self, record: &Record) {
        for tag in record.keys() {
            self.add_known_tag(tag);
        }
    }

    pub fn roles(&self) -> &RoleTags {
        &self.roles
    }

    /// Field name bound to a role in this file.
    pub fn role_name(&self, role: Role) -> &str {
        self.roles.name(role)
    }

    /// Lowercased level name of a record, empty when the level field is
    /// absent or not a string.
    pub fn level_name_of(&self, record: &Record) -> String {
        match record.get(self.roles.name(Role::Level)) {
            Some(serde_json::Value::String(s)) => s.to_ascii_lowercase(),
            _ => String::new(),
        }
    }

    /// Severity rank of a record, -1 when unknown.
    pub fn level_rank_of(&self, record: &Record) -> i32 {
        level_rank(&self.level_name_of(record))
    }

    /// Evaluate one filter against a record.
    ///
    /// A missing field never matches. On the level role field both sides are
    /// mapped through the rank table before comparing; all other fields
    /// compare by string encoding (lexicographically for `>=`/`<=`). A regex
    /// compile failure is recorded and the line does not match.
    pub fn fit(&mut self, record: &Record, filter: &Filter) -> bool {
        let Some(value) = record.get(&filter.tag) else {
            return false;
        };
        let val = value_to_string(value);
        let is_level = self.roles.role_of(&filter.tag) == Role::Level;

        match filter.op {
            FilterOp::Regexp => match Regex::new(&filter.mask) {
                Ok(re) => re.is_match(&val),
                Err(e) => {
                    self.error = Some(e.into());
                    false
                }
            },
            op if is_level => {
                let lev = level_rank(&val);
                let req = level_rank(&filter.mask);
                match op {
                    FilterOp::NotEqual => lev != req,
                    FilterOp::GreaterOrEqual => lev >= req,
                    FilterOp::LessOrEqual => lev <= req,
                    _ => lev == req,
                }
            }
            FilterOp::Equal => val == filter.mask,
            FilterOp::NotEqual => val != filter.mask,
            FilterOp::GreaterOrEqual => val.as_str() >= filter.mask.as_str(),
            FilterOp::LessOrEqual => val.as_str() <= filter.mask.as_str(),
        }
    }

    /// Last recorded non-fatal error, if any.
    pub fn last_error(&self) -> Option<&JlvError> {
        self.error.as_ref()
    }

    /// Take the last recorded error, clearing it.
    pub fn take_error(&mut self) -> Option<JlvError> {
        self.error.take()
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File")
            .field("lines", &self.index.len())
            .field("known_tags", &self.known_tags)
            .field("cached", &self.cache.len())
            .finish()
    }
}
