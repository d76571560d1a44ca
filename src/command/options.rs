//! Autocomplete option lists.
//!
//! While the options overlay is active, keystrokes narrow a prefix filter
//! and move the highlighted candidate instead of editing the command buffer.
//! [`OptionsList`] is the pure model of that overlay; the completion
//! providers below build one from the current partial command text, the
//! known field names and the level names.

use regex::Regex;
use std::sync::OnceLock;

/// One autocomplete candidate: the label shown in the overlay and the text
/// spliced into the command buffer when confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub label: String,
    pub insert: String,
}

/// The set of candidates currently offered, with the typed narrowing prefix
/// and the highlighted selection.
#[derive(Debug, Clone)]
pub struct OptionsList {
    items: Vec<CompletionItem>,
    current: Option<usize>,
    prefix: String,
    /// Confirmed text replaces the whole command buffer instead of being
    /// appended to it (used by the root command list).
    replace: bool,
}

impl OptionsList {
    pub fn new(items: Vec<CompletionItem>, replace: bool) -> Self {
        Self {
            items,
            current: None,
            prefix: String::new(),
            replace,
        }
    }

    /// Build a list from plain names, optionally appending the `/` segment
    /// separator to each inserted completion.
    pub fn from_names<S: AsRef<str>>(names: &[S], append_slash: bool) -> Self {
        let items = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let insert = if append_slash {
                    format!("{}/", name)
                } else {
                    name.to_string()
                };
                CompletionItem {
                    label: name.to_string(),
                    insert,
                }
            })
            .collect();
        Self::new(items, false)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn replace(&self) -> bool {
        self.replace
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn is_visible(&self, idx: usize) -> bool {
        self.prefix.is_empty() || self.items[idx].label.contains(&self.prefix)
    }

    /// Candidates surviving the prefix filter, with their selected flag.
    pub fn visible(&self) -> Vec<(bool, &CompletionItem)> {
        (0..self.items.len())
            .filter(|i| self.is_visible(*i))
            .map(|i| (Some(i) == self.current, &self.items[i]))
            .collect()
    }

    pub fn visible_count(&self) -> usize {
        (0..self.items.len()).filter(|i| self.is_visible(*i)).count()
    }

    /// Exactly one candidate left; the overlay auto-confirms it.
    pub fn is_unique(&self) -> bool {
        self.visible_count() == 1
    }

    /// Make sure something visible is highlighted.
    pub fn ensure_current(&mut self) {
        let valid = self
            .current
            .map(|i| i < self.items.len() && self.is_visible(i))
            .unwrap_or(false);
        if !valid {
            self.current = (0..self.items.len()).find(|i| self.is_visible(*i));
        }
    }

    /// Move the highlight to the next visible candidate, wrapping.
    pub fn next(&mut self) {
        self.step(1);
    }

    /// Move the highlight to the previous visible candidate, wrapping.
    pub fn prev(&mut self) {
        self.step(-1);
    }

    fn step(&mut self, dir: isize) {
        self.ensure_current();
        let Some(start) = self.current else { return };
        let len = self.items.len();
        let mut cur = start;
        loop {
            cur = (cur as isize + dir).rem_euclid(len as isize) as usize;
            if cur == start {
                return;
            }
            if self.is_visible(cur) {
                self.current = Some(cur);
                return;
            }
        }
    }

    pub fn push_prefix(&mut self, c: char) {
        self.prefix.push(c);
        self.current = None;
    }

    /// Drop the last prefix character; false when there was none to drop.
    pub fn pop_prefix(&mut self) -> bool {
        if self.prefix.pop().is_some() {
            self.current = None;
            true
        } else {
            false
        }
    }

    /// The highlighted candidate, if any candidate is visible.
    pub fn selected(&mut self) -> Option<CompletionItem> {
        self.ensure_current();
        self.current.map(|i| self.items[i].clone())
    }
}

/// What a completion request produced: a possibly rewritten command buffer
/// and, when there is something to choose from, the overlay to show.
#[derive(Debug, Clone)]
pub struct CompletionResult {
    pub buffer: String,
    pub options: Option<OptionsList>,
}

const ROOT_COMMANDS: [(&str, &str); 6] = [
    ("filter", ":f"),
    ("search-tag", ":s"),
    ("exit", ":x"),
    ("quit", ":q"),
    ("search(/)", "/"),
    ("search-up(?)", "?"),
];

/// Offer the root command names whose key extends the typed text.
pub fn root_command_options(current: &str) -> OptionsList {
    let items = ROOT_COMMANDS
        .iter()
        .filter(|(_, key)| key.starts_with(current))
        .map(|(label, key)| CompletionItem {
            label: label.to_string(),
            insert: key.to_string(),
        })
        .collect();
    OptionsList::new(items, true)
}

fn filter_partial_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^:f/([A-Za-z0-9_-]*)(?:/([A-Za-z0-9_-]*))?$").expect("filter partial grammar")
    })
}

/// Completion for a partially typed `:f` command: field names for the first
/// segment, level names for the second. The returned buffer is normalized to
/// the segment boundary the options will extend.
pub fn complete_filter(current: &str, tags: &[String], levels: &[&str]) -> CompletionResult {
    if let Some(caps) = filter_partial_re().captures(current) {
        if let Some(value) = caps.get(2) {
            let tag = &caps[1];
            return CompletionResult {
                buffer: format!(":f/{}/", tag),
                options: Some(
                    OptionsList::from_names(levels, true).with_prefix(value.as_str()),
                ),
            };
        }
        let tag = &caps[1];
        return CompletionResult {
            buffer: ":f/".to_string(),
            options: Some(OptionsList::from_names(tags, true).with_prefix(tag)),
        };
    }
    CompletionResult {
        buffer: ":f/".to_string(),
        options: None,
    }
}

/// Completion for a partially typed `:s` command: the `/` separator after
/// the bare command, field names after it.
pub fn complete_tag_search(current: &str, tags: &[String]) -> CompletionResult {
    if current == ":s/" {
        CompletionResult {
            buffer: current.to_string(),
            options: Some(OptionsList::from_names(tags, true)),
        }
    } else if current == ":s" {
        CompletionResult {
            buffer: current.to_string(),
            options: Some(OptionsList::new(
                vec![CompletionItem {
                    label: "/".to_string(),
                    insert: "/".to_string(),
                }],
                false,
            )),
        }
    } else {
        CompletionResult {
            buffer: current.to_string(),
            options: None,
        }
    }
}
