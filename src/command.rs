//! The in-session command language.
//!
//! Commands are parsed from the text the user typed after `:`, `/` or `?`
//! into an explicit [`Command`] value by a pure parser ([`parse`]); the
//! session executes the parsed value against the current view. Autocomplete
//! option lists for partially typed commands live in [`options`].

pub mod options;
pub mod parse;

use crate::view::{Filter, SearchDirection};

pub use options::{
    complete_filter, complete_tag_search, root_command_options, CompletionItem, CompletionResult,
    OptionsList,
};
pub use parse::parse;

/// A fully parsed command, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `:f/<tag>/<value>[/<op>]` — push a filtered view.
    Filter(Filter),
    /// `:fu` — pop to the parent view.
    FilterUp,
    /// `:fr` — pop to the root view.
    FilterTop,
    /// `:s/<tag>/<value>[/$]` — search within one field's values.
    TagSearch {
        tag: String,
        mask: String,
        is_regexp: bool,
    },
    /// `/<value>` and `?<value>` — search the raw line text.
    Search {
        mask: String,
        direction: SearchDirection,
    },
    /// `:<digits>` — jump to a 1-based absolute line number.
    GoToLine(usize),
    /// `:p` — show the process id on the status row.
    ShowPid,
    /// `:x` / `:q` — leave the session.
    Quit,
    /// `:` on its own — clear the buffer, do nothing.
    Nop,
}
