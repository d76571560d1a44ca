//! The terminal session state machine.
//!
//! Turns the stream of key events into edits of the pending command,
//! autocomplete overlay updates and view transitions. The session never
//! touches the terminal itself — rendering reads its state, which keeps the
//! whole machine testable with synthetic key events.

use crate::command::{
    complete_filter, complete_tag_search, parse, root_command_options, Command, OptionsList,
};
use crate::file::LEVEL_NAMES;
use crate::view::{FileView, SearchDirection, SearchParams};
use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::Arc;

/// Render mode: the scrollable line list or a single-record detail screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Record,
}

/// All mutable state of one interactive session.
pub struct Session {
    view: FileView,
    width: u16,
    height: u16,
    /// On-screen cursor row within the list area.
    cursor: i64,
    mode: Mode,
    command: String,
    message: String,
    options: Option<OptionsList>,
    last_search: Option<SearchParams>,
    /// Substring emphasized on the cursor row after a raw-line search.
    sel_mask: String,
    exit: bool,
}

impl Session {
    pub fn new(view: FileView, width: u16, height: u16) -> Self {
        Self {
            view,
            width,
            height,
            cursor: 0,
            mode: Mode::Normal,
            command: String::new(),
            message: String::new(),
            options: None,
            last_search: None,
            sel_mask: String::new(),
            exit: false,
        }
    }

    pub fn view(&self) -> &FileView {
        &self.view
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn options(&self) -> Option<&OptionsList> {
        self.options.as_ref()
    }

    pub fn sel_mask(&self) -> &str {
        &self.sel_mask
    }

    pub fn should_exit(&self) -> bool {
        self.exit
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Surface the last error the file recorded, without overwriting a
    /// message produced by the current keystroke.
    pub fn poll_file_error(&mut self) {
        if let Some(err) = self.view.file().lock().take_error() {
            if self.message.is_empty() {
                self.message = err.to_string();
            }
        }
    }

    pub fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Key(key) => self.handle_key(*key),
            Event::Resize(width, height) => self.resize(*width, *height),
            _ => {}
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.clamp_cursor();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.message.clear();

        // Any key leaves record detail.
        if self.mode == Mode::Record {
            self.mode = Mode::Normal;
            return;
        }

        if self.options.is_some() {
            self.handle_options_key(key);
            return;
        }

        // An open command buffer swallows printable characters.
        if !self.command.is_empty() {
            if let KeyCode::Char(c) = key.code {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    self.command.push(c);
                    return;
                }
            }
        }

        match key.code {
            KeyCode::Tab => self.fill_options(),
            KeyCode::Backspace => {
                self.command.pop();
            }
            KeyCode::Enter => {
                if self.command.is_empty() {
                    if self.view.line(self.cursor).is_some() {
                        self.mode = Mode::Record;
                    }
                } else {
                    self.execute();
                }
            }
            KeyCode::Char('j') | KeyCode::Down => self.down(),
            KeyCode::Char('k') | KeyCode::Up => self.up(),
            KeyCode::Char('G') | KeyCode::End => self.end(),
            KeyCode::Home => self.home(),
            KeyCode::PageUp => self.pg_up(),
            KeyCode::PageDown => self.pg_dn(),
            KeyCode::Char('n') => self.run_search(false),
            KeyCode::Char('N') => self.run_search(true),
            KeyCode::Char(c @ (':' | '/' | '?')) => self.command.push(c),
            _ => {}
        }
    }

    fn handle_options_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.options = None;
                return;
            }
            KeyCode::Enter => {
                self.confirm_option();
                return;
            }
            KeyCode::Backspace => {
                if let Some(options) = self.options.as_mut() {
                    options.pop_prefix();
                    options.ensure_current();
                }
            }
            KeyCode::Left => {
                if let Some(options) = self.options.as_mut() {
                    options.prev();
                }
            }
            KeyCode::Right => {
                if let Some(options) = self.options.as_mut() {
                    options.next();
                }
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                if let Some(options) = self.options.as_mut() {
                    options.push_prefix(c);
                    options.ensure_current();
                }
            }
            _ => {}
        }
        self.maybe_autoconfirm();
    }

    /// Splice the highlighted candidate into the command buffer and close
    /// the overlay.
    fn confirm_option(&mut self) {
        if let Some(mut options) = self.options.take() {
            if let Some(item) = options.selected() {
                if options.replace() {
                    self.command = item.insert;
                } else {
                    self.command.push_str(&item.insert);
                }
            }
        }
    }

    fn maybe_autoconfirm(&mut self) {
        if self.options.as_ref().is_some_and(|o| o.is_unique()) {
            self.confirm_option();
        }
    }

    /// Build the autocomplete overlay for the current command prefix, or the
    /// root command list when no command prefix is recognized.
    fn fill_options(&mut self) {
        let command = self.command.clone();
        if command.starts_with(":f") {
            let tags = self.view.known_tags();
            let result = complete_filter(&command, &tags, &LEVEL_NAMES);
            self.command = result.buffer;
            self.options = result.options;
        } else if command.starts_with(":s") {
            let tags = self.view.known_tags();
            let result = complete_tag_search(&command, &tags);
            self.command = result.buffer;
            self.options = result.options;
        } else if command.starts_with('/')
            || command.starts_with('?')
            || command.starts_with(":x")
            || command.starts_with(":q")
            || command.starts_with(":p")
            || is_goto(&command)
        {
            // Recognized commands without completions.
        } else {
            self.options = Some(root_command_options(&command));
        }
        if let Some(options) = self.options.as_mut() {
            options.ensure_current();
        }
        self.maybe_autoconfirm();
    }

    /// Execute the pending command, clearing the buffer either way.
    fn execute(&mut self) {
        let input = std::mem::take(&mut self.command);
        match parse(&input) {
            Ok(Command::Quit) => self.exit = true,
            Ok(Command::Nop) => {}
            Ok(Command::Filter(filter)) => {
                self.replace_view(|view| view.filter(filter));
                self.clamp_cursor();
            }
            Ok(Command::FilterUp) => {
                self.replace_view(FileView::up);
                self.clamp_cursor();
            }
            Ok(Command::FilterTop) => {
                self.replace_view(FileView::top);
                self.clamp_cursor();
            }
            Ok(Command::TagSearch {
                tag,
                mask,
                is_regexp,
            }) => {
                self.last_search = Some(SearchParams {
                    mask,
                    idx: self.view.position() + self.cursor,
                    dir: SearchDirection::Forward,
                    tag: Some(tag),
                    is_regexp,
                });
                self.run_search(false);
            }
            Ok(Command::Search { mask, direction }) => {
                self.last_search = Some(SearchParams {
                    mask,
                    idx: self.view.position() + self.cursor,
                    dir: direction,
                    tag: None,
                    is_regexp: false,
                });
                self.run_search(false);
            }
            Ok(Command::GoToLine(line)) => self.go_to_line(line),
            Ok(Command::ShowPid) => self.message = std::process::id().to_string(),
            Err(e) => self.message = e.to_string(),
        }
    }

    fn replace_view(&mut self, f: impl FnOnce(FileView) -> FileView) {
        let file = Arc::clone(self.view.file());
        let view = std::mem::replace(&mut self.view, FileView::root(file));
        self.view = f(view);
    }

    fn clamp_cursor(&mut self) {
        let count = self.view.line_count() as i64;
        let max_row = (self.height as i64 - 2).max(0);
        let visible_last = (count - 1 - self.view.position()).max(0);
        self.cursor = self.cursor.clamp(0, max_row.min(visible_last));
    }

    /// Run the remembered search, optionally reversing its direction for
    /// this repetition only.
    fn run_search(&mut self, change_dir: bool) {
        let Some(params) = self.last_search.clone() else {
            self.message = "nothing to search".to_string();
            return;
        };
        if params.mask.is_empty() {
            self.message = "nothing to search".to_string();
            return;
        }
        let dir = if change_dir {
            params.dir.reversed()
        } else {
            params.dir
        };
        let result = match &params.tag {
            Some(tag) => self
                .view
                .search_tag(tag, &params.mask, params.idx, dir, params.is_regexp),
            None => self.view.search(&params.mask, params.idx, dir),
        };
        match result {
            Err(e) => self.message = e.to_string(),
            Ok(None) => self.message = "not found".to_string(),
            Ok(Some(hit)) => {
                let idx = hit.index as i64;
                if let Some(params) = self.last_search.as_mut() {
                    params.idx = match dir {
                        SearchDirection::Forward => idx + 1,
                        SearchDirection::Backward => idx - 1,
                    };
                }
                if hit.span.is_some() {
                    self.sel_mask = params.mask.clone();
                }
                let mut half = (self.height as i64) / 2;
                if idx - half < 0 {
                    half = idx;
                }
                self.view.set_position(idx - half);
                self.cursor = half;
            }
        }
    }

    // Cursor policy: pan the view only once the cursor reaches the vertical
    // midpoint, otherwise just move the highlighted row.
    fn up(&mut self) {
        let h = self.height as i64;
        if self.view.position() > 0 && self.cursor <= h / 2 {
            self.view.move_by(-1);
        } else if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    fn down(&mut self) {
        let h = self.height as i64;
        let count = self.view.line_count() as i64;
        if self.view.position() + h - 2 < count - 1 && self.cursor >= h / 2 {
            self.view.move_by(1);
        } else if self.cursor < h - 2 && self.cursor < count - 1 - self.view.position() {
            self.cursor += 1;
        }
    }

    fn pg_up(&mut self) {
        let h = self.height as i64;
        self.view.move_by(-(h - 2));
        if self.view.position() < 0 {
            self.home();
        }
    }

    fn pg_dn(&mut self) {
        let h = self.height as i64;
        let count = self.view.line_count() as i64;
        self.view.move_by(h - 2);
        if self.view.position() + h - 2 > count {
            self.end();
        }
    }

    fn home(&mut self) {
        self.view.set_position(0);
        self.cursor = 0;
    }

    fn end(&mut self) {
        let count = self.view.line_count() as i64;
        let h = self.height as i64;
        self.view.set_position((count - (h - 1)).max(0));
        self.cursor = (count - 1 - self.view.position()).clamp(0, (h - 2).max(0));
    }

    /// Center a 1-based line number, clamping near the edges.
    fn go_to_line(&mut self, line: usize) {
        let count = self.view.line_count() as i64;
        let line = line as i64;
        if line >= count {
            self.end();
            return;
        }
        if line <= 1 {
            self.home();
            return;
        }
        let h = self.height as i64;
        let mut cursor = h / 2;
        let mut new_pos = line - cursor - 1;
        if new_pos < 0 {
            new_pos = 0;
            cursor = line - 1;
        }
        self.view.set_position(new_pos);
        self.cursor = cursor;
    }
}

fn is_goto(command: &str) -> bool {
    command
        .strip_prefix(':')
        .map(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{File, RoleTags};
    use std::io::Cursor;

    fn view_of(lines: &[String]) -> FileView {
        let data = lines.concat();
        FileView::root(File::open(Cursor::new(data.into_bytes()), RoleTags::default()).into_shared())
    }

    fn sample_session(height: u16) -> Session {
        let lines: Vec<String> = vec![
            "{\"time\":\"t1\",\"level\":\"info\",\"msg\":\"a\"}\n".to_string(),
            "{\"time\":\"t2\",\"level\":\"error\",\"msg\":\"b\"}\n".to_string(),
            "{\"time\":\"t3\",\"level\":\"info\",\"msg\":\"c\"}\n".to_string(),
        ];
        Session::new(view_of(&lines), 80, height)
    }

    fn long_session(count: usize, height: u16) -> Session {
        let lines: Vec<String> = (0..count)
            .map(|i| format!("{{\"time\":\"t{}\",\"level\":\"info\",\"msg\":\"m{}\"}}\n", i, i))
            .collect();
        Session::new(view_of(&lines), 80, height)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(session: &mut Session, text: &str) {
        for c in text.chars() {
            session.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_typed_filter_command_executes() {
        let mut session = sample_session(10);
        type_str(&mut session, ":f/level/info");
        assert_eq!(session.command(), ":f/level/info");
        session.handle_key(key(KeyCode::Enter));
        assert_eq!(session.command(), "");
        assert!(session.view().has_parent());
        assert_eq!(session.view().line_count(), 2);
        assert_eq!(session.view().name(), "level eq info");
    }

    #[test]
    fn test_filter_up_and_root_commands() {
        let mut session = sample_session(10);
        type_str(&mut session, ":f/level/info");
        session.handle_key(key(KeyCode::Enter));
        type_str(&mut session, ":f/msg/c");
        session.handle_key(key(KeyCode::Enter));
        assert_eq!(session.view().line_count(), 1);

        type_str(&mut session, ":fu");
        session.handle_key(key(KeyCode::Enter));
        assert_eq!(session.view().line_count(), 2);

        type_str(&mut session, ":fr");
        session.handle_key(key(KeyCode::Enter));
        assert!(!session.view().has_parent());
        assert_eq!(session.view().line_count(), 3);
    }

    #[test]
    fn test_undefined_command_reports_and_clears() {
        let mut session = sample_session(10);
        type_str(&mut session, ":zz");
        session.handle_key(key(KeyCode::Enter));
        assert_eq!(session.command(), "");
        assert_eq!(session.message(), ":zz: undefined command");
        // The next keystroke clears the message.
        session.handle_key(key(KeyCode::Char('j')));
        assert_eq!(session.message(), "");
    }

    #[test]
    fn test_backspace_edits_command() {
        let mut session = sample_session(10);
        type_str(&mut session, ":fx");
        session.handle_key(key(KeyCode::Backspace));
        assert_eq!(session.command(), ":f");
    }

    #[test]
    fn test_printables_append_while_command_open() {
        let mut session = sample_session(10);
        type_str(&mut session, "/jk");
        // 'j' and 'k' went into the buffer, not navigation.
        assert_eq!(session.command(), "/jk");
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_record_mode_roundtrip() {
        let mut session = sample_session(10);
        session.handle_key(key(KeyCode::Enter));
        assert_eq!(session.mode(), Mode::Record);
        session.handle_key(key(KeyCode::Char('j')));
        assert_eq!(session.mode(), Mode::Normal);
        // The key that left record mode did not navigate.
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_cursor_moves_before_view_pans() {
        let mut session = long_session(20, 10);
        for _ in 0..5 {
            session.handle_key(key(KeyCode::Char('j')));
        }
        assert_eq!(session.cursor(), 5);
        assert_eq!(session.view().position(), 0);

        // At the midpoint the view starts panning instead.
        session.handle_key(key(KeyCode::Char('j')));
        assert_eq!(session.cursor(), 5);
        assert_eq!(session.view().position(), 1);
    }

    #[test]
    fn test_cursor_up_at_top_is_noop() {
        let mut session = long_session(20, 10);
        session.handle_key(key(KeyCode::Char('k')));
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.view().position(), 0);
    }

    #[test]
    fn test_home_end_and_paging() {
        let mut session = long_session(30, 10);
        session.handle_key(key(KeyCode::End));
        assert_eq!(session.view().position(), 21);
        assert_eq!(session.cursor(), 8);

        session.handle_key(key(KeyCode::Home));
        assert_eq!(session.view().position(), 0);
        assert_eq!(session.cursor(), 0);

        session.handle_key(key(KeyCode::PageDown));
        assert_eq!(session.view().position(), 8);
        // Paging past the end lands on the last page.
        for _ in 0..5 {
            session.handle_key(key(KeyCode::PageDown));
        }
        assert_eq!(session.view().position(), 21);

        session.handle_key(key(KeyCode::PageUp));
        assert_eq!(session.view().position(), 13);
    }

    #[test]
    fn test_goto_line_centers() {
        let mut session = long_session(30, 10);
        type_str(&mut session, ":15");
        session.handle_key(key(KeyCode::Enter));
        // 1-based line 15 sits on the midpoint row.
        assert_eq!(session.cursor(), 5);
        assert_eq!(session.view().position(), 9);

        type_str(&mut session, ":1");
        session.handle_key(key(KeyCode::Enter));
        assert_eq!(session.view().position(), 0);
        assert_eq!(session.cursor(), 0);

        type_str(&mut session, ":99");
        session.handle_key(key(KeyCode::Enter));
        assert_eq!(session.view().position(), 21);
    }

    #[test]
    fn test_raw_search_centers_and_remembers() {
        let mut session = sample_session(10);
        type_str(&mut session, "/\"msg\":\"c\"");
        session.handle_key(key(KeyCode::Enter));
        assert_eq!(session.message(), "");
        let selected = session.view().position() + session.cursor();
        assert_eq!(selected, 2);
        assert_eq!(session.sel_mask(), "\"msg\":\"c\"");
    }

    #[test]
    fn test_search_not_found_message() {
        let mut session = sample_session(10);
        type_str(&mut session, "/nowhere");
        session.handle_key(key(KeyCode::Enter));
        assert_eq!(session.message(), "not found");
    }

    #[test]
    fn test_repeat_search_advances_and_wraps() {
        let mut session = sample_session(10);
        type_str(&mut session, "/info");
        session.handle_key(key(KeyCode::Enter));
        assert_eq!(session.view().position() + session.cursor(), 0);

        session.handle_key(key(KeyCode::Char('n')));
        assert_eq!(session.view().position() + session.cursor(), 2);

        // Wraps back to the first match.
        session.handle_key(key(KeyCode::Char('n')));
        assert_eq!(session.view().position() + session.cursor(), 0);
    }

    #[test]
    fn test_repeat_search_reversed_direction() {
        let mut session = sample_session(10);
        type_str(&mut session, "/info");
        session.handle_key(key(KeyCode::Enter));
        assert_eq!(session.view().position() + session.cursor(), 0);

        // N reverses for one repetition: backwards from index 1 the first
        // match is line 0 again, and the continuation point becomes -1.
        session.handle_key(key(KeyCode::Char('N')));
        assert_eq!(session.view().position() + session.cursor(), 0);

        // n keeps the original forward direction; starting at -1 wraps to
        // the last line, which matches.
        session.handle_key(key(KeyCode::Char('n')));
        assert_eq!(session.view().position() + session.cursor(), 2);
    }

    #[test]
    fn test_repeat_with_no_search() {
        let mut session = sample_session(10);
        session.handle_key(key(KeyCode::Char('n')));
        assert_eq!(session.message(), "nothing to search");
    }

    #[test]
    fn test_tag_search_command() {
        let mut session = sample_session(10);
        type_str(&mut session, ":s/msg/b");
        session.handle_key(key(KeyCode::Enter));
        assert_eq!(session.view().position() + session.cursor(), 1);
        // Tag search leaves no raw-line highlight.
        assert_eq!(session.sel_mask(), "");
    }

    #[test]
    fn test_tab_on_empty_command_offers_root_commands() {
        let mut session = sample_session(10);
        session.handle_key(key(KeyCode::Tab));
        let options = session.options().expect("overlay expected");
        assert_eq!(options.visible_count(), 6);

        session.handle_key(key(KeyCode::Esc));
        assert!(session.options().is_none());
    }

    #[test]
    fn test_tab_normalizes_bare_filter_command() {
        let mut session = sample_session(10);
        type_str(&mut session, ":f");
        session.handle_key(key(KeyCode::Tab));
        assert_eq!(session.command(), ":f/");
        assert!(session.options().is_none());
    }

    #[test]
    fn test_tab_autocompletes_unique_tag() {
        let mut session = sample_session(10);
        type_str(&mut session, ":f/le");
        session.handle_key(key(KeyCode::Tab));
        // "level" is the only known tag containing "le"; auto-confirmed.
        assert_eq!(session.command(), ":f/level/");
        assert!(session.options().is_none());
    }

    #[test]
    fn test_overlay_selection_and_confirm() {
        let mut session = sample_session(10);
        type_str(&mut session, ":f/");
        session.handle_key(key(KeyCode::Tab));
        assert!(session.options().is_some());

        session.handle_key(key(KeyCode::Right));
        session.handle_key(key(KeyCode::Enter));
        // Second known tag is "level"; its completion appends "level/".
        assert_eq!(session.command(), ":f/level/");
        assert!(session.options().is_none());
    }

    #[test]
    fn test_overlay_prefix_narrowing_autoconfirms() {
        let mut session = sample_session(10);
        type_str(&mut session, ":f/level/");
        session.handle_key(key(KeyCode::Tab));
        assert!(session.options().is_some());
        // Typing narrows the level list down to "warn".
        session.handle_key(key(KeyCode::Char('w')));
        assert_eq!(session.command(), ":f/level/warn/");
        assert!(session.options().is_none());
    }

    #[test]
    fn test_quit_commands_set_exit() {
        let mut session = sample_session(10);
        type_str(&mut session, ":q");
        session.handle_key(key(KeyCode::Enter));
        assert!(session.should_exit());

        let mut session = sample_session(10);
        type_str(&mut session, ":x");
        session.handle_key(key(KeyCode::Enter));
        assert!(session.should_exit());
    }

    #[test]
    fn test_filter_to_empty_view_keeps_session_alive() {
        let mut session = sample_session(10);
        type_str(&mut session, ":f/level/fault");
        session.handle_key(key(KeyCode::Enter));
        assert_eq!(session.view().line_count(), 0);
        assert_eq!(session.cursor(), 0);
        // Navigation on the empty view is a no-op.
        session.handle_key(key(KeyCode::Char('j')));
        assert_eq!(session.cursor(), 0);
        // Enter does not open record detail for a missing line.
        session.handle_key(key(KeyCode::Enter));
        assert_eq!(session.mode(), Mode::Normal);
    }

    #[test]
    fn test_resize_clamps_cursor() {
        let mut session = long_session(20, 20);
        for _ in 0..9 {
            session.handle_key(key(KeyCode::Char('j')));
        }
        assert_eq!(session.cursor(), 9);
        session.resize(80, 6);
        assert_eq!(session.cursor(), 4);
    }
}
