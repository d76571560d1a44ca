//! Frame rendering for the session.
//!
//! Renders the line list (or the record-detail screen), and the status row
//! carrying the options overlay, the pending command or the last message plus
//! the `view-name line(total)` position indicator. Rendering only reads the
//! session; the one side effect it has is adopting field names it encounters
//! that the file did not know yet, which keeps autocomplete current without a
//! full re-scan.

use crate::file::{value_to_string, File, Record, Role};
use crate::ui::session::{Mode, Session};
use crate::ui::theme::ColorTheme;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

/// Draw one full frame.
pub fn draw(frame: &mut Frame, session: &Session, theme: &ColorTheme) {
    let area = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(area);

    match session.mode() {
        Mode::Normal => render_lines(frame, chunks[0], session, theme),
        Mode::Record => render_record(frame, chunks[0], session, theme),
    }
    render_status(frame, chunks[1], session, theme);
}

/// Compose the display text of one record: timestamp, right-padded level,
/// message, then every other known field present as `; name: value`.
///
/// A record carrying field names the file has not seen yet donates them to
/// the known-tags set.
pub fn compose_record_line(file: &mut File, record: &Record) -> String {
    let time = record
        .get(file.role_name(Role::Time))
        .map(value_to_string)
        .unwrap_or_default();
    let level = file.level_name_of(record);
    let message = record
        .get(file.role_name(Role::Message))
        .map(value_to_string)
        .unwrap_or_default();

    let mut out = format!("{} {:>5} {}", time, level, message);

    let extra_tags: Vec<String> = file
        .known_tags()
        .iter()
        .filter(|tag| file.roles().role_of(tag) == Role::Other)
        .cloned()
        .collect();
    let mut covered = extra_tags.iter().filter(|t| record.contains_key(*t)).count();
    covered += [Role::Time, Role::Level, Role::Message]
        .iter()
        .filter(|role| record.contains_key(file.role_name(**role)))
        .count();

    for tag in &extra_tags {
        if let Some(value) = record.get(tag) {
            out.push_str(&format!("; {}: {}", tag, value_to_string(value)));
        }
    }

    if covered < record.len() {
        file.add_known_tags(record);
    }
    out
}

fn render_lines(frame: &mut Frame, area: Rect, session: &Session, theme: &ColorTheme) {
    let view = session.view();
    let mut rows: Vec<Line> = Vec::with_capacity(area.height as usize);

    for row in 0..area.height as i64 {
        let Some(record) = view.line(row) else {
            rows.push(Line::default());
            continue;
        };

        let (text, rank) = {
            let mut file = view.file().lock();
            (
                compose_record_line(&mut file, &record),
                file.level_rank_of(&record),
            )
        };

        let current = row == session.cursor();
        let mut style = if current {
            theme.selection
        } else {
            Style::default()
        };
        if let Some(color) = theme.level_color(rank) {
            if current {
                style = style.bg(color);
            } else {
                style = style.fg(color);
            }
        }

        if current && !session.sel_mask().is_empty() && text.contains(session.sel_mask()) {
            rows.push(highlighted_line(text, session.sel_mask(), style, theme));
        } else {
            rows.push(Line::styled(text, style));
        }
    }

    frame.render_widget(Paragraph::new(rows), area);
}

/// Emphasize the matched substring within a rendered row.
fn highlighted_line(text: String, mask: &str, style: Style, theme: &ColorTheme) -> Line<'static> {
    let Some(from) = text.find(mask) else {
        return Line::styled(text, style);
    };
    let to = from + mask.len();
    Line::from(vec![
        Span::styled(text[..from].to_string(), style),
        Span::styled(text[from..to].to_string(), theme.search_match),
        Span::styled(text[to..].to_string(), style),
    ])
}

fn render_record(frame: &mut Frame, area: Rect, session: &Session, theme: &ColorTheme) {
    let mut rows: Vec<Line> = Vec::new();
    if let Some(record) = session.view().line(session.cursor()) {
        for (key, value) in record.iter() {
            rows.push(Line::from(vec![
                Span::styled(format!("{}:", key), theme.record_key),
                Span::raw(format!("  {}", value_to_string(value))),
            ]));
        }
    }
    frame.render_widget(
        Paragraph::new(rows).wrap(ratatui::widgets::Wrap { trim: false }),
        area,
    );
}

fn render_status(frame: &mut Frame, area: Rect, session: &Session, theme: &ColorTheme) {
    let mut spans: Vec<Span> = Vec::new();

    if let Some(options) = session.options() {
        for (selected, item) in options.visible() {
            let style = if selected {
                theme.option_selected
            } else {
                Style::default()
            };
            spans.push(Span::styled(item.label.clone(), style));
            spans.push(Span::raw(" "));
        }
    } else if !session.command().is_empty() {
        spans.push(Span::raw(session.command().to_string()));
    } else if !session.message().is_empty() {
        spans.push(Span::raw(session.message().to_string()));
    } else if session.mode() == Mode::Record {
        spans.push(Span::raw("Press ENTER to continue"));
    }

    let view = session.view();
    let suffix = format!(
        "{} {}({})",
        view.name(),
        view.position() + session.cursor() + 1,
        view.line_count()
    );
    let used: usize = spans.iter().map(|s| s.width()).sum();
    let pad = (area.width as usize).saturating_sub(used + suffix.len());
    spans.push(Span::raw(" ".repeat(pad)));
    spans.push(Span::styled(suffix, theme.position));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
