//! Pure command-text parser.
//!
//! Turns the full in-progress command text (including its leading `:`, `/`
//! or `?`) into a [`Command`]. Anything unrecognized is a
//! [`JlvError::Command`], which the session reports as "undefined command"
//! and otherwise ignores.

use crate::command::Command;
use crate::error::{JlvError, Result};
use crate::view::{Filter, FilterOp, SearchDirection};
use regex::Regex;
use std::sync::OnceLock;

fn filter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^:f/([A-Za-z0-9_-]+)/([^/]*)(?:/([+!$-])?)?$").expect("filter grammar")
    })
}

fn tag_search_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^:s/([A-Za-z0-9_-]+)/([^/]*)(?:/(\$))?$").expect("tag search grammar")
    })
}

fn goto_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^:([0-9]+)$").expect("goto grammar"))
}

/// Parse a complete command.
pub fn parse(input: &str) -> Result<Command> {
    match input {
        ":" => return Ok(Command::Nop),
        ":x" | ":q" => return Ok(Command::Quit),
        ":fu" => return Ok(Command::FilterUp),
        ":fr" => return Ok(Command::FilterTop),
        ":p" => return Ok(Command::ShowPid),
        _ => {}
    }

    if let Some(rest) = input.strip_prefix('/') {
        return Ok(Command::Search {
            mask: rest.to_string(),
            direction: SearchDirection::Forward,
        });
    }
    if let Some(rest) = input.strip_prefix('?') {
        return Ok(Command::Search {
            mask: rest.to_string(),
            direction: SearchDirection::Backward,
        });
    }

    if let Some(caps) = filter_re().captures(input) {
        let op = match caps.get(3).map(|m| m.as_str()) {
            Some("+") => FilterOp::GreaterOrEqual,
            Some("-") => FilterOp::LessOrEqual,
            Some("!") => FilterOp::NotEqual,
            Some("$") => FilterOp::Regexp,
            _ => FilterOp::Equal,
        };
        return Ok(Command::Filter(Filter {
            tag: caps[1].to_string(),
            mask: caps[2].to_string(),
            op,
        }));
    }

    if let Some(caps) = tag_search_re().captures(input) {
        return Ok(Command::TagSearch {
            tag: caps[1].to_string(),
            mask: caps[2].to_string(),
            is_regexp: caps.get(3).is_some(),
        });
    }

    if let Some(caps) = goto_re().captures(input) {
        let line: usize = caps[1]
            .parse()
            .map_err(|_| JlvError::command(input.to_string()))?;
        return Ok(Command::GoToLine(line));
    }

    Err(JlvError::command(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(input: &str) -> Filter {
        match parse(input).unwrap() {
            Command::Filter(f) => f,
            other => panic!("expected filter, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_filter_default_equal() {
        let f = filter(":f/level/info");
        assert_eq!(f.tag, "level");
        assert_eq!(f.mask, "info");
        assert_eq!(f.op, FilterOp::Equal);
    }

    #[test]
    fn test_parse_filter_operators() {
        assert_eq!(filter(":f/level/warn/+").op, FilterOp::GreaterOrEqual);
        assert_eq!(filter(":f/level/warn/-").op, FilterOp::LessOrEqual);
        assert_eq!(filter(":f/level/warn/!").op, FilterOp::NotEqual);
        assert_eq!(filter(":f/msg/^a.*b$/$").op, FilterOp::Regexp);
        // Trailing slash without an operator still means equal.
        assert_eq!(filter(":f/level/warn/").op, FilterOp::Equal);
    }

    #[test]
    fn test_parse_filter_empty_value() {
        let f = filter(":f/host/");
        assert_eq!(f.tag, "host");
        assert_eq!(f.mask, "");
    }

    #[test]
    fn test_parse_filter_pops() {
        assert_eq!(parse(":fu").unwrap(), Command::FilterUp);
        assert_eq!(parse(":fr").unwrap(), Command::FilterTop);
    }

    #[test]
    fn test_parse_tag_search() {
        assert_eq!(
            parse(":s/msg/timeout").unwrap(),
            Command::TagSearch {
                tag: "msg".to_string(),
                mask: "timeout".to_string(),
                is_regexp: false,
            }
        );
        assert_eq!(
            parse(":s/msg/^time/$").unwrap(),
            Command::TagSearch {
                tag: "msg".to_string(),
                mask: "^time".to_string(),
                is_regexp: true,
            }
        );
    }

    #[test]
    fn test_parse_raw_searches() {
        assert_eq!(
            parse("/needle").unwrap(),
            Command::Search {
                mask: "needle".to_string(),
                direction: SearchDirection::Forward,
            }
        );
        assert_eq!(
            parse("?needle").unwrap(),
            Command::Search {
                mask: "needle".to_string(),
                direction: SearchDirection::Backward,
            }
        );
    }

    #[test]
    fn test_parse_goto_and_exits() {
        assert_eq!(parse(":42").unwrap(), Command::GoToLine(42));
        assert_eq!(parse(":x").unwrap(), Command::Quit);
        assert_eq!(parse(":q").unwrap(), Command::Quit);
        assert_eq!(parse(":p").unwrap(), Command::ShowPid);
        assert_eq!(parse(":").unwrap(), Command::Nop);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for input in [":zz", ":f", ":f/", ":f/level/info/*", ":s", ":s/", ":12abc", "f/x/y"] {
            let err = parse(input).unwrap_err();
            assert!(
                matches!(err, JlvError::Command { .. }),
                "expected command error for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_parse_error_mentions_input() {
        let err = parse(":wat").unwrap_err();
        assert_eq!(err.to_string(), ":wat: undefined command");
    }
}
