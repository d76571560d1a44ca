//! Level ranks and role-tag mapping.
//!
//! Records carry free-form field names; three of them play fixed semantic
//! roles (time, level, message). [`RoleTags`] maps the roles to whatever
//! names this particular file uses, and the level table orders the well
//! known severity names so that `>=`/`<=` filters compare by rank instead
//! of lexicographically.

/// Well known level names, ordered by severity.
pub const LEVEL_NAMES: [&str; 6] = ["trace", "debug", "info", "warn", "error", "fault"];

/// Rank of a level name within [`LEVEL_NAMES`], case-insensitive.
///
/// Unrecognized names rank -1, so two unknown levels compare equal and any
/// known level outranks them.
pub fn level_rank(name: &str) -> i32 {
    let lower = name.to_ascii_lowercase();
    LEVEL_NAMES
        .iter()
        .position(|l| *l == lower)
        .map(|p| p as i32)
        .unwrap_or(-1)
}

/// The fixed semantic roles a record field can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Time,
    Level,
    Message,
    Other,
}

/// Mapping from the fixed roles to the field names this file uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTags {
    pub time: String,
    pub level: String,
    pub message: String,
}

impl Default for RoleTags {
    fn default() -> Self {
        Self {
            time: "time".to_string(),
            level: "level".to_string(),
            message: "msg".to_string(),
        }
    }
}

impl RoleTags {
    /// Field name bound to a role. `Role::Other` has no name of its own.
    pub fn name(&self, role: Role) -> &str {
        match role {
            Role::Time => &self.time,
            Role::Level => &self.level,
            Role::Message => &self.message,
            Role::Other => "",
        }
    }

    /// Role played by a field name, `Role::Other` if none.
    pub fn role_of(&self, tag: &str) -> Role {
        if tag == self.time {
            Role::Time
        } else if tag == self.level {
            Role::Level
        } else if tag == self.message {
            Role::Message
        } else {
            Role::Other
        }
    }
}

/// Reorder known tags so the role fields occupy the fixed leading positions
/// (time, level, message — when observed) and everything else keeps its
/// first-seen order.
pub fn sort_known_tags(tags: &mut Vec<String>, roles: &RoleTags) {
    let mut sorted = Vec::with_capacity(tags.len());
    for role in [Role::Time, Role::Level, Role::Message] {
        let name = roles.name(role);
        if tags.iter().any(|t| t == name) {
            sorted.push(name.to_string());
        }
    }
    for tag in tags.drain(..) {
        if roles.role_of(&tag) == Role::Other {
            sorted.push(tag);
        }
    }
    *tags = sorted;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_rank_ordering() {
        assert_eq!(level_rank("trace"), 0);
        assert_eq!(level_rank("debug"), 1);
        assert_eq!(level_rank("info"), 2);
        assert_eq!(level_rank("warn"), 3);
        assert_eq!(level_rank("error"), 4);
        assert_eq!(level_rank("fault"), 5);
        assert!(level_rank("info") < level_rank("error"));
    }

    #[test]
    fn test_level_rank_case_insensitive() {
        assert_eq!(level_rank("INFO"), 2);
        assert_eq!(level_rank("Warn"), 3);
    }

    #[test]
    fn test_level_rank_unknown() {
        assert_eq!(level_rank("verbose"), -1);
        assert_eq!(level_rank(""), -1);
    }

    #[test]
    fn test_role_mapping_defaults() {
        let roles = RoleTags::default();
        assert_eq!(roles.name(Role::Time), "time");
        assert_eq!(roles.name(Role::Level), "level");
        assert_eq!(roles.name(Role::Message), "msg");
        assert_eq!(roles.role_of("level"), Role::Level);
        assert_eq!(roles.role_of("host"), Role::Other);
    }

    #[test]
    fn test_role_mapping_custom_names() {
        let roles = RoleTags {
            time: "ts".to_string(),
            level: "severity".to_string(),
            message: "message".to_string(),
        };
        assert_eq!(roles.role_of("ts"), Role::Time);
        assert_eq!(roles.role_of("severity"), Role::Level);
        assert_eq!(roles.role_of("time"), Role::Other);
    }

    #[test]
    fn test_sort_known_tags_roles_first() {
        let roles = RoleTags::default();
        let mut tags = vec![
            "host".to_string(),
            "msg".to_string(),
            "time".to_string(),
            "level".to_string(),
            "pid".to_string(),
        ];
        sort_known_tags(&mut tags, &roles);
        assert_eq!(tags, vec!["time", "level", "msg", "host", "pid"]);
    }

    #[test]
    fn test_sort_known_tags_missing_role() {
        let roles = RoleTags::default();
        let mut tags = vec!["host".to_string(), "msg".to_string()];
        sort_known_tags(&mut tags, &roles);
        assert_eq!(tags, vec!["msg", "host"]);
    }

    #[test]
    fn test_sort_known_tags_preserves_first_seen_order() {
        let roles = RoleTags::default();
        let mut tags = vec![
            "zeta".to_string(),
            "alpha".to_string(),
            "time".to_string(),
        ];
        sort_known_tags(&mut tags, &roles);
        assert_eq!(tags, vec!["time", "zeta", "alpha"]);
    }
}
