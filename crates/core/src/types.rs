use serde::{Deserialize, Serialize};

/// An entry identified by a title key (`f_AID`) inside an embedded list.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// An entry whose mutable fields can be overwritten from a newer copy.
///
/// Implementations must leave the key untouched.
pub trait Reconcile: Keyed {
    fn reconcile_from(&mut self, newer: &Self);
}

/// Which embedded list of a user account an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserListKind {
    Favorites,
    History,
    Subscriptions,
}

impl UserListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::History => "history",
            Self::Subscriptions => "subscriptions",
        }
    }
}

impl std::fmt::Display for UserListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Table kinds managed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Users,
    TitleSummaries,
    TitleDetails,
    DownloadLinks,
    EpisodeRosters,
}

impl TableKind {
    pub const ALL: [TableKind; 5] = [
        Self::Users,
        Self::TitleSummaries,
        Self::TitleDetails,
        Self::DownloadLinks,
        Self::EpisodeRosters,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Users => "user_account",
            Self::TitleSummaries => "title_summary",
            Self::TitleDetails => "title_detail",
            Self::DownloadLinks => "download_links",
            Self::EpisodeRosters => "episode_roster",
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a caller-supplied key means "no key".
///
/// Clients send empty strings or the literals `null` / `undefined` when they
/// mean to remove by key set instead of a single key.
pub fn is_blank_key(key: &str) -> bool {
    let key = key.trim();
    key.is_empty() || key.eq_ignore_ascii_case("null") || key.eq_ignore_ascii_case("undefined")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_sentinels_ignore_case() {
        for key in ["", "  ", "null", "NULL", "Null", "undefined", "UNDEFINED", " Undefined "] {
            assert!(is_blank_key(key), "{key:?} should be blank");
        }
        for key in ["A1", "nil", "none", "undefined1"] {
            assert!(!is_blank_key(key), "{key:?} should not be blank");
        }
    }
}
