use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codec::EmbeddedDoc;
use crate::types::{Keyed, Reconcile};

/// A stored user account with its three embedded lists decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct UserAccount {
    pub id: i64,
    pub name: String,
    /// PHC-format password hash.
    pub credential: String,
    pub contact: String,
    pub avatar_url: String,
    pub favorites: EmbeddedDoc<FavoriteEntry>,
    pub history: EmbeddedDoc<HistoryEntry>,
    pub subscriptions: EmbeddedDoc<SubscriptionEntry>,
    pub created_ts: i64,
}

/// Input for inserting a user. The identifier and creation time are assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    /// Plain-text credential; hashed before it is written.
    pub credential: String,
    pub contact: String,
    pub avatar_url: String,
    pub favorites: EmbeddedDoc<FavoriteEntry>,
    pub history: EmbeddedDoc<HistoryEntry>,
    pub subscriptions: EmbeddedDoc<SubscriptionEntry>,
}

/// Partial update of a user's scalar fields. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserPatch {
    pub credential: Option<String>,
    pub contact: Option<String>,
    pub avatar_url: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.credential.is_none() && self.contact.is_none() && self.avatar_url.is_none()
    }

    /// Overwrite only the fields present in the patch. Returns whether anything changed.
    pub fn apply(&self, user: &mut UserAccount) -> bool {
        let mut changed = false;
        if let Some(credential) = &self.credential {
            changed |= replace_if_different(&mut user.credential, credential);
        }
        if let Some(contact) = &self.contact {
            changed |= replace_if_different(&mut user.contact, contact);
        }
        if let Some(avatar_url) = &self.avatar_url {
            changed |= replace_if_different(&mut user.avatar_url, avatar_url);
        }
        changed
    }
}

fn replace_if_different(slot: &mut String, value: &str) -> bool {
    if slot == value {
        return false;
    }
    value.clone_into(slot);
    true
}

/// A favorited title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    #[serde(rename = "f_AID")]
    pub aid: String,
    #[serde(rename = "f_TITLE", default)]
    pub title: String,
    #[serde(rename = "f_IMG_URL", default)]
    pub img_url: String,
    #[serde(rename = "f_UPDATE_TIME", default)]
    pub update_time: String,
    /// Display metadata the store does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FavoriteEntry {
    pub fn new(aid: impl Into<String>) -> Self {
        Self {
            aid: aid.into(),
            ..Default::default()
        }
    }
}

impl Keyed for FavoriteEntry {
    fn key(&self) -> &str {
        &self.aid
    }
}

/// A title the user follows for new episodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionEntry {
    #[serde(rename = "f_AID")]
    pub aid: String,
    #[serde(rename = "f_TITLE", default)]
    pub title: String,
    #[serde(rename = "f_IMG_URL", default)]
    pub img_url: String,
    #[serde(rename = "f_LATEST_EPISODE", default)]
    pub latest_episode: String,
    #[serde(rename = "f_UPDATE_TIME", default)]
    pub update_time: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubscriptionEntry {
    pub fn new(aid: impl Into<String>) -> Self {
        Self {
            aid: aid.into(),
            ..Default::default()
        }
    }
}

impl Keyed for SubscriptionEntry {
    fn key(&self) -> &str {
        &self.aid
    }
}

/// Playback progress for one title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "f_AID")]
    pub aid: String,
    #[serde(rename = "f_TITLE", default)]
    pub title: String,
    #[serde(rename = "f_IMG_URL", default)]
    pub img_url: String,
    #[serde(rename = "f_PLAY_URL", default)]
    pub play_url: String,
    /// Episode label, e.g. `"第03集"` or `"03"`.
    #[serde(rename = "f_PLAY_NUMBER", default)]
    pub play_number: String,
    #[serde(rename = "f_UPDATE_TIME", default)]
    pub update_time: String,
    /// Index of the player source the episode was watched on.
    #[serde(rename = "f_PLAYER_NUMBER", default)]
    pub player_number: i64,
    /// Position in milliseconds.
    #[serde(rename = "f_PROGRESS", default)]
    pub progress: i64,
    /// Length in milliseconds.
    #[serde(rename = "f_DURATION", default)]
    pub duration: i64,
    #[serde(rename = "f_PLAYER_LIST", default)]
    pub player_list: Vec<crate::title::Episode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoryEntry {
    pub fn new(aid: impl Into<String>) -> Self {
        Self {
            aid: aid.into(),
            ..Default::default()
        }
    }
}

impl Keyed for HistoryEntry {
    fn key(&self) -> &str {
        &self.aid
    }
}

impl Reconcile for HistoryEntry {
    fn reconcile_from(&mut self, newer: &Self) {
        self.title.clone_from(&newer.title);
        self.img_url.clone_from(&newer.img_url);
        self.play_url.clone_from(&newer.play_url);
        self.play_number.clone_from(&newer.play_number);
        self.update_time.clone_from(&newer.update_time);
        self.player_number = newer.player_number;
        self.progress = newer.progress;
        self.duration = newer.duration;
        self.player_list.clone_from(&newer.player_list);
        // newer keys win, keys it does not carry are kept
        for (key, value) in &newer.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> UserAccount {
        UserAccount {
            id: 1,
            name: "default".into(),
            credential: "hash".into(),
            contact: "".into(),
            avatar_url: "https://img.example.test/a.png".into(),
            favorites: EmbeddedDoc::Empty,
            history: EmbeddedDoc::Absent,
            subscriptions: EmbeddedDoc::Empty,
            created_ts: 0,
        }
    }

    #[test]
    fn patch_applies_only_supplied_fields() {
        let mut user = account();
        let patch = UserPatch {
            contact: Some("me@example.test".into()),
            ..Default::default()
        };
        assert!(patch.apply(&mut user));
        assert_eq!(user.contact, "me@example.test");
        assert_eq!(user.credential, "hash");
        assert_eq!(user.avatar_url, "https://img.example.test/a.png");
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut user = account();
        let before = user.clone();
        assert!(UserPatch::default().is_empty());
        assert!(!UserPatch::default().apply(&mut user));
        assert_eq!(user, before);
    }

    #[test]
    fn reconcile_keeps_key() {
        let mut stored = HistoryEntry::new("A1");
        stored.progress = 10;
        let mut newer = HistoryEntry::new("A1");
        newer.progress = 55;
        newer.play_number = "04".into();
        stored.reconcile_from(&newer);
        assert_eq!(stored.aid, "A1");
        assert_eq!(stored.progress, 55);
        assert_eq!(stored.play_number, "04");
    }

    #[test]
    fn reconcile_merges_opaque_metadata() {
        let mut stored: HistoryEntry = serde_json::from_str(
            r#"{"f_AID":"A1","f_PROGRESS":10,"f_SOURCE":"web","f_QUALITY":"720p"}"#,
        )
        .unwrap();
        let newer: HistoryEntry =
            serde_json::from_str(r#"{"f_AID":"A1","f_PROGRESS":55,"f_QUALITY":"1080p"}"#).unwrap();
        stored.reconcile_from(&newer);

        assert_eq!(stored.progress, 55);
        assert_eq!(stored.extra["f_SOURCE"], "web");
        assert_eq!(stored.extra["f_QUALITY"], "1080p");

        let raw = serde_json::to_string(&stored).unwrap();
        assert!(raw.contains(r#""f_SOURCE":"web""#));
        assert!(!raw.contains("extra"));
    }
}
