//! Document codec.
//!
//! Embedded collections live in single `TEXT` columns as JSON. Every read of
//! such a column goes through [`decode`] or [`decode_column`]; every write goes
//! through [`encode`]. User-owned lists are wrapped in a [`ListDoc`] that also
//! carries the redundant `allSize` count.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Decode a persisted document into `T`.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, DocumentError> {
    serde_json::from_str(raw).map_err(|source| DocumentError::Malformed {
        shape: shape_name::<T>(),
        source,
    })
}

/// Encode `value` as a persisted document.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, DocumentError> {
    serde_json::to_string(value).map_err(|source| DocumentError::Encode {
        shape: shape_name::<T>(),
        source,
    })
}

/// Decode a nullable list-document column. `NULL` maps to [`EmbeddedDoc::Absent`].
pub fn decode_column<T: DeserializeOwned>(
    raw: Option<&str>,
) -> Result<EmbeddedDoc<T>, DocumentError> {
    match raw {
        None => Ok(EmbeddedDoc::Absent),
        Some(raw) => decode::<ListDoc<T>>(raw).map(EmbeddedDoc::from),
    }
}

/// Encode an embedded document for a nullable column.
pub fn encode_column<T: Serialize + Clone>(
    doc: &EmbeddedDoc<T>,
) -> Result<Option<String>, DocumentError> {
    match doc {
        EmbeddedDoc::Absent => Ok(None),
        EmbeddedDoc::Empty => encode(&ListDoc::<T>::default()).map(Some),
        EmbeddedDoc::Populated(list) => encode(&ListDoc::new(list.clone())).map(Some),
    }
}

fn shape_name<T: ?Sized>() -> &'static str {
    // `anistore_core::codec::ListDoc<anistore_core::user::FavoriteEntry>` -> `ListDoc`
    let full = std::any::type_name::<T>();
    let head = full.split('<').next().unwrap_or(full);
    let name = head.rsplit("::").next().unwrap_or(head);
    name.trim_matches(|c| c == '[' || c == ']' || c == '&')
}

/// Persisted form of a user-owned list: `{"list": [...], "allSize": n}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDoc<T> {
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
    #[serde(default)]
    pub all_size: usize,
}

impl<T> ListDoc<T> {
    /// Build a document whose count matches its list.
    pub fn new(list: Vec<T>) -> Self {
        let all_size = list.len();
        Self { list, all_size }
    }

    /// True when the stored count disagrees with the list length.
    pub fn is_inconsistent(&self) -> bool {
        self.all_size != self.list.len()
    }
}

impl<T> Default for ListDoc<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Domain view of an embedded list column.
///
/// Storage only knows "text present or not"; the domain additionally tells an
/// empty list apart from a populated one because reconciliation treats them
/// differently from append and remove.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EmbeddedDoc<T> {
    #[default]
    Absent,
    Empty,
    Populated(Vec<T>),
}

impl<T> EmbeddedDoc<T> {
    pub fn from_list(list: Vec<T>) -> Self {
        if list.is_empty() {
            Self::Empty
        } else {
            Self::Populated(list)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Populated(list) => list.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The entries, with absent treated as empty.
    pub fn into_list(self) -> Vec<T> {
        match self {
            Self::Populated(list) => list,
            Self::Absent | Self::Empty => Vec::new(),
        }
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::Populated(list) => list,
            Self::Absent | Self::Empty => &[],
        }
    }
}

impl<T> From<ListDoc<T>> for EmbeddedDoc<T> {
    fn from(doc: ListDoc<T>) -> Self {
        Self::from_list(doc.list)
    }
}

impl<T> From<EmbeddedDoc<T>> for ListDoc<T> {
    fn from(doc: EmbeddedDoc<T>) -> Self {
        ListDoc::new(doc.into_list())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::title::{DownloadLink, Episode};
    use crate::user::{FavoriteEntry, HistoryEntry};

    #[test]
    fn list_doc_uses_all_size_key() {
        let doc = ListDoc::new(vec![FavoriteEntry::new("A1")]);
        let raw = encode(&doc).unwrap();
        assert!(raw.contains("\"allSize\":1"));
        assert!(raw.contains("\"f_AID\":\"A1\""));
    }

    #[test]
    fn empty_and_singleton_lists_round_trip() {
        let empty: ListDoc<HistoryEntry> = ListDoc::default();
        assert_eq!(decode::<ListDoc<HistoryEntry>>(&encode(&empty).unwrap()).unwrap(), empty);

        let mut entry = HistoryEntry::new("A1");
        entry.progress = 10;
        entry.player_list = vec![Episode::new("01", "https://example.test/1.m3u8")];
        let single = ListDoc::new(vec![entry]);
        assert_eq!(decode::<ListDoc<HistoryEntry>>(&encode(&single).unwrap()).unwrap(), single);
    }

    #[test]
    fn nested_lists_round_trip() {
        let groups = vec![
            vec![Episode::new("01", "a"), Episode::new("02", "b")],
            vec![],
        ];
        let raw = encode(&groups).unwrap();
        assert_eq!(decode::<Vec<Vec<Episode>>>(&raw).unwrap(), groups);

        let links = vec![DownloadLink {
            name: "disk".into(),
            url: "https://pan.example.test/s/1".into(),
            extract_code: "x1y2".into(),
        }];
        assert_eq!(decode::<Vec<DownloadLink>>(&encode(&links).unwrap()).unwrap(), links);
    }

    #[test]
    fn opaque_entry_metadata_survives() {
        let raw = r#"{"list":[{"f_AID":"A9","f_TITLE":"t","f_SEASON":"2024-04"}],"allSize":1}"#;
        let doc: ListDoc<FavoriteEntry> = decode(raw).unwrap();
        assert_eq!(doc.list[0].extra["f_SEASON"], "2024-04");
        let again: ListDoc<FavoriteEntry> = decode(&encode(&doc).unwrap()).unwrap();
        assert_eq!(again, doc);
    }

    #[test]
    fn malformed_documents_are_rejected() {
        let err = decode::<ListDoc<FavoriteEntry>>("{not json").unwrap_err();
        assert_eq!(err.code(), "malformed_document");
        assert_eq!(err.shape(), "ListDoc");

        // valid JSON, wrong shape
        assert!(decode::<ListDoc<FavoriteEntry>>(r#"{"list":{"f_AID":"A1"}}"#).is_err());
        assert!(decode::<Vec<Episode>>(r#"{"title":"01"}"#).is_err());
    }

    #[test]
    fn column_states() {
        assert_eq!(decode_column::<FavoriteEntry>(None).unwrap(), EmbeddedDoc::Absent);
        assert_eq!(
            decode_column::<FavoriteEntry>(Some(r#"{"list":[],"allSize":0}"#)).unwrap(),
            EmbeddedDoc::Empty
        );
        let populated =
            decode_column::<FavoriteEntry>(Some(r#"{"list":[{"f_AID":"A1"}],"allSize":1}"#))
                .unwrap();
        assert_eq!(populated.len(), 1);

        assert_eq!(encode_column::<FavoriteEntry>(&EmbeddedDoc::Absent).unwrap(), None);
        assert_eq!(
            encode_column::<FavoriteEntry>(&EmbeddedDoc::Empty).unwrap().as_deref(),
            Some(r#"{"list":[],"allSize":0}"#)
        );
    }

    #[test]
    fn missing_all_size_is_flagged() {
        let doc: ListDoc<FavoriteEntry> = decode(r#"{"list":[{"f_AID":"A1"}]}"#).unwrap();
        assert!(doc.is_inconsistent());
        assert!(!ListDoc::new(doc.list).is_inconsistent());
    }
}
