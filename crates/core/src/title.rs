use serde::{Deserialize, Serialize, Serializer};

/// One playable episode of a title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

impl Episode {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// A cloud-disk download link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLink {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    /// Extraction code some disk providers require alongside the URL.
    #[serde(default)]
    pub extract_code: String,
}

/// A title listed alongside another one (sequels, same studio, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedTitle {
    #[serde(rename = "AID", default)]
    pub anime_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cover_url: String,
}

/// Share of votes at one star level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingBucket {
    pub stars: u8,
    #[serde(default)]
    pub votes: i64,
    #[serde(default, serialize_with = "finite_f64")]
    pub percent: f64,
}

/// JSON has no NaN or infinity; refuse them instead of writing `null`.
fn finite_f64<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        Err(serde::ser::Error::custom(format!("non-finite number {value}")))
    }
}

/// Card-sized record of a title, used by listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleSummary {
    pub anime_id: String,
    pub title: String,
    pub cover_url: String,
    pub region: String,
    pub kind: String,
    pub premiere: String,
    pub status: String,
    pub latest_episode: String,
    pub description: String,
    pub tags: Vec<String>,
    pub rank: i64,
    pub hits: i64,
    pub score: String,
}

impl TitleSummary {
    pub fn new(anime_id: impl Into<String>) -> Self {
        Self {
            anime_id: anime_id.into(),
            ..Default::default()
        }
    }
}

/// Everything known about a title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleDetail {
    pub anime_id: String,
    pub title: String,
    pub original_title: String,
    pub alias: String,
    pub cover_url: String,
    pub cover_small_url: String,
    pub region: String,
    pub kind: String,
    pub premiere: String,
    pub status: String,
    pub studio: String,
    pub director: String,
    pub writer: String,
    pub website: String,
    pub description: String,
    pub latest_episode: String,
    pub total_episodes: i64,
    pub score: String,
    pub rank: i64,
    pub updated_label: String,
    pub updated_unix: i64,
    pub collect_count: i64,
    pub comment_count: i64,
    pub rank_count: i64,
    pub default_play_index: i64,
    pub file_path: String,
    pub last_modified: String,
    pub modified_time: i64,
    pub cast: Vec<String>,
    pub related: Vec<RelatedTitle>,
    pub ratings: Vec<RatingBucket>,
    pub tags: Vec<String>,
    pub download_links: Vec<DownloadLink>,
    /// Episodes grouped per player source.
    pub player_groups: Vec<Vec<Episode>>,
}

impl TitleDetail {
    pub fn new(anime_id: impl Into<String>) -> Self {
        Self {
            anime_id: anime_id.into(),
            ..Default::default()
        }
    }
}

/// Download links of one title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLinks {
    pub anime_id: String,
    pub links: Vec<DownloadLink>,
}

/// Episode lists of one title, one inner list per player source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRoster {
    pub anime_id: String,
    pub groups: Vec<Vec<Episode>>,
}

impl EpisodeRoster {
    pub fn episode_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};
    use crate::error::DocumentError;

    fn bucket(percent: f64) -> RatingBucket {
        RatingBucket {
            stars: 4,
            votes: 10,
            percent,
        }
    }

    #[test]
    fn finite_percent_round_trips() {
        let ratings = vec![bucket(12.5), bucket(0.0)];
        let raw = encode(&ratings).unwrap();
        assert_eq!(decode::<Vec<RatingBucket>>(&raw).unwrap(), ratings);
    }

    #[test]
    fn non_finite_percent_is_refused() {
        for percent in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = encode(&vec![bucket(percent)]).unwrap_err();
            assert!(matches!(err, DocumentError::Encode { .. }));
            assert_eq!(err.code(), "encode_failed");
        }
    }
}
