use anistore_core::codec::{decode, encode};
use anistore_core::title::{Episode, EpisodeRoster};
use sqlx::SqlitePool;
use tracing::warn;

use crate::{DbError, WriteOutcome};

pub async fn list_rosters(pool: &SqlitePool) -> Result<Vec<EpisodeRoster>, DbError> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT anime_id, groups_doc FROM episode_roster")
            .fetch_all(pool)
            .await?;
    rows.into_iter().map(row_to_roster).collect()
}

pub async fn get_roster(pool: &SqlitePool, anime_id: &str) -> Result<Option<EpisodeRoster>, DbError> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT anime_id, groups_doc FROM episode_roster WHERE anime_id = ?")
            .bind(anime_id)
            .fetch_optional(pool)
            .await?;
    row.map(row_to_roster).transpose()
}

/// Insert a roster and read it back. `None` on a duplicate key or any write failure.
pub async fn insert_roster(
    pool: &SqlitePool,
    anime_id: &str,
    groups: &[Vec<Episode>],
) -> Option<EpisodeRoster> {
    let result: Result<Option<EpisodeRoster>, DbError> = async {
        let written = sqlx::query("INSERT INTO episode_roster (anime_id, groups_doc) VALUES (?, ?)")
            .bind(anime_id)
            .bind(encode(groups)?)
            .execute(pool)
            .await?
            .rows_affected();
        if written == 0 {
            return Ok(None);
        }
        get_roster(pool, anime_id).await
    }
    .await;

    result.unwrap_or_else(|e| {
        warn!(anime_id, error = %e, "episode roster insert failed");
        None
    })
}

/// Replace every player group of one title.
pub async fn update_groups(pool: &SqlitePool, anime_id: &str, groups: &[Vec<Episode>]) -> WriteOutcome {
    let result: Result<u64, DbError> = async {
        let rows = sqlx::query("UPDATE episode_roster SET groups_doc = ? WHERE anime_id = ?")
            .bind(encode(groups)?)
            .bind(anime_id)
            .execute(pool)
            .await?
            .rows_affected();
        Ok(rows)
    }
    .await;
    WriteOutcome::settle(result, "update_groups")
}

pub async fn delete_roster(pool: &SqlitePool, anime_id: &str) -> WriteOutcome {
    let result = sqlx::query("DELETE FROM episode_roster WHERE anime_id = ?")
        .bind(anime_id)
        .execute(pool)
        .await
        .map(|r| r.rows_affected())
        .map_err(DbError::from);
    WriteOutcome::settle(result, "delete_roster")
}

fn row_to_roster((anime_id, groups_doc): (String, String)) -> Result<EpisodeRoster, DbError> {
    Ok(EpisodeRoster {
        anime_id,
        groups: decode(&groups_doc)?,
    })
}
