use anistore_core::codec::{decode, encode};
use anistore_core::title::{DownloadLink, DownloadLinks};
use sqlx::SqlitePool;
use tracing::warn;

use crate::{DbError, WriteOutcome};

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<DownloadLinks>, DbError> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT anime_id, links_doc FROM download_links")
            .fetch_all(pool)
            .await?;
    rows.into_iter().map(row_to_links).collect()
}

pub async fn get_links(pool: &SqlitePool, anime_id: &str) -> Result<Option<DownloadLinks>, DbError> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT anime_id, links_doc FROM download_links WHERE anime_id = ?")
            .bind(anime_id)
            .fetch_optional(pool)
            .await?;
    row.map(row_to_links).transpose()
}

/// Insert a link record and read it back. `None` on a duplicate key or any write failure.
pub async fn insert_links(pool: &SqlitePool, links: &DownloadLinks) -> Option<DownloadLinks> {
    let result: Result<Option<DownloadLinks>, DbError> = async {
        let written = sqlx::query("INSERT INTO download_links (anime_id, links_doc) VALUES (?, ?)")
            .bind(&links.anime_id)
            .bind(encode(&links.links)?)
            .execute(pool)
            .await?
            .rows_affected();
        if written == 0 {
            return Ok(None);
        }
        get_links(pool, &links.anime_id).await
    }
    .await;

    result.unwrap_or_else(|e| {
        warn!(anime_id = %links.anime_id, error = %e, "download links insert failed");
        None
    })
}

/// Replace the link list of one title.
pub async fn update_links(pool: &SqlitePool, anime_id: &str, links: &[DownloadLink]) -> WriteOutcome {
    let result: Result<u64, DbError> = async {
        let rows = sqlx::query("UPDATE download_links SET links_doc = ? WHERE anime_id = ?")
            .bind(encode(links)?)
            .bind(anime_id)
            .execute(pool)
            .await?
            .rows_affected();
        Ok(rows)
    }
    .await;
    WriteOutcome::settle(result, "update_links")
}

pub async fn delete_links(pool: &SqlitePool, anime_id: &str) -> WriteOutcome {
    let result = sqlx::query("DELETE FROM download_links WHERE anime_id = ?")
        .bind(anime_id)
        .execute(pool)
        .await
        .map(|r| r.rows_affected())
        .map_err(DbError::from);
    WriteOutcome::settle(result, "delete_links")
}

fn row_to_links((anime_id, links_doc): (String, String)) -> Result<DownloadLinks, DbError> {
    Ok(DownloadLinks {
        anime_id,
        links: decode(&links_doc)?,
    })
}
